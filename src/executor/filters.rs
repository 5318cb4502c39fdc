//! Predicate evaluation
//!
//! A condition tree is compiled once per execution into a `PredicateFilter`:
//! literals are widened to the comparison domain of their property and
//! case-insensitive literals are folded up front, so per-record work is a
//! slot lookup and one comparison.
//!
//! Null semantics: only `is null` / `is not null` match a null slot; every
//! other test is false on null.

use std::cmp::Ordering;
use std::collections::HashSet;

use crate::entity::{Entity, Value};
use crate::query::{Condition, ConditionKind, ConditionTree, Literal, Operands, StringOrder};

/// Lowercase fold used for case-insensitive matching and ordering
pub fn fold_case(s: &str) -> String {
    s.chars().flat_map(char::to_lowercase).collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CmpOp {
    Eq,
    Ne,
    Lt,
    Gt,
}

impl CmpOp {
    fn from_kind(kind: ConditionKind) -> Option<Self> {
        match kind {
            ConditionKind::Equal => Some(CmpOp::Eq),
            ConditionKind::NotEqual => Some(CmpOp::Ne),
            ConditionKind::Less => Some(CmpOp::Lt),
            ConditionKind::Greater => Some(CmpOp::Gt),
            _ => None,
        }
    }

    fn accepts(self, ordering: Option<Ordering>) -> bool {
        match (self, ordering) {
            (CmpOp::Eq, Some(o)) => o == Ordering::Equal,
            (CmpOp::Ne, Some(o)) => o != Ordering::Equal,
            (CmpOp::Lt, Some(o)) => o == Ordering::Less,
            (CmpOp::Gt, Some(o)) => o == Ordering::Greater,
            // NaN compares unordered: only != holds
            (CmpOp::Ne, None) => true,
            (_, None) => false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TextOp {
    Cmp(CmpOp),
    StartsWith,
    EndsWith,
    Contains,
}

#[derive(Debug, Clone)]
enum Test {
    IsNull,
    NotNull,
    Int(CmpOp, i64),
    Float(CmpOp, f64),
    IntBetween(i64, i64),
    FloatBetween(f64, f64),
    IntIn(HashSet<i64>),
    Bool(CmpOp, bool),
    Text { op: TextOp, operand: String, fold: bool },
    TextIn { set: HashSet<String>, fold: bool },
    Never,
}

#[derive(Debug, Clone)]
struct CompiledLeaf {
    ordinal: usize,
    test: Test,
}

#[derive(Debug, Clone)]
enum Node {
    Leaf(CompiledLeaf),
    And(Vec<Node>),
    Or(Vec<Node>),
}

/// Compiled, immutable predicate for one execution
#[derive(Debug, Clone)]
pub struct PredicateFilter {
    root: Node,
}

impl PredicateFilter {
    pub fn compile(tree: &ConditionTree) -> Self {
        Self {
            root: compile_node(tree),
        }
    }

    /// AND stops at the first false child, OR at the first true one
    pub fn matches(&self, entity: &Entity) -> bool {
        eval(&self.root, entity.values())
    }
}

fn compile_node(tree: &ConditionTree) -> Node {
    match tree {
        ConditionTree::Leaf(condition) => Node::Leaf(compile_leaf(condition)),
        ConditionTree::And(children) => Node::And(children.iter().map(compile_node).collect()),
        ConditionTree::Or(children) => Node::Or(children.iter().map(compile_node).collect()),
    }
}

fn compile_leaf(condition: &Condition) -> CompiledLeaf {
    let property = condition.property();
    let value_type = property.value_type;
    let fold = condition.order() == StringOrder::CaseInsensitive;
    let text = |s: &str| if fold { fold_case(s) } else { s.to_string() };

    let test = match (condition.kind(), condition.operands()) {
        (ConditionKind::IsNull, _) => Test::IsNull,
        (ConditionKind::NotNull, _) => Test::NotNull,
        (ConditionKind::Between, Operands::Two(lo, hi)) => match (lo, hi) {
            (Literal::Integer(a), Literal::Integer(b)) if value_type.is_integer() => {
                Test::IntBetween(*a, *b)
            }
            _ => match (lo.as_f64(), hi.as_f64()) {
                (Some(a), Some(b)) => Test::FloatBetween(a, b),
                _ => Test::Never,
            },
        },
        (ConditionKind::In, Operands::Set(values)) => {
            if value_type.is_integer() {
                Test::IntIn(
                    values
                        .iter()
                        .filter_map(|l| match l {
                            Literal::Integer(v) => Some(*v),
                            _ => None,
                        })
                        .collect(),
                )
            } else {
                Test::TextIn {
                    set: values
                        .iter()
                        .filter_map(|l| match l {
                            Literal::Text(s) => Some(text(s)),
                            _ => None,
                        })
                        .collect(),
                    fold,
                }
            }
        }
        (kind, Operands::One(literal)) => {
            let text_op = match kind {
                ConditionKind::StartsWith => Some(TextOp::StartsWith),
                ConditionKind::EndsWith => Some(TextOp::EndsWith),
                ConditionKind::Contains => Some(TextOp::Contains),
                other => CmpOp::from_kind(other).map(TextOp::Cmp),
            };
            match (text_op, literal) {
                (Some(TextOp::Cmp(op)), Literal::Integer(v)) if value_type.is_integer() => {
                    Test::Int(op, *v)
                }
                (Some(TextOp::Cmp(op)), Literal::Integer(v)) => Test::Float(op, *v as f64),
                (Some(TextOp::Cmp(op)), Literal::Floating(v)) => Test::Float(op, *v),
                (Some(TextOp::Cmp(op)), Literal::Bool(b)) => Test::Bool(op, *b),
                (Some(op), Literal::Text(s)) => Test::Text {
                    op,
                    operand: text(s),
                    fold,
                },
                _ => Test::Never,
            }
        }
        _ => Test::Never,
    };

    CompiledLeaf {
        ordinal: property.ordinal,
        test,
    }
}

fn eval(node: &Node, slots: &[Option<Value>]) -> bool {
    match node {
        Node::Leaf(leaf) => eval_leaf(leaf, slots.get(leaf.ordinal).and_then(Option::as_ref)),
        Node::And(children) => children.iter().all(|c| eval(c, slots)),
        Node::Or(children) => children.iter().any(|c| eval(c, slots)),
    }
}

fn eval_leaf(leaf: &CompiledLeaf, value: Option<&Value>) -> bool {
    let value = match (&leaf.test, value) {
        (Test::IsNull, v) => return v.is_none(),
        (Test::NotNull, v) => return v.is_some(),
        (_, None) => return false,
        (_, Some(v)) => v,
    };

    match &leaf.test {
        Test::Int(op, operand) => value
            .as_i64()
            .map_or(false, |v| op.accepts(Some(v.cmp(operand)))),
        Test::Float(op, operand) => value
            .as_f64()
            .map_or(false, |v| op.accepts(v.partial_cmp(operand))),
        Test::IntBetween(lo, hi) => value.as_i64().map_or(false, |v| *lo <= v && v <= *hi),
        Test::FloatBetween(lo, hi) => value.as_f64().map_or(false, |v| *lo <= v && v <= *hi),
        Test::IntIn(set) => value.as_i64().map_or(false, |v| set.contains(&v)),
        Test::Bool(op, operand) => value
            .as_bool()
            .map_or(false, |v| op.accepts(Some(v.cmp(operand)))),
        Test::Text { op, operand, fold } => value
            .as_str()
            .map_or(false, |s| text_matches(*op, s, operand, *fold)),
        Test::TextIn { set, fold } => value.as_str().map_or(false, |s| {
            if *fold {
                set.contains(&fold_case(s))
            } else {
                set.contains(s)
            }
        }),
        Test::IsNull | Test::NotNull | Test::Never => false,
    }
}

fn text_matches(op: TextOp, value: &str, operand: &str, fold: bool) -> bool {
    let folded;
    let value = if fold {
        folded = fold_case(value);
        folded.as_str()
    } else {
        value
    };
    match op {
        TextOp::Cmp(cmp) => cmp.accepts(Some(value.cmp(operand))),
        TextOp::StartsWith => value.starts_with(operand),
        TextOp::EndsWith => value.ends_with(operand),
        TextOp::Contains => value.contains(operand),
    }
}
