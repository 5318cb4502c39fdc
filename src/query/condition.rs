//! Condition tree
//!
//! A condition tests one property. Its kind and property are fixed when
//! it is built; only its operands can change afterwards, through the
//! rebinder. Every operand change is checked against the same rules as
//! the builder uses.

use std::fmt;

use crate::schema::{PropertyDescriptor, ValueType};

use super::errors::{QueryError, QueryResult};

/// Literal operand of a condition
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Integer(i64),
    Floating(f64),
    Text(String),
    Bool(bool),
}

impl Literal {
    pub fn kind_name(&self) -> &'static str {
        match self {
            Literal::Integer(_) => "integer",
            Literal::Floating(_) => "floating",
            Literal::Text(_) => "text",
            Literal::Bool(_) => "bool",
        }
    }

    /// Numeric value as f64
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Literal::Integer(v) => Some(*v as f64),
            Literal::Floating(v) => Some(*v),
            _ => None,
        }
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Integer(v) => write!(f, "{}", v),
            Literal::Floating(v) => write!(f, "{:?}", v),
            Literal::Text(v) => write!(f, "{:?}", v),
            Literal::Bool(v) => write!(f, "{}", v),
        }
    }
}

macro_rules! integer_literal {
    ($($t:ty),*) => {
        $(impl From<$t> for Literal {
            fn from(v: $t) -> Self {
                Literal::Integer(i64::from(v))
            }
        })*
    };
}

integer_literal!(i8, i16, i32, i64, u8, u16, u32);

impl From<f32> for Literal {
    fn from(v: f32) -> Self {
        Literal::Floating(f64::from(v))
    }
}

impl From<f64> for Literal {
    fn from(v: f64) -> Self {
        Literal::Floating(v)
    }
}

impl From<&str> for Literal {
    fn from(v: &str) -> Self {
        Literal::Text(v.to_string())
    }
}

impl From<String> for Literal {
    fn from(v: String) -> Self {
        Literal::Text(v)
    }
}

impl From<bool> for Literal {
    fn from(v: bool) -> Self {
        Literal::Bool(v)
    }
}

/// Collation used by string conditions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StringOrder {
    #[default]
    CaseInsensitive,
    CaseSensitive,
}

impl StringOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            StringOrder::CaseInsensitive => "case-insensitive",
            StringOrder::CaseSensitive => "case-sensitive",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConditionKind {
    Equal,
    NotEqual,
    Less,
    Greater,
    Between,
    In,
    IsNull,
    NotNull,
    StartsWith,
    EndsWith,
    Contains,
}

impl ConditionKind {
    pub fn op_name(&self) -> &'static str {
        match self {
            ConditionKind::Equal => "==",
            ConditionKind::NotEqual => "!=",
            ConditionKind::Less => "<",
            ConditionKind::Greater => ">",
            ConditionKind::Between => "between",
            ConditionKind::In => "in",
            ConditionKind::IsNull => "is null",
            ConditionKind::NotNull => "is not null",
            ConditionKind::StartsWith => "starts with",
            ConditionKind::EndsWith => "ends with",
            ConditionKind::Contains => "contains",
        }
    }

    fn is_string_match(&self) -> bool {
        matches!(
            self,
            ConditionKind::StartsWith | ConditionKind::EndsWith | ConditionKind::Contains
        )
    }
}

/// Operand slots of a condition
#[derive(Debug, Clone, PartialEq)]
pub enum Operands {
    None,
    One(Literal),
    Two(Literal, Literal),
    Set(Vec<Literal>),
}

impl Operands {
    /// Shape name used in error messages
    pub fn shape(&self) -> &'static str {
        match self {
            Operands::None => "no operands",
            Operands::One(_) => "one operand",
            Operands::Two(_, _) => "two operands",
            Operands::Set(_) => "a value set",
        }
    }

    fn same_shape(&self, other: &Operands) -> bool {
        std::mem::discriminant(self) == std::mem::discriminant(other)
    }
}

/// A single predicate on one property
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    property: PropertyDescriptor,
    kind: ConditionKind,
    operands: Operands,
    order: StringOrder,
    alias: Option<String>,
}

impl Condition {
    /// Builds a condition after checking operand shape and types
    pub fn new(
        property: PropertyDescriptor,
        kind: ConditionKind,
        operands: Operands,
        order: StringOrder,
    ) -> QueryResult<Self> {
        let expected = expected_shape(kind);
        if !expected.same_shape(&operands) {
            return Err(QueryError::operand_count(
                &property.name,
                expected.shape(),
                operands.shape(),
            ));
        }
        check_operands(&property, kind, &operands)?;
        Ok(Self {
            property,
            kind,
            operands,
            order,
            alias: None,
        })
    }

    pub fn property(&self) -> &PropertyDescriptor {
        &self.property
    }

    pub fn kind(&self) -> ConditionKind {
        self.kind
    }

    pub fn operands(&self) -> &Operands {
        &self.operands
    }

    pub fn order(&self) -> StringOrder {
        self.order
    }

    pub fn alias(&self) -> Option<&str> {
        self.alias.as_deref()
    }

    pub(crate) fn set_alias(&mut self, alias: String) {
        self.alias = Some(alias);
    }

    /// Replaces the operands, keeping kind and property.
    ///
    /// `target` names the property or alias for error messages.
    pub(crate) fn rebind(&mut self, operands: Operands, target: &str) -> QueryResult<()> {
        if !self.operands.same_shape(&operands) {
            return Err(QueryError::operand_count(
                target,
                self.operands.shape(),
                operands.shape(),
            ));
        }
        check_operands(&self.property, self.kind, &operands)?;
        self.operands = operands;
        Ok(())
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.property.name, self.kind.op_name())?;
        match &self.operands {
            Operands::None => {}
            Operands::One(v) => write!(f, " {}", v)?,
            Operands::Two(a, b) => write!(f, " {} and {}", a, b)?,
            Operands::Set(values) => {
                let joined: Vec<String> = values.iter().map(Literal::to_string).collect();
                write!(f, " [{}]", joined.join(", "))?;
            }
        }
        if self.property.value_type == ValueType::String {
            write!(f, " ({})", self.order.as_str())?;
        }
        if let Some(alias) = &self.alias {
            write!(f, " as ${}", alias)?;
        }
        Ok(())
    }
}

fn expected_shape(kind: ConditionKind) -> Operands {
    match kind {
        ConditionKind::IsNull | ConditionKind::NotNull => Operands::None,
        ConditionKind::Between => Operands::Two(Literal::Bool(false), Literal::Bool(false)),
        ConditionKind::In => Operands::Set(Vec::new()),
        _ => Operands::One(Literal::Bool(false)),
    }
}

/// Whether `literal` may be compared against a property of `value_type`.
///
/// Integer literals widen to floating properties; nothing else converts.
pub(crate) fn literal_fits(value_type: ValueType, literal: &Literal) -> bool {
    match literal {
        Literal::Integer(_) => value_type.is_numeric(),
        Literal::Floating(_) => value_type.is_floating(),
        Literal::Text(_) => value_type == ValueType::String,
        Literal::Bool(_) => value_type == ValueType::Bool,
    }
}

fn check_operands(
    property: &PropertyDescriptor,
    kind: ConditionKind,
    operands: &Operands,
) -> QueryResult<()> {
    let value_type = property.value_type;
    let mismatch = |detail: String| Err(QueryError::type_mismatch(&property.name, detail));

    if kind.is_string_match() && value_type != ValueType::String {
        return mismatch(format!(
            "'{}' needs a string property, found {}",
            kind.op_name(),
            value_type.type_name()
        ));
    }

    match operands {
        Operands::None => Ok(()),
        Operands::One(literal) => {
            if !literal_fits(value_type, literal) {
                return mismatch(format!(
                    "{} literal cannot be compared with {}",
                    literal.kind_name(),
                    value_type.type_name()
                ));
            }
            let ordered = matches!(kind, ConditionKind::Less | ConditionKind::Greater);
            if ordered && value_type == ValueType::Bool {
                return mismatch(format!("'{}' is not defined for bool", kind.op_name()));
            }
            Ok(())
        }
        Operands::Two(low, high) => {
            if !value_type.is_numeric() {
                return mismatch(format!(
                    "'between' needs a numeric property, found {}",
                    value_type.type_name()
                ));
            }
            for bound in [low, high] {
                if !literal_fits(value_type, bound) {
                    return mismatch(format!(
                        "{} bound cannot be compared with {}",
                        bound.kind_name(),
                        value_type.type_name()
                    ));
                }
            }
            Ok(())
        }
        Operands::Set(values) => {
            let element_ok: fn(&Literal) -> bool = if value_type.is_integer() {
                |l| matches!(l, Literal::Integer(_))
            } else if value_type == ValueType::String {
                |l| matches!(l, Literal::Text(_))
            } else {
                return mismatch(format!(
                    "'in' needs an integer or string property, found {}",
                    value_type.type_name()
                ));
            };
            match values.iter().find(|l| !element_ok(*l)) {
                Some(bad) => mismatch(format!(
                    "{} element in value set for {}",
                    bad.kind_name(),
                    value_type.type_name()
                )),
                None => Ok(()),
            }
        }
    }
}

/// Predicate tree over one entity
#[derive(Debug, Clone, PartialEq)]
pub enum ConditionTree {
    Leaf(Condition),
    And(Vec<ConditionTree>),
    Or(Vec<ConditionTree>),
}

impl Default for ConditionTree {
    /// Matches everything
    fn default() -> Self {
        ConditionTree::And(Vec::new())
    }
}

impl ConditionTree {
    /// True for a tree without any condition
    pub fn is_empty(&self) -> bool {
        self.leaf_count() == 0
    }

    pub fn leaf_count(&self) -> usize {
        match self {
            ConditionTree::Leaf(_) => 1,
            ConditionTree::And(children) | ConditionTree::Or(children) => {
                children.iter().map(ConditionTree::leaf_count).sum()
            }
        }
    }

    /// Leaves in depth-first order
    pub fn leaves(&self) -> Vec<&Condition> {
        let mut out = Vec::new();
        self.collect_leaves(&mut out);
        out
    }

    fn collect_leaves<'a>(&'a self, out: &mut Vec<&'a Condition>) {
        match self {
            ConditionTree::Leaf(c) => out.push(c),
            ConditionTree::And(children) | ConditionTree::Or(children) => {
                for child in children {
                    child.collect_leaves(out);
                }
            }
        }
    }

    pub(crate) fn leaves_mut(&mut self) -> Vec<&mut Condition> {
        let mut out = Vec::new();
        self.collect_leaves_mut(&mut out);
        out
    }

    fn collect_leaves_mut<'a>(&'a mut self, out: &mut Vec<&'a mut Condition>) {
        match self {
            ConditionTree::Leaf(c) => out.push(c),
            ConditionTree::And(children) | ConditionTree::Or(children) => {
                for child in children {
                    child.collect_leaves_mut(out);
                }
            }
        }
    }

    /// Leaf at a depth-first position
    pub fn leaf(&self, position: usize) -> Option<&Condition> {
        self.leaves().into_iter().nth(position)
    }
}

impl fmt::Display for ConditionTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConditionTree::Leaf(c) => write!(f, "{}", c),
            ConditionTree::And(children) if children.is_empty() => write!(f, "TRUE"),
            ConditionTree::And(children) | ConditionTree::Or(children) => {
                let joiner = if matches!(self, ConditionTree::And(_)) {
                    " AND "
                } else {
                    " OR "
                };
                write!(f, "(")?;
                for (i, child) in children.iter().enumerate() {
                    if i > 0 {
                        write!(f, "{}", joiner)?;
                    }
                    write!(f, "{}", child)?;
                }
                write!(f, ")")
            }
        }
    }
}
