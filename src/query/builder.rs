//! Query builder
//!
//! Conditions added one after another are ANDed. `or()` and `and()`
//! combine the previous condition with the next one, left to right, so
//! `a.or().b.and().c` means `(a OR b) AND c`.
//!
//! Validation is eager: the first invalid call is recorded, later
//! condition calls are ignored, and `build()` reports the recorded error.
//! The builder is never consumed and can build any number of queries.

use std::sync::Arc;

use crate::error::Result;
use crate::observability::{Logger, Severity};
use crate::schema::{EntitySchema, PropertyDescriptor};
use crate::store::StoreShared;

use super::access::select_access_path;
use super::condition::{Condition, ConditionKind, ConditionTree, Literal, Operands, StringOrder};
use super::errors::QueryError;
use super::order::{OrderFlags, OrderSpec};
use super::plan::{Query, QueryPlan};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Combinator {
    And,
    Or,
}

/// Assembles conditions and ordering into a [`Query`]
pub struct QueryBuilder {
    shared: Arc<StoreShared>,
    schema: Arc<EntitySchema>,
    items: Vec<ConditionTree>,
    pending: Option<Combinator>,
    order: OrderSpec,
    error: Option<QueryError>,
}

impl QueryBuilder {
    pub(crate) fn new(shared: Arc<StoreShared>, schema: Arc<EntitySchema>) -> Self {
        Self {
            shared,
            schema,
            items: Vec::new(),
            pending: None,
            order: OrderSpec::new(),
            error: None,
        }
    }

    pub fn schema(&self) -> &EntitySchema {
        &self.schema
    }

    fn fail(&mut self, error: QueryError) -> &mut Self {
        if self.error.is_none() {
            self.error = Some(error);
        }
        self
    }

    fn owned(&self, property: &PropertyDescriptor) -> std::result::Result<(), QueryError> {
        if self.schema.owns(property) {
            Ok(())
        } else {
            Err(QueryError::unknown_property(self.schema.name(), &property.name))
        }
    }

    fn add(
        &mut self,
        property: &PropertyDescriptor,
        kind: ConditionKind,
        operands: Operands,
        order: StringOrder,
    ) -> &mut Self {
        if self.error.is_some() {
            return self;
        }
        if let Err(e) = self.owned(property) {
            return self.fail(e);
        }
        let leaf = match Condition::new(property.clone(), kind, operands, order) {
            Ok(condition) => ConditionTree::Leaf(condition),
            Err(e) => return self.fail(e),
        };

        let combined = match self.pending.take() {
            None => leaf,
            Some(combinator) => match (combinator, self.items.pop()) {
                (Combinator::Or, Some(ConditionTree::Or(mut children))) => {
                    children.push(leaf);
                    ConditionTree::Or(children)
                }
                (Combinator::Or, Some(last)) => ConditionTree::Or(vec![last, leaf]),
                (Combinator::And, Some(ConditionTree::And(mut children))) => {
                    children.push(leaf);
                    ConditionTree::And(children)
                }
                (Combinator::And, Some(last)) => ConditionTree::And(vec![last, leaf]),
                (_, None) => leaf,
            },
        };
        self.items.push(combined);
        self
    }

    fn combine(&mut self, combinator: Combinator) -> &mut Self {
        if self.error.is_some() {
            return self;
        }
        if self.items.is_empty() {
            return self.fail(QueryError::invalid(
                "or()/and() needs a preceding condition",
            ));
        }
        if self.pending.is_some() {
            return self.fail(QueryError::invalid(
                "or()/and() must be followed by a condition",
            ));
        }
        self.pending = Some(combinator);
        self
    }

    /// Combines the previous condition with the next one by OR
    pub fn or(&mut self) -> &mut Self {
        self.combine(Combinator::Or)
    }

    /// Combines the previous condition with the next one by AND
    pub fn and(&mut self) -> &mut Self {
        self.combine(Combinator::And)
    }

    /// Names the most recent condition for rebinding
    pub fn alias(&mut self, name: &str) -> &mut Self {
        if self.error.is_some() {
            return self;
        }
        let taken = self
            .items
            .iter()
            .flat_map(ConditionTree::leaves)
            .any(|c| c.alias() == Some(name));
        if taken {
            return self.fail(QueryError::invalid(format!("alias '{}' is already used", name)));
        }
        match self.items.last_mut().and_then(|t| t.leaves_mut().pop()) {
            Some(condition) => {
                condition.set_alias(name.to_string());
                self
            }
            None => self.fail(QueryError::invalid("alias() needs a preceding condition")),
        }
    }

    fn one(
        &mut self,
        property: &PropertyDescriptor,
        kind: ConditionKind,
        value: Literal,
        order: StringOrder,
    ) -> &mut Self {
        self.add(property, kind, Operands::One(value), order)
    }

    // ========== Comparisons ==========

    pub fn equal(&mut self, property: &PropertyDescriptor, value: impl Into<Literal>) -> &mut Self {
        self.one(property, ConditionKind::Equal, value.into(), StringOrder::default())
    }

    pub fn equal_str(
        &mut self,
        property: &PropertyDescriptor,
        value: &str,
        order: StringOrder,
    ) -> &mut Self {
        self.one(property, ConditionKind::Equal, value.into(), order)
    }

    pub fn not_equal(
        &mut self,
        property: &PropertyDescriptor,
        value: impl Into<Literal>,
    ) -> &mut Self {
        self.one(property, ConditionKind::NotEqual, value.into(), StringOrder::default())
    }

    pub fn not_equal_str(
        &mut self,
        property: &PropertyDescriptor,
        value: &str,
        order: StringOrder,
    ) -> &mut Self {
        self.one(property, ConditionKind::NotEqual, value.into(), order)
    }

    pub fn less(&mut self, property: &PropertyDescriptor, value: impl Into<Literal>) -> &mut Self {
        self.one(property, ConditionKind::Less, value.into(), StringOrder::default())
    }

    pub fn less_str(
        &mut self,
        property: &PropertyDescriptor,
        value: &str,
        order: StringOrder,
    ) -> &mut Self {
        self.one(property, ConditionKind::Less, value.into(), order)
    }

    pub fn greater(
        &mut self,
        property: &PropertyDescriptor,
        value: impl Into<Literal>,
    ) -> &mut Self {
        self.one(property, ConditionKind::Greater, value.into(), StringOrder::default())
    }

    pub fn greater_str(
        &mut self,
        property: &PropertyDescriptor,
        value: &str,
        order: StringOrder,
    ) -> &mut Self {
        self.one(property, ConditionKind::Greater, value.into(), order)
    }

    /// Inclusive on both ends; `low > high` matches nothing
    pub fn between(
        &mut self,
        property: &PropertyDescriptor,
        low: impl Into<Literal>,
        high: impl Into<Literal>,
    ) -> &mut Self {
        self.add(
            property,
            ConditionKind::Between,
            Operands::Two(low.into(), high.into()),
            StringOrder::default(),
        )
    }

    /// Integer set membership; an empty set matches nothing
    pub fn in_values<L>(&mut self, property: &PropertyDescriptor, values: &[L]) -> &mut Self
    where
        L: Into<Literal> + Clone,
    {
        let values = values.iter().cloned().map(Into::into).collect();
        self.add(property, ConditionKind::In, Operands::Set(values), StringOrder::default())
    }

    pub fn in_strings(
        &mut self,
        property: &PropertyDescriptor,
        values: &[&str],
        order: StringOrder,
    ) -> &mut Self {
        let values = values.iter().map(|s| Literal::from(*s)).collect();
        self.add(property, ConditionKind::In, Operands::Set(values), order)
    }

    pub fn is_null(&mut self, property: &PropertyDescriptor) -> &mut Self {
        self.add(property, ConditionKind::IsNull, Operands::None, StringOrder::default())
    }

    pub fn not_null(&mut self, property: &PropertyDescriptor) -> &mut Self {
        self.add(property, ConditionKind::NotNull, Operands::None, StringOrder::default())
    }

    // ========== String matching ==========

    pub fn starts_with(&mut self, property: &PropertyDescriptor, prefix: &str) -> &mut Self {
        self.starts_with_order(property, prefix, StringOrder::default())
    }

    pub fn starts_with_order(
        &mut self,
        property: &PropertyDescriptor,
        prefix: &str,
        order: StringOrder,
    ) -> &mut Self {
        self.one(property, ConditionKind::StartsWith, prefix.into(), order)
    }

    pub fn ends_with(&mut self, property: &PropertyDescriptor, suffix: &str) -> &mut Self {
        self.ends_with_order(property, suffix, StringOrder::default())
    }

    pub fn ends_with_order(
        &mut self,
        property: &PropertyDescriptor,
        suffix: &str,
        order: StringOrder,
    ) -> &mut Self {
        self.one(property, ConditionKind::EndsWith, suffix.into(), order)
    }

    pub fn contains(&mut self, property: &PropertyDescriptor, part: &str) -> &mut Self {
        self.contains_order(property, part, StringOrder::default())
    }

    pub fn contains_order(
        &mut self,
        property: &PropertyDescriptor,
        part: &str,
        order: StringOrder,
    ) -> &mut Self {
        self.one(property, ConditionKind::Contains, part.into(), order)
    }

    // ========== Ordering ==========

    /// Ascending, case-insensitive, nulls first
    pub fn order(&mut self, property: &PropertyDescriptor) -> &mut Self {
        self.order_flags(property, OrderFlags::NONE)
    }

    /// Adds a sort key after the existing ones
    pub fn order_flags(&mut self, property: &PropertyDescriptor, flags: OrderFlags) -> &mut Self {
        if self.error.is_some() {
            return self;
        }
        match self.owned(property) {
            Ok(()) => {
                self.order.push(property.clone(), flags);
                self
            }
            Err(e) => self.fail(e),
        }
    }

    /// Freezes the current conditions and order into a query
    pub fn build(&self) -> Result<Query> {
        let rejected = match (&self.error, self.pending) {
            (Some(e), _) => Some(e.clone()),
            (None, Some(_)) => Some(QueryError::invalid(
                "or()/and() must be followed by a condition",
            )),
            (None, None) => None,
        };
        if let Some(e) = rejected {
            self.shared.metrics.increment_queries_rejected();
            Logger::warn(
                "QUERY_REJECTED",
                &[
                    ("entity", self.schema.name()),
                    ("code", e.code().code()),
                    ("reason", e.message()),
                ],
            );
            return Err(e.into());
        }

        let tree = ConditionTree::And(self.items.clone());
        let access = select_access_path(&tree);
        let plan = QueryPlan {
            tree,
            order: self.order.clone(),
            access,
        };

        if Logger::enabled(Severity::Trace) {
            Logger::trace(
                "QUERY_BUILD",
                &[
                    ("entity", self.schema.name()),
                    ("conditions", plan.tree.leaf_count().to_string().as_str()),
                    ("access", plan.access.as_str()),
                ],
            );
        }
        Ok(Query::new(Arc::clone(&self.shared), Arc::clone(&self.schema), plan))
    }
}
