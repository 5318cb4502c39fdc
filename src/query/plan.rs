//! Frozen queries
//!
//! A `Query` owns its plan behind a lock. Executions copy the plan out
//! under the read lock and run against their own snapshot, so a
//! concurrent rebind is seen either entirely or not at all.

use std::sync::{Arc, PoisonError, RwLock};

use crate::entity::Entity;
use crate::error::Result;
use crate::executor::{Aggregate, AggregateValue, QueryExecutor, Window};
use crate::observability::{Logger, ObservationScope, Severity};
use crate::schema::{EntitySchema, PropertyDescriptor};
use crate::storage::ReadTxn;
use crate::store::StoreShared;

use super::access::AccessPath;
use super::condition::{ConditionTree, Literal, Operands};
use super::errors::QueryError;
use super::explain::ExplainPlan;
use super::order::OrderSpec;

/// Everything an execution needs to know about a query
#[derive(Debug, Clone, PartialEq)]
pub struct QueryPlan {
    pub tree: ConditionTree,
    pub order: OrderSpec,
    pub access: AccessPath,
}

impl Default for QueryPlan {
    fn default() -> Self {
        Self {
            tree: ConditionTree::default(),
            order: OrderSpec::new(),
            access: AccessPath::FullScan,
        }
    }
}

/// A built, reusable query over one entity
pub struct Query {
    shared: Arc<StoreShared>,
    schema: Arc<EntitySchema>,
    plan: RwLock<QueryPlan>,
}

impl Query {
    pub(crate) fn new(
        shared: Arc<StoreShared>,
        schema: Arc<EntitySchema>,
        plan: QueryPlan,
    ) -> Self {
        Self {
            shared,
            schema,
            plan: RwLock::new(plan),
        }
    }

    pub fn schema(&self) -> &EntitySchema {
        &self.schema
    }

    /// Copy of the current plan
    pub fn plan(&self) -> QueryPlan {
        self.plan
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn run<T, F>(&self, op: &str, execute: F) -> Result<T>
    where
        F: FnOnce(&QueryExecutor<'_, ReadTxn>, &QueryPlan) -> Result<T>,
    {
        let plan = self.plan();
        let txn = self.shared.storage.begin_read();
        let executor = QueryExecutor::new(
            &txn,
            self.shared.codec.as_ref(),
            &self.schema,
            &self.shared.metrics,
        );
        self.shared.metrics.increment_queries_executed();
        let result = execute(&executor, &plan);

        if Logger::enabled(Severity::Trace) {
            Logger::trace(
                "QUERY_EXECUTE",
                &[
                    ("entity", self.schema.name()),
                    ("op", op),
                    ("access", plan.access.as_str()),
                    ("ok", if result.is_ok() { "true" } else { "false" }),
                ],
            );
        }
        result
    }

    fn check_owned(&self, property: &PropertyDescriptor) -> Result<()> {
        if self.schema.owns(property) {
            Ok(())
        } else {
            Err(QueryError::unknown_property(self.schema.name(), &property.name).into())
        }
    }

    // ========== Execution ==========

    /// All matches in result order
    pub fn find(&self) -> Result<Vec<Entity>> {
        self.find_range(0, 0)
    }

    /// Matches after skipping `offset`, at most `limit` of them (0 = all)
    pub fn find_range(&self, offset: usize, limit: usize) -> Result<Vec<Entity>> {
        let batch = self.shared.config.materialize_batch;
        self.run("find", |executor, plan| {
            let (keys, _) = executor.ordered_keys(plan, Window::new(offset, limit))?;
            let mut entities = Vec::with_capacity(keys.len());
            executor.materialize(&keys, batch, |entity| {
                entities.push(entity);
                true
            })?;
            Ok(entities)
        })
    }

    pub fn find_first(&self) -> Result<Option<Entity>> {
        Ok(self.find_range(0, 1)?.into_iter().next())
    }

    /// The single match, if any; more than one is `NonUniqueResult`
    pub fn find_unique(&self) -> Result<Option<Entity>> {
        self.run("find_unique", |executor, plan| {
            let (keys, _) = executor.matching_keys(plan)?;
            if keys.len() > 1 {
                return Err(QueryError::non_unique_result(keys.len()).into());
            }
            let mut found = None;
            executor.materialize(&keys, 1, |entity| {
                found = Some(entity);
                false
            })?;
            Ok(found)
        })
    }

    /// Keys of the matches in result order
    pub fn find_ids(&self) -> Result<Vec<u64>> {
        self.run("find_ids", |executor, plan| {
            Ok(executor.ordered_keys(plan, Window::all())?.0)
        })
    }

    /// Keys of the matches, ignoring the plan's order
    pub fn find_keys_unordered(&self) -> Result<Vec<u64>> {
        self.run("find_keys_unordered", |executor, plan| {
            Ok(executor.matching_keys(plan)?.0)
        })
    }

    /// Streams matches in result order until `visitor` returns false
    pub fn for_each<F>(&self, visitor: F) -> Result<()>
    where
        F: FnMut(Entity) -> bool,
    {
        let batch = self.shared.config.materialize_batch;
        self.run("for_each", |executor, plan| {
            let (keys, _) = executor.ordered_keys(plan, Window::all())?;
            executor.materialize(&keys, batch, visitor)
        })
    }

    pub fn count(&self) -> Result<usize> {
        self.run("count", |executor, plan| executor.count(plan))
    }

    /// Removes every match in one transaction; returns how many
    pub fn remove(&self) -> Result<usize> {
        let plan = self.plan();
        let scope =
            ObservationScope::with_fields("QUERY_REMOVE", &[("entity", self.schema.name())]);

        let result = (|| -> Result<(usize, usize)> {
            let mut txn = self.shared.storage.begin_write();
            let keys = {
                let executor = QueryExecutor::new(
                    &txn,
                    self.shared.codec.as_ref(),
                    &self.schema,
                    &self.shared.metrics,
                );
                executor.matching_keys(&plan)?.0
            };
            for key in &keys {
                txn.delete(self.schema.id(), *key);
            }
            let ops = txn.commit()?;
            Ok((keys.len(), ops))
        })();

        self.shared.metrics.increment_queries_executed();
        match result {
            Ok((removed, ops)) => {
                if ops > 0 {
                    self.shared.metrics.increment_commits();
                }
                self.shared.metrics.add_records_removed(removed as u64);
                scope.complete_with_fields(&[("removed", removed.to_string().as_str())]);
                Ok(removed)
            }
            Err(e) => {
                scope.fail(Severity::Error, e.to_string().as_str());
                Err(e)
            }
        }
    }

    // ========== Aggregates ==========

    fn aggregate(
        &self,
        property: &PropertyDescriptor,
        aggregate: Aggregate,
    ) -> Result<AggregateValue> {
        self.check_owned(property)?;
        self.run(aggregate.as_str(), |executor, plan| {
            executor.aggregate(plan, property, aggregate)
        })
    }

    /// Smallest value of an integer property (0 over no matches)
    pub fn min(&self, property: &PropertyDescriptor) -> Result<i64> {
        Ok(self.aggregate(property, Aggregate::Min)?.as_i64())
    }

    pub fn max(&self, property: &PropertyDescriptor) -> Result<i64> {
        Ok(self.aggregate(property, Aggregate::Max)?.as_i64())
    }

    /// Fails with `AggregateOverflow` when the total leaves i64
    pub fn sum(&self, property: &PropertyDescriptor) -> Result<i64> {
        Ok(self.aggregate(property, Aggregate::Sum)?.as_i64())
    }

    /// Mean of any numeric property
    pub fn avg(&self, property: &PropertyDescriptor) -> Result<f64> {
        Ok(self.aggregate(property, Aggregate::Avg)?.as_f64())
    }

    pub fn min_double(&self, property: &PropertyDescriptor) -> Result<f64> {
        Ok(self.aggregate(property, Aggregate::MinDouble)?.as_f64())
    }

    pub fn max_double(&self, property: &PropertyDescriptor) -> Result<f64> {
        Ok(self.aggregate(property, Aggregate::MaxDouble)?.as_f64())
    }

    pub fn sum_double(&self, property: &PropertyDescriptor) -> Result<f64> {
        Ok(self.aggregate(property, Aggregate::SumDouble)?.as_f64())
    }

    // ========== Parameters ==========

    /// Replaces the operand of the one condition on `property`
    pub fn set_parameter(
        &self,
        property: &PropertyDescriptor,
        value: impl Into<Literal>,
    ) -> Result<()> {
        self.rebind_property(property, Operands::One(value.into()))
    }

    /// Replaces both bounds of the one condition on `property`
    pub fn set_parameters(
        &self,
        property: &PropertyDescriptor,
        first: impl Into<Literal>,
        second: impl Into<Literal>,
    ) -> Result<()> {
        self.rebind_property(property, Operands::Two(first.into(), second.into()))
    }

    /// Replaces the value set of the one condition on `property`
    pub fn set_parameter_values<L>(&self, property: &PropertyDescriptor, values: &[L]) -> Result<()>
    where
        L: Into<Literal> + Clone,
    {
        let values = values.iter().cloned().map(Into::into).collect();
        self.rebind_property(property, Operands::Set(values))
    }

    pub fn set_alias_parameter(&self, alias: &str, value: impl Into<Literal>) -> Result<()> {
        self.rebind_alias(alias, Operands::One(value.into()))
    }

    pub fn set_alias_parameters(
        &self,
        alias: &str,
        first: impl Into<Literal>,
        second: impl Into<Literal>,
    ) -> Result<()> {
        self.rebind_alias(alias, Operands::Two(first.into(), second.into()))
    }

    pub fn set_alias_parameter_values<L>(&self, alias: &str, values: &[L]) -> Result<()>
    where
        L: Into<Literal> + Clone,
    {
        let values = values.iter().cloned().map(Into::into).collect();
        self.rebind_alias(alias, Operands::Set(values))
    }

    fn rebind_property(&self, property: &PropertyDescriptor, operands: Operands) -> Result<()> {
        self.check_owned(property)?;
        {
            let mut plan = self.plan.write().unwrap_or_else(PoisonError::into_inner);
            let mut matches: Vec<_> = plan
                .tree
                .leaves_mut()
                .into_iter()
                .filter(|c| c.property().id == property.id)
                .collect();
            match matches.len() {
                0 => return Err(QueryError::property_not_in_plan(&property.name).into()),
                1 => matches[0].rebind(operands, &property.name)?,
                n => return Err(QueryError::ambiguous_property(&property.name, n).into()),
            }
        }
        self.rebound(&property.name);
        Ok(())
    }

    fn rebind_alias(&self, alias: &str, operands: Operands) -> Result<()> {
        {
            let mut plan = self.plan.write().unwrap_or_else(PoisonError::into_inner);
            let mut matches: Vec<_> = plan
                .tree
                .leaves_mut()
                .into_iter()
                .filter(|c| c.alias() == Some(alias))
                .collect();
            match matches.len() {
                0 => return Err(QueryError::unknown_alias(alias).into()),
                1 => matches[0].rebind(operands, alias)?,
                n => return Err(QueryError::ambiguous_property(alias, n).into()),
            }
        }
        self.rebound(alias);
        Ok(())
    }

    fn rebound(&self, target: &str) {
        self.shared.metrics.increment_parameters_rebound();
        Logger::trace(
            "QUERY_REBIND",
            &[("entity", self.schema.name()), ("target", target)],
        );
    }

    // ========== Introspection ==========

    pub fn explain(&self) -> ExplainPlan {
        ExplainPlan::from_plan(&self.schema, &self.plan())
    }

    /// Multi-line description of access path, filter and order
    pub fn describe(&self) -> String {
        self.explain().to_string()
    }

    /// One line per condition with its current operands
    pub fn describe_parameters(&self) -> String {
        self.plan()
            .tree
            .leaves()
            .iter()
            .map(|c| c.to_string())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl std::fmt::Debug for Query {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Query")
            .field("entity", &self.schema.name())
            .field("plan", &self.plan())
            .finish()
    }
}
