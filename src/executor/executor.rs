//! Query executor
//!
//! Executes a frozen plan against one snapshot. Execution flow:
//! 1. Produce candidate keys (index probe or full scan, both ascending)
//! 2. Decode each candidate and evaluate the whole condition tree
//! 3. Sort matching rows (if the plan orders)
//! 4. Apply the offset/limit window
//! 5. Materialize the surviving keys in bounded chunks
//!
//! The index only narrows the candidate set. Every condition, including
//! the one that drove the probe, is still evaluated, so an index-backed
//! execution returns exactly what a full scan would.

use crate::entity::{Entity, EntityCodec};
use crate::error::Result;
use crate::observability::MetricsRegistry;
use crate::query::{AccessPath, IndexProbe, QueryPlan};
use crate::schema::{EntitySchema, PropertyDescriptor};
use crate::storage::{RecordRead, StorageError};

use super::aggregate::{Accumulator, Aggregate, AggregateValue};
use super::filters::PredicateFilter;
use super::sorter::{ResultSorter, SortRow};
use super::window::Window;

/// Counters of one execution
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanStats {
    pub scanned: usize,
    pub matched: usize,
    pub index_used: bool,
}

/// Executes plans of one entity against a reader
pub struct QueryExecutor<'a, R: RecordRead> {
    reader: &'a R,
    codec: &'a dyn EntityCodec,
    schema: &'a EntitySchema,
    metrics: &'a MetricsRegistry,
}

impl<'a, R: RecordRead> QueryExecutor<'a, R> {
    pub fn new(
        reader: &'a R,
        codec: &'a dyn EntityCodec,
        schema: &'a EntitySchema,
        metrics: &'a MetricsRegistry,
    ) -> Self {
        Self {
            reader,
            codec,
            schema,
            metrics,
        }
    }

    /// Candidate keys for a plan, ascending.
    ///
    /// Falls back to a full scan when the chosen index has no tree.
    pub fn candidate_keys(&self, plan: &QueryPlan) -> (Vec<u64>, bool) {
        let entity_id = self.schema.id();
        let probe = plan
            .access
            .leaf()
            .and_then(|pos| plan.tree.leaf(pos))
            .and_then(|leaf| IndexProbe::for_condition(leaf).map(|p| (leaf.property().id, p)));

        let indexed = match (plan.access, probe) {
            (AccessPath::FullScan, _) | (_, None) => None,
            (_, Some((property_id, IndexProbe::Equal(key)))) => {
                self.reader.index_equal(entity_id, property_id, &key)
            }
            (_, Some((property_id, IndexProbe::Range(lower, upper)))) => self.reader.index_range(
                entity_id,
                property_id,
                lower.as_ref(),
                upper.as_ref(),
            ),
        };

        match indexed {
            Some(keys) => {
                self.metrics.increment_index_lookups();
                (keys, true)
            }
            None => (self.reader.scan_keys(entity_id), false),
        }
    }

    fn decode(&self, key: u64) -> Result<Entity> {
        let bytes = self.reader.get(self.schema.id(), key).ok_or_else(|| {
            StorageError::corrupt_body(key, "record vanished from its snapshot")
        })?;
        Ok(self.codec.decode(key, &bytes)?)
    }

    /// Decodes candidates and hands every match to `visit`
    fn scan<F>(&self, plan: &QueryPlan, mut visit: F) -> Result<ScanStats>
    where
        F: FnMut(Entity) -> Result<()>,
    {
        let filter = PredicateFilter::compile(&plan.tree);
        let (keys, index_used) = self.candidate_keys(plan);
        let mut stats = ScanStats {
            index_used,
            ..ScanStats::default()
        };

        for key in keys {
            stats.scanned += 1;
            let entity = self.decode(key)?;
            if filter.matches(&entity) {
                stats.matched += 1;
                visit(entity)?;
            }
        }

        self.metrics.add_records_scanned(stats.scanned as u64);
        Ok(stats)
    }

    /// Matching keys in candidate order, no sorting or window
    pub fn matching_keys(&self, plan: &QueryPlan) -> Result<(Vec<u64>, ScanStats)> {
        let mut keys = Vec::new();
        let stats = self.scan(plan, |entity| {
            keys.push(entity.id());
            Ok(())
        })?;
        Ok((keys, stats))
    }

    /// Matching keys in result order, windowed
    pub fn ordered_keys(&self, plan: &QueryPlan, window: Window) -> Result<(Vec<u64>, ScanStats)> {
        if plan.order.is_empty() {
            let (keys, stats) = self.matching_keys(plan)?;
            return Ok((window.apply(keys), stats));
        }

        let mut rows = Vec::new();
        let stats = self.scan(plan, |entity| {
            rows.push(SortRow::extract(&entity, &plan.order));
            Ok(())
        })?;
        ResultSorter::sort(&mut rows, &plan.order);
        let keys = rows.into_iter().map(|row| row.id).collect();
        Ok((window.apply(keys), stats))
    }

    /// Number of matches; an unconditioned plan reads the table size
    pub fn count(&self, plan: &QueryPlan) -> Result<usize> {
        if plan.tree.is_empty() {
            return Ok(self.reader.count(self.schema.id()));
        }
        let stats = self.scan(plan, |_| Ok(()))?;
        Ok(stats.matched)
    }

    /// Decodes `keys` in chunks of `batch`, stopping when `visit` returns false
    pub fn materialize<F>(&self, keys: &[u64], batch: usize, mut visit: F) -> Result<()>
    where
        F: FnMut(Entity) -> bool,
    {
        for chunk in keys.chunks(batch.max(1)) {
            let entities = chunk
                .iter()
                .map(|key| self.decode(*key))
                .collect::<Result<Vec<_>>>()?;
            for entity in entities {
                if !visit(entity) {
                    return Ok(());
                }
            }
        }
        Ok(())
    }

    pub fn aggregate(
        &self,
        plan: &QueryPlan,
        property: &PropertyDescriptor,
        aggregate: Aggregate,
    ) -> Result<AggregateValue> {
        aggregate.check(property)?;
        let mut acc = Accumulator::new(aggregate);
        self.scan(plan, |entity| {
            acc.feed(entity.get(property));
            Ok(())
        })?;
        Ok(acc.finish(property)?)
    }
}
