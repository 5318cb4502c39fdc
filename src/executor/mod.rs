//! Query execution subsystem
//!
//! The executor consumes frozen plans and produces deterministic results
//! from one consistent snapshot.
//!
//! # Execution Flow (strict order)
//!
//! 1. Obtain candidate keys from the access path
//! 2. Decode every candidate through the entity codec
//! 3. Evaluate the full condition tree
//! 4. Sort (if the plan orders), ties by ascending id
//! 5. Apply offset and limit
//! 6. Materialize in bounded chunks
//!
//! # Design Principles
//!
//! - Same plan + same snapshot = same results
//! - An undecodable body fails the execution, it is never skipped
//! - Index probes narrow, they never decide

mod aggregate;
#[allow(clippy::module_inception)]
mod executor;
mod filters;
mod sorter;
mod window;

pub use aggregate::{Accumulator, Aggregate, AggregateValue};
pub use executor::{QueryExecutor, ScanStats};
pub use filters::{fold_case, PredicateFilter};
pub use sorter::{ResultSorter, SortRow, SortValue};
pub use window::Window;
