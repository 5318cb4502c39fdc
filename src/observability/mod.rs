//! Observability for the store and query engine
//!
//! - Structured JSON line logging with a process-wide severity filter
//! - Exact, monotonic counters
//! - Begin/complete scopes around recovery and bulk removal
//!
//! Observability is read-only: nothing here influences query results.

mod logger;
mod metrics;
mod scope;

pub use logger::{Logger, Severity};
pub use metrics::{MetricsRegistry, MetricsSnapshot};
pub use scope::ObservationScope;
