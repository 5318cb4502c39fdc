//! Query subsystem
//!
//! Queries are assembled with a [`QueryBuilder`], frozen into a [`Query`]
//! holding a condition tree, an order and an access path, then executed
//! any number of times. Operands of a frozen query can be replaced through
//! the rebinder methods; structure cannot.
//!
//! # Design Principles
//!
//! - Reject at build time: every operand is type-checked before a query exists
//! - One property, one comparison domain: integer literals widen to floats,
//!   nothing narrows
//! - Deterministic results: ties always break by ascending id
//! - Access paths only narrow candidates, they never change results

mod access;
mod builder;
mod condition;
mod errors;
mod explain;
mod order;
mod plan;

pub use access::{index_key_for, select_access_path, AccessPath, IndexProbe};
pub use builder::QueryBuilder;
pub use condition::{Condition, ConditionKind, ConditionTree, Literal, Operands, StringOrder};
pub use errors::{QueryError, QueryErrorCode, QueryResult, Severity};
pub use explain::ExplainPlan;
pub use order::{OrderFlags, OrderKey, OrderSpec};
pub use plan::{Query, QueryPlan};
