//! Record store subsystem
//!
//! Holds the entity records as opaque bytes keyed by a 64-bit key, with
//! per-property indexes alongside. Persistent stores keep an append-only
//! record log and rebuild everything from it on open.
//!
//! # Design Principles
//!
//! - Append-only log, no in-place updates
//! - Checksum-verified on every read of the log
//! - Halt on corruption
//! - Readers see whole committed transactions only

mod checksum;
mod engine;
mod errors;
mod reader;
mod record;
mod state;
mod txn;
mod writer;

pub use checksum::compute_checksum;
pub use engine::Storage;
pub use errors::{Location, StorageError, StorageErrorCode, StorageResult};
pub use reader::LogReader;
pub use record::{LogOp, LogRecord};
pub use state::StoreState;
pub use txn::{ReadTxn, RecordRead, WriteTxn};
pub use writer::{log_path, LogWriter};
