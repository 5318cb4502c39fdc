//! Storage handle: snapshot publication and log recovery

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use crate::config::StoreConfig;
use crate::index::IndexEntry;
use crate::observability::{Logger, ObservationScope, Severity};

use super::errors::StorageResult;
use super::reader::LogReader;
use super::record::LogOp;
use super::state::StoreState;
use super::txn::{ReadTxn, WriteTxn};
use super::writer::{log_path, LogWriter};

/// Writer-side state guarded by the writer lock
pub struct WriterSlot {
    pub(crate) log: Option<LogWriter>,
    pub(crate) commit_seq: u64,
}

/// The record store.
///
/// Readers never block on writers: they clone the current snapshot `Arc`.
/// Writers are serialized by the writer lock, which is held from
/// `begin_write` until commit or abort.
pub struct Storage {
    current: RwLock<Arc<StoreState>>,
    writer: Mutex<WriterSlot>,
    sync_on_commit: bool,
    path: Option<PathBuf>,
}

struct Recovered {
    state: StoreState,
    committed_end: u64,
    file_size: u64,
    commits: u64,
    frames: u64,
    last_sequence: u64,
    discarded: usize,
}

impl Storage {
    /// Opens the store described by `config`.
    ///
    /// Persistent stores replay their record log; any checksum or framing
    /// failure aborts the open with `BOX_DATA_CORRUPTION`. Frames after
    /// the last commit frame belong to an unfinished transaction and are
    /// cut off.
    pub fn open(config: &StoreConfig) -> StorageResult<Self> {
        let Some(data_dir) = config.data_dir.as_deref() else {
            return Ok(Self::in_memory());
        };

        let mut log = LogWriter::open(data_dir)?;
        let recovered = Self::recover(log.path())?;

        if recovered.committed_end < recovered.file_size {
            Logger::warn(
                "LOG_TAIL_DISCARDED",
                &[
                    ("frames", recovered.discarded.to_string().as_str()),
                    ("offset", recovered.committed_end.to_string().as_str()),
                ],
            );
            log.truncate_to(recovered.committed_end)?;
        }

        Ok(Self {
            current: RwLock::new(Arc::new(recovered.state)),
            writer: Mutex::new(WriterSlot {
                log: Some(log),
                commit_seq: recovered.last_sequence,
            }),
            sync_on_commit: config.sync_on_commit,
            path: Some(log_path(data_dir)),
        })
    }

    pub fn in_memory() -> Self {
        Self {
            current: RwLock::new(Arc::new(StoreState::default())),
            writer: Mutex::new(WriterSlot {
                log: None,
                commit_seq: 0,
            }),
            sync_on_commit: false,
            path: None,
        }
    }

    fn recover(path: &Path) -> StorageResult<Recovered> {
        let path_field = path.display().to_string();
        let scope =
            ObservationScope::with_fields("STORE_RECOVERY", &[("path", path_field.as_str())]);

        match Self::replay(path) {
            Ok(recovered) => {
                scope.complete_with_fields(&[
                    ("commits", recovered.commits.to_string().as_str()),
                    ("frames", recovered.frames.to_string().as_str()),
                ]);
                Logger::info(
                    "STORE_RECOVERED",
                    &[
                        ("path", path_field.as_str()),
                        ("sequence", recovered.last_sequence.to_string().as_str()),
                    ],
                );
                Ok(recovered)
            }
            Err(e) => {
                if e.is_fatal() {
                    Logger::fatal(
                        "STORAGE_CORRUPTION",
                        &[("path", path_field.as_str()), ("error", e.to_string().as_str())],
                    );
                }
                scope.fail(Severity::Error, &e.to_string());
                Err(e)
            }
        }
    }

    fn replay(path: &Path) -> StorageResult<Recovered> {
        let mut reader = LogReader::open(path)?;
        let mut state = StoreState::default();
        let mut batch = Vec::new();
        let mut recovered_commits = 0;
        let mut frames = 0;
        let mut committed_end = 0;
        let mut last_sequence = 0;

        while let Some(record) = reader.read_next()? {
            frames += 1;
            if record.op == LogOp::Commit {
                for staged in batch.drain(..) {
                    state.apply(&staged);
                }
                committed_end = reader.current_offset();
                last_sequence = record.key;
                recovered_commits += 1;
            } else {
                batch.push(record);
            }
        }

        Ok(Recovered {
            state,
            committed_end,
            file_size: reader.file_size(),
            commits: recovered_commits,
            frames,
            last_sequence,
            discarded: batch.len(),
        })
    }

    /// Pins the current snapshot
    pub fn begin_read(&self) -> ReadTxn {
        let current = self.current.read().unwrap_or_else(PoisonError::into_inner);
        ReadTxn::new(Arc::clone(&current))
    }

    /// Starts an exclusive write transaction, blocking other writers
    pub fn begin_write(&self) -> WriteTxn<'_> {
        let writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        let state = {
            let current = self.current.read().unwrap_or_else(PoisonError::into_inner);
            StoreState::clone(&current)
        };
        WriteTxn::new(self, writer, state)
    }

    /// Recomputes the indexes of one entity from its stored bodies.
    ///
    /// Index entries in the log reflect the model at write time; callers
    /// rebuild after open so the indexes match the current model. Holds
    /// the writer lock and publishes a new snapshot without logging.
    pub fn rebuild_indexes<F>(&self, entity_id: u32, mut derive: F) -> StorageResult<usize>
    where
        F: FnMut(u64, &[u8]) -> StorageResult<Vec<IndexEntry>>,
    {
        let _writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        let mut state = {
            let current = self.current.read().unwrap_or_else(PoisonError::into_inner);
            StoreState::clone(&current)
        };
        let visited = state.rebuild_indexes(entity_id, &mut derive)?;
        self.publish(state);
        Ok(visited)
    }

    pub(crate) fn publish(&self, state: StoreState) {
        let mut current = self.current.write().unwrap_or_else(PoisonError::into_inner);
        *current = Arc::new(state);
    }

    pub fn sync_on_commit(&self) -> bool {
        self.sync_on_commit
    }

    /// Record log path, `None` for in-memory stores
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}
