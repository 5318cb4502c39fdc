//! Store handle
//!
//! A `Store` is cheap to clone; every clone, box and query shares one
//! `StoreShared` holding the storage engine, the model and the metrics.

use std::path::Path;
use std::sync::Arc;

use crate::config::StoreConfig;
use crate::entity::{EntityCodec, JsonCodec};
use crate::error::Result;
use crate::observability::{Logger, MetricsRegistry, MetricsSnapshot};
use crate::schema::{Model, SchemaError};
use crate::storage::Storage;

use super::entity_box::{index_entries, EntityBox};

pub(crate) struct StoreShared {
    pub(crate) storage: Storage,
    pub(crate) model: Model,
    pub(crate) config: StoreConfig,
    pub(crate) metrics: MetricsRegistry,
    pub(crate) codec: Arc<dyn EntityCodec>,
}

/// An open object store
#[derive(Clone)]
pub struct Store {
    inner: Arc<StoreShared>,
}

impl Store {
    /// Opens a store with the JSON entity codec.
    ///
    /// Persistent stores replay their record log before this returns.
    pub fn open(config: StoreConfig, model: Model) -> Result<Self> {
        Self::open_with_codec(config, model, Arc::new(JsonCodec))
    }

    pub fn open_with_codec(
        config: StoreConfig,
        model: Model,
        codec: Arc<dyn EntityCodec>,
    ) -> Result<Self> {
        config.validate()?;
        Logger::set_level(config.log_level);

        if model.is_empty() {
            return Err(SchemaError::schema_invalid("model declares no entities").into());
        }

        let storage = Storage::open(&config)?;
        if !config.is_in_memory() {
            Self::rebuild_indexes(&storage, &model, codec.as_ref())?;
        }
        Logger::info(
            "STORE_OPEN",
            &[
                ("mode", if config.is_in_memory() { "memory" } else { "persistent" }),
                ("entities", model.len().to_string().as_str()),
            ],
        );

        Ok(Self {
            inner: Arc::new(StoreShared {
                storage,
                model,
                config,
                metrics: MetricsRegistry::new(),
                codec,
            }),
        })
    }

    /// Derives every index from the replayed bodies under the current
    /// model, so a property indexed since the records were written still
    /// finds them.
    fn rebuild_indexes(storage: &Storage, model: &Model, codec: &dyn EntityCodec) -> Result<()> {
        for schema in model.entities() {
            let visited = storage.rebuild_indexes(schema.id(), |key, body| {
                let entity = codec.decode(key, body)?;
                Ok(index_entries(schema, &entity))
            })?;
            if visited > 0 {
                Logger::info(
                    "INDEX_REBUILD",
                    &[
                        ("entity", schema.name()),
                        ("records", visited.to_string().as_str()),
                    ],
                );
            }
        }
        Ok(())
    }

    /// Box for the entity named `name`
    pub fn entity_box(&self, name: &str) -> Result<EntityBox> {
        let schema = self.inner.model.require_entity(name)?;
        Ok(EntityBox::new(Arc::clone(&self.inner), schema))
    }

    pub fn model(&self) -> &Model {
        &self.inner.model
    }

    pub fn config(&self) -> &StoreConfig {
        &self.inner.config
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.inner.metrics.snapshot()
    }

    pub fn metrics_json(&self) -> String {
        self.inner.metrics.to_json()
    }

    /// Record log path, `None` for in-memory stores
    pub fn path(&self) -> Option<&Path> {
        self.inner.storage.path()
    }
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store")
            .field("path", &self.path())
            .field("entities", &self.inner.model.len())
            .finish()
    }
}
