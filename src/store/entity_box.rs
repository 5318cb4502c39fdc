//! Per-entity access: put, get, remove and query entry point

use std::sync::Arc;

use crate::entity::Entity;
use crate::error::Result;
use crate::index::{IndexEntry, IndexKey};
use crate::observability::Logger;
use crate::query::QueryBuilder;
use crate::schema::{EntitySchema, EntityValidator, PropertyDescriptor};
use crate::storage::RecordRead;

use super::handle::StoreShared;

/// Index entries for the non-null indexed properties of `entity`
pub(crate) fn index_entries(schema: &EntitySchema, entity: &Entity) -> Vec<IndexEntry> {
    schema
        .indexed_properties()
        .filter_map(|p| entity.get(p).map(|v| (p.id, IndexKey::from_value(v))))
        .collect()
}

/// Store access scoped to one entity type
#[derive(Clone)]
pub struct EntityBox {
    shared: Arc<StoreShared>,
    schema: Arc<EntitySchema>,
}

impl EntityBox {
    pub(crate) fn new(shared: Arc<StoreShared>, schema: Arc<EntitySchema>) -> Self {
        Self { shared, schema }
    }

    pub fn schema(&self) -> &EntitySchema {
        &self.schema
    }

    /// Descriptor of a property of this entity
    pub fn property(&self, name: &str) -> Result<PropertyDescriptor> {
        Ok(self.schema.require_property(name)?.clone())
    }

    /// Unsaved entity with every property null
    pub fn new_entity(&self) -> Entity {
        Entity::new(&self.schema)
    }

    /// Inserts or replaces one entity; a zero id gets a fresh key
    pub fn put(&self, entity: &mut Entity) -> Result<u64> {
        self.put_many(std::slice::from_mut(entity))?;
        Ok(entity.id())
    }

    /// Writes all entities in one transaction.
    ///
    /// Ids are assigned only once the transaction has committed; on any
    /// failure no entity is stored and none is modified.
    pub fn put_many(&self, entities: &mut [Entity]) -> Result<usize> {
        for entity in entities.iter() {
            EntityValidator::validate(&self.schema, entity)?;
        }

        let mut txn = self.shared.storage.begin_write();
        let mut keys = Vec::with_capacity(entities.len());
        for entity in entities.iter() {
            let body = self.shared.codec.encode(entity)?;
            let entries = index_entries(&self.schema, entity);
            keys.push(txn.put(self.schema.id(), entity.id(), body, entries));
        }
        let ops = txn.commit()?;

        for (entity, key) in entities.iter_mut().zip(keys) {
            entity.set_id(key);
        }
        if ops > 0 {
            self.shared.metrics.increment_commits();
        }
        self.shared.metrics.add_records_put(entities.len() as u64);
        Logger::trace(
            "ENTITY_PUT",
            &[
                ("entity", self.schema.name()),
                ("count", entities.len().to_string().as_str()),
            ],
        );
        Ok(entities.len())
    }

    pub fn get(&self, id: u64) -> Result<Option<Entity>> {
        let txn = self.shared.storage.begin_read();
        match txn.get(self.schema.id(), id) {
            Some(bytes) => Ok(Some(self.shared.codec.decode(id, &bytes)?)),
            None => Ok(None),
        }
    }

    /// Every entity, ascending by id
    pub fn get_all(&self) -> Result<Vec<Entity>> {
        let txn = self.shared.storage.begin_read();
        let mut entities = Vec::new();
        for key in txn.scan_keys(self.schema.id()) {
            if let Some(bytes) = txn.get(self.schema.id(), key) {
                entities.push(self.shared.codec.decode(key, &bytes)?);
            }
        }
        Ok(entities)
    }

    /// Returns false if nothing was stored under `id`
    pub fn remove(&self, id: u64) -> Result<bool> {
        let mut txn = self.shared.storage.begin_write();
        if !txn.delete(self.schema.id(), id) {
            return Ok(false);
        }
        txn.commit()?;
        self.shared.metrics.increment_commits();
        self.shared.metrics.add_records_removed(1);
        Ok(true)
    }

    pub fn remove_all(&self) -> Result<usize> {
        let mut txn = self.shared.storage.begin_write();
        let removed = txn.delete_all(self.schema.id());
        if txn.commit()? > 0 {
            self.shared.metrics.increment_commits();
        }
        self.shared.metrics.add_records_removed(removed as u64);
        Ok(removed)
    }

    pub fn count(&self) -> usize {
        self.shared.storage.begin_read().count(self.schema.id())
    }

    /// Starts a query over this entity
    pub fn query(&self) -> QueryBuilder {
        QueryBuilder::new(Arc::clone(&self.shared), Arc::clone(&self.schema))
    }
}

impl std::fmt::Debug for EntityBox {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntityBox")
            .field("entity", &self.schema.name())
            .finish()
    }
}
