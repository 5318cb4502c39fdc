//! Shared fixtures for the integration tests
#![allow(dead_code)]

use boxquery::schema::{EntityDef, PropertyDef};
use boxquery::{Entity, EntityBox, Model, PropertyDescriptor, Store, StoreConfig, ValueType};

pub const TEST_ENTITY: &str = "TestEntity";
pub const INDEXED_ENTITY: &str = "IndexedEntity";

// =============================================================================
// Test Utilities
// =============================================================================

fn properties(indexed: bool) -> Vec<PropertyDef> {
    let maybe_indexed = |p: PropertyDef| if indexed { p.indexed() } else { p };
    vec![
        PropertyDef::new(1, "simpleBoolean", ValueType::Bool),
        PropertyDef::new(2, "simpleByte", ValueType::Byte),
        PropertyDef::new(3, "simpleShort", ValueType::Short),
        maybe_indexed(PropertyDef::new(4, "simpleInt", ValueType::Int)),
        maybe_indexed(PropertyDef::new(5, "simpleLong", ValueType::Long)),
        maybe_indexed(PropertyDef::new(6, "simpleFloat", ValueType::Float)),
        PropertyDef::new(7, "simpleDouble", ValueType::Double),
        maybe_indexed(PropertyDef::new(8, "simpleString", ValueType::String)),
    ]
}

pub fn test_model() -> Model {
    Model::new()
        .with_entity(EntityDef {
            id: 1,
            name: TEST_ENTITY.into(),
            properties: properties(false),
        })
        .and_then(|m| {
            m.with_entity(EntityDef {
                id: 2,
                name: INDEXED_ENTITY.into(),
                properties: properties(true),
            })
        })
        .expect("test model is valid")
}

pub fn open_memory_store() -> Store {
    Store::open(StoreConfig::in_memory(), test_model()).expect("in-memory store opens")
}

/// Property descriptors of the test entity
pub struct Props {
    pub boolean: PropertyDescriptor,
    pub byte: PropertyDescriptor,
    pub short: PropertyDescriptor,
    pub int: PropertyDescriptor,
    pub long: PropertyDescriptor,
    pub float: PropertyDescriptor,
    pub double: PropertyDescriptor,
    pub string: PropertyDescriptor,
}

impl Props {
    pub fn of(entity_box: &EntityBox) -> Self {
        let p = |name: &str| entity_box.property(name).expect("property exists");
        Self {
            boolean: p("simpleBoolean"),
            byte: p("simpleByte"),
            short: p("simpleShort"),
            int: p("simpleInt"),
            long: p("simpleLong"),
            float: p("simpleFloat"),
            double: p("simpleDouble"),
            string: p("simpleString"),
        }
    }
}

/// Box plus its descriptors
pub struct Fixture {
    pub store: Store,
    pub entities: EntityBox,
    pub props: Props,
}

impl Fixture {
    pub fn new(entity: &str) -> Self {
        Self::with_store(open_memory_store(), entity)
    }

    pub fn with_store(store: Store, entity: &str) -> Self {
        let entities = store.entity_box(entity).expect("entity registered");
        let props = Props::of(&entities);
        Self {
            store,
            entities,
            props,
        }
    }

    /// Scalars derived from `nr`; only the string may be null
    pub fn create(&self, text: Option<&str>, nr: i32) -> Entity {
        let p = &self.props;
        let mut entity = self
            .entities
            .new_entity()
            .with(&p.boolean, false)
            .with(&p.byte, 0i8)
            .with(&p.short, (200 + nr) as i16)
            .with(&p.int, 2000 + nr)
            .with(&p.long, 200 + nr as i64)
            .with(&p.float, 20000.0f32 + nr as f32 / 10.0)
            .with(&p.double, 0.0f64);
        if let Some(text) = text {
            entity.set(&p.string, text);
        }
        entity
    }

    pub fn put(&self, text: Option<&str>, nr: i32) -> Entity {
        let mut entity = self.create(text, nr);
        self.entities.put(&mut entity).expect("put succeeds");
        entity
    }

    /// Ten entities, nr 0..10, no strings; ids 1..=10
    pub fn put_scalars(&self) -> Vec<Entity> {
        let mut entities: Vec<Entity> = (0..10).map(|nr| self.create(None, nr)).collect();
        self.entities.put_many(&mut entities).expect("put succeeds");
        entities
    }

    /// banana, apple, bar, banana milk shake, foo bar with nr 1..=5
    pub fn put_strings(&self) -> Vec<Entity> {
        let mut entities: Vec<Entity> = ["banana", "apple", "bar", "banana milk shake", "foo bar"]
            .iter()
            .zip(1..)
            .map(|(text, nr)| self.create(Some(text), nr))
            .collect();
        self.entities.put_many(&mut entities).expect("put succeeds");
        entities
    }

    pub fn strings_of(&self, entities: &[Entity]) -> Vec<Option<String>> {
        entities
            .iter()
            .map(|e| e.get_str(&self.props.string).map(str::to_string))
            .collect()
    }

    pub fn ints_of(&self, entities: &[Entity]) -> Vec<i64> {
        entities
            .iter()
            .filter_map(|e| e.get_i64(&self.props.int))
            .collect()
    }
}

pub fn ids(entities: &[Entity]) -> Vec<u64> {
    entities.iter().map(Entity::id).collect()
}
