pub mod loader;

use crate::error::{EngineError, EngineResult};
use crate::models::room::RoomDefinition;
use crate::models::types::{ObjectId, RoomId, SpellClass, SpellId};
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;

/// Catalog entry for a world object
#[derive(Debug, Clone, Deserialize)]
pub struct ObjectDef {
    pub id: ObjectId,
    pub name: String,
    #[serde(default)]
    pub nouns: Vec<String>,
    pub short: String,
    #[serde(default)]
    pub value: i32,
}

/// Catalog entry for a spell; `price` marks it purchasable
#[derive(Debug, Clone, Deserialize)]
pub struct SpellDef {
    pub id: SpellId,
    pub name: String,
    pub class: SpellClass,
    #[serde(default)]
    pub price: Option<i64>,
}

/// Immutable lookup data the engine consumes: object and spell catalogs,
/// message templates, per-room rule documents. Built once by the loader and
/// swapped wholesale on hot reload.
#[derive(Debug, Default)]
pub struct ContentStore {
    objects_by_name: HashMap<String, Arc<ObjectDef>>,
    objects_by_id: HashMap<ObjectId, Arc<ObjectDef>>,
    spells_by_name: HashMap<String, Arc<SpellDef>>,
    spells_by_id: HashMap<SpellId, Arc<SpellDef>>,
    messages: HashMap<String, String>,
    rooms: HashMap<RoomId, Arc<RoomDefinition>>,
}

impl ContentStore {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_parts(
        objects: Vec<ObjectDef>,
        spells: Vec<SpellDef>,
        messages: HashMap<String, String>,
        rooms: Vec<RoomDefinition>,
    ) -> EngineResult<Self> {
        let mut store = Self {
            messages,
            ..Self::default()
        };

        for obj in objects {
            let obj = Arc::new(obj);
            store.objects_by_id.insert(obj.id, obj.clone());
            store.objects_by_name.insert(obj.name.to_lowercase(), obj.clone());
            for noun in &obj.nouns {
                store.objects_by_name.entry(noun.to_lowercase()).or_insert_with(|| obj.clone());
            }
        }

        for spell in spells {
            let spell = Arc::new(spell);
            store.spells_by_id.insert(spell.id, spell.clone());
            store.spells_by_name.insert(spell.name.to_lowercase(), spell);
        }

        for room in rooms {
            let id = room.id.clone();
            if store.rooms.insert(id.clone(), Arc::new(room)).is_some() {
                return Err(EngineError::DuplicateRoom(id));
            }
        }

        Ok(store)
    }

    pub fn object_by_name(&self, name: &str) -> Option<&ObjectDef> {
        self.objects_by_name.get(&name.to_lowercase()).map(Arc::as_ref)
    }

    pub fn object_by_id(&self, id: ObjectId) -> Option<&ObjectDef> {
        self.objects_by_id.get(&id).map(Arc::as_ref)
    }

    pub fn spell_by_name(&self, name: &str) -> Option<&SpellDef> {
        self.spells_by_name.get(&name.to_lowercase()).map(Arc::as_ref)
    }

    pub fn spell_by_id(&self, id: SpellId) -> Option<&SpellDef> {
        self.spells_by_id.get(&id).map(Arc::as_ref)
    }

    /// Message template for a known id, `None` for literals
    pub fn message(&self, id: &str) -> Option<&str> {
        self.messages.get(id).map(String::as_str)
    }

    pub fn room(&self, id: &RoomId) -> Option<Arc<RoomDefinition>> {
        self.rooms.get(id).cloned()
    }

    pub fn rooms(&self) -> impl Iterator<Item = &Arc<RoomDefinition>> {
        self.rooms.values()
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }
}
