//! Per-room runtime state and its registry.
//!
//! Entries are created on first reference and torn down when the last
//! occupant leaves; teardown cancels every timer the room owns, so an
//! empty room never keeps a recurring task alive.

use crate::content::ContentStore;
use crate::models::room::RoomDefinition;
use crate::models::types::{ObjectId, PlayerId, RoomId};
use crate::scheduler::TaskHandle;
use parking_lot::Mutex;
use std::collections::{BTreeSet, HashMap};

#[derive(Default)]
pub struct RoomState {
    pub occupants: BTreeSet<PlayerId>,
    /// Live counter map; reads fall back to the rule document's defaults
    pub flags: HashMap<String, i64>,
    /// Transient object list, seeded from the document's default objects
    pub objects: Vec<ObjectId>,
    /// Total enters since this state was created
    pub entries: u64,
    timers: HashMap<String, TaskHandle>,
}

impl RoomState {
    /// Fresh state for a room, seeded from its rule document. Default
    /// object names that the catalog cannot resolve are skipped.
    pub fn seeded(def: &RoomDefinition, content: &ContentStore) -> Self {
        let mut state = Self {
            flags: def.state.clone(),
            ..Self::default()
        };
        for name in &def.objects {
            match content.object_by_name(name) {
                Some(obj) => state.objects.push(obj.id),
                None => tracing::warn!(room = %def.id, object = name, "unknown default room object"),
            }
        }
        state
    }

    /// Counter value, falling back to the document default, then zero
    pub fn flag(&self, key: &str, def: Option<&RoomDefinition>) -> i64 {
        if let Some(v) = self.flags.get(key) {
            return *v;
        }
        def.and_then(|d| d.state.get(key).copied()).unwrap_or(0)
    }

    pub fn set_flag(&mut self, key: &str, value: i64) {
        self.flags.insert(key.to_string(), value);
    }

    /// Append a transient object; refused (false) at `cap`
    pub fn add_object(&mut self, id: ObjectId, cap: usize) -> bool {
        if self.objects.len() >= cap {
            return false;
        }
        self.objects.push(id);
        true
    }

    pub fn add_timer(&mut self, name: &str, handle: TaskHandle) {
        if let Some(old) = self.timers.insert(name.to_string(), handle) {
            old.cancel();
        }
    }

    pub fn timer_count(&self) -> usize {
        self.timers.len()
    }

    /// Cancel and drop every owned timer handle
    pub fn cancel_timers(&mut self) {
        for (_, handle) in self.timers.drain() {
            handle.cancel();
        }
    }
}

/// Registry of live room states, keyed by room id
#[derive(Default)]
pub struct RoomStates {
    rooms: Mutex<HashMap<RoomId, RoomState>>,
}

impl RoomStates {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `f` against the room's state, creating it with `seed` on first
    /// reference
    pub fn with<R>(
        &self,
        id: &RoomId,
        seed: impl FnOnce() -> RoomState,
        f: impl FnOnce(&mut RoomState) -> R,
    ) -> R {
        let mut rooms = self.rooms.lock();
        let state = rooms.entry(id.clone()).or_insert_with(seed);
        f(state)
    }

    /// Run `f` if the room has live state; `None` otherwise
    pub fn with_existing<R>(&self, id: &RoomId, f: impl FnOnce(&mut RoomState) -> R) -> Option<R> {
        let mut rooms = self.rooms.lock();
        rooms.get_mut(id).map(f)
    }

    pub fn contains(&self, id: &RoomId) -> bool {
        self.rooms.lock().contains_key(id)
    }

    pub fn occupant_count(&self, id: &RoomId) -> usize {
        self.rooms.lock().get(id).map_or(0, |s| s.occupants.len())
    }

    /// Drop the room's state, cancelling any timers it still owns
    pub fn remove(&self, id: &RoomId) {
        if let Some(mut state) = self.rooms.lock().remove(id) {
            state.cancel_timers();
        }
    }
}
