use crate::models::types::{
    HP_CAP_PER_LEVEL, HP_PER_LEVEL, NCHARMS, ObjectId, PlayerId, RoomId, SP_PER_LEVEL, SpellClass,
    SpellId,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Mutable player record handed in by the caller for one command or tick.
///
/// The inventory is the original parallel-array layout: `item_ids`,
/// `item_values` and `item_count` must agree at all times. Every mutating
/// method keeps them in step; [`PlayerSnapshot::inventory_consistent`] is the
/// check the executor asserts after each action.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerSnapshot {
    pub id: PlayerId,
    pub name: String,
    /// Original identity, held while an alternate-name charm is running
    #[serde(default)]
    pub real_name: Option<String>,
    pub location: RoomId,
    pub previous_location: RoomId,
    pub level: i32,
    pub gold: i64,
    pub hit_points: i32,
    pub spell_points: i32,
    /// Bit word of named player flags (see [`crate::models::types::player_flags`])
    pub flags: u32,
    #[serde(default)]
    pub spouse: Option<String>,

    pub item_ids: Vec<ObjectId>,
    pub item_values: Vec<i32>,
    pub item_count: usize,

    /// Spellbook ownership bitfields, one bit per spell id
    pub offense_spells: u64,
    pub defense_spells: u64,
    pub other_spells: u64,
    /// Castable-now slots, oldest first
    pub memorized: Vec<SpellId>,

    /// Countdown slots; a slot at zero is inactive
    pub charms: [i32; NCHARMS],
    /// Reset by the spell tick
    pub actions_this_tick: u32,
    /// Per-level description pointer, initialized on first use
    #[serde(default)]
    pub desc_cursor: HashMap<i32, i32>,
}

impl PlayerSnapshot {
    pub fn new(id: PlayerId, name: impl Into<String>, location: RoomId) -> Self {
        Self {
            id,
            name: name.into(),
            real_name: None,
            previous_location: location.clone(),
            location,
            level: 1,
            gold: 0,
            hit_points: HP_PER_LEVEL,
            spell_points: SP_PER_LEVEL,
            flags: 0,
            spouse: None,
            item_ids: Vec::new(),
            item_values: Vec::new(),
            item_count: 0,
            offense_spells: 0,
            defense_spells: 0,
            other_spells: 0,
            memorized: Vec::new(),
            charms: [0; NCHARMS],
            actions_this_tick: 0,
            desc_cursor: HashMap::new(),
        }
    }

    // ---- Inventory ----

    pub fn inventory_consistent(&self) -> bool {
        self.item_ids.len() == self.item_values.len() && self.item_ids.len() == self.item_count
    }

    pub fn find_item(&self, id: ObjectId) -> Option<usize> {
        self.item_ids.iter().position(|&i| i == id)
    }

    pub fn has_item(&self, id: ObjectId) -> bool {
        self.find_item(id).is_some()
    }

    /// Append an item; refused (false) when the inventory is at `cap`.
    pub fn give_item(&mut self, id: ObjectId, value: i32, cap: usize) -> bool {
        if self.item_count >= cap {
            return false;
        }
        self.item_ids.push(id);
        self.item_values.push(value);
        self.item_count += 1;
        true
    }

    /// Remove the slot at `index`; out-of-range indexes are ignored.
    pub fn remove_item_at(&mut self, index: usize) {
        if index >= self.item_ids.len() {
            return;
        }
        self.item_ids.remove(index);
        self.item_values.remove(index);
        self.item_count -= 1;
    }

    // ---- Flags ----

    pub fn has_flag(&self, bit: u32) -> bool {
        self.flags & bit != 0
    }

    pub fn set_flag(&mut self, bit: u32, on: bool) {
        if on {
            self.flags |= bit;
        } else {
            self.flags &= !bit;
        }
    }

    // ---- Spells ----

    pub fn spellbook(&self, class: SpellClass) -> u64 {
        match class {
            SpellClass::Offense => self.offense_spells,
            SpellClass::Defense => self.defense_spells,
            SpellClass::Other => self.other_spells,
        }
    }

    pub fn owns_spell(&self, class: SpellClass, id: SpellId) -> bool {
        self.spellbook(class) & (1u64 << (id.0 % 64)) != 0
    }

    pub fn grant_spell(&mut self, class: SpellClass, id: SpellId) {
        let bit = 1u64 << (id.0 % 64);
        match class {
            SpellClass::Offense => self.offense_spells |= bit,
            SpellClass::Defense => self.defense_spells |= bit,
            SpellClass::Other => self.other_spells |= bit,
        }
    }

    /// Memorize a spell; at `cap` slots the oldest one is evicted.
    pub fn memorize(&mut self, id: SpellId, cap: usize) {
        if self.memorized.len() >= cap {
            self.memorized.remove(0);
        }
        self.memorized.push(id);
    }

    // ---- Progression ----

    /// The standard level increment shared by `level_up`, gate rewards and
    /// external callers: bump level, advance the per-level description
    /// pointer, add the fixed hit/spell point increments.
    pub fn level_up(&mut self) {
        self.level += 1;
        self.desc_cursor
            .entry(self.level)
            .and_modify(|c| *c += 1)
            .or_insert(1);
        self.hit_points += HP_PER_LEVEL;
        self.spell_points += SP_PER_LEVEL;
    }

    /// Add hit points; when `capped`, never past `level * HP_CAP_PER_LEVEL`.
    pub fn heal(&mut self, amount: i32, capped: bool) {
        self.hit_points += amount;
        if capped {
            let cap = self.level * HP_CAP_PER_LEVEL;
            if self.hit_points > cap {
                self.hit_points = cap;
            }
        }
    }

    pub fn damage(&mut self, amount: i32) {
        self.hit_points = (self.hit_points - amount).max(0);
    }
}
