use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(pub i64);

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Rooms are keyed by the id of their rule document ("entry", "stump_glade").
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomId(pub String);

impl RoomId {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for RoomId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObjectId(pub u32);

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SpellId(pub u32);

impl fmt::Display for SpellId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Which spellbook bitfield a spell lives in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpellClass {
    Offense,
    Defense,
    Other,
}

// ---- World constants ----

/// Hit points gained per level
pub const HP_PER_LEVEL: i32 = 4;
/// Spell points gained per level
pub const SP_PER_LEVEL: i32 = 2;
/// Healing actions cap hit points at `level * HP_CAP_PER_LEVEL`
pub const HP_CAP_PER_LEVEL: i32 = 8;
/// Spell points restored per spell tick, capped at `2 * level`
pub const SP_REGEN: i32 = 2;
/// Charm countdown slots per player
pub const NCHARMS: usize = 10;
/// The charm slot that carries an alternate identity while it runs
pub const CHARM_ALTER_NAME: usize = 9;
/// Nested branch actions deeper than this are discarded
pub const MAX_BRANCH_DEPTH: u8 = 8;

/// Capacity limits, overridable through [`crate::config::Config`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Limits {
    /// Inventory slots per player (MXPOBS)
    pub inventory: usize,
    /// Memorized spell slots per player (MAXSPL)
    pub memorized: usize,
    /// Transient objects per room (MXROBJ)
    pub room_objects: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            inventory: 16,
            memorized: 10,
            room_objects: 24,
        }
    }
}

// ---- Player flag word ----

pub mod player_flags {
    pub const BRIEF: u32 = 1 << 0;
    pub const MARRIED: u32 = 1 << 1;
    /// Alternate-name transformation is active
    pub const ALTERED: u32 = 1 << 2;
    pub const INVISIBLE: u32 = 1 << 3;
    pub const HASTED: u32 = 1 << 4;
    pub const PROTECTED: u32 = 1 << 5;
    pub const BLESSED: u32 = 1 << 6;

    /// Flags cleared together when the alternate-name charm runs out
    pub const TRANSFORM_BUNDLE: u32 = ALTERED | INVISIBLE | HASTED;

    /// Resolve a content-authored flag name to its bit
    pub fn by_name(name: &str) -> Option<u32> {
        match name {
            "brief" => Some(BRIEF),
            "married" => Some(MARRIED),
            "altered" => Some(ALTERED),
            "invisible" => Some(INVISIBLE),
            "hasted" => Some(HASTED),
            "protected" => Some(PROTECTED),
            "blessed" => Some(BLESSED),
            _ => None,
        }
    }
}
