use crate::models::action::Action;
use crate::models::types::RoomId;
use serde::Deserialize;
use std::collections::HashMap;

/// Immutable per-room rule document, loaded once at content load.
/// Trigger order is significant: the first full match wins.
#[derive(Debug, Clone, Deserialize)]
pub struct RoomDefinition {
    pub id: RoomId,
    #[serde(default)]
    pub name: Option<String>,
    /// Defaults for the room-state counter map
    #[serde(default)]
    pub state: HashMap<String, i64>,
    /// Default transient object names, resolved against the object catalog
    /// when the room's runtime state is first created
    #[serde(default)]
    pub objects: Vec<String>,
    #[serde(default)]
    pub triggers: Vec<Trigger>,
    /// Hook actions run on every enter/exit
    #[serde(default)]
    pub on_enter: Vec<Action>,
    #[serde(default)]
    pub on_exit: Vec<Action>,
    /// Recurring flavor, armed while the room is occupied
    #[serde(default)]
    pub ambience: Vec<AmbienceSpec>,
}

/// One room rule: verb set, AND-combined predicate clauses, action list.
/// Every predicate field is optional; absent clauses always hold.
#[derive(Debug, Clone, Deserialize)]
pub struct Trigger {
    /// Case-insensitive verb set; empty matches any verb
    #[serde(default)]
    pub verbs: Vec<String>,
    /// Filler tokens removed from the argument list before any clause runs
    #[serde(default)]
    pub arg_strip: Vec<String>,
    /// Message id whose normalized text must equal the normalized full
    /// command (verb + args)
    #[serde(default)]
    pub phrase: Option<String>,
    /// Same, against the argument tail only
    #[serde(default)]
    pub arg_phrase: Option<String>,
    /// args[0] must be one of these
    #[serde(default)]
    pub first_arg: Vec<String>,
    /// args must start with exactly this sequence
    #[serde(default)]
    pub args_prefix: Vec<String>,
    #[serde(default)]
    pub arg_eq: Option<ArgEq>,
    #[serde(default)]
    pub arg_count: Option<usize>,
    #[serde(default)]
    pub arg_pairs: Vec<ArgEq>,
    /// args[index] must equal the player's stored spouse
    #[serde(default)]
    pub spouse_arg: Option<usize>,
    /// Player must hold the named object
    #[serde(default)]
    pub requires_item: Option<String>,
    /// Room-state counter must be at least `value` (room defaults apply
    /// when the live state has no entry)
    #[serde(default)]
    pub room_state_min: Option<StateMin>,
    pub actions: Vec<Action>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ArgEq {
    pub index: usize,
    pub value: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StateMin {
    pub key: String,
    pub value: i64,
}

/// A named recurring room effect: every `every` ticks draw one entry from
/// `messages` and, when the permille `chance` passes (absent = always),
/// emit it room-wide.
#[derive(Debug, Clone, Deserialize)]
pub struct AmbienceSpec {
    pub name: String,
    pub every: u32,
    #[serde(default)]
    pub chance: Option<u32>,
    pub messages: Vec<String>,
}
