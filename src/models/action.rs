use crate::models::types::SpellClass;
use serde::Deserialize;
use std::collections::HashMap;

fn default_true() -> bool {
    true
}

fn one() -> i64 {
    1
}

/// One step of a trigger's effect. Rule documents spell the variant in a
/// `type` field; adding a kind here is a compile-time-checked change because
/// the executor matches exhaustively.
///
/// Branch payloads (`on_full`, `then`, `cases`, ...) are plain nested action
/// lists; the executor walks them with a bounded depth.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Action {
    /// Emit up to three message events: `direct` to the actor, `room` to the
    /// rest of the room, `global` to everyone. Each value is a message id
    /// when the catalog knows it, literal text otherwise.
    Message {
        #[serde(default)]
        direct: Option<String>,
        #[serde(default)]
        room: Option<String>,
        #[serde(default)]
        global: Option<String>,
    },

    /// Remove one item, named outright or read from the scratch context
    RemoveItem {
        #[serde(default)]
        item: Option<String>,
        #[serde(default)]
        from_context: Option<String>,
    },

    AddGold {
        #[serde(default)]
        amount: Option<i64>,
        #[serde(default)]
        from_context: Option<String>,
    },

    GrantObject {
        object: String,
        #[serde(default)]
        on_full: Vec<Action>,
    },

    Heal {
        amount: i32,
        #[serde(default = "default_true")]
        capped: bool,
    },

    Damage { amount: i32 },

    GrantSpell {
        spell: String,
        /// Overrides the spell's catalog class when set
        #[serde(default)]
        book: Option<SpellClass>,
    },

    /// One uniform draw out of 1000
    RandomChance {
        permille: u32,
        #[serde(default)]
        on_success: Vec<Action>,
        #[serde(default)]
        on_failure: Vec<Action>,
    },

    /// One integer from the half-open range `[min, max)`, stored in context
    RandomRange { min: i64, max: i64, store: String },

    /// Cumulative-weight draw over `choices`; stores the winner's value,
    /// then runs its actions
    RandomChoice {
        #[serde(default)]
        store: Option<String>,
        choices: Vec<WeightedBranch>,
    },

    Conditional {
        all: Vec<Condition>,
        #[serde(rename = "then", default)]
        then_actions: Vec<Action>,
        #[serde(rename = "else", default)]
        else_actions: Vec<Action>,
    },

    /// Buy the spell named by the argument at `arg_index` from the priced
    /// catalog
    PurchaseSpell {
        #[serde(default)]
        arg_index: usize,
        #[serde(default)]
        on_success: Vec<Action>,
        #[serde(default)]
        missing: Vec<Action>,
        #[serde(default)]
        insufficient: Vec<Action>,
    },

    /// Reward fires only at `level == target - 1`; `advance` also applies
    /// the standard level increment before `on_success`
    LevelGate {
        target: i32,
        #[serde(default)]
        requires_item: Option<String>,
        #[serde(default)]
        advance: bool,
        #[serde(default)]
        on_success: Vec<Action>,
        #[serde(default)]
        on_too_high: Vec<Action>,
        #[serde(default)]
        on_too_low: Vec<Action>,
    },

    AddRoomObject {
        object: String,
        #[serde(default)]
        on_full: Vec<Action>,
    },

    IncrementRoomState {
        key: String,
        #[serde(default = "one")]
        amount: i64,
    },

    TransferPlayer {
        to: String,
        #[serde(default)]
        leave: Option<String>,
        #[serde(default)]
        arrive: Option<String>,
    },

    SetPlayerFlag {
        flag: String,
        #[serde(default = "default_true")]
        value: bool,
    },

    RemoveInventoryIndex { index: usize },

    LevelUp,

    /// Resolve the argument at `arg_index` to an inventory item and pick a
    /// branch: a named case when the player holds it, `missing` when the
    /// name is unknown or the item absent, `default` otherwise. The matched
    /// item name lands in context under `"item"`.
    BranchByItem {
        #[serde(default)]
        arg_index: usize,
        #[serde(default)]
        cases: HashMap<String, CaseBranch>,
        #[serde(rename = "missing", default)]
        missing_actions: Vec<Action>,
        #[serde(rename = "default", default)]
        default_actions: Vec<Action>,
    },
}

/// Case branches are always the dict form `{ actions: [...] }`; a bare
/// action list is a schema error at load time.
#[derive(Debug, Clone, Deserialize)]
pub struct CaseBranch {
    pub actions: Vec<Action>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WeightedBranch {
    pub weight: u32,
    pub value: String,
    #[serde(default)]
    pub actions: Vec<Action>,
}

/// One clause of a `conditional` action; all clauses must hold.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "check", rename_all = "snake_case")]
pub enum Condition {
    GoldAtLeast { amount: i64 },
    ContextEquals { key: String, value: String },
    InventoryCount {
        #[serde(default)]
        min: Option<usize>,
        #[serde(default)]
        max: Option<usize>,
    },
    RoomObjectCount {
        #[serde(default)]
        min: Option<usize>,
        #[serde(default)]
        max: Option<usize>,
    },
    RoomState {
        key: String,
        #[serde(default)]
        min: Option<i64>,
        #[serde(default)]
        equals: Option<i64>,
    },
    HeldItem { item: String },
    PlayerFlag {
        flag: String,
        #[serde(default = "default_true")]
        set: bool,
    },
    /// Charm countdown at `slot` is still running
    ActiveCharm { slot: usize },
}
