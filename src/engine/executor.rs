//! Action interpretation.
//!
//! One call runs one trigger's action list to completion: synchronous,
//! single-threaded, mutating the player snapshot and room state in place
//! and appending outbound events. Nested branch lists recurse with a depth
//! cap so malformed content cannot blow the stack.
//!
//! Unresolvable content references (an unknown item, spell or room name)
//! are quiet no-ops. That is the content-authoring forgiveness policy, not
//! an error path: a typo in a rule document must never crash a live room.

use crate::content::ContentStore;
use crate::models::action::{Action, Condition};
use crate::models::event::Event;
use crate::models::player::PlayerSnapshot;
use crate::models::room::RoomDefinition;
use crate::models::types::{Limits, MAX_BRANCH_DEPTH, NCHARMS, player_flags};
use crate::rng::GameRng;
use crate::state::rooms::RoomState;

/// Scratch key/value store scoped to one trigger evaluation. Values keep
/// their insertion order so `%0`, `%1`, ... template markers can address
/// them positionally.
#[derive(Debug, Default)]
pub struct Scratch {
    entries: Vec<(String, String)>,
}

impl Scratch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Replace in place when the key exists, append otherwise
    pub fn set(&mut self, key: &str, value: impl Into<String>) {
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| k == key) {
            Some((_, v)) => *v = value,
            None => self.entries.push((key.to_string(), value)),
        }
    }

    pub fn positional(&self, n: usize) -> Option<&str> {
        self.entries.get(n).map(|(_, v)| v.as_str())
    }
}

/// Everything one evaluation needs besides the player and the room state.
/// Built per trigger; `scratch` and `events` do not outlive the call.
pub struct ExecCtx<'a> {
    pub content: &'a ContentStore,
    pub rng: &'a GameRng,
    pub limits: Limits,
    pub args: &'a [String],
    pub def: &'a RoomDefinition,
    pub scratch: Scratch,
    pub events: Vec<Event>,
}

impl<'a> ExecCtx<'a> {
    pub fn new(
        content: &'a ContentStore,
        rng: &'a GameRng,
        limits: Limits,
        args: &'a [String],
        def: &'a RoomDefinition,
    ) -> Self {
        Self {
            content,
            rng,
            limits,
            args,
            def,
            scratch: Scratch::new(),
            events: Vec::new(),
        }
    }
}

/// Run an action list against the player and room state
pub fn execute(
    actions: &[Action],
    player: &mut PlayerSnapshot,
    state: &mut RoomState,
    ctx: &mut ExecCtx,
) {
    run_list(actions, player, state, ctx, 0);
}

fn run_list(
    actions: &[Action],
    player: &mut PlayerSnapshot,
    state: &mut RoomState,
    ctx: &mut ExecCtx,
    depth: u8,
) {
    if depth > MAX_BRANCH_DEPTH {
        tracing::warn!(room = %ctx.def.id, depth, "branch nesting too deep, discarding");
        return;
    }
    for action in actions {
        run_one(action, player, state, ctx, depth);
        debug_assert!(player.inventory_consistent(), "inventory arrays out of step");
    }
}

/// Substitute `%p` (actor name), `%0`..`%9` (positional scratch values) and
/// `%%` in a template
fn render(template: &str, player: &PlayerSnapshot, scratch: &Scratch) -> String {
    let mut out = String::with_capacity(template.len());
    let mut chars = template.chars();
    while let Some(ch) = chars.next() {
        if ch != '%' {
            out.push(ch);
            continue;
        }
        match chars.next() {
            Some('p') => out.push_str(&player.name),
            Some(d) if d.is_ascii_digit() => {
                let n = d as usize - '0' as usize;
                if let Some(v) = scratch.positional(n) {
                    out.push_str(v);
                }
            }
            Some('%') => out.push('%'),
            Some(other) => {
                out.push('%');
                out.push(other);
            }
            None => out.push('%'),
        }
    }
    out
}

/// A message field is a catalog id when the catalog knows it, literal text
/// otherwise. Returns the id (when any) and the rendered text.
fn resolve_text(
    key: &str,
    player: &PlayerSnapshot,
    ctx: &ExecCtx,
) -> (Option<String>, String) {
    match ctx.content.message(key) {
        Some(template) => (Some(key.to_string()), render(template, player, &ctx.scratch)),
        None => (None, render(key, player, &ctx.scratch)),
    }
}

fn run_one(
    action: &Action,
    player: &mut PlayerSnapshot,
    state: &mut RoomState,
    ctx: &mut ExecCtx,
    depth: u8,
) {
    match action {
        Action::Message { direct, room, global } => {
            if let Some(key) = direct {
                let (id, text) = resolve_text(key, player, ctx);
                let mut ev = Event::direct(player.id, text);
                ev.message_id = id;
                ev.room = Some(ctx.def.id.clone());
                ctx.events.push(ev);
            }
            if let Some(key) = room {
                let (id, text) = resolve_text(key, player, ctx);
                let mut ev = Event::room_message(ctx.def.id.clone(), Some(player.id), text);
                ev.message_id = id;
                ctx.events.push(ev);
            }
            if let Some(key) = global {
                let (id, text) = resolve_text(key, player, ctx);
                let mut ev = Event::broadcast(text);
                ev.message_id = id;
                ctx.events.push(ev);
            }
        }

        Action::RemoveItem { item, from_context } => {
            let name = match (item, from_context) {
                (Some(name), _) => Some(name.clone()),
                (None, Some(key)) => ctx.scratch.get(key).map(str::to_string),
                (None, None) => None,
            };
            let Some(name) = name else { return };
            let Some(obj) = ctx.content.object_by_name(&name) else {
                tracing::debug!(item = %name, "remove_item: unknown object, ignoring");
                return;
            };
            if let Some(index) = player.find_item(obj.id) {
                player.remove_item_at(index);
            }
        }

        Action::AddGold { amount, from_context } => {
            let amount = match (amount, from_context) {
                (Some(n), _) => Some(*n),
                (None, Some(key)) => ctx.scratch.get(key).and_then(|v| v.parse().ok()),
                (None, None) => None,
            };
            if let Some(n) = amount {
                player.gold += n;
            }
        }

        Action::GrantObject { object, on_full } => {
            let Some(obj) = ctx.content.object_by_name(object) else {
                tracing::debug!(object = %object, "grant_object: unknown object, ignoring");
                return;
            };
            let id = obj.id;
            if !player.give_item(id, 0, ctx.limits.inventory) {
                run_list(on_full, player, state, ctx, depth + 1);
            }
        }

        Action::Heal { amount, capped } => player.heal(*amount, *capped),

        Action::Damage { amount } => player.damage(*amount),

        Action::GrantSpell { spell, book } => {
            let Some(def) = ctx.content.spell_by_name(spell) else {
                tracing::debug!(spell = %spell, "grant_spell: unknown spell, ignoring");
                return;
            };
            let (id, class) = (def.id, book.unwrap_or(def.class));
            player.grant_spell(class, id);
            // memorize only while a free slot exists
            if player.memorized.len() < ctx.limits.memorized {
                player.memorize(id, ctx.limits.memorized);
            }
        }

        Action::RandomChance { permille, on_success, on_failure } => {
            if ctx.rng.chance(*permille) {
                run_list(on_success, player, state, ctx, depth + 1);
            } else {
                run_list(on_failure, player, state, ctx, depth + 1);
            }
        }

        Action::RandomRange { min, max, store } => {
            let v = ctx.rng.range(*min, *max);
            ctx.scratch.set(store, v.to_string());
        }

        Action::RandomChoice { store, choices } => {
            let weights: Vec<u32> = choices.iter().map(|c| c.weight).collect();
            let Some(index) = ctx.rng.weighted(&weights) else { return };
            let branch = &choices[index];
            if let Some(key) = store {
                ctx.scratch.set(key, branch.value.clone());
            }
            run_list(&branch.actions, player, state, ctx, depth + 1);
        }

        Action::Conditional { all, then_actions, else_actions } => {
            let holds = all.iter().all(|c| check(c, player, state, ctx));
            if holds {
                run_list(then_actions, player, state, ctx, depth + 1);
            } else {
                run_list(else_actions, player, state, ctx, depth + 1);
            }
        }

        Action::PurchaseSpell { arg_index, on_success, missing, insufficient } => {
            let requested = ctx.args.get(*arg_index).cloned();
            let spell = requested
                .as_deref()
                .and_then(|name| ctx.content.spell_by_name(name))
                .and_then(|s| s.price.map(|price| (s.id, s.class, price)));
            match spell {
                None => run_list(missing, player, state, ctx, depth + 1),
                Some((_, _, price)) if player.gold < price => {
                    run_list(insufficient, player, state, ctx, depth + 1);
                }
                Some((id, class, price)) => {
                    player.gold -= price;
                    player.grant_spell(class, id);
                    if player.memorized.len() < ctx.limits.memorized {
                        player.memorize(id, ctx.limits.memorized);
                    }
                    run_list(on_success, player, state, ctx, depth + 1);
                }
            }
        }

        Action::LevelGate { target, requires_item, advance, on_success, on_too_high, on_too_low } => {
            if player.level >= *target {
                run_list(on_too_high, player, state, ctx, depth + 1);
            } else if player.level < *target - 1 {
                run_list(on_too_low, player, state, ctx, depth + 1);
            } else {
                // exactly one level below the gate
                if let Some(item) = requires_item {
                    let held = ctx
                        .content
                        .object_by_name(item)
                        .is_some_and(|obj| player.has_item(obj.id));
                    if !held {
                        return;
                    }
                }
                if *advance {
                    player.level_up();
                }
                run_list(on_success, player, state, ctx, depth + 1);
            }
        }

        Action::AddRoomObject { object, on_full } => {
            let Some(obj) = ctx.content.object_by_name(object) else {
                tracing::debug!(object = %object, "add_room_object: unknown object, ignoring");
                return;
            };
            let id = obj.id;
            if !state.add_object(id, ctx.limits.room_objects) {
                run_list(on_full, player, state, ctx, depth + 1);
            }
        }

        Action::IncrementRoomState { key, amount } => {
            let current = state.flag(key, Some(ctx.def));
            state.set_flag(key, current + amount);
        }

        Action::TransferPlayer { to, leave, arrive } => {
            let to_id = crate::models::types::RoomId::from(to.as_str());
            if ctx.content.room(&to_id).is_none() {
                tracing::debug!(to = %to, "transfer_player: unknown room, ignoring");
                return;
            }
            player.previous_location = player.location.clone();
            player.location = to_id.clone();

            let mut ev = Event::player_event("room_transfer", player.id);
            ev.room = Some(to_id);
            ev.leave_text = leave
                .as_deref()
                .map(|k| resolve_text(k, player, ctx).1);
            ev.arrive_text = arrive
                .as_deref()
                .map(|k| resolve_text(k, player, ctx).1);
            ctx.events.push(ev);
        }

        Action::SetPlayerFlag { flag, value } => {
            match player_flags::by_name(flag) {
                Some(bit) => player.set_flag(bit, *value),
                None => tracing::debug!(flag = %flag, "set_player_flag: unknown flag, ignoring"),
            }
        }

        Action::RemoveInventoryIndex { index } => player.remove_item_at(*index),

        Action::LevelUp => player.level_up(),

        Action::BranchByItem { arg_index, cases, missing_actions, default_actions } => {
            let named = ctx.args.get(*arg_index).cloned();
            let resolved = named
                .as_deref()
                .and_then(|name| ctx.content.object_by_name(name))
                .map(|obj| (obj.id, obj.name.clone()));
            match resolved {
                Some((id, name)) if player.has_item(id) => {
                    ctx.scratch.set("item", name.clone());
                    let case = cases
                        .iter()
                        .find(|(key, _)| key.eq_ignore_ascii_case(&name))
                        .map(|(_, branch)| &branch.actions);
                    match case {
                        Some(actions) => run_list(actions, player, state, ctx, depth + 1),
                        None => run_list(default_actions, player, state, ctx, depth + 1),
                    }
                }
                // unknown name or item not held
                _ => run_list(missing_actions, player, state, ctx, depth + 1),
            }
        }
    }
}

fn check(cond: &Condition, player: &PlayerSnapshot, state: &RoomState, ctx: &ExecCtx) -> bool {
    match cond {
        Condition::GoldAtLeast { amount } => player.gold >= *amount,
        Condition::ContextEquals { key, value } => ctx.scratch.get(key) == Some(value.as_str()),
        Condition::InventoryCount { min, max } => {
            min.is_none_or(|m| player.item_count >= m) && max.is_none_or(|m| player.item_count <= m)
        }
        Condition::RoomObjectCount { min, max } => {
            let n = state.objects.len();
            min.is_none_or(|m| n >= m) && max.is_none_or(|m| n <= m)
        }
        Condition::RoomState { key, min, equals } => {
            let v = state.flag(key, Some(ctx.def));
            min.is_none_or(|m| v >= m) && equals.is_none_or(|e| v == e)
        }
        Condition::HeldItem { item } => ctx
            .content
            .object_by_name(item)
            .is_some_and(|obj| player.has_item(obj.id)),
        Condition::PlayerFlag { flag, set } => match player_flags::by_name(flag) {
            Some(bit) => player.has_flag(bit) == *set,
            None => false,
        },
        Condition::ActiveCharm { slot } => *slot < NCHARMS && player.charms[*slot] > 0,
    }
}
