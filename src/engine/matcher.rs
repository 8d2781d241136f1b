//! Trigger predicate evaluation.
//!
//! A trigger matches when its verb set and every present predicate clause
//! hold. Filler tokens named in `arg_strip` are removed from the argument
//! list before any clause is evaluated, so optional articles never break a
//! match. Triggers are checked in declaration order; the first full match
//! is the only one that fires.

use crate::content::ContentStore;
use crate::models::player::PlayerSnapshot;
use crate::models::room::{RoomDefinition, Trigger};
use crate::state::rooms::RoomState;

/// Lowercase, drop non-alphanumerics, collapse whitespace runs.
/// `"Say,  'FRIEND'!"` and `"say friend"` normalize identically.
pub fn normalize_phrase(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut pending_space = false;
    for ch in s.chars() {
        if ch.is_whitespace() {
            pending_space = true;
        } else if ch.is_alphanumeric() {
            if pending_space && !out.is_empty() {
                out.push(' ');
            }
            pending_space = false;
            for c in ch.to_lowercase() {
                out.push(c);
            }
        }
    }
    out
}

/// Remove the trigger's filler tokens from the argument list
pub fn strip_args(trigger: &Trigger, args: &[String]) -> Vec<String> {
    if trigger.arg_strip.is_empty() {
        return args.to_vec();
    }
    args.iter()
        .filter(|a| !trigger.arg_strip.iter().any(|s| s.eq_ignore_ascii_case(a)))
        .cloned()
        .collect()
}

/// Evaluate one trigger against a command. `args` must already be stripped.
pub fn matches(
    trigger: &Trigger,
    verb: &str,
    args: &[String],
    player: &PlayerSnapshot,
    def: &RoomDefinition,
    state: &RoomState,
    content: &ContentStore,
) -> bool {
    if !trigger.verbs.is_empty() && !trigger.verbs.iter().any(|v| v.eq_ignore_ascii_case(verb)) {
        return false;
    }

    if let Some(id) = &trigger.phrase {
        let full = format!("{} {}", verb, args.join(" "));
        match content.message(id) {
            Some(expected) => {
                if normalize_phrase(&full) != normalize_phrase(expected) {
                    return false;
                }
            }
            None => return false,
        }
    }

    if let Some(id) = &trigger.arg_phrase {
        match content.message(id) {
            Some(expected) => {
                if normalize_phrase(&args.join(" ")) != normalize_phrase(expected) {
                    return false;
                }
            }
            None => return false,
        }
    }

    if !trigger.first_arg.is_empty() {
        match args.first() {
            Some(first) => {
                if !trigger.first_arg.iter().any(|t| t.eq_ignore_ascii_case(first)) {
                    return false;
                }
            }
            None => return false,
        }
    }

    if !trigger.args_prefix.is_empty() {
        if args.len() < trigger.args_prefix.len() {
            return false;
        }
        let matched = trigger
            .args_prefix
            .iter()
            .zip(args)
            .all(|(want, got)| want.eq_ignore_ascii_case(got));
        if !matched {
            return false;
        }
    }

    for pair in trigger.arg_eq.iter().chain(&trigger.arg_pairs) {
        match args.get(pair.index) {
            Some(got) if got.eq_ignore_ascii_case(&pair.value) => {}
            _ => return false,
        }
    }

    if let Some(count) = trigger.arg_count {
        if args.len() != count {
            return false;
        }
    }

    if let Some(index) = trigger.spouse_arg {
        let Some(spouse) = &player.spouse else { return false };
        match args.get(index) {
            Some(got) if got.eq_ignore_ascii_case(spouse) => {}
            _ => return false,
        }
    }

    if let Some(item) = &trigger.requires_item {
        match content.object_by_name(item) {
            Some(obj) if player.has_item(obj.id) => {}
            _ => return false,
        }
    }

    if let Some(min) = &trigger.room_state_min {
        if state.flag(&min.key, Some(def)) < min.value {
            return false;
        }
    }

    true
}

/// First trigger (declaration order) whose predicates all hold, together
/// with the argument list after its `arg_strip` pass
pub fn find_trigger<'a>(
    def: &'a RoomDefinition,
    verb: &str,
    args: &[String],
    player: &PlayerSnapshot,
    state: &RoomState,
    content: &ContentStore,
) -> Option<(&'a Trigger, Vec<String>)> {
    for trigger in &def.triggers {
        let stripped = strip_args(trigger, args);
        if matches(trigger, verb, &stripped, player, def, state, content) {
            return Some((trigger, stripped));
        }
    }
    None
}
