//! Content loading and fail-fast validation.
//!
//! Parse or schema failures are fatal here, before any room can go active.
//! Cross-reference problems (a trigger naming an object the catalog lacks)
//! are collected by [`verify_references`] for the `validate-rooms` tool;
//! at runtime such references degrade to no-ops by policy.

use crate::content::{ContentStore, ObjectDef, SpellDef};
use crate::error::{EngineError, EngineResult};
use crate::models::action::{Action, Condition};
use crate::models::room::RoomDefinition;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

static ID_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[a-z][a-z0-9_-]*$").unwrap());

#[derive(Debug, Default, Deserialize)]
struct ObjectsFile {
    #[serde(default)]
    objects: Vec<ObjectDef>,
}

#[derive(Debug, Default, Deserialize)]
struct SpellsFile {
    #[serde(default)]
    spells: Vec<SpellDef>,
}

#[derive(Debug, Default, Deserialize)]
struct MessagesFile {
    #[serde(default)]
    messages: HashMap<String, String>,
}

fn read_yaml<T: Default + for<'de> Deserialize<'de>>(path: &Path) -> EngineResult<T> {
    if !path.exists() {
        return Ok(T::default());
    }
    let data = std::fs::read_to_string(path)?;
    serde_yaml::from_str(&data).map_err(|e| EngineError::Content {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

/// Load a content directory: `objects.yaml`, `spells.yaml`, `messages.yaml`
/// and one rule document per file under `rooms/`.
pub fn load_dir(dir: &Path) -> EngineResult<ContentStore> {
    let objects: ObjectsFile = read_yaml(&dir.join("objects.yaml"))?;
    let spells: SpellsFile = read_yaml(&dir.join("spells.yaml"))?;
    let messages: MessagesFile = read_yaml(&dir.join("messages.yaml"))?;

    let mut rooms = Vec::new();
    let rooms_dir = dir.join("rooms");
    if rooms_dir.is_dir() {
        let mut paths: Vec<_> = std::fs::read_dir(&rooms_dir)?
            .filter_map(|e| e.ok().map(|e| e.path()))
            .filter(|p| {
                matches!(p.extension().and_then(|e| e.to_str()), Some("yaml") | Some("yml"))
            })
            .collect();
        paths.sort();

        for path in paths {
            let data = std::fs::read_to_string(&path)?;
            let room: RoomDefinition =
                serde_yaml::from_str(&data).map_err(|e| EngineError::Content {
                    path: path.clone(),
                    message: e.to_string(),
                })?;
            if !ID_RE.is_match(room.id.as_str()) {
                return Err(EngineError::Content {
                    path,
                    message: format!("invalid room id '{}'", room.id),
                });
            }
            tracing::debug!(room = %room.id, triggers = room.triggers.len(), "loaded rule document");
            rooms.push(room);
        }
    }

    let store = ContentStore::from_parts(objects.objects, spells.spells, messages.messages, rooms)?;
    tracing::info!(rooms = store.room_count(), "content loaded");
    Ok(store)
}

/// Walk an action list and all of its nested branch lists
pub fn walk_actions<'a>(actions: &'a [Action], f: &mut impl FnMut(&'a Action)) {
    for action in actions {
        f(action);
        match action {
            Action::GrantObject { on_full, .. } | Action::AddRoomObject { on_full, .. } => {
                walk_actions(on_full, f);
            }
            Action::RandomChance { on_success, on_failure, .. } => {
                walk_actions(on_success, f);
                walk_actions(on_failure, f);
            }
            Action::RandomChoice { choices, .. } => {
                for c in choices {
                    walk_actions(&c.actions, f);
                }
            }
            Action::Conditional { then_actions, else_actions, .. } => {
                walk_actions(then_actions, f);
                walk_actions(else_actions, f);
            }
            Action::PurchaseSpell { on_success, missing, insufficient, .. } => {
                walk_actions(on_success, f);
                walk_actions(missing, f);
                walk_actions(insufficient, f);
            }
            Action::LevelGate { on_success, on_too_high, on_too_low, .. } => {
                walk_actions(on_success, f);
                walk_actions(on_too_high, f);
                walk_actions(on_too_low, f);
            }
            Action::BranchByItem { cases, missing_actions, default_actions, .. } => {
                for case in cases.values() {
                    walk_actions(&case.actions, f);
                }
                walk_actions(missing_actions, f);
                walk_actions(default_actions, f);
            }
            _ => {}
        }
    }
}

/// Cross-check every name a document references against the catalogs.
/// Returns one human-readable line per problem; empty means clean.
pub fn verify_references(store: &ContentStore) -> Vec<String> {
    let mut issues = Vec::new();

    for room in store.rooms() {
        let mut issue = |msg: String| issues.push(format!("room '{}': {}", room.id, msg));

        for name in &room.objects {
            if store.object_by_name(name).is_none() {
                issue(format!("default object '{name}' is not in the catalog"));
            }
        }

        for (i, trigger) in room.triggers.iter().enumerate() {
            if let Some(phrase) = &trigger.phrase {
                if store.message(phrase).is_none() {
                    issue(format!("trigger {i}: phrase id '{phrase}' has no message"));
                }
            }
            if let Some(phrase) = &trigger.arg_phrase {
                if store.message(phrase).is_none() {
                    issue(format!("trigger {i}: arg_phrase id '{phrase}' has no message"));
                }
            }
            if let Some(item) = &trigger.requires_item {
                if store.object_by_name(item).is_none() {
                    issue(format!("trigger {i}: requires_item '{item}' is not in the catalog"));
                }
            }
        }

        let lists = room
            .triggers
            .iter()
            .map(|t| t.actions.as_slice())
            .chain([room.on_enter.as_slice(), room.on_exit.as_slice()]);
        for actions in lists {
            walk_actions(actions, &mut |action| match action {
                Action::GrantObject { object, .. }
                | Action::AddRoomObject { object, .. } => {
                    if store.object_by_name(object).is_none() {
                        issues.push(format!(
                            "room '{}': action references unknown object '{object}'",
                            room.id
                        ));
                    }
                }
                Action::RemoveItem { item: Some(item), .. } => {
                    if store.object_by_name(item).is_none() {
                        issues.push(format!(
                            "room '{}': remove_item references unknown object '{item}'",
                            room.id
                        ));
                    }
                }
                Action::GrantSpell { spell, .. } => {
                    if store.spell_by_name(spell).is_none() {
                        issues.push(format!(
                            "room '{}': grant_spell references unknown spell '{spell}'",
                            room.id
                        ));
                    }
                }
                Action::TransferPlayer { to, .. } => {
                    if store.room(&to.as_str().into()).is_none() {
                        issues.push(format!(
                            "room '{}': transfer_player targets unknown room '{to}'",
                            room.id
                        ));
                    }
                }
                Action::Conditional { all, .. } => {
                    for cond in all {
                        if let Condition::HeldItem { item } = cond {
                            if store.object_by_name(item).is_none() {
                                issues.push(format!(
                                    "room '{}': condition references unknown object '{item}'",
                                    room.id
                                ));
                            }
                        }
                    }
                }
                _ => {}
            });
        }
    }

    issues
}
