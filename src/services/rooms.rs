//! Room lifecycle coordination.
//!
//! A room is dormant until its first occupant arrives and dormant again
//! when the last one leaves. While active it owns runtime state and any
//! ambience timers its rule document declares; teardown cancels them all,
//! so an empty room never ticks.
//!
//! `reload` swaps the whole rule-document set atomically. Live room state
//! and already-armed timers are left alone; armed ambience keeps its
//! pre-reload content snapshot until the room goes dormant and re-arms.

use crate::content::ContentStore;
use crate::engine::executor::{self, ExecCtx};
use crate::engine::matcher;
use crate::error::EngineResult;
use crate::models::event::Event;
use crate::models::player::PlayerSnapshot;
use crate::models::room::{AmbienceSpec, RoomDefinition};
use crate::models::types::{Limits, RoomId};
use crate::rng::GameRng;
use crate::scheduler::{Scheduler, task};
use crate::state::rooms::{RoomState, RoomStates};
use parking_lot::RwLock;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

pub struct RoomLifecycle {
    content: RwLock<Arc<ContentStore>>,
    states: RoomStates,
    scheduler: Scheduler,
    tick: Duration,
    rng: GameRng,
    limits: Limits,
    events: mpsc::UnboundedSender<Event>,
}

impl RoomLifecycle {
    pub fn new(
        content: Arc<ContentStore>,
        scheduler: Scheduler,
        tick: Duration,
        rng: GameRng,
        limits: Limits,
        events: mpsc::UnboundedSender<Event>,
    ) -> Self {
        Self {
            content: RwLock::new(content),
            states: RoomStates::new(),
            scheduler,
            tick,
            rng,
            limits,
            events,
        }
    }

    pub fn content(&self) -> Arc<ContentStore> {
        self.content.read().clone()
    }

    /// Swap the active rule-document set. Existing room state and in-flight
    /// timers are not touched.
    pub fn reload(&self, content: Arc<ContentStore>) {
        tracing::info!(rooms = content.room_count(), "rule documents reloaded");
        *self.content.write() = content;
    }

    pub fn occupant_count(&self, room_id: &RoomId) -> usize {
        self.states.occupant_count(room_id)
    }

    pub fn room_is_active(&self, room_id: &RoomId) -> bool {
        self.states.contains(room_id)
    }

    /// Put the player into a room: create state on first reference, count
    /// the entry, announce, arm ambience on dormant→active, then run the
    /// room's on-enter hook.
    pub fn enter(&self, player: &mut PlayerSnapshot, room_id: &RoomId) -> EngineResult<()> {
        let content = self.content();
        let def = content.room(room_id);
        player.location = room_id.clone();

        let mut out = Vec::new();
        self.states.with(
            room_id,
            || match &def {
                Some(d) => RoomState::seeded(d, &content),
                None => RoomState::default(),
            },
            |state| {
                state.occupants.insert(player.id);
                state.entries += 1;

                let mut ev = Event::room_message(
                    room_id.clone(),
                    Some(player.id),
                    format!("{} arrives.", player.name),
                );
                ev.event = "player_enter".to_string();
                out.push(ev);

                if let Some(def) = &def {
                    if state.occupants.len() == 1 {
                        self.arm_ambience(room_id, def, &content, state);
                    }
                    let mut ctx =
                        ExecCtx::new(&content, &self.rng, self.limits, &[], def);
                    executor::execute(&def.on_enter, player, state, &mut ctx);
                    out.append(&mut ctx.events);
                }
            },
        );

        self.send_all(out);
        Ok(())
    }

    /// Take the player out of a room; the last occupant tears the room
    /// down, cancelling every timer it owns.
    pub fn exit(&self, player: &mut PlayerSnapshot, room_id: &RoomId) -> EngineResult<()> {
        let content = self.content();
        let def = content.room(room_id);

        let mut out = Vec::new();
        let now_empty = self
            .states
            .with_existing(room_id, |state| {
                state.occupants.remove(&player.id);
                if let Some(def) = &def {
                    let mut ctx =
                        ExecCtx::new(&content, &self.rng, self.limits, &[], def);
                    executor::execute(&def.on_exit, player, state, &mut ctx);
                    out.append(&mut ctx.events);
                }
                state.occupants.is_empty()
            })
            .unwrap_or(false);

        if now_empty {
            self.states.remove(room_id);
            out.push(Event::system("room_empty", Some(room_id.clone())));
        }

        self.send_all(out);
        Ok(())
    }

    /// Route a command through the room's triggers. Returns whether a rule
    /// claimed it; `false` sends the caller to its generic handling.
    pub fn handle_command(
        &self,
        player: &mut PlayerSnapshot,
        verb: &str,
        args: &[String],
    ) -> EngineResult<bool> {
        let room_id = player.location.clone();
        let content = self.content();
        let Some(def) = content.room(&room_id) else {
            return Ok(false);
        };

        let mut out = Vec::new();
        let claimed = self.states.with(
            &room_id,
            || RoomState::seeded(&def, &content),
            |state| match matcher::find_trigger(&def, verb, args, player, state, &content) {
                None => false,
                Some((trigger, stripped)) => {
                    tracing::debug!(room = %room_id, verb, "trigger matched");
                    let mut ctx =
                        ExecCtx::new(&content, &self.rng, self.limits, &stripped, &def);
                    executor::execute(&trigger.actions, player, state, &mut ctx);
                    out.append(&mut ctx.events);
                    true
                }
            },
        );
        self.send_all(out);

        // a transfer_player action moved the snapshot; make occupancy follow
        if claimed && player.location != room_id {
            let dest = player.location.clone();
            self.exit(player, &room_id)?;
            self.enter(player, &dest)?;
        }

        Ok(claimed)
    }

    fn arm_ambience(
        &self,
        room_id: &RoomId,
        def: &RoomDefinition,
        content: &Arc<ContentStore>,
        state: &mut RoomState,
    ) {
        for spec in &def.ambience {
            let handle = self.schedule_ambience(room_id.clone(), spec, content.clone());
            state.add_timer(&spec.name, handle);
        }
    }

    fn schedule_ambience(
        &self,
        room_id: RoomId,
        spec: &AmbienceSpec,
        content: Arc<ContentStore>,
    ) -> crate::scheduler::TaskHandle {
        let interval = self.tick * spec.every.max(1);
        let rng = self.rng.clone();
        let events = self.events.clone();
        let chance = spec.chance;
        let messages = spec.messages.clone();

        self.scheduler.schedule_repeating(
            interval,
            interval,
            task(move || {
                let rng = rng.clone();
                let events = events.clone();
                let content = content.clone();
                let messages = messages.clone();
                let room_id = room_id.clone();
                async move {
                    if !chance.is_none_or(|c| rng.chance(c)) {
                        return;
                    }
                    let Some(i) = rng.pick_index(messages.len()) else { return };
                    let key = &messages[i];
                    let mut ev = match content.message(key) {
                        Some(text) => {
                            let mut e =
                                Event::room_message(room_id.clone(), None, text.to_string());
                            e.message_id = Some(key.clone());
                            e
                        }
                        None => Event::room_message(room_id.clone(), None, key.clone()),
                    };
                    ev.event = "ambience".to_string();
                    let _ = events.send(ev);
                }
            }),
        )
    }

    fn send_all(&self, events: Vec<Event>) {
        for ev in events {
            // a closed receiver means the transport is gone; nothing to do
            let _ = self.events.send(ev);
        }
    }
}
