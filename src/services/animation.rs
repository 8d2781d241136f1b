//! Animation ticks: mob routine rotation and one-shot global flags.
//!
//! Each tick advances exactly one routine in a fixed rotation (the index
//! wraps) and drains every flag raised since the previous tick, emitting
//! one event per flag. The rotation index and any still-pending flags are
//! persisted after every tick so a restart resumes the cadence.

use crate::error::EngineResult;
use crate::models::event::Event;
use crate::models::types::RoomId;
use crate::repo::TickStateRepo;
use crate::scheduler::{TaskHandle, task};
use crate::ticks::TickAdapter;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::mpsc;

pub const ANIMATION_JOB: &str = "animation";
const STATE_KEY: &str = "animation";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingFlag {
    pub name: String,
    pub message: String,
    pub room: RoomId,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnimationTickState {
    pub routine_index: usize,
    #[serde(default)]
    pub pending: Vec<PendingFlag>,
}

pub struct AnimationSystem {
    routines: Vec<String>,
    state: Mutex<AnimationTickState>,
    repo: Arc<dyn TickStateRepo>,
    events: mpsc::UnboundedSender<Event>,
}

impl AnimationSystem {
    pub fn new(
        routines: Vec<String>,
        repo: Arc<dyn TickStateRepo>,
        events: mpsc::UnboundedSender<Event>,
    ) -> Self {
        Self {
            routines,
            state: Mutex::new(AnimationTickState::default()),
            repo,
            events,
        }
    }

    /// Pick up where a previous process left off
    pub async fn restore(&self) -> EngineResult<()> {
        if let Some(value) = self.repo.load(STATE_KEY).await? {
            let restored: AnimationTickState = serde_json::from_value(value)?;
            tracing::info!(
                routine_index = restored.routine_index,
                pending = restored.pending.len(),
                "animation state restored"
            );
            *self.state.lock() = restored;
        }
        Ok(())
    }

    /// Raise a one-shot flag; it is consumed and cleared on the next tick.
    /// Raising an already-pending name replaces it.
    pub fn raise_flag(&self, name: &str, message: impl Into<String>, room: RoomId) {
        let mut state = self.state.lock();
        state.pending.retain(|f| f.name != name);
        state.pending.push(PendingFlag {
            name: name.to_string(),
            message: message.into(),
            room,
        });
    }

    pub fn current_routine(&self) -> Option<String> {
        let state = self.state.lock();
        self.routines.get(state.routine_index).cloned()
    }

    pub async fn tick(&self) -> EngineResult<()> {
        let (routine, drained, snapshot) = {
            let mut state = self.state.lock();
            let routine = self.routines.get(state.routine_index).cloned();
            if !self.routines.is_empty() {
                state.routine_index = (state.routine_index + 1) % self.routines.len();
            }
            let drained = std::mem::take(&mut state.pending);
            (routine, drained, state.clone())
        };

        if let Some(routine) = routine {
            let mut ev = Event::system("mob_routine", None);
            ev.text = Some(routine);
            let _ = self.events.send(ev);
        }

        for flag in drained {
            let mut ev = Event::room_message(flag.room, None, flag.message);
            ev.event = "flag_cleared".to_string();
            let _ = self.events.send(ev);
        }

        self.repo
            .store(STATE_KEY, &serde_json::to_value(&snapshot)?)
            .await?;
        Ok(())
    }

    /// Register on the tick adapter, one routine advance per `ticks`
    pub fn register(self: Arc<Self>, adapter: &TickAdapter, ticks: u32) -> TaskHandle {
        let sys = self;
        adapter.every(
            ANIMATION_JOB,
            ticks,
            task(move || {
                let sys = sys.clone();
                async move {
                    if let Err(e) = sys.tick().await {
                        tracing::warn!(error = %e, "animation tick failed");
                    }
                }
            }),
        )
    }
}
