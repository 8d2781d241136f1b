//! Spell ticks: per-player regeneration and charm countdowns.
//!
//! Every firing walks all active players: the per-tick action counter
//! resets, spell points regenerate up to twice the player's level, and
//! every running charm slot counts down. A slot reaching zero notifies the
//! player; the alternate-name slot additionally restores the player's real
//! identity, clears the transformation flag bundle and tells the room.

use crate::error::EngineResult;
use crate::models::event::Event;
use crate::models::player::PlayerSnapshot;
use crate::models::types::{CHARM_ALTER_NAME, NCHARMS, SP_REGEN, player_flags};
use crate::repo::{PlayerRepo, TickStateRepo};
use crate::scheduler::{TaskHandle, task};
use crate::ticks::TickAdapter;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::mpsc;

pub const SPELLS_JOB: &str = "spells";
const STATE_KEY: &str = "spells";

/// Display names per charm slot, indexed like `PlayerSnapshot::charms`
const CHARM_NAMES: [&str; NCHARMS] = [
    "strength", "shield", "haste", "fortune", "clarity",
    "warding", "stone skin", "owl sight", "silence", "alternate name",
];

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SpellTickState {
    pub ticks: u64,
}

pub struct SpellSystem {
    players: Arc<dyn PlayerRepo>,
    repo: Arc<dyn TickStateRepo>,
    state: Mutex<SpellTickState>,
    events: mpsc::UnboundedSender<Event>,
}

impl SpellSystem {
    pub fn new(
        players: Arc<dyn PlayerRepo>,
        repo: Arc<dyn TickStateRepo>,
        events: mpsc::UnboundedSender<Event>,
    ) -> Self {
        Self {
            players,
            repo,
            state: Mutex::new(SpellTickState::default()),
            events,
        }
    }

    pub async fn restore(&self) -> EngineResult<()> {
        if let Some(value) = self.repo.load(STATE_KEY).await? {
            *self.state.lock() = serde_json::from_value(value)?;
        }
        Ok(())
    }

    pub fn ticks_fired(&self) -> u64 {
        self.state.lock().ticks
    }

    pub async fn tick(&self) -> EngineResult<()> {
        for mut player in self.players.load_active().await? {
            self.tick_player(&mut player);
            self.players.save(&player).await?;
        }

        let snapshot = {
            let mut state = self.state.lock();
            state.ticks += 1;
            state.clone()
        };
        self.repo
            .store(STATE_KEY, &serde_json::to_value(&snapshot)?)
            .await?;
        Ok(())
    }

    fn tick_player(&self, player: &mut PlayerSnapshot) {
        player.actions_this_tick = 0;
        player.spell_points = (player.spell_points + SP_REGEN).min(2 * player.level);

        for slot in 0..NCHARMS {
            if player.charms[slot] == 0 {
                continue;
            }
            player.charms[slot] -= 1;
            if player.charms[slot] == 0 {
                self.charm_expired(player, slot);
            }
        }
    }

    fn charm_expired(&self, player: &mut PlayerSnapshot, slot: usize) {
        let mut ev = Event::direct(
            player.id,
            format!("Your {} charm fades away.", CHARM_NAMES[slot]),
        );
        ev.event = "charm_expired".to_string();
        let _ = self.events.send(ev);

        if slot == CHARM_ALTER_NAME {
            let former = player.name.clone();
            if let Some(real) = player.real_name.take() {
                player.name = real;
            }
            player.set_flag(player_flags::TRANSFORM_BUNDLE, false);

            let mut ev = Event::room_message(
                player.location.clone(),
                Some(player.id),
                format!("{} is suddenly {} again!", former, player.name),
            );
            ev.event = "transform_expired".to_string();
            let _ = self.events.send(ev);
        }
    }

    /// Register on the tick adapter, one pass over players per `ticks`
    pub fn register(self: Arc<Self>, adapter: &TickAdapter, ticks: u32) -> TaskHandle {
        let sys = self;
        adapter.every(
            SPELLS_JOB,
            ticks,
            task(move || {
                let sys = sys.clone();
                async move {
                    if let Err(e) = sys.tick().await {
                        tracing::warn!(error = %e, "spell tick failed");
                    }
                }
            }),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::types::{PlayerId, RoomId};
    use crate::repo::memory::{MemoryPlayers, MemoryTickState};

    fn system() -> (Arc<SpellSystem>, Arc<MemoryPlayers>, mpsc::UnboundedReceiver<Event>) {
        let players = Arc::new(MemoryPlayers::new());
        let (tx, rx) = mpsc::unbounded_channel();
        let sys = Arc::new(SpellSystem::new(
            players.clone(),
            Arc::new(MemoryTickState::new()),
            tx,
        ));
        (sys, players, rx)
    }

    #[tokio::test]
    async fn t_regen_caps_at_twice_level() {
        let (sys, players, _rx) = system();
        let mut p = PlayerSnapshot::new(PlayerId(1), "Nim", RoomId::from("r"));
        p.level = 3;
        p.spell_points = 0;
        p.actions_this_tick = 7;
        players.insert(p);

        for _ in 0..5 {
            sys.tick().await.unwrap();
        }
        let p = players.get(PlayerId(1)).await.unwrap().unwrap();
        assert_eq!(p.spell_points, 6);
        assert_eq!(p.actions_this_tick, 0);
    }

    #[tokio::test]
    async fn t_charm_counts_down_and_notifies_at_zero() {
        let (sys, players, mut rx) = system();
        let mut p = PlayerSnapshot::new(PlayerId(1), "Nim", RoomId::from("r"));
        p.charms[2] = 2;
        players.insert(p);

        sys.tick().await.unwrap();
        assert_eq!(players.get(PlayerId(1)).await.unwrap().unwrap().charms[2], 1);
        assert!(rx.try_recv().is_err());

        sys.tick().await.unwrap();
        let p = players.get(PlayerId(1)).await.unwrap().unwrap();
        assert_eq!(p.charms[2], 0);
        let ev = rx.try_recv().unwrap();
        assert_eq!(ev.event, "charm_expired");
        assert_eq!(ev.player, Some(PlayerId(1)));

        // a slot at zero stays at zero quietly
        sys.tick().await.unwrap();
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn t_alternate_name_expiry_reverts_identity() {
        let (sys, players, mut rx) = system();
        let mut p = PlayerSnapshot::new(PlayerId(1), "Shadowbeast", RoomId::from("den"));
        p.real_name = Some("Nim".to_string());
        p.set_flag(player_flags::ALTERED, true);
        p.set_flag(player_flags::HASTED, true);
        p.set_flag(player_flags::BLESSED, true);
        p.charms[CHARM_ALTER_NAME] = 1;
        players.insert(p);

        sys.tick().await.unwrap();
        let p = players.get(PlayerId(1)).await.unwrap().unwrap();
        assert_eq!(p.name, "Nim");
        assert!(p.real_name.is_none());
        assert!(!p.has_flag(player_flags::ALTERED));
        assert!(!p.has_flag(player_flags::HASTED));
        // only the transformation bundle is cleared
        assert!(p.has_flag(player_flags::BLESSED));

        let direct = rx.try_recv().unwrap();
        assert_eq!(direct.event, "charm_expired");
        let notice = rx.try_recv().unwrap();
        assert_eq!(notice.event, "transform_expired");
        assert_eq!(notice.room, Some(RoomId::from("den")));
        assert_eq!(notice.exclude_player, Some(PlayerId(1)));
        assert!(notice.text.unwrap().contains("Shadowbeast"));
    }

    #[tokio::test]
    async fn t_tick_counter_persists() {
        let (sys, _players, _rx) = system();
        sys.tick().await.unwrap();
        sys.tick().await.unwrap();
        assert_eq!(sys.ticks_fired(), 2);
    }
}
