use crate::error::EngineResult;
use crate::models::player::PlayerSnapshot;
use crate::models::types::PlayerId;
use crate::repo::{PlayerRepo, TickStateRepo};
use async_trait::async_trait;
use dashmap::DashMap;

#[derive(Default)]
pub struct MemoryPlayers {
    players: DashMap<PlayerId, PlayerSnapshot>,
}

impl MemoryPlayers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, player: PlayerSnapshot) {
        self.players.insert(player.id, player);
    }
}

#[async_trait]
impl PlayerRepo for MemoryPlayers {
    async fn load_active(&self) -> EngineResult<Vec<PlayerSnapshot>> {
        let mut players: Vec<_> = self.players.iter().map(|e| e.value().clone()).collect();
        players.sort_by_key(|p| p.id);
        Ok(players)
    }

    async fn get(&self, id: PlayerId) -> EngineResult<Option<PlayerSnapshot>> {
        Ok(self.players.get(&id).map(|e| e.value().clone()))
    }

    async fn save(&self, player: &PlayerSnapshot) -> EngineResult<()> {
        self.players.insert(player.id, player.clone());
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryTickState {
    entries: DashMap<String, serde_json::Value>,
}

impl MemoryTickState {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TickStateRepo for MemoryTickState {
    async fn load(&self, key: &str) -> EngineResult<Option<serde_json::Value>> {
        Ok(self.entries.get(key).map(|e| e.value().clone()))
    }

    async fn store(&self, key: &str, value: &serde_json::Value) -> EngineResult<()> {
        self.entries.insert(key.to_string(), value.clone());
        Ok(())
    }
}
