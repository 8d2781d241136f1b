//! Persistence ports.
//!
//! The engine reads and writes player records and tick-system state through
//! these traits only; what sits behind them (a database, a flat file, the
//! in-memory maps in [`memory`]) is the embedder's business.

pub mod memory;

use crate::error::EngineResult;
use crate::models::player::PlayerSnapshot;
use crate::models::types::PlayerId;
use async_trait::async_trait;

#[async_trait]
pub trait PlayerRepo: Send + Sync {
    /// Every player the periodic tick systems should touch
    async fn load_active(&self) -> EngineResult<Vec<PlayerSnapshot>>;

    async fn get(&self, id: PlayerId) -> EngineResult<Option<PlayerSnapshot>>;

    async fn save(&self, player: &PlayerSnapshot) -> EngineResult<()>;
}

/// Small named state blobs the world tick systems persist so a restart
/// resumes their cadence
#[async_trait]
pub trait TickStateRepo: Send + Sync {
    async fn load(&self, key: &str) -> EngineResult<Option<serde_json::Value>>;

    async fn store(&self, key: &str, value: &serde_json::Value) -> EngineResult<()>;
}
