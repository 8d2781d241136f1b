pub mod config;
pub mod content;
pub mod engine;
pub mod error;
pub mod models;
pub mod repo;
pub mod rng;
pub mod scheduler;
pub mod services;
pub mod state;
pub mod ticks;

// Convenient re-exports (so call sites can do `roomlore::RoomLifecycle`, etc.)
pub use error::{EngineError, EngineResult};
pub use rng::GameRng;
pub use scheduler::{Scheduler, TaskHandle};
pub use services::rooms::RoomLifecycle;
pub use ticks::TickAdapter;
