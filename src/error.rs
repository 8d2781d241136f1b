use crate::models::types::{PlayerId, RoomId};
use std::path::PathBuf;
use thiserror::Error;

pub type EngineResult<T> = Result<T, EngineError>;

#[derive(Debug, Error)]
pub enum EngineError {
    /// No rule document exists for the room
    #[error("room not found: {0}")]
    RoomNotFound(RoomId),

    #[error("player not found: {0}")]
    PlayerNotFound(PlayerId),

    /// A rule document failed to parse or violates the document schema.
    /// Raised at content-load time only; live dispatch never sees it.
    #[error("content error in {path}: {message}")]
    Content { path: PathBuf, message: String },

    #[error("duplicate room id: {0}")]
    DuplicateRoom(RoomId),

    #[error("invalid identifier: {0}")]
    InvalidIdentifier(String),

    #[error("validation failed: {field}: {message}")]
    Validation { field: &'static str, message: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error("internal error: {0}")]
    Internal(String),
}
