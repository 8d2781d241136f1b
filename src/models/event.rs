use crate::models::types::{PlayerId, RoomId};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Delivery scope understood by the transport layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EventScope {
    /// The acting player only
    Direct,
    /// A specific other player
    Target,
    /// Everyone everywhere
    Broadcast,
    /// Everyone in `room`, minus `exclude_player` when set
    Room,
    /// Rooms adjacent to `room`
    NearbyRoom,
    System,
    Player,
}

/// One outbound wire event. Produced by the executor, the lifecycle
/// coordinator and the tick systems; delivery belongs to the transport.
#[derive(Debug, Clone, Serialize)]
pub struct Event {
    pub scope: EventScope,
    pub event: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub player: Option<PlayerId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exclude_player: Option<PlayerId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub room: Option<RoomId>,
    /// Leave-side text of a room transfer
    #[serde(skip_serializing_if = "Option::is_none")]
    pub leave_text: Option<String>,
    /// Arrive-side text of a room transfer
    #[serde(skip_serializing_if = "Option::is_none")]
    pub arrive_text: Option<String>,
    pub at: DateTime<Utc>,
}

impl Event {
    fn base(scope: EventScope, event: &str) -> Self {
        Self {
            scope,
            event: event.to_string(),
            message_id: None,
            text: None,
            player: None,
            exclude_player: None,
            room: None,
            leave_text: None,
            arrive_text: None,
            at: Utc::now(),
        }
    }

    pub fn direct(player: PlayerId, text: impl Into<String>) -> Self {
        let mut e = Self::base(EventScope::Direct, "message");
        e.player = Some(player);
        e.text = Some(text.into());
        e
    }

    pub fn room_message(room: RoomId, exclude: Option<PlayerId>, text: impl Into<String>) -> Self {
        let mut e = Self::base(EventScope::Room, "message");
        e.room = Some(room);
        e.exclude_player = exclude;
        e.text = Some(text.into());
        e
    }

    pub fn broadcast(text: impl Into<String>) -> Self {
        let mut e = Self::base(EventScope::Broadcast, "message");
        e.text = Some(text.into());
        e
    }

    pub fn system(event: &str, room: Option<RoomId>) -> Self {
        let mut e = Self::base(EventScope::System, event);
        e.room = room;
        e
    }

    pub fn player_event(event: &str, player: PlayerId) -> Self {
        let mut e = Self::base(EventScope::Player, event);
        e.player = Some(player);
        e
    }

    pub fn with_message_id(mut self, id: impl Into<String>) -> Self {
        self.message_id = Some(id.into());
        self
    }

    pub fn with_room(mut self, room: RoomId) -> Self {
        self.room = Some(room);
        self
    }
}
