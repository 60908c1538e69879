//! Messages exchanged between multiplayer Memory clients and the room server.
//!
//! Every message is a JSON object tagged by a kebab-case `"type"` field with camelCase payload
//! fields, e.g. `{"type":"flip-card","cardIndex":3}`.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tilepair_core::{Card, CellCount, Coord, Difficulty};

pub use room_id::*;
pub use view::*;

mod room_id;
mod view;

pub type PlayerId = u64;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    pub score: u32,
}

/// Full room state sent whenever a game (re)starts.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomSnapshot {
    pub room_id: String,
    pub level: Difficulty,
    pub cols: Coord,
    pub players: Vec<Player>,
    pub cards: Vec<Card>,
    pub current_turn: PlayerId,
    pub total_pairs: CellCount,
}

/// Requests sent by a client.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum ClientMsg {
    CreateRoom {
        #[serde(default)]
        level: Difficulty,
    },
    JoinRoom {
        room_id: String,
    },
    LeaveRoom,
    RestartRoom,
    /// Fire-and-forget, never answered with a [`Reply`].
    FlipCard {
        card_index: CellCount,
    },
}

impl ClientMsg {
    pub fn expects_reply(&self) -> bool {
        !matches!(self, Self::FlipCard { .. } | Self::LeaveRoom)
    }
}

/// Direct answer to a [`ClientMsg`] request.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum Reply {
    RoomJoined {
        room_id: String,
        player_id: PlayerId,
        level: Difficulty,
    },
    Restarted,
    Error {
        reason: String,
    },
}

/// Events broadcast to every player of a room.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum ServerMsg {
    GameStart(RoomSnapshot),
    CardFlipped {
        card_index: CellCount,
        player_id: PlayerId,
        is_first: bool,
    },
    MatchResult {
        matched: bool,
        card_indices: [CellCount; 2],
        player_id: PlayerId,
        /// Updated score of the acting player, only on a match.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        score: Option<u32>,
    },
    TurnChange {
        current_turn: PlayerId,
    },
    GameOver {
        winner_id: PlayerId,
        winner_name: String,
    },
    PlayerDisconnected {
        disconnected_id: PlayerId,
        winner_id: PlayerId,
    },
}

pub fn encode<T: Serialize>(msg: &T) -> serde_json::Result<String> {
    serde_json::to_string(msg)
}

pub fn decode<T: DeserializeOwned>(text: &str) -> serde_json::Result<T> {
    serde_json::from_str(text)
}
