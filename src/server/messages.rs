//! JSON wire protocol between browser clients and the hub.
//!
//! Both directions are objects discriminated by a `type` field, with
//! snake_case type names and camelCase fields.

use actix::prelude::*;
use serde::{Serialize, Deserialize};

use crate::game::types::{Color, GameResult, MoveDescriptor};
use crate::server::directory::RoomSummary;
use crate::server::game_session::room::{RoomId, RoomStatus, SeatSummary};
use crate::server::ws_error::HubError;

/// Message client -> hub.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum ClientMessage {
    Queue {
        player_name: Option<String>,
    },
    CancelQueue,
    ListGames,
    Create {
        player_name: Option<String>,
        preferred_color: Option<Color>,
    },
    Join {
        game_id: RoomId,
        player_name: Option<String>,
        preferred_color: Option<Color>,
    },
    Move {
        game_id: RoomId,
        #[serde(rename = "move")]
        descriptor: MoveDescriptor,
    },
    End {
        #[serde(default)]
        result: GameResult,
    },
    Ping,
}

impl ClientMessage {
    /// Parse one text frame. Anything that is not a recognized message is a
    /// `BadPayload`.
    pub fn parse(text: &str) -> Result<Self, HubError> {
        serde_json::from_str(text).map_err(|e| HubError::BadPayload(e.to_string()))
    }
}

/// Message hub -> client.
#[derive(Message, Debug, Clone, PartialEq, Serialize)]
#[rtype(result = "()")]
#[serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum ServerEvent {
    QueueStatus {
        position: usize,
    },
    Matched {
        game_id: RoomId,
        color: Color,
        position: String,
        status: RoomStatus,
        players: Vec<SeatSummary>,
    },
    GamesList {
        games: Vec<RoomSummary>,
    },
    Session {
        game_id: RoomId,
        #[serde(skip_serializing_if = "Option::is_none")]
        color: Option<Color>,
        #[serde(skip_serializing_if = "std::ops::Not::not")]
        viewer: bool,
        position: String,
        status: RoomStatus,
        players: Vec<SeatSummary>,
        #[serde(skip_serializing_if = "Option::is_none")]
        result: Option<GameResult>,
    },
    PlayerJoined {
        game_id: RoomId,
        players: Vec<SeatSummary>,
        status: RoomStatus,
    },
    PlayerLeft {
        game_id: RoomId,
        players: Vec<SeatSummary>,
        status: RoomStatus,
    },
    Move {
        game_id: RoomId,
        #[serde(rename = "move")]
        descriptor: MoveDescriptor,
        position: String,
        next_to_move: Color,
        by: Color,
    },
    Ended {
        game_id: RoomId,
        result: GameResult,
        position: String,
    },
    Error {
        message: String,
    },
    Pong,
}

impl ServerEvent {
    pub fn error(err: &HubError) -> Self {
        Self::Error { message: err.to_string() }
    }
}
