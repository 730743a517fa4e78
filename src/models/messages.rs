use actix::Message;
use serde::{Deserialize, Serialize};

use crate::game::board::{PowerUpKind, Tile};
use crate::game::player::Player;
use crate::game::session::SessionSnapshot;

/// Message sent from client to server. `action` selects the intent; the
/// remaining fields are filled in as that intent needs them.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ClientMessage {
    pub action: String,
    pub session_id: Option<String>,
    pub display_name: Option<String>,
    pub x: Option<i32>,
    pub y: Option<i32>,
    pub max_players: Option<usize>,
    pub time_limit_seconds: Option<u64>,
    pub board_size: Option<i32>,
}

/// Message sent from server to client.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct ServerMessage {
    pub message_type: String,
    pub session_id: Option<String>,
    pub session: Option<SessionSnapshot>,
    pub player: Option<Player>,
    pub player_id: Option<String>,
    pub display_name: Option<String>,
    pub tiles: Option<Vec<Tile>>,
    pub painted: Option<bool>,
    pub power_up: Option<PowerUpKind>,
    pub code: Option<String>,
    pub reason: Option<String>,
}

impl ServerMessage {
    pub fn event(message_type: &str, session_id: &str) -> Self {
        ServerMessage {
            message_type: message_type.to_string(),
            session_id: Some(session_id.to_string()),
            ..Default::default()
        }
    }

    pub fn rejection(message_type: &str, code: &str, reason: String) -> Self {
        ServerMessage {
            message_type: message_type.to_string(),
            code: Some(code.to_string()),
            reason: Some(reason),
            ..Default::default()
        }
    }
}

/// Message type for WebSocket communication between actors.
#[derive(Message)]
#[rtype(result = "()")]
pub struct PaintSocketMessage(pub String);
