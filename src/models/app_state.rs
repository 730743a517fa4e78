use actix::Addr;
use std::collections::HashMap;
use std::sync::Mutex;

use crate::game::session::GameSession;
use crate::websocket::handler::PaintWebSocket;

/// Application state shared between connections: the session registry
/// (session id -> authoritative state), the rooms (session id -> connection
/// ids subscribed to it), and the peers (connection id -> actor address).
pub struct AppState {
    pub sessions: Mutex<HashMap<String, GameSession>>,
    pub rooms: Mutex<HashMap<String, Vec<String>>>,
    pub peers: Mutex<HashMap<String, Addr<PaintWebSocket>>>,
}

impl AppState {
    pub fn new() -> Self {
        AppState {
            sessions: Mutex::new(HashMap::new()),
            rooms: Mutex::new(HashMap::new()),
            peers: Mutex::new(HashMap::new()),
        }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}
