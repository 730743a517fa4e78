use actix::*;
use actix_web::{web, Error, HttpRequest, HttpResponse};
use actix_web_actors::ws;
use log::{info, warn};
use uuid::Uuid;

use crate::models::{AppState, ClientMessage, PaintSocketMessage, ServerMessage};

/// WebSocket actor for one connected player.
pub struct PaintWebSocket {
    pub id: String,
    pub app_state: web::Data<AppState>,
    pub session_id: String,
    /// Sessions this peer created. Tracked so a session nobody ever joined
    /// is dropped with its creator instead of leaking in the registry.
    pub created_sessions: Vec<String>,
}

impl Actor for PaintWebSocket {
    type Context = ws::WebsocketContext<Self>;

    fn started(&mut self, ctx: &mut Self::Context) {
        let addr = ctx.address();
        self.app_state
            .peers
            .lock()
            .unwrap()
            .insert(self.id.clone(), addr);

        let total_peers = self.app_state.peers.lock().unwrap().len();
        info!("WebSocket connection started: {}", self.id);
        info!("Total active peers: {}", total_peers);
    }

    fn stopping(&mut self, _: &mut Self::Context) -> Running {
        // Disconnect is the cancellation signal: remove the player (which
        // cancels any pending stun timer) before anything else can run.
        if !self.session_id.is_empty() {
            let departure = {
                let mut sessions = self.app_state.sessions.lock().unwrap();
                sessions
                    .get_mut(&self.session_id)
                    .and_then(|session| session.remove_player(&self.id).ok())
            };

            let room_empty = {
                let mut rooms = self.app_state.rooms.lock().unwrap();
                match rooms.get_mut(&self.session_id) {
                    Some(peer_ids) => {
                        peer_ids.retain(|id| id != &self.id);
                        info!(
                            "Removed peer {} from session {}'s room",
                            self.id, self.session_id
                        );
                        peer_ids.is_empty()
                    }
                    None => false,
                }
            };

            if room_empty {
                info!("No more peers in session {}. Cleaning up.", self.session_id);
                self.app_state.rooms.lock().unwrap().remove(&self.session_id);
                self.app_state
                    .sessions
                    .lock()
                    .unwrap()
                    .remove(&self.session_id);
            } else if let Some(outcome) = departure {
                let mut left = ServerMessage::event("player_left", &self.session_id);
                left.player_id = Some(self.id.clone());
                left.display_name = Some(outcome.player.display_name.clone());
                broadcast_to_session(&self.app_state, &self.session_id, &left);

                if outcome.stopped {
                    let snapshot = {
                        let sessions = self.app_state.sessions.lock().unwrap();
                        sessions.get(&self.session_id).map(|s| s.snapshot())
                    };
                    let mut stopped = ServerMessage::event("session_stopped", &self.session_id);
                    stopped.session = snapshot;
                    stopped.reason = Some("insufficient_players".to_string());
                    broadcast_to_session(&self.app_state, &self.session_id, &stopped);
                }
            }
        }

        discard_unjoined_sessions(&self.app_state, &self.created_sessions);

        self.app_state.peers.lock().unwrap().remove(&self.id);
        let total_peers = self.app_state.peers.lock().unwrap().len();
        info!("WebSocket connection closed: {}", self.id);
        info!("Total active peers: {}", total_peers);

        Running::Stop
    }
}

impl Handler<PaintSocketMessage> for PaintWebSocket {
    type Result = ();

    fn handle(&mut self, msg: PaintSocketMessage, ctx: &mut Self::Context) {
        ctx.text(msg.0);
    }
}

// WebSocket message handler
impl StreamHandler<Result<ws::Message, ws::ProtocolError>> for PaintWebSocket {
    fn handle(&mut self, msg: Result<ws::Message, ws::ProtocolError>, ctx: &mut Self::Context) {
        match msg {
            Ok(ws::Message::Ping(msg)) => {
                ctx.pong(&msg);
            }
            Ok(ws::Message::Pong(_)) => {
                // Do nothing for pong messages
            }
            Ok(ws::Message::Text(text)) => {
                info!("Received text message: {}", text);
                match serde_json::from_str::<ClientMessage>(text.as_ref()) {
                    Ok(client_msg) => {
                        self.handle_message(client_msg, ctx);
                    }
                    Err(e) => {
                        warn!("Error parsing client message: {}", e);
                        ctx.text(format!("{{\"error\": \"Invalid message format: {}\"}}", e));
                    }
                }
            }
            Ok(ws::Message::Binary(_)) => {
                warn!("Binary messages are not supported");
                ctx.text("{\"error\": \"Binary messages are not supported\"}");
            }
            Ok(ws::Message::Close(reason)) => {
                info!("Connection closed: {:?}", reason);
                ctx.close(reason);
                ctx.stop();
            }
            _ => {
                ctx.stop();
            }
        }
    }
}

impl PaintWebSocket {
    pub fn handle_message(&mut self, msg: ClientMessage, ctx: &mut ws::WebsocketContext<Self>) {
        match msg.action.as_str() {
            "create" => self.handle_create(msg, ctx),
            "join" => self.handle_join(msg, ctx),
            "move" => self.handle_move(msg, ctx),
            "start" => self.handle_start(msg, ctx),
            "restart" => self.handle_restart(msg, ctx),
            "state" => self.handle_state(msg, ctx),
            _ => {
                warn!("Unknown action: {}", msg.action);
                ctx.text(format!("{{\"error\": \"Unknown action: {}\"}}", msg.action));
            }
        }
    }
}

/// Drops the given sessions if no peer ever subscribed to their rooms.
/// Called when a creator disconnects; sessions that gained players are
/// left for the regular empty-room cleanup.
pub fn discard_unjoined_sessions(app_state: &AppState, session_ids: &[String]) {
    for session_id in session_ids {
        let unused = {
            let mut rooms = app_state.rooms.lock().unwrap();
            if rooms.get(session_id).map_or(false, |ids| ids.is_empty()) {
                rooms.remove(session_id);
                true
            } else {
                false
            }
        };
        if unused {
            app_state.sessions.lock().unwrap().remove(session_id);
            info!("Dropping never-joined session {}", session_id);
        }
    }
}

/// Relays one event to every peer subscribed to a session. The room list
/// and peer map are cloned under short locks; actix mailboxes preserve the
/// send order per peer, so everyone observes the same event sequence.
pub fn broadcast_to_session(app_state: &AppState, session_id: &str, message: &ServerMessage) {
    info!(
        "Broadcasting {} to session {}",
        message.message_type, session_id
    );

    let peer_ids;
    let peers_copy;

    // Scope the locks to minimize lock time
    {
        let rooms = app_state.rooms.lock().unwrap();
        peer_ids = match rooms.get(session_id) {
            Some(ids) => ids.clone(),
            None => {
                info!("No room found for session {}", session_id);
                return;
            }
        };

        let peers = app_state.peers.lock().unwrap();
        peers_copy = peers.clone();
    }

    // Serialize the message once
    let msg_str = match serde_json::to_string(message) {
        Ok(s) => s,
        Err(e) => {
            warn!("Error serializing message: {}", e);
            return;
        }
    };

    for peer_id in &peer_ids {
        if let Some(addr) = peers_copy.get(peer_id) {
            addr.do_send(PaintSocketMessage(msg_str.clone()));
        } else {
            info!("Peer {} not found in peer map", peer_id);
        }
    }
}

/// WebSocket connection handler
pub async fn ws_index(
    req: HttpRequest,
    stream: web::Payload,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, Error> {
    let id = Uuid::new_v4().to_string();
    info!("New WebSocket connection: {}", id);

    let socket = PaintWebSocket {
        id,
        app_state: app_state.clone(),
        session_id: String::new(),
        created_sessions: Vec::new(),
    };

    ws::start(socket, &req, stream)
}
