use std::time::Duration;

use actix_web::web;
use actix_web_actors::ws;
use log::{info, warn};
use uuid::Uuid;

use crate::game::error::GameError;
use crate::game::resolver::STUN_DURATION_MS;
use crate::game::session::{GameSession, SessionConfig};
use crate::game::timer;
use crate::models::{AppState, ClientMessage, ServerMessage};
use crate::websocket::handler::{broadcast_to_session, PaintWebSocket};

impl PaintWebSocket {
    pub fn handle_create(&mut self, msg: ClientMessage, ctx: &mut ws::WebsocketContext<Self>) {
        let defaults = SessionConfig::default();
        let config = SessionConfig {
            max_players: msg
                .max_players
                .filter(|&n| n > 0)
                .unwrap_or(defaults.max_players),
            time_limit_seconds: msg
                .time_limit_seconds
                .filter(|&n| n > 0)
                .unwrap_or(defaults.time_limit_seconds),
            board_size: msg
                .board_size
                .filter(|&n| n > 1)
                .unwrap_or(defaults.board_size),
        };

        let session_id = Uuid::new_v4().to_string();
        info!("Creating session {}", session_id);

        let session = GameSession::new(&session_id, config);
        let snapshot = session.snapshot();
        self.app_state
            .sessions
            .lock()
            .unwrap()
            .insert(session_id.clone(), session);
        self.app_state
            .rooms
            .lock()
            .unwrap()
            .insert(session_id.clone(), Vec::new());
        self.created_sessions.push(session_id.clone());

        let mut created = ServerMessage::event("session_created", &session_id);
        created.session = Some(snapshot);
        self.reply(ctx, &created);
    }

    pub fn handle_join(&mut self, msg: ClientMessage, ctx: &mut ws::WebsocketContext<Self>) {
        let session_id = match msg.session_id {
            Some(id) => id,
            None => {
                self.reply_error(ctx, "missing_session_id", "No session ID provided");
                return;
            }
        };
        if !self.session_id.is_empty() {
            self.reply_rejection(ctx, "error", &GameError::DuplicateJoin);
            return;
        }
        let display_name = msg.display_name.unwrap_or_default();

        let joined = {
            let mut sessions = self.app_state.sessions.lock().unwrap();
            match sessions.get_mut(&session_id) {
                Some(session) => session
                    .add_player(&self.id, &display_name, &mut rand::thread_rng())
                    .map(|player| (player, session.snapshot())),
                None => Err(GameError::SessionNotFound),
            }
        };

        match joined {
            Ok((player, snapshot)) => {
                {
                    let mut rooms = self.app_state.rooms.lock().unwrap();
                    rooms
                        .entry(session_id.clone())
                        .or_default()
                        .push(self.id.clone());
                }
                self.session_id = session_id.clone();
                info!("Player {} joined session {}", self.id, session_id);

                let mut reply = ServerMessage::event("session_joined", &session_id);
                reply.session = Some(snapshot);
                reply.player = Some(player.clone());
                self.reply(ctx, &reply);

                let mut joined = ServerMessage::event("player_joined", &session_id);
                joined.player = Some(player);
                broadcast_to_session(&self.app_state, &session_id, &joined);
            }
            Err(e) => {
                warn!("Join rejected for {}: {}", self.id, e);
                self.reply_rejection(ctx, "error", &e);
            }
        }
    }

    pub fn handle_move(&mut self, msg: ClientMessage, ctx: &mut ws::WebsocketContext<Self>) {
        if self.session_id.is_empty() {
            self.reply_error(ctx, "not_in_session", "Not in a session");
            return;
        }
        let (x, y) = match (msg.x, msg.y) {
            (Some(x), Some(y)) => (x, y),
            _ => {
                self.reply_error(ctx, "missing_target", "Move requires x and y");
                return;
            }
        };

        let result = {
            let mut sessions = self.app_state.sessions.lock().unwrap();
            match sessions.get_mut(&self.session_id) {
                Some(session) => session
                    .apply_move(&self.id, x, y, &mut rand::thread_rng())
                    .map(|outcome| {
                        let stunned: Vec<_> = outcome
                            .stunned_player_ids
                            .iter()
                            .filter_map(|id| session.players.get(id).cloned())
                            .collect();
                        (outcome, stunned)
                    }),
                None => Err(GameError::SessionNotFound),
            }
        };

        match result {
            Ok((outcome, stunned)) => {
                let mut moved = ServerMessage::event("player_moved", &self.session_id);
                moved.player = Some(outcome.player);
                moved.painted = Some(outcome.painted);
                moved.power_up = outcome.power_up_collected;
                broadcast_to_session(&self.app_state, &self.session_id, &moved);

                if !outcome.changed_tiles.is_empty() {
                    let mut delta = ServerMessage::event("board_delta", &self.session_id);
                    delta.tiles = Some(outcome.changed_tiles);
                    broadcast_to_session(&self.app_state, &self.session_id, &delta);
                }

                for victim in stunned {
                    let mut stun = ServerMessage::event("player_stunned", &self.session_id);
                    stun.player_id = Some(victim.id.clone());
                    stun.player = Some(victim.clone());
                    broadcast_to_session(&self.app_state, &self.session_id, &stun);
                    schedule_stun_expiry(
                        self.app_state.clone(),
                        self.session_id.clone(),
                        victim.id,
                    );
                }
            }
            Err(e) => {
                info!("Move rejected for {}: {}", self.id, e);
                self.reply_rejection(ctx, "move_rejected", &e);
            }
        }
    }

    pub fn handle_start(&mut self, _msg: ClientMessage, ctx: &mut ws::WebsocketContext<Self>) {
        if self.session_id.is_empty() {
            self.reply_error(ctx, "not_in_session", "Not in a session");
            return;
        }

        let started = {
            let mut sessions = self.app_state.sessions.lock().unwrap();
            match sessions.get_mut(&self.session_id) {
                Some(session) => session
                    .start(&mut rand::thread_rng())
                    .map(|_| (session.snapshot(), session.time_limit_seconds)),
                None => Err(GameError::SessionNotFound),
            }
        };

        match started {
            Ok((snapshot, time_limit_seconds)) => {
                info!("Session {} started", self.session_id);
                let mut started = ServerMessage::event("session_started", &self.session_id);
                started.session = Some(snapshot);
                broadcast_to_session(&self.app_state, &self.session_id, &started);
                schedule_clock(
                    self.app_state.clone(),
                    self.session_id.clone(),
                    time_limit_seconds,
                );
            }
            Err(e) => {
                info!("Start rejected for {}: {}", self.id, e);
                self.reply_rejection(ctx, "error", &e);
            }
        }
    }

    pub fn handle_restart(&mut self, _msg: ClientMessage, ctx: &mut ws::WebsocketContext<Self>) {
        if self.session_id.is_empty() {
            self.reply_error(ctx, "not_in_session", "Not in a session");
            return;
        }

        let snapshot = {
            let mut sessions = self.app_state.sessions.lock().unwrap();
            match sessions.get_mut(&self.session_id) {
                Some(session) => {
                    session.restart();
                    Some(session.snapshot())
                }
                None => None,
            }
        };

        match snapshot {
            Some(snapshot) => {
                info!("Session {} restarted", self.session_id);
                let mut restarted = ServerMessage::event("session_restarted", &self.session_id);
                restarted.session = Some(snapshot);
                broadcast_to_session(&self.app_state, &self.session_id, &restarted);
            }
            None => {
                self.reply_rejection(ctx, "error", &GameError::SessionNotFound);
            }
        }
    }

    pub fn handle_state(&mut self, msg: ClientMessage, ctx: &mut ws::WebsocketContext<Self>) {
        let session_id = match msg.session_id {
            Some(id) => id,
            None if !self.session_id.is_empty() => self.session_id.clone(),
            None => {
                self.reply_error(ctx, "not_in_session", "Not in a session");
                return;
            }
        };

        let snapshot = {
            let sessions = self.app_state.sessions.lock().unwrap();
            sessions.get(&session_id).map(|s| s.snapshot())
        };

        match snapshot {
            Some(snapshot) => {
                let mut state = ServerMessage::event("full_state", &session_id);
                state.session = Some(snapshot);
                self.reply(ctx, &state);
            }
            None => {
                self.reply_rejection(ctx, "error", &GameError::SessionNotFound);
            }
        }
    }

    fn reply(&self, ctx: &mut ws::WebsocketContext<Self>, message: &ServerMessage) {
        match serde_json::to_string(message) {
            Ok(s) => ctx.text(s),
            Err(e) => {
                warn!("Failed to serialize response: {}", e);
                ctx.text("{\"error\": \"Internal server error\"}");
            }
        }
    }

    fn reply_rejection(
        &self,
        ctx: &mut ws::WebsocketContext<Self>,
        message_type: &str,
        error: &GameError,
    ) {
        let rejection = ServerMessage::rejection(message_type, error.code(), error.to_string());
        self.reply(ctx, &rejection);
    }

    fn reply_error(&self, ctx: &mut ws::WebsocketContext<Self>, code: &str, reason: &str) {
        let rejection = ServerMessage::rejection("error", code, reason.to_string());
        self.reply(ctx, &rejection);
    }
}

/// Arms the 3-second stun-expiry timer for a freshly stunned player and
/// parks the handle in the session so removal or restart can cancel it.
/// The callback hands its own handle to `expire_stun`, which re-checks it
/// against the stored one under the sessions lock.
pub fn schedule_stun_expiry(app_state: web::Data<AppState>, session_id: String, player_id: String) {
    let state = app_state.clone();
    let sid = session_id.clone();
    let pid = player_id.clone();
    let handle = timer::schedule(Duration::from_millis(STUN_DURATION_MS), move |fired| {
        let recovered = {
            let mut sessions = state.sessions.lock().unwrap();
            sessions.get_mut(&sid).and_then(|session| {
                if session.expire_stun(&pid, &fired) {
                    session.players.get(&pid).cloned()
                } else {
                    None
                }
            })
        };
        if let Some(player) = recovered {
            let mut msg = ServerMessage::event("player_recovered", &sid);
            msg.player_id = Some(player.id.clone());
            msg.player = Some(player);
            broadcast_to_session(&state, &sid, &msg);
        }
    });

    let mut sessions = app_state.sessions.lock().unwrap();
    match sessions.get_mut(&session_id) {
        Some(session) => session.set_stun_timer(&player_id, handle),
        None => handle.cancel(),
    }
}

/// Arms the session time limit. The callback finishes the session only if
/// it is still playing when the timer fires; restart cancels the handle.
pub fn schedule_clock(app_state: web::Data<AppState>, session_id: String, time_limit_seconds: u64) {
    let state = app_state.clone();
    let sid = session_id.clone();
    let handle = timer::schedule(Duration::from_secs(time_limit_seconds), move |fired| {
        let finished = {
            let mut sessions = state.sessions.lock().unwrap();
            sessions.get_mut(&sid).and_then(|session| {
                if session.expire_clock(&fired) {
                    Some(session.snapshot())
                } else {
                    None
                }
            })
        };
        if let Some(snapshot) = finished {
            info!("Session {} reached its time limit", sid);
            let mut stopped = ServerMessage::event("session_stopped", &sid);
            stopped.session = Some(snapshot);
            stopped.reason = Some("time_limit_reached".to_string());
            broadcast_to_session(&state, &sid, &stopped);
        }
    });

    let mut sessions = app_state.sessions.lock().unwrap();
    match sessions.get_mut(&session_id) {
        Some(session) => session.set_clock(handle),
        None => handle.cancel(),
    }
}
