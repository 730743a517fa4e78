use std::collections::HashMap;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::game::board::{Board, POWER_UP_KINDS, POWER_UP_PROBABILITY};
use crate::game::error::GameError;
use crate::game::player::{pick_color, Player, PlayerStatus};
use crate::game::resolver::{self, MoveOutcome};
use crate::game::timer::TimerHandle;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Waiting,
    Playing,
    Finished,
}

#[derive(Debug, Clone, Copy)]
pub struct SessionConfig {
    pub max_players: usize,
    pub time_limit_seconds: u64,
    pub board_size: i32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        SessionConfig {
            max_players: 4,
            time_limit_seconds: 120,
            board_size: 15,
        }
    }
}

/// The one authoritative instance of a game. All mutation goes through
/// these methods; the gateway only reads it to serialize snapshots.
#[derive(Debug)]
pub struct GameSession {
    pub id: String,
    pub status: SessionStatus,
    pub max_players: usize,
    pub time_limit_seconds: u64,
    pub board: Board,
    pub players: HashMap<String, Player>,
    stun_timers: HashMap<String, TimerHandle>,
    clock: Option<TimerHandle>,
}

/// What removing a player did to the session.
#[derive(Debug, Clone)]
pub struct DepartureOutcome {
    pub player: Player,
    pub stopped: bool,
}

/// Serializable view of a session for snapshots and lifecycle events.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct SessionSnapshot {
    pub id: String,
    pub status: SessionStatus,
    pub board_size: i32,
    pub time_limit_seconds: u64,
    pub max_players: usize,
    pub board: Board,
    pub players: Vec<Player>,
}

impl GameSession {
    pub fn new(id: &str, config: SessionConfig) -> Self {
        GameSession {
            id: id.to_string(),
            status: SessionStatus::Waiting,
            max_players: config.max_players,
            time_limit_seconds: config.time_limit_seconds,
            board: Board::new(config.board_size),
            players: HashMap::new(),
            stun_timers: HashMap::new(),
            clock: None,
        }
    }

    pub fn add_player(
        &mut self,
        identity: &str,
        requested_name: &str,
        rng: &mut impl Rng,
    ) -> Result<Player, GameError> {
        if self.players.contains_key(identity) {
            return Err(GameError::DuplicateJoin);
        }
        if self.players.len() >= self.max_players {
            return Err(GameError::SessionFull);
        }
        let color = pick_color(&self.players);
        let player = Player::spawn(identity, requested_name, color, self.board.size(), rng);
        self.players.insert(identity.to_string(), player.clone());
        Ok(player)
    }

    /// Removes a player, canceling any pending stun expiry so a departed
    /// player can never be resurrected by a late timer. Stops play when
    /// fewer than two players remain mid-game.
    pub fn remove_player(&mut self, identity: &str) -> Result<DepartureOutcome, GameError> {
        if let Some(handle) = self.stun_timers.remove(identity) {
            handle.cancel();
        }
        let player = self
            .players
            .remove(identity)
            .ok_or(GameError::PlayerNotFound)?;
        let mut stopped = false;
        if self.status == SessionStatus::Playing && self.players.len() < 2 {
            self.status = SessionStatus::Waiting;
            self.cancel_clock();
            stopped = true;
        }
        Ok(DepartureOutcome { player, stopped })
    }

    /// Transitions Waiting -> Playing: fresh board, every player respawned
    /// on a random tile and credited for painting it, power-ups seeded on
    /// the remaining unpainted tiles. The caller arms the session clock.
    /// A finished session must go through `restart` first; starting it
    /// directly would carry the previous game's scores into the new one.
    pub fn start(&mut self, rng: &mut impl Rng) -> Result<(), GameError> {
        match self.status {
            SessionStatus::Waiting => {}
            SessionStatus::Playing => return Err(GameError::AlreadyStarted),
            SessionStatus::Finished => return Err(GameError::SessionFinished),
        }
        if self.players.len() < 2 {
            return Err(GameError::InsufficientPlayers);
        }
        self.board.reset();
        self.cancel_stun_timers();
        let size = self.board.size();
        for player in self.players.values_mut() {
            player.x = rng.gen_range(0..size);
            player.y = rng.gen_range(0..size);
            player.status = PlayerStatus::Active;
            if let Some(tile) = self.board.get_mut(player.x, player.y) {
                if tile.owner.as_deref() != Some(player.color.as_str()) {
                    tile.owner = Some(player.color.clone());
                    player.score += 1;
                }
            }
        }
        self.board
            .seed_power_ups(POWER_UP_PROBABILITY, &POWER_UP_KINDS, rng);
        self.status = SessionStatus::Playing;
        Ok(())
    }

    /// Back to Waiting: fresh board, zeroed scores, roster and positions
    /// kept. Pending timers are canceled.
    pub fn restart(&mut self) {
        self.cancel_clock();
        self.cancel_stun_timers();
        self.board.reset();
        for player in self.players.values_mut() {
            player.score = 0;
            player.status = PlayerStatus::Active;
        }
        self.status = SessionStatus::Waiting;
    }

    pub fn apply_move(
        &mut self,
        player_id: &str,
        x: i32,
        y: i32,
        rng: &mut impl Rng,
    ) -> Result<MoveOutcome, GameError> {
        resolver::resolve_move(self, player_id, x, y, rng)
    }

    /// Stores the pending stun-expiry handle for a player, replacing (and
    /// canceling) any previous one.
    pub fn set_stun_timer(&mut self, player_id: &str, handle: TimerHandle) {
        if let Some(old) = self.stun_timers.insert(player_id.to_string(), handle) {
            old.cancel();
        }
    }

    pub fn set_clock(&mut self, handle: TimerHandle) {
        self.cancel_clock();
        self.clock = Some(handle);
    }

    /// Timer callback: revert a stun if the player is still here and still
    /// stunned. `fired` must be the handle currently stored for the player
    /// and not canceled; a stale or canceled timer that already passed its
    /// own flag check before losing a race with cancel is ignored here,
    /// under the same lock the cancel ran under.
    pub fn expire_stun(&mut self, player_id: &str, fired: &TimerHandle) -> bool {
        match self.stun_timers.get(player_id) {
            Some(current) if current.same_timer(fired) && !fired.is_canceled() => {}
            _ => return false,
        }
        self.stun_timers.remove(player_id);
        match self.players.get_mut(player_id) {
            Some(player) if player.status == PlayerStatus::Stunned => {
                player.status = PlayerStatus::Active;
                true
            }
            _ => false,
        }
    }

    /// Timer callback: the time limit only finishes a session that is
    /// still playing, and only when `fired` is the clock currently armed.
    /// A stale clock surviving a restart cannot finish the next game.
    pub fn expire_clock(&mut self, fired: &TimerHandle) -> bool {
        match &self.clock {
            Some(current) if current.same_timer(fired) && !fired.is_canceled() => {}
            _ => return false,
        }
        self.clock = None;
        if self.status == SessionStatus::Playing {
            self.status = SessionStatus::Finished;
            true
        } else {
            false
        }
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let mut players: Vec<Player> = self.players.values().cloned().collect();
        players.sort_by(|a, b| a.id.cmp(&b.id));
        SessionSnapshot {
            id: self.id.clone(),
            status: self.status,
            board_size: self.board.size(),
            time_limit_seconds: self.time_limit_seconds,
            max_players: self.max_players,
            board: self.board.clone(),
            players,
        }
    }

    fn cancel_clock(&mut self) {
        if let Some(handle) = self.clock.take() {
            handle.cancel();
        }
    }

    fn cancel_stun_timers(&mut self) {
        for (_, handle) in self.stun_timers.drain() {
            handle.cancel();
        }
    }
}
