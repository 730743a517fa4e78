use std::error::Error;
use std::fmt;

/// Every way a client intent can be rejected. The gateway relays the
/// stable `code` alongside the prose so clients can distinguish, say,
/// a full session from an illegal move.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GameError {
    SessionNotFound,
    SessionFull,
    DuplicateJoin,
    PlayerNotFound,
    GameNotActive,
    PlayerNotEligible,
    OutOfBounds { x: i32, y: i32 },
    IllegalMove,
    InsufficientPlayers,
    AlreadyStarted,
    SessionFinished,
}

impl GameError {
    pub fn code(&self) -> &'static str {
        match self {
            GameError::SessionNotFound => "session_not_found",
            GameError::SessionFull => "session_full",
            GameError::DuplicateJoin => "duplicate_join",
            GameError::PlayerNotFound => "player_not_found",
            GameError::GameNotActive => "game_not_active",
            GameError::PlayerNotEligible => "player_not_eligible",
            GameError::OutOfBounds { .. } => "out_of_bounds",
            GameError::IllegalMove => "illegal_move",
            GameError::InsufficientPlayers => "insufficient_players",
            GameError::AlreadyStarted => "already_started",
            GameError::SessionFinished => "session_finished",
        }
    }
}

impl fmt::Display for GameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GameError::SessionNotFound => write!(f, "Session not found"),
            GameError::SessionFull => write!(f, "Session is full"),
            GameError::DuplicateJoin => write!(f, "Already joined this session"),
            GameError::PlayerNotFound => write!(f, "Player not found in session"),
            GameError::GameNotActive => write!(f, "Game is not in progress"),
            GameError::PlayerNotEligible => write!(f, "Player cannot move right now"),
            GameError::OutOfBounds { x, y } => {
                write!(f, "Target ({}, {}) is outside the board", x, y)
            }
            GameError::IllegalMove => write!(f, "Target is not adjacent to current position"),
            GameError::InsufficientPlayers => write!(f, "At least two players are required"),
            GameError::AlreadyStarted => write!(f, "Game is already in progress"),
            GameError::SessionFinished => write!(f, "Game is finished; restart to play again"),
        }
    }
}

impl Error for GameError {}
