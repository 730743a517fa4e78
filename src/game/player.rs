use std::collections::HashMap;

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Paint colors handed out in order at join time.
pub const PALETTE: [&str; 8] = [
    "red", "blue", "green", "yellow", "purple", "orange", "cyan", "magenta",
];

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PlayerStatus {
    Active,
    Stunned,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Player {
    pub id: String,
    pub display_name: String,
    pub color: String,
    pub x: i32,
    pub y: i32,
    pub score: u32,
    pub status: PlayerStatus,
    pub is_ai: bool,
}

impl Player {
    /// Creates a player at a uniformly random position within bounds,
    /// with score 0 and active status.
    pub fn spawn(
        id: &str,
        display_name: &str,
        color: &str,
        board_size: i32,
        rng: &mut impl Rng,
    ) -> Self {
        let display_name = if display_name.trim().is_empty() {
            let short: String = id.chars().take(8).collect();
            format!("player-{}", short)
        } else {
            display_name.trim().to_string()
        };
        Player {
            id: id.to_string(),
            display_name,
            color: color.to_string(),
            x: rng.gen_range(0..board_size),
            y: rng.gen_range(0..board_size),
            score: 0,
            status: PlayerStatus::Active,
            is_ai: false,
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == PlayerStatus::Active
    }
}

/// First palette entry not already in use. If every entry is taken the
/// first one is reused; a duplicate color is the documented degraded case.
pub fn pick_color(players: &HashMap<String, Player>) -> &'static str {
    PALETTE
        .iter()
        .find(|color| !players.values().any(|p| p.color == **color))
        .copied()
        .unwrap_or(PALETTE[0])
}
