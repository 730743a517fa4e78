use rand::Rng;

use crate::game::board::{Board, PowerUpKind, Tile, POWER_UP_KINDS};
use crate::game::error::GameError;
use crate::game::player::{Player, PlayerStatus};
use crate::game::session::{GameSession, SessionStatus};

/// How long a collided player stays stunned.
pub const STUN_DURATION_MS: u64 = 3000;
/// Flat score bonus for Speed and Jump pickups.
pub const POWER_UP_BONUS: u32 = 2;
/// Chance that resolving a move drops a fresh power-up somewhere open.
pub const RESEED_PROBABILITY: f64 = 0.10;

/// Everything a single accepted move changed, ready to broadcast.
#[derive(Debug, Clone)]
pub struct MoveOutcome {
    pub player: Player,
    pub changed_tiles: Vec<Tile>,
    pub painted: bool,
    pub stunned_player_ids: Vec<String>,
    pub power_up_collected: Option<PowerUpKind>,
}

/// Validates and applies one move. Legality is checked in full before any
/// mutation; a rejected move leaves the session untouched.
pub fn resolve_move(
    session: &mut GameSession,
    player_id: &str,
    x: i32,
    y: i32,
    rng: &mut impl Rng,
) -> Result<MoveOutcome, GameError> {
    if session.status != SessionStatus::Playing {
        return Err(GameError::GameNotActive);
    }
    let mover = session
        .players
        .get(player_id)
        .ok_or(GameError::PlayerNotEligible)?;
    if mover.status != PlayerStatus::Active {
        return Err(GameError::PlayerNotEligible);
    }
    if !session.board.in_bounds(x, y) {
        return Err(GameError::OutOfBounds { x, y });
    }
    let distance = (x - mover.x).abs().max((y - mover.y).abs());
    if distance != 1 {
        return Err(GameError::IllegalMove);
    }
    let color = mover.color.clone();

    // Collision: stunning occupants is a side effect, not an obstacle.
    // Shared spawns can leave several players on one tile; every occupant
    // is stunned, not just the first one found.
    let stunned_player_ids: Vec<String> = session
        .players
        .values_mut()
        .filter(|p| p.id != player_id && p.x == x && p.y == y)
        .map(|victim| {
            victim.status = PlayerStatus::Stunned;
            victim.id.clone()
        })
        .collect();

    let mover = session
        .players
        .get_mut(player_id)
        .ok_or(GameError::PlayerNotFound)?;
    mover.x = x;
    mover.y = y;

    let mut changed_tiles = Vec::new();
    let mut painted = false;
    let mut score_delta: u32 = 0;
    let mut power_up_collected = None;

    if let Some(tile) = session.board.get_mut(x, y) {
        if tile.owner.as_deref() != Some(color.as_str()) {
            tile.owner = Some(color.clone());
            score_delta += 1;
            painted = true;
        }
        power_up_collected = tile.power_up.take();
        if painted || power_up_collected.is_some() {
            changed_tiles.push(tile.clone());
        }
    }

    match power_up_collected {
        Some(PowerUpKind::Speed) | Some(PowerUpKind::Jump) => {
            score_delta += POWER_UP_BONUS;
        }
        Some(PowerUpKind::Spray) => {
            // Bulk repaint scores every neighbor, already-owned or not.
            for dy in -1..=1 {
                for dx in -1..=1 {
                    if dx == 0 && dy == 0 {
                        continue;
                    }
                    if let Some(tile) = session.board.get_mut(x + dx, y + dy) {
                        tile.owner = Some(color.clone());
                        score_delta += 1;
                        changed_tiles.push(tile.clone());
                    }
                }
            }
        }
        None => {}
    }

    let mover = session
        .players
        .get_mut(player_id)
        .ok_or(GameError::PlayerNotFound)?;
    mover.score += score_delta;
    let player = mover.clone();

    if rng.gen_bool(RESEED_PROBABILITY) {
        if let Some(tile) = reseed_power_up(&mut session.board, rng) {
            changed_tiles.push(tile);
        }
    }

    Ok(MoveOutcome {
        player,
        changed_tiles,
        painted,
        stunned_player_ids,
        power_up_collected,
    })
}

/// Places one power-up of a uniformly random kind on a uniformly random
/// unpainted, power-up-free tile, if any exists.
pub fn reseed_power_up(board: &mut Board, rng: &mut impl Rng) -> Option<Tile> {
    let open = board.open_tiles();
    if open.is_empty() {
        return None;
    }
    let (x, y) = open[rng.gen_range(0..open.len())];
    let kind = POWER_UP_KINDS[rng.gen_range(0..POWER_UP_KINDS.len())];
    let tile = board.get_mut(x, y)?;
    tile.power_up = Some(kind);
    Some(tile.clone())
}
