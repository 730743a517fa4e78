use rand::Rng;
use serde::{Deserialize, Serialize};

/// One-time consumable tile effects.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PowerUpKind {
    Speed,
    Jump,
    Spray,
}

pub const POWER_UP_KINDS: [PowerUpKind; 3] =
    [PowerUpKind::Speed, PowerUpKind::Jump, PowerUpKind::Spray];

/// Default chance for a tile to carry a power-up when the board is seeded.
pub const POWER_UP_PROBABILITY: f64 = 0.10;

/// One cell of the board. Coordinates are fixed for the board's lifetime;
/// only paint ownership and the power-up flag ever change.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Tile {
    pub x: i32,
    pub y: i32,
    pub owner: Option<String>,
    pub power_up: Option<PowerUpKind>,
}

impl Tile {
    fn unpainted(x: i32, y: i32) -> Self {
        Tile {
            x,
            y,
            owner: None,
            power_up: None,
        }
    }
}

/// Fixed-size square grid, stored row-major.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Board {
    size: i32,
    tiles: Vec<Tile>,
}

impl Board {
    pub fn new(size: i32) -> Self {
        let mut tiles = Vec::with_capacity((size * size) as usize);
        for y in 0..size {
            for x in 0..size {
                tiles.push(Tile::unpainted(x, y));
            }
        }
        Board { size, tiles }
    }

    pub fn size(&self) -> i32 {
        self.size
    }

    pub fn tiles(&self) -> &[Tile] {
        &self.tiles
    }

    /// Replaces every tile with a fresh unpainted one. Dimensions are kept.
    pub fn reset(&mut self) {
        for tile in &mut self.tiles {
            tile.owner = None;
            tile.power_up = None;
        }
    }

    pub fn in_bounds(&self, x: i32, y: i32) -> bool {
        x >= 0 && x < self.size && y >= 0 && y < self.size
    }

    pub fn get(&self, x: i32, y: i32) -> Option<&Tile> {
        if self.in_bounds(x, y) {
            self.tiles.get((y * self.size + x) as usize)
        } else {
            None
        }
    }

    pub fn get_mut(&mut self, x: i32, y: i32) -> Option<&mut Tile> {
        if self.in_bounds(x, y) {
            self.tiles.get_mut((y * self.size + x) as usize)
        } else {
            None
        }
    }

    /// Independently assigns each unpainted tile a uniformly random kind
    /// from `kinds` with the given probability.
    pub fn seed_power_ups(&mut self, probability: f64, kinds: &[PowerUpKind], rng: &mut impl Rng) {
        if kinds.is_empty() {
            return;
        }
        for tile in &mut self.tiles {
            if tile.owner.is_none() && rng.gen_bool(probability) {
                tile.power_up = Some(kinds[rng.gen_range(0..kinds.len())]);
            }
        }
    }

    /// Coordinates of tiles that are unpainted and carry no power-up.
    pub fn open_tiles(&self) -> Vec<(i32, i32)> {
        self.tiles
            .iter()
            .filter(|tile| tile.owner.is_none() && tile.power_up.is_none())
            .map(|tile| (tile.x, tile.y))
            .collect()
    }
}
