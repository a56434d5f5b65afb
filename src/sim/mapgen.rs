//! Deterministic map generation for local games.
//!
//! One tile of the field is generated from the seed and mirrored so that
//! every player faces the same halite around their shipyard: across the
//! vertical axis for two players, across both axes for four.

// Map generation uses intentional casts for coordinate/RNG operations
#![allow(
    clippy::cast_possible_truncation,
    clippy::cast_precision_loss,
    clippy::cast_sign_loss
)]

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::game::{GameMap, Player, PlayerId, Position};
use crate::sim::SimError;

/// Smallest supported side length.
const MIN_SIDE: u16 = 8;

/// Richest a generated cell can be.
const MAX_CELL: f64 = 1000.0;

/// Turn limit the standard ruleset uses for a map of this width.
#[must_use]
pub fn default_max_turns(width: u16) -> u32 {
    300 + 25 * u32::from(width / 8)
}

/// Generate a map and starting players for a game.
///
/// # Arguments
///
/// * `seed` - Random seed for deterministic generation
/// * `width` - Map width in cells (even)
/// * `height` - Map height in cells (even for four players)
/// * `num_players` - Number of players (2 or 4)
/// * `initial_halite` - Halite each player starts with
///
/// # Errors
///
/// Returns an error if the dimensions cannot be mirrored for the player count.
pub fn generate_map(
    seed: u64,
    width: u16,
    height: u16,
    num_players: usize,
    initial_halite: u32,
) -> Result<(GameMap, Vec<Player>), SimError> {
    if num_players != 2 && num_players != 4 {
        return Err(SimError::PlayerCount(num_players));
    }
    let bad_size = width < MIN_SIDE
        || height < MIN_SIDE
        || width % 2 != 0
        || (num_players == 4 && height % 2 != 0);
    if bad_size {
        return Err(SimError::MapSize { width, height });
    }

    let tile_w = width / 2;
    let tile_h = if num_players == 4 { height / 2 } else { height };
    let mut rng = SmallRng::seed_from_u64(seed);
    let tile = generate_tile(&mut rng, usize::from(tile_w), usize::from(tile_h));

    let mut map = GameMap::new(width, height).ok_or(SimError::MapSize { width, height })?;
    for y in 0..height {
        for x in 0..width {
            let tx = if x < tile_w { x } else { width - 1 - x };
            let ty = if y < tile_h { y } else { height - 1 - y };
            let value = tile[usize::from(ty) * usize::from(tile_w) + usize::from(tx)];
            map.at_mut(Position::new(x, y)).halite = value;
        }
    }

    let home = Position::new(tile_w / 2, tile_h / 2);
    let mirror_x = |p: Position| Position::new(width - 1 - p.x, p.y);
    let mirror_y = |p: Position| Position::new(p.x, height - 1 - p.y);
    let mut shipyards = vec![home, mirror_x(home)];
    if num_players == 4 {
        shipyards.push(mirror_y(home));
        shipyards.push(mirror_y(mirror_x(home)));
    }

    let players: Vec<Player> = shipyards
        .into_iter()
        .enumerate()
        .map(|(i, shipyard)| {
            map.at_mut(shipyard).halite = 0;
            Player::new(i as PlayerId, shipyard, initial_halite)
        })
        .collect();
    Ok((map, players))
}

/// Fill one tile with smoothed noise plus a handful of rich patches.
fn generate_tile(rng: &mut SmallRng, width: usize, height: usize) -> Vec<u32> {
    let mut field: Vec<f64> = (0..width * height).map(|_| rng.r#gen::<f64>()).collect();
    for _ in 0..2 {
        field = blur(&field, width, height);
    }
    for value in &mut field {
        *value = value.powi(3) * 400.0;
    }

    let patches = (width * height / 64).max(2);
    for _ in 0..patches {
        let cx = rng.gen_range(0..width) as f64;
        let cy = rng.gen_range(0..height) as f64;
        let amplitude = rng.gen_range(200.0..700.0);
        let radius: f64 = rng.gen_range(1.5..4.0);
        for y in 0..height {
            for x in 0..width {
                let d2 = (x as f64 - cx).powi(2) + (y as f64 - cy).powi(2);
                field[y * width + x] += amplitude * (-d2 / (2.0 * radius * radius)).exp();
            }
        }
    }

    field
        .into_iter()
        .map(|v| v.clamp(0.0, MAX_CELL).round() as u32)
        .collect()
}

/// 3×3 box blur with clamped edges.
fn blur(field: &[f64], width: usize, height: usize) -> Vec<f64> {
    let mut out = vec![0.0; field.len()];
    for y in 0..height {
        for x in 0..width {
            let mut sum = 0.0;
            let mut n = 0.0;
            for ny in y.saturating_sub(1)..=(y + 1).min(height - 1) {
                for nx in x.saturating_sub(1)..=(x + 1).min(width - 1) {
                    sum += field[ny * width + nx];
                    n += 1.0;
                }
            }
            out[y * width + x] = sum / n;
        }
    }
    out
}
