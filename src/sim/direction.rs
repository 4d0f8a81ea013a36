//! Directional vocabulary for the board
//!
//! `Direction` doubles as a facing (arrows, spawners), a travel direction
//! (movers) and a turn policy (movers). Each role rejects some values:
//! - moving directions can never be `Random`
//! - turn policies can never be `Up` or `Down`

use glam::IVec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::error::{Error, Result};

/// Direction an object can face, travel, or turn toward
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
    /// Resolved to a concrete direction at the point of use
    Random,
}

impl Direction {
    /// The four concrete directions, in roll order
    pub const CARDINALS: [Direction; 4] = [
        Direction::Up,
        Direction::Down,
        Direction::Left,
        Direction::Right,
    ];

    #[inline]
    pub fn is_cardinal(self) -> bool {
        self != Direction::Random
    }

    #[inline]
    pub fn is_vertical(self) -> bool {
        matches!(self, Direction::Up | Direction::Down)
    }

    #[inline]
    pub fn is_horizontal(self) -> bool {
        matches!(self, Direction::Left | Direction::Right)
    }

    pub fn opposite(self) -> Direction {
        match self {
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
            Direction::Random => Direction::Random,
        }
    }

    /// One-cell step as (col, row). Origin is top-left, so `Up` decreases the row.
    pub fn delta(self) -> IVec2 {
        match self {
            Direction::Up => IVec2::new(0, -1),
            Direction::Down => IVec2::new(0, 1),
            Direction::Left => IVec2::new(-1, 0),
            Direction::Right => IVec2::new(1, 0),
            Direction::Random => IVec2::ZERO,
        }
    }

    /// Counter-clockwise quarter turn: Up -> Left -> Down -> Right -> Up
    pub fn turned_left(self) -> Direction {
        match self {
            Direction::Up => Direction::Left,
            Direction::Left => Direction::Down,
            Direction::Down => Direction::Right,
            Direction::Right => Direction::Up,
            Direction::Random => Direction::Random,
        }
    }

    /// Clockwise quarter turn: Up -> Right -> Down -> Left -> Up
    pub fn turned_right(self) -> Direction {
        match self {
            Direction::Up => Direction::Right,
            Direction::Right => Direction::Down,
            Direction::Down => Direction::Left,
            Direction::Left => Direction::Up,
            Direction::Random => Direction::Random,
        }
    }

    /// Resolve `Random` to a concrete direction, leaving cardinals untouched
    pub fn resolve<R: Rng + ?Sized>(self, rng: &mut R) -> Direction {
        match self {
            Direction::Random => random_direction(rng),
            d => d,
        }
    }
}

/// Any of the four concrete directions
pub fn random_direction<R: Rng + ?Sized>(rng: &mut R) -> Direction {
    Direction::CARDINALS[rng.random_range(0..4)]
}

/// `Left` or `Right`
pub fn random_horizontal<R: Rng + ?Sized>(rng: &mut R) -> Direction {
    if rng.random_bool(0.5) {
        Direction::Left
    } else {
        Direction::Right
    }
}

/// `Up` or `Down`
pub fn random_vertical<R: Rng + ?Sized>(rng: &mut R) -> Direction {
    if rng.random_bool(0.5) {
        Direction::Up
    } else {
        Direction::Down
    }
}

/// Re-roll until the result differs from `current`
pub fn random_other_than<R: Rng + ?Sized>(current: Direction, rng: &mut R) -> Direction {
    loop {
        let candidate = random_direction(rng);
        if candidate != current {
            return candidate;
        }
    }
}

/// Moving directions must be concrete
pub fn ensure_moving_direction(direction: Direction) -> Result<Direction> {
    if direction == Direction::Random {
        return Err(Error::InvalidArgument(
            "moving direction cannot be Random".to_string(),
        ));
    }
    Ok(direction)
}

/// Turn policies are rotational senses, never Up/Down
pub fn ensure_turn_policy(direction: Direction) -> Result<Direction> {
    if direction.is_vertical() {
        return Err(Error::InvalidArgument(format!(
            "turn direction cannot be {direction:?}"
        )));
    }
    Ok(direction)
}
