//! Burger Board - a grid game of walls, arrows and wandering burgers
//!
//! Core modules:
//! - `sim`: Board, walls, objects, movers, players, spawners and game wiring
//! - `settings`: Tunable rules and timing, loadable from JSON

pub mod settings;
pub mod sim;

pub use settings::Settings;
pub use sim::{Board, BoardConfig, Cell, Direction, Error, Game, GameEvent, Player, Result};

/// Game configuration defaults
pub mod consts {
    use crate::sim::Direction;

    /// Arrows a player may have on the board before the oldest is recycled
    pub const DEFAULT_MAX_ARROWS_PER_PLAYER: usize = 3;

    /// Scoring
    pub const DEFAULT_OBJECT_SCORE: i32 = 1;
    pub const DEFAULT_NEGATIVE_OBJECT_SCORE: i32 = -10;

    /// Movement: half a cell per move
    pub const DEFAULT_CELLS_PER_MOVE: f64 = 0.5;
    pub const DEFAULT_TURN_DIRECTION: Direction = Direction::Right;

    /// Spawner defaults
    pub const DEFAULT_PROBABILITY_OF_NEGATIVE_SPAWN: f64 = 0.1;
    pub const DEFAULT_SPAWNER_DIRECTION: Direction = Direction::Right;

    /// Loop delays (milliseconds)
    pub const DEFAULT_SPAWN_DELAY_MS: u64 = 2000;
    pub const DEFAULT_MOVE_DELAY_MS: u64 = 200;

    pub const DEFAULT_SEED: u64 = 0x00b0_6e75;

    /// How long the demo binary runs when no duration is given
    pub const DEFAULT_DEMO_SECONDS: u64 = 20;
}
