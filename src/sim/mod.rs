//! Board simulation
//!
//! Grid occupancy, walls and the objects that live on the board, plus the
//! movers that travel across it:
//! - One explicit `Board` shared behind `Arc`
//! - Seeded RNG per spawner
//! - State changes announced on a broadcast channel

pub mod board;
pub mod direction;
pub mod error;
pub mod events;
pub mod game;
pub mod mover;
pub mod object;
pub mod player;
pub mod spawner;
pub mod walls;

pub use board::{AddOptions, Board, BoardConfig};
pub use direction::{
    Direction, random_direction, random_horizontal, random_other_than, random_vertical,
};
pub use error::{Error, Result};
pub use events::{EVENT_CAPACITY, EventBus, GameEvent};
pub use game::Game;
pub use mover::{MovableObject, MoveOutcome, MoverId, MoverSnapshot, MoverState};
pub use object::{Arrow, Base, BoardObject, Cell, Hole, Interaction, SpawnPoint};
pub use player::{Player, PlayerId};
pub use spawner::{Spawner, SpawnerId, SpawnerTasks, TickSummary};
pub use walls::{BoardWalls, WallSide, WallSides};
