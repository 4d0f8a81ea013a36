//! Static board occupants
//!
//! The set is closed: bases, holes, arrows and spawn points. Each one reacts
//! to a mover entering its cell through [`BoardObject::interact`].

use std::fmt;
use std::sync::Arc;

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::direction::{Direction, ensure_moving_direction};
use super::error::Result;
use super::events::{EventBus, GameEvent};
use super::mover::MovableObject;
use super::player::{Player, PlayerId};
use super::spawner::SpawnerId;

/// Grid address. Signed so that a step off the edge is representable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Cell {
    pub col: i32,
    pub row: i32,
}

impl Cell {
    #[inline]
    pub const fn new(col: i32, row: i32) -> Self {
        Self { col, row }
    }

    /// Neighbouring cell one step in `direction` (`Random` stays put)
    pub fn offset(self, direction: Direction) -> Cell {
        let d = direction.delta();
        Cell::new(self.col + d.x, self.row + d.y)
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.col, self.row)
    }
}

/// A player's scoring target
#[derive(Debug, Clone)]
pub struct Base {
    pub cell: Cell,
    pub owner: Arc<Player>,
}

impl PartialEq for Base {
    fn eq(&self, other: &Self) -> bool {
        self.cell == other.cell && self.owner.id() == other.owner.id()
    }
}

/// Kills anything that falls in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hole {
    pub cell: Cell,
}

/// Player-owned redirector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Arrow {
    pub cell: Cell,
    pub direction: Direction,
    /// Ring-buffer slot in the owner's arrow set
    pub index: usize,
    pub owner: PlayerId,
}

impl Arrow {
    pub fn new(owner: PlayerId, index: usize, cell: Cell, direction: Direction) -> Result<Self> {
        Ok(Self {
            cell,
            direction: ensure_moving_direction(direction)?,
            index,
            owner,
        })
    }

    /// Same physical arrow (owner + slot), regardless of where it points now
    pub fn same_slot(&self, other: &Arrow) -> bool {
        self.owner == other.owner && self.index == other.index
    }
}

/// Board presence of a spawner. The runtime side lives in [`super::spawner::Spawner`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpawnPoint {
    pub cell: Cell,
    pub direction: Direction,
    pub spawner: SpawnerId,
}

/// Anything that can sit in a board cell
#[derive(Debug, Clone, PartialEq)]
pub enum BoardObject {
    Base(Base),
    Hole(Hole),
    Arrow(Arrow),
    Spawner(SpawnPoint),
}

/// What happened when a mover met a board object
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interaction {
    Scored { player: PlayerId, points: i32, score: u32 },
    Killed,
    Redirected(Direction),
    Turned(Direction),
}

impl BoardObject {
    pub fn cell(&self) -> Cell {
        match self {
            BoardObject::Base(b) => b.cell,
            BoardObject::Hole(h) => h.cell,
            BoardObject::Arrow(a) => a.cell,
            BoardObject::Spawner(s) => s.cell,
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            BoardObject::Base(_) => "base",
            BoardObject::Hole(_) => "hole",
            BoardObject::Arrow(_) => "arrow",
            BoardObject::Spawner(_) => "spawner",
        }
    }

    pub fn as_arrow(&self) -> Option<&Arrow> {
        match self {
            BoardObject::Arrow(a) => Some(a),
            _ => None,
        }
    }

    /// Apply this object's rule to a mover standing on its cell
    pub fn interact<R: Rng + ?Sized>(
        &self,
        mover: &mut MovableObject,
        rng: &mut R,
        events: &EventBus,
    ) -> Interaction {
        match self {
            BoardObject::Base(base) => {
                let points = mover.point_value();
                let score = base.owner.update_score(points);
                mover.mark_scored();
                log::debug!(
                    "Mover {:?} scored {} for player {:?} (score {})",
                    mover.id(),
                    points,
                    base.owner.id(),
                    score
                );
                events.publish(GameEvent::MoverScored {
                    mover: mover.snapshot(),
                    player: base.owner.id(),
                    points,
                });
                events.publish(GameEvent::ScoreChanged {
                    player: base.owner.id(),
                    score,
                });
                Interaction::Scored {
                    player: base.owner.id(),
                    points,
                    score,
                }
            }
            BoardObject::Hole(_) => {
                mover.kill();
                log::debug!("Mover {:?} fell into a hole at {}", mover.id(), mover.cell());
                events.publish(GameEvent::MoverKilled {
                    mover: mover.snapshot(),
                });
                Interaction::Killed
            }
            BoardObject::Arrow(arrow) => {
                // Arrow directions are validated at construction
                mover.redirect(arrow.direction);
                Interaction::Redirected(arrow.direction)
            }
            BoardObject::Spawner(_) => {
                let direction = mover.turn(rng);
                events.publish(GameEvent::MoverTurned {
                    mover: mover.snapshot(),
                });
                Interaction::Turned(direction)
            }
        }
    }
}

impl From<Base> for BoardObject {
    fn from(value: Base) -> Self {
        BoardObject::Base(value)
    }
}

impl From<Hole> for BoardObject {
    fn from(value: Hole) -> Self {
        BoardObject::Hole(value)
    }
}

impl From<Arrow> for BoardObject {
    fn from(value: Arrow) -> Self {
        BoardObject::Arrow(value)
    }
}

impl From<SpawnPoint> for BoardObject {
    fn from(value: SpawnPoint) -> Self {
        BoardObject::Spawner(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::board::{Board, BoardConfig};
    use crate::sim::mover::MoverState;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn board() -> Board {
        Board::new(BoardConfig::new(0, 0, 360, 360, 6, 6)).unwrap()
    }

    fn mover_at(board: &Board, cell: Cell, points: i32) -> MovableObject {
        MovableObject::new(
            board,
            SpawnerId(0),
            cell,
            Direction::Right,
            Direction::Left,
            points,
            1.0,
        )
        .unwrap()
    }

    #[test]
    fn test_cell_offset() {
        let c = Cell::new(2, 2);
        assert_eq!(c.offset(Direction::Up), Cell::new(2, 1));
        assert_eq!(c.offset(Direction::Down), Cell::new(2, 3));
        assert_eq!(c.offset(Direction::Left), Cell::new(1, 2));
        assert_eq!(c.offset(Direction::Right), Cell::new(3, 2));
        assert_eq!(c.offset(Direction::Random), c);
    }

    #[test]
    fn test_arrow_rejects_random_facing() {
        assert!(Arrow::new(PlayerId(1), 0, Cell::new(0, 0), Direction::Random).is_err());
    }

    #[test]
    fn test_base_scores_and_removes_mover() {
        let board = board();
        let player = Arc::new(Player::new(PlayerId(1), 3).unwrap());
        let base = BoardObject::Base(Base {
            cell: Cell::new(2, 2),
            owner: player.clone(),
        });
        let mut mover = mover_at(&board, Cell::new(2, 2), 7);
        let mut rng = Pcg32::seed_from_u64(1);

        let result = base.interact(&mut mover, &mut rng, board.events());
        assert_eq!(
            result,
            Interaction::Scored {
                player: PlayerId(1),
                points: 7,
                score: 7
            }
        );
        assert_eq!(player.score(), 7);
        assert!(!mover.is_alive());
    }

    #[test]
    fn test_hole_kills() {
        let board = board();
        let hole = BoardObject::Hole(Hole {
            cell: Cell::new(5, 1),
        });
        let mut mover = mover_at(&board, Cell::new(5, 1), 1);
        let mut rng = Pcg32::seed_from_u64(1);
        assert_eq!(hole.interact(&mut mover, &mut rng, board.events()), Interaction::Killed);
        assert_eq!(mover.state(), MoverState::Dead);
    }

    #[test]
    fn test_arrow_redirects_and_spawner_turns() {
        let board = board();
        let mut rng = Pcg32::seed_from_u64(1);
        let mut mover = mover_at(&board, Cell::new(1, 1), 1);

        let arrow = BoardObject::Arrow(
            Arrow::new(PlayerId(1), 0, Cell::new(1, 1), Direction::Down).unwrap(),
        );
        arrow.interact(&mut mover, &mut rng, board.events());
        assert_eq!(mover.moving_direction(), Direction::Down);

        let spawn_point = BoardObject::Spawner(SpawnPoint {
            cell: Cell::new(1, 1),
            direction: Direction::Right,
            spawner: SpawnerId(0),
        });
        // Turn policy is Left: Down -> Right
        let result = spawn_point.interact(&mut mover, &mut rng, board.events());
        assert_eq!(result, Interaction::Turned(Direction::Right));
        assert!(mover.is_alive());
    }
}
