//! Movable objects travelling across the board
//!
//! A mover steps a fixed number of pixels per move in its moving direction.
//! Running off the board or into a wall makes it turn instead of moving.

use glam::IVec2;
use rand::Rng;
use slotmap::new_key_type;

use super::board::Board;
use super::direction::{Direction, ensure_moving_direction, ensure_turn_policy, random_other_than};
use super::error::{Error, Result};
use super::events::GameEvent;
use super::object::Cell;
use super::spawner::SpawnerId;

new_key_type! {
    /// Stable handle of a mover inside its spawner's arena
    pub struct MoverId;
}

/// Lifecycle of a mover. `Dead` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoverState {
    Moving,
    Turning,
    Dead,
}

/// Result of a single [`MovableObject::advance`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveOutcome {
    Moved,
    Turned,
    Dead,
}

// Rotational sense used when a mover is blocked
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TurnPolicy {
    Left,
    Right,
    Random,
}

impl TurnPolicy {
    fn from_direction(direction: Direction) -> Result<Self> {
        match ensure_turn_policy(direction)? {
            Direction::Left => Ok(TurnPolicy::Left),
            Direction::Right => Ok(TurnPolicy::Right),
            _ => Ok(TurnPolicy::Random),
        }
    }

    fn as_direction(self) -> Direction {
        match self {
            TurnPolicy::Left => Direction::Left,
            TurnPolicy::Right => Direction::Right,
            TurnPolicy::Random => Direction::Random,
        }
    }
}

/// Copy of a mover's observable state, carried by events
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MoverSnapshot {
    pub id: MoverId,
    pub spawner: SpawnerId,
    pub position: IVec2,
    pub cell: Cell,
    pub direction: Direction,
    pub point_value: i32,
    pub state: MoverState,
}

#[derive(Debug, Clone)]
pub struct MovableObject {
    id: MoverId,
    spawner: SpawnerId,
    position: IVec2,
    cell: Cell,
    moving_direction: Direction,
    turn_policy: TurnPolicy,
    point_value: i32,
    cells_per_move: f64,
    /// Pixels per move along x and y
    step: IVec2,
    state: MoverState,
}

impl MovableObject {
    pub fn new(
        board: &Board,
        spawner: SpawnerId,
        cell: Cell,
        moving_direction: Direction,
        turn_direction: Direction,
        point_value: i32,
        cells_per_move: f64,
    ) -> Result<Self> {
        if !(cells_per_move.is_finite() && cells_per_move > 0.0) {
            return Err(Error::InvalidArgument(format!(
                "cells per move must be > 0, got {cells_per_move}"
            )));
        }
        let step = IVec2::new(
            (cells_per_move * board.cell_width() as f64) as i32,
            (cells_per_move * board.cell_height() as f64) as i32,
        );
        if step.x <= 0 || step.y <= 0 {
            return Err(Error::InvalidArgument(format!(
                "{cells_per_move} cells per move is less than a pixel"
            )));
        }

        Ok(Self {
            id: MoverId::default(),
            spawner,
            position: board.absolute_from_cell(cell),
            cell,
            moving_direction: ensure_moving_direction(moving_direction)?,
            turn_policy: TurnPolicy::from_direction(turn_direction)?,
            point_value,
            cells_per_move,
            step,
            state: MoverState::Moving,
        })
    }

    /// Bind the arena handle (done once, on insertion)
    pub(crate) fn with_id(mut self, id: MoverId) -> Self {
        self.id = id;
        self
    }

    pub fn id(&self) -> MoverId {
        self.id
    }

    pub fn spawner(&self) -> SpawnerId {
        self.spawner
    }

    pub fn position(&self) -> IVec2 {
        self.position
    }

    pub fn cell(&self) -> Cell {
        self.cell
    }

    pub fn moving_direction(&self) -> Direction {
        self.moving_direction
    }

    pub fn turn_direction(&self) -> Direction {
        self.turn_policy.as_direction()
    }

    pub fn point_value(&self) -> i32 {
        self.point_value
    }

    pub fn cells_per_move(&self) -> f64 {
        self.cells_per_move
    }

    pub fn state(&self) -> MoverState {
        self.state
    }

    #[inline]
    pub fn is_alive(&self) -> bool {
        self.state != MoverState::Dead
    }

    pub fn set_moving_direction(&mut self, direction: Direction) -> Result<()> {
        self.moving_direction = ensure_moving_direction(direction)?;
        Ok(())
    }

    pub fn set_turn_direction(&mut self, direction: Direction) -> Result<()> {
        self.turn_policy = TurnPolicy::from_direction(direction)?;
        Ok(())
    }

    /// Point at a concrete direction (arrows). `Random` is ignored.
    pub(crate) fn redirect(&mut self, direction: Direction) {
        if direction.is_cardinal() {
            self.moving_direction = direction;
        }
    }

    /// Take one step, or turn if the step would leave the board or cross a wall
    pub fn advance<R: Rng + ?Sized>(&mut self, board: &Board, rng: &mut R) -> Result<MoveOutcome> {
        if !self.is_alive() {
            return Ok(MoveOutcome::Dead);
        }

        let proposed = self.position.saturating_add(self.moving_direction.delta() * self.step);
        if board.is_out_of_bounds(proposed) {
            self.turn(rng);
            board.events().publish(GameEvent::MoverTurned {
                mover: self.snapshot(),
            });
            return Ok(MoveOutcome::Turned);
        }

        let cell = match board.cell_if_moved_to(self, proposed) {
            Ok(cell) => cell,
            Err(Error::WallCollision { from, to }) => {
                log::trace!("Mover {:?} hit wall {} -> {}", self.id, from, to);
                self.turn(rng);
                board.events().publish(GameEvent::MoverTurned {
                    mover: self.snapshot(),
                });
                return Ok(MoveOutcome::Turned);
            }
            Err(err) => return Err(err),
        };

        self.position = proposed;
        self.cell = cell;
        self.state = MoverState::Moving;
        log::trace!("Mover {:?} moved to {} {:?}", self.id, cell, proposed);
        board.events().publish(GameEvent::MoverMoved {
            mover: self.snapshot(),
        });
        Ok(MoveOutcome::Moved)
    }

    /// Rotate the moving direction per the turn policy; returns the new direction
    pub fn turn<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Direction {
        self.moving_direction = match self.turn_policy {
            TurnPolicy::Left => self.moving_direction.turned_left(),
            TurnPolicy::Right => self.moving_direction.turned_right(),
            TurnPolicy::Random => random_other_than(self.moving_direction, rng),
        };
        if self.is_alive() {
            self.state = MoverState::Turning;
        }
        self.moving_direction
    }

    pub fn kill(&mut self) {
        self.state = MoverState::Dead;
    }

    /// Reached a base: terminal like a kill, but the points were paid out
    pub(crate) fn mark_scored(&mut self) {
        self.state = MoverState::Dead;
    }

    pub fn snapshot(&self) -> MoverSnapshot {
        MoverSnapshot {
            id: self.id,
            spawner: self.spawner,
            position: self.position,
            cell: self.cell,
            direction: self.moving_direction,
            point_value: self.point_value,
            state: self.state,
        }
    }
}
