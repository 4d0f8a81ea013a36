//! The game board
//!
//! The board owns the occupancy map (at most one static object per cell), the
//! walls, the game-running flag and the event bus. It is shared behind an
//! `Arc` by players, spawners and movers; every operation takes `&self`.
//!
//! Locking:
//! - the occupancy map sits behind one mutex, taken once per operation and
//!   never held while calling out to other objects
//! - walls sit behind their own `RwLock`; they are only ever added, never removed

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use glam::IVec2;
use parking_lot::{Mutex, RwLock};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use super::direction::Direction;
use super::error::{Error, Result};
use super::events::{EventBus, GameEvent};
use super::mover::MovableObject;
use super::object::{Base, BoardObject, Cell, Hole, Interaction, SpawnPoint};
use super::player::Player;
use super::spawner::SpawnerId;
use super::walls::{BoardWalls, WallSides};

/// Screen rectangle and grid size. 0,0 is top-left.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardConfig {
    pub start_x: i32,
    pub start_y: i32,
    pub width: i32,
    pub height: i32,
    pub cols: i32,
    pub rows: i32,
}

impl BoardConfig {
    pub fn new(start_x: i32, start_y: i32, width: i32, height: i32, cols: i32, rows: i32) -> Self {
        Self {
            start_x,
            start_y,
            width,
            height,
            cols,
            rows,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.cols <= 0 || self.rows <= 0 {
            return Err(Error::InvalidArgument(format!(
                "board needs at least one column and row, got {}x{}",
                self.cols, self.rows
            )));
        }
        if self.width < self.cols || self.height < self.rows {
            return Err(Error::InvalidArgument(format!(
                "board of {}x{} px is too small for {}x{} cells",
                self.width, self.height, self.cols, self.rows
            )));
        }
        // Cell indices and the far corner must stay within i32
        if self.cols.checked_mul(self.rows).is_none() {
            return Err(Error::InvalidArgument(format!(
                "{}x{} cells is too many for one board",
                self.cols, self.rows
            )));
        }
        if self.start_x.checked_add(self.width).is_none()
            || self.start_y.checked_add(self.height).is_none()
        {
            return Err(Error::InvalidArgument(format!(
                "board of {}x{} px at ({}, {}) runs past the coordinate range",
                self.width, self.height, self.start_x, self.start_y
            )));
        }
        Ok(())
    }
}

/// How [`Board::add_object`] treats an occupied cell and whether it notifies
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AddOptions {
    /// Fail with `OccupiedCell` instead of silently doing nothing
    pub strict: bool,
    /// Publish `ObjectAdded` on success
    pub notify: bool,
}

impl Default for AddOptions {
    fn default() -> Self {
        Self {
            strict: true,
            notify: true,
        }
    }
}

impl AddOptions {
    /// Non-throwing, silent placement (callers publish their own event)
    pub fn quiet() -> Self {
        Self {
            strict: false,
            notify: false,
        }
    }
}

#[derive(Debug)]
pub struct Board {
    config: BoardConfig,
    cell_width: i32,
    cell_height: i32,
    start: IVec2,
    end: IVec2,
    cells: Mutex<Vec<Option<BoardObject>>>,
    walls: RwLock<BoardWalls>,
    running: AtomicBool,
    events: EventBus,
}

impl Board {
    /// Build a board from its screen rectangle and grid size
    pub fn configure(
        start_x: i32,
        start_y: i32,
        width: i32,
        height: i32,
        cols: i32,
        rows: i32,
    ) -> Result<Self> {
        Self::new(BoardConfig::new(start_x, start_y, width, height, cols, rows))
    }

    pub fn new(config: BoardConfig) -> Result<Self> {
        config.validate()?;
        let start = IVec2::new(config.start_x, config.start_y);
        let len = (config.cols * config.rows) as usize;
        log::info!(
            "Board configured: {}x{} cells, {}x{} px at {:?}",
            config.cols,
            config.rows,
            config.width,
            config.height,
            start
        );
        Ok(Self {
            config,
            cell_width: config.width / config.cols,
            cell_height: config.height / config.rows,
            start,
            end: start + IVec2::new(config.width, config.height),
            cells: Mutex::new(vec![None; len]),
            walls: RwLock::new(BoardWalls::new(config.cols, config.rows)),
            running: AtomicBool::new(false),
            events: EventBus::default(),
        })
    }

    pub fn config(&self) -> BoardConfig {
        self.config
    }

    pub fn cols(&self) -> i32 {
        self.config.cols
    }

    pub fn rows(&self) -> i32 {
        self.config.rows
    }

    pub fn cell_width(&self) -> i32 {
        self.cell_width
    }

    pub fn cell_height(&self) -> i32 {
        self.cell_height
    }

    /// Whether a cell index lies on the grid
    #[inline]
    pub fn contains(&self, cell: Cell) -> bool {
        cell.col >= 0 && cell.col < self.config.cols && cell.row >= 0 && cell.row < self.config.rows
    }

    fn index(&self, cell: Cell) -> Result<usize> {
        if !self.contains(cell) {
            return Err(Error::OutOfBounds {
                cell,
                cols: self.config.cols,
                rows: self.config.rows,
            });
        }
        Ok((cell.row * self.config.cols + cell.col) as usize)
    }

    // === Game flag and events ===

    /// Flip the running flag on. Returns false if it was already running.
    pub fn start_game(&self) -> bool {
        let was_running = self.running.swap(true, Ordering::SeqCst);
        if !was_running {
            log::info!("Game started");
            self.events.publish(GameEvent::GameStarted);
        }
        !was_running
    }

    /// Flip the running flag off; loops exit at their next delay boundary
    pub fn stop_game(&self) -> bool {
        let was_running = self.running.swap(false, Ordering::SeqCst);
        if was_running {
            log::info!("Game stopped");
            self.events.publish(GameEvent::GameStopped);
        }
        was_running
    }

    #[inline]
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    pub fn subscribe(&self) -> broadcast::Receiver<GameEvent> {
        self.events.subscribe()
    }

    // === Occupancy ===

    /// Place an object in its cell.
    ///
    /// Returns `Ok(false)` when the cell is taken and `options.strict` is off.
    pub fn add_object(&self, object: BoardObject, options: AddOptions) -> Result<bool> {
        let cell = object.cell();
        let index = self.index(cell)?;
        {
            let mut cells = self.cells.lock();
            if cells[index].is_some() {
                if options.strict {
                    return Err(Error::OccupiedCell { cell });
                }
                log::debug!("Skipped placing {} at {}: occupied", object.kind_name(), cell);
                return Ok(false);
            }
            cells[index] = Some(object.clone());
        }

        log::debug!("Placed {} at {}", object.kind_name(), cell);
        if options.notify {
            self.events.publish(GameEvent::ObjectAdded { object });
        }
        Ok(true)
    }

    /// Replace the object at `from` with `object`, moving it if its cell differs.
    ///
    /// The move is a single locked step: a taken destination fails with
    /// `OccupiedCell` and leaves `from` untouched, so observers never see the
    /// object missing from both cells.
    pub fn update_object(&self, from: Cell, object: BoardObject) -> Result<()> {
        self.update_object_if(from, object, |_| true)
    }

    /// [`Board::update_object`], but only if the occupant of `from` matches
    /// `predicate`. Any other occupant counts as `EmptyCell` and stays put.
    pub fn update_object_if<F>(&self, from: Cell, object: BoardObject, predicate: F) -> Result<()>
    where
        F: FnOnce(&BoardObject) -> bool,
    {
        let from_index = self.index(from)?;
        let to = object.cell();
        let to_index = self.index(to)?;
        {
            let mut cells = self.cells.lock();
            if !cells[from_index].as_ref().is_some_and(predicate) {
                return Err(Error::EmptyCell { cell: from });
            }
            if from_index != to_index {
                if cells[to_index].is_some() {
                    return Err(Error::OccupiedCell { cell: to });
                }
                cells[from_index] = None;
            }
            cells[to_index] = Some(object.clone());
        }

        log::debug!("Updated {} from {} to {}", object.kind_name(), from, to);
        self.events.publish(GameEvent::ObjectUpdated { from, object });
        Ok(())
    }

    /// Clear a cell. Empty cells are a no-op.
    pub fn remove_object(&self, cell: Cell) -> Result<Option<BoardObject>> {
        self.remove_object_if(cell, |_| true)
    }

    /// Clear a cell only if its occupant matches `predicate`
    pub fn remove_object_if<F>(&self, cell: Cell, predicate: F) -> Result<Option<BoardObject>>
    where
        F: FnOnce(&BoardObject) -> bool,
    {
        let index = self.index(cell)?;
        let removed = {
            let mut cells = self.cells.lock();
            if cells[index].as_ref().is_some_and(predicate) {
                cells[index].take()
            } else {
                None
            }
        };

        if let Some(object) = &removed {
            log::debug!("Removed {} from {}", object.kind_name(), cell);
            self.events.publish(GameEvent::ObjectRemoved {
                object: object.clone(),
            });
        }
        Ok(removed)
    }

    /// Snapshot of the occupant of a cell (off-board cells are empty)
    pub fn object_at(&self, cell: Cell) -> Option<BoardObject> {
        let index = self.index(cell).ok()?;
        self.cells.lock()[index].clone()
    }

    pub fn is_cell_occupied(&self, cell: Cell) -> bool {
        match self.index(cell) {
            Ok(index) => self.cells.lock()[index].is_some(),
            Err(_) => false,
        }
    }

    /// Snapshot of every placed object, in row-major order
    pub fn objects(&self) -> Vec<BoardObject> {
        self.cells.lock().iter().flatten().cloned().collect()
    }

    // === Typed placement ===

    pub fn add_wall(&self, a: Cell, b: Cell) -> Result<()> {
        let side = self.walls.write().add_wall(a, b)?;
        log::debug!("Wall added between {} and {}", a, b);
        self.events.publish(GameEvent::WallAdded { from: a, to: b, side });
        Ok(())
    }

    pub fn add_hole(&self, cell: Cell) -> Result<Hole> {
        let hole = Hole { cell };
        self.add_object(hole.into(), AddOptions::default())?;
        self.events.publish(GameEvent::HoleAdded { cell });
        Ok(hole)
    }

    pub fn add_base(&self, cell: Cell, owner: Arc<Player>) -> Result<Base> {
        let player = owner.id();
        let base = Base { cell, owner };
        self.add_object(base.clone().into(), AddOptions::default())?;
        self.events.publish(GameEvent::BaseAdded { cell, owner: player });
        Ok(base)
    }

    pub fn add_spawner(
        &self,
        cell: Cell,
        direction: Direction,
        spawner: SpawnerId,
    ) -> Result<SpawnPoint> {
        let point = SpawnPoint {
            cell,
            direction,
            spawner,
        };
        self.add_object(point.into(), AddOptions::default())?;
        self.events.publish(GameEvent::SpawnerAdded {
            cell,
            direction,
            spawner,
        });
        Ok(point)
    }

    // === Walls ===

    pub fn would_hit_wall(&self, from: Cell, to: Cell) -> Result<bool> {
        self.walls.read().would_hit_wall(from, to)
    }

    pub fn walls_at(&self, cell: Cell) -> Result<WallSides> {
        self.walls.read().sides_at(cell)
    }

    pub fn wall_count(&self) -> usize {
        self.walls.read().wall_count()
    }

    // === Movement ===

    /// Whether an absolute position falls outside the board rectangle `[start, end)`
    pub fn is_out_of_bounds(&self, pos: IVec2) -> bool {
        pos.x < self.start.x || pos.y < self.start.y || pos.x >= self.end.x || pos.y >= self.end.y
    }

    /// Cell a mover would occupy at `pos`, or `WallCollision` if a wall lies
    /// between its current cell and that cell along the way.
    pub fn cell_if_moved_to(&self, mover: &MovableObject, pos: IVec2) -> Result<Cell> {
        let from = mover.cell();
        let to = self.cell_from_absolute(pos);
        if from == to || !self.contains(from) {
            return Ok(to);
        }

        let walls = self.walls.read();
        let step = IVec2::new((to.col - from.col).signum(), (to.row - from.row).signum());
        let mut current = from;
        while current != to {
            let next = if current.col != to.col {
                Cell::new(current.col + step.x, current.row)
            } else {
                Cell::new(current.col, current.row + step.y)
            };
            if walls.would_hit_wall(current, next)? {
                return Err(Error::WallCollision {
                    from: current,
                    to: next,
                });
            }
            current = next;
        }
        Ok(to)
    }

    /// Let the object under the mover (if any) act on it
    pub fn handle_moving_object_on_cell<R: Rng + ?Sized>(
        &self,
        mover: &mut MovableObject,
        rng: &mut R,
    ) -> Option<Interaction> {
        // Clone out so the occupancy lock is not held during the interaction
        let object = self.object_at(mover.cell())?;
        Some(object.interact(mover, rng, &self.events))
    }

    // === Coordinate conversion ===

    /// Top-left pixel of a cell, clamping out-of-range indices to the edge
    pub fn absolute_from_cell(&self, cell: Cell) -> IVec2 {
        let col = cell.col.clamp(0, self.config.cols - 1);
        let row = cell.row.clamp(0, self.config.rows - 1);
        self.start + IVec2::new(col * self.cell_width, row * self.cell_height)
    }

    /// Cell containing a pixel, clamping positions off the board to the edge
    pub fn cell_from_absolute(&self, pos: IVec2) -> Cell {
        let col = Self::axis_to_cell(pos.x, self.start.x, self.end.x, self.cell_width, self.config.cols);
        let row = Self::axis_to_cell(pos.y, self.start.y, self.end.y, self.cell_height, self.config.rows);
        Cell::new(col, row)
    }

    fn axis_to_cell(value: i32, start: i32, end: i32, cell_size: i32, count: i32) -> i32 {
        if value <= start {
            0
        } else if value >= end {
            count - 1
        } else {
            ((value - start) / cell_size).min(count - 1)
        }
    }
}
