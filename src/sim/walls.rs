//! Walls between axis-adjacent cells
//!
//! Each cell stores a bitmask of the sides that carry a wall. A wall between
//! A and B sets the bit on A's side facing B and on B's side facing A, so the
//! relation is symmetric by construction.
//!
//! Side convention (origin top-left): column +1 is `Right`, column -1 is
//! `Left`, row +1 is `Down`, row -1 is `Up`.

use serde::{Deserialize, Serialize};

use super::error::{Error, Result};
use super::object::Cell;

/// One side of a cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WallSide {
    Up,
    Down,
    Left,
    Right,
}

impl WallSide {
    #[inline]
    fn bit(self) -> u8 {
        match self {
            WallSide::Up => 0x1,
            WallSide::Down => 0x2,
            WallSide::Left => 0x4,
            WallSide::Right => 0x8,
        }
    }

    pub fn opposite(self) -> WallSide {
        match self {
            WallSide::Up => WallSide::Down,
            WallSide::Down => WallSide::Up,
            WallSide::Left => WallSide::Right,
            WallSide::Right => WallSide::Left,
        }
    }
}

/// Bitmask of walled sides for one cell
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WallSides(u8);

impl WallSides {
    pub const NONE: WallSides = WallSides(0);

    #[inline]
    pub fn contains(self, side: WallSide) -> bool {
        self.0 & side.bit() != 0
    }

    #[inline]
    pub fn insert(&mut self, side: WallSide) {
        self.0 |= side.bit();
    }
}

/// Side of `from` that faces `to`. The two cells must be axis-adjacent.
pub fn side_between(from: Cell, to: Cell) -> Result<WallSide> {
    let dc = to.col - from.col;
    let dr = to.row - from.row;
    match (dc, dr) {
        (1, 0) => Ok(WallSide::Right),
        (-1, 0) => Ok(WallSide::Left),
        (0, 1) => Ok(WallSide::Down),
        (0, -1) => Ok(WallSide::Up),
        (0, 0) => Err(Error::InvalidArgument(format!(
            "cannot place a wall between {from} and itself"
        ))),
        _ => Err(Error::InvalidArgument(format!(
            "cells {from} and {to} are not adjacent"
        ))),
    }
}

/// All walls on a board
#[derive(Debug, Clone)]
pub struct BoardWalls {
    cols: i32,
    rows: i32,
    sides: Vec<WallSides>,
    count: usize,
}

impl BoardWalls {
    pub fn new(cols: i32, rows: i32) -> Self {
        let len = (cols.max(0) as usize) * (rows.max(0) as usize);
        Self {
            cols,
            rows,
            sides: vec![WallSides::NONE; len],
            count: 0,
        }
    }

    /// Add a wall between two axis-adjacent cells. Re-adding an existing wall is a no-op.
    pub fn add_wall(&mut self, a: Cell, b: Cell) -> Result<WallSide> {
        let ia = self.index(a)?;
        let ib = self.index(b)?;
        let side = side_between(a, b)?;

        if !self.sides[ia].contains(side) {
            self.count += 1;
        }
        self.sides[ia].insert(side);
        self.sides[ib].insert(side.opposite());
        Ok(side)
    }

    /// Whether `from` has a wall on the side facing `to`
    pub fn would_hit_wall(&self, from: Cell, to: Cell) -> Result<bool> {
        let index = self.index(from)?;
        self.index(to)?;
        let side = side_between(from, to)?;
        Ok(self.sides[index].contains(side))
    }

    pub fn sides_at(&self, cell: Cell) -> Result<WallSides> {
        Ok(self.sides[self.index(cell)?])
    }

    /// Number of distinct walls
    pub fn wall_count(&self) -> usize {
        self.count
    }

    fn index(&self, cell: Cell) -> Result<usize> {
        if cell.col < 0 || cell.col >= self.cols || cell.row < 0 || cell.row >= self.rows {
            return Err(Error::OutOfBounds {
                cell,
                cols: self.cols,
                rows: self.rows,
            });
        }
        Ok((cell.row * self.cols + cell.col) as usize)
    }
}
