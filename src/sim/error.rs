//! Error taxonomy for board operations
//!
//! `WallCollision` and the non-strict occupied case are recovered locally
//! (the mover turns, the placement no-ops). Everything else is a contract
//! violation and is returned to the caller.

use thiserror::Error as ThisError;

use super::object::Cell;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Clone, PartialEq, ThisError)]
pub enum Error {
    #[error("cannot place object at {cell}: cell is already occupied")]
    OccupiedCell { cell: Cell },

    #[error("no object at {cell} to update")]
    EmptyCell { cell: Cell },

    #[error("wall between {from} and {to}")]
    WallCollision { from: Cell, to: Cell },

    #[error("cell {cell} is outside the {cols}x{rows} board")]
    OutOfBounds { cell: Cell, cols: i32, rows: i32 },

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("no async runtime to run the game loops: {0}")]
    NoRuntime(String),
}

impl Error {
    /// Out-of-range indices are a flavour of invalid argument
    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, Error::InvalidArgument(_) | Error::OutOfBounds { .. })
    }
}
