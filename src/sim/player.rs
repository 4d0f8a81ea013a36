//! Players: score and a fixed ring of arrows
//!
//! A player may have at most `max_arrows` arrows on the board. Once all are
//! placed, each new placement relocates the oldest one (round-robin slot).

use glam::IVec2;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use super::board::{AddOptions, Board};
use super::direction::{Direction, ensure_moving_direction};
use super::error::{Error, Result};
use super::events::GameEvent;
use super::object::{Arrow, BoardObject, Cell};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PlayerId(pub u32);

#[derive(Debug)]
struct ArrowSlots {
    slots: Vec<Option<Arrow>>,
    /// Slot the next placement writes to
    next: usize,
    /// Slots currently holding an arrow
    placed: usize,
}

impl ArrowSlots {
    fn new(capacity: usize) -> Self {
        Self {
            slots: vec![None; capacity],
            next: 0,
            placed: 0,
        }
    }

    fn is_full(&self) -> bool {
        self.placed >= self.slots.len()
    }

    /// First empty slot at or after `next`, wrapping
    fn free_slot(&self) -> Option<usize> {
        let len = self.slots.len();
        (0..len)
            .map(|offset| (self.next + offset) % len)
            .find(|&i| self.slots[i].is_none())
    }
}

#[derive(Debug)]
pub struct Player {
    id: PlayerId,
    max_arrows: usize,
    score: Mutex<u32>,
    arrows: Mutex<ArrowSlots>,
}

impl Player {
    pub fn new(id: PlayerId, max_arrows: usize) -> Result<Self> {
        if max_arrows == 0 {
            return Err(Error::InvalidArgument(
                "max arrows per player must be > 0".to_string(),
            ));
        }
        Ok(Self {
            id,
            max_arrows,
            score: Mutex::new(0),
            arrows: Mutex::new(ArrowSlots::new(max_arrows)),
        })
    }

    pub fn id(&self) -> PlayerId {
        self.id
    }

    pub fn max_arrows(&self) -> usize {
        self.max_arrows
    }

    pub fn score(&self) -> u32 {
        *self.score.lock()
    }

    /// Add `delta` to the score, flooring at zero. Returns the new score.
    pub fn update_score(&self, delta: i32) -> u32 {
        let mut score = self.score.lock();
        let updated = (i64::from(*score) + i64::from(delta)).clamp(0, i64::from(u32::MAX));
        *score = updated as u32;
        *score
    }

    /// Arrows currently bound to slots, by slot index
    pub fn arrows(&self) -> Vec<Arrow> {
        self.arrows.lock().slots.iter().flatten().copied().collect()
    }

    pub fn placed_count(&self) -> usize {
        self.arrows.lock().placed
    }

    /// Slot the next placement will create or relocate
    pub fn next_slot(&self) -> usize {
        self.arrows.lock().next
    }

    /// Place (or relocate) an arrow.
    ///
    /// An occupied target cell is a silent no-op and yields `Ok(None)`.
    pub fn place_arrow(&self, board: &Board, cell: Cell, direction: Direction) -> Result<Option<Arrow>> {
        ensure_moving_direction(direction)?;
        if board.is_cell_occupied(cell) {
            log::debug!("Player {:?}: {} is occupied, arrow not placed", self.id, cell);
            return Ok(None);
        }

        let mut slots = self.arrows.lock();
        let (arrow, relocated_from) = if slots.is_full() {
            let index = slots.next;
            let arrow = Arrow::new(self.id, index, cell, direction)?;
            match slots.slots[index] {
                Some(previous) => match board.update_object_if(previous.cell, arrow.into(), |object| {
                    object.as_arrow().is_some_and(|placed| placed.same_slot(&previous))
                }) {
                    Ok(()) => (arrow, Some(previous.cell)),
                    Err(Error::OccupiedCell { .. }) => {
                        log::warn!("Player {:?}: {} was taken before the arrow moved", self.id, cell);
                        return Ok(None);
                    }
                    // The old arrow is gone from the board (its cell may hold
                    // something else now); place a fresh one
                    Err(Error::EmptyCell { .. }) => {
                        if !board.add_object(arrow.into(), AddOptions::quiet())? {
                            return Ok(None);
                        }
                        (arrow, None)
                    }
                    Err(err) => return Err(err),
                },
                None => return Err(Error::InvalidArgument(format!(
                    "arrow slot {index} is empty while all slots are counted as placed"
                ))),
            }
        } else {
            let index = slots.free_slot().unwrap_or(slots.next);
            let arrow = Arrow::new(self.id, index, cell, direction)?;
            // Emptiness was checked above; a concurrent placement wins the race
            if !board.add_object(arrow.into(), AddOptions::quiet())? {
                log::warn!("Player {:?}: {} was taken before the arrow landed", self.id, cell);
                return Ok(None);
            }
            slots.placed += 1;
            (arrow, None)
        };

        slots.slots[arrow.index] = Some(arrow);
        slots.next = (arrow.index + 1) % self.max_arrows;
        drop(slots);

        log::debug!(
            "Player {:?} placed arrow {} at {} facing {:?}",
            self.id,
            arrow.index,
            arrow.cell,
            arrow.direction
        );
        board.events().publish(GameEvent::ArrowPlaced {
            player: self.id,
            arrow,
            relocated_from,
        });
        Ok(Some(arrow))
    }

    /// Place an arrow in the cell under an absolute screen position
    pub fn place_arrow_at(&self, board: &Board, pos: IVec2, direction: Direction) -> Result<Option<Arrow>> {
        self.place_arrow(board, board.cell_from_absolute(pos), direction)
    }

    /// Take the arrow in `index` off the board and free its slot
    pub fn kill_arrow(&self, board: &Board, index: usize) -> Result<Option<Arrow>> {
        let mut slots = self.arrows.lock();
        let Some(arrow) = slots.slots.get_mut(index).and_then(Option::take) else {
            return Ok(None);
        };
        slots.placed -= 1;
        drop(slots);

        Self::remove_from_board(board, &arrow)?;
        log::debug!("Player {:?} arrow {} removed from {}", self.id, index, arrow.cell);
        Ok(Some(arrow))
    }

    /// Clear arrows (removing them from the board), score and counters
    pub fn reset(&self, board: &Board) -> Result<()> {
        let removed = {
            let mut slots = self.arrows.lock();
            let removed: Vec<Arrow> = slots.slots.iter_mut().filter_map(Option::take).collect();
            slots.next = 0;
            slots.placed = 0;
            removed
        };
        for arrow in &removed {
            Self::remove_from_board(board, arrow)?;
        }

        *self.score.lock() = 0;
        log::debug!("Player {:?} reset ({} arrows cleared)", self.id, removed.len());
        board.events().publish(GameEvent::ScoreChanged {
            player: self.id,
            score: 0,
        });
        Ok(())
    }

    fn remove_from_board(board: &Board, arrow: &Arrow) -> Result<()> {
        board.remove_object_if(arrow.cell, |object| match object {
            BoardObject::Arrow(placed) => placed.same_slot(arrow),
            _ => false,
        })?;
        Ok(())
    }
}
