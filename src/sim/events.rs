//! Event catalog for observers (renderers, loggers, tests)
//!
//! Events fan out over a tokio broadcast channel. Publishing never blocks and
//! never fails the game: with no subscribers the event is simply dropped, and a
//! slow subscriber sees `RecvError::Lagged` instead of stalling the board.

use tokio::sync::broadcast;

use super::direction::Direction;
use super::mover::MoverSnapshot;
use super::object::{Arrow, BoardObject, Cell};
use super::player::PlayerId;
use super::spawner::SpawnerId;
use super::walls::WallSide;

/// Default number of buffered events per subscriber
pub const EVENT_CAPACITY: usize = 1024;

#[derive(Debug, Clone)]
pub enum GameEvent {
    // Generic occupancy changes
    ObjectAdded {
        object: BoardObject,
    },
    ObjectUpdated {
        from: Cell,
        object: BoardObject,
    },
    ObjectRemoved {
        object: BoardObject,
    },

    // Typed convenience events for building visuals
    BaseAdded {
        cell: Cell,
        owner: PlayerId,
    },
    HoleAdded {
        cell: Cell,
    },
    /// `side` is the side of `from` that faces `to`
    WallAdded {
        from: Cell,
        to: Cell,
        side: WallSide,
    },
    SpawnerAdded {
        cell: Cell,
        direction: Direction,
        spawner: SpawnerId,
    },

    // Player
    ArrowPlaced {
        player: PlayerId,
        arrow: Arrow,
        /// Previous cell when an existing arrow was relocated
        relocated_from: Option<Cell>,
    },
    ScoreChanged {
        player: PlayerId,
        score: u32,
    },

    // Movers
    MoverSpawned {
        spawner: SpawnerId,
        mover: MoverSnapshot,
    },
    MoverMoved {
        mover: MoverSnapshot,
    },
    MoverTurned {
        mover: MoverSnapshot,
    },
    MoverKilled {
        mover: MoverSnapshot,
    },
    MoverScored {
        mover: MoverSnapshot,
        player: PlayerId,
        points: i32,
    },

    GameStarted,
    GameStopped,
}

/// Publishing side of the event channel
#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<GameEvent>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::with_capacity(EVENT_CAPACITY)
    }
}

impl EventBus {
    pub fn with_capacity(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<GameEvent> {
        self.tx.subscribe()
    }

    pub fn publish(&self, event: GameEvent) {
        log::trace!("event: {:?}", event);
        // Err only means nobody is listening
        let _ = self.tx.send(event);
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}
