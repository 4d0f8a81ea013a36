//! Spawners: periodic mover production and per-tick movement
//!
//! Each spawner owns an arena of the movers it produced. Two independent
//! loops drive it while the board's running flag is set:
//! - every `spawn_delay_ms`, spawn one mover
//! - every `move_delay_ms`, advance every live mover and resolve what it lands on
//!
//! Clearing the flag lets both loops exit at their next delay boundary.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};
use slotmap::SlotMap;
use tokio::task::JoinHandle;

use super::board::Board;
use super::direction::{Direction, random_horizontal};
use super::error::{Error, Result};
use super::events::GameEvent;
use super::mover::{MovableObject, MoveOutcome, MoverId, MoverSnapshot};
use super::object::{Cell, SpawnPoint};
use crate::settings::Settings;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SpawnerId(pub u32);

/// Counts from one movement tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickSummary {
    pub moved: usize,
    pub turned: usize,
    pub removed: usize,
}

#[derive(Debug)]
struct SpawnerInner {
    movers: SlotMap<MoverId, MovableObject>,
    rng: Pcg32,
}

#[derive(Debug)]
pub struct Spawner {
    id: SpawnerId,
    point: SpawnPoint,
    board: Arc<Board>,
    settings: Settings,
    inner: Mutex<SpawnerInner>,
}

impl Spawner {
    /// Create a spawner and place its spawn point on the board
    pub fn new(
        id: SpawnerId,
        board: Arc<Board>,
        cell: Cell,
        direction: Direction,
        settings: &Settings,
        seed: u64,
    ) -> Result<Arc<Self>> {
        settings.validate()?;
        let point = board.add_spawner(cell, direction, id)?;
        log::debug!("Spawner {:?} at {} facing {:?}", id, cell, direction);
        Ok(Arc::new(Self {
            id,
            point,
            board,
            settings: settings.clone(),
            inner: Mutex::new(SpawnerInner {
                movers: SlotMap::with_key(),
                rng: Pcg32::seed_from_u64(seed),
            }),
        }))
    }

    pub fn id(&self) -> SpawnerId {
        self.id
    }

    pub fn cell(&self) -> Cell {
        self.point.cell
    }

    pub fn direction(&self) -> Direction {
        self.point.direction
    }

    pub fn board(&self) -> &Arc<Board> {
        &self.board
    }

    pub fn live_count(&self) -> usize {
        self.inner.lock().movers.len()
    }

    pub fn movers(&self) -> Vec<MoverSnapshot> {
        self.inner.lock().movers.values().map(MovableObject::snapshot).collect()
    }

    pub fn mover(&self, id: MoverId) -> Option<MoverSnapshot> {
        self.inner.lock().movers.get(id).map(MovableObject::snapshot)
    }

    /// Produce one mover just outside the spawner's cell.
    ///
    /// Returns `Ok(None)` when the start cell is off the board.
    pub fn spawn(&self) -> Result<Option<MoverId>> {
        let mut inner = self.inner.lock();
        let SpawnerInner { movers, rng } = &mut *inner;

        let moving = self.point.direction.resolve(rng);
        let turn = match self.settings.turn_direction {
            Direction::Random => random_horizontal(rng),
            direction => direction,
        };

        let start = self.point.cell.offset(moving);
        if !self.board.contains(start) {
            log::warn!(
                "Spawner {:?}: start cell {} is off the board, skipping spawn",
                self.id,
                start
            );
            return Ok(None);
        }

        let points = if rng.random_bool(self.settings.probability_of_negative_spawn) {
            self.settings.negative_object_score
        } else {
            self.settings.object_score
        };

        let mover = MovableObject::new(
            &self.board,
            self.id,
            start,
            moving,
            turn,
            points,
            self.settings.cells_per_move,
        )?;
        let id = movers.insert_with_key(|id| mover.with_id(id));
        let snapshot = movers[id].snapshot();
        drop(inner);

        log::debug!(
            "Spawner {:?} spawned {:?} at {} heading {:?} worth {}",
            self.id,
            id,
            start,
            moving,
            points
        );
        self.board.events().publish(GameEvent::MoverSpawned {
            spawner: self.id,
            mover: snapshot,
        });
        Ok(Some(id))
    }

    /// Advance every live mover once and drop the ones that died
    pub fn tick(&self) -> Result<TickSummary> {
        let mut inner = self.inner.lock();
        let SpawnerInner { movers, rng } = &mut *inner;

        let mut summary = TickSummary::default();
        let mut dead = Vec::new();
        for (id, mover) in movers.iter_mut() {
            match mover.advance(&self.board, rng)? {
                MoveOutcome::Moved => {
                    summary.moved += 1;
                    self.board.handle_moving_object_on_cell(mover, rng);
                }
                MoveOutcome::Turned => summary.turned += 1,
                MoveOutcome::Dead => {}
            }
            if !mover.is_alive() {
                dead.push(id);
            }
        }

        for id in dead {
            movers.remove(id);
            summary.removed += 1;
        }
        Ok(summary)
    }

    /// Kill a mover and drop it from the live set
    pub fn kill(&self, id: MoverId) -> Option<MoverSnapshot> {
        let mut mover = self.inner.lock().movers.remove(id)?;
        mover.kill();
        let snapshot = mover.snapshot();
        log::debug!("Spawner {:?} killed {:?}", self.id, id);
        self.board
            .events()
            .publish(GameEvent::MoverKilled { mover: snapshot });
        Some(snapshot)
    }

    /// Drop every live mover without events
    pub fn clear(&self) {
        self.inner.lock().movers.clear();
    }

    /// Launch the spawn and movement loops on the current tokio runtime
    pub fn start(self: &Arc<Self>) -> Result<SpawnerTasks> {
        let handle = tokio::runtime::Handle::try_current()
            .map_err(|e| Error::NoRuntime(e.to_string()))?;
        log::info!(
            "Spawner {:?} starting (spawn every {} ms, move every {} ms)",
            self.id,
            self.settings.spawn_delay_ms,
            self.settings.move_delay_ms
        );

        let spawner = Arc::clone(self);
        let spawn = handle.spawn(async move { spawner.spawn_loop().await });
        let spawner = Arc::clone(self);
        let movement = handle.spawn(async move { spawner.move_loop().await });
        Ok(SpawnerTasks { spawn, movement })
    }

    async fn spawn_loop(&self) {
        let delay = Duration::from_millis(self.settings.spawn_delay_ms);
        while self.board.is_running() {
            tokio::time::sleep(delay).await;
            if !self.board.is_running() {
                break;
            }
            if let Err(err) = self.spawn() {
                log::error!("Spawner {:?} spawn failed: {}", self.id, err);
                break;
            }
        }
        log::debug!("Spawner {:?} spawn loop exited", self.id);
    }

    async fn move_loop(&self) {
        let delay = Duration::from_millis(self.settings.move_delay_ms);
        while self.board.is_running() {
            tokio::time::sleep(delay).await;
            if !self.board.is_running() {
                break;
            }
            match self.tick() {
                Ok(summary) if summary.removed > 0 => {
                    log::debug!("Spawner {:?} removed {} movers", self.id, summary.removed);
                }
                Ok(_) => {}
                Err(err) => {
                    log::error!("Spawner {:?} tick failed: {}", self.id, err);
                    break;
                }
            }
        }
        log::debug!("Spawner {:?} move loop exited", self.id);
    }
}

/// Handles to a spawner's two loops
#[derive(Debug)]
pub struct SpawnerTasks {
    spawn: JoinHandle<()>,
    movement: JoinHandle<()>,
}

impl SpawnerTasks {
    /// Wait for both loops to exit (after the running flag is cleared)
    pub async fn join(self) {
        for (name, task) in [("spawn", self.spawn), ("move", self.movement)] {
            if let Err(err) = task.await {
                if !err.is_cancelled() {
                    log::error!("Spawner {} loop panicked: {}", name, err);
                }
            }
        }
    }

    /// Stop both loops immediately instead of at the next delay boundary
    pub fn abort(&self) {
        self.spawn.abort();
        self.movement.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.spawn.is_finished() && self.movement.is_finished()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;
    use crate::sim::mover::MoverState;
    use crate::sim::object::{Arrow, BoardObject};
    use crate::sim::player::{Player, PlayerId};

    fn board() -> Arc<Board> {
        Arc::new(Board::configure(0, 0, 360, 360, 6, 6).unwrap())
    }

    fn settings() -> Settings {
        let mut settings = Settings::default();
        settings.set_probability_of_negative_spawn(0.0).unwrap();
        settings.set_cells_per_move(1.0).unwrap();
        settings.set_turn_direction(Direction::Right).unwrap();
        settings.set_spawn_delay_ms(100).unwrap();
        settings.set_move_delay_ms(50).unwrap();
        settings
    }

    #[test]
    fn test_spawn_places_mover_next_to_spawner() {
        let board = board();
        let spawner = Spawner::new(SpawnerId(1), board.clone(), Cell::new(0, 3), Direction::Right, &settings(), 1).unwrap();
        assert!(matches!(board.object_at(Cell::new(0, 3)), Some(BoardObject::Spawner(_))));

        let mut rx = board.subscribe();
        let id = spawner.spawn().unwrap().unwrap();
        let mover = spawner.mover(id).unwrap();
        assert_eq!(mover.cell, Cell::new(1, 3));
        assert_eq!(mover.direction, Direction::Right);
        assert_eq!(mover.point_value, 1);
        assert_eq!(mover.spawner, SpawnerId(1));
        assert!(matches!(rx.try_recv(), Ok(GameEvent::MoverSpawned { spawner: SpawnerId(1), .. })));
    }

    #[test]
    fn test_negative_spawns() {
        let board = board();
        let mut settings = settings();
        settings.set_probability_of_negative_spawn(1.0).unwrap();
        let spawner = Spawner::new(SpawnerId(1), board, Cell::new(2, 2), Direction::Up, &settings, 1).unwrap();
        let id = spawner.spawn().unwrap().unwrap();
        assert_eq!(spawner.mover(id).unwrap().point_value, -10);
    }

    #[test]
    fn test_random_directions_resolve() {
        let board = board();
        let mut settings = settings();
        settings.set_turn_direction(Direction::Random).unwrap();
        let spawner = Spawner::new(SpawnerId(1), board.clone(), Cell::new(2, 2), Direction::Random, &settings, 9).unwrap();
        for _ in 0..20 {
            let id = spawner.spawn().unwrap().unwrap();
            let mover = spawner.mover(id).unwrap();
            assert_ne!(mover.direction, Direction::Random);
            assert_eq!(mover.cell, Cell::new(2, 2).offset(mover.direction));
        }
        assert_eq!(spawner.live_count(), 20);
    }

    #[test]
    fn test_spawn_off_board_is_skipped() {
        let board = board();
        let spawner = Spawner::new(SpawnerId(1), board, Cell::new(0, 0), Direction::Left, &settings(), 1).unwrap();
        assert_eq!(spawner.spawn().unwrap(), None);
        assert_eq!(spawner.live_count(), 0);
    }

    #[test]
    fn test_tick_kills_in_hole_and_removes() {
        let board = board();
        board.add_hole(Cell::new(3, 3)).unwrap();
        let spawner = Spawner::new(SpawnerId(1), board.clone(), Cell::new(1, 3), Direction::Right, &settings(), 1).unwrap();
        let id = spawner.spawn().unwrap().unwrap();

        let mut rx = board.subscribe();
        let summary = spawner.tick().unwrap();
        assert_eq!(summary, TickSummary { moved: 1, turned: 0, removed: 1 });
        assert_eq!(spawner.live_count(), 0);
        assert!(spawner.mover(id).is_none());

        assert!(matches!(rx.try_recv(), Ok(GameEvent::MoverMoved { .. })));
        match rx.try_recv() {
            Ok(GameEvent::MoverKilled { mover }) => {
                assert_eq!(mover.cell, Cell::new(3, 3));
                assert_eq!(mover.state, MoverState::Dead);
            }
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[test]
    fn test_tick_scores_at_base() {
        let board = board();
        let player = Arc::new(Player::new(PlayerId(1), 3).unwrap());
        board.add_base(Cell::new(3, 3), player.clone()).unwrap();
        let spawner = Spawner::new(SpawnerId(1), board, Cell::new(1, 3), Direction::Right, &settings(), 1).unwrap();
        spawner.spawn().unwrap();

        spawner.tick().unwrap();
        assert_eq!(player.score(), 1);
        assert_eq!(spawner.live_count(), 0);
    }

    #[test]
    fn test_kill_removes_from_live_set() {
        let board = board();
        let spawner = Spawner::new(SpawnerId(1), board, Cell::new(2, 2), Direction::Down, &settings(), 1).unwrap();
        let a = spawner.spawn().unwrap().unwrap();
        let b = spawner.spawn().unwrap().unwrap();

        let killed = spawner.kill(a).unwrap();
        assert_eq!(killed.state, MoverState::Dead);
        assert_eq!(spawner.live_count(), 1);
        assert!(spawner.kill(a).is_none());
        // Other handles stay valid
        assert!(spawner.mover(b).is_some());
    }

    #[test]
    fn test_threads_placing_and_ticking_keep_board_consistent() {
        let board = board();
        let first = Player::new(PlayerId(1), 2).unwrap();
        let second = Player::new(PlayerId(2), 2).unwrap();
        let spawner = Spawner::new(SpawnerId(1), board.clone(), Cell::new(0, 1), Direction::Right, &settings(), 5).unwrap();
        // A 3x3 patch right of the spawner, fought over by both players
        let cells: Vec<Cell> = (1..4).flat_map(|c| (0..3).map(move |r| Cell::new(c, r))).collect();

        std::thread::scope(|s| {
            for (offset, player) in [&first, &second].into_iter().enumerate() {
                let board = &board;
                let cells = &cells;
                s.spawn(move || {
                    for i in 0..500 {
                        let cell = cells[(i * 7 + offset * 3) % cells.len()];
                        let direction = Direction::CARDINALS[(i + offset) % 4];
                        player.place_arrow(board, cell, direction).unwrap();
                        if i % 50 == 49 {
                            player.kill_arrow(board, i % 2).unwrap();
                        }
                    }
                });
            }
            let spawner = &spawner;
            s.spawn(move || {
                for i in 0..500 {
                    if i % 5 == 0 {
                        spawner.spawn().unwrap();
                    }
                    spawner.tick().unwrap();
                }
            });
        });

        let objects = board.objects();
        let occupied: HashSet<Cell> = objects.iter().map(BoardObject::cell).collect();
        assert_eq!(occupied.len(), objects.len());
        assert!(matches!(board.object_at(Cell::new(0, 1)), Some(BoardObject::Spawner(_))));

        for player in [&first, &second] {
            let mut held = player.arrows();
            for arrow in &held {
                assert_eq!(board.object_at(arrow.cell), Some(BoardObject::Arrow(*arrow)));
            }
            let mut on_board: Vec<Arrow> = objects
                .iter()
                .filter_map(BoardObject::as_arrow)
                .filter(|a| a.owner == player.id())
                .copied()
                .collect();
            held.sort_by_key(|a| a.index);
            on_board.sort_by_key(|a| a.index);
            assert_eq!(on_board, held);
            assert_eq!(player.placed_count(), held.len());
        }
    }

    #[test]
    fn test_start_needs_runtime() {
        let board = board();
        let spawner = Spawner::new(SpawnerId(1), board, Cell::new(2, 2), Direction::Down, &settings(), 1).unwrap();
        assert!(matches!(spawner.start(), Err(Error::NoRuntime(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_loops_run_while_game_is_running() {
        let board = board();
        let spawner = Spawner::new(SpawnerId(1), board.clone(), Cell::new(2, 2), Direction::Down, &settings(), 1).unwrap();

        board.start_game();
        let tasks = spawner.start().unwrap();
        tokio::time::sleep(Duration::from_millis(350)).await;
        assert_eq!(spawner.live_count(), 3);

        board.stop_game();
        tokio::time::sleep(Duration::from_millis(200)).await;
        assert!(tasks.is_finished());
        tasks.join().await;

        // Nothing happens once stopped
        let before = spawner.movers();
        tokio::time::sleep(Duration::from_millis(500)).await;
        assert_eq!(spawner.movers(), before);
    }

    #[tokio::test(start_paused = true)]
    async fn test_loops_do_nothing_when_not_running() {
        let board = board();
        let spawner = Spawner::new(SpawnerId(1), board.clone(), Cell::new(2, 2), Direction::Down, &settings(), 1).unwrap();
        let tasks = spawner.start().unwrap();
        tasks.join().await;
        assert_eq!(spawner.live_count(), 0);
    }
}
