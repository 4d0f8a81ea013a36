//! Game wiring: one board, its players and spawners, and the loop handles

use std::sync::Arc;

use super::board::{Board, BoardConfig};
use super::direction::Direction;
use super::error::Result;
use super::object::{Base, Cell, Hole};
use super::player::{Player, PlayerId};
use super::spawner::{Spawner, SpawnerId, SpawnerTasks};
use crate::settings::Settings;

#[derive(Debug)]
pub struct Game {
    board: Arc<Board>,
    settings: Settings,
    players: Vec<Arc<Player>>,
    spawners: Vec<Arc<Spawner>>,
    tasks: Vec<SpawnerTasks>,
}

impl Game {
    pub fn new(config: BoardConfig, settings: Settings) -> Result<Self> {
        settings.validate()?;
        let board = Arc::new(Board::new(config)?);
        Ok(Self {
            board,
            settings,
            players: Vec::new(),
            spawners: Vec::new(),
            tasks: Vec::new(),
        })
    }

    /// The 6x6 layout with one player, a base, a hole, four walls and a spawner
    pub fn classic(settings: Settings) -> Result<(Self, Arc<Player>)> {
        let mut game = Self::new(BoardConfig::new(0, 0, 360, 360, 6, 6), settings)?;
        let player = game.add_player()?;
        game.add_base(Cell::new(2, 2), &player)?;
        game.add_hole(Cell::new(5, 1))?;

        game.add_wall(Cell::new(0, 0), Cell::new(1, 0))?;
        game.add_wall(Cell::new(0, 0), Cell::new(0, 1))?;
        game.add_wall(Cell::new(3, 3), Cell::new(3, 2))?;
        game.add_wall(Cell::new(5, 5), Cell::new(4, 5))?;

        let direction = game.settings.spawner_direction;
        game.add_spawner(Cell::new(0, 3), direction)?;
        log::info!("Classic layout ready");
        Ok((game, player))
    }

    pub fn board(&self) -> &Arc<Board> {
        &self.board
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn players(&self) -> &[Arc<Player>] {
        &self.players
    }

    pub fn spawners(&self) -> &[Arc<Spawner>] {
        &self.spawners
    }

    pub fn is_running(&self) -> bool {
        self.board.is_running()
    }

    pub fn add_player(&mut self) -> Result<Arc<Player>> {
        let id = PlayerId(self.players.len() as u32 + 1);
        let player = Arc::new(Player::new(id, self.settings.max_arrows_per_player)?);
        log::debug!("Player {:?} joined", id);
        self.players.push(player.clone());
        Ok(player)
    }

    pub fn add_base(&self, cell: Cell, owner: &Arc<Player>) -> Result<Base> {
        self.board.add_base(cell, owner.clone())
    }

    pub fn add_hole(&self, cell: Cell) -> Result<Hole> {
        self.board.add_hole(cell)
    }

    pub fn add_wall(&self, a: Cell, b: Cell) -> Result<()> {
        self.board.add_wall(a, b)
    }

    /// Place a spawner; it starts right away if the game is already running
    pub fn add_spawner(&mut self, cell: Cell, direction: Direction) -> Result<Arc<Spawner>> {
        let id = SpawnerId(self.spawners.len() as u32 + 1);
        let seed = self.settings.seed ^ u64::from(id.0);
        let spawner = Spawner::new(id, self.board.clone(), cell, direction, &self.settings, seed)?;
        if self.board.is_running() {
            self.tasks.push(spawner.start()?);
        }
        self.spawners.push(spawner.clone());
        Ok(spawner)
    }

    /// Set the running flag and launch every spawner's loops.
    ///
    /// Must be called from inside a tokio runtime. Starting a running game is a no-op.
    pub fn start(&mut self) -> Result<()> {
        if !self.board.start_game() {
            return Ok(());
        }
        // Loops left over from a previous run would otherwise resume
        for tasks in self.tasks.drain(..) {
            tasks.abort();
        }
        for spawner in &self.spawners {
            match spawner.start() {
                Ok(tasks) => self.tasks.push(tasks),
                Err(err) => {
                    self.board.stop_game();
                    return Err(err);
                }
            }
        }
        Ok(())
    }

    /// Clear the running flag; loops exit at their next delay boundary
    pub fn stop(&self) -> bool {
        self.board.stop_game()
    }

    /// Stop and wait for every loop to exit
    pub async fn shutdown(&mut self) {
        self.stop();
        for tasks in self.tasks.drain(..) {
            tasks.join().await;
        }
        log::info!("Game shut down");
    }

    /// Stop, drop every live mover and reset every player
    pub fn reset(&mut self) -> Result<()> {
        self.stop();
        for tasks in self.tasks.drain(..) {
            tasks.abort();
        }
        for spawner in &self.spawners {
            spawner.clear();
        }
        for player in &self.players {
            player.reset(&self.board)?;
        }
        log::info!("Game reset");
        Ok(())
    }

    pub fn live_movers(&self) -> usize {
        self.spawners.iter().map(|s| s.live_count()).sum()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::sim::{BoardObject, Error, GameEvent, WallSide};

    fn fast_settings() -> Settings {
        let mut settings = Settings::default();
        settings.set_probability_of_negative_spawn(0.0).unwrap();
        settings.set_cells_per_move(1.0).unwrap();
        settings.set_spawn_delay_ms(100).unwrap();
        settings.set_move_delay_ms(50).unwrap();
        settings
    }

    fn small_game() -> Game {
        Game::new(BoardConfig::new(0, 0, 360, 360, 6, 6), fast_settings()).unwrap()
    }

    #[test]
    fn test_classic_layout() {
        let (game, player) = Game::classic(Settings::default()).unwrap();
        let board = game.board();
        assert_eq!(player.id(), PlayerId(1));
        assert!(matches!(board.object_at(Cell::new(2, 2)), Some(BoardObject::Base(_))));
        assert!(matches!(board.object_at(Cell::new(5, 1)), Some(BoardObject::Hole(_))));
        assert!(matches!(board.object_at(Cell::new(0, 3)), Some(BoardObject::Spawner(_))));
        assert_eq!(board.wall_count(), 4);

        assert!(board.would_hit_wall(Cell::new(0, 0), Cell::new(1, 0)).unwrap());
        assert!(board.would_hit_wall(Cell::new(0, 1), Cell::new(0, 0)).unwrap());
        assert!(board.would_hit_wall(Cell::new(3, 2), Cell::new(3, 3)).unwrap());
        assert!(board.walls_at(Cell::new(4, 5)).unwrap().contains(WallSide::Right));
        assert!(!board.would_hit_wall(Cell::new(1, 1), Cell::new(1, 0)).unwrap());
        assert!(!game.is_running());
    }

    #[test]
    fn test_layout_collisions_are_errors() {
        let mut game = small_game();
        game.add_hole(Cell::new(1, 1)).unwrap();
        assert_eq!(
            game.add_hole(Cell::new(1, 1)).unwrap_err(),
            Error::OccupiedCell { cell: Cell::new(1, 1) }
        );
        assert!(game.add_spawner(Cell::new(1, 1), Direction::Up).is_err());
        assert!(game.add_wall(Cell::new(0, 0), Cell::new(2, 0)).is_err());
        assert!(game.spawners().is_empty());
    }

    #[test]
    fn test_start_outside_runtime_leaves_game_stopped() {
        let mut game = small_game();
        game.add_spawner(Cell::new(0, 0), Direction::Right).unwrap();
        assert!(matches!(game.start(), Err(Error::NoRuntime(_))));
        assert!(!game.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn test_movers_score_at_base() {
        let mut game = small_game();
        let player = game.add_player().unwrap();
        game.add_base(Cell::new(2, 2), &player).unwrap();
        game.add_spawner(Cell::new(0, 2), Direction::Right).unwrap();

        let mut rx = game.board().subscribe();
        game.start().unwrap();
        // Last spawn at 1000 ms reaches the base at 1050 ms
        tokio::time::sleep(Duration::from_millis(1070)).await;
        game.shutdown().await;

        assert!(player.score() >= 5);
        assert_eq!(game.live_movers(), 0);

        let mut scored = 0u32;
        while let Ok(event) = rx.try_recv() {
            if let GameEvent::MoverScored { player: id, points, .. } = event {
                assert_eq!(id, player.id());
                assert_eq!(points, 1);
                scored += 1;
            }
        }
        assert_eq!(scored, player.score());
    }

    #[tokio::test(start_paused = true)]
    async fn test_movers_die_in_hole() {
        let mut game = small_game();
        let player = game.add_player().unwrap();
        game.add_hole(Cell::new(5, 1)).unwrap();
        game.add_spawner(Cell::new(3, 1), Direction::Right).unwrap();

        let mut rx = game.board().subscribe();
        game.start().unwrap();
        tokio::time::sleep(Duration::from_millis(570)).await;
        game.shutdown().await;

        assert_eq!(player.score(), 0);
        assert_eq!(game.live_movers(), 0);
        let killed = std::iter::from_fn(|| rx.try_recv().ok())
            .filter(|event| matches!(event, GameEvent::MoverKilled { mover } if mover.cell == Cell::new(5, 1)))
            .count();
        assert!(killed >= 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_arrows_steer_movers_home() {
        let mut game = small_game();
        let player = game.add_player().unwrap();
        game.add_base(Cell::new(3, 4), &player).unwrap();
        game.add_spawner(Cell::new(0, 1), Direction::Right).unwrap();
        // (1,1) -> (2,1) -> (3,1) then down to the base
        player.place_arrow(game.board(), Cell::new(3, 1), Direction::Down).unwrap();

        game.start().unwrap();
        tokio::time::sleep(Duration::from_millis(1000)).await;
        game.shutdown().await;
        assert!(player.score() > 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_and_restart() {
        let mut game = small_game();
        game.add_spawner(Cell::new(2, 2), Direction::Up).unwrap();

        game.start().unwrap();
        // Second start is a no-op
        game.start().unwrap();
        tokio::time::sleep(Duration::from_millis(250)).await;
        assert!(game.stop());
        assert!(!game.stop());
        let count = game.live_movers();
        assert!(count > 0);

        tokio::time::sleep(Duration::from_millis(500)).await;
        assert_eq!(game.live_movers(), count);

        game.start().unwrap();
        tokio::time::sleep(Duration::from_millis(250)).await;
        game.shutdown().await;
        assert!(game.live_movers() > count);
    }

    #[tokio::test(start_paused = true)]
    async fn test_spawner_added_while_running_starts() {
        let mut game = small_game();
        game.start().unwrap();
        let spawner = game.add_spawner(Cell::new(2, 2), Direction::Down).unwrap();
        tokio::time::sleep(Duration::from_millis(250)).await;
        game.shutdown().await;
        assert_eq!(spawner.live_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reset_clears_everything() {
        let mut game = small_game();
        let player = game.add_player().unwrap();
        game.add_base(Cell::new(2, 2), &player).unwrap();
        game.add_spawner(Cell::new(0, 2), Direction::Right).unwrap();
        game.add_spawner(Cell::new(4, 4), Direction::Up).unwrap();
        player.place_arrow(game.board(), Cell::new(5, 5), Direction::Left).unwrap();

        game.start().unwrap();
        tokio::time::sleep(Duration::from_millis(420)).await;
        assert!(player.score() > 0);

        game.reset().unwrap();
        assert!(!game.is_running());
        assert_eq!(game.live_movers(), 0);
        assert_eq!(player.score(), 0);
        assert!(player.arrows().is_empty());
        assert!(game.board().object_at(Cell::new(5, 5)).is_none());
        // Layout survives a reset
        assert!(matches!(game.board().object_at(Cell::new(2, 2)), Some(BoardObject::Base(_))));

        tokio::time::sleep(Duration::from_millis(500)).await;
        assert_eq!(game.live_movers(), 0);
    }
}
