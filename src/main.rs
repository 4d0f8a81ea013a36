//! Burger Board demo
//!
//! Builds the classic layout, lays a few arrows and lets the spawner run for
//! a while, logging board events.
//!
//! Usage: `burger-board [settings.json|- [seconds]]`
//!
//! Arguments are positional. `-` keeps the default settings, so
//! `burger-board - 5` runs the defaults for five seconds.

use std::time::Duration;

use rand::SeedableRng;
use rand_pcg::Pcg32;
use tokio::sync::broadcast::error::RecvError;

use burger_board::consts::DEFAULT_DEMO_SECONDS;
use burger_board::sim::{GameEvent, random_direction};
use burger_board::{Cell, Direction, Error, Game, Settings};

fn parse_args<I: IntoIterator<Item = String>>(args: I) -> Result<(Settings, u64), Error> {
    let mut args = args.into_iter();
    let settings = match args.next() {
        None => Settings::default(),
        Some(path) if path == "-" => Settings::default(),
        Some(path) => Settings::load(&path)?,
    };
    let seconds = match args.next() {
        None => DEFAULT_DEMO_SECONDS,
        Some(raw) => raw
            .parse::<u64>()
            .map_err(|e| Error::InvalidArgument(format!("run time {raw:?}: {e}")))?,
    };
    if let Some(extra) = args.next() {
        return Err(Error::InvalidArgument(format!("unexpected argument {extra:?}")));
    }
    if seconds == 0 {
        return Err(Error::InvalidArgument("run time must be > 0 seconds".into()));
    }
    Ok((settings, seconds))
}

fn log_event(event: &GameEvent) {
    match event {
        GameEvent::MoverScored { mover, player, points } => {
            log::info!("Player {:?} scored {} at {}", player, points, mover.cell)
        }
        GameEvent::ScoreChanged { player, score } => {
            log::info!("Player {:?} score is now {}", player, score)
        }
        GameEvent::MoverKilled { mover } => log::info!("Mover lost at {}", mover.cell),
        GameEvent::MoverSpawned { spawner, mover } => {
            log::info!("Spawner {:?} released a mover worth {}", spawner, mover.point_value)
        }
        GameEvent::ArrowPlaced { player, arrow, .. } => {
            log::info!("Player {:?} arrow {} -> {:?} at {}", player, arrow.index, arrow.direction, arrow.cell)
        }
        other => log::debug!("{:?}", other),
    }
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    env_logger::init();
    let (settings, seconds) = parse_args(std::env::args().skip(1))?;
    let mut rng = Pcg32::seed_from_u64(settings.seed);

    let (mut game, player) = Game::classic(settings)?;

    let mut rx = game.board().subscribe();
    let logger = tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(event) => log_event(&event),
                Err(RecvError::Lagged(skipped)) => log::warn!("Event log skipped {} events", skipped),
                Err(RecvError::Closed) => break,
            }
        }
    });

    // Route the spawner's lane into the base
    player.place_arrow(game.board(), Cell::new(2, 3), Direction::Up)?;
    player.place_arrow(game.board(), Cell::new(4, 0), random_direction(&mut rng))?;

    log::info!("Running for {} s", seconds);
    game.start()?;
    tokio::time::sleep(Duration::from_secs(seconds)).await;
    game.shutdown().await;
    logger.abort();

    println!("Final score: {}", player.score());
    Ok(())
}
