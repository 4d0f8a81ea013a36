//! Tunable game rules
//!
//! Every field has a validating setter; `validate` re-checks the whole set
//! (used after deserializing from JSON).

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::sim::{Direction, Error, Result};

/// Game rules and timing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // === Rules ===
    /// Arrows a player may have on the board at once
    pub max_arrows_per_player: usize,

    // === Scoring ===
    /// Points for a regular mover reaching a base
    pub object_score: i32,
    /// Points for a negative mover reaching a base (<= 0)
    pub negative_object_score: i32,

    // === Movement ===
    /// Fraction of a cell covered by one move
    pub cells_per_move: f64,
    /// Turn policy for spawned movers (Left, Right or Random)
    pub turn_direction: Direction,

    // === Spawner ===
    /// Chance in [0, 1] that a spawned mover is negative
    pub probability_of_negative_spawn: f64,
    /// Default spawn direction for new spawners
    pub spawner_direction: Direction,

    // === Timing ===
    pub spawn_delay_ms: u64,
    pub move_delay_ms: u64,

    /// RNG seed for reproducible runs
    pub seed: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            max_arrows_per_player: DEFAULT_MAX_ARROWS_PER_PLAYER,
            object_score: DEFAULT_OBJECT_SCORE,
            negative_object_score: DEFAULT_NEGATIVE_OBJECT_SCORE,
            cells_per_move: DEFAULT_CELLS_PER_MOVE,
            turn_direction: DEFAULT_TURN_DIRECTION,
            probability_of_negative_spawn: DEFAULT_PROBABILITY_OF_NEGATIVE_SPAWN,
            spawner_direction: DEFAULT_SPAWNER_DIRECTION,
            spawn_delay_ms: DEFAULT_SPAWN_DELAY_MS,
            move_delay_ms: DEFAULT_MOVE_DELAY_MS,
            seed: DEFAULT_SEED,
        }
    }
}

fn invalid(message: &str) -> Error {
    Error::InvalidArgument(message.to_string())
}

impl Settings {
    pub fn set_max_arrows_per_player(&mut self, value: usize) -> Result<()> {
        if value == 0 {
            return Err(invalid("max arrows per player must be > 0"));
        }
        self.max_arrows_per_player = value;
        Ok(())
    }

    pub fn set_object_score(&mut self, value: i32) -> Result<()> {
        if value < 0 {
            return Err(invalid("object score cannot be negative"));
        }
        self.object_score = value;
        Ok(())
    }

    pub fn set_negative_object_score(&mut self, value: i32) -> Result<()> {
        if value > 0 {
            return Err(invalid("negative object score cannot be positive"));
        }
        self.negative_object_score = value;
        Ok(())
    }

    pub fn set_cells_per_move(&mut self, value: f64) -> Result<()> {
        if !(value.is_finite() && value > 0.0) {
            return Err(invalid("cells per move must be > 0"));
        }
        self.cells_per_move = value;
        Ok(())
    }

    pub fn set_turn_direction(&mut self, value: Direction) -> Result<()> {
        if value.is_vertical() {
            return Err(invalid("turn direction cannot be Up or Down"));
        }
        self.turn_direction = value;
        Ok(())
    }

    pub fn set_probability_of_negative_spawn(&mut self, value: f64) -> Result<()> {
        if !(0.0..=1.0).contains(&value) {
            return Err(invalid("probability of negative spawn must be between 0 and 1"));
        }
        self.probability_of_negative_spawn = value;
        Ok(())
    }

    /// Any direction, including `Random`
    pub fn set_spawner_direction(&mut self, value: Direction) {
        self.spawner_direction = value;
    }

    pub fn set_spawn_delay_ms(&mut self, value: u64) -> Result<()> {
        if value == 0 {
            return Err(invalid("spawn delay must be > 0 ms"));
        }
        self.spawn_delay_ms = value;
        Ok(())
    }

    pub fn set_move_delay_ms(&mut self, value: u64) -> Result<()> {
        if value == 0 {
            return Err(invalid("move delay must be > 0 ms"));
        }
        self.move_delay_ms = value;
        Ok(())
    }

    pub fn set_seed(&mut self, value: u64) {
        self.seed = value;
    }

    /// Re-run every setter's check against the current values
    pub fn validate(&self) -> Result<()> {
        let mut check = Settings::default();
        check.set_max_arrows_per_player(self.max_arrows_per_player)?;
        check.set_object_score(self.object_score)?;
        check.set_negative_object_score(self.negative_object_score)?;
        check.set_cells_per_move(self.cells_per_move)?;
        check.set_turn_direction(self.turn_direction)?;
        check.set_probability_of_negative_spawn(self.probability_of_negative_spawn)?;
        check.set_spawn_delay_ms(self.spawn_delay_ms)?;
        check.set_move_delay_ms(self.move_delay_ms)?;
        Ok(())
    }

    /// Parse and validate settings; missing fields take their defaults
    pub fn from_json(json: &str) -> Result<Self> {
        let settings: Settings = serde_json::from_str(json)
            .map_err(|e| Error::InvalidArgument(format!("bad settings JSON: {e}")))?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| Error::InvalidArgument(format!("cannot encode settings: {e}")))
    }

    /// Load settings from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| {
            Error::InvalidArgument(format!("cannot read settings {}: {e}", path.display()))
        })?;
        let settings = Self::from_json(&json)?;
        log::info!("Loaded settings from {}", path.display());
        Ok(settings)
    }
}
