//! Engine configuration
//!
//! All knobs have defaults matching the paper game; a JSON file may override
//! any subset of them.

use crate::{MtgError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Tunable parameters for a single game
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Life total each player starts with
    pub starting_life: i32,

    /// Cards dealt to each player by `start_game`
    pub opening_hand_size: usize,

    /// Hand size enforced during cleanup
    pub max_hand_size: usize,

    /// How long an AI actor may think before it is treated as passing
    pub ai_timeout_ms: u64,

    /// Idle timeout for human actors. `None` waits forever.
    pub human_idle_timeout_ms: Option<u64>,

    /// Turn limit before the game is declared a draw
    pub max_turns: u32,

    /// Seed for library shuffling
    pub seed: u64,

    /// Capacity of each player's action queue
    pub input_buffer: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            starting_life: 20,
            opening_hand_size: 7,
            max_hand_size: 7,
            ai_timeout_ms: 5000,
            human_idle_timeout_ms: None,
            max_turns: 200,
            seed: 0,
            input_buffer: 16,
        }
    }
}

impl EngineConfig {
    /// Load a config from a JSON file. Missing fields keep their defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        let config: EngineConfig = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings the engine cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.starting_life <= 0 {
            return Err(MtgError::Config(format!(
                "starting_life must be positive, got {}",
                self.starting_life
            )));
        }
        if self.input_buffer == 0 {
            return Err(MtgError::Config("input_buffer must be at least 1".to_string()));
        }
        if self.max_turns == 0 {
            return Err(MtgError::Config("max_turns must be at least 1".to_string()));
        }
        Ok(())
    }

    pub fn ai_timeout(&self) -> Duration {
        Duration::from_millis(self.ai_timeout_ms)
    }

    pub fn human_idle_timeout(&self) -> Option<Duration> {
        self.human_idle_timeout_ms.map(Duration::from_millis)
    }
}
