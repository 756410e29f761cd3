//! MTG rules engine
//!
//! Turn structure, the priority stack, combat resolution and mana payment for
//! a two-player Magic: The Gathering style game. Players are driven through a
//! blocking actor protocol so human and AI agents can act at their own pace.

pub mod config;
pub mod core;
pub mod error;
pub mod game;
pub mod loader;
pub mod zones;

pub use config::EngineConfig;
pub use error::{MtgError, Result};
