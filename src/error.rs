//! Error types for the rules engine

use thiserror::Error;

#[derive(Error, Debug)]
pub enum MtgError {
    #[error("Entity not found: {0}")]
    EntityNotFound(u32),

    #[error("Invalid game action: {0}")]
    InvalidAction(String),

    #[error("Insufficient mana to pay {cost} (pool: {pool})")]
    InsufficientMana { cost: String, pool: String },

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Unknown card: {0}")]
    UnknownCard(String),

    #[error("Player {0} disconnected while holding priority")]
    ActorDisconnected(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, MtgError>;
