//! Simulator error types.

use story_player_core::error::PlayerError;
use thiserror::Error;

/// Startup and runtime errors for the simulator.
#[derive(Debug, Error)]
pub enum SimError {
    /// A required environment variable is missing or invalid.
    #[error("configuration error: {0}")]
    Config(String),

    /// A declaration or script file could not be read.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// A declaration or script file is not valid JSON for its schema.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// The player rejected an operation.
    #[error("player error: {0}")]
    Player(#[from] PlayerError),
}
