//! Error taxonomy for the authoritative game core.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum GameError {
    #[error("maze size must be at least 3x3, got {width}x{height}")]
    InvalidMazeSize { width: i32, height: i32 },

    #[error("invalid level {0}, valid levels are 1, 2 or 3")]
    InvalidLevel(u8),

    #[error("coordinates ({x}, {y}) are out of bounds of the maze")]
    OutOfBounds { x: i32, y: i32 },

    #[error("player {0} not found in the game")]
    PlayerNotFound(u8),

    #[error("wrong session code {0}")]
    SessionCodeMismatch(u32),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
