//! Error types for the platformer crates.

use thiserror::Error;

/// Top-level error type for operations at the edges of the simulation
/// (configuration files, replays, explicit handle lookups).
#[derive(Debug, Error)]
pub enum PlatformerError {
    /// Arena lookup errors
    #[error("Arena error: {0}")]
    Arena(#[from] ArenaError),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Replay verification failed
    #[error("Replay diverged at frame {frame}")]
    ReplayDiverged {
        /// Frame where the state hash did not match
        frame: u64,
    },

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Arena storage errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ArenaError {
    /// Handle does not refer to a live value
    #[error("No live value for handle {index}v{generation}")]
    NotFound {
        /// Slot index
        index: u32,
        /// Handle generation
        generation: u32,
    },
}

/// Result type alias for platformer operations.
pub type PlatformerResult<T> = Result<T, PlatformerError>;

/// Result type alias for arena operations.
pub type ArenaResult<T> = Result<T, ArenaError>;
