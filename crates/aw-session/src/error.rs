//! Error types for sessions and snapshot storage.

use aw_core::{CoreError, TurnPhase};

/// Result type for snapshot storage.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors raised while reading or writing snapshots.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Filesystem failure.
    #[error("snapshot i/o failed: {0}")]
    Io(#[from] std::io::Error),

    /// The snapshot is not valid JSON or violates a game invariant.
    #[error("snapshot is malformed: {0}")]
    Format(#[from] serde_json::Error),

    /// The snapshot was written by an incompatible version.
    #[error("unsupported snapshot version {found} (expected {expected})")]
    UnsupportedVersion {
        /// Version in the file.
        found: u32,
        /// Version this build writes.
        expected: u32,
    },
}

/// Result type for engine commands.
pub type SessionResult<T> = Result<T, SessionError>;

/// Errors returned by engine commands. None of them leave the game state
/// half-updated.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// A game-state command was rejected.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A narrative call is already in flight.
    #[error("another action is still being processed")]
    Busy,

    /// The player tried to act outside their turn.
    #[error("not the player's turn (current: {0})")]
    NotPlayerTurn(TurnPhase),

    /// A free-form action was blank.
    #[error("action text is empty")]
    EmptyAction,
}

impl SessionError {
    /// Whether the error came from an unknown id and changed nothing.
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Core(e) if e.is_validation())
    }
}
