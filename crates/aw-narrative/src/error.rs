//! Error types for narrative generation.

/// Errors raised while talking to the narrative service or interpreting
/// its replies. None of these escape the scene generator or the companion
/// agent; both convert them into local fallbacks.
#[derive(Debug, thiserror::Error)]
pub enum NarrativeError {
    /// The request could not be sent or the connection failed.
    #[error("narrative service request failed: {0}")]
    Transport(String),

    /// The service answered with a non-success status.
    #[error("narrative service returned {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body, possibly empty.
        body: String,
    },

    /// The reply did not match the expected shape.
    #[error("schema violation: {0}")]
    Schema(String),

    /// The reply was rejected by the content filter.
    #[error("content policy violation: {0}")]
    ContentPolicy(String),
}

/// Convenience result type for narrative operations.
pub type NarrativeResult<T> = Result<T, NarrativeError>;
