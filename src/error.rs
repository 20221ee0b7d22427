//! Error types for the rating engine
//!
//! The engine itself is total over well-formed numbers; everything here is
//! raised when a caller hands it something outside that domain.

/// Result type alias for convenience
pub type Result<T> = anyhow::Result<T>;

/// Custom error types for specific rating scenarios
#[derive(Debug, thiserror::Error)]
pub enum RatingError {
    #[error("Invalid input: {reason}")]
    InvalidInput { reason: String },

    #[error("Configuration error: {message}")]
    ConfigurationError { message: String },

    #[error("Joke not found: {joke_id}")]
    JokeNotFound { joke_id: String },

    #[error("A joke cannot be compared with itself: {joke_id}")]
    SameJoke { joke_id: String },

    #[error("Not enough jokes to rank: {available} available, 2 needed")]
    NotEnoughJokes { available: usize },

    #[error("Internal error: {message}")]
    InternalError { message: String },
}

impl RatingError {
    /// Shorthand for the most common failure, a rejected engine input
    pub fn invalid(reason: impl Into<String>) -> Self {
        RatingError::InvalidInput {
            reason: reason.into(),
        }
    }
}
