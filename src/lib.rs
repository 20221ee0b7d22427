//! Punchline - adaptive pairwise Elo ratings for jokes
//!
//! Two jokes are shown, a reader picks the funnier one, and both ratings move.
//! The step size adapts to how established each joke is, how consistent its
//! recent results are, and how surprising the outcome was.

pub mod config;
pub mod error;
pub mod metrics;
pub mod rating;
pub mod types;
pub mod utils;

// Re-export commonly used types and traits
pub use error::{RatingError, Result};
pub use types::*;

// Re-export the engine entry points
pub use rating::{compress, update, update_simple, RatingLedger};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
