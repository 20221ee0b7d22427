//! Rating calculator trait
//!
//! This module defines the interface the ledger uses to turn one comparison
//! into new ratings, so the adaptive engine and the fixed-K Elo can be swapped.

use crate::types::{Contender, UpdateResult};

/// Trait for calculating rating changes after a head-to-head comparison
pub trait RatingCalculator: Send + Sync {
    /// Calculate new ratings after `winner` was preferred over `loser`
    ///
    /// # Arguments
    /// * `winner` - Rating and stats of the joke judged better
    /// * `loser` - Rating and stats of the other joke
    ///
    /// # Returns
    /// Result containing the new ratings, confidence and diagnostics
    fn calculate(&self, winner: &Contender, loser: &Contender)
        -> crate::error::Result<UpdateResult>;

    /// Get the initial rating for new jokes
    fn initial_rating(&self) -> f64;

    /// Get current configuration as JSON
    fn config(&self) -> serde_json::Value;

    /// Update configuration from JSON
    fn update_config(&mut self, config: serde_json::Value) -> crate::error::Result<()>;
}
