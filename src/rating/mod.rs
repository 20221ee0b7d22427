//! Adaptive pairwise Elo rating
//!
//! The engine is split the way an update flows: signals are extracted from
//! each joke's history, turned into expectations and a surprise factor, then
//! into per-side step sizes and clamped deltas. Storage, the ledger and the
//! calculator seam sit around that pure core.

pub mod calculator;
pub mod classic;
pub mod compression;
pub mod detailed;
pub mod engine;
pub mod expectation;
pub mod history;
pub mod ledger;
pub mod signals;
pub mod step;
pub mod storage;

// Re-export commonly used types
pub use calculator::RatingCalculator;
pub use classic::ClassicEloCalculator;
pub use compression::compress;
pub use detailed::DetailedRating;
pub use engine::{confidence, update, update_simple, AdaptiveEloCalculator};
pub use history::{EloHistoryEntry, RatingHistory};
pub use ledger::{ComparisonRecord, LeaderboardRow, RatingLedger};
pub use storage::{InMemoryRatingStorage, RatingEntry, RatingStorage};
