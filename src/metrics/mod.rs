//! Metrics for punchline
//!
//! Prometheus counters and histograms for comparisons recorded by a ledger.

pub mod collector;

pub use collector::RatingMetrics;
