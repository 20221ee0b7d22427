//! Test fixtures and storage doubles for integration testing

use punchline::config::AppConfig;
use punchline::error::{RatingError, Result};
use punchline::metrics::RatingMetrics;
use punchline::rating::storage::{InMemoryRatingStorage, RatingEntry, RatingStorage};
use punchline::rating::{AdaptiveEloCalculator, RatingLedger};
use punchline::types::JokeId;
use punchline::utils::generate_joke_id;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

/// In-memory storage that counts writes and can be told to start failing
#[derive(Debug, Default)]
pub struct RecordingStorage {
    inner: InMemoryRatingStorage,
    writes: AtomicUsize,
    fail_writes: AtomicBool,
}

impl RecordingStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entries written so far
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    fn check_writable(&self) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(RatingError::InternalError {
                message: "storage unavailable".to_string(),
            }
            .into());
        }
        Ok(())
    }
}

impl RatingStorage for RecordingStorage {
    fn get_rating(&self, joke_id: &JokeId) -> Result<Option<RatingEntry>> {
        self.inner.get_rating(joke_id)
    }

    fn store_rating(&self, entry: RatingEntry) -> Result<()> {
        self.check_writable()?;
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.inner.store_rating(entry)
    }

    fn get_ratings(&self, joke_ids: &[JokeId]) -> Result<HashMap<JokeId, RatingEntry>> {
        self.inner.get_ratings(joke_ids)
    }

    fn store_ratings(&self, entries: Vec<RatingEntry>) -> Result<()> {
        self.check_writable()?;
        self.writes.fetch_add(entries.len(), Ordering::SeqCst);
        self.inner.store_ratings(entries)
    }

    fn get_all_ratings(&self) -> Result<HashMap<JokeId, RatingEntry>> {
        self.inner.get_all_ratings()
    }

    fn remove_rating(&self, joke_id: &JokeId) -> Result<bool> {
        self.inner.remove_rating(joke_id)
    }

    fn get_top_ratings(&self, limit: Option<usize>) -> Result<Vec<RatingEntry>> {
        self.inner.get_top_ratings(limit)
    }

    fn count_rated_above(&self, rating: f64) -> Result<usize> {
        self.inner.count_rated_above(rating)
    }

    fn get_joke_count(&self) -> Result<usize> {
        self.inner.get_joke_count()
    }
}

/// Ledger over a recording storage, using the default configuration
pub fn recording_ledger() -> (RatingLedger, Arc<RecordingStorage>) {
    let config = AppConfig::default();
    let storage = Arc::new(RecordingStorage::new());

    let ledger = RatingLedger::new(
        storage.clone(),
        Box::new(
            AdaptiveEloCalculator::new(config.engine.clone())
                .expect("default engine config is valid"),
        ),
        config.ledger.clone(),
        RatingMetrics::new().expect("fresh registry"),
    )
    .with_volatility_decay(config.engine.volatility_decay)
    .with_confidence_threshold(config.engine.confidence_threshold);

    (ledger, storage)
}

/// Fresh joke ids, weakest first when used as hidden strengths
pub fn joke_pool(size: usize) -> Vec<JokeId> {
    (0..size).map(|_| generate_joke_id()).collect()
}
