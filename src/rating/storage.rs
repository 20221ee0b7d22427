//! Rating storage interface and implementations
//!
//! This module defines the interface for persisting and retrieving joke ratings
//! together with the stats the engine reads, plus an in-memory implementation.

use crate::error::RatingError;
use crate::rating::compression::{self, IDLE_GRACE_DAYS};
use crate::rating::signals;
use crate::types::{JokeId, ParticipantStats};
use crate::utils::days_between;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Storage entry for a joke's rating with metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatingEntry {
    pub joke_id: JokeId,
    pub rating: f64,
    pub stats: ParticipantStats,
    pub created_at: DateTime<Utc>,
    /// Rating when the current idle spell began to be compressed
    #[serde(default)]
    pub idle_anchor: Option<f64>,
}

impl RatingEntry {
    /// Create a new rating entry for a joke that has never been compared
    pub fn new(joke_id: JokeId, initial_rating: f64, now: DateTime<Utc>) -> Self {
        Self {
            joke_id,
            rating: initial_rating,
            stats: ParticipantStats {
                last_activity: Some(now),
                ..ParticipantStats::default()
            },
            created_at: now,
            idle_anchor: None,
        }
    }

    /// When the joke was last compared, or created if never
    pub fn last_activity(&self) -> DateTime<Utc> {
        self.stats.last_activity.unwrap_or(self.created_at)
    }

    /// Apply the outcome of one comparison to the rating and stats.
    ///
    /// Volatility is smoothed from its previous value toward the value the
    /// engine would derive from the updated history.
    pub fn apply_outcome(
        &mut self,
        new_rating: f64,
        won: bool,
        form_window: usize,
        volatility_decay: f64,
        now: DateTime<Utc>,
    ) {
        let previous_volatility = signals::volatility(&self.stats);

        self.rating = new_rating;
        self.stats.record_outcome(won, form_window);

        let observed = signals::volatility(&ParticipantStats {
            volatility: None,
            ..self.stats.clone()
        });
        self.stats.volatility = Some(signals::smooth_volatility(
            previous_volatility,
            observed,
            volatility_decay,
        ));
        self.stats.last_activity = Some(now);
        self.idle_anchor = None;
    }

    /// Pull the rating toward `mean_rating` for the time spent idle as of `now`.
    ///
    /// Compression is always computed from the rating the idle spell started
    /// with, so repeated sweeps never compound. Returns whether the rating changed.
    pub fn compress_idle(
        &mut self,
        now: DateTime<Utc>,
        mean_rating: f64,
    ) -> crate::error::Result<bool> {
        let days_idle = days_between(self.last_activity(), now);
        if days_idle < IDLE_GRACE_DAYS {
            return Ok(false);
        }

        let anchor = *self.idle_anchor.get_or_insert(self.rating);
        let compressed = compression::compress(anchor, days_idle, mean_rating)?;
        if compressed == self.rating {
            return Ok(false);
        }

        self.rating = compressed;
        Ok(true)
    }
}

/// Trait for rating storage operations
#[cfg_attr(test, mockall::automock)]
pub trait RatingStorage: Send + Sync {
    /// Get a joke's rating entry
    fn get_rating(&self, joke_id: &JokeId) -> crate::error::Result<Option<RatingEntry>>;

    /// Store or update a joke's rating
    fn store_rating(&self, entry: RatingEntry) -> crate::error::Result<()>;

    /// Get ratings for multiple jokes
    fn get_ratings(&self, joke_ids: &[JokeId])
        -> crate::error::Result<HashMap<JokeId, RatingEntry>>;

    /// Store multiple rating updates atomically
    fn store_ratings(&self, entries: Vec<RatingEntry>) -> crate::error::Result<()>;

    /// Get all jokes with ratings
    fn get_all_ratings(&self) -> crate::error::Result<HashMap<JokeId, RatingEntry>>;

    /// Remove a joke's rating
    fn remove_rating(&self, joke_id: &JokeId) -> crate::error::Result<bool>;

    /// Highest-rated jokes first
    fn get_top_ratings(&self, limit: Option<usize>) -> crate::error::Result<Vec<RatingEntry>>;

    /// Number of jokes rated strictly above `rating`
    fn count_rated_above(&self, rating: f64) -> crate::error::Result<usize>;

    /// Get total number of rated jokes
    fn get_joke_count(&self) -> crate::error::Result<usize>;
}

/// In-memory rating storage implementation
#[derive(Debug)]
pub struct InMemoryRatingStorage {
    ratings: RwLock<HashMap<JokeId, RatingEntry>>,
    max_entries: usize,
}

impl InMemoryRatingStorage {
    /// Create a new in-memory rating storage
    pub fn new(max_entries: usize) -> Self {
        Self {
            ratings: RwLock::new(HashMap::new()),
            max_entries,
        }
    }

    fn read(&self) -> crate::error::Result<RwLockReadGuard<'_, HashMap<JokeId, RatingEntry>>> {
        self.ratings.read().map_err(|_| {
            RatingError::InternalError {
                message: "Failed to acquire ratings read lock".to_string(),
            }
            .into()
        })
    }

    fn write(&self) -> crate::error::Result<RwLockWriteGuard<'_, HashMap<JokeId, RatingEntry>>> {
        self.ratings.write().map_err(|_| {
            RatingError::InternalError {
                message: "Failed to acquire ratings write lock".to_string(),
            }
            .into()
        })
    }

    /// Drop the longest-idle entries once we exceed max_entries
    fn cleanup_if_needed(ratings: &mut HashMap<JokeId, RatingEntry>, max_entries: usize) {
        if ratings.len() <= max_entries {
            return;
        }

        let mut entries: Vec<_> = ratings
            .iter()
            .map(|(k, v)| (*k, v.last_activity()))
            .collect();
        entries.sort_by(|a, b| a.1.cmp(&b.1));

        let to_remove = ratings.len() - max_entries;
        for (joke_id, _) in entries.into_iter().take(to_remove) {
            ratings.remove(&joke_id);
        }
    }
}

impl Default for InMemoryRatingStorage {
    fn default() -> Self {
        Self::new(10000) // Default to 10,000 max entries
    }
}

fn by_rating_desc(a: &RatingEntry, b: &RatingEntry) -> std::cmp::Ordering {
    b.rating
        .partial_cmp(&a.rating)
        .unwrap_or(std::cmp::Ordering::Equal)
        .then_with(|| a.created_at.cmp(&b.created_at))
}

impl RatingStorage for InMemoryRatingStorage {
    fn get_rating(&self, joke_id: &JokeId) -> crate::error::Result<Option<RatingEntry>> {
        Ok(self.read()?.get(joke_id).cloned())
    }

    fn store_rating(&self, entry: RatingEntry) -> crate::error::Result<()> {
        let mut ratings = self.write()?;
        ratings.insert(entry.joke_id, entry);
        Self::cleanup_if_needed(&mut ratings, self.max_entries);
        Ok(())
    }

    fn get_ratings(
        &self,
        joke_ids: &[JokeId],
    ) -> crate::error::Result<HashMap<JokeId, RatingEntry>> {
        let ratings = self.read()?;

        let mut result = HashMap::new();
        for joke_id in joke_ids {
            if let Some(entry) = ratings.get(joke_id) {
                result.insert(*joke_id, entry.clone());
            }
        }

        Ok(result)
    }

    fn store_ratings(&self, entries: Vec<RatingEntry>) -> crate::error::Result<()> {
        let mut ratings = self.write()?;
        for entry in entries {
            ratings.insert(entry.joke_id, entry);
        }
        Self::cleanup_if_needed(&mut ratings, self.max_entries);
        Ok(())
    }

    fn get_all_ratings(&self) -> crate::error::Result<HashMap<JokeId, RatingEntry>> {
        Ok(self.read()?.clone())
    }

    fn remove_rating(&self, joke_id: &JokeId) -> crate::error::Result<bool> {
        Ok(self.write()?.remove(joke_id).is_some())
    }

    fn get_top_ratings(&self, limit: Option<usize>) -> crate::error::Result<Vec<RatingEntry>> {
        let mut entries: Vec<RatingEntry> = self.read()?.values().cloned().collect();
        entries.sort_by(by_rating_desc);

        if let Some(limit) = limit {
            entries.truncate(limit);
        }

        Ok(entries)
    }

    fn count_rated_above(&self, rating: f64) -> crate::error::Result<usize> {
        Ok(self
            .read()?
            .values()
            .filter(|entry| entry.rating > rating)
            .count())
    }

    fn get_joke_count(&self) -> crate::error::Result<usize> {
        Ok(self.read()?.len())
    }
}
