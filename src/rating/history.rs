//! Per-joke rating history and the global updates feed
//!
//! One entry is appended for each side of every recorded comparison, so the
//! rating trajectory of a joke can be charted after the fact. The same entries
//! feed a bounded, newest-first stream of leaderboard movements.

use crate::types::JokeId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};

/// Entries kept per joke before the oldest are dropped
pub const MAX_HISTORY_PER_JOKE: usize = 300;

/// Entries kept in the global updates feed
pub const MAX_RECENT_UPDATES: usize = 1000;

/// Entries a feed page shows by default
pub const DEFAULT_FEED_LIMIT: usize = 50;

/// Feed pages only show movement within this many places of the top
pub const DEFAULT_FEED_MAX_RANK: usize = 10;

/// A single rating change
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EloHistoryEntry {
    pub joke_id: JokeId,
    pub elo_before: f64,
    pub elo_after: f64,
    pub delta: f64,
    /// 1-based leaderboard position right after the change
    pub rank: usize,
    /// Rank recorded by this joke's previous change, if any
    #[serde(default)]
    pub prev_rank: Option<usize>,
    pub created_at: DateTime<Utc>,
}

impl EloHistoryEntry {
    pub fn new(
        joke_id: JokeId,
        elo_before: f64,
        elo_after: f64,
        rank: usize,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            joke_id,
            elo_before,
            elo_after,
            delta: elo_after - elo_before,
            rank,
            prev_rank: None,
            created_at,
        }
    }

    /// Positions climbed since the previous change; negative when the joke dropped
    pub fn rank_change(&self) -> Option<i64> {
        self.prev_rank.map(|prev| prev as i64 - self.rank as i64)
    }
}

/// Bounded, chronological history per joke
#[derive(Debug, Default)]
pub struct RatingHistory {
    entries: HashMap<JokeId, VecDeque<EloHistoryEntry>>,
    recent: VecDeque<EloHistoryEntry>,
    capacity: usize,
    feed_capacity: usize,
}

impl RatingHistory {
    pub fn new(capacity: usize) -> Self {
        Self::with_feed_capacity(capacity, MAX_RECENT_UPDATES)
    }

    pub fn with_feed_capacity(capacity: usize, feed_capacity: usize) -> Self {
        Self {
            entries: HashMap::new(),
            recent: VecDeque::new(),
            capacity,
            feed_capacity,
        }
    }

    /// Append a change, filling in `prev_rank` from the joke's last entry
    pub fn push(&mut self, mut entry: EloHistoryEntry) {
        let per_joke = self.entries.entry(entry.joke_id).or_default();
        entry.prev_rank = per_joke.back().map(|previous| previous.rank);

        per_joke.push_back(entry.clone());
        while per_joke.len() > self.capacity {
            per_joke.pop_front();
        }

        self.recent.push_back(entry);
        while self.recent.len() > self.feed_capacity {
            self.recent.pop_front();
        }
    }

    /// Oldest first
    pub fn for_joke(&self, joke_id: &JokeId) -> Vec<EloHistoryEntry> {
        self.entries
            .get(joke_id)
            .map(|entries| entries.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Newest first, optionally only changes that landed within the top `max_rank`
    pub fn recent(&self, limit: usize, max_rank: Option<usize>) -> Vec<EloHistoryEntry> {
        self.recent
            .iter()
            .rev()
            .filter(|entry| max_rank.map_or(true, |max_rank| entry.rank <= max_rank))
            .take(limit)
            .cloned()
            .collect()
    }

    pub fn forget(&mut self, joke_id: &JokeId) {
        self.retain_jokes(|id| id != joke_id);
    }

    /// Drop every joke, and its feed entries, for which `keep` is false
    pub fn retain_jokes<F>(&mut self, mut keep: F)
    where
        F: FnMut(&JokeId) -> bool,
    {
        self.entries.retain(|joke_id, _| keep(joke_id));
        let entries = &self.entries;
        self.recent.retain(|entry| entries.contains_key(&entry.joke_id));
    }

    /// Number of jokes with at least one entry
    pub fn joke_count(&self) -> usize {
        self.entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.values().map(VecDeque::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
