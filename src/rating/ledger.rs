//! Rating ledger
//!
//! The ledger is the caller the engine expects: it owns storage, serializes
//! every read-compute-write so two comparisons touching the same joke cannot
//! interleave, maintains the per-joke form and volatility history, and keeps
//! a rating history for charts and the updates feed. History of a joke lives
//! exactly as long as its stored rating.

use crate::config::app::{AppConfig, LedgerSettings};
use crate::error::RatingError;
use crate::metrics::RatingMetrics;
use crate::rating::calculator::RatingCalculator;
use crate::rating::engine::AdaptiveEloCalculator;
use crate::rating::history::{EloHistoryEntry, RatingHistory, MAX_HISTORY_PER_JOKE};
use crate::rating::signals;
use crate::rating::storage::{InMemoryRatingStorage, RatingEntry, RatingStorage};
use crate::types::{Contender, JokeId, UpdateResult};
use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Instant;
use tracing::{debug, info, warn};

/// Everything that happened in one recorded comparison
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComparisonRecord {
    pub winner_id: JokeId,
    pub loser_id: JokeId,
    /// Ratings the calculator saw, after any idle compression
    pub winner_before: f64,
    pub loser_before: f64,
    pub result: UpdateResult,
    pub winner_rank: usize,
    pub loser_rank: usize,
    /// Whether the result clears the configured confidence threshold
    pub trusted: bool,
    pub recorded_at: DateTime<Utc>,
}

/// One line of the leaderboard
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaderboardRow {
    /// Competition rank: tied ratings share a rank
    pub rank: usize,
    pub joke_id: JokeId,
    pub rating: f64,
    pub games: u32,
    pub form: f64,
}

/// Serialized front door to rating storage
pub struct RatingLedger {
    storage: Arc<dyn RatingStorage>,
    calculator: Box<dyn RatingCalculator>,
    settings: LedgerSettings,
    volatility_decay: f64,
    confidence_threshold: f64,
    metrics: RatingMetrics,
    history: Mutex<RatingHistory>,
    write_lock: Mutex<()>,
}

fn lock<'a, T>(mutex: &'a Mutex<T>, what: &str) -> crate::error::Result<MutexGuard<'a, T>> {
    mutex.lock().map_err(|_| {
        RatingError::InternalError {
            message: format!("Failed to acquire {what} lock"),
        }
        .into()
    })
}

impl RatingLedger {
    /// Create a ledger over the given storage and calculator
    pub fn new(
        storage: Arc<dyn RatingStorage>,
        calculator: Box<dyn RatingCalculator>,
        settings: LedgerSettings,
        metrics: RatingMetrics,
    ) -> Self {
        Self {
            storage,
            calculator,
            settings,
            volatility_decay: 0.95,
            confidence_threshold: 0.7,
            metrics,
            history: Mutex::new(RatingHistory::new(MAX_HISTORY_PER_JOKE)),
            write_lock: Mutex::new(()),
        }
    }

    /// In-memory ledger running the adaptive engine, wired from application config
    pub fn from_config(config: &AppConfig) -> crate::error::Result<Self> {
        crate::config::validate_config(config)?;

        let storage = Arc::new(InMemoryRatingStorage::new(config.ledger.max_entries));
        let calculator = AdaptiveEloCalculator::new(config.engine.clone())?
            .with_initial_rating(config.ledger.initial_rating);

        Ok(Self::new(
            storage,
            Box::new(calculator),
            config.ledger.clone(),
            RatingMetrics::new()?,
        )
        .with_volatility_decay(config.engine.volatility_decay)
        .with_confidence_threshold(config.engine.confidence_threshold))
    }

    pub fn with_volatility_decay(mut self, volatility_decay: f64) -> Self {
        self.volatility_decay = volatility_decay;
        self
    }

    pub fn with_confidence_threshold(mut self, confidence_threshold: f64) -> Self {
        self.confidence_threshold = confidence_threshold;
        self
    }

    pub fn metrics(&self) -> &RatingMetrics {
        &self.metrics
    }

    pub fn settings(&self) -> &LedgerSettings {
        &self.settings
    }

    /// Create an entry at the initial rating unless the joke is already known
    pub fn register(
        &self,
        joke_id: JokeId,
        now: DateTime<Utc>,
    ) -> crate::error::Result<RatingEntry> {
        let _guard = lock(&self.write_lock, "ledger")?;

        if let Some(existing) = self.storage.get_rating(&joke_id)? {
            return Ok(existing);
        }

        let expected_count = self.storage.get_joke_count()? + 1;
        let entry = RatingEntry::new(joke_id, self.calculator.initial_rating(), now);
        self.storage.store_rating(entry.clone())?;
        let stored = self.prune_evicted_history(expected_count)?;
        self.metrics.set_tracked_jokes(stored);
        debug!(%joke_id, rating = entry.rating, "Registered joke");

        Ok(entry)
    }

    /// Current entry for a joke
    pub fn get(&self, joke_id: &JokeId) -> crate::error::Result<RatingEntry> {
        self.storage.get_rating(joke_id)?.ok_or_else(|| {
            RatingError::JokeNotFound {
                joke_id: joke_id.to_string(),
            }
            .into()
        })
    }

    /// Record that `winner_id` was preferred over `loser_id`.
    ///
    /// Unknown jokes are registered on the fly. Both entries are read, updated
    /// and written back under one lock.
    pub fn record_comparison(
        &self,
        winner_id: JokeId,
        loser_id: JokeId,
        now: DateTime<Utc>,
    ) -> crate::error::Result<ComparisonRecord> {
        if winner_id == loser_id {
            return Err(RatingError::SameJoke {
                joke_id: winner_id.to_string(),
            }
            .into());
        }

        let _guard = lock(&self.write_lock, "ledger")?;

        let mut entries = self.storage.get_ratings(&[winner_id, loser_id])?;
        let expected_count = self.storage.get_joke_count()? + 2 - entries.len();
        let initial_rating = self.calculator.initial_rating();
        let mut winner = entries
            .remove(&winner_id)
            .unwrap_or_else(|| RatingEntry::new(winner_id, initial_rating, now));
        let mut loser = entries
            .remove(&loser_id)
            .unwrap_or_else(|| RatingEntry::new(loser_id, initial_rating, now));

        if self.settings.compress_idle_before_compare {
            let mut compressed = 0;
            for entry in [&mut winner, &mut loser] {
                if entry.compress_idle(now, self.settings.mean_rating)? {
                    debug!(
                        joke_id = %entry.joke_id,
                        rating = entry.rating,
                        "Compressed idle rating before comparison"
                    );
                    compressed += 1;
                }
            }
            self.metrics.record_compressions(compressed);
        }

        let winner_before = winner.rating;
        let loser_before = loser.rating;

        let started = Instant::now();
        let result = self.calculator.calculate(
            &Contender::new(winner.rating, winner.stats.clone()),
            &Contender::new(loser.rating, loser.stats.clone()),
        )?;
        let elapsed = started.elapsed();

        winner.apply_outcome(
            result.new_winner_rating,
            true,
            self.settings.form_window,
            self.volatility_decay,
            now,
        );
        loser.apply_outcome(
            result.new_loser_rating,
            false,
            self.settings.form_window,
            self.volatility_decay,
            now,
        );

        self.storage.store_ratings(vec![winner.clone(), loser.clone()])?;

        let winner_rank = self.storage.count_rated_above(winner.rating)? + 1;
        let loser_rank = self.storage.count_rated_above(loser.rating)? + 1;

        {
            let mut history = lock(&self.history, "history")?;
            history.push(EloHistoryEntry::new(
                winner_id,
                winner_before,
                winner.rating,
                winner_rank,
                now,
            ));
            history.push(EloHistoryEntry::new(
                loser_id,
                loser_before,
                loser.rating,
                loser_rank,
                now,
            ));
        }
        let stored = self.prune_evicted_history(expected_count)?;

        self.metrics.record_update(&result, elapsed);
        self.metrics.set_tracked_jokes(stored);

        let trusted = result.confidence >= self.confidence_threshold;
        if !trusted {
            warn!(
                %winner_id,
                %loser_id,
                confidence = result.confidence,
                threshold = self.confidence_threshold,
                "Low-confidence rating update"
            );
        }

        info!(
            %winner_id,
            %loser_id,
            winner_before,
            winner_after = winner.rating,
            loser_before,
            loser_after = loser.rating,
            outcome = %result.outcome_kind(),
            "Recorded comparison"
        );

        Ok(ComparisonRecord {
            winner_id,
            loser_id,
            winner_before,
            loser_before,
            result,
            winner_rank,
            loser_rank,
            trusted,
            recorded_at: now,
        })
    }

    /// Drop history of jokes the storage evicted to stay within capacity.
    ///
    /// `expected_count` is the joke count had nothing been evicted. Returns the
    /// actual count. Must be called with the write lock held.
    fn prune_evicted_history(&self, expected_count: usize) -> crate::error::Result<usize> {
        let stored = self.storage.get_joke_count()?;
        if stored >= expected_count {
            return Ok(stored);
        }

        let remaining = self.storage.get_all_ratings()?;
        let mut history = lock(&self.history, "history")?;
        let tracked_before = history.joke_count();
        history.retain_jokes(|joke_id| remaining.contains_key(joke_id));
        debug!(
            evicted = expected_count - stored,
            pruned = tracked_before - history.joke_count(),
            "Pruned history of evicted jokes"
        );

        Ok(stored)
    }

    /// Pick two distinct stored jokes uniformly at random.
    ///
    /// Candidates are ordered by id before sampling, so a seeded `rng`
    /// reproduces the same pair over the same pool.
    pub fn next_pair<R: Rng>(&self, rng: &mut R) -> crate::error::Result<(JokeId, JokeId)> {
        let mut pool: Vec<JokeId> = self.storage.get_all_ratings()?.into_keys().collect();
        if pool.len() < 2 {
            return Err(RatingError::NotEnoughJokes {
                available: pool.len(),
            }
            .into());
        }
        pool.sort_unstable();

        let first = rng.random_range(0..pool.len());
        let mut second = rng.random_range(0..pool.len() - 1);
        if second >= first {
            second += 1;
        }

        Ok((pool[first], pool[second]))
    }

    /// Compress every rating idle for at least the grace period. Returns how many changed.
    pub fn compress_idle(&self, now: DateTime<Utc>) -> crate::error::Result<usize> {
        let _guard = lock(&self.write_lock, "ledger")?;

        let mut changed = Vec::new();
        for (_, mut entry) in self.storage.get_all_ratings()? {
            if entry.compress_idle(now, self.settings.mean_rating)? {
                changed.push(entry);
            }
        }

        let count = changed.len();
        if count > 0 {
            self.storage.store_ratings(changed)?;
            self.metrics.record_compressions(count);
            info!(count, "Compressed idle ratings toward the mean");
        }

        Ok(count)
    }

    /// Highest-rated jokes, best first
    pub fn leaderboard(&self, limit: Option<usize>) -> crate::error::Result<Vec<LeaderboardRow>> {
        let entries = self.storage.get_top_ratings(limit)?;

        let mut rows: Vec<LeaderboardRow> = Vec::with_capacity(entries.len());
        for (index, entry) in entries.into_iter().enumerate() {
            let rank = match rows.last() {
                Some(previous) if previous.rating == entry.rating => previous.rank,
                _ => index + 1,
            };
            rows.push(LeaderboardRow {
                rank,
                joke_id: entry.joke_id,
                rating: entry.rating,
                games: entry.stats.games,
                form: signals::form(&entry.stats.recent_form),
            });
        }

        Ok(rows)
    }

    /// Rating changes of one joke, oldest first
    pub fn history(&self, joke_id: &JokeId) -> crate::error::Result<Vec<EloHistoryEntry>> {
        Ok(lock(&self.history, "history")?.for_joke(joke_id))
    }

    /// Latest rating changes across all jokes, newest first.
    ///
    /// With `max_rank` set, only changes that left a joke within that many
    /// places of the top are returned. Each entry carries the joke's previous rank.
    pub fn recent_updates(
        &self,
        limit: usize,
        max_rank: Option<usize>,
    ) -> crate::error::Result<Vec<EloHistoryEntry>> {
        Ok(lock(&self.history, "history")?.recent(limit, max_rank))
    }

    /// Drop a joke and its history
    pub fn remove(&self, joke_id: &JokeId) -> crate::error::Result<bool> {
        let _guard = lock(&self.write_lock, "ledger")?;

        let removed = self.storage.remove_rating(joke_id)?;
        lock(&self.history, "history")?.forget(joke_id);
        self.metrics.set_tracked_jokes(self.storage.get_joke_count()?);

        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rating::classic::ClassicEloCalculator;
    use crate::rating::storage::MockRatingStorage;
    use crate::utils::{current_timestamp, generate_joke_id};
    use crate::rating::history::{DEFAULT_FEED_LIMIT, DEFAULT_FEED_MAX_RANK};
    use chrono::Duration;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use std::collections::{HashMap, HashSet};

    fn ledger() -> RatingLedger {
        RatingLedger::from_config(&AppConfig::default()).unwrap()
    }

    #[test]
    fn test_first_comparison_registers_both_jokes() {
        let ledger = ledger();
        let (a, b) = (generate_joke_id(), generate_joke_id());

        let record = ledger.record_comparison(a, b, current_timestamp()).unwrap();

        assert_eq!(record.winner_before, 1500.0);
        assert_eq!(record.loser_before, 1500.0);
        assert!(record.result.new_winner_rating > 1500.0);
        assert!(record.result.new_loser_rating < 1500.0);
        assert_eq!(record.winner_rank, 1);
        assert_eq!(record.loser_rank, 2);

        let winner = ledger.get(&a).unwrap();
        assert_eq!(winner.rating, record.result.new_winner_rating);
        assert_eq!(winner.stats.games, 1);
        assert_eq!(winner.stats.recent_form.back(), Some(&1));

        let loser = ledger.get(&b).unwrap();
        assert_eq!(loser.stats.recent_form.back(), Some(&0));
    }

    #[test]
    fn test_new_jokes_are_low_confidence() {
        let ledger = ledger();
        let record = ledger
            .record_comparison(generate_joke_id(), generate_joke_id(), current_timestamp())
            .unwrap();
        // Zero games and maximum volatility on both sides
        assert_eq!(record.result.confidence, 0.0);
        assert!(!record.trusted);
    }

    #[test]
    fn test_same_joke_rejected() {
        let ledger = ledger();
        let joke = generate_joke_id();
        let err = ledger
            .record_comparison(joke, joke, current_timestamp())
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<RatingError>(),
            Some(RatingError::SameJoke { .. })
        ));
    }

    #[test]
    fn test_get_unknown_joke() {
        let ledger = ledger();
        let err = ledger.get(&generate_joke_id()).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<RatingError>(),
            Some(RatingError::JokeNotFound { .. })
        ));
    }

    #[test]
    fn test_register_is_idempotent() {
        let ledger = ledger();
        let joke = generate_joke_id();
        let now = current_timestamp();

        let first = ledger.register(joke, now).unwrap();
        let second = ledger.register(joke, now + Duration::days(1)).unwrap();
        assert_eq!(first, second);
        assert_eq!(ledger.metrics().tracked_jokes.get(), 1);
    }

    #[test]
    fn test_history_recorded_for_both_sides() {
        let ledger = ledger();
        let (a, b) = (generate_joke_id(), generate_joke_id());
        let now = current_timestamp();

        ledger.record_comparison(a, b, now).unwrap();
        ledger
            .record_comparison(b, a, now + Duration::minutes(1))
            .unwrap();

        let history = ledger.history(&a).unwrap();
        assert_eq!(history.len(), 2);
        assert!(history[0].delta > 0.0);
        assert!(history[1].delta < 0.0);
        assert_eq!(history[1].elo_before, history[0].elo_after);
    }

    #[test]
    fn test_idle_joke_compressed_before_comparison() {
        let ledger = ledger();
        let (a, b) = (generate_joke_id(), generate_joke_id());
        let start = current_timestamp();

        // Push `a` well above the mean
        for _ in 0..5 {
            ledger.record_comparison(a, b, start).unwrap();
        }
        let before_idle = ledger.get(&a).unwrap().rating;
        assert!(before_idle > 1500.0);

        let later = start + Duration::days(30 + 365);
        let record = ledger.record_comparison(a, b, later).unwrap();
        let expected = before_idle + (1500.0 - before_idle) * 0.3;
        assert!((record.winner_before - expected).abs() < 1e-9);
        assert!(ledger.metrics().idle_compressions_total.get() >= 1);
    }

    #[test]
    fn test_compress_idle_sweep() {
        let ledger = ledger();
        let (a, b, c) = (generate_joke_id(), generate_joke_id(), generate_joke_id());
        let start = current_timestamp();

        ledger.record_comparison(a, b, start).unwrap();
        ledger.register(c, start + Duration::days(100)).unwrap();

        let changed = ledger.compress_idle(start + Duration::days(120)).unwrap();
        // `c` is still within its grace period
        assert_eq!(changed, 2);
        assert_eq!(ledger.get(&c).unwrap().rating, 1500.0);

        // Nothing new to do at the same instant
        assert_eq!(ledger.compress_idle(start + Duration::days(120)).unwrap(), 0);
    }

    #[test]
    fn test_leaderboard_ranks_ties_together() {
        let ledger = ledger();
        let now = current_timestamp();
        let jokes: Vec<JokeId> = (0..4).map(|_| generate_joke_id()).collect();
        for joke in &jokes {
            ledger.register(*joke, now).unwrap();
        }

        ledger.record_comparison(jokes[0], jokes[1], now).unwrap();

        let board = ledger.leaderboard(None).unwrap();
        assert_eq!(board.len(), 4);
        assert_eq!(board[0].joke_id, jokes[0]);
        assert_eq!(board[0].rank, 1);
        // The two untouched jokes share second place
        assert_eq!(board[1].rank, 2);
        assert_eq!(board[2].rank, 2);
        assert_eq!(board[3].joke_id, jokes[1]);
        assert_eq!(board[3].rank, 4);

        assert_eq!(ledger.leaderboard(Some(1)).unwrap().len(), 1);
    }

    #[test]
    fn test_remove_forgets_history() {
        let ledger = ledger();
        let (a, b) = (generate_joke_id(), generate_joke_id());
        ledger.record_comparison(a, b, current_timestamp()).unwrap();

        assert!(ledger.remove(&a).unwrap());
        assert!(ledger.history(&a).unwrap().is_empty());
        assert!(ledger.get(&a).is_err());
        assert!(!ledger.remove(&a).unwrap());
    }

    #[test]
    fn test_evicted_jokes_lose_their_history() {
        let ledger = RatingLedger::new(
            Arc::new(InMemoryRatingStorage::new(2)),
            Box::new(AdaptiveEloCalculator::default()),
            LedgerSettings::default(),
            RatingMetrics::new().unwrap(),
        );
        let jokes: Vec<JokeId> = (0..6).map(|_| generate_joke_id()).collect();
        let start = current_timestamp();

        for (round, pair) in jokes.chunks(2).enumerate() {
            let at = start + Duration::minutes(round as i64);
            ledger.record_comparison(pair[0], pair[1], at).unwrap();
        }

        // Only the most recent pair fits in storage
        for evicted in &jokes[..4] {
            assert!(ledger.get(evicted).is_err());
            assert!(ledger.history(evicted).unwrap().is_empty());
        }
        for kept in &jokes[4..] {
            assert!(ledger.get(kept).is_ok());
            assert_eq!(ledger.history(kept).unwrap().len(), 1);
        }

        let feed = ledger.recent_updates(DEFAULT_FEED_LIMIT, None).unwrap();
        assert_eq!(feed.len(), 2);
        assert!(feed.iter().all(|entry| jokes[4..].contains(&entry.joke_id)));
        assert_eq!(ledger.metrics().tracked_jokes.get(), 2);
    }

    #[test]
    fn test_registration_eviction_prunes_history() {
        let ledger = RatingLedger::new(
            Arc::new(InMemoryRatingStorage::new(2)),
            Box::new(AdaptiveEloCalculator::default()),
            LedgerSettings::default(),
            RatingMetrics::new().unwrap(),
        );
        let (a, b, c) = (generate_joke_id(), generate_joke_id(), generate_joke_id());
        let start = current_timestamp();

        ledger.record_comparison(a, b, start).unwrap();
        ledger.register(c, start + Duration::days(1)).unwrap();

        // One of the compared jokes made room for `c`
        let survivors = [a, b]
            .iter()
            .filter(|joke| !ledger.history(joke).unwrap().is_empty())
            .count();
        assert_eq!(survivors, 1);
        assert!(ledger.get(&c).is_ok());
    }

    #[test]
    fn test_next_pair_is_distinct_and_reproducible() {
        let ledger = ledger();
        let now = current_timestamp();
        let jokes: Vec<JokeId> = (0..5).map(|_| generate_joke_id()).collect();
        for joke in &jokes {
            ledger.register(*joke, now).unwrap();
        }

        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let mut replay = ChaCha8Rng::seed_from_u64(42);
        let mut seen = HashSet::new();
        for _ in 0..200 {
            let (first, second) = ledger.next_pair(&mut rng).unwrap();
            assert_ne!(first, second);
            assert!(jokes.contains(&first) && jokes.contains(&second));
            assert_eq!(ledger.next_pair(&mut replay).unwrap(), (first, second));
            seen.insert(first);
            seen.insert(second);
        }
        assert_eq!(seen.len(), jokes.len());
    }

    #[test]
    fn test_next_pair_needs_two_jokes() {
        let ledger = ledger();
        let mut rng = ChaCha8Rng::seed_from_u64(7);

        for expected in 0..2 {
            let err = ledger.next_pair(&mut rng).unwrap_err();
            assert!(matches!(
                err.downcast_ref::<RatingError>(),
                Some(RatingError::NotEnoughJokes { available }) if *available == expected
            ));
            ledger
                .register(generate_joke_id(), current_timestamp())
                .unwrap();
        }

        assert!(ledger.next_pair(&mut rng).is_ok());
    }

    #[test]
    fn test_recent_updates_feed() {
        let ledger = ledger();
        let jokes: Vec<JokeId> = (0..12).map(|_| generate_joke_id()).collect();
        let start = current_timestamp();
        for joke in &jokes {
            ledger.register(*joke, start).unwrap();
        }

        // jokes[0] beats everyone, then jokes[11] loses a second time
        for (i, loser) in jokes.iter().enumerate().skip(1) {
            let at = start + Duration::minutes(i as i64);
            ledger.record_comparison(jokes[0], *loser, at).unwrap();
        }
        let last = start + Duration::minutes(20);
        ledger.record_comparison(jokes[1], jokes[11], last).unwrap();

        let feed = ledger.recent_updates(DEFAULT_FEED_LIMIT, None).unwrap();
        assert_eq!(feed.len(), 24);
        assert_eq!(feed[0].created_at, last);
        assert!(feed.windows(2).all(|pair| pair[0].created_at >= pair[1].created_at));

        let twice_beaten: Vec<_> = feed
            .iter()
            .filter(|entry| entry.joke_id == jokes[11])
            .collect();
        assert_eq!(twice_beaten.len(), 2);
        assert_eq!(twice_beaten[0].prev_rank, Some(twice_beaten[1].rank));
        assert_eq!(twice_beaten[1].prev_rank, None);

        // The first loser dropped to 12th of 12
        let top = ledger
            .recent_updates(DEFAULT_FEED_LIMIT, Some(DEFAULT_FEED_MAX_RANK))
            .unwrap();
        assert!(!top.is_empty());
        assert!(top.len() < feed.len());
        assert!(top.iter().all(|entry| entry.rank <= DEFAULT_FEED_MAX_RANK));

        assert_eq!(ledger.recent_updates(3, None).unwrap().len(), 3);
    }

    #[test]
    fn test_classic_calculator_behind_ledger() {
        let ledger = RatingLedger::new(
            Arc::new(InMemoryRatingStorage::default()),
            Box::new(ClassicEloCalculator::default()),
            LedgerSettings::default(),
            RatingMetrics::new().unwrap(),
        );
        let (a, b) = (generate_joke_id(), generate_joke_id());

        let record = ledger.record_comparison(a, b, current_timestamp()).unwrap();
        assert_eq!(record.result.new_winner_rating, 1516.0);
        assert_eq!(record.result.new_loser_rating, 1484.0);
    }

    #[test]
    fn test_storage_failure_propagates() {
        let mut storage = MockRatingStorage::new();
        storage.expect_get_ratings().returning(|_| Ok(HashMap::new()));
        storage.expect_get_joke_count().returning(|| Ok(0));
        storage.expect_store_ratings().returning(|_| {
            Err(RatingError::InternalError {
                message: "disk full".to_string(),
            }
            .into())
        });

        let ledger = RatingLedger::new(
            Arc::new(storage),
            Box::new(AdaptiveEloCalculator::default()),
            LedgerSettings::default(),
            RatingMetrics::new().unwrap(),
        );

        let err = ledger
            .record_comparison(generate_joke_id(), generate_joke_id(), current_timestamp())
            .unwrap_err();
        assert!(err.to_string().contains("disk full"));
        assert_eq!(ledger.metrics().rating_delta.get_sample_count(), 0);
    }

    #[test]
    fn test_concurrent_comparisons_are_serialized() {
        let ledger = Arc::new(ledger());
        let jokes: Vec<JokeId> = (0..3).map(|_| generate_joke_id()).collect();
        let now = current_timestamp();

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let ledger = ledger.clone();
                let jokes = jokes.clone();
                std::thread::spawn(move || {
                    for j in 0..25 {
                        let winner = jokes[(i + j) % 3];
                        let loser = jokes[(i + j + 1) % 3];
                        ledger.record_comparison(winner, loser, now).unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        // Every comparison touched two jokes, and none of the game counts were lost
        let total_games: u32 = jokes
            .iter()
            .map(|joke| ledger.get(joke).unwrap().stats.games)
            .sum();
        assert_eq!(total_games, 8 * 25 * 2);
    }
}
