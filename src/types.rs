//! Common types used throughout the rating engine

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use uuid::Uuid;

/// Unique identifier for jokes
pub type JokeId = Uuid;

/// Games after which a participant counts as established for the neutral defaults
pub const NEUTRAL_GAMES: u32 = 30;

/// Number of recent outcomes kept per joke
pub const DEFAULT_FORM_WINDOW: usize = 10;

/// Per-joke auxiliary state read by the engine for one update
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParticipantStats {
    /// Number of prior comparisons
    pub games: u32,
    /// Recent outcomes, 1 = win and 0 = loss, most recent last
    #[serde(default)]
    pub recent_form: VecDeque<u8>,
    /// Precomputed uncertainty; derived from `games` and form when absent
    #[serde(default)]
    pub volatility: Option<f64>,
    /// Only consulted by inactivity compression
    #[serde(default)]
    pub last_activity: Option<DateTime<Utc>>,
}

impl ParticipantStats {
    pub fn new(games: u32) -> Self {
        Self {
            games,
            ..Self::default()
        }
    }

    /// Stats for callers that do not track anything per joke
    pub fn neutral() -> Self {
        Self::new(NEUTRAL_GAMES)
    }

    pub fn with_form<I: IntoIterator<Item = u8>>(mut self, form: I) -> Self {
        self.recent_form = form.into_iter().collect();
        self
    }

    pub fn with_volatility(mut self, volatility: f64) -> Self {
        self.volatility = Some(volatility);
        self
    }

    /// Push an outcome into the bounded form buffer and count the game
    pub fn record_outcome(&mut self, won: bool, window: usize) {
        self.recent_form.push_back(u8::from(won));
        while self.recent_form.len() > window {
            self.recent_form.pop_front();
        }
        self.games = self.games.saturating_add(1);
    }
}

/// A rating together with the stats that go with it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contender {
    pub rating: f64,
    pub stats: ParticipantStats,
}

impl Contender {
    pub fn new(rating: f64, stats: ParticipantStats) -> Self {
        Self { rating, stats }
    }
}

/// How the result of a comparison related to the pre-game ratings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OutcomeKind {
    /// The lower-rated joke won
    Upset,
    /// The higher-rated joke won
    Expected,
    /// Both jokes were rated the same
    Even,
}

impl OutcomeKind {
    pub fn from_gap(rating_gap: f64) -> Self {
        if rating_gap < 0.0 {
            OutcomeKind::Upset
        } else if rating_gap > 0.0 {
            OutcomeKind::Expected
        } else {
            OutcomeKind::Even
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OutcomeKind::Upset => "upset",
            OutcomeKind::Expected => "expected",
            OutcomeKind::Even => "even",
        }
    }
}

impl std::fmt::Display for OutcomeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Intermediate values of one update, kept for observability
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateDiagnostics {
    /// Winner rating minus loser rating, before form adjustment
    pub rating_gap: f64,
    pub winner_k: f64,
    pub loser_k: f64,
    pub expected_winner: f64,
    pub expected_loser: f64,
    pub surprise: f64,
    /// Final signed deltas after deflation and clamping
    pub winner_delta: f64,
    pub loser_delta: f64,
}

/// Output of one pairwise update. Recomputed per call, never persisted by the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateResult {
    pub new_winner_rating: f64,
    pub new_loser_rating: f64,
    /// How trustworthy the update is, in [0, 1]
    pub confidence: f64,
    pub winner_form: f64,
    pub loser_form: f64,
    pub diagnostics: UpdateDiagnostics,
}

impl UpdateResult {
    pub fn outcome_kind(&self) -> OutcomeKind {
        OutcomeKind::from_gap(self.diagnostics.rating_gap)
    }
}

/// Ratings-only result for callers without per-joke stats
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SimpleUpdate {
    pub new_winner_rating: f64,
    pub new_loser_rating: f64,
}

impl From<&UpdateResult> for SimpleUpdate {
    fn from(result: &UpdateResult) -> Self {
        Self {
            new_winner_rating: result.new_winner_rating,
            new_loser_rating: result.new_loser_rating,
        }
    }
}
