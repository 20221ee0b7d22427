//! Adaptive pairwise Elo engine
//!
//! The update is a fixed pipeline of pure stages: signal extraction, the
//! expectation model, adaptive step computation, then the rating update and
//! confidence score. Nothing here holds state between calls. Reading and
//! writing ratings atomically is left to the caller (see `rating::ledger`).

use crate::config::rating::EloConfig;
use crate::error::RatingError;
use crate::rating::calculator::RatingCalculator;
use crate::rating::{expectation, signals, step};
use crate::types::{Contender, ParticipantStats, SimpleUpdate, UpdateDiagnostics, UpdateResult};
use tracing::debug;

/// Ratings beyond this magnitude are rejected so gaps cannot overflow
pub const MAX_ABS_RATING: f64 = 1.0e9;

const GAME_CONFIDENCE_WEIGHT: f64 = 0.6;
const VOLATILITY_CONFIDENCE_WEIGHT: f64 = 0.4;

fn validate_rating(label: &str, rating: f64) -> crate::error::Result<()> {
    if !rating.is_finite() || rating.abs() > MAX_ABS_RATING {
        return Err(RatingError::invalid(format!(
            "{label} rating must be a finite number within ±{MAX_ABS_RATING}, got {rating}"
        ))
        .into());
    }
    Ok(())
}

fn validate_stats(label: &str, stats: &ParticipantStats) -> crate::error::Result<()> {
    if let Some(position) = stats.recent_form.iter().position(|&v| v > 1) {
        return Err(RatingError::invalid(format!(
            "{label} recent form entry {position} is {}, expected 0 or 1",
            stats.recent_form[position]
        ))
        .into());
    }

    if let Some(volatility) = stats.volatility {
        if !volatility.is_finite() || volatility < 0.0 {
            return Err(RatingError::invalid(format!(
                "{label} volatility must be a non-negative number, got {volatility}"
            ))
            .into());
        }
    }

    Ok(())
}

/// Reject anything outside the numeric domain the pipeline is defined on
pub fn validate_inputs(
    winner_rating: f64,
    loser_rating: f64,
    winner_stats: &ParticipantStats,
    loser_stats: &ParticipantStats,
    config: &EloConfig,
) -> crate::error::Result<()> {
    validate_rating("winner", winner_rating)?;
    validate_rating("loser", loser_rating)?;
    validate_stats("winner", winner_stats)?;
    validate_stats("loser", loser_stats)?;
    config.validate()
}

/// Blend of sample size and volatility describing how far an update can be trusted.
///
/// Not clamped: very large volatilities push it below zero.
pub fn confidence(
    winner_games: u32,
    loser_games: u32,
    winner_volatility: f64,
    loser_volatility: f64,
    min_games: u32,
) -> f64 {
    let game_confidence = if min_games == 0 {
        1.0
    } else {
        let min_games = f64::from(min_games);
        (f64::from(winner_games) / min_games)
            .min(f64::from(loser_games) / min_games)
            .min(1.0)
    };
    let volatility_confidence = 1.0 - (winner_volatility + loser_volatility) / 2.0;

    game_confidence * GAME_CONFIDENCE_WEIGHT + volatility_confidence * VOLATILITY_CONFIDENCE_WEIGHT
}

/// Compute new ratings after the joke rated `winner_rating` beat the one rated `loser_rating`
pub fn update(
    winner_rating: f64,
    loser_rating: f64,
    winner_stats: &ParticipantStats,
    loser_stats: &ParticipantStats,
    config: &EloConfig,
) -> crate::error::Result<UpdateResult> {
    validate_inputs(winner_rating, loser_rating, winner_stats, loser_stats, config)?;

    // Signals
    let winner_experience = signals::experience(winner_stats.games, config.min_games);
    let loser_experience = signals::experience(loser_stats.games, config.min_games);
    let winner_volatility = signals::volatility(winner_stats);
    let loser_volatility = signals::volatility(loser_stats);
    let winner_form = signals::form(&winner_stats.recent_form);
    let loser_form = signals::form(&loser_stats.recent_form);

    // Expectation
    let rating_gap = winner_rating - loser_rating;
    let (expected_winner, expected_loser) = expectation::expectations(
        expectation::adjusted_rating(winner_rating, winner_form),
        expectation::adjusted_rating(loser_rating, loser_form),
    );
    let surprise = expectation::surprise(rating_gap, expected_winner);

    // Step sizes
    let (winner_is_underdog, loser_is_underdog) = step::underdog_roles(rating_gap);
    let winner_k = step::k_factor(
        config.base_k,
        winner_experience,
        winner_volatility,
        surprise,
        winner_is_underdog,
    );
    let loser_k = step::k_factor(
        config.base_k,
        loser_experience,
        loser_volatility,
        surprise,
        loser_is_underdog,
    );
    let raw = step::raw_deltas(winner_k, loser_k, expected_winner, expected_loser);
    let deltas = step::finalize(raw, rating_gap);

    // Update
    let confidence = confidence(
        winner_stats.games,
        loser_stats.games,
        winner_volatility,
        loser_volatility,
        config.min_games,
    );

    debug!(
        rating_gap,
        winner_k,
        loser_k,
        expected_winner,
        surprise,
        winner_delta = deltas.winner,
        loser_delta = deltas.loser,
        confidence,
        "Computed adaptive Elo update"
    );

    Ok(UpdateResult {
        new_winner_rating: (winner_rating + deltas.winner).round(),
        new_loser_rating: (loser_rating + deltas.loser).round(),
        confidence: confidence.clamp(0.0, 1.0),
        winner_form,
        loser_form,
        diagnostics: UpdateDiagnostics {
            rating_gap,
            winner_k,
            loser_k,
            expected_winner,
            expected_loser,
            surprise,
            winner_delta: deltas.winner,
            loser_delta: deltas.loser,
        },
    })
}

/// Update for callers that keep no per-joke statistics
pub fn update_simple(winner_rating: f64, loser_rating: f64) -> crate::error::Result<SimpleUpdate> {
    let neutral = ParticipantStats::neutral();
    let result = update(
        winner_rating,
        loser_rating,
        &neutral,
        &neutral,
        &EloConfig::default(),
    )?;
    Ok(SimpleUpdate::from(&result))
}

/// Parse and check an `initial_rating` patch for a calculator config
pub(crate) fn initial_rating_from_json(value: &serde_json::Value) -> crate::error::Result<f64> {
    match value.as_f64() {
        Some(rating) if rating.is_finite() && rating.abs() <= MAX_ABS_RATING => Ok(rating),
        _ => Err(RatingError::ConfigurationError {
            message: format!("initial_rating must be a finite rating, got {value}"),
        }
        .into()),
    }
}

/// [`RatingCalculator`] backed by the adaptive pipeline
#[derive(Debug, Clone)]
pub struct AdaptiveEloCalculator {
    config: EloConfig,
    initial_rating: f64,
}

impl AdaptiveEloCalculator {
    /// Create a new adaptive calculator
    pub fn new(config: EloConfig) -> crate::error::Result<Self> {
        config.validate()?;

        Ok(Self {
            config,
            initial_rating: 1500.0,
        })
    }

    pub fn with_initial_rating(mut self, initial_rating: f64) -> Self {
        self.initial_rating = initial_rating;
        self
    }

    pub fn elo_config(&self) -> &EloConfig {
        &self.config
    }
}

impl Default for AdaptiveEloCalculator {
    fn default() -> Self {
        Self {
            config: EloConfig::default(),
            initial_rating: 1500.0,
        }
    }
}

impl RatingCalculator for AdaptiveEloCalculator {
    fn calculate(
        &self,
        winner: &Contender,
        loser: &Contender,
    ) -> crate::error::Result<UpdateResult> {
        update(
            winner.rating,
            loser.rating,
            &winner.stats,
            &loser.stats,
            &self.config,
        )
    }

    fn initial_rating(&self) -> f64 {
        self.initial_rating
    }

    fn config(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "adaptive_elo",
            "initial_rating": self.initial_rating,
            "base_k": self.config.base_k,
            "volatility_decay": self.config.volatility_decay,
            "min_games": self.config.min_games,
            "confidence_threshold": self.config.confidence_threshold
        })
    }

    fn update_config(&mut self, config: serde_json::Value) -> crate::error::Result<()> {
        let mut merged = serde_json::to_value(&self.config)?;
        if let (Some(target), Some(patch)) = (merged.as_object_mut(), config.as_object()) {
            for (key, value) in patch {
                if target.contains_key(key) {
                    target.insert(key.clone(), value.clone());
                }
            }
        }

        let updated: EloConfig = serde_json::from_value(merged)?;
        updated.validate()?;

        let initial_rating = match config.get("initial_rating") {
            Some(value) => initial_rating_from_json(value)?,
            None => self.initial_rating,
        };

        self.config = updated;
        self.initial_rating = initial_rating;
        Ok(())
    }
}
