//! Fixed-K Elo calculator
//!
//! Plain logistic Elo with one constant step size and no form or volatility.
//! Kept behind the same [`RatingCalculator`] seam so ledgers can be replayed
//! under either model.

use crate::config::rating::EloConfig;
use crate::error::RatingError;
use crate::rating::calculator::RatingCalculator;
use crate::rating::{engine, expectation, signals};
use crate::types::{Contender, UpdateDiagnostics, UpdateResult};
use skillratings::elo::{elo, EloConfig as SkillEloConfig, EloRating};
use skillratings::Outcomes;

/// Step size of the plain Elo ranking
pub const CLASSIC_K: f64 = 32.0;

/// Constant-K Elo calculator backed by `skillratings`
#[derive(Debug, Clone)]
pub struct ClassicEloCalculator {
    config: SkillEloConfig,
    min_games: u32,
    initial_rating: f64,
}

impl ClassicEloCalculator {
    pub fn new(k: f64) -> crate::error::Result<Self> {
        let check = EloConfig {
            base_k: k,
            ..EloConfig::default()
        };
        check.validate()?;

        Ok(Self {
            config: SkillEloConfig { k },
            min_games: check.min_games,
            initial_rating: 1500.0,
        })
    }

    pub fn k(&self) -> f64 {
        self.config.k
    }
}

fn config_error(message: String) -> anyhow::Error {
    RatingError::ConfigurationError { message }.into()
}

impl Default for ClassicEloCalculator {
    fn default() -> Self {
        Self {
            config: SkillEloConfig { k: CLASSIC_K },
            min_games: EloConfig::default().min_games,
            initial_rating: 1500.0,
        }
    }
}

impl RatingCalculator for ClassicEloCalculator {
    fn calculate(
        &self,
        winner: &Contender,
        loser: &Contender,
    ) -> crate::error::Result<UpdateResult> {
        let check = EloConfig {
            base_k: self.config.k,
            min_games: self.min_games,
            ..EloConfig::default()
        };
        engine::validate_inputs(winner.rating, loser.rating, &winner.stats, &loser.stats, &check)?;

        let (new_winner, new_loser) = elo(
            &EloRating {
                rating: winner.rating,
            },
            &EloRating {
                rating: loser.rating,
            },
            &Outcomes::WIN,
            &self.config,
        );

        let rating_gap = winner.rating - loser.rating;
        let (expected_winner, expected_loser) =
            expectation::expectations(winner.rating, loser.rating);
        let confidence = engine::confidence(
            winner.stats.games,
            loser.stats.games,
            signals::volatility(&winner.stats),
            signals::volatility(&loser.stats),
            self.min_games,
        );

        Ok(UpdateResult {
            new_winner_rating: new_winner.rating.round(),
            new_loser_rating: new_loser.rating.round(),
            confidence: confidence.clamp(0.0, 1.0),
            winner_form: 0.0,
            loser_form: 0.0,
            diagnostics: UpdateDiagnostics {
                rating_gap,
                winner_k: self.config.k,
                loser_k: self.config.k,
                expected_winner,
                expected_loser,
                surprise: 1.0 - expected_winner,
                winner_delta: new_winner.rating - winner.rating,
                loser_delta: new_loser.rating - loser.rating,
            },
        })
    }

    fn initial_rating(&self) -> f64 {
        self.initial_rating
    }

    fn config(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "classic_elo",
            "initial_rating": self.initial_rating,
            "k": self.config.k,
            "min_games": self.min_games
        })
    }

    fn update_config(&mut self, config: serde_json::Value) -> crate::error::Result<()> {
        // Everything is checked before anything is applied
        let skill_config = match config.get("k") {
            Some(value) => {
                let k = value
                    .as_f64()
                    .ok_or_else(|| config_error(format!("k must be a number, got {value}")))?;
                Some(Self::new(k)?.config)
            }
            None => None,
        };

        let min_games = match config.get("min_games") {
            Some(value) => value
                .as_u64()
                .and_then(|games| u32::try_from(games).ok())
                .ok_or_else(|| {
                    config_error(format!(
                        "min_games must be a whole number up to {}, got {value}",
                        u32::MAX
                    ))
                })?,
            None => self.min_games,
        };

        let initial_rating = match config.get("initial_rating") {
            Some(value) => engine::initial_rating_from_json(value)?,
            None => self.initial_rating,
        };

        if let Some(skill_config) = skill_config {
            self.config = skill_config;
        }
        self.min_games = min_games;
        self.initial_rating = initial_rating;
        Ok(())
    }
}
