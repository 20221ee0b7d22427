//! Rating engine configuration

use crate::error::RatingError;
use serde::{Deserialize, Serialize};

/// Tunables for the adaptive Elo pipeline.
///
/// Every field has a default, so a partial TOML table or JSON object
/// deserializes into a complete configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EloConfig {
    /// Base step size before any multipliers
    pub base_k: f64,
    /// Weight kept from the previous volatility when smoothing
    pub volatility_decay: f64,
    /// Games below which the experience multiplier kicks in
    pub min_games: u32,
    /// Not read by the pipeline; callers compare `UpdateResult::confidence` against it
    pub confidence_threshold: f64,
}

impl Default for EloConfig {
    fn default() -> Self {
        Self {
            base_k: 32.0,
            volatility_decay: 0.95,
            min_games: 20,
            confidence_threshold: 0.7,
        }
    }
}

impl EloConfig {
    /// Same step size as the fixed-K Elo the ranking page started with
    pub fn classic() -> Self {
        Self::default()
    }

    /// Larger steps and a longer provisional period
    pub fn volatile() -> Self {
        Self {
            base_k: 48.0,
            min_games: 30,
            ..Self::default()
        }
    }

    /// Validate configuration parameters
    pub fn validate(&self) -> crate::error::Result<()> {
        if !self.base_k.is_finite() || self.base_k <= 0.0 {
            return Err(RatingError::ConfigurationError {
                message: format!("base_k must be a positive number, got {}", self.base_k),
            }
            .into());
        }

        if !(0.0..=1.0).contains(&self.volatility_decay) {
            return Err(RatingError::ConfigurationError {
                message: format!(
                    "volatility_decay must be within [0, 1], got {}",
                    self.volatility_decay
                ),
            }
            .into());
        }

        if !(0.0..=1.0).contains(&self.confidence_threshold) {
            return Err(RatingError::ConfigurationError {
                message: format!(
                    "confidence_threshold must be within [0, 1], got {}",
                    self.confidence_threshold
                ),
            }
            .into());
        }

        Ok(())
    }
}
