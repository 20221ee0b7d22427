//! Criteria-based scoring of a single joke
//!
//! Independent of the pairwise engine: a reviewer scores one joke on several
//! criteria and gets a weighted overall score back.

use crate::error::RatingError;
use serde::{Deserialize, Serialize};

pub const MIN_SCORE: f64 = 1.0;
pub const MAX_SCORE: f64 = 10.0;

/// Floor applied to the criteria that only count in the joke's favour
const SOFT_CRITERION_FLOOR: f64 = 5.0;

/// Scores in [1, 10] for each criterion
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DetailedRating {
    pub funniness: f64,
    pub relevance: f64,
    pub iconicness: f64,
    pub how_lost: f64,
    pub quality: f64,
    pub oldness: f64,
    /// Recorded but not weighted
    pub decipherability: f64,
    /// Recorded but not weighted
    pub overall_quality: f64,
}

impl Default for DetailedRating {
    fn default() -> Self {
        Self {
            funniness: 5.0,
            relevance: 5.0,
            iconicness: 5.0,
            how_lost: 5.0,
            quality: 5.0,
            oldness: 5.0,
            decipherability: 5.0,
            overall_quality: 5.0,
        }
    }
}

impl DetailedRating {
    fn criteria(&self) -> [(&'static str, f64); 8] {
        [
            ("funniness", self.funniness),
            ("relevance", self.relevance),
            ("iconicness", self.iconicness),
            ("how_lost", self.how_lost),
            ("quality", self.quality),
            ("oldness", self.oldness),
            ("decipherability", self.decipherability),
            ("overall_quality", self.overall_quality),
        ]
    }

    pub fn validate(&self) -> crate::error::Result<()> {
        for (name, value) in self.criteria() {
            if !value.is_finite() || !(MIN_SCORE..=MAX_SCORE).contains(&value) {
                return Err(RatingError::invalid(format!(
                    "{name} must be between {MIN_SCORE} and {MAX_SCORE}, got {value}"
                ))
                .into());
            }
        }
        Ok(())
    }

    /// Weighted score rounded to two decimals.
    ///
    /// Oldness and how lost the joke gets can lift the score but never drag
    /// it below what a middling value would give.
    pub fn overall_score(&self) -> crate::error::Result<f64> {
        self.validate()?;

        let score = self.funniness * 0.35
            + self.relevance * 0.20
            + self.iconicness * 0.15
            + self.quality * 0.15
            + self.oldness.clamp(SOFT_CRITERION_FLOOR, MAX_SCORE) * 0.05
            + self.how_lost.clamp(SOFT_CRITERION_FLOOR, MAX_SCORE) * 0.10;

        Ok((score * 100.0).round() / 100.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_middling_scores() {
        assert_eq!(DetailedRating::default().overall_score().unwrap(), 5.0);
    }

    #[test]
    fn test_perfect_scores() {
        let rating = DetailedRating {
            funniness: 10.0,
            relevance: 10.0,
            iconicness: 10.0,
            how_lost: 10.0,
            quality: 10.0,
            oldness: 10.0,
            decipherability: 10.0,
            overall_quality: 10.0,
        };
        assert_eq!(rating.overall_score().unwrap(), 10.0);
    }

    #[test]
    fn test_soft_criteria_floor() {
        let low = DetailedRating {
            oldness: 1.0,
            how_lost: 1.0,
            ..DetailedRating::default()
        };
        assert_eq!(low.overall_score().unwrap(), 5.0);
    }

    #[test]
    fn test_unweighted_criteria_ignored() {
        let rating = DetailedRating {
            decipherability: 1.0,
            overall_quality: 10.0,
            ..DetailedRating::default()
        };
        assert_eq!(rating.overall_score().unwrap(), 5.0);
    }

    #[test]
    fn test_weighted_mix() {
        let rating = DetailedRating {
            funniness: 9.0,
            relevance: 7.0,
            iconicness: 6.0,
            how_lost: 8.0,
            quality: 4.0,
            oldness: 3.0,
            decipherability: 2.0,
            overall_quality: 2.0,
        };
        // 3.15 + 1.4 + 0.9 + 0.6 + 0.25 + 0.8
        assert_eq!(rating.overall_score().unwrap(), 7.1);
    }

    #[test]
    fn test_out_of_range_rejected() {
        let too_high = DetailedRating {
            funniness: 11.0,
            ..DetailedRating::default()
        };
        assert!(too_high.validate().is_err());

        let nan = DetailedRating {
            quality: f64::NAN,
            ..DetailedRating::default()
        };
        let err = nan.overall_score().unwrap_err();
        assert!(err.to_string().contains("quality"));
    }
}
