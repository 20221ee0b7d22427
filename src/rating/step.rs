//! Adaptive step computation
//!
//! Turns the extracted signals into per-participant K factors, raw deltas,
//! and finally the bounded deltas applied to ratings.

use serde::{Deserialize, Serialize};

pub const MIN_K: f64 = 8.0;
pub const MAX_K: f64 = 80.0;

/// Every comparison moves each rating by at least this much
pub const MIN_DELTA: f64 = 2.0;
/// and by at most this much
pub const MAX_DELTA: f64 = 100.0;

/// Anti-inflation factor applied to both deltas
pub const DEFLATION: f64 = 0.98;

const VOLATILITY_WEIGHT: f64 = 0.4;
const SURPRISE_WEIGHT: f64 = 0.3;
const UNDERDOG_BONUS: f64 = 1.1;

const UPSET_GAP_SCALE: f64 = 100.0;
const UPSET_WEIGHT: f64 = 0.4;

/// Gap above which expected wins are damped
const FAVORITE_GAP_THRESHOLD: f64 = 100.0;
const FAVORITE_GAP_SCALE: f64 = 150.0;
const FAVORITE_WEIGHT: f64 = 0.3;
const FAVORITE_FLOOR: f64 = 0.3;

/// Signed rating changes for one comparison
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Deltas {
    pub winner: f64,
    pub loser: f64,
}

impl Deltas {
    fn scaled(self, factor: f64) -> Self {
        Self {
            winner: self.winner * factor,
            loser: self.loser * factor,
        }
    }
}

/// Which side, if any, was the underdog going in: `(winner, loser)`.
///
/// Decided on unadjusted ratings. Equal ratings have no underdog.
pub fn underdog_roles(rating_gap: f64) -> (bool, bool) {
    (rating_gap < 0.0, rating_gap > 0.0)
}

/// Step size for one participant, clamped to [`MIN_K`, `MAX_K`]
pub fn k_factor(
    base_k: f64,
    experience: f64,
    volatility: f64,
    surprise: f64,
    is_underdog: bool,
) -> f64 {
    let mut k = base_k * experience;
    k *= 1.0 + volatility * VOLATILITY_WEIGHT;
    k *= 1.0 + surprise * SURPRISE_WEIGHT;
    if is_underdog {
        k *= UNDERDOG_BONUS;
    }
    k.clamp(MIN_K, MAX_K)
}

/// Plain Elo deltas before any non-linear shaping
pub fn raw_deltas(
    winner_k: f64,
    loser_k: f64,
    expected_winner: f64,
    expected_loser: f64,
) -> Deltas {
    Deltas {
        winner: winner_k * (1.0 - expected_winner),
        loser: loser_k * (0.0 - expected_loser),
    }
}

/// Multiplier for the rating gap: amplifies upsets, damps clear favourite wins
pub fn gap_multiplier(rating_gap: f64) -> f64 {
    if rating_gap < 0.0 {
        1.0 + (1.0 + rating_gap.abs() / UPSET_GAP_SCALE).log10() * UPSET_WEIGHT
    } else if rating_gap > FAVORITE_GAP_THRESHOLD {
        let damped = 1.0 - (1.0 + rating_gap / FAVORITE_GAP_SCALE).log10() * FAVORITE_WEIGHT;
        damped.max(FAVORITE_FLOOR)
    } else {
        1.0
    }
}

/// Shape, deflate, then clamp the raw deltas.
///
/// Deflation runs before clamping, so the floor of [`MIN_DELTA`] always holds.
pub fn finalize(raw: Deltas, rating_gap: f64) -> Deltas {
    let shaped = raw.scaled(gap_multiplier(rating_gap)).scaled(DEFLATION);

    Deltas {
        winner: shaped.winner.clamp(MIN_DELTA, MAX_DELTA),
        loser: -shaped.loser.abs().clamp(MIN_DELTA, MAX_DELTA),
    }
}
