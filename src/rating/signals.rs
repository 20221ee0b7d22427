//! Signal extraction: experience, volatility and recent form
//!
//! These read a participant's history and turn it into the multipliers the
//! step computation consumes. Inputs are assumed validated by the engine.

use crate::types::ParticipantStats;

/// Extra step size granted to a joke with no games at all
const MAX_EXPERIENCE_BONUS: f64 = 0.5;

/// Games that add one to the volatility denominator
const VOLATILITY_GAMES_SCALE: f64 = 10.0;

/// Form entries needed before variance inflates volatility
const MIN_FORM_FOR_VARIANCE: usize = 3;

const FORM_VARIANCE_WEIGHT: f64 = 0.3;

/// Per-step decay applied going back from the most recent outcome
pub const FORM_DECAY: f64 = 0.85;

/// Multiplier that lets provisional jokes move faster.
///
/// Returns 1.0 once `games >= min_games`, rising linearly to 1.5 at zero games.
pub fn experience(games: u32, min_games: u32) -> f64 {
    if games >= min_games {
        return 1.0;
    }

    let min_games = f64::from(min_games);
    1.0 + (min_games - f64::from(games)) / min_games * MAX_EXPERIENCE_BONUS
}

/// Population variance of a 0/1 sequence. Zero for an empty slice.
pub fn variance<'a, I>(values: I) -> f64
where
    I: IntoIterator<Item = &'a u8>,
    I::IntoIter: Clone,
{
    let iter = values.into_iter();
    let n = iter.clone().count();
    if n == 0 {
        return 0.0;
    }

    let n = n as f64;
    let mean = iter.clone().map(|&v| f64::from(v)).sum::<f64>() / n;
    iter.map(|&v| (f64::from(v) - mean).powi(2)).sum::<f64>() / n
}

/// Uncertainty about a joke's true rating.
///
/// A caller-supplied value wins. Otherwise it shrinks with games played and
/// grows when recent results flip back and forth.
pub fn volatility(stats: &ParticipantStats) -> f64 {
    if let Some(volatility) = stats.volatility {
        return volatility;
    }

    let base = 1.0 / (1.0 + f64::from(stats.games) / VOLATILITY_GAMES_SCALE).sqrt();

    if stats.recent_form.len() > MIN_FORM_FOR_VARIANCE {
        base * (1.0 + variance(&stats.recent_form) * FORM_VARIANCE_WEIGHT)
    } else {
        base
    }
}

/// Recency-weighted momentum in [-1, 1]; positive means a hot streak
pub fn form<'a, I>(recent_form: I) -> f64
where
    I: IntoIterator<Item = &'a u8>,
    I::IntoIter: DoubleEndedIterator,
{
    let mut weighted_sum = 0.0;
    let mut total_weight = 0.0;
    let mut weight = 1.0;

    for &outcome in recent_form.into_iter().rev() {
        weighted_sum += f64::from(outcome) * weight;
        total_weight += weight;
        weight *= FORM_DECAY;
    }

    if total_weight == 0.0 {
        return 0.0;
    }

    (weighted_sum / total_weight - 0.5) * 2.0
}

/// Exponential smoothing of volatility across comparisons
pub fn smooth_volatility(previous: f64, observed: f64, decay: f64) -> f64 {
    previous * decay + observed * (1.0 - decay)
}
