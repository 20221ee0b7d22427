//! Inactivity compression
//!
//! Pulls the rating of a joke nobody has compared in a while back toward the
//! population mean. Callers run this on their own schedule. The update
//! pipeline never calls it.

use crate::error::RatingError;

/// Population mean used when the caller has none of its own
pub const DEFAULT_MEAN_RATING: f64 = 1500.0;

/// Idle days tolerated before any compression applies
pub const IDLE_GRACE_DAYS: f64 = 30.0;

const DAYS_PER_YEAR: f64 = 365.0;

/// Largest fraction of the distance to the mean removed, however long the idle spell
pub const MAX_COMPRESSION: f64 = 0.3;

/// Fraction of the gap to the mean removed after `days_idle` days
pub fn compression_rate(days_idle: f64) -> f64 {
    if days_idle < IDLE_GRACE_DAYS {
        return 0.0;
    }
    ((days_idle - IDLE_GRACE_DAYS) / DAYS_PER_YEAR).min(MAX_COMPRESSION)
}

/// Regress `rating` toward `mean_rating` according to how long it has sat idle
pub fn compress(rating: f64, days_idle: f64, mean_rating: f64) -> crate::error::Result<f64> {
    if !rating.is_finite() {
        return Err(RatingError::invalid(format!("rating must be finite, got {rating}")).into());
    }
    if !days_idle.is_finite() || days_idle < 0.0 {
        return Err(RatingError::invalid(format!(
            "days since last activity must be a non-negative number, got {days_idle}"
        ))
        .into());
    }
    if !mean_rating.is_finite() {
        return Err(
            RatingError::invalid(format!("mean rating must be finite, got {mean_rating}")).into(),
        );
    }

    if days_idle < IDLE_GRACE_DAYS {
        return Ok(rating);
    }

    Ok(rating + (mean_rating - rating) * compression_rate(days_idle))
}
