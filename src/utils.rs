//! Utility functions for the rating engine

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Generate a new unique joke ID
pub fn generate_joke_id() -> Uuid {
    Uuid::new_v4()
}

/// Get the current UTC timestamp
pub fn current_timestamp() -> DateTime<Utc> {
    Utc::now()
}

/// Fractional days elapsed between two instants, zero if `later` is earlier
pub fn days_between(earlier: DateTime<Utc>, later: DateTime<Utc>) -> f64 {
    let seconds = (later - earlier).num_seconds().max(0) as f64;
    seconds / 86_400.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_generate_unique_ids() {
        let id1 = generate_joke_id();
        let id2 = generate_joke_id();
        assert_ne!(id1, id2);
    }

    #[test]
    fn test_days_between() {
        let now = current_timestamp();
        assert_eq!(days_between(now - Duration::days(45), now), 45.0);
        assert_eq!(days_between(now - Duration::hours(12), now), 0.5);
        assert_eq!(days_between(now, now - Duration::days(3)), 0.0);
    }
}
