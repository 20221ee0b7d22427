//! Logistic expectation model and surprise factor

/// Rating points one unit of form is worth
pub const FORM_RATING_WEIGHT: f64 = 15.0;

/// Scale of the logistic curve, in rating points per factor of ten in odds
pub const LOGISTIC_SCALE: f64 = 400.0;

/// Gap below which a win counts as a large upset
const LARGE_UPSET_GAP: f64 = -200.0;

const LARGE_UPSET_SCALE: f64 = 500.0;

/// Rating shifted by momentum
pub fn adjusted_rating(rating: f64, form: f64) -> f64 {
    rating + form * FORM_RATING_WEIGHT
}

/// Probability that `rating` beats `opponent` under the logistic Elo curve
pub fn expected_score(rating: f64, opponent: f64) -> f64 {
    1.0 / (1.0 + 10f64.powf((opponent - rating) / LOGISTIC_SCALE))
}

/// Win probabilities `(winner, loser)` from form-adjusted ratings
pub fn expectations(winner_adjusted: f64, loser_adjusted: f64) -> (f64, f64) {
    let expected_winner = expected_score(winner_adjusted, loser_adjusted);
    (expected_winner, 1.0 - expected_winner)
}

/// How unexpected the win was.
///
/// `rating_gap` is the unadjusted winner-minus-loser gap. Wins by a joke rated
/// more than 200 points lower get scaled up further.
pub fn surprise(rating_gap: f64, expected_winner: f64) -> f64 {
    let base = 1.0 - expected_winner;

    if rating_gap < LARGE_UPSET_GAP {
        base * (1.0 + rating_gap.abs() / LARGE_UPSET_SCALE)
    } else {
        base
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_adjusted_rating() {
        assert_eq!(adjusted_rating(1500.0, 0.0), 1500.0);
        assert_eq!(adjusted_rating(1500.0, 1.0), 1515.0);
        assert_eq!(adjusted_rating(1500.0, -1.0), 1485.0);
    }

    #[test]
    fn test_expected_score() {
        assert_abs_diff_eq!(expected_score(1500.0, 1500.0), 0.5, epsilon = 1e-12);
        assert_abs_diff_eq!(expected_score(1900.0, 1500.0), 10.0 / 11.0, epsilon = 1e-12);
        assert_abs_diff_eq!(expected_score(1500.0, 1900.0), 1.0 / 11.0, epsilon = 1e-12);
    }

    #[test]
    fn test_expectations_sum_to_one() {
        let (winner, loser) = expectations(1620.0, 1480.0);
        assert_abs_diff_eq!(winner + loser, 1.0, epsilon = 1e-12);
        assert!(winner > loser);
    }

    #[test]
    fn test_surprise_plain() {
        assert_abs_diff_eq!(surprise(0.0, 0.5), 0.5, epsilon = 1e-12);
        assert_abs_diff_eq!(surprise(300.0, 0.85), 0.15, epsilon = 1e-12);
        // Exactly -200 is not a large upset yet
        assert_abs_diff_eq!(surprise(-200.0, 0.24), 0.76, epsilon = 1e-12);
    }

    #[test]
    fn test_surprise_large_upset() {
        let expected = expected_score(1200.0, 1500.0);
        let value = surprise(-300.0, expected);
        assert_abs_diff_eq!(value, (1.0 - expected) * 1.6, epsilon = 1e-12);
        assert!(value > 1.0 - expected);
    }
}
