//! Elo-style contributor rating engine
//!
//! Pure and deterministic: the same inputs always produce the same
//! output. Applied once per contributor when a project is closed.
//!
//! The constants below are calibrated game-design values carried over
//! from the platform's original rating system; do not simplify them.

use crate::domain::Difficulty;

/// Scores are given out of this maximum and clamped to it before use
pub const MAX_SCORE: f64 = 10.0;

/// Compute a contributor's new rating after a project concludes.
///
/// * `old_rating` - the contributor's current rating
/// * `score` - the contributor's score in the project, out of 10; values
///   outside `[0, 10]` are clamped before use
/// * `difficulty` - the project's difficulty tier, mapped to a reference
///   rating of 800/1400/2000
///
/// The update is `old + (a - b) * 3 * k * r` where `a` is the score
/// normalized to `[-1, 1]`, `b` is the expected performance against the
/// reference rating, `k` is the usual Elo volatility factor (higher for
/// low-rated players on a good result), and `r` halves the gain when a
/// strong player beats a weak-tier project.
pub fn new_rating(old_rating: f64, score: f64, difficulty: Difficulty) -> f64 {
    let p = difficulty.reference_rating();
    let score = score.clamp(0.0, MAX_SCORE);

    let a = 2.0 * (score / MAX_SCORE) - 1.0;
    let b = 1.0 / (1.0 + 10f64.powf((p - old_rating) / 400.0));

    let k = if old_rating < 1200.0 {
        if a - b >= 0.0 {
            40.0
        } else {
            20.0
        }
    } else if old_rating < 1800.0 {
        20.0
    } else {
        10.0
    };

    let r = if a - b > 0.0 && old_rating - p > 200.0 {
        0.5
    } else {
        1.0
    };

    old_rating + (a - b) * 3.0 * k * r
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    #[test]
    fn test_determinism() {
        let first = new_rating(1000.0, 7.0, Difficulty::Intermediate);
        let second = new_rating(1000.0, 7.0, Difficulty::Intermediate);
        assert_eq!(first, second);
    }

    #[test]
    fn test_mid_rating_intermediate_project() {
        // old=1000, score=7 -> a=0.4, b=1/11, k=40 (old<1200, a-b>=0), r=1
        let b = 1.0 / 11.0;
        let expected = 1000.0 + (0.4 - b) * 3.0 * 40.0;
        let got = new_rating(1000.0, 7.0, Difficulty::Intermediate);
        assert!((got - expected).abs() < EPS, "got {got}, expected {expected}");
        assert!((got - 1037.090909090909).abs() < 1e-6);
    }

    #[test]
    fn test_score_clamped_above_max() {
        let at_max = new_rating(1000.0, 10.0, Difficulty::Advanced);
        let above = new_rating(1000.0, 25.0, Difficulty::Advanced);
        assert_eq!(at_max, above);
    }

    #[test]
    fn test_score_clamped_below_zero() {
        let at_zero = new_rating(1000.0, 0.0, Difficulty::Beginner);
        let below = new_rating(1000.0, -3.0, Difficulty::Beginner);
        assert_eq!(at_zero, below);
    }

    #[test]
    fn test_low_rating_gains_faster_than_it_loses() {
        // k=40 on a good result, k=20 on a bad one, for ratings below 1200
        let gain = new_rating(1000.0, 10.0, Difficulty::Intermediate) - 1000.0;
        let loss = 1000.0 - new_rating(1000.0, 0.0, Difficulty::Beginner);
        assert!(gain > 0.0);
        assert!(loss > 0.0);
    }

    #[test]
    fn test_k_factor_tiers() {
        // 1200 <= old < 1800 uses k=20 regardless of sign
        let mid_up = new_rating(1500.0, 10.0, Difficulty::Advanced);
        let b = 1.0 / (1.0 + 10f64.powf((2000.0 - 1500.0) / 400.0));
        assert!((mid_up - (1500.0 + (1.0 - b) * 3.0 * 20.0)).abs() < EPS);

        // old >= 1800 uses k=10
        let high_up = new_rating(1850.0, 10.0, Difficulty::Advanced);
        let b = 1.0 / (1.0 + 10f64.powf((2000.0 - 1850.0) / 400.0));
        assert!((high_up - (1850.0 + (1.0 - b) * 3.0 * 10.0)).abs() < EPS);
    }

    #[test]
    fn test_damping_for_strong_player_on_weak_project() {
        // old=1900 on a beginner project (p=800): old - p > 200 and a - b > 0,
        // so the gain is halved
        let old = 1900.0;
        let b = 1.0 / (1.0 + 10f64.powf((800.0 - old) / 400.0));
        let a = 1.0;
        let expected = old + (a - b) * 3.0 * 10.0 * 0.5;
        let got = new_rating(old, 10.0, Difficulty::Beginner);
        assert!((got - expected).abs() < EPS);
    }

    #[test]
    fn test_no_damping_on_loss() {
        // a - b < 0 never triggers the damping factor
        let old = 1900.0;
        let b = 1.0 / (1.0 + 10f64.powf((800.0 - old) / 400.0));
        let a = -1.0;
        let expected = old + (a - b) * 3.0 * 10.0;
        let got = new_rating(old, 0.0, Difficulty::Beginner);
        assert!((got - expected).abs() < EPS);
    }

    #[test]
    fn test_bad_result_lowers_rating() {
        let got = new_rating(1400.0, 0.0, Difficulty::Intermediate);
        assert!(got < 1400.0);
    }
}
