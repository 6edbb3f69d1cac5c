//! Hot-score ranking function for trend signals.

/// Derived popularity ranking combining raw score and engagement count.
///
/// `0.6 * score + 0.4 * comment_count`. Deterministic and side-effect free;
/// callers sort descending on the result with a stable sort so fetch order
/// breaks ties.
#[must_use]
pub fn hot_score(score: i32, comment_count: i32) -> f64 {
    f64::from(score) * 0.6 + f64::from(comment_count) * 0.4
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_inputs_score_zero() {
        assert_eq!(hot_score(0, 0), 0.0);
    }

    #[test]
    fn score_weighs_more_than_comments() {
        assert!(hot_score(10, 0) > hot_score(0, 10));
    }

    #[test]
    fn monotonic_in_score() {
        let mut prev = hot_score(0, 5);
        for score in 1..50 {
            let current = hot_score(score, 5);
            assert!(current > prev, "hot_score not increasing at score={score}");
            prev = current;
        }
    }

    #[test]
    fn monotonic_in_comment_count() {
        let mut prev = hot_score(5, 0);
        for comments in 1..50 {
            let current = hot_score(5, comments);
            assert!(
                current > prev,
                "hot_score not increasing at comments={comments}"
            );
            prev = current;
        }
    }

    #[test]
    fn matches_weighted_sum() {
        let value = hot_score(100, 50);
        assert!((value - 80.0).abs() < f64::EPSILON);
    }
}
