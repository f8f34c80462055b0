/// Splits a chronological match history into combo segments.
///
/// A combo segment is a maximal run of consecutive successful attempts. The
/// returned lengths are in chronological order and never contain zero.
///
/// # Example
///
/// ```
/// use flipmatch_engine::combo_segments;
///
/// assert_eq!(combo_segments(&[true, true, false, true]), vec![2, 1]);
/// assert!(combo_segments(&[false, false]).is_empty());
/// ```
#[must_use]
pub fn combo_segments(match_history: &[bool]) -> Vec<u32> {
    let mut segments = vec![];
    let mut current = 0;
    for &success in match_history {
        if success {
            current += 1;
        } else if current > 0 {
            segments.push(current);
            current = 0;
        }
    }
    if current > 0 {
        segments.push(current);
    }
    segments
}

/// Returns the longest combo segment, or 0 when there is none.
#[must_use]
pub fn max_streak(segments: &[u32]) -> u32 {
    segments.iter().copied().max().unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_segments() {
        assert_eq!(
            combo_segments(&[true, true, false, true, true, true]),
            vec![2, 3]
        );
        assert_eq!(combo_segments(&[true, true, false, true]), vec![2, 1]);
        assert_eq!(combo_segments(&[true, false, true, true]), vec![1, 2]);
    }

    #[test]
    fn test_no_successes() {
        assert!(combo_segments(&[false, false]).is_empty());
        assert!(combo_segments(&[]).is_empty());
    }

    #[test]
    fn test_leading_and_repeated_failures_do_not_emit_zero() {
        assert_eq!(
            combo_segments(&[false, true, false, false, true, true]),
            vec![1, 2]
        );
    }

    #[test]
    fn test_max_streak() {
        assert_eq!(max_streak(&[]), 0);
        assert_eq!(max_streak(&[1, 4, 2]), 4);
    }
}
