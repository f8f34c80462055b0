use serde::{Deserialize, Serialize};

use crate::InvalidConfiguration;

use super::combo::{combo_segments, max_streak};

/// Tunables for the memorization window shown before play starts.
///
/// The raw duration is `base_secs + secs_per_pair * pairs`, clamped to
/// `[min_secs, max_secs]` and rounded to the nearest `step_secs`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreviewConfig {
    pub base_secs: f64,
    pub secs_per_pair: f64,
    pub min_secs: f64,
    pub max_secs: f64,
    pub step_secs: f64,
}

impl Default for PreviewConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl PreviewConfig {
    pub const DEFAULT: Self = Self {
        base_secs: 2.0,
        secs_per_pair: 0.35,
        min_secs: 3.0,
        max_secs: 12.0,
        step_secs: 0.5,
    };
}

/// Single configuration point for every scoring constant.
///
/// Each of the three score components (accuracy, combo, time) is worth at
/// most `CAP = total_pairs * points_per_pair` points.
///
/// Time is graded against two thresholds proportional to the number of pairs:
/// finishing within `gold_secs_per_pair * pairs` seconds earns the full
/// time score, finishing after `bronze_secs_per_pair * pairs` earns nothing,
/// and anything in between is interpolated linearly.
///
/// Omitted fields take their default when deserializing:
///
/// ```
/// use flipmatch_engine::ScoringConfig;
///
/// let config: ScoringConfig = serde_json::from_str(r#"{"gold_secs_per_pair": 2.5}"#).unwrap();
/// assert_eq!(config.gold_secs_per_pair, 2.5);
/// assert_eq!(config.bronze_secs_per_pair, 6.0);
/// config.validate().unwrap();
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    pub points_per_pair: u32,
    pub gold_secs_per_pair: f64,
    pub bronze_secs_per_pair: f64,
    /// Currency credited per score point when a level is completed.
    pub coins_per_point: u32,
    pub preview: PreviewConfig,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Telemetry of a finished session, as consumed by [`ScoringConfig::score`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreInput<'a> {
    pub total_pairs: usize,
    /// Pairs matched by the player, manually or with a Bomb.
    pub successful_pairs: usize,
    pub attempts: usize,
    pub match_history: &'a [bool],
    pub elapsed_secs: f64,
}

/// Point breakdown of a completed level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub accuracy: u32,
    pub combo: u32,
    pub time: u32,
    pub total: u32,
    pub total_percent: u32,
    pub max_accuracy: u32,
    pub max_combo: u32,
    pub max_time: u32,
    pub max_total: u32,
}

#[expect(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn round_to_u32(value: f64) -> u32 {
    // Half away from zero; for the non-negative values here that is half-up.
    value.round().clamp(0.0, f64::from(u32::MAX)) as u32
}

#[expect(clippy::cast_precision_loss)]
fn to_f64(value: usize) -> f64 {
    value as f64
}

impl ScoringConfig {
    /// Largest accepted `points_per_pair`. Three full components on the
    /// largest board [`EMOJI_POOL`](crate::EMOJI_POOL) can deal still fit in a `u32`.
    pub const MAX_POINTS_PER_PAIR: u32 = 1_000_000;

    /// Largest accepted preview bound or rounding step, in seconds.
    pub const MAX_PREVIEW_SECS: f64 = 3600.0;

    pub const DEFAULT: Self = Self {
        points_per_pair: 10,
        gold_secs_per_pair: 3.0,
        bronze_secs_per_pair: 6.0,
        coins_per_point: 1,
        preview: PreviewConfig::DEFAULT,
    };

    /// Checks that the thresholds are finite and ordered and that points and
    /// preview lengths stay within range.
    pub fn validate(&self) -> Result<(), InvalidConfiguration> {
        fn invalid(parameter: &'static str, reason: &'static str) -> InvalidConfiguration {
            InvalidConfiguration::InvalidScoring { parameter, reason }
        }

        if self.points_per_pair == 0 {
            return Err(invalid("points_per_pair", "must be positive"));
        }
        if self.points_per_pair > Self::MAX_POINTS_PER_PAIR {
            return Err(invalid("points_per_pair", "must not exceed 1000000"));
        }
        if !self.gold_secs_per_pair.is_finite() || self.gold_secs_per_pair < 0.0 {
            return Err(invalid("gold_secs_per_pair", "must be finite and non-negative"));
        }
        if !self.bronze_secs_per_pair.is_finite()
            || self.bronze_secs_per_pair <= self.gold_secs_per_pair
        {
            return Err(invalid(
                "bronze_secs_per_pair",
                "must be finite and greater than gold_secs_per_pair",
            ));
        }
        let preview = &self.preview;
        if ![
            preview.base_secs,
            preview.secs_per_pair,
            preview.min_secs,
            preview.max_secs,
        ]
        .iter()
        .all(|v| v.is_finite() && *v >= 0.0)
        {
            return Err(invalid("preview", "durations must be finite and non-negative"));
        }
        if preview.min_secs > preview.max_secs {
            return Err(invalid("preview.min_secs", "must not exceed preview.max_secs"));
        }
        if preview.max_secs > Self::MAX_PREVIEW_SECS {
            return Err(invalid("preview.max_secs", "must not exceed 3600 seconds"));
        }
        if !preview.step_secs.is_finite() || preview.step_secs <= 0.0 {
            return Err(invalid("preview.step_secs", "must be positive"));
        }
        if preview.step_secs > Self::MAX_PREVIEW_SECS {
            return Err(invalid("preview.step_secs", "must not exceed 3600 seconds"));
        }
        Ok(())
    }

    /// Per-component maximum score for a level with `total_pairs` pairs.
    #[must_use]
    pub fn cap(&self, total_pairs: usize) -> u32 {
        u32::try_from(total_pairs)
            .unwrap_or(u32::MAX)
            .saturating_mul(self.points_per_pair)
    }

    /// Length of the memorization window in seconds.
    #[must_use]
    pub fn preview_duration_secs(&self, card_count: usize) -> f64 {
        let p = &self.preview;
        let raw = p.base_secs + p.secs_per_pair * (to_f64(card_count) / 2.0);
        let clamped = raw.clamp(p.min_secs, p.max_secs);
        (clamped / p.step_secs).round() * p.step_secs
    }

    /// Accuracy component: the share of attempts that produced a match.
    ///
    /// Returns 0 when no attempt was made (e.g. the level was skipped before
    /// the first flip).
    #[must_use]
    pub fn accuracy_score(&self, total_pairs: usize, successful_pairs: usize, attempts: usize) -> u32 {
        if attempts == 0 {
            return 0;
        }
        let cap = self.cap(total_pairs);
        let ratio = to_f64(successful_pairs) / to_f64(attempts);
        round_to_u32(f64::from(cap) * ratio).min(cap)
    }

    /// Combo component: the longest streak relative to the number of pairs.
    #[must_use]
    pub fn combo_score(&self, total_pairs: usize, segments: &[u32]) -> u32 {
        if total_pairs == 0 {
            return 0;
        }
        let cap = self.cap(total_pairs);
        let streak = f64::from(max_streak(segments));
        round_to_u32(f64::from(cap) * streak / to_f64(total_pairs)).min(cap)
    }

    /// Time component, graded between the gold and bronze thresholds.
    #[must_use]
    pub fn time_score(&self, total_pairs: usize, elapsed_secs: f64) -> u32 {
        let cap = self.cap(total_pairs);
        let pairs = to_f64(total_pairs);
        let gold = self.gold_secs_per_pair * pairs;
        let bronze = self.bronze_secs_per_pair * pairs;
        if elapsed_secs <= gold {
            cap
        } else if elapsed_secs >= bronze {
            0
        } else {
            round_to_u32(f64::from(cap) * (bronze - elapsed_secs) / (bronze - gold)).min(cap)
        }
    }

    /// Computes the full breakdown for a finished session.
    ///
    /// # Example
    ///
    /// ```
    /// use flipmatch_engine::{ScoreInput, ScoringConfig};
    ///
    /// // 2 pairs, one miss between the matches.
    /// let score = ScoringConfig::default().score(&ScoreInput {
    ///     total_pairs: 2,
    ///     successful_pairs: 2,
    ///     attempts: 4,
    ///     match_history: &[true, false, true, true],
    ///     elapsed_secs: 5.0,
    /// });
    /// assert_eq!(score.accuracy, 10);
    /// assert_eq!(score.combo, 20);
    /// assert_eq!(score.time, 20);
    /// assert_eq!(score.total, 50);
    /// assert_eq!(score.max_total, 60);
    /// ```
    #[must_use]
    pub fn score(&self, input: &ScoreInput<'_>) -> ScoreBreakdown {
        let cap = self.cap(input.total_pairs);
        let segments = combo_segments(input.match_history);

        let accuracy = self.accuracy_score(input.total_pairs, input.successful_pairs, input.attempts);
        let combo = self.combo_score(input.total_pairs, &segments);
        let time = self.time_score(input.total_pairs, input.elapsed_secs);

        let total = accuracy.saturating_add(combo).saturating_add(time);
        let max_total = cap.saturating_mul(3);
        let total_percent = if max_total == 0 {
            0
        } else {
            round_to_u32(100.0 * f64::from(total) / f64::from(max_total))
        };

        ScoreBreakdown {
            accuracy,
            combo,
            time,
            total,
            total_percent,
            max_accuracy: cap,
            max_combo: cap,
            max_time: cap,
            max_total,
        }
    }
}

/// [`ScoringConfig::preview_duration_secs`] with the default configuration.
#[must_use]
pub fn preview_duration_secs(card_count: usize) -> f64 {
    ScoringConfig::DEFAULT.preview_duration_secs(card_count)
}

/// [`ScoringConfig::accuracy_score`] with the default configuration.
#[must_use]
pub fn accuracy_score(total_pairs: usize, successful_pairs: usize, attempts: usize) -> u32 {
    ScoringConfig::DEFAULT.accuracy_score(total_pairs, successful_pairs, attempts)
}

/// [`ScoringConfig::combo_score`] with the default configuration.
#[must_use]
pub fn combo_score(total_pairs: usize, segments: &[u32]) -> u32 {
    ScoringConfig::DEFAULT.combo_score(total_pairs, segments)
}

/// [`ScoringConfig::time_score`] with the default configuration.
#[must_use]
pub fn time_score(total_pairs: usize, elapsed_secs: f64) -> u32 {
    ScoringConfig::DEFAULT.time_score(total_pairs, elapsed_secs)
}

/// [`ScoringConfig::score`] with the default configuration.
#[must_use]
pub fn total_score(input: &ScoreInput<'_>) -> ScoreBreakdown {
    ScoringConfig::DEFAULT.score(input)
}
