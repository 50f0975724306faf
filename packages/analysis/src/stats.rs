//! Aggregate metrics and the time-window helpers shared with pattern
//! analysis.

use std::collections::BTreeMap;

use civic_watch_analysis_models::{PatternConfig, Stats, Trend, TypeCounts, WindowSplit};
use civic_watch_observation_models::Observation;

/// Computes totals, per-type and per-status breakdowns, average response
/// time, and review rate over `set`.
///
/// Degenerate inputs are guarded explicitly: an empty set has a review rate
/// of `0.0`, and a set with no positive response times averages to `0`.
#[must_use]
#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn aggregate<'a, I>(set: I) -> Stats
where
    I: IntoIterator<Item = &'a Observation>,
{
    let mut total = 0_u64;
    let mut by_type = TypeCounts::default();
    let mut by_status = BTreeMap::new();
    let mut reviewed = 0_u64;
    let mut response_sum = 0_u64;
    let mut response_count = 0_u64;

    for o in set {
        total += 1;
        by_type.increment(o.observation_type);
        *by_status.entry(o.status).or_insert(0) += 1;

        if o.status.is_reviewed() {
            reviewed += 1;
        }

        if let Some(days) = o.response_time
            && days > 0
        {
            response_sum += u64::from(days);
            response_count += 1;
        }
    }

    let avg_response_time = if response_count == 0 {
        0
    } else {
        (response_sum as f64 / response_count as f64).round() as u32
    };

    let review_rate = if total == 0 {
        0.0
    } else {
        (reviewed as f64 / total as f64 * 1000.0).round() / 10.0
    };

    Stats {
        total,
        by_type,
        by_status,
        avg_response_time,
        review_rate,
    }
}

/// Instant dividing a window of `window_ms` ending at `now` into an older
/// and a recent half.
#[must_use]
pub const fn window_midpoint(now: i64, window_ms: i64) -> i64 {
    now.saturating_sub(window_ms / 2)
}

/// Counts observations newer than the window midpoint (`recent`) and at or
/// before it (`older`).
#[must_use]
pub fn split_window<'a, I>(set: I, now: i64, window_ms: i64) -> WindowSplit
where
    I: IntoIterator<Item = &'a Observation>,
{
    let midpoint = window_midpoint(now, window_ms);

    set.into_iter()
        .fold(WindowSplit::default(), |mut split, o| {
            if o.timestamp > midpoint {
                split.recent += 1;
            } else {
                split.older += 1;
            }
            split
        })
}

/// Classifies a window split as increasing, declining, or stable using the
/// configured ratios.
///
/// With no older observations any recent activity counts as increasing;
/// with none at all the trend is stable.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn classify_trend(split: WindowSplit, config: &PatternConfig) -> Trend {
    let recent = split.recent as f64;
    let older = split.older as f64;

    if recent > older * config.increasing_ratio {
        Trend::Increasing
    } else if recent < older * config.declining_ratio {
        Trend::Declining
    } else {
        Trend::Stable
    }
}
