//! City-wide and local pattern analysis relative to a reference observation.
//!
//! Both analyses only ever look at observations of the reference's type,
//! drawn from the currently filtered set, and classify their trend across
//! the two halves of the active time window.

use std::collections::BTreeSet;

use civic_watch_analysis_models::{CityWideStats, LocalStats, PatternConfig, PatternMatch};
use civic_watch_observation_models::{MILLIS_PER_DAY, Observation};
use civic_watch_spatial::{LatLng, distance_meters};

use crate::stats::{classify_trend, split_window};

/// Location of an observation as a [`LatLng`].
#[must_use]
pub const fn location(observation: &Observation) -> LatLng {
    LatLng::new(observation.lat, observation.lng)
}

/// Grid cell key for affected-zone counting: `floor(coord × cells)` on each
/// axis. An equirectangular binning, not a geodesic partition.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn zone_key(observation: &Observation, cells_per_degree: f64) -> (i64, i64) {
    (
        (observation.lat * cells_per_degree).floor() as i64,
        (observation.lng * cells_per_degree).floor() as i64,
    )
}

/// Every observation in `filtered` sharing the reference's type, with the
/// number of grid zones they touch and their trend over `window_ms`.
#[must_use]
pub fn city_wide(
    reference: &Observation,
    filtered: &[&Observation],
    window_ms: i64,
    now: i64,
    config: &PatternConfig,
) -> PatternMatch<CityWideStats> {
    let matched: Vec<Observation> = filtered
        .iter()
        .copied()
        .filter(|o| o.observation_type == reference.observation_type)
        .cloned()
        .collect();

    let affected_zones = matched
        .iter()
        .map(|o| zone_key(o, config.zone_cells_per_degree))
        .collect::<BTreeSet<_>>()
        .len() as u64;

    let split = split_window(&matched, now, window_ms);
    let trend = classify_trend(split, config);

    log::debug!(
        "city-wide {} pattern from {}: {} matches across {affected_zones} zones, {trend}",
        reference.observation_type,
        reference.id,
        matched.len()
    );

    PatternMatch {
        stats: CityWideStats {
            total: matched.len() as u64,
            affected_zones,
            trend,
            split,
        },
        matched,
    }
}

/// Observations in `filtered` sharing the reference's type within
/// `radius_meters` of it (inclusive), with their time span and trend.
///
/// Returns `None` when nothing matches, so no duration is ever computed over
/// an empty set.
#[must_use]
pub fn local(
    reference: &Observation,
    filtered: &[&Observation],
    radius_meters: f64,
    window_ms: i64,
    now: i64,
    config: &PatternConfig,
) -> Option<PatternMatch<LocalStats>> {
    let center = location(reference);

    let matched: Vec<Observation> = filtered
        .iter()
        .copied()
        .filter(|o| o.observation_type == reference.observation_type)
        .filter(|o| distance_meters(center, location(o)) <= radius_meters)
        .cloned()
        .collect();

    let oldest = matched.iter().map(|o| o.timestamp).min()?;
    let newest = matched.iter().map(|o| o.timestamp).max()?;

    let time_span_days = newest
        .abs_diff(oldest)
        .div_ceil(MILLIS_PER_DAY.unsigned_abs());

    let split = split_window(&matched, now, window_ms);
    let trend = classify_trend(split, config);

    log::debug!(
        "local {} pattern within {radius_meters}m of {}: {} matches over {time_span_days} days, {trend}",
        reference.observation_type,
        reference.id,
        matched.len()
    );

    Some(PatternMatch {
        stats: LocalStats {
            count: matched.len() as u64,
            time_span_days,
            trend,
            split,
            center,
        },
        matched,
    })
}
