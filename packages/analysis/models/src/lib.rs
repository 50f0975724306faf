#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Input and output types for the analysis engine.
//!
//! Defines what the engine is asked ([`FilterState`], [`Viewport`]), what it
//! answers ([`Stats`], [`CityWideStats`], [`LocalStats`], [`ClusterSize`]),
//! and the policy knobs it reads ([`EngineConfig`]).

use std::collections::BTreeMap;

use civic_watch_observation_models::{
    MILLIS_PER_DAY, Observation, ObservationStatus, ObservationType,
};
use civic_watch_spatial::{GeoBounds, LatLng};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

// ── Filtering ───────────────────────────────────────────────────────

/// The active type filter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Lens {
    /// Every observation type.
    #[default]
    All,
    /// A single observation type.
    Only(ObservationType),
}

impl Lens {
    /// Whether an observation of type `observation_type` passes this lens.
    #[must_use]
    pub fn admits(self, observation_type: ObservationType) -> bool {
        match self {
            Self::All => true,
            Self::Only(t) => t == observation_type,
        }
    }
}

impl std::fmt::Display for Lens {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::All => write!(f, "all"),
            Self::Only(t) => write!(f, "{t}"),
        }
    }
}

impl std::str::FromStr for Lens {
    type Err = strum::ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "all" {
            Ok(Self::All)
        } else {
            s.parse().map(Self::Only)
        }
    }
}

impl TryFrom<String> for Lens {
    type Error = strum::ParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Lens> for String {
    fn from(value: Lens) -> Self {
        value.to_string()
    }
}

/// Named time windows offered by the filter bar.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
pub enum TimeWindow {
    /// Last 24 hours.
    #[serde(rename = "24h")]
    #[strum(serialize = "24h")]
    Day,
    /// Last 7 days.
    #[serde(rename = "7d")]
    #[strum(serialize = "7d")]
    Week,
    /// Last 30 days.
    #[default]
    #[serde(rename = "30d")]
    #[strum(serialize = "30d")]
    Month,
    /// No time limit.
    #[serde(rename = "persistent")]
    #[strum(serialize = "persistent")]
    Persistent,
}

impl TimeWindow {
    /// Span of this window in milliseconds, or `None` when unbounded.
    #[must_use]
    pub const fn span_ms(self) -> Option<i64> {
        match self {
            Self::Day => Some(MILLIS_PER_DAY),
            Self::Week => Some(7 * MILLIS_PER_DAY),
            Self::Month => Some(30 * MILLIS_PER_DAY),
            Self::Persistent => None,
        }
    }

    /// Returns all variants, shortest first.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::Day, Self::Week, Self::Month, Self::Persistent]
    }
}

/// Lens plus time window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterState {
    /// Type filter.
    pub lens: Lens,
    /// Time filter.
    pub window: TimeWindow,
}

/// The rectangle and zoom level the map surface is currently showing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Viewport {
    /// Visible rectangle.
    pub bounds: GeoBounds,
    /// Map zoom level.
    pub zoom: u8,
}

// ── Statistics ──────────────────────────────────────────────────────

/// Per-type observation counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeCounts {
    /// Violations.
    pub violation: u64,
    /// Risks.
    pub risk: u64,
    /// Infrastructure issues.
    pub infrastructure: u64,
}

impl TypeCounts {
    /// Count for a single type.
    #[must_use]
    pub const fn get(&self, observation_type: ObservationType) -> u64 {
        match observation_type {
            ObservationType::Violation => self.violation,
            ObservationType::Risk => self.risk,
            ObservationType::Infrastructure => self.infrastructure,
        }
    }

    /// Adds one to the count for `observation_type`.
    pub const fn increment(&mut self, observation_type: ObservationType) {
        match observation_type {
            ObservationType::Violation => self.violation += 1,
            ObservationType::Risk => self.risk += 1,
            ObservationType::Infrastructure => self.infrastructure += 1,
        }
    }

    /// Sum across all types.
    #[must_use]
    pub const fn sum(&self) -> u64 {
        self.violation + self.risk + self.infrastructure
    }
}

/// Aggregate metrics over a set of observations.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stats {
    /// Number of observations.
    pub total: u64,
    /// Breakdown by type. Always sums to `total`.
    pub by_type: TypeCounts,
    /// Breakdown by review status. Statuses with no observations are absent.
    pub by_status: BTreeMap<ObservationStatus, u64>,
    /// Mean response time in whole days over observations with a positive
    /// response time. `0` when there are none.
    pub avg_response_time: u32,
    /// Percentage of observations that have left `pending`, rounded to one
    /// decimal place. `0.0` for an empty set.
    pub review_rate: f64,
}

impl Stats {
    /// [`Self::review_rate`] formatted with exactly one decimal place.
    #[must_use]
    pub fn review_rate_label(&self) -> String {
        format!("{:.1}", self.review_rate)
    }
}

/// Direction of report frequency across the two halves of a window.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Trend {
    /// Recent half clearly busier than the older half.
    Increasing,
    /// Recent half clearly quieter than the older half.
    Declining,
    /// Neither.
    Stable,
}

/// Observation counts in the recent and older halves of a window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WindowSplit {
    /// Strictly newer than the window midpoint.
    pub recent: u64,
    /// At or before the window midpoint.
    pub older: u64,
}

// ── Patterns ────────────────────────────────────────────────────────

/// City-wide pattern statistics for one observation type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CityWideStats {
    /// Matching observations.
    pub total: u64,
    /// Distinct grid cells containing at least one match.
    pub affected_zones: u64,
    /// Frequency trend.
    pub trend: Trend,
    /// Counts behind [`Self::trend`].
    pub split: WindowSplit,
}

/// Statistics for the observations clustered around a reference point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocalStats {
    /// Matching observations.
    pub count: u64,
    /// Whole days (rounded up) between the oldest and newest match.
    pub time_span_days: u64,
    /// Frequency trend.
    pub trend: Trend,
    /// Counts behind [`Self::trend`].
    pub split: WindowSplit,
    /// Reference location the radius was measured from.
    pub center: LatLng,
}

/// Result of a pattern analysis: the matched observations plus stats.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatternMatch<S> {
    /// Observations that belong to the pattern, in input order.
    pub matched: Vec<Observation>,
    /// Stats computed over `matched`.
    pub stats: S,
}

// ── Clusters ────────────────────────────────────────────────────────

/// Size tier for a marker cluster glyph.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ClusterTier {
    /// Few points.
    Small,
    /// Moderate number of points.
    Medium,
    /// Many points.
    Large,
}

/// Display dimensions for one cluster glyph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterSize {
    /// Tier the count fell into.
    pub tier: ClusterTier,
    /// Glyph width in pixels.
    pub width_px: u32,
    /// Glyph height in pixels.
    pub height_px: u32,
    /// Label font size in pixels.
    pub font_px: u32,
}

// ── Configuration ───────────────────────────────────────────────────

/// Radius around the reference observation for local patterns.
pub const DEFAULT_LOCAL_RADIUS_METERS: f64 = 200.0;
/// Grid cells per degree for affected-zone binning (0.01° cells).
pub const DEFAULT_ZONE_CELLS_PER_DEGREE: f64 = 100.0;
/// `recent > older × this` classifies as increasing.
pub const DEFAULT_INCREASING_RATIO: f64 = 1.2;
/// `recent < older × this` classifies as declining.
pub const DEFAULT_DECLINING_RATIO: f64 = 0.8;
/// Window used for trends when the filter has no time limit.
pub const DEFAULT_PERSISTENT_TREND_SPAN_MS: i64 = 30 * MILLIS_PER_DAY;
/// Zoom the map jumps to when entering a local pattern.
pub const DEFAULT_LOCAL_FOCUS_ZOOM: u8 = 16;

/// Pattern analysis policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct PatternConfig {
    /// See [`DEFAULT_LOCAL_RADIUS_METERS`].
    #[serde(default = "default_local_radius_meters")]
    pub local_radius_meters: f64,
    /// See [`DEFAULT_ZONE_CELLS_PER_DEGREE`].
    #[serde(default = "default_zone_cells_per_degree")]
    pub zone_cells_per_degree: f64,
    /// See [`DEFAULT_INCREASING_RATIO`].
    #[serde(default = "default_increasing_ratio")]
    pub increasing_ratio: f64,
    /// See [`DEFAULT_DECLINING_RATIO`].
    #[serde(default = "default_declining_ratio")]
    pub declining_ratio: f64,
    /// See [`DEFAULT_PERSISTENT_TREND_SPAN_MS`].
    #[serde(default = "default_persistent_trend_span_ms")]
    pub persistent_trend_span_ms: i64,
    /// See [`DEFAULT_LOCAL_FOCUS_ZOOM`].
    #[serde(default = "default_local_focus_zoom")]
    pub local_focus_zoom: u8,
}

impl PatternConfig {
    /// Millisecond span to split for trends under `window`.
    #[must_use]
    pub fn trend_span_ms(&self, window: TimeWindow) -> i64 {
        window.span_ms().unwrap_or(self.persistent_trend_span_ms)
    }
}

impl Default for PatternConfig {
    fn default() -> Self {
        Self {
            local_radius_meters: DEFAULT_LOCAL_RADIUS_METERS,
            zone_cells_per_degree: DEFAULT_ZONE_CELLS_PER_DEGREE,
            increasing_ratio: DEFAULT_INCREASING_RATIO,
            declining_ratio: DEFAULT_DECLINING_RATIO,
            persistent_trend_span_ms: DEFAULT_PERSISTENT_TREND_SPAN_MS,
            local_focus_zoom: DEFAULT_LOCAL_FOCUS_ZOOM,
        }
    }
}

const fn default_local_radius_meters() -> f64 {
    DEFAULT_LOCAL_RADIUS_METERS
}

const fn default_zone_cells_per_degree() -> f64 {
    DEFAULT_ZONE_CELLS_PER_DEGREE
}

const fn default_increasing_ratio() -> f64 {
    DEFAULT_INCREASING_RATIO
}

const fn default_declining_ratio() -> f64 {
    DEFAULT_DECLINING_RATIO
}

const fn default_persistent_trend_span_ms() -> i64 {
    DEFAULT_PERSISTENT_TREND_SPAN_MS
}

const fn default_local_focus_zoom() -> u8 {
    DEFAULT_LOCAL_FOCUS_ZOOM
}

/// Pixel preset for one cluster tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ClusterPreset {
    /// Square glyph edge length.
    pub size_px: u32,
    /// Label font size.
    pub font_px: u32,
}

/// Cluster tier thresholds and presets. Missing keys take the defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct ClusterConfig {
    /// Counts strictly above this are at least medium.
    pub medium_above: u64,
    /// Counts strictly above this are large.
    pub large_above: u64,
    /// Small tier preset.
    pub small: ClusterPreset,
    /// Medium tier preset.
    pub medium: ClusterPreset,
    /// Large tier preset.
    pub large: ClusterPreset,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            medium_above: 10,
            large_above: 50,
            small: ClusterPreset {
                size_px: 32,
                font_px: 12,
            },
            medium: ClusterPreset {
                size_px: 40,
                font_px: 13,
            },
            large: ClusterPreset {
                size_px: 50,
                font_px: 14,
            },
        }
    }
}

/// All engine policy constants.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct EngineConfig {
    /// Pattern analysis policy.
    #[serde(default)]
    pub pattern: PatternConfig,
    /// Cluster sizing policy.
    #[serde(default)]
    pub cluster: ClusterConfig,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lens_parses_all_and_types() {
        assert_eq!("all".parse::<Lens>().unwrap(), Lens::All);
        assert_eq!(
            "risk".parse::<Lens>().unwrap(),
            Lens::Only(ObservationType::Risk)
        );
        assert!("everything".parse::<Lens>().is_err());
    }

    #[test]
    fn lens_serializes_as_plain_string() {
        let state = FilterState {
            lens: Lens::Only(ObservationType::Infrastructure),
            window: TimeWindow::Week,
        };
        let json = serde_json::to_value(state).unwrap();
        assert_eq!(json["lens"], "infrastructure");
        assert_eq!(json["window"], "7d");

        let back: FilterState = serde_json::from_value(json).unwrap();
        assert_eq!(back, state);
    }

    #[test]
    fn all_lens_admits_every_type() {
        for t in ObservationType::all() {
            assert!(Lens::All.admits(*t));
        }
        assert!(!Lens::Only(ObservationType::Risk).admits(ObservationType::Violation));
    }

    #[test]
    fn window_spans_grow_monotonically() {
        let spans: Vec<Option<i64>> = TimeWindow::all().iter().map(|w| w.span_ms()).collect();
        assert_eq!(
            spans,
            vec![
                Some(86_400_000),
                Some(604_800_000),
                Some(2_592_000_000),
                None
            ]
        );
        assert_eq!("24h".parse::<TimeWindow>().unwrap(), TimeWindow::Day);
    }

    #[test]
    fn persistent_window_trends_over_fallback_span() {
        let config = PatternConfig::default();
        assert_eq!(
            config.trend_span_ms(TimeWindow::Persistent),
            DEFAULT_PERSISTENT_TREND_SPAN_MS
        );
        assert_eq!(config.trend_span_ms(TimeWindow::Day), MILLIS_PER_DAY);
    }

    #[test]
    fn review_rate_label_has_one_decimal() {
        let stats = Stats::default();
        assert_eq!(stats.review_rate_label(), "0.0");

        let stats = Stats {
            review_rate: 66.7,
            ..Stats::default()
        };
        assert_eq!(stats.review_rate_label(), "66.7");
    }

    #[test]
    fn type_counts_sum() {
        let mut counts = TypeCounts::default();
        counts.increment(ObservationType::Violation);
        counts.increment(ObservationType::Violation);
        counts.increment(ObservationType::Risk);
        assert_eq!(counts.get(ObservationType::Violation), 2);
        assert_eq!(counts.sum(), 3);
    }
}
