//! Pattern-mode state.
//!
//! Exactly one of three variants is active. Each pattern variant owns its
//! snapshot, including the view to restore when the pattern is cleared, so
//! there is never a snapshot without a saved view or vice versa.

use civic_watch_analysis_models::{CityWideStats, LocalStats};
use civic_watch_observation_models::{Observation, ObservationType};
use civic_watch_spatial::LatLng;
use serde::{Deserialize, Serialize};

/// Where the map is looking.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MapView {
    /// Map center.
    pub center: LatLng,
    /// Zoom level.
    pub zoom: u8,
}

/// The view and selection captured when a pattern was entered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedView {
    /// Map center before entry.
    pub center: LatLng,
    /// Zoom before entry.
    pub zoom: u8,
    /// Observation that was selected before entry.
    pub previous_selection: Option<String>,
}

/// Snapshot of a city-wide pattern.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CityWideSnapshot {
    /// Observation the pattern was built from.
    pub reference_id: String,
    /// Its type; every match shares it.
    pub reference_type: ObservationType,
    /// Matches, a subset of the filtered set at creation time.
    pub matched: Vec<Observation>,
    /// Stats over `matched`.
    pub stats: CityWideStats,
    /// View to restore on exit.
    pub saved_view: SavedView,
}

/// Snapshot of a local (radius) pattern.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocalSnapshot {
    /// Observation the pattern was built from.
    pub reference_id: String,
    /// Its type; every match shares it.
    pub reference_type: ObservationType,
    /// Matches, a subset of the filtered set at creation time.
    pub matched: Vec<Observation>,
    /// Stats over `matched`.
    pub stats: LocalStats,
    /// View to restore on exit.
    pub saved_view: SavedView,
}

impl LocalSnapshot {
    /// Point the radius was measured from.
    #[must_use]
    pub const fn center(&self) -> LatLng {
        self.stats.center
    }
}

/// Which aggregate view, if any, replaces the raw filtered set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum PatternMode {
    /// Plain filtered view.
    #[default]
    None,
    /// Every same-type observation in the filtered set.
    CityWide(CityWideSnapshot),
    /// Same-type observations around the reference.
    Local(LocalSnapshot),
}

impl PatternMode {
    /// Short name for logs and errors.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::CityWide(_) => "city_wide",
            Self::Local(_) => "local",
        }
    }

    /// Whether a pattern snapshot is active.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        !matches!(self, Self::None)
    }

    /// The city-wide snapshot, if that mode is active.
    #[must_use]
    pub const fn city_wide(&self) -> Option<&CityWideSnapshot> {
        match self {
            Self::CityWide(snapshot) => Some(snapshot),
            Self::None | Self::Local(_) => None,
        }
    }

    /// The local snapshot, if that mode is active.
    #[must_use]
    pub const fn local(&self) -> Option<&LocalSnapshot> {
        match self {
            Self::Local(snapshot) => Some(snapshot),
            Self::None | Self::CityWide(_) => None,
        }
    }

    /// Matched observations of the active snapshot.
    #[must_use]
    pub fn matched(&self) -> Option<&[Observation]> {
        match self {
            Self::None => None,
            Self::CityWide(snapshot) => Some(&snapshot.matched),
            Self::Local(snapshot) => Some(&snapshot.matched),
        }
    }

    /// Saved view of the active snapshot.
    #[must_use]
    pub const fn saved_view(&self) -> Option<&SavedView> {
        match self {
            Self::None => None,
            Self::CityWide(snapshot) => Some(&snapshot.saved_view),
            Self::Local(snapshot) => Some(&snapshot.saved_view),
        }
    }

    /// Id of the reference observation of the active snapshot.
    #[must_use]
    pub fn reference_id(&self) -> Option<&str> {
        match self {
            Self::None => None,
            Self::CityWide(snapshot) => Some(&snapshot.reference_id),
            Self::Local(snapshot) => Some(&snapshot.reference_id),
        }
    }
}
