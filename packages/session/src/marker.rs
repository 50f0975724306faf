//! Marker descriptors handed to the rendering sink.

use civic_watch_observation_models::Observation;
use serde::{Deserialize, Serialize};

/// Outline weight for an ordinary marker.
pub const DEFAULT_STROKE_WEIGHT: u8 = 1;
/// Outline weight for a marker belonging to the active pattern.
pub const PATTERN_STROKE_WEIGHT: u8 = 2;
/// Outline weight for the selected marker.
pub const SELECTED_STROKE_WEIGHT: u8 = 3;

/// Everything the renderer needs to draw one observation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkerDescriptor {
    /// Observation id, echoed back on click.
    pub id: String,
    /// Latitude.
    pub lat: f64,
    /// Longitude.
    pub lng: f64,
    /// Outline weight.
    pub stroke_weight: u8,
    /// Whether the fill should be drawn emphasized.
    pub fill_emphasis: bool,
    /// Whether this is the selected observation.
    pub is_selected: bool,
}

impl MarkerDescriptor {
    /// Marker for an observation in the plain filtered view.
    #[must_use]
    pub fn plain(observation: &Observation, is_selected: bool) -> Self {
        Self {
            id: observation.id.clone(),
            lat: observation.lat,
            lng: observation.lng,
            stroke_weight: if is_selected {
                SELECTED_STROKE_WEIGHT
            } else {
                DEFAULT_STROKE_WEIGHT
            },
            fill_emphasis: is_selected,
            is_selected,
        }
    }

    /// Marker for an observation matched by the active pattern.
    #[must_use]
    pub fn pattern(observation: &Observation) -> Self {
        Self {
            id: observation.id.clone(),
            lat: observation.lat,
            lng: observation.lng,
            stroke_weight: PATTERN_STROKE_WEIGHT,
            fill_emphasis: true,
            is_selected: false,
        }
    }
}
