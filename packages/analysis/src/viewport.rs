//! Viewport intersection.
//!
//! A pull-based query: the map surface reports its bounds and the caller
//! asks for the visible subset whenever the bounds or the filtered set
//! change.

use civic_watch_analysis_models::Viewport;
use civic_watch_observation_models::Observation;

/// Returns the members of `filtered` inside `viewport` (edges inclusive),
/// preserving order. A viewport with zero area shows nothing.
#[must_use]
pub fn visible<'a>(filtered: &[&'a Observation], viewport: &Viewport) -> Vec<&'a Observation> {
    let bounds = &viewport.bounds;

    if !bounds.has_area() {
        log::debug!("viewport {bounds:?} has no area; nothing visible");
        return Vec::new();
    }

    filtered
        .iter()
        .copied()
        .filter(|o| bounds.contains(o.lat, o.lng))
        .collect()
}

#[cfg(test)]
mod tests {
    use civic_watch_observation_models::{ObservationStatus, ObservationType};
    use civic_watch_spatial::GeoBounds;

    use super::*;

    fn at(id: &str, lat: f64, lng: f64) -> Observation {
        Observation {
            id: id.to_string(),
            observation_type: ObservationType::Infrastructure,
            lat,
            lng,
            timestamp: 0,
            status: ObservationStatus::Pending,
            reviewed_at: None,
            response_time: None,
            media: None,
        }
    }

    fn view(west: f64, south: f64, east: f64, north: f64) -> Viewport {
        Viewport {
            bounds: GeoBounds::new(west, south, east, north),
            zoom: 12,
        }
    }

    #[test]
    fn keeps_points_inside_and_on_edges() {
        let points = [
            at("inside", 19.05, 72.85),
            at("corner", 19.0, 72.8),
            at("outside", 19.2, 72.85),
        ];
        let filtered: Vec<&Observation> = points.iter().collect();

        let result = visible(&filtered, &view(72.8, 19.0, 72.9, 19.1));
        let ids: Vec<&str> = result.iter().map(|o| o.id.as_str()).collect();
        assert_eq!(ids, vec!["inside", "corner"]);
    }

    #[test]
    fn zero_area_viewport_is_empty() {
        let points = [at("on-line", 19.0, 72.85)];
        let filtered: Vec<&Observation> = points.iter().collect();

        assert!(visible(&filtered, &view(72.8, 19.0, 72.9, 19.0)).is_empty());
        assert!(visible(&filtered, &view(72.85, 18.9, 72.85, 19.1)).is_empty());
    }

    #[test]
    fn visible_is_subset_of_filtered() {
        let points: Vec<Observation> = (0..20)
            .map(|i| at(&format!("p{i}"), 18.9 + f64::from(i) * 0.02, 72.8))
            .collect();
        let filtered: Vec<&Observation> = points.iter().step_by(2).collect();

        let result = visible(&filtered, &view(72.0, 18.0, 73.0, 20.0));
        assert_eq!(result.len(), filtered.len());
        for o in result {
            assert!(filtered.iter().any(|f| std::ptr::eq(*f, o)));
        }
    }

    #[test]
    fn antimeridian_viewport() {
        let points = [at("east", 0.0, 179.5), at("west", 0.0, -179.5), at("far", 0.0, 0.0)];
        let filtered: Vec<&Observation> = points.iter().collect();

        let result = visible(&filtered, &view(179.0, -1.0, -179.0, 1.0));
        let ids: Vec<&str> = result.iter().map(|o| o.id.as_str()).collect();
        assert_eq!(ids, vec!["east", "west"]);
    }
}
