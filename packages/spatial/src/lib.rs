#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Spatial primitives for observation coordinates.
//!
//! Provides great-circle distance on a spherical Earth and axis-aligned
//! lat/lng bounding boxes. Everything here is a linear, allocation-light
//! computation; the corpora this workspace handles are small enough that
//! no spatial index is needed.

use geo::{BoundingRect, MultiPoint, Point};
use serde::{Deserialize, Serialize};

/// Sphere radius used for all distance calculations, in meters.
pub const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

/// A WGS84 coordinate pair in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    /// Latitude.
    pub lat: f64,
    /// Longitude.
    pub lng: f64,
}

impl LatLng {
    /// Creates a new coordinate pair.
    #[must_use]
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

impl From<LatLng> for Point<f64> {
    fn from(value: LatLng) -> Self {
        Self::new(value.lng, value.lat)
    }
}

/// An axis-aligned lat/lng rectangle.
///
/// When `min_lng > max_lng` the box crosses the antimeridian and covers
/// `[min_lng, 180] ∪ [-180, max_lng]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeoBounds {
    /// Southern edge.
    pub min_lat: f64,
    /// Northern edge.
    pub max_lat: f64,
    /// Western edge.
    pub min_lng: f64,
    /// Eastern edge.
    pub max_lng: f64,
}

impl GeoBounds {
    /// Creates bounds from `west,south,east,north` edges.
    #[must_use]
    pub const fn new(west: f64, south: f64, east: f64, north: f64) -> Self {
        Self {
            min_lat: south,
            max_lat: north,
            min_lng: west,
            max_lng: east,
        }
    }

    /// Whether these bounds cross the antimeridian.
    #[must_use]
    pub fn wraps_antimeridian(&self) -> bool {
        self.min_lng > self.max_lng
    }

    /// Whether the rectangle encloses any area at all. Zero-height,
    /// zero-width, and inverted-latitude boxes do not.
    #[must_use]
    pub fn has_area(&self) -> bool {
        #[allow(clippy::float_cmp)]
        let zero_width = self.min_lng == self.max_lng;
        self.max_lat > self.min_lat && !zero_width
    }

    /// Inclusive point-in-rectangle test.
    #[must_use]
    pub fn contains(&self, lat: f64, lng: f64) -> bool {
        if lat < self.min_lat || lat > self.max_lat {
            return false;
        }

        if self.wraps_antimeridian() {
            lng >= self.min_lng || lng <= self.max_lng
        } else {
            lng >= self.min_lng && lng <= self.max_lng
        }
    }

    /// Midpoint of the rectangle.
    #[must_use]
    pub fn center(&self) -> LatLng {
        let lat = f64::midpoint(self.min_lat, self.max_lat);

        if self.wraps_antimeridian() {
            let mut lng = f64::midpoint(self.min_lng, self.max_lng + 360.0);
            if lng > 180.0 {
                lng -= 360.0;
            }
            LatLng::new(lat, lng)
        } else {
            LatLng::new(lat, f64::midpoint(self.min_lng, self.max_lng))
        }
    }
}

/// Great-circle distance in meters between two points (Haversine formula on
/// a sphere of radius [`EARTH_RADIUS_METERS`]).
///
/// Symmetric in its arguments and exactly `0.0` for identical points.
#[must_use]
pub fn distance_meters(a: LatLng, b: LatLng) -> f64 {
    let phi1 = a.lat.to_radians();
    let phi2 = b.lat.to_radians();
    let d_phi = (b.lat - a.lat).to_radians();
    let d_lambda = (b.lng - a.lng).to_radians();

    let h = (d_phi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (d_lambda / 2.0).sin().powi(2);

    // Rounding can push `h` a hair past 1.0 for antipodal points.
    2.0 * EARTH_RADIUS_METERS * h.sqrt().min(1.0).asin()
}

/// Smallest [`GeoBounds`] enclosing every point, or `None` for an empty
/// input.
///
/// Never produces antimeridian-wrapping bounds.
#[must_use]
pub fn bounding_box<I>(points: I) -> Option<GeoBounds>
where
    I: IntoIterator<Item = LatLng>,
{
    let multi: MultiPoint<f64> = points.into_iter().map(Point::from).collect();

    multi.bounding_rect().map(|rect| GeoBounds {
        min_lat: rect.min().y,
        max_lat: rect.max().y,
        min_lng: rect.min().x,
        max_lng: rect.max().x,
    })
}
