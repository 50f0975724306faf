#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Observation corpus provider.
//!
//! Supplies the immutable observation list the engine runs on, either
//! generated from a seed ([`generate`]) for demos and tests, or parsed from
//! a JSON array ([`from_json_str`] / [`load`]). Both paths validate every
//! record and reject duplicate ids.

pub mod rng;

use std::collections::BTreeSet;
use std::path::Path;

use civic_watch_observation_models::{
    MILLIS_PER_DAY, Media, MediaKind, Observation, ObservationError, ObservationStatus,
    ObservationType,
};
use civic_watch_spatial::LatLng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::rng::SeededRng;

/// Errors that can occur while loading a corpus.
#[derive(Debug, Error)]
pub enum CorpusError {
    /// The corpus file could not be read.
    #[error("Failed to read corpus: {0}")]
    Io(#[from] std::io::Error),

    /// The JSON was malformed or had the wrong shape.
    #[error("Failed to parse corpus: {0}")]
    Json(#[from] serde_json::Error),

    /// A record broke an observation invariant.
    #[error("Invalid observation: {0}")]
    Invalid(#[from] ObservationError),

    /// Two records share an id.
    #[error("Duplicate observation id '{id}'")]
    DuplicateId {
        /// The repeated id.
        id: String,
    },
}

/// Knobs for [`generate`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratorOptions {
    /// PRNG seed; equal seeds give equal corpora.
    pub seed: u64,
    /// Number of observations.
    pub count: usize,
    /// City center the corpus scatters around.
    pub center: LatLng,
    /// Maximum offset from `center`, in degrees, on each axis.
    pub spread_degrees: f64,
    /// Number of dense hotspots to plant.
    pub hotspots: usize,
    /// Share of observations placed near a hotspot, `0.0..=1.0`.
    pub hotspot_share: f64,
    /// Oldest observation age, in days.
    pub max_age_days: u32,
}

impl Default for GeneratorOptions {
    fn default() -> Self {
        Self {
            seed: 42,
            count: 500,
            // Mumbai
            center: LatLng::new(19.076, 72.8777),
            spread_degrees: 0.15,
            hotspots: 4,
            hotspot_share: 0.3,
            max_age_days: 45,
        }
    }
}

/// Hotspot scatter radius in degrees (~100 m).
const HOTSPOT_SPREAD_DEGREES: f64 = 0.0009;

/// Longest simulated review delay, in days.
const MAX_RESPONSE_DAYS: i64 = 14;

const TYPE_WEIGHTS: &[(ObservationType, u32)] = &[
    (ObservationType::Violation, 5),
    (ObservationType::Risk, 3),
    (ObservationType::Infrastructure, 2),
];

const STATUS_WEIGHTS: &[(ObservationStatus, u32)] = &[
    (ObservationStatus::Pending, 35),
    (ObservationStatus::UnderReview, 20),
    (ObservationStatus::Acknowledged, 15),
    (ObservationStatus::Resolved, 20),
    (ObservationStatus::Dismissed, 10),
];

/// Generates a deterministic mock corpus ending at `now`.
#[must_use]
pub fn generate(options: &GeneratorOptions, now: i64) -> Vec<Observation> {
    let mut rng = SeededRng::new(options.seed);
    generate_with(&mut rng, options, now)
}

/// Generates a mock corpus drawing from an existing generator state.
#[must_use]
pub fn generate_with(
    rng: &mut SeededRng,
    options: &GeneratorOptions,
    now: i64,
) -> Vec<Observation> {
    let hotspots: Vec<(LatLng, ObservationType)> = (0..options.hotspots)
        .map(|_| {
            let location = scatter(rng, options.center, options.spread_degrees * 0.8);
            let observation_type = pick_type(rng);
            (location, observation_type)
        })
        .collect();

    let max_age_ms = i64::from(options.max_age_days) * MILLIS_PER_DAY;

    let corpus: Vec<Observation> = (0..options.count)
        .map(|i| {
            let hotspot = if !hotspots.is_empty() && rng.chance(options.hotspot_share) {
                usize::try_from(rng.below(hotspots.len() as u64))
                    .ok()
                    .and_then(|idx| hotspots.get(idx))
            } else {
                None
            };

            let (location, observation_type) = match hotspot {
                Some((spot, spot_type)) => (scatter(rng, *spot, HOTSPOT_SPREAD_DEGREES), *spot_type),
                None => (
                    scatter(rng, options.center, options.spread_degrees),
                    pick_type(rng),
                ),
            };

            observation(rng, format!("obs-{i:05}"), location, observation_type, now, max_age_ms)
        })
        .collect();

    log::debug!(
        "Generated {} observations (seed {}, {} hotspots)",
        corpus.len(),
        options.seed,
        hotspots.len()
    );

    corpus
}

fn observation(
    rng: &mut SeededRng,
    id: String,
    location: LatLng,
    observation_type: ObservationType,
    now: i64,
    max_age_ms: i64,
) -> Observation {
    let age = i64::try_from(rng.below(max_age_ms.unsigned_abs())).unwrap_or(0);
    let timestamp = now - age;

    let status = rng
        .weighted(STATUS_WEIGHTS)
        .copied()
        .unwrap_or(ObservationStatus::Pending);

    let (reviewed_at, response_time) = if status.is_reviewed() {
        let max_days = (age / MILLIS_PER_DAY).min(MAX_RESPONSE_DAYS);
        let days = i64::try_from(rng.below(max_days.unsigned_abs() + 1)).unwrap_or(0);
        let reviewed_at = (timestamp + days * MILLIS_PER_DAY).min(now);
        (Some(reviewed_at), u32::try_from(days).ok())
    } else {
        (None, None)
    };

    let media = if rng.chance(0.4) {
        Some(Media {
            kind: MediaKind::Image,
            url: format!("https://media.civic-watch.invalid/{id}.jpg"),
        })
    } else if rng.chance(0.15) {
        Some(Media {
            kind: MediaKind::Video,
            url: format!("https://media.civic-watch.invalid/{id}.mp4"),
        })
    } else {
        None
    };

    Observation {
        id,
        observation_type,
        lat: location.lat,
        lng: location.lng,
        timestamp,
        status,
        reviewed_at,
        response_time,
        media,
    }
}

fn scatter(rng: &mut SeededRng, center: LatLng, spread: f64) -> LatLng {
    LatLng::new(
        (center.lat + rng.range_f64(-spread, spread)).clamp(-90.0, 90.0),
        (center.lng + rng.range_f64(-spread, spread)).clamp(-180.0, 180.0),
    )
}

fn pick_type(rng: &mut SeededRng) -> ObservationType {
    rng.weighted(TYPE_WEIGHTS)
        .copied()
        .unwrap_or(ObservationType::Violation)
}

/// Parses a JSON array of observations, validating each record.
///
/// # Errors
///
/// Returns [`CorpusError`] on malformed JSON, an invalid record, or a
/// duplicate id.
pub fn from_json_str(json: &str) -> Result<Vec<Observation>, CorpusError> {
    let corpus: Vec<Observation> = serde_json::from_str(json)?;
    check(&corpus)?;
    Ok(corpus)
}

/// Reads and parses a JSON corpus file.
///
/// # Errors
///
/// Returns [`CorpusError::Io`] if the file cannot be read, otherwise as
/// [`from_json_str`].
pub fn load(path: &Path) -> Result<Vec<Observation>, CorpusError> {
    log::info!("Loading corpus from {}", path.display());
    let contents = std::fs::read_to_string(path)?;
    let corpus = from_json_str(&contents)?;
    log::info!("Loaded {} observations", corpus.len());
    Ok(corpus)
}

/// Validates every record and rejects duplicate ids.
///
/// # Errors
///
/// Returns the first [`CorpusError`] found.
pub fn check(corpus: &[Observation]) -> Result<(), CorpusError> {
    let mut seen = BTreeSet::new();
    for o in corpus {
        if let Err(e) = o.validate() {
            log::warn!("Rejecting corpus: {e}");
            return Err(e.into());
        }
        if !seen.insert(o.id.as_str()) {
            log::warn!("Rejecting corpus: id '{}' appears more than once", o.id);
            return Err(CorpusError::DuplicateId { id: o.id.clone() });
        }
    }
    Ok(())
}
