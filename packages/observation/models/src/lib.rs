#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Observation record types shared across the civic-watch workspace.
//!
//! An [`Observation`] is a single geotagged report: what kind of thing was
//! seen ([`ObservationType`]), where and when, and how far it has progressed
//! through review ([`ObservationStatus`]). Records are immutable once
//! created; every engine component reads them and none writes them.

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};
use thiserror::Error;

/// Milliseconds in one day. Timestamps are epoch milliseconds throughout.
pub const MILLIS_PER_DAY: i64 = 24 * 60 * 60 * 1000;

/// What an observation reports.
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
pub enum ObservationType {
    /// A rule or ordinance being broken
    Violation,
    /// A hazard that has not (yet) caused harm
    Risk,
    /// Damaged or missing public infrastructure
    Infrastructure,
}

impl ObservationType {
    /// Returns all variants of this enum.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::Violation, Self::Risk, Self::Infrastructure]
    }
}

/// Review lifecycle of an observation.
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
pub enum ObservationStatus {
    /// Submitted, not yet looked at
    Pending,
    /// Picked up by a reviewer
    UnderReview,
    /// Confirmed as a real issue
    Acknowledged,
    /// Issue has been fixed
    Resolved,
    /// Rejected as invalid or duplicate
    Dismissed,
}

impl ObservationStatus {
    /// Whether a reviewer has touched this observation at all.
    #[must_use]
    pub const fn is_reviewed(self) -> bool {
        !matches!(self, Self::Pending)
    }

    /// Returns all variants of this enum.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::Pending,
            Self::UnderReview,
            Self::Acknowledged,
            Self::Resolved,
            Self::Dismissed,
        ]
    }
}

/// Kind of media attached to an observation.
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
pub enum MediaKind {
    /// Still photo
    Image,
    /// Video clip
    Video,
}

/// An attachment descriptor. Carries no identifying metadata, only where the
/// stripped file lives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Media {
    /// Image or video.
    pub kind: MediaKind,
    /// Location of the stripped attachment.
    pub url: String,
}

/// A single geotagged report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Observation {
    /// Unique identifier.
    pub id: String,
    /// What was observed.
    #[serde(rename = "type")]
    pub observation_type: ObservationType,
    /// Latitude in degrees.
    pub lat: f64,
    /// Longitude in degrees.
    pub lng: f64,
    /// Creation instant (epoch milliseconds).
    pub timestamp: i64,
    /// Review status.
    pub status: ObservationStatus,
    /// When a reviewer first acted on it (epoch milliseconds). Absent while
    /// pending.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reviewed_at: Option<i64>,
    /// Whole days between creation and review. Absent while pending.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_time: Option<u32>,
    /// Optional attachment.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media: Option<Media>,
}

impl Observation {
    /// Checks the record-level invariants: coordinates in range, a
    /// `reviewed_at` no earlier than `timestamp` on every reviewed record, and
    /// no response time while pending.
    ///
    /// # Errors
    ///
    /// Returns the first [`ObservationError`] found.
    pub fn validate(&self) -> Result<(), ObservationError> {
        if self.id.is_empty() {
            return Err(ObservationError::MissingId);
        }

        if !(-90.0..=90.0).contains(&self.lat) || !(-180.0..=180.0).contains(&self.lng) {
            return Err(ObservationError::CoordinatesOutOfRange {
                id: self.id.clone(),
                lat: self.lat,
                lng: self.lng,
            });
        }

        if self.status.is_reviewed() {
            let Some(reviewed_at) = self.reviewed_at else {
                return Err(ObservationError::MissingReviewTime {
                    id: self.id.clone(),
                });
            };
            if reviewed_at < self.timestamp {
                return Err(ObservationError::ReviewedBeforeCreated {
                    id: self.id.clone(),
                });
            }
        } else if self.response_time.is_some() {
            return Err(ObservationError::PendingWithResponseTime {
                id: self.id.clone(),
            });
        }

        Ok(())
    }
}

/// Reasons an [`Observation`] fails [`Observation::validate`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ObservationError {
    /// The record has an empty id.
    #[error("observation has an empty id")]
    MissingId,

    /// Latitude or longitude is outside the valid range.
    #[error("observation {id} has coordinates out of range: ({lat}, {lng})")]
    CoordinatesOutOfRange {
        /// Offending record.
        id: String,
        /// Latitude as given.
        lat: f64,
        /// Longitude as given.
        lng: f64,
    },

    /// `reviewed_at` precedes `timestamp`.
    #[error("observation {id} was reviewed before it was created")]
    ReviewedBeforeCreated {
        /// Offending record.
        id: String,
    },

    /// A reviewed record has no `reviewed_at`.
    #[error("observation {id} is reviewed but has no review time")]
    MissingReviewTime {
        /// Offending record.
        id: String,
    },

    /// A pending record carries a response time.
    #[error("observation {id} is pending but has a response time")]
    PendingWithResponseTime {
        /// Offending record.
        id: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reviewed(id: &str) -> Observation {
        Observation {
            id: id.to_string(),
            observation_type: ObservationType::Risk,
            lat: 19.07,
            lng: 72.87,
            timestamp: 1_000,
            status: ObservationStatus::Resolved,
            reviewed_at: Some(1_000 + 2 * MILLIS_PER_DAY),
            response_time: Some(2),
            media: None,
        }
    }

    #[test]
    fn only_pending_is_unreviewed() {
        for status in ObservationStatus::all() {
            assert_eq!(
                status.is_reviewed(),
                *status != ObservationStatus::Pending,
                "{status:?}"
            );
        }
    }

    #[test]
    fn type_names_use_snake_case() {
        assert_eq!(ObservationType::Infrastructure.to_string(), "infrastructure");
        assert_eq!(
            "violation".parse::<ObservationType>().unwrap(),
            ObservationType::Violation
        );
        assert_eq!(ObservationStatus::UnderReview.as_ref(), "under_review");
    }

    #[test]
    fn serializes_type_field_name() {
        let json = serde_json::to_value(reviewed("a")).unwrap();
        assert_eq!(json["type"], "risk");
        assert_eq!(json["reviewedAt"], 1_000 + 2 * MILLIS_PER_DAY);
        assert!(json.get("media").is_none());
    }

    #[test]
    fn validate_accepts_well_formed_records() {
        assert_eq!(reviewed("a").validate(), Ok(()));

        let pending = Observation {
            status: ObservationStatus::Pending,
            reviewed_at: None,
            response_time: None,
            ..reviewed("b")
        };
        assert_eq!(pending.validate(), Ok(()));
    }

    #[test]
    fn validate_rejects_review_before_creation() {
        let obs = Observation {
            reviewed_at: Some(0),
            ..reviewed("early")
        };
        assert!(matches!(
            obs.validate(),
            Err(ObservationError::ReviewedBeforeCreated { .. })
        ));
    }

    #[test]
    fn validate_rejects_reviewed_without_review_time() {
        let obs = Observation {
            reviewed_at: None,
            ..reviewed("unstamped")
        };
        assert!(matches!(
            obs.validate(),
            Err(ObservationError::MissingReviewTime { id }) if id == "unstamped"
        ));
    }

    #[test]
    fn validate_rejects_pending_with_response_time() {
        let obs = Observation {
            status: ObservationStatus::Pending,
            reviewed_at: None,
            ..reviewed("p")
        };
        assert!(matches!(
            obs.validate(),
            Err(ObservationError::PendingWithResponseTime { .. })
        ));
    }

    #[test]
    fn validate_rejects_bad_coordinates() {
        let obs = Observation {
            lat: 91.0,
            ..reviewed("north")
        };
        assert!(matches!(
            obs.validate(),
            Err(ObservationError::CoordinatesOutOfRange { .. })
        ));
    }
}
