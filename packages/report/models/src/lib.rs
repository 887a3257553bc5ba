#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Report category/status taxonomy and the read-only report point type.
//!
//! Reports are owned by the storage collaborator. This crate only defines
//! the shape the clustering and spatial packages read, plus the fixed
//! category and status taxonomy shared by every package.

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Marker color used when a category has no dedicated color.
pub const FALLBACK_MARKER_COLOR: &str = "#FECA57";

/// Neighborhood issue category chosen by the reporter.
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
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum ReportCategory {
    /// Construction, neighbors, late-night businesses
    Noise,
    /// Illegal dumping and overflowing bins
    Trash,
    /// Broken public facilities (lights, benches, sidewalks)
    Facility,
    /// Parking, signals, dangerous crossings
    Traffic,
    /// Anything that fits nowhere else
    Other,
}

impl ReportCategory {
    /// Korean label shown in the UI.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Noise => "소음",
            Self::Trash => "쓰레기",
            Self::Facility => "시설",
            Self::Traffic => "교통",
            Self::Other => "기타",
        }
    }

    /// Hex color of the map marker for this category.
    #[must_use]
    pub const fn marker_color(self) -> &'static str {
        match self {
            Self::Noise => "#FF6B6B",
            Self::Trash => "#4ECDC4",
            Self::Facility => "#45B7D1",
            Self::Traffic => "#96CEB4",
            Self::Other => FALLBACK_MARKER_COLOR,
        }
    }

    /// Returns all variants of this enum.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::Noise,
            Self::Trash,
            Self::Facility,
            Self::Traffic,
            Self::Other,
        ]
    }
}

/// Triage status assigned by administrators.
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
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum ReportStatus {
    /// Submitted, not yet looked at
    Open,
    /// Picked up by an administrator
    InProgress,
    /// Fixed or closed
    Resolved,
}

impl ReportStatus {
    /// Korean label shown in the UI.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Open => "접수됨",
            Self::InProgress => "처리중",
            Self::Resolved => "해결됨",
        }
    }
}

/// A WGS84 coordinate pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    /// Latitude in degrees.
    pub lat: f64,
    /// Longitude in degrees.
    pub lng: f64,
}

impl LatLng {
    #[must_use]
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

/// A geotagged report as supplied by the storage collaborator.
///
/// Read-only to this workspace: nothing here mutates or persists it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportPoint {
    /// Storage identifier.
    pub id: String,
    /// Issue category.
    pub category: ReportCategory,
    /// Latitude in degrees.
    #[serde(alias = "lat")]
    pub latitude: f64,
    /// Longitude in degrees.
    #[serde(alias = "lng")]
    pub longitude: f64,
    /// Free-text address captured from the geocoder, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

impl ReportPoint {
    /// Creates a report without an address.
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        category: ReportCategory,
        latitude: f64,
        longitude: f64,
    ) -> Self {
        Self {
            id: id.into(),
            category,
            latitude,
            longitude,
            address: None,
        }
    }

    /// Attaches a geocoder address.
    #[must_use]
    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.address = Some(address.into());
        self
    }

    /// The report location as a coordinate pair.
    #[must_use]
    pub const fn location(&self) -> LatLng {
        LatLng::new(self.latitude, self.longitude)
    }
}
