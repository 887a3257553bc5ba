#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Administrative neighborhood resolution.
//!
//! Turns free-text geocoder addresses into canonical
//! [`NeighborhoodLabel`]s through a fixed fallback chain: token scan, legal
//! dong mapping, landmark heuristics, district default. Per-district tables
//! are TOML files embedded at compile time, in the same registry pattern
//! used for every other data definition in the workspace.

pub mod address;
pub mod normalize;
pub mod place;
pub mod registry;
pub mod resolve;

use std::path::PathBuf;

use dongne_map_neighborhood_models::{NeighborhoodLabel, PlaceSearchResult};
use thiserror::Error;

pub use registry::DistrictRegistry;
pub use resolve::{NeighborhoodResolver, ResolveNeighborhood};

/// Errors that can occur while loading district tables.
#[derive(Debug, Error)]
pub enum NeighborhoodError {
    /// A district table file could not be read.
    #[error("Failed to read {}: {source}", path.display())]
    Io {
        /// File that failed.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// A district table is not valid TOML for the table schema.
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// A district table parsed but is missing data resolution needs.
    #[error("Invalid district table {district}: {message}")]
    InvalidTable {
        /// Table id (`"서울 중구"`).
        district: String,
        /// Description of what went wrong.
        message: String,
    },

    /// Two supplied tables share the same city and district.
    #[error("Duplicate district table: {id}")]
    DuplicateDistrict {
        /// Conflicting table id.
        id: String,
    },
}

/// Resolves `raw` against the built-in district tables.
///
/// Never fails: unresolvable input yields [`NeighborhoodLabel::unknown`].
#[must_use]
pub fn resolve_neighborhood(raw: &str, road_address: Option<&str>) -> NeighborhoodLabel {
    NeighborhoodResolver::default().resolve(raw, road_address)
}

/// Chooses the label to show for a searched place using the built-in
/// district tables and the default length threshold.
#[must_use]
pub fn best_display_name_for_place(
    place_name: &str,
    raw_address: &str,
    road_address: Option<&str>,
) -> String {
    NeighborhoodResolver::default().best_display_name(place_name, raw_address, road_address)
}

/// [`best_display_name_for_place`] for a geocoder place-search record.
#[must_use]
pub fn display_name_for_search_result(place: &PlaceSearchResult) -> String {
    best_display_name_for_place(
        &place.place_name,
        &place.address_name,
        place.road_address_name.as_deref(),
    )
}
