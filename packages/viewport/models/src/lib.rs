#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Viewport bounds, search-trigger state and the events exchanged with the
//! map widget and the fetch orchestration.

use dongne_map_report_models::{LatLng, ReportCategory};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display};

/// Default per-edge bounds tolerance in degrees (roughly 200 m).
pub const DEFAULT_BOUNDS_TOLERANCE: f64 = 0.002;

/// Default quiet period for map-widget bounds events.
pub const DEFAULT_DEBOUNCE_MS: u64 = 300;

/// Absorbs decimal-to-binary error in edge deltas so that a delta written
/// as the tolerance itself reaches it.
pub const TOLERANCE_EPSILON: f64 = 1e-9;

/// A rectangular map viewport in degrees.
///
/// Never validated: `north < south` is carried as given.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewportBounds {
    pub north: f64,
    pub south: f64,
    pub east: f64,
    pub west: f64,
}

impl ViewportBounds {
    #[must_use]
    pub const fn new(north: f64, south: f64, east: f64, west: f64) -> Self {
        Self {
            north,
            south,
            east,
            west,
        }
    }

    /// Largest absolute per-edge difference to `other`.
    #[must_use]
    pub fn max_edge_delta(&self, other: &Self) -> f64 {
        [
            (self.north - other.north).abs(),
            (self.south - other.south).abs(),
            (self.east - other.east).abs(),
            (self.west - other.west).abs(),
        ]
        .into_iter()
        .fold(0.0, f64::max)
    }

    /// Whether every edge differs from `other` by less than `tolerance`.
    #[must_use]
    pub fn within_tolerance(&self, other: &Self, tolerance: f64) -> bool {
        self.max_edge_delta(other) + TOLERANCE_EPSILON < tolerance
    }

    /// Whether `point` lies inside the viewport, edges included.
    #[must_use]
    pub fn contains(&self, point: LatLng) -> bool {
        point.lat <= self.north
            && point.lat >= self.south
            && point.lng <= self.east
            && point.lng >= self.west
    }
}

/// Search-trigger state for one map session.
///
/// `trigger_counter` never decreases. Duplicate bounds never increment it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchTrigger {
    pub last_applied_bounds: Option<ViewportBounds>,
    pub trigger_counter: u64,
    pub bounds_filter_active: bool,
}

/// Coordinator lifecycle phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, AsRefStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum CoordinatorPhase {
    /// No bounds applied, or bounds search is off.
    Idle,
    /// Bounds applied and the last search settled.
    BoundsTracked,
    /// A search was signalled and has not settled.
    Pending,
}

/// Settings from the `[viewport]` config section.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CoordinatorConfig {
    /// Per-edge tolerance in degrees below which bounds updates are
    /// duplicates.
    #[serde(default = "default_bounds_tolerance")]
    pub bounds_tolerance: f64,
    /// Quiet period in milliseconds for the map-widget debouncer.
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
}

const fn default_bounds_tolerance() -> f64 {
    DEFAULT_BOUNDS_TOLERANCE
}

const fn default_debounce_ms() -> u64 {
    DEFAULT_DEBOUNCE_MS
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            bounds_tolerance: DEFAULT_BOUNDS_TOLERANCE,
            debounce_ms: DEFAULT_DEBOUNCE_MS,
        }
    }
}

/// A place the user picked from location search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchedLocation {
    pub place_name: String,
    pub address: String,
    pub location: LatLng,
}

/// Everything a fetch needs, stamped with the counter value that issued it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FetchTicket {
    pub counter: u64,
    #[serde(default)]
    pub bounds: Option<ViewportBounds>,
    #[serde(default)]
    pub bounds_filter_active: bool,
    /// `None` means every category.
    #[serde(default)]
    pub category: Option<ReportCategory>,
}

/// An event delivered to the coordinator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ViewportEvent {
    BoundsChanged { bounds: ViewportBounds },
    SearchThisRegion,
    ReturnToMyNeighborhood,
    CategoryChanged { category: Option<ReportCategory> },
    LocationSelected { location: SearchedLocation },
    FetchCompleted { ticket: FetchTicket },
    FetchFailed { ticket: FetchTicket },
}

/// What the coordinator did with an event.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Outcome {
    /// A new search must be issued for this ticket.
    Search(FetchTicket),
    /// State changed without a new search.
    Updated,
    /// Nothing changed: duplicate bounds or a stale ticket.
    Ignored,
}

impl Outcome {
    /// The ticket to fetch, if a search was triggered.
    #[must_use]
    pub const fn ticket(&self) -> Option<&FetchTicket> {
        match self {
            Self::Search(ticket) => Some(ticket),
            Self::Updated | Self::Ignored => None,
        }
    }
}
