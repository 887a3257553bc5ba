#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! In-memory spatial index over report points.
//!
//! Builds an R-tree over a report list once and answers the two local
//! filtering questions the map asks: which reports are inside the current
//! viewport, and which are within walking range of "my neighborhood".

use std::cmp::Ordering;

use dongne_map_report_models::{LatLng, ReportPoint};
use dongne_map_viewport_models::ViewportBounds;
use rstar::{AABB, RTree, RTreeObject};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Mean earth radius in meters.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Meters per degree of latitude on a sphere of [`EARTH_RADIUS_M`].
const METERS_PER_DEGREE: f64 = EARTH_RADIUS_M * std::f64::consts::PI / 180.0;

/// Great-circle distance between two points in meters.
#[must_use]
pub fn haversine_distance_m(a: LatLng, b: LatLng) -> f64 {
    let d_lat = (b.lat - a.lat).to_radians();
    let d_lng = (b.lng - a.lng).to_radians();

    let h = (d_lat / 2.0).sin().powi(2)
        + a.lat.to_radians().cos() * b.lat.to_radians().cos() * (d_lng / 2.0).sin().powi(2);

    2.0 * EARTH_RADIUS_M * h.sqrt().atan2((1.0 - h).sqrt())
}

/// Renders a distance for list rows: `"850m"` below a kilometer, `"1.2km"`
/// above.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn format_distance(meters: f64) -> String {
    if meters < 1000.0 {
        format!("{}m", meters.round() as i64)
    } else {
        format!("{:.1}km", meters / 1000.0)
    }
}

/// How far "my neighborhood" reaches.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE", ascii_case_insensitive)]
pub enum NeighborhoodRange {
    Small,
    #[default]
    Medium,
    Large,
}

impl NeighborhoodRange {
    #[must_use]
    pub const fn meters(self) -> f64 {
        match self {
            Self::Small => 1000.0,
            Self::Medium => 3000.0,
            Self::Large => 6000.0,
        }
    }

    #[must_use]
    pub const fn km(self) -> f64 {
        self.meters() / 1000.0
    }

    /// Korean description shown in the range picker.
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::Small => "아파트 단지나 소규모 구역 (1km)",
            Self::Medium => "일반적인 동네 범위 (3km)",
            Self::Large => "넓은 지역 범위 (6km)",
        }
    }

    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::Small, Self::Medium, Self::Large]
    }
}

/// A report within range, with its distance from the range center.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RangeHit<'a> {
    pub report: &'a ReportPoint,
    pub distance_m: f64,
}

/// How many reports fall inside a range.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RangeStats {
    pub total: usize,
    pub in_range: usize,
    /// Rounded share of `total`, 0 when there are no reports.
    pub percentage: usize,
    pub range_km: f64,
}

impl RangeStats {
    #[must_use]
    pub const fn new(total: usize, in_range: usize, range: NeighborhoodRange) -> Self {
        let percentage = if total == 0 {
            0
        } else {
            (in_range * 200 + total) / (total * 2)
        };
        Self {
            total,
            in_range,
            percentage,
            range_km: range.km(),
        }
    }
}

/// A report position stored in the R-tree.
struct IndexedReport {
    idx: usize,
    envelope: AABB<[f64; 2]>,
}

impl RTreeObject for IndexedReport {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        self.envelope
    }
}

/// R-tree over a report list. Points are stored as `[lng, lat]`.
pub struct ReportIndex {
    reports: Vec<ReportPoint>,
    tree: RTree<IndexedReport>,
}

impl ReportIndex {
    /// Builds the index. Reports keep their input order for every query.
    #[must_use]
    pub fn new(reports: Vec<ReportPoint>) -> Self {
        let entries = reports
            .iter()
            .enumerate()
            .map(|(idx, r)| IndexedReport {
                idx,
                envelope: AABB::from_point([r.longitude, r.latitude]),
            })
            .collect();
        let tree = RTree::bulk_load(entries);
        log::debug!("Indexed {} reports", tree.size());

        Self { reports, tree }
    }

    #[must_use]
    pub fn reports(&self) -> &[ReportPoint] {
        &self.reports
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.reports.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.reports.is_empty()
    }

    /// Reports inside `bounds`, edges included, in input order.
    ///
    /// Bounds with `north < south` or `east < west` contain nothing.
    #[must_use]
    pub fn within_bounds(&self, bounds: &ViewportBounds) -> Vec<&ReportPoint> {
        let query = AABB::from_corners([bounds.west, bounds.south], [bounds.east, bounds.north]);
        let mut hits: Vec<usize> = self
            .tree
            .locate_in_envelope_intersecting(&query)
            .map(|e| e.idx)
            .filter(|&idx| bounds.contains(self.reports[idx].location()))
            .collect();
        hits.sort_unstable();

        hits.into_iter().map(|idx| &self.reports[idx]).collect()
    }

    /// Reports within `range` of `center`, nearest first. Equal distances
    /// keep input order.
    #[must_use]
    pub fn within_range(&self, center: LatLng, range: NeighborhoodRange) -> Vec<RangeHit<'_>> {
        let max_m = range.meters();
        let query = search_envelope(center, max_m);

        let mut hits: Vec<(usize, f64)> = self
            .tree
            .locate_in_envelope_intersecting(&query)
            .filter_map(|e| {
                let distance = haversine_distance_m(center, self.reports[e.idx].location());
                (distance <= max_m).then_some((e.idx, distance))
            })
            .collect();
        hits.sort_by(|a, b| {
            a.1.partial_cmp(&b.1)
                .unwrap_or(Ordering::Equal)
                .then(a.0.cmp(&b.0))
        });

        hits.into_iter()
            .map(|(idx, distance_m)| RangeHit {
                report: &self.reports[idx],
                distance_m,
            })
            .collect()
    }

    /// Counts for the range picker.
    #[must_use]
    pub fn range_stats(&self, center: LatLng, range: NeighborhoodRange) -> RangeStats {
        RangeStats::new(self.len(), self.within_range(center, range).len(), range)
    }
}

/// A `[lng, lat]` box that contains every point within `meters` of
/// `center`, with some slack.
fn search_envelope(center: LatLng, meters: f64) -> AABB<[f64; 2]> {
    let lat_delta = meters / METERS_PER_DEGREE * 1.1;
    let cos_lat = center.lat.to_radians().cos().abs();
    let lng_delta = if cos_lat < 1e-6 {
        360.0
    } else {
        (lat_delta / cos_lat).min(360.0)
    };

    AABB::from_corners(
        [center.lng - lng_delta, center.lat - lat_delta],
        [center.lng + lng_delta, center.lat + lat_delta],
    )
}
