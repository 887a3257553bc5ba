#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Groups report points into map clusters.
//!
//! Reports whose addresses resolve to the same neighborhood label share a
//! cluster. Reports with unresolvable addresses are grouped by their
//! coordinates truncated to a fixed number of decimals. Clusters are
//! recomputed from scratch on every call and come out in discovery order.

pub mod marker;

use std::collections::BTreeMap;

use dongne_map_neighborhood::{NeighborhoodResolver, ResolveNeighborhood};
use dongne_map_neighborhood_models::NeighborhoodLabel;
use dongne_map_report_models::{LatLng, ReportCategory, ReportPoint};
use serde::{Deserialize, Serialize};

pub use marker::{MarkerDescriptor, lighten_color, markers};

/// Default number of decimals kept in coordinate keys (about 100 m).
pub const DEFAULT_COORDINATE_PRECISION: usize = 3;

/// Extra decimals rendered before truncating, so that binary
/// representation error (`37.567` stored as `37.56699999...`) rounds away.
const TRUNCATION_GUARD_DIGITS: usize = 6;

/// Settings from the `[cluster]` config section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterConfig {
    /// Decimals kept in coordinate keys.
    #[serde(default = "default_coordinate_precision")]
    pub coordinate_precision: usize,
}

const fn default_coordinate_precision() -> usize {
    DEFAULT_COORDINATE_PRECISION
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            coordinate_precision: DEFAULT_COORDINATE_PRECISION,
        }
    }
}

/// A group of reports rendered as one map marker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterRecord {
    /// Neighborhood display label, or a `"lat,lng"` coordinate key.
    pub cluster_key: String,
    /// Location of the first report assigned to this cluster.
    pub centroid: LatLng,
    pub members: Vec<ReportPoint>,
    pub member_count: usize,
    /// Category of the first report assigned to this cluster.
    pub dominant_category: ReportCategory,
    /// Resolved label for neighborhood-keyed clusters.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<NeighborhoodLabel>,
}

impl ClusterRecord {
    fn start(cluster_key: String, report: &ReportPoint, label: Option<NeighborhoodLabel>) -> Self {
        Self {
            cluster_key,
            centroid: report.location(),
            members: vec![report.clone()],
            member_count: 1,
            dominant_category: report.category,
            label,
        }
    }

    fn push(&mut self, report: &ReportPoint) {
        self.members.push(report.clone());
        self.member_count += 1;
    }
}

/// Truncates `value` toward zero to `precision` decimals and renders it
/// with exactly that many (`37.56789` → `"37.567"`).
///
/// Truncation happens on the decimal rendering. Negative values that
/// truncate to zero render without a sign.
#[must_use]
pub fn truncate_coordinate(value: f64, precision: usize) -> String {
    let digits = precision + TRUNCATION_GUARD_DIGITS;
    let rendered = format!("{value:.digits$}");
    let Some((whole, fraction)) = rendered.split_once('.') else {
        return rendered;
    };

    let truncated = if precision == 0 {
        whole.to_string()
    } else {
        format!("{whole}.{}", &fraction[..precision])
    };

    match truncated.strip_prefix('-') {
        Some(magnitude) if magnitude.chars().all(|c| c == '0' || c == '.') => {
            magnitude.to_string()
        }
        _ => truncated,
    }
}

/// `"lat,lng"` key for reports without a resolvable address.
#[must_use]
pub fn coordinate_key(location: LatLng, precision: usize) -> String {
    format!(
        "{},{}",
        truncate_coordinate(location.lat, precision),
        truncate_coordinate(location.lng, precision)
    )
}

/// Clusters reports using a neighborhood resolver.
#[derive(Debug, Clone)]
pub struct ReportClusterer<R> {
    resolver: R,
    config: ClusterConfig,
}

impl Default for ReportClusterer<NeighborhoodResolver<'static>> {
    fn default() -> Self {
        Self::new(NeighborhoodResolver::default(), ClusterConfig::default())
    }
}

impl<R: ResolveNeighborhood> ReportClusterer<R> {
    #[must_use]
    pub const fn new(resolver: R, config: ClusterConfig) -> Self {
        Self { resolver, config }
    }

    /// Partitions `reports` into clusters in discovery order.
    ///
    /// The first report seen for a key fixes its centroid and dominant
    /// category, so reordering the input may change both.
    #[must_use]
    pub fn cluster(&self, reports: &[ReportPoint]) -> Vec<ClusterRecord> {
        let mut clusters: Vec<ClusterRecord> = Vec::new();
        let mut index: BTreeMap<String, usize> = BTreeMap::new();

        for report in reports {
            let label = self
                .resolver
                .resolve(report.address.as_deref().unwrap_or_default(), None);

            let (key, label) = if label.is_unknown() {
                (
                    coordinate_key(report.location(), self.config.coordinate_precision),
                    None,
                )
            } else {
                (label.display.clone(), Some(label))
            };

            if let Some(&idx) = index.get(&key) {
                clusters[idx].push(report);
            } else {
                index.insert(key.clone(), clusters.len());
                clusters.push(ClusterRecord::start(key, report, label));
            }
        }

        log::info!(
            "Clustered {} reports into {} clusters",
            reports.len(),
            clusters.len()
        );
        clusters
    }
}

/// Clusters `reports` with the built-in district tables and the default
/// coordinate precision.
#[must_use]
pub fn cluster_reports(reports: &[ReportPoint]) -> Vec<ClusterRecord> {
    ReportClusterer::default().cluster(reports)
}
