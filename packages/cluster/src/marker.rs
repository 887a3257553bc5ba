//! Map marker descriptors for clusters.

use dongne_map_report_models::LatLng;
use serde::{Deserialize, Serialize};

use crate::ClusterRecord;

/// How much a selected marker's color is lightened toward white.
pub const SELECTED_LIGHTEN_AMOUNT: f64 = 0.3;

/// What the map renderer needs to draw one cluster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkerDescriptor {
    pub cluster_key: String,
    pub position: LatLng,
    /// `#rrggbb` fill color.
    pub color: String,
    pub count: usize,
    pub selected: bool,
}

impl MarkerDescriptor {
    /// Describes `cluster`, colored by its dominant category.
    #[must_use]
    pub fn for_cluster(cluster: &ClusterRecord, selected: bool) -> Self {
        let base = cluster.dominant_category.marker_color();
        let color = if selected {
            lighten_color(base, SELECTED_LIGHTEN_AMOUNT)
        } else {
            base.to_string()
        };

        Self {
            cluster_key: cluster.cluster_key.clone(),
            position: cluster.centroid,
            color,
            count: cluster.member_count,
            selected,
        }
    }
}

/// Descriptors for every cluster, marking the one keyed `selected_key`.
#[must_use]
pub fn markers(clusters: &[ClusterRecord], selected_key: Option<&str>) -> Vec<MarkerDescriptor> {
    clusters
        .iter()
        .map(|c| MarkerDescriptor::for_cluster(c, selected_key == Some(c.cluster_key.as_str())))
        .collect()
}

fn parse_hex_color(color: &str) -> Option<[u8; 3]> {
    let hex = color.strip_prefix('#').unwrap_or(color);
    if hex.len() != 6 || !hex.is_ascii() {
        return None;
    }

    let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
    Some([channel(0)?, channel(2)?, channel(4)?])
}

/// Moves each channel of a `#rrggbb` color `amount` of the way toward
/// white. Anything that isn't a six-digit hex color is returned unchanged.
#[must_use]
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_lossless
)]
pub fn lighten_color(color: &str, amount: f64) -> String {
    let Some(rgb) = parse_hex_color(color) else {
        return color.to_string();
    };

    let [r, g, b] = rgb.map(|c| {
        let c = f64::from(c);
        (c + (255.0 - c) * amount).floor().clamp(0.0, 255.0) as u8
    });
    format!("#{r:02x}{g:02x}{b:02x}")
}
