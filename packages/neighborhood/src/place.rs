//! Display-name policy for searched places.

use dongne_map_neighborhood_models::NeighborhoodLabel;

use crate::normalize::is_numbered_neighborhood;

/// Place names containing any of these read as transit or commercial
/// landmarks rather than a neighborhood.
const LANDMARK_KEYWORDS: &[&str] = &["역", "호선", "타워", "빌딩", "몰", "마트"];

/// Chooses between a place's own name and its resolved neighborhood.
///
/// In order:
/// - an empty place name yields `label.display`;
/// - an unknown label keeps the place name;
/// - a numbered dong or lettered block yields `label.neighborhood`;
/// - a landmark-like place name yields `label.display`;
/// - a place name longer than `max_chars` characters yields `label.display`;
/// - otherwise the trimmed place name.
#[must_use]
pub fn choose_display_name(place_name: &str, label: &NeighborhoodLabel, max_chars: usize) -> String {
    let place_name = place_name.trim();

    if place_name.is_empty() {
        return label.display.clone();
    }
    if label.is_unknown() {
        return place_name.to_string();
    }
    if is_numbered_neighborhood(&label.neighborhood) {
        return label.neighborhood.clone();
    }
    if LANDMARK_KEYWORDS.iter().any(|k| place_name.contains(k)) {
        return label.display.clone();
    }
    if place_name.chars().count() > max_chars {
        return label.display.clone();
    }
    place_name.to_string()
}
