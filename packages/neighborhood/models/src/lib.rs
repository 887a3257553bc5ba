#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Neighborhood label and district table definition types.
//!
//! Defines the canonical label produced by address resolution, the TOML
//! schema for per-district legal-dong and landmark tables, and the shape of
//! place-search results handed over by the geocoder.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display};

/// Sentinel used for every label field when no district can be extracted.
pub const UNKNOWN_NEIGHBORHOOD: &str = "알 수 없음";

/// Default place-name length (in characters) above which the resolved
/// neighborhood is preferred for display.
pub const DEFAULT_PLACE_NAME_MAX_CHARS: usize = 8;

/// Which fallback tier produced a [`NeighborhoodLabel`].
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ResolutionTier {
    /// An administrative-dong or legacy block token appeared in the address.
    TokenScan,
    /// A legal dong was mapped to its governing administrative dong.
    LegalDongMapping,
    /// A road name or landmark keyword matched a district rule.
    LandmarkHeuristic,
    /// The district's configured default administrative dong.
    DistrictDefault,
    /// The district name with its suffix replaced by `동`.
    DistrictName,
    /// Nothing could be extracted.
    Unknown,
}

/// Canonical administrative neighborhood label.
///
/// `display` is what every other component shows and groups by. It is
/// never empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NeighborhoodLabel {
    /// District (`구`/`군`/`시`) name, or [`UNKNOWN_NEIGHBORHOOD`].
    pub district: String,
    /// Administrative dong, or [`UNKNOWN_NEIGHBORHOOD`].
    pub neighborhood: String,
    /// De-duplicated human-facing label.
    pub display: String,
    /// Tier that produced the neighborhood.
    pub tier: ResolutionTier,
}

impl NeighborhoodLabel {
    /// The label returned when no district can be extracted.
    #[must_use]
    pub fn unknown() -> Self {
        Self {
            district: UNKNOWN_NEIGHBORHOOD.to_string(),
            neighborhood: UNKNOWN_NEIGHBORHOOD.to_string(),
            display: UNKNOWN_NEIGHBORHOOD.to_string(),
            tier: ResolutionTier::Unknown,
        }
    }

    /// Whether this is the unknown sentinel label.
    #[must_use]
    pub fn is_unknown(&self) -> bool {
        self.tier == ResolutionTier::Unknown || self.display == UNKNOWN_NEIGHBORHOOD
    }
}

/// A per-district resolution table, deserialized from TOML.
///
/// Entries are ordered: the first matching legal dong or landmark rule
/// wins, so more specific keywords must come first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DistrictTable {
    /// Short city name (e.g. `"서울"`). `None` applies the table to any
    /// address naming this district.
    #[serde(default)]
    pub city: Option<String>,
    /// District name exactly as it appears in addresses (e.g. `"중구"`).
    pub district: String,
    /// Administrative dong used when nothing more specific matches,
    /// typically the one hosting the district office.
    #[serde(default)]
    pub default_dong: Option<String>,
    /// Legal (cadastral) dong → administrative dong.
    #[serde(default)]
    pub legal_dongs: Vec<LegalDongMapping>,
    /// Road-name and landmark rules.
    #[serde(default)]
    pub landmarks: Vec<LandmarkRule>,
}

impl DistrictTable {
    /// Registry key: `"<city> <district>"`, or just the district when the
    /// table is not tied to a city.
    #[must_use]
    pub fn id(&self) -> String {
        self.city.as_ref().map_or_else(
            || self.district.clone(),
            |city| format!("{city} {}", self.district),
        )
    }

    /// Administrative dong governing `legal`, if the table maps it.
    #[must_use]
    pub fn administrative_for(&self, legal: &str) -> Option<&str> {
        self.legal_dongs
            .iter()
            .find(|m| m.legal == legal)
            .map(|m| m.administrative.as_str())
    }
}

/// One legal dong and the administrative dong whose office governs it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegalDongMapping {
    /// Legal dong or numbered block (e.g. `"태평로1가"`).
    pub legal: String,
    /// Governing administrative dong (e.g. `"회현동"`).
    pub administrative: String,
}

/// A road-name/landmark rule: any keyword contained in the address maps to
/// `administrative`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LandmarkRule {
    /// Substrings to look for (e.g. `["세종대로", "시청"]`).
    pub keywords: Vec<String>,
    /// Administrative dong guessed when a keyword matches.
    pub administrative: String,
}

impl LandmarkRule {
    /// Whether any keyword occurs in `text`.
    #[must_use]
    pub fn matches(&self, text: &str) -> bool {
        self.keywords.iter().any(|k| text.contains(k.as_str()))
    }
}

/// Resolver settings from the `[resolver]` config section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolverConfig {
    /// Place names longer than this many characters are replaced by the
    /// resolved neighborhood.
    #[serde(default = "default_place_name_max_chars")]
    pub place_name_max_chars: usize,
    /// Extra district table files layered over the built-in ones.
    #[serde(default)]
    pub district_tables: Vec<PathBuf>,
}

const fn default_place_name_max_chars() -> usize {
    DEFAULT_PLACE_NAME_MAX_CHARS
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            place_name_max_chars: DEFAULT_PLACE_NAME_MAX_CHARS,
            district_tables: Vec::new(),
        }
    }
}

/// A place-search record as returned by the geocoder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaceSearchResult {
    /// Business, station or landmark name.
    #[serde(default)]
    pub place_name: String,
    /// Lot-number (jibun) address.
    #[serde(default)]
    pub address_name: String,
    /// Road-name address, when the geocoder has one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub road_address_name: Option<String>,
}

impl PlaceSearchResult {
    /// The address to store for a report: lot-number address first, then
    /// the road address, `None` when the geocoder returned neither.
    #[must_use]
    pub fn storable_address(&self) -> Option<&str> {
        let jibun = self.address_name.trim();
        if !jibun.is_empty() {
            return Some(jibun);
        }
        self.road_address_name
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn place(address_name: &str, road: Option<&str>) -> PlaceSearchResult {
        PlaceSearchResult {
            place_name: "시청역".to_string(),
            address_name: address_name.to_string(),
            road_address_name: road.map(str::to_string),
        }
    }

    #[test]
    fn storable_address_prefers_lot_number() {
        assert_eq!(
            place("서울 중구 태평로1가 31", Some("서울 중구 세종대로 110")).storable_address(),
            Some("서울 중구 태평로1가 31")
        );
        assert_eq!(
            place("  ", Some("서울 중구 세종대로 110")).storable_address(),
            Some("서울 중구 세종대로 110")
        );
        assert_eq!(place("", Some(" ")).storable_address(), None);
        assert_eq!(place("", None).storable_address(), None);
    }

    #[test]
    fn table_id_includes_city_when_present() {
        let mut table = DistrictTable {
            city: Some("서울".to_string()),
            district: "중구".to_string(),
            default_dong: None,
            legal_dongs: vec![LegalDongMapping {
                legal: "태평로1가".to_string(),
                administrative: "회현동".to_string(),
            }],
            landmarks: vec![],
        };
        assert_eq!(table.id(), "서울 중구");
        assert_eq!(table.administrative_for("태평로1가"), Some("회현동"));
        assert_eq!(table.administrative_for("태평로2가"), None);

        table.city = None;
        assert_eq!(table.id(), "중구");
    }

    #[test]
    fn unknown_label_is_unknown() {
        let label = NeighborhoodLabel::unknown();
        assert!(label.is_unknown());
        assert_eq!(label.display, UNKNOWN_NEIGHBORHOOD);
        assert_eq!(ResolutionTier::LegalDongMapping.as_ref(), "legal_dong_mapping");
    }
}
