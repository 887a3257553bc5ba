//! The neighborhood fallback chain.
//!
//! Tiers run in strict precedence order and the first one that produces a
//! neighborhood wins. Results are never merged across tiers.

use dongne_map_neighborhood_models::{
    DEFAULT_PLACE_NAME_MAX_CHARS, DistrictTable, NeighborhoodLabel, ResolutionTier,
};

use crate::normalize::{
    compose_display, district_as_dong, is_city_token, is_district_token, is_neighborhood_token,
    tokenize,
};
use crate::place::choose_display_name;
use crate::registry::DistrictRegistry;

/// Anything that can turn a free-text address into a [`NeighborhoodLabel`].
pub trait ResolveNeighborhood {
    /// Resolves `raw`, consulting `road_address` for the district when `raw`
    /// has none and for road-name heuristics.
    fn resolve(&self, raw: &str, road_address: Option<&str>) -> NeighborhoodLabel;
}

/// Resolves addresses against a [`DistrictRegistry`].
#[derive(Debug, Clone, Copy)]
pub struct NeighborhoodResolver<'a> {
    registry: &'a DistrictRegistry,
    place_name_max_chars: usize,
}

impl Default for NeighborhoodResolver<'static> {
    fn default() -> Self {
        Self::new(DistrictRegistry::builtin())
    }
}

impl<'a> NeighborhoodResolver<'a> {
    #[must_use]
    pub const fn new(registry: &'a DistrictRegistry) -> Self {
        Self {
            registry,
            place_name_max_chars: DEFAULT_PLACE_NAME_MAX_CHARS,
        }
    }

    /// Overrides the place-name length above which the neighborhood label is
    /// shown instead.
    #[must_use]
    pub const fn with_place_name_max_chars(mut self, max_chars: usize) -> Self {
        self.place_name_max_chars = max_chars;
        self
    }

    #[must_use]
    pub const fn registry(&self) -> &'a DistrictRegistry {
        self.registry
    }

    /// Picks between a searched place's own name and its resolved
    /// neighborhood. See [`choose_display_name`].
    #[must_use]
    pub fn best_display_name(
        &self,
        place_name: &str,
        raw_address: &str,
        road_address: Option<&str>,
    ) -> String {
        let label = self.resolve(raw_address, road_address);
        choose_display_name(place_name, &label, self.place_name_max_chars)
    }

    fn resolve_tokens(&self, raw: &str, road_address: Option<&str>) -> NeighborhoodLabel {
        let raw_tokens = tokenize(raw);

        // The district may only be recoverable from the road address. The
        // raw tokens are then scanned in full.
        let (located, rest) = match locate_district(&raw_tokens) {
            Some(located) => {
                let rest = &raw_tokens[located.next..];
                (located, rest)
            }
            None => {
                let Some(located) = road_address.map(tokenize).and_then(|t| locate_district(&t))
                else {
                    log::debug!("No district in {raw:?} / {road_address:?}");
                    return NeighborhoodLabel::unknown();
                };
                (located, raw_tokens.as_slice())
            }
        };

        let district = located.district;
        let table = self.registry.find(located.city.as_deref(), &district);
        if table.is_none() {
            log::debug!("No district table for {district}");
        }

        let (neighborhood, tier) = token_scan(rest, table)
            .map(|n| (n.to_string(), ResolutionTier::TokenScan))
            .or_else(|| {
                table
                    .and_then(|t| legal_dong_mapping(rest, t))
                    .map(|n| (n.to_string(), ResolutionTier::LegalDongMapping))
            })
            .or_else(|| {
                let text = road_address
                    .map(str::trim)
                    .filter(|r| !r.is_empty())
                    .map_or_else(|| rest.join(" "), ToString::to_string);
                table
                    .and_then(|t| landmark_heuristic(&text, t))
                    .map(|n| (n.to_string(), ResolutionTier::LandmarkHeuristic))
            })
            .unwrap_or_else(|| district_fallback(&district, table));

        log::debug!("Resolved {raw:?} to {district} {neighborhood} via {tier}");

        NeighborhoodLabel {
            display: compose_display(&district, &neighborhood),
            district,
            neighborhood,
            tier,
        }
    }
}

impl ResolveNeighborhood for NeighborhoodResolver<'_> {
    fn resolve(&self, raw: &str, road_address: Option<&str>) -> NeighborhoodLabel {
        self.resolve_tokens(raw, road_address)
    }
}

struct LocatedDistrict {
    city: Option<String>,
    district: String,
    /// Index of the first token after the district.
    next: usize,
}

/// Finds the city and district tokens.
///
/// A city/province token is followed by its district. Without one, the
/// first `구`/`군` token is the district.
fn locate_district(tokens: &[&str]) -> Option<LocatedDistrict> {
    for (idx, token) in tokens.iter().enumerate() {
        if is_city_token(token) {
            return tokens.get(idx + 1).map(|district| LocatedDistrict {
                city: Some((*token).to_string()),
                district: (*district).to_string(),
                next: idx + 2,
            });
        }
        if is_district_token(token) {
            return Some(LocatedDistrict {
                city: None,
                district: (*token).to_string(),
                next: idx + 1,
            });
        }
    }
    None
}

/// Tier 1: the first administrative dong or legacy block token.
///
/// Legal dongs the district table maps to a different administrative dong
/// are left for [`legal_dong_mapping`].
fn token_scan<'t>(tokens: &[&'t str], table: Option<&DistrictTable>) -> Option<&'t str> {
    tokens.iter().copied().find(|token| {
        is_neighborhood_token(token)
            && table
                .and_then(|t| t.administrative_for(token))
                .is_none_or(|administrative| administrative == *token)
    })
}

/// Tier 2: exact legal dong tokens in address order, then legal dong
/// substrings in table order.
fn legal_dong_mapping<'t>(tokens: &[&str], table: &'t DistrictTable) -> Option<&'t str> {
    if let Some(administrative) = tokens.iter().find_map(|t| table.administrative_for(t)) {
        return Some(administrative);
    }

    let remainder = tokens.join(" ");
    table
        .legal_dongs
        .iter()
        .find(|m| remainder.contains(m.legal.as_str()))
        .map(|m| m.administrative.as_str())
}

/// Tier 3: the first landmark rule with a keyword in `text`.
fn landmark_heuristic<'t>(text: &str, table: &'t DistrictTable) -> Option<&'t str> {
    table
        .landmarks
        .iter()
        .find(|rule| rule.matches(text))
        .map(|rule| rule.administrative.as_str())
}

/// Tier 4: the table's default dong, or the district name as a dong.
fn district_fallback(district: &str, table: Option<&DistrictTable>) -> (String, ResolutionTier) {
    table
        .and_then(|t| t.default_dong.clone())
        .map_or_else(
            || (district_as_dong(district), ResolutionTier::DistrictName),
            |dong| (dong, ResolutionTier::DistrictDefault),
        )
}
