//! Token classification and label normalization for Korean addresses.
//!
//! Geocoder addresses are space-separated administrative tokens
//! (`"서울 중구 태평로1가 1"`). These helpers recognize which token is the
//! city, the district, and a neighborhood, and build the de-duplicated
//! display label.

use regex::Regex;
use std::sync::LazyLock;

/// Administrative dong token ending in `동` (`"부개3동"`, `"역삼동"`,
/// `"종로1.2.3.4가동"`, `"101동"`).
static DONG_TOKEN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[\p{Hangul}\d][\p{Hangul}\d.·]*동$").expect("valid regex"));

/// Legacy numbered/lettered block token (`"태평로1가"`, `"명동2가"`).
static BLOCK_TOKEN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\p{Hangul}+\d*가$").expect("valid regex"));

/// Numbered administrative dong (`"부개3동"`).
static NUMBERED_DONG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+동$").expect("valid regex"));

/// Subway line suffixes (`"1호선"`, `"2호"`).
static SUBWAY_LINE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+호선?").expect("valid regex"));

/// `"지하철"` / `"지하"` noise words.
static SUBWAY_WORD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"지하철?").expect("valid regex"));

/// Short names of metropolitan cities and provinces as geocoders print them.
const CITY_SHORT_NAMES: &[&str] = &[
    "서울", "부산", "대구", "인천", "광주", "대전", "울산", "세종", "경기", "강원", "충북", "충남",
    "전북", "전남", "경북", "경남", "제주",
];

/// Suffixes stripped from a city token to get its short name. Longest first.
const CITY_SUFFIXES: &[&str] = &[
    "특별자치시",
    "특별자치도",
    "특별시",
    "광역시",
    "시",
    "도",
];

/// Splits an address into tokens, dropping surrounding punctuation.
#[must_use]
pub fn tokenize(text: &str) -> Vec<&str> {
    text.split_whitespace()
        .map(|t| t.trim_matches(|c: char| matches!(c, ',' | '(' | ')' | '[' | ']' | '"' | '\'')))
        .filter(|t| !t.is_empty())
        .collect()
}

/// Whether `token` names a metropolitan city or province.
#[must_use]
pub fn is_city_token(token: &str) -> bool {
    CITY_SHORT_NAMES.contains(&token)
        || (token.chars().count() >= 2 && (token.ends_with('시') || token.ends_with('도')))
}

/// Whether `token` looks like a district (`구`/`군`).
#[must_use]
pub fn is_district_token(token: &str) -> bool {
    token.chars().count() >= 2 && (token.ends_with('구') || token.ends_with('군'))
}

/// Whether `token` is an administrative dong or a legacy block name.
#[must_use]
pub fn is_neighborhood_token(token: &str) -> bool {
    DONG_TOKEN_RE.is_match(token) || BLOCK_TOKEN_RE.is_match(token)
}

/// Whether a resolved neighborhood is a numbered dong or a lettered block,
/// which local users find more informative than a place name.
#[must_use]
pub fn is_numbered_neighborhood(neighborhood: &str) -> bool {
    NUMBERED_DONG_RE.is_match(neighborhood) || neighborhood.ends_with('가')
}

/// Short city name used to match district tables
/// (`"서울특별시"` → `"서울"`, `"경기도"` → `"경기"`).
#[must_use]
pub fn canonical_city(token: &str) -> &str {
    if CITY_SHORT_NAMES.contains(&token) {
        return token;
    }
    CITY_SUFFIXES
        .iter()
        .find_map(|suffix| token.strip_suffix(suffix))
        .filter(|s| !s.is_empty())
        .unwrap_or(token)
}

/// District name without its trailing `구`/`군`.
#[must_use]
pub fn district_stem(district: &str) -> &str {
    district
        .strip_suffix('구')
        .or_else(|| district.strip_suffix('군'))
        .unwrap_or(district)
}

/// The district name turned into a dong name by replacing its `구`/`군`
/// suffix. Districts with any other suffix are returned unchanged.
#[must_use]
pub fn district_as_dong(district: &str) -> String {
    let stem = district_stem(district);
    if stem.len() == district.len() {
        district.to_string()
    } else {
        format!("{stem}동")
    }
}

/// Collapses runs of whitespace into single spaces and trims.
#[must_use]
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Builds the display label for a district/neighborhood pair.
///
/// The district is omitted when the neighborhood already carries the
/// district stem (`서초구` + `서초2동` → `"서초2동"`). Single-syllable stems
/// (`중`, `동`, `서`) are directional and never count as carried.
#[must_use]
pub fn compose_display(district: &str, neighborhood: &str) -> String {
    let stem = district_stem(district);
    if stem.chars().count() >= 2 && neighborhood.contains(stem) {
        collapse_whitespace(neighborhood)
    } else {
        collapse_whitespace(&format!("{district} {neighborhood}"))
    }
}

/// Cleans a free-text neighborhood name: drops subway line and `지하철`
/// noise and collapses whitespace.
#[must_use]
pub fn normalize_neighborhood_name(name: &str) -> String {
    let without_lines = SUBWAY_LINE_RE.replace_all(name, "");
    let without_subway = SUBWAY_WORD_RE.replace_all(&without_lines, "");
    collapse_whitespace(&without_subway)
}
