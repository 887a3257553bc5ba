//! Short address labels and place/address splitting for stored report
//! addresses.
//!
//! Stored addresses come from several geocoder flows, so they show up in a
//! few shapes: `"롯데마트 부평점, 인천광역시 부평구 ..."`, road addresses with
//! a parenthesised building, or a landmark followed by an address.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Shown when a report has no usable address.
pub const ADDRESS_MISSING: &str = "주소 없음";

/// Shown in place of a place name when a report has no address at all.
pub const LOCATION_MISSING: &str = "위치 정보 없음";

static PROVINCE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(서울특별시|부산광역시|대구광역시|인천광역시|광주광역시|대전광역시|울산광역시|세종특별자치시|경기도|강원도|충청북도|충청남도|전라북도|전라남도|경상북도|경상남도|제주특별자치도)\s*",
    )
    .expect("valid regex")
});

/// `"롯데마트 부평점, 인천광역시 부평구 ..."`. A comma inside parentheses
/// belongs to [`BUILDING_RE`].
static COMMA_PLACE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([^,()]+),\s*(.+)$").expect("valid regex"));

/// `"서울특별시 강남구 테헤란로 123 (역삼동, ABC빌딩)"`
static BUILDING_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(.+?)\s*\(.*?([^,)]+빌딩|[^,)]+센터|[^,)]+타워|[^,)]+몰|[^,)]+마트|[^,)]+점)\).*$",
    )
    .expect("valid regex")
});

/// `"ABC빌딩 서울특별시 ..."`
static LEADING_PLACE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^([^가-힣]*(?:빌딩|센터|타워|몰|마트|점|역|학교|병원|은행|카페|식당))\s+(.+)$",
    )
    .expect("valid regex")
});

/// `"부평역 근처"`, `"강남구청 앞"`
static LANDMARK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(.*?(?:역|구청|시청|학교|병원|은행|마트|몰|점))\s+(.+)").expect("valid regex")
});

/// Lot numbers, bare region names and road names carry no place meaning.
static SIMPLE_ADDRESS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?:\d+번지?|[가-힣]+시|[가-힣]+구|[가-힣]+동|[가-힣]+로\s*\d*|\d+|[가-힣]+시\s+[가-힣]+구)$",
    )
    .expect("valid regex")
});

fn is_lot_number(token: &str) -> bool {
    !token.is_empty() && token.chars().all(|c| c.is_ascii_digit())
}

/// The last non-numeric token ending in `동`, `로` or `가`.
fn last_area_token(address: &str) -> Option<&str> {
    address
        .split_whitespace()
        .rev()
        .filter(|t| !is_lot_number(t))
        .find(|t| t.ends_with('동') || t.ends_with('로') || t.ends_with('가'))
}

/// Shortens an address to its most local administrative token
/// (`"서울 종로구 종로1가 54"` → `"종로1가"`, `"부평구 부개3동"` → `"부개3동"`).
///
/// Falls back to the last non-numeric token once province names are
/// removed, and to [`ADDRESS_MISSING`] for empty input.
#[must_use]
pub fn format_short_address(address: &str) -> String {
    let address = address.trim();
    if address.is_empty() || address == ADDRESS_MISSING {
        return ADDRESS_MISSING.to_string();
    }

    if let Some(token) = last_area_token(address) {
        return token.to_string();
    }

    let cleaned = PROVINCE_RE.replace_all(address, "");
    let mut tokens = cleaned.split_whitespace().rev().peekable();
    let last = tokens.peek().copied();
    tokens
        .find(|t| !is_lot_number(t))
        .or(last)
        .map_or_else(|| ADDRESS_MISSING.to_string(), ToString::to_string)
}

/// Whether two addresses shorten to the same administrative token.
#[must_use]
pub fn is_same_administrative_area(a: &str, b: &str) -> bool {
    format_short_address(a) == format_short_address(b)
}

/// Whether `text` is only an address fragment (lot number, bare `시`/`구`/
/// `동` name or road name) rather than a meaningful place name.
#[must_use]
pub fn is_simple_address(text: &str) -> bool {
    SIMPLE_ADDRESS_RE.is_match(text.trim())
}

/// A stored report address split for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationDisplay {
    /// Business, building or landmark name. Empty when none was found.
    pub place_name: String,
    /// Short administrative address.
    pub address: String,
    /// Whether the place name and address should be shown separately.
    pub show_separate: bool,
}

impl LocationDisplay {
    fn separate(place_name: &str, address: &str) -> Self {
        Self {
            place_name: place_name.trim().to_string(),
            address: format_short_address(address),
            show_separate: true,
        }
    }
}

/// Splits a stored report address into a place name and a short address.
///
/// Patterns are tried in order: comma-separated place, parenthesised
/// building, leading place name, landmark keyword. Addresses that match
/// none are shown whole as a short address.
#[must_use]
pub fn parse_report_location(address: Option<&str>) -> LocationDisplay {
    let Some(address) = address.filter(|a| !a.trim().is_empty()) else {
        return LocationDisplay {
            place_name: LOCATION_MISSING.to_string(),
            address: String::new(),
            show_separate: false,
        };
    };

    if let Some(caps) = COMMA_PLACE_RE.captures(address)
        && !is_simple_address(&caps[1])
    {
        return LocationDisplay::separate(&caps[1], &caps[2]);
    }

    if let Some(caps) = BUILDING_RE.captures(address) {
        return LocationDisplay::separate(&caps[2], &caps[1]);
    }

    if let Some(caps) = LEADING_PLACE_RE.captures(address) {
        return LocationDisplay::separate(&caps[1], &caps[2]);
    }

    if let Some(caps) = LANDMARK_RE.captures(address)
        && !is_simple_address(&caps[1])
    {
        return LocationDisplay::separate(&caps[1], &caps[2]);
    }

    LocationDisplay {
        place_name: String::new(),
        address: format_short_address(address),
        show_separate: false,
    }
}
