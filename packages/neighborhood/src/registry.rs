//! Compile-time registry of per-district resolution tables.
//!
//! Each entry is a `(name, toml_content)` pair embedded via `include_str!`.
//! Supporting a new district requires creating a TOML file in `districts/`
//! and adding a corresponding entry here. Extra tables can be layered on at
//! runtime with [`DistrictRegistry::with_tables`].

use std::collections::BTreeSet;
use std::path::Path;
use std::sync::LazyLock;

use dongne_map_neighborhood_models::DistrictTable;

use crate::NeighborhoodError;
use crate::normalize::canonical_city;

/// Number of built-in district tables. Updated when new tables are added.
/// Enforced by a test.
#[cfg(test)]
const EXPECTED_TABLE_COUNT: usize = 6;

/// Embedded TOML district tables.
const DISTRICT_TOMLS: &[(&str, &str)] = &[
    ("seoul_junggu", include_str!("../districts/seoul_junggu.toml")),
    ("seoul_jongno", include_str!("../districts/seoul_jongno.toml")),
    (
        "seoul_gangnam",
        include_str!("../districts/seoul_gangnam.toml"),
    ),
    ("seoul_seocho", include_str!("../districts/seoul_seocho.toml")),
    ("seoul_mapo", include_str!("../districts/seoul_mapo.toml")),
    (
        "seoul_yongsan",
        include_str!("../districts/seoul_yongsan.toml"),
    ),
];

static BUILTIN: LazyLock<DistrictRegistry> =
    LazyLock::new(|| DistrictRegistry::new(builtin_tables()));

/// Returns all built-in district tables.
///
/// # Panics
///
/// Panics if any embedded TOML file fails to parse. Since these are
/// compile-time constants, parse failures indicate a development error
/// and are caught during CI.
#[must_use]
pub fn builtin_tables() -> Vec<DistrictTable> {
    DISTRICT_TOMLS
        .iter()
        .map(|(name, toml_str)| {
            toml::de::from_str(toml_str)
                .unwrap_or_else(|e| panic!("Failed to parse district table '{name}': {e}"))
        })
        .collect()
}

/// Parses and validates a single district table.
///
/// # Errors
///
/// Returns an error if the TOML is malformed or the table fails
/// [`validate_table`].
pub fn parse_table(toml_str: &str) -> Result<DistrictTable, NeighborhoodError> {
    let table: DistrictTable = toml::de::from_str(toml_str)?;
    validate_table(&table)?;
    Ok(table)
}

/// Checks that a table has the fields resolution relies on.
///
/// # Errors
///
/// Returns [`NeighborhoodError::InvalidTable`] for an empty district name,
/// empty dong names, or landmark rules without keywords.
pub fn validate_table(table: &DistrictTable) -> Result<(), NeighborhoodError> {
    let invalid = |message: String| NeighborhoodError::InvalidTable {
        district: table.id(),
        message,
    };

    if table.district.trim().is_empty() {
        return Err(invalid("empty district name".to_string()));
    }
    if table
        .default_dong
        .as_deref()
        .is_some_and(|d| d.trim().is_empty())
    {
        return Err(invalid("empty default_dong".to_string()));
    }
    for mapping in &table.legal_dongs {
        if mapping.legal.trim().is_empty() || mapping.administrative.trim().is_empty() {
            return Err(invalid(format!(
                "legal dong mapping '{}' -> '{}' has an empty side",
                mapping.legal, mapping.administrative
            )));
        }
    }
    for (idx, rule) in table.landmarks.iter().enumerate() {
        if rule.administrative.trim().is_empty() {
            return Err(invalid(format!("landmark rule #{idx} has no administrative dong")));
        }
        if rule.keywords.is_empty() || rule.keywords.iter().any(|k| k.trim().is_empty()) {
            return Err(invalid(format!("landmark rule #{idx} has an empty keyword")));
        }
    }
    Ok(())
}

/// District tables indexed for lookup by `(city, district)`.
#[derive(Debug, Clone, Default)]
pub struct DistrictRegistry {
    tables: Vec<DistrictTable>,
}

impl DistrictRegistry {
    /// Builds a registry from already-validated tables.
    #[must_use]
    pub const fn new(tables: Vec<DistrictTable>) -> Self {
        Self { tables }
    }

    /// The shared registry of built-in tables.
    #[must_use]
    pub fn builtin() -> &'static Self {
        &BUILTIN
    }

    /// Reads and validates a district table file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file can't be read or isn't a valid table.
    pub fn load_file(path: &Path) -> Result<DistrictTable, NeighborhoodError> {
        let content = std::fs::read_to_string(path).map_err(|source| NeighborhoodError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let table = parse_table(&content)?;
        log::debug!(
            "Loaded district table {} from {}",
            table.id(),
            path.display()
        );
        Ok(table)
    }

    /// Layers `extra` tables over this registry. An extra table replaces an
    /// existing one with the same [`DistrictTable::id`].
    ///
    /// # Errors
    ///
    /// Returns an error if an extra table is invalid or two extra tables
    /// share an id.
    pub fn with_tables(mut self, extra: Vec<DistrictTable>) -> Result<Self, NeighborhoodError> {
        let mut seen = BTreeSet::new();
        for table in extra {
            validate_table(&table)?;
            let id = table.id();
            if !seen.insert(id.clone()) {
                return Err(NeighborhoodError::DuplicateDistrict { id });
            }
            if let Some(existing) = self.tables.iter_mut().find(|t| t.id() == id) {
                log::warn!("District table {id} overrides the built-in table");
                *existing = table;
            } else {
                self.tables.push(table);
            }
        }
        Ok(self)
    }

    /// All registered tables in registration order.
    #[must_use]
    pub fn tables(&self) -> &[DistrictTable] {
        &self.tables
    }

    /// Finds the table for `district`.
    ///
    /// A table tied to the address's city wins over a city-less table. An
    /// address without a city token matches any table for the district.
    #[must_use]
    pub fn find(&self, city: Option<&str>, district: &str) -> Option<&DistrictTable> {
        let city = city.map(canonical_city);
        let mut candidates = self.tables.iter().filter(|t| t.district == district);

        match city {
            Some(city) => {
                let mut fallback = None;
                for table in candidates {
                    match table.city.as_deref() {
                        Some(table_city) if table_city == city => return Some(table),
                        None if fallback.is_none() => fallback = Some(table),
                        _ => {}
                    }
                }
                fallback
            }
            None => candidates.next(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loads_all_tables() {
        let tables = builtin_tables();
        assert_eq!(
            tables.len(),
            EXPECTED_TABLE_COUNT,
            "Expected {EXPECTED_TABLE_COUNT} district tables, found {}. \
             Update EXPECTED_TABLE_COUNT after adding/removing tables.",
            tables.len()
        );
    }

    #[test]
    fn table_ids_are_unique() {
        let mut seen = BTreeSet::new();
        for table in &builtin_tables() {
            assert!(
                seen.insert(table.id()),
                "Duplicate district table: {}",
                table.id()
            );
        }
    }

    #[test]
    fn all_tables_are_valid() {
        for table in &builtin_tables() {
            validate_table(table).unwrap();
            assert!(
                table.default_dong.is_some(),
                "Table {} has no default dong",
                table.id()
            );
        }
    }

    #[test]
    fn legal_dongs_are_unique_within_a_table() {
        for table in &builtin_tables() {
            let mut seen = BTreeSet::new();
            for mapping in &table.legal_dongs {
                assert!(
                    seen.insert(&mapping.legal),
                    "Table {} maps {} twice",
                    table.id(),
                    mapping.legal
                );
            }
        }
    }

    #[test]
    fn finds_table_by_city_and_district() {
        let registry = DistrictRegistry::builtin();
        let table = registry.find(Some("서울특별시"), "중구").unwrap();
        assert_eq!(table.default_dong.as_deref(), Some("회현동"));
        assert!(registry.find(Some("서울"), "중구").is_some());
        assert!(registry.find(None, "중구").is_some());
        assert!(registry.find(Some("인천"), "중구").is_none());
        assert!(registry.find(Some("인천"), "부평구").is_none());
    }

    #[test]
    fn extra_table_overrides_builtin() {
        let extra = parse_table(
            r#"
            city = "서울"
            district = "중구"
            default_dong = "명동"
            "#,
        )
        .unwrap();
        let registry = DistrictRegistry::builtin()
            .clone()
            .with_tables(vec![extra])
            .unwrap();

        assert_eq!(registry.tables().len(), EXPECTED_TABLE_COUNT);
        let table = registry.find(Some("서울"), "중구").unwrap();
        assert_eq!(table.default_dong.as_deref(), Some("명동"));
    }

    #[test]
    fn city_less_table_is_a_fallback() {
        let incheon = parse_table(
            r#"
            district = "부평구"
            default_dong = "부평1동"
            "#,
        )
        .unwrap();
        let registry = DistrictRegistry::default().with_tables(vec![incheon]).unwrap();
        assert!(registry.find(Some("인천광역시"), "부평구").is_some());
        assert!(registry.find(None, "부평구").is_some());
    }

    #[test]
    fn rejects_duplicate_extra_tables() {
        let table = parse_table("district = \"부평구\"").unwrap();
        let err = DistrictRegistry::default()
            .with_tables(vec![table.clone(), table])
            .unwrap_err();
        assert!(matches!(err, NeighborhoodError::DuplicateDistrict { .. }));
    }

    #[test]
    fn rejects_landmark_without_keywords() {
        let err = parse_table(
            r#"
            district = "부평구"

            [[landmarks]]
            keywords = []
            administrative = "부평1동"
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, NeighborhoodError::InvalidTable { .. }));
    }

    #[test]
    fn rejects_malformed_toml() {
        let err = parse_table("district = ").unwrap_err();
        assert!(matches!(err, NeighborhoodError::Toml(_)));
    }

    #[test]
    fn missing_file_error_names_the_path() {
        let err = DistrictRegistry::load_file(Path::new("/nonexistent/incheon_bupyeong.toml"))
            .unwrap_err();
        assert!(matches!(err, NeighborhoodError::Io { .. }));
        assert!(
            err.to_string()
                .starts_with("Failed to read /nonexistent/incheon_bupyeong.toml: ")
        );
    }
}
