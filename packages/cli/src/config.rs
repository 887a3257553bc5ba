//! `dongne_map.toml` loading.
//!
//! Every section is optional. Missing sections and fields take the same
//! defaults the library crates use.

use std::path::{Path, PathBuf};

use dongne_map_cluster::ClusterConfig;
use dongne_map_neighborhood::{DistrictRegistry, NeighborhoodError};
use dongne_map_neighborhood_models::ResolverConfig;
use dongne_map_viewport_models::CoordinatorConfig;
use serde::Deserialize;
use thiserror::Error;

/// Looked up in the working directory when no path is given.
pub const DEFAULT_CONFIG_PATH: &str = "dongne_map.toml";

/// Errors that can occur while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("Failed to read {}: {source}", path.display())]
    Io {
        /// File that failed.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The config file is not valid TOML for the config schema.
    #[error("TOML error in {}: {source}", path.display())]
    Toml {
        /// File that failed.
        path: PathBuf,
        /// Parse error.
        source: toml::de::Error,
    },

    /// An extra district table failed to load.
    #[error(transparent)]
    Neighborhood(#[from] NeighborhoodError),
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub resolver: ResolverConfig,
    #[serde(default)]
    pub cluster: ClusterConfig,
    #[serde(default)]
    pub viewport: CoordinatorConfig,
}

impl Config {
    /// Loads `path`, or [`DEFAULT_CONFIG_PATH`] if it exists, or defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the chosen file can't be read or parsed.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = match path {
            Some(path) => path,
            None if Path::new(DEFAULT_CONFIG_PATH).is_file() => Path::new(DEFAULT_CONFIG_PATH),
            None => {
                log::debug!("No config file, using defaults");
                return Ok(Self::default());
            }
        };

        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::parse(&content).map_err(|source| ConfigError::Toml {
            path: path.to_path_buf(),
            source,
        })?;
        log::info!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Parses config TOML.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML doesn't match the config schema.
    pub fn parse(content: &str) -> Result<Self, toml::de::Error> {
        toml::de::from_str(content)
    }

    /// The built-in district tables with any extra tables layered on top.
    ///
    /// # Errors
    ///
    /// Returns an error if an extra table can't be loaded or conflicts with
    /// another extra table.
    pub fn district_registry(&self) -> Result<DistrictRegistry, ConfigError> {
        let registry = DistrictRegistry::builtin().clone();
        if self.resolver.district_tables.is_empty() {
            return Ok(registry);
        }

        let tables = self
            .resolver
            .district_tables
            .iter()
            .map(|path| DistrictRegistry::load_file(path))
            .collect::<Result<Vec<_>, _>>()?;
        log::info!("Loaded {} extra district tables", tables.len());

        Ok(registry.with_tables(tables)?)
    }
}
