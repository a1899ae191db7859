//! Configuration for a geo-indexed table.
//!
//! `Config` is a plain serializable value. Defaults are applied per field at
//! deserialization time and by [`Config::new`]; the store client is attached
//! separately through [`crate::GeoTableBuilder`].

use crate::error::{GeoKvError, Result};
use serde::de::Error;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// What a scan does when the store fails a page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ScanErrorPolicy {
    /// Log the failure, keep the pages already fetched and let sibling scans finish.
    /// Failures are counted in [`crate::QueryStats::failed_scans`].
    #[default]
    BestEffort,
    /// Abort the whole query with the first store error.
    FailFast,
}

/// S2 region coverer parameters.
///
/// `min_level` must equal `max_level` so that every covering cell sits at the
/// level whose child ranges contain the leaf identifiers written by `put_point`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CovererConfig {
    /// Coarsest cell level (0-30). Level 10 cells are ~100 km² at the equator.
    #[serde(default = "CovererConfig::default_level")]
    pub min_level: u8,

    /// Finest cell level (0-30).
    #[serde(default = "CovererConfig::default_level")]
    pub max_level: u8,

    /// Soft upper bound on cells per covering.
    #[serde(default = "CovererConfig::default_max_cells")]
    pub max_cells: usize,

    /// Level step between `min_level` and `max_level`. 0 means every level.
    #[serde(default)]
    pub level_mod: u8,
}

impl CovererConfig {
    pub const MAX_LEVEL: u8 = 30;

    const fn default_level() -> u8 {
        10
    }

    const fn default_max_cells() -> usize {
        10
    }

    /// Coverer pinned to a single level.
    pub fn at_level(level: u8, max_cells: usize) -> Self {
        Self {
            min_level: level,
            max_level: level,
            max_cells,
            level_mod: 0,
        }
    }

    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.min_level != self.max_level {
            return Err(format!(
                "Coverer min_level ({}) must equal max_level ({})",
                self.min_level, self.max_level
            ));
        }
        if self.max_level > Self::MAX_LEVEL {
            return Err(format!(
                "Coverer level must be at most {}, got {}",
                Self::MAX_LEVEL,
                self.max_level
            ));
        }
        if self.max_cells == 0 {
            return Err("Coverer max_cells must be greater than zero".to_string());
        }
        Ok(())
    }
}

impl Default for CovererConfig {
    fn default() -> Self {
        Self::at_level(Self::default_level(), Self::default_max_cells())
    }
}

/// Table and indexing configuration.
///
/// # Example
///
/// ```rust
/// use geokv::Config;
///
/// let config = Config::new("coffee-shops").with_hash_key_length(5);
/// assert_eq!(config.hash_key_attribute_name, "hashKey");
/// assert!(config.validate().is_ok());
///
/// let json = r#"{ "table_name": "coffee-shops", "longitude_first": false }"#;
/// let config = Config::from_json(json).unwrap();
/// assert_eq!(config.hash_key_length, 2);
/// assert!(!config.longitude_first);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    pub table_name: String,

    #[serde(default = "Config::default_hash_key_attribute_name")]
    pub hash_key_attribute_name: String,

    #[serde(default = "Config::default_range_key_attribute_name")]
    pub range_key_attribute_name: String,

    #[serde(default = "Config::default_geo_hash_attribute_name")]
    pub geo_hash_attribute_name: String,

    #[serde(default = "Config::default_geo_json_attribute_name")]
    pub geo_json_attribute_name: String,

    #[serde(default = "Config::default_geo_hash_index_name")]
    pub geo_hash_index_name: String,

    /// Number of leading decimal digits of the geohash kept as the partition key.
    /// Must not change once data has been written.
    #[serde(default = "Config::default_hash_key_length")]
    pub hash_key_length: u8,

    /// Store `[lng, lat]` in the geoJson attribute instead of `[lat, lng]`.
    #[serde(default = "Config::default_longitude_first")]
    pub longitude_first: bool,

    #[serde(default)]
    pub consistent_read: bool,

    #[serde(default)]
    pub scan_error_policy: ScanErrorPolicy,

    /// Worker threads a query scans with.
    #[serde(default = "Config::default_max_concurrent_scans")]
    pub max_concurrent_scans: usize,

    /// Largest number of partition-scoped ranges one query may plan.
    /// Queries above it fail with a configuration error before any store request.
    #[serde(default = "Config::default_max_partition_ranges")]
    pub max_partition_ranges: usize,

    #[serde(default)]
    pub coverer: CovererConfig,
}

impl Config {
    /// Widest partition key that still fits a `u64` geohash.
    pub const MAX_HASH_KEY_LENGTH: u8 = 19;

    /// Above this many digits a level-10 cell spans dozens of partitions.
    pub const WIDE_HASH_KEY_LENGTH: u8 = 8;

    fn default_hash_key_attribute_name() -> String {
        "hashKey".to_string()
    }

    fn default_range_key_attribute_name() -> String {
        "rangeKey".to_string()
    }

    fn default_geo_hash_attribute_name() -> String {
        "geohash".to_string()
    }

    fn default_geo_json_attribute_name() -> String {
        "geoJson".to_string()
    }

    fn default_geo_hash_index_name() -> String {
        "geohash-index".to_string()
    }

    const fn default_hash_key_length() -> u8 {
        2
    }

    const fn default_longitude_first() -> bool {
        true
    }

    const fn default_max_concurrent_scans() -> usize {
        16
    }

    const fn default_max_partition_ranges() -> usize {
        1_000
    }

    /// Configuration for `table_name` with every other field at its default.
    pub fn new(table_name: impl Into<String>) -> Self {
        Self {
            table_name: table_name.into(),
            hash_key_attribute_name: Self::default_hash_key_attribute_name(),
            range_key_attribute_name: Self::default_range_key_attribute_name(),
            geo_hash_attribute_name: Self::default_geo_hash_attribute_name(),
            geo_json_attribute_name: Self::default_geo_json_attribute_name(),
            geo_hash_index_name: Self::default_geo_hash_index_name(),
            hash_key_length: Self::default_hash_key_length(),
            longitude_first: Self::default_longitude_first(),
            consistent_read: false,
            scan_error_policy: ScanErrorPolicy::default(),
            max_concurrent_scans: Self::default_max_concurrent_scans(),
            max_partition_ranges: Self::default_max_partition_ranges(),
            coverer: CovererConfig::default(),
        }
    }

    pub fn with_table_name(mut self, table_name: impl Into<String>) -> Self {
        self.table_name = table_name.into();
        self
    }

    pub fn with_hash_key_attribute_name(mut self, name: impl Into<String>) -> Self {
        self.hash_key_attribute_name = name.into();
        self
    }

    pub fn with_range_key_attribute_name(mut self, name: impl Into<String>) -> Self {
        self.range_key_attribute_name = name.into();
        self
    }

    pub fn with_geo_hash_attribute_name(mut self, name: impl Into<String>) -> Self {
        self.geo_hash_attribute_name = name.into();
        self
    }

    pub fn with_geo_json_attribute_name(mut self, name: impl Into<String>) -> Self {
        self.geo_json_attribute_name = name.into();
        self
    }

    pub fn with_geo_hash_index_name(mut self, name: impl Into<String>) -> Self {
        self.geo_hash_index_name = name.into();
        self
    }

    pub fn with_hash_key_length(mut self, length: u8) -> Self {
        self.hash_key_length = length;
        self
    }

    pub fn with_longitude_first(mut self, longitude_first: bool) -> Self {
        self.longitude_first = longitude_first;
        self
    }

    pub fn with_consistent_read(mut self, consistent_read: bool) -> Self {
        self.consistent_read = consistent_read;
        self
    }

    pub fn with_coverer(mut self, coverer: CovererConfig) -> Self {
        self.coverer = coverer;
        self
    }

    pub fn with_scan_error_policy(mut self, policy: ScanErrorPolicy) -> Self {
        self.scan_error_policy = policy;
        self
    }

    pub fn with_max_concurrent_scans(mut self, workers: usize) -> Self {
        self.max_concurrent_scans = workers;
        self
    }

    pub fn with_max_partition_ranges(mut self, max_ranges: usize) -> Self {
        self.max_partition_ranges = max_ranges;
        self
    }

    /// Attribute names the library owns on every stored item.
    pub fn reserved_attribute_names(&self) -> [&str; 4] {
        [
            &self.hash_key_attribute_name,
            &self.range_key_attribute_name,
            &self.geo_hash_attribute_name,
            &self.geo_json_attribute_name,
        ]
    }

    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.table_name.is_empty() {
            return Err("Table name is required".to_string());
        }
        if self.geo_hash_index_name.is_empty() {
            return Err("Geohash index name cannot be empty".to_string());
        }

        let names = self.reserved_attribute_names();
        for (i, name) in names.iter().enumerate() {
            if name.is_empty() {
                return Err("Attribute names cannot be empty".to_string());
            }
            if names[..i].contains(name) {
                return Err(format!("Attribute name '{}' is used twice", name));
            }
        }

        if !(1..=Self::MAX_HASH_KEY_LENGTH).contains(&self.hash_key_length) {
            return Err(format!(
                "Hash key length must be between 1 and {}, got {}",
                Self::MAX_HASH_KEY_LENGTH,
                self.hash_key_length
            ));
        }
        if self.hash_key_length > Self::WIDE_HASH_KEY_LENGTH {
            log::warn!(
                "Hash key length {} splits every covering cell into many partitions; \
                queries may exceed max_partition_ranges ({})",
                self.hash_key_length,
                self.max_partition_ranges
            );
        }
        if self.max_concurrent_scans == 0 {
            return Err("max_concurrent_scans must be greater than zero".to_string());
        }
        if self.max_partition_ranges == 0 {
            return Err("max_partition_ranges must be greater than zero".to_string());
        }

        self.coverer.validate()
    }

    pub fn from_json(json: &str) -> std::result::Result<Self, serde_json::Error> {
        let config: Config = serde_json::from_str(json)?;
        if let Err(e) = config.validate() {
            return Err(serde_json::Error::custom(e));
        }
        Ok(config)
    }

    pub fn to_json(&self) -> std::result::Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    #[cfg(feature = "toml")]
    pub fn from_toml(toml_str: &str) -> std::result::Result<Self, toml::de::Error> {
        let config: Config = toml::from_str(toml_str)?;
        if let Err(e) = config.validate() {
            return Err(toml::de::Error::custom(e));
        }
        Ok(config)
    }

    #[cfg(feature = "toml")]
    pub fn to_toml(&self) -> std::result::Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    /// Load a configuration file. `.toml` files need the `toml` feature;
    /// anything else is parsed as JSON.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;

        match path.extension().and_then(|ext| ext.to_str()) {
            #[cfg(feature = "toml")]
            Some("toml") => Self::from_toml(&content).map_err(|e| {
                GeoKvError::Config(format!("{}: {}", path.display(), e))
            }),
            #[cfg(not(feature = "toml"))]
            Some("toml") => Err(GeoKvError::Config(format!(
                "{}: TOML support requires the `toml` feature",
                path.display()
            ))),
            _ => Self::from_json(&content)
                .map_err(|e| GeoKvError::Config(format!("{}: {}", path.display(), e))),
        }
    }
}

impl Default for Config {
    /// Defaults with an empty table name; `validate` rejects it until one is set.
    fn default() -> Self {
        Self::new(String::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = Config::new("points");
        assert_eq!(config.hash_key_attribute_name, "hashKey");
        assert_eq!(config.range_key_attribute_name, "rangeKey");
        assert_eq!(config.geo_hash_attribute_name, "geohash");
        assert_eq!(config.geo_json_attribute_name, "geoJson");
        assert_eq!(config.geo_hash_index_name, "geohash-index");
        assert_eq!(config.hash_key_length, 2);
        assert!(config.longitude_first);
        assert!(!config.consistent_read);
        assert_eq!(config.coverer, CovererConfig::at_level(10, 10));
        assert_eq!(config.scan_error_policy, ScanErrorPolicy::BestEffort);
        assert_eq!(config.max_concurrent_scans, 16);
        assert_eq!(config.max_partition_ranges, 1_000);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_default_requires_table_name() {
        let config = Config::default();
        assert!(config.validate().is_err());
        assert!(config.with_table_name("points").validate().is_ok());
    }

    #[test]
    fn test_config_serialization() {
        let config = Config::new("points")
            .with_hash_key_length(4)
            .with_longitude_first(false)
            .with_scan_error_policy(ScanErrorPolicy::FailFast);

        let json = config.to_json().unwrap();
        let deserialized = Config::from_json(&json).unwrap();
        assert_eq!(deserialized, config);
    }

    #[test]
    fn test_from_json_applies_defaults() {
        let config = Config::from_json(r#"{"table_name": "t", "consistent_read": true}"#).unwrap();
        assert!(config.consistent_read);
        assert_eq!(config.geo_json_attribute_name, "geoJson");
        assert_eq!(config.coverer.max_cells, 10);
    }

    #[test]
    fn test_from_json_rejects_missing_table_name() {
        assert!(Config::from_json(r#"{"hash_key_length": 3}"#).is_err());
        assert!(Config::from_json(r#"{"table_name": ""}"#).is_err());
    }

    #[test]
    fn test_from_json_rejects_unknown_fields() {
        assert!(Config::from_json(r#"{"table_name": "t", "geohash_precision": 8}"#).is_err());
    }

    #[test]
    fn test_hash_key_length_bounds() {
        assert!(Config::new("t").with_hash_key_length(0).validate().is_err());
        assert!(Config::new("t").with_hash_key_length(1).validate().is_ok());
        assert!(Config::new("t").with_hash_key_length(19).validate().is_ok());
        assert!(Config::new("t").with_hash_key_length(20).validate().is_err());
    }

    #[test]
    fn test_fan_out_limits_must_be_positive() {
        let config = Config::new("t").with_max_concurrent_scans(0);
        assert!(config.validate().unwrap_err().contains("max_concurrent_scans"));
        let config = Config::new("t").with_max_partition_ranges(0);
        assert!(config.validate().unwrap_err().contains("max_partition_ranges"));

        let json = r#"{"table_name": "t", "max_concurrent_scans": 0}"#;
        assert!(Config::from_json(json).is_err());
        let json = r#"{"table_name": "t", "max_concurrent_scans": 4, "max_partition_ranges": 64}"#;
        let config = Config::from_json(json).unwrap();
        assert_eq!(config.max_concurrent_scans, 4);
        assert_eq!(config.max_partition_ranges, 64);
    }

    #[test]
    fn test_duplicate_attribute_names_rejected() {
        let config = Config::new("t").with_geo_hash_attribute_name("hashKey");
        let err = config.validate().unwrap_err();
        assert!(err.contains("hashKey"));
    }

    #[test]
    fn test_coverer_levels_must_match() {
        let coverer = CovererConfig {
            min_level: 8,
            max_level: 12,
            max_cells: 10,
            level_mod: 0,
        };
        assert!(coverer.validate().is_err());
        assert!(Config::new("t").with_coverer(coverer).validate().is_err());
        assert!(CovererConfig::at_level(31, 10).validate().is_err());
        assert!(CovererConfig::at_level(12, 0).validate().is_err());
    }

    #[test]
    fn test_scan_error_policy_serde_names() {
        let json = serde_json::to_string(&ScanErrorPolicy::FailFast).unwrap();
        assert_eq!(json, "\"fail_fast\"");
    }
}
