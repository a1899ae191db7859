//! Table builder
//!
//! Assembles a [`GeoTable`] from a configuration and a store handle,
//! applying defaults and validating everything before any I/O.

use crate::config::{Config, CovererConfig, ScanErrorPolicy};
use crate::db::GeoTable;
use crate::error::{GeoKvError, Result};
use crate::storage::GeoStore;
use std::sync::Arc;

/// Builder for [`GeoTable`].
///
/// The table name and the store are required; every other setting falls back
/// to its [`Config`] default.
pub struct GeoTableBuilder<S: GeoStore + ?Sized = dyn GeoStore> {
    config: Config,
    store: Option<Arc<S>>,
}

impl<S: GeoStore + ?Sized> GeoTableBuilder<S> {
    /// Create a new builder with default configuration and no store.
    pub fn new() -> Self {
        Self {
            config: Config::default(),
            store: None,
        }
    }

    /// Replace the whole configuration (for example one loaded from a file).
    pub fn config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    pub fn table_name(mut self, table_name: impl Into<String>) -> Self {
        self.config = self.config.with_table_name(table_name);
        self
    }

    /// Set the store client shared by every operation on the table.
    pub fn store(mut self, store: Arc<S>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn hash_key_attribute_name(mut self, name: impl Into<String>) -> Self {
        self.config = self.config.with_hash_key_attribute_name(name);
        self
    }

    pub fn range_key_attribute_name(mut self, name: impl Into<String>) -> Self {
        self.config = self.config.with_range_key_attribute_name(name);
        self
    }

    pub fn geo_hash_attribute_name(mut self, name: impl Into<String>) -> Self {
        self.config = self.config.with_geo_hash_attribute_name(name);
        self
    }

    pub fn geo_json_attribute_name(mut self, name: impl Into<String>) -> Self {
        self.config = self.config.with_geo_json_attribute_name(name);
        self
    }

    pub fn geo_hash_index_name(mut self, name: impl Into<String>) -> Self {
        self.config = self.config.with_geo_hash_index_name(name);
        self
    }

    /// Number of leading geohash digits used as the partition key.
    pub fn hash_key_length(mut self, length: u8) -> Self {
        self.config = self.config.with_hash_key_length(length);
        self
    }

    pub fn longitude_first(mut self, longitude_first: bool) -> Self {
        self.config = self.config.with_longitude_first(longitude_first);
        self
    }

    pub fn consistent_read(mut self, consistent_read: bool) -> Self {
        self.config = self.config.with_consistent_read(consistent_read);
        self
    }

    pub fn coverer(mut self, coverer: CovererConfig) -> Self {
        self.config = self.config.with_coverer(coverer);
        self
    }

    pub fn scan_error_policy(mut self, policy: ScanErrorPolicy) -> Self {
        self.config = self.config.with_scan_error_policy(policy);
        self
    }

    pub fn max_concurrent_scans(mut self, workers: usize) -> Self {
        self.config = self.config.with_max_concurrent_scans(workers);
        self
    }

    pub fn max_partition_ranges(mut self, max_ranges: usize) -> Self {
        self.config = self.config.with_max_partition_ranges(max_ranges);
        self
    }

    /// Build the table. Fails on a missing store or an invalid configuration.
    pub fn build(self) -> Result<GeoTable<S>> {
        let store = self
            .store
            .ok_or_else(|| GeoKvError::Config("A store client is required".to_string()))?;
        self.config.validate().map_err(GeoKvError::Config)?;
        Ok(GeoTable::from_parts(self.config, store))
    }
}

impl<S: GeoStore + ?Sized> Default for GeoTableBuilder<S> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    #[test]
    fn test_builder_applies_defaults() {
        let table = GeoTableBuilder::new()
            .table_name("points")
            .store(Arc::new(MemoryStore::new()))
            .build()
            .unwrap();

        let config = table.config();
        assert_eq!(config.table_name, "points");
        assert_eq!(config.hash_key_attribute_name, "hashKey");
        assert_eq!(config.range_key_attribute_name, "rangeKey");
        assert_eq!(config.geo_hash_attribute_name, "geohash");
        assert_eq!(config.geo_json_attribute_name, "geoJson");
        assert_eq!(config.geo_hash_index_name, "geohash-index");
        assert_eq!(config.hash_key_length, 2);
        assert!(config.longitude_first);
        assert!(!config.consistent_read);
        assert_eq!(config.coverer, CovererConfig::default());
        assert_eq!(config.scan_error_policy, ScanErrorPolicy::BestEffort);
    }

    #[test]
    fn test_missing_table_name_is_a_config_error() {
        let err = GeoTableBuilder::new()
            .store(Arc::new(MemoryStore::new()))
            .build()
            .unwrap_err();
        assert!(matches!(err, GeoKvError::Config(_)));
    }

    #[test]
    fn test_missing_store_is_a_config_error() {
        let err = GeoTableBuilder::<MemoryStore>::new()
            .table_name("points")
            .build()
            .unwrap_err();
        assert!(matches!(err, GeoKvError::Config(_)));
    }

    #[test]
    fn test_invalid_settings_are_rejected() {
        let err = GeoTableBuilder::new()
            .table_name("points")
            .hash_key_length(0)
            .store(Arc::new(MemoryStore::new()))
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("Hash key length"));

        let err = GeoTableBuilder::new()
            .table_name("points")
            .geo_json_attribute_name("geohash")
            .store(Arc::new(MemoryStore::new()))
            .build()
            .unwrap_err();
        assert!(matches!(err, GeoKvError::Config(_)));
    }

    #[test]
    fn test_fan_out_limits() {
        let table = GeoTableBuilder::new()
            .table_name("points")
            .max_concurrent_scans(4)
            .max_partition_ranges(50)
            .store(Arc::new(MemoryStore::new()))
            .build()
            .unwrap();
        assert_eq!(table.config().max_concurrent_scans, 4);
        assert_eq!(table.config().max_partition_ranges, 50);

        let err = GeoTableBuilder::new()
            .table_name("points")
            .max_concurrent_scans(0)
            .store(Arc::new(MemoryStore::new()))
            .build()
            .unwrap_err();
        assert!(matches!(err, GeoKvError::Config(_)));
    }

    #[test]
    fn test_trait_object_store() {
        let store: Arc<dyn GeoStore> = Arc::new(MemoryStore::new());
        let table: GeoTable = GeoTableBuilder::new()
            .table_name("points")
            .store(store)
            .build()
            .unwrap();
        assert_eq!(table.config().table_name, "points");
    }
}
