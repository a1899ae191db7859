//! Geo-indexed table over a key-value store.
//!
//! This module defines the main `GeoTable` type along with the query
//! planner, the fan-out machinery and the write path that power the public
//! API.

use crate::config::Config;
use crate::error::Result;
use crate::storage::{GeoStore, TableSchema};
use std::sync::Arc;

mod dispatch;
mod filter;
mod query;
mod record;
mod scanner;
mod write;

pub use dispatch::{PartitionCursor, QueryStats, ResumeMap};
pub use filter::GeoFilter;
pub use query::{PaginatedQueryOutput, QueryOutput};
pub use record::{
    GeoRecord, attributes_from, decode_item, decode_items, item_to_json,
    records_to_feature_collection,
};
pub use scanner::{RangeScanner, ScanOutcome};
pub use write::{BatchWritePointsOutput, PutPointOutput};

/// A table of points indexed by S2 cell.
///
/// Every point is stored under a hash key made of the leading decimal digits
/// of its S2 leaf cell id (its geohash), with the full geohash as the sort key
/// of a local secondary index. Region queries cover the region with S2 cells,
/// turn the cells into partition-scoped geohash ranges and scan those ranges
/// concurrently.
///
/// # Thread Safety
///
/// `GeoTable` is `Send + Sync` and cheap to clone; the configuration is
/// immutable after construction and the store is shared behind an `Arc`.
///
/// # Examples
///
/// ```rust
/// use geokv::prelude::*;
/// use std::sync::Arc;
///
/// # fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
/// let table = GeoTableBuilder::new()
///     .table_name("coffee-shops")
///     .store(Arc::new(MemoryStore::new()))
///     .build()?;
/// let cancel = CancellationToken::new();
/// table.create_table(&cancel)?;
///
/// let shop = PutPointInput::new(GeoPoint::new(40.7769, -73.9823), "shop-1")
///     .with_attribute("name", "Upper West");
/// table.put_point(&shop, &cancel)?;
///
/// let nearby = table.query_radius(
///     &QueryRadiusInput::new(GeoPoint::new(40.7500, -74.0000), 5_000.0),
///     &cancel,
/// )?;
/// assert_eq!(nearby.items.len(), 1);
/// # Ok(())
/// # }
/// ```
pub struct GeoTable<S: GeoStore + ?Sized = dyn GeoStore> {
    config: Config,
    store: Arc<S>,
}

impl<S: GeoStore + ?Sized> std::fmt::Debug for GeoTable<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeoTable")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl<S: GeoStore + ?Sized> Clone for GeoTable<S> {
    fn clone(&self) -> Self {
        Self {
            config: self.config.clone(),
            store: Arc::clone(&self.store),
        }
    }
}

impl<S: GeoStore + ?Sized> GeoTable<S> {
    /// Constructed through [`GeoTableBuilder`](crate::GeoTableBuilder), which validates the config.
    pub(crate) fn from_parts(config: Config, store: Arc<S>) -> Self {
        Self { config, store }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Provisioning request for this table.
    pub fn table_schema(&self) -> TableSchema {
        TableSchema::from_config(&self.config)
    }

    /// Provision the table and its geohash index in the store.
    pub fn create_table(&self, cancel: &crate::CancellationToken) -> Result<()> {
        cancel.check()?;
        self.store.create_table(&self.table_schema())
    }
}
