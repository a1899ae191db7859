//! Geospatial indexing over a hash+range key-value store.
//!
//! Points are stored under the S2 leaf cell that contains them. Region
//! queries cover the region with S2 cells, split the cells' id ranges along
//! partition boundaries, scan those ranges concurrently and post-filter the
//! results by exact geometry.
//!
//! ```rust
//! use geokv::prelude::*;
//! use std::sync::Arc;
//!
//! let table = GeoTableBuilder::new()
//!     .table_name("points")
//!     .store(Arc::new(MemoryStore::new()))
//!     .build()?;
//! let cancel = CancellationToken::new();
//! table.create_table(&cancel)?;
//!
//! let point = GeoPoint::new(40.7128, -74.0060);
//! table.put_point(&PutPointInput::new(point, "nyc"), &cancel)?;
//! let nearby = table.query_radius(&QueryRadiusInput::new(point, 1000.0), &cancel)?;
//! assert_eq!(nearby.items.len(), 1);
//! # Ok::<(), geokv::GeoKvError>(())
//! ```

pub mod builder;
pub mod cancel;
pub mod compute;
pub mod config;
pub mod db;
pub mod error;
pub mod storage;
pub mod types;

pub use builder::GeoTableBuilder;
pub use cancel::CancellationToken;
pub use config::{Config, CovererConfig, ScanErrorPolicy};
pub use db::{
    BatchWritePointsOutput, GeoFilter, GeoRecord, GeoTable, PaginatedQueryOutput,
    PartitionCursor, PutPointOutput, QueryOutput, QueryStats, ResumeMap,
    records_to_feature_collection,
};
pub use error::{GeoKvError, Result};

pub use storage::{
    AttributeAction, AttributeUpdates, AttributeValue, Filter, GeoStore, Item, MemoryStore,
    ScanOptions, TableSchema,
};

pub use types::{
    DeletePointInput, GeoHashRange, GeoPoint, GeoRect, GetPointInput, PartitionRange, PointInput,
    PutPointInput, QueryRadiusInput, QueryRectangleInput, UpdatePointInput,
};

pub use compute::spatial::EARTH_RADIUS_METERS;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Common imports
pub mod prelude {

    pub use crate::{CancellationToken, GeoKvError, GeoTable, GeoTableBuilder, Result};

    pub use crate::{Config, CovererConfig, ScanErrorPolicy};

    pub use crate::{GeoPoint, GeoRect, PointInput, PutPointInput, UpdatePointInput};

    pub use crate::{QueryOutput, QueryRadiusInput, QueryRectangleInput, ResumeMap};

    pub use crate::{AttributeValue, Filter, GeoStore, Item, MemoryStore, ScanOptions};
}
