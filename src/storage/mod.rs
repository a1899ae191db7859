//! Store abstraction consumed by the geo index.
//!
//! The geo layer needs a hash+range key-value store with one local secondary
//! index, queried by partition-key equality plus a BETWEEN on the index sort
//! key, with continuation-token pagination. [`GeoStore`] captures exactly that
//! contract; [`MemoryStore`] implements it in process.

pub mod memory;
pub mod schema;
pub mod value;

pub use memory::MemoryStore;
pub use schema::TableSchema;
pub use value::{AttributeValue, Filter, Item};

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Maximum number of write requests in one [`GeoStore::batch_write_item`] call.
pub const MAX_BATCH_WRITE_ITEMS: usize = 25;

/// Trait for key-value store implementations
///
/// Implementations are shared between the scan threads of one query, so every
/// method takes `&self`.
pub trait GeoStore: Send + Sync {
    /// Provision a table with its secondary index
    fn create_table(&self, schema: &TableSchema) -> Result<()>;

    /// Read one page of an index query
    fn query(&self, request: &QueryRequest) -> Result<QueryPage>;

    /// Insert or replace an item
    fn put_item(&self, request: PutItemRequest) -> Result<()>;

    /// Fetch an item by primary key
    fn get_item(&self, request: &GetItemRequest) -> Result<Option<Item>>;

    /// Apply attribute updates to an item, creating it if absent
    fn update_item(&self, request: UpdateItemRequest) -> Result<Option<Item>>;

    /// Delete an item by primary key, returning the old item if it existed
    fn delete_item(&self, request: &DeleteItemRequest) -> Result<Option<Item>>;

    /// Apply up to [`MAX_BATCH_WRITE_ITEMS`] puts and deletes
    fn batch_write_item(&self, request: BatchWriteRequest) -> Result<BatchWriteOutput>;
}

/// Caller-tunable options merged into every scan of a query.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScanOptions {
    /// Attributes to return. `None` returns every attribute.
    pub projection: Option<Vec<String>>,
    /// Predicate applied by the store after each page is read.
    pub filter: Option<Filter>,
    /// Maximum number of items evaluated per page.
    pub page_size: Option<usize>,
}

impl ScanOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_projection<I, S>(mut self, attributes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.projection = Some(attributes.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_filter(mut self, filter: Filter) -> Self {
        self.filter = Some(filter);
        self
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = Some(page_size);
        self
    }
}

/// Equality on the partition key.
#[derive(Debug, Clone, PartialEq)]
pub struct KeyCondition {
    pub attribute: String,
    pub value: AttributeValue,
}

/// Inclusive BETWEEN on the index sort key.
#[derive(Debug, Clone, PartialEq)]
pub struct BetweenCondition {
    pub attribute: String,
    pub low: AttributeValue,
    pub high: AttributeValue,
}

/// One page request against a table or one of its secondary indexes.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryRequest {
    pub table_name: String,
    pub index_name: Option<String>,
    pub hash_key: KeyCondition,
    pub sort_key: Option<BetweenCondition>,
    pub consistent_read: bool,
    pub exclusive_start_key: Option<Item>,
    pub limit: Option<usize>,
    pub projection: Option<Vec<String>>,
    pub filter: Option<Filter>,
}

/// One page of query results.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryPage {
    pub items: Vec<Item>,
    /// Continuation token; `None` once the query is exhausted.
    pub last_evaluated_key: Option<Item>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PutItemRequest {
    pub table_name: String,
    pub item: Item,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GetItemRequest {
    pub table_name: String,
    pub key: Item,
    pub consistent_read: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AttributeAction {
    Put(AttributeValue),
    Delete,
}

/// Attribute name to the action applied to it.
pub type AttributeUpdates = BTreeMap<String, AttributeAction>;

#[derive(Debug, Clone, PartialEq)]
pub struct UpdateItemRequest {
    pub table_name: String,
    pub key: Item,
    pub updates: AttributeUpdates,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DeleteItemRequest {
    pub table_name: String,
    pub key: Item,
}

#[derive(Debug, Clone, PartialEq)]
pub enum WriteRequest {
    Put(Item),
    Delete(Item),
}

#[derive(Debug, Clone, PartialEq)]
pub struct BatchWriteRequest {
    pub table_name: String,
    pub requests: Vec<WriteRequest>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchWriteOutput {
    /// Requests the store did not apply; callers may resubmit them.
    pub unprocessed: Vec<WriteRequest>,
}
