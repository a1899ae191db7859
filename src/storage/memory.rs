//! In-process implementation of the store contract.
//!
//! Tables keep their items in a `BTreeMap` ordered by primary key, plus one
//! ordered set per local secondary index. Reads are always consistent.

use super::schema::{ScalarAttributeType, TableSchema};
use super::{
    AttributeAction, AttributeValue, BatchWriteOutput, BatchWriteRequest, DeleteItemRequest,
    GeoStore, GetItemRequest, Item, MAX_BATCH_WRITE_ITEMS, PutItemRequest, QueryPage,
    QueryRequest, UpdateItemRequest, WriteRequest,
};
use crate::error::{GeoKvError, Result};
use bytes::Bytes;
use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use std::collections::{BTreeMap, BTreeSet};
use std::ops::Bound;
use std::sync::atomic::{AtomicU64, Ordering};

/// Default number of items evaluated per query page.
pub const DEFAULT_MAX_PAGE_ITEMS: usize = 1000;

/// Orderable form of a key attribute. `Min` and `Max` bracket every real key.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
enum KeyPart {
    Min,
    N(i128),
    S(String),
    B(Bytes),
    Max,
}

impl KeyPart {
    fn from_value(attribute: &str, value: &AttributeValue, ty: ScalarAttributeType) -> Result<Self> {
        match (ty, value) {
            (ScalarAttributeType::N, AttributeValue::N(n)) => n.parse::<i128>().map(Self::N).map_err(|_| {
                GeoKvError::Store(format!(
                    "Key attribute '{}' is not an integer: {}",
                    attribute, n
                ))
            }),
            (ScalarAttributeType::S, AttributeValue::S(s)) => Ok(Self::S(s.clone())),
            (ScalarAttributeType::B, AttributeValue::B(b)) => Ok(Self::B(b.clone())),
            (ty, other) => Err(GeoKvError::Store(format!(
                "Key attribute '{}' must be of type {:?}, got {}",
                attribute,
                ty,
                other.type_name()
            ))),
        }
    }
}

type PrimaryKey = (KeyPart, KeyPart);

/// Index entry: (hash key, index sort key, table range key).
type IndexEntry = (KeyPart, KeyPart, KeyPart);

#[derive(Debug)]
struct IndexState {
    sort_key: String,
    sort_key_type: ScalarAttributeType,
    entries: BTreeSet<IndexEntry>,
}

#[derive(Debug)]
struct MemoryTable {
    hash_key: String,
    hash_key_type: ScalarAttributeType,
    range_key: String,
    range_key_type: ScalarAttributeType,
    items: BTreeMap<PrimaryKey, Item>,
    indexes: FxHashMap<String, IndexState>,
}

impl MemoryTable {
    fn from_schema(schema: &TableSchema) -> Result<Self> {
        let hash_key = schema
            .hash_key_name()
            .ok_or_else(|| GeoKvError::Store("Key schema has no HASH key".into()))?;
        let range_key = schema
            .range_key_name()
            .ok_or_else(|| GeoKvError::Store("Key schema has no RANGE key".into()))?;

        let mut indexes = FxHashMap::default();
        for index in &schema.local_secondary_indexes {
            let sort_key = index.sort_key_name().ok_or_else(|| {
                GeoKvError::Store(format!("Index '{}' has no RANGE key", index.index_name))
            })?;
            indexes.insert(
                index.index_name.clone(),
                IndexState {
                    sort_key: sort_key.to_string(),
                    sort_key_type: attribute_type(schema, sort_key)?,
                    entries: BTreeSet::new(),
                },
            );
        }

        Ok(Self {
            hash_key: hash_key.to_string(),
            hash_key_type: attribute_type(schema, hash_key)?,
            range_key: range_key.to_string(),
            range_key_type: attribute_type(schema, range_key)?,
            items: BTreeMap::new(),
            indexes,
        })
    }

    fn primary_key(&self, item: &Item) -> Result<PrimaryKey> {
        Ok((
            required_key(item, &self.hash_key, self.hash_key_type)?,
            required_key(item, &self.range_key, self.range_key_type)?,
        ))
    }

    fn is_key_attribute(&self, name: &str) -> bool {
        name == self.hash_key || name == self.range_key
    }

    fn index_entries(&self, key: &PrimaryKey, item: &Item) -> Result<Vec<(String, IndexEntry)>> {
        let mut entries = Vec::with_capacity(self.indexes.len());
        for (name, index) in &self.indexes {
            // Items without the index sort key are not projected into the index.
            if let Some(value) = item.get(&index.sort_key) {
                let sort = KeyPart::from_value(&index.sort_key, value, index.sort_key_type)?;
                entries.push((name.clone(), (key.0.clone(), sort, key.1.clone())));
            }
        }
        Ok(entries)
    }

    fn insert(&mut self, item: Item) -> Result<Option<Item>> {
        let key = self.primary_key(&item)?;
        let new_entries = self.index_entries(&key, &item)?;
        let old = self.remove(&key)?;
        for (name, entry) in new_entries {
            if let Some(index) = self.indexes.get_mut(&name) {
                index.entries.insert(entry);
            }
        }
        self.items.insert(key, item);
        Ok(old)
    }

    fn remove(&mut self, key: &PrimaryKey) -> Result<Option<Item>> {
        let Some(old) = self.items.remove(key) else {
            return Ok(None);
        };
        for (name, entry) in self.index_entries(key, &old)? {
            if let Some(index) = self.indexes.get_mut(&name) {
                index.entries.remove(&entry);
            }
        }
        Ok(Some(old))
    }

    fn query(&self, request: &QueryRequest, page_limit: usize) -> Result<QueryPage> {
        if request.hash_key.attribute != self.hash_key {
            return Err(GeoKvError::Store(format!(
                "Query key condition must use the hash key '{}', got '{}'",
                self.hash_key, request.hash_key.attribute
            )));
        }
        let hash = KeyPart::from_value(&self.hash_key, &request.hash_key.value, self.hash_key_type)?;
        let limit = request.limit.unwrap_or(page_limit).min(page_limit).max(1);

        let mut evaluated: Vec<&Item> = Vec::new();
        let more = match &request.index_name {
            Some(index_name) => {
                let index = self.indexes.get(index_name).ok_or_else(|| {
                    GeoKvError::Store(format!("Index '{}' does not exist", index_name))
                })?;
                let (low, high) = self.sort_bounds(request, &index.sort_key, index.sort_key_type)?;
                let start = match &request.exclusive_start_key {
                    Some(lek) => Bound::Excluded((
                        hash.clone(),
                        required_key(lek, &index.sort_key, index.sort_key_type)?,
                        required_key(lek, &self.range_key, self.range_key_type)?,
                    )),
                    None => Bound::Included((hash.clone(), low, KeyPart::Min)),
                };
                let end = (hash.clone(), high, KeyPart::Max);
                if !starts_before(&start, &end) {
                    return Ok(QueryPage::default());
                }
                let mut iter = index.entries.range((start, Bound::Included(end)));
                for (h, _, r) in iter.by_ref().take(limit) {
                    if let Some(item) = self.items.get(&(h.clone(), r.clone())) {
                        evaluated.push(item);
                    }
                }
                iter.next().is_some()
            }
            None => {
                let (low, high) = self.sort_bounds(request, &self.range_key, self.range_key_type)?;
                let start = match &request.exclusive_start_key {
                    Some(lek) => Bound::Excluded((
                        hash.clone(),
                        required_key(lek, &self.range_key, self.range_key_type)?,
                    )),
                    None => Bound::Included((hash.clone(), low)),
                };
                let end = (hash.clone(), high);
                if !starts_before(&start, &end) {
                    return Ok(QueryPage::default());
                }
                let mut iter = self.items.range((start, Bound::Included(end)));
                evaluated.extend(iter.by_ref().take(limit).map(|(_, item)| item));
                iter.next().is_some()
            }
        };

        let last_evaluated_key = match evaluated.last() {
            Some(last) if more => Some(self.continuation_key(last, request.index_name.as_deref())),
            _ => None,
        };

        let items = evaluated
            .into_iter()
            .filter(|item| request.filter.as_ref().is_none_or(|f| f.matches(item)))
            .map(|item| project(item, request.projection.as_deref()))
            .collect();

        Ok(QueryPage {
            items,
            last_evaluated_key,
        })
    }

    fn sort_bounds(
        &self,
        request: &QueryRequest,
        sort_key: &str,
        ty: ScalarAttributeType,
    ) -> Result<(KeyPart, KeyPart)> {
        match &request.sort_key {
            None => Ok((KeyPart::Min, KeyPart::Max)),
            Some(cond) if cond.attribute == sort_key => Ok((
                KeyPart::from_value(sort_key, &cond.low, ty)?,
                KeyPart::from_value(sort_key, &cond.high, ty)?,
            )),
            Some(cond) => Err(GeoKvError::Store(format!(
                "Sort key condition must use '{}', got '{}'",
                sort_key, cond.attribute
            ))),
        }
    }

    fn continuation_key(&self, item: &Item, index_name: Option<&str>) -> Item {
        let mut names = vec![self.hash_key.as_str(), self.range_key.as_str()];
        if let Some(index) = index_name.and_then(|name| self.indexes.get(name)) {
            names.push(index.sort_key.as_str());
        }
        names
            .into_iter()
            .filter_map(|name| item.get(name).map(|v| (name.to_string(), v.clone())))
            .collect()
    }
}

fn starts_before<T: Ord>(start: &Bound<T>, end: &T) -> bool {
    match start {
        Bound::Included(s) => s <= end,
        Bound::Excluded(s) => s < end,
        Bound::Unbounded => true,
    }
}

fn attribute_type(schema: &TableSchema, name: &str) -> Result<ScalarAttributeType> {
    schema.attribute_type(name).ok_or_else(|| {
        GeoKvError::Store(format!("Key attribute '{}' has no attribute definition", name))
    })
}

fn required_key(item: &Item, name: &str, ty: ScalarAttributeType) -> Result<KeyPart> {
    let value = item
        .get(name)
        .ok_or_else(|| GeoKvError::Store(format!("Missing key attribute '{}'", name)))?;
    KeyPart::from_value(name, value, ty)
}

fn project(item: &Item, projection: Option<&[String]>) -> Item {
    match projection {
        None => item.clone(),
        Some(names) => names
            .iter()
            .filter_map(|name| item.get(name).map(|v| (name.clone(), v.clone())))
            .collect(),
    }
}

/// Store statistics
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryStoreStats {
    /// Number of provisioned tables
    pub table_count: usize,
    /// Items across all tables
    pub item_count: usize,
    /// Query pages served
    pub query_count: u64,
    /// Item writes applied, batch members counted individually
    pub write_count: u64,
}

/// In-memory store with DynamoDB-style tables and local secondary indexes.
///
/// # Examples
///
/// ```rust
/// use geokv::storage::{GeoStore, MemoryStore, TableSchema};
/// use geokv::Config;
///
/// let store = MemoryStore::new();
/// store.create_table(&TableSchema::from_config(&Config::new("points")))?;
/// assert_eq!(store.item_count("points")?, 0);
/// # Ok::<(), geokv::GeoKvError>(())
/// ```
#[derive(Debug)]
pub struct MemoryStore {
    tables: RwLock<FxHashMap<String, MemoryTable>>,
    max_page_items: usize,
    query_count: AtomicU64,
    write_count: AtomicU64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::with_max_page_items(DEFAULT_MAX_PAGE_ITEMS)
    }

    /// Store whose query pages never evaluate more than `max_page_items` items.
    pub fn with_max_page_items(max_page_items: usize) -> Self {
        Self {
            tables: RwLock::new(FxHashMap::default()),
            max_page_items: max_page_items.max(1),
            query_count: AtomicU64::new(0),
            write_count: AtomicU64::new(0),
        }
    }

    pub fn item_count(&self, table_name: &str) -> Result<usize> {
        let tables = self.tables.read();
        let table = tables
            .get(table_name)
            .ok_or_else(|| GeoKvError::TableNotFound(table_name.to_string()))?;
        Ok(table.items.len())
    }

    pub fn stats(&self) -> MemoryStoreStats {
        let tables = self.tables.read();
        MemoryStoreStats {
            table_count: tables.len(),
            item_count: tables.values().map(|t| t.items.len()).sum(),
            query_count: self.query_count.load(Ordering::Relaxed),
            write_count: self.write_count.load(Ordering::Relaxed),
        }
    }

    fn with_table<T>(&self, name: &str, f: impl FnOnce(&MemoryTable) -> Result<T>) -> Result<T> {
        let tables = self.tables.read();
        let table = tables
            .get(name)
            .ok_or_else(|| GeoKvError::TableNotFound(name.to_string()))?;
        f(table)
    }

    fn with_table_mut<T>(
        &self,
        name: &str,
        f: impl FnOnce(&mut MemoryTable) -> Result<T>,
    ) -> Result<T> {
        let mut tables = self.tables.write();
        let table = tables
            .get_mut(name)
            .ok_or_else(|| GeoKvError::TableNotFound(name.to_string()))?;
        f(table)
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl GeoStore for MemoryStore {
    fn create_table(&self, schema: &TableSchema) -> Result<()> {
        let table = MemoryTable::from_schema(schema)?;
        let mut tables = self.tables.write();
        if tables.contains_key(&schema.table_name) {
            return Err(GeoKvError::Store(format!(
                "Table already exists: {}",
                schema.table_name
            )));
        }
        tables.insert(schema.table_name.clone(), table);
        Ok(())
    }

    fn query(&self, request: &QueryRequest) -> Result<QueryPage> {
        self.query_count.fetch_add(1, Ordering::Relaxed);
        self.with_table(&request.table_name, |table| {
            table.query(request, self.max_page_items)
        })
    }

    fn put_item(&self, request: PutItemRequest) -> Result<()> {
        self.with_table_mut(&request.table_name, |table| {
            table.insert(request.item).map(|_| ())
        })?;
        self.write_count.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    fn get_item(&self, request: &GetItemRequest) -> Result<Option<Item>> {
        self.with_table(&request.table_name, |table| {
            let key = table.primary_key(&request.key)?;
            Ok(table.items.get(&key).cloned())
        })
    }

    fn update_item(&self, request: UpdateItemRequest) -> Result<Option<Item>> {
        let updated = self.with_table_mut(&request.table_name, |table| {
            if let Some(name) = request.updates.keys().find(|name| table.is_key_attribute(name)) {
                return Err(GeoKvError::Store(format!(
                    "Cannot update key attribute '{}'",
                    name
                )));
            }
            let key = table.primary_key(&request.key)?;
            let mut item = match table.items.get(&key) {
                Some(existing) => existing.clone(),
                None => request
                    .key
                    .iter()
                    .filter(|(name, _)| table.is_key_attribute(name))
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect(),
            };
            for (name, action) in request.updates {
                match action {
                    AttributeAction::Put(value) => {
                        item.insert(name, value);
                    }
                    AttributeAction::Delete => {
                        item.remove(&name);
                    }
                }
            }
            table.insert(item.clone())?;
            Ok(item)
        })?;
        self.write_count.fetch_add(1, Ordering::Relaxed);
        Ok(Some(updated))
    }

    fn delete_item(&self, request: &DeleteItemRequest) -> Result<Option<Item>> {
        let old = self.with_table_mut(&request.table_name, |table| {
            let key = table.primary_key(&request.key)?;
            table.remove(&key)
        })?;
        self.write_count.fetch_add(1, Ordering::Relaxed);
        Ok(old)
    }

    fn batch_write_item(&self, request: BatchWriteRequest) -> Result<BatchWriteOutput> {
        if request.requests.len() > MAX_BATCH_WRITE_ITEMS {
            return Err(GeoKvError::Store(format!(
                "Batch of {} requests exceeds the limit of {}",
                request.requests.len(),
                MAX_BATCH_WRITE_ITEMS
            )));
        }
        let count = request.requests.len() as u64;
        self.with_table_mut(&request.table_name, |table| {
            // Validate every key before applying anything.
            for write in &request.requests {
                match write {
                    WriteRequest::Put(item) | WriteRequest::Delete(item) => {
                        table.primary_key(item)?;
                    }
                }
            }
            for write in request.requests {
                match write {
                    WriteRequest::Put(item) => {
                        table.insert(item)?;
                    }
                    WriteRequest::Delete(key) => {
                        let key = table.primary_key(&key)?;
                        table.remove(&key)?;
                    }
                }
            }
            Ok(())
        })?;
        self.write_count.fetch_add(count, Ordering::Relaxed);
        Ok(BatchWriteOutput::default())
    }
}
