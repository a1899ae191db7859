#![allow(dead_code)]

use geokv::storage::{
    BatchWriteOutput, BatchWriteRequest, DeleteItemRequest, GetItemRequest, PutItemRequest,
    QueryPage, QueryRequest, UpdateItemRequest,
};
use geokv::{
    CancellationToken, Config, GeoKvError, GeoPoint, GeoStore, GeoTable, GeoTableBuilder, Item,
    MemoryStore, Result, TableSchema,
};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Provisioned table over a fresh store.
pub fn table_with<S: GeoStore>(config: Config, store: S) -> GeoTable<S> {
    init_logging();
    let table = GeoTableBuilder::new()
        .config(config)
        .store(Arc::new(store))
        .build()
        .unwrap();
    table.create_table(&CancellationToken::new()).unwrap();
    table
}

pub fn memory_table(config: Config) -> GeoTable<MemoryStore> {
    table_with(config, MemoryStore::new())
}

/// Deterministic jittered points filling a square of `side_meters` around `center`.
pub fn points_in_square(center: GeoPoint, side_meters: f64, count: usize) -> Vec<GeoPoint> {
    let meters_per_degree = geokv::EARTH_RADIUS_METERS * 1.0_f64.to_radians();
    let half_lat = side_meters / 2.0 / meters_per_degree;
    let half_lng = half_lat / center.latitude.to_radians().cos();

    let mut seed: u64 = 0x9E37_79B9_7F4A_7C15;
    let mut next = move || {
        seed = seed
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);
        (seed >> 11) as f64 / (1u64 << 53) as f64
    };

    (0..count)
        .map(|_| {
            let lat = center.latitude + (next() * 2.0 - 1.0) * half_lat;
            let lng = center.longitude + (next() * 2.0 - 1.0) * half_lng;
            GeoPoint::new(lat, lng)
        })
        .collect()
}

pub fn range_key(item: &Item) -> String {
    item["rangeKey"].as_s().unwrap().to_string()
}

/// Store whose queries against one partition fail while failures remain.
pub struct FlakyStore {
    inner: MemoryStore,
    failing_hash_key: u64,
    failures_left: AtomicUsize,
    pub failed_queries: AtomicUsize,
}

impl FlakyStore {
    pub fn new(inner: MemoryStore, failing_hash_key: u64, failures: usize) -> Self {
        Self {
            inner,
            failing_hash_key,
            failures_left: AtomicUsize::new(failures),
            failed_queries: AtomicUsize::new(0),
        }
    }

    fn should_fail(&self, request: &QueryRequest) -> bool {
        if request.hash_key.value.as_u64() != Some(self.failing_hash_key) {
            return false;
        }
        self.failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| left.checked_sub(1))
            .is_ok()
    }
}

impl GeoStore for FlakyStore {
    fn create_table(&self, schema: &TableSchema) -> Result<()> {
        self.inner.create_table(schema)
    }

    fn query(&self, request: &QueryRequest) -> Result<QueryPage> {
        if self.should_fail(request) {
            self.failed_queries.fetch_add(1, Ordering::SeqCst);
            return Err(GeoKvError::Store("throttled".into()));
        }
        self.inner.query(request)
    }

    fn put_item(&self, request: PutItemRequest) -> Result<()> {
        self.inner.put_item(request)
    }

    fn get_item(&self, request: &GetItemRequest) -> Result<Option<Item>> {
        self.inner.get_item(request)
    }

    fn update_item(&self, request: UpdateItemRequest) -> Result<Option<Item>> {
        self.inner.update_item(request)
    }

    fn delete_item(&self, request: &DeleteItemRequest) -> Result<Option<Item>> {
        self.inner.delete_item(request)
    }

    fn batch_write_item(&self, request: BatchWriteRequest) -> Result<BatchWriteOutput> {
        self.inner.batch_write_item(request)
    }
}

/// Store that fires a cancellation token from inside its first query.
pub struct CancellingStore {
    inner: MemoryStore,
    token: CancellationToken,
}

impl CancellingStore {
    pub fn new(inner: MemoryStore, token: CancellationToken) -> Self {
        Self { inner, token }
    }
}

impl GeoStore for CancellingStore {
    fn create_table(&self, schema: &TableSchema) -> Result<()> {
        self.inner.create_table(schema)
    }

    fn query(&self, request: &QueryRequest) -> Result<QueryPage> {
        self.token.cancel();
        self.inner.query(request)
    }

    fn put_item(&self, request: PutItemRequest) -> Result<()> {
        self.inner.put_item(request)
    }

    fn get_item(&self, request: &GetItemRequest) -> Result<Option<Item>> {
        self.inner.get_item(request)
    }

    fn update_item(&self, request: UpdateItemRequest) -> Result<Option<Item>> {
        self.inner.update_item(request)
    }

    fn delete_item(&self, request: &DeleteItemRequest) -> Result<Option<Item>> {
        self.inner.delete_item(request)
    }

    fn batch_write_item(&self, request: BatchWriteRequest) -> Result<BatchWriteOutput> {
        self.inner.batch_write_item(request)
    }
}
