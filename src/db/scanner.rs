//! Paged scan of one partition-scoped geohash range.

use crate::cancel::CancellationToken;
use crate::config::{Config, ScanErrorPolicy};
use crate::error::Result;
use crate::storage::{BetweenCondition, GeoStore, Item, KeyCondition, QueryPage, QueryRequest, ScanOptions};
use crate::types::PartitionRange;
use log::{debug, warn};

/// Pages read by one scan.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScanOutcome {
    pub pages: Vec<QueryPage>,
    /// A store error cut the scan short under [`ScanErrorPolicy::BestEffort`].
    pub failed: bool,
}

impl ScanOutcome {
    /// Continuation token of the last page read.
    pub fn last_evaluated_key(&self) -> Option<&Item> {
        self.pages.last().and_then(|page| page.last_evaluated_key.as_ref())
    }

    pub fn item_count(&self) -> usize {
        self.pages.iter().map(|page| page.items.len()).sum()
    }

    pub fn into_items(self) -> impl Iterator<Item = Item> {
        self.pages.into_iter().flat_map(|page| page.items)
    }
}

/// Issues geohash-index queries for partition-scoped ranges.
///
/// Caller options (projection, filter, page size) are merged into every
/// request; the table, index, key conditions and consistency always come
/// from the table configuration.
pub struct RangeScanner<'a, S: GeoStore + ?Sized> {
    store: &'a S,
    config: &'a Config,
    options: &'a ScanOptions,
    cancel: &'a CancellationToken,
}

impl<'a, S: GeoStore + ?Sized> RangeScanner<'a, S> {
    pub fn new(
        store: &'a S,
        config: &'a Config,
        options: &'a ScanOptions,
        cancel: &'a CancellationToken,
    ) -> Self {
        Self {
            store,
            config,
            options,
            cancel,
        }
    }

    pub fn cancel_token(&self) -> &CancellationToken {
        self.cancel
    }

    /// Scanner sharing everything with `self` except the cancellation handle.
    pub fn with_cancel<'b>(&self, cancel: &'b CancellationToken) -> RangeScanner<'b, S>
    where
        'a: 'b,
    {
        RangeScanner {
            store: self.store,
            config: self.config,
            options: self.options,
            cancel,
        }
    }

    /// First-page request for `range`, resuming after `exclusive_start_key` if given.
    pub fn request(&self, range: &PartitionRange, exclusive_start_key: Option<Item>) -> QueryRequest {
        let projection = self.options.projection.as_ref().map(|names| {
            let mut names = names.clone();
            let geo_json = &self.config.geo_json_attribute_name;
            if !names.contains(geo_json) {
                names.push(geo_json.clone());
            }
            names
        });

        QueryRequest {
            table_name: self.config.table_name.clone(),
            index_name: Some(self.config.geo_hash_index_name.clone()),
            hash_key: KeyCondition {
                attribute: self.config.hash_key_attribute_name.clone(),
                value: range.hash_key.into(),
            },
            sort_key: Some(BetweenCondition {
                attribute: self.config.geo_hash_attribute_name.clone(),
                low: range.range.range_min.into(),
                high: range.range.range_max.into(),
            }),
            consistent_read: self.config.consistent_read,
            exclusive_start_key,
            limit: self.options.page_size,
            projection,
            filter: self.options.filter.clone(),
        }
    }

    /// Read pages of `range` until the store runs out or `page_budget` pages were read.
    ///
    /// Cancellation is checked before every page and always surfaces as an
    /// error. Store errors follow the configured [`ScanErrorPolicy`].
    pub fn scan(
        &self,
        range: &PartitionRange,
        exclusive_start_key: Option<Item>,
        page_budget: Option<usize>,
    ) -> Result<ScanOutcome> {
        let mut request = self.request(range, exclusive_start_key);
        let mut outcome = ScanOutcome::default();

        while page_budget.is_none_or(|budget| outcome.pages.len() < budget) {
            self.cancel.check()?;

            let page = match self.store.query(&request) {
                Ok(page) => page,
                Err(e) => match self.config.scan_error_policy {
                    ScanErrorPolicy::FailFast => return Err(e),
                    ScanErrorPolicy::BestEffort => {
                        warn!(
                            "Scan of partition {} [{}, {}] failed after {} pages: {}",
                            range.hash_key,
                            range.range.range_min,
                            range.range.range_max,
                            outcome.pages.len(),
                            e
                        );
                        outcome.failed = true;
                        return Ok(outcome);
                    }
                },
            };

            let next = page.last_evaluated_key.clone();
            outcome.pages.push(page);
            match next {
                Some(key) => request.exclusive_start_key = Some(key),
                None => break,
            }
        }

        debug!(
            "Scanned partition {} [{}, {}]: {} pages, {} items",
            range.hash_key,
            range.range.range_min,
            range.range.range_max,
            outcome.pages.len(),
            outcome.item_count()
        );
        Ok(outcome)
    }
}
