//! Region queries: rectangle, radius, and paginated radius.

use super::GeoTable;
use super::dispatch::{QueryStats, ResumeMap, fan_out, fan_out_paginated};
use super::filter::GeoFilter;
use super::record::{GeoRecord, decode_items};
use super::scanner::RangeScanner;
use crate::cancel::CancellationToken;
use crate::compute::covering::Covering;
use crate::compute::validation::{validate_geo_point, validate_radius};
use crate::error::{GeoKvError, Result};
use crate::storage::{GeoStore, Item, ScanOptions};
use crate::types::{PartitionRange, QueryRadiusInput, QueryRectangleInput};
use log::debug;
use serde::de::DeserializeOwned;

/// Items that survived the post-filter, in no particular order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryOutput {
    pub items: Vec<Item>,
    pub stats: QueryStats,
}

impl QueryOutput {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn decode<T: DeserializeOwned>(&self) -> Result<Vec<T>> {
        decode_items(&self.items)
    }
}

/// One round of a paginated query.
///
/// Pass `next_resume_map` to the following call. Pages may hold fewer items
/// than the page budget suggests because the post-filter runs after paging.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PaginatedQueryOutput {
    pub items: Vec<Item>,
    pub next_resume_map: ResumeMap,
    pub stats: QueryStats,
}

impl PaginatedQueryOutput {
    /// Every partition is drained; further calls return nothing.
    pub fn is_exhausted(&self) -> bool {
        self.next_resume_map.values().all(Option::is_none)
    }

    pub fn decode<T: DeserializeOwned>(&self) -> Result<Vec<T>> {
        decode_items(&self.items)
    }
}

impl<S: GeoStore + ?Sized> GeoTable<S> {
    /// Points inside the rectangle spanned by the input corners, edges included.
    pub fn query_rectangle(
        &self,
        input: &QueryRectangleInput,
        cancel: &CancellationToken,
    ) -> Result<QueryOutput> {
        validate_geo_point(&input.min_point)?;
        validate_geo_point(&input.max_point)?;
        self.query_region(GeoFilter::Rectangle(input.rect()), &input.options, cancel)
    }

    /// Points within `radius_meters` of the center.
    pub fn query_radius(
        &self,
        input: &QueryRadiusInput,
        cancel: &CancellationToken,
    ) -> Result<QueryOutput> {
        self.query_region(radius_filter(input)?, &input.options, cancel)
    }

    /// One round of a radius query reading at most `page_budget` pages per partition.
    ///
    /// Start with an empty `resume` map and feed each returned
    /// `next_resume_map` back in until [`PaginatedQueryOutput::is_exhausted`].
    pub fn query_radius_paginated(
        &self,
        input: &QueryRadiusInput,
        resume: &ResumeMap,
        page_budget: usize,
        cancel: &CancellationToken,
    ) -> Result<PaginatedQueryOutput> {
        if page_budget == 0 {
            return Err(GeoKvError::InvalidInput(
                "Page budget must be at least 1".to_string(),
            ));
        }
        let filter = radius_filter(input)?;
        let (ranges, cells) = self.plan(&filter)?;
        let scanner = RangeScanner::new(&*self.store, &self.config, &input.options, cancel);

        let out = fan_out_paginated(
            &scanner,
            &ranges,
            resume,
            page_budget,
            self.config.scan_error_policy,
            self.config.max_concurrent_scans,
        )?;
        let scanned = out.items.len();
        let items = filter.apply(out.items, &self.config)?;
        debug!(
            "Paginated radius query kept {} of {} items; {} partitions pending",
            items.len(),
            scanned,
            out.next.values().filter(|cursor| cursor.is_some()).count()
        );

        Ok(PaginatedQueryOutput {
            items,
            next_resume_map: out.next,
            stats: QueryStats { cells, ..out.stats },
        })
    }

    /// [`query_rectangle`](Self::query_rectangle) decoded into caller types.
    pub fn query_rectangle_as<T: DeserializeOwned>(
        &self,
        input: &QueryRectangleInput,
        cancel: &CancellationToken,
    ) -> Result<Vec<T>> {
        self.query_rectangle(input, cancel)?.decode()
    }

    /// [`query_radius`](Self::query_radius) decoded into caller types.
    pub fn query_radius_as<T: DeserializeOwned>(
        &self,
        input: &QueryRadiusInput,
        cancel: &CancellationToken,
    ) -> Result<Vec<T>> {
        self.query_radius(input, cancel)?.decode()
    }

    /// [`query_radius`](Self::query_radius) split into library-owned parts and attributes.
    pub fn query_radius_records(
        &self,
        input: &QueryRadiusInput,
        cancel: &CancellationToken,
    ) -> Result<Vec<GeoRecord>> {
        self.query_radius(input, cancel)?
            .items
            .iter()
            .map(|item| GeoRecord::from_item(item, &self.config))
            .collect()
    }

    fn query_region(
        &self,
        filter: GeoFilter,
        options: &ScanOptions,
        cancel: &CancellationToken,
    ) -> Result<QueryOutput> {
        let (ranges, cells) = self.plan(&filter)?;
        let scanner = RangeScanner::new(&*self.store, &self.config, options, cancel);

        let out = fan_out(
            &scanner,
            &ranges,
            self.config.scan_error_policy,
            self.config.max_concurrent_scans,
        )?;
        let scanned = out.items.len();
        let items = filter.apply(out.items, &self.config)?;
        debug!("Query kept {} of {} scanned items", items.len(), scanned);

        Ok(QueryOutput {
            items,
            stats: QueryStats { cells, ..out.stats },
        })
    }

    /// Partition-scoped ranges covering the filter's bounding rectangle.
    fn plan(&self, filter: &GeoFilter) -> Result<(Vec<PartitionRange>, usize)> {
        let rect = filter.bounding_rect();
        let covering = Covering::for_rect(&rect, &self.config.coverer);
        let ranges = covering.bounded_partition_ranges(
            self.config.hash_key_length,
            self.config.max_partition_ranges,
        )?;
        debug!(
            "Planned {:?}: {} cells, {} partition ranges",
            filter,
            covering.len(),
            ranges.len()
        );
        Ok((ranges, covering.len()))
    }
}

fn radius_filter(input: &QueryRadiusInput) -> Result<GeoFilter> {
    validate_geo_point(&input.center)?;
    validate_radius(input.radius_meters)?;
    Ok(GeoFilter::Radius {
        center: input.center,
        radius_meters: input.radius_meters,
    })
}
