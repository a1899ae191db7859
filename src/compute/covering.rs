//! S2 cell coverings of query rectangles.

use crate::compute::ranges::{split_count, split_range};
use crate::error::{GeoKvError, Result};
use crate::config::CovererConfig;
use crate::types::{GeoHashRange, GeoRect, PartitionRange};
use s2::cellid::CellID;
use s2::region::RegionCoverer;

/// Set of S2 cells whose union contains a query rectangle.
#[derive(Debug, Clone)]
pub struct Covering {
    cells: Vec<CellID>,
}

impl Covering {
    pub fn for_rect(rect: &GeoRect, config: &CovererConfig) -> Self {
        let coverer = RegionCoverer {
            min_level: config.min_level,
            max_level: config.max_level,
            level_mod: config.level_mod.max(1),
            max_cells: config.max_cells,
        };
        let union = coverer.covering(&rect.to_s2_rect());
        Self { cells: union.0 }
    }

    pub fn cells(&self) -> &[CellID] {
        &self.cells
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Leaf-id interval of every cell, in covering order.
    pub fn geo_hash_ranges(&self) -> impl Iterator<Item = GeoHashRange> + '_ {
        self.cells
            .iter()
            .map(|cell| GeoHashRange::new(cell.range_min().0, cell.range_max().0))
    }

    /// How many partition-scoped ranges [`partition_ranges`](Self::partition_ranges) yields.
    pub fn partition_range_count(&self, hash_key_length: u8) -> u64 {
        self.geo_hash_ranges()
            .map(|range| split_count(range, hash_key_length))
            .fold(0u64, u64::saturating_add)
    }

    /// [`partition_ranges`](Self::partition_ranges), refused when the plan
    /// would exceed `max_ranges` ranges.
    pub fn bounded_partition_ranges(
        &self,
        hash_key_length: u8,
        max_ranges: usize,
    ) -> Result<Vec<PartitionRange>> {
        let count = self.partition_range_count(hash_key_length);
        if count > max_ranges as u64 {
            return Err(GeoKvError::Config(format!(
                "Query covers {} cells split into {} partition ranges, above the limit of {}; \
                lower hash_key_length or raise max_partition_ranges",
                self.len(),
                count,
                max_ranges
            )));
        }
        Ok(self.partition_ranges(hash_key_length))
    }

    /// Every cell's interval split into partition-scoped ranges.
    pub fn partition_ranges(&self, hash_key_length: u8) -> Vec<PartitionRange> {
        self.geo_hash_ranges()
            .flat_map(|range| split_range(range, hash_key_length))
            .collect()
    }
}
