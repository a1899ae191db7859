//! Exact post-filter applied to scanned items.

use crate::compute::geojson::point_from_item;
use crate::compute::spatial::{bounding_rect_for_radius, earth_distance};
use crate::config::Config;
use crate::error::Result;
use crate::storage::Item;
use crate::types::{GeoPoint, GeoRect};
use log::trace;

/// Region a query must return points from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GeoFilter {
    Rectangle(GeoRect),
    Radius { center: GeoPoint, radius_meters: f64 },
}

impl GeoFilter {
    /// Rectangle handed to the coverer.
    pub fn bounding_rect(&self) -> GeoRect {
        match self {
            Self::Rectangle(rect) => *rect,
            Self::Radius {
                center,
                radius_meters,
            } => bounding_rect_for_radius(center, *radius_meters),
        }
    }

    pub fn contains(&self, point: &GeoPoint) -> bool {
        match self {
            Self::Rectangle(rect) => rect.contains(point),
            Self::Radius {
                center,
                radius_meters,
            } => earth_distance(center, point) <= *radius_meters,
        }
    }

    /// Keep the items whose stored location lies in the region.
    ///
    /// An item with a missing or unreadable location fails the whole call.
    pub fn apply(&self, items: Vec<Item>, config: &Config) -> Result<Vec<Item>> {
        let mut kept = Vec::with_capacity(items.len());
        for item in items {
            let point = point_from_item(&item, config)?;
            let keep = self.contains(&point);
            trace!("Post-filter {} -> {}", point, if keep { "keep" } else { "drop" });
            if keep {
                kept.push(item);
            }
        }
        Ok(kept)
    }
}
