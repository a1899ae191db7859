//! Core value types: points, rectangles, geohash ranges and operation inputs.

use crate::storage::{AttributeUpdates, Item, ScanOptions};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A location on Earth in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    pub(crate) fn to_latlng(self) -> s2::latlng::LatLng {
        s2::latlng::LatLng::from_degrees(self.latitude, self.longitude)
    }
}

impl fmt::Display for GeoPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.latitude, self.longitude)
    }
}

impl From<GeoPoint> for geo::Point<f64> {
    fn from(p: GeoPoint) -> Self {
        geo::Point::new(p.longitude, p.latitude)
    }
}

impl From<geo::Point<f64>> for GeoPoint {
    fn from(p: geo::Point<f64>) -> Self {
        GeoPoint::new(p.y(), p.x())
    }
}

/// Axis-aligned rectangle in lat/lng space with inclusive edges.
///
/// Corners may be given in any order; the rectangle is normalised on construction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoRect {
    rect: geo::Rect<f64>,
}

impl GeoRect {
    pub fn new(corner_a: GeoPoint, corner_b: GeoPoint) -> Self {
        let a: geo::Point<f64> = corner_a.into();
        let b: geo::Point<f64> = corner_b.into();
        Self {
            rect: geo::Rect::new(a.0, b.0),
        }
    }

    /// South-west corner.
    pub fn min(&self) -> GeoPoint {
        GeoPoint::new(self.rect.min().y, self.rect.min().x)
    }

    /// North-east corner.
    pub fn max(&self) -> GeoPoint {
        GeoPoint::new(self.rect.max().y, self.rect.max().x)
    }

    pub fn center(&self) -> GeoPoint {
        let c = self.rect.center();
        GeoPoint::new(c.y, c.x)
    }

    pub fn contains(&self, point: &GeoPoint) -> bool {
        let (min, max) = (self.rect.min(), self.rect.max());
        (min.y..=max.y).contains(&point.latitude) && (min.x..=max.x).contains(&point.longitude)
    }

    pub(crate) fn to_s2_rect(self) -> s2::rect::Rect {
        let (min, max) = (self.rect.min(), self.rect.max());
        s2::rect::Rect {
            lat: s2::r1::interval::Interval::new(min.y.to_radians(), max.y.to_radians()),
            lng: s2::s1::interval::Interval::new(min.x.to_radians(), max.x.to_radians()),
        }
    }
}

/// Inclusive interval of geohash (leaf cell id) values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct GeoHashRange {
    pub range_min: u64,
    pub range_max: u64,
}

impl GeoHashRange {
    pub const fn new(range_min: u64, range_max: u64) -> Self {
        Self {
            range_min,
            range_max,
        }
    }

    pub fn contains(&self, geo_hash: u64) -> bool {
        (self.range_min..=self.range_max).contains(&geo_hash)
    }
}

/// A geohash range confined to one partition: the unit of work for one scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PartitionRange {
    pub hash_key: u64,
    pub range: GeoHashRange,
}

/// Identifies one stored point: its location (which determines the partition) and its id.
#[derive(Debug, Clone, PartialEq)]
pub struct PointInput {
    pub range_key: String,
    pub point: GeoPoint,
}

impl PointInput {
    pub fn new(point: GeoPoint, range_key: impl Into<String>) -> Self {
        Self {
            range_key: range_key.into(),
            point,
        }
    }

    /// Input keyed by a freshly generated UUID v4.
    pub fn with_random_id(point: GeoPoint) -> Self {
        Self::new(point, uuid::Uuid::new_v4().to_string())
    }
}

/// Write one point with user attributes.
///
/// Any attribute named like one of the library-owned attributes (hash key,
/// range key, geohash, geoJson) is overwritten.
#[derive(Debug, Clone, PartialEq)]
pub struct PutPointInput {
    pub key: PointInput,
    pub attributes: Item,
}

impl PutPointInput {
    pub fn new(point: GeoPoint, range_key: impl Into<String>) -> Self {
        Self {
            key: PointInput::new(point, range_key),
            attributes: Item::new(),
        }
    }

    pub fn with_random_id(point: GeoPoint) -> Self {
        Self {
            key: PointInput::with_random_id(point),
            attributes: Item::new(),
        }
    }

    pub fn with_attributes(mut self, attributes: Item) -> Self {
        self.attributes = attributes;
        self
    }

    pub fn with_attribute(
        mut self,
        name: impl Into<String>,
        value: impl Into<crate::storage::AttributeValue>,
    ) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }
}

pub type GetPointInput = PointInput;
pub type DeletePointInput = PointInput;

/// Mutate the non-geographic attributes of a stored point.
#[derive(Debug, Clone, PartialEq)]
pub struct UpdatePointInput {
    pub key: PointInput,
    pub updates: AttributeUpdates,
}

impl UpdatePointInput {
    pub fn new(point: GeoPoint, range_key: impl Into<String>, updates: AttributeUpdates) -> Self {
        Self {
            key: PointInput::new(point, range_key),
            updates,
        }
    }
}

/// Points whose location lies inside the rectangle spanned by two corners.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryRectangleInput {
    pub min_point: GeoPoint,
    pub max_point: GeoPoint,
    pub options: ScanOptions,
}

impl QueryRectangleInput {
    pub fn new(min_point: GeoPoint, max_point: GeoPoint) -> Self {
        Self {
            min_point,
            max_point,
            options: ScanOptions::default(),
        }
    }

    pub fn with_options(mut self, options: ScanOptions) -> Self {
        self.options = options;
        self
    }

    pub fn rect(&self) -> GeoRect {
        GeoRect::new(self.min_point, self.max_point)
    }
}

/// Points within `radius_meters` of `center`.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryRadiusInput {
    pub center: GeoPoint,
    pub radius_meters: f64,
    pub options: ScanOptions,
}

impl QueryRadiusInput {
    pub fn new(center: GeoPoint, radius_meters: f64) -> Self {
        Self {
            center,
            radius_meters,
            options: ScanOptions::default(),
        }
    }

    pub fn with_options(mut self, options: ScanOptions) -> Self {
        self.options = options;
        self
    }
}
