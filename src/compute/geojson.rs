//! The persisted `geoJson` location attribute, and GeoJSON export.
//!
//! Stored documents look like `{"type":"POINT","coordinates":[a,b]}` where
//! `[a,b]` is `[lng,lat]` when the table is configured longitude-first and
//! `[lat,lng]` otherwise. Readers must use the same ordering as writers.

use crate::config::Config;
use crate::error::{GeoKvError, Result};
use crate::storage::{AttributeValue, Item};
use crate::types::GeoPoint;
use geojson::{Feature, Geometry, JsonObject, Value};
use serde::{Deserialize, Serialize};

pub const GEOJSON_POINT_TYPE: &str = "POINT";

/// Wire shape of the stored location document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoJsonAttribute {
    #[serde(rename = "type")]
    pub kind: String,
    pub coordinates: Vec<f64>,
}

impl GeoJsonAttribute {
    pub fn from_point(point: &GeoPoint, longitude_first: bool) -> Self {
        let coordinates = if longitude_first {
            vec![point.longitude, point.latitude]
        } else {
            vec![point.latitude, point.longitude]
        };
        Self {
            kind: GEOJSON_POINT_TYPE.to_string(),
            coordinates,
        }
    }

    pub fn to_point(&self, longitude_first: bool) -> Option<GeoPoint> {
        if !self.kind.eq_ignore_ascii_case(GEOJSON_POINT_TYPE) {
            return None;
        }
        match self.coordinates.as_slice() {
            [a, b, ..] if longitude_first => Some(GeoPoint::new(*b, *a)),
            [a, b, ..] => Some(GeoPoint::new(*a, *b)),
            _ => None,
        }
    }
}

/// Serialise a point into the stored document.
pub fn encode_point(point: &GeoPoint, longitude_first: bool) -> Result<String> {
    serde_json::to_string(&GeoJsonAttribute::from_point(point, longitude_first))
        .map_err(|e| GeoKvError::Serialization(format!("Failed to encode geoJson: {}", e)))
}

/// Parse a stored document back into a point.
pub fn decode_point(raw: &[u8], longitude_first: bool) -> std::result::Result<GeoPoint, String> {
    let attr: GeoJsonAttribute =
        serde_json::from_slice(raw).map_err(|e| format!("unparseable geoJson: {}", e))?;
    attr.to_point(longitude_first)
        .ok_or_else(|| format!("not a point with two coordinates: {:?}", attr))
}

/// Location of a stored item, read from its `geoJson` attribute.
///
/// Both string and binary attribute values are accepted.
pub fn point_from_item(item: &Item, config: &Config) -> Result<GeoPoint> {
    let name = config.geo_json_attribute_name.as_str();
    let raw: &[u8] = match item.get(name) {
        Some(AttributeValue::S(s)) => s.as_bytes(),
        Some(AttributeValue::B(b)) => b.as_ref(),
        Some(other) => {
            return Err(GeoKvError::invalid_item(
                name,
                format!("expected S or B, found {}", other.type_name()),
            ));
        }
        None => return Err(GeoKvError::invalid_item(name, "missing")),
    };
    decode_point(raw, config.longitude_first).map_err(|reason| GeoKvError::invalid_item(name, reason))
}

/// Standard GeoJSON feature (`[lng, lat]` order) for a point.
pub fn point_feature(point: &GeoPoint, properties: JsonObject) -> Feature {
    Feature {
        bbox: None,
        geometry: Some(Geometry::new(Value::Point(vec![
            point.longitude,
            point.latitude,
        ]))),
        id: None,
        properties: Some(properties),
        foreign_members: None,
    }
}
