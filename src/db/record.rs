//! Typed views of stored items.

use crate::compute::geojson::{point_feature, point_from_item};
use crate::config::Config;
use crate::error::{GeoKvError, Result};
use crate::storage::{AttributeValue, Item};
use crate::types::GeoPoint;
use geojson::FeatureCollection;
use geojson::feature::Id;
use serde::Serialize;
use serde::de::DeserializeOwned;

/// A stored point split into its library-owned parts and the caller's attributes.
#[derive(Debug, Clone, PartialEq)]
pub struct GeoRecord {
    pub hash_key: u64,
    pub range_key: String,
    pub geo_hash: u64,
    pub point: GeoPoint,
    /// Every attribute that is not one of the four library-owned ones.
    pub attributes: Item,
}

impl GeoRecord {
    pub fn from_item(item: &Item, config: &Config) -> Result<Self> {
        let number = |name: &str| -> Result<u64> {
            item.get(name)
                .ok_or_else(|| GeoKvError::invalid_item(name, "missing"))?
                .as_u64()
                .ok_or_else(|| GeoKvError::invalid_item(name, "expected an unsigned number"))
        };

        let range_name = config.range_key_attribute_name.as_str();
        let range_key = item
            .get(range_name)
            .and_then(AttributeValue::as_s)
            .ok_or_else(|| GeoKvError::invalid_item(range_name, "missing or not a string"))?
            .to_string();

        let reserved = config.reserved_attribute_names();
        let attributes = item
            .iter()
            .filter(|(name, _)| !reserved.contains(&name.as_str()))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();

        Ok(Self {
            hash_key: number(&config.hash_key_attribute_name)?,
            range_key,
            geo_hash: number(&config.geo_hash_attribute_name)?,
            point: point_from_item(item, config)?,
            attributes,
        })
    }
}

/// Plain JSON object view of an item.
pub fn item_to_json(item: &Item) -> serde_json::Value {
    serde_json::Value::Object(
        item.iter()
            .map(|(name, value)| (name.clone(), value.to_json()))
            .collect(),
    )
}

/// Decode one item into a caller type through its JSON view.
pub fn decode_item<T: DeserializeOwned>(item: &Item) -> Result<T> {
    Ok(serde_json::from_value(item_to_json(item))?)
}

/// Decode items into caller types, naming the position of the first item that fails.
pub fn decode_items<T: DeserializeOwned>(items: &[Item]) -> Result<Vec<T>> {
    items
        .iter()
        .enumerate()
        .map(|(idx, item)| {
            decode_item(item).map_err(|e| {
                GeoKvError::Serialization(format!("Failed to decode item {}: {}", idx, e))
            })
        })
        .collect()
}

/// Encode a caller value as item attributes. The value must serialise to a JSON object.
pub fn attributes_from<T: Serialize>(value: &T) -> Result<Item> {
    match serde_json::to_value(value) {
        Ok(serde_json::Value::Object(map)) => Ok(map
            .iter()
            .map(|(k, v)| (k.clone(), AttributeValue::from_json(v)))
            .collect()),
        Ok(other) => Err(GeoKvError::Serialization(format!(
            "Attributes must serialise to an object, got: {}",
            other
        ))),
        Err(e) => Err(GeoKvError::Serialization(format!(
            "Failed to encode attributes: {}",
            e
        ))),
    }
}

/// GeoJSON FeatureCollection with one feature per record, keyed by range key.
pub fn records_to_feature_collection(records: &[GeoRecord]) -> FeatureCollection {
    let features = records
        .iter()
        .map(|record| {
            let properties = match item_to_json(&record.attributes) {
                serde_json::Value::Object(map) => map,
                _ => serde_json::Map::new(),
            };
            let mut feature = point_feature(&record.point, properties);
            feature.id = Some(Id::String(record.range_key.clone()));
            feature
        })
        .collect();

    FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    }
}
