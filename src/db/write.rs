//! Write path: put, batch put, get, update and delete of single points.

use super::GeoTable;
use super::record::attributes_from;
use crate::cancel::CancellationToken;
use crate::compute::geojson::encode_point;
use crate::compute::ranges::{geo_hash, hash_key};
use crate::compute::validation::{validate_geo_point, validate_points};
use crate::error::Result;
use crate::storage::{
    AttributeValue, BatchWriteRequest, DeleteItemRequest, GeoStore, GetItemRequest, Item,
    MAX_BATCH_WRITE_ITEMS, PutItemRequest, UpdateItemRequest, WriteRequest,
};
use crate::types::{
    DeletePointInput, GeoPoint, GetPointInput, PointInput, PutPointInput, UpdatePointInput,
};
use log::debug;
use serde::Serialize;

/// Item written by [`GeoTable::put_point`].
#[derive(Debug, Clone, PartialEq)]
pub struct PutPointOutput {
    pub hash_key: u64,
    pub geo_hash: u64,
    pub item: Item,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchWritePointsOutput {
    /// Store batches submitted.
    pub batches: usize,
    /// Writes the store reported as unprocessed, across all batches.
    pub unprocessed: Vec<WriteRequest>,
}

impl<S: GeoStore + ?Sized> GeoTable<S> {
    /// Write one point with its attributes.
    ///
    /// The hash key, range key, geohash and geoJson attributes are always set
    /// by the table and replace any caller value under those names.
    pub fn put_point(
        &self,
        input: &PutPointInput,
        cancel: &CancellationToken,
    ) -> Result<PutPointOutput> {
        let (item, hash_key, geo_hash) = self.point_item(input)?;
        cancel.check()?;
        self.store.put_item(PutItemRequest {
            table_name: self.config.table_name.clone(),
            item: item.clone(),
        })?;
        Ok(PutPointOutput {
            hash_key,
            geo_hash,
            item,
        })
    }

    /// Write a point whose attributes come from a serialisable value.
    pub fn put_record<T: Serialize>(
        &self,
        point: GeoPoint,
        range_key: impl Into<String>,
        record: &T,
        cancel: &CancellationToken,
    ) -> Result<PutPointOutput> {
        let input =
            PutPointInput::new(point, range_key).with_attributes(attributes_from(record)?);
        self.put_point(&input, cancel)
    }

    /// Write many points, at most [`MAX_BATCH_WRITE_ITEMS`] per store batch.
    ///
    /// Every input is encoded before the first batch is sent. A store error
    /// stops the remaining batches; earlier batches stay written.
    pub fn batch_write_points(
        &self,
        inputs: &[PutPointInput],
        cancel: &CancellationToken,
    ) -> Result<BatchWritePointsOutput> {
        validate_points(inputs.iter().map(|input| &input.key.point))?;
        let writes = inputs
            .iter()
            .map(|input| self.point_item(input).map(|(item, _, _)| WriteRequest::Put(item)))
            .collect::<Result<Vec<_>>>()?;

        let mut output = BatchWritePointsOutput::default();
        for chunk in writes.chunks(MAX_BATCH_WRITE_ITEMS) {
            cancel.check()?;
            let result = self.store.batch_write_item(BatchWriteRequest {
                table_name: self.config.table_name.clone(),
                requests: chunk.to_vec(),
            })?;
            output.batches += 1;
            output.unprocessed.extend(result.unprocessed);
        }
        debug!(
            "Batch wrote {} points in {} batches, {} unprocessed",
            inputs.len(),
            output.batches,
            output.unprocessed.len()
        );
        Ok(output)
    }

    /// Fetch one point by location and id.
    pub fn get_point(
        &self,
        input: &GetPointInput,
        cancel: &CancellationToken,
    ) -> Result<Option<Item>> {
        let key = self.key_for(input)?;
        cancel.check()?;
        self.store.get_item(&GetItemRequest {
            table_name: self.config.table_name.clone(),
            key,
            consistent_read: self.config.consistent_read,
        })
    }

    /// Change the non-geographic attributes of a stored point.
    ///
    /// Updates addressed to the geohash or geoJson attributes are dropped.
    pub fn update_point(
        &self,
        input: &UpdatePointInput,
        cancel: &CancellationToken,
    ) -> Result<Option<Item>> {
        let key = self.key_for(&input.key)?;
        let geo_hash_name = self.config.geo_hash_attribute_name.as_str();
        let geo_json_name = self.config.geo_json_attribute_name.as_str();

        let updates = input
            .updates
            .iter()
            .filter(|(name, _)| {
                let immutable = name.as_str() == geo_hash_name || name.as_str() == geo_json_name;
                if immutable {
                    debug!("Dropping update of location attribute '{}'", name);
                }
                !immutable
            })
            .map(|(name, action)| (name.clone(), action.clone()))
            .collect();

        cancel.check()?;
        self.store.update_item(UpdateItemRequest {
            table_name: self.config.table_name.clone(),
            key,
            updates,
        })
    }

    /// Delete one point, returning the removed item if there was one.
    pub fn delete_point(
        &self,
        input: &DeletePointInput,
        cancel: &CancellationToken,
    ) -> Result<Option<Item>> {
        let key = self.key_for(input)?;
        cancel.check()?;
        self.store.delete_item(&DeleteItemRequest {
            table_name: self.config.table_name.clone(),
            key,
        })
    }

    fn key_for(&self, input: &PointInput) -> Result<Item> {
        validate_geo_point(&input.point)?;
        let hash_key = hash_key(geo_hash(&input.point), self.config.hash_key_length);
        let mut key = Item::new();
        key.insert(
            self.config.hash_key_attribute_name.clone(),
            hash_key.into(),
        );
        key.insert(
            self.config.range_key_attribute_name.clone(),
            AttributeValue::S(input.range_key.clone()),
        );
        Ok(key)
    }

    fn point_item(&self, input: &PutPointInput) -> Result<(Item, u64, u64)> {
        let point = &input.key.point;
        validate_geo_point(point)?;
        let geo_hash = geo_hash(point);
        let hash_key = hash_key(geo_hash, self.config.hash_key_length);

        let mut item = input.attributes.clone();
        item.insert(
            self.config.hash_key_attribute_name.clone(),
            hash_key.into(),
        );
        item.insert(
            self.config.range_key_attribute_name.clone(),
            AttributeValue::S(input.key.range_key.clone()),
        );
        item.insert(
            self.config.geo_hash_attribute_name.clone(),
            geo_hash.into(),
        );
        item.insert(
            self.config.geo_json_attribute_name.clone(),
            AttributeValue::S(encode_point(point, self.config.longitude_first)?),
        );
        Ok((item, hash_key, geo_hash))
    }
}
