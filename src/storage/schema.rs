//! Table provisioning request.
//!
//! ```text
//! Table: <table_name>
//!
//! Primary key:
//!   - hashKey  (Number, HASH)   leading digits of the geohash
//!   - rangeKey (String, RANGE)  caller-supplied point id
//!
//! Local secondary index <geo_hash_index_name>:
//!   - hashKey  (Number, HASH)
//!   - geohash  (Number, RANGE)  leaf cell id of the point
//!   - projection: ALL
//! ```

use crate::config::Config;
use serde::{Deserialize, Serialize};

pub const DEFAULT_READ_CAPACITY_UNITS: u64 = 10;
pub const DEFAULT_WRITE_CAPACITY_UNITS: u64 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScalarAttributeType {
    S,
    N,
    B,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum KeyType {
    Hash,
    Range,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ProjectionType {
    All,
    KeysOnly,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct KeySchemaElement {
    pub attribute_name: String,
    pub key_type: KeyType,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AttributeDefinition {
    pub attribute_name: String,
    pub attribute_type: ScalarAttributeType,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct LocalSecondaryIndex {
    pub index_name: String,
    pub key_schema: Vec<KeySchemaElement>,
    pub projection: ProjectionType,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ProvisionedThroughput {
    pub read_capacity_units: u64,
    pub write_capacity_units: u64,
}

impl Default for ProvisionedThroughput {
    fn default() -> Self {
        Self {
            read_capacity_units: DEFAULT_READ_CAPACITY_UNITS,
            write_capacity_units: DEFAULT_WRITE_CAPACITY_UNITS,
        }
    }
}

/// Create-table request for a geo-indexed table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TableSchema {
    pub table_name: String,
    pub key_schema: Vec<KeySchemaElement>,
    pub attribute_definitions: Vec<AttributeDefinition>,
    pub local_secondary_indexes: Vec<LocalSecondaryIndex>,
    pub provisioned_throughput: ProvisionedThroughput,
}

impl TableSchema {
    pub fn from_config(config: &Config) -> Self {
        let hash_key = KeySchemaElement {
            attribute_name: config.hash_key_attribute_name.clone(),
            key_type: KeyType::Hash,
        };

        Self {
            table_name: config.table_name.clone(),
            key_schema: vec![
                hash_key.clone(),
                KeySchemaElement {
                    attribute_name: config.range_key_attribute_name.clone(),
                    key_type: KeyType::Range,
                },
            ],
            attribute_definitions: vec![
                AttributeDefinition {
                    attribute_name: config.hash_key_attribute_name.clone(),
                    attribute_type: ScalarAttributeType::N,
                },
                AttributeDefinition {
                    attribute_name: config.range_key_attribute_name.clone(),
                    attribute_type: ScalarAttributeType::S,
                },
                AttributeDefinition {
                    attribute_name: config.geo_hash_attribute_name.clone(),
                    attribute_type: ScalarAttributeType::N,
                },
            ],
            local_secondary_indexes: vec![LocalSecondaryIndex {
                index_name: config.geo_hash_index_name.clone(),
                key_schema: vec![
                    hash_key,
                    KeySchemaElement {
                        attribute_name: config.geo_hash_attribute_name.clone(),
                        key_type: KeyType::Range,
                    },
                ],
                projection: ProjectionType::All,
            }],
            provisioned_throughput: ProvisionedThroughput::default(),
        }
    }

    pub fn with_throughput(mut self, read_capacity_units: u64, write_capacity_units: u64) -> Self {
        self.provisioned_throughput = ProvisionedThroughput {
            read_capacity_units,
            write_capacity_units,
        };
        self
    }

    pub fn hash_key_name(&self) -> Option<&str> {
        key_name(&self.key_schema, KeyType::Hash)
    }

    pub fn range_key_name(&self) -> Option<&str> {
        key_name(&self.key_schema, KeyType::Range)
    }

    pub fn index(&self, index_name: &str) -> Option<&LocalSecondaryIndex> {
        self.local_secondary_indexes
            .iter()
            .find(|index| index.index_name == index_name)
    }

    pub fn attribute_type(&self, attribute_name: &str) -> Option<ScalarAttributeType> {
        self.attribute_definitions
            .iter()
            .find(|def| def.attribute_name == attribute_name)
            .map(|def| def.attribute_type)
    }
}

impl LocalSecondaryIndex {
    pub fn sort_key_name(&self) -> Option<&str> {
        key_name(&self.key_schema, KeyType::Range)
    }
}

fn key_name(schema: &[KeySchemaElement], key_type: KeyType) -> Option<&str> {
    schema
        .iter()
        .find(|element| element.key_type == key_type)
        .map(|element| element.attribute_name.as_str())
}
