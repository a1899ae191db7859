mod common;

use geokv::{
    CancellationToken, Config, GeoKvError, GeoPoint, PutPointInput, QueryRadiusInput, ResumeMap,
    ScanErrorPolicy,
};
use std::io::Write;

fn write_temp(suffix: &str, content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

#[test]
fn test_json_config_file_drives_a_table() {
    let file = write_temp(
        ".json",
        r#"{
            "table_name": "from-file",
            "hash_key_attribute_name": "pk",
            "hash_key_length": 5,
            "longitude_first": false,
            "scan_error_policy": "fail_fast"
        }"#,
    );

    let config = Config::from_file(file.path()).unwrap();
    assert_eq!(config.table_name, "from-file");
    assert_eq!(config.hash_key_length, 5);
    assert_eq!(config.scan_error_policy, ScanErrorPolicy::FailFast);
    assert_eq!(config.range_key_attribute_name, "rangeKey");

    let table = common::memory_table(config);
    let put = table
        .put_point(
            &PutPointInput::new(GeoPoint::new(1.5, 2.5), "x"),
            &CancellationToken::new(),
        )
        .unwrap();
    assert!(put.item.contains_key("pk"));
    assert!(put.hash_key < 100_000);
}

#[test]
fn test_invalid_config_file_is_rejected() {
    let file = write_temp(".json", r#"{ "table_name": "t", "hash_key_length": 0 }"#);
    let err = Config::from_file(file.path()).unwrap_err();
    assert!(matches!(err, GeoKvError::Config(_)));
    assert!(err.to_string().contains("Hash key length"));

    let unknown = write_temp(".json", r#"{ "table_name": "t", "shards": 4 }"#);
    assert!(matches!(
        Config::from_file(unknown.path()),
        Err(GeoKvError::Config(_))
    ));
}

#[test]
fn test_wide_partitions_from_file_are_bounded_at_query_time() {
    let file = write_temp(
        ".json",
        r#"{ "table_name": "wide", "hash_key_length": 12, "max_concurrent_scans": 4 }"#,
    );
    let config = Config::from_file(file.path()).unwrap();
    assert_eq!(config.max_partition_ranges, 1_000);

    let table = common::memory_table(config);
    let cancel = CancellationToken::new();
    let center = GeoPoint::new(47.6062, -122.3321);
    table
        .put_point(&PutPointInput::new(center, "x"), &cancel)
        .unwrap();

    let input = QueryRadiusInput::new(center, 1_500.0);
    let err = table.query_radius(&input, &cancel).unwrap_err();
    assert!(matches!(err, GeoKvError::Config(_)));
    assert!(err.to_string().contains("max_partition_ranges"));
    let err = table
        .query_radius_paginated(&input, &ResumeMap::new(), 2, &cancel)
        .unwrap_err();
    assert!(matches!(err, GeoKvError::Config(_)));
    assert_eq!(table.store().stats().query_count, 0);
}

#[test]
fn test_missing_config_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = Config::from_file(dir.path().join("absent.json")).unwrap_err();
    assert!(matches!(err, GeoKvError::Io(_)));
}

#[cfg(feature = "toml")]
#[test]
fn test_toml_config_file() {
    let file = write_temp(
        ".toml",
        r#"
table_name = "from-toml"
hash_key_length = 3
consistent_read = true

[coverer]
min_level = 12
max_level = 12
max_cells = 8
level_mod = 1
"#,
    );

    let config = Config::from_file(file.path()).unwrap();
    assert_eq!(config.table_name, "from-toml");
    assert_eq!(config.hash_key_length, 3);
    assert!(config.consistent_read);
    assert_eq!(config.coverer.min_level, 12);
    assert_eq!(Config::from_toml(&config.to_toml().unwrap()).unwrap(), config);
}

#[cfg(not(feature = "toml"))]
#[test]
fn test_toml_config_file_needs_feature() {
    let file = write_temp(".toml", "table_name = \"t\"\n");
    assert!(matches!(
        Config::from_file(file.path()),
        Err(GeoKvError::Config(_))
    ));
}
