mod common;

use common::{memory_table, range_key};
use geokv::{
    AttributeAction, AttributeUpdates, AttributeValue, CancellationToken, Config, DeletePointInput,
    GeoKvError, GeoPoint, GetPointInput, PutPointInput, QueryRadiusInput, UpdatePointInput,
};
use serde::{Deserialize, Serialize};

#[test]
fn test_put_get_delete_round_trip() {
    let table = memory_table(Config::new("roundtrip"));
    let cancel = CancellationToken::new();
    let point = GeoPoint::new(37.7749, -122.4194);

    let put = table
        .put_point(
            &PutPointInput::new(point, "sf").with_attribute("name", "Blue Bottle"),
            &cancel,
        )
        .unwrap();

    let item = table
        .get_point(&GetPointInput::new(point, "sf"), &cancel)
        .unwrap()
        .unwrap();
    assert_eq!(item, put.item);
    assert_eq!(item["name"].as_s(), Some("Blue Bottle"));

    let removed = table
        .delete_point(&DeletePointInput::new(point, "sf"), &cancel)
        .unwrap();
    assert_eq!(removed, Some(put.item));
    assert!(
        table
            .get_point(&GetPointInput::new(point, "sf"), &cancel)
            .unwrap()
            .is_none()
    );
    assert!(
        table
            .query_radius(&QueryRadiusInput::new(point, 100.0), &cancel)
            .unwrap()
            .is_empty()
    );
}

#[test]
fn test_same_id_at_another_location_is_another_record() {
    let table = memory_table(Config::new("ids"));
    let cancel = CancellationToken::new();
    let here = GeoPoint::new(1.0, 1.0);
    let there = GeoPoint::new(-45.0, 170.0);

    table.put_point(&PutPointInput::new(here, "x"), &cancel).unwrap();
    table.put_point(&PutPointInput::new(there, "x"), &cancel).unwrap();

    assert!(table.get_point(&GetPointInput::new(here, "x"), &cancel).unwrap().is_some());
    assert!(table.get_point(&GetPointInput::new(there, "x"), &cancel).unwrap().is_some());
    assert_eq!(table.store().item_count("ids").unwrap(), 2);
}

#[test]
fn test_update_keeps_location_immutable() {
    let table = memory_table(Config::new("update"));
    let cancel = CancellationToken::new();
    let point = GeoPoint::new(52.52, 13.405);
    let put = table
        .put_point(
            &PutPointInput::new(point, "berlin").with_attribute("visits", 1u32),
            &cancel,
        )
        .unwrap();

    let mut updates = AttributeUpdates::new();
    updates.insert("geohash".into(), AttributeAction::Put(AttributeValue::from(42u64)));
    updates.insert(
        "geoJson".into(),
        AttributeAction::Put(r#"{"type":"POINT","coordinates":[0.0,0.0]}"#.into()),
    );
    updates.insert("visits".into(), AttributeAction::Put(2u32.into()));
    updates.insert("note".into(), AttributeAction::Put("busy".into()));

    let updated = table
        .update_point(&UpdatePointInput::new(point, "berlin", updates), &cancel)
        .unwrap()
        .unwrap();
    assert_eq!(updated["geohash"], put.item["geohash"]);
    assert_eq!(updated["geoJson"], put.item["geoJson"]);
    assert_eq!(updated["visits"].as_u64(), Some(2));
    assert_eq!(updated["note"].as_s(), Some("busy"));

    let mut removal = AttributeUpdates::new();
    removal.insert("note".into(), AttributeAction::Delete);
    let updated = table
        .update_point(&UpdatePointInput::new(point, "berlin", removal), &cancel)
        .unwrap()
        .unwrap();
    assert!(!updated.contains_key("note"));

    // The point is still found where it was written.
    let found = table
        .query_radius(&QueryRadiusInput::new(point, 50.0), &cancel)
        .unwrap();
    assert_eq!(found.items.len(), 1);
    assert_eq!(range_key(&found.items[0]), "berlin");
}

#[test]
fn test_batch_write_over_store_limit() {
    let table = memory_table(Config::new("batch"));
    let cancel = CancellationToken::new();
    let center = GeoPoint::new(-23.5505, -46.6333);
    let inputs: Vec<_> = common::points_in_square(center, 800.0, 73)
        .into_iter()
        .map(PutPointInput::with_random_id)
        .collect();

    let out = table.batch_write_points(&inputs, &cancel).unwrap();
    assert_eq!(out.batches, 3);
    assert!(out.unprocessed.is_empty());
    assert_eq!(table.store().item_count("batch").unwrap(), 73);

    let found = table
        .query_radius(&QueryRadiusInput::new(center, 1_000.0), &cancel)
        .unwrap();
    assert_eq!(found.items.len(), 73);
}

#[test]
fn test_batch_with_invalid_point_writes_nothing() {
    let table = memory_table(Config::new("batch-invalid"));
    let inputs = vec![
        PutPointInput::new(GeoPoint::new(1.0, 1.0), "ok"),
        PutPointInput::new(GeoPoint::new(1.0, 181.0), "bad"),
    ];
    let err = table
        .batch_write_points(&inputs, &CancellationToken::new())
        .unwrap_err();
    assert!(matches!(err, GeoKvError::InvalidInput(_)));
    assert!(err.to_string().contains("index 1"));
    assert_eq!(table.store().item_count("batch-invalid").unwrap(), 0);
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
struct Station {
    name: String,
    docks: u32,
    electric: bool,
}

#[test]
fn test_put_record_and_typed_query() {
    let table = memory_table(Config::new("stations"));
    let cancel = CancellationToken::new();
    let point = GeoPoint::new(45.5017, -73.5673);
    let station = Station {
        name: "Place des Arts".into(),
        docks: 31,
        electric: true,
    };

    table.put_record(point, "s1", &station, &cancel).unwrap();

    let found: Vec<Station> = table
        .query_radius_as(&QueryRadiusInput::new(point, 10.0), &cancel)
        .unwrap();
    assert_eq!(found, vec![station]);
}

#[test]
fn test_write_to_missing_table_is_an_error() {
    let table = geokv::GeoTableBuilder::new()
        .table_name("never-created")
        .store(std::sync::Arc::new(geokv::MemoryStore::new()))
        .build()
        .unwrap();
    let err = table
        .put_point(
            &PutPointInput::new(GeoPoint::new(0.0, 0.0), "x"),
            &CancellationToken::new(),
        )
        .unwrap_err();
    assert!(matches!(err, GeoKvError::TableNotFound(_)));
}
