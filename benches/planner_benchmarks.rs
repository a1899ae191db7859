use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use geokv::compute::covering::Covering;
use geokv::compute::ranges::split_range;
use geokv::compute::spatial::bounding_rect_for_radius;
use geokv::prelude::*;
use std::sync::Arc;

fn benchmark_planning(c: &mut Criterion) {
    let mut group = c.benchmark_group("planning");
    let center = GeoPoint::new(40.7128, -74.0060);
    let coverer = CovererConfig::default();

    for radius in [500.0, 5_000.0, 50_000.0] {
        group.bench_with_input(BenchmarkId::new("covering", radius as u64), &radius, |b, r| {
            b.iter(|| {
                let rect = bounding_rect_for_radius(black_box(&center), *r);
                Covering::for_rect(&rect, &coverer).len()
            })
        });
    }

    let rect = bounding_rect_for_radius(&center, 5_000.0);
    let covering = Covering::for_rect(&rect, &coverer);
    for hash_key_length in [2u8, 6, 8] {
        group.bench_with_input(
            BenchmarkId::new("split_ranges", hash_key_length),
            &hash_key_length,
            |b, k| {
                b.iter(|| {
                    covering
                        .geo_hash_ranges()
                        .map(|range| split_range(black_box(range), *k).len())
                        .sum::<usize>()
                })
            },
        );
    }

    group.finish();
}

fn benchmark_queries(c: &mut Criterion) {
    let mut group = c.benchmark_group("queries");
    let cancel = CancellationToken::new();
    let table = GeoTableBuilder::new()
        .table_name("bench")
        .store(Arc::new(MemoryStore::new()))
        .build()
        .unwrap();
    table.create_table(&cancel).unwrap();

    let inputs: Vec<_> = (0..2_000)
        .map(|i| {
            let lat = 40.70 + (i % 50) as f64 * 0.001;
            let lng = -74.02 + (i / 50) as f64 * 0.001;
            PutPointInput::new(GeoPoint::new(lat, lng), format!("p{i}"))
        })
        .collect();
    table.batch_write_points(&inputs, &cancel).unwrap();

    let center = GeoPoint::new(40.725, -74.0);
    for radius in [250.0, 1_000.0, 3_000.0] {
        let input = QueryRadiusInput::new(center, radius);
        group.bench_with_input(BenchmarkId::new("radius", radius as u64), &input, |b, q| {
            b.iter(|| table.query_radius(black_box(q), &cancel).unwrap().len())
        });
    }

    let rect = QueryRectangleInput::new(GeoPoint::new(40.71, -74.01), GeoPoint::new(40.73, -73.99));
    group.bench_function("rectangle", |b| {
        b.iter(|| table.query_rectangle(black_box(&rect), &cancel).unwrap().len())
    });

    group.bench_function("single_put", |b| {
        let mut counter = 0u64;
        b.iter(|| {
            counter += 1;
            let input = PutPointInput::new(center, format!("bench:{counter}"));
            table.put_point(black_box(&input), &cancel).unwrap()
        })
    });

    group.finish();
}

criterion_group!(benches, benchmark_planning, benchmark_queries);
criterion_main!(benches);
