use std::rc::Rc;

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use keyscript::runtime::collation::CaseSense;
use keyscript::runtime::map::{Map, MapKey};
use keyscript::runtime::value::Value;

fn string_key(i: usize) -> MapKey {
    MapKey::String(Rc::from(format!("Key{}", i)))
}

fn bench_map_insert(c: &mut Criterion) {
    let mut group = c.benchmark_group("map/insert");

    for &size in &[100, 1_000, 10_000] {
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::new("integer", size), &size, |b, &n| {
            b.iter(|| {
                let mut map = Map::new();
                for i in 0..n {
                    // Reverse order exercises the sorted insert.
                    let key = (n - i) as i64;
                    let _ = map.set(MapKey::Integer(key), Value::Integer(key));
                }
                black_box(map.len());
            });
        });
        group.bench_with_input(BenchmarkId::new("string", size), &size, |b, &n| {
            b.iter(|| {
                let mut map = Map::new();
                for i in 0..n {
                    let _ = map.set(string_key(i), Value::Integer(i as i64));
                }
                black_box(map.len());
            });
        });
    }

    group.finish();
}

fn bench_map_lookup(c: &mut Criterion) {
    let mut group = c.benchmark_group("map/lookup");

    for &size in &[100, 1_000, 10_000] {
        for mode in [CaseSense::Sensitive, CaseSense::Insensitive, CaseSense::Logical] {
            let mut map = Map::new();
            let _ = map.set_case_sense(mode);
            for i in 0..size {
                let _ = map.set(string_key(i), Value::Integer(i as i64));
            }
            let keys: Vec<MapKey> = (0..size).map(string_key).collect();

            group.throughput(Throughput::Elements(size as u64));
            group.bench_with_input(BenchmarkId::new(mode.name(), size), &keys, |b, keys| {
                b.iter(|| {
                    for key in keys {
                        black_box(map.get(key));
                    }
                });
            });
        }
    }

    group.finish();
}

criterion_group!(benches, bench_map_insert, bench_map_lookup);
criterion_main!(benches);
