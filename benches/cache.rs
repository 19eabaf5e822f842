//! Benchmarks for the metadata caches
//!
//! Measures the hit path (the per-launch cost consumers pay), the miss
//! path (first-time interning), and the raw encoding work.

use criterion::{criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion};
use shapr::cache::{CacheContext, ShapeCache};
use shapr::dtype::DType;
use shapr::runtime::cpu::CpuRuntime;
use shapr::runtime::Runtime;
use shapr::shape::{Order, ShapeDescriptor};
use std::hint::black_box;

fn bench_shape_cache_hit(c: &mut Criterion) {
    let device = CpuRuntime::default_device();
    let cache = ShapeCache::<CpuRuntime>::new();
    let descriptor = ShapeDescriptor::from_shape(DType::F32, Order::C, &[64, 128, 32]);
    cache.buffer_for_descriptor(&descriptor, &device).unwrap();

    c.bench_function("shape_cache_hit", |b| {
        b.iter(|| {
            let buffer = cache
                .buffer_for_descriptor(black_box(&descriptor), &device)
                .unwrap();
            black_box(buffer.primary_ptr());
        });
    });
}

fn bench_shape_cache_miss(c: &mut Criterion) {
    let device = CpuRuntime::default_device();
    let descriptor = ShapeDescriptor::from_shape(DType::F32, Order::C, &[64, 128, 32]);

    c.bench_function("shape_cache_miss", |b| {
        b.iter_batched(
            ShapeCache::<CpuRuntime>::new,
            |cache| {
                let buffer = cache.buffer_for_descriptor(&descriptor, &device).unwrap();
                black_box(buffer.primary_ptr());
            },
            BatchSize::SmallInput,
        );
    });
}

fn bench_encode_by_rank(c: &mut Criterion) {
    let mut group = c.benchmark_group("shape_info_encode");
    for rank in [1usize, 2, 4, 8] {
        let shape: Vec<i64> = (0..rank).map(|i| (i + 2) as i64).collect();
        group.bench_with_input(BenchmarkId::from_parameter(rank), &shape, |b, shape| {
            b.iter(|| {
                let d = ShapeDescriptor::from_shape(DType::F32, Order::C, shape);
                black_box(d.to_shape_info());
            });
        });
    }
    group.finish();
}

fn bench_tad_lookup(c: &mut Criterion) {
    let device = CpuRuntime::default_device();
    let context = CacheContext::<CpuRuntime>::new();
    let info = ShapeDescriptor::from_shape(DType::F32, Order::C, &[32, 64, 128]).to_shape_info();
    context
        .tads()
        .tad_for_dimensions(&info, &[2], &device)
        .unwrap();

    c.bench_function("tad_cache_hit", |b| {
        b.iter(|| {
            let pack = context
                .tads()
                .tad_for_dimensions(black_box(&info), &[2], &device)
                .unwrap();
            black_box(pack.number_of_tads());
        });
    });

    c.bench_function("tad_cache_miss", |b| {
        b.iter_batched(
            CacheContext::<CpuRuntime>::new,
            |fresh| {
                let pack = fresh
                    .tads()
                    .tad_for_dimensions(&info, &[2], &device)
                    .unwrap();
                black_box(pack.number_of_tads());
            },
            BatchSize::SmallInput,
        );
    });
}

criterion_group!(
    benches,
    bench_shape_cache_hit,
    bench_shape_cache_miss,
    bench_encode_by_rank,
    bench_tad_lookup,
);
criterion_main!(benches);
