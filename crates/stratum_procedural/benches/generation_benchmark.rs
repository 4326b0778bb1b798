//! Benchmark for the generation stack and region slicing.
//!
//! TARGET: one 512x512 region in well under a second
//!
//! Run with: cargo bench --package stratum_procedural --bench generation_benchmark

use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use stratum_core::{Area, GridPool, WorldSeed};
use stratum_procedural::{encode_region, ChunkCoord, GenerationStack, RegionCoord, CHUNK_SIZE};

fn benchmark_chunk_area(c: &mut Criterion) {
    let stack = GenerationStack::standard();
    let ctx = stack.initialize(WorldSeed::new(42));

    c.bench_function("single_chunk_evaluation", |b| {
        let mut n = 0i32;
        b.iter(|| {
            n = n.wrapping_add(1);
            let chunk = ChunkCoord::new(n, n / 2);
            black_box(stack.generate(&ctx, chunk.area()))
        });
    });
}

fn benchmark_region(c: &mut Criterion) {
    let plain = GenerationStack::standard();
    let pooled = GenerationStack::standard().with_pool(Arc::new(GridPool::new(16)));
    let plain_ctx = plain.initialize(WorldSeed::new(42));
    let pooled_ctx = pooled.initialize(WorldSeed::new(42));
    let area = RegionCoord::new(0, 0).area(512);

    let mut group = c.benchmark_group("region");
    group.throughput(Throughput::Elements(512 * 512));
    group.sample_size(10);
    group.bench_function("512x512_region", |b| {
        b.iter(|| black_box(plain.generate(&plain_ctx, area)));
    });
    group.bench_function("512x512_region_pooled", |b| {
        b.iter(|| black_box(pooled.generate(&pooled_ctx, area)));
    });
    group.finish();
}

fn benchmark_slicing(c: &mut Criterion) {
    let stack = GenerationStack::standard();
    let coord = RegionCoord::new(0, 0);
    let Ok(slab) = stack.evaluate(WorldSeed::new(42), 0, 0, 512, 512) else {
        return;
    };

    let mut group = c.benchmark_group("slicing");
    group.throughput(Throughput::Elements(32 * 32));
    group.bench_function("1024_chunk_slices", |b| {
        b.iter(|| {
            for z in 0..32 {
                for x in 0..32 {
                    let area = Area::new(
                        x * CHUNK_SIZE as i32,
                        z * CHUNK_SIZE as i32,
                        CHUNK_SIZE,
                        CHUNK_SIZE,
                    );
                    black_box(slab.slice(area));
                }
            }
        });
    });
    group.bench_function("region_encode", |b| {
        b.iter(|| black_box(encode_region(coord, &slab)));
    });
    group.finish();
}

criterion_group!(benches, benchmark_chunk_area, benchmark_region, benchmark_slicing);
criterion_main!(benches);
