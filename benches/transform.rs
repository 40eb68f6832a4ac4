//! Benchmarks for the batched 8x8 DCT-II/DCT-III transform.

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use jpeg2png_rs::transform::{dct_batch, idct_batch};

fn sample_blocks(n: usize) -> Vec<f32> {
    (0..n * 64).map(|i| ((i * 31) % 2000) as f32 - 1000.0).collect()
}

fn bench_idct_batch(c: &mut Criterion) {
    let mut group = c.benchmark_group("transform_idct");

    for (name, blocks) in [("1_block", 1), ("64_blocks", 64), ("4096_blocks", 4096)] {
        let data = sample_blocks(blocks);
        group.throughput(Throughput::Elements((blocks * 64) as u64));
        group.bench_function(name, |b| {
            b.iter_batched(
                || data.clone(),
                |mut data| idct_batch(black_box(&mut data)),
                criterion::BatchSize::SmallInput,
            )
        });
    }

    group.finish();
}

fn bench_dct_batch(c: &mut Criterion) {
    let mut group = c.benchmark_group("transform_dct");

    for (name, blocks) in [("1_block", 1), ("64_blocks", 64), ("4096_blocks", 4096)] {
        let data = sample_blocks(blocks);
        group.throughput(Throughput::Elements((blocks * 64) as u64));
        group.bench_function(name, |b| {
            b.iter_batched(
                || data.clone(),
                |mut data| dct_batch(black_box(&mut data)),
                criterion::BatchSize::SmallInput,
            )
        });
    }

    group.finish();
}

criterion_group!(benches, bench_idct_batch, bench_dct_batch);
criterion_main!(benches);
