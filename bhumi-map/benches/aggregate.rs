//! Cell aggregator benchmarks.
//!
//! Benchmarks the hot path of scan merging: folding height samples into
//! cell statistics and fusing pre-aggregated cells.
//!
//! Run with: `cargo bench`
//! View HTML reports in: `target/criterion/`

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};

use bhumi_map::Cell;

/// A deterministic pseudo-terrain height stream.
fn heights(n: usize) -> Vec<f32> {
    (0..n).map(|i| (i as f32 * 0.37).sin() * 2.0).collect()
}

fn bench_add_sample(c: &mut Criterion) {
    let zs = heights(10_000);
    let mut group = c.benchmark_group("aggregator");
    group.throughput(Throughput::Elements(zs.len() as u64));
    group.bench_function("add_sample_10k", |b| {
        b.iter(|| {
            let mut cell = Cell::default();
            for &z in &zs {
                cell.add_sample(black_box(z));
            }
            black_box(cell)
        })
    });
    group.finish();
}

fn bench_merge_cells(c: &mut Criterion) {
    let mut left = Cell::default();
    let mut right = Cell::default();
    for &z in &heights(1000) {
        left.add_sample(z);
        right.add_sample(z * 0.5 + 1.0);
    }
    c.bench_function("merge_cells", |b| {
        b.iter(|| {
            let mut dst = black_box(left);
            dst.merge_from(black_box(&right));
            black_box(dst)
        })
    });
}

criterion_group!(benches, bench_add_sample, bench_merge_cells);
criterion_main!(benches);
