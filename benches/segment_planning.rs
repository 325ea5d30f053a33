//! Benchmarks for segment planning
//!
//! Measures chunk sizing and range computation across source lengths, from
//! a two-segment file to a multi-day recording with a small target.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::path::PathBuf;
use vidrelay::split::{chunk_duration, SegmentPlan};
use vidrelay_av::MediaDescriptor;

fn media(duration_seconds: f64, size_bytes: u64) -> MediaDescriptor {
    MediaDescriptor {
        source_path: PathBuf::from("/downloads/video.mp4"),
        duration_seconds,
        size_bytes,
        container: "mov,mp4,m4a,3gp,3g2,mj2".into(),
        video: None,
    }
}

fn bench_chunk_duration(c: &mut Criterion) {
    c.bench_function("chunk_duration", |b| {
        b.iter(|| {
            chunk_duration(
                black_box(7261.48),
                black_box(9_000_000_000),
                black_box(1_900_000_000),
            )
        })
    });
}

fn bench_ranges(c: &mut Criterion) {
    let mut group = c.benchmark_group("plan_ranges");

    // (label, duration, size, target)
    let cases = [
        ("two_segments", 330.0, 3_800_000_000u64, 1_900_000_000u64),
        ("feature_length", 7261.48, 9_000_000_000, 1_900_000_000),
        ("day_long_stream", 86_400.0, 120_000_000_000, 1_900_000_000),
        ("small_target", 259_200.0, 50_000_000_000, 50_000_000),
    ];

    for (label, duration, size, target) in cases {
        let plan = SegmentPlan::for_media(&media(duration, size), target, 3)
            .ok()
            .flatten()
            .expect("benchmark cases always split");
        group.throughput(Throughput::Elements(plan.max_iterations() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(label), &plan, |b, plan| {
            b.iter(|| black_box(plan).ranges())
        });
    }

    group.finish();
}

criterion_group!(benches, bench_chunk_duration, bench_ranges);
criterion_main!(benches);
