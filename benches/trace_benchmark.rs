#![allow(clippy::expect_used, clippy::unwrap_used, missing_docs)]
//! Benchmarks for ray marching and layer tracing.

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use std::hint::black_box;
use std::sync::Arc;
use trueno_lineart::prelude::*;
use trueno_lineart::trace::SegmentCounter;

/// Radial gradient: bright center, dark corners.
fn radial_field(size: u32) -> ScalarField {
    let half = size as f32 / 2.0;
    let values = (0..size * size)
        .map(|i| {
            let dx = (i % size) as f32 - half;
            let dy = (i / size) as f32 - half;
            (255.0 - (dx * dx + dy * dy).sqrt() / half * 255.0).max(0.0)
        })
        .collect();
    ScalarField::from_intensities(size, size, values).expect("valid field")
}

fn ray_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("trace_ray");
    let field = radial_field(256);

    for step in [0.01_f32, 0.005, 0.001] {
        let tracer = LineTracer::new(TraceConfig::new().march_step(step)).expect("valid step");
        group.bench_with_input(BenchmarkId::from_parameter(step), &step, |b, _| {
            b.iter(|| {
                let mut counter = SegmentCounter::default();
                let ray = Ray::new(Point::CENTER, Point::new(1.0, 0.3));
                tracer
                    .trace_ray(black_box(&field), 128.0, ray, &mut counter)
                    .expect("trace should succeed");
                counter.count
            });
        });
    }

    group.finish();
}

fn pattern_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("trace_pattern");
    let field = radial_field(256);
    let tracer = LineTracer::default();

    for offset in [0.02_f32, 0.01, 0.005] {
        let pattern = PatternConfig::from_angle(64.0, 0.7)
            .offset_step(offset)
            .build()
            .expect("valid pattern");
        group.bench_with_input(BenchmarkId::from_parameter(offset), &offset, |b, _| {
            b.iter(|| {
                let mut counter = SegmentCounter::default();
                tracer
                    .trace_pattern(black_box(&field), &pattern, Point::CENTER, &mut counter)
                    .expect("trace should succeed")
            });
        });
    }

    group.finish();
}

fn cascade_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("cascade");
    group.sample_size(20);

    for size in [64_u32, 256, 1024] {
        let field = Arc::new(radial_field(size));
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, _| {
            b.iter(|| {
                LayerSet::default_cascade(LineTracer::default(), Arc::clone(&field))
                    .expect("valid cascade")
                    .trace_all()
                    .expect("trace should succeed")
            });
        });
    }

    group.finish();
}

criterion_group!(benches, ray_benchmark, pattern_benchmark, cascade_benchmark);
criterion_main!(benches);
