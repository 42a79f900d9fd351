//! Benchmarks for the Prism transformation pipeline.
//!
//! Run with: cargo bench -p prism-core

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use image::DynamicImage;
use prism_core::config::{LimitsConfig, SkipPolicy, TransformConfig};
use prism_core::pipeline::{Executor, OperationSpec, PipelineRequest};
use prism_core::{codec, ArgMap, Config, EncodingFormat, Image, ImageCodec, MemoryObjectStore, Prism, Registry};
use std::sync::Arc;

fn operations() -> Vec<OperationSpec> {
    vec![
        OperationSpec::new("details", ArgMap::new()),
        OperationSpec::new("rotate", ArgMap::new().with("rotation_angle", 90)),
        OperationSpec::new(
            "resize",
            ArgMap::new().with("target_width", 640).with("target_height", 480),
        ),
        OperationSpec::new("grayscale", ArgMap::new()),
        OperationSpec::new("brightness", ArgMap::new().with("brightness_delta", 1.2)),
    ]
}

fn benchmark_executor(c: &mut Criterion) {
    let transform = TransformConfig::default();
    let limits = LimitsConfig::default();
    let executor = Executor::new(Registry::global(), SkipPolicy::Record, &transform, &limits);
    let source = Image::new(DynamicImage::new_rgb8(1920, 1080));
    let ops = operations();

    c.bench_function("executor_five_steps_1080p", |b| {
        b.iter(|| {
            let _ = executor.execute("bench", "source.png", black_box(source.clone()), &ops);
        })
    });
}

fn benchmark_transform_jpeg(c: &mut Criterion) {
    let transform = TransformConfig::default();
    let limits = LimitsConfig::default();
    let executor = Executor::new(Registry::global(), SkipPolicy::Record, &transform, &limits);
    let source = Image::new(DynamicImage::new_rgba8(1280, 720));
    let ops = vec![OperationSpec::new(
        "transform",
        ArgMap::new().with("target_format", "jpeg").with("compress_quality", 80),
    )];

    c.bench_function("transform_to_jpeg_720p", |b| {
        b.iter(|| {
            let _ = executor.execute("bench", "source.png", black_box(source.clone()), &ops);
        })
    });
}

fn benchmark_decode(c: &mut Criterion) {
    let bytes = codec::encode(&DynamicImage::new_rgb8(1920, 1080), EncodingFormat::Png, None)
        .expect("encode fixture");
    let decoder = ImageCodec::default();

    c.bench_function("decode_png_1080p", |b| {
        b.iter(|| {
            let _ = decoder.decode(black_box(&bytes), "source.png");
        })
    });
}

fn benchmark_full_run(c: &mut Criterion) {
    let store = Arc::new(MemoryObjectStore::new());
    let bytes = codec::encode(&DynamicImage::new_rgb8(1920, 1080), EncodingFormat::Png, None)
        .expect("encode fixture");
    store.insert("bench", "source.png", bytes);
    let prism = Prism::new(Config::default(), store);
    let request = PipelineRequest::new("bench", "source.png", operations());

    c.bench_function("full_run_fetch_execute_persist", |b| {
        b.iter(|| {
            let _ = prism.run(black_box(&request));
        })
    });
}

criterion_group!(
    benches,
    benchmark_executor,
    benchmark_transform_jpeg,
    benchmark_decode,
    benchmark_full_run,
);
criterion_main!(benches);
