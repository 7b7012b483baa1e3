//! Microbenchmarks for windowing and the record codecs.
//!
//! Run with: `cargo bench -p rsense -- codec`

#![allow(
    missing_docs,
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use rsense::codec::{BytesSource, Deserializer, Serializer, WriterSink, binary, text};
use rsense::window::chunked;
use rsense::{AccelerometerEvent, CodecConfig, SlidingWindow};

fn events(count: i64) -> Vec<AccelerometerEvent> {
    (0..count)
        .map(|i| {
            AccelerometerEvent::builder()
                .absolute_timestamp(1_700_000_000_000 + i)
                .relative_timestamp(i * 10_000_000)
                .x((i % 7) as f32 * 0.1)
                .y(-0.3)
                .z(9.8)
                .build()
                .unwrap()
        })
        .collect()
}

fn bench_windows(c: &mut Criterion) {
    let mut group = c.benchmark_group("window");
    let data: Vec<u32> = (0..100_000).collect();

    for size in [8i64, 64, 1024] {
        let spec = SlidingWindow::builder()
            .size(size)
            .unwrap()
            .extend(data.iter().copied())
            .build()
            .unwrap();
        group.throughput(Throughput::Elements(data.len() as u64));
        group.bench_with_input(BenchmarkId::new("frozen", size), &spec, |b, spec| {
            b.iter(|| spec.windows().map(|w| w.len()).sum::<usize>());
        });
        group.bench_with_input(BenchmarkId::new("lazy", size), &size, |b, &size| {
            b.iter(|| {
                chunked(black_box(0..100_000u32), size as usize)
                    .map(|w| w.len())
                    .sum::<usize>()
            });
        });
    }

    group.finish();
}

fn bench_encode(c: &mut Criterion) {
    let mut group = c.benchmark_group("encode");
    let events = events(10_000);
    let config = CodecConfig::default();
    group.throughput(Throughput::Elements(events.len() as u64));

    group.bench_function("binary", |b| {
        b.iter(|| {
            let serializer = binary::serializer(WriterSink::new(Vec::new()), &config).unwrap();
            serializer.serialize_all(black_box(&events)).unwrap();
            serializer.close().unwrap();
        });
    });
    group.bench_function("text", |b| {
        b.iter(|| {
            let serializer = text::serializer(WriterSink::new(Vec::new()), &config).unwrap();
            serializer.serialize_all(black_box(&events)).unwrap();
            serializer.close().unwrap();
        });
    });

    group.finish();
}

fn bench_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode");
    let events = events(10_000);
    let config = CodecConfig::default();
    let binary_bytes = binary::to_vec(&events).unwrap();
    let text_bytes = text::to_string(&events).unwrap().into_bytes();
    group.throughput(Throughput::Elements(events.len() as u64));

    group.bench_function("binary", |b| {
        let source = BytesSource::from(binary_bytes.clone());
        b.iter(|| {
            let mut deserializer = binary::deserializer(source.clone(), &config).unwrap();
            deserializer.deserialize().unwrap().count()
        });
    });
    group.bench_function("text", |b| {
        let source = BytesSource::from(text_bytes.clone());
        b.iter(|| {
            let mut deserializer = text::deserializer(source.clone(), &config).unwrap();
            deserializer.deserialize().unwrap().count()
        });
    });

    group.finish();
}

criterion_group!(benches, bench_windows, bench_encode, bench_decode);
criterion_main!(benches);
