//! # Odor Mix Benchmarks
//!
//! Measures the odor mix computation and EEPROM image generation.
//!
//! Run: `cargo bench --bench odor_mix_bench`

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use harp_olfactometer::{CalibrationTable, ConfigureOdorMix, EepromImage};

/// Benchmark message generation for a full mix
fn bench_mix(c: &mut Criterion) {
    let mut group = c.benchmark_group("odor_mix");

    let mix = ConfigureOdorMix::new()
        .with_percentage(0, 0.1)
        .and_then(|m| m.with_percentage(1, 0.2))
        .and_then(|m| m.with_percentage(2, 0.3))
        .expect("valid percentages");

    group.bench_function("flows", |b| b.iter(|| black_box(mix.flows())));

    group.bench_function("messages", |b| b.iter(|| black_box(mix.messages().unwrap())));

    let carrier = mix.clone().with_channel3_as_carrier(true);
    group.bench_function("messages_carrier", |b| {
        b.iter(|| black_box(carrier.messages().unwrap()))
    });

    for count in [10usize, 100, 1000] {
        group.bench_with_input(BenchmarkId::new("generate_for", count), &count, |b, &count| {
            b.iter(|| mix.generate_for(0..count).count())
        });
    }

    group.finish();
}

/// Benchmark the EEPROM image
fn bench_eeprom(c: &mut Criterion) {
    let mut group = c.benchmark_group("eeprom");

    let csv = (0..6)
        .map(|row| {
            (0..12)
                .map(|col| (row * 100 + col).to_string())
                .collect::<Vec<_>>()
                .join(",")
        })
        .collect::<Vec<_>>()
        .join("\n");

    group.bench_function("parse_csv", |b| {
        b.iter(|| black_box(CalibrationTable::parse_csv(&csv).unwrap()))
    });

    let table = CalibrationTable::parse_csv(&csv).expect("valid table");
    group.bench_function("generate_intel_hex", |b| {
        b.iter(|| {
            let image = EepromImage::generate(&table, 1140, 24).unwrap();
            black_box(image.to_intel_hex())
        })
    });

    group.finish();
}

criterion_group!(benches, bench_mix, bench_eeprom);
criterion_main!(benches);
