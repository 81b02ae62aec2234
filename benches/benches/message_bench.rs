//! # Harp Message Benchmarks
//!
//! Measures frame encoding, parsing and stream decoding.
//!
//! Run: `cargo bench --bench message_bench`

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use harp_core::prelude::*;
use harp_core::FrameDecoder;
use harp_olfactometer::registers::{Channel0ActualFlow, Flowmeter};
use harp_olfactometer::OlfactometerPayload;

fn flowmeter_event(i: i16) -> HarpMessage {
    Flowmeter::from_timestamped_payload(f64::from(i) * 0.001, MessageType::Event, &[i; 5])
        .expect("valid flowmeter event")
}

/// Benchmark single frame operations
fn bench_frame(c: &mut Criterion) {
    let mut group = c.benchmark_group("harp_frame");

    let msg = flowmeter_event(7);
    let bytes = msg.to_bytes();

    group.bench_function("to_bytes", |b| b.iter(|| black_box(msg.to_bytes())));

    group.bench_function("parse", |b| {
        b.iter(|| black_box(HarpMessage::parse(&bytes).unwrap()))
    });

    group.bench_function("get_timestamped_payload", |b| {
        b.iter(|| black_box(Flowmeter::get_timestamped_payload(&msg).unwrap()))
    });

    group.bench_function("decode_any_register", |b| {
        b.iter(|| black_box(OlfactometerPayload::decode(&msg).unwrap()))
    });

    group.finish();
}

/// Benchmark decoding a byte stream of mixed events
fn bench_stream(c: &mut Criterion) {
    let mut group = c.benchmark_group("harp_stream");

    let mut wire = Vec::new();
    for i in 0..1000i16 {
        wire.extend_from_slice(&flowmeter_event(i).to_bytes());
        let flow = Channel0ActualFlow::from_timestamped_payload(0.0, MessageType::Event, &f32::from(i))
            .expect("valid flow event");
        wire.extend_from_slice(&flow.to_bytes());
    }
    group.throughput(Throughput::Bytes(wire.len() as u64));

    group.bench_function("frame_decoder", |b| {
        b.iter(|| {
            let mut decoder = FrameDecoder::new();
            decoder.extend(&wire);
            let mut count = 0;
            while let Some(frame) = decoder.next_frame() {
                black_box(frame.unwrap());
                count += 1;
            }
            count
        })
    });

    group.bench_function("parse_timestamped", |b| {
        b.iter(|| {
            let mut decoder = FrameDecoder::new();
            decoder.extend(&wire);
            std::iter::from_fn(|| decoder.next_frame())
                .map(|r| r.unwrap())
                .events()
                .parse_timestamped::<Flowmeter>()
                .count()
        })
    });

    group.finish();
}

criterion_group!(benches, bench_frame, bench_stream);
criterion_main!(benches);
