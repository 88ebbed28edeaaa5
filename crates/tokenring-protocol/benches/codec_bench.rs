//! Benchmarks for the token ring wire path
//!
//! Measures performance of:
//! - Record encoding and decoding
//! - Payload truncation
//! - Turn-rule laps around rings of increasing size

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use tokenring_protocol::codec::{decode, encode};
use tokenring_protocol::{apply_turn, Payload, Token, PAYLOAD_CAPACITY, RECORD_LEN};
use tokenring_topology::{Position, RingSize};

fn token_with(len: usize) -> Token {
    let mut token = Token::new();
    token.load(Some(Position::new(1)), Payload::new(&"m".repeat(len)));
    token
}

/// Benchmark record encoding at different payload sizes
fn bench_encode(c: &mut Criterion) {
    let mut group = c.benchmark_group("encode");
    group.throughput(Throughput::Bytes(RECORD_LEN as u64));

    for &len in &[0usize, 16, 256, PAYLOAD_CAPACITY] {
        let token = token_with(len);
        group.bench_with_input(BenchmarkId::new("payload", len), &token, |b, t| {
            b.iter(|| encode(black_box(t)))
        });
    }
    group.finish();
}

/// Benchmark record decoding at different payload sizes
fn bench_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode");
    group.throughput(Throughput::Bytes(RECORD_LEN as u64));

    for &len in &[0usize, 16, 256, PAYLOAD_CAPACITY] {
        let record = encode(&token_with(len)).expect("bench token encodes");
        group.bench_with_input(BenchmarkId::new("payload", len), &record, |b, r| {
            b.iter(|| decode(black_box(r)))
        });
    }
    group.finish();
}

/// Benchmark truncation of oversized user input
fn bench_truncation(c: &mut Criterion) {
    let mut group = c.benchmark_group("truncation");

    let ascii = "a".repeat(PAYLOAD_CAPACITY * 4);
    let multibyte = "\u{00e9}".repeat(PAYLOAD_CAPACITY);
    let with_nul = format!("{}\0{}", "b".repeat(64), "c".repeat(PAYLOAD_CAPACITY));

    for (name, text) in [("ascii", &ascii), ("multibyte", &multibyte), ("nul", &with_nul)] {
        group.bench_with_input(BenchmarkId::from_parameter(name), text, |b, t| {
            b.iter(|| Payload::truncating(black_box(t)))
        });
    }
    group.finish();
}

/// Benchmark one full lap of the turn rule
fn bench_lap(c: &mut Criterion) {
    let mut group = c.benchmark_group("turn_lap");

    for &n in &[2u32, 10, 50, 100] {
        let size = match RingSize::new(n) {
            Ok(size) => size,
            Err(_) => continue,
        };
        group.throughput(Throughput::Elements(u64::from(n)));
        group.bench_with_input(BenchmarkId::new("ring_size", n), &size, |b, &size| {
            b.iter(|| {
                let mut token = Token::new();
                token.load(Some(size.last()), Payload::new("lap"));
                for p in size.positions() {
                    let _ = apply_turn(&mut token, black_box(p));
                    token.advance(size);
                }
                token
            })
        });
    }
    group.finish();
}

criterion_group!(benches, bench_encode, bench_decode, bench_truncation, bench_lap);

criterion_main!(benches);
