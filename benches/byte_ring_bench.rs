//! Criterion benchmark untuk Byte Ring vs sync_channel
//!
//! Run dengan: cargo bench

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};

use bytering::{ByteRing, DEFAULT_CAPACITY};

const CHUNK_SIZES: [usize; 3] = [128, 1024, 2048];

/// Kirim `iters` chunk lewat ring, ukur sampai consumer menerima semuanya
fn run_ring(chunk_size: usize, iters: u64) -> Duration {
    let (mut producer, mut consumer) = ByteRing::new(DEFAULT_CAPACITY).split();
    let total = chunk_size as u64 * iters;

    let start = Instant::now();
    let writer = thread::spawn(move || {
        let chunk = vec![0u8; chunk_size];
        for _ in 0..iters {
            if producer.write(black_box(&chunk)) == 0 {
                break;
            }
        }
    });

    let mut buf = vec![0u8; chunk_size];
    let mut received = 0u64;
    while received < total {
        let n = consumer.read(&mut buf);
        if n == 0 {
            break;
        }
        received += n as u64;
    }
    let elapsed = start.elapsed();

    writer.join().ok();
    elapsed
}

/// Baseline: setiap chunk di-copy ke Vec baru lalu dikirim lewat channel
fn run_channel(chunk_size: usize, iters: u64) -> Duration {
    let (tx, rx) = mpsc::sync_channel::<Vec<u8>>(chunk_size);

    let start = Instant::now();
    let writer = thread::spawn(move || {
        let chunk = vec![0u8; chunk_size];
        for _ in 0..iters {
            if tx.send(black_box(chunk.clone())).is_err() {
                break;
            }
        }
    });

    for _ in 0..iters {
        if rx.recv().is_err() {
            break;
        }
    }
    let elapsed = start.elapsed();

    writer.join().ok();
    elapsed
}

fn bench_spsc_stream(c: &mut Criterion) {
    let mut group = c.benchmark_group("spsc_stream");

    for &size in CHUNK_SIZES.iter() {
        group.throughput(Throughput::Bytes(size as u64));

        group.bench_with_input(BenchmarkId::new("byte_ring", size), &size, |b, &size| {
            b.iter_custom(|iters| run_ring(size, iters));
        });

        group.bench_with_input(BenchmarkId::new("sync_channel", size), &size, |b, &size| {
            b.iter_custom(|iters| run_channel(size, iters));
        });
    }

    group.finish();
}

fn bench_single_thread(c: &mut Criterion) {
    let mut group = c.benchmark_group("single_thread");

    // Write lalu read di thread yang sama: ukur biaya copy + lock tanpa contention
    for &size in CHUNK_SIZES.iter() {
        group.throughput(Throughput::Bytes(size as u64));
        group.bench_with_input(BenchmarkId::new("write_read", size), &size, |b, &size| {
            let (mut producer, mut consumer) = ByteRing::new(DEFAULT_CAPACITY).split();
            let chunk = vec![0u8; size];
            let mut buf = vec![0u8; size];
            b.iter(|| {
                producer.write(black_box(&chunk));
                black_box(consumer.read(&mut buf));
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_spsc_stream, bench_single_thread);
criterion_main!(benches);
