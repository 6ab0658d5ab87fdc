//! Bytering Benchmark - Byte Ring vs sync_channel
//!
//! Mengukur throughput satu producer + satu consumer:
//! - Byte Ring: copy langsung ke storage tetap, tanpa alokasi per chunk
//! - sync_channel: setiap chunk jadi Vec<u8> baru
//!
//! Usage:
//!   cargo run --release -- [--capacity N] [--chunk N] [--megabytes N] [--anon]

use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};

use bytering::{Backing, ByteRing, RingConfig, RingError};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Konfigurasi benchmark
struct BenchConfig {
    ring: RingConfig,
    chunk_size: usize,
    megabytes: usize,
}

impl BenchConfig {
    fn total_bytes(&self) -> usize {
        self.megabytes * 1024 * 1024
    }
}

/// Hasil satu run
struct RunResult {
    bytes: usize,
    duration: Duration,
}

impl RunResult {
    fn mb_per_sec(&self) -> f64 {
        self.bytes as f64 / self.duration.as_secs_f64() / 1024.0 / 1024.0
    }
}

fn main() {
    init_logging();

    let config = match parse_args() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("❌ {err}");
            std::process::exit(2);
        }
    };

    println!("🚀 Bytering - SPSC Byte Ring Benchmark");
    println!("======================================\n");
    println!("  Capacity:   {} bytes", config.ring.effective_capacity());
    println!("  Backing:    {:?}", config.ring.backing);
    println!("  Chunk size: {} bytes", config.chunk_size);
    println!("  Volume:     {} MB\n", config.megabytes);

    let ring = match benchmark_ring(&config) {
        Ok(result) => result,
        Err(err) => {
            eprintln!("❌ Failed to create ring: {err}");
            std::process::exit(1);
        }
    };
    let channel = benchmark_channel(&config);

    println!("📊 Byte Ring");
    println!("------------");
    print_result(&ring);

    println!("📊 sync_channel<Vec<u8>>");
    println!("------------------------");
    print_result(&channel);

    println!(
        "✅ Ring / channel throughput: {:.2}x",
        ring.mb_per_sec() / channel.mb_per_sec()
    );
}

fn init_logging() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "bytering=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn print_result(result: &RunResult) {
    println!("  Bytes:      {}", result.bytes);
    println!("  Duration:   {:.3} s", result.duration.as_secs_f64());
    println!("  Throughput: {:.2} MB/sec\n", result.mb_per_sec());
}

fn benchmark_ring(config: &BenchConfig) -> Result<RunResult, RingError> {
    let ring = ByteRing::with_config(config.ring)?;
    let (mut producer, mut consumer) = ring.split();

    let total = config.total_bytes();
    let chunk = vec![0xA5u8; config.chunk_size];

    let start = Instant::now();

    let writer = thread::spawn(move || {
        let mut sent = 0;
        while sent < total {
            let len = chunk.len().min(total - sent);
            let n = producer.write(&chunk[..len]);
            if n < len {
                warn!(sent = sent + n, "ring closed before producer finished");
                break;
            }
            sent += n;
        }
        // Drop producer: consumer menguras sisa lalu dapat 0
    });

    let mut buf = vec![0u8; config.chunk_size];
    let mut received = 0;
    loop {
        let n = consumer.read(&mut buf);
        if n == 0 {
            break;
        }
        received += n;
    }
    let duration = start.elapsed();

    if writer.join().is_err() {
        warn!("ring producer thread panicked");
    }
    info!(received, ?duration, "byte ring run complete");

    Ok(RunResult {
        bytes: received,
        duration,
    })
}

fn benchmark_channel(config: &BenchConfig) -> RunResult {
    let total = config.total_bytes();
    let chunk_size = config.chunk_size;
    // Bound channel setara kapasitas ring, dalam satuan chunk
    let bound = (config.ring.effective_capacity() / chunk_size).max(1);
    let (tx, rx) = mpsc::sync_channel::<Vec<u8>>(bound);

    let start = Instant::now();

    let writer = thread::spawn(move || {
        let chunk = vec![0xA5u8; chunk_size];
        let mut sent = 0;
        while sent < total {
            let len = chunk_size.min(total - sent);
            if tx.send(chunk[..len].to_vec()).is_err() {
                break;
            }
            sent += len;
        }
    });

    let mut received = 0;
    for msg in rx {
        received += msg.len();
    }
    let duration = start.elapsed();

    if writer.join().is_err() {
        warn!("channel producer thread panicked");
    }
    info!(received, ?duration, "channel run complete");

    RunResult {
        bytes: received,
        duration,
    }
}

fn parse_args() -> Result<BenchConfig, RingError> {
    let args: Vec<String> = std::env::args().collect();
    let mut config = BenchConfig {
        ring: RingConfig::from_env()?,
        chunk_size: 1024,
        megabytes: 256,
    };

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--capacity" | "-c" => {
                if i + 1 < args.len() {
                    config.ring.capacity = parse_flag("--capacity", &args[i + 1])?;
                    i += 1;
                }
            }
            "--chunk" => {
                if i + 1 < args.len() {
                    config.chunk_size = parse_flag::<usize>("--chunk", &args[i + 1])?.max(1);
                    i += 1;
                }
            }
            "--megabytes" | "-m" => {
                if i + 1 < args.len() {
                    config.megabytes = parse_flag("--megabytes", &args[i + 1])?;
                    i += 1;
                }
            }
            "--anon" => {
                config.ring.backing = Backing::Anonymous;
            }
            "--help" | "-h" => {
                print_help();
                std::process::exit(0);
            }
            other => {
                warn!(arg = other, "ignoring unknown argument");
            }
        }
        i += 1;
    }

    Ok(config)
}

fn parse_flag<T: std::str::FromStr>(key: &'static str, value: &str) -> Result<T, RingError> {
    value.parse().map_err(|_| RingError::InvalidConfig {
        key,
        value: value.to_string(),
    })
}

fn print_help() {
    println!("Bytering Benchmark");
    println!();
    println!("USAGE:");
    println!("    bytering [OPTIONS]");
    println!();
    println!("OPTIONS:");
    println!("    -c, --capacity <BYTES>    Ring capacity, 0 = 32768 [env: BYTERING_CAPACITY]");
    println!("        --chunk <BYTES>       Bytes per write/read call [default: 1024]");
    println!("    -m, --megabytes <MB>      Total volume to stream [default: 256]");
    println!("        --anon                Back the ring with anonymous mmap [env: BYTERING_BACKING]");
    println!("    -h, --help                Print help");
}
