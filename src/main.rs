//! ringpipe - Blocking Zero-Copy SPSC Byte Ring
//!
//! Arsitektur:
//! - Satu producer, satu consumer, satu region byte kontigu
//! - Copy API: `write` / `read` (blocking, all-or-nothing)
//! - Zero-copy API: `get_write_buf` / `contig_read` (window langsung ke storage)
//! - Event set untuk blocking + stop signal yang bisa di-resume

use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Instant;

use ringpipe::core::{RingBuf, Wait};
use ringpipe::{Backing, RingBufConfig};

const TOTAL_BYTES: usize = 256 * 1024 * 1024;
const CAPACITY: usize = 1024 * 1024;

fn main() {
    println!("🚀 ringpipe - Blocking Zero-Copy SPSC Ring");
    println!("==========================================\n");

    benchmark_copy_api(Backing::Heap);
    benchmark_copy_api(Backing::AnonMmap);
    benchmark_zero_copy_api();

    println!("\n✅ All benchmarks complete!");
    println!("\nTo start relay: cargo run --release --bin ringpipe_relay -- --bind 0.0.0.0:9999");
}

fn new_ring(backing: Backing) -> Arc<RingBuf> {
    match RingBuf::with_config(RingBufConfig::new(CAPACITY).backing(backing)) {
        Ok(ring) => Arc::new(ring),
        Err(e) => {
            eprintln!("failed to create ring: {e}");
            std::process::exit(1);
        }
    }
}

/// Stop ring saat producer selesai, termasuk saat panic, supaya consumer
/// tidak block selamanya.
struct StopOnExit<'a>(&'a RingBuf);

impl Drop for StopOnExit<'_> {
    fn drop(&mut self) {
        self.0.set_stop_signal();
    }
}

/// Join producer; `false` kalau producer panic (hasil benchmark tidak valid).
fn producer_ok(producer: JoinHandle<()>) -> bool {
    if producer.join().is_err() {
        eprintln!("  ❌ producer thread panicked, skipping report\n");
        return false;
    }
    true
}

fn report(label: &str, bytes: usize, ops: usize, elapsed: std::time::Duration) {
    let secs = elapsed.as_secs_f64();
    println!("  {label}");
    println!("    Bytes:      {} MB", bytes / (1024 * 1024));
    println!("    Operations: {}", ops);
    println!(
        "    Latency:    {:.2} ns/op",
        elapsed.as_nanos() as f64 / ops as f64
    );
    println!(
        "    Throughput: {:.2} MB/sec\n",
        bytes as f64 / secs / 1_000_000.0
    );
}

fn benchmark_copy_api(backing: Backing) {
    println!("📊 Copy API ({:?} backing)", backing);
    println!("-------------------------------");

    for msg_size in [64usize, 4096] {
        let ring = new_ring(backing);
        let ops = TOTAL_BYTES / msg_size;

        let producer = {
            let ring = Arc::clone(&ring);
            thread::spawn(move || {
                let _stop = StopOnExit(&ring);
                let msg = vec![0xABu8; msg_size];
                for _ in 0..ops {
                    if !ring.write(&msg).is_ready() {
                        break;
                    }
                }
            })
        };

        let start = Instant::now();
        let mut buf = vec![0u8; msg_size];
        let mut received = 0;
        while received < ops {
            if !ring.read(&mut buf, None).is_ready() {
                break;
            }
            received += 1;
        }
        let elapsed = start.elapsed();
        if !producer_ok(producer) {
            continue;
        }

        report(&format!("{msg_size}-byte messages"), received * msg_size, received, elapsed);
    }
}

fn benchmark_zero_copy_api() {
    println!("📊 Zero-Copy API (write window / read window)");
    println!("---------------------------------------------");

    const CHUNK: usize = 64 * 1024;
    let ring = new_ring(Backing::Heap);

    let producer = {
        let ring = Arc::clone(&ring);
        thread::spawn(move || {
            let _stop = StopOnExit(&ring);
            let mut produced = 0;
            while produced < TOTAL_BYTES {
                let mut window = match ring.get_write_buf(CHUNK, None) {
                    Wait::Ready(w) => w,
                    _ => break,
                };
                window.fill(0xCD);
                let n = window.len();
                window.commit(n);
                produced += n;
            }
        })
    };

    let start = Instant::now();
    let mut consumed = 0;
    let mut windows = 0;
    let mut checksum = 0u64;
    while consumed < TOTAL_BYTES {
        let window = match ring.contig_read(CHUNK, None) {
            Wait::Ready(w) => w,
            _ => break,
        };
        checksum = checksum.wrapping_add(window[0] as u64);
        consumed += window.len();
        windows += 1;
    }
    let elapsed = start.elapsed();
    if !producer_ok(producer) {
        return;
    }

    report("64 KiB windows", consumed, windows, elapsed);
    println!("    Checksum:   {checksum}");
}
