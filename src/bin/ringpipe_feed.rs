//! ringpipe Feed Client
//!
//! Load generator untuk `ringpipe_relay`:
//! - Generator thread mengisi RingBuf dengan pola byte (langsung ke write window)
//! - Main thread menguras ring ke TcpStream
//!
//! # Usage
//!
//! ```text
//! cargo run --release --bin ringpipe_feed -- --host 127.0.0.1:9999 --bytes 1073741824
//! ```

use std::io;
use std::net::TcpStream;
use std::num::NonZeroUsize;
use std::thread;
use std::time::Instant;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use ringpipe::core::{RingBuf, Wait};
use ringpipe::network::{drain_to, RelayError};

#[derive(Parser, Debug)]
#[command(name = "ringpipe_feed")]
#[command(about = "Stream a generated byte pattern to a ringpipe relay")]
struct Args {
    /// Relay address
    #[arg(long, default_value = "127.0.0.1:9999")]
    host: String,

    /// Total bytes to send
    #[arg(short, long, default_value_t = 256 * 1024 * 1024)]
    bytes: u64,

    /// Ring capacity in bytes
    #[arg(short, long, default_value = "1048576")]
    capacity: NonZeroUsize,

    /// Maximum window size per read/write
    #[arg(long, default_value = "65536")]
    chunk: NonZeroUsize,
}

#[cfg(unix)]
fn tune_socket(stream: &TcpStream) {
    use std::os::unix::io::AsRawFd;

    let fd = stream.as_raw_fd();
    let optval: libc::c_int = 1024 * 1024;
    // SAFETY: fd valid selama stream hidup
    let rc = unsafe {
        libc::setsockopt(
            fd,
            libc::SOL_SOCKET,
            libc::SO_SNDBUF,
            &optval as *const _ as *const libc::c_void,
            std::mem::size_of::<libc::c_int>() as libc::socklen_t,
        )
    };
    if rc != 0 {
        tracing::warn!(error = %io::Error::last_os_error(), "SO_SNDBUF not applied");
    }
}

#[cfg(not(unix))]
fn tune_socket(_stream: &TcpStream) {}

/// Isi ring dengan pola `offset % 251` sampai `total` byte.
fn generate(ring: &RingBuf, total: u64, chunk: usize) -> u64 {
    let mut offset = 0u64;
    while offset < total {
        let want = chunk.min((total - offset) as usize);
        let mut window = match ring.get_write_buf(want, None) {
            Wait::Ready(w) => w,
            // Sender gagal dan menghentikan ring
            Wait::Stopped | Wait::TimedOut => break,
        };
        for (i, b) in window.iter_mut().enumerate() {
            *b = ((offset + i as u64) % 251) as u8;
        }
        let n = window.len();
        window.commit(n);
        offset += n as u64;
    }
    ring.set_stop_signal();
    offset
}

fn run(args: Args) -> Result<(), RelayError> {
    let ring = RingBuf::new(args.capacity.get())?;

    let mut stream = TcpStream::connect(&args.host)?;
    stream.set_nodelay(true)?;
    tune_socket(&stream);
    tracing::info!(host = %args.host, bytes = args.bytes, "connected");

    let start = Instant::now();
    let (generated, sent) = thread::scope(|s| {
        let generator = s.spawn(|| generate(&ring, args.bytes, args.chunk.get()));

        let sent = drain_to(&ring, &mut stream, args.chunk.get(), None);
        if sent.is_err() {
            ring.set_stop_signal();
        }

        let generated = generator.join().map_err(|_| RelayError::WorkerPanicked)?;
        let (sent, _) = sent?;
        Ok::<_, RelayError>((generated, sent))
    })?;
    let elapsed = start.elapsed();

    let secs = elapsed.as_secs_f64().max(f64::EPSILON);
    tracing::info!(
        generated,
        sent,
        elapsed_ms = elapsed.as_millis() as u64,
        mb_per_sec = format!("{:.2}", sent as f64 / secs / 1_000_000.0),
        "feed finished"
    );
    Ok(())
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    if let Err(e) = run(Args::parse()) {
        tracing::error!(error = %e, "feed error");
        std::process::exit(1);
    }
}
