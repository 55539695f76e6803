//! ringpipe Relay Server
//!
//! Terima koneksi TCP satu per satu dan alirkan byte-nya lewat RingBuf:
//! - Producer thread: socket → write window (zero-copy, mio)
//! - Consumer thread: read window → output file / sink
//!
//! Ring dipakai ulang antar koneksi (`clear()` di antaranya).
//!
//! Usage:
//!   cargo run --release --bin ringpipe_relay -- --bind 0.0.0.0:9999 --capacity 1048576

use std::fs::File;
use std::io::{self, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use clap::Parser;
use tracing_subscriber::EnvFilter;

use ringpipe::core::RingBuf;
use ringpipe::network::{relay_stream, RelayError, SessionStats, StreamEnd};
use ringpipe::{Backing, RingBufConfig};

#[derive(Parser, Debug)]
#[command(name = "ringpipe_relay")]
#[command(about = "Relay TCP byte streams through a blocking zero-copy ring buffer")]
struct Args {
    /// Bind address
    #[arg(short, long, default_value = "0.0.0.0:9999")]
    bind: SocketAddr,

    /// Ring capacity in bytes
    #[arg(short, long, default_value = "1048576")]
    capacity: NonZeroUsize,

    /// Maximum window size per read/write
    #[arg(long, default_value = "65536")]
    chunk: NonZeroUsize,

    /// Back the ring with an anonymous mmap instead of the heap
    #[arg(long)]
    mmap: bool,

    /// Write relayed bytes to this file (default: discard)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Stop after this many connections (default: run forever)
    #[arg(long)]
    connections: Option<u64>,
}

fn log_session(peer: SocketAddr, stats: &SessionStats, elapsed: Duration) {
    let secs = elapsed.as_secs_f64().max(f64::EPSILON);
    tracing::info!(
        %peer,
        received = stats.received,
        written = stats.written,
        elapsed_ms = elapsed.as_millis() as u64,
        mb_per_sec = format!("{:.2}", stats.received as f64 / secs / 1_000_000.0),
        "session finished"
    );
    if stats.end == StreamEnd::Stopped {
        tracing::warn!(%peer, "producer stopped before peer closed");
    }
}

fn open_output(path: &Option<PathBuf>) -> io::Result<Box<dyn Write + Send>> {
    match path {
        Some(p) => Ok(Box::new(File::create(p)?)),
        None => Ok(Box::new(io::sink())),
    }
}

/// Perbesar socket receive buffer. Error diabaikan: tidak semua platform support.
#[cfg(unix)]
fn tune_socket(stream: &TcpStream) {
    use std::os::unix::io::AsRawFd;

    let fd = stream.as_raw_fd();
    let optval: libc::c_int = 1024 * 1024; // 1MB
    // SAFETY: fd valid selama stream hidup, optval hidup selama call
    let rc = unsafe {
        libc::setsockopt(
            fd,
            libc::SOL_SOCKET,
            libc::SO_RCVBUF,
            &optval as *const _ as *const libc::c_void,
            std::mem::size_of::<libc::c_int>() as libc::socklen_t,
        )
    };
    if rc != 0 {
        tracing::warn!(error = %io::Error::last_os_error(), "SO_RCVBUF not applied");
    }
}

#[cfg(not(unix))]
fn tune_socket(_stream: &TcpStream) {}

/// Koneksi yang gagal sebelum sempat dilayani di-skip, bukan menghentikan server.
fn accepted(incoming: io::Result<TcpStream>) -> Option<(TcpStream, SocketAddr)> {
    let stream = match incoming {
        Ok(s) => s,
        Err(e) => {
            tracing::warn!(error = %e, "accept failed");
            return None;
        }
    };
    match stream.peer_addr() {
        Ok(peer) => Some((stream, peer)),
        Err(e) => {
            tracing::warn!(error = %e, "peer gone before session start");
            None
        }
    }
}

fn relay_session(
    ring: &RingBuf,
    stream: TcpStream,
    peer: SocketAddr,
    args: &Args,
) -> Result<(), RelayError> {
    let start = Instant::now();
    let mut output = open_output(&args.output)?;
    let stats = relay_stream(ring, stream, &mut output, args.chunk.get())?;
    log_session(peer, &stats, start.elapsed());
    Ok(())
}

fn run(args: Args) -> Result<(), RelayError> {
    let backing = if args.mmap {
        Backing::AnonMmap
    } else {
        Backing::Heap
    };
    let ring = RingBuf::with_config(RingBufConfig::new(args.capacity.get()).backing(backing))?;

    let listener = TcpListener::bind(args.bind)?;
    tracing::info!(
        addr = %listener.local_addr()?,
        capacity = args.capacity.get(),
        chunk = args.chunk.get(),
        mmap = args.mmap,
        "relay listening"
    );

    let mut served = 0u64;
    for incoming in listener.incoming() {
        let Some((stream, peer)) = accepted(incoming) else {
            continue;
        };
        tracing::info!(%peer, "connection accepted");
        tune_socket(&stream);

        if let Err(e) = relay_session(&ring, stream, peer, &args) {
            tracing::error!(%peer, error = %e, "session failed");
        }

        served += 1;
        if args.connections.is_some_and(|limit| served >= limit) {
            break;
        }
    }

    Ok(())
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    if let Err(e) = run(Args::parse()) {
        tracing::error!(error = %e, "relay error");
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_sizes_rejected() {
        assert!(Args::try_parse_from(["ringpipe_relay", "--chunk", "0"]).is_err());
        assert!(Args::try_parse_from(["ringpipe_relay", "--capacity", "0"]).is_err());

        let args = Args::try_parse_from(["ringpipe_relay"]).unwrap();
        assert_eq!(args.chunk.get(), 64 * 1024);
        assert_eq!(args.capacity.get(), 1024 * 1024);
    }

    #[test]
    fn test_failed_accept_is_skipped() {
        let err = io::Error::from(io::ErrorKind::ConnectionAborted);
        assert!(accepted(Err(err)).is_none());

        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let client = TcpStream::connect(listener.local_addr().unwrap()).unwrap();
        let (_, peer) = accepted(listener.accept().map(|(s, _)| s)).unwrap();
        assert_eq!(peer, client.local_addr().unwrap());
    }
}
