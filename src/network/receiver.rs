//! Socket → Ring producer dengan mio
//!
//! Byte dari socket dibaca langsung ke write window ring (zero-copy, tidak
//! ada buffer perantara). Saat socket WouldBlock, reservasi di-abort dulu
//! sebelum polling supaya `clear()` di sisi lain tidak ikut tertahan.

use std::io::{self, Read};
use std::net::TcpStream as StdTcpStream;
use std::time::Duration;

use mio::net::TcpStream;
use mio::{Events, Interest, Poll, Token};

use super::StreamEnd;
use crate::core::{RingBuf, Wait};

const SOCKET_TOKEN: Token = Token(0);
const EVENTS_CAPACITY: usize = 16;
// Interval cek stop signal selama menunggu socket readable
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Producer yang memompa satu koneksi TCP ke sebuah RingBuf.
pub struct SocketReceiver {
    poll: Poll,
    events: Events,
    stream: TcpStream,
    chunk: usize,
    bytes: u64,
}

impl SocketReceiver {
    /// Wrap koneksi yang sudah accepted. `chunk` adalah ukuran maksimum
    /// satu write window.
    pub fn new(stream: StdTcpStream, chunk: usize) -> io::Result<Self> {
        assert!(chunk > 0, "receiver chunk must be > 0");

        stream.set_nonblocking(true)?;
        stream.set_nodelay(true)?;

        let poll = Poll::new()?;
        let mut stream = TcpStream::from_std(stream);
        poll.registry()
            .register(&mut stream, SOCKET_TOKEN, Interest::READABLE)?;

        Ok(Self {
            poll,
            events: Events::with_capacity(EVENTS_CAPACITY),
            stream,
            chunk,
            bytes: 0,
        })
    }

    /// Total byte yang sudah di-commit ke ring.
    #[inline]
    pub fn bytes(&self) -> u64 {
        self.bytes
    }

    /// Pompa sampai peer menutup koneksi (`Eof`) atau ring di-stop (`Stopped`).
    pub fn run(&mut self, ring: &RingBuf) -> io::Result<StreamEnd> {
        loop {
            let mut window = match ring.get_write_buf(self.chunk, None) {
                Wait::Ready(w) => w,
                Wait::Stopped => return Ok(StreamEnd::Stopped),
                Wait::TimedOut => continue,
            };

            match self.stream.read(&mut window) {
                Ok(0) => {
                    window.abort();
                    tracing::debug!(bytes = self.bytes, "peer closed connection");
                    return Ok(StreamEnd::Eof);
                }
                Ok(n) => {
                    window.commit(n);
                    self.bytes += n as u64;
                }
                Err(ref e) if e.kind() == io::ErrorKind::WouldBlock => {
                    window.abort();
                    if !self.wait_readable(ring)? {
                        return Ok(StreamEnd::Stopped);
                    }
                }
                Err(ref e) if e.kind() == io::ErrorKind::Interrupted => window.abort(),
                Err(e) => return Err(e),
            }
        }
    }

    // Returns false kalau ring di-stop selama menunggu
    fn wait_readable(&mut self, ring: &RingBuf) -> io::Result<bool> {
        loop {
            match self.poll.poll(&mut self.events, Some(POLL_INTERVAL)) {
                Ok(()) => {}
                Err(ref e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
            if ring.is_stopped() {
                return Ok(false);
            }
            if self.events.iter().any(|ev| ev.token() == SOCKET_TOKEN) {
                return Ok(true);
            }
        }
    }
}
