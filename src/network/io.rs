//! Adapter `std::io` di atas RingBuf
//!
//! `RingReader` mengimplementasikan `Read` + `BufRead` (zero-copy: `fill_buf`
//! mengembalikan window contiguous langsung). `RingWriter` mengimplementasikan
//! `Write` lewat write reservation. Stop signal dipetakan ke end-of-stream
//! di sisi baca dan `BrokenPipe` di sisi tulis.

use std::io::{self, BufRead, Read, Write};
use std::time::Duration;

use crate::core::{ReadBuf, RingBuf, Wait};

/// Consumer side sebagai `Read` / `BufRead`.
pub struct RingReader<'a> {
    ring: &'a RingBuf,
    window: Option<ReadBuf<'a>>,
    pos: usize,
}

impl<'a> RingReader<'a> {
    pub fn new(ring: &'a RingBuf) -> Self {
        Self {
            ring,
            window: None,
            pos: 0,
        }
    }
}

impl BufRead for RingReader<'_> {
    fn fill_buf(&mut self) -> io::Result<&[u8]> {
        if self.window.is_none() {
            let capacity = self.ring.capacity();
            let next = match self.ring.contig_read(capacity, None) {
                Wait::Ready(window) => Some(window),
                // Commit terakhir bisa masuk bersamaan dengan stop
                Wait::Stopped => self.ring.contig_read(capacity, Some(Duration::ZERO)).ready(),
                Wait::TimedOut => None,
            };
            let Some(mut window) = next else {
                return Ok(&[]);
            };
            // Commit mengikuti consume(), bukan panjang window
            window.set_commit_len(0);
            self.window = Some(window);
            self.pos = 0;
        }

        match &self.window {
            Some(window) => Ok(&window[self.pos..]),
            None => Ok(&[]),
        }
    }

    fn consume(&mut self, amt: usize) {
        let Some(window) = self.window.as_mut() else {
            return;
        };
        self.pos = (self.pos + amt).min(window.len());
        window.set_commit_len(self.pos);
        if self.pos == window.len() {
            // Drop = commit
            self.window = None;
        }
    }
}

impl Read for RingReader<'_> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        let available = self.fill_buf()?;
        let n = available.len().min(buf.len());
        buf[..n].copy_from_slice(&available[..n]);
        self.consume(n);
        Ok(n)
    }
}

/// Producer side sebagai `Write`.
pub struct RingWriter<'a> {
    ring: &'a RingBuf,
}

impl<'a> RingWriter<'a> {
    pub fn new(ring: &'a RingBuf) -> Self {
        Self { ring }
    }
}

impl Write for RingWriter<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        match self.ring.get_write_buf(buf.len(), None) {
            Wait::Ready(mut window) => {
                let n = window.len();
                window.copy_from_slice(&buf[..n]);
                window.commit(n);
                Ok(n)
            }
            Wait::Stopped | Wait::TimedOut => Err(io::Error::new(
                io::ErrorKind::BrokenPipe,
                "ring buffer stopped",
            )),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
