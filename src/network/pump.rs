//! Pompa generik antara ring dan `std::io`
//!
//! - `drain_to`: consumer, kuras window contiguous ke `io::Write`
//! - `fill_from`: producer, baca `io::Read` langsung ke write window
//!
//! Konvensi akhir stream: producer memanggil `set_stop_signal()` setelah
//! selesai. Stop tidak membuang data; `drain_to` menguras sisa byte secara
//! non-blocking sebelum melaporkan `Stopped`.

use std::io::{self, Read, Write};
use std::time::Duration;

use super::StreamEnd;
use crate::core::{ReadBuf, RingBuf, Wait};

/// Kuras ring ke `writer` sampai stop (atau idle lebih lama dari `idle`).
///
/// Returns jumlah byte yang ditulis dan alasan berhenti.
pub fn drain_to<W: Write>(
    ring: &RingBuf,
    writer: &mut W,
    chunk: usize,
    idle: Option<Duration>,
) -> io::Result<(u64, StreamEnd)> {
    let mut total = 0u64;
    loop {
        match ring.contig_read(chunk, idle) {
            Wait::Ready(window) => total += write_window(window, writer)?,
            Wait::TimedOut => {
                writer.flush()?;
                return Ok((total, StreamEnd::Idle));
            }
            Wait::Stopped => {
                // Commit terakhir bisa masuk bersamaan dengan stop
                while let Wait::Ready(window) = ring.contig_read(chunk, Some(Duration::ZERO)) {
                    total += write_window(window, writer)?;
                }
                writer.flush()?;
                return Ok((total, StreamEnd::Stopped));
            }
        }
    }
}

fn write_window<W: Write>(mut window: ReadBuf<'_>, writer: &mut W) -> io::Result<u64> {
    if let Err(e) = writer.write_all(&window) {
        // Byte tetap di ring, tidak hilang
        window.set_commit_len(0);
        return Err(e);
    }
    Ok(window.len() as u64)
}

/// Isi ring dari `reader` sampai EOF atau ring di-stop.
pub fn fill_from<R: Read>(
    ring: &RingBuf,
    reader: &mut R,
    chunk: usize,
) -> io::Result<(u64, StreamEnd)> {
    let mut total = 0u64;
    loop {
        let mut window = match ring.get_write_buf(chunk, None) {
            Wait::Ready(w) => w,
            Wait::Stopped => return Ok((total, StreamEnd::Stopped)),
            Wait::TimedOut => continue,
        };

        match reader.read(&mut window) {
            Ok(0) => return Ok((total, StreamEnd::Eof)),
            Ok(n) => {
                window.commit(n);
                total += n as u64;
            }
            Err(ref e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
}
