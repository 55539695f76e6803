//! Satu sesi relay: socket → ring → writer
//!
//! Producer (`SocketReceiver`) jalan di thread pemanggil, consumer
//! (`drain_to`) di scoped thread. Setelah sesi selesai, berhasil atau gagal,
//! ring di-reset supaya siap dipakai koneksi berikutnya.

use std::io::Write;
use std::net::TcpStream;
use std::thread;

use super::{drain_to, RelayError, SocketReceiver, StreamEnd};
use crate::core::{RingBuf, Wait};

/// Statistik satu sesi relay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionStats {
    /// Byte yang di-commit ke ring dari socket.
    pub received: u64,
    /// Byte yang sampai ke writer.
    pub written: u64,
    /// Alasan producer berhenti.
    pub end: StreamEnd,
}

/// Relay `stream` ke `output` lewat `ring` sampai peer menutup koneksi.
///
/// Ring selalu dikembalikan ke keadaan kosong dan tidak stopped sebelum
/// return, termasuk saat sesi gagal. Byte yang tidak sempat terkirim dibuang.
pub fn relay_stream<W: Write + Send>(
    ring: &RingBuf,
    stream: TcpStream,
    output: &mut W,
    chunk: usize,
) -> Result<SessionStats, RelayError> {
    let mut receiver = SocketReceiver::new(stream, chunk)?;

    let outcome = thread::scope(|s| {
        let consumer = s.spawn(|| {
            let drained = drain_to(ring, output, chunk, None);
            if drained.is_err() {
                // Lepaskan producer yang mungkin tertahan di ring penuh
                ring.set_stop_signal();
            }
            drained
        });

        let produced = receiver.run(ring);
        // EOF / error: beri tahu consumer bahwa stream selesai
        ring.set_stop_signal();

        let drained = consumer.join().map_err(|_| RelayError::WorkerPanicked)?;
        let end = produced?;
        let (written, _) = drained?;
        Ok(SessionStats {
            received: receiver.bytes(),
            written,
            end,
        })
    });

    reset(ring);
    outcome
}

fn reset(ring: &RingBuf) {
    ring.clear_stop_signal();
    let leftover = ring.data_size();
    if leftover > 0 {
        tracing::warn!(bytes = leftover, "discarding undelivered bytes");
    }
    if let Wait::Stopped = ring.clear() {
        tracing::warn!("ring clear interrupted");
    }
}
