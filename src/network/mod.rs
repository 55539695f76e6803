//! Network Layer: glue antara socket / io dan RingBuf
//!
//! Producer dan consumer nyata untuk ring: receiver TCP berbasis mio yang
//! menulis langsung ke write window, pompa ke `io::Write`, dan adapter
//! `std::io`. Ring sendiri tidak tahu apa arti byte yang lewat.

mod io;
mod pump;
mod receiver;
mod session;

use thiserror::Error;

use crate::core::RingBufError;

pub use io::{RingReader, RingWriter};
pub use pump::{drain_to, fill_from};
pub use receiver::SocketReceiver;
pub use session::{relay_stream, SessionStats};

/// Alasan sebuah pompa berhenti.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamEnd {
    /// Sumber mengembalikan EOF.
    Eof,
    /// Stop signal ring teramati.
    Stopped,
    /// Tidak ada data selama budget idle.
    Idle,
}

/// Error untuk binary relay / feed.
#[derive(Debug, Error)]
pub enum RelayError {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Ring(#[from] RingBufError),

    #[error("worker thread panicked")]
    WorkerPanicked,
}
