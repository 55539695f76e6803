//! Error untuk konstruksi RingBuf.
//!
//! Hanya kehabisan resource saat init yang dianggap error. Buffer penuh /
//! kosong adalah backpressure, dan cancellation dilaporkan lewat `Wait`.

use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RingBufError {
    #[error("ring buffer capacity must be greater than zero")]
    ZeroCapacity,

    #[error("out of memory allocating {size} bytes of ring storage")]
    OutOfMemory { size: usize },

    #[error("failed to map {size} bytes of anonymous ring storage")]
    Map {
        size: usize,
        #[source]
        source: io::Error,
    },
}
