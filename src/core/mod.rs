//! Core module: Blocking SPSC Byte Ring
//!
//! Prinsip desain:
//! - Zero-Copy: window contiguous menunjuk langsung ke storage
//! - Backpressure: penuh/kosong berarti block, bukan error
//! - No-Allocation: storage dialokasikan sekali saat init
//! - Cooperative cancellation: stop signal membuat semua wait return `Stopped`

mod deadline;
mod error;
mod event_set;
mod peek;
mod read_buf;
mod ring_buf;
mod storage;
mod waitable;

pub use error::RingBufError;
pub use event_set::{EventBits, EventSet};
pub use peek::Peek;
pub use read_buf::{ReadBuf, WriteBuf};
pub use ring_buf::{RingBuf, RingLock};
pub use waitable::{flags, Wait, WaitStatus, Waitable};
