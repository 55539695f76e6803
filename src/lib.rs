//! ringpipe - Blocking Zero-Copy SPSC Byte Ring
//!
//! Arsitektur:
//! - core: EventSet / Waitable / RingBuf / window guards
//! - config: kapasitas dan backing storage
//! - network: glue socket → ring → sink (producer/consumer nyata)

pub mod config;
pub mod core;
pub mod network;

pub use crate::config::{Backing, RingBufConfig};
pub use crate::core::{ReadBuf, RingBuf, RingBufError, Wait, WaitStatus, WriteBuf};
