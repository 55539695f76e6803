//! Waitable: identitas semantik untuk flag di atas EventSet
//!
//! Level flag (HAS_ITEMS, IS_EMPTY, HAS_SPACE, STOP) bertahan sampai diubah
//! eksplisit. Pulse flag (WRITE_OP, READ_OP) dihapus oleh waiter yang
//! mengamatinya. STOP bersifat sticky: tidak pernah ikut terhapus.

use std::time::Duration;

use super::deadline::Deadline;
use super::event_set::{EventBits, EventSet};

/// Identitas flag.
pub mod flags {
    use super::EventBits;

    pub const HAS_ITEMS: EventBits = 1 << 0;
    pub const IS_EMPTY: EventBits = 1 << 1;
    pub const HAS_SPACE: EventBits = 1 << 2;
    pub const WRITE_OP: EventBits = 1 << 3;
    pub const READ_OP: EventBits = 1 << 4;
    pub const STOP: EventBits = 1 << 5;
    /// Pulse internal: commit/abort/release window. Hanya ditunggu `clear()`.
    pub(crate) const OP_DONE: EventBits = 1 << 6;
}

/// Hasil tri-state dari setiap operasi blocking.
///
/// Kode numerik: `-1` stopped, `0` timeout, `1` berhasil.
#[derive(Debug, PartialEq, Eq)]
#[must_use]
pub enum Wait<T> {
    Ready(T),
    TimedOut,
    Stopped,
}

/// Wait tanpa payload.
pub type WaitStatus = Wait<()>;

impl<T> Wait<T> {
    #[inline]
    pub fn code(&self) -> i8 {
        match self {
            Wait::Ready(_) => 1,
            Wait::TimedOut => 0,
            Wait::Stopped => -1,
        }
    }

    #[inline]
    pub fn is_ready(&self) -> bool {
        matches!(self, Wait::Ready(_))
    }

    #[inline]
    pub fn is_stopped(&self) -> bool {
        matches!(self, Wait::Stopped)
    }

    #[inline]
    pub fn is_timed_out(&self) -> bool {
        matches!(self, Wait::TimedOut)
    }

    #[inline]
    pub fn ready(self) -> Option<T> {
        match self {
            Wait::Ready(v) => Some(v),
            _ => None,
        }
    }

    #[inline]
    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> Wait<U> {
        match self {
            Wait::Ready(v) => Wait::Ready(f(v)),
            Wait::TimedOut => Wait::TimedOut,
            Wait::Stopped => Wait::Stopped,
        }
    }

    /// Buang payload, sisakan status saja.
    #[inline]
    pub fn status(&self) -> WaitStatus {
        match self {
            Wait::Ready(_) => Wait::Ready(()),
            Wait::TimedOut => Wait::TimedOut,
            Wait::Stopped => Wait::Stopped,
        }
    }
}

impl<T: Clone> Clone for Wait<T> {
    fn clone(&self) -> Self {
        match self {
            Wait::Ready(v) => Wait::Ready(v.clone()),
            Wait::TimedOut => Wait::TimedOut,
            Wait::Stopped => Wait::Stopped,
        }
    }
}

impl<T: Copy> Copy for Wait<T> {}

/// Condition flags milik satu RingBuf.
#[derive(Debug)]
pub struct Waitable {
    events: EventSet,
}

impl Default for Waitable {
    fn default() -> Self {
        Self::new()
    }
}

impl Waitable {
    pub fn new() -> Self {
        Self {
            events: EventSet::with_sticky(flags::STOP),
        }
    }

    #[inline]
    pub fn events(&self) -> &EventSet {
        &self.events
    }

    /// Cooperative cancellation: semua wait di instance ini langsung
    /// return `Stopped` sampai `clear_stop_signal` dipanggil.
    pub fn set_stop_signal(&self) {
        tracing::debug!("stop signal raised");
        self.events.set_bits(flags::STOP);
    }

    pub fn clear_stop_signal(&self) {
        tracing::debug!("stop signal cleared");
        self.events.clear_bits(flags::STOP);
    }

    #[inline]
    pub fn is_stopped(&self) -> bool {
        self.events.get() & flags::STOP != 0
    }

    /// Level wait untuk HAS_ITEMS, tanpa auto-clear.
    pub fn wait_for_items(&self, timeout: Option<Duration>) -> WaitStatus {
        self.wait_level(flags::HAS_ITEMS, Deadline::new(timeout))
    }

    /// Level wait untuk IS_EMPTY, tanpa auto-clear.
    pub fn wait_for_empty(&self, timeout: Option<Duration>) -> WaitStatus {
        self.wait_level(flags::IS_EMPTY, Deadline::new(timeout))
    }

    /// Pulse wait: di-clear begitu teramati.
    pub fn wait_for_write_op(&self, timeout: Option<Duration>) -> WaitStatus {
        self.wait_pulse(flags::WRITE_OP, Deadline::new(timeout))
    }

    /// Pulse wait: di-clear begitu teramati.
    pub fn wait_for_read_op(&self, timeout: Option<Duration>) -> WaitStatus {
        self.wait_pulse(flags::READ_OP, Deadline::new(timeout))
    }

    pub(crate) fn wait_level(&self, flag: EventBits, deadline: Deadline) -> WaitStatus {
        let bits = self
            .events
            .wait_until(flag | flags::STOP, false, deadline.instant());
        Self::classify(bits)
    }

    pub(crate) fn wait_pulse(&self, flag: EventBits, deadline: Deadline) -> WaitStatus {
        let bits = self
            .events
            .wait_until(flag | flags::STOP, true, deadline.instant());
        Self::classify(bits)
    }

    // STOP dicek duluan: kalau keduanya teramati, hasilnya tetap Stopped.
    #[inline]
    fn classify(bits: EventBits) -> WaitStatus {
        if bits & flags::STOP != 0 {
            Wait::Stopped
        } else if bits == 0 {
            Wait::TimedOut
        } else {
            Wait::Ready(())
        }
    }
}
