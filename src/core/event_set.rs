//! EventSet: bitmask flag yang dijaga Mutex + Condvar
//!
//! Semantik mirip event group RTOS:
//! - `wait_for_any` menunggu salah satu bit dari `mask`
//! - Optional auto-clear bit yang teramati (untuk pulse flag)
//! - Bit "sticky" tidak pernah terhapus oleh auto-clear
//!
//! Didesain untuk satu waiter per pulse flag. Dua waiter pada pulse flag yang
//! sama tidak didukung: yang satu bisa menghabiskan wakeup milik yang lain.

use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

use super::deadline::Deadline;

/// Bitmask dari condition flag.
pub type EventBits = u32;

/// Kumpulan flag dengan blocking "wait for any of mask".
#[derive(Debug)]
pub struct EventSet {
    bits: Mutex<EventBits>,
    cond: Condvar,
    // Bit yang tidak boleh dihapus oleh auto-clear
    sticky: EventBits,
}

impl Default for EventSet {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSet {
    pub fn new() -> Self {
        Self::with_sticky(0)
    }

    /// Membuat EventSet dimana bit di `sticky` tidak pernah di-auto-clear.
    /// Bit tersebut hanya berubah lewat `set_bits` / `clear_bits`.
    pub fn with_sticky(sticky: EventBits) -> Self {
        Self {
            bits: Mutex::new(0),
            cond: Condvar::new(),
            sticky,
        }
    }

    /// Snapshot bitmask saat ini.
    #[inline]
    pub fn get(&self) -> EventBits {
        *self.bits.lock()
    }

    #[inline]
    pub fn set_bits(&self, mask: EventBits) {
        self.modify(mask, 0);
    }

    #[inline]
    pub fn clear_bits(&self, mask: EventBits) {
        self.modify(0, mask);
    }

    /// Clear lalu set dalam satu critical section, supaya waiter tidak pernah
    /// melihat state setengah jadi.
    pub fn modify(&self, set: EventBits, clear: EventBits) {
        let mut bits = self.bits.lock();
        *bits = (*bits & !clear) | set;
        if set != 0 {
            self.cond.notify_all();
        }
    }

    /// Menunggu sampai salah satu bit dari `mask` ter-set.
    ///
    /// Returns subset `mask` yang teramati, atau 0 kalau timeout.
    /// `timeout = None` menunggu tanpa batas, `Some(ZERO)` hanya polling.
    pub fn wait_for_any(
        &self,
        mask: EventBits,
        auto_clear: bool,
        timeout: Option<Duration>,
    ) -> EventBits {
        self.wait_until(mask, auto_clear, Deadline::new(timeout).instant())
    }

    pub(crate) fn wait_until(
        &self,
        mask: EventBits,
        auto_clear: bool,
        deadline: Option<Instant>,
    ) -> EventBits {
        let mut bits = self.bits.lock();
        loop {
            let observed = *bits & mask;
            if observed != 0 {
                if auto_clear {
                    *bits &= !(observed & !self.sticky);
                }
                return observed;
            }

            match deadline {
                None => self.cond.wait(&mut bits),
                Some(at) => {
                    if Instant::now() >= at {
                        return 0;
                    }
                    // Hasil timed_out diabaikan: bitmask dicek ulang di atas,
                    // lalu deadline memutuskan.
                    let _ = self.cond.wait_until(&mut bits, at);
                }
            }
        }
    }
}
