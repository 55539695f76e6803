//! Budget waktu untuk operasi blocking.
//!
//! Timeout adalah total budget per-call: dihitung sekali di awal, lalu sisa
//! waktunya dipakai ulang di setiap iterasi retry.

use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy)]
pub(crate) struct Deadline {
    // None = infinite
    at: Option<Instant>,
}

impl Deadline {
    /// `None` berarti menunggu tanpa batas.
    #[inline]
    pub(crate) fn new(timeout: Option<Duration>) -> Self {
        // Duration yang terlalu besar untuk Instant diperlakukan sebagai infinite
        let at = timeout.and_then(|t| Instant::now().checked_add(t));
        Self { at }
    }

    /// Sisa budget; `None` untuk infinite, `Some(ZERO)` kalau sudah habis.
    #[inline]
    pub(crate) fn remaining(&self) -> Option<Duration> {
        self.at
            .map(|at| at.saturating_duration_since(Instant::now()))
    }

    #[inline]
    pub(crate) fn expired(&self) -> bool {
        matches!(self.remaining(), Some(d) if d.is_zero())
    }

    #[inline]
    pub(crate) fn instant(&self) -> Option<Instant> {
        self.at
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_infinite_never_expires() {
        let d = Deadline::new(None);
        assert!(d.remaining().is_none());
        assert!(!d.expired());
    }

    #[test]
    fn test_zero_budget_is_expired() {
        let d = Deadline::new(Some(Duration::ZERO));
        assert!(d.expired());
        assert_eq!(d.remaining(), Some(Duration::ZERO));
    }

    #[test]
    fn test_budget_shrinks() {
        let d = Deadline::new(Some(Duration::from_millis(50)));
        std::thread::sleep(Duration::from_millis(10));
        let left = d.remaining().unwrap();
        assert!(left < Duration::from_millis(50));
    }
}
