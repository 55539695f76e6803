//! Konfigurasi RingBuf
//!
//! Kapasitas fixed saat konstruksi, plus pilihan dari mana backing storage
//! dialokasikan.

/// Dari mana backing storage diambil.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Backing {
    /// Heap biasa (global allocator).
    #[default]
    Heap,
    /// Anonymous mmap: halaman di-commit lazy oleh kernel, cocok untuk
    /// buffer besar yang tidak mau membebani heap.
    AnonMmap,
}

/// Parameter konstruksi RingBuf.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RingBufConfig {
    pub capacity: usize,
    pub backing: Backing,
}

pub const DEFAULT_CAPACITY: usize = 64 * 1024; // 64KB

impl Default for RingBufConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            backing: Backing::Heap,
        }
    }
}

impl RingBufConfig {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            ..Self::default()
        }
    }

    pub fn capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    pub fn backing(mut self, backing: Backing) -> Self {
        self.backing = backing;
        self
    }
}
