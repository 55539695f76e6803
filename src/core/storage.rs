//! Backing storage untuk RingBuf
//!
//! Satu alokasi fixed saat init, dibebaskan sekali saat drop. Tidak pernah
//! di-realloc. Bisa dari heap atau anonymous mmap.
//!
//! Storage sendiri tidak tahu siapa yang memegang region mana: RingBuf yang
//! menjamin region read window dan write window tidak pernah overlap.

use std::ptr::NonNull;

use memmap2::{MmapMut, MmapOptions};

use super::error::RingBufError;
use crate::config::Backing;

enum Region {
    // Memory milik Box<[u8]> yang sudah di-into_raw
    Heap,
    // MmapMut hanya disimpan supaya unmap terjadi saat drop
    Mapped(#[allow(dead_code)] MmapMut),
}

/// Fixed-size byte region yang diakses lewat raw pointer.
pub(crate) struct Storage {
    base: NonNull<u8>,
    capacity: usize,
    region: Region,
}

// SAFETY: Storage hanya pointer ke memory yang dimiliki sendiri.
// Sinkronisasi akses per-region dijamin oleh RingBuf (mutex + in-progress marker).
unsafe impl Send for Storage {}
unsafe impl Sync for Storage {}

impl Storage {
    /// Alokasi storage. Kegagalan alokasi dilaporkan, tidak abort process.
    pub(crate) fn allocate(capacity: usize, backing: Backing) -> Result<Self, RingBufError> {
        if capacity == 0 {
            return Err(RingBufError::ZeroCapacity);
        }

        match backing {
            Backing::Heap => Self::allocate_heap(capacity),
            Backing::AnonMmap => Self::map_anon(capacity),
        }
    }

    fn allocate_heap(capacity: usize) -> Result<Self, RingBufError> {
        let mut buf: Vec<u8> = Vec::new();
        if buf.try_reserve_exact(capacity).is_err() {
            tracing::error!(size = capacity, "out of memory allocating ring storage");
            return Err(RingBufError::OutOfMemory { size: capacity });
        }
        buf.resize(capacity, 0);

        let raw = Box::into_raw(buf.into_boxed_slice());
        // SAFETY: Box::into_raw tidak pernah null
        let base = unsafe { NonNull::new_unchecked(raw as *mut u8) };

        Ok(Self {
            base,
            capacity,
            region: Region::Heap,
        })
    }

    fn map_anon(capacity: usize) -> Result<Self, RingBufError> {
        let mut mmap = MmapOptions::new()
            .len(capacity)
            .map_anon()
            .map_err(|source| {
                tracing::error!(size = capacity, error = %source, "anonymous mmap failed");
                RingBufError::Map {
                    size: capacity,
                    source,
                }
            })?;

        let base = NonNull::new(mmap.as_mut_ptr())
            .ok_or(RingBufError::OutOfMemory { size: capacity })?;

        Ok(Self {
            base,
            capacity,
            region: Region::Mapped(mmap),
        })
    }

    #[inline(always)]
    pub(crate) fn capacity(&self) -> usize {
        self.capacity
    }

    #[inline(always)]
    pub(crate) fn is_mapped(&self) -> bool {
        matches!(self.region, Region::Mapped(_))
    }

    /// # Safety
    /// `[offset, offset + len)` harus di dalam storage dan tidak sedang
    /// ditulis oleh pihak lain selama slice hidup.
    #[inline(always)]
    pub(crate) unsafe fn slice(&self, offset: usize, len: usize) -> &[u8] {
        debug_assert!(offset + len <= self.capacity);
        std::slice::from_raw_parts(self.base.as_ptr().add(offset), len)
    }

    /// # Safety
    /// `[offset, offset + len)` harus di dalam storage dan eksklusif milik
    /// caller selama slice hidup.
    #[inline(always)]
    #[allow(clippy::mut_from_ref)]
    pub(crate) unsafe fn slice_mut(&self, offset: usize, len: usize) -> &mut [u8] {
        debug_assert!(offset + len <= self.capacity);
        std::slice::from_raw_parts_mut(self.base.as_ptr().add(offset), len)
    }

    /// # Safety
    /// Sama seperti `slice_mut`.
    #[inline(always)]
    pub(crate) unsafe fn copy_in(&self, offset: usize, src: &[u8]) {
        debug_assert!(offset + src.len() <= self.capacity);
        std::ptr::copy_nonoverlapping(src.as_ptr(), self.base.as_ptr().add(offset), src.len());
    }

    /// # Safety
    /// Sama seperti `slice`.
    #[inline(always)]
    pub(crate) unsafe fn copy_out(&self, offset: usize, dst: &mut [u8]) {
        debug_assert!(offset + dst.len() <= self.capacity);
        std::ptr::copy_nonoverlapping(self.base.as_ptr().add(offset), dst.as_mut_ptr(), dst.len());
    }
}

impl Drop for Storage {
    fn drop(&mut self) {
        if let Region::Heap = self.region {
            // SAFETY: base + capacity berasal dari Box<[u8]> di allocate_heap
            unsafe {
                let slice = std::ptr::slice_from_raw_parts_mut(self.base.as_ptr(), self.capacity);
                drop(Box::from_raw(slice));
            }
        }
    }
}
