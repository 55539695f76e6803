//! Guard untuk window contiguous
//!
//! - `ReadBuf`: window baca dari `contig_read`. Saat drop, commit panjang
//!   yang dilaporkan (atau panjang yang sudah dikecilkan lewat
//!   `set_commit_len`).
//! - `WriteBuf`: reservasi tulis dari `get_write_buf`. Harus di-`commit`;
//!   drop tanpa commit berarti abort.
//!
//! Keduanya meminjam storage ring secara langsung (zero-copy) dan terikat ke
//! tepat satu RingBuf.

use std::ops::{Deref, DerefMut};

use super::ring_buf::RingBuf;

/// Window baca contiguous; auto-commit saat drop.
pub struct ReadBuf<'a> {
    ring: &'a RingBuf,
    offset: usize,
    len: usize,
    commit_len: usize,
}

impl<'a> ReadBuf<'a> {
    pub(crate) fn new(ring: &'a RingBuf, offset: usize, len: usize) -> Self {
        Self {
            ring,
            offset,
            len,
            commit_len: len,
        }
    }

    /// Offset window di dalam storage ring.
    #[inline]
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Kecilkan jumlah byte yang akan di-commit saat drop (partial commit).
    ///
    /// # Panics
    /// Kalau `len` melebihi panjang window.
    pub fn set_commit_len(&mut self, len: usize) {
        assert!(
            len <= self.len,
            "commit of {} bytes exceeds {}-byte read window",
            len,
            self.len
        );
        self.commit_len = len;
    }

    /// Commit `size` byte sekarang dan lepas window.
    pub fn commit(mut self, size: usize) {
        self.set_commit_len(size);
    }
}

impl Deref for ReadBuf<'_> {
    type Target = [u8];

    #[inline]
    fn deref(&self) -> &[u8] {
        // SAFETY: region ini data yang belum dibaca dan read marker masih
        // ter-set, jadi producer maupun clear() tidak menyentuhnya.
        unsafe { self.ring.storage().slice(self.offset, self.len) }
    }
}

impl Drop for ReadBuf<'_> {
    fn drop(&mut self) {
        self.ring.commit_contig_read(self.commit_len);
    }
}

/// Reservasi tulis contiguous; abort kalau di-drop tanpa commit.
pub struct WriteBuf<'a> {
    ring: &'a RingBuf,
    offset: usize,
    len: usize,
    done: bool,
}

impl<'a> WriteBuf<'a> {
    pub(crate) fn new(ring: &'a RingBuf, offset: usize, len: usize) -> Self {
        Self {
            ring,
            offset,
            len,
            done: false,
        }
    }

    #[inline]
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Publikasikan `size` byte pertama dari reservasi ke consumer.
    ///
    /// # Panics
    /// Kalau `size` melebihi panjang reservasi.
    pub fn commit(mut self, size: usize) {
        assert!(
            size <= self.len,
            "commit of {} bytes exceeds {}-byte write reservation",
            size,
            self.len
        );
        self.done = true;
        self.ring.commit_write(size);
    }

    /// Lepas reservasi tanpa memajukan write cursor.
    pub fn abort(self) {}
}

impl Deref for WriteBuf<'_> {
    type Target = [u8];

    #[inline]
    fn deref(&self) -> &[u8] {
        // SAFETY: region free milik reservasi ini sampai commit/abort.
        unsafe { self.ring.storage().slice(self.offset, self.len) }
    }
}

impl DerefMut for WriteBuf<'_> {
    #[inline]
    fn deref_mut(&mut self) -> &mut [u8] {
        // SAFETY: write marker menjamin hanya satu reservasi yang hidup.
        unsafe { self.ring.storage().slice_mut(self.offset, self.len) }
    }
}

impl Drop for WriteBuf<'_> {
    fn drop(&mut self) {
        if !self.done {
            self.ring.abort_write();
        }
    }
}
