//! Hasil `RingBuf::peek`: view non-consuming ke byte berikutnya.

use std::ops::Deref;

use super::ring_buf::RingBuf;

enum View<'a> {
    // Langsung dari storage, read marker ditahan sampai drop
    Borrowed {
        ring: &'a RingBuf,
        offset: usize,
        len: usize,
    },
    // Data wrap, dua potongan sudah di-copy ke scratch
    Copied(&'a [u8]),
}

/// Byte hasil peek. Cursor ring tidak berubah.
pub struct Peek<'a> {
    view: View<'a>,
}

impl<'a> Peek<'a> {
    pub(crate) fn borrowed(ring: &'a RingBuf, offset: usize, len: usize) -> Self {
        Self {
            view: View::Borrowed { ring, offset, len },
        }
    }

    pub(crate) fn copied(bytes: &'a [u8]) -> Self {
        Self {
            view: View::Copied(bytes),
        }
    }

    /// `true` kalau view menunjuk langsung ke storage ring.
    #[inline]
    pub fn is_borrowed(&self) -> bool {
        matches!(self.view, View::Borrowed { .. })
    }
}

impl Deref for Peek<'_> {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        match &self.view {
            // SAFETY: read marker ter-set selama Peek hidup, region data
            // tidak bisa dikonsumsi atau di-clear.
            View::Borrowed { ring, offset, len } => unsafe { ring.storage().slice(*offset, *len) },
            View::Copied(bytes) => bytes,
        }
    }
}

impl Drop for Peek<'_> {
    fn drop(&mut self) {
        if let View::Borrowed { ring, .. } = &self.view {
            ring.release_peek();
        }
    }
}
