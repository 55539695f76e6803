//! Blocking Zero-Copy SPSC Byte Ring
//!
//! Byte stream antara tepat satu producer dan satu consumer, dengan
//! backpressure. Dua gaya akses:
//! - Whole-buffer: `write` / `read` (copy, maksimal dua segmen karena wraparound)
//! - Contiguous window: `contig_read` / `get_write_buf` (zero-copy, pointer
//!   langsung ke storage, tidak pernah melewati batas wraparound)
//!
//! Semua mutasi cursor/size terjadi di bawah satu mutex. Selama caller
//! mengisi/menguras window, mutex dilepas; mutex diambil lagi hanya untuk
//! commit/abort. Thread yang block selalu block di EventSet, tidak pernah
//! sambil memegang mutex.
//!
//! Dua marker in-progress (read window, write reservation) menjaga `clear()`
//! dan mendeteksi pelanggaran protokol borrow.

use std::fmt;
use std::time::Duration;

use parking_lot::{Mutex, MutexGuard};

use super::deadline::Deadline;
use super::error::RingBufError;
use super::peek::Peek;
use super::read_buf::{ReadBuf, WriteBuf};
use super::storage::Storage;
use super::waitable::{flags, Wait, WaitStatus, Waitable};
use crate::config::RingBufConfig;

const READ_IN_PROGRESS: u8 = 1;
const WRITE_IN_PROGRESS: u8 = 2;

/// Cursor state, hanya diubah di bawah mutex.
///
/// `len` adalah jarak kanonik dari `read` ke `write` (mod capacity);
/// `read == write` berarti kosong kalau `len == 0`, penuh kalau `len == capacity`.
#[derive(Debug)]
struct Cursors {
    write: usize,
    read: usize,
    len: usize,
    in_progress: u8,
}

impl Cursors {
    #[inline(always)]
    fn contig_readable(&self, capacity: usize) -> usize {
        self.len.min(capacity - self.read)
    }

    #[inline(always)]
    fn contig_writable(&self, capacity: usize) -> usize {
        (capacity - self.len).min(capacity - self.write)
    }
}

/// Blocking SPSC byte ring.
///
/// Satu producer thread, satu consumer thread. Dua writer atau dua reader
/// bersamaan adalah pelanggaran pemakaian; window yang overlap terdeteksi
/// lewat marker dan berakhir panic.
pub struct RingBuf {
    storage: Storage,
    state: Mutex<Cursors>,
    waitable: Waitable,
}

impl fmt::Debug for RingBuf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let c = self.state.lock();
        f.debug_struct("RingBuf")
            .field("capacity", &self.capacity())
            .field("read", &c.read)
            .field("write", &c.write)
            .field("len", &c.len)
            .field("in_progress", &c.in_progress)
            .finish()
    }
}

impl RingBuf {
    /// Membuat ring dengan kapasitas `capacity` byte di heap.
    ///
    /// Alokasi hanya terjadi sekali di sini. Gagal alokasi dilaporkan sebagai
    /// error, bukan abort.
    pub fn new(capacity: usize) -> Result<Self, RingBufError> {
        Self::with_config(RingBufConfig::new(capacity))
    }

    pub fn with_config(config: RingBufConfig) -> Result<Self, RingBufError> {
        let storage = Storage::allocate(config.capacity, config.backing)?;
        let ring = Self {
            storage,
            state: Mutex::new(Cursors {
                write: 0,
                read: 0,
                len: 0,
                in_progress: 0,
            }),
            waitable: Waitable::new(),
        };
        ring.waitable
            .events()
            .set_bits(flags::HAS_SPACE | flags::IS_EMPTY | flags::READ_OP);

        tracing::debug!(
            capacity = config.capacity,
            mapped = ring.storage.is_mapped(),
            "ring buffer created"
        );
        Ok(ring)
    }

    #[inline(always)]
    pub fn capacity(&self) -> usize {
        self.storage.capacity()
    }

    /// Jumlah byte yang belum dibaca.
    #[inline]
    pub fn data_size(&self) -> usize {
        self.state.lock().len
    }

    /// `capacity - data_size`, diambil di bawah lock.
    #[inline]
    pub fn total_empty_space(&self) -> usize {
        self.capacity() - self.state.lock().len
    }

    /// Cek advisory HAS_ITEMS tanpa mengambil mutex ring.
    #[inline]
    pub fn has_data(&self) -> bool {
        self.waitable.events().get() & flags::HAS_ITEMS != 0
    }

    /// Ambil mutex ring supaya state eksternal bisa dijaga konsisten dengan
    /// isi buffer dalam critical section yang sama.
    ///
    /// Mutex tidak reentrant: memanggil method lain dari ring ini selama
    /// guard hidup akan deadlock.
    pub fn lock(&self) -> RingLock<'_> {
        RingLock {
            guard: self.state.lock(),
            capacity: self.capacity(),
        }
    }

    #[inline]
    pub fn waitable(&self) -> &Waitable {
        &self.waitable
    }

    pub fn set_stop_signal(&self) {
        self.waitable.set_stop_signal();
    }

    pub fn clear_stop_signal(&self) {
        self.waitable.clear_stop_signal();
    }

    #[inline]
    pub fn is_stopped(&self) -> bool {
        self.waitable.is_stopped()
    }

    pub fn wait_for_items(&self, timeout: Option<Duration>) -> WaitStatus {
        self.waitable.wait_for_items(timeout)
    }

    pub fn wait_for_empty(&self, timeout: Option<Duration>) -> WaitStatus {
        self.waitable.wait_for_empty(timeout)
    }

    /// Tulis semua `data`, block sampai ada cukup ruang.
    ///
    /// Returns `Ready` kalau semua byte masuk, `Stopped` kalau dibatalkan.
    ///
    /// # Panics
    /// Kalau `data` lebih besar dari kapasitas, atau ada write reservation
    /// yang belum di-commit.
    pub fn write(&self, data: &[u8]) -> WaitStatus {
        self.write_timeout(data, None)
    }

    /// Seperti `write`, tapi dengan total budget waktu.
    pub fn write_timeout(&self, data: &[u8], timeout: Option<Duration>) -> WaitStatus {
        let capacity = self.capacity();
        assert!(
            data.len() <= capacity,
            "write of {} bytes can never fit in a {}-byte ring",
            data.len(),
            capacity
        );

        let deadline = Deadline::new(timeout);
        loop {
            {
                let mut c = self.state.lock();
                assert!(
                    c.in_progress & WRITE_IN_PROGRESS == 0,
                    "write() while a write reservation is outstanding"
                );
                if capacity - c.len >= data.len() {
                    // Tail run, lalu head run
                    let first = self.copy_in_locked(&mut c, data);
                    if first < data.len() {
                        let second = self.copy_in_locked(&mut c, &data[first..]);
                        assert_eq!(first + second, data.len());
                    }
                    return Wait::Ready(());
                }
            }

            if deadline.expired() {
                return Wait::TimedOut;
            }
            tracing::trace!(want = data.len(), "ring overflow, waiting for space");
            match self.waitable.wait_pulse(flags::READ_OP, deadline) {
                Wait::Ready(()) => {}
                other => return other,
            }
        }
    }

    /// Baca tepat `buf.len()` byte, block sampai semuanya tersedia.
    ///
    /// Tidak pernah short read. Timeout adalah total budget untuk semua
    /// iterasi retry; timeout tidak mengubah state buffer.
    ///
    /// # Panics
    /// Kalau `buf` lebih besar dari kapasitas, atau ada read window yang
    /// belum di-commit.
    pub fn read(&self, buf: &mut [u8], timeout: Option<Duration>) -> WaitStatus {
        let capacity = self.capacity();
        assert!(
            buf.len() <= capacity,
            "read of {} bytes can never be satisfied by a {}-byte ring",
            buf.len(),
            capacity
        );

        let deadline = Deadline::new(timeout);
        loop {
            {
                let mut c = self.state.lock();
                self.assert_no_read_window(&c);
                if c.len >= buf.len() {
                    let first = self.copy_out_locked(&mut c, buf);
                    if first < buf.len() {
                        let second = self.copy_out_locked(&mut c, &mut buf[first..]);
                        assert_eq!(first + second, buf.len());
                    }
                    return Wait::Ready(());
                }
            }

            if deadline.expired() {
                return Wait::TimedOut;
            }
            tracing::trace!(want = buf.len(), "ring underflow, waiting for data");
            match self.waitable.wait_pulse(flags::WRITE_OP, deadline) {
                Wait::Ready(()) => {}
                other => return other,
            }
        }
    }

    /// Window baca contiguous langsung ke storage.
    ///
    /// Panjangnya di `[1, max_size]`: run terpanjang yang tersedia tanpa
    /// melewati batas wraparound. Block selama ring kosong. Window di-commit
    /// otomatis saat `ReadBuf` di-drop.
    ///
    /// # Panics
    /// Kalau `max_size == 0` atau masih ada read window lain.
    pub fn contig_read(&self, max_size: usize, timeout: Option<Duration>) -> Wait<ReadBuf<'_>> {
        assert!(max_size > 0, "contig_read with max_size 0");

        let capacity = self.capacity();
        let deadline = Deadline::new(timeout);
        loop {
            {
                let mut c = self.state.lock();
                self.assert_no_read_window(&c);
                let avail = c.contig_readable(capacity);
                if avail > 0 {
                    c.in_progress |= READ_IN_PROGRESS;
                    return Wait::Ready(ReadBuf::new(self, c.read, avail.min(max_size)));
                }
            }

            if deadline.expired() {
                return Wait::TimedOut;
            }
            tracing::trace!("ring underflow, waiting for data");
            match self.waitable.wait_pulse(flags::WRITE_OP, deadline) {
                Wait::Ready(()) => {}
                Wait::TimedOut => return Wait::TimedOut,
                Wait::Stopped => return Wait::Stopped,
            }
        }
    }

    /// Lihat `len` byte berikutnya tanpa mengonsumsi.
    ///
    /// Kalau `len` byte itu contiguous, hasilnya pointer langsung ke storage;
    /// kalau wrap, dua potongannya di-copy ke `scratch`. Cursor tidak pernah
    /// berubah. `Some(Duration::ZERO)` langsung `TimedOut` kalau data kurang.
    ///
    /// # Panics
    /// Kalau `len` lebih besar dari kapasitas atau dari `scratch`, atau masih
    /// ada read window lain.
    pub fn peek<'a>(
        &'a self,
        len: usize,
        scratch: &'a mut [u8],
        timeout: Option<Duration>,
    ) -> Wait<Peek<'a>> {
        let capacity = self.capacity();
        assert!(
            len <= capacity,
            "peek of {} bytes can never be satisfied by a {}-byte ring",
            len,
            capacity
        );
        assert!(
            scratch.len() >= len,
            "peek scratch of {} bytes is smaller than requested {}",
            scratch.len(),
            len
        );

        let deadline = Deadline::new(timeout);
        loop {
            {
                let mut c = self.state.lock();
                self.assert_no_read_window(&c);
                if c.len >= len {
                    let contig = c.contig_readable(capacity);
                    if contig >= len {
                        c.in_progress |= READ_IN_PROGRESS;
                        return Wait::Ready(Peek::borrowed(self, c.read, len));
                    }
                    // SAFETY: kedua potongan ada di region data; producer
                    // tidak menyentuhnya dan kita memegang mutex.
                    unsafe {
                        self.storage.copy_out(c.read, &mut scratch[..contig]);
                        self.storage.copy_out(0, &mut scratch[contig..len]);
                    }
                    break;
                }
            }

            if deadline.expired() {
                return Wait::TimedOut;
            }
            match self.waitable.wait_pulse(flags::WRITE_OP, deadline) {
                Wait::Ready(()) => {}
                Wait::TimedOut => return Wait::TimedOut,
                Wait::Stopped => return Wait::Stopped,
            }
        }

        Wait::Ready(Peek::copied(&scratch[..len]))
    }

    /// Reservasi window tulis contiguous langsung ke storage.
    ///
    /// Panjangnya `min(req_size, free run sampai batas wraparound)`. Block
    /// selama tidak ada free run. Drop tanpa commit sama dengan abort.
    ///
    /// # Panics
    /// Kalau `req_size == 0` atau masih ada reservasi lain.
    pub fn get_write_buf(&self, req_size: usize, timeout: Option<Duration>) -> Wait<WriteBuf<'_>> {
        assert!(req_size > 0, "get_write_buf with req_size 0");

        let capacity = self.capacity();
        let deadline = Deadline::new(timeout);
        loop {
            {
                let mut c = self.state.lock();
                assert!(
                    c.in_progress & WRITE_IN_PROGRESS == 0,
                    "get_write_buf() while another write reservation is outstanding"
                );
                let avail = c.contig_writable(capacity);
                if avail > 0 {
                    c.in_progress |= WRITE_IN_PROGRESS;
                    return Wait::Ready(WriteBuf::new(self, c.write, avail.min(req_size)));
                }
            }

            if deadline.expired() {
                return Wait::TimedOut;
            }
            tracing::trace!(want = req_size, "ring overflow, waiting for space");
            match self.waitable.wait_pulse(flags::READ_OP, deadline) {
                Wait::Ready(()) => {}
                Wait::TimedOut => return Wait::TimedOut,
                Wait::Stopped => return Wait::Stopped,
            }
        }
    }

    /// Reset ke kosong. Storage tidak di-realloc.
    ///
    /// Kalau masih ada window contiguous yang belum di-commit, tunggu sampai
    /// dilepas lalu cek ulang dari awal (window baru bisa saja dibuka di
    /// sela-sela). Returns `Stopped` kalau stop signal masuk selama menunggu.
    pub fn clear(&self) -> WaitStatus {
        loop {
            {
                let mut c = self.state.lock();
                if c.in_progress == 0 {
                    c.write = 0;
                    c.read = 0;
                    c.len = 0;
                    self.waitable.events().modify(
                        flags::HAS_SPACE | flags::IS_EMPTY | flags::READ_OP,
                        flags::HAS_ITEMS | flags::WRITE_OP,
                    );
                    tracing::debug!("ring buffer cleared");
                    return Wait::Ready(());
                }
            }

            tracing::trace!("clear waiting for outstanding window");
            if let Wait::Stopped = self
                .waitable
                .wait_pulse(flags::OP_DONE, Deadline::new(None))
            {
                return Wait::Stopped;
            }
        }
    }

    // ---- dipanggil oleh guard window ----

    #[inline(always)]
    pub(crate) fn storage(&self) -> &Storage {
        &self.storage
    }

    pub(crate) fn commit_contig_read(&self, size: usize) {
        let mut c = self.state.lock();
        assert!(
            c.in_progress & READ_IN_PROGRESS != 0,
            "commit of a read window that is not outstanding"
        );
        self.commit_read_locked(&mut c, size);
        c.in_progress &= !READ_IN_PROGRESS;
        self.waitable.events().set_bits(flags::OP_DONE);
    }

    /// Lepas marker peek tanpa mengonsumsi apa pun.
    pub(crate) fn release_peek(&self) {
        let mut c = self.state.lock();
        c.in_progress &= !READ_IN_PROGRESS;
        self.waitable.events().set_bits(flags::OP_DONE);
    }

    pub(crate) fn commit_write(&self, size: usize) {
        let mut c = self.state.lock();
        assert!(
            c.in_progress & WRITE_IN_PROGRESS != 0,
            "commit of a write reservation that is not outstanding"
        );
        self.commit_write_locked(&mut c, size);
        c.in_progress &= !WRITE_IN_PROGRESS;
        self.waitable.events().set_bits(flags::OP_DONE);
    }

    pub(crate) fn abort_write(&self) {
        let mut c = self.state.lock();
        c.in_progress &= !WRITE_IN_PROGRESS;
        self.waitable.events().set_bits(flags::OP_DONE);
    }

    // ---- helper di bawah lock ----

    #[inline]
    fn assert_no_read_window(&self, c: &Cursors) {
        assert!(
            c.in_progress & READ_IN_PROGRESS == 0,
            "read access while a read window is outstanding"
        );
    }

    fn copy_in_locked(&self, c: &mut Cursors, src: &[u8]) -> usize {
        let n = src.len().min(c.contig_writable(self.capacity()));
        // SAFETY: [write, write + n) adalah free region, tidak ada reservasi
        // yang terbuka, dan consumer hanya menyentuh region data.
        unsafe { self.storage.copy_in(c.write, &src[..n]) };
        self.commit_write_locked(c, n);
        n
    }

    fn copy_out_locked(&self, c: &mut Cursors, dst: &mut [u8]) -> usize {
        let n = dst.len().min(c.contig_readable(self.capacity()));
        // SAFETY: [read, read + n) adalah region data; producer tidak menyentuhnya.
        unsafe { self.storage.copy_out(c.read, &mut dst[..n]) };
        self.commit_read_locked(c, n);
        n
    }

    fn commit_read_locked(&self, c: &mut Cursors, size: usize) {
        let capacity = self.capacity();
        let avail = c.contig_readable(capacity);
        assert!(
            size <= avail,
            "commit of {} bytes exceeds {} contiguous readable bytes",
            size,
            avail
        );
        if size == 0 {
            return;
        }

        c.read += size;
        if c.read == capacity {
            c.read = 0;
        }
        c.len -= size;

        let mut set = flags::READ_OP | flags::HAS_SPACE;
        let mut clear = 0;
        if c.len == 0 {
            set |= flags::IS_EMPTY;
            clear |= flags::HAS_ITEMS;
        }
        self.waitable.events().modify(set, clear);
    }

    fn commit_write_locked(&self, c: &mut Cursors, size: usize) {
        let capacity = self.capacity();
        let avail = c.contig_writable(capacity);
        assert!(
            size <= avail,
            "commit of {} bytes exceeds {} contiguous writable bytes",
            size,
            avail
        );
        if size == 0 {
            return;
        }

        c.write += size;
        if c.write == capacity {
            c.write = 0;
        }
        c.len += size;

        let mut clear = flags::IS_EMPTY;
        if c.len == capacity {
            clear |= flags::HAS_SPACE;
        }
        self.waitable
            .events()
            .modify(flags::WRITE_OP | flags::HAS_ITEMS, clear);
    }
}

/// Guard atas mutex ring (lihat `RingBuf::lock`).
pub struct RingLock<'a> {
    guard: MutexGuard<'a, Cursors>,
    capacity: usize,
}

impl RingLock<'_> {
    #[inline]
    pub fn data_size(&self) -> usize {
        self.guard.len
    }

    #[inline]
    pub fn total_empty_space(&self) -> usize {
        self.capacity - self.guard.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.guard.len == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;
    use std::time::Instant;

    const NOW: Option<Duration> = Some(Duration::ZERO);

    fn drain(ring: &RingBuf) -> Vec<u8> {
        let mut out = vec![0u8; ring.data_size()];
        assert_eq!(ring.read(&mut out, NOW), Wait::Ready(()));
        out
    }

    #[test]
    fn test_fresh_ring_is_empty() {
        let ring = RingBuf::new(16).unwrap();
        assert_eq!(ring.capacity(), 16);
        assert_eq!(ring.data_size(), 0);
        assert_eq!(ring.total_empty_space(), 16);
        assert!(!ring.has_data());
        assert_eq!(ring.wait_for_empty(NOW), Wait::Ready(()));
    }

    #[test]
    fn test_zero_capacity_is_error() {
        assert!(matches!(RingBuf::new(0), Err(RingBufError::ZeroCapacity)));
    }

    #[test]
    fn test_write_then_read() {
        let ring = RingBuf::new(16).unwrap();
        assert_eq!(ring.write(b"hello"), Wait::Ready(()));
        assert!(ring.has_data());
        assert_eq!(ring.data_size(), 5);

        let mut buf = [0u8; 5];
        assert_eq!(ring.read(&mut buf, NOW), Wait::Ready(()));
        assert_eq!(&buf, b"hello");
        assert!(!ring.has_data());
        assert_eq!(ring.total_empty_space(), 16);
    }

    #[test]
    fn test_read_never_short() {
        let ring = RingBuf::new(16).unwrap();
        ring.write(b"abc").ready().unwrap();

        let mut buf = [0u8; 4];
        assert_eq!(ring.read(&mut buf, NOW), Wait::TimedOut);
        // Timeout tidak mengubah state
        assert_eq!(ring.data_size(), 3);
    }

    #[test]
    fn test_scenario_wraparound() {
        let ring = RingBuf::new(16).unwrap();
        ring.write(b"0123456789").ready().unwrap();

        let window = ring.contig_read(16, NOW).ready().unwrap();
        assert_eq!(window.offset(), 0);
        assert_eq!(&window[..], b"0123456789");
        window.commit(4);
        assert_eq!(ring.data_size(), 6);

        // 6 byte di tail, 4 byte di head
        ring.write(b"ABCDEFGHIJ").ready().unwrap();
        assert_eq!(ring.data_size(), 16);
        assert_eq!(ring.total_empty_space(), 0);

        let mut out = Vec::new();
        let mut chunk = [0u8; 3];
        while ring.data_size() >= chunk.len() {
            ring.read(&mut chunk, NOW).ready().unwrap();
            out.extend_from_slice(&chunk);
        }
        let mut rest = vec![0u8; ring.data_size()];
        ring.read(&mut rest, NOW).ready().unwrap();
        out.extend_from_slice(&rest);

        assert_eq!(out, b"456789ABCDEFGHIJ");
        assert_eq!(ring.data_size(), 0);
        assert!(!ring.has_data());
    }

    #[test]
    fn test_contig_read_stops_at_boundary() {
        let ring = RingBuf::new(8).unwrap();
        ring.write(b"abcdef").ready().unwrap();
        drain(&ring);
        ring.write(b"123456").ready().unwrap(); // 2 di tail, 4 di head

        let first = ring.contig_read(8, NOW).ready().unwrap();
        assert_eq!(&first[..], b"12");
        drop(first);

        let second = ring.contig_read(3, NOW).ready().unwrap();
        assert_eq!(&second[..], b"345");
        drop(second);
        assert_eq!(ring.data_size(), 1);
    }

    #[test]
    fn test_partial_commit_via_set_commit_len() {
        let ring = RingBuf::new(8).unwrap();
        ring.write(b"abcd").ready().unwrap();
        {
            let mut window = ring.contig_read(8, NOW).ready().unwrap();
            assert_eq!(window.len(), 4);
            window.set_commit_len(1);
        }
        assert_eq!(drain(&ring), b"bcd");
    }

    #[test]
    fn test_write_buf_commit_and_abort() {
        let ring = RingBuf::new(8).unwrap();

        let mut wb = ring.get_write_buf(5, NOW).ready().unwrap();
        assert_eq!(wb.len(), 5);
        wb[..3].copy_from_slice(b"xyz");
        wb.commit(3);
        assert_eq!(ring.data_size(), 3);

        let mut wb = ring.get_write_buf(2, NOW).ready().unwrap();
        wb.copy_from_slice(b"!!");
        wb.abort();
        assert_eq!(ring.data_size(), 3);

        assert_eq!(drain(&ring), b"xyz");
    }

    #[test]
    fn test_write_buf_capped_by_boundary() {
        let ring = RingBuf::new(8).unwrap();
        ring.write(b"abcdef").ready().unwrap();
        drain(&ring);

        let wb = ring.get_write_buf(100, NOW).ready().unwrap();
        assert_eq!(wb.offset(), 6);
        assert_eq!(wb.len(), 2);
    }

    #[test]
    fn test_full_ring_blocks_write_buf() {
        let ring = RingBuf::new(4).unwrap();
        ring.write(b"full").ready().unwrap();
        assert!(ring.get_write_buf(1, NOW).is_timed_out());
        assert_eq!(ring.write_timeout(b"x", NOW), Wait::TimedOut);
    }

    #[test]
    #[should_panic(expected = "exceeds")]
    fn test_over_commit_panics() {
        let ring = RingBuf::new(8).unwrap();
        let wb = ring.get_write_buf(4, NOW).ready().unwrap();
        wb.commit(5);
    }

    #[test]
    #[should_panic(expected = "outstanding")]
    fn test_second_read_window_panics() {
        let ring = RingBuf::new(8).unwrap();
        ring.write(b"ab").ready().unwrap();
        let _first = ring.contig_read(1, NOW).ready().unwrap();
        let _second = ring.contig_read(1, NOW);
    }

    #[test]
    fn test_peek_is_non_consuming() {
        let ring = RingBuf::new(8).unwrap();
        ring.write(b"abcdef").ready().unwrap();
        drain(&ring);
        ring.write(b"123456").ready().unwrap(); // wrap setelah "12"

        let mut scratch = [0u8; 8];
        {
            let p = ring.peek(2, &mut scratch, NOW).ready().unwrap();
            assert!(p.is_borrowed());
            assert_eq!(&p[..], b"12");
        }
        let first = {
            let p = ring.peek(5, &mut scratch, NOW).ready().unwrap();
            assert!(!p.is_borrowed());
            p.to_vec()
        };
        let second = ring.peek(5, &mut scratch, NOW).ready().unwrap().to_vec();
        assert_eq!(first, b"12345");
        assert_eq!(first, second);
        assert_eq!(ring.data_size(), 6);
    }

    #[test]
    fn test_peek_zero_timeout_returns_immediately() {
        let ring = RingBuf::new(8).unwrap();
        ring.write(b"ab").ready().unwrap();
        let mut scratch = [0u8; 8];
        let start = Instant::now();
        assert!(ring.peek(3, &mut scratch, NOW).is_timed_out());
        assert!(start.elapsed() < Duration::from_millis(100));
    }

    #[test]
    fn test_clear_resets_state() {
        let ring = RingBuf::new(8).unwrap();
        ring.write(b"abcde").ready().unwrap();
        assert_eq!(ring.clear(), Wait::Ready(()));
        assert_eq!(ring.data_size(), 0);
        assert!(!ring.has_data());
        assert!(ring.contig_read(8, NOW).is_timed_out());

        // Setelah clear cursor kembali ke awal
        let wb = ring.get_write_buf(8, NOW).ready().unwrap();
        assert_eq!(wb.offset(), 0);
        assert_eq!(wb.len(), 8);
    }

    #[test]
    fn test_clear_waits_for_read_window() {
        let ring = Arc::new(RingBuf::new(8).unwrap());
        ring.write(b"abcd").ready().unwrap();

        let window = ring.contig_read(8, NOW).ready().unwrap();

        let clearer = {
            let ring = Arc::clone(&ring);
            thread::spawn(move || ring.clear())
        };
        thread::sleep(Duration::from_millis(50));
        assert!(!clearer.is_finished());
        assert_eq!(ring.lock().data_size(), 4);

        window.commit(2);
        assert_eq!(clearer.join().unwrap(), Wait::Ready(()));
        assert_eq!(ring.data_size(), 0);
    }

    #[test]
    fn test_clear_waits_for_write_reservation() {
        let ring = Arc::new(RingBuf::new(8).unwrap());
        ring.write(b"ab").ready().unwrap();

        // commit lalu abort: keduanya harus melepas clear()
        for commit in [true, false] {
            let mut wb = ring.get_write_buf(3, NOW).ready().unwrap();
            wb.copy_from_slice(b"xyz");

            let clearer = {
                let ring = Arc::clone(&ring);
                thread::spawn(move || ring.clear())
            };
            thread::sleep(Duration::from_millis(50));
            assert!(!clearer.is_finished());

            if commit {
                wb.commit(3);
            } else {
                wb.abort();
            }
            assert_eq!(clearer.join().unwrap(), Wait::Ready(()));
            assert_eq!(ring.data_size(), 0);
            assert!(!ring.has_data());
        }
    }

    #[test]
    fn test_clear_waits_for_borrowed_peek() {
        let ring = Arc::new(RingBuf::new(8).unwrap());
        ring.write(b"abcd").ready().unwrap();

        let mut scratch = [0u8; 8];
        let peek = ring.peek(4, &mut scratch, NOW).ready().unwrap();
        assert!(peek.is_borrowed());

        let clearer = {
            let ring = Arc::clone(&ring);
            thread::spawn(move || ring.clear())
        };
        thread::sleep(Duration::from_millis(50));
        assert!(!clearer.is_finished());
        assert_eq!(&peek[..], b"abcd");

        drop(peek);
        assert_eq!(clearer.join().unwrap(), Wait::Ready(()));
        assert_eq!(ring.data_size(), 0);
    }

    #[test]
    fn test_stop_interrupts_and_is_resumable() {
        let ring = Arc::new(RingBuf::new(8).unwrap());
        let reader = {
            let ring = Arc::clone(&ring);
            thread::spawn(move || {
                let mut buf = [0u8; 4];
                ring.read(&mut buf, None)
            })
        };

        thread::sleep(Duration::from_millis(20));
        ring.set_stop_signal();
        assert_eq!(reader.join().unwrap(), Wait::Stopped);
        assert_eq!(ring.data_size(), 0);

        ring.clear_stop_signal();
        ring.write(b"ok").ready().unwrap();
        let mut buf = [0u8; 2];
        assert_eq!(ring.read(&mut buf, NOW), Wait::Ready(()));
        assert_eq!(&buf, b"ok");
    }

    #[test]
    fn test_mmap_backing() {
        let cfg = RingBufConfig::new(4096).backing(crate::config::Backing::AnonMmap);
        let ring = RingBuf::with_config(cfg).unwrap();
        ring.write(b"mapped bytes").ready().unwrap();
        assert_eq!(drain(&ring), b"mapped bytes");
    }
}
