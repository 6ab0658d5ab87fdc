//! Bounded Single-Producer Single-Consumer (SPSC) Byte Ring
//!
//! Ring buffer byte berkapasitas tetap dengan blocking backpressure:
//! - Producer block saat ring penuh
//! - Consumer block saat ring kosong
//! - `close()` membangunkan keduanya, semua operasi setelahnya return 0
//!
//! Satu-satunya state yang di-share adalah counter `buffered` (plus flag
//! alive), dijaga Mutex + Condvar. Cursor tulis dimiliki `Producer`,
//! cursor baca dimiliki `Consumer`, jadi keduanya tidak perlu lock.
//!
//! ```
//! use bytering::ByteRing;
//! use std::thread;
//!
//! let (mut producer, mut consumer) = ByteRing::new(16).split();
//!
//! let writer = thread::spawn(move || producer.write(b"hello, ring"));
//!
//! let mut buf = [0u8; 32];
//! let mut received = Vec::new();
//! while received.len() < 11 {
//!     let n = consumer.read(&mut buf);
//!     received.extend_from_slice(&buf[..n]);
//! }
//!
//! assert_eq!(writer.join().unwrap(), 11);
//! assert_eq!(received, b"hello, ring");
//! ```

use parking_lot::{Condvar, Mutex};
use std::fmt;
use std::io;
use std::sync::Arc;
use tracing::{debug, trace};

use super::storage::{Backing, Storage};
use crate::config::RingConfig;
use crate::error::Result;

/// Kapasitas default saat kapasitas 0 diminta (32 KB)
pub const DEFAULT_CAPACITY: usize = 32 * 1024;

/// State yang di-share antara producer dan consumer
struct State {
    buffered: usize,
    alive: bool,
    producer_attached: bool,
}

struct Shared {
    storage: Storage,
    state: Mutex<State>,
    // Satu condvar untuk dua arah, selalu notify_all
    cond: Condvar,
}

impl Shared {
    #[inline]
    fn len(&self) -> usize {
        self.state.lock().buffered
    }

    #[inline]
    fn is_closed(&self) -> bool {
        !self.state.lock().alive
    }

    fn close(&self) {
        let mut state = self.state.lock();
        if state.alive {
            debug!(
                capacity = self.storage.capacity(),
                discarded = state.buffered,
                "byte ring closed"
            );
        }
        state.alive = false;
        state.buffered = 0;
        drop(state);

        self.cond.notify_all();
    }

    fn detach_producer(&self) {
        let mut state = self.state.lock();
        state.producer_attached = false;
        if state.alive {
            debug!(pending = state.buffered, "byte ring producer detached");
        }
        drop(state);

        self.cond.notify_all();
    }

    /// Tunggu sampai ada ruang kosong. `None` jika ring closed.
    fn wait_for_space(&self) -> Option<usize> {
        let capacity = self.storage.capacity();
        let mut state = self.state.lock();

        loop {
            if !state.alive {
                return None;
            }
            if state.buffered < capacity {
                return Some(capacity - state.buffered);
            }
            trace!(capacity, "producer parked, ring full");
            self.cond.wait(&mut state);
        }
    }

    /// Tunggu sampai ada data. `None` jika ring closed, atau kosong
    /// dan producer sudah di-drop.
    fn wait_for_data(&self) -> Option<usize> {
        let mut state = self.state.lock();

        loop {
            if !state.alive {
                return None;
            }
            if state.buffered > 0 {
                return Some(state.buffered);
            }
            if !state.producer_attached {
                return None;
            }
            trace!("consumer parked, ring empty");
            self.cond.wait(&mut state);
        }
    }

    /// Tambah `buffered` setelah copy selesai. `false` jika ring sudah closed.
    fn commit_write(&self, len: usize) -> bool {
        let mut state = self.state.lock();
        if !state.alive {
            return false;
        }
        state.buffered += len;
        drop(state);

        self.cond.notify_all();
        true
    }

    /// Kurangi `buffered` setelah copy selesai. `false` jika ring sudah closed.
    fn commit_read(&self, len: usize) -> bool {
        let mut state = self.state.lock();
        if !state.alive {
            return false;
        }
        state.buffered -= len;
        drop(state);

        self.cond.notify_all();
        true
    }
}

fn fmt_handle(name: &str, shared: &Shared, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let state = shared.state.lock();
    f.debug_struct(name)
        .field("capacity", &shared.storage.capacity())
        .field("backing", &shared.storage.backing())
        .field("buffered", &state.buffered)
        .field("alive", &state.alive)
        .finish()
}

/// Bounded Byte Ring sebelum di-split
///
/// `split()` mengkonsumsi ring dan menghasilkan tepat satu `Producer` dan
/// satu `Consumer`. Keduanya tidak `Clone`, jadi precondition
/// single-writer/single-reader dicek oleh compiler.
pub struct ByteRing {
    shared: Arc<Shared>,
}

impl ByteRing {
    /// Membuat ring di heap. `capacity == 0` diganti `DEFAULT_CAPACITY`.
    ///
    /// # Panics
    /// Panic jika alokasi gagal, sama seperti `Vec`.
    pub fn new(capacity: usize) -> Self {
        let capacity = if capacity == 0 {
            DEFAULT_CAPACITY
        } else {
            capacity
        };
        let storage = match Storage::allocate(capacity, Backing::Heap) {
            Ok(storage) => storage,
            Err(err) => panic!("byte ring allocation failed: {err}"),
        };
        Self::from_storage(storage)
    }

    /// Membuat ring dari konfigurasi, termasuk backing mmap anonim
    pub fn with_config(config: RingConfig) -> Result<Self> {
        let storage = Storage::allocate(config.effective_capacity(), config.backing)?;
        Ok(Self::from_storage(storage))
    }

    fn from_storage(storage: Storage) -> Self {
        debug!(
            capacity = storage.capacity(),
            backing = ?storage.backing(),
            "byte ring created"
        );

        Self {
            shared: Arc::new(Shared {
                storage,
                state: Mutex::new(State {
                    buffered: 0,
                    alive: true,
                    producer_attached: true,
                }),
                cond: Condvar::new(),
            }),
        }
    }

    /// Pisahkan ring menjadi handle producer dan consumer
    pub fn split(self) -> (Producer, Consumer) {
        let producer = Producer {
            shared: Arc::clone(&self.shared),
            cursor: 0,
        };
        let consumer = Consumer {
            shared: self.shared,
            cursor: 0,
        };
        (producer, consumer)
    }

    /// Handle untuk menutup ring dari thread ketiga (mis. watchdog)
    pub fn closer(&self) -> Closer {
        Closer {
            shared: Arc::clone(&self.shared),
        }
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.shared.storage.capacity()
    }

    /// Snapshot jumlah byte yang sedang di-buffer. Racy, hanya untuk diagnostik.
    #[inline]
    pub fn len(&self) -> usize {
        self.shared.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[inline]
    pub fn is_closed(&self) -> bool {
        self.shared.is_closed()
    }

    pub fn close(&self) {
        self.shared.close();
    }
}

impl Default for ByteRing {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl fmt::Debug for ByteRing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt_handle("ByteRing", &self.shared, f)
    }
}

/// Sisi penulis ring. Hanya boleh ada satu.
///
/// Drop producer tidak membuang data: consumer tetap bisa menguras sisa
/// byte, lalu `read` return 0 (end of stream).
pub struct Producer {
    shared: Arc<Shared>,
    cursor: usize,
}

impl Producer {
    /// Tulis seluruh `data` ke ring, block selama ring penuh.
    ///
    /// Return jumlah byte yang diterima ring. Hasilnya kurang dari
    /// `data.len()` hanya jika ring ditutup saat write masih berjalan;
    /// write setelah close selalu return 0.
    pub fn write(&mut self, data: &[u8]) -> usize {
        let mut written = 0;

        while written < data.len() {
            let Some(free) = self.shared.wait_for_space() else {
                break;
            };

            let len = free.min(data.len() - written);
            let chunk = &data[written..written + len];

            // SAFETY: len <= capacity - buffered, jadi region
            // [cursor, cursor + len) (mod capacity) tidak sedang dibaca consumer.
            // Hanya producer yang menyentuh self.cursor.
            let next = unsafe { self.shared.storage.copy_in(self.cursor, chunk) };

            if !self.shared.commit_write(len) {
                break;
            }
            self.cursor = next;
            written += len;
        }

        written
    }

    pub fn capacity(&self) -> usize {
        self.shared.storage.capacity()
    }

    pub fn len(&self) -> usize {
        self.shared.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_closed(&self) -> bool {
        self.shared.is_closed()
    }

    pub fn close(&self) {
        self.shared.close();
    }

    pub fn closer(&self) -> Closer {
        Closer {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl Drop for Producer {
    fn drop(&mut self) {
        self.shared.detach_producer();
    }
}

impl io::Write for Producer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        match Producer::write(self, buf) {
            0 => Err(io::Error::new(io::ErrorKind::BrokenPipe, "byte ring closed")),
            n => Ok(n),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl fmt::Debug for Producer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt_handle("Producer", &self.shared, f)
    }
}

/// Sisi pembaca ring. Hanya boleh ada satu.
///
/// Drop consumer menutup ring, producer yang sedang block ikut dilepas.
pub struct Consumer {
    shared: Arc<Shared>,
    cursor: usize,
}

impl Consumer {
    /// Baca byte yang tersedia ke `dst`, block selama ring kosong.
    ///
    /// Return segera setelah minimal satu byte tersedia, tidak menunggu
    /// `dst` penuh. Return 0 jika ring closed, jika `dst` kosong, atau jika
    /// producer sudah di-drop dan semua data sudah terbaca.
    pub fn read(&mut self, dst: &mut [u8]) -> usize {
        if dst.is_empty() {
            return 0;
        }

        let Some(available) = self.shared.wait_for_data() else {
            return 0;
        };

        let len = available.min(dst.len());

        // SAFETY: len <= buffered, jadi region [cursor, cursor + len)
        // (mod capacity) sudah di-commit producer dan tidak akan ditimpa.
        // Hanya consumer yang menyentuh self.cursor.
        let next = unsafe { self.shared.storage.copy_out(self.cursor, &mut dst[..len]) };

        if !self.shared.commit_read(len) {
            return 0;
        }
        self.cursor = next;

        len
    }

    pub fn capacity(&self) -> usize {
        self.shared.storage.capacity()
    }

    pub fn len(&self) -> usize {
        self.shared.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_closed(&self) -> bool {
        self.shared.is_closed()
    }

    pub fn close(&self) {
        self.shared.close();
    }

    pub fn closer(&self) -> Closer {
        Closer {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl Drop for Consumer {
    fn drop(&mut self) {
        self.shared.close();
    }
}

impl io::Read for Consumer {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        Ok(Consumer::read(self, buf))
    }
}

impl fmt::Debug for Consumer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt_handle("Consumer", &self.shared, f)
    }
}

/// Handle untuk close dari pihak ketiga. Boleh di-clone dan di-drop bebas.
#[derive(Clone)]
pub struct Closer {
    shared: Arc<Shared>,
}

impl Closer {
    pub fn close(&self) {
        self.shared.close();
    }

    pub fn is_closed(&self) -> bool {
        self.shared.is_closed()
    }

    pub fn len(&self) -> usize {
        self.shared.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Debug for Closer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt_handle("Closer", &self.shared, f)
    }
}


#[cfg(test)]
mod prop_tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::VecDeque;

    #[derive(Debug, Clone)]
    enum Op {
        Write(Vec<u8>),
        Read(usize),
    }

    fn op_strategy() -> impl Strategy<Value = Op> {
        prop_oneof![
            proptest::collection::vec(any::<u8>(), 0..48).prop_map(Op::Write),
            (1usize..48).prop_map(Op::Read),
        ]
    }

    proptest! {
        /// Interleaving write/read di satu thread (tanpa pernah block) menjaga FIFO
        #[test]
        fn fifo_invariant(
            capacity in 1usize..40,
            ops in proptest::collection::vec(op_strategy(), 0..200),
        ) {
            let (mut producer, mut consumer) = ByteRing::new(capacity).split();
            let mut expected = VecDeque::new();

            for op in ops {
                match op {
                    Op::Write(data) => {
                        // Batasi ke ruang kosong supaya write tidak block
                        let free = capacity - producer.len();
                        let data = &data[..data.len().min(free)];
                        prop_assert_eq!(producer.write(data), data.len());
                        expected.extend(data.iter().copied());
                    }
                    Op::Read(len) => {
                        if consumer.is_empty() {
                            continue;
                        }
                        let mut buf = vec![0u8; len];
                        let n = consumer.read(&mut buf);
                        prop_assert_eq!(n, len.min(expected.len()));
                        let want: Vec<u8> = expected.drain(..n).collect();
                        prop_assert_eq!(&buf[..n], want.as_slice());
                    }
                }

                let len = consumer.len();
                prop_assert!(len <= capacity);
                prop_assert_eq!(len, expected.len());
            }
        }
    }
}
