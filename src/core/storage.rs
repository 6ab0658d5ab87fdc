//! Backing Storage untuk Byte Ring
//!
//! Satu blok byte berukuran tetap, dialokasikan sekali saat init:
//! - Heap: boxed slice biasa
//! - Anonymous: mmap anonim (tanpa file), halaman baru dialokasikan kernel saat disentuh
//!
//! Storage tidak tahu siapa pemilik region mana. Pembagian region
//! (producer vs consumer) dijaga oleh counter `buffered` di ring.

use memmap2::MmapMut;
use std::ptr::{self, NonNull};
use std::str::FromStr;

use crate::error::{Result, RingError};

/// Jenis memori di belakang ring
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Backing {
    /// Boxed slice di heap
    #[default]
    Heap,
    /// Anonymous mmap, cocok untuk ring berukuran besar
    Anonymous,
}

impl FromStr for Backing {
    type Err = RingError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "heap" => Ok(Backing::Heap),
            "anon" | "anonymous" | "mmap" => Ok(Backing::Anonymous),
            _ => Err(RingError::InvalidConfig {
                key: "backing",
                value: s.to_string(),
            }),
        }
    }
}

enum Region {
    // Dibebaskan manual di Drop lewat Box::from_raw
    Heap,
    Anonymous(MmapMut),
}

/// Blok byte berukuran tetap dengan copy yang sadar wraparound
pub(crate) struct Storage {
    base: NonNull<u8>,
    capacity: usize,
    region: Region,
}

// SAFETY: Storage hanya memegang pointer ke alokasi miliknya sendiri.
// Akses paralel aman selama producer dan consumer menyentuh region yang
// tidak overlap (dijamin oleh invariant `buffered <= capacity` di ring).
unsafe impl Send for Storage {}
unsafe impl Sync for Storage {}

impl Storage {
    /// Alokasi storage sebesar `capacity` byte. Tidak ada byte cadangan:
    /// seluruh kapasitas bisa diisi.
    pub(crate) fn allocate(capacity: usize, backing: Backing) -> Result<Self> {
        debug_assert!(capacity > 0, "capacity must be non-zero");

        if capacity > isize::MAX as usize {
            return Err(RingError::CapacityTooLarge(capacity));
        }

        let (base, region) = match backing {
            Backing::Heap => {
                let raw = Box::into_raw(vec![0u8; capacity].into_boxed_slice());
                // SAFETY: Box::into_raw tidak pernah mengembalikan null
                let base = unsafe { NonNull::new_unchecked(raw as *mut u8) };
                (base, Region::Heap)
            }
            Backing::Anonymous => {
                let mut mmap = MmapMut::map_anon(capacity)
                    .map_err(|source| RingError::Map { capacity, source })?;
                // SAFETY: mapping dengan panjang > 0 tidak pernah di alamat null
                let base = unsafe { NonNull::new_unchecked(mmap.as_mut_ptr()) };
                (base, Region::Anonymous(mmap))
            }
        };

        Ok(Self {
            base,
            capacity,
            region,
        })
    }

    #[inline(always)]
    pub(crate) fn capacity(&self) -> usize {
        self.capacity
    }

    pub(crate) fn backing(&self) -> Backing {
        match self.region {
            Region::Heap => Backing::Heap,
            Region::Anonymous(_) => Backing::Anonymous,
        }
    }

    /// Copy `src` ke storage mulai dari `cursor`, return cursor berikutnya.
    ///
    /// Run yang melewati ujung storage dipecah jadi dua segmen:
    /// `[cursor, capacity)` lalu `[0, sisa)`.
    ///
    /// # Safety
    /// - `cursor < capacity` dan `src.len() <= capacity`
    /// - Range tujuan tidak sedang dibaca oleh consumer
    #[inline(always)]
    pub(crate) unsafe fn copy_in(&self, cursor: usize, src: &[u8]) -> usize {
        debug_assert!(cursor < self.capacity && src.len() <= self.capacity);

        let first = (self.capacity - cursor).min(src.len());
        ptr::copy_nonoverlapping(src.as_ptr(), self.base.as_ptr().add(cursor), first);

        let rest = src.len() - first;
        if rest > 0 {
            ptr::copy_nonoverlapping(src.as_ptr().add(first), self.base.as_ptr(), rest);
        }

        self.advance(cursor, src.len())
    }

    /// Copy dari storage mulai `cursor` ke `dst`, return cursor berikutnya.
    ///
    /// # Safety
    /// - `cursor < capacity` dan `dst.len() <= capacity`
    /// - Range sumber sudah ditulis producer dan belum di-commit sebagai terbaca
    #[inline(always)]
    pub(crate) unsafe fn copy_out(&self, cursor: usize, dst: &mut [u8]) -> usize {
        debug_assert!(cursor < self.capacity && dst.len() <= self.capacity);

        let first = (self.capacity - cursor).min(dst.len());
        ptr::copy_nonoverlapping(self.base.as_ptr().add(cursor), dst.as_mut_ptr(), first);

        let rest = dst.len() - first;
        if rest > 0 {
            ptr::copy_nonoverlapping(self.base.as_ptr(), dst.as_mut_ptr().add(first), rest);
        }

        self.advance(cursor, dst.len())
    }

    // Cursor kembali ke 0 tepat saat mencapai capacity
    #[inline(always)]
    fn advance(&self, cursor: usize, len: usize) -> usize {
        let next = cursor + len;
        if next >= self.capacity {
            next - self.capacity
        } else {
            next
        }
    }
}

impl Drop for Storage {
    fn drop(&mut self) {
        if let Region::Heap = self.region {
            // SAFETY: pointer berasal dari Box::into_raw dengan panjang yang sama
            unsafe {
                drop(Box::from_raw(ptr::slice_from_raw_parts_mut(
                    self.base.as_ptr(),
                    self.capacity,
                )));
            }
        }
    }
}
