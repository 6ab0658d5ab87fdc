//! Konfigurasi Byte Ring
//!
//! Default: 32 KB di heap. Bisa di-override lewat environment:
//! - `BYTERING_CAPACITY`: kapasitas dalam bytes (0 = default)
//! - `BYTERING_BACKING`: `heap` atau `anon`

use crate::core::{Backing, DEFAULT_CAPACITY};
use crate::error::{Result, RingError};

pub const CAPACITY_ENV: &str = "BYTERING_CAPACITY";
pub const BACKING_ENV: &str = "BYTERING_BACKING";

/// Konfigurasi ring
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RingConfig {
    /// Kapasitas dalam bytes. 0 diganti dengan `DEFAULT_CAPACITY`.
    pub capacity: usize,
    pub backing: Backing,
}

impl Default for RingConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            backing: Backing::Heap,
        }
    }
}

impl RingConfig {
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    pub fn with_backing(mut self, backing: Backing) -> Self {
        self.backing = backing;
        self
    }

    /// Baca konfigurasi dari environment, variabel yang tidak di-set pakai default
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(value) = lookup(CAPACITY_ENV) {
            config.capacity = value
                .trim()
                .parse()
                .map_err(|_| RingError::InvalidConfig {
                    key: CAPACITY_ENV,
                    value,
                })?;
        }

        if let Some(value) = lookup(BACKING_ENV) {
            config.backing = value.parse().map_err(|_| RingError::InvalidConfig {
                key: BACKING_ENV,
                value,
            })?;
        }

        Ok(config)
    }

    /// Kapasitas yang benar-benar dialokasikan
    #[inline]
    pub fn effective_capacity(&self) -> usize {
        if self.capacity == 0 {
            DEFAULT_CAPACITY
        } else {
            self.capacity
        }
    }
}
