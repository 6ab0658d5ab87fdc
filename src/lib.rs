//! Bytering - Bounded SPSC Byte Ring
//!
//! Arsitektur:
//! - Fixed Capacity: tidak ada pertumbuhan memori tanpa batas
//! - Backpressure: writer block saat penuh, reader block saat kosong
//! - Clean Shutdown: `close()` melepas semua pihak yang sedang block
//! - Byte Stream: batas antar write call tidak dipertahankan

pub mod config;
pub mod core;
pub mod error;

pub use crate::config::RingConfig;
pub use crate::core::{Backing, ByteRing, Closer, Consumer, Producer, DEFAULT_CAPACITY};
pub use crate::error::{Result, RingError};
