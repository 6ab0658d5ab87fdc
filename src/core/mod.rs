//! Core module: Bounded Byte Ring dengan blocking backpressure
//!
//! Prinsip desain:
//! - Fixed Capacity: storage dialokasikan sekali saat init, tidak pernah resize
//! - Split Ownership: cursor tulis milik Producer, cursor baca milik Consumer
//! - Satu Lock: hanya counter `buffered` yang dijaga Mutex + Condvar

mod ring;
mod storage;

pub use ring::{ByteRing, Closer, Consumer, Producer, DEFAULT_CAPACITY};
pub use storage::Backing;
