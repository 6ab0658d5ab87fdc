//! Error types untuk Bytering
//!
//! Error hanya muncul saat konstruksi ring. Jalur data (write/read)
//! tidak pernah gagal: return 0 adalah satu-satunya sinyal "ring closed".

use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RingError {
    #[error("invalid value {value:?} for {key}")]
    InvalidConfig { key: &'static str, value: String },

    #[error("capacity {0} exceeds the maximum allocation size")]
    CapacityTooLarge(usize),

    #[error("failed to map {capacity} bytes of anonymous memory: {source}")]
    Map {
        capacity: usize,
        #[source]
        source: io::Error,
    },
}

pub type Result<T> = std::result::Result<T, RingError>;
