//! Fixed-Capacity Ring Buffer
//!
//! Bounded history used by the temporal smoother: the newest sample always
//! goes in, the oldest is evicted once the buffer is full.

mod buffer;

pub use buffer::RingBuffer;

use thiserror::Error;

/// Ring buffer construction errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RingBufferError {
    #[error("Ring buffer capacity must be greater than zero")]
    ZeroCapacity,
}
