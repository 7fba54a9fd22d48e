//! Byte buffers for the pickle infrastructure: an owned, growable buffer with an
//! explicit growth policy, plus alignment helpers for the 4-byte segment layout.

pub mod align;
pub mod buffer;

pub use buffer::{GrowthPolicy, PickleBuffer};
