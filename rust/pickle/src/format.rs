//! Wire-format constants and the pickle header.
//!
//! ```text
//! offset 0      : Header { u32 payload_size }          (host byte order)
//! offset 4..4+N : Payload = segment*
//!   segment     : value_bytes(L) ++ pad(0..3 zero bytes)
//!   string seg  : [i32 element_count][count*elem_size bytes][pad]
//! ```
//!
//! `payload_size` is the aligned length of the payload, excluding the header.

/// Fixed header at offset 0 of every pickle.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct PickleHeader {
    /// Aligned payload length in bytes, padding included.
    pub payload_size: u32,
}

/// Size of [`PickleHeader`] in bytes.
pub const HEADER_SIZE: usize = std::mem::size_of::<PickleHeader>();

/// Every segment starts at a multiple of this many bytes.
pub const SEGMENT_ALIGNMENT: usize = 4;

/// Largest payload the `u32` header can describe while staying aligned.
pub const MAX_PAYLOAD_SIZE: usize = (u32::MAX as usize) & !(SEGMENT_ALIGNMENT - 1);

impl PickleHeader {
    /// Reads the header from the first [`HEADER_SIZE`] bytes of `data`.
    ///
    /// Returns `None` if `data` is shorter than a header.
    pub fn read_from(data: &[u8]) -> Option<PickleHeader> {
        data.get(..HEADER_SIZE).map(bytemuck::pod_read_unaligned)
    }

    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::bytes_of(self)
    }
}
