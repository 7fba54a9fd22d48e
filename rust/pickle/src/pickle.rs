//! Owned pickle writer and the borrowed, read-only pickle view.

use pickle_bytes::{
    PickleBuffer,
    align::{align_up, checked_align_up, is_aligned, padding_len},
};
use pickle_common::{Result, error::Error};

use crate::{
    codec::Encode,
    format::{HEADER_SIZE, MAX_PAYLOAD_SIZE, PickleHeader, SEGMENT_ALIGNMENT},
    options::PickleOptions,
    reader::PickleReader,
};

/// An owned, growable pickle: a [`PickleHeader`] followed by a payload of
/// 4-byte aligned segments.
///
/// Values are appended with [`write`](Pickle::write) (or one of the typed
/// helpers) and read back, in the same order, with a [`PickleReader`].
///
/// Cloning deep-copies the buffer. Moving transfers it; `std::mem::take`
/// leaves a valid empty pickle behind.
///
/// A failed write leaves the pickle byte-for-byte unchanged.
#[derive(Clone)]
pub struct Pickle {
    /// Header and payload; `buf.len() == HEADER_SIZE + payload_size` at all times.
    buf: PickleBuffer,
}

impl Pickle {
    /// Creates an empty pickle with the default minimum capacity.
    pub fn new() -> Pickle {
        Self::with_valid_options(&PickleOptions::default())
    }

    /// Creates an empty pickle able to hold `payload_capacity` payload bytes
    /// without growing.
    pub fn with_capacity(payload_capacity: usize) -> Pickle {
        Self::with_valid_options(
            &PickleOptions::default().with_initial_capacity(payload_capacity),
        )
    }

    /// Creates an empty pickle from explicit options.
    pub fn with_options(options: PickleOptions) -> Result<Pickle> {
        options.validate()?;
        let policy = options.growth_policy();
        let capacity = HEADER_SIZE
            .checked_add(options.initial_capacity)
            .ok_or_else(|| Error::allocation_failure(usize::MAX))?
            .min(policy.max_capacity());
        let mut buf = PickleBuffer::try_with_capacity(capacity, policy)?;
        buf.try_extend_from_slice(PickleHeader::default().as_bytes())?;
        Ok(Pickle { buf })
    }

    /// Deep-copies serialized pickle bytes (header included) into a new owned pickle.
    ///
    /// See [`PickleRef::new`] for how a malformed header is treated.
    pub fn copy_from_slice(data: &[u8]) -> Pickle {
        PickleRef::new(data).to_pickle()
    }

    /// Total size in bytes: header plus payload.
    #[inline]
    pub fn size(&self) -> usize {
        self.buf.len()
    }

    /// Aligned payload length in bytes.
    #[inline]
    pub fn payload_size(&self) -> usize {
        self.buf.len() - HEADER_SIZE
    }

    #[inline]
    pub fn payload_empty(&self) -> bool {
        self.payload_size() == 0
    }

    /// Number of bytes (header included) the pickle can hold without growing.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.buf.capacity()
    }

    pub fn header(&self) -> PickleHeader {
        PickleHeader {
            payload_size: self.payload_size() as u32,
        }
    }

    /// The serialized form: header followed by payload.
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        self.buf.as_slice()
    }

    #[inline]
    pub fn payload(&self) -> &[u8] {
        &self.buf[HEADER_SIZE..]
    }

    /// Borrowed read-only view of this pickle.
    pub fn as_pickle_ref(&self) -> PickleRef<'_> {
        PickleRef {
            data: self.as_bytes(),
            header: self.header(),
        }
    }

    /// Returns a reader positioned at the start of the payload.
    pub fn reader(&self) -> PickleReader<'_> {
        PickleReader::new(self)
    }

    /// Consumes the pickle, returning its serialized bytes.
    pub fn into_vec(self) -> Vec<u8> {
        self.buf.into_vec()
    }

    /// Ensures room for at least `additional` more payload bytes.
    pub fn reserve(&mut self, additional: usize) -> Result<()> {
        let additional = checked_align_up(additional, SEGMENT_ALIGNMENT)
            .ok_or_else(|| Error::allocation_failure(usize::MAX))?;
        self.buf.try_reserve(additional)
    }

    /// Drops the payload; capacity is retained.
    pub fn clear(&mut self) {
        self.truncate_payload(0);
    }
}

impl Pickle {
    /// Appends `value` using its [`Encode`] implementation.
    ///
    /// Composite values are written all-or-nothing: if any part fails, the
    /// payload is restored to its previous length.
    pub fn write<T>(&mut self, value: &T) -> Result<()>
    where
        T: Encode + ?Sized,
    {
        self.transaction(|pickle| value.encode(pickle))
    }

    /// Appends a plain-old-data value as one segment.
    ///
    /// Values narrower than 4 bytes still occupy a full 4-byte slot, with the
    /// remaining bytes zeroed.
    #[inline]
    pub fn write_pod<T>(&mut self, value: T) -> Result<()>
    where
        T: bytemuck::NoUninit,
    {
        self.write_bytes(bytemuck::bytes_of(&value))
    }

    pub fn write_bool(&mut self, value: bool) -> Result<()> {
        self.write_pod(value as u8)
    }

    /// Writes a non-negative `i32` element count.
    pub fn write_length(&mut self, len: usize) -> Result<()> {
        let len = i32::try_from(len)
            .map_err(|_| Error::length_overflow("length", len as u64, 1))?;
        self.write_pod(len)
    }

    /// Writes a UTF-8 string: byte count, bytes, padding.
    pub fn write_str(&mut self, s: &str) -> Result<()> {
        self.write(s)
    }

    /// Writes a UTF-16 string: code unit count, code units, padding.
    pub fn write_wide_str(&mut self, units: &[u16]) -> Result<()> {
        self.transaction(|pickle| {
            pickle.write_length(units.len())?;
            pickle.write_bytes(bytemuck::cast_slice(units))
        })
    }

    /// Writes a length-prefixed byte blob, readable with
    /// [`PickleReader::read_data`].
    pub fn write_data(&mut self, data: &[u8]) -> Result<()> {
        self.transaction(|pickle| {
            pickle.write_length(data.len())?;
            pickle.write_bytes(data)
        })
    }

    /// Appends `data` verbatim as one segment, followed by zero padding to the
    /// next 4-byte boundary.
    ///
    /// This is the primitive every other writer funnels through.
    pub fn write_bytes(&mut self, data: &[u8]) -> Result<()> {
        let start = self.begin_write(data.len())?;
        self.buf[start..start + data.len()].copy_from_slice(data);
        self.end_write(start, data.len());
        Ok(())
    }
}

impl Pickle {
    fn with_valid_options(options: &PickleOptions) -> Pickle {
        let policy = options.growth_policy();
        let capacity = HEADER_SIZE
            .saturating_add(options.initial_capacity)
            .min(policy.max_capacity());
        Pickle {
            buf: PickleBuffer::zeroed(HEADER_SIZE, capacity, policy),
        }
    }

    /// Reserves a segment of `length` bytes at the next aligned payload offset,
    /// growing the buffer if needed, and returns its absolute start offset.
    ///
    /// On failure the buffer is unchanged.
    fn begin_write(&mut self, length: usize) -> Result<usize> {
        let offset = align_up(self.payload_size(), SEGMENT_ALIGNMENT);
        let new_payload_size = offset
            .checked_add(length)
            .and_then(|end| checked_align_up(end, SEGMENT_ALIGNMENT))
            .filter(|&size| size <= MAX_PAYLOAD_SIZE)
            .ok_or_else(|| {
                Error::allocation_failure(HEADER_SIZE.saturating_add(offset).saturating_add(length))
            })?;
        self.buf
            .try_extend_zeroed(HEADER_SIZE + new_payload_size - self.buf.len())?;
        self.set_header(new_payload_size);
        Ok(HEADER_SIZE + offset)
    }

    /// Zero-fills the padding that follows a segment of `length` bytes
    /// starting at `start`.
    fn end_write(&mut self, start: usize, length: usize) {
        let pad_start = start + length;
        let pad_len = padding_len(length, SEGMENT_ALIGNMENT);
        self.buf[pad_start..pad_start + pad_len].fill(0);
    }

    fn transaction<F>(&mut self, f: F) -> Result<()>
    where
        F: FnOnce(&mut Pickle) -> Result<()>,
    {
        let payload_size = self.payload_size();
        f(self).inspect_err(|_| self.truncate_payload(payload_size))
    }

    fn truncate_payload(&mut self, payload_size: usize) {
        self.buf.truncate(HEADER_SIZE + payload_size);
        self.set_header(payload_size);
    }

    fn set_header(&mut self, payload_size: usize) {
        debug_assert!(payload_size <= MAX_PAYLOAD_SIZE);
        debug_assert!(is_aligned(payload_size, SEGMENT_ALIGNMENT));
        let header = PickleHeader {
            payload_size: payload_size as u32,
        };
        self.buf[..HEADER_SIZE].copy_from_slice(header.as_bytes());
    }
}

impl Default for Pickle {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for Pickle {
    fn eq(&self, other: &Self) -> bool {
        self.as_bytes() == other.as_bytes()
    }
}

impl Eq for Pickle {}

impl std::fmt::Debug for Pickle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pickle")
            .field("payload_size", &self.payload_size())
            .field("capacity", &self.capacity())
            .field("payload", &self.payload())
            .finish()
    }
}

/// A borrowed, read-only view of serialized pickle bytes.
///
/// The view never copies, mutates or frees the memory it aliases, and has no
/// write operations. Use [`to_pickle`](PickleRef::to_pickle) to obtain an
/// owned, writable copy.
#[derive(Clone, Copy)]
pub struct PickleRef<'a> {
    /// Header plus the visible part of the payload.
    data: &'a [u8],
    /// The header as found in the source bytes.
    header: PickleHeader,
}

impl<'a> PickleRef<'a> {
    /// Wraps serialized pickle bytes without copying or validating them.
    ///
    /// The visible payload is the part of `data` after the header, limited to
    /// the length the header claims. Data shorter than a header is treated as
    /// an empty pickle. Any inconsistency surfaces later as a failed read.
    pub fn new(data: &'a [u8]) -> PickleRef<'a> {
        let Some(header) = PickleHeader::read_from(data) else {
            log::debug!(
                "pickle of {} bytes is shorter than its header",
                data.len()
            );
            return PickleRef {
                data: &data[..0],
                header: PickleHeader::default(),
            };
        };
        let available = data.len() - HEADER_SIZE;
        let claimed = header.payload_size as usize;
        if claimed > available {
            log::debug!(
                "pickle header claims {claimed} payload bytes, only {available} present"
            );
        }
        PickleRef {
            data: &data[..HEADER_SIZE + claimed.min(available)],
            header,
        }
    }

    /// The header as stored in the source bytes.
    #[inline]
    pub fn header(&self) -> PickleHeader {
        self.header
    }

    /// Header and visible payload.
    #[inline]
    pub fn as_bytes(&self) -> &'a [u8] {
        self.data
    }

    #[inline]
    pub fn payload(&self) -> &'a [u8] {
        self.data.get(HEADER_SIZE..).unwrap_or_default()
    }

    /// Length of the visible payload.
    #[inline]
    pub fn payload_size(&self) -> usize {
        self.payload().len()
    }

    #[inline]
    pub fn payload_empty(&self) -> bool {
        self.payload().is_empty()
    }

    /// Header plus visible payload length.
    #[inline]
    pub fn size(&self) -> usize {
        HEADER_SIZE + self.payload_size()
    }

    pub fn reader(&self) -> PickleReader<'a> {
        PickleReader::from_ref(*self)
    }

    /// Deep-copies the visible payload into a new owned pickle.
    ///
    /// Well-formed sources are copied byte-for-byte. A source whose payload
    /// length is not a multiple of 4 is zero-padded, and the header of the
    /// copy always describes the copied payload.
    pub fn to_pickle(&self) -> Pickle {
        let payload = self.payload();
        let payload = &payload[..payload.len().min(MAX_PAYLOAD_SIZE)];
        let size = HEADER_SIZE + align_up(payload.len(), SEGMENT_ALIGNMENT);
        let policy = PickleOptions::default().growth_policy();
        let mut buf = PickleBuffer::zeroed(size, size, policy);
        buf[HEADER_SIZE..HEADER_SIZE + payload.len()].copy_from_slice(payload);
        let mut pickle = Pickle { buf };
        pickle.set_header(size - HEADER_SIZE);
        pickle
    }
}

impl std::fmt::Debug for PickleRef<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PickleRef")
            .field("header", &self.header)
            .field("payload", &self.payload())
            .finish()
    }
}

impl<'a> From<&'a Pickle> for PickleRef<'a> {
    fn from(pickle: &'a Pickle) -> Self {
        pickle.as_pickle_ref()
    }
}
