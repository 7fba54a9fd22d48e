//! Bounds-checked sequential reader over a pickle payload.

use pickle_bytes::align::checked_align_up;
use pickle_common::{Result, error::Error, verify_data};

use crate::{
    codec::Decode,
    format::SEGMENT_ALIGNMENT,
    pickle::{Pickle, PickleRef},
    wide::WideString,
};

/// A cursor over the payload of a pickle.
///
/// Reads mirror the writer's layout and must be issued in the order the
/// values were written. Every read is bounds-checked: on failure it returns
/// an error and leaves the cursor where it was, so the reader is safe to run
/// directly on untrusted bytes.
///
/// Byte ranges are returned as slices into the underlying buffer, without
/// copying; the borrow checker keeps them from outliving it.
#[derive(Debug, Clone)]
pub struct PickleReader<'a> {
    payload: &'a [u8],
    /// Read position within `payload`; never greater than `payload.len()`.
    pos: usize,
}

impl<'a> PickleReader<'a> {
    /// Creates a reader over the payload of an owned pickle.
    pub fn new(pickle: &'a Pickle) -> PickleReader<'a> {
        Self::over_payload(pickle.payload())
    }

    /// Creates a reader over a borrowed pickle view.
    pub fn from_ref(pickle: PickleRef<'a>) -> PickleReader<'a> {
        Self::over_payload(pickle.payload())
    }

    /// Creates a reader over serialized pickle bytes (header included).
    pub fn from_bytes(data: &'a [u8]) -> PickleReader<'a> {
        Self::from_ref(PickleRef::new(data))
    }

    /// Creates a reader directly over payload bytes, with no header.
    pub fn over_payload(payload: &'a [u8]) -> PickleReader<'a> {
        PickleReader { payload, pos: 0 }
    }

    /// Returns `true` while unread bytes remain.
    ///
    /// This does not guarantee that the next read succeeds; every read still
    /// performs its own bounds check.
    #[inline]
    pub fn is_valid(&self) -> bool {
        self.pos < self.payload.len()
    }

    /// Same as [`is_valid`](Self::is_valid).
    #[inline]
    pub fn has_remaining(&self) -> bool {
        self.is_valid()
    }

    /// Number of unread payload bytes.
    #[inline]
    pub fn remaining(&self) -> usize {
        self.payload.len() - self.pos
    }

    /// Current offset within the payload.
    #[inline]
    pub fn position(&self) -> usize {
        self.pos
    }

    /// The unread part of the payload.
    #[inline]
    pub fn remaining_bytes(&self) -> &'a [u8] {
        &self.payload[self.pos..]
    }
}

impl<'a> PickleReader<'a> {
    /// Decodes the next value of type `T`.
    ///
    /// On failure the cursor is restored to where it was before the call,
    /// even if `T` consists of several segments.
    pub fn read<T: Decode>(&mut self) -> Result<T> {
        self.atomically(T::decode)
    }

    /// Decodes the next value into `out`.
    ///
    /// On failure both `out` and the cursor are left untouched.
    pub fn read_into<T: Decode>(&mut self, out: &mut T) -> Result<()> {
        *out = self.read()?;
        Ok(())
    }

    /// Reads a plain-old-data value from the next segment.
    ///
    /// Values narrower than 4 bytes are taken from the start of their 4-byte slot.
    #[inline]
    pub fn read_pod<T>(&mut self) -> Result<T>
    where
        T: bytemuck::AnyBitPattern,
    {
        let bytes = self.take(std::mem::size_of::<T>(), std::any::type_name::<T>())?;
        Ok(bytemuck::pod_read_unaligned(bytes))
    }

    /// Reads a `bool` slot. Only 0 and 1 are accepted.
    pub fn read_bool(&mut self) -> Result<bool> {
        self.atomically(|reader| match reader.read_pod::<u8>()? {
            0 => Ok(false),
            1 => Ok(true),
            value => Err(reader.invalid("bool", format!("unexpected value {value}"))),
        })
    }

    /// Reads a non-negative `i32` element count.
    pub fn read_length(&mut self) -> Result<usize> {
        self.atomically(|reader| {
            let length = reader.read_pod::<i32>()?;
            verify_data!(length, length >= 0);
            Ok(length as usize)
        })
    }

    /// Reads a UTF-8 string without copying it.
    pub fn read_str(&mut self) -> Result<&'a str> {
        self.atomically(|reader| {
            let bytes = reader.read_counted(1, "string")?;
            std::str::from_utf8(bytes).map_err(|e| reader.invalid("string", e.to_string()))
        })
    }

    /// Reads a UTF-8 string.
    pub fn read_string(&mut self) -> Result<String> {
        self.read_str().map(str::to_owned)
    }

    /// Reads a UTF-16 string written by [`Pickle::write_wide_str`].
    pub fn read_wide_string(&mut self) -> Result<WideString> {
        self.atomically(|reader| {
            let bytes = reader.read_counted(std::mem::size_of::<u16>(), "wide string")?;
            Ok(bytes
                .chunks_exact(2)
                .map(|unit| u16::from_ne_bytes([unit[0], unit[1]]))
                .collect())
        })
    }

    /// Reads a length-prefixed byte blob written by [`Pickle::write_data`],
    /// without copying it.
    pub fn read_data(&mut self) -> Result<&'a [u8]> {
        self.atomically(|reader| reader.read_counted(1, "data"))
    }

    /// Returns the next `len` raw bytes without copying, and advances past
    /// them and their padding.
    pub fn read_bytes(&mut self, len: usize) -> Result<&'a [u8]> {
        self.take(len, "bytes")
    }

    /// Advances past `len` bytes and their padding without interpreting them.
    pub fn skip_bytes(&mut self, len: usize) -> Result<()> {
        self.take(len, "skipped bytes").map(|_| ())
    }
}

impl<'a> PickleReader<'a> {
    /// Returns the next `len` bytes and advances by `len` rounded up to the
    /// segment alignment, stopping at the end of the payload if the final
    /// padding is missing.
    fn take(&mut self, len: usize, element: &str) -> Result<&'a [u8]> {
        let remaining = self.remaining();
        if len > remaining {
            log::debug!(
                "truncated pickle read of '{element}': {len} bytes requested, {remaining} remaining"
            );
            return Err(Error::truncated_read(element, len, remaining));
        }
        let start = self.pos;
        let advance = checked_align_up(len, SEGMENT_ALIGNMENT)
            .unwrap_or(usize::MAX)
            .min(remaining);
        self.pos += advance;
        Ok(&self.payload[start..start + len])
    }

    /// Reads an element count followed by `count * element_size` bytes.
    fn read_counted(&mut self, element_size: usize, element: &str) -> Result<&'a [u8]> {
        let count = self.read_length()?;
        let byte_len = (count as u64)
            .checked_mul(element_size as u64)
            .and_then(|len| usize::try_from(len).ok())
            .ok_or_else(|| {
                log::debug!("pickle length overflow for '{element}': {count} x {element_size}");
                Error::length_overflow(element, count as u64, element_size)
            })?;
        self.take(byte_len, element)
    }

    /// Runs `f`, restoring the cursor if it fails.
    fn atomically<T, F>(&mut self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Self) -> Result<T>,
    {
        let pos = self.pos;
        f(self).inspect_err(|_| self.pos = pos)
    }

    #[cold]
    fn invalid(&self, element: &str, message: String) -> Error {
        log::debug!("invalid pickle data for '{element}' at {}: {message}", self.pos);
        Error::invalid_format(element, message)
    }
}

impl<'a> From<&'a Pickle> for PickleReader<'a> {
    fn from(pickle: &'a Pickle) -> Self {
        PickleReader::new(pickle)
    }
}

impl<'a> From<PickleRef<'a>> for PickleReader<'a> {
    fn from(pickle: PickleRef<'a>) -> Self {
        PickleReader::from_ref(pickle)
    }
}
