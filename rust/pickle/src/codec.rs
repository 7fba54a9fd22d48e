//! Typed encode/decode dispatch on top of [`Pickle`] and [`PickleReader`].
//!
//! Each supported type has one [`Encode`] and one [`Decode`] implementation.
//! Containers compose them recursively: a container is written as an `i32`
//! element count followed by every element, in the container's own iteration
//! order, and read back by decoding that many elements into a fresh container.
//! Implementations for the standard collections live in `std_impls`.
//!
//! The format carries no type information. Producer and consumer must agree
//! on the sequence of types.

use pickle_common::{Result, error::Error};

use crate::{pickle::Pickle, reader::PickleReader, wide::WideString};

/// Types that can be appended to a [`Pickle`].
///
/// Implementations should only call [`Pickle`] write methods (or other
/// `Encode` implementations); [`Pickle::write`] takes care of rolling back a
/// partially written value.
pub trait Encode {
    fn encode(&self, pickle: &mut Pickle) -> Result<()>;
}

/// Types that can be read back from a [`PickleReader`].
///
/// Implementations must read exactly what the matching [`Encode`]
/// implementation wrote, and must check every sub-read. Use
/// [`PickleReader::read`] to get a read that restores the cursor on failure.
pub trait Decode: Sized {
    fn decode(reader: &mut PickleReader<'_>) -> Result<Self>;
}

macro_rules! impl_pod_codec {
    ($($t:ty),* $(,)?) => {
        $(
            impl Encode for $t {
                #[inline]
                fn encode(&self, pickle: &mut Pickle) -> Result<()> {
                    pickle.write_pod(*self)
                }
            }

            impl Decode for $t {
                #[inline]
                fn decode(reader: &mut PickleReader<'_>) -> Result<Self> {
                    reader.read_pod()
                }
            }
        )*
    };
}

impl_pod_codec!(u8, i8, u16, i16, u32, i32, u64, i64, f32, f64);

impl Encode for bool {
    fn encode(&self, pickle: &mut Pickle) -> Result<()> {
        pickle.write_bool(*self)
    }
}

impl Decode for bool {
    fn decode(reader: &mut PickleReader<'_>) -> Result<Self> {
        reader.read_bool()
    }
}

// Pointer-sized integers always use 8 bytes so that 32- and 64-bit builds agree.
impl Encode for usize {
    fn encode(&self, pickle: &mut Pickle) -> Result<()> {
        pickle.write_pod(*self as u64)
    }
}

impl Decode for usize {
    fn decode(reader: &mut PickleReader<'_>) -> Result<Self> {
        let value = reader.read_pod::<u64>()?;
        usize::try_from(value)
            .map_err(|_| Error::invalid_format("usize", format!("{value} out of range")))
    }
}

impl Encode for isize {
    fn encode(&self, pickle: &mut Pickle) -> Result<()> {
        pickle.write_pod(*self as i64)
    }
}

impl Decode for isize {
    fn decode(reader: &mut PickleReader<'_>) -> Result<Self> {
        let value = reader.read_pod::<i64>()?;
        isize::try_from(value)
            .map_err(|_| Error::invalid_format("isize", format!("{value} out of range")))
    }
}

impl Encode for char {
    fn encode(&self, pickle: &mut Pickle) -> Result<()> {
        pickle.write_pod(*self as u32)
    }
}

impl Decode for char {
    fn decode(reader: &mut PickleReader<'_>) -> Result<Self> {
        let value = reader.read_pod::<u32>()?;
        char::from_u32(value)
            .ok_or_else(|| Error::invalid_format("char", format!("invalid scalar {value:#x}")))
    }
}

impl Encode for str {
    fn encode(&self, pickle: &mut Pickle) -> Result<()> {
        pickle.write_length(self.len())?;
        pickle.write_bytes(self.as_bytes())
    }
}

impl Encode for String {
    fn encode(&self, pickle: &mut Pickle) -> Result<()> {
        self.as_str().encode(pickle)
    }
}

impl Decode for String {
    fn decode(reader: &mut PickleReader<'_>) -> Result<Self> {
        reader.read_string()
    }
}

impl Encode for WideString {
    fn encode(&self, pickle: &mut Pickle) -> Result<()> {
        pickle.write_wide_str(self.as_units())
    }
}

impl Decode for WideString {
    fn decode(reader: &mut PickleReader<'_>) -> Result<Self> {
        reader.read_wide_string()
    }
}

impl<T: Encode + ?Sized> Encode for &T {
    #[inline]
    fn encode(&self, pickle: &mut Pickle) -> Result<()> {
        (**self).encode(pickle)
    }
}

impl<T: Encode + ?Sized> Encode for Box<T> {
    #[inline]
    fn encode(&self, pickle: &mut Pickle) -> Result<()> {
        (**self).encode(pickle)
    }
}

impl<T: Decode> Decode for Box<T> {
    #[inline]
    fn decode(reader: &mut PickleReader<'_>) -> Result<Self> {
        T::decode(reader).map(Box::new)
    }
}

#[cfg(test)]
mod tests {
    use pickle_common::error::ErrorKind;

    use super::*;

    fn round_trip<T>(value: T) -> T
    where
        T: Encode + Decode,
    {
        let mut pickle = Pickle::new();
        pickle.write(&value).unwrap();
        assert_eq!(pickle.payload_size() % 4, 0);
        let mut reader = pickle.reader();
        let decoded = reader.read::<T>().unwrap();
        assert!(!reader.is_valid());
        decoded
    }

    #[test]
    fn test_integer_round_trip() {
        assert_eq!(round_trip(0xABu8), 0xAB);
        assert_eq!(round_trip(-5i8), -5);
        assert_eq!(round_trip(65535u16), 65535);
        assert_eq!(round_trip(i16::MIN), i16::MIN);
        assert_eq!(round_trip(0xDEADBEEFu32), 0xDEADBEEF);
        assert_eq!(round_trip(i32::MIN), i32::MIN);
        assert_eq!(round_trip(u64::MAX), u64::MAX);
        assert_eq!(round_trip(i64::MIN), i64::MIN);
        assert_eq!(round_trip(usize::MAX), usize::MAX);
        assert_eq!(round_trip(isize::MIN), isize::MIN);
    }

    #[test]
    #[allow(clippy::approx_constant)]
    fn test_float_round_trip_is_bit_exact() {
        for value in [0.0f64, -0.0, 3.1415926, f64::MIN_POSITIVE, f64::INFINITY, f64::NAN] {
            assert_eq!(round_trip(value).to_bits(), value.to_bits());
        }
        for value in [3.14f32, -0.0, f32::MAX, f32::NAN] {
            assert_eq!(round_trip(value).to_bits(), value.to_bits());
        }
    }

    #[test]
    fn test_char_and_bool() {
        assert!(round_trip(true));
        assert!(!round_trip(false));
        assert_eq!(round_trip('🦀'), '🦀');
        assert_eq!(round_trip('\0'), '\0');
    }

    #[test]
    fn test_narrow_types_use_full_slot() {
        let mut pickle = Pickle::new();
        pickle.write(&0x7fu8).unwrap();
        pickle.write(&-1i16).unwrap();
        pickle.write(&true).unwrap();
        assert_eq!(pickle.payload_size(), 12);
        assert_eq!(&pickle.payload()[..4], &[0x7f, 0, 0, 0]);
        assert_eq!(&pickle.payload()[4..8], &[0xff, 0xff, 0, 0]);
        assert_eq!(&pickle.payload()[8..], &[1, 0, 0, 0]);
    }

    #[test]
    fn test_invalid_char() {
        let mut pickle = Pickle::new();
        pickle.write(&0xD800u32).unwrap();
        let mut reader = pickle.reader();
        let err = reader.read::<char>().unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::InvalidFormat { .. }));
        assert_eq!(reader.position(), 0);
        assert_eq!(reader.read::<u32>().unwrap(), 0xD800);
    }

    #[test]
    fn test_strings() {
        assert_eq!(round_trip(String::new()), "");
        assert_eq!(round_trip("hello".to_string()), "hello");
        assert_eq!(round_trip("ünïcødé ✓".to_string()), "ünïcødé ✓");
        assert_eq!(round_trip(WideString::from("world")), WideString::from("world"));
        assert_eq!(round_trip(WideString::new()), WideString::new());
    }

    #[test]
    fn test_boxed_and_borrowed() {
        assert_eq!(*round_trip(Box::new(17u32)), 17);

        let mut pickle = Pickle::new();
        let s = "borrowed";
        pickle.write(&s).unwrap();
        pickle.write("unsized").unwrap();
        let mut reader = pickle.reader();
        assert_eq!(reader.read_str().unwrap(), "borrowed");
        assert_eq!(reader.read::<String>().unwrap(), "unsized");
    }
}
