//! Pickle: a compact binary container for sequential serialization of typed
//! values.
//!
//! A pickle is a 4-byte header holding the payload length, followed by the
//! payload: a sequence of segments, each starting at a 4-byte aligned offset
//! and zero-padded to the next boundary. Values are appended with
//! [`Pickle::write`] and read back in the same order through a
//! [`PickleReader`]; every read is bounds-checked, so the reader is safe to
//! run on untrusted bytes.
//!
//! ```
//! use std::collections::BTreeMap;
//! use pickle::{Pickle, PickleRef};
//!
//! let mut pickle = Pickle::new();
//! pickle.write(&42i32).unwrap();
//! pickle.write("hello").unwrap();
//! pickle.write(&BTreeMap::from([("a".to_string(), 1.5f64)])).unwrap();
//!
//! let bytes = pickle.into_vec();
//! let view = PickleRef::new(&bytes);
//! let mut reader = view.reader();
//! assert_eq!(reader.read::<i32>().unwrap(), 42);
//! assert_eq!(reader.read_str().unwrap(), "hello");
//! let map = reader.read::<BTreeMap<String, f64>>().unwrap();
//! assert_eq!(map["a"], 1.5);
//! assert!(!reader.is_valid());
//! ```
//!
//! The format carries no type tags and uses the host byte order; it is meant
//! for same-host exchange between cooperating components.

pub mod codec;
pub mod format;
pub mod options;
pub mod pickle;
pub mod reader;
mod std_impls;
pub mod wide;

pub use codec::{Decode, Encode};
pub use format::{HEADER_SIZE, MAX_PAYLOAD_SIZE, PickleHeader, SEGMENT_ALIGNMENT};
pub use options::PickleOptions;
pub use pickle::{Pickle, PickleRef};
pub use pickle_common::{
    Result,
    error::{Error, ErrorKind},
};
pub use reader::PickleReader;
pub use wide::WideString;
