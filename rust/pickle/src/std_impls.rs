//! Standard-library implementations of [`Encode`] and [`Decode`].
//!
//! Currently implemented:
//! - sequences: `[T]`, `Vec<T>`, `VecDeque<T>`, `LinkedList<T>`
//! - sets: `BTreeSet<T>`, `HashSet<T, S>`
//! - maps: `BTreeMap<K, V>`, `HashMap<K, V, S>`
//! - tuples of up to six elements
//! - `Path` / `PathBuf`, persisted as their UTF-8 string
//!
//! Notes on semantics:
//! - Every collection is written as an `i32` element count followed by the
//!   elements (key then value for maps) in the collection's iteration order.
//!   An empty collection is exactly 4 bytes.
//! - Sorted and hashed collections re-establish their own order on decode;
//!   round trips preserve the set of values, not the byte layout.
//! - Decoding never pre-allocates more elements than the remaining payload
//!   could hold, so a corrupted count cannot trigger a huge allocation.
//! - Duplicate keys in decoded maps and sets resolve as in `insert`: the last
//!   one wins.

use std::{
    collections::{BTreeMap, BTreeSet, HashMap, HashSet, LinkedList, VecDeque},
    hash::{BuildHasher, Hash},
    path::{Path, PathBuf},
};

use pickle_common::{Result, error::Error};

use crate::{
    codec::{Decode, Encode},
    format::SEGMENT_ALIGNMENT,
    pickle::Pickle,
    reader::PickleReader,
};

/// Writes the element count and then every item.
fn encode_seq<'a, T, I>(pickle: &mut Pickle, len: usize, items: I) -> Result<()>
where
    T: Encode + 'a,
    I: IntoIterator<Item = &'a T>,
{
    pickle.write_length(len)?;
    items.into_iter().try_for_each(|item| item.encode(pickle))
}

/// Reads an element count, returning it together with a safe capacity hint.
fn decode_len(reader: &mut PickleReader<'_>) -> Result<(usize, usize)> {
    let count = reader.read_length()?;
    // Every element occupies at least one aligned slot.
    let hint = count.min(reader.remaining() / SEGMENT_ALIGNMENT);
    Ok((count, hint))
}

impl<T: Encode> Encode for [T] {
    fn encode(&self, pickle: &mut Pickle) -> Result<()> {
        encode_seq(pickle, self.len(), self)
    }
}

impl<T: Encode> Encode for Vec<T> {
    fn encode(&self, pickle: &mut Pickle) -> Result<()> {
        self.as_slice().encode(pickle)
    }
}

impl<T: Decode> Decode for Vec<T> {
    fn decode(reader: &mut PickleReader<'_>) -> Result<Self> {
        let (count, hint) = decode_len(reader)?;
        let mut vec = Vec::with_capacity(hint);
        for _ in 0..count {
            vec.push(T::decode(reader)?);
        }
        Ok(vec)
    }
}

impl<T: Encode> Encode for VecDeque<T> {
    fn encode(&self, pickle: &mut Pickle) -> Result<()> {
        encode_seq(pickle, self.len(), self)
    }
}

impl<T: Decode> Decode for VecDeque<T> {
    fn decode(reader: &mut PickleReader<'_>) -> Result<Self> {
        let (count, hint) = decode_len(reader)?;
        let mut deque = VecDeque::with_capacity(hint);
        for _ in 0..count {
            deque.push_back(T::decode(reader)?);
        }
        Ok(deque)
    }
}

impl<T: Encode> Encode for LinkedList<T> {
    fn encode(&self, pickle: &mut Pickle) -> Result<()> {
        encode_seq(pickle, self.len(), self)
    }
}

impl<T: Decode> Decode for LinkedList<T> {
    fn decode(reader: &mut PickleReader<'_>) -> Result<Self> {
        let (count, _) = decode_len(reader)?;
        let mut list = LinkedList::new();
        for _ in 0..count {
            list.push_back(T::decode(reader)?);
        }
        Ok(list)
    }
}

impl<T: Encode> Encode for BTreeSet<T> {
    fn encode(&self, pickle: &mut Pickle) -> Result<()> {
        encode_seq(pickle, self.len(), self)
    }
}

impl<T: Decode + Ord> Decode for BTreeSet<T> {
    fn decode(reader: &mut PickleReader<'_>) -> Result<Self> {
        let (count, _) = decode_len(reader)?;
        let mut set = BTreeSet::new();
        for _ in 0..count {
            set.insert(T::decode(reader)?);
        }
        Ok(set)
    }
}

impl<T: Encode, S> Encode for HashSet<T, S> {
    fn encode(&self, pickle: &mut Pickle) -> Result<()> {
        encode_seq(pickle, self.len(), self)
    }
}

impl<T, S> Decode for HashSet<T, S>
where
    T: Decode + Eq + Hash,
    S: BuildHasher + Default,
{
    fn decode(reader: &mut PickleReader<'_>) -> Result<Self> {
        let (count, hint) = decode_len(reader)?;
        let mut set = HashSet::with_capacity_and_hasher(hint, S::default());
        for _ in 0..count {
            set.insert(T::decode(reader)?);
        }
        Ok(set)
    }
}

impl<K: Encode, V: Encode> Encode for BTreeMap<K, V> {
    fn encode(&self, pickle: &mut Pickle) -> Result<()> {
        pickle.write_length(self.len())?;
        self.iter().try_for_each(|(k, v)| {
            k.encode(pickle)?;
            v.encode(pickle)
        })
    }
}

impl<K: Decode + Ord, V: Decode> Decode for BTreeMap<K, V> {
    fn decode(reader: &mut PickleReader<'_>) -> Result<Self> {
        let (count, _) = decode_len(reader)?;
        let mut map = BTreeMap::new();
        for _ in 0..count {
            let key = K::decode(reader)?;
            let value = V::decode(reader)?;
            map.insert(key, value);
        }
        Ok(map)
    }
}

impl<K: Encode, V: Encode, S> Encode for HashMap<K, V, S> {
    fn encode(&self, pickle: &mut Pickle) -> Result<()> {
        pickle.write_length(self.len())?;
        self.iter().try_for_each(|(k, v)| {
            k.encode(pickle)?;
            v.encode(pickle)
        })
    }
}

impl<K, V, S> Decode for HashMap<K, V, S>
where
    K: Decode + Eq + Hash,
    V: Decode,
    S: BuildHasher + Default,
{
    fn decode(reader: &mut PickleReader<'_>) -> Result<Self> {
        let (count, hint) = decode_len(reader)?;
        let mut map = HashMap::with_capacity_and_hasher(hint / 2, S::default());
        for _ in 0..count {
            let key = K::decode(reader)?;
            let value = V::decode(reader)?;
            map.insert(key, value);
        }
        Ok(map)
    }
}

macro_rules! impl_tuple_codec {
    ($($name:ident),+) => {
        impl<$($name: Encode),+> Encode for ($($name,)+) {
            #[allow(non_snake_case)]
            fn encode(&self, pickle: &mut Pickle) -> Result<()> {
                let ($($name,)+) = self;
                $($name.encode(pickle)?;)+
                Ok(())
            }
        }

        impl<$($name: Decode),+> Decode for ($($name,)+) {
            fn decode(reader: &mut PickleReader<'_>) -> Result<Self> {
                Ok(($($name::decode(reader)?,)+))
            }
        }
    };
}

impl_tuple_codec!(A);
impl_tuple_codec!(A, B);
impl_tuple_codec!(A, B, C);
impl_tuple_codec!(A, B, C, D);
impl_tuple_codec!(A, B, C, D, E);
impl_tuple_codec!(A, B, C, D, E, F);

impl Encode for Path {
    fn encode(&self, pickle: &mut Pickle) -> Result<()> {
        self.to_str()
            .ok_or_else(|| Error::invalid_arg("path", "path is not valid UTF-8"))?
            .encode(pickle)
    }
}

impl Encode for PathBuf {
    fn encode(&self, pickle: &mut Pickle) -> Result<()> {
        self.as_path().encode(pickle)
    }
}

impl Decode for PathBuf {
    fn decode(reader: &mut PickleReader<'_>) -> Result<Self> {
        reader.read_str().map(PathBuf::from)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, LinkedList, VecDeque};
    use std::path::PathBuf;

    use pickle_common::error::ErrorKind;

    use crate::{Decode, Encode, Pickle};

    fn round_trip<T>(value: &T) -> T
    where
        T: Encode + Decode,
    {
        let mut pickle = Pickle::new();
        pickle.write(value).unwrap();
        let mut reader = pickle.reader();
        let decoded = reader.read::<T>().unwrap();
        assert!(!reader.is_valid());
        decoded
    }

    #[test]
    fn test_sequences() {
        let v = vec![1, -2, 3, i32::MAX];
        assert_eq!(round_trip(&v), v);

        let d: VecDeque<u64> = (0..100).collect();
        assert_eq!(round_trip(&d), d);

        let l: LinkedList<String> = ["a", "bb", "", "dddd"].into_iter().map(String::from).collect();
        assert_eq!(round_trip(&l), l);
    }

    #[test]
    fn test_empty_containers_are_four_bytes() {
        let mut pickle = Pickle::new();
        pickle.write(&Vec::<String>::new()).unwrap();
        assert_eq!(pickle.payload_size(), 4);
        pickle.write(&BTreeMap::<i32, i32>::new()).unwrap();
        assert_eq!(pickle.payload_size(), 8);
        pickle.write(&HashSet::<u8>::new()).unwrap();
        assert_eq!(pickle.payload_size(), 12);
        assert!(pickle.payload().iter().all(|&b| b == 0));
    }

    #[test]
    fn test_sequence_layout() {
        let mut pickle = Pickle::new();
        pickle.write(&vec![7u16, 8u16]).unwrap();
        let payload = pickle.payload();
        assert_eq!(payload.len(), 12);
        assert_eq!(&payload[..4], &2i32.to_ne_bytes());
        assert_eq!(&payload[4..6], &7u16.to_ne_bytes());
        assert_eq!(&payload[6..8], &[0, 0]);
        assert_eq!(&payload[8..10], &8u16.to_ne_bytes());
    }

    #[test]
    fn test_sets_and_maps() {
        let s: BTreeSet<String> = ["pear", "apple", "fig"].into_iter().map(String::from).collect();
        assert_eq!(round_trip(&s), s);

        let hs: HashSet<i64> = [5, -5, 1 << 40].into_iter().collect();
        assert_eq!(round_trip(&hs), hs);

        let m: BTreeMap<String, i32> = [("one", 1), ("two", 2), ("three", 3)]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect();
        assert_eq!(round_trip(&m), m);

        let hm: HashMap<String, i32> = m.clone().into_iter().collect();
        assert_eq!(round_trip(&hm), hm);
    }

    #[test]
    fn test_sorted_set_reorders_on_decode() {
        let mut pickle = Pickle::new();
        pickle.write(&vec![3u32, 1, 2, 1]).unwrap();
        let set = pickle.reader().read::<BTreeSet<u32>>().unwrap();
        assert_eq!(set.into_iter().collect::<Vec<_>>(), vec![1, 2, 3]);
    }

    #[test]
    fn test_tuples() {
        assert_eq!(round_trip(&(2.5f64, 7i32)), (2.5, 7));
        assert_eq!(round_trip(&(1u8,)), (1,));
        let t = (true, 'x', "s".to_string(), vec![1u8], -1i64, 0.5f32);
        assert_eq!(round_trip(&t), t);
    }

    #[test]
    fn test_nested_containers() {
        let nested: LinkedList<Vec<String>> = [
            vec!["a".to_string(), "b".to_string()],
            vec![],
            vec!["c".to_string()],
        ]
        .into_iter()
        .collect();
        assert_eq!(round_trip(&nested), nested);

        let map: BTreeMap<u32, Vec<(String, f64)>> = [
            (1, vec![("x".to_string(), 1.0)]),
            (2, vec![]),
        ]
        .into_iter()
        .collect();
        assert_eq!(round_trip(&map), map);
    }

    #[test]
    fn test_path() {
        let path = PathBuf::from("some/dir/file.txt");
        assert_eq!(round_trip(&path), path);

        let mut pickle = Pickle::new();
        pickle.write(path.as_path()).unwrap();
        assert_eq!(pickle.reader().read_str().unwrap(), "some/dir/file.txt");
    }

    #[cfg(unix)]
    #[test]
    fn test_non_utf8_path_is_rejected() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let path = PathBuf::from(OsStr::from_bytes(&[0x66, 0xff, 0x6f]));
        let mut pickle = Pickle::new();
        pickle.write(&1u32).unwrap();
        let err = pickle.write(&path).unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::InvalidArgument { .. }));
        assert_eq!(pickle.payload_size(), 4);
    }

    #[test]
    fn test_truncated_container_restores_cursor() {
        let mut pickle = Pickle::new();
        pickle.write(&vec!["alpha".to_string(), "beta".to_string()]).unwrap();
        let bytes = pickle.as_bytes();
        // Drop the last segment, keeping the header's claim intact.
        let truncated = &bytes[..bytes.len() - 4];
        let mut reader = crate::PickleReader::from_bytes(truncated);
        let err = reader.read::<Vec<String>>().unwrap_err();
        assert!(err.is_truncated());
        assert_eq!(reader.position(), 0);
    }

    #[test]
    fn test_huge_count_does_not_preallocate() {
        let mut pickle = Pickle::new();
        pickle.write(&i32::MAX).unwrap();
        let mut reader = pickle.reader();
        let err = reader.read::<Vec<u64>>().unwrap_err();
        assert!(err.is_truncated());
        let err = reader.read::<HashMap<u32, u32>>().unwrap_err();
        assert!(err.is_truncated());
        assert_eq!(reader.position(), 0);
    }

    #[test]
    fn test_negative_count_is_invalid() {
        let mut pickle = Pickle::new();
        pickle.write(&-3i32).unwrap();
        let err = pickle.reader().read::<Vec<u8>>().unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::InvalidFormat { .. }));
    }
}
