use pickle_common::{Result, error::Error};

/// A wide (UTF-16) string, stored as raw code units.
///
/// Pickles write wide strings as a code unit count followed by the units in
/// host byte order. The units are not required to form valid UTF-16; use
/// [`try_to_string`](WideString::try_to_string) or
/// [`to_string_lossy`](WideString::to_string_lossy) to convert.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct WideString(Vec<u16>);

impl WideString {
    pub fn new() -> WideString {
        WideString(Vec::new())
    }

    pub fn from_units(units: Vec<u16>) -> WideString {
        WideString(units)
    }

    #[inline]
    pub fn as_units(&self) -> &[u16] {
        &self.0
    }

    pub fn into_units(self) -> Vec<u16> {
        self.0
    }

    /// Number of UTF-16 code units.
    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Converts to a `String`, failing on unpaired surrogates.
    pub fn try_to_string(&self) -> Result<String> {
        String::from_utf16(&self.0)
            .map_err(|e| Error::invalid_format("wide string", e.to_string()))
    }

    /// Converts to a `String`, replacing invalid sequences with U+FFFD.
    pub fn to_string_lossy(&self) -> String {
        String::from_utf16_lossy(&self.0)
    }
}

impl From<&str> for WideString {
    fn from(s: &str) -> Self {
        s.encode_utf16().collect()
    }
}

impl From<String> for WideString {
    fn from(s: String) -> Self {
        Self::from(s.as_str())
    }
}

impl From<Vec<u16>> for WideString {
    fn from(units: Vec<u16>) -> Self {
        WideString(units)
    }
}

impl FromIterator<u16> for WideString {
    fn from_iter<I: IntoIterator<Item = u16>>(iter: I) -> Self {
        WideString(iter.into_iter().collect())
    }
}

impl std::ops::Deref for WideString {
    type Target = [u16];

    #[inline]
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl std::fmt::Display for WideString {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for c in char::decode_utf16(self.0.iter().copied()) {
            std::fmt::Write::write_char(f, c.unwrap_or(char::REPLACEMENT_CHARACTER))?;
        }
        Ok(())
    }
}
