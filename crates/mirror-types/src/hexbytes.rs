//! Hex-encoded fixed-width byte strings used throughout the Oracle's data
//! model (nonce values, HMAC brands/macs, schema hashes).

use std::fmt;

/// A 32-byte value, serialized at the API boundary as 64 lowercase hex
/// characters.
///
/// `Hex64` validates its format on construction; everywhere else in the
/// crate it is passed around as plain `[u8; 32]` once parsed, so downstream
/// code never has to re-validate hex formatting.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Hex64(pub [u8; 32]);

/// Errors constructing a [`Hex64`] from a candidate string.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum HexFormatError {
    /// The string was not exactly 64 characters long.
    #[error("expected 64 hex characters, got {0}")]
    WrongLength(usize),
    /// The string contained non-hex characters.
    #[error("invalid hex character in input")]
    InvalidChar,
}

impl Hex64 {
    /// Parses a 64-character lowercase (or uppercase) hex string.
    pub fn parse(s: &str) -> Result<Self, HexFormatError> {
        if s.len() != 64 {
            return Err(HexFormatError::WrongLength(s.len()));
        }
        let mut bytes = [0u8; 32];
        hex::decode_to_slice(s, &mut bytes).map_err(|_| HexFormatError::InvalidChar)?;
        Ok(Self(bytes))
    }

    /// Returns true iff `s` is a syntactically valid 64-char hex string,
    /// without allocating the parsed bytes.
    pub fn is_valid(s: &str) -> bool {
        s.len() == 64 && s.bytes().all(|b| b.is_ascii_hexdigit())
    }

    /// Encodes back to a lowercase hex string.
    pub fn to_hex_string(&self) -> String {
        hex::encode(self.0)
    }

    /// Raw bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Debug for Hex64 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Hex64({}…)", &self.to_hex_string()[..8])
    }
}

impl fmt::Display for Hex64 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips() {
        let s = "a".repeat(64);
        let h = Hex64::parse(&s).unwrap();
        assert_eq!(h.to_hex_string(), s);
    }

    #[test]
    fn rejects_wrong_length() {
        assert_eq!(Hex64::parse("abcd"), Err(HexFormatError::WrongLength(4)));
    }

    #[test]
    fn rejects_non_hex() {
        let s = "z".repeat(64);
        assert_eq!(Hex64::parse(&s), Err(HexFormatError::InvalidChar));
    }

    #[test]
    fn is_valid_checks_length_and_charset() {
        assert!(Hex64::is_valid(&"f".repeat(64)));
        assert!(!Hex64::is_valid(&"f".repeat(63)));
        assert!(!Hex64::is_valid(&"g".repeat(64)));
    }
}
