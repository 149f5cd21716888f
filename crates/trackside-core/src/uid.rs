//! Canonical tag identifier derivation.
//!
//! Raw reader values are canonicalized into a fixed 10-hex-character
//! identifier: a constant prefix byte, the three most significant bytes of
//! the tag value, and a BCC (block check character, the XOR of the four
//! preceding bytes). The canonical form is the dedup key and the identifier
//! sent to both the lap service and the notification channel.

use crate::{
    Result,
    constants::{UID_HEX_LENGTH, UID_PREFIX_BYTE, UID_TAG_BYTES},
    error::Error,
};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Raw tag value as reported by the reader on one poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RawRead(u64);

impl RawRead {
    #[must_use]
    pub fn new(value: u64) -> Self {
        RawRead(value)
    }

    /// Get the raw tag value.
    #[must_use]
    pub fn value(&self) -> u64 {
        self.0
    }

    /// Number of big-endian bytes needed to hold the value (at least 1).
    #[must_use]
    pub fn byte_len(&self) -> usize {
        let bits = 64 - self.0.leading_zeros() as usize;
        bits.div_ceil(8).max(1)
    }
}

impl fmt::Display for RawRead {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:#X}", self.0)
    }
}

/// Canonical UID (10 uppercase hex characters)
///
/// Immutable once derived; identical raw values always canonicalize to the
/// identical string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CanonicalUid(String);

impl CanonicalUid {
    /// Derive the canonical UID from a raw reader value.
    ///
    /// Takes the first three big-endian bytes of the value, prepends the
    /// fixed prefix and appends the XOR checksum over prefix and tag bytes.
    ///
    /// # Errors
    /// Returns `Error::TagTooShort` if the value fits in fewer than three
    /// bytes. The caller must skip such a read, not abort.
    pub fn from_raw(raw: RawRead) -> Result<Self> {
        let len = raw.byte_len();
        if len < UID_TAG_BYTES {
            return Err(Error::TagTooShort {
                bytes: len,
                min: UID_TAG_BYTES,
            });
        }

        let be = raw.value().to_be_bytes();
        let tag = &be[be.len() - len..][..UID_TAG_BYTES];

        let mut bytes = [0u8; 5];
        bytes[0] = UID_PREFIX_BYTE;
        bytes[1..4].copy_from_slice(tag);
        bytes[4] = bytes[0] ^ bytes[1] ^ bytes[2] ^ bytes[3];

        let uid: String = bytes.iter().map(|b| format!("{b:02X}")).collect();
        debug_assert_eq!(uid.len(), UID_HEX_LENGTH);

        Ok(CanonicalUid(uid))
    }

    /// Get the canonical UID as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CanonicalUid {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(0x1A2B3C, "881A2B3C85")]
    #[case(0xFFFFFF, "88FFFFFF77")]
    #[case(0x010000, "8801000089")]
    #[case(0x04AB_CDEF, "8804ABCDEA")] // 4-byte value keeps the leading bytes
    fn test_canonical_uid_derivation(#[case] raw: u64, #[case] expected: &str) {
        let uid = CanonicalUid::from_raw(RawRead::new(raw)).unwrap();
        assert_eq!(uid.as_str(), expected);
    }

    #[rstest]
    #[case(0)]
    #[case(0xFF)]
    #[case(0xFFFF)]
    fn test_short_values_rejected(#[case] raw: u64) {
        let result = CanonicalUid::from_raw(RawRead::new(raw));
        assert!(matches!(result, Err(Error::TagTooShort { .. })));
    }

    #[rstest]
    #[case(0x1_0000)] // exactly 17 bits
    #[case(0x1A2B3C)]
    #[case(u64::MAX)]
    #[case(0xDEAD_BEEF_CAFE)]
    fn test_deterministic_with_valid_checksum(#[case] raw: u64) {
        let a = CanonicalUid::from_raw(RawRead::new(raw)).unwrap();
        let b = CanonicalUid::from_raw(RawRead::new(raw)).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.as_str().len(), UID_HEX_LENGTH);

        let bytes: Vec<u8> = (0..5)
            .map(|i| u8::from_str_radix(&a.as_str()[i * 2..i * 2 + 2], 16).unwrap())
            .collect();
        assert_eq!(bytes[4], bytes[0] ^ bytes[1] ^ bytes[2] ^ bytes[3]);
    }

    #[test]
    fn test_byte_len() {
        assert_eq!(RawRead::new(0).byte_len(), 1);
        assert_eq!(RawRead::new(0xFF).byte_len(), 1);
        assert_eq!(RawRead::new(0x100).byte_len(), 2);
        assert_eq!(RawRead::new(0x1A2B3C).byte_len(), 3);
        assert_eq!(RawRead::new(u64::MAX).byte_len(), 8);
    }
}
