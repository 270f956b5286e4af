//! Dotted-quad parsing and formatting.
//!
//! An [`AddressKey`] is the canonical 32-bit form of an IPv4 address: the four
//! octets concatenated most significant first, so `"1.2.3.4"` is `0x01020304`.
//! This is the same encoding `u32::from(std::net::Ipv4Addr)` produces.

use thiserror::Error;

/// Canonical big-endian integer form of an IPv4 address.
pub type AddressKey = u32;

/// Number of bits in an [`AddressKey`].
pub const ADDRESS_BITS: u32 = AddressKey::BITS;

const OCTETS: usize = 4;
const SEPARATOR: char = '.';

/// A string that does not decode to four octets in `0..=255`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidAddressFormat {
    /// The input did not split into exactly four dot-separated segments.
    #[error("invalid address format {input:?}: expected 4 dot-separated octets, found {found}")]
    SegmentCount { input: String, found: usize },
    /// A segment is empty or contains something other than ASCII digits.
    #[error("invalid address format {input:?}: octet {index} ({segment:?}) is not a decimal number")]
    InvalidOctet {
        input: String,
        index: usize,
        segment: String,
    },
    /// A segment is numeric but larger than 255.
    #[error("invalid address format {input:?}: octet {index} ({segment:?}) is out of range 0..=255")]
    OctetOutOfRange {
        input: String,
        index: usize,
        segment: String,
    },
}

impl InvalidAddressFormat {
    /// The text that failed to parse.
    pub fn input(&self) -> &str {
        match self {
            Self::SegmentCount { input, .. }
            | Self::InvalidOctet { input, .. }
            | Self::OctetOutOfRange { input, .. } => input,
        }
    }

    /// Zero-based index of the offending segment, when one can be named.
    pub fn segment_index(&self) -> Option<usize> {
        match self {
            Self::SegmentCount { .. } => None,
            Self::InvalidOctet { index, .. } | Self::OctetOutOfRange { index, .. } => Some(*index),
        }
    }
}

/// Parse a dotted-quad string such as `"192.168.0.1"` into its [`AddressKey`].
///
/// Segments must be plain decimal digits (leading zeros are accepted, signs and
/// whitespace are not) with a value of at most 255.
pub fn parse_address(text: &str) -> Result<AddressKey, InvalidAddressFormat> {
    let found = text.split(SEPARATOR).count();
    if found != OCTETS {
        return Err(InvalidAddressFormat::SegmentCount {
            input: text.to_owned(),
            found,
        });
    }

    let mut key: AddressKey = 0;
    for (index, segment) in text.split(SEPARATOR).enumerate() {
        let octet = parse_octet(segment).map_err(|kind| kind.into_error(text, index, segment))?;
        key = (key << 8) | AddressKey::from(octet);
    }
    Ok(key)
}

/// Render a key back to its dotted-quad form.
pub fn format_address(key: AddressKey) -> String {
    let [a, b, c, d] = key.to_be_bytes();
    format!("{a}.{b}.{c}.{d}")
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum OctetError {
    NotDecimal,
    OutOfRange,
}

impl OctetError {
    fn into_error(self, input: &str, index: usize, segment: &str) -> InvalidAddressFormat {
        let input = input.to_owned();
        let segment = segment.to_owned();
        match self {
            OctetError::NotDecimal => InvalidAddressFormat::InvalidOctet {
                input,
                index,
                segment,
            },
            OctetError::OutOfRange => InvalidAddressFormat::OctetOutOfRange {
                input,
                index,
                segment,
            },
        }
    }
}

#[inline]
fn parse_octet(segment: &str) -> Result<u8, OctetError> {
    if segment.is_empty() || !segment.bytes().all(|b| b.is_ascii_digit()) {
        return Err(OctetError::NotDecimal);
    }
    // Saturate instead of overflowing on long runs of digits.
    let value = segment.bytes().fold(0u32, |acc, b| {
        acc.saturating_mul(10).saturating_add(u32::from(b - b'0'))
    });
    u8::try_from(value).map_err(|_| OctetError::OutOfRange)
}
