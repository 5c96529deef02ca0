//! Bit-field and integer codec helpers
//!
//! Packet headers pack several fields into single octets or 16-bit words.
//! This module reads such fields out of packed big-endian values and
//! converts between unsigned integers and byte sequences.

use sever_core::{Error, Result};

/// Extracts an unsigned bit field from a packed value.
///
/// The field is `length` bits wide and starts `offset` bits from the
/// most-significant bit of a `width`-bit value.
///
/// # Arguments
///
/// * `value` - The packed value holding the field
/// * `offset` - Bit offset of the field, counted from the MSB
/// * `length` - Width of the field in bits
/// * `width` - Width of the containing value in bits (at most 64)
///
/// # Returns
///
/// The field as an unsigned integer, or [`Error::FieldOutOfRange`] when the
/// field does not fit the containing value.
///
/// # Examples
///
/// ```
/// use sever_packet::bits::extract;
///
/// // Version nibble of an IPv4 version/IHL octet
/// assert_eq!(extract(0x45, 0, 4, 8).unwrap(), 4);
/// ```
pub fn extract(value: u64, offset: u32, length: u32, width: u32) -> Result<u64> {
    if width > 64 || offset.checked_add(length).is_none_or(|end| end > width) {
        return Err(Error::FieldOutOfRange {
            offset,
            length,
            width,
        });
    }

    let mask = if length == 64 {
        u64::MAX
    } else {
        (1u64 << length) - 1
    };

    Ok((value >> (width - offset - length)) & mask)
}

/// Encodes an unsigned integer as `n_bytes` big-endian bytes.
///
/// Fails with [`Error::ValueTooLarge`] when the value needs more than
/// `8 * n_bytes` bits. Use [`encode_be_lossy`] for the truncating variant.
pub fn encode_be(value: u64, n_bytes: usize) -> Result<Vec<u8>> {
    if n_bytes < 8 && value >> (8 * n_bytes as u32) != 0 {
        return Err(Error::ValueTooLarge { value, n_bytes });
    }
    Ok(encode_be_lossy(value, n_bytes))
}

/// Encodes an unsigned integer as `n_bytes` big-endian bytes, silently
/// keeping only the low `8 * n_bytes` bits of an oversized value.
pub fn encode_be_lossy(value: u64, n_bytes: usize) -> Vec<u8> {
    let be = value.to_be_bytes();
    if n_bytes <= 8 {
        be[8 - n_bytes..].to_vec()
    } else {
        let mut out = vec![0u8; n_bytes - 8];
        out.extend_from_slice(&be);
        out
    }
}

/// Decodes a big-endian byte sequence to an unsigned integer.
///
/// Sequences longer than 8 bytes do not fit a `u64` and are out of contract.
pub fn decode_be(bytes: &[u8]) -> u64 {
    debug_assert!(bytes.len() <= 8, "integer wider than 64 bits");
    bytes.iter().fold(0u64, |acc, &b| (acc << 8) | u64::from(b))
}

/// Decodes a little-endian byte sequence to an unsigned integer.
///
/// Sequences longer than 8 bytes do not fit a `u64` and are out of contract.
pub fn decode_le(bytes: &[u8]) -> u64 {
    debug_assert!(bytes.len() <= 8, "integer wider than 64 bits");
    bytes
        .iter()
        .rev()
        .fold(0u64, |acc, &b| (acc << 8) | u64::from(b))
}
