//! Error types for sever

use thiserror::Error;

/// Result type alias for sever operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for sever
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Ethertype is not IPv4 (0x0800)
    #[error("unsupported ethertype 0x{0:04x}, expected IPv4 (0x0800)")]
    UnsupportedEthertype(u16),

    /// IP version field is not 4
    #[error("unsupported IP version {0}, expected 4")]
    UnsupportedIpVersion(u8),

    /// IPv4 protocol field is not TCP (6)
    #[error("unsupported transport protocol {0}, expected TCP (6)")]
    UnsupportedTransportProtocol(u8),

    /// A bit-field read past the end of its containing value
    #[error("bit field out of range: offset {offset} + length {length} exceeds width {width}")]
    FieldOutOfRange { offset: u32, length: u32, width: u32 },

    /// A value does not fit the requested byte width
    #[error("value {value} does not fit in {n_bytes} byte(s)")]
    ValueTooLarge { value: u64, n_bytes: usize },

    /// Input buffer too short for the header it claims to hold
    #[error("truncated packet: need {needed} bytes, have {available}")]
    Truncated { needed: usize, available: usize },
}
