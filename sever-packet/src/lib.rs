//! Packet decode/mutate/encode library for sever
//!
//! This crate decodes a raw link-layer buffer into a layered, mutable
//! representation of an Ethernet frame carrying an IPv4/TCP segment,
//! and re-serializes it back into a byte-exact wire buffer. Its primary
//! use is forging a TCP reset against an observed connection: transplant
//! a sequence number, flip the control flags to a bare RST, empty the
//! payload, and fix up both checksums, so the resulting bytes can be
//! reinjected to tear the connection down.
//!
//! # Architecture
//!
//! The library is organized into several modules:
//!
//! - [`bits`] - Bit-field and integer codec helpers
//! - [`checksum`] - Internet checksum calculation (RFC 1071)
//! - [`ethernet`] - Ethernet frame parsing and serialization
//! - [`ip`] - IPv4 packet parsing, checksums, and forge orchestration
//! - [`tcp`] - TCP segment parsing, flags, and reset forging
//!
//! Each layer exclusively owns the next inner one (frame → packet →
//! segment); the pseudo-header context a TCP checksum needs is passed in
//! explicitly rather than held as a back-pointer.
//!
//! # Quick Start
//!
//! ```rust
//! use sever_packet::EthernetFrame;
//!
//! # fn main() -> sever_core::Result<()> {
//! // A captured frame: Ethernet + IPv4 + TCP, FCS already stripped
//! let captured: Vec<u8> = vec![
//!     0xaa, 0xbb, 0xcc, 0xdd, 0xee, 0xff, // destination MAC
//!     0x00, 0x11, 0x22, 0x33, 0x44, 0x55, // source MAC
//!     0x08, 0x00, // ethertype: IPv4
//!     0x45, 0x00, 0x00, 0x2c, 0x12, 0x34, 0x40, 0x00, 0x40, 0x06,
//!     0xde, 0xad, 0xc0, 0xa8, 0x01, 0x01, 0xc0, 0xa8, 0x01, 0x02,
//!     0x30, 0x39, 0x00, 0x50, 0x00, 0x00, 0x03, 0xe8, 0x00, 0x00,
//!     0x07, 0xd0, 0x50, 0x18, 0xff, 0xff, 0xab, 0xcd, 0x00, 0x00,
//!     0x01, 0x02, 0x03, 0x04, // segment payload
//! ];
//!
//! let mut frame = EthernetFrame::parse(&captured)?;
//!
//! // Decoding alone changes nothing
//! assert_eq!(frame.raw(), captured);
//!
//! // Forge a reset carrying the next expected sequence number
//! frame.forge_reset(1000 + 4);
//! let wire = frame.raw();
//!
//! assert!(frame.payload.payload.flags.rst);
//! assert!(frame.payload.payload.payload.is_empty());
//! # Ok(())
//! # }
//! ```
//!
//! # Scope
//!
//! The crate performs no capture or transmission and keeps no state across
//! packets; a packet source and sink are the caller's concern. Only
//! IPv4/TCP frames are accepted; anything else is rejected at
//! construction with a typed error.

pub mod bits;
pub mod checksum;
pub mod ethernet;
pub mod ip;
pub mod tcp;

// Re-export commonly used types
pub use checksum::{internet_checksum, validate_checksum};
pub use ethernet::{EthernetFrame, MacAddress, ETHERTYPE_IPV4};
pub use ip::{IpFlags, Ipv4Packet, IPPROTO_TCP};
pub use tcp::{TcpFlags, TcpPort, TcpSegment};
