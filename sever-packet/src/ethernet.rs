//! Ethernet frame parsing and serialization
//!
//! The outermost layer of the decode/mutate/encode pipeline. A frame owns
//! the IPv4 packet it carries; serialization walks the layers back down to
//! a byte-exact wire buffer. No checksum lives at this layer, and frames
//! are assumed to arrive with any frame-check sequence already stripped.

use crate::ip::Ipv4Packet;
use bytes::{BufMut, BytesMut};
use sever_core::{Error, Result};
use std::fmt;
use std::ops::Index;

/// IPv4 EtherType
pub const ETHERTYPE_IPV4: u16 = 0x0800;

/// MAC address (6 bytes)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MacAddress(pub [u8; 6]);

impl MacAddress {
    /// Broadcast MAC address (ff:ff:ff:ff:ff:ff)
    pub const BROADCAST: MacAddress = MacAddress([0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF]);

    /// Zero MAC address (00:00:00:00:00:00)
    pub const ZERO: MacAddress = MacAddress([0x00, 0x00, 0x00, 0x00, 0x00, 0x00]);

    /// Create a new MAC address from a byte array
    pub fn new(bytes: [u8; 6]) -> Self {
        MacAddress(bytes)
    }

    /// Create a MAC address from a slice
    pub fn from_slice(slice: &[u8]) -> Option<Self> {
        if slice.len() == 6 {
            let mut bytes = [0u8; 6];
            bytes.copy_from_slice(slice);
            Some(MacAddress(bytes))
        } else {
            None
        }
    }

    /// Get the MAC address as a byte array
    pub fn as_bytes(&self) -> &[u8; 6] {
        &self.0
    }

    /// Check if this is a broadcast address
    pub fn is_broadcast(&self) -> bool {
        self.0 == [0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF]
    }

    /// Check if this is a multicast address (bit 0 of first octet is 1)
    pub fn is_multicast(&self) -> bool {
        self.0[0] & 0x01 == 0x01
    }

    /// Check if this is a unicast address
    pub fn is_unicast(&self) -> bool {
        !self.is_multicast() && !self.is_broadcast()
    }
}

impl fmt::Display for MacAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:02x}:{:02x}:{:02x}:{:02x}:{:02x}:{:02x}",
            self.0[0], self.0[1], self.0[2], self.0[3], self.0[4], self.0[5]
        )
    }
}

impl Index<usize> for MacAddress {
    type Output = u8;

    fn index(&self, index: usize) -> &u8 {
        &self.0[index]
    }
}

impl From<[u8; 6]> for MacAddress {
    fn from(bytes: [u8; 6]) -> Self {
        MacAddress(bytes)
    }
}

impl From<MacAddress> for [u8; 6] {
    fn from(mac: MacAddress) -> Self {
        mac.0
    }
}

/// Ethernet II frame carrying an IPv4 packet
#[derive(Debug, Clone)]
pub struct EthernetFrame {
    /// Destination MAC address
    pub destination: MacAddress,
    /// Source MAC address
    pub source: MacAddress,
    /// EtherType (0x0800, enforced at construction and never rechecked)
    pub ethertype: u16,
    /// The IPv4 packet this frame carries
    pub payload: Ipv4Packet,
}

impl EthernetFrame {
    /// Ethernet header size (dst + src + ethertype)
    pub const HEADER_SIZE: usize = 14;

    /// Parse an Ethernet frame from a raw link-layer buffer.
    ///
    /// Rejects any ethertype other than IPv4 with
    /// [`Error::UnsupportedEthertype`]; a rejected buffer yields no partial
    /// frame. Construction is eager through all three layers.
    pub fn parse(data: &[u8]) -> Result<Self> {
        if data.len() < Self::HEADER_SIZE {
            return Err(Error::Truncated {
                needed: Self::HEADER_SIZE,
                available: data.len(),
            });
        }

        let mut destination = [0u8; 6];
        destination.copy_from_slice(&data[0..6]);
        let mut source = [0u8; 6];
        source.copy_from_slice(&data[6..12]);

        let ethertype = u16::from_be_bytes([data[12], data[13]]);
        if ethertype != ETHERTYPE_IPV4 {
            return Err(Error::UnsupportedEthertype(ethertype));
        }

        let payload = Ipv4Packet::parse(&data[Self::HEADER_SIZE..])?;

        Ok(EthernetFrame {
            destination: MacAddress(destination),
            source: MacAddress(source),
            ethertype,
            payload,
        })
    }

    /// Serialize the whole frame back to wire bytes.
    ///
    /// Pure function of the current field values, computed fresh on every
    /// call. No minimum-size padding is applied, keeping decode→raw
    /// byte-exact.
    pub fn raw(&self) -> Vec<u8> {
        let payload = self.payload.raw();

        let mut buffer = BytesMut::with_capacity(Self::HEADER_SIZE + payload.len());
        buffer.put_slice(self.destination.as_bytes());
        buffer.put_slice(self.source.as_bytes());
        buffer.put_u16(self.ethertype);
        buffer.put_slice(&payload);

        buffer.to_vec()
    }

    /// Forge a reset against the carried connection; see
    /// [`Ipv4Packet::forge_reset`].
    pub fn forge_reset(&mut self, sequence: u32) {
        self.payload.forge_reset(sequence);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checksum::validate_checksum;

    fn sample_frame_bytes() -> Vec<u8> {
        let mut data = vec![
            0xAA, 0xBB, 0xCC, 0xDD, 0xEE, 0xFF, // destination
            0x00, 0x11, 0x22, 0x33, 0x44, 0x55, // source
            0x08, 0x00, // ethertype IPv4
        ];
        data.extend_from_slice(&[
            0x45, 0x00, 0x00, 0x2C, 0x12, 0x34, 0x40, 0x00, 0x40, 0x06, 0xDE, 0xAD, 0xC0, 0xA8,
            0x01, 0x01, 0xC0, 0xA8, 0x01, 0x02, // IPv4 header
            0x30, 0x39, 0x00, 0x50, 0x00, 0x00, 0x03, 0xE8, 0x00, 0x00, 0x07, 0xD0, 0x50, 0x18,
            0xFF, 0xFF, 0xAB, 0xCD, 0x00, 0x00, // TCP header
            0x01, 0x02, 0x03, 0x04, // TCP payload
        ]);
        data
    }

    #[test]
    fn test_mac_address_display_lowercase() {
        let mac = MacAddress([0, 17, 34, 51, 68, 85]);
        assert_eq!(format!("{}", mac), "00:11:22:33:44:55");

        let mac = MacAddress([0xAA, 0xBB, 0xCC, 0xDD, 0xEE, 0xFF]);
        assert_eq!(format!("{}", mac), "aa:bb:cc:dd:ee:ff");
    }

    #[test]
    fn test_mac_address_indexing() {
        let mac = MacAddress([0x00, 0x11, 0x22, 0x33, 0x44, 0x55]);
        assert_eq!(mac[0], 0x00);
        assert_eq!(mac[3], 0x33);
        assert_eq!(mac[5], 0x55);
    }

    #[test]
    fn test_mac_address_classes() {
        assert!(MacAddress::BROADCAST.is_broadcast());
        assert!(!MacAddress::ZERO.is_broadcast());
        assert!(MacAddress([0x01, 0, 0, 0, 0, 0]).is_multicast());
        assert!(MacAddress([0x00, 0x11, 0x22, 0x33, 0x44, 0x55]).is_unicast());
    }

    #[test]
    fn test_mac_address_from_slice() {
        assert!(MacAddress::from_slice(&[0; 6]).is_some());
        assert!(MacAddress::from_slice(&[0; 5]).is_none());
    }

    #[test]
    fn test_ipv4_address_formatting() {
        let addr = std::net::Ipv4Addr::new(192, 168, 1, 1);
        assert_eq!(addr.to_string(), "192.168.1.1");
        assert_eq!(addr.octets()[3], 1);
    }

    #[test]
    fn test_parse_fields() {
        let frame = EthernetFrame::parse(&sample_frame_bytes()).unwrap();

        assert_eq!(frame.destination.0, [0xAA, 0xBB, 0xCC, 0xDD, 0xEE, 0xFF]);
        assert_eq!(frame.source.0, [0x00, 0x11, 0x22, 0x33, 0x44, 0x55]);
        assert_eq!(frame.ethertype, ETHERTYPE_IPV4);
        assert_eq!(frame.payload.ttl, 64);
        assert_eq!(frame.payload.payload.destination_port.0, 80);
    }

    #[test]
    fn test_parse_rejects_arp() {
        let mut data = sample_frame_bytes();
        data[12] = 0x08;
        data[13] = 0x06;
        assert_eq!(
            EthernetFrame::parse(&data).unwrap_err(),
            Error::UnsupportedEthertype(0x0806)
        );
    }

    #[test]
    fn test_parse_truncated() {
        let data = sample_frame_bytes();
        assert!(matches!(
            EthernetFrame::parse(&data[..10]),
            Err(Error::Truncated { .. })
        ));
    }

    #[test]
    fn test_raw_round_trip() {
        // Decoding alone mutates nothing: raw() reproduces the input
        // byte-for-byte, captured checksums included
        let data = sample_frame_bytes();
        let frame = EthernetFrame::parse(&data).unwrap();
        assert_eq!(frame.raw(), data);
    }

    #[test]
    fn test_forge_reset_end_to_end() {
        let data = sample_frame_bytes();
        let mut frame = EthernetFrame::parse(&data).unwrap();
        frame.forge_reset(12345);

        let segment = &frame.payload.payload;
        assert!(segment.flags.rst);
        assert_eq!(segment.sequence_number, 12345);
        assert!(segment.payload.is_empty());

        // Serialized output reflects the mutation
        let wire = frame.raw();
        assert_eq!(wire.len(), data.len() - 4); // payload emptied
        assert_eq!(wire[14 + 20 + 13], 0b0000_0100); // RST alone

        // Reparsing the forged bytes gives back the forged fields
        let reparsed = EthernetFrame::parse(&wire).unwrap();
        assert_eq!(reparsed.payload.payload.sequence_number, 12345);
        assert!(validate_checksum(&reparsed.payload.header_bytes()));
    }

    #[test]
    fn test_mutate_serialize_interleave() {
        let mut frame = EthernetFrame::parse(&sample_frame_bytes()).unwrap();

        frame.payload.ttl = 128;
        let first = frame.raw();
        assert_eq!(first[14 + 8], 128);

        frame.payload.payload.window_size = 1024;
        let second = frame.raw();
        assert_eq!(&second[14 + 20 + 14..14 + 20 + 16], &[0x04, 0x00]);
    }
}
