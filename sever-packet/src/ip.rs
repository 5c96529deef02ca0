//! IPv4 packet parsing, mutation, and serialization
//!
//! The IPv4 layer owns the TCP segment it carries and supplies the
//! pseudo-header context the TCP checksum needs, so reset forging is
//! orchestrated here: mutate the segment, refresh the header checksum,
//! then refresh the segment checksum against a live pseudo-header.

use crate::bits;
use crate::checksum::internet_checksum;
use crate::tcp::TcpSegment;
use bytes::{BufMut, BytesMut};
use sever_core::{Error, Result};
use std::net::Ipv4Addr;
use tracing::debug;

/// TCP protocol number
pub const IPPROTO_TCP: u8 = 6;

/// IP flags (3-bit field)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IpFlags {
    /// Reserved bit (must be 0)
    pub reserved: bool,
    /// Don't Fragment flag
    pub dont_fragment: bool,
    /// More Fragments flag
    pub more_fragments: bool,
}

impl IpFlags {
    /// No flags set
    pub const NONE: IpFlags = IpFlags {
        reserved: false,
        dont_fragment: false,
        more_fragments: false,
    };

    /// Don't Fragment flag set
    pub const DONT_FRAGMENT: IpFlags = IpFlags {
        reserved: false,
        dont_fragment: true,
        more_fragments: false,
    };

    pub fn new() -> Self {
        IpFlags::NONE
    }

    /// Convert to 3-bit value
    pub fn to_u8(self) -> u8 {
        let mut flags = 0u8;
        if self.reserved {
            flags |= 0b100;
        }
        if self.dont_fragment {
            flags |= 0b010;
        }
        if self.more_fragments {
            flags |= 0b001;
        }
        flags
    }

    /// Parse from 3-bit value
    pub fn from_u8(value: u8) -> Self {
        IpFlags {
            reserved: (value & 0b100) != 0,
            dont_fragment: (value & 0b010) != 0,
            more_fragments: (value & 0b001) != 0,
        }
    }
}

impl Default for IpFlags {
    fn default() -> Self {
        IpFlags::NONE
    }
}

/// IPv4 packet carrying a TCP segment
#[derive(Debug, Clone)]
pub struct Ipv4Packet {
    /// Version (always 4, enforced at construction)
    pub version: u8,
    /// Internet Header Length in 32-bit words (minimum 5)
    pub ihl: u8,
    /// Differentiated Services Code Point (6 bits)
    pub dscp: u8,
    /// Explicit Congestion Notification (2 bits)
    pub ecn: u8,
    /// Total length (header + data) in bytes, as parsed
    pub total_length: u16,
    /// Identification
    pub identification: u16,
    /// Flags
    pub flags: IpFlags,
    /// Fragment offset (13 bits, in 8-byte blocks)
    pub fragment_offset: u16,
    /// Time to Live
    pub ttl: u8,
    /// Protocol (always 6/TCP, enforced at construction)
    pub protocol: u8,
    /// Header checksum
    pub checksum: u16,
    /// Source IP address
    pub source: Ipv4Addr,
    /// Destination IP address
    pub destination: Ipv4Addr,
    /// Options, kept as an opaque blob of `(ihl - 5) * 4` bytes
    pub options: Vec<u8>,
    /// The TCP segment this packet carries
    pub payload: TcpSegment,
}

impl Ipv4Packet {
    /// Minimum IPv4 header size (without options)
    pub const MIN_HEADER_SIZE: usize = 20;

    /// Parse an IPv4 packet from a buffer starting at the IPv4 header.
    ///
    /// Rejects non-IPv4 versions and non-TCP protocols; beyond those gates
    /// and buffer truncation, field values are taken at face value; the
    /// incoming header checksum is not verified.
    pub fn parse(data: &[u8]) -> Result<Self> {
        if data.len() < Self::MIN_HEADER_SIZE {
            return Err(Error::Truncated {
                needed: Self::MIN_HEADER_SIZE,
                available: data.len(),
            });
        }

        // Version (4 bits) + IHL (4 bits)
        let version = bits::extract(data[0].into(), 0, 4, 8)? as u8;
        if version != 4 {
            return Err(Error::UnsupportedIpVersion(version));
        }
        let ihl = bits::extract(data[0].into(), 4, 4, 8)? as u8;

        // DSCP (6 bits) + ECN (2 bits)
        let dscp = bits::extract(data[1].into(), 0, 6, 8)? as u8;
        let ecn = bits::extract(data[1].into(), 6, 2, 8)? as u8;

        let total_length = u16::from_be_bytes([data[2], data[3]]);
        let identification = u16::from_be_bytes([data[4], data[5]]);

        // Flags (3 bits) + Fragment Offset (13 bits)
        let flags_and_offset = u16::from_be_bytes([data[6], data[7]]);
        let flags = IpFlags::from_u8(bits::extract(flags_and_offset.into(), 0, 3, 16)? as u8);
        let fragment_offset = bits::extract(flags_and_offset.into(), 3, 13, 16)? as u16;

        let ttl = data[8];
        let protocol = data[9];
        if protocol != IPPROTO_TCP {
            return Err(Error::UnsupportedTransportProtocol(protocol));
        }
        let checksum = u16::from_be_bytes([data[10], data[11]]);

        let source = Ipv4Addr::new(data[12], data[13], data[14], data[15]);
        let destination = Ipv4Addr::new(data[16], data[17], data[18], data[19]);

        let options_end = Self::MIN_HEADER_SIZE + 4 * (ihl as usize).saturating_sub(5);
        if data.len() < options_end {
            return Err(Error::Truncated {
                needed: options_end,
                available: data.len(),
            });
        }
        let options = data[Self::MIN_HEADER_SIZE..options_end].to_vec();
        let payload = TcpSegment::parse(&data[options_end..])?;

        Ok(Ipv4Packet {
            version,
            ihl,
            dscp,
            ecn,
            total_length,
            identification,
            flags,
            fragment_offset,
            ttl,
            protocol,
            checksum,
            source,
            destination,
            options,
            payload,
        })
    }

    /// Serialize the header fields, options included, to the exact wire
    /// layout.
    pub fn header_bytes(&self) -> Vec<u8> {
        let mut buffer = BytesMut::with_capacity(Self::MIN_HEADER_SIZE + self.options.len());

        // Version (4 bits) + IHL (4 bits)
        buffer.put_u8((self.version << 4) | (self.ihl & 0x0F));

        // DSCP (6 bits) + ECN (2 bits)
        buffer.put_u8((self.dscp << 2) | (self.ecn & 0x03));

        buffer.put_u16(self.total_length);
        buffer.put_u16(self.identification);

        // Flags (3 bits) + Fragment Offset (13 bits)
        buffer.put_u16(((self.flags.to_u8() as u16) << 13) | (self.fragment_offset & 0x1FFF));

        buffer.put_u8(self.ttl);
        buffer.put_u8(self.protocol);
        buffer.put_u16(self.checksum);
        buffer.put_slice(&self.source.octets());
        buffer.put_slice(&self.destination.octets());
        buffer.put_slice(&self.options);

        buffer.to_vec()
    }

    /// Serialize the whole packet: header, options, TCP segment.
    pub fn raw(&self) -> Vec<u8> {
        let mut out = self.header_bytes();
        out.extend_from_slice(&self.payload.raw());
        out
    }

    /// Recompute the header checksum over the serialized header, options
    /// included and payload excluded.
    pub fn recompute_checksum(&mut self) {
        self.checksum = 0;
        self.checksum = internet_checksum(&self.header_bytes());
    }

    /// Build the 12-byte TCP pseudo-header: source and destination
    /// addresses, a zero byte, the protocol, and the length of the
    /// currently serialized TCP segment.
    ///
    /// The length is read from the live segment, so the segment must be in
    /// its final form before the TCP checksum consumes this.
    pub fn pseudo_header_bytes(&self) -> [u8; 12] {
        let mut pseudo = [0u8; 12];
        pseudo[0..4].copy_from_slice(&self.source.octets());
        pseudo[4..8].copy_from_slice(&self.destination.octets());
        pseudo[9] = self.protocol;
        pseudo[10..12].copy_from_slice(&(self.payload.len() as u16).to_be_bytes());
        pseudo
    }

    /// Forge a reset against the connection this packet belongs to.
    ///
    /// Mutates the TCP segment into a bare RST carrying the given sequence
    /// number, then recomputes the header checksum and the segment checksum
    /// in that order, so the pseudo-header sees the segment's final form.
    /// The `total_length` field keeps its parsed value.
    pub fn forge_reset(&mut self, sequence: u32) {
        debug!(
            sequence,
            source = %self.source,
            destination = %self.destination,
            "forging tcp reset"
        );

        self.payload.forge_reset(sequence);
        self.recompute_checksum();

        let pseudo = self.pseudo_header_bytes();
        self.payload.recompute_checksum(&pseudo);
    }
}
