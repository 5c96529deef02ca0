//! TCP segment parsing, mutation, and serialization
//!
//! This module decodes a TCP segment into freely mutable fields,
//! re-serializes it byte-exactly, and carries the reset-forging mutation
//! used to tear down an observed connection.

use crate::bits;
use crate::checksum::internet_checksum;
use bytes::{BufMut, BytesMut};
use sever_core::{Error, Result};

/// TCP port number
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TcpPort(pub u16);

impl TcpPort {
    /// SSH (22)
    pub const SSH: TcpPort = TcpPort(22);

    /// Telnet (23)
    pub const TELNET: TcpPort = TcpPort(23);

    /// HTTP (80)
    pub const HTTP: TcpPort = TcpPort(80);

    /// HTTPS (443)
    pub const HTTPS: TcpPort = TcpPort(443);

    pub fn new(port: u16) -> Self {
        TcpPort(port)
    }

    pub fn to_u16(self) -> u16 {
        self.0
    }
}

impl From<u16> for TcpPort {
    fn from(port: u16) -> Self {
        TcpPort(port)
    }
}

impl From<TcpPort> for u16 {
    fn from(port: TcpPort) -> Self {
        port.0
    }
}

/// TCP control flags
///
/// Nine independent bits: NS lives in bit 0 of the data-offset octet, the
/// remaining eight occupy the flags octet in wire order CWR..FIN.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TcpFlags {
    /// NS - ECN nonce (experimental)
    pub ns: bool,
    /// CWR - Congestion Window Reduced
    pub cwr: bool,
    /// ECE - ECN-Echo
    pub ece: bool,
    /// URG - Urgent pointer field is significant
    pub urg: bool,
    /// ACK - Acknowledgment field is significant
    pub ack: bool,
    /// PSH - Push function
    pub psh: bool,
    /// RST - Reset the connection
    pub rst: bool,
    /// SYN - Synchronize sequence numbers
    pub syn: bool,
    /// FIN - No more data from sender
    pub fin: bool,
}

impl TcpFlags {
    /// No flags set
    pub const NONE: TcpFlags = TcpFlags {
        ns: false,
        cwr: false,
        ece: false,
        urg: false,
        ack: false,
        psh: false,
        rst: false,
        syn: false,
        fin: false,
    };

    /// SYN flag (connection initiation)
    pub const SYN: TcpFlags = TcpFlags {
        syn: true,
        ..TcpFlags::NONE
    };

    /// SYN+ACK flags (connection acknowledgment)
    pub const SYN_ACK: TcpFlags = TcpFlags {
        syn: true,
        ack: true,
        ..TcpFlags::NONE
    };

    /// ACK flag
    pub const ACK: TcpFlags = TcpFlags {
        ack: true,
        ..TcpFlags::NONE
    };

    /// RST flag (connection reset)
    pub const RST: TcpFlags = TcpFlags {
        rst: true,
        ..TcpFlags::NONE
    };

    pub fn new() -> Self {
        TcpFlags::NONE
    }

    /// Convert the eight CWR..FIN flags to the wire flags octet.
    ///
    /// NS is not part of this octet; it is packed into the data-offset
    /// octet by the header serializer.
    pub fn to_u8(self) -> u8 {
        let mut flags = 0u8;
        if self.fin {
            flags |= 0b0000_0001;
        }
        if self.syn {
            flags |= 0b0000_0010;
        }
        if self.rst {
            flags |= 0b0000_0100;
        }
        if self.psh {
            flags |= 0b0000_1000;
        }
        if self.ack {
            flags |= 0b0001_0000;
        }
        if self.urg {
            flags |= 0b0010_0000;
        }
        if self.ece {
            flags |= 0b0100_0000;
        }
        if self.cwr {
            flags |= 0b1000_0000;
        }
        flags
    }

    /// Parse the eight CWR..FIN flags from the wire flags octet (NS false).
    pub fn from_u8(value: u8) -> Self {
        TcpFlags {
            ns: false,
            fin: (value & 0b0000_0001) != 0,
            syn: (value & 0b0000_0010) != 0,
            rst: (value & 0b0000_0100) != 0,
            psh: (value & 0b0000_1000) != 0,
            ack: (value & 0b0001_0000) != 0,
            urg: (value & 0b0010_0000) != 0,
            ece: (value & 0b0100_0000) != 0,
            cwr: (value & 0b1000_0000) != 0,
        }
    }
}

impl Default for TcpFlags {
    fn default() -> Self {
        TcpFlags::NONE
    }
}

/// TCP segment
///
/// Constructed eagerly from an input buffer; every field is freely mutable
/// afterwards, and [`header_bytes`](TcpSegment::header_bytes) /
/// [`raw`](TcpSegment::raw) re-serialize the current field values on every
/// call.
#[derive(Debug, Clone)]
pub struct TcpSegment {
    /// Source port
    pub source_port: TcpPort,
    /// Destination port
    pub destination_port: TcpPort,
    /// Sequence number
    pub sequence_number: u32,
    /// Acknowledgment number
    pub acknowledgment_number: u32,
    /// Data offset in 32-bit words (minimum 5)
    pub data_offset: u8,
    /// Reserved bits (3 bits, should be 0)
    pub reserved: u8,
    /// Control flags
    pub flags: TcpFlags,
    /// Window size
    pub window_size: u16,
    /// Checksum
    pub checksum: u16,
    /// Urgent pointer
    pub urgent_pointer: u16,
    /// Options, kept as an opaque blob of `(data_offset - 5) * 4` bytes
    pub options: Vec<u8>,
    /// Payload data
    pub payload: Vec<u8>,
}

impl TcpSegment {
    /// Minimum TCP header size (without options)
    pub const MIN_HEADER_SIZE: usize = 20;

    /// Parse a TCP segment from a buffer starting at the TCP header.
    ///
    /// No protocol identifiers are checked at this layer; option sizes and
    /// the incoming checksum are taken at face value.
    pub fn parse(data: &[u8]) -> Result<Self> {
        if data.len() < Self::MIN_HEADER_SIZE {
            return Err(Error::Truncated {
                needed: Self::MIN_HEADER_SIZE,
                available: data.len(),
            });
        }

        let source_port = TcpPort::new(u16::from_be_bytes([data[0], data[1]]));
        let destination_port = TcpPort::new(u16::from_be_bytes([data[2], data[3]]));
        let sequence_number = bits::decode_be(&data[4..8]) as u32;
        let acknowledgment_number = bits::decode_be(&data[8..12]) as u32;

        // Data offset (4 bits) + reserved (3 bits) + NS flag (1 bit)
        let data_offset = bits::extract(data[12].into(), 0, 4, 8)? as u8;
        let reserved = bits::extract(data[12].into(), 4, 3, 8)? as u8;
        let ns = bits::extract(data[12].into(), 7, 1, 8)? != 0;

        let mut flags = TcpFlags::from_u8(data[13]);
        flags.ns = ns;

        let window_size = u16::from_be_bytes([data[14], data[15]]);
        let checksum = u16::from_be_bytes([data[16], data[17]]);
        let urgent_pointer = u16::from_be_bytes([data[18], data[19]]);

        let options_end = Self::MIN_HEADER_SIZE + 4 * (data_offset as usize).saturating_sub(5);
        if data.len() < options_end {
            return Err(Error::Truncated {
                needed: options_end,
                available: data.len(),
            });
        }
        let options = data[Self::MIN_HEADER_SIZE..options_end].to_vec();
        let payload = data[options_end..].to_vec();

        Ok(TcpSegment {
            source_port,
            destination_port,
            sequence_number,
            acknowledgment_number,
            data_offset,
            reserved,
            flags,
            window_size,
            checksum,
            urgent_pointer,
            options,
            payload,
        })
    }

    /// Serialize the header fields, options included, to the exact wire
    /// layout.
    pub fn header_bytes(&self) -> Vec<u8> {
        let mut buffer = BytesMut::with_capacity(Self::MIN_HEADER_SIZE + self.options.len());

        buffer.put_u16(self.source_port.to_u16());
        buffer.put_u16(self.destination_port.to_u16());
        buffer.put_u32(self.sequence_number);
        buffer.put_u32(self.acknowledgment_number);

        // Data offset (4 bits) + reserved (3 bits) + NS flag (1 bit)
        buffer.put_u8((self.data_offset << 4) | ((self.reserved & 0x07) << 1) | self.flags.ns as u8);

        buffer.put_u8(self.flags.to_u8());
        buffer.put_u16(self.window_size);
        buffer.put_u16(self.checksum);
        buffer.put_u16(self.urgent_pointer);
        buffer.put_slice(&self.options);

        buffer.to_vec()
    }

    /// Serialize the whole segment: header, options, payload.
    pub fn raw(&self) -> Vec<u8> {
        let mut out = self.header_bytes();
        out.extend_from_slice(&self.payload);
        out
    }

    /// Recompute the checksum over the pseudo-header and the serialized
    /// header.
    ///
    /// The segment payload is NOT folded into the sum. RFC 793 covers the
    /// full segment; this narrower coverage is exact for forged resets,
    /// whose payload is empty by the time it runs, and is kept as-is for
    /// everything else.
    pub fn recompute_checksum(&mut self, pseudo_header: &[u8; 12]) {
        self.checksum = 0;

        let header = self.header_bytes();
        let mut data = Vec::with_capacity(pseudo_header.len() + header.len());
        data.extend_from_slice(pseudo_header);
        data.extend_from_slice(&header);

        self.checksum = internet_checksum(&data);
    }

    /// Mutate this segment into a reset against its own connection.
    ///
    /// Clears every control flag, sets RST, transplants the given sequence
    /// number, zeroes the acknowledgment number, window size, and urgent
    /// pointer, and empties the payload. The checksum is stale afterwards;
    /// [`Ipv4Packet::forge_reset`](crate::ip::Ipv4Packet::forge_reset)
    /// runs the full recomputation sequence with pseudo-header context.
    pub fn forge_reset(&mut self, sequence: u32) {
        self.flags = TcpFlags::RST;
        self.sequence_number = sequence;
        self.acknowledgment_number = 0;
        self.window_size = 0;
        self.urgent_pointer = 0;
        self.payload.clear();
    }

    /// Serialized segment length in bytes: header, options, payload.
    pub fn len(&self) -> usize {
        Self::MIN_HEADER_SIZE + self.options.len() + self.payload.len()
    }

    /// Check if empty (never true; the header alone is 20 bytes)
    pub fn is_empty(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_segment_bytes() -> Vec<u8> {
        vec![
            0x30, 0x39, // Source port (12345)
            0x00, 0x50, // Dest port (80)
            0x00, 0x00, 0x03, 0xE8, // Sequence (1000)
            0x00, 0x00, 0x07, 0xD0, // Ack (2000)
            0x50, // Data offset (5), reserved 0, NS clear
            0x18, // Flags (PSH|ACK)
            0xFF, 0xFF, // Window (65535)
            0xAB, 0xCD, // Checksum (as captured)
            0x00, 0x00, // Urgent pointer
            0x01, 0x02, 0x03, 0x04, // Payload
        ]
    }

    #[test]
    fn test_tcp_port_constants() {
        assert_eq!(TcpPort::HTTP.0, 80);
        assert_eq!(TcpPort::HTTPS.0, 443);
        assert_eq!(TcpPort::SSH.0, 22);
    }

    #[test]
    fn test_tcp_flags_round_trip() {
        let flags = TcpFlags::SYN;
        assert!(flags.syn);
        assert!(!flags.ack);
        assert_eq!(flags.to_u8(), 0b0000_0010);

        let flags2 = TcpFlags::from_u8(flags.to_u8());
        assert_eq!(flags, flags2);

        assert_eq!(TcpFlags::SYN_ACK.to_u8(), 0b0001_0010);
        assert_eq!(TcpFlags::RST.to_u8(), 0b0000_0100);
    }

    #[test]
    fn test_parse_fields() {
        let segment = TcpSegment::parse(&sample_segment_bytes()).unwrap();

        assert_eq!(segment.source_port.0, 12345);
        assert_eq!(segment.destination_port.0, 80);
        assert_eq!(segment.sequence_number, 1000);
        assert_eq!(segment.acknowledgment_number, 2000);
        assert_eq!(segment.data_offset, 5);
        assert_eq!(segment.reserved, 0);
        assert!(segment.flags.psh);
        assert!(segment.flags.ack);
        assert!(!segment.flags.syn);
        assert!(!segment.flags.ns);
        assert_eq!(segment.window_size, 65535);
        assert_eq!(segment.checksum, 0xABCD);
        assert_eq!(segment.urgent_pointer, 0);
        assert!(segment.options.is_empty());
        assert_eq!(segment.payload, vec![0x01, 0x02, 0x03, 0x04]);
    }

    #[test]
    fn test_parse_ns_flag() {
        let mut data = sample_segment_bytes();
        data[12] = 0x51; // data offset 5, NS set
        let segment = TcpSegment::parse(&data).unwrap();
        assert!(segment.flags.ns);
        assert_eq!(segment.data_offset, 5);

        // NS survives re-serialization
        assert_eq!(segment.header_bytes()[12], 0x51);
    }

    #[test]
    fn test_parse_with_options() {
        let mut data = sample_segment_bytes();
        data[12] = 0x60; // data offset 6: one option word
        data.splice(20..20, [0x02, 0x04, 0x05, 0xB4]); // MSS option

        let segment = TcpSegment::parse(&data).unwrap();
        assert_eq!(segment.data_offset, 6);
        assert_eq!(segment.options, vec![0x02, 0x04, 0x05, 0xB4]);
        assert_eq!(segment.payload, vec![0x01, 0x02, 0x03, 0x04]);
    }

    #[test]
    fn test_parse_truncated() {
        let data = sample_segment_bytes();
        assert!(matches!(
            TcpSegment::parse(&data[..10]),
            Err(Error::Truncated { .. })
        ));

        // Declared header longer than the buffer
        let mut short = sample_segment_bytes()[..20].to_vec();
        short[12] = 0x70; // data offset 7 needs 28 bytes
        assert!(matches!(
            TcpSegment::parse(&short),
            Err(Error::Truncated { .. })
        ));
    }

    #[test]
    fn test_raw_round_trip() {
        let data = sample_segment_bytes();
        let segment = TcpSegment::parse(&data).unwrap();
        assert_eq!(segment.raw(), data);
        assert_eq!(segment.len(), data.len());
    }

    #[test]
    fn test_raw_round_trip_with_options() {
        let mut data = sample_segment_bytes();
        data[12] = 0x60;
        data.splice(20..20, [0x02, 0x04, 0x05, 0xB4]);

        let segment = TcpSegment::parse(&data).unwrap();
        assert_eq!(segment.raw(), data);
    }

    #[test]
    fn test_recompute_checksum_self_consistent() {
        let mut segment = TcpSegment::parse(&sample_segment_bytes()).unwrap();
        let pseudo = [
            192, 168, 1, 1, // source
            192, 168, 1, 2, // destination
            0, 6, // zero, protocol
            0x00, 0x18, // segment length (24)
        ];

        segment.recompute_checksum(&pseudo);
        assert_ne!(segment.checksum, 0);

        // Summing pseudo-header + header with the checksum in place gives 0
        let mut covered = pseudo.to_vec();
        covered.extend_from_slice(&segment.header_bytes());
        assert!(crate::checksum::validate_checksum(&covered));
    }

    #[test]
    fn test_forge_reset_fields() {
        let mut segment = TcpSegment::parse(&sample_segment_bytes()).unwrap();
        segment.forge_reset(12345);

        assert!(segment.flags.rst);
        assert!(!segment.flags.ns);
        assert!(!segment.flags.cwr);
        assert!(!segment.flags.ece);
        assert!(!segment.flags.urg);
        assert!(!segment.flags.ack);
        assert!(!segment.flags.psh);
        assert!(!segment.flags.syn);
        assert!(!segment.flags.fin);
        assert_eq!(segment.sequence_number, 12345);
        assert_eq!(segment.acknowledgment_number, 0);
        assert_eq!(segment.window_size, 0);
        assert_eq!(segment.urgent_pointer, 0);
        assert!(segment.payload.is_empty());
    }
}
