//! Example: Forging a TCP reset from a captured frame
//!
//! This example demonstrates how to use the sever-packet crate to decode a
//! captured Ethernet/IPv4/TCP frame, forge a reset segment against the
//! observed connection, and re-serialize it for reinjection.
//!
//! Usage:
//!   cargo run --example forge_reset

use sever_packet::EthernetFrame;

fn main() -> sever_core::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    // A frame as it would come from a capture source: an HTTP data segment
    // from 192.168.1.1:12345 to 192.168.1.2:80
    let captured: Vec<u8> = vec![
        0xAA, 0xBB, 0xCC, 0xDD, 0xEE, 0xFF, // destination MAC
        0x00, 0x11, 0x22, 0x33, 0x44, 0x55, // source MAC
        0x08, 0x00, // ethertype: IPv4
        0x45, 0x00, 0x00, 0x30, 0x12, 0x34, 0x40, 0x00, 0x40, 0x06, 0xA5, 0x40, 0xC0, 0xA8, 0x01,
        0x01, 0xC0, 0xA8, 0x01, 0x02, // IPv4 header
        0x30, 0x39, 0x00, 0x50, 0x00, 0x00, 0x03, 0xE8, 0x00, 0x00, 0x07, 0xD0, 0x50, 0x18, 0xFF,
        0xFF, 0x9E, 0x1B, 0x00, 0x00, // TCP header
        0x47, 0x45, 0x54, 0x20, 0x2F, 0x20, 0x48, 0x54, // "GET / HT"
    ];

    let mut frame = EthernetFrame::parse(&captured)?;
    let segment = &frame.payload.payload;

    println!("Observed connection:");
    println!(
        "  {} ({}) port {} -> {} ({}) port {}",
        frame.payload.source,
        frame.source,
        segment.source_port.to_u16(),
        frame.payload.destination,
        frame.destination,
        segment.destination_port.to_u16(),
    );
    println!("  Sequence: {}", segment.sequence_number);
    println!("  Payload: {} bytes", segment.payload.len());
    println!();

    // Reset with the sequence number advanced past the observed payload
    let reset_sequence = segment.sequence_number + segment.payload.len() as u32;
    frame.forge_reset(reset_sequence);

    let wire = frame.raw();

    println!("Forged reset ({} bytes):", wire.len());
    for chunk in wire.chunks(16) {
        let hex: Vec<String> = chunk.iter().map(|b| format!("{:02x}", b)).collect();
        println!("  {}", hex.join(" "));
    }
    println!();
    println!("TCP flags byte: 0x{:02x}", wire[14 + 20 + 13]);
    println!("  RST set: {}", (wire[14 + 20 + 13] & 0x04) != 0);
    println!("Sequence number: {}", frame.payload.payload.sequence_number);

    Ok(())
}
