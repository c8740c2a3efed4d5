//! Packet-level probing.
//!
//! The external probing tool is a black box: [`PacketProbe`] invokes it and
//! [`parse_packets`] normalizes its JSON into [`hlsaux_core::PacketRecord`]s.

mod packets;

pub use packets::{parse_packets, PacketProbe};
