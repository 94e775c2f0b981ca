//! # tntscope-protocol
//!
//! Passive decoder for the Tarantool binary protocol (IPROTO).
//!
//! This crate provides:
//! - Greeting recognition and length-prefixed framing with reassembly requests
//! - MessagePack value decoding and a recursive value formatter
//! - A static command registry with one body interpreter per command shape
//! - A packet dispatcher producing human-readable annotations
//!
//! The decoder only observes bytes. It never builds packets for the wire and
//! holds no state between calls.

pub mod body;
pub mod codec;
pub mod command;
pub mod dissect;
pub mod error;
pub mod format;
pub mod frame;
pub mod greeting;
pub mod iproto;
pub mod value;

#[cfg(test)]
mod testing;

pub use codec::StreamDecoder;
pub use command::{CommandDescriptor, CommandKind};
pub use dissect::{
    dissect, dissect_into, Annotation, AnnotationSink, Dissection, Packet, PacketHeader,
    PacketKind,
};
pub use error::ProtocolError;
pub use format::{FormatOptions, ValueFormatter};
pub use frame::{FrameDecision, LENGTH_PREFIX_SIZE};
pub use greeting::{GreetingInfo, GREETING_SIZE};

/// Maximum payload length accepted from a length prefix (1 GiB).
///
/// Anything larger is treated as a desynchronized stream rather than a
/// request to buffer that many bytes.
pub const MAX_PACKET_SIZE: u64 = 1024 * 1024 * 1024;
