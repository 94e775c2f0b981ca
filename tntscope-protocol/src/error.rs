//! Protocol error types.
//!
//! [`crate::dissect`] only fails on bytes it cannot decode. Incomplete
//! input, unknown commands, unmodeled bodies and headers without a usable
//! `TYPE` are ordinary outcomes; the header variants here are reported by
//! [`crate::PacketHeader::from_value`] alone.

use thiserror::Error;

/// Fatal decoding errors for a byte stream.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("malformed length prefix: {0}")]
    MalformedLength(String),

    #[error("packet too large: {size} bytes (max {max})")]
    PacketTooLarge { size: u64, max: u64 },

    #[error("malformed {what} at offset {offset}: {reason}")]
    MalformedValue {
        what: &'static str,
        offset: usize,
        reason: String,
    },

    #[error("invalid packet header: {0}")]
    InvalidHeader(String),

    #[error("missing required header field: {0}")]
    MissingField(&'static str),
}
