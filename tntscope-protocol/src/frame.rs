//! Packet framing for IPROTO.
//!
//! Packet layout after the greeting:
//!
//! ```text
//! +----------------+--------------+--------------+
//! | length prefix  | header (map) | body (map)   |
//! | 5 bytes, uint  | msgpack      | msgpack      |
//! +----------------+--------------+--------------+
//!                  |<------- length bytes ------>|
//! ```
//!
//! The prefix is a MessagePack unsigned integer (Tarantool always emits the
//! `0xce` + u32 form), so it goes through the value decoder rather than being
//! read as a fixed-width field.

use crate::error::ProtocolError;
use crate::value;
use crate::MAX_PACKET_SIZE;

/// Size of the length prefix in bytes.
pub const LENGTH_PREFIX_SIZE: usize = 5;

/// Result of checking whether a complete packet is available.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameDecision {
    /// A whole packet is present; the value is its total length including
    /// the prefix.
    Complete(usize),
    /// This many more bytes must arrive before the packet can be decoded.
    NeedMoreBytes(usize),
}

/// Decides whether `buf` starts with a complete packet.
///
/// Nothing beyond the length prefix is inspected. Call again with the same
/// start offset once more bytes are available.
pub fn read_frame(buf: &[u8]) -> Result<FrameDecision, ProtocolError> {
    if buf.len() < LENGTH_PREFIX_SIZE {
        return Ok(FrameDecision::NeedMoreBytes(LENGTH_PREFIX_SIZE - buf.len()));
    }

    let declared = read_length(&buf[..LENGTH_PREFIX_SIZE])?;
    if declared > MAX_PACKET_SIZE {
        return Err(ProtocolError::PacketTooLarge {
            size: declared,
            max: MAX_PACKET_SIZE,
        });
    }

    let required = LENGTH_PREFIX_SIZE + declared as usize;
    if buf.len() >= required {
        Ok(FrameDecision::Complete(required))
    } else {
        let needed = required - buf.len();
        tracing::trace!(required, available = buf.len(), needed, "partial packet");
        Ok(FrameDecision::NeedMoreBytes(needed))
    }
}

/// Decodes the declared payload length from a length prefix.
pub fn read_length(prefix: &[u8]) -> Result<u64, ProtocolError> {
    let (length, consumed) =
        value::decode(prefix).map_err(|e| ProtocolError::MalformedLength(e.to_string()))?;

    let declared = length.as_u64().ok_or_else(|| {
        ProtocolError::MalformedLength(format!("expected unsigned integer, got {}", length))
    })?;

    if consumed != LENGTH_PREFIX_SIZE {
        tracing::trace!(consumed, "length prefix uses a short encoding");
    }

    Ok(declared)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::frame_raw;
    use proptest::prelude::*;

    #[test]
    fn test_complete_frame() {
        let buf = frame_raw(&[0x80, 0x80]);
        assert_eq!(read_frame(&buf).unwrap(), FrameDecision::Complete(7));
    }

    #[test]
    fn test_trailing_bytes_ignored() {
        let mut buf = frame_raw(&[0x80, 0x80]);
        buf.extend_from_slice(&[0xce, 0, 0]);
        assert_eq!(read_frame(&buf).unwrap(), FrameDecision::Complete(7));
    }

    #[test]
    fn test_incomplete_frame() {
        let buf = frame_raw(&[0u8; 10]);
        assert_eq!(
            read_frame(&buf[..8]).unwrap(),
            FrameDecision::NeedMoreBytes(7)
        );
    }

    #[test]
    fn test_short_prefix() {
        assert_eq!(read_frame(&[]).unwrap(), FrameDecision::NeedMoreBytes(5));
        assert_eq!(
            read_frame(&[0xce, 0x00]).unwrap(),
            FrameDecision::NeedMoreBytes(3)
        );
    }

    #[test]
    fn test_malformed_prefix() {
        // fixstr "abcd" is not an unsigned integer
        let buf = [0xa4, b'a', b'b', b'c', b'd', 0x00];
        assert!(matches!(
            read_frame(&buf),
            Err(ProtocolError::MalformedLength(_))
        ));

        // negative fixint
        let buf = [0xff, 0, 0, 0, 0];
        assert!(matches!(
            read_frame(&buf),
            Err(ProtocolError::MalformedLength(_))
        ));

        // reserved marker byte
        let buf = [0xc1, 0, 0, 0, 0];
        assert!(matches!(
            read_frame(&buf),
            Err(ProtocolError::MalformedLength(_))
        ));
    }

    #[test]
    fn test_packet_too_large() {
        let buf = [0xce, 0xff, 0xff, 0xff, 0xff];
        assert!(matches!(
            read_frame(&buf),
            Err(ProtocolError::PacketTooLarge { .. })
        ));
    }

    #[test]
    fn test_short_encoding_prefix() {
        // positive fixint 3 followed by filler: total is still 5 + 3
        let buf = [0x03, 0, 0, 0, 0, 1, 2, 3];
        assert_eq!(read_frame(&buf).unwrap(), FrameDecision::Complete(8));
    }

    proptest! {
        #[test]
        fn prop_short_span_needs_exact_remainder(
            declared in 0u32..100_000,
            cut in 5usize..100_005,
        ) {
            let total = declared as usize + LENGTH_PREFIX_SIZE;
            prop_assume!(cut < total);

            let mut buf = vec![0xce];
            buf.extend_from_slice(&declared.to_be_bytes());
            buf.resize(cut, 0);

            let decision = read_frame(&buf).unwrap();
            prop_assert_eq!(decision, FrameDecision::NeedMoreBytes(total - cut));
            prop_assert!(total - cut > 0);
        }

        #[test]
        fn prop_complete_span_consumes_declared(
            declared in 0u32..4096,
            extra in 0usize..64,
        ) {
            let mut buf = vec![0xce];
            buf.extend_from_slice(&declared.to_be_bytes());
            buf.resize(declared as usize + LENGTH_PREFIX_SIZE + extra, 0);

            let decision = read_frame(&buf).unwrap();
            prop_assert_eq!(
                decision,
                FrameDecision::Complete(declared as usize + LENGTH_PREFIX_SIZE)
            );
        }
    }
}
