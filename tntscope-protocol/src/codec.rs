//! Buffered decoding of a byte stream delivered in chunks.

use crate::dissect::{dissect, Dissection, Packet};
use crate::error::ProtocolError;
use crate::format::FormatOptions;
use bytes::{Buf, Bytes, BytesMut};

/// Accumulates stream chunks and yields decoded packets in arrival order.
///
/// Undecoded bytes stay buffered until a whole packet is present. After an
/// error the buffer is left untouched at the offending packet.
pub struct StreamDecoder {
    buffer: BytesMut,
    options: FormatOptions,
    needed: usize,
    position: u64,
}

impl StreamDecoder {
    pub fn new() -> Self {
        Self::with_options(FormatOptions::default())
    }

    pub fn with_options(options: FormatOptions) -> Self {
        Self {
            buffer: BytesMut::with_capacity(8192),
            options,
            needed: 0,
            position: 0,
        }
    }

    /// Appends data to the internal buffer.
    pub fn extend(&mut self, data: &[u8]) {
        self.buffer.extend_from_slice(data);
    }

    /// Appends bytes to the internal buffer.
    pub fn extend_bytes(&mut self, data: Bytes) {
        self.buffer.extend_from_slice(&data);
    }

    /// Attempts to decode the next packet from the buffer.
    ///
    /// Returns `Ok(None)` when more bytes are needed; [`needed`](Self::needed)
    /// then reports how many.
    pub fn next_packet(&mut self) -> Result<Option<Packet>, ProtocolError> {
        match dissect(&self.buffer, &self.options)? {
            Dissection::Packet(packet) => {
                self.buffer.advance(packet.consumed);
                self.position += packet.consumed as u64;
                self.needed = 0;
                Ok(Some(packet))
            }
            Dissection::NeedMoreBytes(needed) => {
                self.needed = needed;
                Ok(None)
            }
        }
    }

    /// Bytes requested by the last reassembly request, 0 if none is pending.
    pub fn needed(&self) -> usize {
        self.needed
    }

    /// Returns the number of bytes currently buffered.
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    /// Stream offset of the first buffered byte.
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Clears the internal buffer.
    pub fn clear(&mut self) {
        self.buffer.clear();
        self.needed = 0;
    }
}

impl Default for StreamDecoder {
    fn default() -> Self {
        Self::new()
    }
}
