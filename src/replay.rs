//! Chunked replay of a captured stream through the decoder.
//!
//! The reader plays the transport: it hands the decoder at most
//! `chunk_size` bytes at a time and keeps feeding until the decoder has a
//! whole packet.

use crate::render::Renderer;
use std::io::Write;
use thiserror::Error;
use tntscope_protocol::{ProtocolError, StreamDecoder};
use tokio::io::{AsyncRead, AsyncReadExt};

/// Replay errors.
#[derive(Debug, Error)]
pub enum ReplayError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{source} (stream offset {position}, {decoded} packet(s) decoded)")]
    Protocol {
        position: u64,
        decoded: usize,
        source: ProtocolError,
    },
}

/// Counters for a finished replay.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReplayStats {
    pub packets: usize,
    pub bytes: u64,
    pub reassembly_requests: usize,
    /// Bytes left over at end of input that never formed a whole packet.
    pub truncated: usize,
}

/// Reads `reader` to the end, writing one rendered entry per packet to `out`.
pub async fn replay<R, W>(
    mut reader: R,
    chunk_size: usize,
    decoder: &mut StreamDecoder,
    renderer: &mut Renderer,
    out: &mut W,
) -> Result<ReplayStats, ReplayError>
where
    R: AsyncRead + Unpin,
    W: Write,
{
    let mut stats = ReplayStats::default();
    let mut chunk = vec![0u8; chunk_size];

    loop {
        let n = reader.read(&mut chunk).await?;
        if n == 0 {
            break;
        }
        stats.bytes += n as u64;
        tracing::trace!("received {} bytes", n);
        decoder.extend(&chunk[..n]);

        loop {
            let position = decoder.position();
            match decoder.next_packet() {
                Ok(Some(packet)) => {
                    stats.packets += 1;
                    writeln!(out, "{}", renderer.render(position, &packet))?;
                }
                Ok(None) => {
                    if decoder.buffered() > 0 {
                        stats.reassembly_requests += 1;
                        renderer.need_more_at(decoder.position(), decoder.needed());
                    }
                    break;
                }
                Err(source) => {
                    return Err(ReplayError::Protocol {
                        position,
                        decoded: stats.packets,
                        source,
                    });
                }
            }
        }
    }

    stats.truncated = decoder.buffered();
    if stats.truncated > 0 {
        tracing::warn!(
            "input ended inside a packet: {} byte(s) buffered, {} more needed",
            stats.truncated,
            decoder.needed()
        );
    }

    out.flush()?;
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OutputFormat;
    use rmpv::Value;

    fn packet(code: u64, sync: u64, body: Value) -> Vec<u8> {
        let header = Value::Map(vec![
            (Value::from(0x00), Value::from(code)),
            (Value::from(0x01), Value::from(sync)),
        ]);
        let mut payload = Vec::new();
        rmpv::encode::write_value(&mut payload, &header).unwrap();
        rmpv::encode::write_value(&mut payload, &body).unwrap();

        let mut buf = vec![0xce];
        buf.extend_from_slice(&(payload.len() as u32).to_be_bytes());
        buf.extend(payload);
        buf
    }

    fn capture() -> Vec<u8> {
        let mut stream = vec![b' '; 128];
        stream[..14].copy_from_slice(b"Tarantool 1.10");
        stream.extend(packet(
            0x01,
            1,
            Value::Map(vec![
                (Value::from(0x10), Value::from(512)),
                (Value::from(0x11), Value::from(0)),
                (Value::from(0x20), Value::Array(vec![Value::from(1)])),
            ]),
        ));
        stream.extend(packet(
            0x8004,
            1,
            Value::Map(vec![(Value::from(0x31), Value::from("no such space"))]),
        ));
        stream
    }

    async fn run(input: &[u8], chunk_size: usize) -> (Result<ReplayStats, ReplayError>, String) {
        colored::control::set_override(false);
        let mut decoder = StreamDecoder::new();
        let mut renderer = Renderer::new(OutputFormat::Summary);
        let mut out = Vec::new();
        let result = replay(input, chunk_size, &mut decoder, &mut renderer, &mut out).await;
        (result, String::from_utf8(out).unwrap())
    }

    #[tokio::test]
    async fn test_replay_small_chunks() {
        let stream = capture();
        let (result, output) = run(&stream, 3).await;
        let stats = result.unwrap();

        assert_eq!(stats.packets, 3);
        assert_eq!(stats.bytes, stream.len() as u64);
        assert_eq!(stats.truncated, 0);
        assert!(stats.reassembly_requests > 0);

        let lines: Vec<_> = output.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "#1 @0 Greeting packet.");
        assert_eq!(lines[1], "#2 @128 Select request.");
        assert!(lines[2].starts_with("#3 @"));
        assert!(lines[2].ends_with("Error response."));
    }

    #[tokio::test]
    async fn test_replay_same_output_for_any_chunk_size() {
        let stream = capture();
        let (_, expected) = run(&stream, 4096).await;
        for chunk_size in [1, 5, 64] {
            let (_, output) = run(&stream, chunk_size).await;
            assert_eq!(output, expected, "chunk size {}", chunk_size);
        }
    }

    #[tokio::test]
    async fn test_replay_truncated_input() {
        let stream = capture();
        let (result, output) = run(&stream[..stream.len() - 4], 4096).await;
        let stats = result.unwrap();

        assert_eq!(stats.packets, 2);
        assert!(stats.truncated > 0);
        assert_eq!(stats.reassembly_requests, 1);
        assert_eq!(output.lines().count(), 2);
    }

    #[tokio::test]
    async fn test_replay_packet_boundary_is_not_reassembly() {
        let stream = capture();
        let (result, _) = run(&stream, 4096).await;
        let stats = result.unwrap();

        assert_eq!(stats.packets, 3);
        assert_eq!(stats.reassembly_requests, 0);
    }

    #[tokio::test]
    async fn test_replay_continues_after_bad_header() {
        let mut stream = capture();
        let header = Value::Map(vec![(Value::from(0x01), Value::from(5))]);
        let mut payload = Vec::new();
        rmpv::encode::write_value(&mut payload, &header).unwrap();
        stream.push(0xce);
        stream.extend_from_slice(&(payload.len() as u32).to_be_bytes());
        stream.extend(payload);
        stream.extend(packet(0x40, 6, Value::Map(vec![])));

        let (result, output) = run(&stream, 7).await;
        let stats = result.unwrap();

        assert_eq!(stats.packets, 5);
        let lines: Vec<_> = output.lines().collect();
        assert!(lines[3].ends_with("Malformed packet."));
        assert!(lines[4].ends_with("Ping request."));
    }

    #[tokio::test]
    async fn test_replay_malformed_stream() {
        let mut stream = capture();
        stream.extend_from_slice(&[0xa4, b'j', b'u', b'n', b'k']);
        let (result, output) = run(&stream, 4096).await;

        match result {
            Err(ReplayError::Protocol {
                position, decoded, ..
            }) => {
                assert_eq!(position, (stream.len() - 5) as u64);
                assert_eq!(decoded, 3);
            }
            other => panic!("expected protocol error, got {:?}", other),
        }
        assert_eq!(output.lines().count(), 3);
    }
}
