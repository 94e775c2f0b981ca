//! Rendering of decoded packets for the terminal.

use crate::config::OutputFormat;
use colored::Colorize;
use serde::Serialize;
use std::ops::Range;
use tntscope_protocol::{AnnotationSink, Packet, PacketKind};

/// JSON record for one packet.
#[derive(Serialize)]
struct Record<'a> {
    index: usize,
    offset: u64,
    #[serde(flatten)]
    packet: &'a Packet,
}

/// Turns packets into output text, numbering them in stream order.
pub struct Renderer {
    format: OutputFormat,
    index: usize,
    offset: u64,
    kind: Option<PacketKind>,
    out: String,
}

impl Renderer {
    pub fn new(format: OutputFormat) -> Self {
        Self {
            format,
            index: 0,
            offset: 0,
            kind: None,
            out: String::new(),
        }
    }

    /// Renders a packet found at stream offset `offset`.
    pub fn render(&mut self, offset: u64, packet: &Packet) -> String {
        self.index += 1;
        self.offset = offset;
        self.kind = Some(packet.kind);
        self.out.clear();

        match self.format {
            OutputFormat::Json => {
                let record = Record {
                    index: self.index,
                    offset,
                    packet,
                };
                match serde_json::to_string(&record) {
                    Ok(json) => self.out.push_str(&json),
                    Err(e) => tracing::error!("failed to serialize packet: {}", e),
                }
            }
            OutputFormat::Tree | OutputFormat::Summary => packet.emit(self),
        }

        std::mem::take(&mut self.out)
    }

    /// Reports that the packet starting at stream offset `offset` is still
    /// incomplete.
    pub fn need_more_at(&mut self, offset: u64, additional: usize) {
        self.offset = offset;
        self.need_more(additional);
    }
}

impl AnnotationSink for Renderer {
    fn annotate(&mut self, depth: usize, range: Range<usize>, text: &str) {
        if self.format != OutputFormat::Tree {
            return;
        }
        self.out.push('\n');
        self.out.push_str(&"  ".repeat(depth + 1));
        let start = self.offset + range.start as u64;
        let end = self.offset + range.end as u64;
        self.out
            .push_str(&format!("[{}..{}]", start, end).dimmed().to_string());
        self.out.push(' ');
        self.out.push_str(text);
    }

    fn need_more(&mut self, additional: usize) {
        tracing::debug!(
            offset = self.offset,
            additional,
            "waiting for more bytes"
        );
    }

    fn summary(&mut self, text: &str) {
        let label = match self.kind {
            Some(PacketKind::Greeting) => text.cyan(),
            Some(PacketKind::Request) => text.green(),
            Some(PacketKind::Response) => text.yellow(),
            None => text.normal(),
        };
        self.out.push_str(&format!(
            "#{} @{} {}",
            self.index,
            self.offset,
            label.bold()
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};
    use tntscope_protocol::{dissect, Dissection, FormatOptions};

    // PING request, sync 1, empty body
    const PING: [u8; 11] = [0xce, 0, 0, 0, 6, 0x82, 0x00, 0x40, 0x01, 0x01, 0x80];

    fn ping() -> Packet {
        match dissect(&PING, &FormatOptions::default()).unwrap() {
            Dissection::Packet(packet) => packet,
            other => panic!("expected packet, got {:?}", other),
        }
    }

    #[test]
    fn test_tree_output() {
        colored::control::set_override(false);
        let mut renderer = Renderer::new(OutputFormat::Tree);

        let text = renderer.render(128, &ping());
        assert_eq!(
            text,
            "#1 @128 Ping request.\n  [133..138] code: 0x40 (ping), sync: 0x0001\n  [138..139] parser not yet implemented"
        );
    }

    #[test]
    fn test_summary_output() {
        colored::control::set_override(false);
        let mut renderer = Renderer::new(OutputFormat::Summary);

        assert_eq!(renderer.render(0, &ping()), "#1 @0 Ping request.");
        assert_eq!(renderer.render(11, &ping()), "#2 @11 Ping request.");
    }

    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl std::io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_need_more_logs_pending_offset() {
        colored::control::set_override(false);
        let captured = Captured::default();
        let writer = captured.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_max_level(tracing::Level::DEBUG)
            .with_ansi(false)
            .finish();

        let mut renderer = Renderer::new(OutputFormat::Summary);
        tracing::subscriber::with_default(subscriber, || {
            renderer.render(0, &ping());
            renderer.need_more_at(11, 3);
        });

        let logs = String::from_utf8(captured.0.lock().unwrap().clone()).unwrap();
        assert!(logs.contains("offset=11"), "{}", logs);
        assert!(logs.contains("additional=3"), "{}", logs);

        // numbering and offsets of later packets are unaffected
        assert_eq!(renderer.render(11, &ping()), "#2 @11 Ping request.");
    }

    #[test]
    fn test_json_output() {
        let mut renderer = Renderer::new(OutputFormat::Json);
        let text = renderer.render(0, &ping());
        let json: serde_json::Value = serde_json::from_str(&text).unwrap();

        assert_eq!(json["index"], 1);
        assert_eq!(json["offset"], 0);
        assert_eq!(json["kind"], "request");
        assert_eq!(json["command"], "PING");
        assert_eq!(json["consumed"], 11);
        assert_eq!(
            json["annotations"][0]["text"],
            "code: 0x40 (ping), sync: 0x0001"
        );
    }
}
