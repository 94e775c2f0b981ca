//! Packet dispatch.
//!
//! [`dissect`] is called once per delivery of bytes, always with the span
//! starting at the first undecoded byte. It returns one packet, a request for
//! more bytes, or an error if the stream can no longer be framed. No state is
//! kept between calls.

use crate::body::Line;
use crate::command::{self, CommandKind};
use crate::error::ProtocolError;
use crate::format::{FormatOptions, ValueFormatter};
use crate::frame::{self, FrameDecision, LENGTH_PREFIX_SIZE};
use crate::greeting::{
    self, GreetingInfo, GreetingMatch, GREETING_SALT_OFFSET, GREETING_SALT_SIZE, GREETING_SIZE,
    GREETING_VERSION_SIZE,
};
use crate::iproto::keys;
use crate::value::{self, map_get, Value};
use serde::Serialize;
use std::ops::Range;

/// Body text of a packet whose header has no usable `TYPE`.
pub const MALFORMED_BODY: &str = "(body not decoded)";

/// Classification of a decoded packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PacketKind {
    Greeting,
    Request,
    Response,
}

/// A described byte range within a packet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Annotation {
    pub range: Range<usize>,
    pub text: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Annotation>,
}

impl Annotation {
    pub fn new(range: Range<usize>, text: impl Into<String>) -> Self {
        Self {
            range,
            text: text.into(),
            children: Vec::new(),
        }
    }

    pub fn with_children(mut self, children: Vec<Annotation>) -> Self {
        self.children = children;
        self
    }
}

/// Header fields of a regular packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PacketHeader {
    /// Command code (`TYPE`).
    pub code: u64,
    /// Correlation id (`SYNC`), if present.
    pub sync: Option<u64>,
}

impl PacketHeader {
    /// Extracts the header fields from a decoded header value.
    pub fn from_value(header: &Value) -> Result<Self, ProtocolError> {
        if !header.is_map() {
            return Err(ProtocolError::InvalidHeader(format!(
                "expected map, got {}",
                header
            )));
        }

        let code = map_get(header, keys::TYPE).ok_or(ProtocolError::MissingField("TYPE"))?;
        let code = code.as_u64().ok_or_else(|| {
            ProtocolError::InvalidHeader(format!("TYPE is not an unsigned integer: {}", code))
        })?;

        let sync = map_get(header, keys::SYNC).and_then(Value::as_u64);

        Ok(Self { code, sync })
    }

    /// Sync value for display; a missing `SYNC` shows the key's own code.
    pub fn display_sync(&self) -> u64 {
        self.sync.unwrap_or(keys::SYNC)
    }
}

/// One decoded packet.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Packet {
    pub kind: PacketKind,
    /// Command for requests and responses; `None` for the greeting.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command: Option<CommandKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub header: Option<PacketHeader>,
    #[serde(skip)]
    pub greeting: Option<GreetingInfo>,
    /// Total bytes this packet occupies in the stream.
    pub consumed: usize,
    /// One-line summary, e.g. `Select request.`.
    pub summary: &'static str,
    pub annotations: Vec<Annotation>,
}

impl Packet {
    /// Pushes this packet's summary and annotations into a sink.
    pub fn emit<S: AnnotationSink + ?Sized>(&self, sink: &mut S) {
        sink.summary(self.summary);
        for annotation in &self.annotations {
            emit_annotation(sink, annotation, 0);
        }
    }

    /// All annotation texts, depth-first.
    pub fn lines(&self) -> Vec<&str> {
        fn walk<'a>(annotations: &'a [Annotation], out: &mut Vec<&'a str>) {
            for annotation in annotations {
                out.push(&annotation.text);
                walk(&annotation.children, out);
            }
        }

        let mut out = Vec::new();
        walk(&self.annotations, &mut out);
        out
    }
}

fn emit_annotation<S: AnnotationSink + ?Sized>(sink: &mut S, annotation: &Annotation, depth: usize) {
    sink.annotate(depth, annotation.range.clone(), &annotation.text);
    for child in &annotation.children {
        emit_annotation(sink, child, depth + 1);
    }
}

/// Result of one dispatcher invocation.
#[derive(Debug, Clone, PartialEq)]
pub enum Dissection {
    Packet(Packet),
    /// Re-invoke from the same offset once this many more bytes are available.
    NeedMoreBytes(usize),
}

/// Receiver for dissector output.
pub trait AnnotationSink {
    /// A described byte range, relative to the start of the packet.
    fn annotate(&mut self, depth: usize, range: Range<usize>, text: &str);

    /// The packet is incomplete; `additional` more bytes are needed.
    fn need_more(&mut self, additional: usize);

    /// One-line summary of the packet.
    fn summary(&mut self, text: &str);
}

/// Decodes the packet at the start of `buf`.
pub fn dissect(buf: &[u8], options: &FormatOptions) -> Result<Dissection, ProtocolError> {
    match greeting::recognize(buf) {
        GreetingMatch::Complete(info) => return Ok(Dissection::Packet(greeting_packet(info))),
        GreetingMatch::Partial(needed) => return Ok(Dissection::NeedMoreBytes(needed)),
        GreetingMatch::NotGreeting => {}
    }

    let total = match frame::read_frame(buf)? {
        FrameDecision::Complete(total) => total,
        FrameDecision::NeedMoreBytes(needed) => return Ok(Dissection::NeedMoreBytes(needed)),
    };

    dissect_frame(&buf[..total], options).map(Dissection::Packet)
}

/// Decodes the packet at the start of `buf` and pushes the result into `sink`.
///
/// Returns the number of bytes consumed, or 0 after a reassembly request.
pub fn dissect_into<S: AnnotationSink + ?Sized>(
    buf: &[u8],
    options: &FormatOptions,
    sink: &mut S,
) -> Result<usize, ProtocolError> {
    match dissect(buf, options)? {
        Dissection::Packet(packet) => {
            packet.emit(sink);
            Ok(packet.consumed)
        }
        Dissection::NeedMoreBytes(needed) => {
            sink.need_more(needed);
            Ok(0)
        }
    }
}

fn greeting_packet(info: GreetingInfo) -> Packet {
    let salt_end = GREETING_SALT_OFFSET + GREETING_SALT_SIZE;
    let annotations = vec![
        Annotation::new(0..GREETING_VERSION_SIZE, format!("version: {}", info.version)),
        Annotation::new(GREETING_SALT_OFFSET..salt_end, format!("salt: {}", info.salt_text())),
    ];

    tracing::debug!(version = %info.version, "greeting");

    Packet {
        kind: PacketKind::Greeting,
        command: None,
        header: None,
        greeting: Some(info),
        consumed: GREETING_SIZE,
        summary: "Greeting packet.",
        annotations,
    }
}

/// Decodes a complete frame; `frame` is exactly one packet long.
fn dissect_frame(frame: &[u8], options: &FormatOptions) -> Result<Packet, ProtocolError> {
    let header_start = LENGTH_PREFIX_SIZE;
    let (header_value, header_len) =
        value::decode(&frame[header_start..]).map_err(|e| ProtocolError::MalformedValue {
            what: "header",
            offset: header_start,
            reason: e.to_string(),
        })?;
    let body_start = header_start + header_len;
    let header = match PacketHeader::from_value(&header_value) {
        Ok(header) => header,
        // the frame length is known, so the stream stays in sync
        Err(e) => return Ok(malformed_header_packet(frame, body_start, &e)),
    };

    let body = if body_start == frame.len() {
        Value::Map(Vec::new())
    } else {
        let (body, body_len) =
            value::decode(&frame[body_start..]).map_err(|e| ProtocolError::MalformedValue {
                what: "body",
                offset: body_start,
                reason: e.to_string(),
            })?;
        if body_start + body_len < frame.len() {
            tracing::debug!(
                trailing = frame.len() - body_start - body_len,
                "ignoring bytes after packet body"
            );
        }
        body
    };
    if !body.is_map() {
        tracing::debug!(code = header.code, "packet body is not a map");
    }

    let descriptor = command::lookup(header.code);
    tracing::debug!(
        code = header.code,
        sync = ?header.sync,
        command = descriptor.name,
        len = frame.len(),
        "dispatching packet"
    );

    let header_line = format!(
        "{}code: 0x{:02x} ({}), sync: 0x{:04x}",
        if descriptor.is_response { "response " } else { "" },
        header.code,
        descriptor.name,
        header.display_sync(),
    );

    let body_range = body_start..frame.len();
    let formatter = ValueFormatter::new(*options);
    let mut annotations = vec![Annotation::new(header_start..body_start, header_line)];
    annotations.extend(
        (descriptor.interpreter)(&body, &formatter)
            .into_iter()
            .map(|line| line_annotation(line, &body_range)),
    );

    Ok(Packet {
        kind: if descriptor.is_response {
            PacketKind::Response
        } else {
            PacketKind::Request
        },
        command: Some(descriptor.kind),
        header: Some(header),
        greeting: None,
        consumed: frame.len(),
        summary: descriptor.summary,
        annotations,
    })
}

fn malformed_header_packet(frame: &[u8], body_start: usize, error: &ProtocolError) -> Packet {
    tracing::warn!(len = frame.len(), "skipping packet: {}", error);

    let mut annotations = vec![Annotation::new(
        LENGTH_PREFIX_SIZE..body_start,
        format!("malformed header: {}", error),
    )];
    if body_start < frame.len() {
        annotations.push(Annotation::new(body_start..frame.len(), MALFORMED_BODY));
    }

    Packet {
        kind: PacketKind::Request,
        command: Some(CommandKind::Unknown),
        header: None,
        greeting: None,
        consumed: frame.len(),
        summary: "Malformed packet.",
        annotations,
    }
}

fn line_annotation(line: Line, range: &Range<usize>) -> Annotation {
    match line {
        Line::Text(text) => Annotation::new(range.clone(), text),
        Line::Group { label, items } => Annotation::new(range.clone(), label).with_children(
            items
                .into_iter()
                .map(|item| Annotation::new(range.clone(), item))
                .collect(),
        ),
    }
}
