//! Recognition of the server greeting.
//!
//! The greeting is the first thing a Tarantool server sends and is not
//! length-prefixed:
//!
//! ```text
//! +---------------------------+----------------+-----------+
//! | version line              | salt (base64)  | reserved  |
//! | bytes 0..64               | bytes 64..108  | 108..128  |
//! +---------------------------+----------------+-----------+
//! ```
//!
//! Recognition is purely structural: any span starting with `Tarantool` is a
//! greeting.

use bytes::Bytes;

/// Total greeting size in bytes.
pub const GREETING_SIZE: usize = 128;

/// Marker at the very start of a greeting.
pub const GREETING_MARKER: &[u8; 9] = b"Tarantool";

/// Length of the version line.
pub const GREETING_VERSION_SIZE: usize = 64;

/// Offset of the salt.
pub const GREETING_SALT_OFFSET: usize = 64;

/// Length of the salt.
pub const GREETING_SALT_SIZE: usize = 44;

/// Fields extracted from a greeting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GreetingInfo {
    /// Version line with padding and line terminator removed.
    pub version: String,
    /// Raw salt bytes.
    pub salt: Bytes,
}

impl GreetingInfo {
    /// Salt as text (it is base64 on the wire), padding removed.
    pub fn salt_text(&self) -> String {
        trim_padding(&String::from_utf8_lossy(&self.salt)).to_string()
    }
}

/// Outcome of checking a span for a greeting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GreetingMatch {
    /// The span does not start with a greeting.
    NotGreeting,
    /// The span starts like a greeting but is short by this many bytes.
    Partial(usize),
    /// A whole greeting is present.
    Complete(GreetingInfo),
}

/// Checks whether `buf` starts with a greeting.
pub fn recognize(buf: &[u8]) -> GreetingMatch {
    if buf.len() < GREETING_MARKER.len() {
        if !buf.is_empty() && GREETING_MARKER.starts_with(buf) {
            return GreetingMatch::Partial(GREETING_SIZE - buf.len());
        }
        return GreetingMatch::NotGreeting;
    }

    if &buf[..GREETING_MARKER.len()] != GREETING_MARKER {
        return GreetingMatch::NotGreeting;
    }

    if buf.len() < GREETING_SIZE {
        return GreetingMatch::Partial(GREETING_SIZE - buf.len());
    }

    let version = String::from_utf8_lossy(&buf[..GREETING_VERSION_SIZE]);
    let salt = &buf[GREETING_SALT_OFFSET..GREETING_SALT_OFFSET + GREETING_SALT_SIZE];

    GreetingMatch::Complete(GreetingInfo {
        version: trim_padding(&version).to_string(),
        salt: Bytes::copy_from_slice(salt),
    })
}

fn trim_padding(text: &str) -> &str {
    text.trim_end_matches(|c: char| c == '\0' || c.is_ascii_whitespace())
}
