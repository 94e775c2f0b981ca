//! MessagePack value decoding.
//!
//! Thin adapter over `rmpv`: every decode reports how many bytes it
//! consumed so the caller can locate the next value.

use std::borrow::Cow;

pub use rmpv::Value;

/// Deepest nesting of arrays and maps accepted in a header or body.
///
/// IPROTO bodies nest a handful of levels; anything far past that is
/// treated as a malformed value instead of recursing further.
pub const MAX_VALUE_DEPTH: usize = 128;

/// Decodes one value from the start of `bytes`.
///
/// Returns the value and the number of bytes it occupied.
pub fn decode(bytes: &[u8]) -> Result<(Value, usize), rmpv::decode::Error> {
    let mut cursor = bytes;
    let value = rmpv::decode::read_value_with_max_depth(&mut cursor, MAX_VALUE_DEPTH)?;
    Ok((value, bytes.len() - cursor.len()))
}

/// Looks up an integer key in a map value.
///
/// Returns `None` if `value` is not a map or the key is absent.
pub fn map_get(value: &Value, key: u64) -> Option<&Value> {
    match value {
        Value::Map(entries) => entries
            .iter()
            .find(|(k, _)| k.as_u64() == Some(key))
            .map(|(_, v)| v),
        _ => None,
    }
}

/// Returns the text of a string value, replacing invalid UTF-8.
pub fn as_text(value: &Value) -> Option<Cow<'_, str>> {
    match value {
        Value::String(s) => Some(match s.as_str() {
            Some(text) => Cow::Borrowed(text),
            None => String::from_utf8_lossy(s.as_bytes()),
        }),
        _ => None,
    }
}
