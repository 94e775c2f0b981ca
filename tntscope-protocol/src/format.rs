//! Recursive rendering of decoded values for annotations.
//!
//! Rules per value shape:
//!
//! ```text
//! integer, float     literal numeral            512, 1.5
//! string             double-quoted, verbatim    "abc"
//! array              elements, comma-joined     1, "a", 3
//! map                braced entries             {1, 2, name = "x"}
//! nil / boolean      keyword                    nil, true
//! binary             lowercase hex              deadbeef
//! extension          type and hex payload       ext(1, 0a0b)
//! ```
//!
//! A map entry whose integer key equals its 1-based position renders as a
//! bare value; every other entry renders as `key = value`.

use crate::value::{as_text, Value};

/// Formatter settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormatOptions {
    /// Nesting depth past which composite values render as `...`.
    pub max_depth: usize,
}

impl FormatOptions {
    pub const DEFAULT_MAX_DEPTH: usize = 32;

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }
}

impl Default for FormatOptions {
    fn default() -> Self {
        Self {
            max_depth: Self::DEFAULT_MAX_DEPTH,
        }
    }
}

/// Renders [`Value`]s into display strings.
#[derive(Debug, Clone, Copy, Default)]
pub struct ValueFormatter {
    options: FormatOptions,
}

impl ValueFormatter {
    pub fn new(options: FormatOptions) -> Self {
        Self { options }
    }

    /// Formats a single value.
    pub fn format(&self, value: &Value) -> String {
        let mut out = String::new();
        self.write_value(&mut out, value, 0);
        out
    }

    /// Formats each element and joins them with `", "`.
    pub fn join(&self, values: &[Value]) -> String {
        let mut out = String::new();
        self.write_elements(&mut out, values, 0);
        out
    }

    /// Formats the elements of an array value, or the value itself otherwise.
    pub fn join_value(&self, value: &Value) -> String {
        match value {
            Value::Array(items) => self.join(items),
            other => self.format(other),
        }
    }

    fn write_elements(&self, out: &mut String, values: &[Value], depth: usize) {
        for (i, item) in values.iter().enumerate() {
            if i > 0 {
                out.push_str(", ");
            }
            self.write_value(out, item, depth);
        }
    }

    fn write_value(&self, out: &mut String, value: &Value, depth: usize) {
        match value {
            Value::Nil => out.push_str("nil"),
            Value::Boolean(b) => out.push_str(if *b { "true" } else { "false" }),
            Value::Integer(n) => out.push_str(&n.to_string()),
            Value::F32(f) => out.push_str(&f.to_string()),
            Value::F64(f) => out.push_str(&f.to_string()),
            Value::String(_) => {
                out.push('"');
                if let Some(text) = as_text(value) {
                    out.push_str(&text);
                }
                out.push('"');
            }
            Value::Binary(bytes) => out.push_str(&hex::encode(bytes)),
            Value::Ext(kind, bytes) => {
                out.push_str(&format!("ext({}, {})", kind, hex::encode(bytes)));
            }
            Value::Array(items) => {
                if depth >= self.options.max_depth {
                    out.push_str("...");
                    return;
                }
                self.write_elements(out, items, depth + 1);
            }
            Value::Map(entries) => {
                if depth >= self.options.max_depth {
                    out.push_str("...");
                    return;
                }
                out.push('{');
                for (i, (key, item)) in entries.iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    if key.as_u64() != Some(i as u64 + 1) {
                        self.write_key(out, key, depth + 1);
                        out.push_str(" = ");
                    }
                    self.write_value(out, item, depth + 1);
                }
                out.push('}');
            }
        }
    }

    fn write_key(&self, out: &mut String, key: &Value, depth: usize) {
        match as_text(key) {
            Some(text) => out.push_str(&text),
            None => self.write_value(out, key, depth),
        }
    }
}
