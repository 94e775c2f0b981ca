//! Body interpreters, one per command shape.
//!
//! Each interpreter reads the keys it knows from the decoded body map and
//! describes them. Missing scalar keys render as `null`, missing key/tuple
//! lists as an empty list; nothing here can fail.

use crate::format::ValueFormatter;
use crate::iproto::keys;
use crate::value::{as_text, map_get, Value};

/// Placeholder for command shapes that are not modeled.
pub const NOT_IMPLEMENTED: &str = "parser not yet implemented";

/// Description of a response without data.
pub const EMPTY_RESPONSE: &str = "(empty response body)";

const NULL: &str = "null";

/// One line of an interpreter's output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Line {
    Text(String),
    /// A labeled group rendered one level deeper.
    Group {
        label: &'static str,
        items: Vec<String>,
    },
}

impl Line {
    pub fn text(text: impl Into<String>) -> Self {
        Line::Text(text.into())
    }
}

/// Signature shared by all interpreters.
pub type BodyInterpreter = fn(&Value, &ValueFormatter) -> Vec<Line>;

fn scalar(body: &Value, key: u64, f: &ValueFormatter) -> String {
    map_get(body, key)
        .map(|v| f.format(v))
        .unwrap_or_else(|| NULL.to_string())
}

fn list(body: &Value, key: u64, f: &ValueFormatter) -> String {
    map_get(body, key)
        .map(|v| f.join_value(v))
        .unwrap_or_default()
}

/// Names are shown unquoted.
fn name(body: &Value, key: u64, f: &ValueFormatter) -> String {
    match map_get(body, key) {
        Some(v) => as_text(v)
            .map(|text| text.into_owned())
            .unwrap_or_else(|| f.format(v)),
        None => NULL.to_string(),
    }
}

pub fn select(body: &Value, f: &ValueFormatter) -> Vec<Line> {
    vec![Line::Text(format!(
        "SELECT FROM space {} WHERE index({}) = ({}) LIMIT {} OFFSET {} ITERATOR {}",
        scalar(body, keys::SPACE_ID, f),
        scalar(body, keys::INDEX_ID, f),
        list(body, keys::KEY, f),
        scalar(body, keys::LIMIT, f),
        scalar(body, keys::OFFSET, f),
        scalar(body, keys::ITERATOR, f),
    ))]
}

pub fn insert_replace(body: &Value, f: &ValueFormatter) -> Vec<Line> {
    vec![
        Line::Text(format!("space_id: {}", scalar(body, keys::SPACE_ID, f))),
        Line::Group {
            label: "tuple",
            items: vec![list(body, keys::TUPLE, f)],
        },
    ]
}

pub fn delete(body: &Value, f: &ValueFormatter) -> Vec<Line> {
    vec![Line::Text(format!(
        "DELETE FROM space({}) WHERE index({}) = ({})",
        scalar(body, keys::SPACE_ID, f),
        scalar(body, keys::INDEX_ID, f),
        list(body, keys::KEY, f),
    ))]
}

pub fn call(body: &Value, f: &ValueFormatter) -> Vec<Line> {
    vec![Line::Text(format!(
        "{}({})",
        name(body, keys::FUNCTION_NAME, f),
        list(body, keys::TUPLE, f),
    ))]
}

pub fn eval(body: &Value, f: &ValueFormatter) -> Vec<Line> {
    vec![Line::Text(format!(
        "{}({})",
        name(body, keys::EXPRESSION, f),
        list(body, keys::TUPLE, f),
    ))]
}

pub fn response(body: &Value, f: &ValueFormatter) -> Vec<Line> {
    let items = match map_get(body, keys::DATA) {
        None => return vec![Line::text(EMPTY_RESPONSE)],
        Some(Value::Array(rows)) => rows.iter().map(|row| f.format(row)).collect(),
        Some(other) => vec![f.format(other)],
    };

    vec![Line::Group {
        label: "tuple",
        items,
    }]
}

pub fn error(body: &Value, f: &ValueFormatter) -> Vec<Line> {
    match map_get(body, keys::ERROR) {
        Some(message) => vec![Line::Text(
            as_text(message)
                .map(|text| text.into_owned())
                .unwrap_or_else(|| f.format(message)),
        )],
        None => vec![Line::text(EMPTY_RESPONSE)],
    }
}

pub fn not_implemented(_body: &Value, _f: &ValueFormatter) -> Vec<Line> {
    vec![Line::text(NOT_IMPLEMENTED)]
}
