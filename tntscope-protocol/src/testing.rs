//! Packet fixtures for unit tests.

use crate::iproto::keys;
use rmpv::Value;

pub fn encode(value: &Value) -> Vec<u8> {
    let mut buf = Vec::new();
    rmpv::encode::write_value(&mut buf, value).unwrap();
    buf
}

/// Builds an integer-keyed map.
pub fn map(entries: &[(u64, Value)]) -> Value {
    Value::Map(
        entries
            .iter()
            .map(|(k, v)| (Value::from(*k), v.clone()))
            .collect(),
    )
}

pub fn header(code: u64, sync: u64) -> Value {
    map(&[(keys::TYPE, Value::from(code)), (keys::SYNC, Value::from(sync))])
}

/// Frames already-encoded header and body bytes behind a `0xce` length prefix.
pub fn frame_raw(payload: &[u8]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(5 + payload.len());
    buf.push(0xce);
    buf.extend_from_slice(&(payload.len() as u32).to_be_bytes());
    buf.extend_from_slice(payload);
    buf
}

pub fn packet(header: &Value, body: &Value) -> Vec<u8> {
    let mut payload = encode(header);
    payload.extend(encode(body));
    frame_raw(&payload)
}

pub fn request(code: u64, sync: u64, body: &Value) -> Vec<u8> {
    packet(&header(code, sync), body)
}

/// A 128-byte greeting with space-padded version and salt lines.
pub fn greeting(version: &str, salt: &str) -> Vec<u8> {
    let mut buf = vec![b' '; 128];
    buf[..version.len()].copy_from_slice(version.as_bytes());
    buf[63] = b'\n';
    buf[64..64 + salt.len()].copy_from_slice(salt.as_bytes());
    buf[127] = b'\n';
    buf
}
