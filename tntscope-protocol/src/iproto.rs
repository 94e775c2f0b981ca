//! IPROTO wire constants.

/// Header and body map keys.
pub mod keys {
    pub const TYPE: u64 = 0x00;
    pub const SYNC: u64 = 0x01;

    pub const SPACE_ID: u64 = 0x10;
    pub const INDEX_ID: u64 = 0x11;
    pub const LIMIT: u64 = 0x12;
    pub const OFFSET: u64 = 0x13;
    pub const ITERATOR: u64 = 0x14;

    pub const KEY: u64 = 0x20;
    pub const TUPLE: u64 = 0x21;
    pub const FUNCTION_NAME: u64 = 0x22;
    pub const USER_NAME: u64 = 0x23;
    pub const EXPRESSION: u64 = 0x27;

    pub const DATA: u64 = 0x30;
    pub const ERROR: u64 = 0x31;
}

/// Command codes carried in the header `TYPE` field.
pub mod codes {
    pub const OK: u64 = 0x00;
    pub const SELECT: u64 = 0x01;
    pub const INSERT: u64 = 0x02;
    pub const REPLACE: u64 = 0x03;
    pub const UPDATE: u64 = 0x04;
    pub const DELETE: u64 = 0x05;
    pub const CALL: u64 = 0x06;
    pub const AUTH: u64 = 0x07;
    pub const EVAL: u64 = 0x08;
    pub const UPSERT: u64 = 0x09;
    pub const PING: u64 = 0x40;

    /// Any code with this bit set is an error response.
    pub const TYPE_ERROR: u64 = 0x8000;
}
