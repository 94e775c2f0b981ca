//! Command registry.
//!
//! Maps a header `TYPE` code to a display name, a request/response flag and
//! the body interpreter for that command shape. The table is constant for
//! the lifetime of the process.

use crate::body::{self, BodyInterpreter};
use crate::iproto::codes;
use serde::Serialize;
use std::fmt;

/// Kind of packet named by a command code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CommandKind {
    Ok,
    Select,
    Insert,
    Replace,
    Update,
    Delete,
    Call,
    Auth,
    Eval,
    Upsert,
    Ping,
    /// Any code with the error bit set.
    Error,
    /// Codes missing from the table.
    Unknown,
}

/// Static description of a command.
pub struct CommandDescriptor {
    pub kind: CommandKind,
    pub name: &'static str,
    pub is_response: bool,
    pub summary: &'static str,
    pub interpreter: BodyInterpreter,
}

impl fmt::Debug for CommandDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandDescriptor")
            .field("kind", &self.kind)
            .field("name", &self.name)
            .field("is_response", &self.is_response)
            .finish_non_exhaustive()
    }
}

const fn entry(
    kind: CommandKind,
    name: &'static str,
    is_response: bool,
    summary: &'static str,
    interpreter: BodyInterpreter,
) -> CommandDescriptor {
    CommandDescriptor {
        kind,
        name,
        is_response,
        summary,
        interpreter,
    }
}

/// Indexed by `CommandKind as usize`.
static REGISTRY: [CommandDescriptor; 13] = [
    entry(CommandKind::Ok, "OK", true, "Response.", body::response),
    entry(CommandKind::Select, "select", false, "Select request.", body::select),
    entry(CommandKind::Insert, "insert", false, "Insert request.", body::insert_replace),
    entry(CommandKind::Replace, "replace", false, "Replace request.", body::insert_replace),
    entry(CommandKind::Update, "update", false, "Update request.", body::not_implemented),
    entry(CommandKind::Delete, "delete", false, "Delete request.", body::delete),
    entry(CommandKind::Call, "call", false, "Call request.", body::call),
    entry(CommandKind::Auth, "auth", false, "Auth request.", body::not_implemented),
    entry(CommandKind::Eval, "eval", false, "Eval request.", body::eval),
    entry(CommandKind::Upsert, "upsert", false, "Upsert request.", body::not_implemented),
    entry(CommandKind::Ping, "ping", false, "Ping request.", body::not_implemented),
    entry(CommandKind::Error, "ERROR", true, "Error response.", body::error),
    entry(CommandKind::Unknown, "UNKNOWN", false, "Unknown request.", body::not_implemented),
];

impl CommandKind {
    /// Classifies a command code.
    ///
    /// The error range is checked before the table: error responses carry
    /// the failed command's code in the low bits, which is not meaningful
    /// here.
    pub fn from_code(code: u64) -> Self {
        if code >= codes::TYPE_ERROR {
            return CommandKind::Error;
        }

        match code {
            codes::OK => CommandKind::Ok,
            codes::SELECT => CommandKind::Select,
            codes::INSERT => CommandKind::Insert,
            codes::REPLACE => CommandKind::Replace,
            codes::UPDATE => CommandKind::Update,
            codes::DELETE => CommandKind::Delete,
            codes::CALL => CommandKind::Call,
            codes::AUTH => CommandKind::Auth,
            codes::EVAL => CommandKind::Eval,
            codes::UPSERT => CommandKind::Upsert,
            codes::PING => CommandKind::Ping,
            _ => CommandKind::Unknown,
        }
    }

    pub fn descriptor(self) -> &'static CommandDescriptor {
        &REGISTRY[self as usize]
    }

    /// One-line summary for a packet of this kind.
    pub fn summary(self) -> &'static str {
        self.descriptor().summary
    }
}

/// Looks up the descriptor for a command code.
pub fn lookup(code: u64) -> &'static CommandDescriptor {
    CommandKind::from_code(code).descriptor()
}
