//! Structured remote commands.
//!
//! The core never composes SQL text. Each remote command kind has a builder
//! that produces a structured value; rendering it into the remote target's
//! command language is the executor implementation's concern.

use crate::requirement::normalize;
use crate::scope::Scope;

/// A single result cell from a generic remote query.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    Bytes(Vec<u8>),
    Null,
}

impl Value {
    /// Loose truthiness used for scalar flag queries, where different remote
    /// targets report booleans as bit or integer columns.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Bool(b) => *b,
            Value::Int(i) => *i != 0,
            Value::Str(s) => s == "1" || s.eq_ignore_ascii_case("true"),
            _ => false,
        }
    }
}

/// One row of a generic query result.
pub type Row = Vec<Value>;

/// Generic query command kinds served by [`crate::executor::RemoteExecutor::execute`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteCommand {
    /// Does the connecting principal hold the elevated administrative role?
    /// Expected result: one row with one truthy/falsy cell.
    ElevatedRoleCheck,
}

/// Create (or replace) an installable library on the remote target.
#[derive(Debug, Clone, PartialEq)]
pub struct CreateLibrary {
    /// Normalized library name.
    pub name: String,
    pub scope: Scope,
    /// Zipped package content.
    pub content: Vec<u8>,
}

impl CreateLibrary {
    pub fn new(package_name: &str, scope: Scope, content: Vec<u8>) -> Self {
        CreateLibrary {
            name: normalize(package_name),
            scope,
            content,
        }
    }
}

/// Drop an installed library from the remote target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DropLibrary {
    /// Normalized library name.
    pub name: String,
    pub scope: Scope,
}

impl DropLibrary {
    pub fn new(package_name: &str, scope: Scope) -> Self {
        DropLibrary {
            name: normalize(package_name),
            scope,
        }
    }
}
