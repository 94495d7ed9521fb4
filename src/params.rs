//! Mapping between host-side parameter annotations and remote types.

use crate::error::{Error, Result};

/// Parameter and return types a remotely registered procedure can declare.
///
/// The set is closed: anything outside it is rejected when the procedure is
/// built, never at call time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamType {
    Str,
    Int,
    Float,
    Bool,
    Table,
}

impl ParamType {
    /// The remote type this parameter is declared as.
    ///
    /// Tables travel serialized, so they share the unbounded string type.
    pub fn to_remote_type(self) -> &'static str {
        match self {
            ParamType::Str | ParamType::Table => "nvarchar(MAX)",
            ParamType::Int => "int",
            ParamType::Float => "float",
            ParamType::Bool => "bit",
        }
    }

    /// Resolve a host-side type annotation.
    pub fn from_annotation(annotation: &str) -> Result<Self> {
        match annotation.trim() {
            "str" => Ok(ParamType::Str),
            "int" => Ok(ParamType::Int),
            "float" => Ok(ParamType::Float),
            "bool" => Ok(ParamType::Bool),
            "DataFrame" | "dataframe" => Ok(ParamType::Table),
            other => Err(Error::UnsupportedType(other.to_string())),
        }
    }
}
