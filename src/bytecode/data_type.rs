use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

/// Element kind of a container buffer, or the kind an instruction declares
/// for its operands.
///
/// `Any` only appears as a declared kind and accepts every stored kind.
/// `Void` is what an unallocated container reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DataType {
    Int64,
    Float64,
    Bool,
    String,
    Any,
    Void,
}

impl DataType {
    pub const ALL: [DataType; 6] = [
        DataType::Int64,
        DataType::Float64,
        DataType::Bool,
        DataType::String,
        DataType::Any,
        DataType::Void,
    ];

    pub fn name(self) -> &'static str {
        match self {
            DataType::Int64 => "INT64",
            DataType::Float64 => "FLOAT64",
            DataType::Bool => "BOOL",
            DataType::String => "STRING",
            DataType::Any => "ANY",
            DataType::Void => "VOID",
        }
    }

    pub fn is_numeric(self) -> bool {
        matches!(self, DataType::Int64 | DataType::Float64)
    }

    /// Kinds a buffer can actually be allocated with.
    pub fn is_storable(self) -> bool {
        matches!(
            self,
            DataType::Int64 | DataType::Float64 | DataType::Bool | DataType::String
        )
    }

    /// Whether a container holding `stored` satisfies this declared kind.
    pub fn accepts(self, stored: DataType) -> bool {
        match self {
            DataType::Any => stored.is_storable(),
            declared => declared == stored,
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DataType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DataType::ALL
            .into_iter()
            .find(|kind| kind.name() == s)
            .ok_or_else(|| format!("unknown data type `{}`", s))
    }
}
