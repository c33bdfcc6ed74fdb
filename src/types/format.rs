//! Value formats understood by the codec.

use crate::error::CodecError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How a raw payload is rendered to, or parsed from, text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FormatSpec {
    /// Space separated uppercase byte pairs.
    #[default]
    Hex,
    /// Bytes taken as text.
    String,
    /// Comma separated signed 16-bit big-endian integers.
    Int16,
    /// Comma separated signed 32-bit big-endian integers.
    Int32,
    /// Comma separated IEEE-754 binary32 big-endian floats.
    Float32,
}

impl FormatSpec {
    /// Element width in bytes for numeric formats.
    pub const fn width(self) -> Option<usize> {
        match self {
            Self::Int16 => Some(2),
            Self::Int32 | Self::Float32 => Some(4),
            Self::Hex | Self::String => None,
        }
    }

    /// Canonical lowercase name.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Hex => "hex",
            Self::String => "string",
            Self::Int16 => "int16",
            Self::Int32 => "int32",
            Self::Float32 => "float32",
        }
    }
}

impl fmt::Display for FormatSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for FormatSpec {
    type Err = CodecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "hex" => Ok(Self::Hex),
            "string" | "str" => Ok(Self::String),
            "int16" => Ok(Self::Int16),
            "int32" => Ok(Self::Int32),
            "float32" | "float" => Ok(Self::Float32),
            _ => Err(CodecError::UnsupportedFormat(s.to_string())),
        }
    }
}
