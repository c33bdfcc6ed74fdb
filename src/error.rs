//! Error types for s7probe.
//!
//! Uses `thiserror` for ergonomic error definitions. Each layer has its own
//! error enum; `CliError` folds them together at the command boundary.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while converting between raw bytes and text.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    #[error("{format} requires a size that is a multiple of {width} bytes, got {len}")]
    Alignment {
        format: &'static str,
        width: usize,
        len: usize,
    },

    #[error("malformed input: {0}")]
    MalformedInput(String),

    #[error("unknown format {0:?}")]
    UnsupportedFormat(String),
}

/// Result type alias for codec operations.
pub type CodecResult<T> = Result<T, CodecError>;

/// Errors raised while resolving or validating an area descriptor.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AreaError {
    /// Unknown area name, or a recognized one (TM/CT) that has no read/write path.
    #[error("area {name:?} not supported: {reason}")]
    UnsupportedArea { name: String, reason: &'static str },

    #[error("invalid area descriptor: {0}")]
    InvalidDescriptor(String),
}

/// Result type alias for area resolution.
pub type AreaResult<T> = Result<T, AreaError>;

/// Errors reported by the S7 transport.
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("connect to {target} failed: {reason}")]
    Connect { target: String, reason: String },

    #[error("S7 PDU negotiation failed: {0}")]
    Negotiation(String),

    #[error("not connected")]
    NotConnected,

    #[error("{0} timed out")]
    Timeout(&'static str),

    #[error("connection closed by the peer")]
    ConnectionClosed,

    #[error("invalid ISO telegram: {0}")]
    InvalidFrame(String),

    #[error("S7 protocol error (class 0x{class:02X}, code 0x{code:02X})")]
    Protocol { class: u8, code: u8 },

    #[error("S7 invalid address (outside the area or optimized DB)")]
    InvalidAddress,

    #[error("S7 object does not exist in the CPU")]
    ObjectNotFound,

    #[error("S7 item error (return code 0x{0:02X})")]
    ItemError(u8),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl TransportError {
    /// True if this error was raised while establishing the session.
    pub fn is_connect(&self) -> bool {
        matches!(self, Self::Connect { .. } | Self::Negotiation(_))
    }
}

/// Result type alias for transport operations.
pub type TransportResult<T> = Result<T, TransportError>;

/// Errors raised by the access engine.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error(transparent)]
    Area(#[from] AreaError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("nothing to write: payload is empty")]
    EmptyPayload,

    #[error("payload of {0} bytes exceeds the 65535 byte limit of a single write")]
    PayloadTooLarge(usize),
}

/// Result type alias for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

/// Errors raised by the poll driver.
#[derive(Error, Debug)]
pub enum PollError {
    #[error("invalid poll plan: {0}")]
    InvalidPlan(String),

    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error("failed to emit sample: {0}")]
    Output(#[from] std::io::Error),
}

/// Result type alias for polling.
pub type PollResult<T> = Result<T, PollError>;

/// Configuration-related errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("could not determine configuration directory")]
    DirectoryNotFound,

    #[error("failed to read {path}: {reason}")]
    ReadFailed { path: PathBuf, reason: String },

    #[error("failed to write {path}: {reason}")]
    WriteFailed { path: PathBuf, reason: String },

    #[error("invalid configuration format: {0}")]
    InvalidFormat(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Top-level error type for CLI commands.
#[derive(Error, Debug)]
pub enum CliError {
    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error(transparent)]
    Area(#[from] AreaError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error(transparent)]
    Poll(#[from] PollError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("output error: {0}")]
    Output(#[from] std::io::Error),

    #[error("{0}")]
    InvalidArgument(String),
}

/// Result type alias for CLI operations.
pub type CliResult<T> = Result<T, CliError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alignment_message_names_length() {
        let err = CodecError::Alignment {
            format: "float32",
            width: 4,
            len: 3,
        };
        assert_eq!(
            err.to_string(),
            "float32 requires a size that is a multiple of 4 bytes, got 3"
        );
    }

    #[test]
    fn test_unsupported_area_message() {
        let err = AreaError::UnsupportedArea {
            name: "XX".into(),
            reason: "unknown area name",
        };
        assert_eq!(err.to_string(), "area \"XX\" not supported: unknown area name");
    }

    #[test]
    fn test_engine_error_is_transparent() {
        let err: EngineError = TransportError::ObjectNotFound.into();
        assert_eq!(err.to_string(), TransportError::ObjectNotFound.to_string());
    }
}
