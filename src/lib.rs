//! # s7probe - Read, write and poll Siemens S7 PLC memory
//!
//! s7probe talks ISO-on-TCP (RFC 1006) to S7 controllers and moves raw
//! bytes between PLC memory areas and typed text.
//!
//! ## Features
//!
//! - **Area access**: data blocks, process inputs/outputs and markers,
//!   with the usual naming aliases (`DB`, `PE`/`I`, `PA`/`Q`, `MK`/`M`)
//! - **Typed codec**: hex, string, int16, int32 and float32, big-endian
//! - **Polling**: fixed-cadence reads with a count limit and Ctrl-C
//! - **Multiple Output Formats**: plain text, JSON lines and CSV
//!
//! ## Example Usage
//!
//! ```rust,ignore
//! use s7probe::transport::{ConnectionOptions, Connector, S7Connector};
//! use s7probe::types::{AreaDescriptor, FormatSpec};
//! use s7probe::{codec, engine};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let options = ConnectionOptions::new("192.168.0.10").with_rack_slot(0, 2);
//!     let mut session = S7Connector.connect(&options).await?;
//!
//!     let area = AreaDescriptor::new("DB", 1, 0, 4)?;
//!     let result = engine::read_area(&mut *session, &area).await;
//!     session.close().await;
//!
//!     println!("{}", codec::decode(&result?, FormatSpec::Int16)?);
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! - [`types`] - Area kinds, descriptors, formats and samples
//! - [`codec`] - Byte buffer to text conversion and back
//! - [`transport`] - The `Session` capability and its ISO-on-TCP and
//!   in-memory implementations
//! - [`engine`] - One read or write against a descriptor
//! - [`poll`] - Repeated reads with cancellation
//! - [`output`] - Plain, JSON and CSV rendering
//! - [`config`] - Settings file and paths
//! - [`cli`] - Command line definitions and handlers
//! - [`error`] - Error types per layer

pub mod cli;
pub mod codec;
pub mod config;
pub mod engine;
pub mod error;
pub mod output;
pub mod poll;
pub mod transport;
pub mod types;

// Re-export commonly used types
pub use error::{CliError, CodecError, EngineError, TransportError};
pub use poll::{CancelFlag, PollOutcome, PollPlan};
pub use transport::{ConnectionOptions, Connector, Session};
pub use types::{AreaDescriptor, AreaKind, FormatSpec, Sample};
