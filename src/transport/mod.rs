//! Transport layer - sessions to S7 controllers.
//!
//! [`S7Connector`] speaks ISO-on-TCP to real hardware. [`MemoryPlc`] serves
//! the same [`Session`] contract from an in-process image.

pub mod iso;
pub mod memory;
pub mod tcp;
mod traits;

pub use memory::{MemoryPlc, MemorySession};
pub use tcp::{IsoTcpSession, S7Connector};
pub use traits::{
    BoxedSession, ConnectMethod, ConnectionOptions, Connector, Session, Timeouts, CT_OP, CT_PG,
    CT_S7_BASIC, DEFAULT_PORT,
};
