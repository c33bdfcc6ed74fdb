//! Transport capability abstraction.
//!
//! The access engine only talks to a controller through [`Session`]. How a
//! session gets established is the business of a [`Connector`], which takes
//! the same [`ConnectionOptions`] whatever handshake variant is selected.

use crate::error::TransportResult;
use crate::types::AreaKind;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default ISO-on-TCP port.
pub const DEFAULT_PORT: u16 = 102;

/// Connection type used when no override is given (PG, programming device).
pub const CT_PG: u16 = 0x0001;
/// Connection type OP (operator panel / HMI).
pub const CT_OP: u16 = 0x0002;
/// Connection type S7 basic.
pub const CT_S7_BASIC: u16 = 0x0003;

/// Local TSAP used by the rack/slot handshake.
const LOCAL_TSAP: u16 = 0x0100;

/// How the remote endpoint is addressed during the COTP handshake.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum ConnectMethod {
    /// Standard handshake: the remote TSAP is derived from connection type,
    /// rack and slot.
    #[default]
    RackSlot,
    /// Direct variant with explicit TSAP records (LOGO!, S7-200, drives).
    Tsap { local: u16, remote: u16 },
}

/// Per-phase timeouts, enforced by the transport only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timeouts {
    /// TCP connect plus handshake.
    pub connect: Duration,
    /// Waiting for a response telegram.
    pub read: Duration,
    /// Sending a request telegram.
    pub write: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            connect: Duration::from_millis(3000),
            read: Duration::from_millis(1000),
            write: Duration::from_millis(500),
        }
    }
}

/// Everything needed to open one session to a controller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionOptions {
    /// Host name or IP address, optionally with `:port`.
    pub address: String,
    /// CPU rack.
    pub rack: u16,
    /// CPU slot.
    pub slot: u16,
    /// Connection type override, 0 selects the transport default.
    pub connection_type: u16,
    /// TCP port, used when `address` carries none.
    pub port: u16,
    /// Handshake variant.
    pub method: ConnectMethod,
    /// Transport timeouts.
    pub timeouts: Timeouts,
}

impl ConnectionOptions {
    /// Create options for an address with S7-300 style defaults (rack 0, slot 1).
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            rack: 0,
            slot: 1,
            connection_type: 0,
            port: DEFAULT_PORT,
            method: ConnectMethod::RackSlot,
            timeouts: Timeouts::default(),
        }
    }

    /// Set rack and slot.
    pub fn with_rack_slot(mut self, rack: u16, slot: u16) -> Self {
        self.rack = rack;
        self.slot = slot;
        self
    }

    /// Set the connection type override.
    pub fn with_connection_type(mut self, connection_type: u16) -> Self {
        self.connection_type = connection_type;
        self
    }

    /// Set the TCP port.
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Use explicit TSAP records instead of rack/slot.
    pub fn with_tsap(mut self, local: u16, remote: u16) -> Self {
        self.method = ConnectMethod::Tsap { local, remote };
        self
    }

    /// Set the transport timeouts.
    pub fn with_timeouts(mut self, timeouts: Timeouts) -> Self {
        self.timeouts = timeouts;
        self
    }

    /// The `host:port` string handed to the socket layer.
    pub fn socket_target(&self) -> String {
        if !self.address.contains(':') && self.port > 0 {
            format!("{}:{}", self.address, self.port)
        } else {
            self.address.clone()
        }
    }

    /// Connection type actually put on the wire.
    pub fn effective_connection_type(&self) -> u16 {
        if self.connection_type == 0 {
            CT_PG
        } else {
            self.connection_type
        }
    }

    /// Local and remote TSAP for the COTP connection request.
    pub fn tsap_pair(&self) -> (u16, u16) {
        match self.method {
            ConnectMethod::RackSlot => {
                let remote = (self.effective_connection_type() << 8)
                    .wrapping_add((self.rack & 0x07) * 0x20)
                    .wrapping_add(self.slot & 0x1F);
                (LOCAL_TSAP, remote)
            }
            ConnectMethod::Tsap { local, remote } => (local, remote),
        }
    }
}

impl Default for ConnectionOptions {
    fn default() -> Self {
        Self::new("127.0.0.1")
    }
}

/// An established connection to a controller.
///
/// Implementations handle PDU sizing internally: one `read_block` or
/// `write_block` call covers the whole range.
#[async_trait]
pub trait Session: Send {
    /// Fill `buf` with `buf.len()` bytes starting at byte `offset` of the area.
    async fn read_block(
        &mut self,
        area: AreaKind,
        block: u16,
        offset: u32,
        buf: &mut [u8],
    ) -> TransportResult<()>;

    /// Write all of `data` starting at byte `offset` of the area.
    async fn write_block(
        &mut self,
        area: AreaKind,
        block: u16,
        offset: u32,
        data: &[u8],
    ) -> TransportResult<()>;

    /// Release the session. Idempotent and infallible.
    async fn close(&mut self);

    /// PDU length negotiated with the controller.
    fn pdu_length(&self) -> u16;
}

/// A boxed session for dynamic dispatch.
pub type BoxedSession = Box<dyn Session>;

/// Opens sessions from connection options.
#[async_trait]
pub trait Connector: Send + Sync {
    /// Establish a session, or fail with [`TransportError::Connect`].
    ///
    /// [`TransportError::Connect`]: crate::error::TransportError::Connect
    async fn connect(&self, options: &ConnectionOptions) -> TransportResult<BoxedSession>;
}
