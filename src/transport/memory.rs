//! In-process controller image.
//!
//! `MemoryPlc` holds byte images of data blocks and process areas and hands
//! out sessions that read and write them. It counts every transport call
//! so callers can check how a command used its session.

use crate::error::{TransportError, TransportResult};
use crate::transport::traits::{BoxedSession, ConnectionOptions, Connector, Session};
use crate::types::AreaKind;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

/// PDU length reported by memory sessions.
const MEMORY_PDU: u16 = 480;

#[derive(Debug, Default)]
struct PlcState {
    areas: HashMap<(AreaKind, u16), Vec<u8>>,
    reads: usize,
    writes: usize,
    sessions: usize,
    closes: usize,
    fail_reads_after: Option<usize>,
    refuse_connect: bool,
}

/// Shared in-memory PLC. Clones share the same image.
#[derive(Debug, Clone, Default)]
pub struct MemoryPlc {
    state: Arc<Mutex<PlcState>>,
}

impl MemoryPlc {
    /// Create an empty controller with no areas.
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, PlcState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Add an area image. The block number is ignored for non-DB areas.
    pub fn with_area(self, kind: AreaKind, block: u16, bytes: impl Into<Vec<u8>>) -> Self {
        self.state().areas.insert(key(kind, block), bytes.into());
        self
    }

    /// Refuse every connection attempt.
    pub fn refusing_connections(self) -> Self {
        self.state().refuse_connect = true;
        self
    }

    /// Let `count` reads succeed, then fail every following one.
    pub fn fail_reads_after(&self, count: usize) {
        self.state().fail_reads_after = Some(count);
    }

    /// Current image of an area, empty if it does not exist.
    pub fn bytes(&self, kind: AreaKind, block: u16) -> Vec<u8> {
        self.state()
            .areas
            .get(&key(kind, block))
            .cloned()
            .unwrap_or_default()
    }

    /// Number of `read_block` calls served.
    pub fn read_count(&self) -> usize {
        self.state().reads
    }

    /// Number of `write_block` calls served.
    pub fn write_count(&self) -> usize {
        self.state().writes
    }

    /// Number of sessions opened.
    pub fn session_count(&self) -> usize {
        self.state().sessions
    }

    /// Number of sessions released.
    pub fn close_count(&self) -> usize {
        self.state().closes
    }

    /// Open a session on this image.
    pub fn session(&self) -> MemorySession {
        self.state().sessions += 1;
        MemorySession {
            plc: self.clone(),
            open: true,
        }
    }
}

fn key(kind: AreaKind, block: u16) -> (AreaKind, u16) {
    if kind.uses_block_number() {
        (kind, block)
    } else {
        (kind, 0)
    }
}

/// Locate `offset..offset + len` inside an area image.
fn span(
    areas: &HashMap<(AreaKind, u16), Vec<u8>>,
    kind: AreaKind,
    block: u16,
    offset: u32,
    len: usize,
) -> TransportResult<std::ops::Range<usize>> {
    let image = areas.get(&key(kind, block)).ok_or(TransportError::ObjectNotFound)?;
    let start = offset as usize;
    let end = start.checked_add(len).ok_or(TransportError::InvalidAddress)?;
    if end > image.len() {
        return Err(TransportError::InvalidAddress);
    }
    Ok(start..end)
}

#[async_trait]
impl Connector for MemoryPlc {
    async fn connect(&self, options: &ConnectionOptions) -> TransportResult<BoxedSession> {
        if self.state().refuse_connect {
            return Err(TransportError::Connect {
                target: options.socket_target(),
                reason: "connection refused".to_string(),
            });
        }
        Ok(Box::new(self.session()))
    }
}

/// A session on a [`MemoryPlc`].
#[derive(Debug)]
pub struct MemorySession {
    plc: MemoryPlc,
    open: bool,
}

#[async_trait]
impl Session for MemorySession {
    async fn read_block(
        &mut self,
        area: AreaKind,
        block: u16,
        offset: u32,
        buf: &mut [u8],
    ) -> TransportResult<()> {
        if !self.open {
            return Err(TransportError::NotConnected);
        }
        let mut state = self.plc.state();
        if state.fail_reads_after.is_some_and(|limit| state.reads >= limit) {
            return Err(TransportError::ConnectionClosed);
        }
        state.reads += 1;

        let range = span(&state.areas, area, block, offset, buf.len())?;
        buf.copy_from_slice(&state.areas[&key(area, block)][range]);
        Ok(())
    }

    async fn write_block(
        &mut self,
        area: AreaKind,
        block: u16,
        offset: u32,
        data: &[u8],
    ) -> TransportResult<()> {
        if !self.open {
            return Err(TransportError::NotConnected);
        }
        let mut state = self.plc.state();
        state.writes += 1;

        let range = span(&state.areas, area, block, offset, data.len())?;
        if let Some(image) = state.areas.get_mut(&key(area, block)) {
            image[range].copy_from_slice(data);
        }
        Ok(())
    }

    async fn close(&mut self) {
        if self.open {
            self.open = false;
            self.plc.state().closes += 1;
        }
    }

    fn pdu_length(&self) -> u16 {
        MEMORY_PDU
    }
}
