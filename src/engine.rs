//! Access engine - one read or one write against a validated area.
//!
//! The engine owns no connection state. It maps an [`AreaDescriptor`] onto
//! a single [`Session`] call and passes transport failures through as-is.

use crate::error::{EngineError, EngineResult};
use crate::transport::Session;
use crate::types::AreaDescriptor;
use tracing::debug;

/// Read the whole range described by `area`.
///
/// The buffer is zeroed before the call, so a transport that succeeds
/// without touching it yields zeros rather than stale memory.
pub async fn read_area(
    session: &mut (dyn Session + '_),
    area: &AreaDescriptor,
) -> EngineResult<Vec<u8>> {
    let mut buf = vec![0u8; usize::from(area.length())];

    debug!(%area, len = area.length(), "reading area");
    session
        .read_block(area.kind(), area.block_number(), area.start_offset(), &mut buf)
        .await?;

    Ok(buf)
}

/// Write `payload` starting at the descriptor's offset.
///
/// The payload length decides how many bytes are written; the
/// descriptor's own length is not consulted.
pub async fn write_area(
    session: &mut (dyn Session + '_),
    area: &AreaDescriptor,
    payload: &[u8],
) -> EngineResult<()> {
    if payload.is_empty() {
        return Err(EngineError::EmptyPayload);
    }
    if payload.len() > usize::from(u16::MAX) {
        return Err(EngineError::PayloadTooLarge(payload.len()));
    }
    // the written range, not the descriptor's, must fit the address space
    AreaDescriptor::from_kind(
        area.kind(),
        area.block_number(),
        area.start_offset(),
        payload.len() as u16,
    )?;

    debug!(%area, bytes = payload.len(), "writing area");
    session
        .write_block(area.kind(), area.block_number(), area.start_offset(), payload)
        .await?;

    Ok(())
}
