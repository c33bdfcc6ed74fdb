//! ISO-on-TCP (RFC 1006) and S7 telegram layout.
//!
//! Pure builders and parsers, no I/O. Offsets below are counted from the
//! start of the full telegram, TPKT header included:
//!
//! ```text
//!  0..4   TPKT      03 00 LL LL
//!  4..7   COTP DT   02 F0 80
//!  7..    S7 header 32 ROSCTR RR RR REF REF PL PL DL DL [ERRCLS ERRCODE]
//! ```

use crate::error::{TransportError, TransportResult};

/// RFC 1006 version byte.
pub const TPKT_VERSION: u8 = 0x03;
/// TPKT header length.
pub const TPKT_LEN: usize = 4;
/// TPKT + COTP data header.
pub const ISO_HEADER_LEN: usize = 7;
/// S7 protocol id.
pub const S7_ID: u8 = 0x32;
/// PDU length requested during setup communication.
pub const PDU_LEN_REQUEST: u16 = 480;
/// Upper bound accepted for any incoming telegram.
pub const MAX_TELEGRAM_LEN: usize = 4096;

const COTP_CONN_REQ: u8 = 0xE0;
const COTP_CONN_CONFIRM: u8 = 0xD0;
const COTP_DATA: u8 = 0xF0;
const COTP_EOT: u8 = 0x80;

const ROSCTR_JOB: u8 = 0x01;
const ROSCTR_ACK_DATA: u8 = 0x03;

const FN_SETUP_COMM: u8 = 0xF0;
const FN_READ_VAR: u8 = 0x04;
const FN_WRITE_VAR: u8 = 0x05;

/// Transport size "BYTE" in an item specification.
const WORDLEN_BYTE: u8 = 0x02;
/// Data transport size for byte/word/dword payloads; length counted in bits.
const TS_RES_BYTE: u8 = 0x04;

const CONN_REQ_LEN: usize = 22;
const SETUP_REQ_LEN: usize = 25;
const SETUP_RES_LEN: usize = 27;
const READ_REQ_LEN: usize = 31;
const WRITE_HEADER_LEN: usize = 35;
/// Offset of the item return code in read/write responses.
const ITEM_RETURN_CODE: usize = 21;
/// Offset of the first payload byte in a read response.
const READ_DATA_OFFSET: usize = 25;

/// Overhead of a read response around its payload.
pub const READ_OVERHEAD: u16 = 18;
/// Overhead of a write request around its payload.
pub const WRITE_OVERHEAD: u16 = 28;

const RES_SUCCESS: u8 = 0xFF;
const RES_INVALID_ADDRESS: u8 = 0x05;
const RES_NOT_FOUND: u8 = 0x0A;

#[inline]
fn hi(value: usize) -> u8 {
    ((value >> 8) & 0xFF) as u8
}

#[inline]
fn lo(value: usize) -> u8 {
    (value & 0xFF) as u8
}

#[inline]
fn be_u16(frame: &[u8], at: usize) -> u16 {
    u16::from_be_bytes([frame[at], frame[at + 1]])
}

/// Validate a TPKT header and return the total telegram length it announces.
pub fn telegram_length(header: &[u8; TPKT_LEN]) -> TransportResult<usize> {
    if header[0] != TPKT_VERSION {
        return Err(TransportError::InvalidFrame(format!(
            "bad TPKT version 0x{:02X}",
            header[0]
        )));
    }
    let len = usize::from(be_u16(header, 2));
    if !(ISO_HEADER_LEN..=MAX_TELEGRAM_LEN).contains(&len) {
        return Err(TransportError::InvalidFrame(format!(
            "telegram length {} out of bounds",
            len
        )));
    }
    Ok(len)
}

/// COTP connection request carrying the two TSAP records.
pub fn connection_request(local_tsap: u16, remote_tsap: u16) -> [u8; CONN_REQ_LEN] {
    let [local_hi, local_lo] = local_tsap.to_be_bytes();
    let [remote_hi, remote_lo] = remote_tsap.to_be_bytes();
    [
        TPKT_VERSION,
        0x00,
        hi(CONN_REQ_LEN),
        lo(CONN_REQ_LEN),
        0x11, // COTP header length
        COTP_CONN_REQ,
        0x00,
        0x00, // destination reference
        0x00,
        0x01, // source reference
        0x00, // class 0
        0xC0,
        0x01,
        0x0A, // TPDU size 1024
        0xC1,
        0x02,
        local_hi,
        local_lo,
        0xC2,
        0x02,
        remote_hi,
        remote_lo,
    ]
}

/// Check that a COTP response is a connection confirm.
pub fn check_connection_confirm(frame: &[u8]) -> TransportResult<()> {
    if frame.len() < 7 || frame[5] != COTP_CONN_CONFIRM {
        return Err(TransportError::InvalidFrame(
            "COTP connection refused by the peer".to_string(),
        ));
    }
    Ok(())
}

/// S7 setup communication job requesting `pdu_length`.
pub fn setup_communication(pdu_length: u16) -> [u8; SETUP_REQ_LEN] {
    let [pdu_hi, pdu_lo] = pdu_length.to_be_bytes();
    [
        TPKT_VERSION,
        0x00,
        hi(SETUP_REQ_LEN),
        lo(SETUP_REQ_LEN),
        0x02,
        COTP_DATA,
        COTP_EOT,
        S7_ID,
        ROSCTR_JOB,
        0x00,
        0x00,
        0x04,
        0x00, // PDU reference
        0x00,
        0x08, // parameter length
        0x00,
        0x00, // data length
        FN_SETUP_COMM,
        0x00,
        0x00,
        0x01, // max AmQ calling
        0x00,
        0x01, // max AmQ called
        pdu_hi,
        pdu_lo,
    ]
}

/// Parse the setup communication ack and return the negotiated PDU length.
pub fn parse_setup_response(frame: &[u8]) -> TransportResult<u16> {
    if frame.len() < SETUP_RES_LEN || frame[7] != S7_ID {
        return Err(TransportError::Negotiation(format!(
            "unexpected response of {} bytes",
            frame.len()
        )));
    }
    if frame[17] != 0x00 || frame[18] != 0x00 {
        return Err(TransportError::Negotiation(format!(
            "rejected with class 0x{:02X}, code 0x{:02X}",
            frame[17], frame[18]
        )));
    }
    let pdu = be_u16(frame, 25);
    if pdu <= WRITE_OVERHEAD {
        return Err(TransportError::Negotiation(format!(
            "PDU length {} is too small",
            pdu
        )));
    }
    Ok(pdu)
}

fn write_address(frame: &mut [u8], start_byte: u32) {
    let address = start_byte << 3;
    frame[28] = ((address >> 16) & 0xFF) as u8;
    frame[29] = ((address >> 8) & 0xFF) as u8;
    frame[30] = (address & 0xFF) as u8;
}

/// Read var job for `count` bytes at `start_byte`.
pub fn read_request(
    area_code: u8,
    block: u16,
    start_byte: u32,
    count: u16,
    pdu_ref: u16,
) -> [u8; READ_REQ_LEN] {
    let [ref_hi, ref_lo] = pdu_ref.to_be_bytes();
    let [count_hi, count_lo] = count.to_be_bytes();
    let [db_hi, db_lo] = block.to_be_bytes();
    let mut frame = [
        TPKT_VERSION,
        0x00,
        hi(READ_REQ_LEN),
        lo(READ_REQ_LEN),
        0x02,
        COTP_DATA,
        COTP_EOT,
        S7_ID,
        ROSCTR_JOB,
        0x00,
        0x00,
        ref_hi,
        ref_lo,
        0x00,
        0x0E, // parameter length
        0x00,
        0x00, // data length
        FN_READ_VAR,
        0x01, // item count
        0x12, // variable specification
        0x0A, // length of the address
        0x10, // syntax id: S7ANY
        WORDLEN_BYTE,
        count_hi,
        count_lo,
        db_hi,
        db_lo,
        area_code,
        0x00,
        0x00,
        0x00,
    ];
    write_address(&mut frame, start_byte);
    frame
}

/// Write var job carrying `data` to `start_byte`.
pub fn write_request(
    area_code: u8,
    block: u16,
    start_byte: u32,
    data: &[u8],
    pdu_ref: u16,
) -> Vec<u8> {
    let count = data.len();
    let bits = count << 3;
    let total = WRITE_HEADER_LEN + count;
    let [ref_hi, ref_lo] = pdu_ref.to_be_bytes();
    let [db_hi, db_lo] = block.to_be_bytes();

    let mut frame = Vec::with_capacity(total);
    frame.extend_from_slice(&[
        TPKT_VERSION,
        0x00,
        hi(total),
        lo(total),
        0x02,
        COTP_DATA,
        COTP_EOT,
        S7_ID,
        ROSCTR_JOB,
        0x00,
        0x00,
        ref_hi,
        ref_lo,
        0x00,
        0x0E, // parameter length
        hi(count + 4),
        lo(count + 4), // data length
        FN_WRITE_VAR,
        0x01,
        0x12,
        0x0A,
        0x10,
        WORDLEN_BYTE,
        hi(count),
        lo(count),
        db_hi,
        db_lo,
        area_code,
        0x00,
        0x00,
        0x00,
        0x00, // reserved
        TS_RES_BYTE,
        hi(bits),
        lo(bits),
    ]);
    write_address(&mut frame, start_byte);
    frame.extend_from_slice(data);
    frame
}

/// Check that a response answers the job sent with `expected`.
pub fn check_pdu_ref(frame: &[u8], expected: u16) -> TransportResult<()> {
    let Some(bytes) = frame.get(11..13) else {
        return Err(TransportError::InvalidFrame(format!(
            "response too short ({} bytes)",
            frame.len()
        )));
    };
    let got = u16::from_be_bytes([bytes[0], bytes[1]]);
    if got != expected {
        return Err(TransportError::InvalidFrame(format!(
            "PDU reference mismatch: sent {}, got {}",
            expected, got
        )));
    }
    Ok(())
}

/// Validate the COTP data header and the S7 ack-data header of a response.
fn check_ack_data(frame: &[u8], min_len: usize) -> TransportResult<()> {
    if frame.len() < min_len {
        return Err(TransportError::InvalidFrame(format!(
            "response too short ({} bytes)",
            frame.len()
        )));
    }
    if frame[4] != 0x02 || frame[5] != COTP_DATA {
        return Err(TransportError::InvalidFrame("invalid ISO header".to_string()));
    }
    if frame[6] != COTP_EOT {
        return Err(TransportError::InvalidFrame("fragmented ISO packet".to_string()));
    }
    if frame[7] != S7_ID || frame[8] != ROSCTR_ACK_DATA {
        return Err(TransportError::InvalidFrame(format!(
            "expected S7 ack data, got 0x{:02X}/0x{:02X}",
            frame[7], frame[8]
        )));
    }
    if frame[17] != 0x00 || frame[18] != 0x00 {
        return Err(TransportError::Protocol {
            class: frame[17],
            code: frame[18],
        });
    }
    Ok(())
}

fn check_return_code(code: u8) -> TransportResult<()> {
    match code {
        RES_SUCCESS => Ok(()),
        RES_INVALID_ADDRESS => Err(TransportError::InvalidAddress),
        RES_NOT_FOUND => Err(TransportError::ObjectNotFound),
        other => Err(TransportError::ItemError(other)),
    }
}

/// Parse a read var ack and return exactly `expected` payload bytes.
pub fn parse_read_response(frame: &[u8], expected: usize) -> TransportResult<&[u8]> {
    check_ack_data(frame, ITEM_RETURN_CODE + 1)?;
    check_return_code(frame[ITEM_RETURN_CODE])?;

    if frame.len() < READ_DATA_OFFSET {
        return Err(TransportError::InvalidFrame("read response without data".to_string()));
    }
    let declared = usize::from(be_u16(frame, 23));
    // Sizes 0x03..=0x05 count bits, octet strings count bytes.
    let declared = match frame[22] {
        0x03..=0x05 => declared.div_ceil(8),
        _ => declared,
    };

    let available = frame.len() - READ_DATA_OFFSET;
    if declared < expected || available < expected {
        return Err(TransportError::InvalidFrame(format!(
            "short read: expected {} bytes, got {}",
            expected,
            declared.min(available)
        )));
    }
    Ok(&frame[READ_DATA_OFFSET..READ_DATA_OFFSET + expected])
}

/// Parse a write var ack.
pub fn parse_write_response(frame: &[u8]) -> TransportResult<()> {
    check_ack_data(frame, ITEM_RETURN_CODE + 1)?;
    check_return_code(frame[ITEM_RETURN_CODE])
}

/// Build a read var ack. Used by in-process controller emulation.
pub fn read_response(pdu_ref: u16, payload: &[u8]) -> Vec<u8> {
    let total = READ_DATA_OFFSET + payload.len();
    let [ref_hi, ref_lo] = pdu_ref.to_be_bytes();
    let mut frame = vec![
        TPKT_VERSION,
        0x00,
        hi(total),
        lo(total),
        0x02,
        COTP_DATA,
        COTP_EOT,
        S7_ID,
        ROSCTR_ACK_DATA,
        0x00,
        0x00,
        ref_hi,
        ref_lo,
        0x00,
        0x02,
        hi(payload.len() + 4),
        lo(payload.len() + 4),
        0x00,
        0x00,
        FN_READ_VAR,
        0x01,
        RES_SUCCESS,
        TS_RES_BYTE,
        hi(payload.len() << 3),
        lo(payload.len() << 3),
    ];
    frame.extend_from_slice(payload);
    frame
}

/// Build a write var ack (or an item error when `return_code != 0xFF`).
pub fn write_response(pdu_ref: u16, return_code: u8) -> Vec<u8> {
    let [ref_hi, ref_lo] = pdu_ref.to_be_bytes();
    vec![
        TPKT_VERSION,
        0x00,
        0x00,
        0x16,
        0x02,
        COTP_DATA,
        COTP_EOT,
        S7_ID,
        ROSCTR_ACK_DATA,
        0x00,
        0x00,
        ref_hi,
        ref_lo,
        0x00,
        0x02,
        0x00,
        0x01,
        0x00,
        0x00,
        FN_WRITE_VAR,
        0x01,
        return_code,
    ]
}
