// libnfc/src/protocol/felica.rs

//! FeliCa frames as exchanged over the RF link: every command and response
//! starts with a length byte that counts itself.

use crate::constants::*;
use crate::protocol::parser;
use crate::types::{BlockData, BlockElement, Idm, Pmm, ServiceCode, SystemCode};
use crate::{Error, Result};

/// Prefix `payload` with its length byte.
fn with_length(payload: Vec<u8>) -> Result<Vec<u8>> {
    let len = payload.len() + 1;
    if len > u8::MAX as usize {
        return Err(Error::BufferOverflow {
            limit: u8::MAX as usize,
            actual: len,
        });
    }
    let mut frame = Vec::with_capacity(len);
    frame.push(len as u8);
    frame.extend(payload);
    Ok(frame)
}

/// Strip and validate the leading length byte of a response.
fn body(frame: &[u8]) -> Result<&[u8]> {
    let len = parser::byte_at(frame, 0)? as usize;
    if len != frame.len() {
        return Err(Error::InvalidLength {
            expected: len,
            actual: frame.len(),
        });
    }
    Ok(&frame[1..])
}

/// Polling: `[len][0x00][system code BE][request code][time slot]`.
pub fn polling(system_code: SystemCode, request_code: u8, time_slot: u8) -> [u8; 6] {
    let [hi, lo] = system_code.to_be_bytes();
    [6, FELICA_CMD_POLLING, hi, lo, request_code, time_slot]
}

/// Decoded polling answer. The system code is only present when it was
/// requested (request code 0x01).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollingResponse {
    pub idm: Idm,
    pub pmm: Pmm,
    pub system_code: Option<SystemCode>,
}

pub fn decode_polling(frame: &[u8]) -> Result<PollingResponse> {
    let data = body(frame)?;
    parser::ensure_len(data, 1 + 8 + 8)?;
    parser::expect_byte(data, 0, FELICA_CMD_POLLING + 1)?;

    let idm = parser::idm_at(data, 1)?;
    let pmm = parser::pmm_at(data, 9)?;
    let system_code = if data.len() >= 19 {
        Some(SystemCode::from_be_bytes(parser::array_at(data, 17)?))
    } else {
        None
    };

    Ok(PollingResponse {
        idm,
        pmm,
        system_code,
    })
}

fn push_lists(buf: &mut Vec<u8>, services: &[ServiceCode], blocks: &[BlockElement]) {
    buf.push(services.len() as u8);
    for svc in services {
        buf.extend_from_slice(&svc.to_le_bytes());
    }
    buf.push(blocks.len() as u8);
    for blk in blocks {
        buf.extend_from_slice(&blk.encode());
    }
}

fn check_lists(services: &[ServiceCode], blocks: &[BlockElement]) -> Result<()> {
    if services.is_empty() || services.len() > 16 {
        return Err(Error::InvalidParameter(format!(
            "service count must be 1..=16, got {}",
            services.len()
        )));
    }
    if blocks.is_empty() {
        return Err(Error::InvalidParameter("empty block list".into()));
    }
    if let Some(b) = blocks
        .iter()
        .find(|b| usize::from(b.service_index) >= services.len())
    {
        return Err(Error::InvalidParameter(format!(
            "block {} refers to service #{} out of {}",
            b.block_number,
            b.service_index,
            services.len()
        )));
    }
    Ok(())
}

/// Check (read without encryption):
/// `[len][0x06][IDm][n svc][svc LE..][n blk][blk list]`.
pub fn check(idm: Idm, services: &[ServiceCode], blocks: &[BlockElement]) -> Result<Vec<u8>> {
    check_lists(services, blocks)?;
    let mut buf = Vec::with_capacity(12 + services.len() * 2 + blocks.len() * 3);
    buf.push(FELICA_CMD_CHECK);
    buf.extend_from_slice(idm.as_bytes());
    push_lists(&mut buf, services, blocks);
    with_length(buf)
}

/// Update (write without encryption):
/// `[len][0x08][IDm][n svc][svc LE..][n blk][blk list][16 * n data]`.
pub fn update(
    idm: Idm,
    services: &[ServiceCode],
    blocks: &[BlockElement],
    data: &[BlockData],
) -> Result<Vec<u8>> {
    check_lists(services, blocks)?;
    if data.len() != blocks.len() {
        return Err(Error::InvalidParameter(format!(
            "{} blocks listed but {} data blocks given",
            blocks.len(),
            data.len()
        )));
    }
    let mut buf = Vec::new();
    buf.push(FELICA_CMD_UPDATE);
    buf.extend_from_slice(idm.as_bytes());
    push_lists(&mut buf, services, blocks);
    for db in data {
        buf.extend_from_slice(db.as_bytes());
    }
    with_length(buf)
}

/// Common head of Check / Update answers: response code, IDm, status flags.
fn decode_status(data: &[u8], response_code: u8, idm: &Idm) -> Result<()> {
    parser::ensure_len(data, 1 + 8 + 2)?;
    parser::expect_byte(data, 0, response_code)?;
    let got = parser::idm_at(data, 1)?;
    if got != *idm {
        return Err(Error::RfProtocolError(format!(
            "answer from IDm {} while talking to {}",
            got.to_hex(),
            idm.to_hex()
        )));
    }
    let status1 = data[9];
    let status2 = data[10];
    if status1 != 0 || status2 != 0 {
        return Err(Error::FelicaStatus { status1, status2 });
    }
    Ok(())
}

/// Decode a Check answer and return its data blocks.
pub fn decode_check(frame: &[u8], idm: &Idm) -> Result<Vec<BlockData>> {
    let data = body(frame)?;
    decode_status(data, FELICA_CMD_CHECK + 1, idm)?;

    let count = parser::byte_at(data, 11)? as usize;
    parser::ensure_exact_len(data, 12 + count * FELICA_BLOCK_LEN)?;
    (0..count)
        .map(|i| {
            parser::array_at::<FELICA_BLOCK_LEN>(data, 12 + i * FELICA_BLOCK_LEN)
                .map(BlockData::from_bytes)
        })
        .collect()
}

pub fn decode_update(frame: &[u8], idm: &Idm) -> Result<()> {
    let data = body(frame)?;
    decode_status(data, FELICA_CMD_UPDATE + 1, idm)
}
