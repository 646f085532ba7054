// libnfc/src/protocol/jewel.rs

//! Innovision Jewel / Topaz (NFC Forum Type 1) command set.
//!
//! Every request ends with the 4 UID bytes echoed from RID. Static memory
//! commands are 7 bytes long, segment and 8-byte commands 14 bytes. CRC_B
//! is not part of these frames.

use std::io::{Read, Write};

use crate::constants::{JEWEL_BLOCK_LEN, JEWEL_DUMP_LEN};
use crate::protocol::parser;
use crate::{Error, Result};

pub const JEWEL_CMD_RID: u8 = 0x78;
pub const JEWEL_CMD_RALL: u8 = 0x00;
pub const JEWEL_CMD_READ: u8 = 0x01;
pub const JEWEL_CMD_WRITE_E: u8 = 0x53;
pub const JEWEL_CMD_WRITE_NE: u8 = 0x1A;
pub const JEWEL_CMD_RSEG: u8 = 0x10;
pub const JEWEL_CMD_READ8: u8 = 0x02;
pub const JEWEL_CMD_WRITE_E8: u8 = 0x54;
pub const JEWEL_CMD_WRITE_NE8: u8 = 0x1B;

/// Byte address inside static memory: block in bits 6..3, byte in bits 2..0.
pub fn byte_address(block: u8, byte: u8) -> Result<u8> {
    if block > 0x0e || byte > 7 {
        return Err(Error::InvalidParameter(format!(
            "block {} byte {} is outside static memory",
            block, byte
        )));
    }
    Ok((block << 3) | byte)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JewelRequest {
    Rid,
    Rall { uid: [u8; 4] },
    Read { uid: [u8; 4], address: u8 },
    WriteE { uid: [u8; 4], address: u8, data: u8 },
    WriteNe { uid: [u8; 4], address: u8, data: u8 },
    Rseg { uid: [u8; 4], segment: u8 },
    Read8 { uid: [u8; 4], block: u8 },
    WriteE8 { uid: [u8; 4], block: u8, data: [u8; 8] },
    WriteNe8 { uid: [u8; 4], block: u8, data: [u8; 8] },
}

impl JewelRequest {
    pub fn opcode(&self) -> u8 {
        match self {
            Self::Rid => JEWEL_CMD_RID,
            Self::Rall { .. } => JEWEL_CMD_RALL,
            Self::Read { .. } => JEWEL_CMD_READ,
            Self::WriteE { .. } => JEWEL_CMD_WRITE_E,
            Self::WriteNe { .. } => JEWEL_CMD_WRITE_NE,
            Self::Rseg { .. } => JEWEL_CMD_RSEG,
            Self::Read8 { .. } => JEWEL_CMD_READ8,
            Self::WriteE8 { .. } => JEWEL_CMD_WRITE_E8,
            Self::WriteNe8 { .. } => JEWEL_CMD_WRITE_NE8,
        }
    }

    pub fn encode(&self) -> Vec<u8> {
        let op = self.opcode();
        match self {
            Self::Rid => vec![op, 0, 0, 0, 0, 0, 0],
            Self::Rall { uid } => short_request(op, 0, 0, uid),
            Self::Read { uid, address } => short_request(op, *address, 0, uid),
            Self::WriteE { uid, address, data } | Self::WriteNe { uid, address, data } => {
                short_request(op, *address, *data, uid)
            }
            Self::Rseg { uid, segment } => long_request(op, *segment << 4, &[0; 8], uid),
            Self::Read8 { uid, block } => long_request(op, *block, &[0; 8], uid),
            Self::WriteE8 { uid, block, data } | Self::WriteNe8 { uid, block, data } => {
                long_request(op, *block, data, uid)
            }
        }
    }

    /// Size of the expected answer, CRC excluded.
    pub fn response_len(&self) -> usize {
        response_len(self.opcode()).unwrap_or(0)
    }
}

fn short_request(op: u8, add: u8, data: u8, uid: &[u8; 4]) -> Vec<u8> {
    let mut frame = Vec::with_capacity(7);
    frame.extend_from_slice(&[op, add, data]);
    frame.extend_from_slice(uid);
    frame
}

fn long_request(op: u8, add: u8, data: &[u8; 8], uid: &[u8; 4]) -> Vec<u8> {
    let mut frame = Vec::with_capacity(14);
    frame.push(op);
    frame.push(add);
    frame.extend_from_slice(data);
    frame.extend_from_slice(uid);
    frame
}

/// Request size per opcode.
pub fn request_len(opcode: u8) -> Option<usize> {
    match opcode {
        JEWEL_CMD_RID | JEWEL_CMD_RALL | JEWEL_CMD_READ | JEWEL_CMD_WRITE_E
        | JEWEL_CMD_WRITE_NE => Some(7),
        JEWEL_CMD_RSEG | JEWEL_CMD_READ8 | JEWEL_CMD_WRITE_E8 | JEWEL_CMD_WRITE_NE8 => Some(14),
        _ => None,
    }
}

/// Response size per opcode.
pub fn response_len(opcode: u8) -> Option<usize> {
    match opcode {
        JEWEL_CMD_RID => Some(6),
        JEWEL_CMD_RALL => Some(2 + JEWEL_DUMP_LEN),
        JEWEL_CMD_READ | JEWEL_CMD_WRITE_E | JEWEL_CMD_WRITE_NE => Some(2),
        JEWEL_CMD_RSEG => Some(129),
        JEWEL_CMD_READ8 | JEWEL_CMD_WRITE_E8 | JEWEL_CMD_WRITE_NE8 => Some(1 + JEWEL_BLOCK_LEN),
        _ => None,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JewelResponse {
    Rid { header: [u8; 2], uid: [u8; 4] },
    Rall { header: [u8; 2], dump: JewelDump },
    /// READ, WRITE-E and WRITE-NE
    Byte { address: u8, data: u8 },
    Rseg { segment: u8, data: Box<[u8; 128]> },
    /// READ8, WRITE-E8 and WRITE-NE8
    Block { block: u8, data: [u8; 8] },
}

impl JewelResponse {
    /// Decode the answer to `opcode`; the length must match exactly.
    pub fn decode(opcode: u8, frame: &[u8]) -> Result<Self> {
        let len = response_len(opcode).ok_or_else(|| {
            Error::CommandNotSupported(format!("jewel opcode {:02x}", opcode))
        })?;
        parser::ensure_exact_len(frame, len)?;

        Ok(match opcode {
            JEWEL_CMD_RID => Self::Rid {
                header: parser::array_at(frame, 0)?,
                uid: parser::array_at(frame, 2)?,
            },
            JEWEL_CMD_RALL => Self::Rall {
                header: parser::array_at(frame, 0)?,
                dump: JewelDump::from_bytes(parser::array_at(frame, 2)?),
            },
            JEWEL_CMD_READ | JEWEL_CMD_WRITE_E | JEWEL_CMD_WRITE_NE => Self::Byte {
                address: frame[0],
                data: frame[1],
            },
            JEWEL_CMD_RSEG => Self::Rseg {
                segment: frame[0] >> 4,
                data: Box::new(parser::array_at(frame, 1)?),
            },
            _ => Self::Block {
                block: frame[0],
                data: parser::array_at(frame, 1)?,
            },
        })
    }
}

/// Raw 120-byte static memory image: UID block, 12 data blocks, reserved
/// block and lock/OTP block. Stored and loaded verbatim.
#[derive(Clone, PartialEq, Eq)]
pub struct JewelDump([u8; JEWEL_DUMP_LEN]);

impl JewelDump {
    pub fn from_bytes(bytes: [u8; JEWEL_DUMP_LEN]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; JEWEL_DUMP_LEN] {
        &self.0
    }

    pub fn uid(&self) -> [u8; 7] {
        let mut uid = [0u8; 7];
        uid.copy_from_slice(&self.0[..7]);
        uid
    }

    pub fn block(&self, index: usize) -> Option<&[u8]> {
        self.0.chunks(JEWEL_BLOCK_LEN).nth(index)
    }

    pub fn read_from<R: Read>(mut reader: R) -> Result<Self> {
        let mut buf = [0u8; JEWEL_DUMP_LEN];
        reader.read_exact(&mut buf)?;
        Ok(Self(buf))
    }

    pub fn write_to<W: Write>(&self, mut writer: W) -> Result<()> {
        writer.write_all(&self.0)?;
        writer.flush()?;
        Ok(())
    }
}

impl std::fmt::Debug for JewelDump {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("JewelDump")
            .field(&crate::utils::bytes_to_hex(&self.0))
            .finish()
    }
}
