// libnfc/src/protocol/iso14443b.rs

//! ISO/IEC 14443-3 Type B (REQB/ATQB) and ST SRx / ST25TB framing.
//!
//! All builders return frames without CRC_B; callers that drive the link
//! with hardware CRC disabled append it with [`crate::protocol::crc::append_crc_b`].

use crate::constants::*;
use crate::protocol::parser;
use crate::types::Target;
use crate::{Error, Result};

/// REQB (or WUPB when `wakeup` is set) for the given AFI, single slot.
pub fn reqb(afi: u8, wakeup: bool) -> [u8; 3] {
    [ISO14443B_APF, afi, if wakeup { 0x08 } else { 0x00 }]
}

/// Parse an ATQB (`0x50 PUPI[4] APP[4] PROTO[3]`, CRC already removed).
pub fn parse_atqb(frame: &[u8]) -> Result<Target> {
    parser::ensure_len(frame, 12)?;
    parser::expect_byte(frame, 0, ISO14443B_ATQB)?;
    Ok(Target::Iso14443b {
        pupi: parser::array_at(frame, 1)?,
        application_data: parser::array_at(frame, 5)?,
        protocol_info: parser::array_at(frame, 9)?,
    })
}

/// ST SRx INITIATE; the tag answers with its random chip id.
pub fn initiate() -> [u8; 2] {
    ST25TB_INITIATE
}

pub fn select(chip_id: u8) -> [u8; 2] {
    [ST25TB_SELECT, chip_id]
}

pub fn get_uid() -> [u8; 1] {
    [ST25TB_GET_UID]
}

pub fn completion() -> [u8; 1] {
    [ST25TB_COMPLETION]
}

pub fn read_block(block: u8) -> [u8; 2] {
    [ST25TB_READ_BLOCK, block]
}

/// WRITE_BLOCK; `data` must be 2 bytes for SR176 and 4 bytes otherwise.
pub fn write_block(block: u8, data: &[u8], size: BlockSize) -> Result<Vec<u8>> {
    parser::ensure_exact_len(data, size.bytes())?;
    let mut frame = Vec::with_capacity(2 + data.len());
    frame.push(ST25TB_WRITE_BLOCK);
    frame.push(block);
    frame.extend_from_slice(data);
    Ok(frame)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockSize {
    /// SR176
    Two,
    /// SRI / SRIX / SRT / ST25TB
    Four,
}

impl BlockSize {
    pub fn bytes(self) -> usize {
        match self {
            BlockSize::Two => 2,
            BlockSize::Four => 4,
        }
    }
}

/// Chip family derived from an SRx / ST25TB UID.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct St25tbInfo {
    pub name: &'static str,
    pub chip_code: u8,
    /// Number of user-addressable blocks
    pub block_count: u16,
    pub block_size: BlockSize,
    /// Index of the system / OTP configuration block
    pub system_block: u8,
    /// Legacy SRx parts (pre-ST25TB)
    pub legacy: bool,
}

impl St25tbInfo {
    /// Look up the chip family of an LSB-first UID; `None` for non-ST UIDs
    /// and unknown chip codes.
    pub fn from_uid(uid: &[u8; 8]) -> Option<Self> {
        if uid[7] != ST_MANUFACTURER_CODE || uid[6] != 0x02 {
            return None;
        }
        let code = uid[5] >> 2;
        CHIPS.iter().find(|c| c.chip_code == code).copied()
    }

    pub fn contains(&self, block: u8) -> bool {
        u16::from(block) < self.block_count || block == self.system_block
    }
}

const fn chip(
    name: &'static str,
    chip_code: u8,
    block_count: u16,
    block_size: BlockSize,
    system_block: u8,
    legacy: bool,
) -> St25tbInfo {
    St25tbInfo {
        name,
        chip_code,
        block_count,
        block_size,
        system_block,
        legacy,
    }
}

const CHIPS: &[St25tbInfo] = &[
    chip("SR176", 0x02, 15, BlockSize::Two, 15, true),
    chip("SRIX4K", 0x03, 128, BlockSize::Four, 255, true),
    chip("SRIX512", 0x04, 16, BlockSize::Four, 255, true),
    chip("SRI512", 0x06, 16, BlockSize::Four, 255, true),
    chip("SRI4K", 0x07, 128, BlockSize::Four, 255, true),
    chip("SRT512", 0x0C, 16, BlockSize::Four, 255, true),
    chip("SRI2K", 0x0F, 64, BlockSize::Four, 255, true),
    chip("ST25TB512-AC", 0x1B, 16, BlockSize::Four, 255, false),
    chip("ST25TB04K", 0x1F, 128, BlockSize::Four, 255, false),
    chip("ST25TB512-AT", 0x33, 16, BlockSize::Four, 255, false),
    chip("ST25TB02K", 0x3F, 64, BlockSize::Four, 255, false),
];

/// Build the SRx target from a GET_UID answer (8 bytes, LSB first).
pub fn parse_uid(frame: &[u8]) -> Result<Target> {
    parser::ensure_exact_len(frame, 8)?;
    Ok(Target::Iso14443b2sr {
        uid: parser::array_at(frame, 0)?,
    })
}

/// Derived chip information of an SRx target.
pub fn target_info(target: &Target) -> Result<St25tbInfo> {
    match target {
        Target::Iso14443b2sr { uid } => St25tbInfo::from_uid(uid).ok_or_else(|| {
            Error::DeviceNotSupported(format!(
                "unknown SRx chip {}",
                crate::utils::bytes_to_hex(uid)
            ))
        }),
        other => Err(Error::InvalidParameter(format!(
            "not an SRx target: {:?}",
            other.modulation()
        ))),
    }
}
