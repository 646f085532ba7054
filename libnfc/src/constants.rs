// libnfc/src/constants.rs
//! Common protocol constants used across the crate

/// Maximum classic frame length (ISO14443 / PN53x buffer size)
pub const MAX_FRAME_LEN: usize = 264;

/// Maximum frame length for FeliCa and DEP payloads
pub const MAX_EXTENDED_FRAME_LEN: usize = 1024;

/// CRC_A preset value (ISO/IEC 14443-3 Type A)
pub const CRC_A_PRESET: u16 = 0x6363;

/// CRC_B preset value (ISO/IEC 14443-3 Type B), result is complemented
pub const CRC_B_PRESET: u16 = 0xFFFF;

/// ISO14443-A short frames (7 bits)
pub const ISO14443A_REQA: u8 = 0x26;
pub const ISO14443A_WUPA: u8 = 0x52;
pub const SHORT_FRAME_BITS: usize = 7;

/// Cascade level SEL codes
pub const ISO14443A_SEL_CL1: u8 = 0x93;
pub const ISO14443A_SEL_CL2: u8 = 0x95;
pub const ISO14443A_SEL_CL3: u8 = 0x97;

/// NVB for a full anti-collision request and for a full SELECT
pub const ISO14443A_NVB_ANTICOLLISION: u8 = 0x20;
pub const ISO14443A_NVB_SELECT: u8 = 0x70;

/// Cascade tag prefixed to UID chunks at non-final cascade levels
pub const ISO14443A_CASCADE_TAG: u8 = 0x88;

/// SAK bits
pub const SAK_CASCADE_BIT: u8 = 0x04;
pub const SAK_ISO14443_4_COMPLIANT: u8 = 0x20;

pub const ISO14443A_HALT: [u8; 2] = [0x50, 0x00];
pub const ISO14443A_RATS: u8 = 0xE0;
/// Default RATS parameter: FSDI = 5 (64 bytes), CID = 0
pub const ISO14443A_RATS_PARAM_DEFAULT: u8 = 0x50;
/// ISO14443-4 S(DESELECT) block PCB
pub const ISO14443_4_S_DESELECT: u8 = 0xC2;

/// "Chinese backdoor" magic card commands
pub const MAGIC_WAKEUP_1: u8 = 0x40;
pub const MAGIC_WAKEUP_2: u8 = 0x43;
pub const MAGIC_WIPE: u8 = 0x41;

/// MIFARE commands used by the Type 2 emulation and magic-card writer
pub const MIFARE_READ: u8 = 0x30;
pub const MIFARE_WRITE: u8 = 0xA0;
pub const MIFARE_ULTRALIGHT_WRITE: u8 = 0xA2;
/// 4-bit ACK returned by MIFARE tags
pub const MIFARE_ACK: u8 = 0x0A;

/// ISO14443-B
pub const ISO14443B_APF: u8 = 0x05;
pub const ISO14443B_ATQB: u8 = 0x50;

/// ST25TB / SR commands
pub const ST25TB_INITIATE: [u8; 2] = [0x06, 0x00];
pub const ST25TB_SELECT: u8 = 0x0E;
pub const ST25TB_GET_UID: u8 = 0x0B;
pub const ST25TB_COMPLETION: u8 = 0x0F;
pub const ST25TB_READ_BLOCK: u8 = 0x08;
pub const ST25TB_WRITE_BLOCK: u8 = 0x09;
/// Manufacturer code of STMicroelectronics as found in `uid[7]`
pub const ST_MANUFACTURER_CODE: u8 = 0xD0;

/// FeliCa command codes
pub const FELICA_CMD_POLLING: u8 = 0x00;
pub const FELICA_CMD_CHECK: u8 = 0x06;
pub const FELICA_CMD_UPDATE: u8 = 0x08;
pub const FELICA_BLOCK_LEN: usize = 16;

/// Jewel / Topaz memory image size (15 blocks of 8 bytes)
pub const JEWEL_DUMP_LEN: usize = 120;
pub const JEWEL_BLOCK_LEN: usize = 8;

/// NFCIP-1 command prefixes (initiator -> target, target -> initiator)
pub const DEP_CMD0_REQ: u8 = 0xD4;
pub const DEP_CMD0_RES: u8 = 0xD5;
/// Maximum number of general bytes carried by ATR_REQ / ATR_RES
pub const DEP_MAX_GENERAL_BYTES: usize = 48;
pub const NFCID3_LEN: usize = 10;
