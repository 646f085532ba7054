// libnfc/src/types.rs

use crate::Error;
use crate::utils::bytes_to_hex_spaced;
use std::convert::TryFrom;
use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Contactless modulation family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ModulationType {
    Iso14443a,
    Iso14443b,
    /// ISO14443-B' (Innovatron)
    Iso14443bi,
    /// ISO14443-2B ST SRx / ST25TB
    Iso14443b2sr,
    /// ISO14443-2B ASK CTx
    Iso14443b2ct,
    Felica,
    Jewel,
    Barcode,
    Dep,
}

/// Bit rate of the RF link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum BaudRate {
    #[display(fmt = "106 kbps")]
    Baud106,
    #[display(fmt = "212 kbps")]
    Baud212,
    #[display(fmt = "424 kbps")]
    Baud424,
    #[display(fmt = "847 kbps")]
    Baud847,
}

impl BaudRate {
    /// Divisor exponent used by PSL_REQ / ATR bit-rate fields (106 << n).
    pub fn divisor_exponent(self) -> u8 {
        match self {
            BaudRate::Baud106 => 0,
            BaudRate::Baud212 => 1,
            BaudRate::Baud424 => 2,
            BaudRate::Baud847 => 3,
        }
    }

    pub fn from_divisor_exponent(n: u8) -> Option<Self> {
        match n {
            0 => Some(BaudRate::Baud106),
            1 => Some(BaudRate::Baud212),
            2 => Some(BaudRate::Baud424),
            3 => Some(BaudRate::Baud847),
            _ => None,
        }
    }
}

/// Immutable descriptor of how a target communicates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Modulation {
    pub kind: ModulationType,
    pub baud: BaudRate,
}

impl Modulation {
    pub const ISO14443A_106: Self = Self::new(ModulationType::Iso14443a, BaudRate::Baud106);
    pub const ISO14443B_106: Self = Self::new(ModulationType::Iso14443b, BaudRate::Baud106);
    pub const ISO14443B2SR_106: Self = Self::new(ModulationType::Iso14443b2sr, BaudRate::Baud106);
    pub const FELICA_212: Self = Self::new(ModulationType::Felica, BaudRate::Baud212);
    pub const FELICA_424: Self = Self::new(ModulationType::Felica, BaudRate::Baud424);
    pub const JEWEL_106: Self = Self::new(ModulationType::Jewel, BaudRate::Baud106);

    pub const fn new(kind: ModulationType, baud: BaudRate) -> Self {
        Self { kind, baud }
    }
}

/// ISO14443-A UID (4, 7 or 10 bytes)
#[derive(Debug, Clone, PartialEq, Eq, Hash, derive_more::Deref)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Uid(Vec<u8>);

impl Uid {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Number of cascade levels needed to transmit this UID.
    pub fn cascade_levels(&self) -> usize {
        match self.0.len() {
            4 => 1,
            7 => 2,
            _ => 3,
        }
    }

    pub fn to_hex(&self) -> String {
        crate::utils::bytes_to_hex(&self.0)
    }
}

impl TryFrom<&[u8]> for Uid {
    type Error = Error;

    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        match bytes.len() {
            4 | 7 | 10 => Ok(Self(bytes.to_vec())),
            n => Err(Error::InvalidParameter(format!(
                "uid must be 4, 7 or 10 bytes, got {}",
                n
            ))),
        }
    }
}

/// IDm - Newtype Pattern (8 バイト)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, derive_more::From)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Idm([u8; 8]);

impl Idm {
    pub fn from_bytes(bytes: [u8; 8]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 8] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        crate::utils::bytes_to_hex(self.as_bytes())
    }
}

impl TryFrom<&[u8]> for Idm {
    type Error = Error;

    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        if bytes.len() != 8 {
            return Err(Error::InvalidLength {
                expected: 8,
                actual: bytes.len(),
            });
        }
        let mut arr = [0u8; 8];
        arr.copy_from_slice(&bytes[..8]);
        Ok(Self(arr))
    }
}

/// PMm - Newtype Pattern (8 バイト)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, derive_more::From)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Pmm([u8; 8]);

impl Pmm {
    pub fn from_bytes(bytes: [u8; 8]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 8] {
        &self.0
    }
}

impl TryFrom<&[u8]> for Pmm {
    type Error = Error;

    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        if bytes.len() != 8 {
            return Err(Error::InvalidLength {
                expected: 8,
                actual: bytes.len(),
            });
        }
        let mut arr = [0u8; 8];
        arr.copy_from_slice(&bytes[..8]);
        Ok(Self(arr))
    }
}

/// SystemCode (u16), transmitted MSB first
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SystemCode(u16);

impl SystemCode {
    pub const ANY: Self = Self(0xffff);
    pub const COMMON: Self = Self(0xfe00);
    pub const NDEF: Self = Self(0x12fc);

    pub const fn new(code: u16) -> Self {
        Self(code)
    }

    pub fn as_u16(&self) -> u16 {
        self.0
    }

    pub fn to_be_bytes(&self) -> [u8; 2] {
        self.0.to_be_bytes()
    }

    pub fn from_be_bytes(bytes: [u8; 2]) -> Self {
        Self(u16::from_be_bytes(bytes))
    }
}

/// ServiceCode (u16), transmitted LSB first
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ServiceCode(u16);

impl ServiceCode {
    pub const fn new(code: u16) -> Self {
        Self(code)
    }

    pub fn as_u16(&self) -> u16 {
        self.0
    }

    pub fn to_le_bytes(&self) -> [u8; 2] {
        self.0.to_le_bytes()
    }
}

/// BlockData (16 バイト)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockData([u8; 16]);

impl BlockData {
    pub fn from_bytes(bytes: [u8; 16]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 16] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        crate::utils::bytes_to_hex_spaced(self.as_bytes())
    }
}

/// FeliCa block access mode (bits 6-4 of the block list element)
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessMode {
    Normal = 0,
    CashBack = 1,
}

/// FeliCa block list element
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockElement {
    pub service_index: u8,
    pub access_mode: AccessMode,
    pub block_number: u16,
}

impl BlockElement {
    pub fn new(service_index: u8, access_mode: AccessMode, block_number: u16) -> Self {
        Self {
            service_index,
            access_mode,
            block_number,
        }
    }

    /// Encode the element: the 2-byte form is used for block numbers below
    /// 256, the 3-byte form (block number LSB first) otherwise.
    pub fn encode(&self) -> Vec<u8> {
        let head = ((self.access_mode as u8) << 4) | (self.service_index & 0x0f);
        if self.block_number < 0x100 {
            vec![0x80 | head, self.block_number as u8]
        } else {
            let [lo, hi] = self.block_number.to_le_bytes();
            vec![head, lo, hi]
        }
    }

    pub fn encoded_len(&self) -> usize {
        if self.block_number < 0x100 { 2 } else { 3 }
    }
}

/// NFCID3 used during DEP (ATR_REQ / ATR_RES)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, derive_more::From, derive_more::AsRef)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Nfcid3([u8; 10]);

impl Nfcid3 {
    pub fn as_bytes(&self) -> &[u8; 10] {
        &self.0
    }
}

impl TryFrom<&[u8]> for Nfcid3 {
    type Error = Error;

    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        let arr: [u8; 10] = bytes.try_into().map_err(|_| Error::InvalidLength {
            expected: 10,
            actual: bytes.len(),
        })?;
        Ok(Self(arr))
    }
}

/// NFCIP-1 communication mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum DepMode {
    Passive,
    Active,
}

/// DEP peer description built from ATR_RES (initiator side) or ATR_REQ (target side)
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DepInfo {
    pub nfcid3: Nfcid3,
    pub did: u8,
    /// Supported send bit rates (BS)
    pub bs: u8,
    /// Supported receive bit rates (BR)
    pub br: u8,
    /// Timeout value (only meaningful for ATR_RES)
    pub to: u8,
    /// Optional parameters (length reduction, general bytes present, NAD used)
    pub pp: u8,
    pub general_bytes: Vec<u8>,
    pub mode: DepMode,
    pub baud: BaudRate,
}

impl DepInfo {
    /// Bit rates supported in both directions, always including 106 kbps.
    pub fn supported_baud_rates(&self) -> Vec<BaudRate> {
        let mut out = vec![BaudRate::Baud106];
        for n in 1..=3u8 {
            let bit = 1u8 << (n - 1);
            if self.bs & bit != 0 && self.br & bit != 0 {
                if let Some(b) = BaudRate::from_divisor_exponent(n) {
                    out.push(b);
                }
            }
        }
        out
    }
}

/// A resolved target. Each variant holds only the fields meaningful for its
/// modulation.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Target {
    Iso14443a {
        atqa: [u8; 2],
        sak: u8,
        uid: Uid,
        /// ATS without TL and CRC (starts at T0); empty when not supported
        ats: Vec<u8>,
    },
    Iso14443b {
        pupi: [u8; 4],
        application_data: [u8; 4],
        protocol_info: [u8; 3],
    },
    Iso14443b2sr {
        /// UID, LSB first: `uid[7]` is the manufacturer byte
        uid: [u8; 8],
    },
    Felica {
        idm: Idm,
        pmm: Pmm,
        system_code: SystemCode,
        baud: BaudRate,
    },
    Jewel {
        atqa: [u8; 2],
        id: [u8; 4],
    },
    Barcode {
        data: Vec<u8>,
    },
    Dep(DepInfo),
}

impl Target {
    pub fn modulation(&self) -> Modulation {
        match self {
            Target::Iso14443a { .. } => Modulation::ISO14443A_106,
            Target::Iso14443b { .. } => Modulation::ISO14443B_106,
            Target::Iso14443b2sr { .. } => Modulation::ISO14443B2SR_106,
            Target::Felica { baud, .. } => Modulation::new(ModulationType::Felica, *baud),
            Target::Jewel { .. } => Modulation::JEWEL_106,
            Target::Barcode { .. } => Modulation::new(ModulationType::Barcode, BaudRate::Baud106),
            Target::Dep(info) => Modulation::new(ModulationType::Dep, info.baud),
        }
    }

    /// Identifier bytes of the target, whatever its modulation.
    pub fn id_bytes(&self) -> &[u8] {
        match self {
            Target::Iso14443a { uid, .. } => uid.as_bytes(),
            Target::Iso14443b { pupi, .. } => pupi,
            Target::Iso14443b2sr { uid } => uid,
            Target::Felica { idm, .. } => idm.as_bytes(),
            Target::Jewel { id, .. } => id,
            Target::Barcode { data } => data,
            Target::Dep(info) => info.nfcid3.as_bytes(),
        }
    }

    /// True for ISO14443-A targets that answered RATS.
    pub fn is_iso14443_4(&self) -> bool {
        matches!(self, Target::Iso14443a { ats, .. } if !ats.is_empty())
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::Iso14443a {
                atqa,
                sak,
                uid,
                ats,
            } => {
                write!(
                    f,
                    "ISO/IEC 14443A ATQA: {} UID: {} SAK: {:02x}",
                    bytes_to_hex_spaced(atqa),
                    bytes_to_hex_spaced(uid),
                    sak
                )?;
                if !ats.is_empty() {
                    write!(f, " ATS: {}", bytes_to_hex_spaced(ats))?;
                }
                Ok(())
            }
            Target::Iso14443b {
                pupi,
                application_data,
                protocol_info,
            } => write!(
                f,
                "ISO/IEC 14443-4B PUPI: {} APP: {} PROTO: {}",
                bytes_to_hex_spaced(pupi),
                bytes_to_hex_spaced(application_data),
                bytes_to_hex_spaced(protocol_info)
            ),
            Target::Iso14443b2sr { uid } => {
                write!(f, "ISO/IEC 14443-2B ST SRx UID: {}", bytes_to_hex_spaced(uid))
            }
            Target::Felica {
                idm,
                pmm,
                system_code,
                baud,
            } => write!(
                f,
                "FeliCa ({}) IDm: {} PMm: {} SC: {:04x}",
                baud,
                bytes_to_hex_spaced(idm.as_bytes()),
                bytes_to_hex_spaced(pmm.as_bytes()),
                system_code.as_u16()
            ),
            Target::Jewel { atqa, id } => write!(
                f,
                "Innovision Jewel ATQA: {} ID: {}",
                bytes_to_hex_spaced(atqa),
                bytes_to_hex_spaced(id)
            ),
            Target::Barcode { data } => write!(f, "Thinfilm barcode: {}", bytes_to_hex_spaced(data)),
            Target::Dep(info) => write!(
                f,
                "D.E.P. ({:?}, {}) NFCID3: {} GB: {}",
                info.mode,
                info.baud,
                bytes_to_hex_spaced(info.nfcid3.as_bytes()),
                bytes_to_hex_spaced(&info.general_bytes)
            ),
        }
    }
}

/// A frame with an explicit bit length. Frames may end mid-byte (e.g. the
/// 7-bit REQA); the unused high bits of the last byte are ignored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BitFrame {
    data: Vec<u8>,
    bits: usize,
}

impl BitFrame {
    /// A whole-byte frame.
    pub fn from_bytes(data: impl Into<Vec<u8>>) -> Self {
        let data = data.into();
        let bits = data.len() * 8;
        Self { data, bits }
    }

    /// A frame with an explicit bit count; `data` must hold exactly
    /// `ceil(bits / 8)` bytes.
    pub fn with_bits(data: impl Into<Vec<u8>>, bits: usize) -> crate::Result<Self> {
        let data = data.into();
        if data.len() != bits.div_ceil(8) {
            return Err(Error::InvalidParameter(format!(
                "{} bits do not fit a {}-byte frame",
                bits,
                data.len()
            )));
        }
        Ok(Self { data, bits })
    }

    /// A 7-bit short frame (REQA, WUPA, magic wakeup).
    pub fn short(command: u8) -> Self {
        Self {
            data: vec![command & 0x7f],
            bits: crate::constants::SHORT_FRAME_BITS,
        }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn bit_len(&self) -> usize {
        self.bits
    }

    pub fn byte_len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bits == 0
    }

    pub fn is_whole_bytes(&self) -> bool {
        self.bits % 8 == 0
    }

    /// Number of valid bits in the last byte (0 when the frame is whole bytes).
    pub fn trailing_bits(&self) -> usize {
        self.bits % 8
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }
}
