// libnfc/src/dep/frame.rs

//! NFCIP-1 transport frames: `[LEN][CMD0][CMD1][body...]`, where LEN counts
//! itself, CMD0 is 0xD4 from the initiator and 0xD5 from the target.

use crate::constants::{DEP_CMD0_REQ, DEP_CMD0_RES, DEP_MAX_GENERAL_BYTES};
use crate::protocol::parser;
use crate::types::{BaudRate, DepInfo, DepMode, Nfcid3};
use crate::{Error, Result};

pub const ATR_REQ: u8 = 0x00;
pub const ATR_RES: u8 = 0x01;
pub const PSL_REQ: u8 = 0x04;
pub const PSL_RES: u8 = 0x05;
pub const DEP_REQ: u8 = 0x06;
pub const DEP_RES: u8 = 0x07;
pub const DSL_REQ: u8 = 0x08;
pub const DSL_RES: u8 = 0x09;
pub const RLS_REQ: u8 = 0x0a;
pub const RLS_RES: u8 = 0x0b;

/// PP bit: general bytes follow
pub const PP_GENERAL_BYTES: u8 = 0x02;
/// PP bit: NAD in use
pub const PP_NAD: u8 = 0x01;
/// Length reduction field of PP for 254-byte frames
pub const PP_LR_254: u8 = 0x30;

/// BS/BR: 212, 424 and 847 kbps supported
pub const ALL_BIT_RATES: u8 = 0x07;
/// Default TO of ATR_RES (RWT ~ 302 µs * 2^14)
pub const DEFAULT_TO: u8 = 0x0e;

const PFB_MI: u8 = 0x10;
const PFB_NAD: u8 = 0x08;
const PFB_DID: u8 = 0x04;
const PFB_PNI: u8 = 0x03;

/// Maximum frame size encoded by the LR bits of PP.
pub fn length_reduction_bytes(pp: u8) -> usize {
    [64, 128, 192, 254][usize::from((pp >> 4) & 0x03)]
}

fn build(cmd0: u8, cmd1: u8, body: &[u8]) -> Result<Vec<u8>> {
    let len = 3 + body.len();
    if len > u8::MAX as usize {
        return Err(Error::BufferOverflow {
            limit: u8::MAX as usize,
            actual: len,
        });
    }
    let mut frame = Vec::with_capacity(len);
    frame.extend_from_slice(&[len as u8, cmd0, cmd1]);
    frame.extend_from_slice(body);
    Ok(frame)
}

/// Check LEN and CMD0, return CMD1 and the body.
fn open(frame: &[u8], cmd0: u8) -> Result<(u8, &[u8])> {
    parser::ensure_len(frame, 3)?;
    let len = usize::from(frame[0]);
    if len != frame.len() {
        return Err(Error::InvalidLength {
            expected: len,
            actual: frame.len(),
        });
    }
    parser::expect_byte(frame, 1, cmd0)?;
    Ok((frame[2], &frame[3..]))
}

fn expect_cmd(actual: u8, expected: u8) -> Result<()> {
    if actual != expected {
        return Err(Error::UnexpectedResponse { expected, actual });
    }
    Ok(())
}

fn check_general_bytes(gb: &[u8]) -> Result<()> {
    if gb.len() > DEP_MAX_GENERAL_BYTES {
        return Err(Error::BufferOverflow {
            limit: DEP_MAX_GENERAL_BYTES,
            actual: gb.len(),
        });
    }
    Ok(())
}

fn pp_with_gb(pp: u8, gb: &[u8]) -> u8 {
    if gb.is_empty() {
        pp & !PP_GENERAL_BYTES
    } else {
        pp | PP_GENERAL_BYTES
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AtrReq {
    pub nfcid3: Nfcid3,
    pub did: u8,
    pub bs: u8,
    pub br: u8,
    pub pp: u8,
    pub general_bytes: Vec<u8>,
}

impl AtrReq {
    pub fn new(nfcid3: Nfcid3, general_bytes: Vec<u8>) -> Self {
        Self {
            nfcid3,
            did: 0,
            bs: ALL_BIT_RATES,
            br: ALL_BIT_RATES,
            pp: PP_LR_254,
            general_bytes,
        }
    }

    pub fn encode(&self) -> Result<Vec<u8>> {
        check_general_bytes(&self.general_bytes)?;
        let mut body = Vec::with_capacity(14 + self.general_bytes.len());
        body.extend_from_slice(self.nfcid3.as_bytes());
        body.extend_from_slice(&[
            self.did,
            self.bs,
            self.br,
            pp_with_gb(self.pp, &self.general_bytes),
        ]);
        body.extend_from_slice(&self.general_bytes);
        build(DEP_CMD0_REQ, ATR_REQ, &body)
    }

    pub fn decode(frame: &[u8]) -> Result<Self> {
        let (cmd, body) = open(frame, DEP_CMD0_REQ)?;
        expect_cmd(cmd, ATR_REQ)?;
        Self::from_body(body)
    }

    fn from_body(body: &[u8]) -> Result<Self> {
        parser::ensure_len(body, 14)?;
        let general_bytes = body[14..].to_vec();
        check_general_bytes(&general_bytes)?;
        Ok(Self {
            nfcid3: Nfcid3::try_from(&body[..10])?,
            did: body[10],
            bs: body[11],
            br: body[12],
            pp: body[13],
            general_bytes,
        })
    }

    /// Initiator description as seen by the target.
    pub fn into_info(self, mode: DepMode, baud: BaudRate) -> DepInfo {
        DepInfo {
            nfcid3: self.nfcid3,
            did: self.did,
            bs: self.bs,
            br: self.br,
            to: 0,
            pp: self.pp,
            general_bytes: self.general_bytes,
            mode,
            baud,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AtrRes {
    pub nfcid3: Nfcid3,
    pub did: u8,
    pub bs: u8,
    pub br: u8,
    pub to: u8,
    pub pp: u8,
    pub general_bytes: Vec<u8>,
}

impl AtrRes {
    pub fn new(nfcid3: Nfcid3, did: u8, general_bytes: Vec<u8>) -> Self {
        Self {
            nfcid3,
            did,
            bs: ALL_BIT_RATES,
            br: ALL_BIT_RATES,
            to: DEFAULT_TO,
            pp: PP_LR_254,
            general_bytes,
        }
    }

    pub fn encode(&self) -> Result<Vec<u8>> {
        check_general_bytes(&self.general_bytes)?;
        let mut body = Vec::with_capacity(15 + self.general_bytes.len());
        body.extend_from_slice(self.nfcid3.as_bytes());
        body.extend_from_slice(&[
            self.did,
            self.bs,
            self.br,
            self.to,
            pp_with_gb(self.pp, &self.general_bytes),
        ]);
        body.extend_from_slice(&self.general_bytes);
        build(DEP_CMD0_RES, ATR_RES, &body)
    }

    pub fn decode(frame: &[u8]) -> Result<Self> {
        let (cmd, body) = open(frame, DEP_CMD0_RES)?;
        expect_cmd(cmd, ATR_RES)?;
        parser::ensure_len(body, 15)?;
        let general_bytes = body[15..].to_vec();
        check_general_bytes(&general_bytes)?;
        Ok(Self {
            nfcid3: Nfcid3::try_from(&body[..10])?,
            did: body[10],
            bs: body[11],
            br: body[12],
            to: body[13],
            pp: body[14],
            general_bytes,
        })
    }

    /// Target description as seen by the initiator.
    pub fn into_info(self, mode: DepMode, baud: BaudRate) -> DepInfo {
        DepInfo {
            nfcid3: self.nfcid3,
            did: self.did,
            bs: self.bs,
            br: self.br,
            to: self.to,
            pp: self.pp,
            general_bytes: self.general_bytes,
            mode,
            baud,
        }
    }
}

/// PFB byte of DEP_REQ / DEP_RES.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pfb {
    Information { more: bool, pni: u8 },
    Ack { pni: u8 },
    Nack { pni: u8 },
    /// Supervisory ATN
    Attention,
    /// Supervisory RTOX
    TimeoutExtension,
}

impl Pfb {
    pub fn to_byte(self) -> u8 {
        match self {
            Pfb::Information { more, pni } => (if more { PFB_MI } else { 0 }) | (pni & PFB_PNI),
            Pfb::Ack { pni } => 0x40 | (pni & PFB_PNI),
            Pfb::Nack { pni } => 0x40 | PFB_MI | (pni & PFB_PNI),
            Pfb::Attention => 0x80,
            Pfb::TimeoutExtension => 0x80 | PFB_MI,
        }
    }

    pub fn from_byte(b: u8) -> Result<Self> {
        let pni = b & PFB_PNI;
        let flag = b & PFB_MI != 0;
        match b >> 5 {
            0 => Ok(Pfb::Information { more: flag, pni }),
            2 if flag => Ok(Pfb::Nack { pni }),
            2 => Ok(Pfb::Ack { pni }),
            4 if flag => Ok(Pfb::TimeoutExtension),
            4 => Ok(Pfb::Attention),
            _ => Err(Error::RfProtocolError(format!("invalid PFB {:02x}", b))),
        }
    }
}

/// Next packet number.
pub fn next_pni(pni: u8) -> u8 {
    (pni + 1) & PFB_PNI
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DepPdu {
    pub pfb: Pfb,
    pub payload: Vec<u8>,
}

impl DepPdu {
    pub fn information(more: bool, pni: u8, payload: &[u8]) -> Self {
        Self {
            pfb: Pfb::Information { more, pni },
            payload: payload.to_vec(),
        }
    }

    pub fn ack(pni: u8) -> Self {
        Self {
            pfb: Pfb::Ack { pni },
            payload: Vec::new(),
        }
    }

    pub fn attention() -> Self {
        Self {
            pfb: Pfb::Attention,
            payload: Vec::new(),
        }
    }

    /// RTOX carrying the timeout multiplier (1..=59).
    pub fn timeout_extension(rtox: u8) -> Self {
        Self {
            pfb: Pfb::TimeoutExtension,
            payload: vec![rtox],
        }
    }

    pub fn rtox(&self) -> Option<u8> {
        match self.pfb {
            Pfb::TimeoutExtension => self.payload.first().copied(),
            _ => None,
        }
    }

    /// DEP_REQ when `request`, DEP_RES otherwise.
    pub fn encode(&self, request: bool) -> Result<Vec<u8>> {
        let (cmd0, cmd1) = if request {
            (DEP_CMD0_REQ, DEP_REQ)
        } else {
            (DEP_CMD0_RES, DEP_RES)
        };
        let mut body = Vec::with_capacity(1 + self.payload.len());
        body.push(self.pfb.to_byte());
        body.extend_from_slice(&self.payload);
        build(cmd0, cmd1, &body)
    }

    pub fn decode(frame: &[u8], request: bool) -> Result<Self> {
        let (cmd0, cmd1) = if request {
            (DEP_CMD0_REQ, DEP_REQ)
        } else {
            (DEP_CMD0_RES, DEP_RES)
        };
        let (cmd, body) = open(frame, cmd0)?;
        expect_cmd(cmd, cmd1)?;
        Self::from_body(body)
    }

    fn from_body(body: &[u8]) -> Result<Self> {
        let raw = parser::byte_at(body, 0)?;
        let pfb = Pfb::from_byte(raw)?;
        // skip DID and NAD when flagged
        let skip = 1 + usize::from(raw & PFB_DID != 0) + usize::from(raw & PFB_NAD != 0);
        parser::ensure_len(body, skip)?;
        Ok(Self {
            pfb,
            payload: body[skip..].to_vec(),
        })
    }
}

/// PSL_REQ switching both directions to `baud` with frame size `fsl`.
pub fn psl_req(did: u8, baud: BaudRate, fsl: u8) -> Result<Vec<u8>> {
    let n = baud.divisor_exponent();
    build(DEP_CMD0_REQ, PSL_REQ, &[did, (n << 3) | n, fsl & 0x03])
}

pub fn psl_res(did: u8) -> Result<Vec<u8>> {
    build(DEP_CMD0_RES, PSL_RES, &[did])
}

fn did_body(did: u8) -> Vec<u8> {
    if did == 0 { Vec::new() } else { vec![did] }
}

pub fn dsl_req(did: u8) -> Result<Vec<u8>> {
    build(DEP_CMD0_REQ, DSL_REQ, &did_body(did))
}

pub fn dsl_res(did: u8) -> Result<Vec<u8>> {
    build(DEP_CMD0_RES, DSL_RES, &did_body(did))
}

pub fn rls_req(did: u8) -> Result<Vec<u8>> {
    build(DEP_CMD0_REQ, RLS_REQ, &did_body(did))
}

pub fn rls_res(did: u8) -> Result<Vec<u8>> {
    build(DEP_CMD0_RES, RLS_RES, &did_body(did))
}

/// Check a target answer of type `cmd1` and return its body.
pub fn expect_response(frame: &[u8], cmd1: u8) -> Result<&[u8]> {
    let (cmd, body) = open(frame, DEP_CMD0_RES)?;
    expect_cmd(cmd, cmd1)?;
    Ok(body)
}

/// Any frame an initiator sends to a target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InitiatorFrame {
    Atr(AtrReq),
    Psl { did: u8, baud: BaudRate, fsl: u8 },
    Dep(DepPdu),
    Dsl,
    Rls,
}

impl InitiatorFrame {
    pub fn decode(frame: &[u8]) -> Result<Self> {
        let (cmd, body) = open(frame, DEP_CMD0_REQ)?;
        match cmd {
            ATR_REQ => AtrReq::from_body(body).map(InitiatorFrame::Atr),
            PSL_REQ => {
                parser::ensure_exact_len(body, 3)?;
                let baud = BaudRate::from_divisor_exponent(body[1] & 0x07).ok_or_else(|| {
                    Error::RfProtocolError(format!("PSL bit rate {:02x}", body[1]))
                })?;
                Ok(InitiatorFrame::Psl {
                    did: body[0],
                    baud,
                    fsl: body[2] & 0x03,
                })
            }
            DEP_REQ => DepPdu::from_body(body).map(InitiatorFrame::Dep),
            DSL_REQ => Ok(InitiatorFrame::Dsl),
            RLS_REQ => Ok(InitiatorFrame::Rls),
            other => Err(Error::CommandNotSupported(format!("NFCIP-1 command {:02x}", other))),
        }
    }
}
