// libnfc/src/initiator/jewel.rs

//! Jewel / Topaz selection and memory access.

use crate::constants::JEWEL_BLOCK_LEN;
use crate::device::{Device, InitiatorMode};
use crate::initiator::silent_as_none;
use crate::protocol::iso14443a;
use crate::protocol::jewel::{JewelDump, JewelRequest, JewelResponse, byte_address};
use crate::protocol::parser;
use crate::transport::Transport;
use crate::types::Target;
use crate::utils::Timeout;
use crate::{Error, Result};

/// First and last user data block of static memory.
const DATA_BLOCKS: std::ops::RangeInclusive<u8> = 0x01..=0x0c;

/// REQA then RID. Jewel tags skip anticollision entirely.
pub fn select(transport: &mut dyn Transport, timeout: Timeout) -> Result<Option<Target>> {
    let Some(atqa) = silent_as_none(transport.transceive_bits(&iso14443a::reqa(), timeout))? else {
        return Ok(None);
    };
    let atqa: [u8; 2] = parser::array_at(atqa.bytes(), 0)?;

    let rid = JewelRequest::Rid;
    let rx = transport.transceive_bytes(&rid.encode(), timeout)?;
    match JewelResponse::decode(rid.opcode(), &rx)? {
        JewelResponse::Rid { header, uid } => {
            log::debug!("jewel HR {:02x?}", header);
            Ok(Some(Target::Jewel { atqa, id: uid }))
        }
        _ => Err(Error::RfProtocolError("RID answer expected".into())),
    }
}

/// Static memory access to the selected Jewel tag.
pub struct JewelTag<'a> {
    device: &'a mut Device<InitiatorMode>,
    uid: [u8; 4],
}

impl<'a> JewelTag<'a> {
    pub fn new(device: &'a mut Device<InitiatorMode>) -> Result<Self> {
        let uid = match device.selected_target() {
            Some(Target::Jewel { id, .. }) => *id,
            _ => return Err(Error::InvalidParameter("no Jewel tag selected".into())),
        };
        Ok(Self { device, uid })
    }

    pub fn exchange(&mut self, request: &JewelRequest) -> Result<JewelResponse> {
        let rx = self.device.transceive_bytes(&request.encode())?;
        JewelResponse::decode(request.opcode(), &rx)
    }

    pub fn read_all(&mut self) -> Result<JewelDump> {
        match self.exchange(&JewelRequest::Rall { uid: self.uid })? {
            JewelResponse::Rall { dump, .. } => Ok(dump),
            _ => Err(Error::RfProtocolError("RALL answer expected".into())),
        }
    }

    pub fn read_byte(&mut self, block: u8, byte: u8) -> Result<u8> {
        let address = byte_address(block, byte)?;
        self.byte_exchange(JewelRequest::Read {
            uid: self.uid,
            address,
        })
    }

    /// Write one byte; `erase` selects WRITE-E over the OR-ing WRITE-NE.
    pub fn write_byte(&mut self, block: u8, byte: u8, data: u8, erase: bool) -> Result<()> {
        let address = byte_address(block, byte)?;
        let uid = self.uid;
        let request = if erase {
            JewelRequest::WriteE { uid, address, data }
        } else {
            JewelRequest::WriteNe { uid, address, data }
        };
        let written = self.byte_exchange(request)?;
        if erase && written != data {
            return Err(Error::RfProtocolError(format!(
                "byte {:02x} holds {:02x} after writing {:02x}",
                address, written, data
            )));
        }
        Ok(())
    }

    fn byte_exchange(&mut self, request: JewelRequest) -> Result<u8> {
        match self.exchange(&request)? {
            JewelResponse::Byte { data, .. } => Ok(data),
            _ => Err(Error::RfProtocolError("byte answer expected".into())),
        }
    }

    /// READ8; only Topaz 512 parts implement it.
    pub fn read_block(&mut self, block: u8) -> Result<[u8; JEWEL_BLOCK_LEN]> {
        self.block_exchange(JewelRequest::Read8 {
            uid: self.uid,
            block,
        })
    }

    pub fn write_block(&mut self, block: u8, data: [u8; JEWEL_BLOCK_LEN], erase: bool) -> Result<()> {
        let uid = self.uid;
        let request = if erase {
            JewelRequest::WriteE8 { uid, block, data }
        } else {
            JewelRequest::WriteNe8 { uid, block, data }
        };
        self.block_exchange(request).map(|_| ())
    }

    fn block_exchange(&mut self, request: JewelRequest) -> Result<[u8; JEWEL_BLOCK_LEN]> {
        match self.exchange(&request)? {
            JewelResponse::Block { data, .. } => Ok(data),
            _ => Err(Error::RfProtocolError("block answer expected".into())),
        }
    }

    /// Write the data blocks of `dump` back byte by byte. The UID, reserved
    /// and lock blocks are left untouched.
    pub fn restore(&mut self, dump: &JewelDump) -> Result<()> {
        for block in DATA_BLOCKS {
            let data = dump
                .block(usize::from(block))
                .ok_or_else(|| Error::InvalidParameter(format!("dump has no block {}", block)))?
                .to_vec();
            for (byte, value) in data.into_iter().enumerate() {
                self.write_byte(block, byte as u8, value, true)?;
            }
        }
        log::debug!("jewel data blocks restored");
        Ok(())
    }
}
