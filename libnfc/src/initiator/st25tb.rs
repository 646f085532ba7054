// libnfc/src/initiator/st25tb.rs

//! ST SRx / ST25TB selection and block access. CRC_B is computed here, so
//! every exchange runs with hardware CRC disabled.

use crate::device::{Device, InitiatorMode};
use crate::initiator::{silent_as_none, without_hardware_crc};
use crate::protocol::crc::{append_crc_b, strip_crc_b};
use crate::protocol::iso14443b::{self, St25tbInfo};
use crate::protocol::parser;
use crate::transport::Transport;
use crate::types::Target;
use crate::utils::{Timeout, bytes_to_hex_spaced};
use crate::{Error, Result};

/// EEPROM programming time of one block.
const WRITE_CYCLE: Timeout = Timeout::Millis(5);

fn exchange(transport: &mut dyn Transport, frame: &[u8], timeout: Timeout) -> Result<Vec<u8>> {
    let mut tx = frame.to_vec();
    append_crc_b(&mut tx);
    let rx = transport.transceive_bytes(&tx, timeout)?;
    Ok(strip_crc_b(&rx)?.to_vec())
}

/// INITIATE, SELECT and GET_UID. `Ok(None)` when no tag answers INITIATE.
pub fn select(transport: &mut dyn Transport, timeout: Timeout) -> Result<Option<Target>> {
    without_hardware_crc(transport, |t| {
        let Some(rx) = silent_as_none(exchange(t, &iso14443b::initiate(), timeout))? else {
            return Ok(None);
        };
        parser::ensure_exact_len(&rx, 1)?;
        let chip_id = rx[0];

        let rx = exchange(t, &iso14443b::select(chip_id), timeout)?;
        parser::ensure_exact_len(&rx, 1)?;
        parser::expect_byte(&rx, 0, chip_id)?;

        let rx = exchange(t, &iso14443b::get_uid(), timeout)?;
        let target = iso14443b::parse_uid(&rx)?;
        log::debug!("SRx chip id {:02x}, {}", chip_id, target);
        Ok(Some(target))
    })
}

/// Block access to the selected SRx / ST25TB tag.
pub struct St25tbTag<'a> {
    device: &'a mut Device<InitiatorMode>,
    info: St25tbInfo,
}

impl<'a> St25tbTag<'a> {
    pub fn new(device: &'a mut Device<InitiatorMode>) -> Result<Self> {
        let target = device
            .selected_target()
            .ok_or_else(|| Error::InvalidParameter("no SRx tag selected".into()))?;
        let info = iso14443b::target_info(target)?;
        log::debug!("SRx family {}", info.name);
        Ok(Self { device, info })
    }

    pub fn info(&self) -> &St25tbInfo {
        &self.info
    }

    fn check_block(&self, block: u8) -> Result<()> {
        if !self.info.contains(block) {
            return Err(Error::InvalidParameter(format!(
                "{} has no block {}",
                self.info.name, block
            )));
        }
        Ok(())
    }

    pub fn read_block(&mut self, block: u8) -> Result<Vec<u8>> {
        self.check_block(block)?;
        let timeout = self.device.config().command_timeout;
        let rx = without_hardware_crc(self.device.transport_mut(), |t| {
            exchange(t, &iso14443b::read_block(block), timeout)
        })?;
        parser::ensure_exact_len(&rx, self.info.block_size.bytes())?;
        Ok(rx)
    }

    /// Write one block and read it back; WRITE_BLOCK itself is never
    /// answered.
    pub fn write_block(&mut self, block: u8, data: &[u8]) -> Result<()> {
        self.check_block(block)?;
        let frame = iso14443b::write_block(block, data, self.info.block_size)?;
        let timeout = self.device.config().command_timeout;
        without_hardware_crc(self.device.transport_mut(), |t| {
            match exchange(t, &frame, timeout) {
                Ok(_) => Ok(()),
                Err(e) if e.is_timeout() => Ok(()),
                Err(e) => Err(e),
            }
        })?;
        self.device.abort_handle().sleep(WRITE_CYCLE)?;

        let back = self.read_block(block)?;
        if back != data {
            return Err(Error::RfProtocolError(format!(
                "block {} reads back {} after writing {}",
                block,
                bytes_to_hex_spaced(&back),
                bytes_to_hex_spaced(data)
            )));
        }
        Ok(())
    }

    /// Send COMPLETION; the tag stays silent until the field is reset.
    pub fn completion(self) -> Result<()> {
        let timeout = self.device.config().command_timeout;
        without_hardware_crc(self.device.transport_mut(), |t| {
            match exchange(t, &iso14443b::completion(), timeout) {
                Err(e) if !e.is_timeout() => Err(e),
                _ => Ok(()),
            }
        })?;
        self.device.set_selected(None);
        Ok(())
    }
}
