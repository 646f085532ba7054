// libnfc/src/initiator/magic.rs

//! "Magic" MIFARE Classic clones (gen1a) whose block 0 becomes writable
//! after the 0x40 / 0x43 backdoor sequence.

use crate::constants::{MAGIC_WAKEUP_2, MAGIC_WIPE, MIFARE_ACK};
use crate::device::{Device, InitiatorMode};
use crate::initiator::with_raw_framing;
use crate::protocol::crc::append_crc_a;
use crate::protocol::iso14443a;
use crate::transport::Transport;
use crate::types::BitFrame;
use crate::utils::Timeout;
use crate::{Error, Result};

/// Manufacturer bytes written after UID, BCC, SAK and ATQA in block 0.
const MANUFACTURER_DATA: [u8; 8] = [0x46, 0x59, 0x25, 0x58, 0x49, 0x10, 0x23, 0x02];

/// Build block 0 of a MIFARE Classic 1K: UID, BCC, SAK, ATQA (LSB first)
/// and manufacturer data.
pub fn block0(uid: [u8; 4], sak: u8, atqa: [u8; 2]) -> [u8; 16] {
    let mut block = [0u8; 16];
    block[..4].copy_from_slice(&uid);
    block[4] = iso14443a::bcc(&uid);
    block[5] = sak;
    block[6] = atqa[1];
    block[7] = atqa[0];
    block[8..].copy_from_slice(&MANUFACTURER_DATA);
    block
}

/// Accept a 4-bit ACK (or a whole byte holding 0x0A).
fn expect_ack(rx: &BitFrame) -> Result<()> {
    match rx.bytes().first() {
        Some(b) if b & 0x0f == MIFARE_ACK && rx.bit_len() <= 8 => Ok(()),
        Some(b) => Err(Error::UnexpectedResponse {
            expected: MIFARE_ACK,
            actual: *b,
        }),
        None => Err(Error::RfProtocolError("empty answer where ACK expected".into())),
    }
}

fn send_expecting_ack(t: &mut dyn Transport, frame: BitFrame, timeout: Timeout) -> Result<()> {
    let rx = t.transceive_bits(&frame, timeout)?;
    expect_ack(&rx)
}

fn with_crc(data: &[u8]) -> BitFrame {
    let mut v = data.to_vec();
    append_crc_a(&mut v);
    BitFrame::from_bytes(v)
}

/// Backdoor commands of a magic card. The card must be in the field; it
/// does not need to be selected.
pub struct MagicCard<'a> {
    device: &'a mut Device<InitiatorMode>,
}

impl<'a> MagicCard<'a> {
    pub fn new(device: &'a mut Device<InitiatorMode>) -> Self {
        Self { device }
    }

    fn raw<T>(&mut self, f: impl FnOnce(&mut dyn Transport, Timeout) -> Result<T>) -> Result<T> {
        let timeout = self.device.config().command_timeout;
        self.device.set_selected(None);
        with_raw_framing(self.device.transport_mut(), |t| f(t, timeout))
    }

    /// HLTA, then the 7-bit 0x40 and 8-bit 0x43 backdoor frames.
    pub fn unlock(&mut self) -> Result<()> {
        self.raw(|t, timeout| {
            match t.transceive_bits(&BitFrame::from_bytes(iso14443a::halt().to_vec()), timeout) {
                Err(e) if !e.is_timeout() => return Err(e),
                _ => {}
            }
            send_expecting_ack(t, iso14443a::magic_wakeup(), timeout)?;
            send_expecting_ack(t, BitFrame::from_bytes(vec![MAGIC_WAKEUP_2]), timeout)
        })?;
        log::debug!("magic card unlocked");
        Ok(())
    }

    /// Erase the whole card. Only valid after [`MagicCard::unlock`].
    pub fn wipe(&mut self) -> Result<()> {
        self.raw(|t, timeout| send_expecting_ack(t, BitFrame::from_bytes(vec![MAGIC_WIPE]), timeout))
    }

    /// Overwrite block 0 (two-phase MIFARE WRITE). Only valid after
    /// [`MagicCard::unlock`].
    pub fn write_block0(&mut self, data: &[u8; 16]) -> Result<()> {
        self.raw(|t, timeout| {
            send_expecting_ack(
                t,
                BitFrame::from_bytes(iso14443a::write_command(0).to_vec()),
                timeout,
            )?;
            send_expecting_ack(t, with_crc(data), timeout)
        })
    }

    /// Unlock, then write a block 0 carrying `uid`.
    pub fn set_uid(&mut self, uid: [u8; 4], sak: u8, atqa: [u8; 2]) -> Result<()> {
        self.unlock()?;
        self.write_block0(&block0(uid, sak, atqa))
    }
}
