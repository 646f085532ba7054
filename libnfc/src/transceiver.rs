// libnfc/src/transceiver.rs

//! Frame exchange on top of a [`Transport`], with length validation and
//! frame tracing.

use crate::constants::MAX_FRAME_LEN;
use crate::transport::Transport;
use crate::types::BitFrame;
use crate::utils::{Timeout, bits_to_hex, bytes_to_hex_spaced};
use crate::{Error, Result};

pub struct BitTransceiver<'a> {
    transport: &'a mut dyn Transport,
    timeout: Timeout,
}

impl<'a> BitTransceiver<'a> {
    pub fn new(transport: &'a mut dyn Transport, timeout: Timeout) -> Self {
        Self { transport, timeout }
    }

    pub fn timeout(&self) -> Timeout {
        self.timeout
    }

    pub fn set_timeout(&mut self, timeout: Timeout) {
        self.timeout = timeout;
    }

    /// Send the first `bits` bits of `frame` and return the answer with its
    /// own bit count.
    pub fn transmit_bits(&mut self, frame: &[u8], bits: usize) -> Result<BitFrame> {
        if bits == 0 || bits > frame.len() * 8 {
            return Err(Error::InvalidParameter(format!(
                "{} bits requested from a {}-byte frame",
                bits,
                frame.len()
            )));
        }
        let tx = BitFrame::with_bits(frame[..bits.div_ceil(8)].to_vec(), bits)?;
        self.transmit_frame(&tx)
    }

    pub fn transmit_frame(&mut self, tx: &BitFrame) -> Result<BitFrame> {
        if tx.byte_len() > MAX_FRAME_LEN {
            return Err(Error::BufferOverflow {
                limit: MAX_FRAME_LEN,
                actual: tx.byte_len(),
            });
        }
        log::trace!("TX: {}", bits_to_hex(tx.bytes(), tx.bit_len()));
        let rx = self.transport.transceive_bits(tx, self.timeout)?;
        log::trace!("RX: {}", bits_to_hex(rx.bytes(), rx.bit_len()));
        Ok(rx)
    }

    pub fn transmit_bytes(&mut self, frame: &[u8]) -> Result<Vec<u8>> {
        if frame.is_empty() {
            return Err(Error::InvalidParameter("empty frame".into()));
        }
        if frame.len() > MAX_FRAME_LEN {
            return Err(Error::BufferOverflow {
                limit: MAX_FRAME_LEN,
                actual: frame.len(),
            });
        }
        log::trace!("TX: {}", bytes_to_hex_spaced(frame));
        let rx = self.transport.transceive_bytes(frame, self.timeout)?;
        log::trace!("RX: {}", bytes_to_hex_spaced(&rx));
        Ok(rx)
    }
}
