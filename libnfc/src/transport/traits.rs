// libnfc/src/transport/traits.rs

use crate::types::{BitFrame, Target};
use crate::utils::{AbortHandle, Timeout};
use crate::{Error, Result};

/// Chip-level switches a transport may honour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransportOption {
    /// Append CRC on transmit and check/strip it on receive
    HandleCrc,
    /// Let the chip add framing bytes (PN53x "easy framing")
    EasyFraming,
    /// Let the chip answer RATS / ISO14443-4 blocks by itself
    AutoIso14443Part4,
    /// Keep retrying activation until a target shows up
    InfiniteSelect,
    /// RF field on/off
    ActivateField,
}

/// Transport trait abstracts the reader chip away from protocol logic.
///
/// Initiator-side calls exchange frames with whatever target is in the
/// field; the target-side calls are only meaningful for chips that can
/// emulate a target and default to `DeviceNotSupported`.
pub trait Transport: Send {
    /// Exchange a frame with an explicit bit count.
    fn transceive_bits(&mut self, tx: &BitFrame, timeout: Timeout) -> Result<BitFrame>;

    /// Exchange a whole-byte frame.
    fn transceive_bytes(&mut self, tx: &[u8], timeout: Timeout) -> Result<Vec<u8>>;

    fn configure(&mut self, option: TransportOption, enabled: bool) -> Result<()>;

    /// Handle that cancels blocking calls of this transport from any thread.
    fn abort_handle(&self) -> AbortHandle;

    fn abort_pending_command(&mut self) -> Result<()> {
        self.abort_handle().abort();
        Ok(())
    }

    /// Arm the chip as `target` and wait for the first frame sent by an
    /// initiator once the chip-level activation is done.
    fn target_init(&mut self, _target: &Target, _timeout: Timeout) -> Result<Vec<u8>> {
        Err(Error::DeviceNotSupported("target mode".into()))
    }

    fn target_receive_bytes(&mut self, _timeout: Timeout) -> Result<Vec<u8>> {
        Err(Error::DeviceNotSupported("target mode".into()))
    }

    fn target_send_bytes(&mut self, _tx: &[u8], _timeout: Timeout) -> Result<()> {
        Err(Error::DeviceNotSupported("target mode".into()))
    }

    /// Leave initiator/target mode; the chip stops answering.
    fn idle(&mut self) -> Result<()> {
        Ok(())
    }
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn transceive_bits(&mut self, tx: &BitFrame, timeout: Timeout) -> Result<BitFrame> {
        (**self).transceive_bits(tx, timeout)
    }

    fn transceive_bytes(&mut self, tx: &[u8], timeout: Timeout) -> Result<Vec<u8>> {
        (**self).transceive_bytes(tx, timeout)
    }

    fn configure(&mut self, option: TransportOption, enabled: bool) -> Result<()> {
        (**self).configure(option, enabled)
    }

    fn abort_handle(&self) -> AbortHandle {
        (**self).abort_handle()
    }

    fn abort_pending_command(&mut self) -> Result<()> {
        (**self).abort_pending_command()
    }

    fn target_init(&mut self, target: &Target, timeout: Timeout) -> Result<Vec<u8>> {
        (**self).target_init(target, timeout)
    }

    fn target_receive_bytes(&mut self, timeout: Timeout) -> Result<Vec<u8>> {
        (**self).target_receive_bytes(timeout)
    }

    fn target_send_bytes(&mut self, tx: &[u8], timeout: Timeout) -> Result<()> {
        (**self).target_send_bytes(tx, timeout)
    }

    fn idle(&mut self) -> Result<()> {
        (**self).idle()
    }
}
