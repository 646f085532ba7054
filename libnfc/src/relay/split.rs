// libnfc/src/relay/split.rs

//! Relay halves for setups where the tag and the reader are served by
//! different processes or hosts.

use crate::device::{Device, InitiatorMode, TargetMode};
use crate::relay::link::{FrameLink, LinkFrame};
use crate::relay::{emulated_target, is_normal_stop, wait_for_tag};
use crate::utils::{Timeout, bytes_to_hex_spaced};
use crate::{Error, Result};

fn unexpected(frame: &LinkFrame) -> Error {
    Error::RfProtocolError(format!("unexpected relay frame kind {:02x}", frame.kind()))
}

/// Tell the peer we are leaving and hand back the original error.
fn shut_down<L: FrameLink>(link: &mut L, e: Error) -> Error {
    if let Err(send) = link.send(&LinkFrame::Shutdown) {
        log::debug!("shutdown not delivered: {}", send);
    }
    e
}

/// Reads the real tag and answers the commands coming over the link.
pub struct InitiatorHalf<L> {
    device: Device<InitiatorMode>,
    link: L,
}

impl<L: FrameLink> InitiatorHalf<L> {
    pub fn new(device: Device<InitiatorMode>, link: L) -> Self {
        Self { device, link }
    }

    pub fn into_parts(self) -> (Device<InitiatorMode>, L) {
        (self.device, self.link)
    }

    /// Publish the tag, then serve commands until the peer shuts down.
    /// Returns the number of forwarded commands.
    pub fn run(&mut self) -> Result<usize> {
        let real = match wait_for_tag(&mut self.device) {
            Ok(t) => t,
            Err(e) => return Err(shut_down(&mut self.link, e)),
        };
        log::info!("relaying {}", real);
        self.link.send(&LinkFrame::Target(real))?;

        let mut served = 0;
        loop {
            let command = match self.link.recv(Timeout::Forever)? {
                LinkFrame::Command(c) => c,
                LinkFrame::Shutdown => {
                    log::info!("peer closed the relay after {} commands", served);
                    return Ok(served);
                }
                other => return Err(shut_down(&mut self.link, unexpected(&other))),
            };
            let answer = match self.device.transceive_bytes(&command) {
                Ok(a) => a,
                Err(e) => return Err(shut_down(&mut self.link, e)),
            };
            log::trace!("{} -> {}", bytes_to_hex_spaced(&command), bytes_to_hex_spaced(&answer));
            self.link.send(&LinkFrame::Response(answer))?;
            served += 1;
        }
    }
}

/// Emulates the tag announced over the link towards the reader.
pub struct TargetHalf<L> {
    device: Device<TargetMode>,
    link: L,
}

impl<L: FrameLink> TargetHalf<L> {
    pub fn new(device: Device<TargetMode>, link: L) -> Self {
        Self { device, link }
    }

    pub fn into_parts(self) -> (Device<TargetMode>, L) {
        (self.device, self.link)
    }

    /// Forward reader commands until the reader releases the tag, the
    /// device is aborted or the peer shuts down. Returns the number of
    /// completed exchanges.
    pub fn run(&mut self) -> Result<usize> {
        let mut exchanged = 0;
        match self.session(&mut exchanged) {
            Ok(()) => Ok(exchanged),
            Err(e) if is_normal_stop(&e) => {
                shut_down(&mut self.link, e);
                self.device.abort_handle().clear();
                Ok(exchanged)
            }
            Err(e) => Err(shut_down(&mut self.link, e)),
        }
    }

    fn session(&mut self, exchanged: &mut usize) -> Result<()> {
        let real = match self.link.recv(Timeout::Forever)? {
            LinkFrame::Target(t) => t,
            LinkFrame::Shutdown => return Ok(()),
            other => return Err(unexpected(&other)),
        };
        let emulated = emulated_target(&real, self.device.config().relay_uid()?)?;
        let timeout = self.device.config().target_timeout;
        let mut command = self.device.target_init(&emulated, timeout)?;
        loop {
            self.link.send(&LinkFrame::Command(command))?;
            match self.link.recv(Timeout::Forever)? {
                LinkFrame::Response(answer) => self.device.target_send_bytes(&answer, timeout)?,
                LinkFrame::Shutdown => return Ok(()),
                other => return Err(unexpected(&other)),
            }
            *exchanged += 1;
            command = self.device.target_receive_bytes(timeout)?;
        }
    }
}
