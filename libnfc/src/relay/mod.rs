// libnfc/src/relay/mod.rs

//! Relay between a real ISO14443-A tag and a reader.
//!
//! One device reads the real tag as initiator while the other emulates it
//! towards the reader. Every reader command is forwarded verbatim and the
//! tag's answer is returned verbatim, strictly in order. [`Relay`] drives
//! both devices from one thread; [`InitiatorHalf`] and [`TargetHalf`]
//! split the same loop across a [`FrameLink`].

pub mod link;
pub mod split;

pub use link::{ChannelLink, FrameLink, LinkFrame, StreamLink};
pub use split::{InitiatorHalf, TargetHalf};

use crate::device::{Device, InitiatorMode, POLL_FOREVER, TargetMode};
use crate::types::{Modulation, Target, Uid};
use crate::utils::AbortHandle;
use crate::{Error, Result};

/// Outcome of a relay session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RelayStats {
    /// The real tag, once found
    pub target: Option<Target>,
    /// Command/answer pairs forwarded
    pub exchanges: usize,
}

/// Stops a running relay from another thread.
#[derive(Debug, Clone)]
pub struct RelayStopper {
    handles: [AbortHandle; 2],
}

impl RelayStopper {
    pub fn stop(&self) {
        for h in &self.handles {
            h.abort();
        }
    }
}

/// Target descriptor presented to the reader for the real tag `real`.
/// Only ISO14443-A tags can be emulated; `uid` replaces the real UID.
pub fn emulated_target(real: &Target, uid: Option<Uid>) -> Result<Target> {
    match real {
        Target::Iso14443a {
            atqa,
            sak,
            uid: real_uid,
            ats,
        } => Ok(Target::Iso14443a {
            atqa: *atqa,
            sak: *sak,
            uid: uid.unwrap_or_else(|| real_uid.clone()),
            ats: ats.clone(),
        }),
        other => Err(Error::DeviceNotSupported(format!(
            "cannot emulate {:?} targets",
            other.modulation().kind
        ))),
    }
}

/// Poll until an ISO14443-A tag answers; aborting the device ends the wait.
pub(crate) fn wait_for_tag(device: &mut Device<InitiatorMode>) -> Result<Target> {
    let period = device.config().poll_period();
    device
        .poll_targets(&[Modulation::ISO14443A_106], POLL_FOREVER, period)?
        .ok_or_else(|| Error::RfProtocolError("no ISO14443-A tag answered".into()))
}

/// Stop reasons that end a session normally.
pub(crate) fn is_normal_stop(e: &Error) -> bool {
    matches!(e, Error::Aborted | Error::TargetReleased)
}

/// Both devices in one process.
pub struct Relay {
    initiator: Device<InitiatorMode>,
    target: Device<TargetMode>,
}

impl Relay {
    pub fn new(initiator: Device<InitiatorMode>, target: Device<TargetMode>) -> Self {
        Self { initiator, target }
    }

    pub fn stopper(&self) -> RelayStopper {
        RelayStopper {
            handles: [self.initiator.abort_handle(), self.target.abort_handle()],
        }
    }

    pub fn into_devices(self) -> (Device<InitiatorMode>, Device<TargetMode>) {
        (self.initiator, self.target)
    }

    /// Relay until stopped or the reader releases the emulated tag.
    /// Any other failure on either side ends the session with an error.
    pub fn run(&mut self) -> Result<RelayStats> {
        let mut stats = RelayStats::default();
        let outcome = self.session(&mut stats);
        self.initiator.abort_handle().clear();
        self.target.abort_handle().clear();
        match outcome {
            Err(e) if is_normal_stop(&e) => {
                log::info!("relay stopped after {} exchanges", stats.exchanges);
                Ok(stats)
            }
            Err(e) => {
                log::warn!("relay failed after {} exchanges: {}", stats.exchanges, e);
                Err(e)
            }
            Ok(()) => Ok(stats),
        }
    }

    fn session(&mut self, stats: &mut RelayStats) -> Result<()> {
        let real = wait_for_tag(&mut self.initiator)?;
        log::info!("relaying {}", real);
        let emulated = emulated_target(&real, self.target.config().relay_uid()?)?;
        stats.target = Some(real);

        let timeout = self.target.config().target_timeout;
        let mut command = self.target.target_init(&emulated, timeout)?;
        loop {
            log::debug!("reader -> tag: {}", crate::utils::bytes_to_hex_spaced(&command));
            let answer = self.initiator.transceive_bytes(&command)?;
            log::debug!("tag -> reader: {}", crate::utils::bytes_to_hex_spaced(&answer));
            self.target.target_send_bytes(&answer, timeout)?;
            stats.exchanges += 1;
            command = self.target.target_receive_bytes(timeout)?;
        }
    }
}
