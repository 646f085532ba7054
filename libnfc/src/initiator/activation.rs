// libnfc/src/initiator/activation.rs

//! ISO14443-A activation: REQA/WUPA, anti-collision and SELECT over up to
//! three cascade levels, then RATS when the SAK announces ISO14443-4.
//!
//! The exchange runs with hardware CRC and easy framing switched off; both
//! are switched back on when activation finishes, whatever the outcome.

use crate::config::DeviceConfig;
use crate::constants::ISO14443A_CASCADE_TAG;
use crate::protocol::iso14443a::{self, BccCheck, CascadeLevel, WakeupCommand};
use crate::transceiver::BitTransceiver;
use crate::transport::{Transport, TransportOption};
use crate::types::{BitFrame, Target, Uid};
use crate::utils::{Timeout, bytes_to_hex_spaced};
use crate::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivationState {
    Idle,
    ReqSent,
    Arbitration(CascadeLevel),
    Selected(CascadeLevel),
    RatsSent,
    Activated,
    /// Nobody answered the wakeup frame
    NoTag,
}

/// Non-fatal anomalies seen while resolving the UID.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivationWarning {
    BccMismatch {
        level: CascadeLevel,
        expected: u8,
        actual: u8,
    },
    /// Byte 0 of a non-final level was not the cascade tag 0x88
    CascadeTagMismatch { level: CascadeLevel, actual: u8 },
}

/// Progress through the cascade levels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CascadeState {
    pub level: CascadeLevel,
    /// Every 4-byte CT/UID group received so far, cascade tags included
    pub raw_uid: Vec<u8>,
    pub sak: u8,
}

impl Default for CascadeState {
    fn default() -> Self {
        Self {
            level: CascadeLevel::One,
            raw_uid: Vec::with_capacity(12),
            sak: 0,
        }
    }
}

/// Successful activation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Activation {
    pub target: Target,
    pub warnings: Vec<ActivationWarning>,
}

pub struct Activator<'a> {
    transport: &'a mut dyn Transport,
    timeout: Timeout,
    wakeup: WakeupCommand,
    rats_param: u8,
    state: ActivationState,
    cascade: CascadeState,
    warnings: Vec<ActivationWarning>,
}

impl<'a> Activator<'a> {
    pub fn new(transport: &'a mut dyn Transport, config: &DeviceConfig) -> Self {
        Self {
            transport,
            timeout: config.command_timeout,
            wakeup: config.wakeup,
            rats_param: config.rats_param,
            state: ActivationState::Idle,
            cascade: CascadeState::default(),
            warnings: Vec::new(),
        }
    }

    pub fn with_wakeup(mut self, wakeup: WakeupCommand) -> Self {
        self.wakeup = wakeup;
        self
    }

    pub fn state(&self) -> ActivationState {
        self.state
    }

    pub fn cascade(&self) -> &CascadeState {
        &self.cascade
    }

    /// Activate the tag in the field. With `uid` the anti-collision loop is
    /// skipped and that UID is selected directly. `Ok(None)` means no tag
    /// answered the wakeup frame.
    pub fn activate(&mut self, uid: Option<&Uid>) -> Result<Option<Activation>> {
        self.transport.configure(TransportOption::HandleCrc, false)?;
        self.transport.configure(TransportOption::EasyFraming, false)?;

        let outcome = self.run(uid);

        let restored = self
            .transport
            .configure(TransportOption::HandleCrc, true)
            .and_then(|_| self.transport.configure(TransportOption::EasyFraming, true));
        let activation = outcome?;
        restored?;
        Ok(activation)
    }

    fn transceiver(&mut self) -> BitTransceiver<'_> {
        BitTransceiver::new(&mut *self.transport, self.timeout)
    }

    fn transition(&mut self, next: ActivationState) {
        log::debug!("activation: {:?} -> {:?}", self.state, next);
        self.state = next;
    }

    fn run(&mut self, uid: Option<&Uid>) -> Result<Option<Activation>> {
        self.state = ActivationState::Idle;
        self.cascade = CascadeState::default();
        self.warnings.clear();

        let atqa = match self.wake() {
            Ok(atqa) => atqa,
            Err(e) if e.is_timeout() => {
                self.transition(ActivationState::NoTag);
                return Ok(None);
            }
            Err(e) => return Err(e),
        };

        let chunks = uid.map(iso14443a::cascade_uid_chunks);
        let mut level = CascadeLevel::One;
        let mut resolved = Vec::with_capacity(10);
        let sak = loop {
            self.cascade.level = level;
            let index = usize::from(level.number() - 1);
            let chunk = match &chunks {
                Some(chunks) => *chunks.get(index).ok_or_else(|| {
                    Error::RfProtocolError(format!(
                        "tag asks for cascade level {} beyond the given UID",
                        level.number()
                    ))
                })?,
                None => {
                    self.transition(ActivationState::Arbitration(level));
                    self.anticollision(level)?
                }
            };

            let sak = self.select(level, &chunk)?;
            self.cascade.raw_uid.extend_from_slice(&chunk[..4]);
            self.cascade.sak = sak;
            self.transition(ActivationState::Selected(level));

            if !iso14443a::sak_cascade(sak) {
                resolved.extend_from_slice(&chunk[..4]);
                if let Some(chunks) = &chunks {
                    if chunks.len() != index + 1 {
                        return Err(Error::RfProtocolError(format!(
                            "UID complete at cascade level {} but {} levels were given",
                            level.number(),
                            chunks.len()
                        )));
                    }
                }
                break sak;
            }

            if chunk[0] != ISO14443A_CASCADE_TAG {
                log::warn!(
                    "cascade tag mismatch at level {}: {:02x}",
                    level.number(),
                    chunk[0]
                );
                self.warnings.push(ActivationWarning::CascadeTagMismatch {
                    level,
                    actual: chunk[0],
                });
            }
            resolved.extend_from_slice(&chunk[1..4]);
            level = level.next().ok_or_else(|| {
                Error::RfProtocolError("cascade bit set at cascade level 3".into())
            })?;
        };

        let ats = if iso14443a::sak_iso14443_4(sak) {
            self.transition(ActivationState::RatsSent);
            self.rats()?
        } else {
            Vec::new()
        };

        let target = Target::Iso14443a {
            atqa,
            sak,
            uid: Uid::try_from(&resolved[..])?,
            ats,
        };
        self.transition(ActivationState::Activated);
        log::debug!("activated {}", target);
        Ok(Some(Activation {
            target,
            warnings: std::mem::take(&mut self.warnings),
        }))
    }

    fn wake(&mut self) -> Result<[u8; 2]> {
        let frame = self.wakeup.frame();
        self.transition(ActivationState::ReqSent);
        let rx = self.transceiver().transmit_frame(&frame)?;
        if rx.bit_len() != 16 {
            return Err(Error::FramingError(format!(
                "ATQA must be 2 bytes, got {} bits",
                rx.bit_len()
            )));
        }
        let b = rx.bytes();
        Ok([b[0], b[1]])
    }

    fn anticollision(&mut self, level: CascadeLevel) -> Result<[u8; 5]> {
        let tx = iso14443a::anticollision(level);
        let rx = self
            .transceiver()
            .transmit_frame(&BitFrame::from_bytes(tx.to_vec()))?;
        if !rx.is_whole_bytes() {
            return Err(Error::BitCollision);
        }
        let chunk: [u8; 5] = rx.bytes().try_into().map_err(|_| Error::InvalidLength {
            expected: 5,
            actual: rx.byte_len(),
        })?;
        if let BccCheck::Mismatch { expected, actual } = iso14443a::check_bcc(&chunk) {
            log::warn!(
                "BCC mismatch at level {} for {}: expected {:02x}, got {:02x}",
                level.number(),
                bytes_to_hex_spaced(&chunk[..4]),
                expected,
                actual
            );
            self.warnings.push(ActivationWarning::BccMismatch {
                level,
                expected,
                actual,
            });
        }
        Ok(chunk)
    }

    fn select(&mut self, level: CascadeLevel, chunk: &[u8; 5]) -> Result<u8> {
        let rx = self
            .transceiver()
            .transmit_bytes(&iso14443a::select(level, chunk))?;
        iso14443a::parse_sak(&rx)
    }

    fn rats(&mut self) -> Result<Vec<u8>> {
        let frame = iso14443a::rats(self.rats_param);
        let rx = self.transceiver().transmit_bytes(&frame)?;
        iso14443a::parse_ats(&rx)
    }
}
