// libnfc/src/transport/loopback.rs

//! In-process initiator/target link.
//!
//! [`LoopbackTransport::pair`] returns two ends sharing one simulated RF
//! field. The target end behaves like a PN53x armed with `target_init`: for
//! ISO14443-A targets the "chip" answers REQA/WUPA, anti-collision, SELECT
//! and RATS by itself and only hands later frames to the host. Other
//! targets (DEP, FeliCa, ...) get every frame verbatim.
//!
//! While the target end is not armed yet the initiator waits (bounded by
//! its timeout); once the target end went idle every initiator exchange
//! fails at once with `RfTimeout`.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::constants::*;
use crate::protocol::crc::{append_crc_a, strip_crc_a};
use crate::protocol::iso14443a::{CascadeLevel, cascade_uid_chunks};
use crate::transport::traits::{Transport, TransportOption};
use crate::types::{BitFrame, Target};
use crate::utils::{AbortHandle, Timeout, bytes_to_hex_spaced};
use crate::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Role {
    Initiator,
    Target,
}

/// ISO14443-A activation progress of the simulated chip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    /// Waiting for REQA/WUPA
    Waiting,
    /// Answering anti-collision / SELECT at the given cascade index
    Ready(usize),
    /// Final SELECT done, RATS accepted
    Selected,
    /// Only WUPA wakes the target
    Halted,
    /// Host-driven: frames go to the target end
    Active,
}

#[derive(Debug)]
struct Armed {
    target: Target,
    phase: Phase,
}

#[derive(Debug)]
enum TargetState {
    Unset,
    Armed(Armed),
    Idle,
}

enum Answer {
    Reply(BitFrame),
    Silent,
    Forward(Vec<u8>),
    Fail(Error),
}

fn with_crc(mut frame: Vec<u8>, handle_crc: bool) -> BitFrame {
    if !handle_crc {
        append_crc_a(&mut frame);
    }
    BitFrame::from_bytes(frame)
}

impl Armed {
    fn new(target: Target) -> Self {
        let phase = match target {
            Target::Iso14443a { .. } => Phase::Waiting,
            _ => Phase::Active,
        };
        Self { target, phase }
    }

    fn answer(&mut self, tx: &BitFrame, handle_crc: bool) -> Answer {
        let Target::Iso14443a {
            atqa,
            sak,
            uid,
            ats,
        } = &self.target
        else {
            return Answer::Forward(tx.bytes().to_vec());
        };
        let bytes = tx.bytes();

        if tx.bit_len() == SHORT_FRAME_BITS {
            let cmd = bytes.first().copied().unwrap_or(0);
            let wakes = cmd == ISO14443A_WUPA
                || (cmd == ISO14443A_REQA && self.phase != Phase::Halted);
            if !wakes {
                return Answer::Silent;
            }
            self.phase = Phase::Ready(0);
            return Answer::Reply(BitFrame::from_bytes(atqa.to_vec()));
        }

        match self.phase {
            Phase::Waiting | Phase::Halted => Answer::Silent,
            Phase::Active => Answer::Forward(payload(bytes, handle_crc)),
            Phase::Ready(level) => {
                let chunks = cascade_uid_chunks(uid);
                let cl = CascadeLevel::all().get(level).copied();
                let (Some(chunk), Some(cl)) = (chunks.get(level), cl) else {
                    return Answer::Silent;
                };
                let sel = cl.sel_code();
                match bytes {
                    [s, ISO14443A_NVB_ANTICOLLISION] if *s == sel => {
                        Answer::Reply(BitFrame::from_bytes(chunk.to_vec()))
                    }
                    [s, ISO14443A_NVB_SELECT, rest @ ..]
                        if *s == sel && rest.len() >= 5 && rest[..5] == chunk[..] =>
                    {
                        let last = level + 1 == chunks.len();
                        let reply = if last {
                            self.phase = Phase::Selected;
                            *sak & !SAK_CASCADE_BIT
                        } else {
                            self.phase = Phase::Ready(level + 1);
                            SAK_CASCADE_BIT
                        };
                        Answer::Reply(with_crc(vec![reply], handle_crc))
                    }
                    _ => Answer::Silent,
                }
            }
            Phase::Selected => {
                if bytes.first() == Some(&ISO14443A_RATS) && !ats.is_empty() {
                    // TL counts itself
                    let Ok(tl) = u8::try_from(ats.len() + 1) else {
                        return Answer::Fail(Error::BufferOverflow {
                            limit: usize::from(u8::MAX),
                            actual: ats.len() + 1,
                        });
                    };
                    self.phase = Phase::Active;
                    let mut frame = Vec::with_capacity(ats.len() + 1);
                    frame.push(tl);
                    frame.extend_from_slice(ats);
                    Answer::Reply(with_crc(frame, handle_crc))
                } else if bytes.starts_with(&ISO14443A_HALT) {
                    self.phase = Phase::Halted;
                    Answer::Silent
                } else {
                    self.phase = Phase::Active;
                    Answer::Forward(payload(bytes, handle_crc))
                }
            }
        }
    }
}

/// Host-visible part of an initiator frame.
fn payload(bytes: &[u8], handle_crc: bool) -> Vec<u8> {
    if handle_crc {
        return bytes.to_vec();
    }
    strip_crc_a(bytes).unwrap_or(bytes).to_vec()
}

#[derive(Debug)]
struct Link {
    target: TargetState,
    to_target: VecDeque<Vec<u8>>,
    to_initiator: VecDeque<Vec<u8>>,
}

/// One end of an in-process RF link.
#[derive(Debug)]
pub struct LoopbackTransport {
    link: Arc<Mutex<Link>>,
    role: Role,
    abort: AbortHandle,
    handle_crc: bool,
}

impl LoopbackTransport {
    /// Create a connected `(initiator, target)` pair.
    pub fn pair() -> (Self, Self) {
        let link = Arc::new(Mutex::new(Link {
            target: TargetState::Unset,
            to_target: VecDeque::new(),
            to_initiator: VecDeque::new(),
        }));
        let end = |role| Self {
            link: Arc::clone(&link),
            role,
            abort: AbortHandle::new(),
            handle_crc: true,
        };
        (end(Role::Initiator), end(Role::Target))
    }

    fn link(&self) -> MutexGuard<'_, Link> {
        self.link.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn expect_role(&self, role: Role) -> Result<()> {
        if self.role != role {
            return Err(Error::DeviceNotSupported(format!(
                "loopback {:?} end used as {:?}",
                self.role, role
            )));
        }
        Ok(())
    }

    fn exchange(&mut self, tx: &BitFrame, timeout: Timeout) -> Result<BitFrame> {
        self.expect_role(Role::Initiator)?;
        let abort = self.abort.clone();
        log::trace!("loopback TX: {}", crate::utils::bits_to_hex(tx.bytes(), tx.bit_len()));

        abort.block_until(timeout, || {
            (!matches!(self.link().target, TargetState::Unset)).then_some(())
        })?;

        {
            let mut guard = self.link();
            let link = &mut *guard;
            let TargetState::Armed(armed) = &mut link.target else {
                return Err(Error::RfTimeout);
            };
            match armed.answer(tx, self.handle_crc) {
                Answer::Reply(frame) => return Ok(frame),
                Answer::Silent => return Err(Error::RfTimeout),
                Answer::Fail(e) => return Err(e),
                Answer::Forward(bytes) => {
                    link.to_initiator.clear();
                    link.to_target.push_back(bytes);
                }
            }
        }

        let reply = abort
            .block_until(timeout, || {
                let mut link = self.link();
                if !matches!(link.target, TargetState::Armed(_)) {
                    return Some(Err(Error::RfTimeout));
                }
                link.to_initiator.pop_front().map(Ok)
            })
            .map_err(|e| match e {
                Error::Timeout => Error::RfTimeout,
                other => other,
            })??;
        log::trace!("loopback RX: {}", bytes_to_hex_spaced(&reply));
        Ok(with_crc(reply, self.handle_crc))
    }
}

impl Transport for LoopbackTransport {
    fn transceive_bits(&mut self, tx: &BitFrame, timeout: Timeout) -> Result<BitFrame> {
        self.exchange(tx, timeout)
    }

    fn transceive_bytes(&mut self, tx: &[u8], timeout: Timeout) -> Result<Vec<u8>> {
        self.exchange(&BitFrame::from_bytes(tx), timeout)
            .map(BitFrame::into_bytes)
    }

    fn configure(&mut self, option: TransportOption, enabled: bool) -> Result<()> {
        if option == TransportOption::HandleCrc {
            self.handle_crc = enabled;
        }
        Ok(())
    }

    fn abort_handle(&self) -> AbortHandle {
        self.abort.clone()
    }

    fn target_init(&mut self, target: &Target, timeout: Timeout) -> Result<Vec<u8>> {
        self.expect_role(Role::Target)?;
        {
            let mut link = self.link();
            link.to_target.clear();
            link.to_initiator.clear();
            link.target = TargetState::Armed(Armed::new(target.clone()));
        }
        log::debug!("loopback target armed: {}", target);
        self.target_receive_bytes(timeout)
    }

    fn target_receive_bytes(&mut self, timeout: Timeout) -> Result<Vec<u8>> {
        self.expect_role(Role::Target)?;
        let abort = self.abort.clone();
        abort.block_until(timeout, || {
            let mut link = self.link();
            let armed = matches!(link.target, TargetState::Armed(_));
            if !armed {
                return Some(Err(Error::InvalidParameter(
                    "target end is not initialised".into(),
                )));
            }
            link.to_target.pop_front().map(Ok)
        })?
    }

    fn target_send_bytes(&mut self, tx: &[u8], _timeout: Timeout) -> Result<()> {
        self.expect_role(Role::Target)?;
        self.abort.check()?;
        let mut link = self.link();
        if !matches!(link.target, TargetState::Armed(_)) {
            return Err(Error::InvalidParameter(
                "target end is not initialised".into(),
            ));
        }
        link.to_initiator.push_back(tx.to_vec());
        Ok(())
    }

    fn idle(&mut self) -> Result<()> {
        if self.role == Role::Target {
            let mut link = self.link();
            link.target = TargetState::Idle;
            link.to_target.clear();
            link.to_initiator.clear();
            log::debug!("loopback target idle");
        }
        Ok(())
    }
}
