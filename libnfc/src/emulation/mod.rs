// libnfc/src/emulation/mod.rs

//! Passive tag emulation: arm the device as a target, then feed every
//! command from the reader to an [`EmulatorIo`] and send back its answer.

pub mod type2;

pub use type2::Type2Tag;

use crate::device::{Device, TargetMode};
use crate::types::Target;
use crate::utils::Timeout;
use crate::{Error, Result};

/// Outcome of one command handled by an [`EmulatorIo`].
#[derive(Debug)]
pub enum Exchange {
    /// Send this reply (nothing when empty) and keep receiving.
    Continue(Vec<u8>),
    /// The reader halted the tag; the session ends without a reply.
    Halt,
    /// The session fails with this error.
    Error(Error),
}

/// Command handler of an emulated tag.
pub trait EmulatorIo {
    fn process(&mut self, command: &[u8]) -> Exchange;
}

impl<T: EmulatorIo + ?Sized> EmulatorIo for &mut T {
    fn process(&mut self, command: &[u8]) -> Exchange {
        (**self).process(command)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmulationState {
    Uninitialized,
    WaitingForActivation,
    Active,
    ReceivedCommand,
    DispatchedResponse,
    Halted,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmulationExit {
    /// The handler answered `Exchange::Halt`.
    Halted,
    /// The reader released the target.
    Released,
}

pub struct Emulator<D> {
    target: Target,
    io: D,
    state: EmulationState,
    commands: usize,
}

impl<D: EmulatorIo> Emulator<D> {
    pub fn new(target: Target, io: D) -> Self {
        Self {
            target,
            io,
            state: EmulationState::Uninitialized,
            commands: 0,
        }
    }

    pub fn state(&self) -> EmulationState {
        self.state
    }

    /// Commands dispatched so far.
    pub fn commands(&self) -> usize {
        self.commands
    }

    pub fn io(&self) -> &D {
        &self.io
    }

    pub fn into_io(self) -> D {
        self.io
    }

    fn fail(&mut self, e: Error) -> Error {
        log::debug!("emulation failed: {}", e);
        self.state = EmulationState::Failed;
        e
    }

    /// Arm the device and wait for the reader's first command.
    pub fn init(&mut self, device: &mut Device<TargetMode>, timeout: Timeout) -> Result<Vec<u8>> {
        self.state = EmulationState::WaitingForActivation;
        match device.target_init(&self.target, timeout) {
            Ok(first) => {
                self.state = EmulationState::Active;
                Ok(first)
            }
            Err(e) => Err(self.fail(e)),
        }
    }

    /// Dispatch `first` and every following command until the handler
    /// halts, the reader releases the target or something fails.
    pub fn run(
        &mut self,
        device: &mut Device<TargetMode>,
        first: Vec<u8>,
        timeout: Timeout,
    ) -> Result<EmulationExit> {
        let mut command = first;
        loop {
            self.state = EmulationState::ReceivedCommand;
            self.commands += 1;
            match self.io.process(&command) {
                Exchange::Continue(reply) => {
                    if !reply.is_empty() {
                        if let Err(e) = device.target_send_bytes(&reply, timeout) {
                            return Err(self.fail(e));
                        }
                    }
                    self.state = EmulationState::DispatchedResponse;
                }
                Exchange::Halt => {
                    log::debug!("emulated tag halted after {} commands", self.commands);
                    self.state = EmulationState::Halted;
                    return Ok(EmulationExit::Halted);
                }
                Exchange::Error(e) => return Err(self.fail(e)),
            }

            command = match device.target_receive_bytes(timeout) {
                Ok(rx) => rx,
                Err(Error::TargetReleased) => {
                    self.state = EmulationState::Halted;
                    return Ok(EmulationExit::Released);
                }
                Err(e) => return Err(self.fail(e)),
            };
            self.state = EmulationState::Active;
        }
    }
}

/// Emulate `target` until the session ends, answering commands with `io`.
pub fn emulate<D: EmulatorIo>(
    device: &mut Device<TargetMode>,
    target: Target,
    io: D,
    timeout: Timeout,
) -> Result<EmulationExit> {
    let mut emulator = Emulator::new(target, io);
    let first = emulator.init(device, timeout)?;
    emulator.run(device, first, timeout)
}
