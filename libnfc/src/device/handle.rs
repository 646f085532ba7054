// libnfc/src/device/handle.rs

use std::marker::PhantomData;
use std::time::Duration;

use crate::config::DeviceConfig;
use crate::initiator::{self, Activation, Activator};
use crate::protocol::iso14443a::{self, WakeupCommand};
use crate::protocol::iso14443b;
use crate::transceiver::BitTransceiver;
use crate::transport::{Transport, TransportOption};
use crate::types::{BitFrame, Modulation, ModulationType, SystemCode, Target, Uid};
use crate::utils::{AbortHandle, Timeout};
use crate::{Error, Result};

/// Type-state markers
pub struct Idle;
pub struct InitiatorMode;
pub struct TargetMode;

/// `attempts` value of [`Device::poll_targets`] that never gives up.
pub const POLL_FOREVER: u8 = 0xff;

/// Device handle that enforces the operating mode at compile time.
pub struct Device<Mode = Idle> {
    transport: Box<dyn Transport>,
    config: DeviceConfig,
    abort: AbortHandle,
    selected: Option<Target>,
    _mode: PhantomData<Mode>,
}

impl<Mode> Device<Mode> {
    fn into_mode<Next>(self) -> Device<Next> {
        Device {
            transport: self.transport,
            config: self.config,
            abort: self.abort,
            selected: self.selected,
            _mode: PhantomData,
        }
    }

    pub fn config(&self) -> &DeviceConfig {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut DeviceConfig {
        &mut self.config
    }

    /// Clonable handle that cancels the blocking call in progress.
    pub fn abort_handle(&self) -> AbortHandle {
        self.abort.clone()
    }

    pub fn abort_command(&mut self) -> Result<()> {
        self.transport.abort_pending_command()
    }

    /// Leave the current mode; the chip stops answering and forgets the
    /// selected target.
    pub fn idle(mut self) -> Result<Device<Idle>> {
        self.transport.idle()?;
        self.selected = None;
        log::debug!("device idle");
        Ok(self.into_mode())
    }

    pub(crate) fn transport_mut(&mut self) -> &mut dyn Transport {
        &mut *self.transport
    }
}

impl Device<Idle> {
    /// Wrap an existing transport. Fails when `config` does not validate.
    pub fn new(transport: Box<dyn Transport>, config: DeviceConfig) -> Result<Self> {
        config.validate()?;
        let abort = transport.abort_handle();
        Ok(Self {
            transport,
            config,
            abort,
            selected: None,
            _mode: PhantomData,
        })
    }

    /// Turn the RF field on and reset the framing options to their defaults.
    pub fn init_as_initiator(mut self) -> Result<Device<InitiatorMode>> {
        self.abort.clear();
        let t = &mut self.transport;
        t.configure(TransportOption::ActivateField, false)?;
        t.configure(TransportOption::HandleCrc, true)?;
        t.configure(TransportOption::EasyFraming, true)?;
        t.configure(TransportOption::AutoIso14443Part4, false)?;
        t.configure(TransportOption::InfiniteSelect, false)?;
        t.configure(TransportOption::ActivateField, true)?;
        log::debug!("device in initiator mode");
        Ok(self.into_mode())
    }

    /// Switch to target mode without arming the chip yet.
    pub fn into_target(mut self) -> Device<TargetMode> {
        self.abort.clear();
        self.selected = None;
        self.into_mode()
    }

    /// Arm the chip as `target` and return it together with the first
    /// frame sent by the initiator.
    pub fn init_as_target(self, target: &Target) -> Result<(Device<TargetMode>, Vec<u8>)> {
        let mut device = self.into_target();
        let timeout = device.config.target_timeout;
        let first = device.target_init(target, timeout)?;
        Ok((device, first))
    }
}

impl Device<InitiatorMode> {
    pub fn selected_target(&self) -> Option<&Target> {
        self.selected.as_ref()
    }

    pub(crate) fn set_selected(&mut self, target: Option<Target>) {
        self.selected = target;
    }

    /// Run ISO14443-A activation and keep the warnings it produced.
    pub fn activate_iso14443a(&mut self, uid: Option<&Uid>) -> Result<Option<Activation>> {
        let activation = Activator::new(&mut *self.transport, &self.config).activate(uid)?;
        self.selected = activation.as_ref().map(|a| a.target.clone());
        Ok(activation)
    }

    /// Select one target of the given modulation. `init_data` narrows the
    /// search: a UID for ISO14443-A, AFI for ISO14443-B, a big-endian
    /// system code for FeliCa. `Ok(None)` means nothing answered.
    pub fn select_passive_target(
        &mut self,
        modulation: Modulation,
        init_data: Option<&[u8]>,
    ) -> Result<Option<Target>> {
        let timeout = self.config.command_timeout;
        let found = match modulation.kind {
            ModulationType::Iso14443a => {
                let uid = init_data.map(Uid::try_from).transpose()?;
                self.activate_iso14443a(uid.as_ref())?
                    .map(|a| a.target)
            }
            ModulationType::Iso14443b => {
                let afi = init_data.and_then(|d| d.first().copied()).unwrap_or(0);
                initiator::silent_as_none(
                    self.transport
                        .transceive_bytes(&iso14443b::reqb(afi, false), timeout),
                )?
                .map(|rx| iso14443b::parse_atqb(&rx))
                .transpose()?
            }
            ModulationType::Iso14443b2sr => initiator::st25tb::select(&mut *self.transport, timeout)?,
            ModulationType::Felica => {
                let system_code = match init_data {
                    Some(d) => SystemCode::from_be_bytes(crate::protocol::parser::array_at(d, 0)?),
                    None => SystemCode::ANY,
                };
                initiator::felica::poll(&mut *self.transport, modulation.baud, system_code, timeout)?
            }
            ModulationType::Jewel => initiator::jewel::select(&mut *self.transport, timeout)?,
            ModulationType::Dep => {
                return Err(Error::InvalidParameter(
                    "DEP targets are selected through dep::DepInitiator".into(),
                ));
            }
            ModulationType::Iso14443bi | ModulationType::Iso14443b2ct | ModulationType::Barcode => {
                return Err(Error::NotImplemented(format!(
                    "{:?} target selection",
                    modulation.kind
                )));
            }
        };
        if let Some(t) = &found {
            log::debug!("selected {}", t);
        }
        self.selected = found.clone();
        Ok(found)
    }

    /// Collect up to `max` ISO14443-A targets by halting each one after
    /// selection; other modulations report at most one target.
    pub fn list_passive_targets(&mut self, modulation: Modulation, max: usize) -> Result<Vec<Target>> {
        let mut found = Vec::new();
        if modulation.kind != ModulationType::Iso14443a {
            found.extend(self.select_passive_target(modulation, None)?);
            return Ok(found);
        }
        while found.len() < max {
            let activation = Activator::new(&mut *self.transport, &self.config)
                .with_wakeup(WakeupCommand::Reqa)
                .activate(None)?;
            let Some(activation) = activation else { break };
            self.selected = Some(activation.target.clone());
            self.deselect()?;
            found.push(activation.target);
        }
        Ok(found)
    }

    /// Try every modulation in turn, `attempts` rounds separated by
    /// `period` ([`POLL_FOREVER`] keeps polling until a target shows up or
    /// the device is aborted).
    pub fn poll_targets(
        &mut self,
        modulations: &[Modulation],
        attempts: u8,
        period: Duration,
    ) -> Result<Option<Target>> {
        if modulations.is_empty() || attempts == 0 {
            return Err(Error::InvalidParameter(
                "poll needs at least one modulation and one attempt".into(),
            ));
        }
        let mut round: u32 = 0;
        loop {
            self.abort.check()?;
            for m in modulations {
                if let Some(t) = self.select_passive_target(*m, None)? {
                    return Ok(Some(t));
                }
            }
            round += 1;
            if attempts != POLL_FOREVER && round >= u32::from(attempts) {
                return Ok(None);
            }
            self.abort.sleep(period.into())?;
        }
    }

    pub fn transceive_bytes(&mut self, tx: &[u8]) -> Result<Vec<u8>> {
        let timeout = self.config.command_timeout;
        BitTransceiver::new(&mut *self.transport, timeout).transmit_bytes(tx)
    }

    pub fn transceive_bytes_timeout(&mut self, tx: &[u8], timeout: Timeout) -> Result<Vec<u8>> {
        BitTransceiver::new(&mut *self.transport, timeout).transmit_bytes(tx)
    }

    pub fn transceive_bits(&mut self, tx: &[u8], bits: usize) -> Result<BitFrame> {
        let timeout = self.config.command_timeout;
        BitTransceiver::new(&mut *self.transport, timeout).transmit_bits(tx, bits)
    }

    /// Release the selected target: S(DESELECT) for ISO14443-4 targets,
    /// HLTA for other ISO14443-A targets. Calling it with nothing selected
    /// does nothing.
    pub fn deselect(&mut self) -> Result<()> {
        let Some(target) = self.selected.take() else {
            return Ok(());
        };
        let frame: Vec<u8> = match &target {
            t if t.is_iso14443_4() => iso14443a::deselect_block().to_vec(),
            Target::Iso14443a { .. } => iso14443a::halt().to_vec(),
            _ => return Ok(()),
        };
        let timeout = self.config.command_timeout;
        let expect_answer = target.is_iso14443_4();
        initiator::without_hardware_crc(&mut *self.transport, |t| {
            match t.transceive_bytes(&frame, timeout) {
                Ok(_) => Ok(()),
                // HLTA is never answered
                Err(e) if e.is_timeout() && !expect_answer => Ok(()),
                Err(e) => Err(e),
            }
        })?;
        log::debug!("deselected {}", target);
        Ok(())
    }
}

impl Device<TargetMode> {
    /// Target currently emulated, once armed.
    pub fn target(&self) -> Option<&Target> {
        self.selected.as_ref()
    }

    pub fn target_init(&mut self, target: &Target, timeout: Timeout) -> Result<Vec<u8>> {
        self.selected = Some(target.clone());
        log::debug!("arming target {}", target);
        self.transport.target_init(target, timeout)
    }

    pub fn target_receive_bytes(&mut self, timeout: Timeout) -> Result<Vec<u8>> {
        let rx = self.transport.target_receive_bytes(timeout)?;
        log::trace!("target RX: {}", crate::utils::bytes_to_hex_spaced(&rx));
        Ok(rx)
    }

    pub fn target_send_bytes(&mut self, tx: &[u8], timeout: Timeout) -> Result<()> {
        log::trace!("target TX: {}", crate::utils::bytes_to_hex_spaced(tx));
        self.transport.target_send_bytes(tx, timeout)
    }
}
