// libnfc/src/config.rs

//! Runtime configuration of a [`Device`](crate::device::Device).

use std::time::Duration;

use crate::constants::{DEP_MAX_GENERAL_BYTES, ISO14443A_RATS_PARAM_DEFAULT};
use crate::protocol::iso14443a::WakeupCommand;
use crate::types::{Nfcid3, Uid};
use crate::utils::Timeout;
use crate::{Error, Result};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Default pause between two rounds of `poll_targets`, in milliseconds.
pub const DEFAULT_POLL_PERIOD_MS: u64 = 150;

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct DeviceConfig {
    /// Timeout of a single initiator exchange
    pub command_timeout: Timeout,
    /// How long target-mode receives wait for the initiator
    pub target_timeout: Timeout,
    /// Short frame opening ISO14443-A activation
    pub wakeup: WakeupCommand,
    /// RATS parameter byte (FSDI in the high nibble, CID in the low nibble)
    pub rats_param: u8,
    pub poll_period_ms: u64,
    /// NFCID3 sent in ATR_REQ / ATR_RES; derived from the target when unset
    pub dep_nfcid3: Option<Nfcid3>,
    pub dep_general_bytes: Vec<u8>,
    /// UID presented by a relay instead of the relayed tag's UID
    pub relay_uid: Option<Vec<u8>>,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            command_timeout: Timeout::default(),
            target_timeout: Timeout::Forever,
            wakeup: WakeupCommand::Reqa,
            rats_param: ISO14443A_RATS_PARAM_DEFAULT,
            poll_period_ms: DEFAULT_POLL_PERIOD_MS,
            dep_nfcid3: None,
            dep_general_bytes: Vec::new(),
            relay_uid: None,
        }
    }
}

impl DeviceConfig {
    pub fn with_command_timeout(mut self, timeout: Timeout) -> Self {
        self.command_timeout = timeout;
        self
    }

    pub fn with_target_timeout(mut self, timeout: Timeout) -> Self {
        self.target_timeout = timeout;
        self
    }

    pub fn with_wakeup(mut self, wakeup: WakeupCommand) -> Self {
        self.wakeup = wakeup;
        self
    }

    pub fn with_rats_param(mut self, param: u8) -> Self {
        self.rats_param = param;
        self
    }

    pub fn with_poll_period(mut self, period: Duration) -> Self {
        self.poll_period_ms = period.as_millis() as u64;
        self
    }

    pub fn with_dep_nfcid3(mut self, nfcid3: Nfcid3) -> Self {
        self.dep_nfcid3 = Some(nfcid3);
        self
    }

    pub fn with_dep_general_bytes(mut self, gb: impl Into<Vec<u8>>) -> Self {
        self.dep_general_bytes = gb.into();
        self
    }

    pub fn with_relay_uid(mut self, uid: impl Into<Vec<u8>>) -> Self {
        self.relay_uid = Some(uid.into());
        self
    }

    pub fn poll_period(&self) -> Duration {
        Duration::from_millis(self.poll_period_ms)
    }

    /// Relay UID override as a validated [`Uid`].
    pub fn relay_uid(&self) -> Result<Option<Uid>> {
        self.relay_uid
            .as_deref()
            .map(Uid::try_from)
            .transpose()
    }

    /// Reject values no reader would accept.
    pub fn validate(&self) -> Result<()> {
        // FSDI above 8 is reserved
        if self.rats_param >> 4 > 8 {
            return Err(Error::InvalidParameter(format!(
                "RATS FSDI {} is reserved",
                self.rats_param >> 4
            )));
        }
        if self.dep_general_bytes.len() > DEP_MAX_GENERAL_BYTES {
            return Err(Error::BufferOverflow {
                limit: DEP_MAX_GENERAL_BYTES,
                actual: self.dep_general_bytes.len(),
            });
        }
        self.relay_uid()?;
        Ok(())
    }
}
