// libnfc/src/device/builder.rs

use crate::config::DeviceConfig;
use crate::device::handle::{Device, Idle};
use crate::transport::Transport;
use crate::{Error, Result};

/// Helper to construct a Device with optional configuration.
#[derive(Default)]
pub struct DeviceBuilder {
    transport: Option<Box<dyn Transport>>,
    config: DeviceConfig,
}

impl DeviceBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Provide an already-created transport instance (e.g. MockTransport)
    pub fn with_transport(mut self, transport: Box<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn with_config(mut self, config: DeviceConfig) -> Self {
        self.config = config;
        self
    }

    /// Consume the builder and return an idle Device.
    /// Requires a transport to be provided; otherwise returns DeviceNotFound.
    pub fn build(self) -> Result<Device<Idle>> {
        match self.transport {
            Some(t) => Device::new(t, self.config),
            None => Err(Error::DeviceNotFound),
        }
    }
}
