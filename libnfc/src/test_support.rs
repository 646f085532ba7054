//! Test support helpers intended for use by unit and integration tests.
//!
//! These helpers centralize common MockTransport and loopback setup so
//! tests across the crate and tests/ directory can reuse the same logic.
#![allow(dead_code)]

use crate::config::DeviceConfig;
use crate::device::{Device, DeviceBuilder, InitiatorMode, TargetMode};
use crate::protocol::crc::append_crc_a;
use crate::transport::{LoopbackTransport, MockTransport};
use crate::types::BitFrame;
use crate::Result;

/// Build a MockTransport pre-seeded with the given responses.
#[doc(hidden)]
pub fn mock_with_responses(responses: Vec<Vec<u8>>) -> MockTransport {
    let mock = MockTransport::new();
    for resp in responses {
        mock.push_response(resp);
    }
    mock
}

/// Initiator-mode device over `mock`; the mock stays usable for
/// inspecting sent frames.
#[doc(hidden)]
pub fn initiator_on(mock: &MockTransport, config: DeviceConfig) -> Result<Device<InitiatorMode>> {
    DeviceBuilder::new()
        .with_transport(Box::new(mock.clone()))
        .with_config(config)
        .build()?
        .init_as_initiator()
}

#[doc(hidden)]
pub fn target_on(mock: &MockTransport, config: DeviceConfig) -> Result<Device<TargetMode>> {
    Ok(DeviceBuilder::new()
        .with_transport(Box::new(mock.clone()))
        .with_config(config)
        .build()?
        .into_target())
}

/// Connected `(initiator, target)` devices sharing one simulated field.
#[doc(hidden)]
pub fn loopback_devices(config: DeviceConfig) -> Result<(Device<InitiatorMode>, Device<TargetMode>)> {
    let (i, t) = LoopbackTransport::pair();
    let initiator = DeviceBuilder::new()
        .with_transport(Box::new(i))
        .with_config(config.clone())
        .build()?
        .init_as_initiator()?;
    let target = DeviceBuilder::new()
        .with_transport(Box::new(t))
        .with_config(config)
        .build()?
        .into_target();
    Ok((initiator, target))
}

/// Queue the answers of a single-size ISO14443-A tag for one activation
/// without RATS: ATQA, anti-collision chunk (UID + BCC) and SAK with CRC_A.
#[doc(hidden)]
pub fn seed_iso14443a_activation(mock: &MockTransport, atqa: [u8; 2], uid: [u8; 4], sak: u8) {
    mock.push_bits(BitFrame::from_bytes(atqa.to_vec()));
    let bcc = uid.iter().fold(0u8, |acc, b| acc ^ b);
    let mut chunk = uid.to_vec();
    chunk.push(bcc);
    mock.push_response(chunk);
    let mut sak_frame = vec![sak];
    append_crc_a(&mut sak_frame);
    mock.push_response(sak_frame);
}
