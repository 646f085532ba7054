// libnfc/src/initiator/felica.rs

//! FeliCa polling and unencrypted block access.

use crate::device::{Device, InitiatorMode};
use crate::initiator::silent_as_none;
use crate::protocol::felica;
use crate::transport::Transport;
use crate::types::{BaudRate, BlockData, BlockElement, Idm, ServiceCode, SystemCode, Target};
use crate::utils::Timeout;
use crate::{Error, Result};

/// Ask for the system code in the polling answer.
const REQUEST_SYSTEM_CODE: u8 = 0x01;

/// Poll for one FeliCa card answering `system_code` (single time slot).
pub fn poll(
    transport: &mut dyn Transport,
    baud: BaudRate,
    system_code: SystemCode,
    timeout: Timeout,
) -> Result<Option<Target>> {
    let tx = felica::polling(system_code, REQUEST_SYSTEM_CODE, 0);
    let Some(rx) = silent_as_none(transport.transceive_bytes(&tx, timeout))? else {
        return Ok(None);
    };
    let res = felica::decode_polling(&rx)?;
    log::debug!("felica IDm {}", res.idm.to_hex());
    Ok(Some(Target::Felica {
        idm: res.idm,
        pmm: res.pmm,
        system_code: res.system_code.unwrap_or(system_code),
        baud,
    }))
}

/// Block access to the selected FeliCa card.
pub struct FelicaTag<'a> {
    device: &'a mut Device<InitiatorMode>,
    idm: Idm,
}

impl<'a> FelicaTag<'a> {
    pub fn new(device: &'a mut Device<InitiatorMode>) -> Result<Self> {
        let idm = match device.selected_target() {
            Some(Target::Felica { idm, .. }) => *idm,
            _ => {
                return Err(Error::InvalidParameter(
                    "no FeliCa card selected".into(),
                ));
            }
        };
        Ok(Self { device, idm })
    }

    pub fn idm(&self) -> Idm {
        self.idm
    }

    pub fn read_blocks(
        &mut self,
        services: &[ServiceCode],
        blocks: &[BlockElement],
    ) -> Result<Vec<BlockData>> {
        let tx = felica::check(self.idm, services, blocks)?;
        let rx = self.device.transceive_bytes(&tx)?;
        let data = felica::decode_check(&rx, &self.idm)?;
        if data.len() != blocks.len() {
            return Err(Error::InvalidLength {
                expected: blocks.len(),
                actual: data.len(),
            });
        }
        Ok(data)
    }

    pub fn write_blocks(
        &mut self,
        services: &[ServiceCode],
        blocks: &[BlockElement],
        data: &[BlockData],
    ) -> Result<()> {
        let tx = felica::update(self.idm, services, blocks, data)?;
        let rx = self.device.transceive_bytes(&tx)?;
        felica::decode_update(&rx, &self.idm)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DeviceConfig;
    use crate::device::DeviceBuilder;
    use crate::transport::MockTransport;
    use crate::types::{AccessMode, Modulation};

    const IDM: [u8; 8] = [0x01, 0x2e, 0x4c, 0xd7, 0x8a, 0x1b, 0x00, 0x11];
    const PMM: [u8; 8] = [0x03, 0x01, 0x4b, 0x02, 0x4f, 0x49, 0x93, 0xff];

    fn polling_answer() -> Vec<u8> {
        let mut rx = vec![0x14, 0x01];
        rx.extend_from_slice(&IDM);
        rx.extend_from_slice(&PMM);
        rx.extend_from_slice(&[0x12, 0xfc]);
        rx
    }

    fn device(mock: &MockTransport) -> Device<InitiatorMode> {
        DeviceBuilder::new()
            .with_transport(Box::new(mock.clone()))
            .with_config(DeviceConfig::default().with_command_timeout(Timeout::Millis(10)))
            .build()
            .unwrap()
            .init_as_initiator()
            .unwrap()
    }

    #[test]
    fn poll_builds_target() {
        let mut mock = MockTransport::new();
        mock.push_response(polling_answer());
        let t = poll(&mut mock, BaudRate::Baud212, SystemCode::ANY, Timeout::Millis(10))
            .unwrap()
            .unwrap();
        match t {
            Target::Felica {
                idm, system_code, ..
            } => {
                assert_eq!(idm.as_bytes(), &IDM);
                assert_eq!(system_code, SystemCode::NDEF);
            }
            other => panic!("unexpected target {:?}", other),
        }
        assert_eq!(mock.sent()[0], vec![0x06, 0x00, 0xff, 0xff, 0x01, 0x00]);
    }

    #[test]
    fn silent_poll_is_none() {
        let mut mock = MockTransport::new();
        let t = poll(&mut mock, BaudRate::Baud212, SystemCode::ANY, Timeout::Millis(1)).unwrap();
        assert!(t.is_none());
    }

    #[test]
    fn read_one_block() {
        let mock = MockTransport::new();
        mock.push_response(polling_answer());
        let mut rx = vec![0x1d, 0x07];
        rx.extend_from_slice(&IDM);
        rx.extend_from_slice(&[0x00, 0x00, 0x01]);
        rx.extend_from_slice(&[0xab; 16]);
        mock.push_response(rx);

        let mut dev = device(&mock);
        dev.select_passive_target(Modulation::FELICA_212, None)
            .unwrap()
            .unwrap();
        let mut tag = FelicaTag::new(&mut dev).unwrap();
        let blocks = tag
            .read_blocks(
                &[ServiceCode::new(0x000b)],
                &[BlockElement::new(0, AccessMode::Normal, 0)],
            )
            .unwrap();
        assert_eq!(blocks[0].as_bytes(), &[0xab; 16]);
        assert_eq!(mock.sent()[1][1], 0x06);
    }

    #[test]
    fn write_reports_status_flags() {
        let mock = MockTransport::new();
        mock.push_response(polling_answer());
        let mut rx = vec![0x0c, 0x09];
        rx.extend_from_slice(&IDM);
        rx.extend_from_slice(&[0x01, 0xa8]);
        mock.push_response(rx);

        let mut dev = device(&mock);
        dev.select_passive_target(Modulation::FELICA_212, None)
            .unwrap();
        let mut tag = FelicaTag::new(&mut dev).unwrap();
        let err = tag
            .write_blocks(
                &[ServiceCode::new(0x0009)],
                &[BlockElement::new(0, AccessMode::Normal, 1)],
                &[BlockData::from_bytes([0; 16])],
            )
            .unwrap_err();
        assert!(matches!(
            err,
            Error::FelicaStatus {
                status1: 0x01,
                status2: 0xa8
            }
        ));
    }

    #[test]
    fn requires_a_felica_selection() {
        let mock = MockTransport::new();
        let mut dev = device(&mock);
        assert!(FelicaTag::new(&mut dev).is_err());
    }
}
