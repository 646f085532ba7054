// libnfc/src/dep/initiator.rs

use crate::dep::frame::{
    self, AtrReq, AtrRes, DepPdu, PSL_RES, Pfb, RLS_RES, length_reduction_bytes, next_pni,
};
use crate::device::{Device, InitiatorMode};
use crate::initiator::silent_as_none;
use crate::types::{BaudRate, DepInfo, DepMode, Nfcid3, Target};
use crate::utils::Timeout;
use crate::{Error, Result};

/// NFCID3 sent when the configuration does not provide one.
pub const DEFAULT_NFCID3I: [u8; 10] = [0x6c, 0x69, 0x62, 0x6e, 0x66, 0x63, 0x2d, 0x72, 0x73, 0x00];

/// Largest RTOX multiplier a target may request.
const RTOX_MAX: u8 = 59;

/// CMD0, CMD1 and PFB; the length reduction bound excludes LEN itself.
const DEP_HEADER: usize = 3;

#[derive(Debug)]
struct DepLink {
    info: DepInfo,
    pni: u8,
}

/// DEP initiator owning an initiator-mode device.
pub struct DepInitiator {
    device: Device<InitiatorMode>,
    link: Option<DepLink>,
}

impl DepInitiator {
    pub fn new(device: Device<InitiatorMode>) -> Self {
        Self { device, link: None }
    }

    pub fn device(&self) -> &Device<InitiatorMode> {
        &self.device
    }

    /// Give the device back; an open link is dropped without RLS_REQ.
    pub fn into_device(self) -> Device<InitiatorMode> {
        self.device
    }

    /// Description of the selected target.
    pub fn target(&self) -> Option<&DepInfo> {
        self.link.as_ref().map(|l| &l.info)
    }

    pub fn is_selected(&self) -> bool {
        self.link.is_some()
    }

    /// Exchange ATR_REQ / ATR_RES. `general_bytes` overrides the configured
    /// ones. `Ok(None)` means no target answered.
    pub fn select(
        &mut self,
        mode: DepMode,
        baud: BaudRate,
        general_bytes: Option<&[u8]>,
        timeout: Timeout,
    ) -> Result<Option<Target>> {
        if self.link.is_some() {
            self.deselect()?;
        }
        let config = self.device.config();
        let nfcid3 = config
            .dep_nfcid3
            .unwrap_or_else(|| Nfcid3::from(DEFAULT_NFCID3I));
        let gb = general_bytes
            .map(<[u8]>::to_vec)
            .unwrap_or_else(|| config.dep_general_bytes.clone());
        let req = AtrReq::new(nfcid3, gb).encode()?;

        let Some(rx) = silent_as_none(self.device.transceive_bytes_timeout(&req, timeout))? else {
            log::debug!("no DEP target ({:?}, {})", mode, baud);
            return Ok(None);
        };
        let info = AtrRes::decode(&rx)?.into_info(mode, baud);
        let target = Target::Dep(info.clone());
        log::debug!("DEP link up: {}", target);
        self.link = Some(DepLink { info, pni: 0 });
        self.device.set_selected(Some(target.clone()));
        Ok(Some(target))
    }

    /// Look for a DEP target without general bytes.
    pub fn poll(&mut self, mode: DepMode, baud: BaudRate, timeout: Timeout) -> Result<Option<Target>> {
        self.select(mode, baud, Some(&[][..]), timeout)
    }

    fn link(&mut self) -> Result<&mut DepLink> {
        self.link
            .as_mut()
            .ok_or_else(|| Error::InvalidParameter("no DEP target selected".into()))
    }

    /// Switch both directions to `baud` with PSL_REQ.
    pub fn set_baud_rate(&mut self, baud: BaudRate) -> Result<()> {
        let timeout = self.device.config().command_timeout;
        let link = self.link()?;
        if !link.info.supported_baud_rates().contains(&baud) {
            return Err(Error::InvalidParameter(format!(
                "target does not support {}",
                baud
            )));
        }
        let did = link.info.did;
        let req = frame::psl_req(did, baud, link.info.pp >> 4)?;
        let rx = self.device.transceive_bytes_timeout(&req, timeout)?;
        frame::expect_response(&rx, PSL_RES)?;

        let link = self.link()?;
        link.info.baud = baud;
        let target = Target::Dep(link.info.clone());
        self.device.set_selected(Some(target));
        log::debug!("DEP bit rate now {}", baud);
        Ok(())
    }

    /// Send `payload` and return the target's answer, chaining in both
    /// directions when a side exceeds the negotiated frame size.
    pub fn transceive(&mut self, payload: &[u8]) -> Result<Vec<u8>> {
        let timeout = self.device.config().command_timeout;
        let Self { device, link } = self;
        let link = link
            .as_mut()
            .ok_or_else(|| Error::InvalidParameter("no DEP target selected".into()))?;

        let max = length_reduction_bytes(link.info.pp) - DEP_HEADER;
        let chunks: Vec<&[u8]> = if payload.is_empty() {
            vec![payload]
        } else {
            payload.chunks(max).collect()
        };
        let Some((last, head)) = chunks.split_last() else {
            return Ok(Vec::new());
        };

        for chunk in head {
            let res = exchange(device, &DepPdu::information(true, link.pni, chunk), timeout)?;
            match res.pfb {
                Pfb::Ack { pni } if pni == link.pni => link.pni = next_pni(link.pni),
                other => return Err(unexpected(other, link.pni)),
            }
        }

        let mut res = exchange(device, &DepPdu::information(false, link.pni, last), timeout)?;
        let mut out = Vec::new();
        loop {
            match res.pfb {
                Pfb::Information { more, pni } if pni == link.pni => {
                    out.extend_from_slice(&res.payload);
                    link.pni = next_pni(link.pni);
                    if !more {
                        return Ok(out);
                    }
                    res = exchange(device, &DepPdu::ack(link.pni), timeout)?;
                }
                other => return Err(unexpected(other, link.pni)),
            }
        }
    }

    /// Presence check: ATN must be answered with ATN.
    pub fn attention(&mut self) -> Result<()> {
        let timeout = self.device.config().command_timeout;
        self.link()?;
        let res = exchange(&mut self.device, &DepPdu::attention(), timeout)?;
        match res.pfb {
            Pfb::Attention => Ok(()),
            other => Err(unexpected(other, 0)),
        }
    }

    /// Release the link with RLS_REQ. Without a link this does nothing.
    pub fn deselect(&mut self) -> Result<()> {
        let Some(link) = self.link.take() else {
            return Ok(());
        };
        self.device.set_selected(None);
        let timeout = self.device.config().command_timeout;
        let rx = self
            .device
            .transceive_bytes_timeout(&frame::rls_req(link.info.did)?, timeout)?;
        frame::expect_response(&rx, RLS_RES)?;
        log::debug!("DEP link released");
        Ok(())
    }
}

fn unexpected(pfb: Pfb, pni: u8) -> Error {
    Error::RfProtocolError(format!("unexpected {:?} while at PNI {}", pfb, pni))
}

/// One DEP_REQ / DEP_RES round trip, answering RTOX requests on the way.
fn exchange(device: &mut Device<InitiatorMode>, pdu: &DepPdu, timeout: Timeout) -> Result<DepPdu> {
    let mut rx = device.transceive_bytes_timeout(&pdu.encode(true)?, timeout)?;
    loop {
        let res = DepPdu::decode(&rx, false)?;
        if res.pfb != Pfb::TimeoutExtension {
            return Ok(res);
        }
        let rtox = match res.rtox() {
            Some(v @ 1..=RTOX_MAX) => v,
            other => {
                return Err(Error::RfProtocolError(format!("invalid RTOX {:?}", other)));
            }
        };
        log::debug!("target asked for RTOX {}", rtox);
        let extended = match timeout {
            Timeout::Millis(ms) => Timeout::Millis(ms.saturating_mul(u64::from(rtox))),
            other => other,
        };
        rx = device.transceive_bytes_timeout(&DepPdu::timeout_extension(rtox).encode(true)?, extended)?;
    }
}
