// libnfc/src/dep/target.rs

use crate::dep::frame::{
    self, AtrReq, AtrRes, DepPdu, InitiatorFrame, Pfb, length_reduction_bytes, next_pni,
};
use crate::device::{Device, Idle, TargetMode};
use crate::types::{BaudRate, DepInfo, DepMode, Target};
use crate::utils::Timeout;
use crate::{Error, Result};

const DEP_HEADER: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Turn {
    /// No ATR exchanged yet
    Unlinked,
    Receive,
    Send,
}

/// DEP target owning a target-mode device. `receive` and `send` must
/// alternate, starting with `receive` after `init`.
pub struct DepTarget {
    device: Device<TargetMode>,
    local: Option<DepInfo>,
    initiator: Option<DepInfo>,
    turn: Turn,
    pni: u8,
}

impl DepTarget {
    pub fn new(device: Device<Idle>) -> Self {
        Self {
            device: device.into_target(),
            local: None,
            initiator: None,
            turn: Turn::Unlinked,
            pni: 0,
        }
    }

    pub fn device(&self) -> &Device<TargetMode> {
        &self.device
    }

    /// Initiator description from its ATR_REQ.
    pub fn initiator(&self) -> Option<&DepInfo> {
        self.initiator.as_ref()
    }

    pub fn initiator_general_bytes(&self) -> &[u8] {
        self.initiator
            .as_ref()
            .map(|i| i.general_bytes.as_slice())
            .unwrap_or(&[])
    }

    /// Arm the device as `target` (a [`Target::Dep`]), answer the
    /// initiator's ATR_REQ and return its raw bytes.
    pub fn init(&mut self, target: &Target, timeout: Timeout) -> Result<Vec<u8>> {
        let Target::Dep(local) = target else {
            return Err(Error::InvalidParameter(format!(
                "DEP target expected, got {:?}",
                target.modulation().kind
            )));
        };
        self.turn = Turn::Unlinked;
        self.initiator = None;
        self.local = Some(local.clone());

        let atr = self.device.target_init(target, timeout)?;
        match InitiatorFrame::decode(&atr)? {
            InitiatorFrame::Atr(req) => self.answer_atr(req, timeout)?,
            other => {
                return Err(Error::RfProtocolError(format!(
                    "ATR_REQ expected, got {:?}",
                    other
                )));
            }
        }
        Ok(atr)
    }

    fn answer_atr(&mut self, req: AtrReq, timeout: Timeout) -> Result<()> {
        let local = self
            .local
            .as_ref()
            .ok_or_else(|| Error::InvalidParameter("DEP target not initialised".into()))?;
        let res = AtrRes::new(local.nfcid3, req.did, local.general_bytes.clone());
        let (mode, baud) = (local.mode, local.baud);
        self.device.target_send_bytes(&res.encode()?, timeout)?;
        log::debug!("ATR_RES sent to NFCID3 {}", crate::utils::bytes_to_hex(req.nfcid3.as_bytes()));
        self.initiator = Some(req.into_info(mode, baud));
        self.turn = Turn::Receive;
        self.pni = 0;
        Ok(())
    }

    fn did(&self) -> u8 {
        self.initiator.as_ref().map(|i| i.did).unwrap_or(0)
    }

    fn release(&mut self, answer: Vec<u8>, timeout: Timeout) -> Result<Vec<u8>> {
        self.device.target_send_bytes(&answer, timeout)?;
        log::debug!("DEP target released");
        self.turn = Turn::Unlinked;
        self.initiator = None;
        Err(Error::TargetReleased)
    }

    fn max_payload(&self) -> usize {
        let pp = self.initiator.as_ref().map(|i| i.pp).unwrap_or(frame::PP_LR_254);
        length_reduction_bytes(pp) - DEP_HEADER
    }

    /// Receive the next initiator payload, reassembling chained frames.
    /// DSL_REQ / RLS_REQ end the link with `Error::TargetReleased`.
    pub fn receive(&mut self, timeout: Timeout) -> Result<Vec<u8>> {
        if self.turn != Turn::Receive {
            return Err(Error::InvalidParameter(format!(
                "receive called while the target expects {:?}",
                self.turn
            )));
        }
        let mut out = Vec::new();
        loop {
            let rx = self.device.target_receive_bytes(timeout)?;
            match InitiatorFrame::decode(&rx)? {
                InitiatorFrame::Dep(pdu) => match pdu.pfb {
                    Pfb::Information { more, pni } if pni == self.pni => {
                        out.extend_from_slice(&pdu.payload);
                        if !more {
                            self.turn = Turn::Send;
                            return Ok(out);
                        }
                        let ack = DepPdu::ack(self.pni).encode(false)?;
                        self.device.target_send_bytes(&ack, timeout)?;
                        self.pni = next_pni(self.pni);
                    }
                    Pfb::Attention => {
                        let atn = DepPdu::attention().encode(false)?;
                        self.device.target_send_bytes(&atn, timeout)?;
                    }
                    other => {
                        return Err(Error::RfProtocolError(format!(
                            "unexpected {:?} while at PNI {}",
                            other, self.pni
                        )));
                    }
                },
                InitiatorFrame::Psl { did, baud, .. } => {
                    self.device.target_send_bytes(&frame::psl_res(did)?, timeout)?;
                    self.set_baud(baud);
                }
                InitiatorFrame::Atr(req) => {
                    out.clear();
                    self.answer_atr(req, timeout)?;
                }
                InitiatorFrame::Dsl => return self.release(frame::dsl_res(self.did())?, timeout),
                InitiatorFrame::Rls => return self.release(frame::rls_res(self.did())?, timeout),
            }
        }
    }

    fn set_baud(&mut self, baud: BaudRate) {
        log::debug!("DEP target bit rate now {}", baud);
        if let Some(i) = self.initiator.as_mut() {
            i.baud = baud;
        }
    }

    /// Answer the last received payload, chaining when it exceeds the
    /// initiator's frame size.
    pub fn send(&mut self, payload: &[u8], timeout: Timeout) -> Result<()> {
        if self.turn != Turn::Send {
            return Err(Error::InvalidParameter(format!(
                "send called while the target expects {:?}",
                self.turn
            )));
        }
        let max = self.max_payload();
        let chunks: Vec<&[u8]> = if payload.is_empty() {
            vec![payload]
        } else {
            payload.chunks(max).collect()
        };
        let count = chunks.len();
        for (i, chunk) in chunks.into_iter().enumerate() {
            let more = i + 1 < count;
            let pdu = DepPdu::information(more, self.pni, chunk).encode(false)?;
            self.device.target_send_bytes(&pdu, timeout)?;
            self.pni = next_pni(self.pni);
            if more {
                self.expect_ack(timeout)?;
            }
        }
        self.turn = Turn::Receive;
        Ok(())
    }

    fn expect_ack(&mut self, timeout: Timeout) -> Result<()> {
        let rx = self.device.target_receive_bytes(timeout)?;
        match InitiatorFrame::decode(&rx)? {
            InitiatorFrame::Dep(DepPdu {
                pfb: Pfb::Ack { pni },
                ..
            }) if pni == self.pni => Ok(()),
            other => Err(Error::RfProtocolError(format!(
                "ACK {} expected, got {:?}",
                self.pni, other
            ))),
        }
    }

    /// Ask the initiator for more time before the pending answer.
    pub fn request_timeout_extension(&mut self, rtox: u8, timeout: Timeout) -> Result<()> {
        if self.turn != Turn::Send {
            return Err(Error::InvalidParameter(
                "RTOX is only valid while an answer is pending".into(),
            ));
        }
        let req = DepPdu::timeout_extension(rtox).encode(false)?;
        self.device.target_send_bytes(&req, timeout)?;
        let rx = self.device.target_receive_bytes(timeout)?;
        match InitiatorFrame::decode(&rx)? {
            InitiatorFrame::Dep(pdu) if pdu.rtox() == Some(rtox) => Ok(()),
            other => Err(Error::RfProtocolError(format!(
                "RTOX {} echo expected, got {:?}",
                rtox, other
            ))),
        }
    }

    /// Leave target mode; initiators find nothing until a new `init`.
    pub fn idle(self) -> Result<Device<Idle>> {
        self.device.idle()
    }
}

/// Descriptor of a DEP target with the given NFCID3 and general bytes.
pub fn dep_target(nfcid3: crate::types::Nfcid3, general_bytes: Vec<u8>, mode: DepMode) -> Target {
    Target::Dep(DepInfo {
        nfcid3,
        did: 0,
        bs: frame::ALL_BIT_RATES,
        br: frame::ALL_BIT_RATES,
        to: frame::DEFAULT_TO,
        pp: frame::PP_LR_254,
        general_bytes,
        mode,
        baud: BaudRate::Baud106,
    })
}
