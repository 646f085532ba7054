// libnfc/src/relay/link.rs

//! Side channel between the two halves of a split relay.
//!
//! On a byte stream every frame is `[kind][len u16 BE][data]`.

use std::io::{self, Read, Write};
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};

use crate::protocol::parser;
use crate::types::{Target, Uid};
use crate::utils::{AbortHandle, Timeout};
use crate::{Error, Result};

pub const LINK_TARGET: u8 = 0x01;
pub const LINK_COMMAND: u8 = 0x02;
pub const LINK_RESPONSE: u8 = 0x03;
pub const LINK_SHUTDOWN: u8 = 0x04;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkFrame {
    /// Descriptor of the relayed tag
    Target(Target),
    /// Reader command (C-APDU)
    Command(Vec<u8>),
    /// Tag answer (R-APDU)
    Response(Vec<u8>),
    Shutdown,
}

impl LinkFrame {
    pub fn kind(&self) -> u8 {
        match self {
            LinkFrame::Target(_) => LINK_TARGET,
            LinkFrame::Command(_) => LINK_COMMAND,
            LinkFrame::Response(_) => LINK_RESPONSE,
            LinkFrame::Shutdown => LINK_SHUTDOWN,
        }
    }

    pub fn encode(&self) -> Result<Vec<u8>> {
        let data = match self {
            LinkFrame::Target(t) => encode_target(t)?,
            LinkFrame::Command(d) | LinkFrame::Response(d) => d.clone(),
            LinkFrame::Shutdown => Vec::new(),
        };
        let len = u16::try_from(data.len()).map_err(|_| Error::BufferOverflow {
            limit: u16::MAX as usize,
            actual: data.len(),
        })?;
        let mut out = Vec::with_capacity(3 + data.len());
        out.push(self.kind());
        out.extend_from_slice(&len.to_be_bytes());
        out.extend_from_slice(&data);
        Ok(out)
    }

    pub fn decode(kind: u8, data: &[u8]) -> Result<Self> {
        match kind {
            LINK_TARGET => decode_target(data).map(LinkFrame::Target),
            LINK_COMMAND => Ok(LinkFrame::Command(data.to_vec())),
            LINK_RESPONSE => Ok(LinkFrame::Response(data.to_vec())),
            LINK_SHUTDOWN => Ok(LinkFrame::Shutdown),
            other => Err(Error::RfProtocolError(format!("relay frame kind {:02x}", other))),
        }
    }
}

/// `[atqa 2][sak][uid len][uid][ats]`; only ISO14443-A tags are relayed.
pub fn encode_target(target: &Target) -> Result<Vec<u8>> {
    match target {
        Target::Iso14443a {
            atqa,
            sak,
            uid,
            ats,
        } => {
            let mut out = Vec::with_capacity(4 + uid.len() + ats.len());
            out.extend_from_slice(atqa);
            out.push(*sak);
            out.push(uid.len() as u8);
            out.extend_from_slice(uid.as_bytes());
            out.extend_from_slice(ats);
            Ok(out)
        }
        other => Err(Error::DeviceNotSupported(format!(
            "relaying {:?} targets",
            other.modulation().kind
        ))),
    }
}

pub fn decode_target(data: &[u8]) -> Result<Target> {
    let atqa = parser::array_at(data, 0)?;
    let sak = parser::byte_at(data, 2)?;
    let uid_len = usize::from(parser::byte_at(data, 3)?);
    let uid = Uid::try_from(parser::slice_at(data, 4, uid_len)?)?;
    Ok(Target::Iso14443a {
        atqa,
        sak,
        uid,
        ats: data[4 + uid_len..].to_vec(),
    })
}

/// Frame transport between the relay halves.
pub trait FrameLink: Send {
    fn send(&mut self, frame: &LinkFrame) -> Result<()>;
    fn recv(&mut self, timeout: Timeout) -> Result<LinkFrame>;
}

/// Length-prefixed frames over any byte stream (pipe, socket, stdio).
/// Reads block; bound them with the stream's own timeouts.
pub struct StreamLink<R, W> {
    reader: R,
    writer: W,
}

impl<R: Read, W: Write> StreamLink<R, W> {
    pub fn new(reader: R, writer: W) -> Self {
        Self { reader, writer }
    }

    pub fn into_inner(self) -> (R, W) {
        (self.reader, self.writer)
    }
}

impl<R: Read + Send, W: Write + Send> FrameLink for StreamLink<R, W> {
    fn send(&mut self, frame: &LinkFrame) -> Result<()> {
        self.writer.write_all(&frame.encode()?)?;
        self.writer.flush()?;
        Ok(())
    }

    fn recv(&mut self, _timeout: Timeout) -> Result<LinkFrame> {
        let mut head = [0u8; 3];
        self.reader.read_exact(&mut head)?;
        let len = usize::from(u16::from_be_bytes([head[1], head[2]]));
        let mut data = vec![0u8; len];
        self.reader.read_exact(&mut data)?;
        LinkFrame::decode(head[0], &data)
    }
}

/// In-process link for running both halves in one program.
pub struct ChannelLink {
    tx: Sender<LinkFrame>,
    rx: Receiver<LinkFrame>,
    abort: AbortHandle,
}

impl ChannelLink {
    pub fn pair() -> (Self, Self) {
        let (a_tx, a_rx) = mpsc::channel();
        let (b_tx, b_rx) = mpsc::channel();
        (
            Self {
                tx: a_tx,
                rx: b_rx,
                abort: AbortHandle::new(),
            },
            Self {
                tx: b_tx,
                rx: a_rx,
                abort: AbortHandle::new(),
            },
        )
    }

    /// Cancels a pending `recv`.
    pub fn abort_handle(&self) -> AbortHandle {
        self.abort.clone()
    }
}

fn closed() -> Error {
    Error::Io(io::Error::new(io::ErrorKind::BrokenPipe, "relay link closed"))
}

impl FrameLink for ChannelLink {
    fn send(&mut self, frame: &LinkFrame) -> Result<()> {
        self.tx.send(frame.clone()).map_err(|_| closed())
    }

    fn recv(&mut self, timeout: Timeout) -> Result<LinkFrame> {
        let rx = &self.rx;
        self.abort.block_until(timeout, || match rx.try_recv() {
            Ok(frame) => Some(Ok(frame)),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => Some(Err(closed())),
        })?
    }
}
