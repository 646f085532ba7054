// libnfc/src/emulation/type2.rs

//! NFC Forum Type 2 tag (MIFARE Ultralight / NTAG memory model).

use crate::constants::{MIFARE_ACK, MIFARE_READ, MIFARE_ULTRALIGHT_WRITE};
use crate::emulation::{EmulatorIo, Exchange};
use crate::types::{Target, Uid};
use crate::{Error, Result};

pub const TYPE2_PAGE_LEN: usize = 4;
pub const TYPE2_READ_LEN: usize = 16;
/// NAK for an invalid page argument
pub const TYPE2_NAK: u8 = 0x00;
const HALT: u8 = 0x50;

/// Memory image answered page by page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Type2Tag {
    memory: Vec<u8>,
}

impl Type2Tag {
    /// The image must hold at least one READ worth of whole pages.
    pub fn new(memory: impl Into<Vec<u8>>) -> Result<Self> {
        let memory = memory.into();
        if memory.len() < TYPE2_READ_LEN || memory.len() % TYPE2_PAGE_LEN != 0 {
            return Err(Error::InvalidParameter(format!(
                "type 2 image of {} bytes is not a whole number of pages",
                memory.len()
            )));
        }
        Ok(Self { memory })
    }

    /// Descriptor of an NTAG-like tag with the given UID.
    pub fn target(uid: Uid) -> Target {
        Target::Iso14443a {
            atqa: [0x00, 0x44],
            sak: 0x00,
            uid,
            ats: Vec::new(),
        }
    }

    pub fn memory(&self) -> &[u8] {
        &self.memory
    }

    fn pages(&self) -> usize {
        self.memory.len() / TYPE2_PAGE_LEN
    }

    /// 16 bytes starting at `page`, wrapping to page 0 past the end.
    pub fn read(&self, page: u8) -> Option<Vec<u8>> {
        let start = usize::from(page) * TYPE2_PAGE_LEN;
        if start >= self.memory.len() {
            return None;
        }
        let len = self.memory.len();
        Some((0..TYPE2_READ_LEN).map(|i| self.memory[(start + i) % len]).collect())
    }

    pub fn write(&mut self, page: u8, data: &[u8; TYPE2_PAGE_LEN]) -> bool {
        let page = usize::from(page);
        if page >= self.pages() {
            return false;
        }
        let start = page * TYPE2_PAGE_LEN;
        self.memory[start..start + TYPE2_PAGE_LEN].copy_from_slice(data);
        true
    }
}

impl EmulatorIo for Type2Tag {
    fn process(&mut self, command: &[u8]) -> Exchange {
        match command {
            [MIFARE_READ, page, ..] => {
                Exchange::Continue(self.read(*page).unwrap_or_else(|| vec![TYPE2_NAK]))
            }
            [MIFARE_ULTRALIGHT_WRITE, page, d0, d1, d2, d3, ..] => {
                if self.write(*page, &[*d0, *d1, *d2, *d3]) {
                    Exchange::Continue(vec![MIFARE_ACK])
                } else {
                    Exchange::Continue(vec![TYPE2_NAK])
                }
            }
            [HALT, ..] => Exchange::Halt,
            other => Exchange::Error(Error::CommandNotSupported(format!(
                "type 2 command {}",
                crate::utils::bytes_to_hex_spaced(other)
            ))),
        }
    }
}
