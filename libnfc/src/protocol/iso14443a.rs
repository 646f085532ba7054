// libnfc/src/protocol/iso14443a.rs

//! ISO/IEC 14443-3/4 Type A frame builders and parsers.
//!
//! Builders return fixed-size arrays; the `write_*` variants encode into a
//! caller-owned buffer and report `BufferTooSmall` instead of truncating.

use crate::constants::*;
use crate::protocol::crc::{crc_a, strip_crc_a, write_crc_a};
use crate::types::{BitFrame, Uid};
use crate::{Error, Result};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Anti-collision cascade level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CascadeLevel {
    One,
    Two,
    Three,
}

impl CascadeLevel {
    pub fn sel_code(self) -> u8 {
        match self {
            CascadeLevel::One => ISO14443A_SEL_CL1,
            CascadeLevel::Two => ISO14443A_SEL_CL2,
            CascadeLevel::Three => ISO14443A_SEL_CL3,
        }
    }

    pub fn next(self) -> Option<Self> {
        match self {
            CascadeLevel::One => Some(CascadeLevel::Two),
            CascadeLevel::Two => Some(CascadeLevel::Three),
            CascadeLevel::Three => None,
        }
    }

    /// 1-based level number.
    pub fn number(self) -> u8 {
        match self {
            CascadeLevel::One => 1,
            CascadeLevel::Two => 2,
            CascadeLevel::Three => 3,
        }
    }

    pub fn all() -> [CascadeLevel; 3] {
        [CascadeLevel::One, CascadeLevel::Two, CascadeLevel::Three]
    }
}

/// Short frame used to wake the field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum WakeupCommand {
    /// REQA (0x26): wakes IDLE tags only
    #[default]
    Reqa,
    /// WUPA (0x52): also wakes HALTed tags
    Wupa,
}

impl WakeupCommand {
    pub fn frame(self) -> BitFrame {
        match self {
            WakeupCommand::Reqa => reqa(),
            WakeupCommand::Wupa => wupa(),
        }
    }
}

pub fn reqa() -> BitFrame {
    BitFrame::short(ISO14443A_REQA)
}

pub fn wupa() -> BitFrame {
    BitFrame::short(ISO14443A_WUPA)
}

pub fn magic_wakeup() -> BitFrame {
    BitFrame::short(MAGIC_WAKEUP_1)
}

fn ensure_capacity(out: &[u8], needed: usize) -> Result<()> {
    if out.len() < needed {
        return Err(Error::BufferTooSmall {
            needed,
            available: out.len(),
        });
    }
    Ok(())
}

/// Anti-collision request at `level` (SEL + NVB 0x20, no CRC).
pub fn anticollision(level: CascadeLevel) -> [u8; 2] {
    [level.sel_code(), ISO14443A_NVB_ANTICOLLISION]
}

pub fn write_anticollision(level: CascadeLevel, out: &mut [u8]) -> Result<usize> {
    ensure_capacity(out, 2)?;
    out[..2].copy_from_slice(&anticollision(level));
    Ok(2)
}

/// SELECT at `level` for a 5-byte UID chunk (4 UID/CT bytes + BCC), CRC_A appended.
pub fn select(level: CascadeLevel, chunk: &[u8; 5]) -> [u8; 9] {
    let mut frame = [0u8; 9];
    frame[0] = level.sel_code();
    frame[1] = ISO14443A_NVB_SELECT;
    frame[2..7].copy_from_slice(chunk);
    let crc = crc_a(&frame[..7]);
    frame[7..].copy_from_slice(&crc);
    frame
}

pub fn write_select(level: CascadeLevel, chunk: &[u8; 5], out: &mut [u8]) -> Result<usize> {
    ensure_capacity(out, 9)?;
    out[0] = level.sel_code();
    out[1] = ISO14443A_NVB_SELECT;
    out[2..7].copy_from_slice(chunk);
    write_crc_a(out, 7)
}

/// HLTA (0x50 0x00 + CRC_A)
pub fn halt() -> [u8; 4] {
    let mut frame = [0u8; 4];
    frame[..2].copy_from_slice(&ISO14443A_HALT);
    let crc = crc_a(&ISO14443A_HALT);
    frame[2..].copy_from_slice(&crc);
    frame
}

pub fn write_halt(out: &mut [u8]) -> Result<usize> {
    ensure_capacity(out, 4)?;
    out[..2].copy_from_slice(&ISO14443A_HALT);
    write_crc_a(out, 2)
}

/// RATS with the given parameter byte (FSDI in the high nibble, CID in the low).
pub fn rats(param: u8) -> [u8; 4] {
    let mut frame = [ISO14443A_RATS, param, 0, 0];
    let crc = crc_a(&frame[..2]);
    frame[2..].copy_from_slice(&crc);
    frame
}

pub fn write_rats(param: u8, out: &mut [u8]) -> Result<usize> {
    ensure_capacity(out, 4)?;
    out[0] = ISO14443A_RATS;
    out[1] = param;
    write_crc_a(out, 2)
}

/// ISO14443-4 S(DESELECT) block with CRC_A.
pub fn deselect_block() -> [u8; 3] {
    let crc = crc_a(&[ISO14443_4_S_DESELECT]);
    [ISO14443_4_S_DESELECT, crc[0], crc[1]]
}

/// MIFARE READ (0x30 block) with CRC_A.
pub fn read_command(block: u8) -> [u8; 4] {
    let mut frame = [MIFARE_READ, block, 0, 0];
    let crc = crc_a(&frame[..2]);
    frame[2..].copy_from_slice(&crc);
    frame
}

/// MIFARE Classic WRITE (0xA0 block) with CRC_A. The 16 data bytes follow
/// in a second frame once the tag ACKs.
pub fn write_command(block: u8) -> [u8; 4] {
    let mut frame = [MIFARE_WRITE, block, 0, 0];
    let crc = crc_a(&frame[..2]);
    frame[2..].copy_from_slice(&crc);
    frame
}

/// Block check character: XOR of the four UID/CT bytes.
pub fn bcc(uid: &[u8; 4]) -> u8 {
    uid.iter().fold(0, |acc, b| acc ^ b)
}

/// Outcome of a BCC verification. A mismatch is reported, never fatal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BccCheck {
    Valid,
    Mismatch { expected: u8, actual: u8 },
}

/// Check the BCC of a 5-byte anti-collision response.
pub fn check_bcc(response: &[u8; 5]) -> BccCheck {
    let expected = bcc(&[response[0], response[1], response[2], response[3]]);
    if expected == response[4] {
        BccCheck::Valid
    } else {
        BccCheck::Mismatch {
            expected,
            actual: response[4],
        }
    }
}

/// SAK bit 0x04: the UID is not complete, continue at the next level.
pub fn sak_cascade(sak: u8) -> bool {
    sak & SAK_CASCADE_BIT != 0
}

/// SAK bit 0x20: the tag supports ISO14443-4 (answers RATS).
pub fn sak_iso14443_4(sak: u8) -> bool {
    sak & SAK_ISO14443_4_COMPLIANT != 0
}

/// Split a 4, 7 or 10 byte UID into the per-level chunks sent in SELECT:
/// non-final levels carry the cascade tag and three UID bytes.
pub fn cascade_uid_chunks(uid: &Uid) -> Vec<[u8; 5]> {
    let bytes = uid.as_bytes();
    let levels = uid.cascade_levels();
    let mut chunks = Vec::with_capacity(levels);
    let mut pos = 0;
    for level in 0..levels {
        let mut four = [0u8; 4];
        if level + 1 < levels {
            four[0] = ISO14443A_CASCADE_TAG;
            four[1..].copy_from_slice(&bytes[pos..pos + 3]);
            pos += 3;
        } else {
            four.copy_from_slice(&bytes[pos..pos + 4]);
            pos += 4;
        }
        let bcc = bcc(&four);
        chunks.push([four[0], four[1], four[2], four[3], bcc]);
    }
    chunks
}

/// Parse a SAK response: either the bare SAK byte (CRC checked by the
/// transport) or SAK followed by its CRC_A.
pub fn parse_sak(frame: &[u8]) -> Result<u8> {
    match frame.len() {
        1 => Ok(frame[0]),
        3 => Ok(strip_crc_a(frame)?[0]),
        n => Err(Error::FramingError(format!(
            "SAK must be 1 or 3 bytes, got {}",
            n
        ))),
    }
}

/// Parse an ATS response `TL T0 [TA] [TB] [TC] [T1..Tk] [CRC_A]` and return it
/// without TL and CRC, i.e. starting at T0.
pub fn parse_ats(frame: &[u8]) -> Result<Vec<u8>> {
    let tl = *frame
        .first()
        .ok_or_else(|| Error::FramingError("empty ATS".into()))? as usize;
    if tl == 0 {
        return Err(Error::FramingError("ATS length byte is zero".into()));
    }
    let body = if frame.len() == tl + 2 {
        strip_crc_a(frame)?
    } else if frame.len() == tl {
        frame
    } else {
        return Err(Error::FramingError(format!(
            "ATS TL={} does not match {} received bytes",
            tl,
            frame.len()
        )));
    };
    Ok(body[1..].to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_frames_are_seven_bits() {
        assert_eq!(reqa().bytes(), &[0x26]);
        assert_eq!(reqa().bit_len(), 7);
        assert_eq!(wupa().bytes(), &[0x52]);
        assert_eq!(WakeupCommand::Wupa.frame(), wupa());
        assert_eq!(magic_wakeup().bytes(), &[0x40]);
    }

    #[test]
    fn anticollision_frames() {
        assert_eq!(anticollision(CascadeLevel::One), [0x93, 0x20]);
        assert_eq!(anticollision(CascadeLevel::Two), [0x95, 0x20]);
        assert_eq!(anticollision(CascadeLevel::Three), [0x97, 0x20]);
    }

    #[test]
    fn select_frame_layout() {
        let chunk = [0x01, 0x02, 0x03, 0x04, 0x04];
        let frame = select(CascadeLevel::One, &chunk);
        assert_eq!(
            frame,
            [0x93, 0x70, 0x01, 0x02, 0x03, 0x04, 0x04, 0x8e, 0x25]
        );
        let mut buf = [0u8; 12];
        assert_eq!(write_select(CascadeLevel::One, &chunk, &mut buf).unwrap(), 9);
        assert_eq!(&buf[..9], &frame);
    }

    #[test]
    fn halt_and_rats() {
        assert_eq!(halt(), [0x50, 0x00, 0x57, 0xcd]);
        assert_eq!(rats(0x80), [0xe0, 0x80, 0x31, 0x73]);
        assert_eq!(read_command(0), [0x30, 0x00, 0x02, 0xa8]);
    }

    #[test]
    fn writers_report_insufficient_buffer() {
        let mut small = [0u8; 3];
        assert!(matches!(
            write_select(CascadeLevel::Two, &[0; 5], &mut small),
            Err(Error::BufferTooSmall {
                needed: 9,
                available: 3
            })
        ));
        assert!(matches!(
            write_halt(&mut small),
            Err(Error::BufferTooSmall { needed: 4, .. })
        ));
        assert!(matches!(
            write_rats(0x50, &mut small),
            Err(Error::BufferTooSmall { .. })
        ));
        let mut one = [0u8; 1];
        assert!(write_anticollision(CascadeLevel::One, &mut one).is_err());
    }

    #[test]
    fn bcc_check() {
        assert_eq!(bcc(&[0x88, 0x04, 0xa2, 0x3b]), 0x88 ^ 0x04 ^ 0xa2 ^ 0x3b);
        assert_eq!(check_bcc(&[0x01, 0x02, 0x03, 0x04, 0x04]), BccCheck::Valid);
        assert_eq!(
            check_bcc(&[0x01, 0x02, 0x03, 0x04, 0xff]),
            BccCheck::Mismatch {
                expected: 0x04,
                actual: 0xff
            }
        );
    }

    #[test]
    fn sak_bits() {
        assert!(sak_cascade(0x04));
        assert!(!sak_cascade(0x08));
        assert!(sak_iso14443_4(0x20));
        assert!(sak_iso14443_4(0x28));
        assert!(!sak_iso14443_4(0x00));
    }

    #[test]
    fn cascade_chunks_for_seven_byte_uid() {
        let uid = Uid::try_from(&[0x04, 0xa2, 0x3b, 0x12, 0x34, 0x56, 0x78][..]).unwrap();
        let chunks = cascade_uid_chunks(&uid);
        assert_eq!(chunks.len(), 2);
        assert_eq!(&chunks[0][..4], &[0x88, 0x04, 0xa2, 0x3b]);
        assert_eq!(&chunks[1][..4], &[0x12, 0x34, 0x56, 0x78]);
        assert_eq!(check_bcc(&chunks[0]), BccCheck::Valid);
        assert_eq!(check_bcc(&chunks[1]), BccCheck::Valid);
    }

    #[test]
    fn sak_with_and_without_crc() {
        assert_eq!(parse_sak(&[0x08]).unwrap(), 0x08);
        assert_eq!(parse_sak(&[0x08, 0xb6, 0xdd]).unwrap(), 0x08);
        assert!(matches!(
            parse_sak(&[0x08, 0x00, 0x00]),
            Err(Error::CrcMismatch { .. })
        ));
        assert!(parse_sak(&[]).is_err());
    }

    #[test]
    fn ats_is_stripped_of_tl_and_crc() {
        let mut frame = vec![0x05, 0x75, 0x77, 0x81, 0x02];
        assert_eq!(parse_ats(&frame).unwrap(), vec![0x75, 0x77, 0x81, 0x02]);
        crate::protocol::crc::append_crc_a(&mut frame);
        assert_eq!(parse_ats(&frame).unwrap(), vec![0x75, 0x77, 0x81, 0x02]);
        assert!(parse_ats(&[0x09, 0x75]).is_err());
        assert!(parse_ats(&[]).is_err());
    }
}
