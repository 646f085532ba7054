// libnfc/src/protocol/crc.rs

use crate::constants::{CRC_A_PRESET, CRC_B_PRESET};
use crate::{Error, Result};

fn crc16(data: &[u8], preset: u16) -> u16 {
    data.iter().fold(preset, |crc, &byte| {
        let mut bt = byte ^ (crc & 0x00ff) as u8;
        bt ^= bt << 4;
        let bt = bt as u16;
        (crc >> 8) ^ (bt << 8) ^ (bt << 3) ^ (bt >> 4)
    })
}

/// Compute ISO/IEC 14443-A CRC_A (preset 0x6363), LSB first.
pub fn crc_a(data: &[u8]) -> [u8; 2] {
    crc16(data, CRC_A_PRESET).to_le_bytes()
}

/// Compute ISO/IEC 14443-B CRC_B (preset 0xFFFF, complemented), LSB first.
pub fn crc_b(data: &[u8]) -> [u8; 2] {
    (!crc16(data, CRC_B_PRESET)).to_le_bytes()
}

/// Append CRC_A to the end of `frame`.
pub fn append_crc_a(frame: &mut Vec<u8>) {
    let crc = crc_a(frame);
    frame.extend_from_slice(&crc);
}

/// Append CRC_B to the end of `frame`.
pub fn append_crc_b(frame: &mut Vec<u8>) {
    let crc = crc_b(frame);
    frame.extend_from_slice(&crc);
}

fn write_crc(buf: &mut [u8], len: usize, crc: fn(&[u8]) -> [u8; 2]) -> Result<usize> {
    let needed = len + 2;
    if buf.len() < needed {
        return Err(Error::BufferTooSmall {
            needed,
            available: buf.len(),
        });
    }
    let c = crc(&buf[..len]);
    buf[len..needed].copy_from_slice(&c);
    Ok(needed)
}

/// Compute CRC_A over `buf[..len]` and write it at `buf[len..len + 2]`.
/// Returns the new frame length.
pub fn write_crc_a(buf: &mut [u8], len: usize) -> Result<usize> {
    write_crc(buf, len, crc_a)
}

/// Compute CRC_B over `buf[..len]` and write it at `buf[len..len + 2]`.
pub fn write_crc_b(buf: &mut [u8], len: usize) -> Result<usize> {
    write_crc(buf, len, crc_b)
}

/// True when the last two bytes of `frame` are the CRC_A of the rest.
pub fn check_crc_a(frame: &[u8]) -> bool {
    frame.len() > 2 && crc_a(&frame[..frame.len() - 2]) == frame[frame.len() - 2..]
}

/// True when the last two bytes of `frame` are the CRC_B of the rest.
pub fn check_crc_b(frame: &[u8]) -> bool {
    frame.len() > 2 && crc_b(&frame[..frame.len() - 2]) == frame[frame.len() - 2..]
}

/// Verify the trailing CRC_A and return the frame body without it.
pub fn strip_crc_a(frame: &[u8]) -> Result<&[u8]> {
    strip_crc(frame, crc_a)
}

/// Verify the trailing CRC_B and return the frame body without it.
pub fn strip_crc_b(frame: &[u8]) -> Result<&[u8]> {
    strip_crc(frame, crc_b)
}

fn strip_crc(frame: &[u8], crc: fn(&[u8]) -> [u8; 2]) -> Result<&[u8]> {
    if frame.len() < 3 {
        return Err(Error::InvalidLength {
            expected: 3,
            actual: frame.len(),
        });
    }
    let (body, tail) = frame.split_at(frame.len() - 2);
    let expected = crc(body);
    if expected != tail {
        return Err(Error::CrcMismatch {
            expected,
            actual: [tail[0], tail[1]],
        });
    }
    Ok(body)
}

/// Locate the historical bytes (Tk) of an ATS given without its TL byte.
/// T0 is followed by TA, TB and TC when bits 0x10, 0x20 and 0x40 are set.
pub fn locate_historical_bytes(ats: &[u8]) -> Option<&[u8]> {
    let t0 = *ats.first()?;
    let offset = 1 + [0x10u8, 0x20, 0x40]
        .iter()
        .filter(|&&bit| t0 & bit != 0)
        .count();
    if ats.len() > offset {
        Some(&ats[offset..])
    } else {
        None
    }
}
