// fixtures.rs - provides commonly used test payloads/frames

use libnfc::types::{Nfcid3, Target, Uid};

pub fn single_uid() -> Uid {
    Uid::try_from(&[0x08, 0x6b, 0x1f, 0x5e][..]).unwrap()
}

pub fn double_uid() -> Uid {
    Uid::try_from(&[0x04, 0x32, 0x91, 0x6a, 0x2c, 0x58, 0x80][..]).unwrap()
}

pub fn triple_uid() -> Uid {
    Uid::try_from(&[0x04, 0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08, 0x09][..]).unwrap()
}

/// ATS without TL: T0 announces TA, TB and TC, one historical byte.
pub fn sample_ats() -> Vec<u8> {
    vec![0x75, 0x77, 0x81, 0x02, 0x80]
}

pub fn desfire_like(uid: Uid) -> Target {
    Target::Iso14443a {
        atqa: [0x03, 0x44],
        sak: 0x20,
        uid,
        ats: sample_ats(),
    }
}

/// 64-byte NTAG-like image; every byte holds its own address.
pub fn ntag_image() -> Vec<u8> {
    (0..64u8).collect()
}

pub fn nfcid3_target() -> Nfcid3 {
    Nfcid3::from([0xaa, 0xbb, 0xcc, 0xdd, 0xee, 0xff, 0x00, 0x11, 0x22, 0x33])
}

/// LLCP magic followed by a version TLV, as sent by NFC-enabled phones.
pub fn llcp_general_bytes() -> Vec<u8> {
    vec![0x46, 0x66, 0x6d, 0x01, 0x01, 0x11]
}
