#[path = "../common/mod.rs"]
mod common;

use common::fixtures;
use libnfc::Error;
use libnfc::protocol::crc::check_crc_a;
use libnfc::protocol::iso14443a::*;

#[test]
fn chunks_per_uid_size() {
    assert_eq!(cascade_uid_chunks(&fixtures::single_uid()).len(), 1);

    let chunks = cascade_uid_chunks(&fixtures::double_uid());
    assert_eq!(chunks.len(), 2);
    assert_eq!(chunks[0][..4], [0x88, 0x04, 0x32, 0x91]);
    assert_eq!(chunks[0][4], 0x88 ^ 0x04 ^ 0x32 ^ 0x91);
    assert_eq!(chunks[1][..4], [0x6a, 0x2c, 0x58, 0x80]);

    let chunks = cascade_uid_chunks(&fixtures::triple_uid());
    assert_eq!(chunks.len(), 3);
    assert_eq!(chunks[1][0], 0x88);
    assert_eq!(chunks[2][..4], [0x06, 0x07, 0x08, 0x09]);
}

#[test]
fn select_frames_carry_crc() {
    let chunk = cascade_uid_chunks(&fixtures::single_uid())[0];
    let frame = select(CascadeLevel::One, &chunk);
    assert_eq!(frame[..2], [0x93, 0x70]);
    assert!(check_crc_a(&frame));
    assert!(check_crc_a(&halt()));
    assert!(check_crc_a(&rats(0x50)));
    assert_eq!(anticollision(CascadeLevel::Three), [0x97, 0x20]);
}

#[test]
fn bcc_mismatch_is_a_value_not_an_error() {
    assert_eq!(check_bcc(&[0x01, 0x02, 0x03, 0x04, 0x04]), BccCheck::Valid);
    assert_eq!(
        check_bcc(&[0x01, 0x02, 0x03, 0x04, 0x05]),
        BccCheck::Mismatch {
            expected: 0x04,
            actual: 0x05
        }
    );
}

#[test]
fn sak_bits() {
    assert!(sak_cascade(0x04));
    assert!(!sak_cascade(0x20));
    assert!(sak_iso14443_4(0x20));
    assert_eq!(parse_sak(&[0x08]).unwrap(), 0x08);
    assert!(matches!(parse_sak(&[0x08, 0x00]), Err(Error::FramingError(_))));
}

#[test]
fn ats_without_tl_and_crc() {
    let mut frame = vec![0x06];
    frame.extend_from_slice(&fixtures::sample_ats());
    assert_eq!(parse_ats(&frame).unwrap(), fixtures::sample_ats());
    assert!(parse_ats(&[0x00]).is_err());
    assert!(parse_ats(&[0x06, 0x75]).is_err());
}

#[test]
fn buffer_builders_check_capacity() {
    let mut out = [0u8; 8];
    assert!(matches!(
        write_select(CascadeLevel::One, &[0; 5], &mut out),
        Err(Error::BufferTooSmall { needed: 9, .. })
    ));
    let mut out = [0u8; 4];
    assert_eq!(write_halt(&mut out).unwrap(), 4);
    assert_eq!(out, halt());
}
