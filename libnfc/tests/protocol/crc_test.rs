#[path = "../common/mod.rs"]
mod common;

use libnfc::Error;
use libnfc::protocol::crc::*;
use proptest::prelude::*;

#[test]
fn well_known_frames() {
    // HLTA, REQB, READ 0
    assert_eq!(crc_a(&[0x50, 0x00]), [0x57, 0xcd]);
    assert_eq!(crc_b(&[0x05, 0x00, 0x00]), [0x71, 0xff]);
    assert_eq!(crc_a(&[0x30, 0x00]), [0x02, 0xa8]);
}

#[test]
fn append_then_strip() {
    let mut frame = vec![0xe0, 0x50];
    append_crc_a(&mut frame);
    assert_eq!(frame.len(), 4);
    assert!(check_crc_a(&frame));
    assert_eq!(strip_crc_a(&frame).unwrap(), &[0xe0, 0x50]);

    let mut frame = vec![0x06, 0x00];
    append_crc_b(&mut frame);
    assert!(check_crc_b(&frame));
    assert!(!check_crc_a(&frame));
}

#[test]
fn corrupted_crc_is_reported() {
    let mut frame = vec![0x30, 0x04];
    append_crc_a(&mut frame);
    frame[3] ^= 0x01;
    match strip_crc_a(&frame) {
        Err(Error::CrcMismatch { expected, actual }) => {
            assert_eq!(expected, crc_a(&[0x30, 0x04]));
            assert_ne!(expected, actual);
        }
        other => panic!("unexpected {:?}", other),
    }
    assert!(matches!(strip_crc_b(&[0x01, 0x02]), Err(Error::InvalidLength { .. })));
}

#[test]
fn in_place_crc_needs_room() {
    let mut buf = [0x50, 0x00, 0x00, 0x00];
    assert_eq!(write_crc_a(&mut buf, 2).unwrap(), 4);
    assert_eq!(buf, [0x50, 0x00, 0x57, 0xcd]);

    let mut short = [0x05, 0x00, 0x00, 0x00];
    assert!(matches!(
        write_crc_b(&mut short, 3),
        Err(Error::BufferTooSmall {
            needed: 5,
            available: 4
        })
    ));
}

#[test]
fn historical_bytes_follow_interface_bytes() {
    let ats = common::fixtures::sample_ats();
    assert_eq!(locate_historical_bytes(&ats), Some(&[0x80][..]));
    assert_eq!(locate_historical_bytes(&[0x05, 0xaa, 0xbb]), Some(&[0xaa, 0xbb][..]));
    assert_eq!(locate_historical_bytes(&[0x75, 0x77, 0x81, 0x02]), None);
    assert_eq!(locate_historical_bytes(&[]), None);
}

proptest! {
    #[test]
    fn appended_crc_always_checks(data in proptest::collection::vec(any::<u8>(), 1..64)) {
        let mut a = data.clone();
        append_crc_a(&mut a);
        prop_assert!(check_crc_a(&a));
        prop_assert_eq!(strip_crc_a(&a).unwrap(), &data[..]);

        let mut b = data.clone();
        append_crc_b(&mut b);
        prop_assert!(check_crc_b(&b));
    }
}
