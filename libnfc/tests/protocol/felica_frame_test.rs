#[path = "../common/mod.rs"]
mod common;

use libnfc::Error;
use libnfc::protocol::felica::*;
use libnfc::types::{AccessMode, BlockData, BlockElement, Idm, ServiceCode, SystemCode};

const IDM: [u8; 8] = [0x01, 0x01, 0x06, 0x01, 0xcb, 0x09, 0x57, 0x03];
const PMM: [u8; 8] = [0x03, 0x32, 0x42, 0x82, 0x82, 0x47, 0xaa, 0xff];

fn polling_answer(with_system_code: bool) -> Vec<u8> {
    let mut frame = vec![0x00, 0x01];
    frame.extend_from_slice(&IDM);
    frame.extend_from_slice(&PMM);
    if with_system_code {
        frame.extend_from_slice(&[0x12, 0xfc]);
    }
    frame[0] = frame.len() as u8;
    frame
}

#[test]
fn polling_round_trip() {
    assert_eq!(polling(SystemCode::ANY, 0x01, 0x00), [6, 0x00, 0xff, 0xff, 0x01, 0x00]);

    let res = decode_polling(&polling_answer(true)).unwrap();
    assert_eq!(res.idm, Idm::from_bytes(IDM));
    assert_eq!(res.pmm.as_bytes(), &PMM);
    assert_eq!(res.system_code, Some(SystemCode::NDEF));

    let res = decode_polling(&polling_answer(false)).unwrap();
    assert_eq!(res.system_code, None);
}

#[test]
fn polling_length_byte_must_match() {
    let mut frame = polling_answer(false);
    frame[0] += 1;
    assert!(matches!(decode_polling(&frame), Err(Error::InvalidLength { .. })));
}

#[test]
fn check_lists_services_and_blocks() {
    let idm = Idm::from_bytes(IDM);
    let frame = check(
        idm,
        &[ServiceCode::new(0x000b)],
        &[
            BlockElement::new(0, AccessMode::Normal, 0),
            BlockElement::new(0, AccessMode::Normal, 0x0123),
        ],
    )
    .unwrap();
    assert_eq!(frame[0] as usize, frame.len());
    assert_eq!(frame[1], 0x06);
    assert_eq!(&frame[2..10], &IDM);
    assert_eq!(&frame[10..], &[0x01, 0x0b, 0x00, 0x02, 0x80, 0x00, 0x00, 0x23, 0x01]);
}

#[test]
fn check_rejects_dangling_service_index() {
    let err = check(
        Idm::from_bytes(IDM),
        &[ServiceCode::new(0x000b)],
        &[BlockElement::new(1, AccessMode::Normal, 0)],
    );
    assert!(matches!(err, Err(Error::InvalidParameter(_))));
}

#[test]
fn check_answer_status_flags() {
    let idm = Idm::from_bytes(IDM);
    let mut ok = vec![0x00, 0x07];
    ok.extend_from_slice(&IDM);
    ok.extend_from_slice(&[0x00, 0x00, 0x01]);
    ok.extend_from_slice(&[0x5a; 16]);
    ok[0] = ok.len() as u8;
    assert_eq!(decode_check(&ok, &idm).unwrap(), vec![BlockData::from_bytes([0x5a; 16])]);

    let mut failed = vec![0x0c, 0x09];
    failed.extend_from_slice(&IDM);
    failed.extend_from_slice(&[0x01, 0xa6]);
    assert!(matches!(
        decode_update(&failed, &idm),
        Err(Error::FelicaStatus {
            status1: 0x01,
            status2: 0xa6
        })
    ));
}
