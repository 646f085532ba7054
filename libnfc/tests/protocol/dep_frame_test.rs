#[path = "../common/mod.rs"]
mod common;

use common::fixtures;
use libnfc::dep::frame::*;
use libnfc::types::{BaudRate, DepMode};
use libnfc::Error;

#[test]
fn atr_req_layout() {
    let gb = fixtures::llcp_general_bytes();
    let frame = AtrReq::new(fixtures::nfcid3_target(), gb.clone()).encode().unwrap();
    assert_eq!(frame[0] as usize, frame.len());
    assert_eq!(&frame[1..3], &[0xd4, ATR_REQ]);
    assert_eq!(&frame[3..13], fixtures::nfcid3_target().as_bytes());
    // DID, BS, BR, PP with the general bytes flag
    assert_eq!(&frame[13..17], &[0x00, ALL_BIT_RATES, ALL_BIT_RATES, PP_LR_254 | PP_GENERAL_BYTES]);
    assert_eq!(&frame[17..], &gb[..]);

    match InitiatorFrame::decode(&frame).unwrap() {
        InitiatorFrame::Atr(req) => assert_eq!(req.general_bytes, gb),
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn atr_res_into_target_info() {
    let frame = AtrRes::new(fixtures::nfcid3_target(), 0, Vec::new()).encode().unwrap();
    assert_eq!(&frame[1..3], &[0xd5, ATR_RES]);
    let info = AtrRes::decode(&frame)
        .unwrap()
        .into_info(DepMode::Active, BaudRate::Baud212);
    assert_eq!(info.nfcid3, fixtures::nfcid3_target());
    assert_eq!(info.to, DEFAULT_TO);
    assert_eq!(info.mode, DepMode::Active);
    assert!(info.general_bytes.is_empty());
}

#[test]
fn general_bytes_are_bounded() {
    let req = AtrReq::new(fixtures::nfcid3_target(), vec![0; 49]);
    assert!(matches!(req.encode(), Err(Error::BufferOverflow { .. })));
}

#[test]
fn pfb_encodings() {
    assert_eq!(Pfb::Information { more: true, pni: 2 }.to_byte(), 0x12);
    assert_eq!(Pfb::Ack { pni: 1 }.to_byte(), 0x41);
    assert_eq!(Pfb::Nack { pni: 0 }.to_byte(), 0x50);
    assert_eq!(Pfb::Attention.to_byte(), 0x80);
    assert_eq!(Pfb::TimeoutExtension.to_byte(), 0x90);
    assert!(Pfb::from_byte(0x20).is_err());
    assert_eq!(next_pni(3), 0);
}

#[test]
fn dep_req_with_did_and_nad() {
    // PFB 0x0c: DID and NAD present before the payload
    let frame = [0x07, 0xd4, 0x06, 0x0c, 0x01, 0x02, 0xaa];
    match InitiatorFrame::decode(&frame).unwrap() {
        InitiatorFrame::Dep(pdu) => {
            assert_eq!(pdu.pfb, Pfb::Information { more: false, pni: 0 });
            assert_eq!(pdu.payload, vec![0xaa]);
        }
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn release_and_select_frames() {
    assert_eq!(rls_req(0).unwrap(), vec![0x03, 0xd4, RLS_REQ]);
    assert_eq!(dsl_res(1).unwrap(), vec![0x04, 0xd5, DSL_RES, 0x01]);
    assert_eq!(InitiatorFrame::decode(&dsl_req(0).unwrap()).unwrap(), InitiatorFrame::Dsl);
    assert_eq!(
        InitiatorFrame::decode(&psl_req(0, BaudRate::Baud212, 3).unwrap()).unwrap(),
        InitiatorFrame::Psl {
            did: 0,
            baud: BaudRate::Baud212,
            fsl: 3
        }
    );
    assert!(expect_response(&psl_res(0).unwrap(), PSL_RES).is_ok());
    assert!(expect_response(&psl_res(0).unwrap(), RLS_RES).is_err());
    assert_eq!(length_reduction_bytes(0x00), 64);
}
