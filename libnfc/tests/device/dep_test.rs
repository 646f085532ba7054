#[path = "../common/mod.rs"]
mod common;

use common::fixtures;
use libnfc::config::DeviceConfig;
use libnfc::dep::{DepInitiator, DepTarget, dep_target};
use libnfc::device::DeviceBuilder;
use libnfc::transport::LoopbackTransport;
use libnfc::types::{BaudRate, DepMode, Target};
use libnfc::utils::Timeout;
use libnfc::{Error, Result};
use std::thread;

const WAIT: Timeout = Timeout::Millis(2000);

fn peers(config: DeviceConfig) -> (DepInitiator, DepTarget) {
    let (i, t) = LoopbackTransport::pair();
    let initiator = DeviceBuilder::new()
        .with_transport(Box::new(i))
        .with_config(config.clone())
        .build()
        .unwrap()
        .init_as_initiator()
        .unwrap();
    let target = DeviceBuilder::new()
        .with_transport(Box::new(t))
        .with_config(config)
        .build()
        .unwrap();
    (DepInitiator::new(initiator), DepTarget::new(target))
}

#[test]
fn llcp_style_session() {
    common::init_logger();
    let config = DeviceConfig::default()
        .with_command_timeout(WAIT)
        .with_dep_general_bytes(fixtures::llcp_general_bytes());
    let (mut initiator, mut target) = peers(config);

    let server = thread::spawn(move || -> Result<usize> {
        let local = dep_target(fixtures::nfcid3_target(), fixtures::llcp_general_bytes(), DepMode::Active);
        target.init(&local, WAIT)?;
        assert_eq!(target.initiator_general_bytes(), &fixtures::llcp_general_bytes()[..]);
        let mut served = 0;
        loop {
            match target.receive(WAIT) {
                Ok(cmd) => {
                    let mut answer = cmd;
                    answer.push(served as u8);
                    target.send(&answer, WAIT)?;
                    served += 1;
                }
                Err(Error::TargetReleased) => return Ok(served),
                Err(e) => return Err(e),
            }
        }
    });

    let link = initiator
        .select(DepMode::Active, BaudRate::Baud424, None, WAIT)
        .unwrap()
        .unwrap();
    match link {
        Target::Dep(info) => {
            assert_eq!(info.general_bytes, fixtures::llcp_general_bytes());
            assert_eq!(info.baud, BaudRate::Baud424);
            assert_eq!(info.mode, DepMode::Active);
        }
        other => panic!("unexpected {:?}", other),
    }

    // more exchanges than packet numbers
    for i in 0..6u8 {
        assert_eq!(initiator.transceive(&[0xa0, i]).unwrap(), vec![0xa0, i, i]);
    }
    initiator.attention().unwrap();
    assert_eq!(initiator.transceive(&[0xff]).unwrap(), vec![0xff, 6]);

    initiator.deselect().unwrap();
    assert!(!initiator.is_selected());
    assert_eq!(server.join().unwrap().unwrap(), 7);
}

#[test]
fn idle_target_keeps_polls_empty() {
    let (mut initiator, target) = peers(DeviceConfig::default().with_command_timeout(WAIT));
    let _idle = target.idle().unwrap();
    for baud in [BaudRate::Baud106, BaudRate::Baud212, BaudRate::Baud424] {
        assert!(initiator.poll(DepMode::Passive, baud, Timeout::Forever).unwrap().is_none());
    }
    assert!(initiator.target().is_none());
}

#[test]
fn target_rejects_a_non_dep_descriptor() {
    let (_initiator, mut target) = peers(DeviceConfig::default());
    let tag = Target::Iso14443b2sr { uid: [0; 8] };
    assert!(matches!(target.init(&tag, WAIT), Err(Error::InvalidParameter(_))));
}
