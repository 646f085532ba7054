#[path = "../common/mod.rs"]
mod common;

use libnfc::config::DeviceConfig;
use libnfc::device::POLL_FOREVER;
use libnfc::protocol::felica;
use libnfc::types::{BaudRate, Idm, Modulation, Pmm, SystemCode, Target};
use libnfc::utils::Timeout;
use libnfc::Error;
use std::thread;
use std::time::{Duration, Instant};

const IDM: [u8; 8] = [0x01, 0x27, 0x00, 0x5d, 0x4a, 0x1b, 0x3c, 0x08];
const PMM: [u8; 8] = [0x00, 0xf1, 0x00, 0x00, 0x00, 0x01, 0x43, 0x00];

#[test]
fn idle_target_is_never_found() {
    common::init_logger();
    let (mut initiator, target) = common::loopback_devices(
        DeviceConfig::default().with_command_timeout(Timeout::Millis(5000)),
    )
    .unwrap();
    let _idle = target.idle().unwrap();

    let started = Instant::now();
    let found = initiator
        .poll_targets(
            &[Modulation::ISO14443A_106, Modulation::FELICA_212],
            2,
            Duration::from_millis(10),
        )
        .unwrap();
    assert!(found.is_none());
    assert!(started.elapsed() < Duration::from_secs(1));
}

#[test]
fn poll_arguments_are_checked() {
    let mock = libnfc::transport::MockTransport::new();
    let mut initiator = common::initiator_on(&mock, DeviceConfig::default()).unwrap();
    assert!(matches!(
        initiator.poll_targets(&[], 1, Duration::ZERO),
        Err(Error::InvalidParameter(_))
    ));
    assert!(matches!(
        initiator.poll_targets(&[Modulation::ISO14443A_106], 0, Duration::ZERO),
        Err(Error::InvalidParameter(_))
    ));
    assert!(mock.sent_frames().is_empty());
}

#[test]
fn felica_card_answers_polling() {
    common::init_logger();
    let (mut initiator, mut target) = common::loopback_devices(
        DeviceConfig::default().with_command_timeout(Timeout::Millis(1000)),
    )
    .unwrap();
    let card = Target::Felica {
        idm: Idm::from_bytes(IDM),
        pmm: Pmm::from_bytes(PMM),
        system_code: SystemCode::NDEF,
        baud: BaudRate::Baud212,
    };
    let tag = thread::spawn(move || {
        let request = target.target_init(&card, Timeout::Millis(1000))?;
        let mut answer = vec![0x00, 0x01];
        answer.extend_from_slice(&IDM);
        answer.extend_from_slice(&PMM);
        answer.extend_from_slice(&[0x12, 0xfc]);
        answer[0] = answer.len() as u8;
        target.target_send_bytes(&answer, Timeout::Millis(1000))?;
        Ok::<_, Error>(request)
    });

    let found = initiator
        .poll_targets(&[Modulation::FELICA_212], POLL_FOREVER, Duration::from_millis(10))
        .unwrap()
        .unwrap();
    match found {
        Target::Felica {
            idm, system_code, ..
        } => {
            assert_eq!(idm, Idm::from_bytes(IDM));
            assert_eq!(system_code, SystemCode::NDEF);
        }
        other => panic!("unexpected {:?}", other),
    }
    let request = tag.join().unwrap().unwrap();
    assert_eq!(request, felica::polling(SystemCode::ANY, 0x01, 0x00).to_vec());
}

#[test]
fn iso14443b_card_is_selected_from_its_atqb() {
    let mock = libnfc::transport::MockTransport::new();
    let mut atqb = vec![0x50, 0xde, 0xad, 0xbe, 0xef];
    atqb.extend_from_slice(&[0x00, 0x00, 0x00, 0x00, 0x00, 0x71, 0x85]);
    mock.push_response(atqb);
    let mut initiator = common::initiator_on(&mock, DeviceConfig::default()).unwrap();

    let found = initiator
        .select_passive_target(Modulation::ISO14443B_106, None)
        .unwrap()
        .unwrap();
    assert_eq!(found.id_bytes(), &[0xde, 0xad, 0xbe, 0xef]);
    assert_eq!(mock.sent()[0], vec![0x05, 0x00, 0x00]);
    assert!(initiator.selected_target().is_some());
}

#[test]
fn list_stops_when_no_awake_tag_is_left() {
    let (mut initiator, mut target) = common::loopback_devices(
        DeviceConfig::default().with_command_timeout(Timeout::Millis(300)),
    )
    .unwrap();
    let abort = target.abort_handle();
    let tag = thread::spawn(move || {
        let uid = libnfc::types::Uid::try_from(&[0x08, 0x01, 0x02, 0x03][..]).unwrap();
        target.target_init(
            &Target::Iso14443a {
                atqa: [0x04, 0x00],
                sak: 0x08,
                uid,
                ats: Vec::new(),
            },
            Timeout::Forever,
        )
    });
    let found = initiator
        .list_passive_targets(Modulation::ISO14443A_106, 4)
        .unwrap();
    assert_eq!(found.len(), 1);
    abort.abort();
    let _ = tag.join();
}
