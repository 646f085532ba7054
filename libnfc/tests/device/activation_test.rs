#[path = "../common/mod.rs"]
mod common;

use common::fixtures;
use libnfc::config::DeviceConfig;
use libnfc::initiator::Activator;
use libnfc::protocol::iso14443a::{CascadeLevel, WakeupCommand};
use libnfc::transport::{LoopbackTransport, Transport};
use libnfc::types::{Target, Uid};
use libnfc::utils::Timeout;
use std::thread;

const WAIT: Timeout = Timeout::Millis(1000);

fn tag(uid: Uid, sak: u8) -> Target {
    Target::Iso14443a {
        atqa: [0x44, 0x00],
        sak,
        uid,
        ats: Vec::new(),
    }
}

/// Arm the target end and keep it armed until the first forwarded frame
/// or the timeout.
fn arm(mut end: LoopbackTransport, target: Target) -> thread::JoinHandle<Option<Vec<u8>>> {
    thread::spawn(move || end.target_init(&target, WAIT).ok())
}

fn cascade_depth(uid: Uid) -> (Target, CascadeLevel, usize) {
    common::init_logger();
    let (mut initiator, tgt) = LoopbackTransport::pair();
    let armed = arm(tgt, tag(uid, 0x00));
    let config = DeviceConfig::default().with_command_timeout(WAIT);
    let mut activator = Activator::new(&mut initiator, &config);
    let activation = activator.activate(None).unwrap().unwrap();
    assert!(activation.warnings.is_empty());
    let level = activator.cascade().level;
    let raw = activator.cascade().raw_uid.len();
    drop(activator);
    initiator.idle().unwrap();
    drop(initiator);
    let _ = armed.join();
    (activation.target, level, raw)
}

#[test]
fn single_size_uid_stops_at_level_one() {
    let (target, level, raw) = cascade_depth(fixtures::single_uid());
    assert_eq!(level, CascadeLevel::One);
    assert_eq!(raw, 4);
    assert_eq!(target.id_bytes(), fixtures::single_uid().as_bytes());
}

#[test]
fn double_size_uid_needs_level_two() {
    let (target, level, raw) = cascade_depth(fixtures::double_uid());
    assert_eq!(level, CascadeLevel::Two);
    // cascade tag kept in the raw groups, dropped from the UID
    assert_eq!(raw, 8);
    assert_eq!(target.id_bytes(), fixtures::double_uid().as_bytes());
    assert!(matches!(target, Target::Iso14443a { sak: 0x00, .. }));
}

#[test]
fn triple_size_uid_needs_level_three() {
    let (target, level, _) = cascade_depth(fixtures::triple_uid());
    assert_eq!(level, CascadeLevel::Three);
    assert_eq!(target.id_bytes().len(), 10);
}

#[test]
fn iso14443_4_tag_gets_rats_and_deselect() {
    common::init_logger();
    let (initiator, target) = common::loopback_devices(
        DeviceConfig::default().with_command_timeout(WAIT),
    )
    .unwrap();
    let mut initiator = initiator;
    let tag = thread::spawn(move || {
        let mut target = target;
        let first = target.target_init(&fixtures::desfire_like(fixtures::double_uid()), WAIT)?;
        target.target_send_bytes(&first, WAIT)?;
        Ok::<_, libnfc::Error>(first)
    });

    let found = initiator.activate_iso14443a(None).unwrap().unwrap().target;
    assert!(found.is_iso14443_4());
    match &found {
        Target::Iso14443a { ats, sak, .. } => {
            assert_eq!(ats, &fixtures::sample_ats());
            assert_eq!(*sak, 0x20);
        }
        other => panic!("unexpected {:?}", other),
    }

    initiator.deselect().unwrap();
    assert!(initiator.selected_target().is_none());
    assert_eq!(tag.join().unwrap().unwrap(), vec![0xc2]);
}

#[test]
fn halted_tag_only_answers_wupa() {
    common::init_logger();
    let (initiator, target) = common::loopback_devices(
        DeviceConfig::default().with_command_timeout(Timeout::Millis(200)),
    )
    .unwrap();
    let mut initiator = initiator;
    let abort = target.abort_handle();
    let tag = thread::spawn(move || {
        let mut target = target;
        target.target_init(&tag(fixtures::single_uid(), 0x08), Timeout::Forever)
    });

    assert!(initiator.activate_iso14443a(None).unwrap().is_some());
    initiator.deselect().unwrap();
    assert!(initiator.activate_iso14443a(None).unwrap().is_none());

    initiator.config_mut().wakeup = WakeupCommand::Wupa;
    let again = initiator.activate_iso14443a(None).unwrap().unwrap();
    assert_eq!(again.target.id_bytes(), fixtures::single_uid().as_bytes());

    abort.abort();
    assert!(tag.join().unwrap().unwrap_err().is_aborted());
}

#[test]
fn known_uid_skips_anticollision() {
    let (initiator, target) = common::loopback_devices(
        DeviceConfig::default().with_command_timeout(WAIT),
    )
    .unwrap();
    let mut initiator = initiator;
    let abort = target.abort_handle();
    let tag = thread::spawn(move || {
        let mut target = target;
        target.target_init(&tag(fixtures::double_uid(), 0x00), Timeout::Forever)
    });

    let uid = fixtures::double_uid();
    let found = initiator.activate_iso14443a(Some(&uid)).unwrap().unwrap();
    assert_eq!(found.target.id_bytes(), uid.as_bytes());

    let wrong = fixtures::single_uid();
    assert!(initiator.activate_iso14443a(Some(&wrong)).is_err());

    abort.abort();
    let _ = tag.join();
}
