#[path = "../common/mod.rs"]
mod common;

use libnfc::config::DeviceConfig;
use libnfc::device::POLL_FOREVER;
use libnfc::types::Modulation;
use libnfc::utils::{AbortHandle, Timeout};
use libnfc::Error;
use serial_test::serial;
use std::thread;
use std::time::{Duration, Instant};

fn abort_later(handle: AbortHandle, after: Duration) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        thread::sleep(after);
        handle.abort();
    })
}

#[test]
#[serial]
fn forever_transceive_is_aborted() {
    common::init_logger();
    // target end never armed: the initiator waits for it
    let (mut initiator, _target) = common::loopback_devices(
        DeviceConfig::default().with_command_timeout(Timeout::Forever),
    )
    .unwrap();
    let aborter = abort_later(initiator.abort_handle(), Duration::from_millis(100));
    let started = Instant::now();
    let r = initiator.transceive_bytes(&[0x30, 0x00]);
    aborter.join().unwrap();
    assert!(matches!(r, Err(Error::Aborted)));
    assert!(started.elapsed() < Duration::from_secs(1));

    // the request was consumed; the device keeps working
    assert!(!initiator.abort_handle().is_aborted());
}

#[test]
#[serial]
fn forever_target_receive_is_aborted() {
    let (_initiator, mut target) =
        common::loopback_devices(DeviceConfig::default()).unwrap();
    let aborter = abort_later(target.abort_handle(), Duration::from_millis(50));
    let started = Instant::now();
    let r = target.target_init(
        &libnfc::dep::dep_target(
            common::fixtures::nfcid3_target(),
            Vec::new(),
            libnfc::types::DepMode::Passive,
        ),
        Timeout::Forever,
    );
    aborter.join().unwrap();
    assert!(r.unwrap_err().is_aborted());
    assert!(started.elapsed() < Duration::from_secs(1));
}

#[test]
#[serial]
fn endless_poll_is_aborted() {
    let (mut initiator, target) = common::loopback_devices(
        DeviceConfig::default().with_command_timeout(Timeout::Millis(50)),
    )
    .unwrap();
    let _idle = target.idle().unwrap();
    let aborter = abort_later(initiator.abort_handle(), Duration::from_millis(100));
    let started = Instant::now();
    let r = initiator.poll_targets(
        &[Modulation::ISO14443A_106],
        POLL_FOREVER,
        Duration::from_millis(20),
    );
    aborter.join().unwrap();
    assert!(matches!(r, Err(Error::Aborted)));
    assert!(started.elapsed() < Duration::from_secs(1));
}

#[test]
#[serial]
fn abort_before_the_call_fails_it_at_once() {
    let mock = libnfc::transport::MockTransport::new();
    mock.push_response(vec![0x90, 0x00]);
    let mut initiator = common::initiator_on(&mock, DeviceConfig::default()).unwrap();
    initiator.abort_handle().abort();
    assert!(matches!(initiator.transceive_bytes(&[0x00]), Err(Error::Aborted)));
    assert_eq!(initiator.transceive_bytes(&[0x00]).unwrap(), vec![0x90, 0x00]);
}
