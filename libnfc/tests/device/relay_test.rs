#[path = "../common/mod.rs"]
mod common;

use common::fixtures;
use libnfc::config::DeviceConfig;
use libnfc::device::{Device, TargetMode};
use libnfc::relay::{ChannelLink, InitiatorHalf, Relay, TargetHalf};
use libnfc::types::{Target, Uid};
use libnfc::utils::Timeout;
use libnfc::{Error, Result};
use std::thread;

const WAIT: Timeout = Timeout::Millis(2000);
/// The card only stops when aborted.
const CARD_WAIT: Timeout = Timeout::Millis(10_000);

fn config() -> DeviceConfig {
    DeviceConfig::default().with_command_timeout(WAIT)
}

/// ISO14443-4 card answering each APDU with its sequence number and SW 90 00.
fn spawn_card(mut device: Device<TargetMode>, card: Target) -> thread::JoinHandle<Result<Vec<Vec<u8>>>> {
    thread::spawn(move || {
        let mut seen = Vec::new();
        let mut command = device.target_init(&card, CARD_WAIT)?;
        loop {
            let answer = vec![seen.len() as u8, 0x90, 0x00];
            seen.push(command);
            device.target_send_bytes(&answer, CARD_WAIT)?;
            command = match device.target_receive_bytes(CARD_WAIT) {
                Ok(c) => c,
                Err(Error::Aborted) => return Ok(seen),
                Err(e) => return Err(e),
            };
        }
    })
}

fn apdus() -> Vec<Vec<u8>> {
    (0..5u8).map(|i| vec![0x02, 0x00, 0xb0, 0x00, i, 0x10]).collect()
}

#[test]
fn relay_preserves_command_order() {
    common::init_logger();
    let (relay_reader, card_side) = common::loopback_devices(config()).unwrap();
    let (mut reader, relay_card) = common::loopback_devices(config()).unwrap();

    let card_abort = card_side.abort_handle();
    let card = spawn_card(card_side, fixtures::desfire_like(fixtures::double_uid()));

    let mut relay = Relay::new(relay_reader, relay_card);
    let stopper = relay.stopper();
    let relay = thread::spawn(move || relay.run());

    let seen = reader.activate_iso14443a(None).unwrap().unwrap().target;
    assert!(seen.is_iso14443_4());
    assert_eq!(seen.id_bytes(), fixtures::double_uid().as_bytes());

    for (i, apdu) in apdus().iter().enumerate() {
        assert_eq!(reader.transceive_bytes(apdu).unwrap(), vec![i as u8, 0x90, 0x00]);
    }

    stopper.stop();
    let stats = relay.join().unwrap().unwrap();
    assert_eq!(stats.exchanges, apdus().len());

    card_abort.abort();
    assert_eq!(card.join().unwrap().unwrap(), apdus());
}

#[test]
fn relay_presents_the_configured_uid() {
    let fake = [0x08, 0x12, 0x34, 0x56];
    let (relay_reader, card_side) = common::loopback_devices(config()).unwrap();
    let (mut reader, relay_card) =
        common::loopback_devices(config().with_relay_uid(fake.to_vec())).unwrap();

    let card_abort = card_side.abort_handle();
    let card = spawn_card(card_side, fixtures::desfire_like(fixtures::double_uid()));
    let mut relay = Relay::new(relay_reader, relay_card);
    let stopper = relay.stopper();
    let relay = thread::spawn(move || relay.run());

    let seen = reader.activate_iso14443a(None).unwrap().unwrap().target;
    assert_eq!(seen.id_bytes(), &fake);
    assert_eq!(reader.transceive_bytes(&apdus()[0]).unwrap(), vec![0, 0x90, 0x00]);

    stopper.stop();
    let stats = relay.join().unwrap().unwrap();
    assert_eq!(
        stats.target.unwrap().id_bytes(),
        fixtures::double_uid().as_bytes()
    );
    card_abort.abort();
    let _ = card.join();
}

#[test]
fn split_halves_over_a_channel() {
    common::init_logger();
    let (relay_reader, card_side) = common::loopback_devices(config()).unwrap();
    let (mut reader, relay_card) = common::loopback_devices(config()).unwrap();

    let card_abort = card_side.abort_handle();
    let card = spawn_card(card_side, fixtures::desfire_like(fixtures::single_uid()));

    let (near, far) = ChannelLink::pair();
    let target_abort = relay_card.abort_handle();
    let initiator_half = thread::spawn(move || InitiatorHalf::new(relay_reader, near).run());
    let target_half = thread::spawn(move || TargetHalf::new(relay_card, far).run());

    reader.activate_iso14443a(None).unwrap().unwrap();
    for (i, apdu) in apdus().iter().take(3).enumerate() {
        assert_eq!(reader.transceive_bytes(apdu).unwrap(), vec![i as u8, 0x90, 0x00]);
    }

    // stopping the emulating side shuts the link down for both halves
    target_abort.abort();
    assert_eq!(target_half.join().unwrap().unwrap(), 3);
    assert_eq!(initiator_half.join().unwrap().unwrap(), 3);

    card_abort.abort();
    assert_eq!(card.join().unwrap().unwrap().len(), 3);
}

#[test]
fn non_iso14443a_tags_are_refused() {
    let real = Target::Iso14443b2sr { uid: [0x11; 8] };
    assert!(matches!(
        libnfc::relay::emulated_target(&real, None::<Uid>),
        Err(Error::DeviceNotSupported(_))
    ));
}
