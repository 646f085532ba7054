#[path = "../common/mod.rs"]
mod common;

use common::fixtures;
use libnfc::config::DeviceConfig;
use libnfc::emulation::type2::{TYPE2_NAK, Type2Tag};
use libnfc::emulation::{EmulationExit, EmulationState, Emulator, EmulatorIo, Exchange};
use libnfc::utils::Timeout;
use libnfc::Error;
use std::thread;

const WAIT: Timeout = Timeout::Millis(1000);

#[test]
fn reader_reads_and_writes_an_emulated_type2_tag() {
    common::init_logger();
    let (mut reader, mut tag_device) =
        common::loopback_devices(DeviceConfig::default().with_command_timeout(WAIT)).unwrap();

    let tag = thread::spawn(move || {
        let image = Type2Tag::new(fixtures::ntag_image()).unwrap();
        let mut emulator = Emulator::new(Type2Tag::target(fixtures::double_uid()), image);
        let first = emulator.init(&mut tag_device, WAIT)?;
        let exit = emulator.run(&mut tag_device, first, WAIT)?;
        assert_eq!(emulator.state(), EmulationState::Halted);
        Ok::<_, Error>((exit, emulator.commands(), emulator.into_io()))
    });

    let found = reader.activate_iso14443a(None).unwrap().unwrap().target;
    assert_eq!(found.id_bytes(), fixtures::double_uid().as_bytes());
    assert!(!found.is_iso14443_4());

    let page2 = reader.transceive_bytes(&[0x30, 0x02]).unwrap();
    assert_eq!(page2, fixtures::ntag_image()[8..24].to_vec());

    let ack = reader
        .transceive_bytes(&[0xa2, 0x04, 0xca, 0xfe, 0xba, 0xbe])
        .unwrap();
    assert_eq!(ack, vec![0x0a]);
    let page4 = reader.transceive_bytes(&[0x30, 0x04]).unwrap();
    assert_eq!(&page4[..4], &[0xca, 0xfe, 0xba, 0xbe]);

    // past the end of a 16-page image
    assert_eq!(reader.transceive_bytes(&[0x30, 0x20]).unwrap(), vec![TYPE2_NAK]);

    reader.deselect().unwrap();

    let (exit, commands, image) = tag.join().unwrap().unwrap();
    assert_eq!(exit, EmulationExit::Halted);
    assert_eq!(commands, 5);
    assert_eq!(&image.memory()[16..20], &[0xca, 0xfe, 0xba, 0xbe]);
}

/// Answers every command with its length, fails on 0xff.
struct Counter(Vec<usize>);

impl EmulatorIo for Counter {
    fn process(&mut self, command: &[u8]) -> Exchange {
        if command.first() == Some(&0xff) {
            return Exchange::Error(Error::CommandNotSupported("0xff".into()));
        }
        self.0.push(command.len());
        Exchange::Continue(vec![command.len() as u8])
    }
}

#[test]
fn handler_error_ends_the_session() {
    let mock = libnfc::transport::MockTransport::new();
    mock.push_target_frame(vec![0x01, 0x02]);
    mock.push_target_frame(vec![0xff]);
    let mut device = common::target_on(&mock, DeviceConfig::default()).unwrap();

    let mut counter = Counter(Vec::new());
    let mut emulator = Emulator::new(Type2Tag::target(fixtures::single_uid()), &mut counter);
    let first = emulator.init(&mut device, WAIT).unwrap();
    let err = emulator.run(&mut device, first, WAIT).unwrap_err();
    assert!(matches!(err, Error::CommandNotSupported(_)));
    assert_eq!(emulator.state(), EmulationState::Failed);
    drop(emulator);

    assert_eq!(counter.0, vec![2]);
    assert_eq!(mock.target_sent(), vec![vec![0x02]]);
}

#[test]
fn released_target_is_a_normal_exit() {
    let mock = libnfc::transport::MockTransport::new();
    mock.push_target_frame(vec![0x30, 0x00]);
    mock.push_target_error(Error::TargetReleased);
    let mut device = common::target_on(&mock, DeviceConfig::default()).unwrap();

    let image = Type2Tag::new(fixtures::ntag_image()).unwrap();
    let exit = libnfc::emulation::emulate(
        &mut device,
        Type2Tag::target(fixtures::single_uid()),
        image,
        WAIT,
    )
    .unwrap();
    assert_eq!(exit, EmulationExit::Released);
    assert_eq!(mock.target_sent()[0], fixtures::ntag_image()[..16].to_vec());
}
