// Type 2 tag emulation over the in-process loopback link

// One thread emulates an NTAG-like tag, the main thread plays the reader:
// it activates the tag, dumps its memory four pages at a time and halts it.

use libnfc::emulation::Type2Tag;
use libnfc::prelude::*;
use std::thread;

fn main() -> Result<()> {
    env_logger::init();

    let (i, t) = LoopbackTransport::pair();
    let config = DeviceConfig::default().with_command_timeout(Timeout::Millis(1000));
    let mut reader = Device::new(Box::new(i), config.clone())?.init_as_initiator()?;
    let mut tag = Device::new(Box::new(t), config)?.into_target();

    let uid = Uid::try_from(&[0x04, 0x5a, 0x17, 0x22, 0x6b, 0x3c, 0x80][..])?;
    let mut memory = vec![0u8; 64];
    memory[16..24].copy_from_slice(b"libnfc!\0");
    let image = Type2Tag::new(memory)?;

    let emulator = thread::spawn(move || {
        emulate(&mut tag, Type2Tag::target(uid), image, Timeout::Millis(5000))
    });

    let Some(activation) = reader.activate_iso14443a(None)? else {
        println!("No tag answered");
        return Ok(());
    };
    println!("Found {}", activation.target);

    for page in (0..16u8).step_by(4) {
        let data = reader.transceive_bytes(&[0x30, page])?;
        println!("  page {:02}: {}", page, bytes_to_hex_spaced(&data));
    }
    reader.deselect()?;

    match emulator.join() {
        Ok(exit) => println!("Emulation ended: {:?}", exit?),
        Err(_) => println!("Emulation thread panicked"),
    }
    Ok(())
}
