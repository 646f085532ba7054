// libnfc/src/initiator/mod.rs

//! Initiator-side target handling: ISO14443-A activation plus the
//! per-technology helpers used once a target is selected.

pub mod activation;
pub mod felica;
pub mod jewel;
pub mod magic;
pub mod st25tb;

pub use activation::{Activation, ActivationState, ActivationWarning, Activator, CascadeState};
pub use felica::FelicaTag;
pub use jewel::JewelTag;
pub use magic::MagicCard;
pub use st25tb::St25tbTag;

use crate::Result;
use crate::transport::{Transport, TransportOption};

/// Run `f` with hardware CRC handling disabled, restoring it afterwards
/// whatever `f` returned.
pub(crate) fn without_hardware_crc<T>(
    transport: &mut dyn Transport,
    f: impl FnOnce(&mut dyn Transport) -> Result<T>,
) -> Result<T> {
    transport.configure(TransportOption::HandleCrc, false)?;
    let out = f(&mut *transport);
    let restored = transport.configure(TransportOption::HandleCrc, true);
    let out = out?;
    restored?;
    Ok(out)
}

/// Run `f` with hardware CRC and easy framing both disabled, so frames go
/// out exactly as built. Both are restored afterwards whatever `f` returned.
pub(crate) fn with_raw_framing<T>(
    transport: &mut dyn Transport,
    f: impl FnOnce(&mut dyn Transport) -> Result<T>,
) -> Result<T> {
    transport.configure(TransportOption::HandleCrc, false)?;
    transport.configure(TransportOption::EasyFraming, false)?;
    let out = f(&mut *transport);
    let restored = transport
        .configure(TransportOption::HandleCrc, true)
        .and_then(|_| transport.configure(TransportOption::EasyFraming, true));
    let out = out?;
    restored?;
    Ok(out)
}

/// `Ok(None)` when nobody answered.
pub(crate) fn silent_as_none<T>(r: Result<T>) -> Result<Option<T>> {
    match r {
        Ok(v) => Ok(Some(v)),
        Err(e) if e.is_timeout() => Ok(None),
        Err(e) => Err(e),
    }
}
