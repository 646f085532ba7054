// libnfc/src/lib.rs

//! libnfc
//!
//! Pure Rust NFC protocol core for PN53x-family readers: CRC and frame
//! codecs, ISO14443-A activation, target emulation, NFCIP-1 DEP and a
//! tag relay, all driven through a pluggable [`transport::Transport`].

pub mod config;
pub mod constants;
pub mod dep;
pub mod device;
pub mod emulation;
pub mod error;
pub mod initiator;
pub mod prelude;
pub mod protocol;
pub mod relay;
pub mod test_support;
pub mod transceiver;
pub mod transport;
pub mod types;
pub mod utils;

// Re-export common types at crate root so `crate::Error`, `crate::Result`,
// and the newtypes in `types` are available for consumers and for
// convenient `prelude` re-exports.
pub use crate::error::*;
pub use crate::types::*;
