// libnfc/src/dep/mod.rs

//! NFCIP-1 Data Exchange Protocol, initiator and target side.

pub mod frame;
pub mod initiator;
pub mod target;

pub use initiator::DepInitiator;
pub use target::{DepTarget, dep_target};
