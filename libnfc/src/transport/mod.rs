// libnfc/src/transport/mod.rs

pub mod loopback;
pub mod mock;
pub mod traits;

pub use loopback::LoopbackTransport;
pub use mock::MockTransport;
pub use traits::{Transport, TransportOption};
