//! Utilities for libnfc: small, reusable helpers used across the crate.
//!
//! Hex rendering for frame traces, timeout arithmetic, and the abort handle
//! used to cancel blocking calls from another thread.

pub mod abort;
pub mod hex;
pub mod timeout;

pub use abort::AbortHandle;
pub use hex::*;
pub use timeout::*;
