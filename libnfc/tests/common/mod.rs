// common/mod.rs - shared helpers for the integration test crates
#![allow(dead_code)]

pub mod fixtures;

pub use libnfc::test_support::*;

/// Route `log` output through the test harness; safe to call repeatedly.
pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}
