// libnfc/src/protocol/mod.rs

pub mod crc;
pub mod felica;
pub mod iso14443a;
pub mod iso14443b;
pub mod jewel;
pub mod parser;

pub use crc::{
    append_crc_a, append_crc_b, check_crc_a, check_crc_b, crc_a, crc_b, locate_historical_bytes,
};
pub use iso14443a::{CascadeLevel, WakeupCommand};
pub use jewel::{JewelDump, JewelRequest, JewelResponse};
