//! Compute module - Pure pixel and checksum kernels.

mod crc;
mod quantize;

pub use crc::*;
pub use quantize::*;
