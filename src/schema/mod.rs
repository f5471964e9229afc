//! Schema module - Configuration and frame types for APNG generation.

mod config;
mod frame;

pub use config::*;
pub use frame::*;
