//! APNG Forge - Animated PNG assembly from raster frames.
//!
//! This crate builds Animated PNG containers from decoded RGBA frames:
//! it posterizes colors to a quality setting, encodes the frames with
//! uniform timing, and rewrites the animation's loop count with a
//! recomputed chunk checksum.
//!
//! # Architecture
//!
//! The crate is split into three modules:
//!
//! - `schema`: Configuration and pixel buffer types
//! - `compute`: Pure kernels (color quantization, CRC-32)
//! - `animation`: Container format, codec seam, assembler and loop patcher
//!
//! # Example
//!
//! ```rust,no_run
//! use apng_forge::{
//!     animation::assemble,
//!     schema::{AnimationConfig, Frame, PixelBuffer},
//! };
//!
//! let frames: Vec<Frame> = [[255, 0, 0, 255], [0, 255, 0, 255], [0, 0, 255, 255]]
//!     .into_iter()
//!     .map(|rgba| Frame::new(PixelBuffer::solid(4, 4, rgba).unwrap(), 100))
//!     .collect();
//!
//! let config = AnimationConfig { fps: 10, loops: 2, quality: 100 };
//! let apng = assemble(&frames, &config).unwrap();
//!
//! std::fs::write("out.png", apng.as_bytes()).unwrap();
//! ```

pub mod animation;
pub mod compute;
pub mod schema;

// Re-export commonly used types
pub use animation::{AnimationAssembler, AnimationError, EncodedAnimation, ImageCodec, PngCodec};
pub use schema::{AnimationConfig, Frame, PixelBuffer};
