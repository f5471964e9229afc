//! Animated PNG assembly.
//!
//! This module turns a sequence of RGBA frames into an APNG byte stream:
//! frames are quantized, handed to an [`ImageCodec`] for filtering and
//! deflate, and the resulting container's loop count is patched in place
//! of the codec's default.
//!
//! # File Format
//!
//! ```text
//! Signature: 89 50 4E 47 0D 0A 1A 0A (8 bytes)
//!
//! Chunk (repeated):
//!   Length: u32 BE (data bytes only)
//!   Type: 4 ASCII bytes
//!   Data: Length bytes
//!   CRC: u32 BE over Type ++ Data
//!
//! Chunk order:
//!   IHDR                  width, height, 8-bit RGBA
//!   acTL                  frame_count: u32, num_plays: u32 (0 = infinite)
//!   fcTL, IDAT            first frame (sequence 0)
//!   { fcTL, fdAT }*       remaining frames, fdAT data prefixed by sequence
//!   IEND
//! ```

mod assembler;
mod codec;
mod error;
mod format;
mod inspect;
mod patcher;

pub use assembler::{
    AnimationAssembler, AnimationStats, EncodedAnimation, assemble, format_file_size,
};
pub use codec::{
    CodecError, ImageCodec, MAX_DECODED_BYTES, MAX_DIMENSION, PngCodec, decode_png,
    encode_frames,
};
pub use error::AnimationError;
pub use format::{
    ACTL, APNG_MEDIA_TYPE, AnimationControl, BlendOp, CHUNK_OVERHEAD, ChunkIter, ChunkRecord,
    ColorType, Delay, DisposeOp, FCTL, FDAT, FrameControl, IDAT, IEND, IHDR, ImageHeader,
    PNG_SIGNATURE, is_png, write_chunk,
};
pub use inspect::AnimationSummary;
pub use patcher::{patch_loop_count, read_animation_control};
