//! Image codec seam and the built-in PNG/APNG backend.
//!
//! The assembler only marshals pixels and timing; turning them into
//! filtered, deflated chunks is the job of an [`ImageCodec`]. [`PngCodec`]
//! is the default implementation on top of the `png` crate, and tests
//! inject their own.

use std::io::Cursor;

use log::debug;

use super::format::{Delay, is_png};
use crate::schema::{FrameError, PixelBuffer};

/// Largest width or height a PNG may declare.
pub const MAX_DIMENSION: u32 = 0x7FFF_FFFF;

/// Upper bound on the decoded size of one input image.
pub const MAX_DECODED_BYTES: usize = 256 * 1024 * 1024;

/// External image codec.
///
/// `encode` must return a complete signed PNG stream. For more than one
/// frame that stream carries an acTL chunk and one fcTL per frame with the
/// supplied delays.
pub trait ImageCodec: Send + Sync {
    /// Decode one still image into RGBA pixels.
    fn decode(&self, bytes: &[u8]) -> Result<PixelBuffer, CodecError>;

    /// Encode equally sized frames with per-frame delays in milliseconds.
    fn encode(
        &self,
        frames: &[PixelBuffer],
        width: u32,
        height: u32,
        delays_ms: &[u32],
    ) -> Result<Vec<u8>, CodecError>;
}

/// Errors raised by a codec or by the frame marshalling around it.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("No frames to encode")]
    EmptyInput,
    #[error("Got {delays} delays for {frames} frames")]
    DelayCountMismatch { frames: usize, delays: usize },
    #[error("Frame {index} is {actual:?}, expected {expected:?}")]
    FrameSize {
        index: usize,
        expected: (u32, u32),
        actual: (u32, u32),
    },
    #[error("Image dimensions must be non-zero, got {width}x{height}")]
    ZeroDimension { width: u32, height: u32 },
    #[error("Frame {index} holds {actual} bytes, expected {expected}")]
    BufferSize {
        index: usize,
        expected: usize,
        actual: usize,
    },
    #[error("Too many frames for one container: {0}")]
    TooManyFrames(usize),
    #[error("Unsupported image: {0}")]
    Unsupported(String),
    #[error("Corrupt image data: {0}")]
    Decode(String),
    #[error("Invalid decoded frame: {0}")]
    Frame(#[from] FrameError),
    #[error("PNG encoding failed: {0}")]
    Png(#[from] png::EncodingError),
}

/// Check preconditions and hand frames to `codec`.
///
/// All frames must be `width` x `height` and there must be exactly one
/// delay per frame.
pub fn encode_frames<C: ImageCodec + ?Sized>(
    codec: &C,
    frames: &[PixelBuffer],
    width: u32,
    height: u32,
    delays_ms: &[u32],
) -> Result<Vec<u8>, CodecError> {
    if frames.is_empty() {
        return Err(CodecError::EmptyInput);
    }
    if delays_ms.len() != frames.len() {
        return Err(CodecError::DelayCountMismatch {
            frames: frames.len(),
            delays: delays_ms.len(),
        });
    }
    if let Some((index, frame)) = frames
        .iter()
        .enumerate()
        .find(|(_, f)| f.dimensions() != (width, height))
    {
        return Err(CodecError::FrameSize {
            index,
            expected: (width, height),
            actual: frame.dimensions(),
        });
    }

    debug!("Encoding {} frames at {}x{}", frames.len(), width, height);
    let bytes = codec.encode(frames, width, height, delays_ms)?;
    debug!("Codec produced {} bytes", bytes.len());
    Ok(bytes)
}

/// PNG / APNG codec backed by the `png` crate.
///
/// Writes 8-bit RGBA with adaptive row filtering. A lone frame is written
/// as a still PNG unless [`PngCodec::animate_single_frame`] is set.
#[derive(Debug, Clone, Copy)]
pub struct PngCodec {
    compression: png::Compression,
    animate_single_frame: bool,
}

impl Default for PngCodec {
    fn default() -> Self {
        Self {
            compression: png::Compression::Default,
            animate_single_frame: false,
        }
    }
}

impl PngCodec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_compression(mut self, compression: png::Compression) -> Self {
        self.compression = compression;
        self
    }

    /// Emit acTL/fcTL even when there is only one frame.
    pub fn animate_single_frame(mut self, enabled: bool) -> Self {
        self.animate_single_frame = enabled;
        self
    }
}

impl ImageCodec for PngCodec {
    fn decode(&self, bytes: &[u8]) -> Result<PixelBuffer, CodecError> {
        decode_png(bytes)
    }

    fn encode(
        &self,
        frames: &[PixelBuffer],
        width: u32,
        height: u32,
        delays_ms: &[u32],
    ) -> Result<Vec<u8>, CodecError> {
        if frames.is_empty() {
            return Err(CodecError::EmptyInput);
        }
        if width == 0 || height == 0 {
            return Err(CodecError::ZeroDimension { width, height });
        }
        if delays_ms.len() != frames.len() {
            return Err(CodecError::DelayCountMismatch {
                frames: frames.len(),
                delays: delays_ms.len(),
            });
        }
        let expected = PixelBuffer::byte_len(width, height);
        for (index, frame) in frames.iter().enumerate() {
            if frame.as_bytes().len() != expected {
                return Err(CodecError::BufferSize {
                    index,
                    expected,
                    actual: frame.as_bytes().len(),
                });
            }
        }
        let frame_count =
            u32::try_from(frames.len()).map_err(|_| CodecError::TooManyFrames(frames.len()))?;
        let animated = frames.len() > 1 || self.animate_single_frame;

        let mut out = Vec::new();
        let mut encoder = png::Encoder::new(&mut out, width, height);
        encoder.set_color(png::ColorType::Rgba);
        encoder.set_depth(png::BitDepth::Eight);
        encoder.set_compression(self.compression);
        encoder.set_adaptive_filter(png::AdaptiveFilterType::Adaptive);
        if animated {
            // infinite until the loop count is patched
            encoder.set_animated(frame_count, 0)?;
        }

        let mut writer = encoder.write_header()?;
        let written = if animated { frames.len() } else { 1 };
        for (frame, &ms) in frames.iter().zip(delays_ms).take(written) {
            if animated {
                let delay = Delay::from_millis(ms);
                writer.set_frame_delay(delay.numerator, delay.denominator)?;
            }
            writer.write_image_data(frame.as_bytes())?;
        }
        writer.finish()?;

        Ok(out)
    }
}

fn decode_error(e: png::DecodingError) -> CodecError {
    CodecError::Decode(e.to_string())
}

/// Decode a PNG (or an APNG's default image) to RGBA.
///
/// Palette and low bit depth images are expanded and 16-bit samples are
/// reduced to 8 bits.
pub fn decode_png(bytes: &[u8]) -> Result<PixelBuffer, CodecError> {
    if !is_png(bytes) {
        return Err(CodecError::Unsupported("missing PNG signature".into()));
    }

    let limits = png::Limits {
        bytes: MAX_DECODED_BYTES,
    };
    let mut decoder = png::Decoder::new_with_limits(Cursor::new(bytes), limits);
    decoder.set_transformations(png::Transformations::EXPAND | png::Transformations::STRIP_16);
    let mut reader = decoder.read_info().map_err(decode_error)?;

    let (width, height) = reader.info().size();
    if width > MAX_DIMENSION || height > MAX_DIMENSION {
        return Err(CodecError::Decode(format!(
            "dimensions {width}x{height} exceed {MAX_DIMENSION}"
        )));
    }
    let rgba_len = (width as usize)
        .checked_mul(height as usize)
        .and_then(|n| n.checked_mul(4))
        .filter(|&n| n <= MAX_DECODED_BYTES)
        .ok_or_else(|| {
            CodecError::Decode(format!("{width}x{height} image exceeds the decode limit"))
        })?;

    let mut buf = vec![0; reader.output_buffer_size()];
    let info = reader.next_frame(&mut buf).map_err(decode_error)?;
    buf.truncate(info.buffer_size());

    let rgba = match info.color_type {
        png::ColorType::Rgba => buf,
        png::ColorType::Rgb => {
            let mut rgba = Vec::with_capacity(rgba_len);
            for px in buf.chunks_exact(3) {
                rgba.extend_from_slice(&[px[0], px[1], px[2], 255]);
            }
            rgba
        }
        png::ColorType::GrayscaleAlpha => {
            let mut rgba = Vec::with_capacity(rgba_len);
            for px in buf.chunks_exact(2) {
                rgba.extend_from_slice(&[px[0], px[0], px[0], px[1]]);
            }
            rgba
        }
        png::ColorType::Grayscale => {
            let mut rgba = Vec::with_capacity(rgba_len);
            for &v in &buf {
                rgba.extend_from_slice(&[v, v, v, 255]);
            }
            rgba
        }
        png::ColorType::Indexed => {
            return Err(CodecError::Unsupported("unexpanded palette image".into()));
        }
    };

    Ok(PixelBuffer::new(info.width, info.height, rgba)?)
}
