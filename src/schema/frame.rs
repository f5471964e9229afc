//! Pixel buffer and frame types.

/// Bytes per RGBA pixel.
pub const BYTES_PER_PIXEL: usize = 4;

/// A decoded 8-bit RGBA raster.
///
/// `data` always holds exactly `width * height * 4` interleaved samples.
/// The buffer is never mutated in place by the pipeline; quantization
/// produces a fresh buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl PixelBuffer {
    /// Wrap raw RGBA samples, checking the length invariant.
    pub fn new(width: u32, height: u32, data: Vec<u8>) -> Result<Self, FrameError> {
        if width == 0 || height == 0 {
            return Err(FrameError::ZeroDimension { width, height });
        }
        let expected = Self::byte_len(width, height);
        if data.len() != expected {
            return Err(FrameError::LengthMismatch {
                width,
                height,
                expected,
                actual: data.len(),
            });
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Buffer filled with a single RGBA color.
    pub fn solid(width: u32, height: u32, rgba: [u8; 4]) -> Result<Self, FrameError> {
        let pixels = width as usize * height as usize;
        let data = rgba.iter().copied().cycle().take(pixels * BYTES_PER_PIXEL).collect();
        Self::new(width, height, data)
    }

    /// Expected sample count for the given dimensions.
    pub fn byte_len(width: u32, height: u32) -> usize {
        width as usize * height as usize * BYTES_PER_PIXEL
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// (width, height) pair.
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Raw interleaved RGBA samples.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Iterate over pixels as `[r, g, b, a]` slices.
    pub fn pixels(&self) -> impl Iterator<Item = &[u8]> {
        self.data.chunks_exact(BYTES_PER_PIXEL)
    }

    /// Buffer of the same dimensions holding `data`.
    pub(crate) fn with_samples(&self, data: Vec<u8>) -> Self {
        debug_assert_eq!(data.len(), self.data.len());
        Self {
            width: self.width,
            height: self.height,
            data,
        }
    }

    /// Consume the buffer, returning its samples.
    pub fn into_raw(self) -> Vec<u8> {
        self.data
    }
}

impl AsRef<PixelBuffer> for PixelBuffer {
    fn as_ref(&self) -> &PixelBuffer {
        self
    }
}

/// One animation frame: pixels plus intended display duration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub buffer: PixelBuffer,
    /// Intended duration in milliseconds.
    pub delay_ms: u32,
}

impl Frame {
    pub fn new(buffer: PixelBuffer, delay_ms: u32) -> Self {
        Self { buffer, delay_ms }
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.buffer.dimensions()
    }
}

impl AsRef<PixelBuffer> for Frame {
    fn as_ref(&self) -> &PixelBuffer {
        &self.buffer
    }
}

/// Pixel buffer construction errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FrameError {
    #[error("Frame dimensions must be non-zero, got {width}x{height}")]
    ZeroDimension { width: u32, height: u32 },
    #[error("Frame of {width}x{height} needs {expected} bytes of RGBA data, got {actual}")]
    LengthMismatch {
        width: u32,
        height: u32,
        expected: usize,
        actual: usize,
    },
}
