//! Uniform color posterization.
//!
//! Quality 0-100 maps to a per-channel level count of 2-256:
//! `levels = max(2, floor(quality / 100 * 254) + 2)`. Each R, G, B sample
//! falls into bucket `k = floor(v / step)` with `step = 256 / levels`, and
//! is replaced by the smallest integer not below `k * step`. Alpha is
//! never touched.
//!
//! All arithmetic is integer so the result is byte-for-byte reproducible,
//! and because the reconstructed value always falls back into bucket `k`
//! quantizing twice at the same quality changes nothing.

#[cfg(not(target_arch = "wasm32"))]
use rayon::prelude::*;

use crate::schema::{BYTES_PER_PIXEL, LOSSLESS_QUALITY, PixelBuffer};

/// Number of levels kept per color channel for `quality`.
#[inline]
pub fn quantization_levels(quality: u8) -> u32 {
    let quality = quality.min(LOSSLESS_QUALITY) as u32;
    (quality * 254 / 100 + 2).max(2)
}

/// Width of one quantization bucket, `256 / levels`.
pub fn quantization_step(quality: u8) -> f64 {
    256.0 / quantization_levels(quality) as f64
}

/// Quantize a single sample to `levels` buckets.
#[inline]
pub fn quantize_sample(value: u8, levels: u32) -> u8 {
    let bucket = value as u32 * levels / 256;
    // ceil(bucket * 256 / levels); never exceeds 255 since bucket * 256 <= 255 * levels
    ((bucket * 256).div_ceil(levels)) as u8
}

/// Quantize a pixel buffer's color channels, returning a new buffer.
///
/// Quality >= 100 returns an unchanged copy.
pub fn quantize(buffer: &PixelBuffer, quality: u8) -> PixelBuffer {
    if quality >= LOSSLESS_QUALITY {
        return buffer.clone();
    }

    let levels = quantization_levels(quality);
    let lut: [u8; 256] = std::array::from_fn(|v| quantize_sample(v as u8, levels));

    let mut data = buffer.as_bytes().to_vec();
    for pixel in data.chunks_exact_mut(BYTES_PER_PIXEL) {
        pixel[0] = lut[pixel[0] as usize];
        pixel[1] = lut[pixel[1] as usize];
        pixel[2] = lut[pixel[2] as usize];
    }

    buffer.with_samples(data)
}

/// Quantize every frame, preserving input order.
///
/// Accepts anything that borrows a [`PixelBuffer`] (buffers or frames), so
/// the source pixels are read in place. Frames are processed in parallel on
/// native targets.
pub fn quantize_frames<B>(frames: &[B], quality: u8) -> Vec<PixelBuffer>
where
    B: AsRef<PixelBuffer> + Sync,
{
    #[cfg(not(target_arch = "wasm32"))]
    {
        frames
            .par_iter()
            .map(|f| quantize(f.as_ref(), quality))
            .collect()
    }

    #[cfg(target_arch = "wasm32")]
    {
        frames.iter().map(|f| quantize(f.as_ref(), quality)).collect()
    }
}
