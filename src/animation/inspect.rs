//! Read-back of container metadata without decoding pixels.

use super::error::AnimationError;
use super::format::{
    ACTL, AnimationControl, ChunkIter, FCTL, FrameControl, IEND, IHDR, ImageHeader, is_png,
};

/// Metadata found by walking a PNG/APNG container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnimationSummary {
    pub header: ImageHeader,
    /// `None` for a still PNG.
    pub control: Option<AnimationControl>,
    /// fcTL records in stream order.
    pub frames: Vec<FrameControl>,
    /// Number of chunks walked, IEND included.
    pub chunk_count: usize,
}

impl AnimationSummary {
    /// Walk `bytes`, checking every chunk CRC on the way.
    pub fn parse(bytes: &[u8]) -> Result<Self, AnimationError> {
        if !is_png(bytes) {
            return Err(AnimationError::MalformedContainer(
                "missing PNG signature".into(),
            ));
        }

        let malformed = |what: &str, e: std::io::Error| {
            AnimationError::MalformedContainer(format!("{what} payload: {e}"))
        };

        let mut header = None;
        let mut control = None;
        let mut frames = Vec::new();
        let mut chunk_count = 0;
        let mut saw_end = false;
        let mut chunks = ChunkIter::new(bytes);

        for chunk in chunks.by_ref() {
            chunk_count += 1;
            if !chunk.crc_matches() {
                return Err(AnimationError::MalformedContainer(format!(
                    "CRC mismatch in {} chunk at offset {}",
                    chunk.type_name(),
                    chunk.offset
                )));
            }

            if chunk.is(IHDR) {
                header = Some(
                    ImageHeader::read_from(&mut &chunk.data[..])
                        .map_err(|e| malformed("IHDR", e))?,
                );
            } else if chunk.is(ACTL) {
                control = Some(
                    AnimationControl::read_from(&mut &chunk.data[..])
                        .map_err(|e| malformed("acTL", e))?,
                );
            } else if chunk.is(FCTL) {
                frames.push(
                    FrameControl::read_from(&mut &chunk.data[..])
                        .map_err(|e| malformed("fcTL", e))?,
                );
            } else if chunk.is(IEND) {
                saw_end = true;
                break;
            }
        }

        let header = header
            .ok_or_else(|| AnimationError::MalformedContainer("missing IHDR chunk".into()))?;
        if !saw_end {
            return Err(AnimationError::MalformedContainer(format!(
                "no IEND chunk (walk stopped at offset {} of {})",
                chunks.offset(),
                bytes.len()
            )));
        }

        Ok(Self {
            header,
            control,
            frames,
            chunk_count,
        })
    }

    pub fn is_animated(&self) -> bool {
        self.control.is_some()
    }

    /// acTL play count, `None` for a still image.
    pub fn num_plays(&self) -> Option<u32> {
        self.control.map(|c| c.num_plays)
    }

    /// Frame delays in milliseconds, in playback order.
    pub fn delays_ms(&self) -> Vec<f64> {
        self.frames.iter().map(|f| f.delay.as_millis()).collect()
    }

    /// Sum of all frame delays.
    pub fn duration_ms(&self) -> f64 {
        self.delays_ms().iter().sum()
    }
}
