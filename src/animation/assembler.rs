//! Frame sequence to finished APNG bytes.

use log::{debug, warn};

use super::codec::{ImageCodec, PngCodec, encode_frames};
use super::error::AnimationError;
use super::format::APNG_MEDIA_TYPE;
use super::patcher::patch_loop_count;
use crate::compute::quantize_frames;
use crate::schema::{AnimationConfig, Frame, PixelBuffer};

/// A finished, loop-patched APNG.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedAnimation {
    bytes: Vec<u8>,
    width: u32,
    height: u32,
    frame_count: usize,
    delay_ms: u32,
    duration_ms: u64,
    loops: u32,
}

impl EncodedAnimation {
    pub const MEDIA_TYPE: &'static str = APNG_MEDIA_TYPE;

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn media_type(&self) -> &'static str {
        Self::MEDIA_TYPE
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn frame_count(&self) -> usize {
        self.frame_count
    }

    /// Delay shared by every frame.
    pub fn delay_ms(&self) -> u32 {
        self.delay_ms
    }

    /// Length of one pass.
    pub fn duration_ms(&self) -> u64 {
        self.duration_ms
    }

    pub fn loops(&self) -> u32 {
        self.loops
    }

    /// Summary for display.
    pub fn stats(&self) -> AnimationStats {
        AnimationStats {
            frame_count: self.frame_count,
            total_bytes: self.bytes.len(),
            duration_ms: self.duration_ms,
            loops: self.loops,
        }
    }
}

/// Statistics from one generation.
#[derive(Debug, Clone)]
pub struct AnimationStats {
    /// Frames in the animation.
    pub frame_count: usize,
    /// Size of the container in bytes.
    pub total_bytes: usize,
    /// Length of one pass.
    pub duration_ms: u64,
    /// Play count, 0 for infinite.
    pub loops: u32,
}

impl std::fmt::Display for AnimationStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let loops = if self.loops == 0 {
            "loops forever".to_string()
        } else {
            format!("plays {} time(s)", self.loops)
        };
        write!(
            f,
            "{} frames, {}, {:.1}s per pass, {}",
            self.frame_count,
            format_file_size(self.total_bytes),
            self.duration_ms as f64 / 1000.0,
            loops
        )
    }
}

/// Human-readable byte count (Bytes, KB, MB, GB).
pub fn format_file_size(bytes: usize) -> String {
    if bytes == 0 {
        return "0 Bytes".to_string();
    }
    const UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{} {}", bytes, UNITS[0])
    } else {
        // two decimals with trailing zeros trimmed
        let text = format!("{:.2}", value);
        let text = text.trim_end_matches('0').trim_end_matches('.');
        format!("{} {}", text, UNITS[unit])
    }
}

/// Drives quantization, encoding and loop patching.
///
/// Usage:
/// ```ignore
/// let assembler = AnimationAssembler::new(PngCodec::new());
/// let apng = assembler.assemble(&frames, &AnimationConfig::default())?;
/// std::fs::write("out.png", apng.as_bytes())?;
/// ```
#[derive(Debug, Clone, Default)]
pub struct AnimationAssembler<C = PngCodec> {
    codec: C,
}

impl<C: ImageCodec> AnimationAssembler<C> {
    pub fn new(codec: C) -> Self {
        Self { codec }
    }

    pub fn codec(&self) -> &C {
        &self.codec
    }

    /// Build an APNG from decoded frames.
    ///
    /// Every frame is shown for `config.frame_delay_ms()`; the frames' own
    /// `delay_ms` values are ignored.
    pub fn assemble(
        &self,
        frames: &[Frame],
        config: &AnimationConfig,
    ) -> Result<EncodedAnimation, AnimationError> {
        let Some(first) = frames.first() else {
            return Err(AnimationError::NoFrames);
        };
        config.validate()?;

        let (width, height) = first.dimensions();
        if let Some((index, frame)) = frames
            .iter()
            .enumerate()
            .find(|(_, f)| f.dimensions() != (width, height))
        {
            return Err(AnimationError::DimensionMismatch {
                index,
                expected: (width, height),
                actual: frame.dimensions(),
            });
        }

        let delay_ms = config.frame_delay_ms();
        if frames.iter().any(|f| f.delay_ms != 0 && f.delay_ms != delay_ms) {
            warn!(
                "Per-frame delays are ignored; every frame uses {} ms ({} fps)",
                delay_ms, config.fps
            );
        }

        let buffers: Vec<PixelBuffer> = if config.is_lossless() {
            frames.iter().map(|f| f.buffer.clone()).collect()
        } else {
            debug!(
                "Quantizing {} frames at quality {}",
                frames.len(),
                config.quality
            );
            quantize_frames(frames, config.quality)
        };
        self.encode_and_patch(&buffers, width, height, config, delay_ms)
    }

    /// Decode encoded still images with the codec, then assemble them in order.
    pub fn assemble_images<B: AsRef<[u8]>>(
        &self,
        images: &[B],
        config: &AnimationConfig,
    ) -> Result<EncodedAnimation, AnimationError> {
        if images.is_empty() {
            return Err(AnimationError::NoFrames);
        }
        config.validate()?;

        let delay_ms = config.frame_delay_ms();
        let mut frames = Vec::with_capacity(images.len());
        for (index, image) in images.iter().enumerate() {
            let buffer = self.codec.decode(image.as_ref()).map_err(|e| {
                warn!("Failed to decode frame {}: {}", index, e);
                AnimationError::from(e)
            })?;
            frames.push(Frame::new(buffer, delay_ms));
        }
        self.assemble(&frames, config)
    }

    fn encode_and_patch(
        &self,
        buffers: &[PixelBuffer],
        width: u32,
        height: u32,
        config: &AnimationConfig,
        delay_ms: u32,
    ) -> Result<EncodedAnimation, AnimationError> {
        let frame_count = buffers.len();
        let delays = vec![delay_ms; frame_count];
        let raw = encode_frames(&self.codec, buffers, width, height, &delays)?;
        let bytes = patch_loop_count(&raw, config.loops)?;

        debug!(
            "Assembled {}x{} APNG: {} frames, {} bytes",
            width,
            height,
            frame_count,
            bytes.len()
        );

        Ok(EncodedAnimation {
            bytes,
            width,
            height,
            frame_count,
            delay_ms,
            duration_ms: config.total_duration_ms(frame_count),
            loops: config.loops,
        })
    }
}

/// Assemble with the built-in [`PngCodec`].
pub fn assemble(
    frames: &[Frame],
    config: &AnimationConfig,
) -> Result<EncodedAnimation, AnimationError> {
    AnimationAssembler::new(PngCodec::default()).assemble(frames, config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::codec::CodecError;
    use crate::animation::format::{
        ACTL, AnimationControl, ChunkIter, FCTL, FrameControl, PNG_SIGNATURE,
    };
    use crate::compute::quantization_step;
    use std::sync::Mutex;

    const RED: [u8; 4] = [255, 0, 0, 255];
    const GREEN: [u8; 4] = [0, 255, 0, 255];
    const BLUE: [u8; 4] = [0, 0, 255, 255];

    fn rgb_frames() -> Vec<Frame> {
        [RED, GREEN, BLUE]
            .into_iter()
            .map(|c| Frame::new(PixelBuffer::solid(4, 4, c).unwrap(), 100))
            .collect()
    }

    /// Records what reaches the codec, then delegates to PngCodec.
    #[derive(Default)]
    struct RecordingCodec {
        seen: Mutex<Vec<(Vec<PixelBuffer>, Vec<u32>)>>,
    }

    impl ImageCodec for RecordingCodec {
        fn decode(&self, bytes: &[u8]) -> Result<PixelBuffer, CodecError> {
            PngCodec::new().decode(bytes)
        }

        fn encode(
            &self,
            frames: &[PixelBuffer],
            width: u32,
            height: u32,
            delays_ms: &[u32],
        ) -> Result<Vec<u8>, CodecError> {
            self.seen
                .lock()
                .unwrap()
                .push((frames.to_vec(), delays_ms.to_vec()));
            PngCodec::new().encode(frames, width, height, delays_ms)
        }
    }

    /// Rejects everything.
    struct FailingCodec;

    impl ImageCodec for FailingCodec {
        fn decode(&self, _bytes: &[u8]) -> Result<PixelBuffer, CodecError> {
            Err(CodecError::Unsupported("nothing".into()))
        }

        fn encode(
            &self,
            _frames: &[PixelBuffer],
            _width: u32,
            _height: u32,
            _delays_ms: &[u32],
        ) -> Result<Vec<u8>, CodecError> {
            Err(CodecError::Unsupported("backend offline".into()))
        }
    }

    #[test]
    fn test_end_to_end_three_solid_frames() {
        let config = AnimationConfig {
            fps: 10,
            loops: 2,
            quality: 100,
        };
        let apng = assemble(&rgb_frames(), &config).unwrap();
        let bytes = apng.as_bytes();

        assert_eq!(&bytes[..8], &PNG_SIGNATURE);
        assert_eq!(apng.media_type(), "image/apng");

        let actl = ChunkIter::new(bytes).find(|c| c.is(ACTL)).unwrap();
        let control = AnimationControl::read_from(&mut &actl.data[..]).unwrap();
        assert_eq!(control.frame_count, 3);
        assert_eq!(control.num_plays, 2);

        let fctls: Vec<FrameControl> = ChunkIter::new(bytes)
            .filter(|c| c.is(FCTL))
            .map(|c| FrameControl::read_from(&mut &c.data[..]).unwrap())
            .collect();
        assert_eq!(fctls.len(), 3);
        for fctl in fctls {
            assert_eq!(fctl.delay.as_millis(), 100.0);
            assert_eq!((fctl.width, fctl.height), (4, 4));
        }
        assert!(ChunkIter::new(bytes).all(|c| c.crc_matches()));
    }

    #[test]
    fn test_half_quality_reaches_codec_quantized() {
        let codec = RecordingCodec::default();
        let assembler = AnimationAssembler::new(codec);
        let mut frames = rgb_frames();
        // add mid-range values so quantization visibly changes something
        frames.push(Frame::new(PixelBuffer::solid(4, 4, [100, 37, 201, 90]).unwrap(), 100));
        let config = AnimationConfig {
            fps: 10,
            loops: 0,
            quality: 50,
        };
        assembler.assemble(&frames, &config).unwrap();

        let seen = assembler.codec().seen.lock().unwrap();
        let (buffers, delays) = &seen[0];
        assert_eq!(delays, &vec![100; 4]);

        let step = quantization_step(50);
        for (input, output) in frames.iter().zip(buffers.iter()) {
            for (src, dst) in input.buffer.pixels().zip(output.pixels()) {
                for c in 0..3 {
                    let expected = ((src[c] as f64 / step).floor() * step).ceil();
                    assert_eq!(dst[c] as f64, expected);
                }
                assert_eq!(src[3], dst[3]);
            }
        }
        assert_ne!(buffers[3], frames[3].buffer);
    }

    #[test]
    fn test_empty_input_fails_first() {
        // invalid config must not mask the empty-input error
        let config = AnimationConfig {
            fps: 0,
            ..Default::default()
        };
        assert!(matches!(
            assemble(&[], &config),
            Err(AnimationError::NoFrames)
        ));
    }

    #[test]
    fn test_dimension_mismatch_names_index() {
        let mut frames = rgb_frames();
        frames.insert(2, Frame::new(PixelBuffer::solid(4, 5, RED).unwrap(), 100));
        let err = assemble(&frames, &AnimationConfig::default()).unwrap_err();
        match err {
            AnimationError::DimensionMismatch {
                index,
                expected,
                actual,
            } => {
                assert_eq!(index, 2);
                assert_eq!(expected, (4, 4));
                assert_eq!(actual, (4, 5));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let config = AnimationConfig {
            quality: 150,
            ..Default::default()
        };
        assert!(matches!(
            assemble(&rgb_frames(), &config),
            Err(AnimationError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_single_frame_is_malformed() {
        let frames = vec![Frame::new(PixelBuffer::solid(2, 2, RED).unwrap(), 100)];
        assert!(matches!(
            assemble(&frames, &AnimationConfig::default()),
            Err(AnimationError::MalformedContainer(_))
        ));

        let assembler = AnimationAssembler::new(PngCodec::new().animate_single_frame(true));
        let apng = assembler.assemble(&frames, &AnimationConfig::default()).unwrap();
        assert_eq!(apng.frame_count(), 1);
    }

    #[test]
    fn test_codec_failure_is_wrapped() {
        let assembler = AnimationAssembler::new(FailingCodec);
        let err = assembler
            .assemble(&rgb_frames(), &AnimationConfig::default())
            .unwrap_err();
        assert!(matches!(err, AnimationError::Encoding(_)));
        assert!(err.to_string().contains("backend offline"));
    }

    #[test]
    fn test_assemble_images_decodes_in_order() {
        let codec = PngCodec::new().animate_single_frame(true);
        let images: Vec<Vec<u8>> = [RED, GREEN, BLUE]
            .into_iter()
            .map(|c| {
                let frame = PixelBuffer::solid(3, 2, c).unwrap();
                codec.encode(&[frame], 3, 2, &[0]).unwrap()
            })
            .collect();

        let assembler = AnimationAssembler::new(RecordingCodec::default());
        let config = AnimationConfig {
            fps: 20,
            loops: 1,
            quality: 100,
        };
        let apng = assembler.assemble_images(&images, &config).unwrap();
        assert_eq!(apng.dimensions(), (3, 2));
        assert_eq!(apng.delay_ms(), 50);

        let seen = assembler.codec().seen.lock().unwrap();
        let colors: Vec<&[u8]> = seen[0].0.iter().map(|b| &b.as_bytes()[..4]).collect();
        assert_eq!(colors, [&RED[..], &GREEN[..], &BLUE[..]]);
    }

    #[test]
    fn test_assemble_images_reports_decode_failure() {
        let assembler = AnimationAssembler::new(PngCodec::new());
        let images = vec![b"not a png".to_vec()];
        assert!(matches!(
            assembler.assemble_images(&images, &AnimationConfig::default()),
            Err(AnimationError::Encoding(CodecError::Unsupported(_)))
        ));
    }

    #[test]
    fn test_stats_display() {
        let config = AnimationConfig {
            fps: 10,
            loops: 0,
            quality: 100,
        };
        let apng = assemble(&rgb_frames(), &config).unwrap();
        let stats = apng.stats();
        assert_eq!(stats.frame_count, 3);
        assert_eq!(stats.duration_ms, 300);
        assert_eq!(apng.duration_ms(), config.total_duration_ms(3));
        let text = stats.to_string();
        assert!(text.starts_with("3 frames"));
        assert!(text.contains("loops forever"));
    }

    #[test]
    fn test_format_file_size() {
        assert_eq!(format_file_size(0), "0 Bytes");
        assert_eq!(format_file_size(512), "512 Bytes");
        assert_eq!(format_file_size(1024), "1 KB");
        assert_eq!(format_file_size(1536), "1.5 KB");
        assert_eq!(format_file_size(5 * 1024 * 1024), "5 MB");
    }
}
