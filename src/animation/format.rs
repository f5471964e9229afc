//! Binary format definitions for PNG / APNG containers.

use std::io::{self, Read, Write};

use crate::compute::chunk_crc;

/// Fixed 8-byte signature every PNG stream starts with.
pub const PNG_SIGNATURE: [u8; 8] = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];

/// Media type of an animated PNG.
pub const APNG_MEDIA_TYPE: &str = "image/apng";

pub const IHDR: &[u8; 4] = b"IHDR";
pub const ACTL: &[u8; 4] = b"acTL";
pub const FCTL: &[u8; 4] = b"fcTL";
pub const IDAT: &[u8; 4] = b"IDAT";
pub const FDAT: &[u8; 4] = b"fdAT";
pub const IEND: &[u8; 4] = b"IEND";

/// Length field + type tag + CRC surrounding every chunk payload.
pub const CHUNK_OVERHEAD: usize = 12;

/// Check for the PNG signature.
pub fn is_png(bytes: &[u8]) -> bool {
    bytes.starts_with(&PNG_SIGNATURE)
}

/// Append one chunk: `length | type | data | crc32(type ++ data)`.
pub fn write_chunk(out: &mut Vec<u8>, chunk_type: &[u8; 4], data: &[u8]) {
    out.reserve(data.len() + CHUNK_OVERHEAD);
    out.extend_from_slice(&(data.len() as u32).to_be_bytes());
    out.extend_from_slice(chunk_type);
    out.extend_from_slice(data);
    out.extend_from_slice(&chunk_crc(chunk_type, data).to_be_bytes());
}

fn read_u32<R: Read>(r: &mut R) -> io::Result<u32> {
    let mut buf = [0u8; 4];
    r.read_exact(&mut buf)?;
    Ok(u32::from_be_bytes(buf))
}

fn read_u16<R: Read>(r: &mut R) -> io::Result<u16> {
    let mut buf = [0u8; 2];
    r.read_exact(&mut buf)?;
    Ok(u16::from_be_bytes(buf))
}

fn read_u8<R: Read>(r: &mut R) -> io::Result<u8> {
    let mut buf = [0u8; 1];
    r.read_exact(&mut buf)?;
    Ok(buf[0])
}

/// PNG color type codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ColorType {
    Grayscale = 0,
    Rgb = 2,
    Indexed = 3,
    GrayscaleAlpha = 4,
    Rgba = 6,
}

/// IHDR payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageHeader {
    pub width: u32,
    pub height: u32,
    pub bit_depth: u8,
    pub color_type: u8,
    pub compression: u8,
    pub filter: u8,
    pub interlace: u8,
}

impl ImageHeader {
    /// Payload size in bytes.
    pub const SIZE: usize = 13;

    /// Header for 8-bit RGBA, non-interlaced.
    pub fn rgba8(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            bit_depth: 8,
            color_type: ColorType::Rgba as u8,
            compression: 0,
            filter: 0,
            interlace: 0,
        }
    }

    pub fn write_to<W: Write>(&self, w: &mut W) -> io::Result<()> {
        w.write_all(&self.width.to_be_bytes())?;
        w.write_all(&self.height.to_be_bytes())?;
        w.write_all(&[
            self.bit_depth,
            self.color_type,
            self.compression,
            self.filter,
            self.interlace,
        ])?;
        Ok(())
    }

    pub fn read_from<R: Read>(r: &mut R) -> io::Result<Self> {
        Ok(Self {
            width: read_u32(r)?,
            height: read_u32(r)?,
            bit_depth: read_u8(r)?,
            color_type: read_u8(r)?,
            compression: read_u8(r)?,
            filter: read_u8(r)?,
            interlace: read_u8(r)?,
        })
    }
}

/// acTL payload: frame count and play count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnimationControl {
    pub frame_count: u32,
    /// 0 plays forever.
    pub num_plays: u32,
}

impl AnimationControl {
    /// Payload size in bytes.
    pub const SIZE: usize = 8;
    /// Offset of `num_plays` within the payload.
    pub const NUM_PLAYS_OFFSET: usize = 4;

    pub fn write_to<W: Write>(&self, w: &mut W) -> io::Result<()> {
        w.write_all(&self.frame_count.to_be_bytes())?;
        w.write_all(&self.num_plays.to_be_bytes())?;
        Ok(())
    }

    pub fn read_from<R: Read>(r: &mut R) -> io::Result<Self> {
        Ok(Self {
            frame_count: read_u32(r)?,
            num_plays: read_u32(r)?,
        })
    }
}

/// Frame delay as a fraction of a second.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Delay {
    pub numerator: u16,
    /// 0 is read as 100.
    pub denominator: u16,
}

impl Delay {
    pub fn new(numerator: u16, denominator: u16) -> Self {
        Self {
            numerator,
            denominator,
        }
    }

    /// Encode milliseconds, falling back to coarser units when the value
    /// does not fit a u16 numerator.
    pub fn from_millis(ms: u32) -> Self {
        if let Ok(n) = u16::try_from(ms) {
            return Self::new(n, 1000);
        }
        if let Ok(n) = u16::try_from(ms.div_ceil(10)) {
            return Self::new(n, 100);
        }
        let seconds = ms.div_ceil(1000).min(u16::MAX as u32) as u16;
        Self::new(seconds, 1)
    }

    pub fn as_millis(&self) -> f64 {
        let den = if self.denominator == 0 {
            100
        } else {
            self.denominator
        };
        self.numerator as f64 * 1000.0 / den as f64
    }
}

/// fcTL disposal operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum DisposeOp {
    #[default]
    None = 0,
    Background = 1,
    Previous = 2,
}

/// fcTL blend operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum BlendOp {
    #[default]
    Source = 0,
    Over = 1,
}

/// fcTL payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameControl {
    pub sequence_number: u32,
    pub width: u32,
    pub height: u32,
    pub x_offset: u32,
    pub y_offset: u32,
    pub delay: Delay,
    pub dispose_op: u8,
    pub blend_op: u8,
}

impl FrameControl {
    /// Payload size in bytes.
    pub const SIZE: usize = 26;

    /// Full-canvas frame at the origin that replaces the previous one.
    pub fn full_canvas(sequence_number: u32, width: u32, height: u32, delay: Delay) -> Self {
        Self {
            sequence_number,
            width,
            height,
            x_offset: 0,
            y_offset: 0,
            delay,
            dispose_op: DisposeOp::None as u8,
            blend_op: BlendOp::Source as u8,
        }
    }

    pub fn write_to<W: Write>(&self, w: &mut W) -> io::Result<()> {
        w.write_all(&self.sequence_number.to_be_bytes())?;
        w.write_all(&self.width.to_be_bytes())?;
        w.write_all(&self.height.to_be_bytes())?;
        w.write_all(&self.x_offset.to_be_bytes())?;
        w.write_all(&self.y_offset.to_be_bytes())?;
        w.write_all(&self.delay.numerator.to_be_bytes())?;
        w.write_all(&self.delay.denominator.to_be_bytes())?;
        w.write_all(&[self.dispose_op, self.blend_op])?;
        Ok(())
    }

    pub fn read_from<R: Read>(r: &mut R) -> io::Result<Self> {
        Ok(Self {
            sequence_number: read_u32(r)?,
            width: read_u32(r)?,
            height: read_u32(r)?,
            x_offset: read_u32(r)?,
            y_offset: read_u32(r)?,
            delay: Delay::new(read_u16(r)?, read_u16(r)?),
            dispose_op: read_u8(r)?,
            blend_op: read_u8(r)?,
        })
    }
}

/// One chunk located inside a container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkRecord<'a> {
    /// Offset of the length field from the start of the container.
    pub offset: usize,
    pub length: u32,
    pub chunk_type: [u8; 4],
    pub data: &'a [u8],
    pub crc: u32,
}

impl ChunkRecord<'_> {
    pub fn is(&self, chunk_type: &[u8; 4]) -> bool {
        &self.chunk_type == chunk_type
    }

    /// Tag as text, for logs and error messages.
    pub fn type_name(&self) -> String {
        String::from_utf8_lossy(&self.chunk_type).into_owned()
    }

    /// Offset of the CRC field.
    pub fn crc_offset(&self) -> usize {
        self.offset + 8 + self.length as usize
    }

    /// Offset of the next chunk.
    pub fn end_offset(&self) -> usize {
        self.crc_offset() + 4
    }

    /// Whether the stored CRC covers `type ++ data`.
    pub fn crc_matches(&self) -> bool {
        chunk_crc(&self.chunk_type, self.data) == self.crc
    }
}

/// Walks the chunks following the signature.
///
/// Iteration ends at the end of the buffer or at the first chunk whose
/// declared length runs past it; [`ChunkIter::offset`] then tells where.
#[derive(Debug, Clone)]
pub struct ChunkIter<'a> {
    bytes: &'a [u8],
    offset: usize,
}

impl<'a> ChunkIter<'a> {
    /// Start after the 8-byte signature. The signature itself is not checked.
    pub fn new(bytes: &'a [u8]) -> Self {
        Self {
            bytes,
            offset: PNG_SIGNATURE.len().min(bytes.len()),
        }
    }

    /// Offset of the next unread chunk.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// True once every byte has been consumed as whole chunks.
    pub fn is_exhausted(&self) -> bool {
        self.offset == self.bytes.len()
    }
}

impl<'a> Iterator for ChunkIter<'a> {
    type Item = ChunkRecord<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let rest = self.bytes.get(self.offset..)?;
        if rest.len() < CHUNK_OVERHEAD {
            return None;
        }

        let length = u32::from_be_bytes([rest[0], rest[1], rest[2], rest[3]]);
        let chunk_type = [rest[4], rest[5], rest[6], rest[7]];
        let data_end = 8usize.checked_add(length as usize)?;
        if rest.len() < data_end.checked_add(4)? {
            return None;
        }
        let data = &rest[8..data_end];
        let crc = u32::from_be_bytes([
            rest[data_end],
            rest[data_end + 1],
            rest[data_end + 2],
            rest[data_end + 3],
        ]);

        let record = ChunkRecord {
            offset: self.offset,
            length,
            chunk_type,
            data,
            crc,
        };
        self.offset = record.end_offset();
        Some(record)
    }
}
