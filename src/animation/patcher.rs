//! Post-encode rewrite of the acTL loop count.

use log::debug;

use super::error::AnimationError;
use super::format::{ACTL, AnimationControl, ChunkIter, ChunkRecord, is_png};
use crate::compute::crc32;

/// Find the acTL chunk, failing if the walk runs out first.
fn find_animation_control(container: &[u8]) -> Result<ChunkRecord<'_>, AnimationError> {
    if !is_png(container) {
        return Err(AnimationError::MalformedContainer(
            "missing PNG signature".into(),
        ));
    }

    let mut chunks = ChunkIter::new(container);
    let record = chunks.find(|chunk| chunk.is(ACTL)).ok_or_else(|| {
        AnimationError::MalformedContainer(format!(
            "no acTL chunk found (walk stopped at offset {} of {})",
            chunks.offset(),
            container.len()
        ))
    })?;

    if (record.length as usize) < AnimationControl::SIZE {
        return Err(AnimationError::MalformedContainer(format!(
            "acTL chunk at offset {} holds {} bytes, expected {}",
            record.offset,
            record.length,
            AnimationControl::SIZE
        )));
    }
    Ok(record)
}

/// Read the acTL payload without modifying anything.
pub fn read_animation_control(container: &[u8]) -> Result<AnimationControl, AnimationError> {
    let record = find_animation_control(container)?;
    AnimationControl::read_from(&mut &record.data[..])
        .map_err(|e| AnimationError::MalformedContainer(format!("acTL payload: {e}")))
}

/// Return a copy of `container` with acTL `num_plays` set to `loops`.
///
/// The acTL CRC is recomputed; every other byte is copied unchanged and
/// the input is left untouched.
pub fn patch_loop_count(container: &[u8], loops: u32) -> Result<Vec<u8>, AnimationError> {
    let record = find_animation_control(container)?;

    let type_start = record.offset + 4;
    let plays_start = record.offset + 8 + AnimationControl::NUM_PLAYS_OFFSET;
    let crc_start = record.crc_offset();

    let mut patched = container.to_vec();
    patched[plays_start..plays_start + 4].copy_from_slice(&loops.to_be_bytes());
    let crc = crc32(&patched[type_start..crc_start]);
    patched[crc_start..crc_start + 4].copy_from_slice(&crc.to_be_bytes());

    debug!(
        "Patched acTL at offset {}: num_plays {} -> {}",
        record.offset,
        u32::from_be_bytes([
            container[plays_start],
            container[plays_start + 1],
            container[plays_start + 2],
            container[plays_start + 3],
        ]),
        loops
    );
    Ok(patched)
}
