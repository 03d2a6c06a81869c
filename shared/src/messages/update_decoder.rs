use std::ops::Range;

use crate::{
    constants::MAX_MASK_BLOCKS, read_packed_id, ByteReader, DecodeError, EntityId, FieldChange,
    FieldLayout, FieldRef,
};

/// Smallest possible encoded group: an empty packed id and a zero block count
pub(crate) const MIN_GROUP_BYTES: usize = 2;

/// Decodes sparse delta-update messages into the [`FieldChange`]s the engine tracks.
///
/// Only fields inside the layout's ranges of interest are emitted; every other
/// value is skipped without being read. The decoder is stateless and never
/// allocates beyond growing the caller's output list.
pub struct UpdateDecoder {
    layout: FieldLayout,
    ranges: [Range<u16>; 3],
}

impl UpdateDecoder {
    pub fn new(layout: FieldLayout) -> Self {
        let ranges = layout.ranges_of_interest();
        Self { layout, ranges }
    }

    pub fn layout(&self) -> &FieldLayout {
        &self.layout
    }

    /// Decodes exactly one message. On error `out` is left as it was.
    pub fn decode_message(
        &self,
        payload: &[u8],
        out: &mut Vec<FieldChange>,
    ) -> Result<(), DecodeError> {
        let start = out.len();
        let mut reader = ByteReader::new(payload);
        let result = self.decode_one(&mut reader, 0, out).and_then(|_| {
            if reader.is_empty() {
                Ok(())
            } else {
                Err(DecodeError::TrailingBytes {
                    count: reader.remaining(),
                })
            }
        });
        if result.is_err() {
            out.truncate(start);
        }
        result
    }

    /// Decodes back-to-back messages until the payload is exhausted, returning
    /// how many were read. On error `out` is left as it was.
    pub fn decode_concatenated(
        &self,
        payload: &[u8],
        out: &mut Vec<FieldChange>,
    ) -> Result<u32, DecodeError> {
        if payload.is_empty() {
            return Err(DecodeError::EmptyPayload);
        }
        let start = out.len();
        let mut reader = ByteReader::new(payload);
        let mut messages = 0u32;
        while !reader.is_empty() {
            if let Err(err) = self.decode_one(&mut reader, messages, out) {
                out.truncate(start);
                return Err(err);
            }
            messages += 1;
        }
        Ok(messages)
    }

    fn decode_one(
        &self,
        reader: &mut ByteReader,
        message: u32,
        out: &mut Vec<FieldChange>,
    ) -> Result<(), DecodeError> {
        let group_count = read_group_count(reader)?;

        let mut prefix = [0u32; MAX_MASK_BLOCKS + 1];
        for group in 0..group_count {
            let entity = EntityId::from_u64(read_packed_id(reader)?);
            let block_count = read_block_count(reader)?;
            let masks = reader.read_bytes(block_count * 4)?;

            for block in 0..block_count {
                prefix[block + 1] = prefix[block] + mask_at(masks, block).count_ones();
            }
            let values = reader.read_bytes(prefix[block_count] as usize * 4)?;

            for range in &self.ranges {
                let first_block = usize::from(range.start / 32);
                let last_block = usize::from((range.end - 1) / 32).min(block_count.saturating_sub(1));
                if block_count == 0 || first_block > last_block {
                    continue;
                }
                for block in first_block..=last_block {
                    let mask = mask_at(masks, block);
                    let mut bits = mask & bits_within(range, block);
                    while bits != 0 {
                        let bit = bits.trailing_zeros();
                        bits &= bits - 1;

                        let field_index = (block * 32) as u16 + bit as u16;
                        if let FieldRef::Other(_) = self.layout.classify(field_index) {
                            continue;
                        }
                        let below = mask & ((1u32 << bit) - 1);
                        let offset = (prefix[block] + below.count_ones()) as usize;
                        out.push(FieldChange {
                            message,
                            group,
                            entity,
                            field_index,
                            value: value_at(values, offset),
                        });
                    }
                }
            }
        }
        Ok(())
    }
}

pub(crate) fn read_group_count(reader: &mut ByteReader) -> Result<u32, DecodeError> {
    let count = reader.read_u32()?;
    if count as usize > reader.remaining() / MIN_GROUP_BYTES {
        return Err(DecodeError::ImplausibleGroupCount {
            count,
            remaining: reader.remaining(),
        });
    }
    Ok(count)
}

pub(crate) fn read_block_count(reader: &mut ByteReader) -> Result<usize, DecodeError> {
    let count = usize::from(reader.read_u8()?);
    if count > MAX_MASK_BLOCKS {
        return Err(DecodeError::TooManyMaskBlocks {
            count,
            max: MAX_MASK_BLOCKS,
        });
    }
    Ok(count)
}

/// Caller guarantees `masks` holds at least `block + 1` words
pub(crate) fn mask_at(masks: &[u8], block: usize) -> u32 {
    value_at(masks, block)
}

pub(crate) fn value_at(words: &[u8], index: usize) -> u32 {
    let bytes = &words[index * 4..index * 4 + 4];
    u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
}

/// Bits of `block` whose field index lies inside `range`
fn bits_within(range: &Range<u16>, block: usize) -> u32 {
    let block_start = block * 32;
    let low = usize::from(range.start).max(block_start) - block_start;
    let high = usize::from(range.end).min(block_start + 32) - block_start;
    if low >= high {
        return 0;
    }
    let width = high - low;
    let bits = if width == 32 { u32::MAX } else { (1u32 << width) - 1 };
    bits << low
}
