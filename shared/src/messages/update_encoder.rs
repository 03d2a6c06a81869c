use log::trace;

use crate::{
    constants::MAX_MASK_BLOCKS, read_packed_id, write_packed_id, ByteReader, ByteWrite,
    DecodeError, EncodeError, EntityId, FieldChange, StreamWriter,
};

use super::update_decoder::{mask_at, read_block_count, read_group_count, value_at};

/// One entity's changed fields, as written into a message
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UpdateGroup {
    pub entity: EntityId,
    /// (field index, value) pairs in any order
    pub fields: Vec<(u16, u32)>,
}

impl UpdateGroup {
    pub fn new(entity: EntityId) -> Self {
        Self {
            entity,
            fields: Vec::new(),
        }
    }

    pub fn with_field(mut self, index: u16, value: u32) -> Self {
        self.fields.push((index, value));
        self
    }
}

/// Writes sparse delta-update messages, and rewrites existing ones with
/// selected field values removed
pub struct UpdateEncoder {
    sorted: Vec<(u16, u32)>,
}

impl UpdateEncoder {
    pub fn new() -> Self {
        Self { sorted: Vec::new() }
    }

    pub fn encode(&mut self, groups: &[UpdateGroup]) -> Result<Vec<u8>, EncodeError> {
        let mut writer = StreamWriter::new();
        self.write_message(&mut writer, groups)?;
        Ok(writer.to_bytes())
    }

    pub fn write_message<W: ByteWrite>(
        &mut self,
        writer: &mut W,
        groups: &[UpdateGroup],
    ) -> Result<(), EncodeError> {
        writer.write_u32(groups.len() as u32);
        for group in groups {
            self.write_group(writer, group)?;
        }
        Ok(())
    }

    fn write_group<W: ByteWrite>(
        &mut self,
        writer: &mut W,
        group: &UpdateGroup,
    ) -> Result<(), EncodeError> {
        self.sorted.clear();
        self.sorted.extend_from_slice(&group.fields);
        self.sorted.sort_unstable_by_key(|(index, _)| *index);

        let mut masks = [0u32; MAX_MASK_BLOCKS];
        let mut block_count = 0;
        for (index, _) in &self.sorted {
            let block = usize::from(*index / 32);
            if block >= MAX_MASK_BLOCKS {
                return Err(EncodeError::FieldIndexOutOfRange {
                    index: *index,
                    max: MAX_MASK_BLOCKS * 32 - 1,
                });
            }
            let bit = 1u32 << (index % 32);
            if masks[block] & bit != 0 {
                return Err(EncodeError::DuplicateField { index: *index });
            }
            masks[block] |= bit;
            block_count = block_count.max(block + 1);
        }

        write_packed_id(writer, group.entity.to_u64());
        writer.write_byte(block_count as u8);
        for mask in &masks[..block_count] {
            writer.write_u32(*mask);
        }
        for (_, value) in &self.sorted {
            writer.write_u32(*value);
        }
        Ok(())
    }

    /// Rewrites a payload of one or more concatenated messages without the
    /// values named by `removals`. Groups left empty are dropped, and so are
    /// messages left without groups.
    ///
    /// Returns `None` when nothing remains.
    pub fn rewrite(
        &mut self,
        payload: &[u8],
        removals: &[FieldChange],
    ) -> Result<Option<Vec<u8>>, DecodeError> {
        let mut reader = ByteReader::new(payload);
        let mut output = StreamWriter::with_capacity(payload.len());
        let mut message = 0u32;
        let mut kept_messages = 0u32;

        while !reader.is_empty() || message == 0 {
            let kept = rewrite_message(&mut reader, message, removals)?;
            if let Some(bytes) = kept {
                output.write_bytes(&bytes);
                kept_messages += 1;
            }
            message += 1;
        }

        trace!(
            "UpdateEncoder: rewrote {} messages, {} kept, {} values removed",
            message,
            kept_messages,
            removals.len()
        );
        if kept_messages == 0 {
            return Ok(None);
        }
        Ok(Some(output.to_bytes()))
    }
}

impl Default for UpdateEncoder {
    fn default() -> Self {
        Self::new()
    }
}

fn rewrite_message(
    reader: &mut ByteReader,
    message: u32,
    removals: &[FieldChange],
) -> Result<Option<Vec<u8>>, DecodeError> {
    let group_count = read_group_count(reader)?;

    let mut writer = StreamWriter::new();
    writer.write_u32(0);
    let mut kept_groups = 0u32;
    let mut masks = [0u32; MAX_MASK_BLOCKS];

    for group in 0..group_count {
        let entity = read_packed_id(reader)?;
        let block_count = read_block_count(reader)?;
        let mask_bytes = reader.read_bytes(block_count * 4)?;

        let mut total = 0usize;
        for (block, mask) in masks[..block_count].iter_mut().enumerate() {
            *mask = mask_at(mask_bytes, block);
            total += mask.count_ones() as usize;
        }
        let values = reader.read_bytes(total * 4)?;

        let original = masks;
        for removal in removals
            .iter()
            .filter(|removal| removal.message == message && removal.group == group)
        {
            let block = usize::from(removal.field_index / 32);
            if block < block_count {
                masks[block] &= !(1u32 << (removal.field_index % 32));
            }
        }

        if masks[..block_count].iter().all(|mask| *mask == 0) {
            continue;
        }

        write_packed_id(&mut writer, entity);
        writer.write_byte(block_count as u8);
        for mask in &masks[..block_count] {
            writer.write_u32(*mask);
        }
        let mut value_index = 0;
        for block in 0..block_count {
            let mut bits = original[block];
            while bits != 0 {
                let bit = bits & bits.wrapping_neg();
                bits &= bits - 1;
                if masks[block] & bit != 0 {
                    writer.write_u32(value_at(values, value_index));
                }
                value_index += 1;
            }
        }
        kept_groups += 1;
    }

    if kept_groups == 0 {
        return Ok(None);
    }
    writer.patch_u32(0, kept_groups);
    Ok(Some(writer.to_bytes()))
}
