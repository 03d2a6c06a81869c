use crate::{ByteReader, ByteWrite, SerdeErr};

/// Upper bound on the encoded size of a packed id: one mask byte plus eight id bytes
pub const PACKED_ID_MAX_BYTES: usize = 9;

/// Writes `id` as a presence mask byte followed by only its nonzero bytes,
/// least significant first. Bit `i` of the mask is set iff byte `i` is present.
pub fn write_packed_id<W: ByteWrite>(writer: &mut W, id: u64) {
    let bytes = id.to_le_bytes();
    let mut mask = 0u8;
    for (index, byte) in bytes.iter().enumerate() {
        if *byte != 0 {
            mask |= 1 << index;
        }
    }
    writer.write_byte(mask);
    for byte in bytes.iter().filter(|byte| **byte != 0) {
        writer.write_byte(*byte);
    }
}

pub fn read_packed_id(reader: &mut ByteReader) -> Result<u64, SerdeErr> {
    let mask = reader.read_u8()?;
    let present = reader.read_bytes(mask.count_ones() as usize)?;

    let mut bytes = [0u8; 8];
    let mut next = present.iter();
    for (index, byte) in bytes.iter_mut().enumerate() {
        if mask & (1 << index) != 0 {
            if let Some(value) = next.next() {
                *byte = *value;
            }
        }
    }
    Ok(u64::from_le_bytes(bytes))
}

/// Encoded length of `id` in bytes
pub fn packed_id_len(id: u64) -> usize {
    1 + id.to_le_bytes().iter().filter(|byte| **byte != 0).count()
}
