use crate::ByteWrite;

/// A growable ByteWrite implementation backed by a `Vec<u8>`.
/// Used to build delta-update messages and rewritten messages of any size.
pub struct StreamWriter {
    buffer: Vec<u8>,
}

impl StreamWriter {
    pub fn new() -> Self {
        Self::with_capacity(256)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buffer: Vec::with_capacity(capacity),
        }
    }

    /// Overwrite four bytes previously written at `offset`.
    /// Returns false if that range was never written.
    pub fn patch_u32(&mut self, offset: usize, value: u32) -> bool {
        let Some(slot) = self.buffer.get_mut(offset..offset + 4) else {
            return false;
        };
        slot.copy_from_slice(&value.to_le_bytes());
        true
    }

    pub fn to_bytes(self) -> Vec<u8> {
        self.buffer
    }
}

impl Default for StreamWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl ByteWrite for StreamWriter {
    fn write_byte(&mut self, byte: u8) {
        self.buffer.push(byte);
    }

    fn write_bytes(&mut self, bytes: &[u8]) {
        self.buffer.extend_from_slice(bytes);
    }
}
