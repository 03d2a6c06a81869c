use crate::error::SerdeErr;

/// Forward-only cursor over a borrowed byte slice.
///
/// Every read checks the remaining length first and never advances on failure.
pub struct ByteReader<'b> {
    buffer: &'b [u8],
    cursor: usize,
}

impl<'b> ByteReader<'b> {
    pub fn new(buffer: &'b [u8]) -> Self {
        Self { buffer, cursor: 0 }
    }

    pub fn remaining(&self) -> usize {
        self.buffer.len() - self.cursor
    }

    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    fn ensure(&self, needed: usize) -> Result<(), SerdeErr> {
        let remaining = self.remaining();
        if needed > remaining {
            return Err(SerdeErr::Truncated {
                offset: self.cursor,
                needed,
                remaining,
            });
        }
        Ok(())
    }

    pub fn read_u8(&mut self) -> Result<u8, SerdeErr> {
        self.ensure(1)?;
        let byte = self.buffer[self.cursor];
        self.cursor += 1;
        Ok(byte)
    }

    pub fn read_u32(&mut self) -> Result<u32, SerdeErr> {
        let bytes = self.read_bytes(4)?;
        Ok(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    pub fn read_bytes(&mut self, len: usize) -> Result<&'b [u8], SerdeErr> {
        self.ensure(len)?;
        let start = self.cursor;
        self.cursor += len;
        Ok(&self.buffer[start..self.cursor])
    }
}
