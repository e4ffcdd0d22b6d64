use crate::error::SerdeErr;

/// Reads bits back out of a buffer produced by a `BitWriter`
pub struct BitReader<'b> {
    buffer: &'b [u8],
    bit_index: usize,
}

impl<'b> BitReader<'b> {
    pub fn new(buffer: &'b [u8]) -> Self {
        Self {
            buffer,
            bit_index: 0,
        }
    }

    pub fn read_bit(&mut self) -> Result<bool, SerdeErr> {
        let byte_index = self.bit_index / 8;
        let Some(byte) = self.buffer.get(byte_index) else {
            return Err(SerdeErr);
        };
        let bit = (byte >> (self.bit_index % 8)) & 1 != 0;
        self.bit_index += 1;
        Ok(bit)
    }

    pub fn read_byte(&mut self) -> Result<u8, SerdeErr> {
        let mut output = 0u8;
        for index in 0..8 {
            if self.read_bit()? {
                output |= 1 << index;
            }
        }
        Ok(output)
    }

    pub fn bits_read(&self) -> usize {
        self.bit_index
    }

    /// Bits left in the underlying buffer, including any trailing padding
    pub fn bits_remaining(&self) -> usize {
        (self.buffer.len() * 8).saturating_sub(self.bit_index)
    }
}

/// A `BitReader` source that owns its bytes, for packets that outlive the
/// receive call which produced them
pub struct OwnedBitReader {
    buffer: Box<[u8]>,
}

impl OwnedBitReader {
    pub fn new(bytes: &[u8]) -> Self {
        Self {
            buffer: bytes.into(),
        }
    }

    pub fn borrow(&self) -> BitReader<'_> {
        BitReader::new(&self.buffer)
    }
}

impl From<Vec<u8>> for OwnedBitReader {
    fn from(bytes: Vec<u8>) -> Self {
        Self {
            buffer: bytes.into_boxed_slice(),
        }
    }
}
