use thiserror::Error;

use crate::{bit_reader::BitReader, bit_writer::BitWrite, error::SerdeErr, serde::Serde, ConstBitLength};

/// A value that does not fit the declared bit width
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("with {bits} bits, can't encode number {value}")]
pub struct IntegerRangeError {
    pub bits: u8,
    pub value: u64,
}

/// Fixed-width unsigned integer, always `BITS` bits on the wire
pub type UnsignedInteger<const BITS: u8> = SerdeInteger<false, BITS>;
/// Unsigned integer written in `BITS`-bit chunks, each preceded by a
/// continuation bit; small values stay small on the wire
pub type UnsignedVariableInteger<const BITS: u8> = SerdeInteger<true, BITS>;

#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub struct SerdeInteger<const VARIABLE: bool, const BITS: u8> {
    value: u64,
}

impl<const VARIABLE: bool, const BITS: u8> SerdeInteger<VARIABLE, BITS> {
    /// # Panics
    ///
    /// Panics if a fixed-width integer cannot hold `value`.
    /// Consider using `try_new` for non-panicking error handling.
    pub fn new<T: Into<u64>>(value: T) -> Self {
        match Self::try_new(value) {
            Ok(integer) => integer,
            Err(error) => panic!("{}", error),
        }
    }

    pub fn try_new<T: Into<u64>>(value: T) -> Result<Self, IntegerRangeError> {
        assert!(BITS > 0 && BITS <= 64, "integer width must be within 1..=64 bits");
        let value = value.into();
        if !VARIABLE && BITS < 64 && value >= (1u64 << BITS) {
            return Err(IntegerRangeError { bits: BITS, value });
        }
        Ok(Self { value })
    }

    pub fn get(&self) -> u64 {
        self.value
    }

    pub fn to<T: TryFrom<u64>>(&self) -> Result<T, SerdeErr> {
        T::try_from(self.value).map_err(|_| SerdeErr)
    }

    fn write_chunk(writer: &mut dyn BitWrite, mut value: u64) -> u64 {
        for _ in 0..BITS {
            writer.write_bit(value & 1 != 0);
            value >>= 1;
        }
        value
    }
}

impl<const VARIABLE: bool, const BITS: u8> Serde for SerdeInteger<VARIABLE, BITS> {
    fn ser(&self, writer: &mut dyn BitWrite) {
        if !VARIABLE {
            Self::write_chunk(writer, self.value);
            return;
        }

        let mut value = self.value;
        loop {
            let proceed = BITS < 64 && value >= (1u64 << BITS);
            writer.write_bit(proceed);
            value = Self::write_chunk(writer, value);
            if !proceed {
                return;
            }
        }
    }

    fn de(reader: &mut BitReader) -> Result<Self, SerdeErr> {
        let mut output: u64 = 0;
        let mut shift: u32 = 0;

        loop {
            let proceed = if VARIABLE { reader.read_bit()? } else { false };

            for _ in 0..BITS {
                if reader.read_bit()? {
                    if shift >= 64 {
                        return Err(SerdeErr);
                    }
                    output |= 1 << shift;
                }
                shift += 1;
            }

            if !proceed {
                return Ok(Self { value: output });
            }
        }
    }

    fn bit_length(&self) -> u32 {
        if !VARIABLE {
            return BITS as u32;
        }

        let mut output = 0;
        let mut value = self.value;
        loop {
            let proceed = BITS < 64 && value >= (1u64 << BITS);
            output += 1 + BITS as u32;
            if BITS < 64 {
                value >>= BITS;
            }
            if !proceed {
                return output;
            }
        }
    }
}

impl<const BITS: u8> ConstBitLength for SerdeInteger<false, BITS> {
    fn const_bit_length() -> u32 {
        BITS as u32
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use crate::{
        bit_reader::BitReader,
        bit_writer::BitWriter,
        integer::{UnsignedInteger, UnsignedVariableInteger},
        serde::Serde,
    };

    #[test]
    fn fixed_width_rejects_overflow() {
        assert!(UnsignedInteger::<4>::try_new(15u8).is_ok());
        let error = UnsignedInteger::<4>::try_new(16u8).unwrap_err();
        assert_eq!(error.bits, 4);
        assert_eq!(error.value, 16);
    }

    #[test]
    fn read_write_fixed_width() {
        let mut writer = BitWriter::new();

        let in_1 = UnsignedInteger::<7>::new(123u8);
        let in_2 = UnsignedInteger::<20>::new(535_221u32);
        let in_3 = UnsignedInteger::<2>::new(3u8);

        in_1.ser(&mut writer);
        in_2.ser(&mut writer);
        in_3.ser(&mut writer);
        assert_eq!(writer.bits_written(), 29);

        let buffer = writer.to_bytes();
        let mut reader = BitReader::new(&buffer);

        assert_eq!(UnsignedInteger::<7>::de(&mut reader), Ok(in_1));
        assert_eq!(UnsignedInteger::<20>::de(&mut reader), Ok(in_2));
        assert_eq!(UnsignedInteger::<2>::de(&mut reader), Ok(in_3));
    }

    #[test]
    fn variable_width_grows_in_chunks() {
        let small = UnsignedVariableInteger::<7>::new(100u8);
        let large = UnsignedVariableInteger::<7>::new(1_000_000u32);
        assert_eq!(small.bit_length(), 8);
        assert_eq!(large.bit_length(), 24);

        let mut writer = BitWriter::new();
        small.ser(&mut writer);
        large.ser(&mut writer);
        assert_eq!(writer.bits_written(), 32);

        let buffer = writer.to_bytes();
        let mut reader = BitReader::new(&buffer);
        assert_eq!(UnsignedVariableInteger::<7>::de(&mut reader), Ok(small));
        assert_eq!(UnsignedVariableInteger::<7>::de(&mut reader), Ok(large));
    }

    #[test]
    fn full_width_variable_round_trips() {
        let value = UnsignedVariableInteger::<64>::new(u64::MAX);
        let mut writer = BitWriter::new();
        value.ser(&mut writer);
        let buffer = writer.to_bytes();
        let mut reader = BitReader::new(&buffer);
        assert_eq!(UnsignedVariableInteger::<64>::de(&mut reader), Ok(value));
    }

    #[test]
    fn conversion_out_of_range_fails() {
        let value = UnsignedVariableInteger::<9>::new(300u16);
        assert_eq!(value.to::<u16>(), Ok(300));
        assert!(value.to::<u8>().is_err());
    }

    proptest! {
        #[test]
        fn prop_variable_width_round_trips(value in any::<u64>()) {
            let value = UnsignedVariableInteger::<7>::new(value);
            let mut writer = BitWriter::new();
            value.ser(&mut writer);
            prop_assert_eq!(writer.bits_written(), value.bit_length());

            let buffer = writer.to_bytes();
            let mut reader = BitReader::new(&buffer);
            prop_assert_eq!(UnsignedVariableInteger::<7>::de(&mut reader), Ok(value));
        }

        #[test]
        fn prop_fixed_width_accepts_exactly_its_range(value in 0u32..(1 << 21)) {
            let fits = value < (1 << 20);
            prop_assert_eq!(UnsignedInteger::<20>::try_new(value).is_ok(), fits);
        }
    }
}
