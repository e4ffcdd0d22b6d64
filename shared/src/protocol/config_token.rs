use lockstep_serde::{BitReader, BitWrite, ConstBitLength, Serde, SerdeErr, UnsignedInteger};

/// Tags the resource ids in config instance data
#[derive(Copy, Debug, Clone, Eq, PartialEq, Hash)]
pub enum ConfigToken {
    Node,
    Pipe,
    Window,
    Channel,
    /// Ends the token list
    Last,
}

impl Serde for ConfigToken {
    fn ser(&self, writer: &mut dyn BitWrite) {
        let index: u8 = match self {
            ConfigToken::Node => 0,
            ConfigToken::Pipe => 1,
            ConfigToken::Window => 2,
            ConfigToken::Channel => 3,
            ConfigToken::Last => 4,
        };
        UnsignedInteger::<3>::new(index).ser(writer);
    }

    fn de(reader: &mut BitReader) -> Result<Self, SerdeErr> {
        match UnsignedInteger::<3>::de(reader)?.get() {
            0 => Ok(ConfigToken::Node),
            1 => Ok(ConfigToken::Pipe),
            2 => Ok(ConfigToken::Window),
            3 => Ok(ConfigToken::Channel),
            4 => Ok(ConfigToken::Last),
            _ => Err(SerdeErr),
        }
    }

    fn bit_length(&self) -> u32 {
        <UnsignedInteger<3> as ConstBitLength>::const_bit_length()
    }
}
