use lockstep_serde::{BitReader, BitWrite, ConstBitLength, Serde, SerdeErr, UnsignedInteger};

/// Opcode of a command packet
#[derive(Copy, Debug, Clone, Eq, PartialEq, Hash)]
pub enum CommandCode {
    ConfigInit,
    ConfigInitReply,
    ConfigExit,
    ConfigExitReply,
    CreatePipe,
    DestroyPipe,
    CreateWindow,
    DestroyWindow,
    CreateChannel,
    DestroyChannel,
    FrameStart,
    FrameFinish,
    FrameFinishReply,
    ObjectDelta,
}

impl CommandCode {
    pub fn name(&self) -> &'static str {
        match self {
            CommandCode::ConfigInit => "config init",
            CommandCode::ConfigInitReply => "config init reply",
            CommandCode::ConfigExit => "config exit",
            CommandCode::ConfigExitReply => "config exit reply",
            CommandCode::CreatePipe => "create pipe",
            CommandCode::DestroyPipe => "destroy pipe",
            CommandCode::CreateWindow => "create window",
            CommandCode::DestroyWindow => "destroy window",
            CommandCode::CreateChannel => "create channel",
            CommandCode::DestroyChannel => "destroy channel",
            CommandCode::FrameStart => "frame start",
            CommandCode::FrameFinish => "frame finish",
            CommandCode::FrameFinishReply => "frame finish reply",
            CommandCode::ObjectDelta => "object delta",
        }
    }

    pub fn is_reply(&self) -> bool {
        matches!(
            self,
            CommandCode::ConfigInitReply
                | CommandCode::ConfigExitReply
                | CommandCode::FrameFinishReply
        )
    }

    fn index(&self) -> u8 {
        match self {
            CommandCode::ConfigInit => 0,
            CommandCode::ConfigInitReply => 1,
            CommandCode::ConfigExit => 2,
            CommandCode::ConfigExitReply => 3,
            CommandCode::CreatePipe => 4,
            CommandCode::DestroyPipe => 5,
            CommandCode::CreateWindow => 6,
            CommandCode::DestroyWindow => 7,
            CommandCode::CreateChannel => 8,
            CommandCode::DestroyChannel => 9,
            CommandCode::FrameStart => 10,
            CommandCode::FrameFinish => 11,
            CommandCode::FrameFinishReply => 12,
            CommandCode::ObjectDelta => 13,
        }
    }
}

impl Serde for CommandCode {
    fn ser(&self, writer: &mut dyn BitWrite) {
        UnsignedInteger::<4>::new(self.index()).ser(writer);
    }

    fn de(reader: &mut BitReader) -> Result<Self, SerdeErr> {
        match UnsignedInteger::<4>::de(reader)?.get() {
            0 => Ok(CommandCode::ConfigInit),
            1 => Ok(CommandCode::ConfigInitReply),
            2 => Ok(CommandCode::ConfigExit),
            3 => Ok(CommandCode::ConfigExitReply),
            4 => Ok(CommandCode::CreatePipe),
            5 => Ok(CommandCode::DestroyPipe),
            6 => Ok(CommandCode::CreateWindow),
            7 => Ok(CommandCode::DestroyWindow),
            8 => Ok(CommandCode::CreateChannel),
            9 => Ok(CommandCode::DestroyChannel),
            10 => Ok(CommandCode::FrameStart),
            11 => Ok(CommandCode::FrameFinish),
            12 => Ok(CommandCode::FrameFinishReply),
            13 => Ok(CommandCode::ObjectDelta),
            // malformed packets must not take the receiver down
            _ => Err(SerdeErr),
        }
    }

    fn bit_length(&self) -> u32 {
        <UnsignedInteger<4> as ConstBitLength>::const_bit_length()
    }
}
