use lockstep_serde::{BitReader, BitWrite, Serde, SerdeErr};

use crate::{
    types::{FrameId, FrameNumber, InitId, ObjectId},
    versioned::ObjectDelta,
};

use super::{command_code::CommandCode, stat_event::StatEvent};

/// Payload of a command packet, one variant per command code
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    ConfigInit {
        init_id: InitId,
        name: String,
        /// Config instance data for nodes, empty for other resources
        instance_data: Vec<u8>,
    },
    ConfigInitReply {
        result: bool,
        error: String,
    },
    ConfigExit,
    ConfigExitReply {
        result: bool,
        error: String,
    },
    CreatePipe {
        pipe_id: ObjectId,
    },
    DestroyPipe {
        pipe_id: ObjectId,
    },
    CreateWindow {
        window_id: ObjectId,
    },
    DestroyWindow {
        window_id: ObjectId,
    },
    CreateChannel {
        channel_id: ObjectId,
    },
    DestroyChannel {
        channel_id: ObjectId,
    },
    FrameStart {
        frame_id: FrameId,
        frame_number: FrameNumber,
    },
    FrameFinish {
        frame_id: FrameId,
        frame_number: FrameNumber,
    },
    FrameFinishReply {
        frame_number: FrameNumber,
        statistics: Vec<StatEvent>,
    },
    ObjectDelta(ObjectDelta),
}

impl Command {
    pub fn code(&self) -> CommandCode {
        match self {
            Command::ConfigInit { .. } => CommandCode::ConfigInit,
            Command::ConfigInitReply { .. } => CommandCode::ConfigInitReply,
            Command::ConfigExit => CommandCode::ConfigExit,
            Command::ConfigExitReply { .. } => CommandCode::ConfigExitReply,
            Command::CreatePipe { .. } => CommandCode::CreatePipe,
            Command::DestroyPipe { .. } => CommandCode::DestroyPipe,
            Command::CreateWindow { .. } => CommandCode::CreateWindow,
            Command::DestroyWindow { .. } => CommandCode::DestroyWindow,
            Command::CreateChannel { .. } => CommandCode::CreateChannel,
            Command::DestroyChannel { .. } => CommandCode::DestroyChannel,
            Command::FrameStart { .. } => CommandCode::FrameStart,
            Command::FrameFinish { .. } => CommandCode::FrameFinish,
            Command::FrameFinishReply { .. } => CommandCode::FrameFinishReply,
            Command::ObjectDelta(_) => CommandCode::ObjectDelta,
        }
    }

    fn write_payload(&self, writer: &mut dyn BitWrite) {
        match self {
            Command::ConfigInit {
                init_id,
                name,
                instance_data,
            } => {
                init_id.ser(writer);
                name.ser(writer);
                instance_data.ser(writer);
            }
            Command::ConfigInitReply { result, error }
            | Command::ConfigExitReply { result, error } => {
                result.ser(writer);
                error.ser(writer);
            }
            Command::ConfigExit => {}
            Command::CreatePipe { pipe_id } | Command::DestroyPipe { pipe_id } => {
                pipe_id.ser(writer);
            }
            Command::CreateWindow { window_id } | Command::DestroyWindow { window_id } => {
                window_id.ser(writer);
            }
            Command::CreateChannel { channel_id } | Command::DestroyChannel { channel_id } => {
                channel_id.ser(writer);
            }
            Command::FrameStart {
                frame_id,
                frame_number,
            }
            | Command::FrameFinish {
                frame_id,
                frame_number,
            } => {
                frame_id.ser(writer);
                frame_number.ser(writer);
            }
            Command::FrameFinishReply {
                frame_number,
                statistics,
            } => {
                frame_number.ser(writer);
                statistics.ser(writer);
            }
            Command::ObjectDelta(delta) => delta.ser(writer),
        }
    }

    fn read_payload(code: CommandCode, reader: &mut BitReader) -> Result<Self, SerdeErr> {
        let command = match code {
            CommandCode::ConfigInit => Command::ConfigInit {
                init_id: InitId::de(reader)?,
                name: String::de(reader)?,
                instance_data: Vec::<u8>::de(reader)?,
            },
            CommandCode::ConfigInitReply => Command::ConfigInitReply {
                result: bool::de(reader)?,
                error: String::de(reader)?,
            },
            CommandCode::ConfigExit => Command::ConfigExit,
            CommandCode::ConfigExitReply => Command::ConfigExitReply {
                result: bool::de(reader)?,
                error: String::de(reader)?,
            },
            CommandCode::CreatePipe => Command::CreatePipe {
                pipe_id: ObjectId::de(reader)?,
            },
            CommandCode::DestroyPipe => Command::DestroyPipe {
                pipe_id: ObjectId::de(reader)?,
            },
            CommandCode::CreateWindow => Command::CreateWindow {
                window_id: ObjectId::de(reader)?,
            },
            CommandCode::DestroyWindow => Command::DestroyWindow {
                window_id: ObjectId::de(reader)?,
            },
            CommandCode::CreateChannel => Command::CreateChannel {
                channel_id: ObjectId::de(reader)?,
            },
            CommandCode::DestroyChannel => Command::DestroyChannel {
                channel_id: ObjectId::de(reader)?,
            },
            CommandCode::FrameStart => Command::FrameStart {
                frame_id: FrameId::de(reader)?,
                frame_number: FrameNumber::de(reader)?,
            },
            CommandCode::FrameFinish => Command::FrameFinish {
                frame_id: FrameId::de(reader)?,
                frame_number: FrameNumber::de(reader)?,
            },
            CommandCode::FrameFinishReply => Command::FrameFinishReply {
                frame_number: FrameNumber::de(reader)?,
                statistics: Vec::<StatEvent>::de(reader)?,
            },
            CommandCode::ObjectDelta => Command::ObjectDelta(ObjectDelta::de(reader)?),
        };
        Ok(command)
    }
}

/// A command addressed to one resource or object
#[derive(Clone, Debug, PartialEq)]
pub struct Packet {
    pub target: ObjectId,
    pub command: Command,
}

impl Packet {
    pub fn new(target: ObjectId, command: Command) -> Self {
        Self { target, command }
    }

    pub fn code(&self) -> CommandCode {
        self.command.code()
    }
}

impl Serde for Packet {
    fn ser(&self, writer: &mut dyn BitWrite) {
        self.target.ser(writer);
        self.command.code().ser(writer);
        self.command.write_payload(writer);
    }

    fn de(reader: &mut BitReader) -> Result<Self, SerdeErr> {
        let target = ObjectId::de(reader)?;
        let code = CommandCode::de(reader)?;
        let command = Command::read_payload(code, reader)?;
        Ok(Self { target, command })
    }
}

#[cfg(test)]
mod tests {
    use lockstep_serde::{BitReader, BitWriter, Serde};

    use super::{Command, Packet};
    use crate::protocol::{StatEvent, StatKind};

    fn reencode(packet: &Packet) -> Packet {
        let mut writer = BitWriter::new();
        packet.ser(&mut writer);
        let bytes = writer.to_bytes();
        let mut reader = BitReader::new(&bytes);
        Packet::de(&mut reader).unwrap()
    }

    #[test]
    fn frame_finish_reply_carries_statistics() {
        let packet = Packet::new(
            12,
            Command::FrameFinishReply {
                frame_number: 7,
                statistics: vec![StatEvent {
                    kind: StatKind::ChannelDraw,
                    resource_id: 40,
                    frame_number: 7,
                    start_time: 1_000,
                    end_time: 1_250,
                }],
            },
        );
        assert_eq!(reencode(&packet), packet);
    }

    #[test]
    fn truncated_packet_is_rejected() {
        let packet = Packet::new(
            3,
            Command::ConfigInitReply {
                result: false,
                error: "no display".to_string(),
            },
        );
        let mut writer = BitWriter::new();
        packet.ser(&mut writer);
        let bytes = writer.to_bytes();
        let mut reader = BitReader::new(&bytes[..bytes.len() - 2]);
        assert!(Packet::de(&mut reader).is_err());
    }
}
