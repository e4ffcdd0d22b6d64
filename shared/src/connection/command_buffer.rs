use log::trace;

use lockstep_serde::{BitReader, BitWriter, Serde, SerdeErr, UnsignedVariableInteger};

use crate::{
    protocol::{Command, Packet},
    types::ObjectId,
};

use super::{connection::Connection, error::ConnectionError};

/// Commands queued for one connection, flushed as a single send
#[derive(Default)]
pub struct CommandBuffer {
    packets: Vec<Packet>,
}

impl CommandBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, target: ObjectId, command: Command) {
        trace!("TASK {} {}", command.code().name(), target);
        self.packets.push(Packet::new(target, command));
    }

    pub fn len(&self) -> usize {
        self.packets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packets.is_empty()
    }

    pub fn packets(&self) -> &[Packet] {
        &self.packets
    }

    pub fn clear(&mut self) {
        self.packets.clear();
    }

    /// Sends every queued command in one unit and empties the buffer. The
    /// commands are dropped even when the send fails.
    pub fn send_buffer(&mut self, connection: &dyn Connection) -> Result<(), ConnectionError> {
        if self.packets.is_empty() {
            return Ok(());
        }
        let bytes = encode_batch(&self.packets);
        self.packets.clear();
        connection.send(&bytes)
    }
}

pub fn encode_batch(packets: &[Packet]) -> Vec<u8> {
    let mut writer = BitWriter::new();
    UnsignedVariableInteger::<7>::new(packets.len() as u64).ser(&mut writer);
    for packet in packets {
        packet.ser(&mut writer);
    }
    writer.to_bytes()
}

pub fn decode_batch(bytes: &[u8]) -> Result<Vec<Packet>, SerdeErr> {
    let mut reader = BitReader::new(bytes);
    let count = UnsignedVariableInteger::<7>::de(&mut reader)?.to::<usize>()?;
    // each packet needs at least a target id and an opcode
    if count > reader.bits_remaining() / 36 {
        return Err(SerdeErr);
    }
    let mut packets = Vec::with_capacity(count);
    for _ in 0..count {
        packets.push(Packet::de(&mut reader)?);
    }
    Ok(packets)
}
