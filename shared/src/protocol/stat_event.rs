use lockstep_serde::{BitReader, BitWrite, Serde, SerdeErr, UnsignedInteger};

use crate::types::{FrameNumber, ObjectId};

/// What a statistics sample measured
#[derive(Copy, Debug, Clone, Eq, PartialEq, Hash)]
pub enum StatKind {
    ChannelClear,
    ChannelDraw,
    ChannelAssemble,
    ChannelReadback,
    WindowFinish,
    WindowSwap,
    PipeIdle,
    NodeFrameFinish,
    ConfigStartFrame,
    ConfigFinishFrame,
    ConfigWaitFinishFrame,
}

const STAT_KINDS: [StatKind; 11] = [
    StatKind::ChannelClear,
    StatKind::ChannelDraw,
    StatKind::ChannelAssemble,
    StatKind::ChannelReadback,
    StatKind::WindowFinish,
    StatKind::WindowSwap,
    StatKind::PipeIdle,
    StatKind::NodeFrameFinish,
    StatKind::ConfigStartFrame,
    StatKind::ConfigFinishFrame,
    StatKind::ConfigWaitFinishFrame,
];

impl StatKind {
    pub fn name(&self) -> &'static str {
        match self {
            StatKind::ChannelClear => "channel clear",
            StatKind::ChannelDraw => "channel draw",
            StatKind::ChannelAssemble => "channel assemble",
            StatKind::ChannelReadback => "channel readback",
            StatKind::WindowFinish => "window finish",
            StatKind::WindowSwap => "window swap",
            StatKind::PipeIdle => "pipe idle",
            StatKind::NodeFrameFinish => "node frame finish",
            StatKind::ConfigStartFrame => "config start frame",
            StatKind::ConfigFinishFrame => "config finish frame",
            StatKind::ConfigWaitFinishFrame => "config wait finish frame",
        }
    }
}

impl Serde for StatKind {
    fn ser(&self, writer: &mut dyn BitWrite) {
        let index = STAT_KINDS
            .iter()
            .position(|kind| kind == self)
            .unwrap_or_default();
        UnsignedInteger::<4>::new(index as u64).ser(writer);
    }

    fn de(reader: &mut BitReader) -> Result<Self, SerdeErr> {
        let index = UnsignedInteger::<4>::de(reader)?.to::<usize>()?;
        STAT_KINDS.get(index).copied().ok_or(SerdeErr)
    }
}

/// One timed sample of a resource task, in microseconds since the render
/// node's clock started
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StatEvent {
    pub kind: StatKind,
    pub resource_id: ObjectId,
    pub frame_number: FrameNumber,
    pub start_time: u64,
    pub end_time: u64,
}

impl StatEvent {
    pub fn duration(&self) -> u64 {
        self.end_time.saturating_sub(self.start_time)
    }
}

impl Serde for StatEvent {
    fn ser(&self, writer: &mut dyn BitWrite) {
        self.kind.ser(writer);
        self.resource_id.ser(writer);
        self.frame_number.ser(writer);
        self.start_time.ser(writer);
        self.end_time.ser(writer);
    }

    fn de(reader: &mut BitReader) -> Result<Self, SerdeErr> {
        Ok(Self {
            kind: StatKind::de(reader)?,
            resource_id: ObjectId::de(reader)?,
            frame_number: FrameNumber::de(reader)?,
            start_time: u64::de(reader)?,
            end_time: u64::de(reader)?,
        })
    }
}
