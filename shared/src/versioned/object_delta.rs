use lockstep_serde::{BitReader, BitWrite, Serde, SerdeErr, UnsignedVariableInteger};

use crate::types::{ObjectId, ObjectVersion};

use super::dirty_mask::DirtyMask;

/// The changed fields of one object version, as sent to its slaves
#[derive(Clone, Debug, PartialEq)]
pub struct ObjectDelta {
    pub object_id: ObjectId,
    pub version: ObjectVersion,
    /// Full snapshot rather than a change relative to `version - 1`
    pub instance: bool,
    pub dirty: DirtyMask,
    pub payload: Vec<u8>,
}

impl Serde for ObjectDelta {
    fn ser(&self, writer: &mut dyn BitWrite) {
        self.object_id.ser(writer);
        UnsignedVariableInteger::<7>::new(self.version).ser(writer);
        self.instance.ser(writer);
        self.dirty.ser(writer);
        self.payload.ser(writer);
    }

    fn de(reader: &mut BitReader) -> Result<Self, SerdeErr> {
        let object_id = ObjectId::de(reader)?;
        let version = UnsignedVariableInteger::<7>::de(reader)?.to::<ObjectVersion>()?;
        let instance = bool::de(reader)?;
        let dirty = DirtyMask::de(reader)?;
        let payload = Vec::<u8>::de(reader)?;
        Ok(Self {
            object_id,
            version,
            instance,
            dirty,
            payload,
        })
    }
}
