use std::ops::Deref;

use log::{debug, warn};

use lockstep_serde::{BitReader, BitWriter};

use crate::types::{ObjectId, ObjectVersion, VERSION_NONE};

use super::{error::ReplicationError, object_delta::ObjectDelta, serializable::Serializable};

/// Read-only replica of a master `VersionedObject` on another process
pub struct ObjectSlave<T: Serializable> {
    object_id: ObjectId,
    version: ObjectVersion,
    inner: T,
}

impl<T: Serializable> ObjectSlave<T> {
    pub fn new(object_id: ObjectId, inner: T) -> Self {
        Self {
            object_id,
            version: VERSION_NONE,
            inner,
        }
    }

    pub fn id(&self) -> ObjectId {
        self.object_id
    }

    pub fn version(&self) -> ObjectVersion {
        self.version
    }

    /// Applies the next version of the master. Returns `Ok(false)` for a
    /// version that was already applied. A delta must follow the current
    /// version directly; a full instance may skip ahead. A delta that fails
    /// to decode leaves the replica as it was.
    pub fn apply(&mut self, delta: &ObjectDelta) -> Result<bool, ReplicationError> {
        if delta.object_id != self.object_id {
            return Err(ReplicationError::WrongObject {
                expected: self.object_id,
                received: delta.object_id,
            });
        }

        if delta.version <= self.version {
            debug!(
                "{} {} ignores stale v{} at v{}",
                T::LAYOUT.name(),
                self.object_id,
                delta.version,
                self.version
            );
            return Ok(false);
        }

        if !delta.instance && delta.version != self.version + 1 {
            warn!(
                "{} {} missed versions between v{} and v{}",
                T::LAYOUT.name(),
                self.object_id,
                self.version,
                delta.version
            );
            return Err(ReplicationError::VersionGap {
                object_id: self.object_id,
                current: self.version,
                received: delta.version,
            });
        }

        if !T::LAYOUT.covers(delta.dirty) {
            return Err(ReplicationError::UnknownBits {
                object_id: self.object_id,
                bits: delta.dirty.without(T::LAYOUT.all_bits()),
            });
        }

        // the fields the delta touches, as they are now
        let mut backup = BitWriter::new();
        self.inner.serialize(&mut backup, delta.dirty);
        let backup = backup.to_bytes();

        let mut reader = BitReader::new(&delta.payload);
        if let Err(source) = self.inner.deserialize(&mut reader, delta.dirty) {
            let mut reader = BitReader::new(&backup);
            if self.inner.deserialize(&mut reader, delta.dirty).is_err() {
                warn!(
                    "{} {} could not restore v{}",
                    T::LAYOUT.name(),
                    self.object_id,
                    self.version
                );
            }
            return Err(ReplicationError::Decode {
                object_id: self.object_id,
                source,
            });
        }
        self.version = delta.version;
        Ok(true)
    }

    pub fn into_inner(self) -> T {
        self.inner
    }
}

impl<T: Serializable> Deref for ObjectSlave<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.inner
    }
}
