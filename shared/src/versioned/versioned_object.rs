use std::ops::Deref;

use log::trace;

use lockstep_serde::BitWriter;

use crate::types::{ObjectId, ObjectVersion, INVALID_ID, VERSION_NONE};

use super::{dirty_mask::DirtyMask, object_delta::ObjectDelta, serializable::Serializable};

/// Master instance of a replicated object.
///
/// Mutations go through the wrapped value's setters, which mark dirty bits;
/// `commit` turns the pending bits into the next version's delta.
pub struct VersionedObject<T: Serializable> {
    object_id: ObjectId,
    version: ObjectVersion,
    inner: T,
}

impl<T: Serializable> VersionedObject<T> {
    pub fn new(inner: T) -> Self {
        Self {
            object_id: INVALID_ID,
            version: VERSION_NONE,
            inner,
        }
    }

    pub fn id(&self) -> ObjectId {
        self.object_id
    }

    pub fn is_attached(&self) -> bool {
        self.object_id != INVALID_ID
    }

    /// Binds this instance to the id handed out by the session registry
    pub fn attach(&mut self, object_id: ObjectId) {
        self.object_id = object_id;
    }

    pub fn detach(&mut self) {
        self.object_id = INVALID_ID;
    }

    pub fn version(&self) -> ObjectVersion {
        self.version
    }

    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    pub fn into_inner(self) -> T {
        self.inner
    }

    /// Packs the pending changes into a new version. Returns `None` and keeps
    /// the version when nothing changed since the last commit.
    pub fn commit(&mut self) -> Option<ObjectDelta> {
        let dirty = self.inner.dirty_tracker().take();
        if dirty.is_clear() {
            return None;
        }
        Some(self.pack(dirty, false))
    }

    /// Packs every field of the object into a new version, for slaves that
    /// join without any previous state
    pub fn commit_instance(&mut self) -> ObjectDelta {
        self.inner.dirty_tracker().clear();
        self.pack(T::LAYOUT.all_bits(), true)
    }

    fn pack(&mut self, dirty: DirtyMask, instance: bool) -> ObjectDelta {
        let mut writer = BitWriter::new();
        self.inner.serialize(&mut writer, dirty);
        self.version += 1;

        trace!(
            "commit {} {} v{} dirty {:?}",
            T::LAYOUT.name(),
            self.object_id,
            self.version,
            dirty
        );

        ObjectDelta {
            object_id: self.object_id,
            version: self.version,
            instance,
            dirty,
            payload: writer.to_bytes(),
        }
    }
}

impl<T: Serializable> Deref for VersionedObject<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.inner
    }
}
