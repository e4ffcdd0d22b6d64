use lockstep_shared::{ObjectDelta, ObjectId, ObjectSlave, ReplicationError, Serializable};

/// A slave instance the render node feeds with object deltas, independent
/// of its concrete type
pub trait Replica: Send {
    fn object_id(&self) -> ObjectId;

    fn apply(&mut self, delta: &ObjectDelta) -> Result<bool, ReplicationError>;
}

impl<T: Serializable> Replica for ObjectSlave<T> {
    fn object_id(&self) -> ObjectId {
        self.id()
    }

    fn apply(&mut self, delta: &ObjectDelta) -> Result<bool, ReplicationError> {
        ObjectSlave::apply(self, delta)
    }
}
