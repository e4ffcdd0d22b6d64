use thiserror::Error;

use lockstep_shared::{
    CommandCode, ConnectionError, ObjectId, ReplicationError, ResourceKind, SerdeErr,
};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientError {
    #[error("malformed command batch")]
    Decode(#[from] SerdeErr),

    #[error("connection: {0}")]
    Connection(#[from] ConnectionError),

    #[error("replication: {0}")]
    Replication(#[from] ReplicationError),

    #[error("no resource with id {target}")]
    UnknownResource { target: ObjectId },

    #[error("{kind} {target} cannot handle {code:?}")]
    UnexpectedCommand {
        kind: ResourceKind,
        target: ObjectId,
        code: CommandCode,
    },

    #[error("resource {id} already exists")]
    DuplicateResource { id: ObjectId },

    #[error("config instance data is malformed: {reason}")]
    MalformedConfig { reason: &'static str },
}
