use thiserror::Error;

use lockstep_shared::{ConnectionError, DispatchError, FrameNumber, SessionError, StateError};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ServerError {
    #[error(transparent)]
    State(#[from] StateError),

    #[error("session: {0}")]
    Session(#[from] SessionError),

    #[error("dispatcher: {0}")]
    Dispatch(#[from] DispatchError),

    #[error("connection: {0}")]
    Connection(#[from] ConnectionError),

    #[error("node '{node}' has no connection")]
    NotConnected { node: String },

    #[error("frame {frame_number} did not finish within the frame timeout")]
    FrameTimeout { frame_number: FrameNumber },
}
