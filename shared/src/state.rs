use std::fmt;

use thiserror::Error;

/// Lifecycle of a cluster resource.
///
/// ```text
/// Stopped -> Initializing -> Running -> Stopping -> Stopped
///                 |                         |
///                 v                         v
///             InitFailed                StopFailed -> Stopped
/// ```
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Default)]
pub enum ResourceState {
    #[default]
    Stopped,
    Initializing,
    InitFailed,
    Running,
    Stopping,
    StopFailed,
}

impl ResourceState {
    pub fn name(&self) -> &'static str {
        match self {
            ResourceState::Stopped => "stopped",
            ResourceState::Initializing => "initializing",
            ResourceState::InitFailed => "init failed",
            ResourceState::Running => "running",
            ResourceState::Stopping => "stopping",
            ResourceState::StopFailed => "stop failed",
        }
    }

    pub fn can_start_init(&self) -> bool {
        *self == ResourceState::Stopped
    }

    pub fn can_start_exit(&self) -> bool {
        matches!(self, ResourceState::Running | ResourceState::InitFailed)
    }

    /// Whether a reply is still outstanding for this resource
    pub fn is_pending(&self) -> bool {
        matches!(self, ResourceState::Initializing | ResourceState::Stopping)
    }
}

impl fmt::Display for ResourceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Level of a resource in the cluster tree
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Node,
    Pipe,
    Window,
    Channel,
}

impl ResourceKind {
    pub fn name(&self) -> &'static str {
        match self {
            ResourceKind::Node => "node",
            ResourceKind::Pipe => "pipe",
            ResourceKind::Window => "window",
            ResourceKind::Channel => "channel",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A lifecycle operation was called from a state that does not allow it.
/// This is a programming error on the caller's side.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StateError {
    #[error("cannot {operation} {resource} '{name}' in state {state}")]
    InvalidTransition {
        resource: &'static str,
        name: String,
        operation: &'static str,
        state: ResourceState,
    },
}

#[cfg(test)]
mod tests {
    use super::ResourceState;

    #[test]
    fn only_stopped_can_start_init() {
        for state in [
            ResourceState::Initializing,
            ResourceState::InitFailed,
            ResourceState::Running,
            ResourceState::Stopping,
            ResourceState::StopFailed,
        ] {
            assert!(!state.can_start_init(), "{state} must not start init");
        }
        assert!(ResourceState::Stopped.can_start_init());
    }

    #[test]
    fn exit_allowed_from_running_and_init_failed() {
        assert!(ResourceState::Running.can_start_exit());
        assert!(ResourceState::InitFailed.can_start_exit());
        assert!(!ResourceState::Stopped.can_start_exit());
        assert!(!ResourceState::Stopping.can_start_exit());
    }
}
