use std::{
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    time::Duration,
};

use log::{debug, info, warn};

use lockstep_shared::{
    Command, CommandCode, CommandResult, CommandTable, FrameNumber, Monitor, ObjectId, Packet,
    ResourceKind, ResourceState, StateError, INVALID_ID,
};

use crate::config::ConfigStatistics;

/// The part of a resource that reply handlers update from the receiver
/// thread
pub struct ResourceShared {
    kind: ResourceKind,
    name: String,
    state: Monitor<ResourceState>,
    error: Mutex<String>,
    finished_frame: Monitor<FrameNumber>,
}

impl ResourceShared {
    fn new(kind: ResourceKind, name: &str) -> Self {
        Self {
            kind,
            name: name.to_string(),
            state: Monitor::new(ResourceState::Stopped),
            error: Mutex::new(String::new()),
            finished_frame: Monitor::new(0),
        }
    }

    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn state(&self) -> &Monitor<ResourceState> {
        &self.state
    }

    pub fn finished_frame(&self) -> &Monitor<FrameNumber> {
        &self.finished_frame
    }

    fn error(&self) -> MutexGuard<'_, String> {
        self.error.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Reply handlers of this resource. Handlers only store and signal, they
    /// never block the receiver thread.
    pub fn command_table(self: &Arc<Self>, statistics: Arc<ConfigStatistics>) -> CommandTable {
        let init = self.clone();
        let exit = self.clone();
        let frame = self.clone();
        CommandTable::new()
            .with_command(CommandCode::ConfigInitReply, move |packet| {
                init.handle_config_init_reply(packet)
            })
            .with_command(CommandCode::ConfigExitReply, move |packet| {
                exit.handle_config_exit_reply(packet)
            })
            .with_command(CommandCode::FrameFinishReply, move |packet| {
                frame.handle_frame_finish_reply(packet, &statistics)
            })
    }

    fn handle_config_init_reply(&self, packet: &Packet) -> CommandResult {
        let Command::ConfigInitReply { result, error } = &packet.command else {
            return CommandResult::Error("expected config init reply".to_string());
        };
        info!(
            "{} '{}' handle config init reply: {}",
            self.kind, self.name, result
        );

        // child failures may already be collected here
        if !error.is_empty() {
            self.error().push_str(error);
        }
        let state = if *result {
            ResourceState::Running
        } else {
            ResourceState::InitFailed
        };
        if let Err(current) = self.state.compare_and_set(ResourceState::Initializing, state) {
            warn!(
                "{} '{}' got config init reply in state {}",
                self.kind, self.name, current
            );
        }
        CommandResult::Handled
    }

    fn handle_config_exit_reply(&self, packet: &Packet) -> CommandResult {
        let Command::ConfigExitReply { result, error } = &packet.command else {
            return CommandResult::Error("expected config exit reply".to_string());
        };
        info!(
            "{} '{}' handle config exit reply: {}",
            self.kind, self.name, result
        );

        let state = if *result {
            ResourceState::Stopped
        } else {
            self.error().push_str(error);
            ResourceState::StopFailed
        };
        if let Err(current) = self.state.compare_and_set(ResourceState::Stopping, state) {
            warn!(
                "{} '{}' got config exit reply in state {}",
                self.kind, self.name, current
            );
        }
        CommandResult::Handled
    }

    fn handle_frame_finish_reply(
        &self,
        packet: &Packet,
        statistics: &ConfigStatistics,
    ) -> CommandResult {
        let Command::FrameFinishReply {
            frame_number,
            statistics: events,
        } = &packet.command
        else {
            return CommandResult::Error("expected frame finish reply".to_string());
        };
        debug!(
            "{} '{}' handle frame finish reply {}",
            self.kind, self.name, frame_number
        );

        statistics.record(events.iter().cloned());
        self.finished_frame.set_max(*frame_number);
        CommandResult::Handled
    }
}

/// Identity and lifecycle bookkeeping common to nodes, pipes, windows and
/// channels
pub struct ResourceCore {
    id: ObjectId,
    used: bool,
    shared: Arc<ResourceShared>,
}

impl ResourceCore {
    pub fn new(kind: ResourceKind, name: &str) -> Self {
        Self {
            id: INVALID_ID,
            used: true,
            shared: Arc::new(ResourceShared::new(kind, name)),
        }
    }

    pub fn id(&self) -> ObjectId {
        self.id
    }

    pub(crate) fn set_id(&mut self, id: ObjectId) {
        self.id = id;
    }

    pub fn kind(&self) -> ResourceKind {
        self.shared.kind
    }

    pub fn name(&self) -> &str {
        &self.shared.name
    }

    pub fn shared(&self) -> &Arc<ResourceShared> {
        &self.shared
    }

    pub fn is_used(&self) -> bool {
        self.used
    }

    pub fn set_used(&mut self, used: bool) {
        self.used = used;
    }

    pub fn state(&self) -> ResourceState {
        self.shared.state.get()
    }

    pub fn error(&self) -> String {
        self.shared.error().clone()
    }

    pub fn finished_frame(&self) -> FrameNumber {
        self.shared.finished_frame.get()
    }

    /// Appends the failure of a child as `<kind>: '<message>'`
    pub(crate) fn append_child_error(&self, kind: ResourceKind, message: &str) {
        let mut error = self.shared.error();
        error.push_str(&format!("{}: '{}'", kind, message));
    }

    pub(crate) fn clear_error(&self) {
        self.shared.error().clear();
    }

    fn invalid(&self, operation: &'static str, state: ResourceState) -> StateError {
        StateError::InvalidTransition {
            resource: self.kind().name(),
            name: self.name().to_string(),
            operation,
            state,
        }
    }

    /// `Stopped -> Initializing`
    pub(crate) fn begin_init(&self) -> Result<(), StateError> {
        self.shared
            .state
            .compare_and_set(ResourceState::Stopped, ResourceState::Initializing)
            .map_err(|state| self.invalid("start config init", state))?;
        self.clear_error();
        // frame numbers restart with every init
        self.shared.finished_frame.set(0);
        Ok(())
    }

    /// Fails an init that was started but cannot reach the remote side
    pub(crate) fn fail_init(&self, message: &str) {
        warn!("{} '{}' init failed: {}", self.kind(), self.name(), message);
        self.shared.error().push_str(message);
        let _ = self
            .shared
            .state
            .compare_and_set(ResourceState::Initializing, ResourceState::InitFailed);
    }

    /// Waits for the init reply, returns the state it left `Initializing` for
    pub(crate) fn wait_init(&self, timeout: Option<Duration>) -> ResourceState {
        let state = &self.shared.state;
        match timeout {
            None => state.wait_ne(ResourceState::Initializing),
            Some(timeout) => match state.wait_ne_timeout(ResourceState::Initializing, timeout) {
                Some(state) => state,
                None => {
                    self.fail_init("timed out waiting for config init reply");
                    state.get()
                }
            },
        }
    }

    /// `Running | InitFailed -> Stopping`
    pub(crate) fn begin_exit(&self) -> Result<(), StateError> {
        let state = &self.shared.state;
        let current = state.get();
        if !current.can_start_exit() {
            return Err(self.invalid("start config exit", current));
        }
        state
            .compare_and_set(current, ResourceState::Stopping)
            .map_err(|state| self.invalid("start config exit", state))
    }

    pub(crate) fn fail_exit(&self, message: &str) {
        warn!("{} '{}' exit failed: {}", self.kind(), self.name(), message);
        self.shared.error().push_str(message);
        let _ = self
            .shared
            .state
            .compare_and_set(ResourceState::Stopping, ResourceState::StopFailed);
    }

    /// Waits for the exit reply and settles in `Stopped`. Returns whether the
    /// remote side stopped cleanly; a failed stop is still coerced to
    /// `Stopped`.
    pub(crate) fn wait_exit(&self, timeout: Option<Duration>) -> bool {
        let state = &self.shared.state;
        let reached = match timeout {
            None => state.wait_ne(ResourceState::Stopping),
            Some(timeout) => match state.wait_ne_timeout(ResourceState::Stopping, timeout) {
                Some(state) => state,
                None => {
                    self.fail_exit("timed out waiting for config exit reply");
                    state.get()
                }
            },
        };

        let success = reached == ResourceState::Stopped;
        if !success {
            warn!(
                "{} '{}' stopped in state {}: {}",
                self.kind(),
                self.name(),
                reached,
                self.error()
            );
        }
        state.set(ResourceState::Stopped);
        success
    }

    /// Fails whichever reply this resource is waiting for
    pub(crate) fn fail_pending(&self, message: &str) {
        match self.state() {
            ResourceState::Initializing => self.fail_init(message),
            ResourceState::Stopping => self.fail_exit(message),
            _ => {}
        }
    }

    /// `update` is only valid while running
    pub(crate) fn check_running(&self, operation: &'static str) -> Result<(), StateError> {
        let state = self.state();
        if state != ResourceState::Running {
            return Err(self.invalid(operation, state));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::{sync::Arc, thread, time::Duration};

    use lockstep_shared::{
        Command, CommandCode, CommandResult, Packet, ResourceKind, ResourceState, StateError,
    };

    use super::ResourceCore;
    use crate::config::ConfigStatistics;

    #[test]
    fn init_reply_moves_state_out_of_initializing() {
        let core = ResourceCore::new(ResourceKind::Pipe, "gpu0");
        core.begin_init().unwrap();
        assert_eq!(core.state(), ResourceState::Initializing);

        let table = core
            .shared()
            .command_table(Arc::new(ConfigStatistics::new(4)));
        let reply = thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            let handler = table.handler(CommandCode::ConfigInitReply).unwrap();
            handler(&Packet::new(
                1,
                Command::ConfigInitReply {
                    result: false,
                    error: "no display".to_string(),
                },
            ))
        });

        assert_eq!(core.wait_init(None), ResourceState::InitFailed);
        assert_eq!(reply.join().unwrap(), CommandResult::Handled);
        assert_eq!(core.error(), "no display");
    }

    #[test]
    fn begin_init_requires_stopped() {
        let core = ResourceCore::new(ResourceKind::Window, "main");
        core.begin_init().unwrap();
        assert_eq!(
            core.begin_init(),
            Err(StateError::InvalidTransition {
                resource: "window",
                name: "main".to_string(),
                operation: "start config init",
                state: ResourceState::Initializing,
            })
        );
    }

    #[test]
    fn failed_exit_is_coerced_to_stopped() {
        let core = ResourceCore::new(ResourceKind::Channel, "left");
        core.begin_init().unwrap();
        core.shared().state().set(ResourceState::Running);
        core.begin_exit().unwrap();
        core.fail_exit("gpu lost");

        assert!(!core.wait_exit(None));
        assert_eq!(core.state(), ResourceState::Stopped);
    }

    #[test]
    fn begin_init_restarts_finished_frame() {
        let core = ResourceCore::new(ResourceKind::Node, "render");
        core.shared().finished_frame().set_max(9);
        assert_eq!(core.finished_frame(), 9);

        core.begin_init().unwrap();
        assert_eq!(core.finished_frame(), 0);
    }

    #[test]
    fn init_wait_times_out_into_failure() {
        let core = ResourceCore::new(ResourceKind::Node, "render");
        core.begin_init().unwrap();
        assert_eq!(
            core.wait_init(Some(Duration::from_millis(10))),
            ResourceState::InitFailed
        );
        assert!(core.error().contains("timed out"));
    }
}
