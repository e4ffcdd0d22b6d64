use std::{
    collections::HashMap,
    sync::{
        mpsc::{channel, Receiver, Sender},
        Arc, Mutex, MutexGuard, PoisonError,
    },
};

use lockstep_client::{NodeDelegate, ResourceRef};
use lockstep_shared::{FrameId, FrameNumber, InitId, ResourceKind};

/// One task a render node executed
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Task {
    ConfigInit {
        kind: ResourceKind,
        name: String,
    },
    ConfigExit {
        kind: ResourceKind,
        name: String,
    },
    FrameStart {
        kind: ResourceKind,
        name: String,
        frame_number: FrameNumber,
    },
    FrameFinish {
        kind: ResourceKind,
        name: String,
        frame_number: FrameNumber,
    },
}

impl Task {
    pub fn name(&self) -> &str {
        match self {
            Task::ConfigInit { name, .. }
            | Task::ConfigExit { name, .. }
            | Task::FrameStart { name, .. }
            | Task::FrameFinish { name, .. } => name,
        }
    }
}

/// Tasks recorded by a delegate, readable while its render node runs on
/// another thread
#[derive(Clone, Default)]
pub struct TaskLog(Arc<Mutex<Vec<Task>>>);

impl TaskLog {
    fn lock(&self) -> MutexGuard<'_, Vec<Task>> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn push(&self, task: Task) {
        self.lock().push(task);
    }

    pub fn tasks(&self) -> Vec<Task> {
        self.lock().clone()
    }

    /// Frame numbers started on the resource called `name`
    pub fn frame_starts(&self, name: &str) -> Vec<FrameNumber> {
        self.lock()
            .iter()
            .filter_map(|task| match task {
                Task::FrameStart {
                    name: started,
                    frame_number,
                    ..
                } if started == name => Some(*frame_number),
                _ => None,
            })
            .collect()
    }

    pub fn mentions(&self, name: &str) -> bool {
        self.lock().iter().any(|task| task.name() == name)
    }
}

/// Render node delegate that records every task and fails the inits it was
/// told to fail
pub struct RecordingDelegate {
    log: TaskLog,
    init_failures: HashMap<String, String>,
    node_init_gate: Option<Receiver<()>>,
}

impl Default for RecordingDelegate {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordingDelegate {
    pub fn new() -> Self {
        Self {
            log: TaskLog::default(),
            init_failures: HashMap::new(),
            node_init_gate: None,
        }
    }

    /// Makes the init of the resource called `name` fail with `message`
    pub fn fail_init(mut self, name: &str, message: &str) -> Self {
        self.init_failures
            .insert(name.to_string(), message.to_string());
        self
    }

    /// Holds the node's init task until the returned sender fires, so the
    /// server side can be inspected before any reply exists
    pub fn gate_node_init(mut self) -> (Self, Sender<()>) {
        let (sender, receiver) = channel();
        self.node_init_gate = Some(receiver);
        (self, sender)
    }

    pub fn log(&self) -> TaskLog {
        self.log.clone()
    }
}

impl NodeDelegate for RecordingDelegate {
    fn config_init(&mut self, resource: ResourceRef<'_>, _init_id: InitId) -> Result<(), String> {
        if resource.kind == ResourceKind::Node {
            if let Some(gate) = self.node_init_gate.take() {
                // a dropped sender opens the gate as well
                let _ = gate.recv();
            }
        }
        self.log.push(Task::ConfigInit {
            kind: resource.kind,
            name: resource.name.to_string(),
        });
        match self.init_failures.get(resource.name) {
            Some(message) => Err(message.clone()),
            None => Ok(()),
        }
    }

    fn config_exit(&mut self, resource: ResourceRef<'_>) -> Result<(), String> {
        self.log.push(Task::ConfigExit {
            kind: resource.kind,
            name: resource.name.to_string(),
        });
        Ok(())
    }

    fn frame_start(&mut self, resource: ResourceRef<'_>, _: FrameId, frame_number: FrameNumber) {
        self.log.push(Task::FrameStart {
            kind: resource.kind,
            name: resource.name.to_string(),
            frame_number,
        });
    }

    fn frame_finish(&mut self, resource: ResourceRef<'_>, _: FrameId, frame_number: FrameNumber) {
        self.log.push(Task::FrameFinish {
            kind: resource.kind,
            name: resource.name.to_string(),
            frame_number,
        });
    }
}
