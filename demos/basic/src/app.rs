use std::{
    collections::VecDeque,
    sync::{Arc, Mutex, PoisonError},
    thread::JoinHandle,
    time::Duration,
};

use glam::Vec3;
use log::{info, warn};

use lockstep_client::{
    event::{EventSource, EventTranslator, RemoteEvent, RemoteEventKind},
    ClientConfig, ClientError, ClientNode, NodeDelegate, ResourceRef, ViewData,
};
use lockstep_server::{Channel, Config, Node, Pipe, Resource, ServerConfig, ServerError, Window};
use lockstep_shared::{
    Connection, FrameId, FrameNumber, InitId, LocalConnection, ObjectSlave, ResourceKind,
    VersionedObject,
};

const SPIN_FRAMES: usize = 60;

type RenderThread = JoinHandle<Result<ClientNode<DemoRenderer>, ClientError>>;

/// Render node tasks of the demo. Nothing is drawn, the channel reports
/// the model matrix it would have used.
pub struct DemoRenderer {
    view: Option<Arc<Mutex<ObjectSlave<ViewData>>>>,
}

impl NodeDelegate for DemoRenderer {
    fn config_init(&mut self, resource: ResourceRef<'_>, init_id: InitId) -> Result<(), String> {
        info!("{} '{}' init {}", resource.kind, resource.name, init_id);
        Ok(())
    }

    fn frame_start(&mut self, resource: ResourceRef<'_>, _: FrameId, frame_number: FrameNumber) {
        if resource.kind != ResourceKind::Channel {
            return;
        }
        if let Some(view) = &self.view {
            let view = view.lock().unwrap_or_else(PoisonError::into_inner);
            let translation = view.model_matrix().w_axis;
            info!(
                "channel '{}' draws frame {} at ({:.2}, {:.2}, {:.2})",
                resource.name, frame_number, translation.x, translation.y, translation.z
            );
        }
    }
}

/// A scripted user: drags the model, lets it spin for a while, zooms out
/// and closes the window. Each `process_events` call sees one step.
struct ScriptedInput {
    steps: VecDeque<Vec<RemoteEvent>>,
    current: VecDeque<RemoteEvent>,
}

impl ScriptedInput {
    fn new() -> Self {
        let mut steps = VecDeque::new();

        let mut press = RemoteEvent::new(RemoteEventKind::Press);
        press.mouse_left = true;
        press.mouse_x = 0.5;
        press.mouse_y = 0.5;
        steps.push_back(vec![press]);

        for step in 1..=10 {
            let mut drag = RemoteEvent::new(RemoteEventKind::Move);
            drag.mouse_left = true;
            drag.mouse_x = 0.5 + 0.01 * step as f32;
            drag.mouse_y = 0.5;
            steps.push_back(vec![drag]);
        }

        let mut release = RemoteEvent::new(RemoteEventKind::Release);
        release.mouse_x = 0.6;
        release.mouse_y = 0.5;
        steps.push_back(vec![release]);

        for _ in 0..SPIN_FRAMES {
            steps.push_back(Vec::new());
        }

        let mut wheel = RemoteEvent::new(RemoteEventKind::Wheel);
        wheel.dy = -120.0;
        steps.push_back(vec![wheel]);
        steps.push_back(vec![RemoteEvent::new(RemoteEventKind::Close)]);

        Self {
            steps,
            current: VecDeque::new(),
        }
    }
}

impl EventSource for ScriptedInput {
    fn next_event(&mut self) -> Option<RemoteEvent> {
        if let Some(event) = self.current.pop_front() {
            return Some(event);
        }
        // an exhausted step ends this poll, the next poll starts the next step
        if let Some(step) = self.steps.pop_front() {
            self.current = step.into();
        }
        None
    }
}

pub struct App {
    config: Config,
    view: VersionedObject<ViewData>,
    input: EventTranslator,
    render_thread: Option<RenderThread>,
}

impl App {
    pub fn new() -> Result<Self, ServerError> {
        info!("Basic Lockstep Demo started");

        let server_config = ServerConfig {
            sync_timeout: Some(Duration::from_secs(10)),
            frame_timeout: Some(Duration::from_secs(10)),
            ..ServerConfig::default()
        };
        let mut config = Config::new("basic", server_config);

        let mut view = VersionedObject::new(ViewData::new());
        view.get_mut().set_model_bounding(Vec3::ZERO, 1.0);
        view.get_mut().reset_model_position();
        let view_id = config.register_object(&mut view)?;

        let (server_end, render_end) = LocalConnection::pair("basic");
        let mut node = Node::new("render").with_pipe(
            Pipe::new("gpu0").with_window(
                Window::new("main")
                    .with_channel(Channel::new("left"))
                    .with_channel(Channel::new("right")),
            ),
        );
        node.connect(Arc::new(server_end));
        config.add_node(node);

        let mut renderer = ClientNode::new(
            ClientConfig::default(),
            Arc::new(render_end),
            DemoRenderer { view: None },
        );
        match renderer.map_object(ObjectSlave::new(view_id, ViewData::new())) {
            Ok(slave) => renderer.delegate_mut().view = Some(slave),
            Err(error) => warn!("view data not mapped: {}", error),
        }
        let render_thread = renderer.spawn();

        if !config.init(1) {
            warn!("config init failed: {}", config.error());
        }

        Ok(App {
            config,
            view,
            input: EventTranslator::new(Box::new(ScriptedInput::new()), 1920, 1080),
            render_thread: Some(render_thread),
        })
    }

    /// Runs one frame. Returns false once the config stopped running or the
    /// user closed the window.
    pub fn update(&mut self, frame_id: FrameId) -> bool {
        if !self.config.is_running() {
            return false;
        }

        for event in self.input.process_events() {
            self.view.get_mut().handle_event(&event);
        }
        self.view.get_mut().update();
        self.config.distribute(&mut self.view);

        let frame_number = self.config.start_frame(frame_id);
        if let Err(error) = self.config.finish_frame() {
            warn!("frame {}: {}", frame_number, error);
            return false;
        }

        let node = &self.config.nodes()[0];
        info!(
            "frame {} started, {} finished on '{}'",
            frame_number,
            node.finished_frame(),
            node.name()
        );
        self.input.is_running()
    }

    pub fn shutdown(mut self) {
        if let Err(error) = self.config.finish_all_frames() {
            warn!("{}", error);
        }
        if !self.config.exit() {
            warn!("config exit was not clean");
        }

        for node in self.config.nodes() {
            if let Some(connection) = node.connection() {
                connection.close();
            }
        }
        if let Some(thread) = self.render_thread.take() {
            match thread.join() {
                Ok(Ok(renderer)) => info!(
                    "render node stopped after {} resources",
                    renderer.resource_ids(ResourceKind::Channel).len()
                ),
                Ok(Err(error)) => warn!("render node failed: {}", error),
                Err(_) => warn!("render node panicked"),
            }
        }
    }
}
