/// Integration tests for the init, frame and exit sequences of a resource
/// tree driven against real render nodes.

use lockstep_server::{Channel, Node, Pipe, Resource, Window};
use lockstep_shared::{ResourceKind, ResourceState, INVALID_ID};
use lockstep_test::{test_server_config, RecordingDelegate, Task, TestCluster};

fn single_pipe_node() -> Node {
    Node::new("node").with_pipe(
        Pipe::new("pipe").with_window(Window::new("window").with_channel(Channel::new("channel"))),
    )
}

// ========== Init Tests ==========

#[test]
fn start_init_is_pending_until_sync_returns() {
    let mut cluster = TestCluster::new(test_server_config());
    let (delegate, gate) = RecordingDelegate::new().gate_node_init();
    cluster.add_node(single_pipe_node(), delegate);

    cluster.config.try_start_init(1).unwrap();
    let node = cluster.node(0);
    assert_eq!(node.state(), ResourceState::Initializing);
    assert_eq!(node.pipes()[0].state(), ResourceState::Initializing);
    assert_eq!(
        node.pipes()[0].windows()[0].channels()[0].state(),
        ResourceState::Initializing
    );

    gate.send(()).unwrap();
    let success = cluster.config.sync_init();

    let node = cluster.node(0);
    assert_ne!(node.state(), ResourceState::Initializing);
    assert_eq!(success, node.state() == ResourceState::Running);
    assert!(success);
    assert!(cluster.config.is_running());

    assert!(cluster.config.exit());
    cluster.shutdown();
}

#[test]
fn failing_child_fails_parent_with_its_message_only() {
    let mut cluster = TestCluster::new(test_server_config());
    let window = Window::new("window")
        .with_channel(Channel::new("left"))
        .with_channel(Channel::new("broken"))
        .with_channel(Channel::new("right"));
    let delegate = RecordingDelegate::new().fail_init("broken", "no framebuffer");
    cluster.add_node(
        Node::new("node").with_pipe(Pipe::new("pipe").with_window(window)),
        delegate,
    );

    assert!(!cluster.config.init(1));

    let window = &cluster.node(0).pipes()[0].windows()[0];
    let channels = window.channels();
    assert_eq!(channels[0].state(), ResourceState::Running);
    assert_eq!(channels[1].state(), ResourceState::InitFailed);
    assert_eq!(channels[2].state(), ResourceState::Running);

    assert_eq!(channels[1].error(), "no framebuffer");
    assert_eq!(window.error(), "channel: 'no framebuffer'");
    assert!(cluster.config.error().contains("no framebuffer"));

    // a failed init still has to be torn down
    assert!(cluster.config.exit());
    assert_eq!(cluster.node(0).state(), ResourceState::Stopped);
    cluster.shutdown();
}

// ========== Frame Tests ==========

#[test]
fn unused_pipe_gets_no_frames_and_exits_cleanly() {
    let mut cluster = TestCluster::new(test_server_config());
    let mut idle = Pipe::new("idle")
        .with_window(Window::new("idle window").with_channel(Channel::new("idle channel")));
    idle.set_used(false);
    let node = Node::new("node")
        .with_pipe(
            Pipe::new("active")
                .with_window(Window::new("window").with_channel(Channel::new("channel"))),
        )
        .with_pipe(idle);
    let delegate = RecordingDelegate::new();
    let log = delegate.log();
    cluster.add_node(node, delegate);

    assert!(cluster.config.init(1));
    for frame_id in 1..=7 {
        let frame_number = cluster.config.start_frame(frame_id);
        assert_eq!(frame_number, frame_id);
        cluster.config.finish_frame().unwrap();
    }
    cluster.config.finish_all_frames().unwrap();

    assert_eq!(log.frame_starts("active"), (1..=7).collect::<Vec<_>>());
    assert!(log.frame_starts("idle").is_empty());
    assert!(!log.mentions("idle window"));

    assert!(cluster.config.exit());
    let idle = &cluster.node(0).pipes()[1];
    assert_eq!(idle.state(), ResourceState::Stopped);
    assert_eq!(idle.id(), INVALID_ID);
    assert!(idle.error().is_empty());

    let tasks = log.tasks();
    assert!(tasks.contains(&Task::ConfigExit {
        kind: ResourceKind::Pipe,
        name: "active".to_string(),
    }));
    cluster.shutdown();
}

#[test]
fn pipe_unused_after_init_stops_getting_frames_but_is_torn_down() {
    let mut cluster = TestCluster::new(test_server_config());
    let node = Node::new("node")
        .with_pipe(
            Pipe::new("active")
                .with_window(Window::new("window").with_channel(Channel::new("channel"))),
        )
        .with_pipe(
            Pipe::new("spare")
                .with_window(Window::new("spare window").with_channel(Channel::new("spare channel"))),
        );
    let delegate = RecordingDelegate::new();
    let log = delegate.log();
    cluster.add_node(node, delegate);

    assert!(cluster.config.init(1));
    for frame_id in 1..=3 {
        cluster.config.start_frame(frame_id);
        cluster.config.finish_frame().unwrap();
    }
    cluster.node_mut(0).pipes_mut()[1].set_used(false);
    for frame_id in 4..=7 {
        cluster.config.start_frame(frame_id);
        cluster.config.finish_frame().unwrap();
    }
    cluster.config.finish_all_frames().unwrap();

    assert_eq!(log.frame_starts("active"), (1..=7).collect::<Vec<_>>());
    assert_eq!(log.frame_starts("spare"), vec![1, 2, 3]);
    assert_eq!(log.frame_starts("spare channel"), vec![1, 2, 3]);

    assert!(cluster.config.exit());
    let spare = &cluster.node(0).pipes()[1];
    assert_eq!(spare.state(), ResourceState::Stopped);
    assert_eq!(spare.id(), INVALID_ID);
    assert_eq!(spare.windows()[0].channels()[0].id(), INVALID_ID);
    assert!(log.tasks().contains(&Task::ConfigExit {
        kind: ResourceKind::Pipe,
        name: "spare".to_string(),
    }));
    assert!(cluster.config.session().registry().is_empty());

    let render_nodes = cluster.shutdown();
    assert!(render_nodes[0].resource_ids(ResourceKind::Pipe).is_empty());
    assert!(render_nodes[0].resource_ids(ResourceKind::Window).is_empty());
    assert!(render_nodes[0].resource_ids(ResourceKind::Channel).is_empty());
}

// ========== Exit Tests ==========

#[test]
fn exit_destroys_render_node_mirrors() {
    let mut cluster = TestCluster::new(test_server_config());
    cluster.add_node(single_pipe_node(), RecordingDelegate::new());

    assert!(cluster.config.init(1));
    assert!(cluster.config.exit());
    assert!(cluster.config.session().registry().is_empty());

    let render_nodes = cluster.shutdown();
    let render_node = &render_nodes[0];
    assert!(render_node.resource_ids(ResourceKind::Pipe).is_empty());
    assert!(render_node.resource_ids(ResourceKind::Channel).is_empty());
}

#[test]
fn config_runs_again_after_exit() {
    let mut cluster = TestCluster::new(test_server_config());
    let delegate = RecordingDelegate::new();
    let log = delegate.log();
    cluster.add_node(single_pipe_node(), delegate);

    assert!(cluster.config.init(1));
    let first_id = cluster.node(0).id();
    for frame_id in 1..=3 {
        cluster.config.start_frame(frame_id);
    }
    assert_eq!(cluster.config.finish_all_frames(), Ok(3));
    assert!(cluster.config.exit());

    assert!(cluster.config.init(2));
    let second_id = cluster.node(0).id();
    assert_ne!(second_id, first_id);
    assert_eq!(cluster.node(0).finished_frame(), 0);
    assert_eq!(cluster.config.current_frame(), 0);

    for frame_id in 1..=3 {
        assert_eq!(cluster.config.start_frame(frame_id), frame_id);
        assert_eq!(cluster.config.finish_frame(), Ok(frame_id - 1));
    }
    assert_eq!(cluster.config.finish_all_frames(), Ok(3));
    assert_eq!(cluster.node(0).finished_frame(), 3);
    assert_eq!(log.frame_starts("channel"), vec![1, 2, 3, 1, 2, 3]);

    assert!(cluster.config.exit());
    let render_nodes = cluster.shutdown();
    assert_eq!(render_nodes[0].node_id(), second_id);
    assert!(render_nodes[0].resource_ids(ResourceKind::Pipe).is_empty());
}
