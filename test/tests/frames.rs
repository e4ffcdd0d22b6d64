/// Integration tests for frame pacing and the statistics render nodes
/// report with their frame finish replies

use lockstep_server::{Channel, Node, Pipe, Resource, ServerConfig, Window};
use lockstep_shared::{ResourceKind, StatKind};
use lockstep_test::{test_server_config, RecordingDelegate, Task, TestCluster};

fn render_tree(node: &str) -> Node {
    Node::new(node).with_pipe(
        Pipe::new("pipe").with_window(Window::new("window").with_channel(Channel::new("channel"))),
    )
}

// ========== Statistics Tests ==========

#[test]
fn finished_frame_carries_render_statistics() {
    let mut cluster = TestCluster::new(test_server_config());
    cluster.add_node(render_tree("node"), RecordingDelegate::new());
    assert!(cluster.config.init(1));

    cluster.config.start_frame(1);
    cluster.config.finish_all_frames().unwrap();

    let node = cluster.node(0);
    let channel_id = node.pipes()[0].windows()[0].channels()[0].id();
    let window_id = node.pipes()[0].windows()[0].id();
    let events = cluster.config.statistics().frame(1);

    assert!(events
        .iter()
        .any(|event| event.kind == StatKind::ChannelDraw && event.resource_id == channel_id));
    assert!(events
        .iter()
        .any(|event| event.kind == StatKind::WindowFinish && event.resource_id == window_id));
    assert!(events
        .iter()
        .any(|event| event.kind == StatKind::NodeFrameFinish && event.resource_id == node.id()));
    assert!(events
        .iter()
        .any(|event| event.kind == StatKind::ConfigStartFrame));
    assert!(events.iter().all(|event| event.frame_number == 1));

    assert!(cluster.config.exit());
    cluster.shutdown();
}

#[test]
fn statistics_keep_only_recent_frames() {
    let mut cluster = TestCluster::new(ServerConfig {
        statistics_frames: 3,
        ..test_server_config()
    });
    cluster.add_node(render_tree("node"), RecordingDelegate::new());
    assert!(cluster.config.init(1));

    for frame_id in 1..=6 {
        cluster.config.start_frame(frame_id);
        cluster.config.finish_frame().unwrap();
    }
    cluster.config.finish_all_frames().unwrap();

    assert_eq!(cluster.config.statistics().frames(), vec![4, 5, 6]);

    assert!(cluster.config.exit());
    cluster.shutdown();
}

// ========== Pacing Tests ==========

#[test]
fn finish_frame_bounds_frames_in_flight() {
    let mut cluster = TestCluster::new(ServerConfig {
        latency: 2,
        ..test_server_config()
    });
    cluster.add_node(render_tree("left"), RecordingDelegate::new());
    cluster.add_node(render_tree("right"), RecordingDelegate::new());
    assert!(cluster.config.init(1));

    for frame_id in 1..=5 {
        let started = cluster.config.start_frame(frame_id);
        let finished = cluster.config.finish_frame().unwrap();
        assert_eq!(finished, started.saturating_sub(2));
        assert!(cluster.config.finished_frame() >= finished);
    }

    assert_eq!(cluster.config.finish_all_frames(), Ok(5));
    assert_eq!(cluster.config.finished_frame(), 5);
    assert_eq!(cluster.node(0).finished_frame(), 5);
    assert_eq!(cluster.node(1).finished_frame(), 5);

    assert!(cluster.config.exit());
    cluster.shutdown();
}

#[test]
fn frame_tasks_run_parent_first_and_finish_child_first() {
    let mut cluster = TestCluster::new(test_server_config());
    let delegate = RecordingDelegate::new();
    let log = delegate.log();
    cluster.add_node(render_tree("node"), delegate);
    assert!(cluster.config.init(1));

    cluster.config.start_frame(1);
    cluster.config.finish_all_frames().unwrap();

    let frame_tasks: Vec<(bool, ResourceKind)> = log
        .tasks()
        .into_iter()
        .filter_map(|task| match task {
            Task::FrameStart { kind, .. } => Some((true, kind)),
            Task::FrameFinish { kind, .. } => Some((false, kind)),
            _ => None,
        })
        .collect();
    assert_eq!(
        frame_tasks,
        vec![
            (true, ResourceKind::Node),
            (true, ResourceKind::Pipe),
            (true, ResourceKind::Window),
            (true, ResourceKind::Channel),
            (false, ResourceKind::Channel),
            (false, ResourceKind::Window),
            (false, ResourceKind::Pipe),
            (false, ResourceKind::Node),
        ]
    );

    assert!(cluster.config.exit());
    cluster.shutdown();
}
