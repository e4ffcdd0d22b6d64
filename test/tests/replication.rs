/// Integration tests for objects replicated from the config to render nodes

use std::sync::{Arc, Mutex, PoisonError};

use lockstep_client::ViewData;
use lockstep_server::{Channel, Node, Pipe, Resource, Window};
use lockstep_shared::{ObjectSlave, VersionedObject};
use lockstep_test::{test_server_config, RecordingDelegate, TestCluster};

type SharedView = Arc<Mutex<ObjectSlave<ViewData>>>;

fn render_tree() -> Node {
    Node::new("node").with_pipe(
        Pipe::new("pipe").with_window(Window::new("window").with_channel(Channel::new("channel"))),
    )
}

/// A running cluster with `view` registered and mapped on its render node
fn cluster_with_view(view: &mut VersionedObject<ViewData>) -> (TestCluster, SharedView) {
    let (cluster, mut replicas) = cluster_with_nodes(view, vec![render_tree()]);
    (cluster, replicas.remove(0))
}

/// Like `cluster_with_view`, with one render node per entry of `nodes`
fn cluster_with_nodes(
    view: &mut VersionedObject<ViewData>,
    nodes: Vec<Node>,
) -> (TestCluster, Vec<SharedView>) {
    let mut cluster = TestCluster::new(test_server_config());
    let id = cluster.config.register_object(view).unwrap();

    let mut replicas = Vec::new();
    for node in nodes {
        cluster.add_node_with(node, RecordingDelegate::new(), |render_node| {
            replicas.push(
                render_node
                    .map_object(ObjectSlave::new(id, ViewData::new()))
                    .unwrap(),
            );
        });
    }
    assert!(cluster.config.init(1));
    (cluster, replicas)
}

fn version(replica: &SharedView) -> u32 {
    replica
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .version()
}

fn run_frame(cluster: &mut TestCluster, frame_id: u32) {
    cluster.config.start_frame(frame_id);
    cluster.config.finish_all_frames().unwrap();
}

// ========== Distribution Tests ==========

#[test]
fn slave_follows_master_across_frames() {
    let mut view = VersionedObject::new(ViewData::new());
    let (mut cluster, replica) = cluster_with_view(&mut view);

    run_frame(&mut cluster, 1);
    {
        let slave = replica.lock().unwrap_or_else(PoisonError::into_inner);
        assert_eq!(slave.version(), 1);
        assert_eq!(slave.model_matrix(), view.model_matrix());
    }

    view.get_mut().spin_model(0.2, -0.1, 0.0);
    view.get_mut().show_statistics(true);
    assert!(cluster.config.distribute(&mut view));
    run_frame(&mut cluster, 2);

    {
        let slave = replica.lock().unwrap_or_else(PoisonError::into_inner);
        assert_eq!(slave.version(), 2);
        assert_eq!(slave.model_matrix(), view.model_matrix());
        assert!(slave.statistics());
        assert!(!slave.ortho());
    }

    assert!(cluster.config.exit());
    cluster.shutdown();
}

#[test]
fn unchanged_object_is_not_distributed() {
    let mut view = VersionedObject::new(ViewData::new());
    let (mut cluster, replica) = cluster_with_view(&mut view);
    run_frame(&mut cluster, 1);

    view.get_mut().set_ortho(false);
    assert!(!cluster.config.distribute(&mut view));
    assert!(cluster.config.pending_deltas().is_empty());

    run_frame(&mut cluster, 2);
    assert_eq!(version(&replica), 1);

    assert!(cluster.config.exit());
    cluster.shutdown();
}

#[test]
fn deregistered_object_drops_pending_changes() {
    let mut view = VersionedObject::new(ViewData::new());
    let (mut cluster, replica) = cluster_with_view(&mut view);
    run_frame(&mut cluster, 1);

    view.get_mut().set_ortho(true);
    assert!(cluster.config.distribute(&mut view));
    cluster.config.deregister_object(&mut view);
    assert!(!view.is_attached());
    assert!(cluster.config.pending_deltas().is_empty());

    run_frame(&mut cluster, 2);
    assert!(!replica
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .ortho());
    assert!(!cluster.config.distribute(&mut view));

    assert!(cluster.config.exit());
    cluster.shutdown();
}

#[test]
fn registering_twice_keeps_the_id() {
    let mut cluster = TestCluster::new(test_server_config());
    let mut view = VersionedObject::new(ViewData::new());

    let id = cluster.config.register_object(&mut view).unwrap();
    assert_eq!(cluster.config.register_object(&mut view).unwrap(), id);
    assert_eq!(cluster.config.pending_deltas().len(), 1);
    assert!(cluster.config.pending_deltas()[0].instance);
}

// ========== Frame Failure Tests ==========

#[test]
fn pipe_used_after_init_keeps_changes_flowing() {
    let mut spare = Pipe::new("spare")
        .with_window(Window::new("spare window").with_channel(Channel::new("spare channel")));
    spare.set_used(false);
    let mut view = VersionedObject::new(ViewData::new());
    let (mut cluster, replicas) = cluster_with_nodes(&mut view, vec![render_tree().with_pipe(spare)]);
    run_frame(&mut cluster, 1);

    cluster.node_mut(0).pipes_mut()[1].set_used(true);
    view.get_mut().set_ortho(true);
    assert!(cluster.config.distribute(&mut view));
    assert!(cluster.config.try_start_frame(2).is_ok());
    cluster.config.finish_all_frames().unwrap();

    assert!(cluster.config.pending_deltas().is_empty());
    assert_eq!(version(&replicas[0]), 2);
    assert!(replicas[0]
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .ortho());

    assert!(cluster.config.exit());
    cluster.shutdown();
}

#[test]
fn failed_frame_queues_its_changes_again() {
    let mut view = VersionedObject::new(ViewData::new());
    let (mut cluster, replicas) = cluster_with_nodes(
        &mut view,
        vec![
            Node::new("left").with_pipe(Pipe::new("pipe")),
            Node::new("right").with_pipe(Pipe::new("pipe")),
        ],
    );
    run_frame(&mut cluster, 1);
    assert_eq!(version(&replicas[1]), 1);

    cluster.node(1).connection().unwrap().close();
    view.get_mut().show_statistics(true);
    assert!(cluster.config.distribute(&mut view));
    assert!(cluster.config.try_start_frame(2).is_err());

    let pending = cluster.config.pending_deltas();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].object_id, view.id());
    assert_eq!(pending[0].version, 2);

    // a newer change queues behind the one that was not delivered
    view.get_mut().set_ortho(true);
    assert!(cluster.config.distribute(&mut view));
    let versions: Vec<u32> = cluster
        .config
        .pending_deltas()
        .iter()
        .map(|delta| delta.version)
        .collect();
    assert_eq!(versions, vec![2, 3]);
    assert_eq!(version(&replicas[1]), 1);

    cluster.shutdown();
}
