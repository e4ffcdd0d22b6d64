/// Integration tests for the barriers a node hands out and takes back

use std::{
    sync::{
        atomic::{AtomicU32, Ordering},
        Arc,
    },
    thread,
    time::Duration,
};

use proptest::prelude::*;

use lockstep_server::{BarrierHandle, Channel, Node, Pipe, Window};
use lockstep_test::{test_server_config, RecordingDelegate, TestCluster};

fn enter_all(handle: &BarrierHandle, height: u32) -> Vec<u32> {
    let arrived = Arc::new(AtomicU32::new(0));
    let threads: Vec<_> = (0..height)
        .map(|_| {
            let barrier = handle.barrier().clone();
            let arrived = arrived.clone();
            thread::spawn(move || {
                arrived.fetch_add(1, Ordering::SeqCst);
                barrier.enter_timeout(Duration::from_secs(5)).unwrap();
                arrived.load(Ordering::SeqCst)
            })
        })
        .collect();
    threads
        .into_iter()
        .map(|thread| thread.join().unwrap())
        .collect()
}

// ========== Cache Tests ==========

#[test]
fn released_barrier_comes_back_reset() {
    let mut cluster = TestCluster::new(test_server_config());
    cluster.config.add_node(Node::new("node"));
    let session = cluster.config.session().clone();

    let first = cluster.node_mut(0).get_barrier(&session).unwrap();
    first.set_height(3);
    first.commit();
    assert_eq!(first.height(), 3);
    cluster.node_mut(0).release_barrier(first.clone());

    let second = cluster.node_mut(0).get_barrier(&session).unwrap();
    assert!(second.ptr_eq(&first));
    assert_eq!(second.id(), first.id());
    assert_eq!(second.height(), 0);
}

#[test]
fn barriers_in_use_are_never_shared() {
    let mut cluster = TestCluster::new(test_server_config());
    cluster.config.add_node(Node::new("node"));
    let session = cluster.config.session().clone();

    let first = cluster.node_mut(0).get_barrier(&session).unwrap();
    let second = cluster.node_mut(0).get_barrier(&session).unwrap();
    assert!(!second.ptr_eq(&first));
    assert_ne!(second.id(), first.id());
}

#[test]
fn foreign_barrier_is_not_cached() {
    let mut cluster = TestCluster::new(test_server_config());
    cluster.config.add_node(Node::new("left"));
    cluster.config.add_node(Node::new("right"));
    let session = cluster.config.session().clone();

    let foreign = cluster.node_mut(0).get_barrier(&session).unwrap();
    cluster.node_mut(1).release_barrier(foreign.clone());

    let own = cluster.node_mut(1).get_barrier(&session).unwrap();
    assert!(!own.ptr_eq(&foreign));
}

#[test]
fn exit_deregisters_node_barriers() {
    let mut cluster = TestCluster::new(test_server_config());
    cluster.add_node(
        Node::new("node").with_pipe(
            Pipe::new("pipe")
                .with_window(Window::new("window").with_channel(Channel::new("channel"))),
        ),
        RecordingDelegate::new(),
    );
    assert!(cluster.config.init(1));

    let session = cluster.config.session().clone();
    let handle = cluster.node_mut(0).get_barrier(&session).unwrap();
    assert!(session.registry().contains(handle.id()));

    assert!(cluster.config.exit());
    assert!(!session.registry().contains(handle.id()));
    assert!(session.registry().is_empty());
    cluster.shutdown();
}

// ========== Rendezvous Tests ==========

#[test]
fn node_barrier_releases_after_last_participant() {
    let mut cluster = TestCluster::new(test_server_config());
    cluster.config.add_node(Node::new("node"));
    let session = cluster.config.session().clone();

    let handle = cluster.node_mut(0).get_barrier(&session).unwrap();
    handle.set_height(4);
    handle.commit();

    for seen in enter_all(&handle, 4) {
        assert_eq!(seen, 4);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn no_participant_leaves_early(height in 2u32..6) {
        let mut cluster = TestCluster::new(test_server_config());
        cluster.config.add_node(Node::new("node"));
        let session = cluster.config.session().clone();

        let handle = cluster.node_mut(0).get_barrier(&session).unwrap();
        handle.set_height(height);
        handle.commit();

        for seen in enter_all(&handle, height) {
            prop_assert_eq!(seen, height);
        }
    }
}
