pub mod recording_delegate;
pub mod test_cluster;

pub use recording_delegate::{RecordingDelegate, Task, TaskLog};
pub use test_cluster::{test_server_config, TestCluster};

/// Installs `env_logger` once per test binary; later calls are no-ops
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}
