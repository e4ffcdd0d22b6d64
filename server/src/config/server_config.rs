use std::{default::Default, time::Duration};

/// Contains Config properties which will be used by the Server
#[derive(Clone, Debug)]
pub struct ServerConfig {
    /// Number of frames the application may run ahead of the slowest node.
    /// Barriers retain `latency + 1` versions.
    pub latency: u32,
    /// Upper bound for waiting on init and exit replies. `None` waits
    /// until the reply arrives.
    pub sync_timeout: Option<Duration>,
    /// Upper bound for waiting on a frame to finish. `None` waits until
    /// every node reported the frame.
    pub frame_timeout: Option<Duration>,
    /// Number of finished frames whose statistics are kept
    pub statistics_frames: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            latency: 1,
            sync_timeout: None,
            frame_timeout: None,
            statistics_frames: 10,
        }
    }
}
