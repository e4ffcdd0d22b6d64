use std::{
    collections::VecDeque,
    sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError},
    time::{Duration, Instant},
};

use log::trace;

use super::{
    connection::Connection, description::ConnectionDescription, error::ConnectionError,
};

#[derive(Default)]
struct Queue {
    units: VecDeque<Vec<u8>>,
    closed: bool,
}

/// One direction of a local connection
#[derive(Default)]
struct Lane {
    queue: Mutex<Queue>,
    arrived: Condvar,
}

impl Lane {
    fn lock(&self) -> MutexGuard<'_, Queue> {
        self.queue.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn close(&self) {
        self.lock().closed = true;
        self.arrived.notify_all();
    }
}

/// In-process connection end, routing byte units to its peer without any
/// network I/O
pub struct LocalConnection {
    description: ConnectionDescription,
    outgoing: Arc<Lane>,
    incoming: Arc<Lane>,
}

impl LocalConnection {
    /// Creates two connected ends
    pub fn pair(name: &str) -> (LocalConnection, LocalConnection) {
        let forward = Arc::new(Lane::default());
        let backward = Arc::new(Lane::default());

        let near = LocalConnection {
            description: ConnectionDescription::local(&format!("{}-near", name)),
            outgoing: forward.clone(),
            incoming: backward.clone(),
        };
        let far = LocalConnection {
            description: ConnectionDescription::local(&format!("{}-far", name)),
            outgoing: backward,
            incoming: forward,
        };
        (near, far)
    }

    /// Number of units sent by the peer and not yet received
    pub fn pending(&self) -> usize {
        self.incoming.lock().units.len()
    }

    fn closed_error(&self) -> ConnectionError {
        ConnectionError::Closed {
            description: self.description.to_string(),
        }
    }

    fn receive_until(&self, deadline: Option<Instant>) -> Result<Vec<u8>, ConnectionError> {
        let mut queue = self.incoming.lock();
        loop {
            if let Some(unit) = queue.units.pop_front() {
                return Ok(unit);
            }
            if queue.closed {
                return Err(self.closed_error());
            }

            queue = match deadline {
                None => self
                    .incoming
                    .arrived
                    .wait(queue)
                    .unwrap_or_else(PoisonError::into_inner),
                Some(deadline) => {
                    let now = Instant::now();
                    if now >= deadline {
                        return Err(ConnectionError::Timeout {
                            description: self.description.to_string(),
                        });
                    }
                    self.incoming
                        .arrived
                        .wait_timeout(queue, deadline - now)
                        .unwrap_or_else(PoisonError::into_inner)
                        .0
                }
            };
        }
    }
}

impl Connection for LocalConnection {
    fn description(&self) -> &ConnectionDescription {
        &self.description
    }

    fn send(&self, bytes: &[u8]) -> Result<(), ConnectionError> {
        let mut queue = self.outgoing.lock();
        if queue.closed {
            return Err(self.closed_error());
        }
        trace!("{} sends {} bytes", self.description, bytes.len());
        queue.units.push_back(bytes.to_vec());
        drop(queue);
        self.outgoing.arrived.notify_all();
        Ok(())
    }

    fn receive(&self) -> Result<Vec<u8>, ConnectionError> {
        self.receive_until(None)
    }

    fn receive_timeout(&self, timeout: Duration) -> Result<Vec<u8>, ConnectionError> {
        self.receive_until(Some(Instant::now() + timeout))
    }

    fn close(&self) {
        self.outgoing.close();
        self.incoming.close();
    }

    fn is_closed(&self) -> bool {
        self.outgoing.lock().closed
    }
}
