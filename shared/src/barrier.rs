use std::{
    collections::VecDeque,
    sync::{Condvar, Mutex, MutexGuard, PoisonError},
    time::{Duration, Instant},
};

use log::{debug, trace};
use thiserror::Error;

use lockstep_serde::{BitReader, BitWrite, Serde, SerdeErr};

use crate::{
    types::{ObjectVersion, VERSION_FIRST},
    versioned::{DirtyLayout, DirtyMask, DirtyTracker, ObjectBase, Serializable, OBJECT_LAYOUT},
};

pub const BARRIER_LAYOUT: DirtyLayout = OBJECT_LAYOUT.extend("Barrier", 1);
pub const DIRTY_HEIGHT: DirtyMask = BARRIER_LAYOUT.bit(0);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BarrierError {
    /// The version was pruned from the retained window, or never existed
    #[error("barrier version {version} is not retained (oldest {oldest}, newest {newest})")]
    UnknownVersion {
        version: ObjectVersion,
        oldest: ObjectVersion,
        newest: ObjectVersion,
    },

    #[error("timed out in barrier version {version} with {arrived} of {height} participants")]
    Timeout {
        version: ObjectVersion,
        arrived: u32,
        height: u32,
    },
}

struct Rendezvous {
    version: ObjectVersion,
    height: u32,
    arrived: u32,
    generation: u64,
}

impl Rendezvous {
    fn new(version: ObjectVersion, height: u32) -> Self {
        Self {
            version,
            height,
            arrived: 0,
            generation: 0,
        }
    }
}

struct BarrierState {
    height: u32,
    rendezvous: VecDeque<Rendezvous>,
}

impl BarrierState {
    fn newest(&self) -> ObjectVersion {
        self.rendezvous
            .back()
            .map(|r| r.version)
            .unwrap_or(VERSION_FIRST)
    }

    fn find(&mut self, version: ObjectVersion) -> Result<&mut Rendezvous, BarrierError> {
        let oldest = self.rendezvous.front().map(|r| r.version).unwrap_or(0);
        let newest = self.newest();
        self.rendezvous
            .iter_mut()
            .find(|r| r.version == version)
            .ok_or(BarrierError::UnknownVersion {
                version,
                oldest,
                newest,
            })
    }
}

/// Rendezvous point for a fixed number of participants.
///
/// Each committed height is a new version of the barrier; participants
/// enter a version and block until `height` of them arrived, then all of
/// them leave together and the version is ready for its next generation.
/// The last `retained` versions are kept so a participant that lags behind
/// by a few commits still meets its peers.
pub struct Barrier {
    base: ObjectBase,
    dirty: DirtyTracker,
    retained: usize,
    state: Mutex<BarrierState>,
    released: Condvar,
}

impl Barrier {
    pub fn new(height: u32, retained: usize) -> Self {
        let mut rendezvous = VecDeque::new();
        rendezvous.push_back(Rendezvous::new(VERSION_FIRST, height));
        Self {
            base: ObjectBase::new("barrier"),
            dirty: DirtyTracker::new(),
            retained: retained.max(1),
            state: Mutex::new(BarrierState { height, rendezvous }),
            released: Condvar::new(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, BarrierState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn name(&self) -> &str {
        self.base.name()
    }

    /// Height that the next commit will publish
    pub fn height(&self) -> u32 {
        self.lock().height
    }

    pub fn set_height(&self, height: u32) {
        let mut state = self.lock();
        if state.height == height {
            return;
        }
        state.height = height;
        self.dirty.set(DIRTY_HEIGHT);
    }

    /// Newest committed version
    pub fn version(&self) -> ObjectVersion {
        self.lock().newest()
    }

    pub fn retained(&self) -> usize {
        self.retained
    }

    /// Publishes a pending height change as a new version, returns the
    /// newest version either way
    pub fn commit(&self) -> ObjectVersion {
        let mut state = self.lock();
        if self.dirty.take().is_clear() {
            return state.newest();
        }
        let version = Self::advance(&mut state, self.retained);
        drop(state);
        self.released.notify_all();
        version
    }

    fn advance(state: &mut BarrierState, retained: usize) -> ObjectVersion {
        let version = state.newest() + 1;
        let height = state.height;
        state.rendezvous.push_back(Rendezvous::new(version, height));
        while state.rendezvous.len() > retained {
            if let Some(pruned) = state.rendezvous.pop_front() {
                trace!("barrier prunes version {}", pruned.version);
            }
        }
        debug!("barrier v{} height {}", version, height);
        version
    }

    /// Enters the newest version and blocks until its quorum is complete
    pub fn enter(&self) -> Result<(), BarrierError> {
        let version = self.version();
        self.enter_version(version, None)
    }

    pub fn enter_timeout(&self, timeout: Duration) -> Result<(), BarrierError> {
        let version = self.version();
        self.enter_version(version, Some(timeout))
    }

    /// Enters a specific retained version
    pub fn enter_version(
        &self,
        version: ObjectVersion,
        timeout: Option<Duration>,
    ) -> Result<(), BarrierError> {
        let deadline = timeout.map(|timeout| Instant::now() + timeout);
        let mut state = self.lock();

        let rendezvous = state.find(version)?;
        if rendezvous.height <= 1 {
            return Ok(());
        }

        rendezvous.arrived += 1;
        if rendezvous.arrived >= rendezvous.height {
            trace!("barrier v{} complete with {}", version, rendezvous.arrived);
            rendezvous.arrived = 0;
            rendezvous.generation += 1;
            drop(state);
            self.released.notify_all();
            return Ok(());
        }
        let generation = rendezvous.generation;

        loop {
            state = match deadline {
                None => self
                    .released
                    .wait(state)
                    .unwrap_or_else(PoisonError::into_inner),
                Some(deadline) => {
                    let remaining = deadline.saturating_duration_since(Instant::now());
                    self.released
                        .wait_timeout(state, remaining)
                        .unwrap_or_else(PoisonError::into_inner)
                        .0
                }
            };

            let rendezvous = state.find(version)?;
            if rendezvous.generation != generation {
                return Ok(());
            }

            if deadline.is_some_and(|deadline| Instant::now() >= deadline) {
                rendezvous.arrived -= 1;
                return Err(BarrierError::Timeout {
                    version,
                    arrived: rendezvous.arrived,
                    height: rendezvous.height,
                });
            }
        }
    }
}

impl Serializable for Barrier {
    const LAYOUT: DirtyLayout = BARRIER_LAYOUT;

    fn dirty_tracker(&self) -> &DirtyTracker {
        &self.dirty
    }

    fn serialize(&self, writer: &mut dyn BitWrite, dirty: DirtyMask) {
        self.base.serialize(writer, dirty);
        if dirty.contains(DIRTY_HEIGHT) {
            self.height().ser(writer);
        }
    }

    fn deserialize(&mut self, reader: &mut BitReader, dirty: DirtyMask) -> Result<(), SerdeErr> {
        self.base.deserialize(reader, dirty)?;
        if dirty.contains(DIRTY_HEIGHT) {
            let height = u32::de(reader)?;
            let retained = self.retained;
            let state = self.state.get_mut().unwrap_or_else(PoisonError::into_inner);
            state.height = height;
            Self::advance(state, retained);
        }
        Ok(())
    }
}
