use std::{
    collections::BTreeMap,
    sync::{Mutex, MutexGuard, PoisonError},
    time::Instant,
};

use log::trace;

use lockstep_shared::{FrameNumber, ObjectId, StatEvent, StatKind};

/// Statistics of the most recent frames, fed by frame finish replies on the
/// receiver threads and by the config's own frame tasks
pub struct ConfigStatistics {
    retained: usize,
    epoch: Instant,
    frames: Mutex<BTreeMap<FrameNumber, Vec<StatEvent>>>,
}

impl ConfigStatistics {
    pub fn new(retained: usize) -> Self {
        Self {
            retained: retained.max(1),
            epoch: Instant::now(),
            frames: Mutex::new(BTreeMap::new()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<FrameNumber, Vec<StatEvent>>> {
        self.frames.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Microseconds since this config started
    pub fn now(&self) -> u64 {
        self.epoch.elapsed().as_micros() as u64
    }

    pub fn record<I: IntoIterator<Item = StatEvent>>(&self, events: I) {
        let mut frames = self.lock();
        for event in events {
            trace!(
                "{} {} frame {}: {}us",
                event.kind.name(),
                event.resource_id,
                event.frame_number,
                event.duration()
            );
            frames.entry(event.frame_number).or_default().push(event);
        }
        while frames.len() > self.retained {
            frames.pop_first();
        }
    }

    /// Records a task of the config itself that started at `start_time`
    pub fn record_since(
        &self,
        kind: StatKind,
        resource_id: ObjectId,
        frame_number: FrameNumber,
        start_time: u64,
    ) {
        let event = StatEvent {
            kind,
            resource_id,
            frame_number,
            start_time,
            end_time: self.now(),
        };
        self.record([event]);
    }

    pub fn frame(&self, frame_number: FrameNumber) -> Vec<StatEvent> {
        self.lock().get(&frame_number).cloned().unwrap_or_default()
    }

    /// Frame numbers that currently have statistics, oldest first
    pub fn frames(&self) -> Vec<FrameNumber> {
        self.lock().keys().copied().collect()
    }
}
