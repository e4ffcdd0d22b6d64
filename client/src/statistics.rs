use std::{
    sync::{Mutex, MutexGuard, PoisonError},
    time::Instant,
};

use lockstep_shared::{FrameNumber, ObjectId, StatEvent, StatKind};

/// Collects the statistics sampled on a render node until the frame finish
/// reply that carries them
pub struct StatisticsSink {
    enabled: bool,
    epoch: Instant,
    events: Mutex<Vec<StatEvent>>,
}

impl StatisticsSink {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            epoch: Instant::now(),
            events: Mutex::new(Vec::new()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Vec<StatEvent>> {
        self.events.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Microseconds since this sink was created
    pub fn now(&self) -> u64 {
        self.epoch.elapsed().as_micros() as u64
    }

    pub fn record(&self, event: StatEvent) {
        if self.enabled {
            self.lock().push(event);
        }
    }

    /// Removes and returns the events of `frame_number` and every older frame
    pub fn take_frame(&self, frame_number: FrameNumber) -> Vec<StatEvent> {
        let mut events = self.lock();
        let (taken, kept): (Vec<StatEvent>, Vec<StatEvent>) = events
            .drain(..)
            .partition(|event| event.frame_number <= frame_number);
        *events = kept;
        taken
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

/// Times the scope it lives in and records it into a sink when dropped
pub struct StatisticSampler<'s> {
    sink: &'s StatisticsSink,
    kind: StatKind,
    resource_id: ObjectId,
    frame_number: FrameNumber,
    start_time: u64,
    ignore: bool,
}

impl<'s> StatisticSampler<'s> {
    pub fn new(
        sink: &'s StatisticsSink,
        kind: StatKind,
        resource_id: ObjectId,
        frame_number: FrameNumber,
    ) -> Self {
        Self {
            sink,
            kind,
            resource_id,
            frame_number,
            start_time: sink.now(),
            ignore: !sink.is_enabled(),
        }
    }

    /// Drops the sample instead of recording it
    pub fn ignore(&mut self) {
        self.ignore = true;
    }

    pub fn is_ignored(&self) -> bool {
        self.ignore
    }
}

impl Drop for StatisticSampler<'_> {
    fn drop(&mut self) {
        if self.ignore {
            return;
        }
        self.sink.record(StatEvent {
            kind: self.kind,
            resource_id: self.resource_id,
            frame_number: self.frame_number,
            start_time: self.start_time,
            end_time: self.sink.now(),
        });
    }
}
