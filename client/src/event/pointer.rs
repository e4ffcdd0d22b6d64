use super::canonical::PointerEvent;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum PointerAction {
    Motion,
    ButtonPress,
    ButtonRelease,
}

/// Synthesizes pointer deltas for sources that only report positions
#[derive(Debug, Default)]
pub struct PointerTracker {
    last: Option<(PointerAction, PointerEvent)>,
}

impl PointerTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fills `dx`/`dy` of a button event. A button event right after a
    /// motion repeats the motion's delta so a release keeps the momentum of
    /// the drag; otherwise the delta is the distance to the last position.
    pub fn compute_delta(&mut self, action: PointerAction, event: &mut PointerEvent) {
        match self.last {
            Some((PointerAction::Motion, last)) if action != PointerAction::Motion => {
                event.dx = last.dx;
                event.dy = last.dy;
            }
            Some((_, last)) => {
                event.dx = event.x - last.x;
                event.dy = event.y - last.y;
            }
            None => {
                event.dx = 0.0;
                event.dy = 0.0;
            }
        }
        self.last = Some((action, *event));
    }

    /// Remembers an event that already carries its delta
    pub fn observe(&mut self, action: PointerAction, event: &PointerEvent) {
        self.last = Some((action, *event));
    }

    pub fn reset(&mut self) {
        self.last = None;
    }
}
