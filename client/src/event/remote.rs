/// Kind of a raw event from a remote display source
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum RemoteEventKind {
    #[default]
    None,
    Press,
    Release,
    DoubleClick,
    Move,
    Wheel,
    Pan,
    Pinch,
    KeyPress,
    KeyRelease,
    Close,
}

/// A raw event of a remote display source. Positions and motion are
/// normalized to the streamed viewport.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct RemoteEvent {
    pub kind: RemoteEventKind,
    pub mouse_x: f32,
    pub mouse_y: f32,
    pub dx: f32,
    pub dy: f32,
    pub mouse_left: bool,
    pub mouse_middle: bool,
    pub mouse_right: bool,
    /// Qt key code for key events
    pub key: i32,
}

impl RemoteEvent {
    pub fn new(kind: RemoteEventKind) -> Self {
        Self {
            kind,
            ..Self::default()
        }
    }
}

/// Pull side of a remote display source. Once `next_event` returned `None`
/// after a close, the source stays exhausted.
pub trait EventSource: Send {
    fn next_event(&mut self) -> Option<RemoteEvent>;
}

impl<I: Iterator<Item = RemoteEvent> + Send> EventSource for I {
    fn next_event(&mut self) -> Option<RemoteEvent> {
        self.next()
    }
}
