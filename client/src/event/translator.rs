use std::collections::BTreeMap;

use log::{debug, info};

use super::{
    canonical::{Event, PointerButtons, PointerEvent},
    key_table::key_from_qt,
    pointer::{PointerAction, PointerTracker},
    remote::{EventSource, RemoteEvent, RemoteEventKind},
};

/// Scales wheel rotation of remote sources to wheel axis units
pub const WHEEL_FACTOR: f32 = 1.0 / 40.0;

fn buttons_of(raw: &RemoteEvent) -> PointerButtons {
    let mut buttons = PointerButtons::NONE;
    if raw.mouse_left {
        buttons = buttons | PointerButtons::BUTTON1;
    }
    if raw.mouse_middle {
        buttons = buttons | PointerButtons::BUTTON2;
    }
    if raw.mouse_right {
        buttons = buttons | PointerButtons::BUTTON3;
    }
    buttons
}

/// Turns the raw events of one remote source into `Event`s for the channel
/// it streams
pub struct EventTranslator {
    source: Box<dyn EventSource>,
    width: f32,
    height: f32,
    tracker: PointerTracker,
    running: bool,
}

impl EventTranslator {
    /// `width` and `height` are the pixel size of the channel viewport
    pub fn new(source: Box<dyn EventSource>, width: u32, height: u32) -> Self {
        Self {
            source,
            width: width as f32,
            height: height as f32,
            tracker: PointerTracker::new(),
            running: true,
        }
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn set_viewport(&mut self, width: u32, height: u32) {
        self.width = width as f32;
        self.height = height as f32;
    }

    /// Pulls every pending raw event. A close event stops the translator and
    /// yields `Event::Exit`; nothing is read from the source after that.
    pub fn process_events(&mut self) -> Vec<Event> {
        let mut events = Vec::new();
        while self.running {
            let Some(raw) = self.source.next_event() else {
                break;
            };
            if raw.kind == RemoteEventKind::Close {
                info!("remote event source closed");
                self.running = false;
                events.push(Event::Exit);
                break;
            }
            if let Some(event) = self.translate(&raw) {
                events.push(event);
            }
        }
        events
    }

    pub fn translate(&mut self, raw: &RemoteEvent) -> Option<Event> {
        let x = raw.mouse_x * self.width;
        let y = raw.mouse_y * self.height;

        match raw.kind {
            RemoteEventKind::KeyPress => Some(Event::KeyPress {
                key: key_from_qt(raw.key),
            }),
            RemoteEventKind::KeyRelease => Some(Event::KeyRelease {
                key: key_from_qt(raw.key),
            }),
            RemoteEventKind::Press | RemoteEventKind::Release => {
                let buttons = buttons_of(raw);
                let mut pointer = PointerEvent {
                    x,
                    y,
                    buttons,
                    button: buttons,
                    ..PointerEvent::default()
                };
                if raw.kind == RemoteEventKind::Press {
                    self.tracker
                        .compute_delta(PointerAction::ButtonPress, &mut pointer);
                    Some(Event::ChannelPointerButtonPress(pointer))
                } else {
                    self.tracker
                        .compute_delta(PointerAction::ButtonRelease, &mut pointer);
                    Some(Event::ChannelPointerButtonRelease(pointer))
                }
            }
            RemoteEventKind::Move | RemoteEventKind::Pan => {
                // a pan gesture drags with the third button
                let buttons = if raw.kind == RemoteEventKind::Pan {
                    PointerButtons::BUTTON3
                } else {
                    buttons_of(raw)
                };
                let pointer = PointerEvent {
                    x,
                    y,
                    dx: raw.dx * self.width,
                    dy: raw.dy * self.height,
                    buttons,
                    button: buttons,
                    ..PointerEvent::default()
                };
                self.tracker.observe(PointerAction::Motion, &pointer);
                Some(Event::ChannelPointerMotion(pointer))
            }
            RemoteEventKind::Wheel => Some(Event::ChannelPointerWheel(PointerEvent {
                x,
                y: self.height - y,
                dx: -raw.dx,
                dy: -raw.dy,
                x_axis: raw.dx * WHEEL_FACTOR,
                y_axis: raw.dy * WHEEL_FACTOR,
                ..PointerEvent::default()
            })),
            RemoteEventKind::Pinch => {
                let dx = raw.dx * self.width;
                let dy = raw.dy * self.height;
                let zoom = (dx * dx + dy * dy).sqrt().copysign(dx + dy);
                Some(Event::ChannelPointerWheel(PointerEvent {
                    x,
                    y: self.height - y,
                    x_axis: 0.0,
                    y_axis: zoom * WHEEL_FACTOR,
                    ..PointerEvent::default()
                }))
            }
            RemoteEventKind::DoubleClick | RemoteEventKind::None | RemoteEventKind::Close => {
                None
            }
        }
    }
}

/// Handle of a translator in a `TranslatorRegistry`
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TranslatorKey(u32);

/// The translators polled by one event loop
#[derive(Default)]
pub struct TranslatorRegistry {
    next_key: u32,
    translators: BTreeMap<TranslatorKey, EventTranslator>,
}

impl TranslatorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, translator: EventTranslator) -> TranslatorKey {
        let key = TranslatorKey(self.next_key);
        self.next_key = self.next_key.wrapping_add(1);
        self.translators.insert(key, translator);
        debug!("registered event translator {:?}", key);
        key
    }

    /// Removes a translator. Removing one twice is harmless.
    pub fn deregister(&mut self, key: TranslatorKey) -> Option<EventTranslator> {
        let translator = self.translators.remove(&key);
        if translator.is_some() {
            debug!("deregistered event translator {:?}", key);
        }
        translator
    }

    pub fn len(&self) -> usize {
        self.translators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.translators.is_empty()
    }

    /// Processes the pending events of one translator, or of all of them when
    /// `only` is `None`
    pub fn process_events(&mut self, only: Option<TranslatorKey>) -> Vec<(TranslatorKey, Event)> {
        let mut events = Vec::new();
        for (key, translator) in self.translators.iter_mut() {
            if only.is_some_and(|only| only != *key) {
                continue;
            }
            events.extend(
                translator
                    .process_events()
                    .into_iter()
                    .map(|event| (*key, event)),
            );
        }
        events
    }

    /// Whether any registered source is still delivering events
    pub fn has_running(&self) -> bool {
        self.translators.values().any(EventTranslator::is_running)
    }
}

/// Key events of printable characters, for applications that only care
/// about characters
pub fn typed_char(event: &Event) -> Option<char> {
    match event {
        Event::KeyPress { key } => key.as_char(),
        _ => None,
    }
}
