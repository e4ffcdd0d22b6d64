use std::ops::BitOr;

/// A key, either a printable character or one of the named special keys
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct KeyCode(pub u32);

impl KeyCode {
    pub const ESCAPE: KeyCode = KeyCode(256);
    pub const BACKSPACE: KeyCode = KeyCode(257);
    pub const RETURN: KeyCode = KeyCode(258);
    pub const TAB: KeyCode = KeyCode(259);
    pub const HOME: KeyCode = KeyCode(260);
    pub const LEFT: KeyCode = KeyCode(261);
    pub const UP: KeyCode = KeyCode(262);
    pub const RIGHT: KeyCode = KeyCode(263);
    pub const DOWN: KeyCode = KeyCode(264);
    pub const PAGE_UP: KeyCode = KeyCode(265);
    pub const PAGE_DOWN: KeyCode = KeyCode(266);
    pub const END: KeyCode = KeyCode(267);
    pub const F1: KeyCode = KeyCode(268);
    pub const F24: KeyCode = KeyCode(291);
    pub const SHIFT_L: KeyCode = KeyCode(292);
    pub const SHIFT_R: KeyCode = KeyCode(293);
    pub const CONTROL_L: KeyCode = KeyCode(294);
    pub const CONTROL_R: KeyCode = KeyCode(295);
    pub const ALT_L: KeyCode = KeyCode(296);
    pub const ALT_R: KeyCode = KeyCode(297);
    pub const VOID: KeyCode = KeyCode(0xff_ffff);

    pub fn from_char(character: char) -> Self {
        KeyCode(character as u32)
    }

    /// Function key `n`, counted from 1
    pub fn function(n: u32) -> Option<Self> {
        if (1..=24).contains(&n) {
            Some(KeyCode(Self::F1.0 + n - 1))
        } else {
            None
        }
    }

    pub fn is_function_key(&self) -> bool {
        (Self::F1.0..=Self::F24.0).contains(&self.0)
    }

    pub fn as_char(&self) -> Option<char> {
        if self.0 < Self::ESCAPE.0 {
            char::from_u32(self.0)
        } else {
            None
        }
    }
}

/// Pointer buttons, as a set
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct PointerButtons(u32);

impl PointerButtons {
    pub const NONE: PointerButtons = PointerButtons(0);
    pub const BUTTON1: PointerButtons = PointerButtons(1);
    pub const BUTTON2: PointerButtons = PointerButtons(1 << 1);
    pub const BUTTON3: PointerButtons = PointerButtons(1 << 2);

    pub fn bits(&self) -> u32 {
        self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn contains(&self, other: PointerButtons) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for PointerButtons {
    type Output = PointerButtons;

    fn bitor(self, rhs: PointerButtons) -> PointerButtons {
        PointerButtons(self.0 | rhs.0)
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct PointerEvent {
    /// Position in pixels of the channel viewport
    pub x: f32,
    pub y: f32,
    /// Motion since the previous pointer event
    pub dx: f32,
    pub dy: f32,
    /// Buttons held down
    pub buttons: PointerButtons,
    /// Button that changed state
    pub button: PointerButtons,
    /// Wheel rotation
    pub x_axis: f32,
    pub y_axis: f32,
}

/// Six degree of freedom input
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct MagellanEvent {
    pub x_axis: f32,
    pub y_axis: f32,
    pub z_axis: f32,
    pub x_rotation: f32,
    pub y_rotation: f32,
    pub z_rotation: f32,
}

/// Input events in the form every render node and application understands
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    KeyPress { key: KeyCode },
    KeyRelease { key: KeyCode },
    ChannelPointerMotion(PointerEvent),
    ChannelPointerButtonPress(PointerEvent),
    ChannelPointerButtonRelease(PointerEvent),
    ChannelPointerWheel(PointerEvent),
    MagellanAxis(MagellanEvent),
    Exit,
}

impl Event {
    pub fn pointer(&self) -> Option<&PointerEvent> {
        match self {
            Event::ChannelPointerMotion(pointer)
            | Event::ChannelPointerButtonPress(pointer)
            | Event::ChannelPointerButtonRelease(pointer)
            | Event::ChannelPointerWheel(pointer) => Some(pointer),
            _ => None,
        }
    }
}
