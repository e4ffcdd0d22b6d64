use super::canonical::KeyCode;

/// Maps a Qt key code, as sent by remote display sources, to a `KeyCode`.
/// Letters arrive upper case and are mapped to lower case.
pub fn key_from_qt(key: i32) -> KeyCode {
    match key {
        0x0100_0000 => KeyCode::ESCAPE,
        0x0100_0001 => KeyCode::TAB,
        0x0100_0003 => KeyCode::BACKSPACE,
        0x0100_0004 => KeyCode::RETURN,
        0x0100_0010 => KeyCode::HOME,
        0x0100_0011 => KeyCode::END,
        0x0100_0012 => KeyCode::LEFT,
        0x0100_0013 => KeyCode::UP,
        0x0100_0014 => KeyCode::RIGHT,
        0x0100_0015 => KeyCode::DOWN,
        0x0100_0016 => KeyCode::PAGE_UP,
        0x0100_0017 => KeyCode::PAGE_DOWN,
        0x0100_0020 => KeyCode::SHIFT_L,
        0x0100_0021 => KeyCode::CONTROL_L,
        0x0100_0023 => KeyCode::ALT_L,
        0x0100_0030..=0x0100_0047 => {
            KeyCode::function((key - 0x0100_0030) as u32 + 1).unwrap_or(KeyCode::VOID)
        }
        0x0100_1103 => KeyCode::ALT_R,
        0x01ff_ffff => KeyCode::VOID,
        0x20 => KeyCode::from_char(' '),
        key if key >= 0 => KeyCode(key as u32 + 32),
        _ => KeyCode::VOID,
    }
}
