//! Host keyboard keys
//!
//! Key identifiers use USB HID usage codes so that any windowing layer can
//! translate its own key events into them.

use std::fmt;
use std::str::FromStr;

/// Keyboard key codes (USB HID usage codes)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum KeyCode {
    // Letters
    A = 0x04, B = 0x05, C = 0x06, D = 0x07,
    E = 0x08, F = 0x09, G = 0x0A, H = 0x0B,
    I = 0x0C, J = 0x0D, K = 0x0E, L = 0x0F,
    M = 0x10, N = 0x11, O = 0x12, P = 0x13,
    Q = 0x14, R = 0x15, S = 0x16, T = 0x17,
    U = 0x18, V = 0x19, W = 0x1A, X = 0x1B,
    Y = 0x1C, Z = 0x1D,

    // Numbers
    Num1 = 0x1E, Num2 = 0x1F, Num3 = 0x20, Num4 = 0x21,
    Num5 = 0x22, Num6 = 0x23, Num7 = 0x24, Num8 = 0x25,
    Num9 = 0x26, Num0 = 0x27,

    // Special keys
    Enter = 0x28,
    Escape = 0x29,
    Backspace = 0x2A,
    Tab = 0x2B,
    Space = 0x2C,

    // Function keys
    F1 = 0x3A, F2 = 0x3B, F3 = 0x3C, F4 = 0x3D,
    F5 = 0x3E, F6 = 0x3F, F7 = 0x40, F8 = 0x41,
    F9 = 0x42, F10 = 0x43, F11 = 0x44, F12 = 0x45,

    // Arrow keys
    Right = 0x4F,
    Left = 0x50,
    Down = 0x51,
    Up = 0x52,
}

const NAMED_KEYS: &[(KeyCode, &str)] = &[
    (KeyCode::Enter, "Return"),
    (KeyCode::Escape, "Escape"),
    (KeyCode::Backspace, "Backspace"),
    (KeyCode::Tab, "Tab"),
    (KeyCode::Space, "Space"),
    (KeyCode::Right, "Right"),
    (KeyCode::Left, "Left"),
    (KeyCode::Down, "Down"),
    (KeyCode::Up, "Up"),
    (KeyCode::F1, "F1"),
    (KeyCode::F2, "F2"),
    (KeyCode::F3, "F3"),
    (KeyCode::F4, "F4"),
    (KeyCode::F5, "F5"),
    (KeyCode::F6, "F6"),
    (KeyCode::F7, "F7"),
    (KeyCode::F8, "F8"),
    (KeyCode::F9, "F9"),
    (KeyCode::F10, "F10"),
    (KeyCode::F11, "F11"),
    (KeyCode::F12, "F12"),
];

const LETTERS: [KeyCode; 26] = [
    KeyCode::A, KeyCode::B, KeyCode::C, KeyCode::D, KeyCode::E, KeyCode::F,
    KeyCode::G, KeyCode::H, KeyCode::I, KeyCode::J, KeyCode::K, KeyCode::L,
    KeyCode::M, KeyCode::N, KeyCode::O, KeyCode::P, KeyCode::Q, KeyCode::R,
    KeyCode::S, KeyCode::T, KeyCode::U, KeyCode::V, KeyCode::W, KeyCode::X,
    KeyCode::Y, KeyCode::Z,
];

const DIGITS: [KeyCode; 10] = [
    KeyCode::Num0, KeyCode::Num1, KeyCode::Num2, KeyCode::Num3, KeyCode::Num4,
    KeyCode::Num5, KeyCode::Num6, KeyCode::Num7, KeyCode::Num8, KeyCode::Num9,
];

impl KeyCode {
    /// Name used in configuration files
    pub fn name(self) -> String {
        if let Some((_, name)) = NAMED_KEYS.iter().find(|(key, _)| *key == self) {
            return (*name).to_string();
        }
        if let Some(i) = LETTERS.iter().position(|&key| key == self) {
            return char::from(b'A' + i as u8).to_string();
        }
        if let Some(i) = DIGITS.iter().position(|&key| key == self) {
            return char::from(b'0' + i as u8).to_string();
        }
        format!("{self:?}")
    }
}

impl fmt::Display for KeyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

impl FromStr for KeyCode {
    type Err = ();

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let s = raw.trim();

        match s {
            "Enter" | "Return" => return Ok(KeyCode::Enter),
            "ArrowUp" => return Ok(KeyCode::Up),
            "ArrowDown" => return Ok(KeyCode::Down),
            "ArrowLeft" => return Ok(KeyCode::Left),
            "ArrowRight" => return Ok(KeyCode::Right),
            "Back" => return Ok(KeyCode::Backspace),
            _ => {}
        }

        if let Some((key, _)) = NAMED_KEYS.iter().find(|(_, name)| name.eq_ignore_ascii_case(s)) {
            return Ok(*key);
        }

        let mut chars = s.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) if c.is_ascii_alphabetic() => {
                Ok(LETTERS[(c.to_ascii_uppercase() as u8 - b'A') as usize])
            }
            (Some(c), None) if c.is_ascii_digit() => Ok(DIGITS[(c as u8 - b'0') as usize]),
            _ => Err(()),
        }
    }
}

/// Keyboard event type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyEventType {
    KeyDown,
    KeyUp,
}

/// Keyboard event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEvent {
    pub key: KeyCode,
    pub event_type: KeyEventType,
}

impl KeyEvent {
    pub fn down(key: KeyCode) -> Self {
        Self {
            key,
            event_type: KeyEventType::KeyDown,
        }
    }

    pub fn up(key: KeyCode) -> Self {
        Self {
            key,
            event_type: KeyEventType::KeyUp,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_named_keys() {
        assert_eq!("Return".parse::<KeyCode>(), Ok(KeyCode::Enter));
        assert_eq!("Enter".parse::<KeyCode>(), Ok(KeyCode::Enter));
        assert_eq!("backspace".parse::<KeyCode>(), Ok(KeyCode::Backspace));
        assert_eq!("ArrowLeft".parse::<KeyCode>(), Ok(KeyCode::Left));
        assert_eq!(" Up ".parse::<KeyCode>(), Ok(KeyCode::Up));
        assert_eq!("F11".parse::<KeyCode>(), Ok(KeyCode::F11));
    }

    #[test]
    fn test_parse_single_characters() {
        assert_eq!("z".parse::<KeyCode>(), Ok(KeyCode::Z));
        assert_eq!("X".parse::<KeyCode>(), Ok(KeyCode::X));
        assert_eq!("0".parse::<KeyCode>(), Ok(KeyCode::Num0));
        assert_eq!("7".parse::<KeyCode>(), Ok(KeyCode::Num7));
        assert!("".parse::<KeyCode>().is_err());
        assert!("Hyper".parse::<KeyCode>().is_err());
        assert!("?".parse::<KeyCode>().is_err());
    }

    #[test]
    fn test_name_parses_back() {
        for key in [KeyCode::Enter, KeyCode::Q, KeyCode::Num3, KeyCode::Down, KeyCode::F5] {
            assert_eq!(key.name().parse::<KeyCode>(), Ok(key));
        }
    }
}
