//! Keyboard to controller button mapping
//!
//! The mapping is built once and never changes afterwards. Each key maps to
//! exactly one button; every button has at least one key.

use crate::button::Button;
use crate::keyboard::KeyCode;
use dm_core::config::KeyboardMapping;
use dm_core::InputError;
use std::collections::HashMap;

/// Immutable key to button table
#[derive(Debug, Clone)]
pub struct ButtonMapping {
    keys: HashMap<KeyCode, Button>,
}

impl ButtonMapping {
    /// Arrows for the d-pad, Z/X for A/B, Enter for Start, Backspace for
    /// Select
    pub fn default_keyboard_mapping() -> Self {
        let keys = HashMap::from([
            (KeyCode::Left, Button::Left),
            (KeyCode::Right, Button::Right),
            (KeyCode::Up, Button::Up),
            (KeyCode::Down, Button::Down),
            (KeyCode::Z, Button::A),
            (KeyCode::X, Button::B),
            (KeyCode::Enter, Button::Start),
            (KeyCode::Backspace, Button::Select),
        ]);
        Self { keys }
    }

    /// Build the mapping from configured key names
    pub fn from_config(config: &KeyboardMapping) -> Result<Self, InputError> {
        let entries = [
            (Button::Left, &config.left),
            (Button::Right, &config.right),
            (Button::Up, &config.up),
            (Button::Down, &config.down),
            (Button::A, &config.a),
            (Button::B, &config.b),
            (Button::Start, &config.start),
            (Button::Select, &config.select),
        ];

        let mut keys = HashMap::with_capacity(entries.len());
        for (button, name) in entries {
            if name.trim().is_empty() {
                return Err(InputError::UnboundButton(button.name()));
            }
            let key: KeyCode = name.parse().map_err(|()| InputError::UnknownKey {
                button: button.name(),
                key: name.clone(),
            })?;
            if let Some(first) = keys.insert(key, button) {
                return Err(InputError::DuplicateKey {
                    key: key.name(),
                    first: first.name(),
                    second: button.name(),
                });
            }
        }

        Ok(Self { keys })
    }

    /// Button bound to `key`
    pub fn get(&self, key: KeyCode) -> Option<Button> {
        self.keys.get(&key).copied()
    }

    /// Keys bound to `button`
    pub fn keys_for(&self, button: Button) -> Vec<KeyCode> {
        self.keys
            .iter()
            .filter(|&(_, &b)| b == button)
            .map(|(&k, _)| k)
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (KeyCode, Button)> + '_ {
        self.keys.iter().map(|(&k, &b)| (k, b))
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

impl Default for ButtonMapping {
    fn default() -> Self {
        Self::default_keyboard_mapping()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_keyboard_mapping() {
        let mapping = ButtonMapping::default_keyboard_mapping();
        assert_eq!(mapping.len(), 8);
        assert_eq!(mapping.get(KeyCode::Z), Some(Button::A));
        assert_eq!(mapping.get(KeyCode::X), Some(Button::B));
        assert_eq!(mapping.get(KeyCode::Enter), Some(Button::Start));
        assert_eq!(mapping.get(KeyCode::Backspace), Some(Button::Select));
        assert_eq!(mapping.get(KeyCode::Up), Some(Button::Up));
        assert_eq!(mapping.get(KeyCode::Q), None);
    }

    #[test]
    fn test_every_button_is_reachable() {
        for mapping in [
            ButtonMapping::default_keyboard_mapping(),
            ButtonMapping::from_config(&KeyboardMapping::default()).unwrap(),
        ] {
            for button in Button::ALL {
                assert!(
                    !mapping.keys_for(button).is_empty(),
                    "{button} has no key"
                );
            }
        }
    }

    #[test]
    fn test_config_defaults_match_builtin_table() {
        let from_config = ButtonMapping::from_config(&KeyboardMapping::default()).unwrap();
        let builtin = ButtonMapping::default_keyboard_mapping();
        for (key, button) in builtin.iter() {
            assert_eq!(from_config.get(key), Some(button));
        }
    }

    #[test]
    fn test_custom_binding() {
        let config = KeyboardMapping {
            a: "K".to_string(),
            b: "J".to_string(),
            ..KeyboardMapping::default()
        };
        let mapping = ButtonMapping::from_config(&config).unwrap();
        assert_eq!(mapping.get(KeyCode::K), Some(Button::A));
        assert_eq!(mapping.get(KeyCode::Z), None);
    }

    #[test]
    fn test_unknown_key_rejected() {
        let config = KeyboardMapping {
            start: "Hyper".to_string(),
            ..KeyboardMapping::default()
        };
        assert_eq!(
            ButtonMapping::from_config(&config).unwrap_err(),
            InputError::UnknownKey {
                button: "Start",
                key: "Hyper".to_string()
            }
        );
    }

    #[test]
    fn test_unbound_button_rejected() {
        let config = KeyboardMapping {
            select: String::new(),
            ..KeyboardMapping::default()
        };
        assert_eq!(
            ButtonMapping::from_config(&config).unwrap_err(),
            InputError::UnboundButton("Select")
        );
    }

    #[test]
    fn test_duplicate_key_rejected() {
        let config = KeyboardMapping {
            b: "Z".to_string(),
            ..KeyboardMapping::default()
        };
        assert!(matches!(
            ButtonMapping::from_config(&config).unwrap_err(),
            InputError::DuplicateKey { first: "A", second: "B", .. }
        ));
    }
}
