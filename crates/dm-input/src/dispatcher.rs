//! Key event dispatch
//!
//! Resolves key events through the [`ButtonMapping`] and forwards them to
//! the one registered [`ButtonListener`]. The dispatcher only keeps a weak
//! reference; a listener that has been dropped simply stops receiving
//! events.

use crate::button::Button;
use crate::keyboard::{KeyCode, KeyEvent, KeyEventType};
use crate::mapping::ButtonMapping;
use parking_lot::RwLock;
use std::sync::{Arc, Weak};

/// Receiver of controller button events, usually the engine's joypad
pub trait ButtonListener: Send + Sync {
    fn on_button_press(&self, button: Button);
    fn on_button_release(&self, button: Button);
}

pub struct InputDispatcher {
    mapping: ButtonMapping,
    listener: RwLock<Option<Weak<dyn ButtonListener>>>,
}

impl InputDispatcher {
    pub fn new(mapping: ButtonMapping) -> Self {
        Self {
            mapping,
            listener: RwLock::new(None),
        }
    }

    /// Register `listener`, replacing any previous registration
    pub fn register_listener<L: ButtonListener + 'static>(&self, listener: &Arc<L>) {
        let weak: Weak<L> = Arc::downgrade(listener);
        *self.listener.write() = Some(weak);
        tracing::debug!("Button listener registered");
    }

    pub fn unregister_listener(&self) {
        *self.listener.write() = None;
    }

    /// Whether a live listener is registered
    pub fn has_listener(&self) -> bool {
        self.current_listener().is_some()
    }

    /// Returns `true` if the key was mapped and delivered
    pub fn on_key_down(&self, key: KeyCode) -> bool {
        self.dispatch(KeyEvent::down(key))
    }

    /// Returns `true` if the key was mapped and delivered
    pub fn on_key_up(&self, key: KeyCode) -> bool {
        self.dispatch(KeyEvent::up(key))
    }

    /// Route `event` by its down/up type
    pub fn dispatch(&self, event: KeyEvent) -> bool {
        let Some(button) = self.mapping.get(event.key) else {
            tracing::trace!("Ignoring unmapped key {}", event.key);
            return false;
        };
        let Some(listener) = self.current_listener() else {
            tracing::trace!("No listener for {} ({:?})", button, event.event_type);
            return false;
        };

        match event.event_type {
            KeyEventType::KeyDown => listener.on_button_press(button),
            KeyEventType::KeyUp => listener.on_button_release(button),
        }
        true
    }

    fn current_listener(&self) -> Option<Arc<dyn ButtonListener>> {
        self.listener.read().as_ref().and_then(Weak::upgrade)
    }
}

impl Default for InputDispatcher {
    fn default() -> Self {
        Self::new(ButtonMapping::default_keyboard_mapping())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    #[derive(Default)]
    struct Recorder {
        events: Mutex<Vec<(Button, bool)>>,
    }

    impl ButtonListener for Recorder {
        fn on_button_press(&self, button: Button) {
            self.events.lock().push((button, true));
        }

        fn on_button_release(&self, button: Button) {
            self.events.lock().push((button, false));
        }
    }

    #[test]
    fn test_press_and_release_delivered() {
        let dispatcher = InputDispatcher::default();
        let recorder = Arc::new(Recorder::default());
        dispatcher.register_listener(&recorder);

        assert!(dispatcher.on_key_down(KeyCode::Z));
        assert!(dispatcher.on_key_up(KeyCode::Z));
        assert!(dispatcher.dispatch(KeyEvent::down(KeyCode::Enter)));
        assert!(dispatcher.dispatch(KeyEvent::up(KeyCode::Enter)));

        assert_eq!(
            *recorder.events.lock(),
            vec![
                (Button::A, true),
                (Button::A, false),
                (Button::Start, true),
                (Button::Start, false)
            ]
        );
    }

    /// A listener behind a concrete `Arc<T>` is stored as a trait object
    #[test]
    fn test_register_concrete_listener_type() {
        fn register<L: ButtonListener + 'static>(dispatcher: &InputDispatcher, listener: &Arc<L>) {
            dispatcher.register_listener(listener);
        }

        let dispatcher = InputDispatcher::default();
        let recorder: Arc<Recorder> = Arc::new(Recorder::default());
        register(&dispatcher, &recorder);

        assert!(dispatcher.has_listener());
        assert!(dispatcher.on_key_down(KeyCode::Backspace));
        assert_eq!(*recorder.events.lock(), vec![(Button::Select, true)]);
    }

    #[test]
    fn test_unmapped_key_ignored() {
        let dispatcher = InputDispatcher::default();
        let recorder = Arc::new(Recorder::default());
        dispatcher.register_listener(&recorder);

        assert!(!dispatcher.on_key_down(KeyCode::Q));
        assert!(recorder.events.lock().is_empty());
    }

    #[test]
    fn test_no_listener_discards_silently() {
        let dispatcher = InputDispatcher::default();
        assert!(!dispatcher.has_listener());
        assert!(!dispatcher.on_key_down(KeyCode::Left));
        assert!(!dispatcher.on_key_up(KeyCode::Left));
    }

    #[test]
    fn test_registration_replaces_previous_listener() {
        let dispatcher = InputDispatcher::default();
        let first = Arc::new(Recorder::default());
        let second = Arc::new(Recorder::default());

        dispatcher.register_listener(&first);
        dispatcher.register_listener(&second);
        dispatcher.on_key_down(KeyCode::X);

        assert!(first.events.lock().is_empty());
        assert_eq!(*second.events.lock(), vec![(Button::B, true)]);
    }

    #[test]
    fn test_dropped_listener_is_not_kept_alive() {
        let dispatcher = InputDispatcher::default();
        let recorder = Arc::new(Recorder::default());
        dispatcher.register_listener(&recorder);
        assert!(dispatcher.has_listener());

        drop(recorder);
        assert!(!dispatcher.has_listener());
        assert!(!dispatcher.on_key_down(KeyCode::Up));
    }

    #[test]
    fn test_unregister() {
        let dispatcher = InputDispatcher::default();
        let recorder = Arc::new(Recorder::default());
        dispatcher.register_listener(&recorder);
        dispatcher.unregister_listener();

        assert!(!dispatcher.on_key_down(KeyCode::Down));
        assert!(recorder.events.lock().is_empty());
    }

    #[test]
    fn test_key_repeat_is_not_suppressed() {
        let dispatcher = InputDispatcher::default();
        let recorder = Arc::new(Recorder::default());
        dispatcher.register_listener(&recorder);

        dispatcher.on_key_down(KeyCode::Right);
        dispatcher.on_key_down(KeyCode::Right);
        assert_eq!(recorder.events.lock().len(), 2);
    }
}
