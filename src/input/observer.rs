//! Gesture classification on the intercept context.

use std::sync::mpsc::Sender;

use super::{Gesture, Key, KeyEventHandler, Modifiers};

/// Turns key-downs into gestures and queues them for the dispatcher.
///
/// Queuing is a non-blocking channel send; nothing else happens here. Every
/// matching key-down queues exactly one gesture, so two quick presses give two
/// validations.
pub struct GestureObserver {
    gestures: Sender<Gesture>,
    navigation: bool,
}

impl GestureObserver {
    pub fn new(gestures: Sender<Gesture>, navigation: bool) -> Self {
        Self {
            gestures,
            navigation,
        }
    }

    pub fn classify(&self, modifiers: Modifiers, key: Key) -> Option<Gesture> {
        if modifiers.primary {
            return (key == Key::C).then_some(Gesture::Copy);
        }
        if !self.navigation || !modifiers.alt {
            return None;
        }
        match key {
            Key::Right => Some(Gesture::NextParagraph),
            Key::Left => Some(Gesture::PreviousParagraph),
            Key::Down => Some(Gesture::PauseCopy),
            Key::Up => Some(Gesture::ResumeCopy),
            _ => None,
        }
    }
}

impl KeyEventHandler for GestureObserver {
    fn on_key_event(&self, modifiers: Modifiers, key: Key) -> bool {
        if let Some(gesture) = self.classify(modifiers, key) {
            // A closed channel means the dispatcher is gone (shutting down).
            let _ = self.gestures.send(gesture);
        }
        false
    }
}
