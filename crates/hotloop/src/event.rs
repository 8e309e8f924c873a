//! Input events and the pressed-key tracker.

use rustc_hash::FxHashSet;

/// Keys the platform reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Escape,
    Enter,
    Space,
    Tab,
    Backspace,
    Left,
    Right,
    Up,
    Down,
    /// A printable key, lowercased.
    Char(char),
    /// Anything else, by platform scancode.
    Other(u32),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseButton {
    Left,
    Middle,
    Right,
}

/// One input or window event.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    KeyDown(Key),
    KeyUp(Key),
    MouseMoved { x: i32, y: i32 },
    MouseDown(MouseButton),
    MouseUp(MouseButton),
    /// The user asked to close the window. Programs decide what to do.
    CloseRequested,
}

/// Keys currently held down.
///
/// Owned by each program instance and fed every tick's events before
/// `update` runs. A reload starts from an empty state.
#[derive(Debug, Clone, Default)]
pub struct InputState {
    pressed: FxHashSet<Key>,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply a batch of events in order.
    pub fn apply(&mut self, events: &[Event]) {
        for event in events {
            match event {
                Event::KeyDown(key) => {
                    self.pressed.insert(*key);
                }
                Event::KeyUp(key) => {
                    self.pressed.remove(key);
                }
                _ => {}
            }
        }
    }

    pub fn is_pressed(&self, key: Key) -> bool {
        self.pressed.contains(&key)
    }

    pub fn pressed(&self) -> impl Iterator<Item = Key> + '_ {
        self.pressed.iter().copied()
    }

    pub fn clear(&mut self) {
        self.pressed.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_down_then_up() {
        let mut input = InputState::new();
        input.apply(&[Event::KeyDown(Key::Left), Event::KeyDown(Key::Char('a'))]);
        assert!(input.is_pressed(Key::Left));
        assert!(input.is_pressed(Key::Char('a')));

        input.apply(&[Event::KeyUp(Key::Left)]);
        assert!(!input.is_pressed(Key::Left));
        assert!(input.is_pressed(Key::Char('a')));
    }

    #[test]
    fn test_order_within_batch() {
        let mut input = InputState::new();
        input.apply(&[Event::KeyDown(Key::Space), Event::KeyUp(Key::Space)]);
        assert!(!input.is_pressed(Key::Space));

        input.apply(&[Event::KeyUp(Key::Space), Event::KeyDown(Key::Space)]);
        assert!(input.is_pressed(Key::Space));
    }

    #[test]
    fn test_ignores_mouse_events() {
        let mut input = InputState::new();
        input.apply(&[
            Event::MouseMoved { x: 3, y: 4 },
            Event::MouseDown(MouseButton::Left),
            Event::CloseRequested,
        ]);
        assert_eq!(input.pressed().count(), 0);
    }
}
