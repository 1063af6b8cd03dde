//! Keyboard and mouse state.
//!
//! Raw device events are folded into an [`InputState`] once per event, and
//! per-frame edges (`pressed` / `released`, scroll, motion) are cleared at
//! the start of every frame by [`InputState::pre_update`]. Systems then read
//! the state instead of the event stream.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::geometry::{Rect, Vec2};

// ---------------------------------------------------------------------------
// ButtonState
// ---------------------------------------------------------------------------

/// Edge and level state of one key or mouse button.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ButtonState {
    /// True only on the frame the button went down.
    pub pressed: bool,
    /// True only on the frame the button went up.
    pub released: bool,
    /// True on every frame the button is down.
    pub held: bool,
}

impl ButtonState {
    /// Key repeat while held does not produce a second `pressed` edge.
    pub fn press(&mut self) {
        if !self.held {
            self.pressed = true;
        }
        self.held = true;
    }

    pub fn release(&mut self) {
        self.released = true;
        self.held = false;
    }

    pub fn reset_edges(&mut self) {
        self.pressed = false;
        self.released = false;
    }
}

// ---------------------------------------------------------------------------
// Key / MouseButton / InputEvent
// ---------------------------------------------------------------------------

/// Physical key, identified by its USB HID scancode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Key(pub u16);

impl Key {
    pub const A: Key = Key(4);
    pub const D: Key = Key(7);
    pub const E: Key = Key(8);
    pub const R: Key = Key(21);
    pub const S: Key = Key(22);
    pub const W: Key = Key(26);
    pub const RETURN: Key = Key(40);
    pub const ESCAPE: Key = Key(41);
    pub const TAB: Key = Key(43);
    pub const SPACE: Key = Key(44);
    pub const RIGHT: Key = Key(79);
    pub const LEFT: Key = Key(80);
    pub const DOWN: Key = Key(81);
    pub const UP: Key = Key(82);
    pub const LSHIFT: Key = Key(225);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
}

/// A device event as delivered by the platform layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum InputEvent {
    KeyDown(Key),
    KeyUp(Key),
    /// Absolute cursor position in logical screen coordinates.
    MouseMotion { x: f32, y: f32 },
    MouseButtonDown(MouseButton),
    MouseButtonUp(MouseButton),
    /// Vertical wheel movement; positive scrolls up.
    MouseWheel { y: i32 },
}

// ---------------------------------------------------------------------------
// InputState
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MouseState {
    pub position: Vec2,
    /// Cursor movement accumulated during the current frame.
    pub motion: Vec2,
    pub left: ButtonState,
    pub right: ButtonState,
    pub middle: ButtonState,
    pub scroll_up: bool,
    pub scroll_down: bool,
}

impl MouseState {
    pub fn button(&self, button: MouseButton) -> &ButtonState {
        match button {
            MouseButton::Left => &self.left,
            MouseButton::Right => &self.right,
            MouseButton::Middle => &self.middle,
        }
    }

    fn button_mut(&mut self, button: MouseButton) -> &mut ButtonState {
        match button {
            MouseButton::Left => &mut self.left,
            MouseButton::Right => &mut self.right,
            MouseButton::Middle => &mut self.middle,
        }
    }
}

/// Aggregated keyboard and mouse state for the current frame.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InputState {
    keys: BTreeMap<Key, ButtonState>,
    pub mouse: MouseState,
    any_key: ButtonState,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start-of-frame reset.
    ///
    /// `any_key` is rebuilt from the keyboard after the edges are cleared, so
    /// it only reports `held` on this frame; edges show up once events for
    /// the new frame are handled.
    pub fn pre_update(&mut self) {
        self.mouse.left.reset_edges();
        self.mouse.right.reset_edges();
        self.mouse.middle.reset_edges();
        for state in self.keys.values_mut() {
            state.reset_edges();
        }

        self.any_key = ButtonState::default();
        for state in self.keys.values() {
            self.any_key.pressed |= state.pressed;
            self.any_key.released |= state.released;
            self.any_key.held |= state.held;
        }

        self.mouse.scroll_up = false;
        self.mouse.scroll_down = false;
        self.mouse.motion = Vec2::ZERO;
    }

    pub fn handle_event(&mut self, event: &InputEvent) {
        match *event {
            InputEvent::KeyDown(key) => {
                let state = self.keys.entry(key).or_default();
                state.press();
                self.any_key.pressed |= state.pressed;
                self.any_key.held = true;
            }
            InputEvent::KeyUp(key) => {
                self.keys.entry(key).or_default().release();
                self.any_key.released = true;
                self.any_key.held = self.keys.values().any(|k| k.held);
            }
            InputEvent::MouseMotion { x, y } => {
                let position = Vec2::new(x, y);
                self.mouse.motion += position - self.mouse.position;
                self.mouse.position = position;
            }
            InputEvent::MouseButtonDown(button) => self.mouse.button_mut(button).press(),
            InputEvent::MouseButtonUp(button) => self.mouse.button_mut(button).release(),
            InputEvent::MouseWheel { y } => {
                if y > 0 {
                    self.mouse.scroll_up = true;
                }
                if y < 0 {
                    self.mouse.scroll_down = true;
                }
            }
        }
    }

    /// State of `key`; keys never seen are reported as up.
    pub fn key(&self, key: Key) -> ButtonState {
        self.keys.get(&key).copied().unwrap_or_default()
    }

    pub fn any_key(&self) -> ButtonState {
        self.any_key
    }

    /// Whether the cursor is inside `rect`, edges included.
    pub fn mouse_is_on_rect(&self, rect: Rect) -> bool {
        let p = self.mouse.position;
        p.x >= rect.x as f32
            && p.x <= rect.right() as f32
            && p.y >= rect.y as f32
            && p.y <= rect.bottom() as f32
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn press_sets_edge_once() {
        let mut input = InputState::new();
        input.handle_event(&InputEvent::KeyDown(Key::W));
        assert!(input.key(Key::W).pressed);
        assert!(input.key(Key::W).held);

        input.pre_update();
        // Key repeat.
        input.handle_event(&InputEvent::KeyDown(Key::W));
        assert!(!input.key(Key::W).pressed);
        assert!(input.key(Key::W).held);
    }

    #[test]
    fn release_clears_held() {
        let mut input = InputState::new();
        input.handle_event(&InputEvent::KeyDown(Key::SPACE));
        input.pre_update();
        input.handle_event(&InputEvent::KeyUp(Key::SPACE));
        let state = input.key(Key::SPACE);
        assert!(state.released);
        assert!(!state.held);

        input.pre_update();
        assert_eq!(input.key(Key::SPACE), ButtonState::default());
    }

    #[test]
    fn unknown_key_is_up() {
        let input = InputState::new();
        assert_eq!(input.key(Key::ESCAPE), ButtonState::default());
    }

    #[test]
    fn any_key_tracks_keyboard() {
        let mut input = InputState::new();
        input.handle_event(&InputEvent::KeyDown(Key::A));
        assert!(input.any_key().pressed);

        input.pre_update();
        assert!(!input.any_key().pressed);
        assert!(input.any_key().held);

        input.handle_event(&InputEvent::KeyUp(Key::A));
        assert!(input.any_key().released);
        assert!(!input.any_key().held);
    }

    #[test]
    fn mouse_motion_and_wheel_reset_each_frame() {
        let mut input = InputState::new();
        input.handle_event(&InputEvent::MouseMotion { x: 10.0, y: 5.0 });
        input.handle_event(&InputEvent::MouseMotion { x: 15.0, y: 5.0 });
        input.handle_event(&InputEvent::MouseWheel { y: -1 });
        assert_eq!(input.mouse.position, Vec2::new(15.0, 5.0));
        assert_eq!(input.mouse.motion, Vec2::new(15.0, 5.0));
        assert!(input.mouse.scroll_down);
        assert!(!input.mouse.scroll_up);

        input.pre_update();
        assert_eq!(input.mouse.motion, Vec2::ZERO);
        assert!(!input.mouse.scroll_down);
        assert_eq!(input.mouse.position, Vec2::new(15.0, 5.0));
    }

    #[test]
    fn mouse_buttons() {
        let mut input = InputState::new();
        input.handle_event(&InputEvent::MouseButtonDown(MouseButton::Right));
        assert!(input.mouse.button(MouseButton::Right).pressed);
        assert!(!input.mouse.button(MouseButton::Left).held);
        input.handle_event(&InputEvent::MouseButtonUp(MouseButton::Right));
        assert!(input.mouse.right.released);
    }

    #[test]
    fn mouse_on_rect_includes_edges() {
        let mut input = InputState::new();
        let rect = Rect::new(0, 0, 100, 50);
        input.handle_event(&InputEvent::MouseMotion { x: 100.0, y: 50.0 });
        assert!(input.mouse_is_on_rect(rect));
        input.handle_event(&InputEvent::MouseMotion { x: 100.5, y: 20.0 });
        assert!(!input.mouse_is_on_rect(rect));
    }
}
