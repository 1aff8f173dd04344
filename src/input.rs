//! Keyboard and mouse state collected between frames.

use std::collections::HashSet;

use winit::event::{ElementState, KeyEvent, MouseButton, MouseScrollDelta, WindowEvent};
use winit::keyboard::{KeyCode, PhysicalKey};

/// Pixels of touchpad scrolling that count as one wheel notch.
const PIXELS_PER_LINE: f64 = 20.0;

/// One-shot commands triggered by a key or button press.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    ToggleFlashlight,
    ToggleVsync,
    ToggleFullscreen,
    ReleaseCursor,
    GrabCursor,
    ResetFov,
    CycleTint(TintChannel),
}

/// Colour channel stepped by the R, G and B keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TintChannel {
    Red,
    Green,
    Blue,
}

impl Action {
    fn for_key(key: KeyCode) -> Option<Self> {
        match key {
            KeyCode::KeyF => Some(Action::ToggleFlashlight),
            KeyCode::F10 => Some(Action::ToggleVsync),
            KeyCode::F11 => Some(Action::ToggleFullscreen),
            KeyCode::Escape => Some(Action::ReleaseCursor),
            KeyCode::KeyR => Some(Action::CycleTint(TintChannel::Red)),
            KeyCode::KeyG => Some(Action::CycleTint(TintChannel::Green)),
            KeyCode::KeyB => Some(Action::CycleTint(TintChannel::Blue)),
            _ => None,
        }
    }

    fn for_button(button: MouseButton) -> Option<Self> {
        match button {
            MouseButton::Right => Some(Action::GrabCursor),
            MouseButton::Middle => Some(Action::ResetFov),
            _ => None,
        }
    }
}

/// Accumulated mouse-look deltas while the cursor is captured.
///
/// The first motion sample after capture is dropped; platforms report the
/// jump from the old cursor position there.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct MouseLook {
    captured: bool,
    skip_next: bool,
    pending: (f64, f64),
}

impl MouseLook {
    pub fn captured(&self) -> bool {
        self.captured
    }

    pub fn capture(&mut self) {
        self.captured = true;
        self.skip_next = true;
        self.pending = (0.0, 0.0);
    }

    pub fn release(&mut self) {
        self.captured = false;
        self.pending = (0.0, 0.0);
    }

    pub fn motion(&mut self, dx: f64, dy: f64) {
        if !self.captured {
            return;
        }
        if self.skip_next {
            self.skip_next = false;
            return;
        }
        self.pending.0 += dx;
        self.pending.1 += dy;
    }

    pub fn take_delta(&mut self) -> (f64, f64) {
        std::mem::take(&mut self.pending)
    }
}

#[derive(Debug, Default)]
pub struct InputState {
    held: HashSet<KeyCode>,
    actions: Vec<Action>,
    scroll: f32,
    pub mouse: MouseLook,
}

impl InputState {
    pub fn press(&mut self, key: KeyCode) {
        if self.held.insert(key) {
            if let Some(action) = Action::for_key(key) {
                self.actions.push(action);
            }
        }
    }

    pub fn release(&mut self, key: KeyCode) {
        self.held.remove(&key);
    }

    pub fn is_held(&self, key: KeyCode) -> bool {
        self.held.contains(&key)
    }

    pub fn click(&mut self, button: MouseButton) {
        if let Some(action) = Action::for_button(button) {
            self.actions.push(action);
        }
    }

    /// Wheel notches, positive away from the user.
    pub fn scroll(&mut self, lines: f32) {
        self.scroll += lines;
    }

    /// Drops held keys, used when the window loses focus.
    pub fn clear_held(&mut self) {
        self.held.clear();
    }

    pub fn take_actions(&mut self) -> Vec<Action> {
        std::mem::take(&mut self.actions)
    }

    pub fn take_scroll(&mut self) -> f32 {
        std::mem::take(&mut self.scroll)
    }

    /// Returns `true` if the event was consumed.
    pub fn handle_window_event(&mut self, event: &WindowEvent) -> bool {
        match event {
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(code),
                        state,
                        ..
                    },
                ..
            } => {
                match state {
                    ElementState::Pressed => self.press(*code),
                    ElementState::Released => self.release(*code),
                }
                true
            }
            WindowEvent::MouseInput {
                state: ElementState::Pressed,
                button,
                ..
            } => {
                self.click(*button);
                true
            }
            WindowEvent::MouseWheel { delta, .. } => {
                let lines = match delta {
                    MouseScrollDelta::LineDelta(_, y) => *y,
                    MouseScrollDelta::PixelDelta(pos) => (pos.y / PIXELS_PER_LINE) as f32,
                };
                self.scroll(lines);
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn held_keys_fire_actions_once() {
        let mut input = InputState::default();
        input.press(KeyCode::KeyF);
        input.press(KeyCode::KeyF);
        assert!(input.is_held(KeyCode::KeyF));
        assert_eq!(input.take_actions(), vec![Action::ToggleFlashlight]);
        assert!(input.take_actions().is_empty());

        input.release(KeyCode::KeyF);
        input.press(KeyCode::KeyF);
        assert_eq!(input.take_actions(), vec![Action::ToggleFlashlight]);
    }

    #[test]
    fn colour_keys_cycle_their_channel() {
        let mut input = InputState::default();
        input.press(KeyCode::KeyR);
        input.press(KeyCode::KeyB);
        input.press(KeyCode::KeyG);
        assert_eq!(
            input.take_actions(),
            vec![
                Action::CycleTint(TintChannel::Red),
                Action::CycleTint(TintChannel::Blue),
                Action::CycleTint(TintChannel::Green),
            ]
        );
    }

    #[test]
    fn movement_keys_have_no_action() {
        let mut input = InputState::default();
        input.press(KeyCode::KeyW);
        input.press(KeyCode::ShiftLeft);
        assert!(input.take_actions().is_empty());
        input.clear_held();
        assert!(!input.is_held(KeyCode::KeyW));
    }

    #[test]
    fn buttons_map_to_actions() {
        let mut input = InputState::default();
        input.click(MouseButton::Left);
        input.click(MouseButton::Right);
        input.click(MouseButton::Middle);
        assert_eq!(input.take_actions(), vec![Action::GrabCursor, Action::ResetFov]);
    }

    #[test]
    fn scroll_accumulates_until_taken() {
        let mut input = InputState::default();
        input.scroll(1.0);
        input.scroll(2.0);
        assert_eq!(input.take_scroll(), 3.0);
        assert_eq!(input.take_scroll(), 0.0);
    }

    #[test]
    fn first_sample_after_capture_is_dropped() {
        let mut look = MouseLook::default();
        look.motion(5.0, 5.0);
        assert_eq!(look.take_delta(), (0.0, 0.0));

        look.capture();
        look.motion(400.0, -300.0);
        look.motion(3.0, 4.0);
        look.motion(1.0, 1.0);
        assert_eq!(look.take_delta(), (4.0, 5.0));

        look.release();
        look.motion(1.0, 1.0);
        assert_eq!(look.take_delta(), (0.0, 0.0));
        assert!(!look.captured());
    }
}
