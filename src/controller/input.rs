/// Platform-agnostic input handling system
use std::collections::HashSet;

/// Platform-independent input events.
///
/// Keys are physical key identifiers as in `KeyboardEvent.code`
/// (`KeyW`, `ArrowUp`, `Digit0`, `ShiftLeft`, ...).
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    // Keyboard events
    KeyDown(String),
    KeyUp(String),

    // Mouse events
    MouseMove { dx: f32, dy: f32 },
    MouseClick { button: MouseButton, is_down: bool },
    MouseWheel { delta_y: f32 },

    // Window events
    FocusLost,
    VisibilityChanged { visible: bool },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
}

impl MouseButton {
    pub fn from_web_button(button: i16) -> Self {
        match button {
            0 => MouseButton::Left,
            1 => MouseButton::Middle,
            2 => MouseButton::Right,
            _ => MouseButton::Left,
        }
    }
}

/// Latched input, written by event callbacks and read once per frame.
///
/// Event handlers only ever touch this struct; geometry is changed by the
/// frame loop alone.
#[derive(Debug, Default)]
pub struct InputState {
    pub pressed_keys: HashSet<String>,
    pub dragging: bool,
    pub orbit_delta: (f32, f32),
    pub zoom_delta: f32,
    pub show_bounds: bool,
    reset_requested: bool,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Process an input event and update state
    pub fn process_event(&mut self, event: &InputEvent) {
        match event {
            InputEvent::KeyDown(key) => {
                self.pressed_keys.insert(key.clone());
            }
            InputEvent::KeyUp(key) => {
                self.pressed_keys.remove(key.as_str());
            }
            InputEvent::MouseMove { dx, dy } => {
                if self.dragging {
                    self.orbit_delta.0 += dx;
                    self.orbit_delta.1 += dy;
                }
            }
            InputEvent::MouseClick { button, is_down } => {
                if *button == MouseButton::Left {
                    self.dragging = *is_down;
                }
            }
            InputEvent::MouseWheel { delta_y } => {
                self.zoom_delta += delta_y;
            }
            InputEvent::FocusLost | InputEvent::VisibilityChanged { .. } => {
                self.clear_keys();
                self.dragging = false;
            }
        }
    }

    pub fn is_key_pressed(&self, key: &str) -> bool {
        self.pressed_keys.contains(key)
    }

    /// True if any of the bound keys is held
    pub fn any_pressed(&self, keys: &[String]) -> bool {
        keys.iter().any(|k| self.pressed_keys.contains(k))
    }

    pub fn clear_keys(&mut self) {
        self.pressed_keys.clear();
    }

    pub fn consume_orbit(&mut self) -> (f32, f32) {
        std::mem::take(&mut self.orbit_delta)
    }

    pub fn consume_zoom(&mut self) -> f32 {
        std::mem::take(&mut self.zoom_delta)
    }

    pub fn request_reset(&mut self) {
        self.reset_requested = true;
    }

    /// Returns the latched reset request and clears it
    pub fn take_reset(&mut self) -> bool {
        std::mem::take(&mut self.reset_requested)
    }

    pub fn toggle_bounds(&mut self) {
        self.show_bounds = !self.show_bounds;
    }
}

/// Key-to-effect table of one entity. Every action lists the keys that
/// trigger it; an empty list disables the action.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct KeyBindings {
    pub forward: Vec<String>,
    pub backward: Vec<String>,
    pub turn_left: Vec<String>,
    pub turn_right: Vec<String>,
    pub tilt_positive: Vec<String>,
    pub tilt_negative: Vec<String>,
    pub jump: Vec<String>,
    pub run: Vec<String>,
}

impl KeyBindings {
    /// Every key any action listens to
    pub fn all_keys(&self) -> impl Iterator<Item = &str> + '_ {
        [
            &self.forward,
            &self.backward,
            &self.turn_left,
            &self.turn_right,
            &self.tilt_positive,
            &self.tilt_negative,
            &self.jump,
            &self.run,
        ]
        .into_iter()
        .flatten()
        .map(String::as_str)
    }
}

/// Routes app-level shortcut keys; everything else goes to the pressed set
#[derive(Debug, Clone)]
pub struct InputProcessor {
    reset_key: String,
    toggle_bounds_key: String,
}

impl InputProcessor {
    pub fn new(reset_key: impl Into<String>, toggle_bounds_key: impl Into<String>) -> Self {
        Self {
            reset_key: reset_key.into(),
            toggle_bounds_key: toggle_bounds_key.into(),
        }
    }

    pub fn handle(&self, state: &mut InputState, event: &InputEvent) {
        if let InputEvent::KeyDown(key) = event {
            // ignore auto-repeat so toggles flip once per press
            let fresh = !state.is_key_pressed(key);
            if fresh && *key == self.reset_key {
                state.request_reset();
            } else if fresh && *key == self.toggle_bounds_key {
                state.toggle_bounds();
            }
        }
        state.process_event(event);
    }
}

#[cfg(target_arch = "wasm32")]
pub mod wasm {
    use super::*;
    use web_sys::{KeyboardEvent, MouseEvent, WheelEvent};

    pub fn keyboard_event_to_input(e: &KeyboardEvent, is_down: bool) -> InputEvent {
        let code = e.code();
        if is_down {
            InputEvent::KeyDown(code)
        } else {
            InputEvent::KeyUp(code)
        }
    }

    pub fn mouse_move_to_input(e: &MouseEvent) -> InputEvent {
        InputEvent::MouseMove { dx: e.movement_x() as f32, dy: e.movement_y() as f32 }
    }

    pub fn mouse_click_to_input(e: &MouseEvent, is_down: bool) -> InputEvent {
        InputEvent::MouseClick {
            button: MouseButton::from_web_button(e.button()),
            is_down,
        }
    }

    pub fn mouse_wheel_to_input(e: &WheelEvent) -> InputEvent {
        InputEvent::MouseWheel { delta_y: e.delta_y() as f32 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn down(k: &str) -> InputEvent {
        InputEvent::KeyDown(k.to_string())
    }

    #[test]
    fn test_keys_are_level_triggered() {
        let mut state = InputState::new();
        state.process_event(&down("KeyW"));
        state.process_event(&down("KeyW"));
        assert!(state.is_key_pressed("KeyW"));
        state.process_event(&InputEvent::KeyUp("KeyW".to_string()));
        assert!(!state.is_key_pressed("KeyW"));
    }

    #[test]
    fn test_focus_loss_clears_keys() {
        let mut state = InputState::new();
        state.process_event(&down("ArrowUp"));
        state.process_event(&InputEvent::MouseClick { button: MouseButton::Left, is_down: true });
        state.process_event(&InputEvent::FocusLost);
        assert!(state.pressed_keys.is_empty());
        assert!(!state.dragging);
    }

    #[test]
    fn test_orbit_only_accumulates_while_dragging() {
        let mut state = InputState::new();
        state.process_event(&InputEvent::MouseMove { dx: 5.0, dy: 1.0 });
        assert_eq!(state.consume_orbit(), (0.0, 0.0));

        state.process_event(&InputEvent::MouseClick { button: MouseButton::Left, is_down: true });
        state.process_event(&InputEvent::MouseMove { dx: 5.0, dy: 1.0 });
        state.process_event(&InputEvent::MouseMove { dx: 2.0, dy: -3.0 });
        assert_eq!(state.consume_orbit(), (7.0, -2.0));
        assert_eq!(state.consume_orbit(), (0.0, 0.0));
    }

    #[test]
    fn test_reset_is_latched_once_per_press() {
        let processor = InputProcessor::new("KeyR", "KeyB");
        let mut state = InputState::new();
        processor.handle(&mut state, &down("KeyR"));
        processor.handle(&mut state, &down("KeyR")); // auto-repeat
        assert!(state.take_reset());
        assert!(!state.take_reset());
    }

    #[test]
    fn test_bounds_toggle() {
        let processor = InputProcessor::new("KeyR", "KeyB");
        let mut state = InputState::new();
        processor.handle(&mut state, &down("KeyB"));
        assert!(state.show_bounds);
        processor.handle(&mut state, &InputEvent::KeyUp("KeyB".to_string()));
        processor.handle(&mut state, &down("KeyB"));
        assert!(!state.show_bounds);
    }

    #[test]
    fn test_any_pressed_matches_alternates() {
        let mut state = InputState::new();
        let jump = vec!["Digit0".to_string(), "Numpad0".to_string()];
        assert!(!state.any_pressed(&jump));
        state.process_event(&down("Numpad0"));
        assert!(state.any_pressed(&jump));
        assert!(!state.any_pressed(&[]));
    }
}
