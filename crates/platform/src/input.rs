//! Pointer tracking for orbit drags and clicks.

use std::collections::HashSet;

pub use winit::keyboard::KeyCode;

/// Cursor travel, in pixels, above which a left-button gesture counts as a
/// drag instead of a click.
pub const CLICK_DRAG_THRESHOLD: f32 = 4.0;

/// Mouse button identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
    Other,
}

impl From<winit::event::MouseButton> for MouseButton {
    fn from(button: winit::event::MouseButton) -> Self {
        match button {
            winit::event::MouseButton::Left => MouseButton::Left,
            winit::event::MouseButton::Right => MouseButton::Right,
            winit::event::MouseButton::Middle => MouseButton::Middle,
            _ => MouseButton::Other,
        }
    }
}

/// Pointer position, held buttons, and how far the current left-button
/// gesture has travelled.
#[derive(Debug, Default)]
pub struct PointerState {
    position: (f32, f32),
    pressed_buttons: HashSet<MouseButton>,
    /// Path length of the current left-button gesture.
    travel: f32,
}

impl PointerState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a cursor move and return the delta from the previous position.
    pub fn on_mouse_moved(&mut self, x: f32, y: f32) -> (f32, f32) {
        let (old_x, old_y) = self.position;
        let delta = (x - old_x, y - old_y);
        self.position = (x, y);
        if self.is_pressed(MouseButton::Left) {
            self.travel += delta.0.hypot(delta.1);
        }
        delta
    }

    pub fn on_mouse_pressed(&mut self, button: MouseButton) {
        if self.pressed_buttons.insert(button) && button == MouseButton::Left {
            self.travel = 0.0;
        }
    }

    /// Record a button release. Returns the pointer position if this release
    /// completes a left click.
    pub fn on_mouse_released(&mut self, button: MouseButton) -> Option<(f32, f32)> {
        let was_pressed = self.pressed_buttons.remove(&button);
        (was_pressed && button == MouseButton::Left && self.travel <= CLICK_DRAG_THRESHOLD)
            .then_some(self.position)
    }

    /// Forget held buttons, e.g. when the window loses focus mid-gesture.
    pub fn clear_buttons(&mut self) {
        self.pressed_buttons.clear();
        self.travel = 0.0;
    }

    pub fn is_pressed(&self, button: MouseButton) -> bool {
        self.pressed_buttons.contains(&button)
    }

    /// Whether the left button is held and has moved past the click
    /// threshold.
    pub fn is_dragging(&self) -> bool {
        self.is_pressed(MouseButton::Left) && self.travel > CLICK_DRAG_THRESHOLD
    }

    pub fn position(&self) -> (f32, f32) {
        self.position
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_press_release_is_click() {
        let mut pointer = PointerState::new();
        pointer.on_mouse_moved(100.0, 50.0);
        pointer.on_mouse_pressed(MouseButton::Left);
        pointer.on_mouse_moved(101.0, 51.0);
        assert!(!pointer.is_dragging());
        assert_eq!(
            pointer.on_mouse_released(MouseButton::Left),
            Some((101.0, 51.0))
        );
    }

    #[test]
    fn test_drag_is_not_click() {
        let mut pointer = PointerState::new();
        pointer.on_mouse_pressed(MouseButton::Left);
        let delta = pointer.on_mouse_moved(30.0, 40.0);
        assert_eq!(delta, (30.0, 40.0));
        assert!(pointer.is_dragging());
        assert_eq!(pointer.on_mouse_released(MouseButton::Left), None);
    }

    #[test]
    fn test_travel_resets_per_gesture() {
        let mut pointer = PointerState::new();
        pointer.on_mouse_pressed(MouseButton::Left);
        pointer.on_mouse_moved(50.0, 0.0);
        pointer.on_mouse_released(MouseButton::Left);

        pointer.on_mouse_pressed(MouseButton::Left);
        assert!(pointer.on_mouse_released(MouseButton::Left).is_some());
    }

    #[test]
    fn test_other_buttons_never_click() {
        let mut pointer = PointerState::new();
        pointer.on_mouse_pressed(MouseButton::Right);
        assert_eq!(pointer.on_mouse_released(MouseButton::Right), None);
        assert_eq!(pointer.on_mouse_released(MouseButton::Left), None);
    }

    #[test]
    fn test_moves_without_button_do_not_accumulate() {
        let mut pointer = PointerState::new();
        pointer.on_mouse_moved(500.0, 500.0);
        pointer.on_mouse_pressed(MouseButton::Left);
        assert!(!pointer.is_dragging());
        assert!(pointer.on_mouse_released(MouseButton::Left).is_some());
    }
}
