use std::collections::HashSet;

use glam::Vec2;

/// Identifier for a mouse button (left button is zero).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MouseButton(u8);

impl MouseButton {
    pub const LEFT: Self = Self(0);
    pub const RIGHT: Self = Self(1);
    pub const MIDDLE: Self = Self(2);

    pub fn new(index: u8) -> Self {
        Self(index)
    }

    pub fn index(self) -> u8 {
        self.0
    }
}

/// Pointer state as reported by the window, owned by the event loop thread.
#[derive(Debug, Default)]
pub struct InputState {
    mouse_buttons: HashSet<MouseButton>,
    mouse_position: Option<Vec2>,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_mouse_button_down(&mut self, button: MouseButton) {
        self.mouse_buttons.insert(button);
    }

    pub fn set_mouse_button_up(&mut self, button: MouseButton) {
        self.mouse_buttons.remove(&button);
    }

    pub fn is_mouse_button_down(&self, button: MouseButton) -> bool {
        self.mouse_buttons.contains(&button)
    }

    /// Records a new cursor position and returns the movement since the
    /// previous one.
    ///
    /// The first position ever reported only establishes the reference point
    /// and yields no movement.
    pub fn move_mouse(&mut self, position: Vec2) -> Option<Vec2> {
        let delta = self.mouse_position.map(|last| position - last);
        self.mouse_position = Some(position);
        delta
    }

    /// Last reported cursor position, if the cursor has moved yet.
    pub fn mouse_position(&self) -> Option<Vec2> {
        self.mouse_position
    }
}
