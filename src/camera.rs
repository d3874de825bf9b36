//! Orbit camera parameters and the pointer handlers that drive them.

use std::ops::RangeInclusive;

use glam::Vec2;

use crate::input::{InputState, MouseButton};
use crate::math::Vector3;

/// Radians of orbit per pixel of horizontal drag, and units of height per
/// pixel of vertical drag.
pub const DRAG_SENSITIVITY: f32 = 0.01;
/// Units of radius per scroll line.
pub const SCROLL_SENSITIVITY: f32 = 0.1;
/// Pixels of a high resolution scroll delta that count as one line.
pub const PIXELS_PER_SCROLL_LINE: f32 = 20.0;

/// Orbit around the origin: distance, angle around +Y, and eye height.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraState {
    pub radius: f32,
    pub azimuth: f32,
    pub height: f32,
}

impl CameraState {
    pub const RADIUS_RANGE: RangeInclusive<f32> = 1.0..=10.0;
    pub const HEIGHT_RANGE: RangeInclusive<f32> = -1.5..=1.5;

    /// Eye position in world space.
    pub fn position(&self) -> Vector3 {
        Vector3::new(
            self.radius * self.azimuth.cos(),
            self.height,
            self.radius * self.azimuth.sin(),
        )
    }

    /// Applies a pointer drag in pixels. Screen y grows downward, so dragging
    /// up raises the camera. Non-finite deltas are ignored.
    pub fn orbit(&mut self, dx: f32, dy: f32) {
        if !(dx.is_finite() && dy.is_finite()) {
            return;
        }
        self.azimuth += dx * DRAG_SENSITIVITY;
        self.height = clamp(self.height - dy * DRAG_SENSITIVITY, &Self::HEIGHT_RANGE);
    }

    /// Applies a scroll of `lines`; positive values zoom in. Non-finite
    /// scrolls are ignored.
    pub fn zoom(&mut self, lines: f32) {
        if !lines.is_finite() {
            return;
        }
        self.radius = clamp(self.radius - lines * SCROLL_SENSITIVITY, &Self::RADIUS_RANGE);
    }
}

impl Default for CameraState {
    fn default() -> Self {
        Self {
            radius: 3.0,
            azimuth: 0.0,
            height: 0.0,
        }
    }
}

fn clamp(value: f32, range: &RangeInclusive<f32>) -> f32 {
    value.clamp(*range.start(), *range.end())
}

/// Translates window pointer events into camera motion.
#[derive(Debug, Default)]
pub struct OrbitController {
    camera: CameraState,
    input: InputState,
}

impl OrbitController {
    pub fn new(camera: CameraState) -> Self {
        Self {
            camera,
            input: InputState::new(),
        }
    }

    pub fn camera(&self) -> &CameraState {
        &self.camera
    }

    pub fn on_mouse_button(&mut self, button: MouseButton, pressed: bool) {
        if pressed {
            self.input.set_mouse_button_down(button);
        } else {
            self.input.set_mouse_button_up(button);
        }
    }

    /// Cursor moved to `(x, y)` in window pixels. The reference position is
    /// tracked whether or not a button is held, so a drag never jumps.
    /// Positions outside the `f32` range are dropped.
    pub fn on_cursor_moved(&mut self, x: f64, y: f64) {
        let position = Vec2::new(x as f32, y as f32);
        if !position.is_finite() {
            return;
        }
        let Some(delta) = self.input.move_mouse(position) else {
            return;
        };
        if self.input.is_mouse_button_down(MouseButton::LEFT) {
            self.camera.orbit(delta.x, delta.y);
        }
    }

    /// Scroll wheel moved by `(dx, dy)` lines.
    pub fn on_scroll(&mut self, _dx: f32, dy: f32) {
        self.camera.zoom(dy);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f32 = 1e-5;

    fn dragging() -> OrbitController {
        let mut controller = OrbitController::default();
        controller.on_mouse_button(MouseButton::LEFT, true);
        controller
    }

    #[test]
    fn default_camera_sits_on_positive_x() {
        let camera = CameraState::default();
        assert!(camera
            .position()
            .abs_diff_eq(Vector3::new(3.0, 0.0, 0.0), EPS));
    }

    #[test]
    fn first_cursor_move_applies_no_delta() {
        let mut controller = dragging();
        controller.on_cursor_moved(900.0, 10.0);
        assert_eq!(*controller.camera(), CameraState::default());
    }

    #[test]
    fn drag_updates_azimuth_and_height() {
        let mut controller = dragging();
        controller.on_cursor_moved(400.0, 300.0);
        controller.on_cursor_moved(450.0, 280.0);
        let camera = controller.camera();
        assert!((camera.azimuth - 0.5).abs() < EPS);
        assert!((camera.height - 0.2).abs() < EPS);
    }

    #[test]
    fn moves_without_button_only_track_position() {
        let mut controller = OrbitController::default();
        controller.on_cursor_moved(0.0, 0.0);
        controller.on_cursor_moved(100.0, 100.0);
        assert_eq!(*controller.camera(), CameraState::default());

        // the reference point followed the cursor, so the next drag is small
        controller.on_mouse_button(MouseButton::LEFT, true);
        controller.on_cursor_moved(110.0, 100.0);
        assert!((controller.camera().azimuth - 0.1).abs() < EPS);
    }

    #[test]
    fn latch_does_not_reset_after_release() {
        let mut controller = dragging();
        controller.on_cursor_moved(0.0, 0.0);
        controller.on_mouse_button(MouseButton::LEFT, false);
        controller.on_mouse_button(MouseButton::LEFT, true);
        controller.on_cursor_moved(20.0, 0.0);
        assert!((controller.camera().azimuth - 0.2).abs() < EPS);
    }

    #[test]
    fn right_button_does_not_orbit() {
        let mut controller = OrbitController::default();
        controller.on_mouse_button(MouseButton::RIGHT, true);
        controller.on_cursor_moved(0.0, 0.0);
        controller.on_cursor_moved(50.0, 50.0);
        assert_eq!(*controller.camera(), CameraState::default());
    }

    #[test]
    fn scroll_zooms_in_and_out() {
        let mut controller = OrbitController::default();
        controller.on_scroll(0.0, 5.0);
        assert!((controller.camera().radius - 2.5).abs() < EPS);
        controller.on_scroll(0.0, -10.0);
        assert!((controller.camera().radius - 3.5).abs() < EPS);
    }

    #[test]
    fn extreme_input_stays_in_range() {
        let mut controller = dragging();
        controller.on_cursor_moved(0.0, 0.0);
        for step in 0..500 {
            let sign = if step % 7 < 4 { 1.0 } else { -1.0 };
            let magnitude = (step * 37 % 1000) as f64;
            controller.on_cursor_moved(sign * magnitude * 3.0, -sign * magnitude * 11.0);
            controller.on_scroll(0.0, (sign * magnitude) as f32);

            let camera = controller.camera();
            assert!(CameraState::RADIUS_RANGE.contains(&camera.radius));
            assert!(CameraState::HEIGHT_RANGE.contains(&camera.height));
        }

        controller.on_scroll(0.0, f32::MAX);
        assert_eq!(controller.camera().radius, 1.0);
        controller.on_scroll(0.0, -f32::MAX);
        assert_eq!(controller.camera().radius, 10.0);
    }

    #[test]
    fn out_of_range_coordinates_never_poison_the_camera() {
        let mut controller = dragging();
        controller.on_cursor_moved(0.0, 0.0);
        controller.on_cursor_moved(0.0, 1e300);
        controller.on_cursor_moved(0.0, 1e300);
        controller.on_cursor_moved(f64::NAN, 0.0);
        // f32::MAX apart on each axis, so the delta overflows
        controller.on_cursor_moved(f64::from(f32::MAX), f64::from(f32::MAX));
        controller.on_cursor_moved(-f64::from(f32::MAX), -f64::from(f32::MAX));
        controller.on_scroll(0.0, f32::INFINITY);
        controller.on_scroll(0.0, f32::NAN);

        let camera = controller.camera();
        assert!(camera.azimuth.is_finite());
        assert!(CameraState::HEIGHT_RANGE.contains(&camera.height));
        assert!(CameraState::RADIUS_RANGE.contains(&camera.radius));

        // a normal drag still works afterwards
        controller.on_cursor_moved(0.0, 0.0);
        controller.on_cursor_moved(0.0, 10.0);
        assert!(CameraState::HEIGHT_RANGE.contains(&controller.camera().height));
    }
}
