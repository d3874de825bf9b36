use crate::camera::CameraState;
use crate::math::{Matrix4, Vector3};
use crate::settings::ViewerSettings;

/// Transforms and eye position pushed to the shader for one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameParams {
    pub model: Matrix4,
    pub view: Matrix4,
    pub projection: Matrix4,
    pub camera_position: Vector3,
}

/// Builds the frame transforms: a slow spin of the model around +Y, an orbit
/// view looking at the origin, and a perspective projection for `aspect`.
pub fn frame_params(
    camera: &CameraState,
    elapsed_secs: f32,
    aspect: f32,
    settings: &ViewerSettings,
) -> FrameParams {
    let camera_position = camera.position();
    FrameParams {
        model: Matrix4::rotate_y(elapsed_secs * settings.rotation_speed),
        view: Matrix4::look_at(camera_position, Vector3::ZERO, Vector3::UP),
        projection: Matrix4::perspective(
            settings.fov_y_degrees.to_radians(),
            aspect.max(0.01),
            settings.near_plane,
            settings.far_plane,
        ),
        camera_position,
    }
}

/// Width over height, falling back to square for a minimized window.
pub fn aspect_ratio(width: u32, height: u32) -> f32 {
    if height == 0 {
        1.0
    } else {
        width as f32 / height as f32
    }
}

#[cfg(test)]
mod tests {
    use std::f32::consts::PI;

    use super::*;

    const EPS: f32 = 1e-5;

    #[test]
    fn camera_orbits_at_radius_and_height() {
        let camera = CameraState {
            radius: 2.0,
            azimuth: PI / 2.0,
            height: 1.0,
        };
        let frame = frame_params(&camera, 0.0, 1.0, &ViewerSettings::default());
        assert!(frame
            .camera_position
            .abs_diff_eq(Vector3::new(0.0, 1.0, 2.0), EPS));
    }

    #[test]
    fn view_centers_origin() {
        let settings = ViewerSettings::default();
        let frame = frame_params(&CameraState::default(), 0.0, 4.0 / 3.0, &settings);
        let origin = frame.view.transform_point(Vector3::ZERO);
        assert!(origin.abs_diff_eq(Vector3::new(0.0, 0.0, -3.0), EPS));
        let clip = (frame.projection * frame.view).project_point(Vector3::ZERO);
        assert!(clip.x().abs() < EPS && clip.y().abs() < EPS);
    }

    #[test]
    fn model_spins_with_elapsed_time() {
        let settings = ViewerSettings::default();
        let still = frame_params(&CameraState::default(), 0.0, 1.0, &settings);
        assert_eq!(still.model, Matrix4::IDENTITY);

        // 0.5 rad/s for pi seconds is a quarter turn
        let turned = frame_params(&CameraState::default(), PI, 1.0, &settings);
        let x = turned.model.transform_point(Vector3::new(1.0, 0.0, 0.0));
        assert!(x.abs_diff_eq(Vector3::new(0.0, 0.0, -1.0), EPS));
    }

    #[test]
    fn aspect_ratio_handles_zero_height() {
        assert_eq!(aspect_ratio(800, 600), 800.0 / 600.0);
        assert_eq!(aspect_ratio(800, 0), 1.0);
    }
}
