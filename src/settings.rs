use crate::math::Vector3;

/// Fixed viewer constants. A surrounding tool may override fields before
/// handing them to the renderer; nothing is read from disk.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewerSettings {
    pub window_title: String,
    pub window_size: (u32, u32),
    /// Vertical field of view in degrees.
    pub fov_y_degrees: f32,
    pub near_plane: f32,
    pub far_plane: f32,
    pub light_position: Vector3,
    pub light_color: Vector3,
    pub object_color: Vector3,
    pub clear_color: Vector3,
    /// Model spin around +Y in radians per second.
    pub rotation_speed: f32,
}

impl Default for ViewerSettings {
    fn default() -> Self {
        Self {
            window_title: "3D Mesh Viewer".to_string(),
            window_size: (800, 600),
            fov_y_degrees: 45.0,
            near_plane: 0.1,
            far_plane: 100.0,
            light_position: Vector3::new(2.0, 2.0, 2.0),
            light_color: Vector3::new(1.0, 1.0, 1.0),
            object_color: Vector3::new(0.8, 0.6, 0.4),
            clear_color: Vector3::new(0.1, 0.1, 0.15),
            rotation_speed: 0.5,
        }
    }
}
