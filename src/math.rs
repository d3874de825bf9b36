//! Minimal vector and matrix algebra used by the mesh pipeline and renderer.
//!
//! Both types wrap `glam` values privately so callers only see the operations
//! the viewer needs. Matrices are column-major, matching the layout uploaded
//! into WGSL uniform buffers.

use std::ops::{Add, Div, Mul, Sub};

use glam::{Mat4, Vec3, Vec4};

/// Three component single precision vector.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vector3(Vec3);

impl Vector3 {
    pub const ZERO: Self = Self(Vec3::ZERO);
    pub const UP: Self = Self(Vec3::Y);

    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self(Vec3::new(x, y, z))
    }

    pub fn x(self) -> f32 {
        self.0.x
    }

    pub fn y(self) -> f32 {
        self.0.y
    }

    pub fn z(self) -> f32 {
        self.0.z
    }

    pub fn length(self) -> f32 {
        self.0.length()
    }

    /// Unit vector in the same direction, or the zero vector when the length
    /// is zero.
    pub fn normalize(self) -> Self {
        let length = self.length();
        if length > 0.0 {
            self / length
        } else {
            Self::ZERO
        }
    }

    pub fn cross(self, other: Self) -> Self {
        Self(self.0.cross(other.0))
    }

    pub fn dot(self, other: Self) -> f32 {
        self.0.dot(other.0)
    }

    /// Componentwise minimum.
    pub fn min(self, other: Self) -> Self {
        Self(self.0.min(other.0))
    }

    /// Componentwise maximum.
    pub fn max(self, other: Self) -> Self {
        Self(self.0.max(other.0))
    }

    pub fn max_element(self) -> f32 {
        self.0.max_element()
    }

    pub fn to_array(self) -> [f32; 3] {
        self.0.to_array()
    }

    #[cfg(test)]
    pub(crate) fn abs_diff_eq(self, other: Self, tolerance: f32) -> bool {
        self.0.abs_diff_eq(other.0, tolerance)
    }
}

impl Add for Vector3 {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl Sub for Vector3 {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self(self.0 - rhs.0)
    }
}

impl Mul<f32> for Vector3 {
    type Output = Self;

    fn mul(self, rhs: f32) -> Self {
        Self(self.0 * rhs)
    }
}

impl Div<f32> for Vector3 {
    type Output = Self;

    fn div(self, rhs: f32) -> Self {
        Self(self.0 / rhs)
    }
}

/// 4x4 single precision matrix. The default value is the identity.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Matrix4(Mat4);

impl Matrix4 {
    pub const IDENTITY: Self = Self(Mat4::IDENTITY);

    /// Right-handed perspective projection mapping view depth onto wgpu's
    /// `[0, 1]` clip range. Requires `0 < near < far`.
    pub fn perspective(fov_y: f32, aspect: f32, near: f32, far: f32) -> Self {
        Self(Mat4::perspective_rh(fov_y, aspect, near, far))
    }

    /// Right-handed view matrix looking from `eye` toward `center`.
    ///
    /// The basis is built with [`Vector3::normalize`], so a view direction
    /// parallel to `up` collapses to a zero basis rather than producing NaN.
    pub fn look_at(eye: Vector3, center: Vector3, up: Vector3) -> Self {
        let forward = (center - eye).normalize();
        let right = forward.cross(up).normalize();
        let true_up = right.cross(forward);

        Self(Mat4::from_cols(
            Vec4::new(right.x(), true_up.x(), -forward.x(), 0.0),
            Vec4::new(right.y(), true_up.y(), -forward.y(), 0.0),
            Vec4::new(right.z(), true_up.z(), -forward.z(), 0.0),
            Vec4::new(-right.dot(eye), -true_up.dot(eye), forward.dot(eye), 1.0),
        ))
    }

    /// Rotation of `angle` radians about the +Y axis.
    pub fn rotate_y(angle: f32) -> Self {
        Self(Mat4::from_rotation_y(angle))
    }

    /// Inverse-transpose, used to carry normals through a model transform.
    pub fn normal_matrix(&self) -> Self {
        Self(self.0.inverse().transpose())
    }

    /// Applies the affine part of the matrix to a point.
    pub fn transform_point(&self, point: Vector3) -> Vector3 {
        Vector3(self.0.transform_point3(point.0))
    }

    /// Applies the full matrix to a point, including the perspective divide.
    pub fn project_point(&self, point: Vector3) -> Vector3 {
        Vector3(self.0.project_point3(point.0))
    }

    /// Column-major cells in GPU upload order.
    pub fn to_cols_array(&self) -> [f32; 16] {
        self.0.to_cols_array()
    }

    pub fn to_cols_array_2d(&self) -> [[f32; 4]; 4] {
        self.0.to_cols_array_2d()
    }
}

impl Mul for Matrix4 {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self {
        Self(self.0 * rhs.0)
    }
}

#[cfg(test)]
mod tests {
    use std::f32::consts::FRAC_PI_2;

    use super::*;

    const EPS: f32 = 1e-5;

    #[test]
    fn normalize_zero_vector_is_zero() {
        let normalized = Vector3::ZERO.normalize();
        assert_eq!(normalized, Vector3::ZERO);
        assert!(!normalized.x().is_nan());
    }

    #[test]
    fn normalize_produces_unit_length() {
        let v = Vector3::new(3.0, 0.0, 4.0).normalize();
        assert!((v.length() - 1.0).abs() < EPS);
        assert!(v.abs_diff_eq(Vector3::new(0.6, 0.0, 0.8), EPS));
    }

    #[test]
    fn cross_follows_right_hand_rule() {
        let x = Vector3::new(1.0, 0.0, 0.0);
        let y = Vector3::new(0.0, 1.0, 0.0);
        assert_eq!(x.cross(y), Vector3::new(0.0, 0.0, 1.0));
    }

    #[test]
    fn arithmetic_is_componentwise() {
        let a = Vector3::new(1.0, 2.0, 3.0);
        let b = Vector3::new(4.0, 6.0, 8.0);
        assert_eq!(b - a, Vector3::new(3.0, 4.0, 5.0));
        assert_eq!((a + b) / 2.0, Vector3::new(2.5, 4.0, 5.5));
        assert_eq!(a * 2.0, Vector3::new(2.0, 4.0, 6.0));
        assert_eq!(a.min(Vector3::new(0.0, 5.0, 3.0)), Vector3::new(0.0, 2.0, 3.0));
        assert_eq!(b.max_element(), 8.0);
    }

    #[test]
    fn default_matrix_is_identity() {
        let m = Matrix4::default();
        assert_eq!(m, Matrix4::IDENTITY);
        assert_eq!(m * Matrix4::rotate_y(0.3), Matrix4::rotate_y(0.3));
    }

    #[test]
    fn look_at_moves_target_in_front_of_camera() {
        let view = Matrix4::look_at(Vector3::new(0.0, 0.0, 3.0), Vector3::ZERO, Vector3::UP);
        let origin = view.transform_point(Vector3::ZERO);
        assert!(origin.abs_diff_eq(Vector3::new(0.0, 0.0, -3.0), EPS));
        let eye = view.transform_point(Vector3::new(0.0, 0.0, 3.0));
        assert!(eye.abs_diff_eq(Vector3::ZERO, EPS));
    }

    #[test]
    fn look_at_parallel_up_does_not_produce_nan() {
        let view = Matrix4::look_at(Vector3::new(0.0, 5.0, 0.0), Vector3::ZERO, Vector3::UP);
        assert!(view.to_cols_array().iter().all(|cell| !cell.is_nan()));
    }

    #[test]
    fn rotate_y_turns_x_toward_negative_z() {
        let rotated = Matrix4::rotate_y(FRAC_PI_2).transform_point(Vector3::new(1.0, 0.0, 0.0));
        assert!(rotated.abs_diff_eq(Vector3::new(0.0, 0.0, -1.0), EPS));
    }

    #[test]
    fn perspective_maps_near_and_far_to_depth_range() {
        let projection = Matrix4::perspective(45f32.to_radians(), 4.0 / 3.0, 0.1, 100.0);
        let near = projection.project_point(Vector3::new(0.0, 0.0, -0.1));
        let far = projection.project_point(Vector3::new(0.0, 0.0, -100.0));
        assert!(near.z().abs() < 1e-4);
        assert!((far.z() - 1.0).abs() < 1e-4);
    }

    #[test]
    fn normal_matrix_of_rotation_is_the_rotation() {
        let rotation = Matrix4::rotate_y(0.7);
        let normal = rotation.normal_matrix();
        let a = rotation.to_cols_array();
        let b = normal.to_cols_array();
        assert!(a.iter().zip(b.iter()).all(|(x, y)| (x - y).abs() < EPS));
    }
}
