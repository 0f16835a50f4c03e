use serde::{Deserialize, Serialize};

use crate::math::{Matrix4, Vector3};

/// Perspective camera producing the projection and view matrices the renderer
/// uploads.
///
/// Matrices are only recomputed by [`Camera::update`] (directly, or through
/// [`Camera::move_by`] / [`Camera::rotate_by`]); changing a field does not
/// invalidate them.
///
/// The view matrix is a pure translation by the negated position. Rotation is
/// tracked but not yet composed into the view matrix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Camera {
    /// Vertical field of view in degrees.
    pub fov: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
    position: Vector3,
    rotation: Vector3,
    projection_matrix: Matrix4,
    view_matrix: Matrix4,
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(60.0, 1.0, 0.1, 1000.0)
    }
}

impl Camera {
    /// Creates a camera at `(0, 0, 5)` looking down -Z.
    ///
    /// No range checks are made; callers pass `near > 0`, `far > near` and a
    /// field of view inside `(0, 180)`.
    pub fn new(fov: f32, aspect: f32, near: f32, far: f32) -> Self {
        let mut camera = Self {
            fov,
            aspect,
            near,
            far,
            position: Vector3::new(0.0, 0.0, 5.0),
            rotation: Vector3::ZERO,
            projection_matrix: Matrix4::identity(),
            view_matrix: Matrix4::identity(),
        };
        camera.update();
        camera
    }

    pub fn position(&self) -> Vector3 {
        self.position
    }

    pub fn rotation(&self) -> Vector3 {
        self.rotation
    }

    pub fn projection_matrix(&self) -> &Matrix4 {
        &self.projection_matrix
    }

    pub fn view_matrix(&self) -> &Matrix4 {
        &self.view_matrix
    }

    /// Sets the position without recomputing the matrices.
    pub fn set_position(&mut self, position: Vector3) {
        self.position = position;
    }

    /// Sets the rotation without recomputing the matrices.
    pub fn set_rotation(&mut self, rotation: Vector3) {
        self.rotation = rotation;
    }

    /// Derives the aspect ratio from a viewport size and recomputes.
    pub fn set_aspect_from_viewport(&mut self, width: u32, height: u32) {
        self.aspect = width.max(1) as f32 / height.max(1) as f32;
        self.update();
    }

    pub fn update(&mut self) {
        Matrix4::perspective_into(self.fov, self.aspect, self.near, self.far, &mut self.projection_matrix);
        let p = self.position;
        Matrix4::translation_into(-p.x(), -p.y(), -p.z(), &mut self.view_matrix);
    }

    pub fn move_by(&mut self, dx: f32, dy: f32, dz: f32) {
        self.position = self.position + Vector3::new(dx, dy, dz);
        self.update();
    }

    pub fn rotate_by(&mut self, dx: f32, dy: f32, dz: f32) {
        self.rotation = self.rotation + Vector3::new(dx, dy, dz);
        self.update();
    }
}
