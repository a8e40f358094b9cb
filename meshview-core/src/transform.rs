//! Local transforms of scene objects.

use std::cell::Cell;

use glam::{EulerRot, Mat4, Quat, Vec3};

/// Position, rotation and scale of a scene object relative to its parent.
///
/// Rotation is stored as Euler angles in degrees and applied in Y, X, Z order. The local
/// matrix is cached and rebuilt only after one of the setters ran.
#[derive(Clone, Debug)]
pub struct Transform {
    position: Vec3,
    rotation: Vec3,
    scale: Vec3,
    cached: Cell<Option<Mat4>>,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Vec3::ZERO,
            scale: Vec3::ONE,
            cached: Cell::new(None),
        }
    }
}

impl Transform {
    /// Creates an identity transform.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    /// Rotation in degrees around X, Y and Z.
    pub fn rotation(&self) -> Vec3 {
        self.rotation
    }

    pub fn scale(&self) -> Vec3 {
        self.scale
    }

    pub fn set_position(&mut self, x: f32, y: f32, z: f32) {
        self.position = Vec3::new(x, y, z);
        self.cached.set(None);
    }

    pub fn set_rotation(&mut self, x: f32, y: f32, z: f32) {
        self.rotation = Vec3::new(x, y, z);
        self.cached.set(None);
    }

    pub fn set_scale(&mut self, x: f32, y: f32, z: f32) {
        self.scale = Vec3::new(x, y, z);
        self.cached.set(None);
    }

    /// Adds `degrees` to the rotation, wrapping each axis into `[0, 360)`.
    pub fn rotate(&mut self, degrees: Vec3) {
        let r = self.rotation + degrees;
        self.set_rotation(
            r.x.rem_euclid(360.0),
            r.y.rem_euclid(360.0),
            r.z.rem_euclid(360.0),
        );
    }

    /// The local-to-parent matrix: translation * rotation * scale.
    pub fn matrix(&self) -> Mat4 {
        if let Some(matrix) = self.cached.get() {
            return matrix;
        }
        let rotation = Quat::from_euler(
            EulerRot::YXZ,
            self.rotation.y.to_radians(),
            self.rotation.x.to_radians(),
            self.rotation.z.to_radians(),
        );
        let matrix = Mat4::from_scale_rotation_translation(self.scale, rotation, self.position);
        self.cached.set(Some(matrix));
        matrix
    }

    /// Whether the cached matrix is stale.
    pub fn is_dirty(&self) -> bool {
        self.cached.get().is_none()
    }
}
