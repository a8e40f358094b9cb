//! The viewing camera.
//!
//! [`Camera`] keeps a position and a target and derives the view matrix from them on demand.
//! The projection matrix only depends on the viewport, so it is rebuilt lazily after the
//! viewport changed and reused every other frame.

use glam::{Mat4, Vec3};

use crate::component::{Component, ObjectId};

/// Radians of orbit per pixel of pointer movement.
pub const ORBIT_SENSITIVITY: f32 = 0.005;
/// Dolly distance per unit of normalized pinch, relative to the distance to the target.
pub const DOLLY_SPEED: f32 = 4.0;
/// The camera never gets closer to its target than this.
pub const MIN_DISTANCE: f32 = 0.1;

const MAX_PITCH: f32 = 89.0 * std::f32::consts::PI / 180.0;

/// A perspective camera looking at a target point.
#[derive(Clone, Debug)]
pub struct Camera {
    position: Vec3,
    target: Vec3,
    up: Vec3,
    fov: f32,
    near: f32,
    far: f32,
    viewport: (u32, u32),
    projection: Mat4,
    projection_dirty: bool,
    projection_revision: u64,
}

impl Camera {
    /// Creates a camera at `(0, 0, 5)` looking at the origin with a 90° vertical FOV.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            position: Vec3::new(0.0, 0.0, 5.0),
            target: Vec3::ZERO,
            up: Vec3::Y,
            fov: 90.0,
            near: 0.1,
            far: 100.0,
            viewport: (width, height),
            projection: Mat4::IDENTITY,
            projection_dirty: true,
            projection_revision: 0,
        }
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn target(&self) -> Vec3 {
        self.target
    }

    pub fn set_position(&mut self, position: Vec3) {
        self.position = position;
    }

    pub fn set_target(&mut self, target: Vec3) {
        self.target = target;
    }

    /// Vertical field of view in degrees.
    pub fn fov(&self) -> f32 {
        self.fov
    }

    pub fn set_perspective(&mut self, fov: f32, near: f32, far: f32) {
        self.fov = fov;
        self.near = near;
        self.far = far;
        self.projection_dirty = true;
    }

    pub fn viewport(&self) -> (u32, u32) {
        self.viewport
    }

    /// Width over height, `1.0` for a degenerate viewport.
    pub fn aspect(&self) -> f32 {
        match self.viewport {
            (w, h) if w > 0 && h > 0 => w as f32 / h as f32,
            _ => 1.0,
        }
    }

    /// Records a new viewport size. Returns whether it differed from the previous one; only
    /// then will the projection be rebuilt.
    pub fn set_size(&mut self, width: u32, height: u32) -> bool {
        if self.viewport == (width, height) {
            return false;
        }
        self.viewport = (width, height);
        self.projection_dirty = true;
        true
    }

    /// The projection matrix, rebuilt first if the viewport changed.
    pub fn projection(&mut self) -> Mat4 {
        if self.projection_dirty {
            self.projection =
                Mat4::perspective_rh_gl(self.fov.to_radians(), self.aspect(), self.near, self.far);
            self.projection_dirty = false;
            self.projection_revision += 1;
            log::debug!(
                "Rebuilt projection for {}x{} (revision {})",
                self.viewport.0,
                self.viewport.1,
                self.projection_revision
            );
        }
        self.projection
    }

    /// How many times the projection matrix has been computed.
    pub fn projection_revision(&self) -> u64 {
        self.projection_revision
    }

    pub fn view(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.target, self.up)
    }

    pub fn distance(&self) -> f32 {
        self.position.distance(self.target)
    }

    pub fn forward(&self) -> Vec3 {
        (self.target - self.position).normalize_or_zero()
    }

    pub fn right(&self) -> Vec3 {
        self.forward().cross(self.up).normalize_or_zero()
    }

    /// Orbits around the target by a pointer delta in pixels.
    pub fn on_move(&mut self, delta_x: f32, delta_y: f32) {
        let offset = self.position - self.target;
        let radius = offset.length();
        if radius <= f32::EPSILON {
            return;
        }

        let yaw = offset.x.atan2(offset.z) - delta_x * ORBIT_SENSITIVITY;
        let pitch = ((offset.y / radius).clamp(-1.0, 1.0).asin() + delta_y * ORBIT_SENSITIVITY)
            .clamp(-MAX_PITCH, MAX_PITCH);

        self.position = self.target
            + radius
                * Vec3::new(
                    pitch.cos() * yaw.sin(),
                    pitch.sin(),
                    pitch.cos() * yaw.cos(),
                );
    }

    /// Pans position and target to the left by `amount` target distances.
    pub fn move_left(&mut self, amount: f32) {
        let shift = -self.right() * amount * self.distance();
        self.position += shift;
        self.target += shift;
    }

    /// Pans position and target upwards by `amount` target distances.
    pub fn move_up(&mut self, amount: f32) {
        let up = self.right().cross(self.forward());
        let shift = up * amount * self.distance();
        self.position += shift;
        self.target += shift;
    }

    /// Dollies towards the target. Negative amounts move away.
    pub fn move_forward(&mut self, amount: f32) {
        let forward = self.forward();
        if forward == Vec3::ZERO {
            return;
        }
        let distance = self.distance();
        let new_distance = (distance - amount * DOLLY_SPEED * distance).max(MIN_DISTANCE);
        self.position = self.target - forward * new_distance;
    }
}

/// What the render pass needs to know about the camera for one frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CameraView {
    pub position: Vec3,
    pub view: Mat4,
}

impl From<&Camera> for CameraView {
    fn from(camera: &Camera) -> Self {
        Self {
            position: camera.position(),
            view: camera.view(),
        }
    }
}

/// Component carrying a [`Camera`].
pub struct CameraComponent {
    camera: Camera,
    owner: Option<ObjectId>,
}

impl CameraComponent {
    pub fn new(camera: Camera) -> Self {
        Self {
            camera,
            owner: None,
        }
    }

    pub fn owner(&self) -> Option<ObjectId> {
        self.owner
    }
}

impl Component for CameraComponent {
    fn name(&self) -> &str {
        "Camera"
    }

    fn on_attach(&mut self, owner: ObjectId) {
        self.owner = Some(owner);
    }

    fn camera(&self) -> Option<&Camera> {
        Some(&self.camera)
    }

    fn camera_mut(&mut self) -> Option<&mut Camera> {
        Some(&mut self.camera)
    }
}
