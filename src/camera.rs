//! Navigation camera with side-effect-free movement proposals.

use glam::{Mat4, Vec3};
use serde::{Deserialize, Serialize};

use crate::bounding::BoundingVolume;
use crate::error::SceneError;

const WORLD_UP: Vec3 = Vec3::Y;

/// Radius of the sphere that stands in for the camera body.
pub const DEFAULT_BODY_RADIUS: f32 = 0.1;

/// How forward movement follows the look direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MovementMode {
    /// Moves along the look direction, including its pitch.
    #[default]
    Free,
    /// Moves along a front vector built from the separate walk pitch, so
    /// looking up or down does not change the walking height.
    HorizonLocked,
}

impl MovementMode {
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "free" => Some(Self::Free),
            "horizon-locked" | "horizon_locked" | "fps" => Some(Self::HorizonLocked),
            _ => None,
        }
    }
}

/// Perspective projection parameters. `fov` is the vertical angle in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Projection {
    pub fov: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for Projection {
    fn default() -> Self {
        Self {
            fov: 45.0,
            aspect: 16.0 / 9.0,
            near: 0.1,
            far: 100.0,
        }
    }
}

impl Projection {
    pub fn validate(&self) -> Result<(), SceneError> {
        if !(self.fov > 0.0 && self.fov < 180.0) {
            return Err(SceneError::InvalidProjection(format!(
                "fov {} must lie in (0, 180)",
                self.fov
            )));
        }
        if !(self.aspect > 0.0) {
            return Err(SceneError::InvalidProjection(format!(
                "aspect {} must be positive",
                self.aspect
            )));
        }
        if !(self.near > 0.0 && self.far > self.near) {
            return Err(SceneError::InvalidProjection(format!(
                "clip planes near={} far={} must satisfy 0 < near < far",
                self.near, self.far
            )));
        }
        Ok(())
    }

    pub fn matrix(&self) -> Mat4 {
        Mat4::perspective_rh_gl(self.fov.to_radians(), self.aspect, self.near, self.far)
    }
}

/// Camera pose plus movement tuning.
///
/// `yaw` and `pitch` are degrees in `[0, 360)`. The front, up and right
/// vectors are derived from them and always form an orthonormal basis.
#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    position: Vec3,
    yaw: f32,
    pitch: f32,
    walk_pitch: f32,
    front: Vec3,
    up: Vec3,
    right: Vec3,
    projection: Projection,
    velocity: f32,
    rotation_step: f32,
    body_radius: f32,
    mode: MovementMode,
}

impl Camera {
    pub fn new(position: Vec3, yaw: f32, pitch: f32, projection: Projection) -> Self {
        let mut camera = Self {
            position,
            yaw: wrap_degrees(yaw),
            pitch: wrap_degrees(pitch),
            walk_pitch: 0.0,
            front: Vec3::X,
            up: Vec3::Y,
            right: Vec3::Z,
            projection,
            velocity: 1.0,
            rotation_step: 45.0,
            body_radius: DEFAULT_BODY_RADIUS,
            mode: MovementMode::Free,
        };
        camera.update_vectors();
        camera
    }

    pub fn with_mode(mut self, mode: MovementMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn set_position(&mut self, position: Vec3) {
        self.position = position;
    }

    pub fn yaw(&self) -> f32 {
        self.yaw
    }

    pub fn pitch(&self) -> f32 {
        self.pitch
    }

    pub fn front(&self) -> Vec3 {
        self.front
    }

    pub fn up(&self) -> Vec3 {
        self.up
    }

    pub fn right(&self) -> Vec3 {
        self.right
    }

    pub fn mode(&self) -> MovementMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: MovementMode) {
        self.mode = mode;
    }

    pub fn projection(&self) -> Projection {
        self.projection
    }

    pub fn set_aspect(&mut self, aspect: f32) {
        if aspect > 0.0 {
            self.projection.aspect = aspect;
        }
    }

    /// Units travelled per second.
    pub fn velocity(&self) -> f32 {
        self.velocity
    }

    pub fn set_velocity(&mut self, velocity: f32) {
        self.velocity = velocity;
    }

    /// Degrees rotated per second.
    pub fn rotation_step(&self) -> f32 {
        self.rotation_step
    }

    pub fn set_rotation_step(&mut self, step: f32) {
        self.rotation_step = step;
    }

    pub fn body_radius(&self) -> f32 {
        self.body_radius
    }

    pub fn set_body_radius(&mut self, radius: f32) {
        self.body_radius = radius.max(0.0);
    }

    /// Pitch used for forward movement in [`MovementMode::HorizonLocked`].
    pub fn walk_pitch(&self) -> f32 {
        self.walk_pitch
    }

    pub fn set_walk_pitch(&mut self, pitch: f32) {
        self.walk_pitch = wrap_degrees(pitch);
    }

    pub fn propose_move_along_front(&self, amount: f32) -> BoundingVolume {
        self.volume_at(self.position + self.walk_direction() * amount)
    }

    pub fn propose_strafe(&self, amount: f32) -> BoundingVolume {
        self.volume_at(self.position + self.right * amount)
    }

    pub fn propose_lift(&self, amount: f32) -> BoundingVolume {
        self.volume_at(self.position + self.up * amount)
    }

    pub fn commit_move_along_front(&mut self, amount: f32) {
        self.position += self.walk_direction() * amount;
    }

    pub fn commit_strafe(&mut self, amount: f32) {
        self.position += self.right * amount;
    }

    pub fn commit_lift(&mut self, amount: f32) {
        self.position += self.up * amount;
    }

    /// Adds the deltas (degrees) to yaw and pitch and rebuilds the basis.
    pub fn update_orientation(&mut self, d_yaw: f32, d_pitch: f32) {
        self.yaw = wrap_degrees(self.yaw + d_yaw);
        self.pitch = wrap_degrees(self.pitch + d_pitch);
        self.update_vectors();
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.position + self.front, self.up)
    }

    pub fn projection_matrix(&self) -> Mat4 {
        self.projection.matrix()
    }

    /// Sphere of the body radius around the current position.
    pub fn self_bounding_volume(&self) -> BoundingVolume {
        self.volume_at(self.position)
    }

    fn volume_at(&self, position: Vec3) -> BoundingVolume {
        BoundingVolume::sphere(position, self.body_radius)
    }

    fn walk_direction(&self) -> Vec3 {
        match self.mode {
            MovementMode::Free => self.front,
            MovementMode::HorizonLocked => front_from_angles(self.yaw, self.walk_pitch),
        }
    }

    fn update_vectors(&mut self) {
        let front = front_from_angles(self.yaw, self.pitch);
        // Gram-Schmidt: strip the front component out of world up.
        let candidate = WORLD_UP - front * WORLD_UP.dot(front);
        let up = if candidate.length_squared() > 1e-8 {
            candidate.normalize()
        } else {
            // Looking straight up or down; tip the basis towards yaw.
            let yaw = self.yaw.to_radians();
            let toward = Vec3::new(yaw.cos(), 0.0, yaw.sin());
            let sign = if front.y > 0.0 { -1.0 } else { 1.0 };
            (toward * sign).normalize()
        };
        self.front = front;
        self.up = up;
        self.right = front.cross(up).normalize();
    }
}

fn front_from_angles(yaw: f32, pitch: f32) -> Vec3 {
    let (yaw, pitch) = (yaw.to_radians(), pitch.to_radians());
    Vec3::new(
        yaw.cos() * pitch.cos(),
        pitch.sin(),
        yaw.sin() * pitch.cos(),
    )
    .normalize()
}

/// Wraps an angle in degrees into `[0, 360)`.
pub fn wrap_degrees(angle: f32) -> f32 {
    let wrapped = angle.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360 for tiny negative inputs.
    if wrapped >= 360.0 {
        0.0
    } else {
        wrapped
    }
}
