//! Navigation and controller configuration, validated once at build time.

use std::collections::BTreeMap;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::camera::{Camera, MovementMode, Projection, DEFAULT_BODY_RADIUS};
use crate::error::SceneError;
use crate::input::InputBinding;
use crate::light::SpecularUniformPolicy;

/// Navigation intent that a key or button can be bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Direction {
    Forward,
    Back,
    Left,
    Right,
    Up,
    Down,
    RotateUp,
    RotateDown,
    RotateLeft,
    RotateRight,
}

impl Direction {
    pub fn from_name(name: &str) -> Option<Self> {
        let normalized = name.trim().to_ascii_lowercase().replace('_', "-");
        Some(match normalized.as_str() {
            "forward" => Self::Forward,
            "back" | "backward" => Self::Back,
            "left" => Self::Left,
            "right" => Self::Right,
            "up" => Self::Up,
            "down" => Self::Down,
            "rotate-up" => Self::RotateUp,
            "rotate-down" => Self::RotateDown,
            "rotate-left" => Self::RotateLeft,
            "rotate-right" => Self::RotateRight,
            _ => return None,
        })
    }
}

/// One of the three translation axes of the camera.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MovementAxis {
    Forward,
    Strafe,
    Lift,
}

impl MovementAxis {
    pub const ALL: [Self; 3] = [Self::Forward, Self::Strafe, Self::Lift];

    /// Directions read for this axis as `(positive, negative)`.
    pub fn directions(self) -> (Direction, Direction) {
        match self {
            Self::Forward => (Direction::Forward, Direction::Back),
            Self::Strafe => (Direction::Right, Direction::Left),
            Self::Lift => (Direction::Up, Direction::Down),
        }
    }

    /// Resolves a movement handler name such as `Walk` or `Strafe`.
    pub fn from_handler_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "walk" | "forward" | "movealongfront" => Some(Self::Forward),
            "strafe" => Some(Self::Strafe),
            "lift" => Some(Self::Lift),
            _ => None,
        }
    }
}

/// Keys and buttons per direction. Unbound directions are never active.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KeyBindings(BTreeMap<Direction, Vec<InputBinding>>);

impl KeyBindings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bind(&mut self, direction: Direction, binding: impl Into<InputBinding>) {
        let bindings = self.0.entry(direction).or_default();
        let binding = binding.into();
        if !bindings.contains(&binding) {
            bindings.push(binding);
        }
    }

    pub fn with(mut self, direction: Direction, binding: impl Into<InputBinding>) -> Self {
        self.bind(direction, binding);
        self
    }

    pub fn unbind(&mut self, direction: Direction) {
        self.0.remove(&direction);
    }

    pub fn bindings(&self, direction: Direction) -> &[InputBinding] {
        self.0.get(&direction).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn is_empty(&self) -> bool {
        self.0.values().all(Vec::is_empty)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub mode: MovementMode,
    pub position: Vec3,
    pub yaw: f32,
    pub pitch: f32,
    pub projection: Projection,
    pub velocity: f32,
    pub rotation_step: f32,
    pub body_radius: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            mode: MovementMode::Free,
            position: Vec3::ZERO,
            yaw: 0.0,
            pitch: 0.0,
            projection: Projection::default(),
            velocity: 1.0,
            rotation_step: 45.0,
            body_radius: DEFAULT_BODY_RADIUS,
        }
    }
}

impl CameraConfig {
    pub fn validate(&self) -> Result<(), SceneError> {
        self.projection.validate()?;
        if !self.velocity.is_finite() || self.velocity < 0.0 {
            return Err(SceneError::InvalidVelocity(self.velocity));
        }
        Ok(())
    }

    pub fn build(&self) -> Result<Camera, SceneError> {
        self.validate()?;
        let mut camera = Camera::new(self.position, self.yaw, self.pitch, self.projection)
            .with_mode(self.mode);
        camera.set_velocity(self.velocity);
        camera.set_rotation_step(self.rotation_step);
        camera.set_body_radius(self.body_radius);
        Ok(camera)
    }
}

/// Everything the scene controller needs before the first frame.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScreenConfig {
    pub camera: Option<CameraConfig>,
    /// Width of the viewport border (in normalized units) that rotates the
    /// camera while the pointer rests in it. Zero disables edge rotation.
    pub edge_rotation_distance: f32,
    pub key_bindings: KeyBindings,
    pub specular_policy: SpecularUniformPolicy,
}

impl ScreenConfig {
    pub fn validate(&self) -> Result<(), SceneError> {
        if let Some(camera) = &self.camera {
            camera.validate()?;
        }
        validate_edge_rotation_distance(self.edge_rotation_distance)
    }
}

pub(crate) fn validate_edge_rotation_distance(distance: f32) -> Result<(), SceneError> {
    if (0.0..=1.0).contains(&distance) {
        Ok(())
    } else {
        Err(SceneError::EdgeRotationOutOfRange(distance))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::KeyCode;

    #[test]
    fn handler_names_resolve_to_axes() {
        assert_eq!(MovementAxis::from_handler_name("Walk"), Some(MovementAxis::Forward));
        assert_eq!(MovementAxis::from_handler_name("strafe"), Some(MovementAxis::Strafe));
        assert_eq!(MovementAxis::from_handler_name("LIFT"), Some(MovementAxis::Lift));
        assert_eq!(MovementAxis::from_handler_name("Jump"), None);
    }

    #[test]
    fn direction_names() {
        assert_eq!(Direction::from_name("rotate_left"), Some(Direction::RotateLeft));
        assert_eq!(Direction::from_name("Back"), Some(Direction::Back));
        assert_eq!(Direction::from_name("sideways"), None);
    }

    #[test]
    fn bindings_deduplicate() {
        let w = KeyCode::Character('W');
        let mut bindings = KeyBindings::new().with(Direction::Forward, w);
        bindings.bind(Direction::Forward, w);
        assert_eq!(bindings.bindings(Direction::Forward), &[InputBinding::Key(w)]);
        assert!(bindings.bindings(Direction::Back).is_empty());
        bindings.unbind(Direction::Forward);
        assert!(bindings.is_empty());
    }

    #[test]
    fn validation_rejects_bad_tunables() {
        let config = ScreenConfig {
            edge_rotation_distance: 1.5,
            ..ScreenConfig::default()
        };
        assert_eq!(config.validate(), Err(SceneError::EdgeRotationOutOfRange(1.5)));

        let config = ScreenConfig {
            camera: Some(CameraConfig {
                velocity: -1.0,
                ..CameraConfig::default()
            }),
            ..ScreenConfig::default()
        };
        assert_eq!(config.validate(), Err(SceneError::InvalidVelocity(-1.0)));
        assert!(ScreenConfig::default().validate().is_ok());
    }

    #[test]
    fn camera_config_builds_camera() {
        let camera = CameraConfig {
            mode: MovementMode::HorizonLocked,
            position: Vec3::new(1.0, 2.0, 3.0),
            velocity: 4.0,
            ..CameraConfig::default()
        }
        .build()
        .unwrap();
        assert_eq!(camera.mode(), MovementMode::HorizonLocked);
        assert_eq!(camera.position(), Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(camera.velocity(), 4.0);
    }
}
