//! Per-frame scene controller for an interactive 3D viewer.
//!
//! The crate drives camera navigation with collision avoidance, resolves
//! which drawable the pointer is nearest to, publishes lights and custom
//! uniforms to every shader and orders draw calls into an opaque pass and a
//! transparent pass. The graphics API, window and asset loading stay outside
//! the crate behind [`render::RenderBackend`] and [`drawable::Drawable`], so
//! the controller runs headless in tools and tests.

pub mod bounding;
pub mod camera;
pub mod config;
pub mod drawable;
pub mod error;
pub mod input;
pub mod light;
pub mod model;
pub mod render;
pub mod scene;
pub mod screen;

pub use bounding::{BoundingVolume, VolumeKind};
pub use camera::{Camera, MovementMode, Projection};
pub use config::{CameraConfig, Direction, KeyBindings, MovementAxis, ScreenConfig};
pub use drawable::{ClosestPrimitive, Drawable};
pub use error::SceneError;
pub use input::{InputBinding, InputState, KeyCode, MouseButton, NamedKey};
pub use light::{
    DirectionalLight, LightRegistry, PointLight, SpecularUniformPolicy, SpotLight,
};
pub use model::{Model, Primitive};
pub use render::{RecordingBackend, RenderBackend, RenderCommand, ShaderProgram};
pub use scene::SceneDescription;
pub use screen::{DrawableId, PickResult, Screen, ScreenBuilder, ShaderId};
