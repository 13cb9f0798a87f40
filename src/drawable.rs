use glam::Vec3;

use crate::bounding::BoundingVolume;
use crate::render::{RenderBackend, ShaderProgram};

/// Result of a nearest-primitive query on one drawable.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClosestPrimitive {
    /// Index of the primitive inside its drawable.
    pub primitive: usize,
    pub distance: f32,
}

/// A renderable object grouped under a shader.
///
/// The scene controller only coordinates drawables: geometry, the cost of
/// the closest-primitive search and the actual draw calls are theirs.
pub trait Drawable {
    fn name(&self) -> &str;

    /// Advances any animation by `dt` seconds.
    fn update(&mut self, dt: f32);

    /// Closest primitive to `point`, or `None` for an empty drawable.
    fn closest_primitive_to(&self, point: Vec3) -> Option<ClosestPrimitive>;

    fn is_transparent(&self) -> bool;

    /// Reports whether any part of this drawable overlaps `volume`.
    fn intersects_sphere(&self, volume: &BoundingVolume) -> bool;

    /// Issues the draw calls for this drawable. `program` is already bound.
    fn draw(&self, program: ShaderProgram, backend: &mut dyn RenderBackend);
}
