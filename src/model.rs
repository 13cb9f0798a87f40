//! A ready-made [`Drawable`] built from bounded primitives.

use glam::{Mat4, Vec3};

use crate::bounding::{self, BoundingVolume};
use crate::drawable::{ClosestPrimitive, Drawable};
use crate::render::{RenderBackend, ShaderProgram};

/// A positioned piece of a model with its collision envelope.
#[derive(Debug, Clone, PartialEq)]
pub struct Primitive {
    pub name: String,
    position: Vec3,
    volume: BoundingVolume,
    velocity: Vec3,
}

impl Primitive {
    /// Creates a primitive whose volume is centred on `position`.
    pub fn new(name: impl Into<String>, position: Vec3, volume: BoundingVolume) -> Self {
        let volume = volume.translated(position - volume.center());
        Self {
            name: name.into(),
            position,
            volume,
            velocity: Vec3::ZERO,
        }
    }

    pub fn with_velocity(mut self, velocity: Vec3) -> Self {
        self.velocity = velocity;
        self
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn volume(&self) -> &BoundingVolume {
        &self.volume
    }

    pub fn velocity(&self) -> Vec3 {
        self.velocity
    }

    fn advance(&mut self, dt: f32) {
        if !(dt > 0.0) {
            return;
        }
        let offset = self.velocity * dt;
        if offset != Vec3::ZERO {
            self.position += offset;
            self.volume = self.volume.translated(offset);
        }
    }
}

/// Group of primitives drawn with one shader.
#[derive(Debug, Clone, PartialEq)]
pub struct Model {
    name: String,
    primitives: Vec<Primitive>,
    transparent: bool,
}

impl Model {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            primitives: Vec::new(),
            transparent: false,
        }
    }

    pub fn with_primitive(mut self, primitive: Primitive) -> Self {
        self.primitives.push(primitive);
        self
    }

    pub fn add_primitive(&mut self, primitive: Primitive) {
        self.primitives.push(primitive);
    }

    pub fn set_transparent(&mut self, transparent: bool) {
        self.transparent = transparent;
    }

    pub fn transparent(mut self) -> Self {
        self.transparent = true;
        self
    }

    pub fn primitives(&self) -> &[Primitive] {
        &self.primitives
    }
}

impl Drawable for Model {
    fn name(&self) -> &str {
        &self.name
    }

    fn update(&mut self, dt: f32) {
        for primitive in &mut self.primitives {
            primitive.advance(dt);
        }
    }

    fn closest_primitive_to(&self, point: Vec3) -> Option<ClosestPrimitive> {
        self.primitives
            .iter()
            .enumerate()
            .map(|(index, primitive)| ClosestPrimitive {
                primitive: index,
                distance: primitive.position.distance(point),
            })
            .min_by(|a, b| a.distance.total_cmp(&b.distance))
    }

    fn is_transparent(&self) -> bool {
        self.transparent
    }

    fn intersects_sphere(&self, volume: &BoundingVolume) -> bool {
        self.primitives
            .iter()
            .any(|primitive| bounding::intersects(&primitive.volume, volume))
    }

    fn draw(&self, program: ShaderProgram, backend: &mut dyn RenderBackend) {
        for primitive in &self.primitives {
            let transform = Mat4::from_translation(primitive.position);
            backend.draw_primitive(program, &primitive.name, transform);
        }
    }
}
