//! Narrow seam to the graphics backend.
//!
//! The scene controller never talks to a GPU API directly. Everything it
//! needs (program binding, uniform writes, draw submission and the frame
//! state touched by setup callbacks) goes through [`RenderBackend`].

mod recording;

use std::fmt;

use glam::{Mat4, Vec3};

pub use recording::{RecordingBackend, RenderCommand};

/// Identity of a linked shader program, as handed out by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ShaderProgram(u32);

impl ShaderProgram {
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    pub fn id(self) -> u32 {
        self.0
    }
}

impl fmt::Display for ShaderProgram {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "program#{}", self.0)
    }
}

/// Calls the scene controller and drawables issue against the GPU.
pub trait RenderBackend {
    fn use_program(&mut self, program: ShaderProgram);
    fn set_mat4(&mut self, program: ShaderProgram, name: &str, value: Mat4);
    fn set_vec3(&mut self, program: ShaderProgram, name: &str, value: Vec3);
    fn set_float(&mut self, program: ShaderProgram, name: &str, value: f32);
    fn set_int(&mut self, program: ShaderProgram, name: &str, value: i32);
    /// Submits one primitive of a drawable with its model transform.
    fn draw_primitive(&mut self, program: ShaderProgram, label: &str, transform: Mat4);

    fn clear(&mut self, color: Vec3);
    fn set_depth_test(&mut self, enabled: bool);
    fn set_blending(&mut self, enabled: bool);
}
