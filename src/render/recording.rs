use glam::{Mat4, Vec3};

use super::{RenderBackend, ShaderProgram};

/// One call received by a [`RecordingBackend`].
#[derive(Debug, Clone, PartialEq)]
pub enum RenderCommand {
    UseProgram(ShaderProgram),
    SetMat4 {
        program: ShaderProgram,
        name: String,
        value: Mat4,
    },
    SetVec3 {
        program: ShaderProgram,
        name: String,
        value: Vec3,
    },
    SetFloat {
        program: ShaderProgram,
        name: String,
        value: f32,
    },
    SetInt {
        program: ShaderProgram,
        name: String,
        value: i32,
    },
    Draw {
        program: ShaderProgram,
        label: String,
        transform: Mat4,
    },
    Clear(Vec3),
    DepthTest(bool),
    Blending(bool),
}

/// Headless backend that keeps every call in submission order.
#[derive(Debug, Default)]
pub struct RecordingBackend {
    commands: Vec<RenderCommand>,
}

impl RecordingBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn commands(&self) -> &[RenderCommand] {
        &self.commands
    }

    /// Drops everything recorded so far, typically between frames.
    pub fn reset(&mut self) {
        self.commands.clear();
    }

    /// Labels of the submitted primitives, in order.
    pub fn draw_labels(&self) -> Vec<&str> {
        self.commands
            .iter()
            .filter_map(|command| match command {
                RenderCommand::Draw { label, .. } => Some(label.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Every integer value written under `name`, in order.
    pub fn int_uniforms(&self, name: &str) -> Vec<i32> {
        self.commands
            .iter()
            .filter_map(|command| match command {
                RenderCommand::SetInt {
                    name: written,
                    value,
                    ..
                } if written == name => Some(*value),
                _ => None,
            })
            .collect()
    }

    /// Last vector written under `name` for `program`.
    pub fn last_vec3(&self, program: ShaderProgram, name: &str) -> Option<Vec3> {
        self.commands.iter().rev().find_map(|command| match command {
            RenderCommand::SetVec3 {
                program: target,
                name: written,
                value,
            } if *target == program && written == name => Some(*value),
            _ => None,
        })
    }

    /// Last float written under `name` for `program`.
    pub fn last_float(&self, program: ShaderProgram, name: &str) -> Option<f32> {
        self.commands.iter().rev().find_map(|command| match command {
            RenderCommand::SetFloat {
                program: target,
                name: written,
                value,
            } if *target == program && written == name => Some(*value),
            _ => None,
        })
    }

    /// Number of `name` writes of any type.
    pub fn uniform_writes(&self, name: &str) -> usize {
        self.commands
            .iter()
            .filter(|command| match command {
                RenderCommand::SetMat4 { name: written, .. }
                | RenderCommand::SetVec3 { name: written, .. }
                | RenderCommand::SetFloat { name: written, .. }
                | RenderCommand::SetInt { name: written, .. } => written == name,
                _ => false,
            })
            .count()
    }
}

impl RenderBackend for RecordingBackend {
    fn use_program(&mut self, program: ShaderProgram) {
        self.commands.push(RenderCommand::UseProgram(program));
    }

    fn set_mat4(&mut self, program: ShaderProgram, name: &str, value: Mat4) {
        self.commands.push(RenderCommand::SetMat4 {
            program,
            name: name.to_string(),
            value,
        });
    }

    fn set_vec3(&mut self, program: ShaderProgram, name: &str, value: Vec3) {
        self.commands.push(RenderCommand::SetVec3 {
            program,
            name: name.to_string(),
            value,
        });
    }

    fn set_float(&mut self, program: ShaderProgram, name: &str, value: f32) {
        self.commands.push(RenderCommand::SetFloat {
            program,
            name: name.to_string(),
            value,
        });
    }

    fn set_int(&mut self, program: ShaderProgram, name: &str, value: i32) {
        self.commands.push(RenderCommand::SetInt {
            program,
            name: name.to_string(),
            value,
        });
    }

    fn draw_primitive(&mut self, program: ShaderProgram, label: &str, transform: Mat4) {
        self.commands.push(RenderCommand::Draw {
            program,
            label: label.to_string(),
            transform,
        });
    }

    fn clear(&mut self, color: Vec3) {
        self.commands.push(RenderCommand::Clear(color));
    }

    fn set_depth_test(&mut self, enabled: bool) {
        self.commands.push(RenderCommand::DepthTest(enabled));
    }

    fn set_blending(&mut self, enabled: bool) {
        self.commands.push(RenderCommand::Blending(enabled));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PROGRAM: ShaderProgram = ShaderProgram::new(3);

    #[test]
    fn keeps_calls_in_order() {
        let mut backend = RecordingBackend::new();
        backend.use_program(PROGRAM);
        backend.set_int(PROGRAM, "count", 2);
        backend.draw_primitive(PROGRAM, "cube", Mat4::IDENTITY);
        backend.set_int(PROGRAM, "count", 3);

        assert_eq!(backend.commands()[0], RenderCommand::UseProgram(PROGRAM));
        assert_eq!(backend.draw_labels(), vec!["cube"]);
        assert_eq!(backend.int_uniforms("count"), vec![2, 3]);
        assert_eq!(backend.uniform_writes("count"), 2);

        backend.reset();
        assert!(backend.commands().is_empty());
    }

    #[test]
    fn last_value_lookup_is_per_program() {
        let other = ShaderProgram::new(4);
        let mut backend = RecordingBackend::new();
        backend.set_vec3(PROGRAM, "tint", Vec3::X);
        backend.set_vec3(other, "tint", Vec3::Y);
        backend.set_float(PROGRAM, "gloss", 0.5);
        assert_eq!(backend.last_vec3(PROGRAM, "tint"), Some(Vec3::X));
        assert_eq!(backend.last_vec3(other, "tint"), Some(Vec3::Y));
        assert_eq!(backend.last_float(PROGRAM, "gloss"), Some(0.5));
        assert_eq!(backend.last_float(other, "gloss"), None);
    }
}
