//! Light descriptors and their publication as named shader uniforms.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::render::{RenderBackend, ShaderProgram};

pub const DIRECTIONAL_COUNT_UNIFORM: &str = "NumberOfDirectionalLightSources";
pub const POINT_COUNT_UNIFORM: &str = "NumberOfPointLightSources";
pub const SPOT_COUNT_UNIFORM: &str = "NumberOfSpotLightSources";

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DirectionalLight {
    pub direction: Vec3,
    pub ambient: Vec3,
    pub diffuse: Vec3,
    pub specular: Vec3,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointLight {
    pub position: Vec3,
    pub ambient: Vec3,
    pub diffuse: Vec3,
    pub specular: Vec3,
    pub constant: f32,
    pub linear: f32,
    pub quadratic: f32,
}

/// Cone light. `cutoff` and `outer_cutoff` are stored the way the shader
/// consumes them (usually cosines).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpotLight {
    pub position: Vec3,
    pub direction: Vec3,
    pub ambient: Vec3,
    pub diffuse: Vec3,
    pub specular: Vec3,
    pub constant: f32,
    pub linear: f32,
    pub quadratic: f32,
    pub cutoff: f32,
    pub outer_cutoff: f32,
}

/// Uniform names for a directional light. An empty name is not published.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirectionalLightUniforms {
    pub direction: String,
    pub ambient: String,
    pub diffuse: String,
    pub specular: String,
}

impl From<[&str; 4]> for DirectionalLightUniforms {
    fn from([direction, ambient, diffuse, specular]: [&str; 4]) -> Self {
        Self {
            direction: direction.to_string(),
            ambient: ambient.to_string(),
            diffuse: diffuse.to_string(),
            specular: specular.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PointLightUniforms {
    pub position: String,
    pub ambient: String,
    pub diffuse: String,
    pub specular: String,
    pub constant: String,
    pub linear: String,
    pub quadratic: String,
}

impl From<[&str; 7]> for PointLightUniforms {
    fn from(
        [position, ambient, diffuse, specular, constant, linear, quadratic]: [&str; 7],
    ) -> Self {
        Self {
            position: position.to_string(),
            ambient: ambient.to_string(),
            diffuse: diffuse.to_string(),
            specular: specular.to_string(),
            constant: constant.to_string(),
            linear: linear.to_string(),
            quadratic: quadratic.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SpotLightUniforms {
    pub position: String,
    pub direction: String,
    pub ambient: String,
    pub diffuse: String,
    pub specular: String,
    pub constant: String,
    pub linear: String,
    pub quadratic: String,
    pub cutoff: String,
    pub outer_cutoff: String,
}

impl From<[&str; 10]> for SpotLightUniforms {
    fn from(
        [position, direction, ambient, diffuse, specular, constant, linear, quadratic, cutoff, outer_cutoff]: [&str; 10],
    ) -> Self {
        Self {
            position: position.to_string(),
            direction: direction.to_string(),
            ambient: ambient.to_string(),
            diffuse: diffuse.to_string(),
            specular: specular.to_string(),
            constant: constant.to_string(),
            linear: linear.to_string(),
            quadratic: quadratic.to_string(),
            cutoff: cutoff.to_string(),
            outer_cutoff: outer_cutoff.to_string(),
        }
    }
}

/// Which uniform receives a point or spot light's specular colour.
///
/// `DiffuseAlias` keeps shaders written against the older uniform contract
/// working: they read the specular colour from the diffuse slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SpecularUniformPolicy {
    #[default]
    Specular,
    DiffuseAlias,
}

/// Registered light sources, published to every shader before drawing.
#[derive(Debug, Clone, Default)]
pub struct LightRegistry {
    directional: Vec<(DirectionalLight, DirectionalLightUniforms)>,
    point: Vec<(PointLight, PointLightUniforms)>,
    spot: Vec<(SpotLight, SpotLightUniforms)>,
    specular_policy: SpecularUniformPolicy,
}

impl LightRegistry {
    pub fn new(specular_policy: SpecularUniformPolicy) -> Self {
        Self {
            specular_policy,
            ..Self::default()
        }
    }

    pub fn specular_policy(&self) -> SpecularUniformPolicy {
        self.specular_policy
    }

    pub fn set_specular_policy(&mut self, policy: SpecularUniformPolicy) {
        self.specular_policy = policy;
    }

    pub fn add_directional(&mut self, light: DirectionalLight, names: impl Into<DirectionalLightUniforms>) {
        self.directional.push((light, names.into()));
    }

    pub fn add_point(&mut self, light: PointLight, names: impl Into<PointLightUniforms>) {
        self.point.push((light, names.into()));
    }

    pub fn add_spot(&mut self, light: SpotLight, names: impl Into<SpotLightUniforms>) {
        self.spot.push((light, names.into()));
    }

    pub fn directional_count(&self) -> usize {
        self.directional.len()
    }

    pub fn point_count(&self) -> usize {
        self.point.len()
    }

    pub fn spot_count(&self) -> usize {
        self.spot.len()
    }

    /// Writes every named light field plus the per-kind counts.
    pub fn publish(&self, program: ShaderProgram, backend: &mut dyn RenderBackend) {
        let mut out = UniformWriter { program, backend };

        for (light, names) in &self.directional {
            out.vec3(&names.direction, light.direction);
            out.vec3(&names.ambient, light.ambient);
            out.vec3(&names.diffuse, light.diffuse);
            out.vec3(&names.specular, light.specular);
        }
        out.count(DIRECTIONAL_COUNT_UNIFORM, self.directional.len());

        for (light, names) in &self.point {
            out.vec3(&names.position, light.position);
            out.vec3(&names.ambient, light.ambient);
            out.vec3(&names.diffuse, light.diffuse);
            out.vec3(self.specular_name(&names.specular, &names.diffuse), light.specular);
            out.float(&names.constant, light.constant);
            out.float(&names.linear, light.linear);
            out.float(&names.quadratic, light.quadratic);
        }
        out.count(POINT_COUNT_UNIFORM, self.point.len());

        for (light, names) in &self.spot {
            out.vec3(&names.position, light.position);
            out.vec3(&names.direction, light.direction);
            out.vec3(&names.ambient, light.ambient);
            out.vec3(&names.diffuse, light.diffuse);
            out.vec3(self.specular_name(&names.specular, &names.diffuse), light.specular);
            out.float(&names.constant, light.constant);
            out.float(&names.linear, light.linear);
            out.float(&names.quadratic, light.quadratic);
            out.float(&names.cutoff, light.cutoff);
            out.float(&names.outer_cutoff, light.outer_cutoff);
        }
        out.count(SPOT_COUNT_UNIFORM, self.spot.len());
    }

    fn specular_name<'a>(&self, specular: &'a str, diffuse: &'a str) -> &'a str {
        match self.specular_policy {
            SpecularUniformPolicy::Specular => specular,
            SpecularUniformPolicy::DiffuseAlias => diffuse,
        }
    }
}

struct UniformWriter<'a> {
    program: ShaderProgram,
    backend: &'a mut dyn RenderBackend,
}

impl UniformWriter<'_> {
    fn vec3(&mut self, name: &str, value: Vec3) {
        if !name.is_empty() {
            self.backend.set_vec3(self.program, name, value);
        }
    }

    fn float(&mut self, name: &str, value: f32) {
        if !name.is_empty() {
            self.backend.set_float(self.program, name, value);
        }
    }

    fn count(&mut self, name: &str, count: usize) {
        let count = i32::try_from(count).unwrap_or(i32::MAX);
        self.backend.set_int(self.program, name, count);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::RecordingBackend;

    const PROGRAM: ShaderProgram = ShaderProgram::new(1);

    fn point_light(x: f32) -> PointLight {
        PointLight {
            position: Vec3::new(x, 1.0, 0.0),
            ambient: Vec3::splat(0.1),
            diffuse: Vec3::splat(0.5),
            specular: Vec3::ONE,
            constant: 1.0,
            linear: 0.09,
            quadratic: 0.032,
        }
    }

    fn point_names(index: usize) -> PointLightUniforms {
        let field = |name: &str| format!("pointLight[{index}].{name}");
        PointLightUniforms {
            position: field("position"),
            ambient: field("ambient"),
            diffuse: field("diffuse"),
            specular: field("specular"),
            constant: field("constant"),
            linear: field("linear"),
            quadratic: field("quadratic"),
        }
    }

    #[test]
    fn counts_are_written_even_when_empty() {
        let registry = LightRegistry::default();
        let mut backend = RecordingBackend::new();
        registry.publish(PROGRAM, &mut backend);
        assert_eq!(backend.int_uniforms(DIRECTIONAL_COUNT_UNIFORM), vec![0]);
        assert_eq!(backend.int_uniforms(POINT_COUNT_UNIFORM), vec![0]);
        assert_eq!(backend.int_uniforms(SPOT_COUNT_UNIFORM), vec![0]);
    }

    #[test]
    fn point_lights_publish_in_registration_order() {
        let mut registry = LightRegistry::default();
        registry.add_point(point_light(1.0), point_names(0));
        registry.add_point(point_light(2.0), point_names(1));
        let mut backend = RecordingBackend::new();
        registry.publish(PROGRAM, &mut backend);

        assert_eq!(backend.int_uniforms(POINT_COUNT_UNIFORM), vec![2]);
        assert_eq!(
            backend.last_vec3(PROGRAM, "pointLight[0].position"),
            Some(Vec3::new(1.0, 1.0, 0.0))
        );
        assert_eq!(
            backend.last_vec3(PROGRAM, "pointLight[1].position"),
            Some(Vec3::new(2.0, 1.0, 0.0))
        );
        assert_eq!(backend.last_float(PROGRAM, "pointLight[1].linear"), Some(0.09));
        assert_eq!(backend.last_vec3(PROGRAM, "pointLight[1].specular"), Some(Vec3::ONE));
    }

    #[test]
    fn empty_names_are_skipped() {
        let mut registry = LightRegistry::default();
        registry.add_directional(
            DirectionalLight {
                direction: Vec3::NEG_Y,
                ambient: Vec3::splat(0.2),
                diffuse: Vec3::splat(0.6),
                specular: Vec3::ONE,
            },
            ["dirLight.direction", "", "dirLight.diffuse", ""],
        );
        let mut backend = RecordingBackend::new();
        registry.publish(PROGRAM, &mut backend);

        assert_eq!(backend.last_vec3(PROGRAM, "dirLight.direction"), Some(Vec3::NEG_Y));
        assert_eq!(backend.uniform_writes(""), 0);
        // Two named fields plus three counts.
        assert_eq!(backend.commands().len(), 5);
    }

    #[test]
    fn spot_light_publishes_all_ten_fields() {
        let mut registry = LightRegistry::default();
        registry.add_spot(
            SpotLight {
                position: Vec3::ZERO,
                direction: Vec3::NEG_Z,
                ambient: Vec3::ZERO,
                diffuse: Vec3::ONE,
                specular: Vec3::splat(0.3),
                constant: 1.0,
                linear: 0.1,
                quadratic: 0.01,
                cutoff: 0.97,
                outer_cutoff: 0.95,
            },
            [
                "spot.position",
                "spot.direction",
                "spot.ambient",
                "spot.diffuse",
                "spot.specular",
                "spot.constant",
                "spot.linear",
                "spot.quadratic",
                "spot.cutoff",
                "spot.outerCutoff",
            ],
        );
        let mut backend = RecordingBackend::new();
        registry.publish(PROGRAM, &mut backend);
        assert_eq!(backend.commands().len(), 13);
        assert_eq!(backend.last_float(PROGRAM, "spot.outerCutoff"), Some(0.95));
        assert_eq!(backend.int_uniforms(SPOT_COUNT_UNIFORM), vec![1]);
    }

    #[test]
    fn diffuse_alias_routes_specular_into_diffuse_slot() {
        let mut registry = LightRegistry::new(SpecularUniformPolicy::DiffuseAlias);
        registry.add_point(point_light(0.0), point_names(0));
        let mut backend = RecordingBackend::new();
        registry.publish(PROGRAM, &mut backend);

        assert_eq!(backend.uniform_writes("pointLight[0].specular"), 0);
        assert_eq!(backend.uniform_writes("pointLight[0].diffuse"), 2);
        assert_eq!(backend.last_vec3(PROGRAM, "pointLight[0].diffuse"), Some(Vec3::ONE));
    }

    #[test]
    fn diffuse_alias_covers_spot_lights_but_not_directional_ones() {
        let mut registry = LightRegistry::new(SpecularUniformPolicy::DiffuseAlias);
        registry.add_directional(
            DirectionalLight {
                direction: Vec3::NEG_Y,
                ambient: Vec3::splat(0.2),
                diffuse: Vec3::splat(0.6),
                specular: Vec3::splat(0.9),
            },
            ["sun.direction", "sun.ambient", "sun.diffuse", "sun.specular"],
        );
        registry.add_spot(
            SpotLight {
                position: Vec3::ZERO,
                direction: Vec3::NEG_Z,
                ambient: Vec3::ZERO,
                diffuse: Vec3::splat(0.4),
                specular: Vec3::splat(0.7),
                constant: 1.0,
                linear: 0.1,
                quadratic: 0.01,
                cutoff: 0.97,
                outer_cutoff: 0.95,
            },
            [
                "torch.position",
                "torch.direction",
                "torch.ambient",
                "torch.diffuse",
                "torch.specular",
                "torch.constant",
                "torch.linear",
                "torch.quadratic",
                "torch.cutoff",
                "torch.outerCutoff",
            ],
        );
        let mut backend = RecordingBackend::new();
        registry.publish(PROGRAM, &mut backend);

        assert_eq!(backend.uniform_writes("torch.specular"), 0);
        assert_eq!(backend.uniform_writes("torch.diffuse"), 2);
        assert_eq!(backend.last_vec3(PROGRAM, "torch.diffuse"), Some(Vec3::splat(0.7)));

        assert_eq!(backend.uniform_writes("sun.diffuse"), 1);
        assert_eq!(backend.last_vec3(PROGRAM, "sun.diffuse"), Some(Vec3::splat(0.6)));
        assert_eq!(backend.last_vec3(PROGRAM, "sun.specular"), Some(Vec3::splat(0.9)));
    }
}
