use std::collections::BTreeMap;

use anyhow::{anyhow, bail, Context, Result};
use glam::Vec3;
use log::warn;
use roxmltree::{Document, Node};

use crate::bounding::{BoundingVolume, VolumeKind};
use crate::camera::{MovementMode, Projection};
use crate::config::{CameraConfig, Direction, ScreenConfig};
use crate::input::InputBinding;
use crate::light::{
    DirectionalLight, DirectionalLightUniforms, PointLight, PointLightUniforms,
    SpecularUniformPolicy, SpotLight, SpotLightUniforms,
};
use crate::model::{Model, Primitive};
use crate::render::ShaderProgram;
use crate::screen::Screen;

/// Scene setup parsed from the XML format used by the viewer tools.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SceneDescription {
    pub config: ScreenConfig,
    pub axes: Vec<AxisBinding>,
    pub shaders: Vec<ShaderDescription>,
    pub lights: Vec<LightDescription>,
    pub float_uniforms: BTreeMap<String, f32>,
    pub vector_uniforms: BTreeMap<String, Vec3>,
}

/// Axis bound through a movement handler name, e.g. `Walk`.
#[derive(Debug, Clone, PartialEq)]
pub struct AxisBinding {
    pub handler: String,
    pub positive: Option<InputBinding>,
    pub negative: Option<InputBinding>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ShaderDescription {
    pub name: String,
    pub models: Vec<Model>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum LightDescription {
    Directional(DirectionalLight, DirectionalLightUniforms),
    Point(PointLight, PointLightUniforms),
    Spot(SpotLight, SpotLightUniforms),
}

impl SceneDescription {
    pub fn from_xml(xml: &str) -> Result<Self> {
        let document = Document::parse(xml).context("invalid scene XML")?;
        let root = document.root_element();
        let mut scene = SceneDescription::default();

        if let Some(node) = child(&root, "camera") {
            scene.config.camera = Some(parse_camera(&node).context("invalid <camera>")?);
        }
        if let Some(node) = child(&root, "controls") {
            parse_controls(&node, &mut scene).context("invalid <controls>")?;
        }
        if let Some(policy) = optional_text(&root, "specular-policy") {
            scene.config.specular_policy = match policy.as_str() {
                "specular" => SpecularUniformPolicy::Specular,
                "diffuse-alias" => SpecularUniformPolicy::DiffuseAlias,
                other => bail!("unknown specular policy `{other}`"),
            };
        }
        for node in root.children().filter(|n| n.has_tag_name("shader")) {
            let shader = parse_shader(&node)?;
            scene.shaders.push(shader);
        }
        for (index, node) in root
            .children()
            .filter(|n| n.has_tag_name("light"))
            .enumerate()
        {
            let light = parse_light(&node).with_context(|| format!("invalid light #{index}"))?;
            scene.lights.push(light);
        }
        for node in root.children().filter(|n| n.has_tag_name("uniform")) {
            let name = required_text(&node, "name")?;
            if let Some(value) = optional_text(&node, "vector") {
                let value = parse_vec3(&value).with_context(|| format!("uniform {name}"))?;
                scene.vector_uniforms.insert(name, value);
            } else {
                let value = parse_f32(&required_text(&node, "float")?)
                    .with_context(|| format!("uniform {name}"))?;
                scene.float_uniforms.insert(name, value);
            }
        }

        Ok(scene)
    }

    pub fn model_count(&self) -> usize {
        self.shaders.iter().map(|shader| shader.models.len()).sum()
    }

    /// Builds a controller holding this scene. Shader programs are numbered
    /// from one in declaration order.
    pub fn build(&self) -> Result<Screen> {
        let mut screen = crate::screen::ScreenBuilder::from_config(self.config.clone())
            .build()
            .context("invalid scene configuration")?;
        for axis in &self.axes {
            screen.bind_axis_by_name(&axis.handler, axis.positive, axis.negative);
        }
        for (index, shader) in self.shaders.iter().enumerate() {
            let id = u32::try_from(index + 1).context("too many shaders")?;
            let handle = screen.add_named_shader(shader.name.as_str(), ShaderProgram::new(id));
            for model in &shader.models {
                screen.add_model_to_shader(handle, Box::new(model.clone()))?;
            }
        }
        for light in &self.lights {
            match light {
                LightDescription::Directional(light, names) => {
                    screen.add_directional_light_source(*light, names.clone());
                }
                LightDescription::Point(light, names) => {
                    screen.add_point_light_source(*light, names.clone());
                }
                LightDescription::Spot(light, names) => {
                    screen.add_spot_light_source(*light, names.clone());
                }
            }
        }
        for (name, value) in &self.float_uniforms {
            screen.set_uniform_float(name.clone(), *value);
        }
        for (name, value) in &self.vector_uniforms {
            screen.set_uniform_vector(name.clone(), *value);
        }
        Ok(screen)
    }
}

fn parse_camera(node: &Node<'_, '_>) -> Result<CameraConfig> {
    let defaults = CameraConfig::default();
    let mode = match optional_text(node, "mode") {
        Some(name) => {
            MovementMode::from_name(&name).ok_or_else(|| anyhow!("unknown camera mode `{name}`"))?
        }
        None => defaults.mode,
    };
    let projection = Projection {
        fov: optional_f32(node, "fov", defaults.projection.fov)?,
        aspect: optional_f32(node, "aspect", defaults.projection.aspect)?,
        near: optional_f32(node, "near", defaults.projection.near)?,
        far: optional_f32(node, "far", defaults.projection.far)?,
    };
    Ok(CameraConfig {
        mode,
        position: optional_vec3(node, "position", defaults.position)?,
        yaw: optional_f32(node, "yaw", defaults.yaw)?,
        pitch: optional_f32(node, "pitch", defaults.pitch)?,
        projection,
        velocity: optional_f32(node, "velocity", defaults.velocity)?,
        rotation_step: optional_f32(node, "rotation-step", defaults.rotation_step)?,
        body_radius: optional_f32(node, "body-radius", defaults.body_radius)?,
    })
}

fn parse_controls(node: &Node<'_, '_>, scene: &mut SceneDescription) -> Result<()> {
    scene.config.edge_rotation_distance = optional_f32(node, "edge-rotation", 0.0)?;
    for bind in node.children().filter(|n| n.has_tag_name("bind")) {
        let direction = required_text(&bind, "direction")?;
        let direction = Direction::from_name(&direction)
            .ok_or_else(|| anyhow!("unknown direction `{direction}`"))?;
        let input = parse_binding(&required_text(&bind, "input")?)?;
        scene.config.key_bindings.bind(direction, input);
    }
    for axis in node.children().filter(|n| n.has_tag_name("axis")) {
        let positive = optional_text(&axis, "positive")
            .map(|name| parse_binding(&name))
            .transpose()?;
        let negative = optional_text(&axis, "negative")
            .map(|name| parse_binding(&name))
            .transpose()?;
        scene.axes.push(AxisBinding {
            handler: required_text(&axis, "handler")?,
            positive,
            negative,
        });
    }
    Ok(())
}

fn parse_binding(name: &str) -> Result<InputBinding> {
    InputBinding::from_name(name).ok_or_else(|| anyhow!("unknown key or button `{name}`"))
}

fn parse_shader(node: &Node<'_, '_>) -> Result<ShaderDescription> {
    let name = required_text(node, "name").context("<shader> needs a name")?;
    let mut models = Vec::new();
    for model_node in node.children().filter(|n| n.has_tag_name("model")) {
        let model_name = required_text(&model_node, "name")
            .with_context(|| format!("model in shader {name}"))?;
        let mut model = Model::new(model_name.clone());
        model.set_transparent(optional_bool(&model_node, "transparent")?);
        for primitive in model_node.children().filter(|n| n.has_tag_name("primitive")) {
            let primitive = parse_primitive(&primitive)
                .with_context(|| format!("primitive in model {model_name}"))?;
            model.add_primitive(primitive);
        }
        if model.primitives().is_empty() {
            warn!("model {model_name} has no primitives and will never be drawn or picked");
        }
        models.push(model);
    }
    Ok(ShaderDescription { name, models })
}

fn parse_primitive(node: &Node<'_, '_>) -> Result<Primitive> {
    let name = required_text(node, "name")?;
    let kind = required_text(node, "kind")?;
    let kind = VolumeKind::from_name(&kind).ok_or_else(|| anyhow!("unknown kind `{kind}`"))?;
    let mut params = BTreeMap::new();
    for &param in kind.required_params() {
        if let Some(value) = optional_text(node, param) {
            params.insert(param.to_string(), parse_f32(&value)?);
        }
    }
    let position = optional_vec3(node, "position", Vec3::ZERO)?;
    let volume = BoundingVolume::new(kind, position, params)?;
    let velocity = optional_vec3(node, "velocity", Vec3::ZERO)?;
    Ok(Primitive::new(name, position, volume).with_velocity(velocity))
}

fn parse_light(node: &Node<'_, '_>) -> Result<LightDescription> {
    let kind = required_text(node, "kind")?;
    let names = uniform_names(node);
    let vec3 = |tag: &str| -> Result<Vec3> {
        parse_vec3(&required_text(node, tag)?).with_context(|| format!("<{tag}>"))
    };
    let float = |tag: &str| -> Result<f32> {
        parse_f32(&required_text(node, tag)?).with_context(|| format!("<{tag}>"))
    };
    let light = match kind.as_str() {
        "directional" => {
            let names: [&str; 4] = fixed_names(&names, "directional")?;
            LightDescription::Directional(
                DirectionalLight {
                    direction: vec3("direction")?,
                    ambient: vec3("ambient")?,
                    diffuse: vec3("diffuse")?,
                    specular: vec3("specular")?,
                },
                names.into(),
            )
        }
        "point" => {
            let names: [&str; 7] = fixed_names(&names, "point")?;
            LightDescription::Point(
                PointLight {
                    position: vec3("position")?,
                    ambient: vec3("ambient")?,
                    diffuse: vec3("diffuse")?,
                    specular: vec3("specular")?,
                    constant: float("constant")?,
                    linear: float("linear")?,
                    quadratic: float("quadratic")?,
                },
                names.into(),
            )
        }
        "spot" => {
            let names: [&str; 10] = fixed_names(&names, "spot")?;
            LightDescription::Spot(
                SpotLight {
                    position: vec3("position")?,
                    direction: vec3("direction")?,
                    ambient: vec3("ambient")?,
                    diffuse: vec3("diffuse")?,
                    specular: vec3("specular")?,
                    constant: float("constant")?,
                    linear: float("linear")?,
                    quadratic: float("quadratic")?,
                    cutoff: float("cutoff")?,
                    outer_cutoff: float("outer-cutoff")?,
                },
                names.into(),
            )
        }
        other => bail!("unknown light kind `{other}`"),
    };
    Ok(light)
}

/// Uniform names listed under `<uniforms>`; `<name/>` stands for "do not
/// publish".
fn uniform_names(node: &Node<'_, '_>) -> Vec<String> {
    child(node, "uniforms")
        .map(|uniforms| {
            uniforms
                .children()
                .filter(|n| n.has_tag_name("name"))
                .map(|n| n.text().map(str::trim).unwrap_or_default().to_string())
                .collect()
        })
        .unwrap_or_default()
}

fn fixed_names<'a, const N: usize>(names: &'a [String], kind: &str) -> Result<[&'a str; N]> {
    let borrowed: Vec<&str> = names.iter().map(String::as_str).collect();
    borrowed.try_into().map_err(|names: Vec<&str>| {
        anyhow!(
            "{kind} light needs {N} uniform names, found {}",
            names.len()
        )
    })
}

fn child<'a, 'input>(node: &Node<'a, 'input>, tag: &str) -> Option<Node<'a, 'input>> {
    node.children().find(|child| child.has_tag_name(tag))
}

fn required_text(node: &Node<'_, '_>, tag: &str) -> Result<String> {
    optional_text(node, tag).ok_or_else(|| anyhow!("<{tag}> tag is missing"))
}

fn optional_text(node: &Node<'_, '_>, tag: &str) -> Option<String> {
    child(node, tag)
        .and_then(|child| child.text())
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(|text| text.to_string())
}

fn optional_f32(node: &Node<'_, '_>, tag: &str, default: f32) -> Result<f32> {
    match optional_text(node, tag) {
        Some(value) => parse_f32(&value).with_context(|| format!("<{tag}>")),
        None => Ok(default),
    }
}

fn optional_vec3(node: &Node<'_, '_>, tag: &str, default: Vec3) -> Result<Vec3> {
    match optional_text(node, tag) {
        Some(value) => parse_vec3(&value).with_context(|| format!("<{tag}>")),
        None => Ok(default),
    }
}

fn optional_bool(node: &Node<'_, '_>, tag: &str) -> Result<bool> {
    match optional_text(node, tag).as_deref() {
        None | Some("false") | Some("0") => Ok(false),
        Some("true") | Some("1") => Ok(true),
        Some(other) => Err(anyhow!("<{tag}> expects true or false, got `{other}`")),
    }
}

pub(crate) fn parse_vec3(value: &str) -> Result<Vec3> {
    let numbers = value
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|part| !part.is_empty())
        .map(parse_f32)
        .collect::<Result<Vec<_>>>()?;
    match numbers.as_slice() {
        [x, y, z] => Ok(Vec3::new(*x, *y, *z)),
        _ => Err(anyhow!("expected 3 vector components, found {}", numbers.len())),
    }
}

fn parse_f32(value: &str) -> Result<f32> {
    value
        .trim()
        .parse::<f32>()
        .map_err(|err| anyhow!("failed to parse float `{value}`: {err}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drawable::Drawable;
    use crate::input::KeyCode;

    const SAMPLE: &str = r#"
    <scene>
        <camera>
            <mode>horizon-locked</mode>
            <position>0 0 0</position>
            <velocity>2</velocity>
            <fov>60</fov>
        </camera>
        <controls>
            <edge-rotation>0.05</edge-rotation>
            <bind><direction>rotate-left</direction><input>Left</input></bind>
            <axis><handler>Walk</handler><positive>W</positive><negative>S</negative></axis>
            <axis><handler>Teleport</handler><positive>T</positive></axis>
        </controls>
        <shader>
            <name>lit</name>
            <model>
                <name>Crate</name>
                <primitive>
                    <name>crate-box</name>
                    <kind>aabb</kind>
                    <position>4 0 0</position>
                    <width>1</width><length>1</length><height>1</height>
                </primitive>
            </model>
            <model>
                <name>Window</name>
                <transparent>true</transparent>
                <primitive>
                    <name>pane</name>
                    <kind>sphere</kind>
                    <position>0 0 6</position>
                    <radius>0.5</radius>
                </primitive>
            </model>
        </shader>
        <light>
            <kind>point</kind>
            <position>0 5 0</position>
            <ambient>0.1 0.1 0.1</ambient>
            <diffuse>1 1 1</diffuse>
            <specular>1 1 1</specular>
            <constant>1</constant>
            <linear>0.09</linear>
            <quadratic>0.032</quadratic>
            <uniforms>
                <name>pointLight[0].position</name>
                <name/>
                <name>pointLight[0].diffuse</name>
                <name>pointLight[0].specular</name>
                <name>pointLight[0].constant</name>
                <name>pointLight[0].linear</name>
                <name>pointLight[0].quadratic</name>
            </uniforms>
        </light>
        <uniform><name>fogDensity</name><float>0.25</float></uniform>
        <uniform><name>fogColor</name><vector>0.5, 0.5, 0.6</vector></uniform>
    </scene>
    "#;

    #[test]
    fn parse_scene_populates_everything() {
        let scene = SceneDescription::from_xml(SAMPLE).unwrap();
        let camera = scene.config.camera.as_ref().unwrap();
        assert_eq!(camera.mode, MovementMode::HorizonLocked);
        assert_eq!(camera.velocity, 2.0);
        assert_eq!(camera.projection.fov, 60.0);
        assert_eq!(scene.config.edge_rotation_distance, 0.05);
        assert_eq!(
            scene.config.key_bindings.bindings(Direction::RotateLeft),
            &[InputBinding::Key(KeyCode::Named(crate::input::NamedKey::Left))]
        );
        assert_eq!(scene.axes.len(), 2);
        assert_eq!(scene.shaders.len(), 1);
        assert_eq!(scene.model_count(), 2);
        assert!(scene.shaders[0].models[1].is_transparent());
        match &scene.lights[0] {
            LightDescription::Point(light, names) => {
                assert_eq!(light.position, Vec3::new(0.0, 5.0, 0.0));
                assert!(names.ambient.is_empty());
                assert_eq!(names.quadratic, "pointLight[0].quadratic");
            }
            other => panic!("unexpected light {other:?}"),
        }
        assert_eq!(scene.float_uniforms.get("fogDensity"), Some(&0.25));
        assert_eq!(
            scene.vector_uniforms.get("fogColor"),
            Some(&Vec3::new(0.5, 0.5, 0.6))
        );
    }

    #[test]
    fn build_skips_unknown_handlers() {
        let scene = SceneDescription::from_xml(SAMPLE).unwrap();
        let screen = scene.build().unwrap();
        assert_eq!(screen.drawable_count(), 2);
        assert_eq!(screen.lights().point_count(), 1);
        let bindings = screen.key_bindings();
        assert_eq!(
            bindings.bindings(Direction::Forward),
            &[InputBinding::Key(KeyCode::Character('W'))]
        );
        assert!(bindings.bindings(Direction::Up).is_empty());
    }

    #[test]
    fn build_keeps_shader_names_in_declaration_order() {
        let xml = r#"<scene>
            <shader><name>opaque</name></shader>
            <shader><name>glass</name></shader>
        </scene>"#;
        let screen = SceneDescription::from_xml(xml).unwrap().build().unwrap();
        let glass = screen.shader_by_name("glass").unwrap();
        assert_eq!(screen.shader_name(glass), Some("glass"));
        assert_eq!(screen.shader_program(glass), Some(ShaderProgram::new(2)));
        let opaque = screen.shader_by_name("opaque").unwrap();
        assert_eq!(screen.shader_program(opaque), Some(ShaderProgram::new(1)));
        assert!(screen.shader_by_name("missing").is_none());
    }

    #[test]
    fn controls_are_read_from_child_elements() {
        let xml = r#"<scene><controls>
            <bind><direction>up</direction><input>Space</input></bind>
            <axis><handler>Strafe</handler><negative>A</negative></axis>
        </controls></scene>"#;
        let scene = SceneDescription::from_xml(xml).unwrap();
        assert_eq!(scene.config.key_bindings.bindings(Direction::Up).len(), 1);
        assert_eq!(scene.axes[0].handler, "Strafe");
        assert!(scene.axes[0].positive.is_none());
        assert_eq!(
            scene.axes[0].negative,
            Some(InputBinding::Key(KeyCode::Character('A')))
        );

        let attributes = r#"<scene><controls><bind direction="up" input="Space"/></controls></scene>"#;
        let err = SceneDescription::from_xml(attributes).unwrap_err();
        assert!(format!("{err:#}").contains("<direction> tag is missing"));
    }

    #[test]
    fn missing_volume_parameter_is_an_error() {
        let bad = r#"<scene><shader><name>s</name><model><name>m</name>
            <primitive><name>p</name><kind>aabb</kind><width>1</width><length>1</length></primitive>
        </model></shader></scene>"#;
        let err = SceneDescription::from_xml(bad).unwrap_err();
        assert!(format!("{err:#}").contains("height"));
    }

    #[test]
    fn wrong_number_of_uniform_names_is_an_error() {
        let bad = r#"<scene><light>
            <kind>directional</kind>
            <direction>0 -1 0</direction><ambient>0 0 0</ambient>
            <diffuse>1 1 1</diffuse><specular>1 1 1</specular>
            <uniforms><name>a</name><name>b</name></uniforms>
        </light></scene>"#;
        let err = SceneDescription::from_xml(bad).unwrap_err();
        assert!(format!("{err:#}").contains("needs 4 uniform names"));
    }

    #[test]
    fn invalid_configuration_fails_build() {
        let bad = "<scene><controls><edge-rotation>3</edge-rotation></controls></scene>";
        let scene = SceneDescription::from_xml(bad).unwrap();
        assert!(scene.build().is_err());
    }

    #[test]
    fn vector_parsing() {
        assert_eq!(parse_vec3("1 2 3").unwrap(), Vec3::new(1.0, 2.0, 3.0));
        assert!(parse_vec3("1 2").is_err());
        assert!(parse_vec3("1 x 3").is_err());
    }
}
