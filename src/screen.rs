//! The per-frame scene controller.
//!
//! [`Screen`] owns the camera, the light registry, the shader → drawable
//! groups and the custom uniforms. Each frame the driver calls
//! [`Screen::update`] and then [`Screen::draw`]:
//!
//! * `update` moves the camera with collision checks, applies rotation,
//!   recomputes the drawable under the pointer and advances every drawable.
//! * `draw` runs the setup callback, then draws all opaque drawables of all
//!   shaders followed by all transparent ones, pushing uniforms before each
//!   pass.

use std::collections::BTreeMap;
use std::fmt;

use glam::{Mat4, Vec2, Vec3};
use log::{debug, warn};

use crate::bounding::BoundingVolume;
use crate::camera::Camera;
use crate::config::{self, Direction, KeyBindings, MovementAxis, ScreenConfig};
use crate::drawable::Drawable;
use crate::error::SceneError;
use crate::input::{InputBinding, InputState};
use crate::light::{
    DirectionalLight, DirectionalLightUniforms, LightRegistry, PointLight, PointLightUniforms,
    SpotLight, SpotLightUniforms,
};
use crate::render::{RenderBackend, ShaderProgram};

pub const VIEW_UNIFORM: &str = "view";
pub const PROJECTION_UNIFORM: &str = "projection";
pub const VIEW_POSITION_UNIFORM: &str = "viewPosition";

/// Handle of a shader group registered with [`Screen::add_shader`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ShaderId(usize);

impl ShaderId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Position of a drawable inside the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DrawableId {
    pub shader: ShaderId,
    pub index: usize,
}

/// Drawable nearest to the pointer in the last update.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PickResult {
    pub drawable: DrawableId,
    pub primitive: usize,
    pub distance: f32,
}

type SetupCallback = Box<dyn FnMut(&mut dyn RenderBackend)>;

struct ShaderGroup {
    name: String,
    program: ShaderProgram,
    drawables: Vec<Box<dyn Drawable>>,
}

/// Validates a [`ScreenConfig`] and assembles a [`Screen`] from it.
#[derive(Debug, Default)]
pub struct ScreenBuilder {
    config: ScreenConfig,
}

impl ScreenBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: ScreenConfig) -> Self {
        Self { config }
    }

    pub fn camera(mut self, camera: config::CameraConfig) -> Self {
        self.config.camera = Some(camera);
        self
    }

    pub fn key_bindings(mut self, bindings: KeyBindings) -> Self {
        self.config.key_bindings = bindings;
        self
    }

    pub fn edge_rotation_distance(mut self, distance: f32) -> Self {
        self.config.edge_rotation_distance = distance;
        self
    }

    pub fn build(self) -> Result<Screen, SceneError> {
        self.config.validate()?;
        let camera = self
            .config
            .camera
            .as_ref()
            .map(config::CameraConfig::build)
            .transpose()?;
        debug!(
            "building screen (camera: {}, edge rotation: {})",
            camera.is_some(),
            self.config.edge_rotation_distance
        );
        Ok(Screen {
            camera,
            lights: LightRegistry::new(self.config.specular_policy),
            groups: Vec::new(),
            float_uniforms: BTreeMap::new(),
            vector_uniforms: BTreeMap::new(),
            key_bindings: self.config.key_bindings,
            axes: MovementAxis::ALL.to_vec(),
            edge_rotation_distance: self.config.edge_rotation_distance,
            closest: None,
            setup: None,
        })
    }
}

/// Scene controller driven once per frame.
pub struct Screen {
    camera: Option<Camera>,
    lights: LightRegistry,
    groups: Vec<ShaderGroup>,
    float_uniforms: BTreeMap<String, f32>,
    vector_uniforms: BTreeMap<String, Vec3>,
    key_bindings: KeyBindings,
    axes: Vec<MovementAxis>,
    edge_rotation_distance: f32,
    closest: Option<PickResult>,
    setup: Option<SetupCallback>,
}

impl fmt::Debug for Screen {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Screen")
            .field("camera", &self.camera)
            .field("shaders", &self.groups.len())
            .field("drawables", &self.drawable_count())
            .field("closest", &self.closest)
            .finish_non_exhaustive()
    }
}

impl Screen {
    pub fn builder() -> ScreenBuilder {
        ScreenBuilder::new()
    }

    /// Registers a shader group labelled after its program.
    pub fn add_shader(&mut self, program: ShaderProgram) -> ShaderId {
        self.add_named_shader(program.to_string(), program)
    }

    pub fn add_named_shader(
        &mut self,
        name: impl Into<String>,
        program: ShaderProgram,
    ) -> ShaderId {
        let id = ShaderId(self.groups.len());
        self.groups.push(ShaderGroup {
            name: name.into(),
            program,
            drawables: Vec::new(),
        });
        id
    }

    pub fn shader_program(&self, shader: ShaderId) -> Option<ShaderProgram> {
        self.groups.get(shader.0).map(|group| group.program)
    }

    pub fn shader_name(&self, shader: ShaderId) -> Option<&str> {
        self.groups.get(shader.0).map(|group| group.name.as_str())
    }

    /// Looks up a shader group by label.
    pub fn shader_by_name(&self, name: &str) -> Option<ShaderId> {
        self.groups
            .iter()
            .position(|group| group.name == name)
            .map(ShaderId)
    }

    pub fn add_model_to_shader(
        &mut self,
        shader: ShaderId,
        drawable: Box<dyn Drawable>,
    ) -> Result<DrawableId, SceneError> {
        let group = self
            .groups
            .get_mut(shader.0)
            .ok_or(SceneError::UnknownShader(shader))?;
        group.drawables.push(drawable);
        Ok(DrawableId {
            shader,
            index: group.drawables.len() - 1,
        })
    }

    pub fn drawable(&self, id: DrawableId) -> Option<&dyn Drawable> {
        self.groups
            .get(id.shader.0)?
            .drawables
            .get(id.index)
            .map(|drawable| drawable.as_ref())
    }

    pub fn drawable_count(&self) -> usize {
        self.groups.iter().map(|group| group.drawables.len()).sum()
    }

    pub fn set_camera(&mut self, camera: Camera) {
        self.camera = Some(camera);
    }

    pub fn camera(&self) -> Option<&Camera> {
        self.camera.as_ref()
    }

    pub fn camera_mut(&mut self) -> Option<&mut Camera> {
        self.camera.as_mut()
    }

    pub fn set_key_bindings(&mut self, bindings: KeyBindings) {
        self.key_bindings = bindings;
    }

    pub fn key_bindings(&self) -> &KeyBindings {
        &self.key_bindings
    }

    /// Binds an axis through its handler name (`Walk`, `Strafe`, `Lift`).
    ///
    /// Unknown handler names are reported and leave the bindings untouched;
    /// returns whether the binding was applied.
    pub fn bind_axis_by_name(
        &mut self,
        handler: &str,
        positive: Option<InputBinding>,
        negative: Option<InputBinding>,
    ) -> bool {
        let Some(axis) = MovementAxis::from_handler_name(handler) else {
            warn!("unknown movement handler `{handler}`; axis left unbound");
            return false;
        };
        let (positive_direction, negative_direction) = axis.directions();
        for (direction, binding) in [(positive_direction, positive), (negative_direction, negative)]
        {
            if let Some(binding) = binding {
                self.key_bindings.bind(direction, binding);
            }
        }
        true
    }

    /// Restricts collision-checked movement to `axes`; others stay idle.
    pub fn set_movement_axes(&mut self, axes: &[MovementAxis]) {
        self.axes = axes.to_vec();
    }

    pub fn edge_rotation_distance(&self) -> f32 {
        self.edge_rotation_distance
    }

    /// Sets the pointer edge band; values outside `[0, 1]` are ignored.
    pub fn set_edge_rotation_distance(&mut self, distance: f32) {
        match config::validate_edge_rotation_distance(distance) {
            Ok(()) => self.edge_rotation_distance = distance,
            Err(err) => warn!("{err}; keeping {}", self.edge_rotation_distance),
        }
    }

    pub fn lights(&self) -> &LightRegistry {
        &self.lights
    }

    pub fn lights_mut(&mut self) -> &mut LightRegistry {
        &mut self.lights
    }

    pub fn add_directional_light_source(
        &mut self,
        light: DirectionalLight,
        names: impl Into<DirectionalLightUniforms>,
    ) {
        self.lights.add_directional(light, names);
    }

    pub fn add_point_light_source(&mut self, light: PointLight, names: impl Into<PointLightUniforms>) {
        self.lights.add_point(light, names);
    }

    pub fn add_spot_light_source(&mut self, light: SpotLight, names: impl Into<SpotLightUniforms>) {
        self.lights.add_spot(light, names);
    }

    pub fn set_uniform_float(&mut self, name: impl Into<String>, value: f32) {
        self.float_uniforms.insert(name.into(), value);
    }

    pub fn set_uniform_vector(&mut self, name: impl Into<String>, value: Vec3) {
        self.vector_uniforms.insert(name.into(), value);
    }

    /// Registers the callback run at the start of every [`Screen::draw`].
    pub fn setup(&mut self, callback: impl FnMut(&mut dyn RenderBackend) + 'static) {
        self.setup = Some(Box::new(callback));
    }

    /// Picking result of the last update.
    pub fn closest(&self) -> Option<PickResult> {
        self.closest
    }

    /// Distance of the drawable nearest to the pointer, if any.
    pub fn closest_drawable_distance(&self) -> Option<f32> {
        self.closest.map(|pick| pick.distance)
    }

    pub fn closest_drawable(&self) -> Option<&dyn Drawable> {
        self.drawable(self.closest?.drawable)
    }

    /// Runs one frame of simulation. A zero, negative or NaN `dt` only
    /// refreshes picking.
    pub fn update(&mut self, dt: f32, input: &InputState) {
        let pointer = input.pointer();
        let advancing = dt > 0.0;
        if advancing {
            for axis in self.axes.clone() {
                self.apply_movement(axis, dt, input);
            }
            self.apply_rotation(dt, pointer, input);
        }
        self.closest = self.pick(pointer);
        if !advancing {
            return;
        }
        for group in &mut self.groups {
            for drawable in &mut group.drawables {
                drawable.update(dt);
            }
        }
    }

    /// Draws every registered drawable, opaque ones first.
    pub fn draw(&mut self, backend: &mut dyn RenderBackend) {
        if let Some(setup) = self.setup.as_mut() {
            setup(&mut *backend);
        }
        for transparent in [false, true] {
            for group in &self.groups {
                backend.use_program(group.program);
                self.push_uniforms(group.program, backend);
                for drawable in group
                    .drawables
                    .iter()
                    .filter(|drawable| drawable.is_transparent() == transparent)
                {
                    drawable.draw(group.program, backend);
                }
            }
        }
    }

    fn push_uniforms(&self, program: ShaderProgram, backend: &mut dyn RenderBackend) {
        match &self.camera {
            Some(camera) => {
                backend.set_mat4(program, VIEW_UNIFORM, camera.view_matrix());
                backend.set_mat4(program, PROJECTION_UNIFORM, camera.projection_matrix());
                backend.set_vec3(program, VIEW_POSITION_UNIFORM, camera.position());
            }
            None => {
                backend.set_mat4(program, VIEW_UNIFORM, Mat4::IDENTITY);
                backend.set_mat4(program, PROJECTION_UNIFORM, Mat4::IDENTITY);
                backend.set_vec3(program, VIEW_POSITION_UNIFORM, Vec3::ZERO);
            }
        }
        self.lights.publish(program, backend);
        for (name, value) in &self.float_uniforms {
            backend.set_float(program, name, *value);
        }
        for (name, value) in &self.vector_uniforms {
            backend.set_vec3(program, name, *value);
        }
    }

    fn is_active(&self, direction: Direction, input: &InputState) -> bool {
        self.key_bindings
            .bindings(direction)
            .iter()
            .any(|binding| input.is_down(*binding))
    }

    /// Net sign of two opposing directions: `+1`, `-1` or `0`.
    fn axis_sign(&self, positive: Direction, negative: Direction, input: &InputState) -> f32 {
        let positive = self.is_active(positive, input);
        let negative = self.is_active(negative, input);
        match (positive, negative) {
            (true, false) => 1.0,
            (false, true) => -1.0,
            _ => 0.0,
        }
    }

    fn apply_movement(&mut self, axis: MovementAxis, dt: f32, input: &InputState) {
        let Some(camera) = self.camera.as_ref() else {
            return;
        };
        let (positive, negative) = axis.directions();
        let step = self.axis_sign(positive, negative, input) * camera.velocity() * dt;
        if step == 0.0 {
            return;
        }
        let proposed = match axis {
            MovementAxis::Forward => camera.propose_move_along_front(step),
            MovementAxis::Strafe => camera.propose_strafe(step),
            MovementAxis::Lift => camera.propose_lift(step),
        };
        if self.collides(&proposed) {
            debug!("{axis:?} move of {step} blocked");
            return;
        }
        let Some(camera) = self.camera.as_mut() else {
            return;
        };
        match axis {
            MovementAxis::Forward => camera.commit_move_along_front(step),
            MovementAxis::Strafe => camera.commit_strafe(step),
            MovementAxis::Lift => camera.commit_lift(step),
        }
    }

    fn collides(&self, volume: &BoundingVolume) -> bool {
        self.groups
            .iter()
            .flat_map(|group| group.drawables.iter())
            .any(|drawable| drawable.intersects_sphere(volume))
    }

    fn apply_rotation(&mut self, dt: f32, pointer: Vec2, input: &InputState) {
        let Some(step) = self.camera.as_ref().map(|camera| camera.rotation_step() * dt) else {
            return;
        };
        let mut flags = RotationFlags {
            up: self.is_active(Direction::RotateUp, input),
            down: self.is_active(Direction::RotateDown, input),
            left: self.is_active(Direction::RotateLeft, input),
            right: self.is_active(Direction::RotateRight, input),
        };
        if self.edge_rotation_distance > 0.0 {
            flags = flags.merge(RotationFlags::from_pointer(pointer, self.edge_rotation_distance));
        }
        let (d_yaw, d_pitch) = flags.delta(step);
        if d_yaw == 0.0 && d_pitch == 0.0 {
            return;
        }
        if let Some(camera) = self.camera.as_mut() {
            camera.update_orientation(d_yaw, d_pitch);
        }
    }

    fn pick(&self, pointer: Vec2) -> Option<PickResult> {
        let point = self.pointer_to_world(pointer);
        let mut closest: Option<PickResult> = None;
        for (shader, group) in self.groups.iter().enumerate() {
            for (index, drawable) in group.drawables.iter().enumerate() {
                let Some(candidate) = drawable.closest_primitive_to(point) else {
                    continue;
                };
                if closest.map_or(true, |best| candidate.distance < best.distance) {
                    closest = Some(PickResult {
                        drawable: DrawableId {
                            shader: ShaderId(shader),
                            index,
                        },
                        primitive: candidate.primitive,
                        distance: candidate.distance,
                    });
                }
            }
        }
        closest
    }

    fn pointer_to_world(&self, pointer: Vec2) -> Vec3 {
        let ndc = pointer.extend(0.0);
        match &self.camera {
            Some(camera) => {
                let inverse = (camera.projection_matrix() * camera.view_matrix()).inverse();
                inverse.project_point3(ndc)
            }
            None => ndc,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct RotationFlags {
    up: bool,
    down: bool,
    left: bool,
    right: bool,
}

impl RotationFlags {
    fn from_pointer(pointer: Vec2, distance: f32) -> Self {
        let edge = 1.0 - distance;
        Self {
            up: pointer.y >= edge,
            down: pointer.y <= -edge,
            left: pointer.x <= -edge,
            right: pointer.x >= edge,
        }
    }

    fn merge(self, other: Self) -> Self {
        Self {
            up: self.up || other.up,
            down: self.down || other.down,
            left: self.left || other.left,
            right: self.right || other.right,
        }
    }

    /// `(d_yaw, d_pitch)` for a rotation of `step` degrees.
    fn delta(self, step: f32) -> (f32, f32) {
        let signed = |positive: bool, negative: bool| match (positive, negative) {
            (true, false) => step,
            (false, true) => -step,
            _ => 0.0,
        };
        (signed(self.right, self.left), signed(self.up, self.down))
    }
}
