//! Directional and point lights.
//!
//! Lights never draw lighting themselves; each frame they push their parameters as
//! named uniforms into the lit shader program:
//!
//! | Light | Uniforms |
//! |-------|----------|
//! | [`DirLight`] | `dirLight.direction`, `dirLight.ambient`, `dirLight.diffuse`, `dirLight.specular` |
//! | [`PointLight`] | `pointLights[i].position`, `.constant`, `.linear`, `.quadratic`, `.ambient`, `.diffuse`, `.specular` |
//!
//! A point light is also a visible object: it owns an [`Entity`] showing a small cube in
//! the light's color. The marker is drawn with an unlit shader, while the uniforms go to
//! the lit shader. The two are passed separately and must not be confused.

use std::rc::Rc;

use glam::Vec3;

use crate::backend::GraphicsBackend;
use crate::entity::{Entity, Updatable};
use crate::model::Model;
use crate::shader::Shader;
use crate::transform::Pose;

/// Capacity of the `pointLights` array in the lit shader.
pub const MAX_POINT_LIGHTS: usize = 4;

/// Scale of the cube drawn at a point light's position.
pub const MARKER_SCALE: f32 = 0.2;

/// Builds the uniform path `pointLights[index].field`.
pub fn point_light_uniform(index: usize, field: &str) -> String {
    format!("pointLights[{}].{}", index, field)
}

/// A light with a direction but no position, like sunlight.
#[derive(Clone, Debug, PartialEq)]
pub struct DirLight {
    shader: Shader,
    pub direction: Vec3,
    pub ambient: Vec3,
    pub diffuse: Vec3,
    pub specular: Vec3,
}

impl DirLight {
    pub fn new(
        shader: Shader,
        direction: impl Into<Vec3>,
        ambient: impl Into<Vec3>,
        diffuse: impl Into<Vec3>,
        specular: impl Into<Vec3>,
    ) -> Self {
        Self {
            shader,
            direction: direction.into(),
            ambient: ambient.into(),
            diffuse: diffuse.into(),
            specular: specular.into(),
        }
    }

    pub fn shader(&self) -> Shader {
        self.shader
    }

    /// Writes the `dirLight.*` uniforms to the lit shader.
    pub fn update(&self, gfx: &mut dyn GraphicsBackend) {
        self.shader.activate(gfx);
        self.shader.set_vec3(gfx, "dirLight.direction", self.direction);
        self.shader.set_vec3(gfx, "dirLight.ambient", self.ambient);
        self.shader.set_vec3(gfx, "dirLight.diffuse", self.diffuse);
        self.shader.set_vec3(gfx, "dirLight.specular", self.specular);
    }
}

impl Updatable for DirLight {
    fn update(&mut self, gfx: &mut dyn GraphicsBackend, _dt: f32) {
        DirLight::update(self, gfx);
    }
}

/// Distance falloff `1 / (constant + linear·d + quadratic·d²)`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Attenuation {
    pub constant: f32,
    pub linear: f32,
    pub quadratic: f32,
}

impl Attenuation {
    pub const fn new(constant: f32, linear: f32, quadratic: f32) -> Self {
        Self {
            constant,
            linear,
            quadratic,
        }
    }

    /// No falloff: the light is equally bright at every distance.
    pub const NONE: Self = Self::new(1.0, 0.0, 0.0);
}

impl Default for Attenuation {
    fn default() -> Self {
        Self::NONE
    }
}

/// A colored light at a point, drawn as a small cube.
#[derive(Debug)]
pub struct PointLight {
    entity: Entity,
    index: usize,
    light_shader: Shader,
    color: Vec3,
    attenuation: Attenuation,
    ambient_factor: f32,
}

impl PointLight {
    /// Creates a light occupying slot `index` of the `pointLights` array.
    ///
    /// `light_shader` receives the uniforms; `marker_shader` draws the cube. The two
    /// must differ.
    pub fn new(
        gfx: &mut dyn GraphicsBackend,
        index: usize,
        position: impl Into<Vec3>,
        color: impl Into<Vec3>,
        light_shader: Shader,
        marker_shader: Shader,
    ) -> Self {
        debug_assert_ne!(light_shader, marker_shader, "light and marker share a shader");
        let color = color.into();
        let marker = Rc::new(Model::colored_cube(gfx, color, marker_shader));
        let pose = Pose::new().position(position).scale(MARKER_SCALE);
        Self {
            entity: Entity::new(marker, pose),
            index,
            light_shader,
            color,
            attenuation: Attenuation::default(),
            ambient_factor: 0.0,
        }
    }

    pub fn with_attenuation(mut self, attenuation: Attenuation) -> Self {
        self.attenuation = attenuation;
        self
    }

    /// Sets how much of the color is added as ambient light.
    pub fn with_ambient_factor(mut self, factor: f32) -> Self {
        self.ambient_factor = factor;
        self
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn color(&self) -> Vec3 {
        self.color
    }

    pub fn position(&self) -> Vec3 {
        self.entity.pose().position
    }

    pub fn attenuation(&self) -> Attenuation {
        self.attenuation
    }

    pub fn light_shader(&self) -> Shader {
        self.light_shader
    }

    pub fn ambient(&self) -> Vec3 {
        self.color * self.ambient_factor
    }

    pub fn entity(&self) -> &Entity {
        &self.entity
    }

    pub fn entity_mut(&mut self) -> &mut Entity {
        &mut self.entity
    }

    /// Draws the marker cube.
    pub fn draw(&self, gfx: &mut dyn GraphicsBackend) {
        self.entity.draw(gfx);
    }

    pub fn destroy(&mut self, gfx: &mut dyn GraphicsBackend) {
        self.entity.destroy(gfx);
    }
}

impl Updatable for PointLight {
    /// Writes the `pointLights[index].*` uniforms to the lit shader.
    fn update(&mut self, gfx: &mut dyn GraphicsBackend, _dt: f32) {
        let shader = self.light_shader;
        let path = |field| point_light_uniform(self.index, field);

        shader.activate(gfx);
        shader.set_vec3(gfx, &path("position"), self.position());
        shader.set_float(gfx, &path("constant"), self.attenuation.constant);
        shader.set_float(gfx, &path("linear"), self.attenuation.linear);
        shader.set_float(gfx, &path("quadratic"), self.attenuation.quadratic);
        shader.set_vec3(gfx, &path("ambient"), self.ambient());
        shader.set_vec3(gfx, &path("diffuse"), self.color);
        shader.set_vec3(gfx, &path("specular"), self.color);
    }
}
