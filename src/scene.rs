//! Per-frame orchestration of camera, lights and entities.
//!
//! A [`Scene`] owns everything that is updated and drawn each frame and runs it in a
//! fixed order:
//!
//! 1. camera: `projView` / `viewPos` to every registered shader target
//! 2. directional light
//! 3. point lights, in index order
//! 4. `update()` on every dynamic entity, then, as a separate pass,
//!    `update_transform()` on every dynamic entity
//! 5. draw: point light markers with culling off, then dynamic entities and static
//!    entities with culling on
//!
//! Point light indices are handed out densely from zero as lights are added and never
//! change. There is no way to remove a light.

use std::fmt;

use glam::Vec3;

use crate::backend::GraphicsBackend;
use crate::camera::FpsCamera;
use crate::entity::{Entity, Updatable};
use crate::light::{DirLight, MAX_POINT_LIGHTS, PointLight};
use crate::shader::Shader;

/// Errors raised while assembling a scene.
#[derive(Debug, Clone, PartialEq)]
pub enum SceneError {
    /// More point lights than the shader array can hold.
    TooManyPointLights { max: usize },
    /// A pre-built point light did not carry the next free index.
    PointLightIndex { expected: usize, found: usize },
    /// A point light was given one shader for both its uniforms and its marker.
    SharedLightShader,
}

impl fmt::Display for SceneError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SceneError::TooManyPointLights { max } => {
                write!(f, "a scene supports at most {} point lights", max)
            }
            SceneError::PointLightIndex { expected, found } => write!(
                f,
                "point light has index {} but the next free slot is {}",
                found, expected
            ),
            SceneError::SharedLightShader => {
                write!(f, "point light and marker must use different shaders")
            }
        }
    }
}

impl std::error::Error for SceneError {}

/// Builder for [`Scene`].
#[derive(Debug)]
pub struct SceneBuilder {
    scene: Scene,
}

impl SceneBuilder {
    /// Adds a shader that receives the camera uniforms.
    pub fn shader_target(mut self, shader: Shader) -> Self {
        if !self.scene.targets.contains(&shader) {
            self.scene.targets.push(shader);
        }
        self
    }

    /// Creates a point light in the next free slot.
    pub fn point_light(
        self,
        gfx: &mut dyn GraphicsBackend,
        position: impl Into<Vec3>,
        color: impl Into<Vec3>,
        light_shader: Shader,
        marker_shader: Shader,
    ) -> Result<Self, SceneError> {
        if light_shader == marker_shader {
            return Err(SceneError::SharedLightShader);
        }
        let index = self.next_light_index()?;
        let light = PointLight::new(gfx, index, position, color, light_shader, marker_shader);
        self.add_point_light(light)
    }

    /// Adds a pre-built point light. Its index must be the next free slot.
    pub fn add_point_light(mut self, light: PointLight) -> Result<Self, SceneError> {
        let expected = self.next_light_index()?;
        if light.index() != expected {
            return Err(SceneError::PointLightIndex {
                expected,
                found: light.index(),
            });
        }
        log::info!(
            "registered point light {} at {:?} with color {:?}",
            light.index(),
            light.position(),
            light.color()
        );
        self.scene.point_lights.push(light);
        Ok(self)
    }

    /// The index the next point light will receive.
    pub fn next_light_index(&self) -> Result<usize, SceneError> {
        let index = self.scene.point_lights.len();
        if index >= MAX_POINT_LIGHTS {
            return Err(SceneError::TooManyPointLights {
                max: MAX_POINT_LIGHTS,
            });
        }
        Ok(index)
    }

    /// Adds an entity that is updated every frame.
    pub fn dynamic_entity(mut self, entity: Entity) -> Self {
        self.scene.dynamic_entities.push(entity);
        self
    }

    /// Adds an entity that is only drawn.
    pub fn static_entity(mut self, entity: Entity) -> Self {
        self.scene.static_entities.push(entity);
        self
    }

    pub fn build(self) -> Scene {
        log::info!(
            "scene ready: {} point lights, {} dynamic and {} static entities",
            self.scene.point_lights.len(),
            self.scene.dynamic_entities.len(),
            self.scene.static_entities.len()
        );
        self.scene
    }
}

/// Camera, lights and entities of a running demo.
#[derive(Debug)]
pub struct Scene {
    camera: FpsCamera,
    targets: Vec<Shader>,
    dir_light: DirLight,
    point_lights: Vec<PointLight>,
    dynamic_entities: Vec<Entity>,
    static_entities: Vec<Entity>,
}

impl Scene {
    /// Starts a scene. The directional light's shader becomes the first camera target.
    pub fn builder(camera: FpsCamera, dir_light: DirLight) -> SceneBuilder {
        let targets = vec![dir_light.shader()];
        SceneBuilder {
            scene: Self {
                camera,
                targets,
                dir_light,
                point_lights: Vec::new(),
                dynamic_entities: Vec::new(),
                static_entities: Vec::new(),
            },
        }
    }

    pub fn camera(&self) -> &FpsCamera {
        &self.camera
    }

    pub fn camera_mut(&mut self) -> &mut FpsCamera {
        &mut self.camera
    }

    /// Shaders receiving the camera uniforms.
    pub fn targets(&self) -> &[Shader] {
        &self.targets
    }

    pub fn dir_light(&self) -> &DirLight {
        &self.dir_light
    }

    pub fn point_lights(&self) -> &[PointLight] {
        &self.point_lights
    }

    pub fn dynamic_entities(&self) -> &[Entity] {
        &self.dynamic_entities
    }

    pub fn dynamic_entities_mut(&mut self) -> &mut [Entity] {
        &mut self.dynamic_entities
    }

    pub fn static_entities(&self) -> &[Entity] {
        &self.static_entities
    }

    /// Pushes camera and light uniforms, then updates dynamic entities.
    pub fn update(&mut self, gfx: &mut dyn GraphicsBackend, dt: f32) {
        self.camera.update(gfx, &self.targets);
        self.dir_light.update(gfx);

        for light in &mut self.point_lights {
            light.update(gfx, dt);
        }

        for entity in &mut self.dynamic_entities {
            entity.update(gfx, dt);
        }
        for entity in &mut self.dynamic_entities {
            entity.update_transform();
        }
    }

    /// Draws light markers, then dynamic and static entities.
    pub fn draw(&self, gfx: &mut dyn GraphicsBackend) {
        gfx.set_face_culling(false);
        for light in &self.point_lights {
            light.draw(gfx);
        }

        gfx.set_face_culling(true);
        for entity in &self.dynamic_entities {
            entity.draw(gfx);
        }
        for entity in &self.static_entities {
            entity.draw(gfx);
        }
    }

    /// One full frame: [`update`](Self::update) then [`draw`](Self::draw).
    pub fn frame(&mut self, gfx: &mut dyn GraphicsBackend, dt: f32) {
        self.update(gfx, dt);
        self.draw(gfx);
    }

    /// Releases the GPU resources of every entity and light marker.
    pub fn destroy(&mut self, gfx: &mut dyn GraphicsBackend) {
        for light in &mut self.point_lights {
            light.destroy(gfx);
        }
        for entity in self
            .dynamic_entities
            .iter_mut()
            .chain(self.static_entities.iter_mut())
        {
            entity.destroy(gfx);
        }
        log::info!("scene destroyed");
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use super::*;
    use crate::backend::{Command, Recorder, UniformValue};
    use crate::entity::{Behavior, Spin};
    use crate::model::Model;
    use crate::transform::Pose;

    struct Shaders {
        lit: Shader,
        unlit: Shader,
    }

    fn shaders(gfx: &mut Recorder) -> Shaders {
        Shaders {
            lit: Shader::from_source(gfx, "lit", "").unwrap(),
            unlit: Shader::from_source(gfx, "unlit", "").unwrap(),
        }
    }

    fn builder(gfx: &mut Recorder, s: &Shaders) -> SceneBuilder {
        let camera = FpsCamera::new(Vec3::new(0.0, 0.0, 5.0), 1.0, 1.5, 0.3, 30.0);
        let dir_light = DirLight::new(s.lit, [0.5, -1.0, -0.5], [0.2; 3], [1.0; 3], [1.0; 3]);
        Scene::builder(camera, dir_light)
            .shader_target(s.unlit)
            .point_light(gfx, [1.0, 1.0, 1.0], [1.0, 0.0, 0.0], s.lit, s.unlit)
            .unwrap()
            .point_light(gfx, [1.0, 1.0, -1.0], [0.0, 1.0, 0.0], s.lit, s.unlit)
            .unwrap()
    }

    fn entity(gfx: &mut Recorder, shader: Shader, x: f32) -> Entity {
        let model = Rc::new(Model::colored_cube(gfx, Vec3::ONE, shader));
        Entity::new(model, Pose::new().position([x, 0.0, 0.0]))
    }

    struct Rise;

    impl Behavior for Rise {
        fn update(&mut self, pose: &mut Pose, _dt: f32) {
            pose.position.y += 1.0;
        }
    }

    #[test]
    fn lights_get_dense_indices() {
        let mut gfx = Recorder::new();
        let s = shaders(&mut gfx);
        let scene = builder(&mut gfx, &s).build();
        let indices: Vec<_> = scene.point_lights().iter().map(|l| l.index()).collect();
        assert_eq!(indices, [0, 1]);
    }

    #[test]
    fn too_many_point_lights() {
        let mut gfx = Recorder::new();
        let s = shaders(&mut gfx);
        let mut b = builder(&mut gfx, &s);
        for _ in 2..MAX_POINT_LIGHTS {
            b = b
                .point_light(&mut gfx, Vec3::ZERO, Vec3::ONE, s.lit, s.unlit)
                .unwrap();
        }
        let err = b
            .point_light(&mut gfx, Vec3::ZERO, Vec3::ONE, s.lit, s.unlit)
            .unwrap_err();
        assert_eq!(err, SceneError::TooManyPointLights { max: 4 });
    }

    #[test]
    fn prebuilt_light_must_take_next_slot() {
        let mut gfx = Recorder::new();
        let s = shaders(&mut gfx);
        let light = PointLight::new(&mut gfx, 3, Vec3::ZERO, Vec3::ONE, s.lit, s.unlit);
        let err = builder(&mut gfx, &s).add_point_light(light).unwrap_err();
        assert_eq!(
            err,
            SceneError::PointLightIndex {
                expected: 2,
                found: 3
            }
        );
    }

    #[test]
    fn light_and_marker_shaders_must_differ() {
        let mut gfx = Recorder::new();
        let s = shaders(&mut gfx);
        let b = builder(&mut gfx, &s);
        gfx.clear();

        let err = b
            .point_light(&mut gfx, Vec3::ZERO, Vec3::ONE, s.lit, s.lit)
            .unwrap_err();
        assert_eq!(err, SceneError::SharedLightShader);
        assert!(gfx.commands().is_empty());
    }

    #[test]
    fn update_runs_in_fixed_order() {
        let mut gfx = Recorder::new();
        let s = shaders(&mut gfx);
        let mut scene = builder(&mut gfx, &s).build();
        gfx.clear();

        scene.update(&mut gfx, 0.016);

        let names = gfx.uniform_names();
        let position = |name: &str| names.iter().position(|n| *n == name).unwrap();
        assert_eq!(position("projView"), 0);
        assert!(position("viewPos") < position("dirLight.direction"));
        assert!(position("dirLight.specular") < position("pointLights[0].position"));
        assert!(position("pointLights[0].specular") < position("pointLights[1].position"));
        // Camera writes go to both targets, lit first.
        assert_eq!(names.iter().filter(|n| **n == "projView").count(), 2);
    }

    #[test]
    fn dynamic_entities_are_updated_then_committed() {
        let mut gfx = Recorder::new();
        let s = shaders(&mut gfx);
        let spinning = entity(&mut gfx, s.lit, 0.0).with_behavior(Rise);
        let still = entity(&mut gfx, s.lit, 2.0).with_behavior(Rise);
        let mut scene = builder(&mut gfx, &s)
            .dynamic_entity(spinning)
            .static_entity(still)
            .build();

        scene.update(&mut gfx, 0.016);

        let dynamic = &scene.dynamic_entities()[0];
        assert_eq!(dynamic.pose().position.y, 1.0);
        assert_eq!(dynamic.transform().w_axis.y, 1.0);
        // Static entities are never updated.
        assert_eq!(scene.static_entities()[0].pose().position.y, 0.0);
    }

    #[test]
    fn draw_culls_everything_but_light_markers() {
        let mut gfx = Recorder::new();
        let s = shaders(&mut gfx);
        let dynamic = entity(&mut gfx, s.lit, 0.0);
        let fixed = entity(&mut gfx, s.lit, 3.0);
        let scene = builder(&mut gfx, &s)
            .dynamic_entity(dynamic)
            .static_entity(fixed)
            .build();
        gfx.clear();

        scene.draw(&mut gfx);

        let draws: Vec<_> = gfx
            .draws()
            .into_iter()
            .map(|c| match c {
                Command::Draw {
                    program, culling, ..
                } => (*program, *culling),
                _ => unreachable!(),
            })
            .collect();
        assert_eq!(
            draws,
            [
                (Some(s.unlit.id()), false),
                (Some(s.unlit.id()), false),
                (Some(s.lit.id()), true),
                (Some(s.lit.id()), true),
            ]
        );
        assert_eq!(
            gfx.last_uniform(s.lit.id(), "model"),
            Some(UniformValue::Mat4(scene.static_entities()[0].transform()))
        );
    }

    #[test]
    fn frame_updates_before_drawing() {
        let mut gfx = Recorder::new();
        let s = shaders(&mut gfx);
        let spinning = entity(&mut gfx, s.lit, 0.0).with_behavior(Spin::yaw(90.0));
        let mut scene = builder(&mut gfx, &s).dynamic_entity(spinning).build();
        gfx.clear();

        scene.frame(&mut gfx, 1.0);

        let first_draw = gfx
            .commands()
            .iter()
            .position(|c| matches!(c, Command::Draw { .. }))
            .unwrap();
        let last_uniform = gfx
            .commands()
            .iter()
            .rposition(|c| {
                matches!(c, Command::SetUniform { name, .. } if name.starts_with("pointLights"))
            })
            .unwrap();
        assert!(last_uniform < first_draw);
        assert_eq!(
            gfx.last_uniform(s.lit.id(), "model"),
            Some(UniformValue::Mat4(scene.dynamic_entities()[0].transform()))
        );
    }

    #[test]
    fn destroy_releases_every_entity_once() {
        let mut gfx = Recorder::new();
        let s = shaders(&mut gfx);
        let dynamic = entity(&mut gfx, s.lit, 0.0);
        let fixed = entity(&mut gfx, s.lit, 1.0);
        let mut scene = builder(&mut gfx, &s)
            .dynamic_entity(dynamic)
            .static_entity(fixed)
            .build();
        gfx.clear();

        scene.destroy(&mut gfx);
        scene.destroy(&mut gfx);

        let releases = gfx
            .commands()
            .iter()
            .filter(|c| matches!(c, Command::ReleaseVertexArray(_)))
            .count();
        assert_eq!(releases, 4);
    }

    #[test]
    fn duplicate_targets_are_ignored() {
        let mut gfx = Recorder::new();
        let s = shaders(&mut gfx);
        let scene = builder(&mut gfx, &s).shader_target(s.lit).build();
        assert_eq!(scene.targets(), [s.lit, s.unlit]);
    }
}
