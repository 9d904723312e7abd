//! View and projection for 3D scenes.
//!
//! [`Camera`] holds a position, an Euler orientation in degrees (`x` pitch, `y` yaw,
//! `z` roll, composed the same way as entity poses) and a projection fixed at
//! construction. Each frame [`Camera::update`] pushes `projView` and `viewPos` to every
//! shader that needs them.
//!
//! [`FpsCamera`] wraps a camera with first-person controls: look input that cannot
//! tip past straight up or down, and movement that stays in the horizontal plane no
//! matter where the camera is looking.
//!
//! # Example
//!
//! ```
//! use lantern::{FpsCamera, Recorder, Shader, Vec3};
//!
//! let mut gfx = Recorder::new();
//! let lit = Shader::from_source(&mut gfx, "lit", "").unwrap();
//!
//! let mut camera = FpsCamera::new(Vec3::new(0.0, 0.0, 5.0), 45f32.to_radians(), 1.5, 0.3, 30.0);
//! camera.rotate(10.0, 200.0);
//! assert_eq!(camera.camera().orientation.x, 90.0);
//!
//! camera.update(&mut gfx, &[lit]);
//! ```

use glam::{Mat4, Vec3};

use crate::backend::GraphicsBackend;
use crate::shader::Shader;
use crate::transform::compose_rotation;

/// Direction the camera faces with zero orientation.
pub const FORWARD: Vec3 = Vec3::NEG_Z;

/// Up direction with zero orientation.
pub const UP: Vec3 = Vec3::Y;

/// A perspective camera.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Camera {
    pub position: Vec3,
    /// Euler angles in degrees: `x` pitch, `y` yaw, `z` roll.
    pub orientation: Vec3,
    projection: Mat4,
}

impl Camera {
    /// Creates a camera. `fov` is the vertical field of view in radians.
    ///
    /// The projection is computed once here and never rebuilt.
    pub fn new(
        position: impl Into<Vec3>,
        orientation: impl Into<Vec3>,
        fov: f32,
        aspect: f32,
        near: f32,
        far: f32,
    ) -> Self {
        Self {
            position: position.into(),
            orientation: orientation.into(),
            projection: Mat4::perspective_rh(fov, aspect, near, far),
        }
    }

    /// Adds to the Euler angles without any clamping.
    pub fn rotate(&mut self, pitch: f32, yaw: f32, roll: f32) {
        self.orientation += Vec3::new(pitch, yaw, roll);
    }

    /// Moves the camera in world space.
    pub fn translate(&mut self, x: f32, y: f32, z: f32) {
        self.position += Vec3::new(x, y, z);
    }

    pub fn projection(&self) -> Mat4 {
        self.projection
    }

    /// Rotation built from the current orientation.
    pub fn rotation(&self) -> Mat4 {
        compose_rotation(self.orientation.x, self.orientation.y, self.orientation.z)
    }

    /// The direction the camera is looking.
    pub fn forward(&self) -> Vec3 {
        self.rotation().transform_vector3(FORWARD)
    }

    /// The camera's up direction, rolled and pitched with it.
    pub fn up(&self) -> Vec3 {
        self.rotation().transform_vector3(UP)
    }

    /// World to camera space.
    pub fn view(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.position + self.forward(), self.up())
    }

    /// `projection · view`, the value of the `projView` uniform.
    pub fn proj_view(&self) -> Mat4 {
        self.projection * self.view()
    }

    /// Writes `projView` and `viewPos` to each target.
    ///
    /// Every target is activated before it is written. An empty list does nothing.
    pub fn update(&self, gfx: &mut dyn GraphicsBackend, targets: &[Shader]) {
        if targets.is_empty() {
            return;
        }
        let proj_view = self.proj_view();
        for shader in targets {
            shader.activate(gfx);
            shader.set_mat4(gfx, "projView", proj_view);
            shader.set_vec3(gfx, "viewPos", self.position);
        }
    }
}

/// Pitch limit in degrees for [`FpsCamera`].
pub const PITCH_LIMIT: f32 = 90.0;

/// A first-person camera.
///
/// # Controls
///
/// - [`rotate`](Self::rotate) turns by horizontal (yaw) and vertical (pitch) deltas.
///   Pitch is clamped to `[-90, 90]` after each change, so large deltas saturate.
/// - [`move_by`](Self::move_by) moves relative to the current heading. Only yaw is
///   taken into account: looking up or down never lifts the camera off its plane.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FpsCamera {
    camera: Camera,
}

impl FpsCamera {
    /// Creates a first-person camera looking down negative Z.
    pub fn new(position: impl Into<Vec3>, fov: f32, aspect: f32, near: f32, far: f32) -> Self {
        Self::from_camera(Camera::new(position, Vec3::ZERO, fov, aspect, near, far))
    }

    /// Wraps an existing camera. Its pitch is clamped right away.
    pub fn from_camera(mut camera: Camera) -> Self {
        camera.orientation.x = camera.orientation.x.clamp(-PITCH_LIMIT, PITCH_LIMIT);
        Self { camera }
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn camera_mut(&mut self) -> &mut Camera {
        &mut self.camera
    }

    pub fn position(&self) -> Vec3 {
        self.camera.position
    }

    pub fn yaw(&self) -> f32 {
        self.camera.orientation.y
    }

    pub fn pitch(&self) -> f32 {
        self.camera.orientation.x
    }

    /// Turns the camera by degrees.
    pub fn rotate(&mut self, horizontal: f32, vertical: f32) {
        self.camera.rotate(vertical, horizontal, 0.0);
        self.camera.orientation.x = self.camera.orientation.x.clamp(-PITCH_LIMIT, PITCH_LIMIT);
    }

    /// Moves by `(forward, sideways, vertical)` units relative to the heading.
    pub fn move_by(&mut self, forward: f32, sideways: f32, vertical: f32) {
        let offset = Self::heading_offset(self.yaw(), forward, sideways, vertical);
        self.camera.translate(offset.x, offset.y, offset.z);
    }

    /// See [`Camera::update`].
    pub fn update(&self, gfx: &mut dyn GraphicsBackend, targets: &[Shader]) {
        self.camera.update(gfx, targets);
    }

    fn heading_offset(yaw: f32, forward: f32, sideways: f32, vertical: f32) -> Vec3 {
        let local = Vec3::new(sideways, vertical, -forward);
        Mat4::from_rotation_y(yaw.to_radians()).transform_vector3(local)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{Command, Recorder, UniformValue};

    fn approx(a: Vec3, b: Vec3) -> bool {
        (a - b).length() < 1e-5
    }

    fn demo_camera() -> Camera {
        Camera::new(
            Vec3::new(0.0, 0.0, 5.0),
            Vec3::ZERO,
            45f32.to_radians(),
            1.5,
            0.3,
            30.0,
        )
    }

    #[test]
    fn view_moves_origin_in_front_of_camera() {
        let view = demo_camera().view();
        assert!(approx(view.w_axis.truncate(), Vec3::new(0.0, 0.0, -5.0)));
        assert!(approx(view.transform_point3(Vec3::ZERO), Vec3::new(0.0, 0.0, -5.0)));
    }

    #[test]
    fn proj_view_is_projection_times_view() {
        let camera = demo_camera();
        assert_eq!(camera.proj_view(), camera.projection() * camera.view());
    }

    #[test]
    fn forward_follows_yaw() {
        let mut camera = demo_camera();
        camera.rotate(0.0, 90.0, 0.0);
        assert!(approx(camera.forward(), Vec3::NEG_X));
        assert!(approx(camera.up(), Vec3::Y));
    }

    #[test]
    fn update_writes_each_target_after_activating_it() {
        let mut gfx = Recorder::new();
        let lit = Shader::from_source(&mut gfx, "lit", "").unwrap();
        let unlit = Shader::from_source(&mut gfx, "unlit", "").unwrap();
        let camera = demo_camera();
        gfx.clear();

        camera.update(&mut gfx, &[lit, unlit]);

        let commands = gfx.commands();
        assert_eq!(commands.len(), 6);
        assert_eq!(commands[0], Command::UseProgram(lit.id()));
        assert_eq!(commands[3], Command::UseProgram(unlit.id()));
        for shader in [lit, unlit] {
            assert_eq!(
                gfx.last_uniform(shader.id(), "projView"),
                Some(UniformValue::Mat4(camera.proj_view()))
            );
            assert_eq!(
                gfx.last_uniform(shader.id(), "viewPos"),
                Some(UniformValue::Vec3(Vec3::new(0.0, 0.0, 5.0)))
            );
        }
    }

    #[test]
    fn update_with_no_targets_does_nothing() {
        let mut gfx = Recorder::new();
        demo_camera().update(&mut gfx, &[]);
        assert!(gfx.commands().is_empty());
    }

    #[test]
    fn pitch_saturates_at_limits() {
        let mut camera = FpsCamera::from_camera(demo_camera());
        for _ in 0..10 {
            camera.rotate(0.0, 50.0);
        }
        assert_eq!(camera.pitch(), 90.0);

        camera.rotate(0.0, -1000.0);
        assert_eq!(camera.pitch(), -90.0);

        camera.rotate(0.0, 30.0);
        assert_eq!(camera.pitch(), -60.0);
    }

    #[test]
    fn yaw_is_not_clamped() {
        let mut camera = FpsCamera::from_camera(demo_camera());
        camera.rotate(400.0, 0.0);
        assert_eq!(camera.yaw(), 400.0);
    }

    #[test]
    fn movement_ignores_pitch() {
        let mut level = FpsCamera::from_camera(demo_camera());
        let mut tilted = FpsCamera::from_camera(demo_camera());
        level.rotate(30.0, 0.0);
        tilted.rotate(30.0, 60.0);

        let start = level.position();
        level.move_by(1.0, 0.0, 0.0);
        tilted.move_by(1.0, 0.0, 0.0);

        assert_eq!(level.position() - start, tilted.position() - start);
        assert!((level.position().y - start.y).abs() < 1e-6);
    }

    #[test]
    fn movement_is_relative_to_heading() {
        let mut camera = FpsCamera::new(Vec3::ZERO, 1.0, 1.0, 0.1, 10.0);
        camera.move_by(1.0, 0.0, 0.0);
        assert!(approx(camera.position(), Vec3::NEG_Z));

        camera.rotate(90.0, 0.0);
        camera.move_by(1.0, 0.0, 0.0);
        assert!(approx(camera.position(), Vec3::new(-1.0, 0.0, -1.0)));

        camera.move_by(0.0, 1.0, 2.0);
        assert!(approx(camera.position(), Vec3::new(-1.0, 2.0, -2.0)));
    }

    #[test]
    fn constructor_clamps_initial_pitch() {
        let camera = Camera::new(Vec3::ZERO, [120.0, 0.0, 0.0], 1.0, 1.0, 0.1, 10.0);
        assert_eq!(FpsCamera::from_camera(camera).pitch(), 90.0);
    }
}
