//! Placed, drawable objects.
//!
//! An [`Entity`] pairs a shared [`Drawable`] with a [`Pose`] and a cached transform.
//! The transform is refreshed only by [`Entity::update_transform`], so per-frame logic
//! and the transform commit are two separate steps:
//!
//! ```
//! use std::rc::Rc;
//! use lantern::{Entity, Model, Pose, Recorder, Shader, Vec3};
//!
//! let mut gfx = Recorder::new();
//! let shader = Shader::from_source(&mut gfx, "unlit", "").unwrap();
//! let cube = Rc::new(Model::colored_cube(&mut gfx, Vec3::ONE, shader));
//!
//! let mut entity = Entity::new(cube, Pose::new());
//! entity.pose_mut().position.x = 3.0;
//! assert_eq!(entity.transform().w_axis.x, 0.0); // not committed yet
//!
//! entity.update_transform();
//! assert_eq!(entity.transform().w_axis.x, 3.0);
//! ```

use std::fmt;
use std::rc::Rc;

use glam::{Mat4, Vec3};

use crate::backend::GraphicsBackend;
use crate::model::Drawable;
use crate::transform::Pose;

/// Per-frame logic run before transforms are refreshed.
pub trait Updatable {
    /// Runs custom per-frame logic. The default does nothing.
    fn update(&mut self, _gfx: &mut dyn GraphicsBackend, _dt: f32) {}
}

/// Logic attached to an [`Entity`] that edits its pose each frame.
pub trait Behavior {
    fn update(&mut self, pose: &mut Pose, dt: f32);
}

/// Continuously rotates an entity.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Spin {
    /// Rotation speed as (pitch, yaw, roll) in degrees per second.
    pub degrees_per_second: Vec3,
}

impl Spin {
    pub fn new(degrees_per_second: impl Into<Vec3>) -> Self {
        Self {
            degrees_per_second: degrees_per_second.into(),
        }
    }

    /// Spins about the vertical axis only.
    pub fn yaw(degrees_per_second: f32) -> Self {
        Self::new(Vec3::new(0.0, degrees_per_second, 0.0))
    }
}

impl Behavior for Spin {
    fn update(&mut self, pose: &mut Pose, dt: f32) {
        pose.orientation += self.degrees_per_second * dt;
    }
}

/// A drawable placed in the world.
pub struct Entity {
    model: Rc<dyn Drawable>,
    pose: Pose,
    transform: Mat4,
    behavior: Option<Box<dyn Behavior>>,
    destroyed: bool,
}

impl Entity {
    /// Creates an entity and computes its transform right away.
    pub fn new(model: Rc<dyn Drawable>, pose: Pose) -> Self {
        let transform = pose.matrix();
        Self {
            model,
            pose,
            transform,
            behavior: None,
            destroyed: false,
        }
    }

    /// Attaches per-frame logic run by [`Updatable::update`].
    pub fn with_behavior(mut self, behavior: impl Behavior + 'static) -> Self {
        self.behavior = Some(Box::new(behavior));
        self
    }

    pub fn pose(&self) -> &Pose {
        &self.pose
    }

    /// Mutable access to the pose. The transform is left stale until
    /// [`update_transform`](Self::update_transform) runs.
    pub fn pose_mut(&mut self) -> &mut Pose {
        &mut self.pose
    }

    /// The transform as of the last refresh.
    pub fn transform(&self) -> Mat4 {
        self.transform
    }

    /// Recomputes the transform from the current pose.
    pub fn update_transform(&mut self) {
        self.transform = self.pose.matrix();
    }

    /// Draws the model with the cached transform.
    pub fn draw(&self, gfx: &mut dyn GraphicsBackend) {
        if self.destroyed {
            return;
        }
        self.model.draw(gfx, &self.transform);
    }

    /// Releases the model's GPU resources. Later calls do nothing.
    pub fn destroy(&mut self, gfx: &mut dyn GraphicsBackend) {
        if self.destroyed {
            return;
        }
        self.model.destroy(gfx);
        self.destroyed = true;
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }
}

impl Updatable for Entity {
    fn update(&mut self, _gfx: &mut dyn GraphicsBackend, dt: f32) {
        if let Some(behavior) = &mut self.behavior {
            behavior.update(&mut self.pose, dt);
        }
    }
}

impl fmt::Debug for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Entity")
            .field("pose", &self.pose)
            .field("has_behavior", &self.behavior.is_some())
            .field("destroyed", &self.destroyed)
            .finish()
    }
}
