//! Euler-angle rotations and model transforms.
//!
//! Every placed object in a scene carries a [`Pose`]: a position, an orientation given
//! as three Euler angles in degrees, and a uniform scale. The pose is turned into a
//! model matrix by [`compose_model_transform`].
//!
//! # Conventions
//!
//! Orientation components are stored as `x = pitch`, `y = yaw`, `z = roll`. The
//! elemental rotations are about the world X, Y and Z axes and are composed yaw
//! outermost:
//!
//! ```text
//! R = Ry(yaw) · Rx(pitch) · Rz(roll)
//! M = T(position) · R · S(scale)
//! ```
//!
//! Scale is applied first to the unit-sized local mesh, then rotation, then translation.
//!
//! ```
//! use lantern::{Pose, Vec3};
//!
//! let pose = Pose::new()
//!     .position(Vec3::new(1.0, 0.0, 0.0))
//!     .orientation(Vec3::new(0.0, 90.0, 0.0))
//!     .scale(2.0);
//!
//! let p = pose.matrix().transform_point3(Vec3::X);
//! assert!((p - Vec3::new(1.0, 0.0, -2.0)).length() < 1e-5);
//! ```

use glam::{Mat4, Vec3};

/// Builds the rotation matrix for Euler angles given in degrees.
///
/// The result is `yaw · pitch · roll`, with yaw about world Y, pitch about world X and
/// roll about world Z. Inputs are not range checked.
pub fn compose_rotation(pitch: f32, yaw: f32, roll: f32) -> Mat4 {
    let pitch = Mat4::from_rotation_x(pitch.to_radians());
    let yaw = Mat4::from_rotation_y(yaw.to_radians());
    let roll = Mat4::from_rotation_z(roll.to_radians());

    yaw * pitch * roll
}

/// Builds `translate(position) · rotation · scale(scale)`.
///
/// A scale of zero is allowed and collapses the mesh to its origin.
pub fn compose_model_transform(position: Vec3, rotation: Mat4, scale: f32) -> Mat4 {
    Mat4::from_translation(position) * rotation * Mat4::from_scale(Vec3::splat(scale))
}

/// Position, Euler orientation (degrees) and uniform scale of a scene object.
///
/// A default pose sits at the origin with no rotation and unit scale.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Pose {
    /// World-space position.
    pub position: Vec3,
    /// Euler angles in degrees: `x` pitch, `y` yaw, `z` roll.
    pub orientation: Vec3,
    /// Uniform scale factor.
    pub scale: f32,
}

impl Default for Pose {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            orientation: Vec3::ZERO,
            scale: 1.0,
        }
    }
}

impl Pose {
    /// Creates an identity pose.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the position.
    pub fn position(mut self, position: impl Into<Vec3>) -> Self {
        self.position = position.into();
        self
    }

    /// Sets the orientation as `(pitch, yaw, roll)` in degrees.
    pub fn orientation(mut self, orientation: impl Into<Vec3>) -> Self {
        self.orientation = orientation.into();
        self
    }

    /// Sets the uniform scale.
    pub fn scale(mut self, scale: f32) -> Self {
        self.scale = scale;
        self
    }

    pub fn pitch(&self) -> f32 {
        self.orientation.x
    }

    pub fn yaw(&self) -> f32 {
        self.orientation.y
    }

    pub fn roll(&self) -> f32 {
        self.orientation.z
    }

    /// Rotation part of this pose.
    pub fn rotation(&self) -> Mat4 {
        compose_rotation(self.pitch(), self.yaw(), self.roll())
    }

    /// The full model matrix for this pose.
    pub fn matrix(&self) -> Mat4 {
        compose_model_transform(self.position, self.rotation(), self.scale)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f32 = 1e-5;

    fn approx(a: Vec3, b: Vec3) -> bool {
        (a - b).length() < EPS
    }

    #[test]
    fn yaw_is_outermost() {
        // Pitch 90 sends +Z to -Y, which yaw then leaves alone.
        let r = compose_rotation(90.0, 90.0, 0.0);
        let v = r.transform_vector3(Vec3::Z);
        assert!(approx(v, Vec3::new(0.0, -1.0, 0.0)), "got {v}");

        // Roll happens first: roll 90 sends +X to +Y, pitch 90 sends +Y to +Z, yaw 90 sends +Z to +X.
        let r = compose_rotation(90.0, 90.0, 90.0);
        let v = r.transform_vector3(Vec3::X);
        assert!(approx(v, Vec3::X), "got {v}");
    }

    #[test]
    fn rotation_order_matters() {
        let composed = compose_rotation(30.0, 45.0, 60.0);
        let swapped = Mat4::from_rotation_x(30f32.to_radians())
            * Mat4::from_rotation_y(45f32.to_radians())
            * Mat4::from_rotation_z(60f32.to_radians());
        assert!(!composed.abs_diff_eq(swapped, 1e-3));
    }

    #[test]
    fn model_transform_matches_per_corner_steps() {
        let position = Vec3::new(3.0, -1.0, 2.5);
        let (pitch, yaw, roll) = (20.0, -35.0, 70.0);
        let scale = 1.75;
        let rotation = compose_rotation(pitch, yaw, roll);
        let m = compose_model_transform(position, rotation, scale);

        for &x in &[-0.5f32, 0.5] {
            for &y in &[-0.5f32, 0.5] {
                for &z in &[-0.5f32, 0.5] {
                    let corner = Vec3::new(x, y, z);
                    let scaled = corner * scale;
                    let rotated = Mat4::from_rotation_y(yaw.to_radians()).transform_vector3(
                        Mat4::from_rotation_x(pitch.to_radians()).transform_vector3(
                            Mat4::from_rotation_z(roll.to_radians()).transform_vector3(scaled),
                        ),
                    );
                    let expected = rotated + position;
                    assert!(approx(m.transform_point3(corner), expected));
                }
            }
        }
    }

    #[test]
    fn identity_rotation_decomposes_to_translation_and_scale() {
        let m = compose_model_transform(Vec3::new(4.0, 5.0, -6.0), Mat4::IDENTITY, 0.25);
        let (scale, rotation, translation) = m.to_scale_rotation_translation();
        assert!(approx(translation, Vec3::new(4.0, 5.0, -6.0)));
        assert!(approx(scale, Vec3::splat(0.25)));
        assert!(rotation.abs_diff_eq(glam::Quat::IDENTITY, EPS));
    }

    #[test]
    fn zero_scale_collapses_to_position() {
        let pose = Pose::new()
            .position(Vec3::new(1.0, 2.0, 3.0))
            .orientation(Vec3::new(10.0, 20.0, 30.0))
            .scale(0.0);
        let p = pose.matrix().transform_point3(Vec3::new(0.5, -0.5, 0.5));
        assert!(approx(p, Vec3::new(1.0, 2.0, 3.0)));
    }

    #[test]
    fn yawed_entity_maps_local_x() {
        let pose = Pose::new()
            .position(Vec3::new(1.0, 0.0, 0.0))
            .orientation(Vec3::new(0.0, 90.0, 0.0))
            .scale(2.0);
        let p = pose.matrix().transform_point3(Vec3::X);
        assert!(approx(p, Vec3::new(1.0, 0.0, -2.0)), "got {p}");
    }
}
