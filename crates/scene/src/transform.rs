//! Local transforms for scene-graph nodes.
//!
//! Hierarchy lives in the node tree ([`SceneNode`](crate::SceneNode)), not in
//! the transform itself: world matrices are accumulated while traversing.
//!
//! # Example
//!
//! ```
//! use avatar_scene::Transform;
//! use glam::Vec3;
//!
//! let t = Transform::new()
//!     .with_position(Vec3::new(0.0, 1.0, 0.0))
//!     .with_yaw(std::f32::consts::FRAC_PI_2);
//! let world = t.local_matrix();
//! ```

use glam::{Mat4, Quat, Vec3};

/// A transform representing position, rotation, and scale.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform {
    /// Position relative to the parent node
    pub position: Vec3,
    /// Rotation as a quaternion
    pub rotation: Quat,
    /// Scale factor
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }
}

impl Transform {
    /// Create an identity transform.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from translation, `[x, y, z, w]` rotation and scale arrays, the
    /// layout glTF nodes decompose into.
    pub fn from_trs(translation: [f32; 3], rotation: [f32; 4], scale: [f32; 3]) -> Self {
        Self {
            position: Vec3::from_array(translation),
            rotation: Quat::from_array(rotation).normalize(),
            scale: Vec3::from_array(scale),
        }
    }

    /// Create a transform with the given position.
    pub fn with_position(mut self, position: Vec3) -> Self {
        self.position = position;
        self
    }

    /// Create a transform with the given rotation.
    pub fn with_rotation(mut self, rotation: Quat) -> Self {
        self.rotation = rotation;
        self
    }

    /// Create a transform with the given scale.
    pub fn with_scale(mut self, scale: Vec3) -> Self {
        self.scale = scale;
        self
    }

    /// Replace the rotation with a pure rotation about +Y.
    pub fn with_yaw(mut self, radians: f32) -> Self {
        self.set_yaw(radians);
        self
    }

    /// Set the rotation to a pure rotation about +Y.
    pub fn set_yaw(&mut self, radians: f32) {
        self.rotation = Quat::from_rotation_y(radians);
    }

    /// Get the local transformation matrix.
    pub fn local_matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.position)
    }
}
