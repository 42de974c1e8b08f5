//! Per-frame uniform blocks handed to the render backend.
//!
//! All structures use `#[repr(C)]` and implement `Pod` so a GPU backend can
//! upload them byte for byte.

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};

use avatar_scene::Camera;

/// Camera block.
///
/// # Memory Layout
///
/// - Offset 0: view matrix (64 bytes)
/// - Offset 64: projection matrix (64 bytes)
/// - Offset 128: view-projection matrix (64 bytes)
/// - Offset 192: camera position (12 bytes)
/// - Offset 204: padding (4 bytes)
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct CameraUniform {
    pub view: Mat4,
    pub projection: Mat4,
    pub view_projection: Mat4,
    pub camera_position: Vec3,
    pub _padding: f32,
}

impl CameraUniform {
    pub const SIZE: usize = std::mem::size_of::<Self>();

    pub fn from_camera(camera: &Camera) -> Self {
        let view = camera.view_matrix();
        let projection = camera.projection_matrix();
        Self {
            view,
            projection,
            view_projection: projection * view,
            camera_position: camera.position,
            _padding: 0.0,
        }
    }
}

/// Per-draw object block: model matrix plus the normal matrix
/// (inverse transpose of the model matrix).
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct ObjectUniform {
    pub model: Mat4,
    pub normal_matrix: Mat4,
}

impl ObjectUniform {
    pub const SIZE: usize = std::mem::size_of::<Self>();

    pub fn new(model: Mat4) -> Self {
        Self {
            model,
            normal_matrix: model.inverse().transpose(),
        }
    }
}
