//! Scene/viewport management and the composed avatar widget.
//!
//! This crate provides:
//! - The render backend seam and a headless backend
//! - Frame-callback scheduling
//! - [`SceneContext`]: camera rig, lights, ground, model, and frame ticks
//! - [`AvatarWidget`]: loader, animation engine, and picker on top of it

pub mod avatar;
pub mod backend;
pub mod context;
mod render_loop;
mod uniforms;

pub use avatar::{AnimationRequests, AvatarEvent, AvatarServices, AvatarWidget, LoadCompletion};
pub use backend::{
    BackendStats, DrawItem, FramePacket, HeadlessBackend, HeadlessStats, RenderBackend,
};
pub use context::{SceneContext, SurfaceInfo};
pub use render_loop::{FrameRequest, RenderLoop};
pub use uniforms::{CameraUniform, ObjectUniform};
