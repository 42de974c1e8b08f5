//! Scene graph and components.
//!
//! This crate provides scene management:
//! - Camera and rotation-only orbit controls
//! - Lighting rig and ground plane
//! - Transforms and the typed scene-graph node tree
//! - Rays and pointer hit testing

pub mod camera;
pub mod controls;
pub mod graph;
pub mod light;
pub mod picker;
pub mod ray;
pub mod transform;

pub use camera::Camera;
pub use controls::{ControlCapabilities, OrbitController};
pub use graph::{
    Aabb, Geometry, GeometryId, LightKind, LightNode, MaterialId, MeshNode, NodeKind, SceneNode,
};
pub use light::{AmbientLight, DirectionalLight, GroundPlane, LightRig, LightUniform, ShadowSettings};
pub use picker::{InteractionPicker, Intersection, ViewportRect};
pub use ray::Ray;
pub use transform::Transform;
