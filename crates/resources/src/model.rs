//! Decoded model payloads.

use std::collections::BTreeSet;

use avatar_scene::{Aabb, GeometryId, MaterialId, MeshNode, SceneNode};

use crate::Material;

/// A GPU-side resource owned by a model.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum GpuResource {
    Geometry(GeometryId),
    Material(MaterialId),
}

/// A named, time-bounded animation from the payload.
#[derive(Clone, Debug, PartialEq)]
pub struct AnimationClip {
    name: String,
    duration: f32,
}

impl AnimationClip {
    pub fn new(name: impl Into<String>, duration: f32) -> Self {
        Self {
            name: name.into(),
            duration: duration.max(0.0),
        }
    }

    /// Name as authored, possibly empty.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Length in seconds.
    pub fn duration(&self) -> f32 {
        self.duration
    }

    /// Name used to register the clip: the authored name, or `clip-<index>`
    /// when it is empty or whitespace.
    pub fn registry_name(&self, index: usize) -> String {
        if self.name.trim().is_empty() {
            format!("clip-{index}")
        } else {
            self.name.clone()
        }
    }
}

/// The decoded scene graph root plus its materials.
///
/// Disposing consumes the handle, so GPU resources are released exactly
/// once.
#[derive(Debug)]
pub struct ModelHandle {
    root: SceneNode,
    materials: Vec<Material>,
}

impl ModelHandle {
    pub fn new(root: SceneNode, materials: Vec<Material>) -> Self {
        Self { root, materials }
    }

    pub fn root(&self) -> &SceneNode {
        &self.root
    }

    pub fn root_mut(&mut self) -> &mut SceneNode {
        &mut self.root
    }

    pub fn materials(&self) -> &[Material] {
        &self.materials
    }

    pub fn meshes(&self) -> Vec<&MeshNode> {
        self.root.meshes()
    }

    pub fn mesh_count(&self) -> usize {
        self.meshes().len()
    }

    pub fn total_triangle_count(&self) -> usize {
        self.meshes()
            .iter()
            .map(|mesh| mesh.geometry.triangle_count())
            .sum()
    }

    /// World-space bounds of all meshes.
    pub fn bounds(&self) -> Option<Aabb> {
        self.root.world_bounds()
    }

    /// Get the model ready to be added to a scene: every mesh casts and
    /// receives shadows and the root gets the initial yaw.
    pub fn prepare_for_scene(&mut self, yaw: f32) {
        self.root.set_shadows(true, true);
        self.root.transform.set_yaw(yaw);
    }

    /// Every geometry and material this model owns, without duplicates.
    pub fn gpu_resources(&self) -> Vec<GpuResource> {
        let mut resources = BTreeSet::new();
        for mesh in self.meshes() {
            resources.insert(GpuResource::Geometry(mesh.geometry.id));
            for &material in &mesh.materials {
                resources.insert(GpuResource::Material(material));
            }
        }
        for material in &self.materials {
            resources.insert(GpuResource::Material(material.id));
        }
        resources.into_iter().collect()
    }

    /// Release every GPU resource through `release` and drop the graph.
    /// Returns the number of resources released.
    pub fn dispose(self, mut release: impl FnMut(GpuResource)) -> usize {
        let resources = self.gpu_resources();
        for &resource in &resources {
            release(resource);
        }
        tracing::debug!(
            "Model disposed: {} GPU resources, {} nodes",
            resources.len(),
            self.root.node_count()
        );
        resources.len()
    }
}

/// A successfully decoded payload, ready to hand to the scene and the
/// animation engine.
#[derive(Debug)]
pub struct LoadedAsset {
    pub model: ModelHandle,
    pub clips: Vec<AnimationClip>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use avatar_scene::Geometry;

    fn two_mesh_model() -> ModelHandle {
        let shared = MaterialId(0);
        let root = SceneNode::group(None)
            .with_child(SceneNode::mesh(
                None,
                MeshNode::new(Geometry::cube(GeometryId(0), 1.0), vec![shared]),
            ))
            .with_child(SceneNode::mesh(
                None,
                MeshNode::new(
                    Geometry::cube(GeometryId(1), 1.0),
                    vec![shared, MaterialId(1)],
                ),
            ));
        ModelHandle::new(
            root,
            vec![Material::fallback(MaterialId(0)), Material::fallback(MaterialId(1))],
        )
    }

    #[test]
    fn test_registry_name_fallback() {
        assert_eq!(AnimationClip::new("wave", 1.0).registry_name(3), "wave");
        assert_eq!(AnimationClip::new("", 1.0).registry_name(3), "clip-3");
        assert_eq!(AnimationClip::new("   ", 1.0).registry_name(0), "clip-0");
    }

    #[test]
    fn test_negative_duration_clamped() {
        assert_eq!(AnimationClip::new("x", -1.0).duration(), 0.0);
    }

    #[test]
    fn test_prepare_for_scene() {
        let mut model = two_mesh_model();
        model.prepare_for_scene(std::f32::consts::PI / 9.0);
        assert!(
            model
                .meshes()
                .iter()
                .all(|m| m.cast_shadow && m.receive_shadow)
        );
        let (axis, angle) = model.root().transform.rotation.to_axis_angle();
        assert!((axis - glam::Vec3::Y).length() < 1e-4);
        assert!((angle - std::f32::consts::PI / 9.0).abs() < 1e-4);
    }

    #[test]
    fn test_dispose_releases_each_resource_once() {
        let model = two_mesh_model();
        assert_eq!(model.mesh_count(), 2);
        assert_eq!(model.total_triangle_count(), 24);

        let mut released = Vec::new();
        let count = model.dispose(|r| released.push(r));

        assert_eq!(count, 4);
        assert_eq!(
            released,
            vec![
                GpuResource::Geometry(GeometryId(0)),
                GpuResource::Geometry(GeometryId(1)),
                GpuResource::Material(MaterialId(0)),
                GpuResource::Material(MaterialId(1)),
            ]
        );
    }
}
