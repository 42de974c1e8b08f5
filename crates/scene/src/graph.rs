//! Typed scene-graph nodes.
//!
//! Decoded payloads become a tree of [`SceneNode`]s whose [`NodeKind`] says
//! what each node is. Downstream code matches on the kind instead of probing
//! for geometry or material fields.

use glam::{Mat4, Vec3};

/// Identifier of a geometry's GPU buffers, unique within one model.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GeometryId(pub u32);

/// Identifier of a material's GPU state, unique within one model.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MaterialId(pub u32);

/// Axis-aligned bounding box.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Smallest box containing every point, `None` for an empty set.
    pub fn from_points(points: &[Vec3]) -> Option<Self> {
        let first = *points.first()?;
        Some(points.iter().fold(Self::new(first, first), |acc, &p| Self {
            min: acc.min.min(p),
            max: acc.max.max(p),
        }))
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    pub fn union(&self, other: &Aabb) -> Aabb {
        Self::new(self.min.min(other.min), self.max.max(other.max))
    }

    /// Bounds of this box after transformation (box of the 8 corners).
    pub fn transformed(&self, matrix: &Mat4) -> Aabb {
        let corners: Vec<Vec3> = (0..8)
            .map(|i| {
                Vec3::new(
                    if i & 1 == 0 { self.min.x } else { self.max.x },
                    if i & 2 == 0 { self.min.y } else { self.max.y },
                    if i & 4 == 0 { self.min.z } else { self.max.z },
                )
            })
            .map(|corner| matrix.transform_point3(corner))
            .collect();
        // Eight corners, never empty.
        Self::from_points(&corners).unwrap_or(*self)
    }
}

/// Triangle geometry kept CPU-side for hit testing.
#[derive(Clone, Debug)]
pub struct Geometry {
    pub id: GeometryId,
    pub positions: Vec<Vec3>,
    /// Triangle list indices. Empty means the positions are consumed in
    /// consecutive triples.
    pub indices: Vec<u32>,
    pub bounds: Aabb,
}

impl Geometry {
    pub fn new(id: GeometryId, positions: Vec<Vec3>, indices: Vec<u32>) -> Self {
        let bounds = Aabb::from_points(&positions).unwrap_or(Aabb::new(Vec3::ZERO, Vec3::ZERO));
        Self {
            id,
            positions,
            indices,
            bounds,
        }
    }

    /// Axis-aligned unit cube centred on the origin, scaled by `size`.
    pub fn cube(id: GeometryId, size: f32) -> Self {
        let h = size * 0.5;
        let positions = vec![
            Vec3::new(-h, -h, -h),
            Vec3::new(h, -h, -h),
            Vec3::new(h, h, -h),
            Vec3::new(-h, h, -h),
            Vec3::new(-h, -h, h),
            Vec3::new(h, -h, h),
            Vec3::new(h, h, h),
            Vec3::new(-h, h, h),
        ];
        #[rustfmt::skip]
        let indices = vec![
            0, 2, 1, 0, 3, 2, // back
            4, 5, 6, 4, 6, 7, // front
            0, 1, 5, 0, 5, 4, // bottom
            3, 7, 6, 3, 6, 2, // top
            0, 4, 7, 0, 7, 3, // left
            1, 2, 6, 1, 6, 5, // right
        ];
        Self::new(id, positions, indices)
    }

    /// Iterate triangles as vertex triples. Out-of-range indices are skipped.
    pub fn triangles(&self) -> impl Iterator<Item = (Vec3, Vec3, Vec3)> + '_ {
        let count = if self.indices.is_empty() {
            self.positions.len() / 3
        } else {
            self.indices.len() / 3
        };
        (0..count).filter_map(move |tri| {
            let (i0, i1, i2) = if self.indices.is_empty() {
                (tri * 3, tri * 3 + 1, tri * 3 + 2)
            } else {
                (
                    self.indices[tri * 3] as usize,
                    self.indices[tri * 3 + 1] as usize,
                    self.indices[tri * 3 + 2] as usize,
                )
            };
            Some((
                *self.positions.get(i0)?,
                *self.positions.get(i1)?,
                *self.positions.get(i2)?,
            ))
        })
    }

    pub fn triangle_count(&self) -> usize {
        if self.indices.is_empty() {
            self.positions.len() / 3
        } else {
            self.indices.len() / 3
        }
    }
}

/// A drawable mesh: one geometry and the materials applied to it.
#[derive(Clone, Debug)]
pub struct MeshNode {
    pub geometry: Geometry,
    /// One entry for a single material, several for multi-material meshes.
    pub materials: Vec<MaterialId>,
    pub cast_shadow: bool,
    pub receive_shadow: bool,
}

impl MeshNode {
    pub fn new(geometry: Geometry, materials: Vec<MaterialId>) -> Self {
        Self {
            geometry,
            materials,
            cast_shadow: false,
            receive_shadow: false,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum LightKind {
    Directional,
    Point,
    Spot,
}

/// A punctual light embedded in the payload.
#[derive(Clone, Debug, PartialEq)]
pub struct LightNode {
    pub kind: LightKind,
    pub color: Vec3,
    pub intensity: f32,
}

/// What a node is.
#[derive(Clone, Debug)]
pub enum NodeKind {
    Mesh(MeshNode),
    Group,
    Light(LightNode),
}

/// One node of the scene graph.
#[derive(Clone, Debug)]
pub struct SceneNode {
    pub name: Option<String>,
    pub transform: crate::Transform,
    pub kind: NodeKind,
    pub children: Vec<SceneNode>,
}

impl SceneNode {
    /// An empty group node.
    pub fn group(name: Option<String>) -> Self {
        Self {
            name,
            transform: crate::Transform::default(),
            kind: NodeKind::Group,
            children: Vec::new(),
        }
    }

    pub fn mesh(name: Option<String>, mesh: MeshNode) -> Self {
        Self {
            kind: NodeKind::Mesh(mesh),
            ..Self::group(name)
        }
    }

    pub fn light(name: Option<String>, light: LightNode) -> Self {
        Self {
            kind: NodeKind::Light(light),
            ..Self::group(name)
        }
    }

    pub fn with_transform(mut self, transform: crate::Transform) -> Self {
        self.transform = transform;
        self
    }

    pub fn with_child(mut self, child: SceneNode) -> Self {
        self.children.push(child);
        self
    }

    /// Depth-first walk with accumulated world matrices.
    pub fn visit<F: FnMut(&SceneNode, &Mat4)>(&self, parent: &Mat4, f: &mut F) {
        let world = *parent * self.transform.local_matrix();
        f(self, &world);
        for child in &self.children {
            child.visit(&world, f);
        }
    }

    /// Depth-first mutable walk.
    pub fn visit_mut<F: FnMut(&mut SceneNode)>(&mut self, f: &mut F) {
        f(self);
        for child in &mut self.children {
            child.visit_mut(f);
        }
    }

    /// Every mesh in the subtree.
    pub fn meshes(&self) -> Vec<&MeshNode> {
        let mut out = Vec::new();
        self.collect_meshes(&mut out);
        out
    }

    fn collect_meshes<'a>(&'a self, out: &mut Vec<&'a MeshNode>) {
        if let NodeKind::Mesh(mesh) = &self.kind {
            out.push(mesh);
        }
        for child in &self.children {
            child.collect_meshes(out);
        }
    }

    /// Set shadow flags on every mesh in the subtree.
    pub fn set_shadows(&mut self, cast: bool, receive: bool) {
        self.visit_mut(&mut |node| {
            if let NodeKind::Mesh(mesh) = &mut node.kind {
                mesh.cast_shadow = cast;
                mesh.receive_shadow = receive;
            }
        });
    }

    /// World-space bounds of every mesh below (and including) this node.
    pub fn world_bounds(&self) -> Option<Aabb> {
        let mut bounds: Option<Aabb> = None;
        self.visit(&Mat4::IDENTITY, &mut |node, world| {
            if let NodeKind::Mesh(mesh) = &node.kind {
                let b = mesh.geometry.bounds.transformed(world);
                bounds = Some(bounds.map_or(b, |acc| acc.union(&b)));
            }
        });
        bounds
    }

    /// Number of nodes in the subtree, this one included.
    pub fn node_count(&self) -> usize {
        1 + self.children.iter().map(SceneNode::node_count).sum::<usize>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Transform;

    fn cube_node(id: u32, at: Vec3) -> SceneNode {
        SceneNode::mesh(
            Some(format!("cube-{id}")),
            MeshNode::new(Geometry::cube(GeometryId(id), 1.0), vec![MaterialId(0)]),
        )
        .with_transform(Transform::new().with_position(at))
    }

    #[test]
    fn test_cube_geometry() {
        let g = Geometry::cube(GeometryId(0), 2.0);
        assert_eq!(g.triangle_count(), 12);
        assert_eq!(g.triangles().count(), 12);
        assert_eq!(g.bounds, Aabb::new(Vec3::splat(-1.0), Vec3::splat(1.0)));
    }

    #[test]
    fn test_non_indexed_triangles() {
        let g = Geometry::new(
            GeometryId(0),
            vec![Vec3::ZERO, Vec3::X, Vec3::Y, Vec3::Z],
            Vec::new(),
        );
        assert_eq!(g.triangles().count(), 1);
    }

    #[test]
    fn test_out_of_range_indices_skipped() {
        let g = Geometry::new(GeometryId(0), vec![Vec3::ZERO, Vec3::X, Vec3::Y], vec![0, 1, 9]);
        assert_eq!(g.triangles().count(), 0);
    }

    #[test]
    fn test_set_shadows_reaches_nested_meshes() {
        let mut root = SceneNode::group(None)
            .with_child(cube_node(0, Vec3::ZERO))
            .with_child(SceneNode::group(None).with_child(cube_node(1, Vec3::X)));

        root.set_shadows(true, true);
        let meshes = root.meshes();
        assert_eq!(meshes.len(), 2);
        assert!(meshes.iter().all(|m| m.cast_shadow && m.receive_shadow));
    }

    #[test]
    fn test_world_bounds_accumulate_parents() {
        let root = SceneNode::group(None)
            .with_transform(Transform::new().with_position(Vec3::new(10.0, 0.0, 0.0)))
            .with_child(cube_node(0, Vec3::new(0.0, 5.0, 0.0)));

        let bounds = root.world_bounds().unwrap();
        assert!((bounds.center() - Vec3::new(10.0, 5.0, 0.0)).length() < 1e-5);
        assert!((bounds.size() - Vec3::ONE).length() < 1e-5);
    }

    #[test]
    fn test_group_without_meshes_has_no_bounds() {
        let root = SceneNode::group(None).with_child(SceneNode::light(
            None,
            LightNode {
                kind: LightKind::Point,
                color: Vec3::ONE,
                intensity: 1.0,
            },
        ));
        assert!(root.world_bounds().is_none());
        assert_eq!(root.node_count(), 2);
    }
}
