//! Pointer hit testing against the model.

use glam::{Mat4, Vec2, Vec3};

use crate::graph::{NodeKind, SceneNode};
use crate::{Camera, Ray};

/// Position and size of the rendered surface in pointer coordinates.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ViewportRect {
    pub left: f32,
    pub top: f32,
    pub width: f32,
    pub height: f32,
}

impl ViewportRect {
    pub fn new(left: f32, top: f32, width: f32, height: f32) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    /// Rect anchored at the origin.
    pub fn from_size(width: f32, height: f32) -> Self {
        Self::new(0.0, 0.0, width, height)
    }

    /// Map pointer coordinates to normalized device coordinates, `+y` up.
    /// `None` for an empty rect.
    pub fn to_ndc(&self, x: f32, y: f32) -> Option<Vec2> {
        if self.width <= 0.0 || self.height <= 0.0 {
            return None;
        }
        Some(Vec2::new(
            (x - self.left) / self.width * 2.0 - 1.0,
            -((y - self.top) / self.height) * 2.0 + 1.0,
        ))
    }

    /// Inverse of [`to_ndc`](Self::to_ndc).
    pub fn from_ndc(&self, ndc: Vec2) -> (f32, f32) {
        (
            self.left + (ndc.x + 1.0) * 0.5 * self.width,
            self.top + (1.0 - ndc.y) * 0.5 * self.height,
        )
    }
}

/// One ray/mesh hit.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Intersection {
    pub distance: f32,
    pub point: Vec3,
}

/// Casts pointer rays into the scene.
///
/// Holds only scratch storage reused between calls.
#[derive(Debug, Default)]
pub struct InteractionPicker {
    hits: Vec<Intersection>,
}

impl InteractionPicker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the pointer at (`x`, `y`) lands on any mesh under `model_root`.
    pub fn hit_test(
        &mut self,
        x: f32,
        y: f32,
        viewport: &ViewportRect,
        camera: &Camera,
        model_root: &SceneNode,
    ) -> bool {
        self.hits.clear();
        let Some(ndc) = viewport.to_ndc(x, y) else {
            return false;
        };

        let ray = camera.ray_through_ndc(ndc);
        let hits = &mut self.hits;
        model_root.visit(&Mat4::IDENTITY, &mut |node, world| {
            if let NodeKind::Mesh(mesh) = &node.kind {
                intersect_mesh(&ray, world, &mesh.geometry, hits);
            }
        });
        self.hits
            .sort_by(|a, b| a.distance.total_cmp(&b.distance));

        !self.hits.is_empty()
    }

    /// Hits from the last call, nearest first.
    pub fn intersections(&self) -> &[Intersection] {
        &self.hits
    }

    /// Drop scratch state.
    pub fn reset(&mut self) {
        self.hits = Vec::new();
    }
}

fn intersect_mesh(
    ray: &Ray,
    world: &Mat4,
    geometry: &crate::Geometry,
    hits: &mut Vec<Intersection>,
) {
    if world.determinant().abs() < f32::EPSILON {
        return;
    }
    let local = ray.transformed(&world.inverse());

    if local.intersect_aabb(&geometry.bounds).is_none() {
        return;
    }

    for (a, b, c) in geometry.triangles() {
        if let Some(t) = local.intersect_triangle(a, b, c) {
            // The local direction is unnormalized, so `t` is already a
            // world-space distance along the original unit ray.
            hits.push(Intersection {
                distance: t,
                point: ray.at(t),
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{Geometry, GeometryId, MaterialId, MeshNode};
    use crate::Transform;

    fn model_with_cube(at: Vec3) -> SceneNode {
        SceneNode::group(None).with_child(
            SceneNode::mesh(
                None,
                MeshNode::new(Geometry::cube(GeometryId(0), 0.5), vec![MaterialId(0)]),
            )
            .with_transform(Transform::new().with_position(at)),
        )
    }

    #[test]
    fn test_ndc_mapping() {
        let rect = ViewportRect::new(10.0, 20.0, 200.0, 100.0);
        assert_eq!(rect.to_ndc(10.0, 20.0), Some(Vec2::new(-1.0, 1.0)));
        assert_eq!(rect.to_ndc(210.0, 120.0), Some(Vec2::new(1.0, -1.0)));
        assert_eq!(rect.to_ndc(110.0, 70.0), Some(Vec2::ZERO));
        assert_eq!(rect.from_ndc(Vec2::ZERO), (110.0, 70.0));
        assert!(ViewportRect::from_size(0.0, 10.0).to_ndc(0.0, 0.0).is_none());
    }

    #[test]
    fn test_hit_at_projected_center() {
        let camera = Camera::default();
        let center = Vec3::new(0.1, 1.0, 0.0);
        let model = model_with_cube(center);
        let rect = ViewportRect::new(0.0, 0.0, 800.0, 800.0);

        let ndc = camera.project(center);
        let (x, y) = rect.from_ndc(ndc.truncate());

        let mut picker = InteractionPicker::new();
        assert!(picker.hit_test(x, y, &rect, &camera, &model));
        let nearest = picker.intersections()[0];
        assert!(nearest.distance > 0.0);
        assert!((nearest.point - center).length() < 0.5);
    }

    #[test]
    fn test_miss_far_outside() {
        let camera = Camera::default();
        let model = model_with_cube(Vec3::new(0.0, 1.0, 0.0));
        let rect = ViewportRect::new(0.0, 0.0, 800.0, 800.0);

        let mut picker = InteractionPicker::new();
        assert!(!picker.hit_test(2.0, 2.0, &rect, &camera, &model));
        assert!(picker.intersections().is_empty());
    }

    #[test]
    fn test_parent_transform_applies() {
        let camera = Camera::default();
        let rect = ViewportRect::new(0.0, 0.0, 800.0, 800.0);
        // Cube authored at the origin, lifted to the camera target by its parent.
        let model = model_with_cube(Vec3::ZERO)
            .with_transform(Transform::new().with_position(Vec3::new(0.0, 1.0, 0.0)));

        let mut picker = InteractionPicker::new();
        assert!(picker.hit_test(400.0, 400.0, &rect, &camera, &model));
    }

    #[test]
    fn test_empty_model_never_hits() {
        let camera = Camera::default();
        let rect = ViewportRect::new(0.0, 0.0, 800.0, 800.0);
        let mut picker = InteractionPicker::new();
        assert!(!picker.hit_test(400.0, 400.0, &rect, &camera, &SceneNode::group(None)));
    }
}
