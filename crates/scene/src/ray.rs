//! Rays and intersection primitives.

use glam::{Mat4, Vec3};

use crate::graph::Aabb;

/// A half-line in 3D space. `direction` is normalized on construction.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
}

impl Ray {
    /// Create a ray, normalizing the direction.
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self {
            origin,
            direction: direction.normalize_or_zero(),
        }
    }

    /// Point at parameter `t` along the ray.
    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }

    /// Transform the ray by a matrix without renormalizing, so that ray
    /// parameters stay comparable across spaces.
    pub fn transformed(&self, matrix: &Mat4) -> Self {
        Self {
            origin: matrix.transform_point3(self.origin),
            direction: matrix.transform_vector3(self.direction),
        }
    }

    /// Slab test against a box. Returns the entry parameter (or zero when
    /// the origin is inside the box).
    pub fn intersect_aabb(&self, aabb: &Aabb) -> Option<f32> {
        let inv = self.direction.recip();
        let t1 = (aabb.min - self.origin) * inv;
        let t2 = (aabb.max - self.origin) * inv;

        let t_min = t1.min(t2).max_element();
        let t_max = t1.max(t2).min_element();

        if t_max < 0.0 || t_min > t_max {
            None
        } else {
            Some(t_min.max(0.0))
        }
    }

    /// Möller–Trumbore intersection against a triangle, both faces.
    pub fn intersect_triangle(&self, a: Vec3, b: Vec3, c: Vec3) -> Option<f32> {
        const EPSILON: f32 = 1e-7;

        let edge1 = b - a;
        let edge2 = c - a;
        let p = self.direction.cross(edge2);
        let det = edge1.dot(p);
        if det.abs() < EPSILON {
            return None;
        }

        let inv_det = 1.0 / det;
        let s = self.origin - a;
        let u = s.dot(p) * inv_det;
        if !(0.0..=1.0).contains(&u) {
            return None;
        }

        let q = s.cross(edge1);
        let v = self.direction.dot(q) * inv_det;
        if v < 0.0 || u + v > 1.0 {
            return None;
        }

        let t = edge2.dot(q) * inv_det;
        (t > EPSILON).then_some(t)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hits_box_in_front() {
        let ray = Ray::new(Vec3::new(0.0, 0.0, 5.0), Vec3::NEG_Z);
        let aabb = Aabb::new(Vec3::splat(-1.0), Vec3::splat(1.0));
        let t = ray.intersect_aabb(&aabb).unwrap();
        assert!((t - 4.0).abs() < 1e-5);
    }

    #[test]
    fn test_misses_box_behind() {
        let ray = Ray::new(Vec3::new(0.0, 0.0, 5.0), Vec3::Z);
        let aabb = Aabb::new(Vec3::splat(-1.0), Vec3::splat(1.0));
        assert!(ray.intersect_aabb(&aabb).is_none());
    }

    #[test]
    fn test_triangle_both_faces() {
        let (a, b, c) = (
            Vec3::new(-1.0, -1.0, 0.0),
            Vec3::new(1.0, -1.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
        );
        let front = Ray::new(Vec3::new(0.0, 0.0, 3.0), Vec3::NEG_Z);
        let back = Ray::new(Vec3::new(0.0, 0.0, -3.0), Vec3::Z);
        assert!((front.intersect_triangle(a, b, c).unwrap() - 3.0).abs() < 1e-5);
        assert!((back.intersect_triangle(a, b, c).unwrap() - 3.0).abs() < 1e-5);
    }

    #[test]
    fn test_triangle_miss() {
        let ray = Ray::new(Vec3::new(5.0, 5.0, 3.0), Vec3::NEG_Z);
        assert!(
            ray.intersect_triangle(Vec3::new(-1.0, -1.0, 0.0), Vec3::X, Vec3::Y)
                .is_none()
        );
    }
}
