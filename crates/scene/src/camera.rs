//! Perspective camera.

use glam::{Mat4, Vec2, Vec3};

use avatar_core::CameraConfig;

use crate::ray::Ray;

/// A perspective camera looking at a target point.
///
/// Projection uses the right-handed, zero-to-one depth convention, so
/// normalized device coordinates put the near plane at `z = 0` and the far
/// plane at `z = 1`, with `+y` up.
#[derive(Clone, Debug)]
pub struct Camera {
    /// Camera position in world space
    pub position: Vec3,
    /// Point the camera looks at
    pub target: Vec3,
    /// Vertical field of view in radians
    pub fov_y: f32,
    /// Width over height
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self::from_config(&CameraConfig::default(), 1.0)
    }
}

impl Camera {
    /// Build a camera from configuration with the given aspect ratio.
    pub fn from_config(config: &CameraConfig, aspect: f32) -> Self {
        Self {
            position: Vec3::from_array(config.position),
            target: Vec3::from_array(config.target),
            fov_y: config.fov_y_degrees.to_radians(),
            aspect,
            near: config.near,
            far: config.far,
        }
    }

    /// Update the aspect ratio. Non-finite or non-positive values are ignored.
    pub fn set_aspect(&mut self, aspect: f32) {
        if aspect.is_finite() && aspect > 0.0 {
            self.aspect = aspect;
        }
    }

    /// Get the view matrix.
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.target, Vec3::Y)
    }

    /// Get the projection matrix.
    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov_y, self.aspect, self.near, self.far)
    }

    /// Get the view-projection matrix.
    pub fn view_projection_matrix(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }

    /// Get the forward direction vector.
    pub fn forward(&self) -> Vec3 {
        (self.target - self.position).normalize_or_zero()
    }

    /// Project a world-space point to normalized device coordinates.
    pub fn project(&self, point: Vec3) -> Vec3 {
        self.view_projection_matrix().project_point3(point)
    }

    /// Cast a ray from the camera through a point in normalized device
    /// coordinates (`x`, `y` in `[-1, 1]`, `+y` up).
    pub fn ray_through_ndc(&self, ndc: Vec2) -> Ray {
        let inverse = self.view_projection_matrix().inverse();
        let near = inverse.project_point3(ndc.extend(0.0));
        let far = inverse.project_point3(ndc.extend(1.0));
        Ray::new(self.position, far - near)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f32 = 1e-4;

    #[test]
    fn test_from_default_config() {
        let camera = Camera::from_config(&CameraConfig::default(), 2.0);
        assert_eq!(camera.position, Vec3::new(0.5, 1.5, 2.1));
        assert_eq!(camera.target, Vec3::new(0.0, 1.0, 0.0));
        assert!((camera.fov_y - 60.0_f32.to_radians()).abs() < EPSILON);
        assert_eq!(camera.aspect, 2.0);
    }

    #[test]
    fn test_set_aspect_ignores_degenerate() {
        let mut camera = Camera::default();
        camera.set_aspect(1.5);
        camera.set_aspect(0.0);
        camera.set_aspect(f32::NAN);
        assert_eq!(camera.aspect, 1.5);
    }

    #[test]
    fn test_target_projects_to_center() {
        let camera = Camera::default();
        let ndc = camera.project(camera.target);
        assert!(ndc.x.abs() < EPSILON);
        assert!(ndc.y.abs() < EPSILON);
    }

    #[test]
    fn test_center_ray_points_at_target() {
        let camera = Camera::default();
        let ray = camera.ray_through_ndc(Vec2::ZERO);
        assert!((ray.direction - camera.forward()).length() < EPSILON);
    }
}
