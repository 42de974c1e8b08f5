//! Rotation-only orbit controls.
//!
//! The avatar may be turned around but never zoomed or panned: the camera
//! stays at a fixed distance from its target and cannot dip below the
//! horizon. Drag input accumulates a spherical delta that is applied with
//! exponential damping on every [`OrbitController::update`].

use std::f32::consts::PI;

use glam::Vec3;

use avatar_core::ControlsConfig;

use crate::Camera;

const EPSILON: f32 = 1e-6;

/// What the controller lets the user do.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ControlCapabilities {
    pub rotate: bool,
    pub zoom: bool,
    pub pan: bool,
}

/// Polar/azimuth coordinates around the target; `phi` is measured from +Y.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
struct Spherical {
    radius: f32,
    phi: f32,
    theta: f32,
}

impl Spherical {
    fn from_offset(offset: Vec3) -> Self {
        let radius = offset.length();
        if radius < EPSILON {
            return Self::default();
        }
        Self {
            radius,
            theta: offset.x.atan2(offset.z),
            phi: (offset.y / radius).clamp(-1.0, 1.0).acos(),
        }
    }

    fn to_offset(self) -> Vec3 {
        let sin_phi = self.phi.sin();
        Vec3::new(
            self.radius * sin_phi * self.theta.sin(),
            self.radius * self.phi.cos(),
            self.radius * sin_phi * self.theta.cos(),
        )
    }
}

/// Orbit-style camera controller restricted to rotation.
#[derive(Debug)]
pub struct OrbitController {
    target: Vec3,
    distance: f32,
    min_polar_angle: f32,
    max_polar_angle: f32,
    damping_factor: f32,
    rotate_speed: f32,
    delta_theta: f32,
    delta_phi: f32,
    disposed: bool,
}

impl OrbitController {
    /// Create a controller orbiting the camera's current target.
    pub fn new(camera: &Camera, config: &ControlsConfig) -> Self {
        Self {
            target: camera.target,
            distance: config.distance,
            min_polar_angle: 0.0,
            max_polar_angle: config.max_polar_angle.clamp(0.0, PI),
            damping_factor: config.damping_factor.clamp(0.0, 1.0),
            rotate_speed: config.rotate_speed,
            delta_theta: 0.0,
            delta_phi: 0.0,
            disposed: false,
        }
    }

    pub fn capabilities(&self) -> ControlCapabilities {
        ControlCapabilities {
            rotate: !self.disposed,
            zoom: false,
            pan: false,
        }
    }

    pub fn target(&self) -> Vec3 {
        self.target
    }

    pub fn distance(&self) -> f32 {
        self.distance
    }

    /// Feed a pointer drag of `dx`, `dy` pixels on a viewport `viewport_height`
    /// pixels tall. A full-height drag turns the camera by one full circle.
    pub fn rotate(&mut self, dx: f32, dy: f32, viewport_height: f32) {
        if self.disposed || viewport_height <= 0.0 {
            return;
        }
        let scale = 2.0 * PI * self.rotate_speed / viewport_height;
        self.delta_theta -= dx * scale;
        self.delta_phi -= dy * scale;
    }

    /// Apply damped rotation and the distance/polar constraints to `camera`.
    ///
    /// Returns `true` if the camera moved noticeably.
    pub fn update(&mut self, camera: &mut Camera) -> bool {
        if self.disposed {
            return false;
        }

        let before = camera.position;
        let mut spherical = Spherical::from_offset(camera.position - self.target);

        spherical.theta += self.delta_theta * self.damping_factor;
        spherical.phi += self.delta_phi * self.damping_factor;

        spherical.phi = spherical
            .phi
            .clamp(self.min_polar_angle, self.max_polar_angle)
            .clamp(EPSILON, PI - EPSILON);
        spherical.radius = self.distance;

        camera.position = self.target + spherical.to_offset();
        camera.target = self.target;

        self.delta_theta *= 1.0 - self.damping_factor;
        self.delta_phi *= 1.0 - self.damping_factor;

        (camera.position - before).length_squared() > EPSILON
    }

    /// Drop pending motion and stop reacting to input. Idempotent.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.delta_theta = 0.0;
        self.delta_phi = 0.0;
        self.disposed = true;
        tracing::debug!("Orbit controls disposed");
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }
}
