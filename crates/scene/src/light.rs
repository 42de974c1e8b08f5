//! Lighting rig and shadow receiver for the avatar scene.

use bytemuck::{Pod, Zeroable};
use glam::{Quat, Vec3};

use avatar_core::{GroundConfig, LightingConfig};

use crate::Transform;

/// Convert a `0xRRGGBB` color to linear-ish RGB in `[0, 1]`.
pub fn color_from_hex(hex: u32) -> Vec3 {
    Vec3::new(
        ((hex >> 16) & 0xff) as f32 / 255.0,
        ((hex >> 8) & 0xff) as f32 / 255.0,
        (hex & 0xff) as f32 / 255.0,
    )
}

/// Uniform lighting applied to every surface.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AmbientLight {
    pub color: Vec3,
    pub intensity: f32,
}

/// Shadow map parameters of a shadow-casting light.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ShadowSettings {
    /// Shadow map edge length in texels.
    pub map_size: u32,
    /// Shadow camera clip planes.
    pub near: f32,
    pub far: f32,
}

/// A directional light (sun-like) shining from `position` towards `target`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DirectionalLight {
    pub position: Vec3,
    pub target: Vec3,
    pub color: Vec3,
    pub intensity: f32,
    pub cast_shadow: bool,
    pub shadow: ShadowSettings,
}

impl DirectionalLight {
    /// Normalized direction the light travels in.
    pub fn direction(&self) -> Vec3 {
        (self.target - self.position).normalize_or_zero()
    }
}

/// The fixed two-light rig: ambient fill plus a shadow-casting sun.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LightRig {
    pub ambient: AmbientLight,
    pub sun: DirectionalLight,
}

impl LightRig {
    pub fn from_config(config: &LightingConfig) -> Self {
        Self {
            ambient: AmbientLight {
                color: color_from_hex(config.ambient_color),
                intensity: config.ambient_intensity,
            },
            sun: DirectionalLight {
                position: Vec3::from_array(config.sun_position),
                target: Vec3::ZERO,
                color: color_from_hex(config.sun_color),
                intensity: config.sun_intensity,
                cast_shadow: true,
                shadow: ShadowSettings {
                    map_size: config.shadow_map_size,
                    near: config.shadow_near,
                    far: config.shadow_far,
                },
            },
        }
    }

    /// Pack the rig for upload to a shader uniform buffer.
    pub fn uniform(&self) -> LightUniform {
        LightUniform {
            ambient_color: self.ambient.color,
            ambient_intensity: self.ambient.intensity,
            sun_direction: self.sun.direction(),
            shadow_map_size: self.sun.shadow.map_size as f32,
            sun_color: self.sun.color,
            sun_intensity: self.sun.intensity,
        }
    }
}

/// Lighting uniform data.
///
/// # Memory Layout
///
/// - Offset 0: ambient color (12 bytes) + intensity (4 bytes)
/// - Offset 16: sun direction (12 bytes) + shadow map size (4 bytes)
/// - Offset 32: sun color (12 bytes) + intensity (4 bytes)
/// - Total size: 48 bytes
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct LightUniform {
    pub ambient_color: Vec3,
    pub ambient_intensity: f32,
    pub sun_direction: Vec3,
    pub shadow_map_size: f32,
    pub sun_color: Vec3,
    pub sun_intensity: f32,
}

impl LightUniform {
    /// Size of the struct in bytes.
    pub const SIZE: usize = std::mem::size_of::<Self>();
}

/// Horizontal plane that only shows received shadows.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GroundPlane {
    /// Edge length of the square plane.
    pub size: f32,
    /// Opacity of the shadow-only material.
    pub shadow_opacity: f32,
    pub transform: Transform,
    pub receive_shadow: bool,
}

impl GroundPlane {
    pub fn from_config(config: &GroundConfig) -> Self {
        Self {
            size: config.size,
            shadow_opacity: config.shadow_opacity,
            // The plane is authored in XY; lay it flat at y = 0.
            transform: Transform::new()
                .with_rotation(Quat::from_rotation_x(-std::f32::consts::FRAC_PI_2)),
            receive_shadow: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_from_hex() {
        assert_eq!(color_from_hex(0xffffff), Vec3::ONE);
        assert_eq!(color_from_hex(0x000000), Vec3::ZERO);
        let c = color_from_hex(0xff0080);
        assert_eq!(c.x, 1.0);
        assert_eq!(c.y, 0.0);
        assert!((c.z - 128.0 / 255.0).abs() < 1e-6);
    }

    #[test]
    fn test_default_rig() {
        let rig = LightRig::from_config(&LightingConfig::default());
        assert_eq!(rig.ambient.intensity, 1.5);
        assert_eq!(rig.sun.intensity, 7.0);
        assert!(rig.sun.cast_shadow);
        assert_eq!(rig.sun.shadow.map_size, 2048);
        assert_eq!(rig.sun.shadow.near, 0.5);
        assert_eq!(rig.sun.shadow.far, 50.0);
        assert!(rig.sun.direction().y < 0.0);
    }

    #[test]
    fn test_uniform_layout() {
        assert_eq!(LightUniform::SIZE, 48);
        let rig = LightRig::from_config(&LightingConfig::default());
        let uniform = rig.uniform();
        assert_eq!(bytemuck::bytes_of(&uniform).len(), LightUniform::SIZE);
        assert_eq!(uniform.shadow_map_size, 2048.0);
    }

    #[test]
    fn test_ground_plane_is_flat() {
        let ground = GroundPlane::from_config(&GroundConfig::default());
        let normal = ground.transform.rotation * Vec3::Z;
        assert!((normal - Vec3::Y).length() < 1e-5);
        assert!(ground.receive_shadow);
        assert_eq!(ground.size, 20.0);
    }
}
