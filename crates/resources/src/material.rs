//! Material definitions.

use glam::{Vec3, Vec4};

use avatar_scene::MaterialId;

/// PBR material properties as authored in the payload.
#[derive(Debug, Clone, PartialEq)]
pub struct Material {
    pub id: MaterialId,
    pub name: Option<String>,
    /// Base color (albedo)
    pub base_color: Vec4,
    /// Metallic factor (0.0 = dielectric, 1.0 = metal)
    pub metallic: f32,
    /// Roughness factor (0.0 = smooth, 1.0 = rough)
    pub roughness: f32,
    /// Emissive color
    pub emissive: Vec3,
    pub double_sided: bool,
}

impl Material {
    /// glTF's default material, used by primitives that reference none.
    pub fn fallback(id: MaterialId) -> Self {
        Self {
            id,
            name: None,
            base_color: Vec4::ONE,
            metallic: 1.0,
            roughness: 1.0,
            emissive: Vec3::ZERO,
            double_sided: false,
        }
    }
}
