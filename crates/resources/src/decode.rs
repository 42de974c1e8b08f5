//! glTF decoding into the typed scene graph.

use glam::{Vec3, Vec4};
use gltf::buffer::Data;
use gltf::khr_lights_punctual::Kind;
use gltf::mesh::Mode;
use tracing::{debug, info};

use avatar_scene::{
    Geometry, GeometryId, LightKind, LightNode, MaterialId, MeshNode, SceneNode, Transform,
};

use crate::{AnimationClip, LoadError, LoadResult, LoadedAsset, Material, ModelHandle};

/// Decode a `.glb` (or self-contained `.gltf`) payload.
///
/// Nodes become [`SceneNode`]s: a node whose mesh has a single primitive is
/// a mesh node, a multi-primitive mesh becomes a group with one mesh child
/// per primitive. Clip durations are the latest keyframe time across all
/// channels.
pub fn decode_gltf(uri: &str, bytes: &[u8]) -> LoadResult<LoadedAsset> {
    let (document, buffers, _images) = gltf::import_slice(bytes).map_err(|e| LoadError::Decode {
        uri: uri.to_string(),
        message: e.to_string(),
    })?;

    let scene = document
        .default_scene()
        .or_else(|| document.scenes().next())
        .ok_or_else(|| LoadError::NoScene(uri.to_string()))?;

    let mut materials: Vec<Material> = document
        .materials()
        .filter_map(|m| {
            let index = m.index()?;
            let pbr = m.pbr_metallic_roughness();
            Some(Material {
                id: MaterialId(index as u32),
                name: m.name().map(str::to_owned),
                base_color: Vec4::from(pbr.base_color_factor()),
                metallic: pbr.metallic_factor(),
                roughness: pbr.roughness_factor(),
                emissive: Vec3::from(m.emissive_factor()),
                double_sided: m.double_sided(),
            })
        })
        .collect();

    let mut decoder = Decoder {
        buffers: &buffers,
        next_geometry: 0,
        fallback_material: MaterialId(materials.len() as u32),
        uses_fallback: false,
    };

    let mut root = SceneNode::group(scene.name().map(str::to_owned));
    for node in scene.nodes() {
        root.children.push(decoder.node(&node));
    }

    if decoder.uses_fallback {
        materials.push(Material::fallback(decoder.fallback_material));
    }

    let clips: Vec<AnimationClip> = document
        .animations()
        .map(|animation| {
            let duration = animation
                .channels()
                .filter_map(|channel| {
                    let reader = channel.reader(|buffer| buffer_data(&buffers, buffer.index()));
                    reader
                        .read_inputs()
                        .map(|inputs| inputs.fold(0.0_f32, f32::max))
                })
                .fold(0.0_f32, f32::max);
            AnimationClip::new(animation.name().unwrap_or_default(), duration)
        })
        .collect();

    let model = ModelHandle::new(root, materials);
    info!(
        "Decoded '{}': {} meshes, {} triangles, {} materials, {} clips",
        uri,
        model.mesh_count(),
        model.total_triangle_count(),
        model.materials().len(),
        clips.len()
    );

    Ok(LoadedAsset { model, clips })
}

fn buffer_data(buffers: &[Data], index: usize) -> Option<&[u8]> {
    buffers.get(index).map(|data| data.0.as_slice())
}

struct Decoder<'a> {
    buffers: &'a [Data],
    next_geometry: u32,
    fallback_material: MaterialId,
    uses_fallback: bool,
}

impl Decoder<'_> {
    fn node(&mut self, node: &gltf::Node<'_>) -> SceneNode {
        let (translation, rotation, scale) = node.transform().decomposed();
        let name = node.name().map(str::to_owned);

        let mut scene_node = if let Some(mesh) = node.mesh() {
            let mut parts: Vec<SceneNode> = mesh
                .primitives()
                .filter_map(|primitive| self.primitive(&primitive))
                .map(|part| SceneNode::mesh(name.clone(), part))
                .collect();
            match parts.len() {
                1 => parts.remove(0),
                _ => {
                    let mut group = SceneNode::group(name);
                    group.children = parts;
                    group
                }
            }
        } else if let Some(light) = node.light() {
            let kind = match light.kind() {
                Kind::Directional => LightKind::Directional,
                Kind::Point => LightKind::Point,
                Kind::Spot { .. } => LightKind::Spot,
            };
            SceneNode::light(
                name,
                LightNode {
                    kind,
                    color: Vec3::from(light.color()),
                    intensity: light.intensity(),
                },
            )
        } else {
            SceneNode::group(name)
        };

        scene_node.transform = Transform::from_trs(translation, rotation, scale);
        for child in node.children() {
            scene_node.children.push(self.node(&child));
        }
        scene_node
    }

    fn primitive(&mut self, primitive: &gltf::Primitive<'_>) -> Option<MeshNode> {
        if primitive.mode() != Mode::Triangles {
            debug!("Skipping primitive with mode {:?}", primitive.mode());
            return None;
        }

        let buffers = self.buffers;
        let reader = primitive.reader(|buffer| buffer_data(buffers, buffer.index()));

        let Some(positions) = reader.read_positions() else {
            debug!("Skipping primitive without positions");
            return None;
        };
        let positions: Vec<Vec3> = positions.map(Vec3::from).collect();
        let indices: Vec<u32> = reader
            .read_indices()
            .map(|indices| indices.into_u32().collect())
            .unwrap_or_default();

        let material = match primitive.material().index() {
            Some(index) => MaterialId(index as u32),
            None => {
                self.uses_fallback = true;
                self.fallback_material
            }
        };

        let id = GeometryId(self.next_geometry);
        self.next_geometry += 1;

        Some(MeshNode::new(Geometry::new(id, positions, indices), vec![material]))
    }
}
