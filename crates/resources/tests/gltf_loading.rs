//! Loading tests against a small GLB assembled in memory.

use async_trait::async_trait;
use avatar_resources::{
    AssetLoader, AssetStream, LoadError, LoadResult, MemoryStream, ProgressReporter, decode_gltf,
    loader::FALLBACK_CAP,
};

const GLTF_JSON: &str = r#"{
  "asset": { "version": "2.0" },
  "scene": 0,
  "scenes": [{ "nodes": [0] }],
  "nodes": [{ "name": "body", "mesh": 0, "translation": [0.0, 1.0, 0.0] }],
  "meshes": [{ "primitives": [{ "attributes": { "POSITION": 0 }, "indices": 1, "material": 0 }] }],
  "materials": [{ "name": "skin", "pbrMetallicRoughness": { "baseColorFactor": [1.0, 0.8, 0.7, 1.0] } }],
  "buffers": [{ "byteLength": 80 }],
  "bufferViews": [
    { "buffer": 0, "byteOffset": 0, "byteLength": 36, "target": 34962 },
    { "buffer": 0, "byteOffset": 36, "byteLength": 12, "target": 34963 },
    { "buffer": 0, "byteOffset": 48, "byteLength": 32 }
  ],
  "accessors": [
    { "bufferView": 0, "componentType": 5126, "count": 3, "type": "VEC3", "min": [0.0, 0.0, 0.0], "max": [1.0, 1.0, 0.0] },
    { "bufferView": 1, "componentType": 5125, "count": 3, "type": "SCALAR" },
    { "bufferView": 2, "byteOffset": 0, "componentType": 5126, "count": 2, "type": "SCALAR", "min": [0.0], "max": [1.5] },
    { "bufferView": 2, "byteOffset": 8, "componentType": 5126, "count": 2, "type": "VEC3" }
  ],
  "animations": [
    { "name": "Animation", "samplers": [{ "input": 2, "output": 3 }], "channels": [{ "sampler": 0, "target": { "node": 0, "path": "translation" } }] },
    { "name": "salute", "samplers": [{ "input": 2, "output": 3 }], "channels": [{ "sampler": 0, "target": { "node": 0, "path": "translation" } }] },
    { "samplers": [{ "input": 2, "output": 3 }], "channels": [{ "sampler": 0, "target": { "node": 0, "path": "translation" } }] }
  ]
}"#;

fn binary_payload() -> Vec<u8> {
    let mut bin = Vec::with_capacity(80);
    let floats = |bin: &mut Vec<u8>, values: &[f32]| {
        for v in values {
            bin.extend_from_slice(&v.to_le_bytes());
        }
    };
    floats(&mut bin, &[0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0]);
    for index in [0u32, 1, 2] {
        bin.extend_from_slice(&index.to_le_bytes());
    }
    floats(&mut bin, &[0.0, 1.5]);
    floats(&mut bin, &[0.0, 0.0, 0.0, 0.0, 1.0, 0.0]);
    assert_eq!(bin.len(), 80);
    bin
}

fn build_glb() -> Vec<u8> {
    let mut json = GLTF_JSON.as_bytes().to_vec();
    while json.len() % 4 != 0 {
        json.push(b' ');
    }
    let bin = binary_payload();
    let total = 12 + 8 + json.len() + 8 + bin.len();

    let mut glb = Vec::with_capacity(total);
    glb.extend_from_slice(b"glTF");
    glb.extend_from_slice(&2u32.to_le_bytes());
    glb.extend_from_slice(&(total as u32).to_le_bytes());
    glb.extend_from_slice(&(json.len() as u32).to_le_bytes());
    glb.extend_from_slice(&0x4E4F_534Au32.to_le_bytes());
    glb.extend_from_slice(&json);
    glb.extend_from_slice(&(bin.len() as u32).to_le_bytes());
    glb.extend_from_slice(&0x004E_4942u32.to_le_bytes());
    glb.extend_from_slice(&bin);
    glb
}

fn collect(rx: &crossbeam_channel::Receiver<f32>) -> Vec<f32> {
    rx.try_iter().collect()
}

#[test]
fn test_decode_clips_and_meshes() {
    let asset = decode_gltf("memory", &build_glb()).unwrap();

    let names: Vec<String> = asset
        .clips
        .iter()
        .enumerate()
        .map(|(i, clip)| clip.registry_name(i))
        .collect();
    assert_eq!(names, ["Animation", "salute", "clip-2"]);
    assert!(asset.clips.iter().all(|c| (c.duration() - 1.5).abs() < 1e-6));

    assert_eq!(asset.model.mesh_count(), 1);
    assert_eq!(asset.model.total_triangle_count(), 1);
    assert_eq!(asset.model.materials().len(), 1);
    assert_eq!(asset.model.materials()[0].name.as_deref(), Some("skin"));

    let bounds = asset.model.bounds().unwrap();
    assert!((bounds.min.y - 1.0).abs() < 1e-5);
    assert!((bounds.max.y - 2.0).abs() < 1e-5);
}

#[test]
fn test_garbage_payload_is_decode_error() {
    let result = decode_gltf("garbage", b"definitely not a model");
    assert!(matches!(result, Err(LoadError::Decode { .. })));
}

#[tokio::test]
async fn test_load_with_known_total() {
    let progress = ProgressReporter::new();
    let rx = progress.subscribe();
    let loader = AssetLoader::new(progress.clone(), 64, std::f32::consts::PI / 9.0);

    let glb = build_glb();
    let asset = loader
        .load_stream("memory", Box::new(MemoryStream::new(glb, 64)))
        .await
        .unwrap();

    assert!(
        asset
            .model
            .meshes()
            .iter()
            .all(|m| m.cast_shadow && m.receive_shadow)
    );

    let values = collect(&rx);
    assert_eq!(values[0], 0.0);
    assert!(values.contains(&5.0));
    assert!(values.windows(2).all(|w| w[0] <= w[1]));
    assert_eq!(*values.last().unwrap(), 99.0);
    assert!(!progress.has_completed());
}

#[tokio::test]
async fn test_load_with_unknown_total_uses_synthetic_progress() {
    let progress = ProgressReporter::new();
    let rx = progress.subscribe();
    let loader = AssetLoader::new(progress.clone(), 16, 0.0);

    let glb = build_glb();
    let chunks = glb.len().div_ceil(16);
    loader
        .load_stream("memory", Box::new(MemoryStream::without_total(glb, 16)))
        .await
        .unwrap();

    let values = collect(&rx);
    assert!(values.windows(2).all(|w| w[0] <= w[1]));
    let last = *values.last().unwrap();
    let expected = (1.5 * chunks as f32).clamp(5.0, FALLBACK_CAP);
    assert!((last - expected).abs() < 1e-3);
    assert!(last <= FALLBACK_CAP);
}

#[tokio::test]
async fn test_load_from_file() {
    let path = std::env::temp_dir().join(format!("avatar-test-{}.glb", std::process::id()));
    tokio::fs::write(&path, build_glb()).await.unwrap();

    let loader = AssetLoader::new(ProgressReporter::new(), 32, 0.0);
    let asset = loader.load(path.to_str().unwrap()).await;
    let _ = tokio::fs::remove_file(&path).await;

    let asset = asset.unwrap();
    assert_eq!(asset.clips.len(), 3);
}

#[tokio::test]
async fn test_load_missing_file() {
    let loader = AssetLoader::new(ProgressReporter::new(), 32, 0.0);
    let result = loader.load("no/such/model.glb").await;
    assert!(matches!(result, Err(LoadError::FileNotFound(_))));
}

/// Source that claims a far larger payload than it delivers.
struct OverstatedStream {
    chunk: Option<Vec<u8>>,
}

#[async_trait]
impl AssetStream for OverstatedStream {
    fn total_len(&self) -> Option<u64> {
        Some(u64::MAX / 2)
    }

    async fn next_chunk(&mut self) -> LoadResult<Option<Vec<u8>>> {
        Ok(self.chunk.take())
    }
}

#[tokio::test]
async fn test_overstated_total_is_not_preallocated() {
    let progress = ProgressReporter::new();
    let rx = progress.subscribe();
    let loader = AssetLoader::new(progress.clone(), 64, 0.0);

    let stream = OverstatedStream {
        chunk: Some(b"not a glb".to_vec()),
    };
    let task = tokio::spawn(async move {
        loader
            .load_stream("overstated", Box::new(stream))
            .await
    });
    let result = task.await.unwrap();

    assert!(matches!(result, Err(LoadError::Decode { .. })));
    let values = collect(&rx);
    assert!(values.windows(2).all(|w| w[0] <= w[1]));
    assert!(values.iter().all(|&v| v < 100.0));
}
