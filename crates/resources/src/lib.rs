//! Resource loading and management.
//!
//! This crate handles the avatar model payload:
//! - Streaming the payload from a file or URL
//! - glTF decoding into a typed scene graph plus animation clips
//! - Load progress reporting
//! - Material definitions and GPU resource bookkeeping

mod decode;
mod error;
pub mod loader;
pub mod material;
pub mod model;
pub mod progress;
pub mod source;

pub use decode::decode_gltf;
pub use error::{LoadError, LoadResult};
pub use loader::{AssetLoader, ProgressEstimator};
pub use material::Material;
pub use model::{AnimationClip, GpuResource, LoadedAsset, ModelHandle};
pub use progress::ProgressReporter;
pub use source::{AssetStream, MemoryStream};
