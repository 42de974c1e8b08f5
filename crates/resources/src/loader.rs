//! Asynchronous model loading with progress reporting.

use tracing::{debug, info};

use avatar_core::AvatarConfig;

use crate::source::{self, AssetStream};
use crate::{LoadResult, LoadedAsset, ProgressReporter, decode_gltf};

/// Progress reported as soon as a load starts.
pub const INITIAL_PROGRESS: f32 = 5.0;

/// Per-chunk increment when the payload size is unknown.
pub const FALLBACK_STEP: f32 = 1.5;

/// Ceiling for the synthetic progress used when the size is unknown.
pub const FALLBACK_CAP: f32 = 95.0;

/// Upper bound on the buffer reserved up front from a reported payload size.
/// The size comes from the source (an HTTP `Content-Length` for URLs) and is
/// only a hint.
pub const MAX_PREALLOCATION: u64 = 16 * 1024 * 1024;

/// Turns received byte counts into a percentage.
///
/// With a known total the estimate is `loaded / total * 100`. Without one,
/// every chunk advances a synthetic value, starting from zero, by
/// [`FALLBACK_STEP`] up to [`FALLBACK_CAP`].
#[derive(Debug, Clone)]
pub struct ProgressEstimator {
    total: Option<u64>,
    loaded: u64,
    fallback: f32,
}

impl ProgressEstimator {
    pub fn new(total: Option<u64>) -> Self {
        Self {
            total: total.filter(|&t| t > 0),
            loaded: 0,
            fallback: 0.0,
        }
    }

    /// Record `bytes` more received and return the new estimate.
    pub fn advance(&mut self, bytes: usize) -> f32 {
        self.loaded += bytes as u64;
        match self.total {
            Some(total) => (self.loaded as f64 / total as f64 * 100.0) as f32,
            None => {
                self.fallback = (self.fallback + FALLBACK_STEP).min(FALLBACK_CAP);
                self.fallback
            }
        }
    }

    pub fn loaded(&self) -> u64 {
        self.loaded
    }
}

/// Fetches and decodes the avatar payload.
///
/// The loader reports intermediate progress only. Signalling completion is
/// left to whoever hands the result to the scene, so the overlay clears on
/// success and failure alike.
#[derive(Debug, Clone)]
pub struct AssetLoader {
    progress: ProgressReporter,
    chunk_size: usize,
    initial_yaw: f32,
}

impl AssetLoader {
    pub fn new(progress: ProgressReporter, chunk_size: usize, initial_yaw: f32) -> Self {
        Self {
            progress,
            chunk_size: chunk_size.max(1),
            initial_yaw,
        }
    }

    pub fn from_config(progress: ProgressReporter, config: &AvatarConfig) -> Self {
        Self::new(
            progress,
            config.asset.chunk_size,
            config.model.initial_yaw_radians,
        )
    }

    pub fn progress(&self) -> &ProgressReporter {
        &self.progress
    }

    /// Load the payload at `uri`, a local path or an `http(s)` URL.
    pub async fn load(&self, uri: &str) -> LoadResult<LoadedAsset> {
        self.progress.update(INITIAL_PROGRESS);
        let stream = source::open(uri, self.chunk_size).await?;
        self.load_stream(uri, stream).await
    }

    /// Load from an already opened stream. `uri` only labels errors and logs.
    pub async fn load_stream(
        &self,
        uri: &str,
        mut stream: Box<dyn AssetStream>,
    ) -> LoadResult<LoadedAsset> {
        self.progress.update(INITIAL_PROGRESS);

        let total = stream.total_len();
        let mut estimator = ProgressEstimator::new(total);
        let capacity = total.map_or(0, |t| t.min(MAX_PREALLOCATION)) as usize;
        let mut bytes = Vec::with_capacity(capacity);

        while let Some(chunk) = stream.next_chunk().await? {
            let percent = estimator.advance(chunk.len());
            bytes.extend_from_slice(&chunk);
            self.progress.update(percent);
            tokio::task::yield_now().await;
        }
        debug!("Received {} bytes from '{}'", estimator.loaded(), uri);

        let mut asset = decode_gltf(uri, &bytes)?;
        asset.model.prepare_for_scene(self.initial_yaw);

        info!(
            "Model ready: '{}' ({} meshes, {} clips)",
            uri,
            asset.model.mesh_count(),
            asset.clips.len()
        );
        Ok(asset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_total_estimate() {
        let mut estimator = ProgressEstimator::new(Some(200));
        assert_eq!(estimator.advance(50), 25.0);
        assert_eq!(estimator.advance(150), 100.0);
        assert_eq!(estimator.loaded(), 200);
    }

    #[test]
    fn test_fallback_estimate_is_capped() {
        let mut estimator = ProgressEstimator::new(None);
        assert_eq!(estimator.advance(10), FALLBACK_STEP);
        let last = (0..200).map(|_| estimator.advance(10)).last().unwrap();
        assert_eq!(last, FALLBACK_CAP);
    }

    #[test]
    fn test_oversized_total_is_only_a_hint() {
        let mut estimator = ProgressEstimator::new(Some(u64::MAX / 2));
        assert!(estimator.advance(9) < 1.0);
    }

    #[test]
    fn test_zero_total_uses_fallback() {
        let mut estimator = ProgressEstimator::new(Some(0));
        assert_eq!(estimator.advance(1), FALLBACK_STEP);
    }
}
