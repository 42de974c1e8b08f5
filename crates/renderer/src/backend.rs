//! Render backend seam.
//!
//! The scene manager describes each frame as a [`FramePacket`] and hands it
//! to a [`RenderBackend`]. GPU resources are uploaded per model and released
//! one by one at disposal, so a backend can account for every geometry and
//! material it holds.

use std::collections::BTreeSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use glam::Mat4;
use tracing::{debug, info, trace};

use avatar_resources::{GpuResource, ModelHandle};
use avatar_scene::{GeometryId, GroundPlane, LightUniform, MaterialId, NodeKind};

use crate::{CameraUniform, ObjectUniform};

/// One mesh draw.
#[derive(Clone, Debug, PartialEq)]
pub struct DrawItem {
    pub geometry: GeometryId,
    pub materials: Vec<MaterialId>,
    pub object: ObjectUniform,
    pub cast_shadow: bool,
    pub receive_shadow: bool,
}

/// Everything a backend needs to draw one frame.
#[derive(Clone, Debug)]
pub struct FramePacket {
    pub camera: CameraUniform,
    pub lights: LightUniform,
    pub ground: GroundPlane,
    pub draws: Vec<DrawItem>,
}

impl FramePacket {
    /// Collect draws for every mesh under `root`, with world matrices.
    pub fn collect_draws(root: &avatar_scene::SceneNode) -> Vec<DrawItem> {
        let mut draws = Vec::new();
        root.visit(&Mat4::IDENTITY, &mut |node, world| {
            if let NodeKind::Mesh(mesh) = &node.kind {
                draws.push(DrawItem {
                    geometry: mesh.geometry.id,
                    materials: mesh.materials.clone(),
                    object: ObjectUniform::new(*world),
                    cast_shadow: mesh.cast_shadow,
                    receive_shadow: mesh.receive_shadow,
                });
            }
        });
        draws
    }
}

/// A GPU (or GPU-less) renderer driven by the scene manager.
pub trait RenderBackend {
    /// Resize the drawing surface, in physical pixels.
    fn resize(&mut self, width: u32, height: u32);

    /// Make the model's geometries and materials resident.
    fn upload_model(&mut self, model: &ModelHandle);

    /// Free one resident resource.
    fn release(&mut self, resource: GpuResource);

    fn render(&mut self, frame: &FramePacket);

    /// Tear down the backend. Called once, after every resource has been
    /// released.
    fn dispose(&mut self);
}

/// Counters kept by [`HeadlessBackend`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BackendStats {
    pub frames_rendered: u64,
    pub width: u32,
    pub height: u32,
    pub resident: BTreeSet<GpuResource>,
    pub releases: u64,
    pub last_draw_count: usize,
    pub last_view_projection: Option<Mat4>,
    pub disposed: bool,
}

/// Shared view of a headless backend's counters. Stays readable after the
/// backend itself has been moved into a scene.
#[derive(Clone, Debug, Default)]
pub struct HeadlessStats {
    inner: Arc<Mutex<BackendStats>>,
}

impl HeadlessStats {
    fn lock(&self) -> MutexGuard<'_, BackendStats> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn snapshot(&self) -> BackendStats {
        self.lock().clone()
    }

    pub fn frames_rendered(&self) -> u64 {
        self.lock().frames_rendered
    }

    pub fn resident_count(&self) -> usize {
        self.lock().resident.len()
    }

    pub fn size(&self) -> (u32, u32) {
        let stats = self.lock();
        (stats.width, stats.height)
    }

    pub fn is_disposed(&self) -> bool {
        self.lock().disposed
    }
}

/// Backend that draws nothing and records what it was asked to do.
#[derive(Debug, Default)]
pub struct HeadlessBackend {
    stats: HeadlessStats,
}

impl HeadlessBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stats(&self) -> HeadlessStats {
        self.stats.clone()
    }
}

impl RenderBackend for HeadlessBackend {
    fn resize(&mut self, width: u32, height: u32) {
        let mut stats = self.stats.lock();
        stats.width = width;
        stats.height = height;
        debug!("Headless surface resized: {}x{}", width, height);
    }

    fn upload_model(&mut self, model: &ModelHandle) {
        let resources = model.gpu_resources();
        debug!("Uploading {} GPU resources", resources.len());
        self.stats.lock().resident.extend(resources);
    }

    fn release(&mut self, resource: GpuResource) {
        let mut stats = self.stats.lock();
        if stats.resident.remove(&resource) {
            stats.releases += 1;
        } else {
            debug!("Release of non-resident {:?}", resource);
        }
    }

    fn render(&mut self, frame: &FramePacket) {
        let mut stats = self.stats.lock();
        stats.frames_rendered += 1;
        stats.last_draw_count = frame.draws.len();
        stats.last_view_projection = Some(frame.camera.view_projection);
        trace!(
            "Frame {}: {} draws",
            stats.frames_rendered,
            frame.draws.len()
        );
    }

    fn dispose(&mut self) {
        let mut stats = self.stats.lock();
        stats.disposed = true;
        info!(
            "Headless backend disposed after {} frames ({} resources still resident)",
            stats.frames_rendered,
            stats.resident.len()
        );
    }
}
