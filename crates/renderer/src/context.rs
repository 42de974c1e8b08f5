//! Scene/viewport manager.
//!
//! A [`SceneContext`] owns everything one visible avatar needs to draw: the
//! render backend, camera, rotation-only orbit controls, light rig, ground
//! plane, the attached model, and the frame-callback scheduling. It is
//! created on attach and torn down by [`SceneContext::dispose`].

use tracing::{debug, info, trace};

use avatar_core::{AvatarConfig, FrameClock};
use avatar_resources::ModelHandle;
use avatar_scene::{Camera, GroundPlane, LightRig, OrbitController, SceneNode, ViewportRect};

use crate::backend::{FramePacket, RenderBackend};
use crate::{CameraUniform, RenderLoop};

/// Size of the host surface in logical (CSS-like) pixels plus the display's
/// device pixel ratio.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SurfaceInfo {
    pub width: u32,
    pub height: u32,
    pub device_pixel_ratio: f32,
}

impl SurfaceInfo {
    pub fn new(width: u32, height: u32, device_pixel_ratio: f32) -> Self {
        Self {
            width,
            height,
            device_pixel_ratio,
        }
    }

    fn aspect(&self) -> f32 {
        if self.height == 0 {
            1.0
        } else {
            self.width as f32 / self.height as f32
        }
    }
}

pub struct SceneContext {
    backend: Box<dyn RenderBackend>,
    camera: Camera,
    controls: OrbitController,
    lights: LightRig,
    ground: GroundPlane,
    model: Option<ModelHandle>,
    render_loop: RenderLoop,
    clock: FrameClock,
    surface: SurfaceInfo,
    max_pixel_ratio: f32,
    visible: bool,
    disposed: bool,
}

impl SceneContext {
    /// Build the camera rig, lights, and ground for `surface` and start the
    /// frame loop.
    pub fn attach(
        surface: SurfaceInfo,
        backend: Box<dyn RenderBackend>,
        config: &AvatarConfig,
    ) -> Self {
        let camera = Camera::from_config(&config.camera, surface.aspect());
        let controls = OrbitController::new(&camera, &config.controls);

        let mut context = Self {
            backend,
            camera,
            controls,
            lights: LightRig::from_config(&config.lighting),
            ground: GroundPlane::from_config(&config.ground),
            model: None,
            render_loop: RenderLoop::new(),
            clock: FrameClock::new(config.animation.fixed_step),
            surface,
            max_pixel_ratio: config.renderer.max_pixel_ratio,
            visible: true,
            disposed: false,
        };

        let (width, height) = context.physical_size();
        context.backend.resize(width, height);
        context.render_loop.schedule();

        info!(
            "Scene attached: {}x{} @{}x",
            surface.width,
            surface.height,
            context.pixel_ratio()
        );
        context
    }

    /// Device pixel ratio, capped.
    pub fn pixel_ratio(&self) -> f32 {
        let ratio = self.surface.device_pixel_ratio.min(self.max_pixel_ratio);
        if ratio.is_finite() && ratio > 0.0 {
            ratio
        } else {
            1.0
        }
    }

    /// Backend size in physical pixels.
    pub fn physical_size(&self) -> (u32, u32) {
        let ratio = self.pixel_ratio();
        (
            (self.surface.width as f32 * ratio).round() as u32,
            (self.surface.height as f32 * ratio).round() as u32,
        )
    }

    /// Follow a host layout change. Zero-sized layouts (collapsed or
    /// minimized hosts) are ignored.
    pub fn resize(&mut self, width: u32, height: u32) {
        if self.disposed || width == 0 || height == 0 {
            return;
        }
        self.surface.width = width;
        self.surface.height = height;
        self.camera.set_aspect(self.surface.aspect());

        let (physical_width, physical_height) = self.physical_size();
        self.backend.resize(physical_width, physical_height);
        debug!("Scene resized: {}x{}", width, height);
    }

    pub fn set_device_pixel_ratio(&mut self, ratio: f32) {
        if self.disposed || !ratio.is_finite() || ratio <= 0.0 {
            return;
        }
        self.surface.device_pixel_ratio = ratio;
        let (width, height) = self.physical_size();
        self.backend.resize(width, height);
    }

    /// Pause or resume the frame loop. While hidden no frames are scheduled.
    pub fn set_visible(&mut self, visible: bool) {
        if self.disposed || self.visible == visible {
            return;
        }
        self.visible = visible;
        if visible {
            self.render_loop.schedule();
        } else {
            self.render_loop.cancel();
        }
        debug!("Scene visibility: {}", visible);
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Whether a frame is pending.
    pub fn is_running(&self) -> bool {
        self.render_loop.is_scheduled()
    }

    /// Add the model to the scene, replacing (and disposing) any previous
    /// one. A disposed scene refuses the model and hands it back.
    pub fn attach_model(&mut self, model: ModelHandle) -> Result<(), ModelHandle> {
        if self.disposed {
            return Err(model);
        }
        if let Some(previous) = self.model.take() {
            let backend = &mut self.backend;
            previous.dispose(|resource| backend.release(resource));
        }
        self.backend.upload_model(&model);
        self.model = Some(model);
        info!("Model attached to scene");
        Ok(())
    }

    pub fn model(&self) -> Option<&ModelHandle> {
        self.model.as_ref()
    }

    pub fn model_root(&self) -> Option<&SceneNode> {
        self.model.as_ref().map(ModelHandle::root)
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn controls(&self) -> &OrbitController {
        &self.controls
    }

    pub fn lights(&self) -> &LightRig {
        &self.lights
    }

    pub fn ground(&self) -> &GroundPlane {
        &self.ground
    }

    /// The surface as a pointer-space rectangle at the origin.
    pub fn viewport_rect(&self) -> ViewportRect {
        ViewportRect::from_size(self.surface.width as f32, self.surface.height as f32)
    }

    /// Feed an orbit drag in logical pixels.
    pub fn rotate(&mut self, dx: f32, dy: f32) {
        if self.disposed {
            return;
        }
        self.controls.rotate(dx, dy, self.surface.height as f32);
    }

    /// Run one frame if one is pending.
    ///
    /// The tick reschedules itself first (while visible), then updates the
    /// control damping, advances animation through `step` by the fixed
    /// step, and renders once. Returns `false` without touching anything
    /// when no frame was pending or the scene is disposed.
    pub fn tick(&mut self, step: impl FnOnce(f32)) -> bool {
        if self.disposed {
            return false;
        }
        let Some(request) = self.render_loop.fire() else {
            return false;
        };
        if self.visible {
            self.render_loop.schedule();
        }

        self.controls.update(&mut self.camera);
        step(self.clock.tick());
        self.render();

        trace!("Frame {:?} done", request);
        true
    }

    fn render(&mut self) {
        let draws = self
            .model
            .as_ref()
            .map(|model| FramePacket::collect_draws(model.root()))
            .unwrap_or_default();

        let frame = FramePacket {
            camera: CameraUniform::from_camera(&self.camera),
            lights: self.lights.uniform(),
            ground: self.ground,
            draws,
        };
        self.backend.render(&frame);
    }

    /// Frames run since attach.
    pub fn frames(&self) -> u64 {
        self.clock.frames()
    }

    /// Stop the loop, dispose the controls, release every model resource,
    /// and tear down the backend. Later calls do nothing.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.disposed = true;
        self.visible = false;
        self.render_loop.cancel();
        self.controls.dispose();

        let released = match self.model.take() {
            Some(model) => {
                let backend = &mut self.backend;
                model.dispose(|resource| backend.release(resource))
            }
            None => 0,
        };
        self.backend.dispose();

        info!("Scene disposed ({} GPU resources released)", released);
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }
}

impl Drop for SceneContext {
    fn drop(&mut self) {
        self.dispose();
    }
}
