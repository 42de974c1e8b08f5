//! The avatar widget: scene, loader, animation engine, and picker wired
//! together behind message channels.
//!
//! Everything runs on the host's UI thread except the asset load, which
//! runs as a tokio task and reports back through a [`LoadCompletion`]. The
//! widget applies inbound messages in [`AvatarWidget::pump`], which the
//! frame callback calls before each tick, so a finished load is attached
//! between frames and never halfway through one.

use crossbeam_channel::{Receiver, Sender, unbounded};
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, trace, warn};

use avatar_animation::{AnimationEngine, GreetingLatch};
use avatar_core::{AvatarConfig, InstanceId, LifecycleCommand, ResourceRegistry};
use avatar_resources::{AssetLoader, AssetStream, LoadResult, LoadedAsset, ProgressReporter};
use avatar_scene::{InteractionPicker, ViewportRect};

use crate::backend::RenderBackend;
use crate::context::{SceneContext, SurfaceInfo};

/// Process-wide collaborators shared by every widget.
///
/// `progress` backs a single loading overlay. Widgets that load at the same
/// time share one cycle: a new load resets it and the first load to finish
/// latches it at 100. Give each widget its own `AvatarServices::progress`
/// when overlays must be tracked separately.
#[derive(Clone, Default)]
pub struct AvatarServices {
    pub registry: ResourceRegistry,
    pub greeting: GreetingLatch,
    pub progress: ProgressReporter,
}

impl AvatarServices {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Notifications the widget sends to its host.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AvatarEvent {
    /// A pointer click landed on the model.
    Clicked,
}

/// Sending half of a widget's animation request channel.
#[derive(Clone, Debug)]
pub struct AnimationRequests {
    tx: Sender<Vec<String>>,
}

impl AnimationRequests {
    /// Request one clip (play) or several (sequence). Empty requests are
    /// dropped here. Returns whether the request was queued.
    pub fn request<I, S>(&self, names: I) -> bool
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let names: Vec<String> = names.into_iter().map(Into::into).collect();
        if names.is_empty() {
            debug!("Dropping empty animation request");
            return false;
        }
        self.tx.send(names).is_ok()
    }

    pub fn play(&self, name: impl Into<String>) -> bool {
        self.request([name.into()])
    }
}

struct LoadMessage {
    generation: u64,
    result: LoadResult<LoadedAsset>,
}

/// One-shot handle a load task uses to hand its result back to the widget.
pub struct LoadCompletion {
    generation: u64,
    tx: Sender<LoadMessage>,
}

impl LoadCompletion {
    /// Deliver the load result. If the widget is gone the result is dropped.
    pub fn deliver(self, result: LoadResult<LoadedAsset>) {
        let message = LoadMessage {
            generation: self.generation,
            result,
        };
        if self.tx.send(message).is_err() {
            trace!("Load result arrived after the widget was dropped");
        }
    }
}

pub struct AvatarWidget {
    id: InstanceId,
    config: AvatarConfig,
    services: AvatarServices,
    scene: SceneContext,
    engine: AnimationEngine,
    picker: InteractionPicker,
    lifecycle_rx: Receiver<LifecycleCommand>,
    request_tx: Sender<Vec<String>>,
    request_rx: Receiver<Vec<String>>,
    event_tx: Sender<AvatarEvent>,
    event_rx: Receiver<AvatarEvent>,
    load_tx: Sender<LoadMessage>,
    load_rx: Receiver<LoadMessage>,
    load_generation: u64,
    load_in_flight: bool,
    load_task: Option<JoinHandle<()>>,
    disposed: bool,
}

impl AvatarWidget {
    /// Create the scene on `surface` and register the instance.
    pub fn attach(
        surface: SurfaceInfo,
        backend: Box<dyn RenderBackend>,
        config: AvatarConfig,
        services: AvatarServices,
    ) -> Self {
        let id = InstanceId::new();
        let (lifecycle_tx, lifecycle_rx) = unbounded();
        services.registry.register(id.clone(), lifecycle_tx);

        let scene = SceneContext::attach(surface, backend, &config);
        let engine = AnimationEngine::new(config.animation.clone(), services.greeting.clone());
        let (request_tx, request_rx) = unbounded();
        let (event_tx, event_rx) = unbounded();
        let (load_tx, load_rx) = unbounded();

        info!("Avatar {} attached", id);
        Self {
            id,
            config,
            services,
            scene,
            engine,
            picker: InteractionPicker::new(),
            lifecycle_rx,
            request_tx,
            request_rx,
            event_tx,
            event_rx,
            load_tx,
            load_rx,
            load_generation: 0,
            load_in_flight: false,
            load_task: None,
            disposed: false,
        }
    }

    pub fn id(&self) -> &InstanceId {
        &self.id
    }

    pub fn config(&self) -> &AvatarConfig {
        &self.config
    }

    pub fn animation_requests(&self) -> AnimationRequests {
        AnimationRequests {
            tx: self.request_tx.clone(),
        }
    }

    /// Receiver for outbound [`AvatarEvent`]s.
    pub fn events(&self) -> Receiver<AvatarEvent> {
        self.event_rx.clone()
    }

    pub fn progress(&self) -> &ProgressReporter {
        &self.services.progress
    }

    pub fn scene(&self) -> &SceneContext {
        &self.scene
    }

    pub fn engine(&self) -> &AnimationEngine {
        &self.engine
    }

    pub fn is_loading(&self) -> bool {
        self.load_in_flight
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// Start a new load cycle and return the handle its result must be
    /// delivered through. Any earlier cycle's result will be ignored.
    pub fn begin_load(&mut self) -> LoadCompletion {
        self.load_generation += 1;
        self.load_in_flight = !self.disposed;
        if let Some(task) = self.load_task.take() {
            task.abort();
        }
        self.services.progress.reset();
        LoadCompletion {
            generation: self.load_generation,
            tx: self.load_tx.clone(),
        }
    }

    /// Load the configured asset on `runtime`.
    pub fn spawn_load(&mut self, runtime: &Handle) {
        let completion = self.begin_load();
        let loader = AssetLoader::from_config(self.services.progress.clone(), &self.config);
        let uri = self.config.asset.uri.clone();
        info!("Loading avatar model from '{}'", uri);

        self.load_task = Some(runtime.spawn(async move {
            let result = loader.load(&uri).await;
            completion.deliver(result);
        }));
    }

    /// Load from an already opened stream on `runtime`, for hosts that
    /// fetch or embed the payload themselves.
    pub fn spawn_load_from(&mut self, runtime: &Handle, stream: Box<dyn AssetStream>) {
        let completion = self.begin_load();
        let loader = AssetLoader::from_config(self.services.progress.clone(), &self.config);
        let label = self.config.asset.uri.clone();
        info!("Loading avatar model from a host stream");

        self.load_task = Some(runtime.spawn(async move {
            let result = loader.load_stream(&label, stream).await;
            completion.deliver(result);
        }));
    }

    /// Apply pending lifecycle commands, load results, and animation
    /// requests, in that order.
    pub fn pump(&mut self) {
        let commands: Vec<LifecycleCommand> = self.lifecycle_rx.try_iter().collect();
        for command in commands {
            match command {
                LifecycleCommand::ForceCleanup => self.force_cleanup(),
            }
        }

        while let Ok(message) = self.load_rx.try_recv() {
            self.finish_load(message);
        }
        self.reap_load_task();

        let requests: Vec<Vec<String>> = self.request_rx.try_iter().collect();
        if self.disposed {
            return;
        }
        for names in requests {
            if let Err(e) = self.engine.request(&names) {
                warn!("Animation request {:?} ignored: {}", names, e);
            }
        }
    }

    /// Close the cycle of a load task that ended without delivering a
    /// result (it panicked or was cancelled by the runtime).
    fn reap_load_task(&mut self) {
        if !self.load_in_flight
            || !self
                .load_task
                .as_ref()
                .is_some_and(|task| task.is_finished())
        {
            return;
        }
        // The task sends before it finishes, so anything it delivered is
        // queued by now.
        while let Ok(message) = self.load_rx.try_recv() {
            self.finish_load(message);
        }
        if self.load_in_flight {
            error!("Avatar {} load task ended without a result", self.id);
            self.load_in_flight = false;
            self.load_task = None;
            self.services.progress.complete();
        }
    }

    fn finish_load(&mut self, message: LoadMessage) {
        if self.disposed || !self.load_in_flight || message.generation != self.load_generation {
            trace!(
                "Discarding load result of cycle {} (current {}, disposed: {})",
                message.generation, self.load_generation, self.disposed
            );
            return;
        }
        self.load_in_flight = false;
        self.load_task = None;

        match message.result {
            Ok(LoadedAsset { model, clips }) => {
                if self.scene.attach_model(model).is_ok() {
                    self.engine.register_clips(&clips);
                }
            }
            Err(e) => error!("Failed to load avatar model: {}", e),
        }
        self.services.progress.complete();
    }

    /// Frame callback: drain inbound messages, then run one tick. Returns
    /// whether a frame was rendered.
    pub fn on_animation_frame(&mut self) -> bool {
        self.pump();
        if self.disposed {
            return false;
        }
        let engine = &mut self.engine;
        self.scene.tick(|dt| engine.advance(dt))
    }

    pub fn set_visible(&mut self, visible: bool) {
        self.scene.set_visible(visible);
    }

    pub fn is_visible(&self) -> bool {
        self.scene.is_visible()
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.scene.resize(width, height);
    }

    pub fn set_device_pixel_ratio(&mut self, ratio: f32) {
        self.scene.set_device_pixel_ratio(ratio);
    }

    /// Orbit drag in surface pixels.
    pub fn drag(&mut self, dx: f32, dy: f32) {
        self.scene.rotate(dx, dy);
    }

    /// Hit-test a click at surface coordinates (`x`, `y`). Emits
    /// [`AvatarEvent::Clicked`] on a hit.
    pub fn click(&mut self, x: f32, y: f32) -> bool {
        let viewport = self.scene.viewport_rect();
        self.click_in(x, y, &viewport)
    }

    /// Like [`click`](Self::click) with an explicit viewport rectangle, for
    /// hosts that report pointer positions in page coordinates.
    pub fn click_in(&mut self, x: f32, y: f32, viewport: &ViewportRect) -> bool {
        if self.disposed {
            return false;
        }
        let Some(root) = self.scene.model_root() else {
            return false;
        };
        let hit = self
            .picker
            .hit_test(x, y, viewport, self.scene.camera(), root);
        if hit {
            debug!("Avatar {} clicked", self.id);
            // The receiver lives as long as `self`.
            let _ = self.event_tx.send(AvatarEvent::Clicked);
        }
        hit
    }

    /// Out-of-band cleanup: stop the loop at once, then dispose fully.
    pub fn force_cleanup(&mut self) {
        if self.disposed {
            return;
        }
        warn!("Forced cleanup of avatar {}", self.id);
        self.scene.set_visible(false);
        self.dispose();
    }

    /// Tear everything down: registry entry, in-flight load, animation,
    /// scene, picker scratch. Later calls do nothing.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.disposed = true;
        self.services.registry.unregister(&self.id);

        if let Some(task) = self.load_task.take() {
            task.abort();
        }
        if self.load_in_flight {
            self.load_in_flight = false;
            self.services.progress.complete();
        }

        self.engine.dispose();
        self.scene.dispose();
        self.picker.reset();
        self.request_rx.try_iter().for_each(drop);

        info!("Avatar {} disposed", self.id);
    }
}

impl Drop for AvatarWidget {
    fn drop(&mut self) {
        self.dispose();
    }
}
