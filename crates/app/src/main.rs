//! Avatar viewer - hosts one avatar widget in a desktop window.
//!
//! Keys: `1`-`9` play the clip registered at that position, `Space` plays
//! every non-idle clip in sequence, `V` toggles visibility, `Escape` quits.
//! Drag with the left button to orbit, click the model to poke it.

use std::path::Path;

use anyhow::{Context, Result};
use tracing::{debug, info, warn};
use winit::application::ApplicationHandler;
use winit::event::{ElementState, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::WindowId;

use avatar_core::AvatarConfig;
use avatar_platform::{MouseButton, PointerState, Window};
use avatar_renderer::{AvatarEvent, AvatarServices, AvatarWidget, HeadlessBackend, SurfaceInfo};

const CONFIG_PATH: &str = "avatar.toml";

struct App {
    config: AvatarConfig,
    services: AvatarServices,
    runtime: tokio::runtime::Runtime,
    window: Option<Window>,
    widget: Option<AvatarWidget>,
    events: Option<crossbeam_channel::Receiver<AvatarEvent>>,
    progress: crossbeam_channel::Receiver<f32>,
    pointer: PointerState,
    visible: bool,
}

impl App {
    fn new(config: AvatarConfig) -> Result<Self> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .enable_all()
            .build()
            .context("failed to start the loader runtime")?;
        let services = AvatarServices::new();
        let progress = services.progress.subscribe();

        Ok(Self {
            config,
            services,
            runtime,
            window: None,
            widget: None,
            events: None,
            progress,
            pointer: PointerState::new(),
            visible: true,
        })
    }

    fn surface_info(window: &Window) -> SurfaceInfo {
        let scale = window.scale_factor();
        SurfaceInfo::new(
            (window.width() as f32 / scale).round() as u32,
            (window.height() as f32 / scale).round() as u32,
            scale,
        )
    }

    /// Cursor position in logical pixels.
    fn logical(&self, (x, y): (f32, f32)) -> (f32, f32) {
        let scale = self.window.as_ref().map_or(1.0, Window::scale_factor);
        (x / scale, y / scale)
    }

    fn on_key(&mut self, key: KeyCode, event_loop: &ActiveEventLoop) {
        let Some(widget) = self.widget.as_mut() else {
            return;
        };
        let requests = widget.animation_requests();

        match key {
            KeyCode::Escape => {
                info!("Escape pressed, shutting down");
                event_loop.exit();
            }
            KeyCode::KeyV => {
                self.visible = !self.visible;
                widget.set_visible(self.visible);
                info!("Avatar {}", if self.visible { "shown" } else { "hidden" });
            }
            KeyCode::Space => {
                let default = widget.engine().default_clip();
                let sequence: Vec<String> = widget
                    .engine()
                    .clips()
                    .names()
                    .filter(|name| Some(*name) != default)
                    .map(str::to_owned)
                    .collect();
                info!("Requesting sequence {:?}", sequence);
                requests.request(sequence);
            }
            _ => {
                if let Some(index) = digit_index(key)
                    && let Some(name) = widget.engine().clips().name_at(index)
                {
                    info!("Requesting clip '{}'", name);
                    requests.play(name);
                }
            }
        }
    }

    fn drain_outbound(&mut self) {
        if let Some(events) = &self.events {
            for event in events.try_iter() {
                match event {
                    AvatarEvent::Clicked => info!("Avatar clicked"),
                }
            }
        }
        for value in self.progress.try_iter() {
            debug!("Load progress: {:.0}%", value);
            if let Some(window) = &self.window {
                if value >= 100.0 {
                    window.set_title("Avatar Viewer");
                } else {
                    window.set_title(&format!("Avatar Viewer - loading {:.0}%", value));
                }
            }
        }
    }
}

fn digit_index(key: KeyCode) -> Option<usize> {
    let digits = [
        KeyCode::Digit1,
        KeyCode::Digit2,
        KeyCode::Digit3,
        KeyCode::Digit4,
        KeyCode::Digit5,
        KeyCode::Digit6,
        KeyCode::Digit7,
        KeyCode::Digit8,
        KeyCode::Digit9,
    ];
    digits.iter().position(|&digit| digit == key)
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }
        let window = match Window::new(event_loop, 800, 800, "Avatar Viewer") {
            Ok(window) => window,
            Err(e) => {
                tracing::error!("Failed to create window: {}", e);
                event_loop.exit();
                return;
            }
        };

        let mut widget = AvatarWidget::attach(
            Self::surface_info(&window),
            Box::new(HeadlessBackend::new()),
            self.config.clone(),
            self.services.clone(),
        );
        widget.spawn_load(self.runtime.handle());

        info!("Initialization complete, entering main loop");
        self.events = Some(widget.events());
        self.widget = Some(widget);
        self.window = Some(window);
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => {
                info!("Close requested, shutting down");
                event_loop.exit();
            }
            WindowEvent::Resized(size) => {
                if let Some(window) = self.window.as_mut() {
                    window.resize(size.width, size.height);
                    let surface = Self::surface_info(window);
                    if let Some(widget) = self.widget.as_mut() {
                        widget.resize(surface.width, surface.height);
                    }
                }
            }
            WindowEvent::ScaleFactorChanged { scale_factor, .. } => {
                if let Some(widget) = self.widget.as_mut() {
                    widget.set_device_pixel_ratio(scale_factor as f32);
                }
            }
            WindowEvent::RedrawRequested => {
                if let Some(widget) = self.widget.as_mut() {
                    widget.on_animation_frame();
                }
            }
            WindowEvent::KeyboardInput { event, .. } => {
                if event.state == ElementState::Pressed
                    && !event.repeat
                    && let PhysicalKey::Code(key) = event.physical_key
                {
                    self.on_key(key, event_loop);
                }
            }
            WindowEvent::CursorMoved { position, .. } => {
                let dragging = self.pointer.is_pressed(MouseButton::Left);
                let delta = self
                    .pointer
                    .on_mouse_moved(position.x as f32, position.y as f32);
                if dragging {
                    let (dx, dy) = self.logical(delta);
                    if let Some(widget) = self.widget.as_mut() {
                        widget.drag(dx, dy);
                    }
                }
            }
            WindowEvent::MouseInput { state, button, .. } => {
                let button = MouseButton::from(button);
                match state {
                    ElementState::Pressed => self.pointer.on_mouse_pressed(button),
                    ElementState::Released => {
                        if let Some(position) = self.pointer.on_mouse_released(button) {
                            let (x, y) = self.logical(position);
                            if let Some(widget) = self.widget.as_mut() {
                                widget.click(x, y);
                            }
                        }
                    }
                }
            }
            WindowEvent::Focused(false) => self.pointer.clear_buttons(),
            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(widget) = self.widget.as_mut() {
            if widget.is_visible() {
                if let Some(window) = &self.window {
                    window.request_redraw();
                }
            } else {
                // No frames while hidden; keep applying loads and requests.
                widget.pump();
            }
        }
        self.drain_outbound();
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(mut widget) = self.widget.take() {
            widget.dispose();
        }
        self.services.registry.log_live_instances();
    }
}

fn load_config() -> Result<AvatarConfig> {
    let path = Path::new(CONFIG_PATH);
    let config = if path.exists() {
        AvatarConfig::load(path)?
    } else {
        warn!("{} not found, using defaults", CONFIG_PATH);
        AvatarConfig::default()
    };
    config.validate()?;
    Ok(config)
}

fn main() -> Result<()> {
    avatar_core::init_logging();
    info!("Starting Avatar Viewer");

    let config = load_config().context("invalid configuration")?;

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App::new(config)?;
    event_loop.run_app(&mut app)?;

    Ok(())
}
