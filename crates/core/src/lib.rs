//! Core utilities for the avatar widget.
//!
//! This crate provides foundational types and utilities used across the widget:
//! - Error types and result aliases
//! - Logging initialization
//! - Fixed-step frame clock
//! - Configuration management
//! - Instance identifiers and the live-instance registry

mod clock;
mod config;
mod error;
mod id;
mod logging;
pub mod registry;

pub use clock::{DEFAULT_FIXED_STEP, FrameClock};
pub use config::{
    AnimationConfig, AssetConfig, AvatarConfig, CameraConfig, ControlsConfig, GroundConfig,
    LightingConfig, ModelConfig, RendererConfig,
};
pub use error::{Error, Result};
pub use id::InstanceId;
pub use logging::init_logging;
pub use registry::{LifecycleCommand, ResourceRegistry};
