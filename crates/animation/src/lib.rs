//! Clip playback for the avatar.
//!
//! This crate provides:
//! - Actions: per-clip playback state with loop modes and weight fades
//! - A mixer that advances actions and reports completions over a channel
//! - The clip registry and the animation engine state machine
//! - The process-wide greeting latch

pub mod action;
pub mod engine;
mod error;
pub mod greeting;
pub mod mixer;
pub mod registry;

pub use action::{ActionId, AnimationAction, LoopMode};
pub use engine::{AnimationEngine, EngineState};
pub use error::{AnimationError, AnimationResult};
pub use greeting::GreetingLatch;
pub use mixer::AnimationMixer;
pub use registry::ClipRegistry;
