//! Platform layer for the avatar viewer.
//!
//! This crate provides:
//! - Window management via winit
//! - Pointer tracking with click versus drag detection

mod input;
mod window;

pub use input::{CLICK_DRAG_THRESHOLD, KeyCode, MouseButton, PointerState};
pub use window::Window;

// Re-export winit types that users might need
pub use winit::event::{ElementState, KeyEvent, WindowEvent};
pub use winit::event_loop::{ActiveEventLoop, EventLoop};
pub use winit::keyboard::PhysicalKey;
