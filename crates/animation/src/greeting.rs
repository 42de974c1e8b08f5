//! Process-wide "greeting already played" state.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Shared flag recording whether any engine has played the greeting clip.
///
/// Create one at application startup and hand clones to every engine. The
/// first engine to [`try_claim`](Self::try_claim) it plays the greeting;
/// the rest go straight to their idle clip. [`reset`](Self::reset) re-arms
/// it, which is only meant for tests and full application restarts.
#[derive(Clone, Debug, Default)]
pub struct GreetingLatch {
    played: Arc<AtomicBool>,
}

impl GreetingLatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark the greeting as played. Returns `true` only for the first caller.
    pub fn try_claim(&self) -> bool {
        self.played
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    pub fn has_played(&self) -> bool {
        self.played.load(Ordering::Acquire)
    }

    pub fn reset(&self) {
        self.played.store(false, Ordering::Release);
    }
}
