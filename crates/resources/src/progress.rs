//! Load progress channel for an external overlay.
//!
//! The reported percentage never goes backwards and stays at or below 99
//! until [`ProgressReporter::complete`] latches it at 100 for the current
//! cycle. [`ProgressReporter::reset`] opens a new cycle at 0.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crossbeam_channel::{Receiver, Sender, unbounded};
use tracing::trace;

/// Highest value reachable through [`ProgressReporter::update`].
pub const MAX_PENDING_PROGRESS: f32 = 99.0;
/// The latched completion value.
pub const COMPLETE_PROGRESS: f32 = 100.0;

#[derive(Debug, Default)]
struct ProgressState {
    value: f32,
    done: bool,
    subscribers: Vec<Sender<f32>>,
}

impl ProgressState {
    fn emit(&mut self, value: f32) {
        self.value = value;
        self.subscribers.retain(|tx| tx.send(value).is_ok());
    }
}

/// Shared, monotonic progress value. Cloning shares the value.
#[derive(Clone, Debug, Default)]
pub struct ProgressReporter {
    state: Arc<Mutex<ProgressState>>,
}

impl ProgressReporter {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, ProgressState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Receive every value pushed from now on, starting with the current one.
    pub fn subscribe(&self) -> Receiver<f32> {
        let (tx, rx) = unbounded();
        let mut state = self.state();
        // A fresh receiver is connected, so this cannot fail.
        let _ = tx.send(state.value);
        state.subscribers.push(tx);
        rx
    }

    /// Report a new percentage. Clamped to `[current, 99]`; ignored once the
    /// cycle has completed or for NaN input.
    pub fn update(&self, percent: f32) {
        let mut state = self.state();
        if state.done || percent.is_nan() {
            return;
        }
        let clamped = percent.max(state.value).min(MAX_PENDING_PROGRESS);
        trace!("Load progress {:.1}%", clamped);
        state.emit(clamped);
    }

    /// Latch 100 for this cycle. Only the first call per cycle emits.
    pub fn complete(&self) {
        let mut state = self.state();
        if state.done {
            return;
        }
        state.done = true;
        state.emit(COMPLETE_PROGRESS);
    }

    /// Start a new cycle at 0.
    pub fn reset(&self) {
        let mut state = self.state();
        state.done = false;
        state.emit(0.0);
    }

    /// Current value.
    pub fn value(&self) -> f32 {
        self.state().value
    }

    /// Whether the current cycle has completed.
    pub fn has_completed(&self) -> bool {
        self.state().done
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_monotonic_and_capped() {
        let progress = ProgressReporter::new();
        let rx = progress.subscribe();

        for p in [10.0, 5.0, 50.0, 120.0, 30.0, f32::NAN, 99.5] {
            progress.update(p);
        }

        let values: Vec<f32> = rx.try_iter().collect();
        assert_eq!(values, vec![0.0, 10.0, 10.0, 50.0, 99.0, 99.0, 99.0]);
        assert!(!progress.has_completed());
    }

    #[test]
    fn test_complete_latches_once() {
        let progress = ProgressReporter::new();
        let rx = progress.subscribe();

        progress.update(40.0);
        progress.complete();
        progress.update(60.0);
        progress.complete();

        let values: Vec<f32> = rx.try_iter().collect();
        assert_eq!(values, vec![0.0, 40.0, 100.0]);
        assert_eq!(progress.value(), 100.0);
        assert!(progress.has_completed());
    }

    #[test]
    fn test_reset_opens_new_cycle() {
        let progress = ProgressReporter::new();
        progress.update(70.0);
        progress.complete();

        let rx = progress.subscribe();
        progress.reset();
        progress.update(20.0);
        progress.complete();

        let values: Vec<f32> = rx.try_iter().collect();
        assert_eq!(values, vec![100.0, 0.0, 20.0, 100.0]);
    }

    #[test]
    fn test_dropped_subscriber_is_pruned() {
        let progress = ProgressReporter::new();
        let rx = progress.subscribe();
        drop(rx);
        progress.update(10.0);
        assert_eq!(progress.state().subscribers.len(), 0);
    }

    #[test]
    fn test_clones_share_state() {
        let progress = ProgressReporter::new();
        let other = progress.clone();
        other.update(33.0);
        assert_eq!(progress.value(), 33.0);
    }
}
