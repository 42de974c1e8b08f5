//! Drives every action of one model.

use crossbeam_channel::{Receiver, Sender, unbounded};
use tracing::trace;

use avatar_resources::AnimationClip;

use crate::{ActionId, AnimationAction, LoopMode};

/// Owns the actions of one model and advances them together.
///
/// Completions are not delivered through callbacks. Each play-once action
/// that reaches its end during [`update`](Self::update) is posted to an
/// internal channel, and the owner collects them with
/// [`drain_completions`](Self::drain_completions) once per tick.
pub struct AnimationMixer {
    actions: Vec<AnimationAction>,
    time: f32,
    completion_tx: Sender<ActionId>,
    completion_rx: Receiver<ActionId>,
}

impl AnimationMixer {
    pub fn new() -> Self {
        let (completion_tx, completion_rx) = unbounded();
        Self {
            actions: Vec::new(),
            time: 0.0,
            completion_tx,
            completion_rx,
        }
    }

    /// Create an action for `clip`.
    pub fn clip_action(&mut self, clip: AnimationClip, loop_mode: LoopMode) -> ActionId {
        let id = ActionId(self.actions.len());
        self.actions.push(AnimationAction::new(clip, loop_mode));
        id
    }

    pub fn action(&self, id: ActionId) -> Option<&AnimationAction> {
        self.actions.get(id.0)
    }

    pub fn action_mut(&mut self, id: ActionId) -> Option<&mut AnimationAction> {
        self.actions.get_mut(id.0)
    }

    pub fn action_count(&self) -> usize {
        self.actions.len()
    }

    /// Global mixer time in seconds.
    pub fn time(&self) -> f32 {
        self.time
    }

    /// Advance all actions by `dt` seconds.
    pub fn update(&mut self, dt: f32) {
        self.time += dt;
        for (index, action) in self.actions.iter_mut().enumerate() {
            if action.update(dt) {
                trace!("Action '{}' finished", action.clip().name());
                // The receiver lives as long as `self`.
                let _ = self.completion_tx.send(ActionId(index));
            }
        }
    }

    /// Take every completion posted since the last drain, in order.
    pub fn drain_completions(&self) -> Vec<ActionId> {
        self.completion_rx.try_iter().collect()
    }

    pub fn stop_all_actions(&mut self) {
        for action in &mut self.actions {
            action.stop();
        }
    }

    /// Drop all actions and any undelivered completions.
    pub fn uncache_all(&mut self) {
        self.actions.clear();
        self.completion_rx.try_iter().for_each(drop);
    }
}

impl Default for AnimationMixer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_completions_are_queued_until_drained() {
        let mut mixer = AnimationMixer::new();
        let short = mixer.clip_action(AnimationClip::new("short", 0.5), LoopMode::Once { clamp: true });
        let idle = mixer.clip_action(AnimationClip::new("idle", 0.5), LoopMode::Repeat);
        mixer.action_mut(short).unwrap().play();
        mixer.action_mut(idle).unwrap().play();

        mixer.update(0.3);
        assert!(mixer.drain_completions().is_empty());

        mixer.update(0.3);
        assert_eq!(mixer.drain_completions(), vec![short]);
        assert!(mixer.drain_completions().is_empty());
    }

    #[test]
    fn test_stop_all_actions() {
        let mut mixer = AnimationMixer::new();
        let id = mixer.clip_action(AnimationClip::new("a", 1.0), LoopMode::Repeat);
        mixer.action_mut(id).unwrap().play();
        mixer.stop_all_actions();
        assert!(!mixer.action(id).unwrap().is_running());
    }

    #[test]
    fn test_uncache_discards_pending_completions() {
        let mut mixer = AnimationMixer::new();
        let id = mixer.clip_action(AnimationClip::new("a", 0.1), LoopMode::Once { clamp: true });
        mixer.action_mut(id).unwrap().play();
        mixer.update(1.0);
        mixer.uncache_all();
        assert_eq!(mixer.action_count(), 0);
        assert!(mixer.drain_completions().is_empty());
    }
}
