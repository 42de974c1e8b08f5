//! The animation state machine.
//!
//! One engine drives the clips of one model. It keeps exactly one current
//! clip, an optional queue of clips still to play, and a default clip that
//! loops whenever nothing else is requested. Transitions cross-fade the
//! outgoing and incoming actions over a fixed window.
//!
//! Completion of play-once clips arrives through the mixer's channel and is
//! handled inside [`AnimationEngine::advance`], never re-entrantly.

use std::collections::VecDeque;

use tracing::{debug, info, trace, warn};

use avatar_core::AnimationConfig;
use avatar_resources::AnimationClip;

use crate::{
    ActionId, AnimationError, AnimationMixer, AnimationResult, ClipRegistry, GreetingLatch,
    LoopMode,
};

/// Observable engine state.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EngineState {
    /// No clips registered.
    Uninitialized,
    /// The default clip is current.
    Idle(String),
    /// A single non-default clip is current.
    Playing(String),
    /// A clip is current and more are queued behind it.
    Sequencing {
        current: String,
        queued: Vec<String>,
    },
}

pub struct AnimationEngine {
    settings: AnimationConfig,
    greeting: GreetingLatch,
    mixer: Option<AnimationMixer>,
    clips: ClipRegistry,
    current: Option<String>,
    default_clip: Option<String>,
    queue: VecDeque<String>,
}

impl AnimationEngine {
    pub fn new(settings: AnimationConfig, greeting: GreetingLatch) -> Self {
        Self {
            settings,
            greeting,
            mixer: None,
            clips: ClipRegistry::new(),
            current: None,
            default_clip: None,
            queue: VecDeque::new(),
        }
    }

    /// Register the clips of a freshly loaded model and start playback.
    ///
    /// The idle clip loops forever, every other clip plays once and holds
    /// its last pose. Unnamed clips become `clip-<index>`; later duplicates
    /// are skipped. The greeting clip plays first if present and no engine
    /// sharing this latch has played it yet, otherwise the default clip
    /// starts directly.
    pub fn register_clips(&mut self, clips: &[AnimationClip]) {
        if self.mixer.is_some() {
            self.dispose();
        }
        if clips.is_empty() {
            debug!("Model has no animation clips");
            return;
        }

        let mut mixer = AnimationMixer::new();
        for (index, clip) in clips.iter().enumerate() {
            let name = clip.registry_name(index);
            if self.clips.contains(&name) {
                warn!("Skipping duplicate animation clip '{}'", name);
                continue;
            }
            let loop_mode = if name == self.settings.idle_clip {
                LoopMode::Repeat
            } else {
                LoopMode::Once { clamp: true }
            };
            let action = mixer.clip_action(clip.clone(), loop_mode);
            self.clips.insert(name, action);
        }
        self.mixer = Some(mixer);

        self.default_clip = if self.clips.contains(&self.settings.idle_clip) {
            Some(self.settings.idle_clip.clone())
        } else {
            self.clips.first_name().map(str::to_owned)
        };

        info!(
            "Registered {} animation clips (default: {:?})",
            self.clips.len(),
            self.default_clip
        );

        let greeting = self.settings.greeting_clip.clone();
        let start = if self.clips.contains(&greeting) && self.greeting.try_claim() {
            debug!("Playing greeting clip '{}'", greeting);
            Some(greeting)
        } else {
            self.default_clip.clone()
        };
        if let Some(name) = start {
            self.transition(&name);
        }
    }

    /// Cross-fade to `name`. No-op if it is already current.
    pub fn play(&mut self, name: &str) -> AnimationResult<()> {
        self.check_playable(name)?;
        if self.current.as_deref() != Some(name) {
            self.transition(name);
        }
        Ok(())
    }

    /// Replace the queue with `names` and start the first one. An empty list
    /// is a no-op.
    ///
    /// The queue is replaced even when the first name is unknown; the error
    /// then only reports that nothing new started, and the rest of the list
    /// follows the current clip.
    pub fn play_sequence<S: AsRef<str>>(&mut self, names: &[S]) -> AnimationResult<()> {
        let Some((first, rest)) = names.split_first() else {
            return Ok(());
        };
        if self.mixer.is_none() {
            return Err(AnimationError::UninitializedEngine);
        }
        self.queue = rest.iter().map(|n| n.as_ref().to_owned()).collect();

        let first = first.as_ref();
        self.check_playable(first)?;
        if self.current.as_deref() != Some(first) {
            self.transition(first);
        }
        Ok(())
    }

    /// One inbound animation request: a single name plays it, several play
    /// them as a sequence.
    pub fn request<S: AsRef<str>>(&mut self, names: &[S]) -> AnimationResult<()> {
        match names {
            [single] => self.play(single.as_ref()),
            _ => self.play_sequence(names),
        }
    }

    /// Advance every action by `dt` seconds and react to clips that finished
    /// during this step.
    pub fn advance(&mut self, dt: f32) {
        let finished = match self.mixer.as_mut() {
            Some(mixer) => {
                mixer.update(dt);
                mixer.drain_completions()
            }
            None => return,
        };
        for action in finished {
            self.on_finished(action);
        }
    }

    fn on_finished(&mut self, action: ActionId) {
        let Some(finished) = self.clips.name_of(action).map(str::to_owned) else {
            return;
        };
        if self.current.as_deref() != Some(finished.as_str()) {
            trace!("Ignoring completion of replaced clip '{}'", finished);
            return;
        }

        while let Some(next) = self.queue.pop_front() {
            if self.clips.contains(&next) {
                self.transition(&next);
                return;
            }
            warn!("Skipping unknown queued clip '{}'", next);
        }

        if let Some(default) = self.default_clip.clone()
            && default != finished
        {
            self.transition(&default);
        }
    }

    fn check_playable(&self, name: &str) -> AnimationResult<()> {
        if self.mixer.is_none() {
            return Err(AnimationError::UninitializedEngine);
        }
        if !self.clips.contains(name) {
            return Err(AnimationError::UnknownAnimation(name.to_owned()));
        }
        Ok(())
    }

    fn transition(&mut self, name: &str) {
        let fade = self.settings.fade_seconds;
        let (Some(mixer), Some(next)) = (self.mixer.as_mut(), self.clips.get(name)) else {
            return;
        };

        if let Some(current) = self.current.as_deref().and_then(|c| self.clips.get(c)) {
            if let Some(action) = mixer.action_mut(current) {
                action.fade_out(fade);
            }
        }
        if let Some(action) = mixer.action_mut(next) {
            action.reset();
            action.fade_in(fade);
            action.play();
        }

        debug!("Animation: {:?} -> '{}'", self.current, name);
        self.current = Some(name.to_owned());
    }

    /// Stop every action and forget all clips and playback state. Safe to
    /// call repeatedly.
    pub fn dispose(&mut self) {
        let Some(mut mixer) = self.mixer.take() else {
            return;
        };
        mixer.stop_all_actions();
        mixer.uncache_all();
        self.clips.clear();
        self.current = None;
        self.default_clip = None;
        self.queue.clear();
        info!("Animation engine disposed");
    }

    pub fn is_initialized(&self) -> bool {
        self.mixer.is_some()
    }

    pub fn current_clip(&self) -> Option<&str> {
        self.current.as_deref()
    }

    pub fn default_clip(&self) -> Option<&str> {
        self.default_clip.as_deref()
    }

    pub fn queued(&self) -> Vec<&str> {
        self.queue.iter().map(String::as_str).collect()
    }

    pub fn clips(&self) -> &ClipRegistry {
        &self.clips
    }

    /// Current influence of the action playing `name`.
    pub fn action_weight(&self, name: &str) -> Option<f32> {
        let id = self.clips.get(name)?;
        self.mixer.as_ref()?.action(id).map(|a| a.weight())
    }

    pub fn state(&self) -> EngineState {
        let Some(current) = self.current.clone() else {
            return EngineState::Uninitialized;
        };
        if !self.queue.is_empty() {
            EngineState::Sequencing {
                current,
                queued: self.queue.iter().cloned().collect(),
            }
        } else if self.default_clip.as_deref() == Some(current.as_str()) {
            EngineState::Idle(current)
        } else {
            EngineState::Playing(current)
        }
    }
}

impl Drop for AnimationEngine {
    fn drop(&mut self) {
        self.dispose();
    }
}
