//! Per-clip playback state.

use avatar_resources::AnimationClip;

/// Index of an action inside its mixer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ActionId(pub usize);

/// How an action behaves when it reaches the end of its clip.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoopMode {
    /// Play once. With `clamp` the action holds its final pose, otherwise it
    /// disables itself.
    Once { clamp: bool },
    /// Wrap around forever. Never finishes.
    Repeat,
}

#[derive(Clone, Copy, Debug)]
struct Fade {
    from: f32,
    to: f32,
    elapsed: f32,
    duration: f32,
}

impl Fade {
    fn weight(&self) -> f32 {
        let t = (self.elapsed / self.duration).clamp(0.0, 1.0);
        self.from + (self.to - self.from) * t
    }

    fn is_done(&self) -> bool {
        self.elapsed >= self.duration
    }
}

/// Playback state of one clip: local time, influence weight, and an
/// optional weight fade.
#[derive(Clone, Debug)]
pub struct AnimationAction {
    clip: AnimationClip,
    loop_mode: LoopMode,
    time: f32,
    weight: f32,
    enabled: bool,
    running: bool,
    finished: bool,
    fade: Option<Fade>,
}

impl AnimationAction {
    pub fn new(clip: AnimationClip, loop_mode: LoopMode) -> Self {
        Self {
            clip,
            loop_mode,
            time: 0.0,
            weight: 1.0,
            enabled: true,
            running: false,
            finished: false,
            fade: None,
        }
    }

    pub fn clip(&self) -> &AnimationClip {
        &self.clip
    }

    pub fn loop_mode(&self) -> LoopMode {
        self.loop_mode
    }

    pub fn time(&self) -> f32 {
        self.time
    }

    pub fn weight(&self) -> f32 {
        self.weight
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn play(&mut self) {
        self.enabled = true;
        self.running = true;
    }

    /// Rewind to the start at full weight, cancelling any fade.
    pub fn reset(&mut self) {
        self.time = 0.0;
        self.weight = 1.0;
        self.enabled = true;
        self.finished = false;
        self.fade = None;
    }

    pub fn stop(&mut self) {
        self.reset();
        self.running = false;
    }

    /// Ramp weight from zero to one over `duration` seconds.
    pub fn fade_in(&mut self, duration: f32) {
        self.weight = 0.0;
        self.start_fade(0.0, 1.0, duration);
    }

    /// Ramp weight from its current value to zero over `duration` seconds.
    /// The action disables itself when the fade ends.
    pub fn fade_out(&mut self, duration: f32) {
        self.start_fade(self.weight, 0.0, duration);
    }

    fn start_fade(&mut self, from: f32, to: f32, duration: f32) {
        if duration <= 0.0 {
            self.fade = None;
            self.finish_fade(to);
        } else {
            self.fade = Some(Fade {
                from,
                to,
                elapsed: 0.0,
                duration,
            });
        }
    }

    fn finish_fade(&mut self, to: f32) {
        self.weight = to;
        if to <= 0.0 {
            self.enabled = false;
            self.running = false;
        }
    }

    /// Advance by `dt` seconds. Returns `true` on the step where a play-once
    /// action reaches the end of its clip.
    pub fn update(&mut self, dt: f32) -> bool {
        if !self.enabled || !self.running {
            return false;
        }

        let just_finished = self.advance_time(dt);

        if let Some(mut fade) = self.fade.take() {
            fade.elapsed += dt;
            if fade.is_done() {
                self.finish_fade(fade.to);
            } else {
                self.weight = fade.weight();
                self.fade = Some(fade);
            }
        }

        just_finished
    }

    fn advance_time(&mut self, dt: f32) -> bool {
        if self.finished {
            return false;
        }
        let duration = self.clip.duration();
        self.time += dt;

        match self.loop_mode {
            LoopMode::Repeat => {
                if duration > 0.0 {
                    self.time = self.time.rem_euclid(duration);
                }
                false
            }
            LoopMode::Once { clamp } => {
                if self.time < duration {
                    return false;
                }
                self.time = duration;
                self.finished = true;
                if !clamp {
                    self.enabled = false;
                    self.running = false;
                }
                true
            }
        }
    }
}
