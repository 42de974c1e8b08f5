//! Frame-callback scheduling.

/// Token for one scheduled frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrameRequest(pub u64);

/// A single self-rescheduling frame callback.
///
/// At most one frame is pending at a time. The host fires the pending
/// frame at each display refresh; the tick that handles it decides whether
/// to schedule the next one. Cancelling drops the pending frame, so the
/// loop stops until it is scheduled again.
#[derive(Debug, Default)]
pub struct RenderLoop {
    pending: Option<FrameRequest>,
    next_id: u64,
    fired: u64,
}

impl RenderLoop {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule the next frame unless one is already pending.
    pub fn schedule(&mut self) -> FrameRequest {
        if let Some(request) = self.pending {
            return request;
        }
        let request = FrameRequest(self.next_id);
        self.next_id += 1;
        self.pending = Some(request);
        request
    }

    /// Drop the pending frame, if any. Returns whether one was pending.
    pub fn cancel(&mut self) -> bool {
        self.pending.take().is_some()
    }

    pub fn is_scheduled(&self) -> bool {
        self.pending.is_some()
    }

    /// Consume the pending frame. `None` means nothing was scheduled and the
    /// tick must not run.
    pub fn fire(&mut self) -> Option<FrameRequest> {
        let request = self.pending.take()?;
        self.fired += 1;
        Some(request)
    }

    /// Number of frames fired so far.
    pub fn fired(&self) -> u64 {
        self.fired
    }
}
