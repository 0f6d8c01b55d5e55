use std::time::{Duration, Instant};

/// Token for one requested frame callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameRequest(pub u64);

/// The host's frame-timing primitive: a one-shot "call me next frame".
pub trait FrameHost {
    fn request_frame(&mut self) -> FrameRequest;
    fn cancel_frame(&mut self, request: FrameRequest);
}

/// Timing of one animated frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameTime {
    /// Since the loop started.
    pub elapsed: Duration,
    /// Since the previous frame of the same loop.
    pub delta: Duration,
}

#[derive(Debug)]
struct ActiveLoop {
    deps: u64,
    started: Instant,
    last: Instant,
    pending: FrameRequest,
}

/// Drives the animated render loop.
///
/// At most one frame request is outstanding. Restarting or cancelling the
/// loop cancels that request, and callbacks for any other request are
/// ignored, so an old loop can never keep running next to a new one.
#[derive(Debug, Default)]
pub struct FrameScheduler {
    active: Option<ActiveLoop>,
}

impl FrameScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_running(&self) -> bool {
        self.active.is_some()
    }

    pub fn pending(&self) -> Option<FrameRequest> {
        self.active.as_ref().map(|a| a.pending)
    }

    /// Bring the loop in line with `animate` and the dependency generation
    /// `deps`. A changed generation restarts the loop.
    pub fn sync(&mut self, animate: bool, deps: u64, now: Instant, host: &mut dyn FrameHost) {
        if !animate {
            self.cancel(host);
            return;
        }
        if self.active.as_ref().is_some_and(|a| a.deps == deps) {
            return;
        }
        self.cancel(host);
        let pending = host.request_frame();
        tracing::debug!(deps, request = pending.0, "animation loop started");
        self.active = Some(ActiveLoop {
            deps,
            started: now,
            last: now,
            pending,
        });
    }

    /// Handle a frame callback. Returns the frame timing when `request` is
    /// the one this loop is waiting for, and schedules the next frame.
    pub fn on_frame(
        &mut self,
        request: FrameRequest,
        now: Instant,
        host: &mut dyn FrameHost,
    ) -> Option<FrameTime> {
        let active = self.active.as_mut()?;
        if active.pending != request {
            tracing::trace!(request = request.0, "stale frame callback ignored");
            return None;
        }
        let time = FrameTime {
            elapsed: now.saturating_duration_since(active.started),
            delta: now.saturating_duration_since(active.last),
        };
        active.last = now;
        active.pending = host.request_frame();
        Some(time)
    }

    pub fn cancel(&mut self, host: &mut dyn FrameHost) {
        if let Some(active) = self.active.take() {
            host.cancel_frame(active.pending);
            tracing::debug!(request = active.pending.0, "animation loop cancelled");
        }
    }
}
