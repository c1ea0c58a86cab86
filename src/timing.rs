//! Frame scheduling and FPS tracking.
//!
//! The host delivers frames through a [`FrameScheduler`]: the session (or its
//! driver) requests the next frame, renders when it is delivered, and
//! re-requests as the last action of the frame. A pending request can be
//! cancelled through its handle, which is how [`crate::spectrum::Spectrum::stop`]
//! works.

use std::time::{Duration, Instant};

use tokio::time::{interval, Interval, MissedTickBehavior};

/// Opaque handle to one scheduled frame callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHandle(u64);

pub trait FrameScheduler {
    /// Schedule the next frame, replacing any still-pending request.
    fn request_frame(&mut self) -> FrameHandle;

    /// Cancel a pending request; a stale handle is ignored.
    fn cancel_frame(&mut self, handle: FrameHandle);
}

/// Tokio-interval scheduler delivering frames at a fixed target rate.
pub struct IntervalScheduler {
    interval: Interval,
    next_id: u64,
    pending: Option<FrameHandle>,
}

impl IntervalScheduler {
    pub fn new(target_fps: u32) -> Self {
        let period = Duration::from_secs_f64(1.0 / target_fps.max(1) as f64);
        let mut interval = interval(period);
        // A stalled host (blocked terminal, suspended process) should not be
        // repaid with a burst of catch-up frames.
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        Self {
            interval,
            next_id: 0,
            pending: None,
        }
    }

    /// Wait for the next display tick. Returns the pending handle, or `None`
    /// immediately if the request was cancelled.
    pub async fn next_frame(&mut self) -> Option<FrameHandle> {
        self.pending?;
        self.interval.tick().await;
        self.pending.take()
    }
}

impl FrameScheduler for IntervalScheduler {
    fn request_frame(&mut self) -> FrameHandle {
        self.next_id += 1;
        let handle = FrameHandle(self.next_id);
        self.pending = Some(handle);
        handle
    }

    fn cancel_frame(&mut self, handle: FrameHandle) {
        if self.pending == Some(handle) {
            self.pending = None;
        }
    }
}

/// Deterministic scheduler for tests and embedding: frames are delivered by
/// calling [`ManualScheduler::deliver`] explicitly.
#[derive(Default)]
pub struct ManualScheduler {
    next_id: u64,
    pending: Option<FrameHandle>,
    cancelled: Vec<FrameHandle>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn deliver(&mut self) -> Option<FrameHandle> {
        self.pending.take()
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn cancelled(&self) -> &[FrameHandle] {
        &self.cancelled
    }
}

impl FrameScheduler for ManualScheduler {
    fn request_frame(&mut self) -> FrameHandle {
        self.next_id += 1;
        let handle = FrameHandle(self.next_id);
        self.pending = Some(handle);
        handle
    }

    fn cancel_frame(&mut self, handle: FrameHandle) {
        if self.pending == Some(handle) {
            self.pending = None;
            self.cancelled.push(handle);
        }
    }
}

/// Smoothed frames-per-second estimate: `fps += instantaneous - fps`, with a
/// guard against a zero time delta.
#[derive(Debug)]
pub struct FpsTracker {
    fps: f64,
    last_update: Instant,
}

impl FpsTracker {
    pub fn new() -> Self {
        Self::starting_at(Instant::now())
    }

    pub fn starting_at(start: Instant) -> Self {
        Self {
            fps: 0.0,
            last_update: start,
        }
    }

    pub fn update(&mut self, now: Instant) {
        if now == self.last_update {
            return;
        }
        let dt = now.saturating_duration_since(self.last_update).as_secs_f64();
        if dt <= 0.0 {
            return;
        }
        let instantaneous = 1.0 / dt;
        self.fps += instantaneous - self.fps;
        self.last_update = now;
    }

    pub fn fps(&self) -> f64 {
        self.fps
    }
}

impl Default for FpsTracker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fps_correction_from_zero() {
        let t0 = Instant::now();
        let mut tracker = FpsTracker::starting_at(t0);
        assert_eq!(tracker.fps(), 0.0);
        tracker.update(t0 + Duration::from_millis(100));
        assert!((tracker.fps() - 10.0).abs() < 1e-9);
    }

    #[test]
    fn fps_zero_delta_is_ignored() {
        let t0 = Instant::now();
        let mut tracker = FpsTracker::starting_at(t0);
        tracker.update(t0 + Duration::from_millis(100));
        let before = tracker.fps();
        tracker.update(t0 + Duration::from_millis(100));
        assert_eq!(tracker.fps(), before);
    }

    #[test]
    fn manual_scheduler_delivers_requested_frame() {
        let mut sched = ManualScheduler::new();
        let handle = sched.request_frame();
        assert!(sched.has_pending());
        assert_eq!(sched.deliver(), Some(handle));
        assert_eq!(sched.deliver(), None);
    }

    #[test]
    fn cancel_suppresses_delivery() {
        let mut sched = ManualScheduler::new();
        let handle = sched.request_frame();
        sched.cancel_frame(handle);
        assert_eq!(sched.deliver(), None);
        assert_eq!(sched.cancelled(), &[handle]);
    }

    #[test]
    fn stale_handle_does_not_cancel_newer_request() {
        let mut sched = ManualScheduler::new();
        let old = sched.request_frame();
        let newer = sched.request_frame();
        sched.cancel_frame(old);
        assert_eq!(sched.deliver(), Some(newer));
    }

    #[tokio::test(start_paused = true)]
    async fn interval_scheduler_returns_none_after_cancel() {
        let mut sched = IntervalScheduler::new(60);
        let handle = sched.request_frame();
        sched.cancel_frame(handle);
        assert_eq!(sched.next_frame().await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn interval_scheduler_delivers_pending() {
        let mut sched = IntervalScheduler::new(60);
        let handle = sched.request_frame();
        assert_eq!(sched.next_frame().await, Some(handle));
    }
}
