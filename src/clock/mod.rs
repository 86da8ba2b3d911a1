//! Logical clock subsystem: one monotonic time contract shared by
//! wall-clock, scaled-simulation, and archive-replay runs.
//!
//! The `parking_lot::RwLock`-guarded snapshot mirrors the low-contention
//! shared-state idiom used elsewhere in this crate for hot paths, and the
//! scheduler below runs as a background `tokio::task::spawn` worker that
//! wakes on the next deadline.

pub mod scheduler;

// Layer 1: Standard library imports
use std::sync::Arc;

// Layer 2: Third-party crate imports
use chrono::{DateTime, Duration as ChronoDuration, Utc}; // §3.2 MANDATORY
use parking_lot::RwLock;

pub use scheduler::{ScheduleHandle, Scheduler};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RunState {
    Running,
    Paused,
    Stopped,
}

struct Snapshot {
    /// Wall-clock instant at which logical time was last `base_instant`.
    anchor: DateTime<Utc>,
    /// Logical time at the anchor.
    base_instant: DateTime<Utc>,
    /// Logical seconds elapsed per wall-clock second.
    scale: f64,
    state: RunState,
    /// Wall-clock instant at which the clock was paused, if paused.
    paused_at: Option<DateTime<Utc>>,
}

/// The runtime's single source of logical time.
///
/// Cloning is cheap (shared `Arc`); every clone observes the same state.
#[derive(Clone)]
pub struct Clock {
    inner: Arc<RwLock<Snapshot>>,
}

impl Default for Clock {
    fn default() -> Self {
        Self::new(Utc::now(), 1.0)
    }
}

impl Clock {
    /// Create a clock anchored at `base_instant`, advancing at `scale`
    /// logical seconds per wall-clock second. `scale == 1.0` is real time;
    /// `scale == 0.0` is a fully stepped/archive-replay clock that only
    /// advances via explicit [`Clock::set_base`] calls.
    pub fn new(base_instant: DateTime<Utc>, scale: f64) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Snapshot {
                anchor: Utc::now(),
                base_instant,
                scale,
                state: RunState::Running,
                paused_at: None,
            })),
        }
    }

    /// Current logical time.
    pub fn now(&self) -> DateTime<Utc> {
        let snap = self.inner.read();
        match snap.state {
            RunState::Paused => snap.base_instant,
            RunState::Stopped => snap.base_instant,
            RunState::Running => {
                let wall_elapsed = Utc::now().signed_duration_since(snap.anchor);
                let scaled_nanos = (wall_elapsed.num_nanoseconds().unwrap_or(0) as f64 * snap.scale) as i64;
                snap.base_instant + ChronoDuration::nanoseconds(scaled_nanos)
            }
        }
    }

    /// Logical duration elapsed since `since`.
    pub fn elapsed_since(&self, since: DateTime<Utc>) -> ChronoDuration {
        self.now().signed_duration_since(since)
    }

    /// Rebase the clock at a new logical instant without changing scale.
    /// Used on startup (Master broadcasts the computed base instant) and by
    /// remote clock sync. Returns `(old, new)` for the `ClockReset` event.
    pub fn set_base(&self, new_base: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
        let old = self.now();
        let mut snap = self.inner.write();
        snap.anchor = Utc::now();
        snap.base_instant = new_base;
        (old, new_base)
    }

    /// Change the time-scale factor, re-anchoring so `now()` is continuous
    /// across the change. Scheduled messages keyed on logical deadlines
    /// must be re-indexed by the scheduler after this call.
    pub fn set_scale(&self, scale: f64) -> (DateTime<Utc>, DateTime<Utc>) {
        let old = self.now();
        let mut snap = self.inner.write();
        snap.base_instant = old;
        snap.anchor = Utc::now();
        snap.scale = scale;
        (old, old)
    }

    /// Pause the clock: `now()` freezes at the instant of the call.
    pub fn pause(&self) {
        let frozen = self.now();
        let mut snap = self.inner.write();
        snap.base_instant = frozen;
        snap.paused_at = Some(Utc::now());
        snap.state = RunState::Paused;
    }

    /// Resume a paused clock, re-anchoring to wall-clock now.
    pub fn resume(&self) {
        let mut snap = self.inner.write();
        if snap.state == RunState::Paused {
            snap.anchor = Utc::now();
            snap.paused_at = None;
            snap.state = RunState::Running;
        }
    }

    /// Stop the clock permanently: `now()` freezes and never resumes.
    pub fn stop(&self) {
        let frozen = self.now();
        let mut snap = self.inner.write();
        snap.base_instant = frozen;
        snap.state = RunState::Stopped;
    }

    /// Current scale factor.
    pub fn scale(&self) -> f64 {
        self.inner.read().scale
    }

    /// Whether the clock is currently paused.
    pub fn is_paused(&self) -> bool {
        self.inner.read().state == RunState::Paused
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration as StdDuration;

    #[test]
    fn now_advances_at_configured_scale() {
        let base = Utc::now();
        let clock = Clock::new(base, 10.0);
        std::thread::sleep(StdDuration::from_millis(20));
        let elapsed = clock.elapsed_since(base);
        assert!(elapsed.num_milliseconds() >= 150);
    }

    #[test]
    fn zero_scale_clock_never_advances_until_rebased() {
        let base = Utc::now();
        let clock = Clock::new(base, 0.0);
        std::thread::sleep(StdDuration::from_millis(20));
        assert_eq!(clock.now(), base);
    }

    #[test]
    fn pause_freezes_and_resume_continues() {
        let clock = Clock::new(Utc::now(), 1.0);
        clock.pause();
        let frozen = clock.now();
        std::thread::sleep(StdDuration::from_millis(20));
        assert_eq!(clock.now(), frozen);
        assert!(clock.is_paused());

        clock.resume();
        assert!(!clock.is_paused());
    }

    #[test]
    fn set_base_rebases_without_changing_scale() {
        let clock = Clock::new(Utc::now(), 1.0);
        let new_base = Utc::now() + ChronoDuration::hours(1);
        let (_old, new) = clock.set_base(new_base);
        assert_eq!(new, new_base);
        assert!(clock.now() >= new_base);
    }

    #[test]
    fn stop_freezes_permanently() {
        let clock = Clock::new(Utc::now(), 5.0);
        clock.stop();
        let frozen = clock.now();
        std::thread::sleep(StdDuration::from_millis(10));
        assert_eq!(clock.now(), frozen);
    }
}
