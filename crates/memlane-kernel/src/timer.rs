//! [`ItemTimer`] – a single cancellable deadline owned by one item.
//!
//! Timers here are cooperative: nothing runs in the background.  The owner
//! arms a deadline and the event loop later asks
//! [`ItemTimer::fire_if_due`] whether it has passed.  Cancelling is just
//! forgetting the deadline, so a cancelled timer can never fire.

use std::time::{Duration, Instant};

// ────────────────────────────────────────────────────────────────────────────
// Public types
// ────────────────────────────────────────────────────────────────────────────

/// What a pending deadline is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerKind {
    /// Continuous gaze/hover before automatic expansion.
    Dwell,
    /// Hold of the selected highlight before returning to idle.
    Cooldown,
}

// ────────────────────────────────────────────────────────────────────────────
// Internal entry
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy)]
struct Pending {
    kind: TimerKind,
    armed_at: Instant,
    deadline: Instant,
}

// ────────────────────────────────────────────────────────────────────────────
// ItemTimer
// ────────────────────────────────────────────────────────────────────────────

/// At most one pending deadline.
///
/// # Example
///
/// ```
/// use std::time::{Duration, Instant};
/// use memlane_kernel::timer::{ItemTimer, TimerKind};
///
/// let start = Instant::now();
/// let mut timer = ItemTimer::new();
/// timer.arm(TimerKind::Dwell, start, Duration::from_millis(1500));
///
/// assert_eq!(timer.fire_if_due(start + Duration::from_millis(1000)), None);
/// assert_eq!(timer.fire_if_due(start + Duration::from_millis(1500)), Some(TimerKind::Dwell));
/// // Fired timers are spent.
/// assert!(!timer.is_armed());
/// ```
#[derive(Debug, Default)]
pub struct ItemTimer {
    pending: Option<Pending>,
}

impl ItemTimer {
    /// Create an idle timer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm a deadline `duration` after `now`, replacing any pending one.
    pub fn arm(&mut self, kind: TimerKind, now: Instant, duration: Duration) {
        self.pending = Some(Pending {
            kind,
            armed_at: now,
            deadline: now + duration,
        });
    }

    /// Drop the pending deadline.  Returns what was cancelled, if anything.
    pub fn cancel(&mut self) -> Option<TimerKind> {
        self.pending.take().map(|p| p.kind)
    }

    pub fn is_armed(&self) -> bool {
        self.pending.is_some()
    }

    /// Kind of the pending deadline.
    pub fn kind(&self) -> Option<TimerKind> {
        self.pending.map(|p| p.kind)
    }

    /// Consume and return the pending deadline when `now` has reached it.
    pub fn fire_if_due(&mut self, now: Instant) -> Option<TimerKind> {
        match self.pending {
            Some(p) if now >= p.deadline => {
                self.pending = None;
                Some(p.kind)
            }
            _ => None,
        }
    }

    /// Fraction of the armed interval that has elapsed, in `[0.0, 1.0]`.
    /// Zero when nothing is armed.
    pub fn progress(&self, now: Instant) -> f32 {
        match self.pending {
            Some(p) => {
                let total = p.deadline.saturating_duration_since(p.armed_at);
                if total.is_zero() {
                    return 1.0;
                }
                let elapsed = now.saturating_duration_since(p.armed_at);
                (elapsed.as_secs_f32() / total.as_secs_f32()).min(1.0)
            }
            None => 0.0,
        }
    }
}
