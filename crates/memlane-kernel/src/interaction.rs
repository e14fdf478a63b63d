//! [`InteractionMachine`] – per-item interaction state machine.
//!
//! Every visible memory owns one machine.  Pointer and gaze input share the
//! same three events ([`InputEvent::Enter`], [`InputEvent::Leave`],
//! [`InputEvent::Activate`]); the [`InputSource`] only shows up in logs.
//!
//! ```text
//!            enter                  dwell elapsed
//!   idle ──────────► hovered ──► dwelling ───────────► expanded
//!    ▲                  │  (flat: straight to expanded)    │   │
//!    │       leave      │           leave                  │   │ activate
//!    ◄──────────────────┴──────────────────────────────────┘   ▼
//!    ◄─────────────────── cooldown elapsed ─────────── selected-cooldown
//! ```
//!
//! `hovered` is transient: entering immediately continues to `dwelling`
//! (immersive) or `expanded` (flat), and both hops are reported.  Timers are
//! cooperative; the owner calls [`InteractionMachine::advance`] with the
//! current instant to fire any due deadline.

use std::time::{Duration, Instant};

use memlane_types::{InteractionState, MemoryItem, SelectionEvent};
use tracing::{debug, trace};

use crate::capability::RenderMode;
use crate::timer::{ItemTimer, TimerKind};

/// Continuous dwell before an immersive item expands.
pub const DEFAULT_DWELL: Duration = Duration::from_millis(1500);

/// Hold of the selected highlight before returning to idle.
pub const DEFAULT_COOLDOWN: Duration = Duration::from_millis(3000);

// ────────────────────────────────────────────────────────────────────────────
// Inputs and outputs
// ────────────────────────────────────────────────────────────────────────────

/// Dwell and cooldown durations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InteractionTiming {
    pub dwell: Duration,
    pub cooldown: Duration,
}

impl Default for InteractionTiming {
    fn default() -> Self {
        Self {
            dwell: DEFAULT_DWELL,
            cooldown: DEFAULT_COOLDOWN,
        }
    }
}

/// How `hovered` is left on enter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DwellPolicy {
    /// Arm a dwell timer and expand when it fires.
    Timed(Duration),
    /// Expand on the same step; no timer.
    Immediate,
}

impl DwellPolicy {
    pub fn for_mode(mode: RenderMode, timing: &InteractionTiming) -> Self {
        match mode {
            RenderMode::Immersive => DwellPolicy::Timed(timing.dwell),
            RenderMode::Flat => DwellPolicy::Immediate,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputEvent {
    Enter,
    Leave,
    Activate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InputSource {
    #[default]
    Pointer,
    Gaze,
}

/// One state change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub from: InteractionState,
    pub to: InteractionState,
}

/// Everything a single input or tick produced.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InteractionOutcome {
    /// In the order they happened; empty when the input was ignored.
    pub transitions: Vec<Transition>,
    /// Set exactly when the step entered `selected-cooldown`.
    pub selection: Option<SelectionEvent>,
}

impl InteractionOutcome {
    pub fn is_empty(&self) -> bool {
        self.transitions.is_empty() && self.selection.is_none()
    }
}

// ────────────────────────────────────────────────────────────────────────────
// InteractionMachine
// ────────────────────────────────────────────────────────────────────────────

/// Interaction state for one mounted item.
///
/// # Example
///
/// ```
/// use std::time::{Duration, Instant};
/// use memlane_kernel::capability::RenderMode;
/// use memlane_kernel::interaction::{InteractionMachine, InteractionTiming};
/// use memlane_types::{Era, InteractionState, MemoryItem};
///
/// let item = MemoryItem {
///     id: "p-1".into(),
///     image_url: None,
///     caption: "Graduation".into(),
///     date_label: "1971".into(),
///     era: Era::YoungAdult,
/// };
/// let start = Instant::now();
/// let mut m = InteractionMachine::new(&item, RenderMode::Immersive, InteractionTiming::default());
///
/// m.pointer_enter(start);
/// assert_eq!(m.state(), InteractionState::Dwelling);
///
/// m.advance(start + Duration::from_millis(1500));
/// assert_eq!(m.state(), InteractionState::Expanded);
///
/// let outcome = m.activate(start + Duration::from_millis(1600));
/// assert_eq!(outcome.selection.unwrap().item_id, "p-1");
/// ```
#[derive(Debug)]
pub struct InteractionMachine {
    item_id: String,
    selection: SelectionEvent,
    policy: DwellPolicy,
    cooldown: Duration,
    state: InteractionState,
    timer: ItemTimer,
    mounted: bool,
}

impl InteractionMachine {
    /// Mount a fresh machine in `idle` for `item`.
    pub fn new(item: &MemoryItem, mode: RenderMode, timing: InteractionTiming) -> Self {
        Self {
            item_id: item.id.clone(),
            selection: item.selection_event(),
            policy: DwellPolicy::for_mode(mode, &timing),
            cooldown: timing.cooldown,
            state: InteractionState::Idle,
            timer: ItemTimer::new(),
            mounted: true,
        }
    }

    pub fn item_id(&self) -> &str {
        &self.item_id
    }

    pub fn state(&self) -> InteractionState {
        self.state
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted
    }

    pub fn has_pending_timer(&self) -> bool {
        self.timer.is_armed()
    }

    /// Dwell progress in `[0.0, 1.0]` for a progress affordance.
    ///
    /// Only meaningful while dwelling; `expanded` reports a full bar and
    /// every other state reports zero.
    pub fn dwell_progress(&self, now: Instant) -> f32 {
        match self.state {
            InteractionState::Dwelling => self.timer.progress(now),
            InteractionState::Expanded => 1.0,
            _ => 0.0,
        }
    }

    pub fn pointer_enter(&mut self, now: Instant) -> InteractionOutcome {
        self.handle(InputEvent::Enter, InputSource::Pointer, now)
    }

    pub fn pointer_leave(&mut self, now: Instant) -> InteractionOutcome {
        self.handle(InputEvent::Leave, InputSource::Pointer, now)
    }

    pub fn activate(&mut self, now: Instant) -> InteractionOutcome {
        self.handle(InputEvent::Activate, InputSource::Pointer, now)
    }

    /// Feed one input.  Inputs with no transition from the current state are
    /// ignored and produce an empty outcome.
    pub fn handle(
        &mut self,
        event: InputEvent,
        source: InputSource,
        now: Instant,
    ) -> InteractionOutcome {
        let mut outcome = InteractionOutcome::default();
        if !self.mounted {
            trace!(id = %self.item_id, ?event, "input after unmount ignored");
            return outcome;
        }

        match (event, self.state) {
            (InputEvent::Enter, InteractionState::Idle) => {
                self.move_to(InteractionState::Hovered, &mut outcome);
                match self.policy {
                    DwellPolicy::Timed(dwell) => {
                        self.timer.arm(TimerKind::Dwell, now, dwell);
                        self.move_to(InteractionState::Dwelling, &mut outcome);
                    }
                    DwellPolicy::Immediate => {
                        self.move_to(InteractionState::Expanded, &mut outcome);
                    }
                }
            }
            (
                InputEvent::Leave,
                InteractionState::Hovered | InteractionState::Dwelling | InteractionState::Expanded,
            ) => {
                self.timer.cancel();
                self.move_to(InteractionState::Idle, &mut outcome);
            }
            (InputEvent::Activate, InteractionState::Expanded) => {
                self.timer.arm(TimerKind::Cooldown, now, self.cooldown);
                self.move_to(InteractionState::SelectedCooldown, &mut outcome);
                outcome.selection = Some(self.selection.clone());
            }
            (event, state) => {
                debug!(id = %self.item_id, ?event, ?source, %state, "input ignored in current state");
                return outcome;
            }
        }

        debug!(
            id = %self.item_id,
            ?event,
            ?source,
            state = %self.state,
            "input handled"
        );
        outcome
    }

    /// Fire the pending timer if `now` has reached its deadline.
    pub fn advance(&mut self, now: Instant) -> InteractionOutcome {
        let mut outcome = InteractionOutcome::default();
        if !self.mounted {
            return outcome;
        }
        match (self.timer.fire_if_due(now), self.state) {
            (Some(TimerKind::Dwell), InteractionState::Dwelling) => {
                self.move_to(InteractionState::Expanded, &mut outcome);
            }
            (Some(TimerKind::Cooldown), InteractionState::SelectedCooldown) => {
                self.move_to(InteractionState::Idle, &mut outcome);
            }
            (Some(kind), state) => {
                debug!(id = %self.item_id, ?kind, %state, "stale timer fired; ignored");
            }
            (None, _) => {}
        }
        outcome
    }

    /// Cancel any pending timer and stop reacting to input.
    pub fn unmount(&mut self) {
        if !self.mounted {
            return;
        }
        if let Some(kind) = self.timer.cancel() {
            debug!(id = %self.item_id, ?kind, "pending timer cancelled on unmount");
        }
        self.mounted = false;
    }

    fn move_to(&mut self, to: InteractionState, outcome: &mut InteractionOutcome) {
        let from = self.state;
        self.state = to;
        trace!(id = %self.item_id, %from, %to, "transition");
        outcome.transitions.push(Transition { from, to });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use memlane_types::Era;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    fn item() -> MemoryItem {
        MemoryItem {
            id: "p-7".to_string(),
            image_url: Some("https://cdn.example/p-7.jpg".to_string()),
            caption: "Wedding day".to_string(),
            date_label: "1969-06-14".to_string(),
            era: Era::Family,
        }
    }

    fn immersive() -> InteractionMachine {
        InteractionMachine::new(&item(), RenderMode::Immersive, InteractionTiming::default())
    }

    fn flat() -> InteractionMachine {
        InteractionMachine::new(&item(), RenderMode::Flat, InteractionTiming::default())
    }

    fn states(outcome: &InteractionOutcome) -> Vec<InteractionState> {
        outcome.transitions.iter().map(|t| t.to).collect()
    }

    #[test]
    fn starts_idle_without_timer() {
        let m = immersive();
        assert_eq!(m.state(), InteractionState::Idle);
        assert!(!m.has_pending_timer());
        assert!(m.is_mounted());
    }

    #[test]
    fn immersive_enter_passes_through_hovered_into_dwelling() {
        let mut m = immersive();
        let out = m.pointer_enter(Instant::now());
        assert_eq!(
            states(&out),
            vec![InteractionState::Hovered, InteractionState::Dwelling]
        );
        assert!(m.has_pending_timer());
        assert!(out.selection.is_none());
    }

    #[test]
    fn dwell_expands_after_full_duration() {
        let start = Instant::now();
        let mut m = immersive();
        m.pointer_enter(start);
        assert!(m.advance(start + ms(1499)).is_empty());
        assert_eq!(m.state(), InteractionState::Dwelling);
        let out = m.advance(start + ms(1500));
        assert_eq!(states(&out), vec![InteractionState::Expanded]);
        assert!(!m.has_pending_timer());
    }

    #[test]
    fn dwell_progress_is_not_cumulative() {
        let start = Instant::now();
        let mut m = immersive();

        m.pointer_enter(start);
        m.advance(start + ms(750));
        assert!((m.dwell_progress(start + ms(750)) - 0.5).abs() < 1e-3);
        m.pointer_leave(start + ms(750));
        assert_eq!(m.state(), InteractionState::Idle);
        assert_eq!(m.dwell_progress(start + ms(750)), 0.0);

        m.pointer_enter(start + ms(800));
        m.advance(start + ms(1550));
        assert_eq!(m.state(), InteractionState::Dwelling);
        assert!(m.dwell_progress(start + ms(1550)) < 0.51);
    }

    #[test]
    fn flat_enter_expands_immediately_without_timer() {
        let mut m = flat();
        let out = m.pointer_enter(Instant::now());
        assert_eq!(
            states(&out),
            vec![InteractionState::Hovered, InteractionState::Expanded]
        );
        assert!(!m.has_pending_timer());
    }

    #[test]
    fn leave_from_expanded_returns_to_idle_in_both_modes() {
        for mut m in [flat(), immersive()] {
            let start = Instant::now();
            m.pointer_enter(start);
            m.advance(start + ms(1500));
            assert_eq!(m.state(), InteractionState::Expanded);
            let out = m.pointer_leave(start + ms(1600));
            assert_eq!(states(&out), vec![InteractionState::Idle]);
        }
    }

    #[test]
    fn activation_emits_exactly_one_selection() {
        let start = Instant::now();
        let mut m = flat();
        m.pointer_enter(start);
        let out = m.activate(start);
        assert_eq!(states(&out), vec![InteractionState::SelectedCooldown]);
        let selection = out.selection.expect("activation selects");
        assert_eq!(selection.item_id, "p-7");
        assert_eq!(selection.caption, "Wedding day");
        assert_eq!(selection.era, Era::Family);

        // A second activation while cooling down does nothing.
        assert!(m.activate(start + ms(10)).is_empty());
    }

    #[test]
    fn hover_dwell_and_leave_never_select() {
        let start = Instant::now();
        let mut m = immersive();
        let mut selections = 0;
        for out in [
            m.pointer_enter(start),
            m.advance(start + ms(1500)),
            m.pointer_leave(start + ms(1600)),
        ] {
            selections += usize::from(out.selection.is_some());
        }
        assert_eq!(selections, 0);
    }

    #[test]
    fn activate_outside_expanded_is_ignored() {
        let start = Instant::now();
        let mut m = immersive();
        assert!(m.activate(start).is_empty());
        m.pointer_enter(start);
        assert!(m.activate(start + ms(100)).is_empty());
        assert_eq!(m.state(), InteractionState::Dwelling);
    }

    #[test]
    fn cooldown_returns_to_idle_regardless_of_pointer() {
        let start = Instant::now();
        let mut m = flat();
        m.pointer_enter(start);
        m.activate(start);
        assert!(m.pointer_leave(start + ms(100)).is_empty());
        assert!(m.pointer_enter(start + ms(200)).is_empty());
        assert!(m.advance(start + ms(2999)).is_empty());
        let out = m.advance(start + ms(3000));
        assert_eq!(states(&out), vec![InteractionState::Idle]);
    }

    #[test]
    fn enter_while_not_idle_is_ignored() {
        let start = Instant::now();
        let mut m = immersive();
        m.pointer_enter(start);
        assert!(m.pointer_enter(start + ms(10)).is_empty());
        // The dwell deadline was not re-armed.
        m.advance(start + ms(1500));
        assert_eq!(m.state(), InteractionState::Expanded);
    }

    #[test]
    fn unmount_mid_dwell_prevents_expansion() {
        let start = Instant::now();
        let mut m = immersive();
        m.pointer_enter(start);
        m.unmount();
        assert!(!m.has_pending_timer());
        assert!(m.advance(start + ms(200)).is_empty());
        assert!(m.advance(start + ms(5000)).is_empty());
        assert!(m.pointer_leave(start + ms(5000)).is_empty());
        assert_ne!(m.state(), InteractionState::Expanded);
        // Unmounting twice is harmless.
        m.unmount();
    }

    #[test]
    fn gaze_input_behaves_like_pointer() {
        let start = Instant::now();
        let mut m = immersive();
        let out = m.handle(InputEvent::Enter, InputSource::Gaze, start);
        assert_eq!(m.state(), InteractionState::Dwelling);
        assert_eq!(out.transitions.len(), 2);
    }

    #[test]
    fn custom_timing_is_respected() {
        let timing = InteractionTiming {
            dwell: ms(200),
            cooldown: ms(400),
        };
        let start = Instant::now();
        let mut m = InteractionMachine::new(&item(), RenderMode::Immersive, timing);
        m.pointer_enter(start);
        m.advance(start + ms(200));
        assert_eq!(m.state(), InteractionState::Expanded);
        m.activate(start + ms(250));
        m.advance(start + ms(650));
        assert_eq!(m.state(), InteractionState::Idle);
    }
}
