//! [`SceneComposer`] – orchestrates the engine for one session.
//!
//! The composer owns every piece of per-session state: the render mode
//! (decided once at construction), the era-ordered collection, the page
//! cursor, the solved layout of the visible page and one
//! [`InteractionMachine`] per visible item.
//!
//! Lifecycle of the visible page:
//!
//! 1. A feed snapshot or page move changes which items are visible.
//! 2. The layout for the new page is solved synchronously.
//! 3. Machines of items that left the page are unmounted (their timers are
//!    cancelled); items that stayed keep their state; newcomers get a fresh
//!    machine in `idle`.
//!
//! An empty page never reaches the solver.
//!
//! # Example
//!
//! ```rust
//! use std::time::Instant;
//! use memlane_kernel::ImmersiveSignal;
//! use memlane_runtime::composer::{ComposerConfig, SceneComposer};
//! use memlane_runtime::feed::FeedSnapshot;
//! use memlane_runtime::renderer::SceneView;
//! use memlane_types::MemoryRecord;
//!
//! let mut composer = SceneComposer::new(ImmersiveSignal::Supported, ComposerConfig::default())
//!     .expect("default arc configuration is valid");
//! assert_eq!(composer.view(Instant::now()), SceneView::Loading);
//!
//! let records = vec![MemoryRecord {
//!     id: "p-1".into(),
//!     image_url: None,
//!     caption: "Harbour".into(),
//!     date_label: "1999".into(),
//!     era: "recent".into(),
//! }];
//! composer.apply_snapshot(FeedSnapshot::ready(records));
//! assert!(composer.view(Instant::now()).frame().is_some());
//! ```

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use memlane_kernel::{
    CapabilityDetector, ImmersiveSignal, InputEvent, InputSource, InteractionMachine,
    InteractionOutcome, InteractionTiming, RenderMode,
};
use memlane_layout::{ArcConfig, IMMERSIVE_PAGE_SIZE, Layout, LayoutSolver, Paginator, build_era_ordered};
use memlane_middleware::{EventBus, NarrationSink};
use memlane_types::{Event, EventPayload, FeedStatus, InteractionState, MemlaneError, MemoryItem};
use tracing::{debug, info, trace, warn};

use crate::feed::FeedSnapshot;
use crate::renderer::{
    DEFAULT_GRID_COLUMNS, PaginatorView, SceneRenderer, SceneView, VisibleItem, renderer_for,
};

const SOURCE: &str = "memlane-runtime::composer";

// ─────────────────────────────────────────────────────────────────────────────
// Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// Configuration bundle for [`SceneComposer`].
#[derive(Debug, Clone)]
pub struct ComposerConfig {
    /// Items per page in flat mode.  Immersive mode always uses
    /// [`IMMERSIVE_PAGE_SIZE`].
    pub flat_page_size: usize,
    /// Columns of the flat grid.
    pub grid_columns: usize,
    pub timing: InteractionTiming,
    pub arc: ArcConfig,
}

impl Default for ComposerConfig {
    fn default() -> Self {
        Self {
            flat_page_size: IMMERSIVE_PAGE_SIZE,
            grid_columns: DEFAULT_GRID_COLUMNS,
            timing: InteractionTiming::default(),
            arc: ArcConfig::default(),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// SceneComposer
// ─────────────────────────────────────────────────────────────────────────────

/// Owns and drives all per-session engine state.
pub struct SceneComposer {
    mode: RenderMode,
    renderer: Box<dyn SceneRenderer>,
    solver: LayoutSolver,
    timing: InteractionTiming,
    status: FeedStatus,
    items: Vec<MemoryItem>,
    paginator: Paginator,
    layout: Layout,
    machines: HashMap<String, InteractionMachine>,
    narration: Option<Arc<dyn NarrationSink>>,
    bus: Option<EventBus>,
    layout_passes: usize,
    narration_ready: bool,
    person_name: Option<String>,
}

impl SceneComposer {
    /// Decide the render mode from `signal` and validate the arc layout.
    ///
    /// # Errors
    ///
    /// [`MemlaneError::InvalidLayout`] when `config.arc` would make adjacent
    /// panels overlap.
    pub fn new(signal: ImmersiveSignal, config: ComposerConfig) -> Result<Self, MemlaneError> {
        let mode = CapabilityDetector::new().detect(signal);
        let solver = LayoutSolver::new(config.arc)?;
        let page_size = match mode {
            RenderMode::Immersive => IMMERSIVE_PAGE_SIZE,
            RenderMode::Flat => config.flat_page_size,
        };
        Ok(Self {
            mode,
            renderer: renderer_for(mode, config.grid_columns),
            solver,
            timing: config.timing,
            status: FeedStatus::Loading,
            items: Vec::new(),
            paginator: Paginator::new(page_size),
            layout: Layout::new(),
            machines: HashMap::new(),
            narration: None,
            bus: None,
            layout_passes: 0,
            narration_ready: false,
            person_name: None,
        })
    }

    /// Forward selection events to `sink`.
    pub fn with_narration(mut self, sink: Arc<dyn NarrationSink>) -> Self {
        self.narration = Some(sink);
        self
    }

    /// Publish interaction, page and feed events on `bus`.
    pub fn with_bus(mut self, bus: EventBus) -> Self {
        self.bus = Some(bus);
        self
    }

    // ── Accessors ────────────────────────────────────────────────────────────

    pub fn mode(&self) -> RenderMode {
        self.mode
    }

    pub fn status(&self) -> &FeedStatus {
        &self.status
    }

    /// Number of layout computations performed so far.
    pub fn layout_passes(&self) -> usize {
        self.layout_passes
    }

    pub fn narration_ready(&self) -> bool {
        self.narration_ready
    }

    pub fn person_name(&self) -> Option<&str> {
        self.person_name.as_deref()
    }

    pub fn page_index(&self) -> usize {
        self.paginator.page_index()
    }

    pub fn page_count(&self) -> usize {
        self.paginator.page_count()
    }

    /// Ids on the current page, in page order.
    pub fn visible_ids(&self) -> Vec<&str> {
        self.paginator
            .page(&self.items)
            .iter()
            .map(|item| item.id.as_str())
            .collect()
    }

    /// Interaction state of a visible item.
    pub fn item_state(&self, id: &str) -> Option<InteractionState> {
        self.machines.get(id).map(InteractionMachine::state)
    }

    /// Whether any visible item has a pending dwell or cooldown.
    pub fn has_pending_timers(&self) -> bool {
        self.machines.values().any(InteractionMachine::has_pending_timer)
    }

    // ── Feed ─────────────────────────────────────────────────────────────────

    /// Apply a feed observation.
    pub fn apply_snapshot(&mut self, snapshot: FeedSnapshot) {
        self.narration_ready = snapshot.narration_ready;
        if snapshot.person_name.is_some() {
            self.person_name = snapshot.person_name;
        }
        match snapshot.status {
            FeedStatus::Loading => {
                self.status = FeedStatus::Loading;
                self.refresh_visible();
            }
            FeedStatus::Error(message) => {
                warn!(error = %message, "memory feed reported failure");
                self.replace_items(Vec::new());
                self.status = FeedStatus::Error(message);
            }
            FeedStatus::Ready => {
                let items = build_era_ordered(&snapshot.records);
                info!(
                    records = snapshot.records.len(),
                    items = items.len(),
                    "memory collection updated"
                );
                self.status = FeedStatus::Ready;
                self.replace_items(items);
            }
        }
        self.publish(EventPayload::FeedStatus(self.status.clone()));
    }

    /// Move from the error state back to loading.  Returns `false` (and does
    /// nothing) in any other state.
    pub fn retry(&mut self) -> bool {
        if !matches!(self.status, FeedStatus::Error(_)) {
            debug!(status = ?self.status, "retry ignored outside the error state");
            return false;
        }
        info!("retrying memory feed");
        self.status = FeedStatus::Loading;
        self.publish(EventPayload::FeedStatus(FeedStatus::Loading));
        true
    }

    fn replace_items(&mut self, items: Vec<MemoryItem>) {
        self.items = items;
        self.paginator.set_total(self.items.len());
        self.refresh_visible();
    }

    // ── Pagination ───────────────────────────────────────────────────────────

    pub fn next_page(&mut self) -> bool {
        let moved = self.paginator.next();
        self.after_page_move(moved)
    }

    pub fn previous_page(&mut self) -> bool {
        let moved = self.paginator.previous();
        self.after_page_move(moved)
    }

    /// Jump to `page_index`, clamping silently.  Returns `true` when the
    /// visible page changed.
    pub fn go_to_page(&mut self, page_index: usize) -> bool {
        let before = self.paginator.page_index();
        let moved = self.paginator.go_to(page_index) != before;
        self.after_page_move(moved)
    }

    fn after_page_move(&mut self, moved: bool) -> bool {
        if moved {
            self.refresh_visible();
            info!(
                page = self.paginator.page_index(),
                pages = self.paginator.page_count(),
                "page changed"
            );
            self.publish(EventPayload::PageChanged {
                page_index: self.paginator.page_index(),
                page_count: self.paginator.page_count(),
            });
        }
        moved
    }

    /// Re-solve the visible page and reconcile interaction machines.  Nothing
    /// is mounted unless the feed is ready.
    fn refresh_visible(&mut self) {
        let visible = self.paginator.page(&self.items);
        if visible.is_empty() || self.status != FeedStatus::Ready {
            self.layout.clear();
            self.unmount_all();
            return;
        }

        self.layout = self.solver.solve(visible);
        self.layout_passes += 1;

        let before = self.machines.len();
        self.machines.retain(|id, machine| {
            let keep = visible.iter().any(|item| &item.id == id);
            if !keep {
                machine.unmount();
            }
            keep
        });
        let unmounted = before - self.machines.len();

        let mut mounted = 0;
        for item in visible {
            if !self.machines.contains_key(&item.id) {
                self.machines.insert(
                    item.id.clone(),
                    InteractionMachine::new(item, self.mode, self.timing),
                );
                mounted += 1;
            }
        }
        debug!(
            visible = visible.len(),
            mounted,
            unmounted,
            pass = self.layout_passes,
            "visible page refreshed"
        );
    }

    fn unmount_all(&mut self) {
        for machine in self.machines.values_mut() {
            machine.unmount();
        }
        self.machines.clear();
    }

    // ── Interaction ──────────────────────────────────────────────────────────

    /// Route an input to the machine of a visible item.  Returns `None` when
    /// `item_id` is not visible.
    pub fn handle_input(
        &mut self,
        item_id: &str,
        event: InputEvent,
        source: InputSource,
        now: Instant,
    ) -> Option<InteractionOutcome> {
        let Some(machine) = self.machines.get_mut(item_id) else {
            debug!(%item_id, ?event, "input for an item that is not visible; ignored");
            return None;
        };
        let outcome = machine.handle(event, source, now);
        self.dispatch(item_id, &outcome);
        Some(outcome)
    }

    /// Fire every due dwell and cooldown deadline.
    pub fn tick(&mut self, now: Instant) -> usize {
        let mut fired = Vec::new();
        for (id, machine) in self.machines.iter_mut() {
            let outcome = machine.advance(now);
            if !outcome.is_empty() {
                fired.push((id.clone(), outcome));
            }
        }
        for (id, outcome) in &fired {
            self.dispatch(id, outcome);
        }
        fired.len()
    }

    fn dispatch(&self, item_id: &str, outcome: &InteractionOutcome) {
        for transition in &outcome.transitions {
            self.publish(EventPayload::Interaction {
                item_id: item_id.to_string(),
                from: transition.from,
                to: transition.to,
            });
        }
        if let Some(selection) = &outcome.selection {
            info!(%item_id, era = %selection.era, "memory selected");
            if let Some(sink) = &self.narration
                && let Err(e) = sink.notify(selection)
            {
                warn!(%item_id, error = %e, "selection notification failed; continuing");
            }
        }
    }

    /// Unmount every visible item.  Used on session shutdown.
    pub fn shutdown(&mut self) {
        let count = self.machines.len();
        self.unmount_all();
        debug!(count, "all items unmounted");
    }

    // ── View ─────────────────────────────────────────────────────────────────

    /// What the host should draw at `now`.
    pub fn view(&self, now: Instant) -> SceneView {
        match &self.status {
            FeedStatus::Loading => SceneView::Loading,
            FeedStatus::Error(message) => SceneView::Error {
                message: message.clone(),
                can_retry: true,
            },
            FeedStatus::Ready if self.items.is_empty() => SceneView::Empty,
            FeedStatus::Ready => {
                let visible: Vec<VisibleItem<'_>> = self
                    .paginator
                    .page(&self.items)
                    .iter()
                    .filter_map(|item| {
                        let position = *self.layout.get(&item.id)?;
                        let machine = self.machines.get(&item.id);
                        Some(VisibleItem {
                            item,
                            position,
                            state: machine.map_or(InteractionState::Idle, InteractionMachine::state),
                            dwell_progress: machine.map_or(0.0, |m| m.dwell_progress(now)),
                        })
                    })
                    .collect();
                SceneView::Scene(self.renderer.render(self.paginator_view(), &visible))
            }
        }
    }

    fn paginator_view(&self) -> PaginatorView {
        PaginatorView {
            page_index: self.paginator.page_index(),
            page_count: self.paginator.page_count(),
            has_previous: self.paginator.has_previous(),
            has_next: self.paginator.has_next(),
            total_items: self.paginator.total(),
        }
    }

    // ── Events ───────────────────────────────────────────────────────────────

    fn publish(&self, payload: EventPayload) {
        if let Some(bus) = &self.bus
            && let Err(e) = bus.publish(Event::new(SOURCE, payload))
        {
            trace!(error = %e, "scene event not delivered");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::time::Duration;

    use memlane_middleware::Topic;
    use memlane_types::{MemoryRecord, SelectionEvent};

    use crate::renderer::{Placement, TileImage};

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    fn record(id: &str, era: &str) -> MemoryRecord {
        MemoryRecord {
            id: id.to_string(),
            image_url: Some(format!("https://cdn.example/{id}.jpg")),
            caption: format!("caption {id}"),
            date_label: "2001".to_string(),
            era: era.to_string(),
        }
    }

    fn recent(n: usize) -> Vec<MemoryRecord> {
        (0..n).map(|i| record(&format!("r{i}"), "recent")).collect()
    }

    fn immersive() -> SceneComposer {
        SceneComposer::new(ImmersiveSignal::Supported, ComposerConfig::default()).unwrap()
    }

    fn flat() -> SceneComposer {
        SceneComposer::new(ImmersiveSignal::Indeterminate, ComposerConfig::default()).unwrap()
    }

    #[derive(Default)]
    struct RecordingSink {
        events: Mutex<Vec<SelectionEvent>>,
    }

    impl NarrationSink for RecordingSink {
        fn notify(&self, event: &SelectionEvent) -> Result<(), MemlaneError> {
            self.events.lock().unwrap().push(event.clone());
            Ok(())
        }
    }

    struct FailingSink;

    impl NarrationSink for FailingSink {
        fn notify(&self, _event: &SelectionEvent) -> Result<(), MemlaneError> {
            Err(MemlaneError::NarrationDelivery("voice agent offline".into()))
        }
    }

    #[test]
    fn starts_loading_with_mode_fixed() {
        let c = immersive();
        assert_eq!(c.mode(), RenderMode::Immersive);
        assert_eq!(c.view(Instant::now()), SceneView::Loading);
        assert_eq!(flat().mode(), RenderMode::Flat);
    }

    #[test]
    fn cramped_arc_is_rejected_at_construction() {
        let mut config = ComposerConfig::default();
        config.arc.step_deg = 3.0;
        assert!(SceneComposer::new(ImmersiveSignal::Supported, config).is_err());
    }

    #[test]
    fn empty_collection_shows_empty_state_without_layout() {
        let mut c = immersive();
        c.apply_snapshot(FeedSnapshot::ready(Vec::new()));
        assert_eq!(c.view(Instant::now()), SceneView::Empty);
        assert_eq!(c.layout_passes(), 0);
    }

    #[test]
    fn only_unknown_eras_is_also_empty() {
        let mut c = immersive();
        c.apply_snapshot(FeedSnapshot::ready(vec![record("x", "unknown"), record("y", "")]));
        assert_eq!(c.view(Instant::now()), SceneView::Empty);
        assert_eq!(c.layout_passes(), 0);
    }

    #[test]
    fn twenty_five_recent_items_paginate_and_centre_last_page() {
        let mut c = immersive();
        c.apply_snapshot(FeedSnapshot::ready(recent(25)));
        assert_eq!(c.page_count(), 3);
        assert_eq!(c.visible_ids().len(), 12);
        assert!(c.next_page());
        assert_eq!(c.visible_ids().len(), 12);
        assert!(c.next_page());
        assert!(!c.next_page());

        let view = c.view(Instant::now());
        let frame = view.frame().unwrap();
        assert_eq!(frame.tiles.len(), 1);
        match frame.tiles[0].placement {
            Placement::Spatial { yaw_deg, .. } => assert_eq!(yaw_deg, 0.0),
            ref other => panic!("unexpected placement {other:?}"),
        }
        assert_eq!(frame.paginator.label(), "Page 3 of 3");
        assert!(!frame.paginator.has_next);
        assert!(frame.paginator.has_previous);
    }

    #[test]
    fn tiles_follow_era_order() {
        let mut c = immersive();
        c.apply_snapshot(FeedSnapshot::ready(vec![
            record("r", "recent"),
            record("c", "childhood"),
            record("u", "unknown"),
            record("f", "family"),
        ]));
        assert_eq!(c.visible_ids(), vec!["c", "f", "r"]);
    }

    #[test]
    fn flat_mode_expands_on_hover_without_timer() {
        let mut c = flat();
        c.apply_snapshot(FeedSnapshot::ready(recent(3)));
        let now = Instant::now();
        c.handle_input("r1", InputEvent::Enter, InputSource::Pointer, now);
        assert_eq!(c.item_state("r1"), Some(InteractionState::Expanded));
        assert!(!c.has_pending_timers());

        let view = c.view(now);
        let frame = view.frame().unwrap();
        assert!(matches!(frame.tiles[1].placement, Placement::Grid { row: 0, column: 1 }));
        // Flat mode still solves the page once.
        assert_eq!(c.layout_passes(), 1);
    }

    #[test]
    fn immersive_dwell_expands_through_tick() {
        let mut c = immersive();
        c.apply_snapshot(FeedSnapshot::ready(recent(2)));
        let start = Instant::now();
        c.handle_input("r0", InputEvent::Enter, InputSource::Gaze, start);
        assert_eq!(c.item_state("r0"), Some(InteractionState::Dwelling));

        assert_eq!(c.tick(start + ms(700)), 0);
        let view = c.view(start + ms(750));
        let progress = view.frame().unwrap().tile("r0").unwrap().dwell_progress;
        assert!((progress - 0.5).abs() < 1e-3);

        assert_eq!(c.tick(start + ms(1500)), 1);
        assert_eq!(c.item_state("r0"), Some(InteractionState::Expanded));
    }

    #[test]
    fn activation_notifies_sink_exactly_once() {
        let sink = Arc::new(RecordingSink::default());
        let mut c = flat().with_narration(sink.clone());
        c.apply_snapshot(FeedSnapshot::ready(recent(1)));
        let now = Instant::now();

        c.handle_input("r0", InputEvent::Enter, InputSource::Pointer, now);
        c.handle_input("r0", InputEvent::Leave, InputSource::Pointer, now);
        assert!(sink.events.lock().unwrap().is_empty());

        c.handle_input("r0", InputEvent::Enter, InputSource::Pointer, now);
        c.handle_input("r0", InputEvent::Activate, InputSource::Pointer, now);
        c.handle_input("r0", InputEvent::Activate, InputSource::Pointer, now + ms(10));

        let events = sink.events.lock().unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].item_id, "r0");
        assert_eq!(events[0].caption, "caption r0");
    }

    #[test]
    fn failing_sink_does_not_block_cooldown() {
        let mut c = flat().with_narration(Arc::new(FailingSink));
        c.apply_snapshot(FeedSnapshot::ready(recent(1)));
        let now = Instant::now();
        c.handle_input("r0", InputEvent::Enter, InputSource::Pointer, now);
        let outcome = c
            .handle_input("r0", InputEvent::Activate, InputSource::Pointer, now)
            .unwrap();
        assert!(outcome.selection.is_some());
        assert_eq!(c.item_state("r0"), Some(InteractionState::SelectedCooldown));

        c.tick(now + ms(3000));
        assert_eq!(c.item_state("r0"), Some(InteractionState::Idle));
    }

    #[test]
    fn page_change_unmounts_dwelling_item() {
        let mut c = immersive();
        c.apply_snapshot(FeedSnapshot::ready(recent(13)));
        let start = Instant::now();
        c.handle_input("r0", InputEvent::Enter, InputSource::Pointer, start);
        c.tick(start + ms(200));

        assert!(c.next_page());
        assert_eq!(c.item_state("r0"), None);
        assert!(!c.has_pending_timers());
        assert_eq!(c.tick(start + ms(2000)), 0);

        // Coming back mounts a fresh machine.
        assert!(c.previous_page());
        assert_eq!(c.item_state("r0"), Some(InteractionState::Idle));
    }

    #[test]
    fn collection_update_keeps_state_of_items_still_visible() {
        let mut c = flat();
        c.apply_snapshot(FeedSnapshot::ready(recent(3)));
        let now = Instant::now();
        c.handle_input("r0", InputEvent::Enter, InputSource::Pointer, now);
        c.handle_input("r2", InputEvent::Enter, InputSource::Pointer, now);

        let mut records = recent(2);
        records.push(record("n", "childhood"));
        c.apply_snapshot(FeedSnapshot::ready(records));

        assert_eq!(c.item_state("r0"), Some(InteractionState::Expanded));
        assert_eq!(c.item_state("r2"), None);
        assert_eq!(c.item_state("n"), Some(InteractionState::Idle));
        assert_eq!(c.layout_passes(), 2);
    }

    #[test]
    fn shrinking_collection_clamps_page() {
        let mut c = immersive();
        c.apply_snapshot(FeedSnapshot::ready(recent(25)));
        c.go_to_page(2);
        c.apply_snapshot(FeedSnapshot::ready(recent(5)));
        assert_eq!(c.page_index(), 0);
        assert_eq!(c.visible_ids().len(), 5);
    }

    #[test]
    fn go_to_page_clamps_and_reports_moves() {
        let mut c = immersive();
        c.apply_snapshot(FeedSnapshot::ready(recent(25)));
        assert!(c.go_to_page(99));
        assert_eq!(c.page_index(), 2);
        assert!(!c.go_to_page(7));
    }

    #[test]
    fn input_for_invisible_item_is_ignored() {
        let mut c = immersive();
        c.apply_snapshot(FeedSnapshot::ready(recent(13)));
        assert!(
            c.handle_input("r12", InputEvent::Enter, InputSource::Pointer, Instant::now())
                .is_none()
        );
    }

    #[test]
    fn feed_error_offers_retry_once() {
        let mut c = immersive();
        assert!(!c.retry());
        c.apply_snapshot(FeedSnapshot::error("Memory 'm-1' does not exist"));
        assert_eq!(
            c.view(Instant::now()),
            SceneView::Error {
                message: "Memory 'm-1' does not exist".into(),
                can_retry: true
            }
        );
        assert!(c.retry());
        assert_eq!(c.view(Instant::now()), SceneView::Loading);
        assert!(!c.retry());
    }

    #[test]
    fn error_after_ready_drops_items_and_timers() {
        let mut c = immersive();
        c.apply_snapshot(FeedSnapshot::ready(recent(2)));
        c.handle_input("r0", InputEvent::Enter, InputSource::Pointer, Instant::now());
        c.apply_snapshot(FeedSnapshot::error("offline"));
        assert!(!c.has_pending_timers());
        assert!(c.visible_ids().is_empty());
    }

    #[test]
    fn reload_unmounts_items_until_ready_again() {
        let mut c = immersive();
        c.apply_snapshot(FeedSnapshot::ready(recent(3)));
        let start = Instant::now();
        c.handle_input("r0", InputEvent::Enter, InputSource::Gaze, start);
        assert!(c.has_pending_timers());

        c.apply_snapshot(FeedSnapshot::loading());
        assert_eq!(c.view(start), SceneView::Loading);
        assert_eq!(c.item_state("r0"), None);
        assert!(!c.has_pending_timers());
        assert!(
            c.handle_input("r1", InputEvent::Enter, InputSource::Gaze, start)
                .is_none()
        );
        assert_eq!(c.tick(start + ms(2000)), 0);

        // Page moves while loading mount nothing either.
        c.next_page();
        assert_eq!(c.item_state("r0"), None);

        c.apply_snapshot(FeedSnapshot::ready(recent(3)));
        assert_eq!(c.item_state("r0"), Some(InteractionState::Idle));
    }

    #[test]
    fn missing_image_renders_placeholder() {
        let mut c = flat();
        let mut r = record("p", "family");
        r.image_url = None;
        c.apply_snapshot(FeedSnapshot::ready(vec![r]));
        let view = c.view(Instant::now());
        assert_eq!(
            view.frame().unwrap().tile("p").unwrap().image,
            TileImage::BrokenPlaceholder
        );
    }

    #[test]
    fn shutdown_cancels_everything() {
        let mut c = immersive();
        c.apply_snapshot(FeedSnapshot::ready(recent(4)));
        let now = Instant::now();
        for id in ["r0", "r1", "r2"] {
            c.handle_input(id, InputEvent::Enter, InputSource::Pointer, now);
        }
        assert!(c.has_pending_timers());
        c.shutdown();
        assert!(!c.has_pending_timers());
        assert_eq!(c.tick(now + ms(5000)), 0);
    }

    #[tokio::test]
    async fn transitions_and_pages_are_published_on_the_bus() {
        let bus = EventBus::default();
        let mut interactions = bus.subscribe_to(Topic::Interaction);
        let mut scene = bus.subscribe_to(Topic::Scene);
        let mut c = flat().with_bus(bus);

        c.apply_snapshot(FeedSnapshot::ready(recent(13)));
        match scene.recv().await.unwrap().payload {
            EventPayload::FeedStatus(FeedStatus::Ready) => {}
            other => panic!("unexpected payload {other:?}"),
        }

        c.handle_input("r0", InputEvent::Enter, InputSource::Pointer, Instant::now());
        let first = interactions.recv().await.unwrap();
        assert!(matches!(
            first.payload,
            EventPayload::Interaction {
                from: InteractionState::Idle,
                to: InteractionState::Hovered,
                ..
            }
        ));

        c.next_page();
        match scene.recv().await.unwrap().payload {
            EventPayload::PageChanged { page_index, page_count } => {
                assert_eq!((page_index, page_count), (1, 2));
            }
            other => panic!("unexpected payload {other:?}"),
        }
    }
}
