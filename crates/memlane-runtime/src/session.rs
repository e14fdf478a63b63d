//! [`SceneSession`] – the single-task event loop that hosts a composer.
//!
//! The session owns the [`SceneComposer`] outright; nothing else touches it.
//! Hosts talk to it through a [`SessionHandle`]: commands go in over an
//! `mpsc` channel and the current [`SceneView`] comes out over a `watch`
//! channel after every step.
//!
//! Each loop iteration waits for whichever comes first:
//!
//! 1. the in-flight feed load, if any, finishing,
//! 2. a [`SceneCommand`] from the host, or
//! 3. the periodic tick that fires due dwell and cooldown deadlines.
//!
//! The view reads [`SceneView::Loading`] while a load is in flight, and
//! [`SceneCommand::Shutdown`] still ends the loop if the feed never answers.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use memlane_kernel::ImmersiveSignal;
//! use memlane_runtime::composer::{ComposerConfig, SceneComposer};
//! use memlane_runtime::feed::StaticFeed;
//! use memlane_runtime::session::{SceneSession, SessionConfig};
//!
//! # async fn demo() {
//! let composer = SceneComposer::new(ImmersiveSignal::Unsupported, ComposerConfig::default()).unwrap();
//! let (session, handle) = SceneSession::new(composer, Arc::new(StaticFeed::ready(vec![])), SessionConfig::default());
//! tokio::spawn(session.run());
//! handle.next_page().await.unwrap();
//! # }
//! ```

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use memlane_kernel::{InputEvent, InputSource};
use memlane_types::MemlaneError;
use tokio::sync::{mpsc, watch};
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info};

use crate::composer::SceneComposer;
use crate::feed::{FeedSnapshot, MemoryFeed};
use crate::renderer::SceneView;

/// Default interval between timer ticks.
pub const DEFAULT_TICK: Duration = Duration::from_millis(50);

const COMMAND_CAPACITY: usize = 64;

type PendingLoad = Pin<Box<dyn Future<Output = FeedSnapshot> + Send>>;

// ─────────────────────────────────────────────────────────────────────────────
// Commands
// ─────────────────────────────────────────────────────────────────────────────

/// Everything a host can ask of a running session.
#[derive(Debug, Clone)]
pub enum SceneCommand {
    /// Viewer input aimed at one item.
    Input {
        item_id: String,
        event: InputEvent,
        source: InputSource,
    },
    NextPage,
    PreviousPage,
    GoToPage(usize),
    /// Reload the feed; only honoured in the error state.
    Retry,
    /// A pushed feed observation (e.g. the backend finished processing).
    FeedUpdate(FeedSnapshot),
    /// Unmount everything and stop the loop.
    Shutdown,
}

#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub tick: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self { tick: DEFAULT_TICK }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// SessionHandle
// ─────────────────────────────────────────────────────────────────────────────

/// Cheap, cloneable handle to a running [`SceneSession`].
#[derive(Clone)]
pub struct SessionHandle {
    commands: mpsc::Sender<SceneCommand>,
    view: watch::Receiver<SceneView>,
}

impl SessionHandle {
    /// Queue `command`.
    ///
    /// # Errors
    ///
    /// [`MemlaneError::Channel`] once the session has stopped.
    pub async fn send(&self, command: SceneCommand) -> Result<(), MemlaneError> {
        self.commands
            .send(command)
            .await
            .map_err(|e| MemlaneError::Channel(format!("scene session stopped: {e}")))
    }

    /// Blocking variant of [`send`][Self::send] for synchronous hosts such as
    /// a terminal REPL.  Must not be called from inside the runtime.
    pub fn send_blocking(&self, command: SceneCommand) -> Result<(), MemlaneError> {
        self.commands
            .blocking_send(command)
            .map_err(|e| MemlaneError::Channel(format!("scene session stopped: {e}")))
    }

    pub async fn input(
        &self,
        item_id: impl Into<String>,
        event: InputEvent,
        source: InputSource,
    ) -> Result<(), MemlaneError> {
        self.send(SceneCommand::Input {
            item_id: item_id.into(),
            event,
            source,
        })
        .await
    }

    pub async fn next_page(&self) -> Result<(), MemlaneError> {
        self.send(SceneCommand::NextPage).await
    }

    pub async fn previous_page(&self) -> Result<(), MemlaneError> {
        self.send(SceneCommand::PreviousPage).await
    }

    pub async fn retry(&self) -> Result<(), MemlaneError> {
        self.send(SceneCommand::Retry).await
    }

    pub async fn shutdown(&self) -> Result<(), MemlaneError> {
        self.send(SceneCommand::Shutdown).await
    }

    /// The most recently published view.
    pub fn view(&self) -> SceneView {
        self.view.borrow().clone()
    }

    /// A fresh receiver for view updates.
    pub fn watch(&self) -> watch::Receiver<SceneView> {
        self.view.clone()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// SceneSession
// ─────────────────────────────────────────────────────────────────────────────

/// The event loop.  Construct with [`SceneSession::new`], then drive
/// [`SceneSession::run`] on a Tokio task.
pub struct SceneSession {
    composer: SceneComposer,
    feed: Arc<dyn MemoryFeed>,
    commands: mpsc::Receiver<SceneCommand>,
    view: watch::Sender<SceneView>,
    tick: Duration,
}

impl SceneSession {
    pub fn new(
        composer: SceneComposer,
        feed: Arc<dyn MemoryFeed>,
        config: SessionConfig,
    ) -> (Self, SessionHandle) {
        let (command_tx, command_rx) = mpsc::channel(COMMAND_CAPACITY);
        let (view_tx, view_rx) = watch::channel(SceneView::Loading);
        let session = Self {
            composer,
            feed,
            commands: command_rx,
            view: view_tx,
            tick: config.tick.max(Duration::from_millis(1)),
        };
        let handle = SessionHandle {
            commands: command_tx,
            view: view_rx,
        };
        (session, handle)
    }

    /// Run until [`SceneCommand::Shutdown`] or until every handle is dropped.
    /// Returns the composer, with every item unmounted.
    pub async fn run(mut self) -> SceneComposer {
        info!(feed = %self.feed.describe(), mode = %self.composer.mode(), "scene session started");
        let mut load = self.start_load();
        let mut loading = true;
        self.publish_view();

        let mut ticker = tokio::time::interval(self.tick);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                snapshot = &mut load, if loading => {
                    loading = false;
                    self.composer.apply_snapshot(snapshot);
                }
                command = self.commands.recv() => {
                    match command {
                        Some(SceneCommand::Shutdown) | None => break,
                        Some(SceneCommand::Retry) => {
                            if self.composer.retry() {
                                load = self.start_load();
                                loading = true;
                            }
                        }
                        Some(SceneCommand::FeedUpdate(snapshot)) => {
                            if loading {
                                debug!("pushed snapshot supersedes the in-flight load");
                                loading = false;
                            }
                            self.composer.apply_snapshot(snapshot);
                        }
                        Some(command) => self.apply(command),
                    }
                }
                _ = ticker.tick() => {
                    self.composer.tick(now());
                }
            }
            self.publish_view();
        }

        if loading {
            info!("feed load abandoned on shutdown");
        }
        self.composer.shutdown();
        self.publish_view();
        info!("scene session stopped");
        self.composer
    }

    fn start_load(&self) -> PendingLoad {
        let feed = Arc::clone(&self.feed);
        Box::pin(async move { feed.load().await })
    }

    fn apply(&mut self, command: SceneCommand) {
        debug!(?command, "scene command");
        match command {
            SceneCommand::Input {
                item_id,
                event,
                source,
            } => {
                self.composer.handle_input(&item_id, event, source, now());
            }
            SceneCommand::NextPage => {
                self.composer.next_page();
            }
            SceneCommand::PreviousPage => {
                self.composer.previous_page();
            }
            SceneCommand::GoToPage(index) => {
                self.composer.go_to_page(index);
            }
            // Handled by the loop.
            SceneCommand::Retry | SceneCommand::FeedUpdate(_) | SceneCommand::Shutdown => {}
        }
    }

    fn publish_view(&self) {
        self.view.send_replace(self.composer.view(now()));
    }
}

/// Current instant on the Tokio clock, so paused test time drives the
/// dwell and cooldown deadlines too.
fn now() -> std::time::Instant {
    Instant::now().into_std()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use memlane_kernel::ImmersiveSignal;
    use memlane_middleware::NarrationSink;
    use memlane_types::{InteractionState, MemoryRecord, SelectionEvent};
    use std::sync::Mutex;

    use crate::composer::ComposerConfig;
    use crate::feed::StaticFeed;

    fn records(n: usize) -> Vec<MemoryRecord> {
        (0..n)
            .map(|i| MemoryRecord {
                id: format!("r{i}"),
                image_url: None,
                caption: format!("memory {i}"),
                date_label: "2010".to_string(),
                era: "recent".to_string(),
            })
            .collect()
    }

    fn composer(signal: ImmersiveSignal) -> SceneComposer {
        SceneComposer::new(signal, ComposerConfig::default()).unwrap()
    }

    /// Fails on the first load, succeeds afterwards.
    struct FlakyFeed {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl MemoryFeed for FlakyFeed {
        async fn load(&self) -> FeedSnapshot {
            if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
                FeedSnapshot::error("backend unreachable")
            } else {
                FeedSnapshot::ready(records(3))
            }
        }

        fn describe(&self) -> String {
            "flaky".into()
        }
    }

    /// Never answers.
    struct HangingFeed;

    #[async_trait]
    impl MemoryFeed for HangingFeed {
        async fn load(&self) -> FeedSnapshot {
            std::future::pending::<FeedSnapshot>().await
        }

        fn describe(&self) -> String {
            "hanging".into()
        }
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

    async fn wait_for_scene(handle: &SessionHandle) {
        let mut rx = handle.watch();
        tokio::time::timeout(
            Duration::from_secs(5),
            rx.wait_for(|v| matches!(v, SceneView::Scene(_))),
        )
        .await
        .expect("scene within timeout")
        .expect("session alive");
    }

    fn state_of(handle: &SessionHandle, id: &str) -> Option<InteractionState> {
        handle.view().frame()?.tile(id).map(|t| t.state)
    }

    #[tokio::test(start_paused = true)]
    async fn loads_feed_and_publishes_scene() {
        let (session, handle) = SceneSession::new(
            composer(ImmersiveSignal::Supported),
            Arc::new(StaticFeed::ready(records(25))),
            SessionConfig::default(),
        );
        let task = tokio::spawn(session.run());

        wait_for_scene(&handle).await;
        let view = handle.view();
        assert_eq!(view.frame().unwrap().tiles.len(), 12);

        handle.next_page().await.unwrap();
        handle.next_page().await.unwrap();
        handle.shutdown().await.unwrap();
        let composer = task.await.unwrap();
        assert_eq!(composer.page_index(), 2);
        assert!(!composer.has_pending_timers());
    }

    #[tokio::test(start_paused = true)]
    async fn dwell_completes_on_the_session_clock() {
        let (session, handle) = SceneSession::new(
            composer(ImmersiveSignal::Supported),
            Arc::new(StaticFeed::ready(records(2))),
            SessionConfig::default(),
        );
        let task = tokio::spawn(session.run());
        wait_for_scene(&handle).await;

        handle
            .input("r0", InputEvent::Enter, InputSource::Gaze)
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(700)).await;
        assert_eq!(state_of(&handle, "r0"), Some(InteractionState::Dwelling));

        tokio::time::sleep(Duration::from_millis(900)).await;
        assert_eq!(state_of(&handle, "r0"), Some(InteractionState::Expanded));

        handle.shutdown().await.unwrap();
        task.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn leave_mid_dwell_never_expands() {
        let (session, handle) = SceneSession::new(
            composer(ImmersiveSignal::Supported),
            Arc::new(StaticFeed::ready(records(1))),
            SessionConfig::default(),
        );
        let task = tokio::spawn(session.run());
        wait_for_scene(&handle).await;

        for _ in 0..2 {
            handle
                .input("r0", InputEvent::Enter, InputSource::Pointer)
                .await
                .unwrap();
            tokio::time::sleep(Duration::from_millis(750)).await;
            handle
                .input("r0", InputEvent::Leave, InputSource::Pointer)
                .await
                .unwrap();
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(state_of(&handle, "r0"), Some(InteractionState::Idle));

        handle.shutdown().await.unwrap();
        task.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn activation_reaches_sink_and_cools_down() {
        let sink = Arc::new(RecordingSink::default());
        let composer = composer(ImmersiveSignal::Unsupported).with_narration(sink.clone());
        let (session, handle) = SceneSession::new(
            composer,
            Arc::new(StaticFeed::ready(records(2))),
            SessionConfig::default(),
        );
        let task = tokio::spawn(session.run());
        wait_for_scene(&handle).await;

        handle
            .input("r1", InputEvent::Enter, InputSource::Pointer)
            .await
            .unwrap();
        handle
            .input("r1", InputEvent::Activate, InputSource::Pointer)
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(
            state_of(&handle, "r1"),
            Some(InteractionState::SelectedCooldown)
        );
        assert_eq!(sink.events.lock().unwrap().len(), 1);

        tokio::time::sleep(Duration::from_millis(3000)).await;
        assert_eq!(state_of(&handle, "r1"), Some(InteractionState::Idle));

        handle.shutdown().await.unwrap();
        task.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn retry_reloads_after_error() {
        let feed = Arc::new(FlakyFeed {
            calls: AtomicUsize::new(0),
        });
        let (session, handle) = SceneSession::new(
            composer(ImmersiveSignal::Supported),
            feed.clone(),
            SessionConfig::default(),
        );
        let task = tokio::spawn(session.run());

        let mut rx = handle.watch();
        rx.wait_for(|v| matches!(v, SceneView::Error { can_retry: true, .. }))
            .await
            .unwrap();

        handle.retry().await.unwrap();
        wait_for_scene(&handle).await;
        assert_eq!(feed.calls.load(Ordering::SeqCst), 2);

        // A second retry in the ready state does not reload.
        handle.retry().await.unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(feed.calls.load(Ordering::SeqCst), 2);

        handle.shutdown().await.unwrap();
        task.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn feed_update_to_empty_shows_empty_state() {
        let (session, handle) = SceneSession::new(
            composer(ImmersiveSignal::Supported),
            Arc::new(StaticFeed::ready(records(4))),
            SessionConfig::default(),
        );
        let task = tokio::spawn(session.run());
        wait_for_scene(&handle).await;

        handle
            .send(SceneCommand::FeedUpdate(FeedSnapshot::ready(Vec::new())))
            .await
            .unwrap();
        let mut rx = handle.watch();
        rx.wait_for(|v| *v == SceneView::Empty).await.unwrap();

        handle.shutdown().await.unwrap();
        let composer = task.await.unwrap();
        assert_eq!(composer.layout_passes(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_every_handle_stops_the_session() {
        let (session, handle) = SceneSession::new(
            composer(ImmersiveSignal::Supported),
            Arc::new(StaticFeed::ready(records(1))),
            SessionConfig::default(),
        );
        let task = tokio::spawn(session.run());
        drop(handle);
        tokio::time::timeout(Duration::from_secs(5), task)
            .await
            .expect("session stops")
            .unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn commands_are_served_while_the_feed_hangs() {
        let (session, handle) = SceneSession::new(
            composer(ImmersiveSignal::Supported),
            Arc::new(HangingFeed),
            SessionConfig::default(),
        );
        let task = tokio::spawn(session.run());

        handle.next_page().await.unwrap();
        handle
            .input("r0", InputEvent::Enter, InputSource::Gaze)
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(handle.view(), SceneView::Loading);

        // A pushed snapshot replaces the stuck load.
        handle
            .send(SceneCommand::FeedUpdate(FeedSnapshot::ready(records(2))))
            .await
            .unwrap();
        wait_for_scene(&handle).await;

        handle.shutdown().await.unwrap();
        tokio::time::timeout(Duration::from_secs(5), task)
            .await
            .expect("session stops")
            .unwrap();
    }

    #[tokio::test]
    async fn shutdown_ends_the_session_while_the_backend_is_silent() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                held.push(socket);
            }
        });

        let feed = crate::feed::HttpMemoryFeed::new(format!("http://{addr}"), "m-1");
        let (session, handle) = SceneSession::new(
            composer(ImmersiveSignal::Supported),
            Arc::new(feed),
            SessionConfig::default(),
        );
        let task = tokio::spawn(session.run());

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(handle.view(), SceneView::Loading);
        handle.shutdown().await.unwrap();

        let composer = tokio::time::timeout(Duration::from_secs(5), task)
            .await
            .expect("shutdown must not wait for the feed")
            .unwrap();
        assert!(!composer.has_pending_timers());
    }

    #[tokio::test]
    async fn send_after_stop_is_a_channel_error() {
        let (session, handle) = SceneSession::new(
            composer(ImmersiveSignal::Supported),
            Arc::new(StaticFeed::ready(Vec::new())),
            SessionConfig::default(),
        );
        drop(session);
        assert!(matches!(
            handle.next_page().await,
            Err(MemlaneError::Channel(_))
        ));
    }
}
