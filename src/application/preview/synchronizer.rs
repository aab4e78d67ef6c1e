//! LivePreviewSynchronizer - frame-coalesced preview state.
//!
//! Every mutation is queued and applied on the next frame, so any number of
//! edits within one frame produce exactly one published snapshot. Mode
//! switches and the live toggle bypass the queue and publish immediately.
//!
//! # Flow
//!
//! ```text
//! schedule_update ──► queue ──(first entry)──► FrameScheduler::request_frame
//!                                                         │
//!                      watch::Sender ◄── snapshot ◄── flush (drain, apply in order)
//! ```
//!
//! While live, a background task writes `{components, styles, previewMode}`
//! to the durable store on a fixed period.

use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use serde::Serialize;
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};

use crate::config::PreviewConfig;
use crate::domain::foundation::Timestamp;
use crate::domain::preview::{
    Component, ComponentPatch, ExportedSnapshot, LivePreviewState, PendingUpdate,
    PersistedPreview, PreviewMode, StyleMap, PENDING_UPDATE_TTL, PREVIEW_STORAGE_KEY,
};
use crate::ports::{Clock, DurableStore, FrameScheduler, StorageError};

/// A queued state change, applied on the next frame.
pub type Mutator = Box<dyn FnOnce(&mut LivePreviewState) + Send + 'static>;

/// One published view of the preview.
///
/// `frame` increases by one with every publication.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewSnapshot {
    pub frame: u64,
    pub state: LivePreviewState,
}

/// Configuration for the LivePreviewSynchronizer.
#[derive(Debug, Clone)]
pub struct LivePreviewConfig {
    /// How often live state is written to the store.
    pub persist_interval: Duration,
    /// How long a pending-update marker is reported.
    pub pending_update_ttl: Duration,
}

impl Default for LivePreviewConfig {
    fn default() -> Self {
        Self {
            persist_interval: Duration::from_secs(5),
            pending_update_ttl: PENDING_UPDATE_TTL,
        }
    }
}

impl LivePreviewConfig {
    pub fn from_settings(preview: &PreviewConfig) -> Self {
        Self {
            persist_interval: preview.persist_interval(),
            pending_update_ttl: preview.pending_update_ttl(),
        }
    }

    /// Create config with custom persist interval.
    pub fn with_persist_interval(mut self, interval: Duration) -> Self {
        self.persist_interval = interval;
        self
    }
}

#[derive(Default)]
struct Batch {
    queue: Vec<Mutator>,
    frame_requested: bool,
}

struct Published {
    frame: u64,
    state: LivePreviewState,
}

struct Inner {
    scheduler: Arc<dyn FrameScheduler>,
    clock: Arc<dyn Clock>,
    store: Arc<dyn DurableStore>,
    config: LivePreviewConfig,
    batch: Mutex<Batch>,
    published: Mutex<Published>,
    pending: Mutex<Vec<PendingUpdate>>,
    snapshots: watch::Sender<PreviewSnapshot>,
    persist_task: Mutex<Option<JoinHandle<()>>>,
    restored: Mutex<bool>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl Inner {
    /// Applies every queued mutator to a working copy and publishes once.
    fn flush(&self) {
        let queue = {
            let mut batch = lock(&self.batch);
            batch.frame_requested = false;
            std::mem::take(&mut batch.queue)
        };
        if queue.is_empty() {
            return;
        }

        let applied = queue.len();
        self.commit(move |state| {
            for mutator in queue {
                if panic::catch_unwind(AssertUnwindSafe(|| mutator(&mut *state))).is_err() {
                    tracing::warn!("preview mutator panicked, continuing with remaining updates");
                }
            }
        });
        tracing::trace!(applied, "preview frame flushed");
    }

    /// Mutates a working copy, stamps it and publishes the next frame.
    fn commit(&self, change: impl FnOnce(&mut LivePreviewState)) -> PreviewSnapshot {
        let mut published = lock(&self.published);
        let mut working = published.state.clone();
        change(&mut working);
        working.last_update = self.clock.now();

        published.frame += 1;
        published.state = working;
        let snapshot = PreviewSnapshot {
            frame: published.frame,
            state: published.state.clone(),
        };
        // Sent under the lock so receivers observe frames in order
        self.snapshots.send_replace(snapshot.clone());
        snapshot
    }

    fn current_state(&self) -> LivePreviewState {
        lock(&self.published).state.clone()
    }

    async fn persist(&self) -> Result<(), StorageError> {
        let persisted = PersistedPreview::from_state(&self.current_state());
        let json = serde_json::to_string(&persisted)
            .map_err(|e| StorageError::SerializationFailed(e.to_string()))?;
        self.store.set_item(PREVIEW_STORAGE_KEY, &json).await
    }
}

impl Drop for Inner {
    fn drop(&mut self) {
        if let Some(task) = lock(&self.persist_task).take() {
            task.abort();
        }
    }
}

/// Coalesces preview edits into one snapshot per frame.
///
/// Cheap to clone; clones share the same state.
///
/// Mutators run against a working copy while the state lock is held. They
/// may call [`schedule_update`](Self::schedule_update), which queues for the
/// following frame, but must not call the immediate operations.
#[derive(Clone)]
pub struct LivePreviewSynchronizer {
    inner: Arc<Inner>,
}

impl LivePreviewSynchronizer {
    /// Create a new synchronizer with default configuration.
    pub fn new(
        scheduler: Arc<dyn FrameScheduler>,
        clock: Arc<dyn Clock>,
        store: Arc<dyn DurableStore>,
    ) -> Self {
        Self::with_config(scheduler, clock, store, LivePreviewConfig::default())
    }

    /// Create a new synchronizer with custom configuration.
    pub fn with_config(
        scheduler: Arc<dyn FrameScheduler>,
        clock: Arc<dyn Clock>,
        store: Arc<dyn DurableStore>,
        config: LivePreviewConfig,
    ) -> Self {
        let initial = LivePreviewState::new(clock.now());
        let (snapshots, _) = watch::channel(PreviewSnapshot {
            frame: 0,
            state: initial.clone(),
        });

        Self {
            inner: Arc::new(Inner {
                scheduler,
                clock,
                store,
                config,
                batch: Mutex::new(Batch::default()),
                published: Mutex::new(Published {
                    frame: 0,
                    state: initial,
                }),
                pending: Mutex::new(Vec::new()),
                snapshots,
                persist_task: Mutex::new(None),
                restored: Mutex::new(false),
            }),
        }
    }

    /// Receiver of published snapshots. Starts at the latest one.
    pub fn subscribe(&self) -> watch::Receiver<PreviewSnapshot> {
        self.inner.snapshots.subscribe()
    }

    /// The last published state.
    pub fn state(&self) -> LivePreviewState {
        self.inner.current_state()
    }

    /// Sequence number of the last published snapshot; 0 before any.
    pub fn frame(&self) -> u64 {
        lock(&self.inner.published).frame
    }

    /// Number of mutators waiting for the next frame.
    pub fn queued(&self) -> usize {
        lock(&self.inner.batch).queue.len()
    }

    /// Queues `mutator` for the next frame, requesting one if none is
    /// outstanding.
    pub fn schedule_update<F>(&self, mutator: F)
    where
        F: FnOnce(&mut LivePreviewState) + Send + 'static,
    {
        let request_frame = {
            let mut batch = lock(&self.inner.batch);
            batch.queue.push(Box::new(mutator));
            !std::mem::replace(&mut batch.frame_requested, true)
        };

        if request_frame {
            let inner: Weak<Inner> = Arc::downgrade(&self.inner);
            self.inner.scheduler.request_frame(Box::new(move || {
                if let Some(inner) = inner.upgrade() {
                    inner.flush();
                }
            }));
        }
    }

    /// Patches a component on the next frame and marks it as pending.
    pub fn update_component(&self, id: impl Into<String>, patch: ComponentPatch) {
        let id = id.into();
        let now = self.inner.clock.now();
        {
            let ttl = self.inner.config.pending_update_ttl;
            let mut pending = lock(&self.inner.pending);
            pending.retain(|p| !p.is_expired(now, ttl));
            pending.push(PendingUpdate {
                component_id: id.clone(),
                updates: patch.clone(),
                created_at: now,
            });
        }

        self.schedule_update(move |state| {
            if !state.patch_component(&id, &patch) {
                tracing::debug!(component_id = %id, "patch for unknown component ignored");
            }
        });
    }

    /// Adds a component, replacing any with the same id.
    pub fn add_component(&self, component: Component) {
        self.schedule_update(move |state| state.upsert_component(component));
    }

    pub fn remove_component(&self, id: impl Into<String>) {
        let id = id.into();
        self.schedule_update(move |state| {
            state.remove_component(&id);
        });
    }

    /// Replaces the whole component list.
    pub fn sync_components(&self, components: Vec<Component>) {
        self.schedule_update(move |state| state.components = components);
    }

    /// Merges global style entries. A `null` value removes the entry.
    pub fn update_styles(&self, styles: StyleMap) {
        self.schedule_update(move |state| {
            for (key, value) in styles {
                if value.is_null() {
                    state.styles.remove(&key);
                } else {
                    state.styles.insert(key, value);
                }
            }
        });
    }

    pub fn clear_components(&self) {
        self.schedule_update(|state| state.components.clear());
    }

    /// Switches the viewport and publishes immediately.
    pub fn set_preview_mode(&self, mode: PreviewMode) -> PreviewSnapshot {
        tracing::debug!(mode = %mode, "preview mode changed");
        self.inner.commit(|state| state.preview_mode = mode)
    }

    /// Flips live mode, publishing immediately. Returns the new flag.
    ///
    /// Going live starts periodic persistence; leaving live stops it.
    pub fn toggle_live(&self) -> bool {
        let snapshot = self.inner.commit(|state| state.is_live = !state.is_live);
        let is_live = snapshot.state.is_live;

        if is_live {
            self.start_persisting();
        } else if let Some(task) = lock(&self.inner.persist_task).take() {
            task.abort();
        }
        tracing::debug!(is_live, "live preview toggled");
        is_live
    }

    pub fn is_live(&self) -> bool {
        lock(&self.inner.published).state.is_live
    }

    fn start_persisting(&self) {
        let handle = match Handle::try_current() {
            Ok(handle) => handle,
            Err(e) => {
                tracing::warn!(error = %e, "no runtime available, live preview will not be persisted");
                return;
            }
        };

        let inner = Arc::downgrade(&self.inner);
        let period = self.inner.config.persist_interval;
        let task = handle.spawn(async move {
            let mut interval = time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                let Some(inner) = inner.upgrade() else {
                    return;
                };
                if let Err(e) = inner.persist().await {
                    tracing::warn!(error = %e, "failed to persist live preview");
                }
            }
        });

        if let Some(previous) = lock(&self.inner.persist_task).replace(task) {
            previous.abort();
        }
    }

    /// Writes the current state to the store now.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` when the store rejects the write.
    pub async fn persist_now(&self) -> Result<(), StorageError> {
        self.inner.persist().await
    }

    /// Loads persisted state once. Later calls do nothing.
    ///
    /// Absent, unreadable or malformed data is logged and the current state
    /// is kept. Returns true if stored state was applied.
    pub async fn restore(&self) -> bool {
        {
            let mut restored = lock(&self.inner.restored);
            if *restored {
                return false;
            }
            *restored = true;
        }

        let raw = match self.inner.store.get_item(PREVIEW_STORAGE_KEY).await {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                tracing::debug!("no persisted live preview");
                return false;
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to read persisted live preview");
                return false;
            }
        };

        match serde_json::from_str::<PersistedPreview>(&raw) {
            Ok(persisted) => {
                let count = persisted.components.len();
                self.inner.commit(move |state| persisted.restore_into(state));
                tracing::debug!(components = count, "live preview restored");
                true
            }
            Err(e) => {
                tracing::warn!(error = %e, "malformed persisted live preview, keeping defaults");
                false
            }
        }
    }

    /// Pending-update markers younger than the configured TTL.
    pub fn pending_updates(&self) -> Vec<PendingUpdate> {
        let now = self.inner.clock.now();
        let ttl = self.inner.config.pending_update_ttl;
        let mut pending = lock(&self.inner.pending);
        pending.retain(|p| !p.is_expired(now, ttl));
        pending.clone()
    }

    pub fn is_pending(&self, component_id: &str) -> bool {
        self.pending_updates()
            .iter()
            .any(|p| p.component_id == component_id)
    }

    /// Components, styles and generated CSS of the last published state.
    pub fn export_snapshot(&self) -> ExportedSnapshot {
        let now: Timestamp = self.inner.clock.now();
        ExportedSnapshot::from_state(&self.state(), now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::{InMemoryStore, ManualClock, ManualFrameScheduler};
    use serde_json::json;

    struct Fixture {
        scheduler: Arc<ManualFrameScheduler>,
        clock: Arc<ManualClock>,
        store: InMemoryStore,
        preview: LivePreviewSynchronizer,
    }

    fn fixture() -> Fixture {
        let scheduler = Arc::new(ManualFrameScheduler::new());
        let clock = Arc::new(ManualClock::at_millis(1_000));
        let store = InMemoryStore::new();
        let preview = LivePreviewSynchronizer::new(
            scheduler.clone(),
            clock.clone(),
            Arc::new(store.clone()),
        );
        Fixture {
            scheduler,
            clock,
            store,
            preview,
        }
    }

    fn button(id: &str) -> Component {
        Component::new(id, "button").with_position(0.0, 0.0)
    }

    #[test]
    fn mutations_within_a_frame_publish_once() {
        let f = fixture();
        let rx = f.preview.subscribe();

        f.preview.add_component(button("a"));
        f.preview.add_component(button("b"));
        f.preview.update_component("a", ComponentPatch::new().x(40.0));

        assert_eq!(f.scheduler.pending(), 1);
        assert_eq!(f.preview.frame(), 0);

        f.scheduler.run_frame();

        let snapshot = rx.borrow().clone();
        assert_eq!(snapshot.frame, 1);
        assert_eq!(snapshot.state.components.len(), 2);
        assert_eq!(snapshot.state.component("a").unwrap().x, 40.0);
    }

    #[test]
    fn last_write_wins_within_a_frame() {
        let f = fixture();
        f.preview.add_component(button("a"));
        f.scheduler.run_frame();

        f.preview.update_component("a", ComponentPatch::new().x(10.0));
        f.preview.update_component("a", ComponentPatch::new().x(20.0));
        f.scheduler.run_frame();

        assert_eq!(f.preview.state().component("a").unwrap().x, 20.0);
        assert_eq!(f.preview.frame(), 2);
    }

    #[test]
    fn drained_queue_requests_no_further_frame() {
        let f = fixture();
        f.preview.schedule_update(|_| {});
        f.scheduler.run_frame();
        assert_eq!(f.preview.frame(), 1);

        assert_eq!(f.scheduler.run_frame(), 0);
        assert_eq!(f.preview.frame(), 1);
    }

    #[test]
    fn flushing_an_empty_queue_publishes_nothing() {
        let f = fixture();
        let rx = f.preview.subscribe();

        f.preview.inner.flush();

        assert_eq!(f.preview.frame(), 0);
        assert!(!rx.has_changed().unwrap());
    }

    #[test]
    fn flush_stamps_last_update_from_clock() {
        let f = fixture();
        f.clock.advance_millis(500);

        f.preview.add_component(button("a"));
        f.scheduler.run_frame();

        assert_eq!(f.preview.state().last_update.as_millis(), 1_500);
    }

    #[test]
    fn update_scheduled_during_flush_lands_in_next_frame() {
        let f = fixture();
        let again = f.preview.clone();
        f.preview.schedule_update(move |state| {
            state.upsert_component(button("first"));
            again.add_component(button("second"));
        });

        f.scheduler.run_frame();
        assert!(f.preview.state().component("second").is_none());
        assert_eq!(f.scheduler.pending(), 1);

        f.scheduler.run_frame();
        assert!(f.preview.state().component("second").is_some());
    }

    #[test]
    fn panicking_mutator_does_not_drop_the_batch() {
        let f = fixture();
        f.preview.schedule_update(|_| panic!("bad mutator"));
        f.preview.add_component(button("a"));

        f.scheduler.run_frame();

        assert!(f.preview.state().component("a").is_some());
    }

    #[test]
    fn preview_mode_publishes_immediately_without_flushing_queue() {
        let f = fixture();
        f.preview.add_component(button("a"));

        let snapshot = f.preview.set_preview_mode(PreviewMode::Mobile);

        assert_eq!(snapshot.frame, 1);
        assert_eq!(snapshot.state.preview_mode, PreviewMode::Mobile);
        assert!(snapshot.state.components.is_empty());
        assert_eq!(f.preview.queued(), 1);
    }

    #[test]
    fn remove_sync_styles_and_clear() {
        let f = fixture();
        f.preview.sync_components(vec![button("a"), button("b"), button("c")]);
        f.preview.remove_component("b");
        f.preview
            .update_styles(StyleMap::from([("backgroundColor".to_string(), json!("#fff"))]));
        f.scheduler.run_frame();

        let state = f.preview.state();
        let ids: Vec<&str> = state.components.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "c"]);
        assert_eq!(state.styles.get("backgroundColor"), Some(&json!("#fff")));

        f.preview.clear_components();
        f.scheduler.run_frame();
        assert!(f.preview.state().components.is_empty());
    }

    #[test]
    fn pending_updates_expire_after_ttl() {
        let f = fixture();
        f.preview.update_component("a", ComponentPatch::new().x(1.0));

        assert!(f.preview.is_pending("a"));
        f.clock.advance_millis(299);
        assert!(f.preview.is_pending("a"));
        f.clock.advance_millis(1);
        assert!(!f.preview.is_pending("a"));
        assert!(f.preview.pending_updates().is_empty());
    }

    #[test]
    fn export_includes_generated_css() {
        let f = fixture();
        f.preview.add_component(button("hero").with_size(100.0, 40.0));
        f.scheduler.run_frame();

        let export = f.preview.export_snapshot();
        assert_eq!(export.components.len(), 1);
        assert!(export.css.contains("#hero"));
        assert_eq!(export.timestamp.as_millis(), 1_000);
    }

    #[tokio::test]
    async fn restore_keeps_components_with_numeric_style_values() {
        let f = fixture();
        let stored = json!({
            "components": [{"id": "hero", "type": "section", "x": 12, "style": {"zIndex": 5}}],
            "styles": {"opacity": 0.5},
            "previewMode": "tablet"
        });
        f.store
            .set_item(PREVIEW_STORAGE_KEY, &stored.to_string())
            .await
            .unwrap();

        assert!(f.preview.restore().await);
        let state = f.preview.state();
        let hero = state.component("hero").unwrap();
        assert_eq!(hero.x, 12.0);
        assert_eq!(hero.style.get("zIndex"), Some(&json!(5)));
        assert_eq!(state.styles.get("opacity"), Some(&json!(0.5)));
        assert_eq!(state.preview_mode, PreviewMode::Tablet);
    }

    #[tokio::test]
    async fn restore_applies_stored_state_once() {
        let f = fixture();
        let stored = json!({
            "components": [button("saved")],
            "styles": {"color": "red"},
            "previewMode": "tablet"
        });
        f.store
            .set_item(PREVIEW_STORAGE_KEY, &stored.to_string())
            .await
            .unwrap();

        assert!(f.preview.restore().await);
        let state = f.preview.state();
        assert!(state.component("saved").is_some());
        assert_eq!(state.preview_mode, PreviewMode::Tablet);

        f.preview.clear_components();
        f.scheduler.run_frame();
        assert!(!f.preview.restore().await);
        assert!(f.preview.state().components.is_empty());
    }

    #[tokio::test]
    async fn malformed_restore_keeps_default_state() {
        let f = fixture();
        f.store
            .set_item(PREVIEW_STORAGE_KEY, "{not json")
            .await
            .unwrap();

        assert!(!f.preview.restore().await);

        let state = f.preview.state();
        assert!(state.components.is_empty());
        assert_eq!(state.preview_mode, PreviewMode::Desktop);
        assert_eq!(f.preview.frame(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn live_mode_persists_periodically_until_toggled_off() {
        let f = fixture();
        f.preview.add_component(button("a"));
        f.scheduler.run_frame();

        assert!(f.preview.toggle_live());
        tokio::time::sleep(Duration::from_millis(10)).await;

        let saved = f.store.get_item(PREVIEW_STORAGE_KEY).await.unwrap().unwrap();
        let persisted: PersistedPreview = serde_json::from_str(&saved).unwrap();
        assert_eq!(persisted.components.len(), 1);

        assert!(!f.preview.toggle_live());
        f.store.remove_item(PREVIEW_STORAGE_KEY).await.unwrap();
        tokio::time::sleep(Duration::from_secs(12)).await;

        assert_eq!(f.store.get_item(PREVIEW_STORAGE_KEY).await.unwrap(), None);
    }
}
