//! TrafficSimulator - fabricated realtime traffic.
//!
//! Produces the stream a hosted backend would push to the editor:
//! analytics samples, collaborator cursor moves and presence changes, each
//! on its own fixed-period timer behind a Bernoulli gate. It also serves
//! user-initiated calls that complete after a sampled latency.
//!
//! ## Cadence
//!
//! | Loop | Default period | Gate |
//! |------|----------------|------|
//! | analytics | 2s | 0.7 |
//! | collaboration | 3s | 0.4 |
//! | presence | 5s | 0.2 |
//!
//! ## Teardown
//!
//! `stop` aborts every background loop and every pending completion. It is
//! safe to call repeatedly and the simulator may be started again.

use std::collections::BTreeSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use serde_json::json;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};

use crate::config::SimulationConfig;
use crate::domain::analytics::{
    AnalyticsSummary, ApiCallLog, CallLog, CallOutcome, HttpMethod, LiveMetrics,
    DEFAULT_LOG_CAPACITY,
};
use crate::domain::events::{
    Event, EVENT_ANALYTICS_UPDATE, EVENT_API_CALL, EVENT_CURSOR_MOVE, EVENT_USER_JOINED,
    EVENT_USER_LEFT,
};
use crate::domain::foundation::{LogId, UserId};
use crate::domain::traffic::{
    EndpointTable, TrafficSampler, BACKGROUND_ERROR_RATE, USER_CALL_ERROR_RATE,
};
use crate::ports::{Clock, EventPublisher};

/// Configuration for the TrafficSimulator.
#[derive(Debug, Clone)]
pub struct TrafficSimulatorConfig {
    pub analytics_interval: Duration,
    pub analytics_probability: f64,
    pub collaboration_interval: Duration,
    pub collaboration_probability: f64,
    pub presence_interval: Duration,
    pub presence_probability: f64,
    pub background_error_rate: f64,
    pub user_error_rate: f64,
    pub log_capacity: usize,
    /// Fixed seed for reproducible sampling; entropy when `None`.
    pub seed: Option<u64>,
}

impl Default for TrafficSimulatorConfig {
    fn default() -> Self {
        Self {
            analytics_interval: Duration::from_secs(2),
            analytics_probability: 0.7,
            collaboration_interval: Duration::from_secs(3),
            collaboration_probability: 0.4,
            presence_interval: Duration::from_secs(5),
            presence_probability: 0.2,
            background_error_rate: BACKGROUND_ERROR_RATE,
            user_error_rate: USER_CALL_ERROR_RATE,
            log_capacity: DEFAULT_LOG_CAPACITY,
            seed: None,
        }
    }
}

impl TrafficSimulatorConfig {
    /// Build from loaded settings plus the call log capacity.
    pub fn from_settings(simulation: &SimulationConfig, log_capacity: usize) -> Self {
        Self {
            analytics_interval: simulation.analytics_interval(),
            analytics_probability: simulation.analytics_probability,
            collaboration_interval: simulation.collaboration_interval(),
            collaboration_probability: simulation.collaboration_probability,
            presence_interval: simulation.presence_interval(),
            presence_probability: simulation.presence_probability,
            background_error_rate: simulation.background_error_rate,
            user_error_rate: simulation.user_error_rate,
            log_capacity,
            seed: simulation.seed,
        }
    }

    /// Create config with a fixed RNG seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Create config with custom error rates.
    pub fn with_error_rates(mut self, background: f64, user: f64) -> Self {
        self.background_error_rate = background;
        self.user_error_rate = user;
        self
    }

    /// Create config with custom background gates.
    pub fn with_gates(mut self, analytics: f64, collaboration: f64, presence: f64) -> Self {
        self.analytics_probability = analytics;
        self.collaboration_probability = collaboration;
        self.presence_probability = presence;
        self
    }
}

#[derive(Debug)]
struct TrafficState {
    log: CallLog,
    metrics: LiveMetrics,
    present: BTreeSet<UserId>,
}

struct Shared {
    bus: Arc<dyn EventPublisher>,
    clock: Arc<dyn Clock>,
    config: TrafficSimulatorConfig,
    sampler: Mutex<TrafficSampler>,
    state: Mutex<TrafficState>,
}

impl Shared {
    fn sampler(&self) -> MutexGuard<'_, TrafficSampler> {
        self.sampler.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn state(&self) -> MutexGuard<'_, TrafficState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Publishes `event` stamped with the simulator's clock.
    fn publish(&self, event: Event) {
        self.bus.publish(event.at(self.clock.now()));
    }

    fn publish_metrics(&self, metrics: LiveMetrics) {
        self.publish(Event::new(EVENT_ANALYTICS_UPDATE, json!(metrics)));
    }

    fn analytics_tick(&self) {
        let drawn = {
            let mut sampler = self.sampler();
            let drawn = sampler.endpoint().map(|endpoint| {
                let outcome = sampler.outcome(endpoint.method, self.config.background_error_rate);
                let caller = UserId::from_static(sampler.collaborator());
                (endpoint, outcome, caller, sampler.ip())
            });
            drawn
        };
        let Some((endpoint, outcome, caller, ip)) = drawn else {
            return;
        };

        let entry = ApiCallLog::completed(
            endpoint.method,
            endpoint.path,
            caller,
            ip,
            self.clock.now(),
            outcome,
        );
        let metrics = {
            let mut state = self.state();
            state.log.insert(entry.clone());
            state
                .metrics
                .record_background_sample(outcome.duration_ms, outcome.is_error());
            state.metrics
        };

        self.publish(Event::new(EVENT_API_CALL, json!(entry)).with_user(entry.user_id.clone()));
        self.publish_metrics(metrics);
    }

    fn collaboration_tick(&self) {
        let (user_id, position) = {
            let mut sampler = self.sampler();
            (
                UserId::from_static(sampler.collaborator()),
                sampler.cursor_position(),
            )
        };

        self.publish(
            Event::new(
                EVENT_CURSOR_MOVE,
                json!({ "userId": user_id, "position": position }),
            )
            .with_user(user_id),
        );
    }

    fn presence_tick(&self) {
        let user_id = UserId::from_static(self.sampler().collaborator());

        let (joined, metrics) = {
            let mut state = self.state();
            let joined = if state.present.remove(&user_id) {
                false
            } else {
                state.present.insert(user_id.clone());
                true
            };
            state.metrics.active_users = state.present.len();
            (joined, state.metrics)
        };

        let event_type = if joined {
            EVENT_USER_JOINED
        } else {
            EVENT_USER_LEFT
        };
        tracing::debug!(user_id = %user_id, event_type, "presence changed");
        self.publish(Event::new(event_type, json!({ "userId": user_id })).with_user(user_id));
        self.publish_metrics(metrics);
    }

    fn complete_call(&self, id: LogId, outcome: CallOutcome) {
        let completed = {
            let mut state = self.state();
            match state.log.complete(&id, outcome) {
                Ok(entry) => {
                    let entry = entry.clone();
                    state
                        .metrics
                        .record_call_completion(outcome.duration_ms, outcome.is_error());
                    Some((entry, state.metrics))
                }
                Err(e) => {
                    // Usually evicted by newer traffic before completing
                    tracing::debug!(log_id = %id, error = %e, "call completion discarded");
                    None
                }
            }
        };

        if let Some((entry, metrics)) = completed {
            self.publish(Event::new(EVENT_API_CALL, json!(entry)).with_user(entry.user_id.clone()));
            self.publish_metrics(metrics);
        }
    }
}

/// Generates synthetic analytics, collaboration and presence traffic.
///
/// Holds the bounded call log and live metrics. Must be used from within a
/// tokio runtime.
pub struct TrafficSimulator {
    shared: Arc<Shared>,
    background: Mutex<Vec<JoinHandle<()>>>,
    completions: Mutex<Vec<JoinHandle<()>>>,
}

impl TrafficSimulator {
    /// Create a new simulator with default configuration.
    pub fn new(bus: Arc<dyn EventPublisher>, clock: Arc<dyn Clock>) -> Self {
        Self::with_config(bus, clock, TrafficSimulatorConfig::default())
    }

    /// Create a new simulator with custom configuration.
    pub fn with_config(
        bus: Arc<dyn EventPublisher>,
        clock: Arc<dyn Clock>,
        config: TrafficSimulatorConfig,
    ) -> Self {
        let table = EndpointTable::default();
        let sampler = match config.seed {
            Some(seed) => TrafficSampler::seeded(seed, table),
            None => TrafficSampler::from_entropy(table),
        };
        let state = TrafficState {
            log: CallLog::new(config.log_capacity),
            metrics: LiveMetrics::default(),
            present: BTreeSet::new(),
        };

        Self {
            shared: Arc::new(Shared {
                bus,
                clock,
                config,
                sampler: Mutex::new(sampler),
                state: Mutex::new(state),
            }),
            background: Mutex::new(Vec::new()),
            completions: Mutex::new(Vec::new()),
        }
    }

    /// Spawns the background loops. Does nothing if they are already running.
    pub fn start(&self) {
        let mut background = self.background.lock().unwrap_or_else(PoisonError::into_inner);
        if !background.is_empty() {
            return;
        }

        let config = &self.shared.config;
        background.push(spawn_loop(
            Arc::clone(&self.shared),
            config.analytics_interval,
            config.analytics_probability,
            Shared::analytics_tick,
        ));
        background.push(spawn_loop(
            Arc::clone(&self.shared),
            config.collaboration_interval,
            config.collaboration_probability,
            Shared::collaboration_tick,
        ));
        background.push(spawn_loop(
            Arc::clone(&self.shared),
            config.presence_interval,
            config.presence_probability,
            Shared::presence_tick,
        ));

        tracing::debug!("traffic simulation started");
    }

    /// Aborts background loops and pending completions.
    pub fn stop(&self) {
        let loops = std::mem::take(&mut *self.background.lock().unwrap_or_else(PoisonError::into_inner));
        let pending = std::mem::take(&mut *self.completions.lock().unwrap_or_else(PoisonError::into_inner));
        if loops.is_empty() && pending.is_empty() {
            return;
        }

        for handle in loops.iter().chain(pending.iter()) {
            handle.abort();
        }
        tracing::debug!(
            loops = loops.len(),
            pending = pending.len(),
            "traffic simulation stopped"
        );
    }

    pub fn is_running(&self) -> bool {
        !self
            .background
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_empty()
    }

    /// Records a user-initiated call and completes it after a sampled latency.
    ///
    /// The pending entry is in the log and announced on the bus before this
    /// returns. Completion publishes the terminal record and a metrics
    /// snapshot.
    pub fn simulate_call(&self, endpoint: &str, method: HttpMethod) -> LogId {
        let (outcome, ip) = {
            let mut sampler = self.shared.sampler();
            let outcome = sampler.outcome(method, self.shared.config.user_error_rate);
            (outcome, sampler.ip())
        };

        let entry = ApiCallLog::pending(
            method,
            endpoint,
            UserId::local(),
            ip,
            self.shared.clock.now(),
        );
        let id = entry.id;
        self.shared.state().log.insert(entry.clone());
        self.shared
            .publish(Event::new(EVENT_API_CALL, json!(entry)).with_user(entry.user_id.clone()));

        let shared = Arc::clone(&self.shared);
        let handle = tokio::spawn(async move {
            time::sleep(Duration::from_millis(outcome.duration_ms)).await;
            shared.complete_call(id, outcome);
        });

        let mut completions = self.completions.lock().unwrap_or_else(PoisonError::into_inner);
        completions.retain(|h| !h.is_finished());
        completions.push(handle);

        id
    }

    /// Clock used for log entries and event timestamps.
    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.shared.clock
    }

    /// Most recent first.
    pub fn call_log(&self) -> Vec<ApiCallLog> {
        self.shared.state().log.snapshot()
    }

    pub fn call(&self, id: &LogId) -> Option<ApiCallLog> {
        self.shared.state().log.get(id).cloned()
    }

    pub fn metrics(&self) -> LiveMetrics {
        self.shared.state().metrics
    }

    /// Collaborators currently present, sorted by id.
    pub fn present_users(&self) -> Vec<UserId> {
        self.shared.state().present.iter().cloned().collect()
    }

    /// Summary over the call log for the given window.
    pub fn summary(&self, window: Duration) -> AnalyticsSummary {
        let now = self.shared.clock.now();
        let state = self.shared.state();
        AnalyticsSummary::compute(state.log.iter(), now, window)
    }

    /// Number of user-initiated calls still waiting to complete.
    pub fn pending_completions(&self) -> usize {
        let mut completions = self.completions.lock().unwrap_or_else(PoisonError::into_inner);
        completions.retain(|h| !h.is_finished());
        completions.len()
    }
}

impl Drop for TrafficSimulator {
    fn drop(&mut self) {
        self.stop();
    }
}

fn spawn_loop(
    shared: Arc<Shared>,
    period: Duration,
    probability: f64,
    tick: fn(&Shared),
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = time::interval_at(time::Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            interval.tick().await;
            if shared.sampler().gate(probability) {
                tick(&shared);
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::{InMemoryEventBus, ManualClock, SystemClock};
    use crate::domain::analytics::CallStatus;
    use crate::ports::{handler_fn, EventSubscriber};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn fixture(config: TrafficSimulatorConfig) -> (Arc<InMemoryEventBus>, TrafficSimulator) {
        let bus = Arc::new(InMemoryEventBus::new());
        let simulator = TrafficSimulator::with_config(bus.clone(), Arc::new(SystemClock), config);
        (bus, simulator)
    }

    fn count_events(bus: &InMemoryEventBus, event_type: &str) -> Arc<AtomicUsize> {
        let count = Arc::new(AtomicUsize::new(0));
        let counter = count.clone();
        let _sub = bus.subscribe(
            event_type,
            handler_fn("counter", move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }),
        );
        count
    }

    #[tokio::test(start_paused = true)]
    async fn simulate_call_is_pending_then_terminal() {
        let (bus, simulator) = fixture(TrafficSimulatorConfig::default().with_seed(5));
        let api_calls = count_events(&bus, EVENT_API_CALL);
        let updates = count_events(&bus, EVENT_ANALYTICS_UPDATE);

        let id = simulator.simulate_call("/api/components", HttpMethod::Get);

        let pending = simulator.call(&id).unwrap();
        assert_eq!(pending.status, CallStatus::Pending);
        assert_eq!(pending.duration, 0);
        assert_eq!(api_calls.load(Ordering::SeqCst), 1);

        time::sleep(Duration::from_secs(4)).await;

        let done = simulator.call(&id).unwrap();
        assert!(done.status.is_terminal());
        assert!(done.duration >= 50);
        assert_eq!(api_calls.load(Ordering::SeqCst), 2);
        assert_eq!(updates.load(Ordering::SeqCst), 1);
        assert_eq!(simulator.metrics().api_calls, 1);
        assert_eq!(simulator.pending_completions(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn events_are_stamped_with_the_injected_clock() {
        let bus = Arc::new(InMemoryEventBus::new());
        let clock = Arc::new(ManualClock::at_millis(7_000));
        let simulator = TrafficSimulator::with_config(
            bus.clone(),
            clock.clone(),
            TrafficSimulatorConfig::default().with_seed(2),
        );
        let stamps = Arc::new(Mutex::new(Vec::new()));
        let sink = stamps.clone();
        let _sub = bus.subscribe(
            EVENT_API_CALL,
            handler_fn("stamps", move |event| {
                sink.lock().unwrap().push(event.timestamp.as_millis());
                Ok(())
            }),
        );

        let id = simulator.simulate_call("/api/components", HttpMethod::Get);
        clock.advance_millis(250);
        time::sleep(Duration::from_secs(4)).await;

        assert_eq!(simulator.call(&id).unwrap().timestamp.as_millis(), 7_000);
        assert_eq!(*stamps.lock().unwrap(), vec![7_000, 7_250]);
    }

    #[tokio::test(start_paused = true)]
    async fn background_loops_respect_gates() {
        let config = TrafficSimulatorConfig::default()
            .with_seed(11)
            .with_gates(1.0, 0.0, 0.0);
        let (bus, simulator) = fixture(config);
        let cursor_moves = count_events(&bus, EVENT_CURSOR_MOVE);

        simulator.start();
        time::sleep(Duration::from_millis(6_100)).await;

        // Ticks at 2s, 4s and 6s, each sampled.
        assert_eq!(simulator.metrics().api_calls, 3);
        assert_eq!(simulator.call_log().len(), 3);
        assert_eq!(cursor_moves.load(Ordering::SeqCst), 0);
        simulator.stop();
    }

    #[tokio::test(start_paused = true)]
    async fn presence_toggles_membership_and_active_users() {
        let config = TrafficSimulatorConfig::default()
            .with_seed(3)
            .with_gates(0.0, 0.0, 1.0);
        let (bus, simulator) = fixture(config);
        let joins = count_events(&bus, EVENT_USER_JOINED);
        let leaves = count_events(&bus, EVENT_USER_LEFT);

        simulator.start();
        time::sleep(Duration::from_millis(50_100)).await;
        simulator.stop();

        let joined = joins.load(Ordering::SeqCst);
        let left = leaves.load(Ordering::SeqCst);
        assert_eq!(joined + left, 10);
        assert_eq!(simulator.present_users().len(), joined - left);
        assert_eq!(simulator.metrics().active_users, joined - left);
    }

    #[tokio::test(start_paused = true)]
    async fn stop_aborts_loops_and_pending_completions() {
        let config = TrafficSimulatorConfig::default()
            .with_seed(9)
            .with_gates(1.0, 1.0, 1.0);
        let (_bus, simulator) = fixture(config);

        simulator.start();
        let id = simulator.simulate_call("/api/export", HttpMethod::Post);
        simulator.stop();
        simulator.stop();

        time::sleep(Duration::from_secs(30)).await;

        assert!(!simulator.is_running());
        assert_eq!(simulator.call(&id).unwrap().status, CallStatus::Pending);
        assert_eq!(simulator.call_log().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn start_is_idempotent_and_restartable() {
        let (_bus, simulator) = fixture(TrafficSimulatorConfig::default().with_seed(1));

        simulator.start();
        simulator.start();
        assert!(simulator.is_running());

        simulator.stop();
        assert!(!simulator.is_running());

        simulator.start();
        assert!(simulator.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn user_calls_fail_at_configured_rate() {
        let config = TrafficSimulatorConfig::default()
            .with_seed(21)
            .with_error_rates(0.0, 1.0);
        let (_bus, simulator) = fixture(config);

        let id = simulator.simulate_call("/api/ai/chat", HttpMethod::Post);
        time::sleep(Duration::from_secs(4)).await;

        let entry = simulator.call(&id).unwrap();
        assert_eq!(entry.status, CallStatus::Error);
        assert!(entry.duration >= 1_000);
        assert_eq!(simulator.metrics().errors, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn summary_counts_pending_calls() {
        let (_bus, simulator) = fixture(TrafficSimulatorConfig::default().with_seed(2));

        simulator.simulate_call("/api/projects", HttpMethod::Get);
        simulator.simulate_call("/api/projects", HttpMethod::Get);

        let summary = simulator.summary(Duration::from_secs(3_600));
        assert_eq!(summary.total_calls, 2);
        assert_eq!(summary.pending_count, 2);
        assert_eq!(summary.success_rate, 0.0);
        assert_eq!(summary.calls_by_endpoint.get("/api/projects"), Some(&2));
    }
}
