//! RealtimeService - the simulated connection to a hosted backend.
//!
//! Owns the connection state machine and gates the traffic simulator on it:
//!
//! ```text
//! disconnected ──connect()──► connecting ──(delay)──► connected ──disconnect()──► disconnected
//!                                   │
//!                                   └──(failure draw)──► failed
//! ```
//!
//! Every transition is announced on the bus as a `connection` event.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::adapters::InMemoryEventBus;
use crate::config::SimulationConfig;
use crate::domain::analytics::{AnalyticsSummary, ApiCallLog, HttpMethod, LiveMetrics};
use crate::domain::events::ConnectionState;
use crate::domain::foundation::LogId;
use crate::ports::EventPublisher;

use super::traffic::TrafficSimulator;

/// Configuration for the RealtimeService.
#[derive(Debug, Clone)]
pub struct RealtimeConfig {
    /// Simulated handshake time.
    pub connect_delay: Duration,
    /// Chance that a connection attempt ends in `failed`.
    pub connect_failure_probability: f64,
    pub seed: Option<u64>,
}

impl Default for RealtimeConfig {
    fn default() -> Self {
        Self {
            connect_delay: Duration::from_secs(1),
            connect_failure_probability: 0.0,
            seed: None,
        }
    }
}

impl RealtimeConfig {
    pub fn from_settings(simulation: &SimulationConfig) -> Self {
        Self {
            connect_delay: simulation.connect_delay(),
            connect_failure_probability: simulation.connect_failure_probability,
            seed: simulation.seed,
        }
    }

    /// Create config with a custom failure probability.
    pub fn with_failure_probability(mut self, probability: f64) -> Self {
        self.connect_failure_probability = probability;
        self
    }
}

/// Connection lifecycle plus the traffic it carries.
pub struct RealtimeService {
    bus: Arc<InMemoryEventBus>,
    traffic: Arc<TrafficSimulator>,
    config: RealtimeConfig,
    rng: Mutex<StdRng>,
}

impl RealtimeService {
    pub fn new(
        bus: Arc<InMemoryEventBus>,
        traffic: Arc<TrafficSimulator>,
        config: RealtimeConfig,
    ) -> Self {
        let rng = match config.seed {
            // Offset so the failure draw is independent of traffic sampling
            Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(1)),
            None => StdRng::from_entropy(),
        };
        Self {
            bus,
            traffic,
            config,
            rng: Mutex::new(rng),
        }
    }

    pub fn connection_state(&self) -> ConnectionState {
        self.bus.connection_state()
    }

    fn set_state(&self, state: ConnectionState) -> bool {
        self.bus.set_connection_state(state, self.traffic.clock().now())
    }

    /// Runs the simulated handshake and returns the resulting state.
    ///
    /// Calling while already connecting or connected returns the current
    /// state without starting another attempt. A `disconnect` during the
    /// handshake wins.
    pub async fn connect(&self) -> ConnectionState {
        match self.bus.connection_state() {
            state @ (ConnectionState::Connecting | ConnectionState::Connected) => return state,
            ConnectionState::Disconnected | ConnectionState::Failed => {}
        }

        self.set_state(ConnectionState::Connecting);
        tracing::debug!(delay_ms = self.config.connect_delay.as_millis() as u64, "connecting");
        tokio::time::sleep(self.config.connect_delay).await;

        if self.bus.connection_state() != ConnectionState::Connecting {
            return self.bus.connection_state();
        }

        let failed = {
            let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
            rng.gen::<f64>() < self.config.connect_failure_probability
        };
        if failed {
            tracing::warn!("simulated connection attempt failed");
            self.set_state(ConnectionState::Failed);
            return ConnectionState::Failed;
        }

        self.set_state(ConnectionState::Connected);
        self.traffic.start();
        tracing::info!("realtime connection established");
        ConnectionState::Connected
    }

    /// Stops traffic and marks the connection closed. Idempotent.
    pub fn disconnect(&self) {
        self.traffic.stop();
        if self.set_state(ConnectionState::Disconnected) {
            tracing::info!("realtime connection closed");
        }
    }

    pub fn simulate_call(&self, endpoint: &str, method: HttpMethod) -> LogId {
        self.traffic.simulate_call(endpoint, method)
    }

    pub fn call_log(&self) -> Vec<ApiCallLog> {
        self.traffic.call_log()
    }

    pub fn metrics(&self) -> LiveMetrics {
        self.traffic.metrics()
    }

    pub fn summary(&self, window: Duration) -> AnalyticsSummary {
        self.traffic.summary(window)
    }

    pub fn bus(&self) -> &Arc<InMemoryEventBus> {
        &self.bus
    }

    pub fn traffic(&self) -> &Arc<TrafficSimulator> {
        &self.traffic
    }
}
