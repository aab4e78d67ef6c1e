//! Seedable random source for synthetic traffic.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::ops::Range;

use crate::domain::analytics::{CallOutcome, CallStatus, HttpMethod};
use crate::domain::collaboration::Position;

use super::endpoints::{EndpointTable, WeightedEndpoint};

/// Error probability for background samples.
pub const BACKGROUND_ERROR_RATE: f64 = 0.10;
/// Error probability for user-initiated calls.
pub const USER_CALL_ERROR_RATE: f64 = 0.05;
/// Latency of successful calls, milliseconds.
pub const SUCCESS_DURATION_MS: Range<u64> = 50..550;
/// Latency of failed calls, milliseconds.
pub const ERROR_DURATION_MS: Range<u64> = 1_000..3_000;

const ERROR_STATUS_CODES: [u16; 4] = [400, 404, 500, 503];

const FAKE_COLLABORATORS: [&str; 6] = [
    "user-ava", "user-ben", "user-chloe", "user-dev", "user-emil", "user-fara",
];

/// Canvas area cursors are scattered over.
const CANVAS_WIDTH: f64 = 1200.0;
const CANVAS_HEIGHT: f64 = 800.0;

/// Weighted sampler over an [`EndpointTable`] with outcome generation.
///
/// Deterministic when constructed with [`TrafficSampler::seeded`].
#[derive(Debug, Clone)]
pub struct TrafficSampler {
    rng: StdRng,
    table: EndpointTable,
}

impl TrafficSampler {
    pub fn seeded(seed: u64, table: EndpointTable) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            table,
        }
    }

    pub fn from_entropy(table: EndpointTable) -> Self {
        Self {
            rng: StdRng::from_entropy(),
            table,
        }
    }

    pub fn table(&self) -> &EndpointTable {
        &self.table
    }

    /// Bernoulli gate: true with `probability`.
    pub fn gate(&mut self, probability: f64) -> bool {
        self.rng.gen::<f64>() < probability
    }

    /// Roulette selection; `None` when the table has no weight.
    pub fn endpoint(&mut self) -> Option<WeightedEndpoint> {
        let total = self.table.total_weight();
        if total == 0 {
            return None;
        }
        let draw = self.rng.gen_range(0..total);
        self.table.select(draw).cloned()
    }

    /// Draws a terminal outcome with the given error probability.
    pub fn outcome(&mut self, method: HttpMethod, error_rate: f64) -> CallOutcome {
        if self.gate(error_rate) {
            let idx = self.rng.gen_range(0..ERROR_STATUS_CODES.len());
            CallOutcome {
                status: CallStatus::Error,
                status_code: ERROR_STATUS_CODES[idx],
                duration_ms: self.rng.gen_range(ERROR_DURATION_MS),
            }
        } else {
            CallOutcome {
                status: CallStatus::Success,
                status_code: if method == HttpMethod::Post { 201 } else { 200 },
                duration_ms: self.rng.gen_range(SUCCESS_DURATION_MS),
            }
        }
    }

    /// One of the fabricated collaborator ids.
    pub fn collaborator(&mut self) -> &'static str {
        FAKE_COLLABORATORS[self.rng.gen_range(0..FAKE_COLLABORATORS.len())]
    }

    pub fn cursor_position(&mut self) -> Position {
        Position::new(
            self.rng.gen_range(0.0..CANVAS_WIDTH).round(),
            self.rng.gen_range(0.0..CANVAS_HEIGHT).round(),
        )
    }

    /// Fabricated private-range client address.
    pub fn ip(&mut self) -> String {
        format!("192.168.1.{}", self.rng.gen_range(1..=254u8))
    }
}
