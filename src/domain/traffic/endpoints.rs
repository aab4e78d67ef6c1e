//! Weighted endpoint table and cumulative-weight selection.

use serde::{Deserialize, Serialize};

use crate::domain::analytics::HttpMethod;

/// An endpoint and its relative selection weight.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeightedEndpoint {
    pub method: HttpMethod,
    pub path: String,
    pub weight: u32,
}

impl WeightedEndpoint {
    pub fn new(method: HttpMethod, path: impl Into<String>, weight: u32) -> Self {
        Self {
            method,
            path: path.into(),
            weight,
        }
    }
}

/// Fixed table sampled by roulette-wheel selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointTable {
    entries: Vec<WeightedEndpoint>,
    total_weight: u64,
}

impl EndpointTable {
    pub fn new(entries: Vec<WeightedEndpoint>) -> Self {
        let total_weight = entries.iter().map(|e| u64::from(e.weight)).sum();
        Self {
            entries,
            total_weight,
        }
    }

    pub fn total_weight(&self) -> u64 {
        self.total_weight
    }

    pub fn entries(&self) -> &[WeightedEndpoint] {
        &self.entries
    }

    /// Walks the table subtracting weights until `draw` falls inside an
    /// entry's slice. `draw` must lie in `[0, total_weight)`.
    pub fn select(&self, draw: u64) -> Option<&WeightedEndpoint> {
        let mut remaining = draw;
        for entry in &self.entries {
            let weight = u64::from(entry.weight);
            if remaining < weight {
                return Some(entry);
            }
            remaining -= weight;
        }
        None
    }
}

impl Default for EndpointTable {
    fn default() -> Self {
        Self::new(vec![
            WeightedEndpoint::new(HttpMethod::Get, "/api/components", 30),
            WeightedEndpoint::new(HttpMethod::Post, "/api/components", 15),
            WeightedEndpoint::new(HttpMethod::Put, "/api/components/:id", 20),
            WeightedEndpoint::new(HttpMethod::Delete, "/api/components/:id", 5),
            WeightedEndpoint::new(HttpMethod::Get, "/api/projects", 15),
            WeightedEndpoint::new(HttpMethod::Post, "/api/export", 10),
            WeightedEndpoint::new(HttpMethod::Post, "/api/ai/chat", 5),
        ])
    }
}
