//! API call records and the bounded, most-recent-first call log.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;
use std::str::FromStr;

use crate::domain::foundation::{DomainError, ErrorCode, LogId, Timestamp, UserId, ValidationError};

/// Default number of entries retained by a [`CallLog`].
pub const DEFAULT_LOG_CAPACITY: usize = 100;

/// HTTP method of a simulated call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HttpMethod {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Ok(HttpMethod::Get),
            "POST" => Ok(HttpMethod::Post),
            "PUT" => Ok(HttpMethod::Put),
            "PATCH" => Ok(HttpMethod::Patch),
            "DELETE" => Ok(HttpMethod::Delete),
            other => Err(ValidationError::invalid_format(
                "method",
                format!("unsupported HTTP method '{}'", other),
            )),
        }
    }
}

/// Lifecycle status of a call record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CallStatus {
    Pending,
    Success,
    Error,
}

impl CallStatus {
    /// Success and error are terminal; pending is not.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, CallStatus::Pending)
    }
}

/// Terminal result applied to a pending call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallOutcome {
    pub status: CallStatus,
    pub status_code: u16,
    pub duration_ms: u64,
}

impl CallOutcome {
    pub fn is_error(&self) -> bool {
        self.status == CallStatus::Error
    }
}

/// One simulated API call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiCallLog {
    pub id: LogId,
    pub timestamp: Timestamp,
    pub method: HttpMethod,
    pub endpoint: String,
    pub status: CallStatus,
    pub status_code: u16,
    /// Milliseconds; zero while pending.
    pub duration: u64,
    pub user_id: UserId,
    pub ip: String,
}

impl ApiCallLog {
    /// Creates a pending record with a fresh id.
    pub fn pending(
        method: HttpMethod,
        endpoint: impl Into<String>,
        user_id: UserId,
        ip: impl Into<String>,
        timestamp: Timestamp,
    ) -> Self {
        Self {
            id: LogId::new(),
            timestamp,
            method,
            endpoint: endpoint.into(),
            status: CallStatus::Pending,
            status_code: 0,
            duration: 0,
            user_id,
            ip: ip.into(),
        }
    }

    /// Creates a record that is already terminal (background samples).
    pub fn completed(
        method: HttpMethod,
        endpoint: impl Into<String>,
        user_id: UserId,
        ip: impl Into<String>,
        timestamp: Timestamp,
        outcome: CallOutcome,
    ) -> Self {
        let mut entry = Self::pending(method, endpoint, user_id, ip, timestamp);
        entry.status = outcome.status;
        entry.status_code = outcome.status_code;
        entry.duration = outcome.duration_ms;
        entry
    }
}

/// Bounded call log, most recent first.
///
/// Inserting into a full log evicts the oldest entry. Each pending entry
/// accepts exactly one terminal transition.
#[derive(Debug, Clone)]
pub struct CallLog {
    entries: VecDeque<ApiCallLog>,
    capacity: usize,
}

impl CallLog {
    /// Creates an empty log; a zero capacity is raised to one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Inserts at the front, returning the evicted oldest entry if the log
    /// was full.
    pub fn insert(&mut self, entry: ApiCallLog) -> Option<ApiCallLog> {
        self.entries.push_front(entry);
        if self.entries.len() > self.capacity {
            self.entries.pop_back()
        } else {
            None
        }
    }

    /// Applies the terminal outcome to a pending entry.
    ///
    /// # Errors
    ///
    /// - `InvalidStateTransition` if `outcome.status` is `Pending`
    /// - `LogEntryNotFound` if the id is unknown or was evicted
    /// - `LogEntryAlreadyCompleted` if the entry is already terminal
    pub fn complete(&mut self, id: &LogId, outcome: CallOutcome) -> Result<&ApiCallLog, DomainError> {
        if !outcome.status.is_terminal() {
            return Err(DomainError::new(
                ErrorCode::InvalidStateTransition,
                "A call can only complete with a terminal status",
            )
            .with_detail("log_id", id.to_string()));
        }

        let entry = self
            .entries
            .iter_mut()
            .find(|e| &e.id == id)
            .ok_or_else(|| {
                DomainError::new(ErrorCode::LogEntryNotFound, "Call log entry not found")
                    .with_detail("log_id", id.to_string())
            })?;

        if entry.status.is_terminal() {
            return Err(DomainError::new(
                ErrorCode::LogEntryAlreadyCompleted,
                "Call log entry already reached a terminal status",
            )
            .with_detail("log_id", id.to_string()));
        }

        entry.status = outcome.status;
        entry.status_code = outcome.status_code;
        entry.duration = outcome.duration_ms;
        Ok(&*entry)
    }

    pub fn get(&self, id: &LogId) -> Option<&ApiCallLog> {
        self.entries.iter().find(|e| &e.id == id)
    }

    /// Iterates most recent first.
    pub fn iter(&self) -> impl Iterator<Item = &ApiCallLog> {
        self.entries.iter()
    }

    /// Copies the entries, most recent first.
    pub fn snapshot(&self) -> Vec<ApiCallLog> {
        self.entries.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl Default for CallLog {
    fn default() -> Self {
        Self::new(DEFAULT_LOG_CAPACITY)
    }
}
