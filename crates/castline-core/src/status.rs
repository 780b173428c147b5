//! Status reporting
//!
//! Observers see a single current [`StatusReport`]. A bounded
//! [`StatusLog`] keeps recent reports for diagnostics without changing that
//! contract.

use crate::types::{SessionId, SessionToken};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Status severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Info,
    Error,
    Success,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Info => f.pad("info"),
            Severity::Error => f.pad("error"),
            Severity::Success => f.pad("success"),
        }
    }
}

/// The latest status shown to the user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusReport {
    pub message: String,
    pub severity: Severity,
}

impl StatusReport {
    pub fn new(message: impl Into<String>, severity: Severity) -> Self {
        Self {
            message: message.into(),
            severity,
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new(message, Severity::Info)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(message, Severity::Error)
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::new(message, Severity::Success)
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl Default for StatusReport {
    fn default() -> Self {
        Self::info("Enter a URL and click Load Stream to begin.")
    }
}

impl std::fmt::Display for StatusReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.severity, self.message)
    }
}

/// Read-only view handed to presentation layers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObserverView {
    pub current_status: StatusReport,
    pub current_url: String,
    /// Engine recovery attempts made by the live session
    pub recovery_attempts: u32,
}

/// Status report with metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusRecord {
    /// Sequence number
    pub sequence: u64,
    /// Timestamp
    pub timestamp: DateTime<Utc>,
    /// Load attempt that produced the report
    pub token: SessionToken,
    /// Session that produced the report, if one was live
    pub session_id: Option<SessionId>,
    #[serde(flatten)]
    pub report: StatusReport,
}

/// Append-only, bounded status history
#[derive(Debug, Clone)]
pub struct StatusLog {
    records: VecDeque<StatusRecord>,
    limit: usize,
    sequence: u64,
}

impl StatusLog {
    pub fn new(limit: usize) -> Self {
        Self {
            records: VecDeque::with_capacity(limit.min(256)),
            limit,
            sequence: 0,
        }
    }

    /// Record a report, evicting the oldest once the limit is reached
    pub fn push(&mut self, token: SessionToken, session_id: Option<SessionId>, report: StatusReport) {
        self.sequence += 1;
        if self.limit == 0 {
            return;
        }

        if self.records.len() == self.limit {
            self.records.pop_front();
        }
        self.records.push_back(StatusRecord {
            sequence: self.sequence,
            timestamp: Utc::now(),
            token,
            session_id,
            report,
        });
    }

    /// Records from oldest to newest
    pub fn records(&self) -> impl Iterator<Item = &StatusRecord> {
        self.records.iter()
    }

    /// Records produced by a single load attempt
    pub fn for_token(&self, token: SessionToken) -> impl Iterator<Item = &StatusRecord> {
        self.records.iter().filter(move |r| r.token == token)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Total reports ever pushed, including evicted ones
    pub fn total(&self) -> u64 {
        self.sequence
    }
}
