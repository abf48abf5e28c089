use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Identifier of a timer, assigned once at creation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimerId(pub Uuid);

/// Identifier of a single recorded run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RecordId(pub Uuid);

impl TimerId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for TimerId {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RecordId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TimerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// One completed stopwatch run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub id: RecordId,
    /// elapsed seconds, always > 0 once stored
    pub duration: f64,
    pub timestamp: DateTime<Local>,
}

impl Record {
    pub fn new(duration: f64, timestamp: Option<DateTime<Local>>) -> Self {
        Self {
            id: RecordId::new(),
            duration,
            timestamp: timestamp.unwrap_or_else(Local::now),
        }
    }
}

/// A named bucket of stopwatch recordings.
///
/// Records are owned by value and kept newest-first: a new run is
/// inserted at index 0 regardless of its timestamp.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Timer {
    pub id: TimerId,
    pub title: String,
    pub created_at: DateTime<Local>,
    pub enable_countdown: bool,
    pub records: Vec<Record>,
}

impl Timer {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            id: TimerId::new(),
            title: title.into(),
            created_at: Local::now(),
            enable_countdown: true,
            records: Vec::new(),
        }
    }

    pub fn record(&self, id: RecordId) -> Option<&Record> {
        self.records.iter().find(|r| r.id == id)
    }
}
