//! In-memory timer collection with write-through persistence.
//!
//! Every mutation is written to the [`Repository`] first and applied to the
//! in-memory graph only when the write succeeds, so a failing store never
//! leaves the two out of step.

use chrono::{DateTime, Local};
use std::path::Path;
use tracing::{debug, info, warn};

use crate::db::Database;
use crate::error::StoreResult;
use crate::model::{Record, RecordId, Timer, TimerId};

/// Durable backing for a [`TimerStore`]
pub trait Repository {
    fn load_timers(&self) -> StoreResult<Vec<Timer>>;
    fn insert_timer(&mut self, timer: &Timer) -> StoreResult<()>;
    fn update_timer(&mut self, id: TimerId, title: &str, enable_countdown: bool) -> StoreResult<()>;
    /// Removes the timer together with all of its records
    fn delete_timer(&mut self, id: TimerId) -> StoreResult<()>;
    fn insert_record(&mut self, timer: TimerId, record: &Record) -> StoreResult<()>;
    fn delete_record(&mut self, timer: TimerId, record: RecordId) -> StoreResult<()>;
}

/// Owns the timers and their records
#[derive(Debug)]
pub struct TimerStore<R: Repository = Database> {
    repo: R,
    timers: Vec<Timer>,
    countdown_by_default: bool,
}

impl TimerStore<Database> {
    pub fn open(path: &Path) -> StoreResult<Self> {
        Self::with_repository(Database::open(path)?)
    }

    pub fn open_in_memory() -> StoreResult<Self> {
        Self::with_repository(Database::open_in_memory()?)
    }

    pub fn close(self) -> StoreResult<()> {
        info!(timers = self.timers.len(), "closing timer store");
        self.repo.close()
    }
}

/// Trimmed title, or `None` when nothing printable is left
fn normalize_title(title: &str) -> Option<&str> {
    let trimmed = title.trim();
    (!trimmed.is_empty()).then_some(trimmed)
}

impl<R: Repository> TimerStore<R> {
    pub fn with_repository(repo: R) -> StoreResult<Self> {
        let timers = repo.load_timers()?;
        Ok(Self {
            repo,
            timers,
            countdown_by_default: true,
        })
    }

    /// Countdown setting applied to timers created from now on
    pub fn with_countdown_by_default(mut self, enabled: bool) -> Self {
        self.countdown_by_default = enabled;
        self
    }

    pub fn into_repository(self) -> R {
        self.repo
    }

    pub fn timers(&self) -> &[Timer] {
        &self.timers
    }

    pub fn len(&self) -> usize {
        self.timers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timers.is_empty()
    }

    pub fn timer(&self, id: TimerId) -> Option<&Timer> {
        self.timers.iter().find(|t| t.id == id)
    }

    pub fn position(&self, id: TimerId) -> Option<usize> {
        self.timers.iter().position(|t| t.id == id)
    }

    pub fn find_by_title(&self, title: &str) -> Option<&Timer> {
        self.timers.iter().find(|t| t.title == title)
    }

    /// Title given to a timer created without one
    pub fn default_title(&self) -> String {
        format!("Timer {}", self.timers.len() + 1)
    }

    /// Create a timer; an absent or blank title gets an auto-numbered default
    pub fn create_timer(&mut self, title: Option<&str>) -> StoreResult<Timer> {
        let title = match title.and_then(normalize_title) {
            Some(t) => t.to_string(),
            None => self.default_title(),
        };

        let mut timer = Timer::new(title);
        timer.enable_countdown = self.countdown_by_default;

        self.repo.insert_timer(&timer)?;
        info!(id = %timer.id, title = %timer.title, "created timer");
        self.timers.push(timer.clone());
        Ok(timer)
    }

    /// Replace the title; blank titles leave the old one in place
    pub fn rename_timer(&mut self, id: TimerId, new_title: &str) -> StoreResult<()> {
        let Some(title) = normalize_title(new_title) else {
            debug!(%id, "ignoring blank title");
            return Ok(());
        };
        let Some(idx) = self.position(id) else {
            return Ok(());
        };

        let enable_countdown = self.timers[idx].enable_countdown;
        self.repo.update_timer(id, title, enable_countdown)?;
        self.timers[idx].title = title.to_string();
        debug!(%id, title, "renamed timer");
        Ok(())
    }

    pub fn set_countdown(&mut self, id: TimerId, enabled: bool) -> StoreResult<()> {
        let Some(idx) = self.position(id) else {
            return Ok(());
        };
        if self.timers[idx].enable_countdown == enabled {
            return Ok(());
        }

        self.repo.update_timer(id, &self.timers[idx].title, enabled)?;
        self.timers[idx].enable_countdown = enabled;
        Ok(())
    }

    /// Delete a timer and every record it owns. Unknown ids are ignored,
    /// so deleting twice is harmless.
    pub fn delete_timer(&mut self, id: TimerId) -> StoreResult<()> {
        let Some(idx) = self.position(id) else {
            debug!(%id, "timer already absent");
            return Ok(());
        };

        self.repo.delete_timer(id)?;
        let removed = self.timers.remove(idx);
        info!(%id, records = removed.records.len(), "deleted timer");
        Ok(())
    }

    /// Delete the timers at the given list offsets; out-of-range offsets are skipped
    pub fn delete_timers_at(&mut self, offsets: &[usize]) -> StoreResult<()> {
        let ids: Vec<TimerId> = offsets
            .iter()
            .filter_map(|&i| self.timers.get(i).map(|t| t.id))
            .collect();
        for id in ids {
            self.delete_timer(id)?;
        }
        Ok(())
    }

    /// Prepend a record of `duration` seconds to the timer.
    ///
    /// Returns `Ok(None)` without touching anything when the duration is
    /// not a positive finite number or the timer does not exist.
    pub fn append_record(
        &mut self,
        id: TimerId,
        duration: f64,
        timestamp: Option<DateTime<Local>>,
    ) -> StoreResult<Option<Record>> {
        if !duration.is_finite() || duration <= 0.0 {
            debug!(%id, duration, "discarding non-positive run");
            return Ok(None);
        }
        let Some(idx) = self.position(id) else {
            warn!(%id, "record for unknown timer dropped");
            return Ok(None);
        };

        let record = Record::new(duration, timestamp);
        self.repo.insert_record(id, &record)?;
        self.timers[idx].records.insert(0, record.clone());
        debug!(%id, duration, "appended record");
        Ok(Some(record))
    }

    pub fn delete_record(&mut self, timer: TimerId, record: RecordId) -> StoreResult<()> {
        let Some(idx) = self.position(timer) else {
            return Ok(());
        };
        let Some(pos) = self.timers[idx].records.iter().position(|r| r.id == record) else {
            return Ok(());
        };

        self.repo.delete_record(timer, record)?;
        self.timers[idx].records.remove(pos);
        debug!(%timer, %record, "deleted record");
        Ok(())
    }

    /// Delete the records at the given offsets of the timer's newest-first list
    pub fn delete_records_at(&mut self, timer: TimerId, offsets: &[usize]) -> StoreResult<()> {
        let ids: Vec<RecordId> = match self.timer(timer) {
            Some(t) => offsets
                .iter()
                .filter_map(|&i| t.records.get(i).map(|r| r.id))
                .collect(),
            None => return Ok(()),
        };
        for id in ids {
            self.delete_record(timer, id)?;
        }
        Ok(())
    }
}
