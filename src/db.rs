use chrono::{DateTime, Local};
use rusqlite::{params, Connection};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{StoreError, StoreResult};
use crate::model::{Record, RecordId, Timer, TimerId};
use crate::store::Repository;

const SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS timers (
        seq INTEGER PRIMARY KEY AUTOINCREMENT,
        id TEXT NOT NULL UNIQUE,
        title TEXT NOT NULL,
        created_at TEXT NOT NULL,
        enable_countdown BOOLEAN NOT NULL DEFAULT 1
    );

    CREATE TABLE IF NOT EXISTS records (
        seq INTEGER PRIMARY KEY AUTOINCREMENT,
        id TEXT NOT NULL UNIQUE,
        timer_id TEXT NOT NULL REFERENCES timers(id) ON DELETE CASCADE,
        duration REAL NOT NULL CHECK (duration > 0),
        timestamp TEXT NOT NULL
    );

    CREATE INDEX IF NOT EXISTS idx_records_timer ON records(timer_id);
    CREATE INDEX IF NOT EXISTS idx_records_timestamp ON records(timestamp);
"#;

/// SQLite-backed durable store for timers and their records
#[derive(Debug)]
pub struct Database {
    conn: Connection,
    path: Option<PathBuf>,
}

impl Database {
    /// Open (creating if needed) the database file at `path`
    pub fn open(path: &Path) -> StoreResult<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path).map_err(StoreError::unavailable("open database"))?;
        let db = Database {
            conn,
            path: Some(path.to_path_buf()),
        };
        db.migrate()?;
        info!(path = %path.display(), "opened timer database");
        Ok(db)
    }

    /// Open a throwaway database that lives only as long as this value
    pub fn open_in_memory() -> StoreResult<Self> {
        let conn =
            Connection::open_in_memory().map_err(StoreError::unavailable("open database"))?;
        let db = Database { conn, path: None };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&self) -> StoreResult<()> {
        self.conn
            .execute_batch("PRAGMA foreign_keys = ON;")
            .and_then(|_| self.conn.execute_batch(SCHEMA))
            .map_err(StoreError::unavailable("migrate schema"))
    }

    /// Location of the backing file, `None` for in-memory databases
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Close the connection, surfacing any error SQLite reports on shutdown
    pub fn close(self) -> StoreResult<()> {
        self.conn
            .close()
            .map_err(|(_, e)| StoreError::unavailable("close database")(e))?;
        debug!("closed timer database");
        Ok(())
    }
}

struct TimerRow {
    id: String,
    title: String,
    created_at: String,
    enable_countdown: bool,
}

struct RecordRow {
    id: String,
    timer_id: String,
    duration: f64,
    timestamp: String,
}

fn parse_uuid(raw: &str) -> StoreResult<Uuid> {
    Uuid::parse_str(raw).map_err(|e| StoreError::Corrupt(format!("id '{raw}': {e}")))
}

fn parse_timestamp(raw: &str) -> StoreResult<DateTime<Local>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Local))
        .map_err(|e| StoreError::Corrupt(format!("timestamp '{raw}': {e}")))
}

impl Repository for Database {
    fn load_timers(&self) -> StoreResult<Vec<Timer>> {
        let timer_rows = {
            let mut stmt = self
                .conn
                .prepare(
                    "SELECT id, title, created_at, enable_countdown FROM timers ORDER BY seq ASC",
                )
                .map_err(StoreError::unavailable("load timers"))?;
            let rows = stmt
                .query_map([], |row| {
                    Ok(TimerRow {
                        id: row.get(0)?,
                        title: row.get(1)?,
                        created_at: row.get(2)?,
                        enable_countdown: row.get(3)?,
                    })
                })
                .map_err(StoreError::unavailable("load timers"))?;
            rows.collect::<rusqlite::Result<Vec<_>>>()
                .map_err(StoreError::unavailable("load timers"))?
        };

        // seq DESC reproduces newest-first insertion order per timer
        let record_rows = {
            let mut stmt = self
                .conn
                .prepare("SELECT id, timer_id, duration, timestamp FROM records ORDER BY seq DESC")
                .map_err(StoreError::unavailable("load records"))?;
            let rows = stmt
                .query_map([], |row| {
                    Ok(RecordRow {
                        id: row.get(0)?,
                        timer_id: row.get(1)?,
                        duration: row.get(2)?,
                        timestamp: row.get(3)?,
                    })
                })
                .map_err(StoreError::unavailable("load records"))?;
            rows.collect::<rusqlite::Result<Vec<_>>>()
                .map_err(StoreError::unavailable("load records"))?
        };

        let mut records_by_timer: HashMap<Uuid, Vec<Record>> = HashMap::new();
        for row in record_rows {
            let record = Record {
                id: RecordId(parse_uuid(&row.id)?),
                duration: row.duration,
                timestamp: parse_timestamp(&row.timestamp)?,
            };
            records_by_timer
                .entry(parse_uuid(&row.timer_id)?)
                .or_default()
                .push(record);
        }

        let mut timers = Vec::with_capacity(timer_rows.len());
        for row in timer_rows {
            let id = parse_uuid(&row.id)?;
            timers.push(Timer {
                id: TimerId(id),
                title: row.title,
                created_at: parse_timestamp(&row.created_at)?,
                enable_countdown: row.enable_countdown,
                records: records_by_timer.remove(&id).unwrap_or_default(),
            });
        }

        debug!(count = timers.len(), "loaded timers");
        Ok(timers)
    }

    fn insert_timer(&mut self, timer: &Timer) -> StoreResult<()> {
        self.conn
            .execute(
                r#"
                INSERT INTO timers (id, title, created_at, enable_countdown)
                VALUES (?1, ?2, ?3, ?4)
                "#,
                params![
                    timer.id.to_string(),
                    timer.title,
                    timer.created_at.to_rfc3339(),
                    timer.enable_countdown,
                ],
            )
            .map_err(StoreError::unavailable("insert timer"))?;
        Ok(())
    }

    fn update_timer(&mut self, id: TimerId, title: &str, enable_countdown: bool) -> StoreResult<()> {
        self.conn
            .execute(
                "UPDATE timers SET title = ?1, enable_countdown = ?2 WHERE id = ?3",
                params![title, enable_countdown, id.to_string()],
            )
            .map_err(StoreError::unavailable("update timer"))?;
        Ok(())
    }

    fn delete_timer(&mut self, id: TimerId) -> StoreResult<()> {
        let tx = self
            .conn
            .transaction()
            .map_err(StoreError::unavailable("delete timer"))?;
        tx.execute("DELETE FROM records WHERE timer_id = ?1", [id.to_string()])
            .map_err(StoreError::unavailable("delete timer"))?;
        tx.execute("DELETE FROM timers WHERE id = ?1", [id.to_string()])
            .map_err(StoreError::unavailable("delete timer"))?;
        tx.commit().map_err(StoreError::unavailable("delete timer"))?;
        Ok(())
    }

    fn insert_record(&mut self, timer: TimerId, record: &Record) -> StoreResult<()> {
        self.conn
            .execute(
                r#"
                INSERT INTO records (id, timer_id, duration, timestamp)
                VALUES (?1, ?2, ?3, ?4)
                "#,
                params![
                    record.id.to_string(),
                    timer.to_string(),
                    record.duration,
                    record.timestamp.to_rfc3339(),
                ],
            )
            .map_err(StoreError::unavailable("insert record"))?;
        Ok(())
    }

    fn delete_record(&mut self, timer: TimerId, record: RecordId) -> StoreResult<()> {
        self.conn
            .execute(
                "DELETE FROM records WHERE id = ?1 AND timer_id = ?2",
                params![record.to_string(), timer.to_string()],
            )
            .map_err(StoreError::unavailable("delete record"))?;
        Ok(())
    }
}
