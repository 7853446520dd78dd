//! SQLite-based statistics storage.
//!
//! Records one row per completed work unit and answers daily and
//! all-time counts. The session engine reaches it only through the
//! [`StatsSink`] trait.

use std::path::Path;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};

use super::data_dir;
use crate::error::{CoreError, DatabaseError, SinkError};
use crate::events::{StatKind, StatRecord};
use crate::sinks::{SinkResult, StatsSink};

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct Stats {
    pub total_work_units: u64,
    pub today_work_units: u64,
    pub last_completed_at: Option<DateTime<Utc>>,
}

/// SQLite database for work-unit statistics.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open the database at `~/.config/tomatotock/tomatotock.db`.
    ///
    /// Creates the database file and schema if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open() -> Result<Self, CoreError> {
        let path = data_dir()?.join("tomatotock.db");
        Self::open_at(&path)
    }

    pub fn open_at(path: &Path) -> Result<Self, CoreError> {
        let conn = Connection::open(path).map_err(|source| DatabaseError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    /// Open an in-memory database (for tests).
    pub fn open_memory() -> Result<Self, CoreError> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&self) -> Result<(), DatabaseError> {
        self.conn
            .execute_batch(
                "CREATE TABLE IF NOT EXISTS work_units (
                    id           INTEGER PRIMARY KEY AUTOINCREMENT,
                    kind         TEXT NOT NULL DEFAULT 'work_unit',
                    completed_at TEXT NOT NULL
                );

                CREATE INDEX IF NOT EXISTS idx_work_units_completed_at ON work_units(completed_at);",
            )
            .map_err(|e| DatabaseError::MigrationFailed(e.to_string()))
    }

    /// Record a completed work unit.
    ///
    /// # Errors
    /// Returns an error if the insert fails.
    pub fn record_work_unit(&self, completed_at: DateTime<Utc>) -> Result<i64, DatabaseError> {
        self.conn.execute(
            "INSERT INTO work_units (kind, completed_at) VALUES (?1, ?2)",
            params!["work_unit", completed_at.to_rfc3339()],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Today's view: today's count and the most recent unit completed today.
    pub fn stats_today(&self) -> Result<Stats, DatabaseError> {
        let since = start_of_today();
        Ok(Stats {
            total_work_units: self.count_all()?,
            today_work_units: self.count_since(&since)?,
            last_completed_at: self
                .last_completed_at()?
                .filter(|at| at.date_naive() == Utc::now().date_naive()),
        })
    }

    pub fn stats_all(&self) -> Result<Stats, DatabaseError> {
        Ok(Stats {
            total_work_units: self.count_all()?,
            today_work_units: self.count_since(&start_of_today())?,
            last_completed_at: self.last_completed_at()?,
        })
    }

    fn count_all(&self) -> Result<u64, DatabaseError> {
        let count = self
            .conn
            .query_row("SELECT COUNT(*) FROM work_units", [], |row| row.get::<_, u64>(0))?;
        Ok(count)
    }

    fn count_since(&self, since: &str) -> Result<u64, DatabaseError> {
        let count = self.conn.query_row(
            "SELECT COUNT(*) FROM work_units WHERE completed_at >= ?1",
            params![since],
            |row| row.get::<_, u64>(0),
        )?;
        Ok(count)
    }

    fn last_completed_at(&self) -> Result<Option<DateTime<Utc>>, DatabaseError> {
        let raw: Option<String> = self.conn.query_row(
            "SELECT MAX(completed_at) FROM work_units",
            [],
            |row| row.get(0),
        )?;
        Ok(raw
            .and_then(|s| DateTime::parse_from_rfc3339(&s).ok())
            .map(|dt| dt.with_timezone(&Utc)))
    }
}

fn start_of_today() -> String {
    let today = Utc::now().format("%Y-%m-%d").to_string();
    format!("{today}T00:00:00+00:00")
}

impl StatsSink for Database {
    fn record(&mut self, record: StatRecord) -> SinkResult {
        match record.kind {
            StatKind::WorkUnit => self
                .record_work_unit(record.at)
                .map(|_| ())
                .map_err(|e| SinkError::failed("stats", e)),
        }
    }
}
