// SQLite persistence: per-user watermarks, the notice archive, and the
// academic schedule table.

use std::sync::{Mutex, MutexGuard};

use anyhow::{Context, Result};
use rusqlite::{params, Connection, OptionalExtension};

// ---------------------------------------------------------------------------
// Row types
// ---------------------------------------------------------------------------

/// Per-user delivery watermark. Created lazily on first contact; the
/// watermark starts NULL and is overwritten after each delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserPointer {
    pub user_id: String,
    pub last_notice_id: Option<i64>,
}

/// A notice persisted by the ingestion sweep. Unlike the live
/// [`NoticeRecord`](crate::board::NoticeRecord), the archived id is numeric —
/// pinned rows with label ids are never archived.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchivedNotice {
    pub id: i64,
    pub title: String,
    pub date: String,
    pub link: String,
    pub writer: String,
}

/// An academic-calendar entry. Populated out of band; read-only here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleItem {
    pub id: i64,
    pub content: String,
    pub start_date: String,
    pub end_date: String,
}

// ---------------------------------------------------------------------------
// Database
// ---------------------------------------------------------------------------

/// SQLite-backed archive store. All operations are synchronous and return
/// plain records.
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    /// Open (or create) a SQLite database at `path` and ensure all tables
    /// exist. Pass `":memory:"` for an ephemeral in-memory database (useful
    /// for tests).
    pub fn open(path: &str) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("failed to open database at {path}"))?;

        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA busy_timeout = 5000;
             PRAGMA foreign_keys = ON;",
        )
        .context("failed to set database pragmas")?;

        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS users (
                user_id        TEXT PRIMARY KEY,
                last_notice_id INTEGER
            );

            CREATE TABLE IF NOT EXISTS notices (
                id     INTEGER PRIMARY KEY,
                title  TEXT NOT NULL,
                date   TEXT NOT NULL,
                link   TEXT NOT NULL,
                writer TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_notices_date ON notices(date);

            CREATE TABLE IF NOT EXISTS schedules (
                id         INTEGER PRIMARY KEY AUTOINCREMENT,
                content    TEXT NOT NULL,
                start_date TEXT NOT NULL,
                end_date   TEXT NOT NULL
            );
            ",
        )
        .context("failed to create database schema")?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Acquire the database connection.
    ///
    /// Panics if the mutex is poisoned (another thread panicked while
    /// holding the lock). This should never happen in normal operation.
    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().expect("database mutex poisoned")
    }

    // ------------------------------------------------------------------
    // Users / watermarks
    // ------------------------------------------------------------------

    /// Read the pointer for `user_id`, creating it with a NULL watermark if
    /// absent. Idempotent — safe to call repeatedly; a second call never
    /// creates a second row.
    pub fn get_or_create_user(&self, user_id: &str) -> Result<UserPointer> {
        let conn = self.conn();
        conn.execute(
            "INSERT OR IGNORE INTO users (user_id, last_notice_id) VALUES (?1, NULL)",
            params![user_id],
        )
        .context("failed to create user row")?;

        let pointer = conn
            .query_row(
                "SELECT user_id, last_notice_id FROM users WHERE user_id = ?1",
                params![user_id],
                |row| {
                    Ok(UserPointer {
                        user_id: row.get(0)?,
                        last_notice_id: row.get(1)?,
                    })
                },
            )
            .context("failed to read user row")?;

        Ok(pointer)
    }

    /// The user's current watermark, creating the row on first contact.
    pub fn last_seen(&self, user_id: &str) -> Result<Option<i64>> {
        Ok(self.get_or_create_user(user_id)?.last_notice_id)
    }

    /// Overwrite the user's watermark unconditionally (get-or-create first).
    ///
    /// Last-write-wins: no monotonic comparison against the previous value
    /// and no optimistic concurrency — dedup only needs to be approximately
    /// correct under concurrent writes for the same user.
    pub fn set_last_seen(&self, user_id: &str, notice_id: i64) -> Result<()> {
        let conn = self.conn();
        conn.execute(
            "INSERT OR IGNORE INTO users (user_id, last_notice_id) VALUES (?1, NULL)",
            params![user_id],
        )
        .context("failed to create user row")?;
        conn.execute(
            "UPDATE users SET last_notice_id = ?2 WHERE user_id = ?1",
            params![user_id, notice_id],
        )
        .context("failed to update watermark")?;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Notice archive
    // ------------------------------------------------------------------

    /// Archive a notice. Returns `true` if a new row was written, `false`
    /// when the id was already archived (INSERT OR IGNORE).
    pub fn insert_notice(
        &self,
        id: i64,
        title: &str,
        date: &str,
        link: &str,
        writer: &str,
    ) -> Result<bool> {
        let conn = self.conn();
        let changed = conn
            .execute(
                "INSERT OR IGNORE INTO notices (id, title, date, link, writer)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![id, title, date, link, writer],
            )
            .context("failed to insert notice")?;
        Ok(changed > 0)
    }

    pub fn notice_exists(&self, id: i64) -> Result<bool> {
        let conn = self.conn();
        let exists: bool = conn
            .query_row(
                "SELECT EXISTS(SELECT 1 FROM notices WHERE id = ?1)",
                params![id],
                |row| row.get(0),
            )
            .context("failed to check notice existence")?;
        Ok(exists)
    }

    /// Archived notices for one `YY.MM.DD` date, newest (highest id) first.
    pub fn notices_by_date(&self, date: &str) -> Result<Vec<ArchivedNotice>> {
        let conn = self.conn();
        let mut stmt = conn
            .prepare(
                "SELECT id, title, date, link, writer FROM notices
                 WHERE date = ?1 ORDER BY id DESC",
            )
            .context("failed to prepare notices_by_date query")?;

        let notices = stmt
            .query_map(params![date], |row| {
                Ok(ArchivedNotice {
                    id: row.get(0)?,
                    title: row.get(1)?,
                    date: row.get(2)?,
                    link: row.get(3)?,
                    writer: row.get(4)?,
                })
            })
            .context("failed to query notices by date")?
            .collect::<std::result::Result<Vec<_>, _>>()
            .context("failed to map notice rows")?;

        Ok(notices)
    }

    /// Drop archived notices for one date. Returns how many were deleted.
    pub fn delete_old_notices(&self, date: &str) -> Result<usize> {
        let conn = self.conn();
        let deleted = conn
            .execute("DELETE FROM notices WHERE date = ?1", params![date])
            .context("failed to delete old notices")?;
        Ok(deleted)
    }

    // ------------------------------------------------------------------
    // Schedules
    // ------------------------------------------------------------------

    pub fn all_schedules(&self) -> Result<Vec<ScheduleItem>> {
        let conn = self.conn();
        let mut stmt = conn
            .prepare("SELECT id, content, start_date, end_date FROM schedules ORDER BY id")
            .context("failed to prepare schedules query")?;

        let items = stmt
            .query_map([], |row| {
                Ok(ScheduleItem {
                    id: row.get(0)?,
                    content: row.get(1)?,
                    start_date: row.get(2)?,
                    end_date: row.get(3)?,
                })
            })
            .context("failed to query schedules")?
            .collect::<std::result::Result<Vec<_>, _>>()
            .context("failed to map schedule rows")?;

        Ok(items)
    }

    pub fn insert_schedule(&self, content: &str, start_date: &str, end_date: &str) -> Result<i64> {
        let conn = self.conn();
        conn.execute(
            "INSERT INTO schedules (content, start_date, end_date) VALUES (?1, ?2, ?3)",
            params![content, start_date, end_date],
        )
        .context("failed to insert schedule")?;
        Ok(conn.last_insert_rowid())
    }

    /// Lookup used by tests and maintenance tooling.
    pub fn notice_by_id(&self, id: i64) -> Result<Option<ArchivedNotice>> {
        let conn = self.conn();
        let notice = conn
            .query_row(
                "SELECT id, title, date, link, writer FROM notices WHERE id = ?1",
                params![id],
                |row| {
                    Ok(ArchivedNotice {
                        id: row.get(0)?,
                        title: row.get(1)?,
                        date: row.get(2)?,
                        link: row.get(3)?,
                        writer: row.get(4)?,
                    })
                },
            )
            .optional()
            .context("failed to read notice row")?;
        Ok(notice)
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
