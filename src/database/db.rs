//! SQLite item store.
//!
//! Owns every learning item and its review state, answers due-item and
//! statistics queries, and applies review updates as single-statement writes.

use crate::database::clock::Clock;
use crate::error::{NiftyError, Result};
use crate::models::item::INITIAL_EASE_FACTOR;
use crate::models::{Item, ReviewStats};
use chrono::{DateTime, Duration, Utc};
use rusqlite::{Connection, OptionalExtension, Row, params};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

/// Interval for an item that has never been reviewed.
const FIRST_INTERVAL_DAYS: u32 = 1;

const ITEM_COLUMNS: &str = "id, content, created_at, next_review, review_count, ease_factor";

pub struct ItemStore {
    conn: Mutex<Connection>,
    clock: Box<dyn Clock>,
}

impl ItemStore {
    /// Opens (or creates) the database file and makes sure the schema exists.
    pub fn open(path: impl AsRef<Path>, clock: impl Clock + 'static) -> Result<Self> {
        let path = path.as_ref();
        let conn = Connection::open(path)?;
        log::info!("Opened item store at {}", path.display());
        Self::with_connection(conn, clock)
    }

    pub fn open_in_memory(clock: impl Clock + 'static) -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::with_connection(conn, clock)
    }

    fn with_connection(conn: Connection, clock: impl Clock + 'static) -> Result<Self> {
        ensure_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
            clock: Box::new(clock),
        })
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        // Every write is a single statement, so a panic elsewhere cannot leave
        // the connection half-updated.
        self.conn
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Adds a new item that becomes due one day from now.
    ///
    /// Callers are expected to trim and reject empty input themselves; the
    /// store refuses blank content as well.
    pub fn add_item(&self, content: &str) -> Result<i64> {
        if content.trim().is_empty() {
            return Err(NiftyError::validation("item content must not be empty"));
        }

        let now = self.now();
        let next_review = days_after(now, FIRST_INTERVAL_DAYS)?;

        let conn = self.conn();
        conn.execute(
            "INSERT INTO items (content, created_at, next_review, review_count, ease_factor)
             VALUES (?1, ?2, ?3, 0, ?4)",
            params![
                content,
                now.timestamp(),
                next_review.timestamp(),
                INITIAL_EASE_FACTOR
            ],
        )?;
        let id = conn.last_insert_rowid();

        log::debug!("Added item {} due at {}", id, next_review);
        Ok(id)
    }

    /// Returns the due item with the earliest next review.
    ///
    /// Items sharing the same next review come back in ascending id order.
    /// Timestamps are stored as whole Unix seconds, so an item can count as
    /// due up to one second before its exact review time.
    pub fn get_due_item(&self) -> Result<Option<Item>> {
        let now = self.now().timestamp();
        let sql = format!(
            "SELECT {ITEM_COLUMNS} FROM items
             WHERE next_review IS NOT NULL AND next_review <= ?1
             ORDER BY next_review ASC, id ASC
             LIMIT 1"
        );

        let item = self
            .conn()
            .query_row(&sql, params![now], item_from_row)
            .optional()?;
        Ok(item)
    }

    pub fn get_item(&self, id: i64) -> Result<Option<Item>> {
        let sql = format!("SELECT {ITEM_COLUMNS} FROM items WHERE id = ?1");
        let item = self
            .conn()
            .query_row(&sql, params![id], item_from_row)
            .optional()?;
        Ok(item)
    }

    /// Records the outcome of a review: the item becomes due `interval_days` from now.
    ///
    /// Returns `NotFound` and changes nothing when `id` is unknown.
    pub fn update_item_review(
        &self,
        id: i64,
        review_count: u32,
        ease_factor: f64,
        interval_days: u32,
    ) -> Result<()> {
        let next_review = days_after(self.now(), interval_days)?;

        let updated = self.conn().execute(
            "UPDATE items
             SET next_review = ?1, review_count = ?2, ease_factor = ?3
             WHERE id = ?4",
            params![next_review.timestamp(), review_count, ease_factor, id],
        )?;

        if updated == 0 {
            log::warn!("Review update for unknown item {}", id);
            return Err(NiftyError::not_found(id));
        }

        log::debug!(
            "Item {} reviewed {} times, ease {:.2}, next review {}",
            id,
            review_count,
            ease_factor,
            next_review
        );
        Ok(())
    }

    /// Counts all items, the ones currently due, and the mean review count.
    pub fn get_stats(&self) -> Result<ReviewStats> {
        let now = self.now().timestamp();
        let (total, due, average_review_count): (i64, i64, f64) = self.conn().query_row(
            "SELECT
                COUNT(*),
                COALESCE(SUM(CASE WHEN next_review <= ?1 THEN 1 ELSE 0 END), 0),
                COALESCE(AVG(review_count), 0.0)
             FROM items",
            params![now],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
        )?;

        Ok(ReviewStats {
            total: total.max(0) as u64,
            due: due.max(0) as u64,
            average_review_count,
        })
    }

    /// Releases the database connection.
    pub fn close(self) -> Result<()> {
        let conn = self
            .conn
            .into_inner()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        conn.close().map_err(|(_, err)| NiftyError::from(err))?;
        log::info!("Closed item store");
        Ok(())
    }
}

/// Creates the items table if it is missing. Safe to run on every start.
fn ensure_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS items (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            content TEXT NOT NULL,
            created_at INTEGER NOT NULL DEFAULT (CAST(strftime('%s', 'now') AS INTEGER)),
            next_review INTEGER,
            review_count INTEGER NOT NULL DEFAULT 0,
            ease_factor REAL NOT NULL DEFAULT 2.5
        );
        CREATE INDEX IF NOT EXISTS idx_items_next_review ON items(next_review);",
    )?;
    Ok(())
}

fn days_after(now: DateTime<Utc>, days: u32) -> Result<DateTime<Utc>> {
    now.checked_add_signed(Duration::days(i64::from(days)))
        .ok_or_else(|| NiftyError::validation(format!("interval of {} days is out of range", days)))
}

fn timestamp_to_datetime(column: usize, secs: i64) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::from_timestamp(secs, 0).ok_or(rusqlite::Error::IntegralValueOutOfRange(column, secs))
}

fn item_from_row(row: &Row<'_>) -> rusqlite::Result<Item> {
    let created_at = timestamp_to_datetime(2, row.get(2)?)?;
    let next_review = row
        .get::<_, Option<i64>>(3)?
        .map(|secs| timestamp_to_datetime(3, secs))
        .transpose()?;

    Ok(Item {
        id: row.get(0)?,
        content: row.get(1)?,
        created_at,
        next_review,
        review_count: row.get(4)?,
        ease_factor: row.get(5)?,
    })
}
