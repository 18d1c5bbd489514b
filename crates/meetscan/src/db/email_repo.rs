//! Email repository: queries against the `emails` table.
//!
//! `unique_id` carries a UNIQUE constraint, so [`upsert`] is a single
//! `INSERT ... ON CONFLICT DO UPDATE` statement and never produces a
//! second row for the same message.

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, OptionalExtension, Row};
use serde::Serialize;

use super::{Database, DatabaseError};

/// A message ready to be written to the store.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailRecord {
    /// Message-ID header, or the synthesized fallback.
    pub unique_id: String,
    pub sender: String,
    pub subject: String,
    /// Plain-text body (HTML already stripped).
    pub body: String,
    /// Timestamp assigned by the mail server.
    pub received_at: DateTime<Utc>,
    /// True only when both classification passes accepted the message.
    pub is_meeting_candidate: bool,
    pub meeting_time: Option<DateTime<Utc>>,
}

/// A persisted message including its surrogate key.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredEmail {
    pub id: i64,
    #[serde(flatten)]
    pub record: EmailRecord,
}

/// Formats a timestamp the way it is stored: RFC 3339, UTC, second precision.
///
/// The fixed width keeps lexical order equal to chronological order, which
/// `MAX(received_at)` relies on.
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Secs, true)
}

fn parse_timestamp(column: &'static str, value: String) -> Result<DateTime<Utc>, DatabaseError> {
    DateTime::parse_from_rfc3339(&value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| DatabaseError::InvalidTimestamp { column, value })
}

/// Raw column values, converted outside the rusqlite row closure so that
/// timestamp errors surface as [`DatabaseError`].
struct RawRow {
    id: i64,
    unique_id: String,
    sender: String,
    subject: String,
    body: String,
    received_at: String,
    is_meeting_candidate: bool,
    meeting_time: Option<String>,
}

impl RawRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            unique_id: row.get(1)?,
            sender: row.get(2)?,
            subject: row.get(3)?,
            body: row.get(4)?,
            received_at: row.get(5)?,
            is_meeting_candidate: row.get(6)?,
            meeting_time: row.get(7)?,
        })
    }

    fn into_stored(self) -> Result<StoredEmail, DatabaseError> {
        let meeting_time = match self.meeting_time {
            Some(value) => Some(parse_timestamp("meeting_time", value)?),
            None => None,
        };
        Ok(StoredEmail {
            id: self.id,
            record: EmailRecord {
                unique_id: self.unique_id,
                sender: self.sender,
                subject: self.subject,
                body: self.body,
                received_at: parse_timestamp("received_at", self.received_at)?,
                is_meeting_candidate: self.is_meeting_candidate,
                meeting_time,
            },
        })
    }
}

const SELECT_COLUMNS: &str = "SELECT id, unique_id, sender, subject, body, received_at, \
                              is_meeting_candidate, meeting_time FROM emails";

/// Returns true if a record with this unique id is already stored.
///
/// An empty id never matches.
pub fn exists(db: &Database, unique_id: &str) -> Result<bool, DatabaseError> {
    if unique_id.is_empty() {
        return Ok(false);
    }

    db.with_conn(|conn| {
        let found = conn
            .query_row(
                "SELECT 1 FROM emails WHERE unique_id = ?1 LIMIT 1",
                params![unique_id],
                |_| Ok(()),
            )
            .optional()?;
        Ok(found.is_some())
    })
}

/// Inserts the record, or updates every field of the existing row with the
/// same `unique_id`. Returns the surrogate id of the row.
pub fn upsert(db: &Database, record: &EmailRecord) -> Result<i64, DatabaseError> {
    db.with_conn(|conn| {
        let id = conn.query_row(
            "INSERT INTO emails (unique_id, sender, subject, body, received_at, is_meeting_candidate, meeting_time)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
             ON CONFLICT(unique_id) DO UPDATE SET
                 sender = excluded.sender,
                 subject = excluded.subject,
                 body = excluded.body,
                 received_at = excluded.received_at,
                 is_meeting_candidate = excluded.is_meeting_candidate,
                 meeting_time = excluded.meeting_time
             RETURNING id",
            params![
                record.unique_id,
                record.sender,
                record.subject,
                record.body,
                format_timestamp(&record.received_at),
                record.is_meeting_candidate,
                record.meeting_time.as_ref().map(format_timestamp),
            ],
            |row| row.get::<_, i64>(0),
        )?;
        Ok(id)
    })
}

/// Finds the most recent `received_at` across all stored records.
pub fn find_max_received_at(db: &Database) -> Result<Option<DateTime<Utc>>, DatabaseError> {
    let raw = db.with_conn(|conn| {
        let value: Option<String> =
            conn.query_row("SELECT MAX(received_at) FROM emails", [], |r| r.get(0))?;
        Ok(value)
    })?;

    raw.map(|value| parse_timestamp("received_at", value))
        .transpose()
}

/// Finds a single record by unique id.
pub fn find_by_unique_id(
    db: &Database,
    unique_id: &str,
) -> Result<Option<StoredEmail>, DatabaseError> {
    let raw = db.with_conn(|conn| {
        let sql = format!("{} WHERE unique_id = ?1", SELECT_COLUMNS);
        let row = conn
            .query_row(&sql, params![unique_id], RawRow::from_row)
            .optional()?;
        Ok(row)
    })?;

    raw.map(RawRow::into_stored).transpose()
}

/// Returns every stored record, newest `received_at` first.
pub fn list_all(db: &Database) -> Result<Vec<StoredEmail>, DatabaseError> {
    let rows = db.with_conn(|conn| {
        let sql = format!("{} ORDER BY received_at DESC, id DESC", SELECT_COLUMNS);
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map([], RawRow::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    })?;

    rows.into_iter().map(RawRow::into_stored).collect()
}

/// Counts stored records.
pub fn count(db: &Database) -> Result<u64, DatabaseError> {
    db.with_conn(|conn| {
        let count: u64 = conn.query_row("SELECT COUNT(*) FROM emails", [], |r| r.get(0))?;
        Ok(count)
    })
}
