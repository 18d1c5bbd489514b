//! Incremental sync cursor.
//!
//! The cursor is never stored on its own: it is the newest `received_at`
//! in the store, so a restart resumes where the last cycle left off.

use chrono::{DateTime, Duration, Utc};
use thiserror::Error;

use crate::db::{email_repo, Database, DatabaseError};

/// Default window for the first cycle against an empty store.
pub const DEFAULT_LOOKBACK_HOURS: i64 = 24;

#[derive(Error, Debug)]
pub enum CursorError {
    #[error(transparent)]
    Store(#[from] DatabaseError),

    #[error("Lookback of {hours} hours reaches before the earliest representable time")]
    LookbackOutOfRange { hours: i64 },
}

/// Returns the timestamp from which the next cycle lists messages.
///
/// The newest stored `received_at` when the store has records, otherwise
/// `now - lookback`. The boundary is inclusive; the message at the floor is
/// listed again and deduplicated by the pipeline.
pub fn compute_floor(
    db: &Database,
    now: DateTime<Utc>,
    lookback: Duration,
) -> Result<DateTime<Utc>, CursorError> {
    if let Some(newest) = email_repo::find_max_received_at(db)? {
        return Ok(newest);
    }
    now.checked_sub_signed(lookback)
        .ok_or(CursorError::LookbackOutOfRange {
            hours: lookback.num_hours(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::EmailRecord;
    use chrono::TimeZone;

    fn record(unique_id: &str, received_at: DateTime<Utc>) -> EmailRecord {
        EmailRecord {
            unique_id: unique_id.to_string(),
            sender: String::new(),
            subject: String::new(),
            body: String::new(),
            received_at,
            is_meeting_candidate: false,
            meeting_time: None,
        }
    }

    #[test]
    fn test_empty_store_uses_lookback() {
        let db = Database::open_in_memory().unwrap();
        let now = Utc.with_ymd_and_hms(2026, 10, 21, 12, 0, 0).unwrap();
        let floor = compute_floor(&db, now, Duration::hours(DEFAULT_LOOKBACK_HOURS)).unwrap();
        assert_eq!(floor, Utc.with_ymd_and_hms(2026, 10, 20, 12, 0, 0).unwrap());
    }

    #[test]
    fn test_lookback_past_date_range_is_an_error() {
        let db = Database::open_in_memory().unwrap();
        let now = Utc.with_ymd_and_hms(2026, 10, 21, 12, 0, 0).unwrap();
        let lookback = Duration::hours(i64::from(u32::MAX));

        let err = compute_floor(&db, now, lookback).unwrap_err();
        assert!(matches!(
            err,
            CursorError::LookbackOutOfRange { hours } if hours == i64::from(u32::MAX)
        ));
    }

    #[test]
    fn test_floor_is_newest_received_at() {
        let db = Database::open_in_memory().unwrap();
        let older = Utc.with_ymd_and_hms(2026, 10, 1, 8, 0, 0).unwrap();
        let newer = Utc.with_ymd_and_hms(2026, 10, 2, 9, 30, 15).unwrap();
        email_repo::upsert(&db, &record("<b@x>", newer)).unwrap();
        email_repo::upsert(&db, &record("<a@x>", older)).unwrap();

        let now = Utc.with_ymd_and_hms(2026, 10, 21, 12, 0, 0).unwrap();
        let floor = compute_floor(&db, now, Duration::hours(24)).unwrap();
        assert_eq!(floor, newer);
    }
}
