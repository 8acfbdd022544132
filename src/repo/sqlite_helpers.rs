//! SQLite encoding helpers (grounded in the teacher's `db/sqlite_helpers.rs`):
//! SQLite has no native UUID, boolean, or JSON-array type, so ids round-trip
//! through hyphenated text and sets/structs round-trip through JSON text.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::{CuratorError, Result};
use crate::models::locks::FieldLocks;

pub fn uuid_to_text(id: Uuid) -> String {
    id.to_string()
}

pub fn text_to_uuid(s: &str) -> Result<Uuid> {
    Uuid::parse_str(s).map_err(|e| CuratorError::Unknown { source: e.into() })
}

pub fn bool_to_int(b: bool) -> i64 {
    if b { 1 } else { 0 }
}

pub fn int_to_bool(i: i64) -> bool {
    i != 0
}

pub fn datetime_to_text(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339()
}

pub fn text_to_datetime(s: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .or_else(|_| {
            chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
                .map(|naive| naive.and_utc())
        })
        .map_err(|e| CuratorError::Unknown { source: e.into() })
}

pub fn opt_datetime_to_text(dt: Option<DateTime<Utc>>) -> Option<String> {
    dt.map(datetime_to_text)
}

pub fn opt_text_to_datetime(s: Option<String>) -> Result<Option<DateTime<Utc>>> {
    s.map(|s| text_to_datetime(&s)).transpose()
}

pub fn locks_to_json(locks: &FieldLocks) -> String {
    serde_json::to_string(locks).unwrap_or_else(|_| "[]".to_string())
}

pub fn locks_from_json(s: &str) -> FieldLocks {
    serde_json::from_str::<Vec<String>>(s)
        .map(|v| FieldLocks(v.into_iter().collect()))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uuid_round_trips_through_text() {
        let id = Uuid::new_v4();
        assert_eq!(text_to_uuid(&uuid_to_text(id)).unwrap(), id);
    }

    #[test]
    fn locks_round_trip_through_json() {
        let mut locks = FieldLocks::default();
        locks.lock("poster");
        let json = locks_to_json(&locks);
        assert_eq!(locks_from_json(&json), locks);
    }
}
