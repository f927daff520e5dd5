use crate::models::NormalizedRecord;
use crate::normalize::normalize_record;
use crate::storage::{KeyValueStore, ATTENDANCE_RECORDS_KEY, CURRENT_USER_KEY};
use serde_json::Value;
use tracing::debug;

/// A named place attendance records can be read from.
pub trait RecordSource {
    fn name(&self) -> &'static str;

    /// Normalized records held by this source; empty when the source has nothing.
    fn fetch(&self, store: &KeyValueStore) -> Vec<NormalizedRecord>;
}

/// The dedicated `attendanceRecords` collection.
pub struct AttendanceCollection;

impl RecordSource for AttendanceCollection {
    fn name(&self) -> &'static str {
        ATTENDANCE_RECORDS_KEY
    }

    fn fetch(&self, store: &KeyValueStore) -> Vec<NormalizedRecord> {
        match store.get_raw(ATTENDANCE_RECORDS_KEY) {
            Some(Value::Array(entries)) => entries
                .iter()
                .map(|entry| normalize_record(entry, None))
                .collect(),
            _ => Vec::new(),
        }
    }
}

/// Attendance embedded in the logged-in student's record.
pub struct SessionAttendance;

impl RecordSource for SessionAttendance {
    fn name(&self) -> &'static str {
        CURRENT_USER_KEY
    }

    fn fetch(&self, store: &KeyValueStore) -> Vec<NormalizedRecord> {
        let Some(owner) = store.get_raw(CURRENT_USER_KEY) else {
            return Vec::new();
        };
        match owner.get("attendance") {
            Some(Value::Array(entries)) => entries
                .iter()
                .map(|entry| normalize_record(entry, Some(owner)))
                .collect(),
            _ => Vec::new(),
        }
    }
}

pub static DEFAULT_SOURCES: [&(dyn RecordSource + Sync); 2] = [&AttendanceCollection, &SessionAttendance];

/// Records from the first source, in declared order, that has any.
pub fn resolve_records_from(
    sources: &[&(dyn RecordSource + Sync)],
    store: &KeyValueStore,
) -> Vec<NormalizedRecord> {
    for source in sources {
        let records = source.fetch(store);
        if !records.is_empty() {
            debug!(source = source.name(), count = records.len(), "resolved attendance records");
            return records;
        }
    }
    debug!("no attendance records in any source");
    Vec::new()
}

pub fn resolve_records(store: &KeyValueStore) -> Vec<NormalizedRecord> {
    resolve_records_from(&DEFAULT_SOURCES, store)
}
