use crate::accounts::current_session;
use crate::catalog::find_class;
use crate::errors::{TrackerError, TrackerResult};
use crate::models::{AttendanceEntry, AttendanceStatus, HistoryResponse, Student};
use crate::storage::KeyValueStore;
use chrono::{DateTime, Local, SecondsFormat};
use tracing::{info, warn};

pub fn check_in(
    store: &mut KeyValueStore,
    class_code: &str,
    security_code: &str,
) -> TrackerResult<AttendanceEntry> {
    check_in_at(store, class_code, security_code, Local::now())
}

/// Records attendance for the logged-in student.
///
/// An empty security code is accepted for any class; only a non-empty wrong
/// code is rejected.
pub fn check_in_at(
    store: &mut KeyValueStore,
    class_code: &str,
    security_code: &str,
    now: DateTime<Local>,
) -> TrackerResult<AttendanceEntry> {
    let mut student = current_session(store)?;

    let Some(offering) = find_class(class_code) else {
        return Err(TrackerError::Lookup(format!(
            "Class code {} was not found",
            class_code.trim().to_uppercase()
        )));
    };

    let security_code = security_code.trim();
    if !security_code.is_empty() && security_code != offering.security_token {
        return Err(TrackerError::Lookup("Incorrect security code".into()));
    }

    let today = now.date_naive().format("%Y-%m-%d").to_string();
    if already_checked_in(&student, offering.code, &today) {
        return Err(TrackerError::Duplicate(format!(
            "You have already checked in to {} today",
            offering.code
        )));
    }

    let entry = AttendanceEntry {
        class_code: offering.code.to_string(),
        class_name: offering.name.to_string(),
        instructor: offering.instructor.to_string(),
        security_code: security_code.to_string(),
        check_in_time: now.to_rfc3339_opts(SecondsFormat::Millis, true),
        check_in_date: today,
        status: AttendanceStatus::Present.as_str().to_string(),
        ..AttendanceEntry::default()
    };
    student.attendance.push(entry.clone());

    let mut users = store.users();
    let found = users
        .students_mut()
        .find(|user| user.student_id == student.student_id);
    if let Some(user) = found {
        user.attendance.push(entry.clone());
        store.save_users(&users)?;
    } else {
        warn!(student_id = %student.student_id, "session student missing from users");
    }
    store.save_current_user(&student)?;

    info!(student_id = %student.student_id, class_code = offering.code, "checked in");
    Ok(entry)
}

fn already_checked_in(student: &Student, class_code: &str, today: &str) -> bool {
    student
        .attendance
        .iter()
        .any(|entry| entry.class_code.trim().eq_ignore_ascii_case(class_code) && entry.day() == today)
}

/// Attendance entries of the logged-in student, in the order they were recorded.
pub fn history(store: &KeyValueStore) -> TrackerResult<HistoryResponse> {
    let student = current_session(store)?;
    Ok(HistoryResponse {
        student_id: student.student_id,
        entries: student.attendance,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accounts::{login, register_at};
    use crate::calendar::render_month;
    use crate::filter::filter_records;
    use crate::models::RegisterRequest;
    use crate::normalize::canonicalize_date;
    use crate::sources::resolve_records;
    use crate::storage::{CURRENT_USER_KEY, USERS_KEY};
    use chrono::{Datelike, Duration, TimeZone};
    use serde_json::json;

    fn now() -> DateTime<Local> {
        Local.with_ymd_and_hms(2026, 10, 16, 10, 0, 0).unwrap()
    }

    fn logged_in_store() -> KeyValueStore {
        let mut store = KeyValueStore::default();
        let request = RegisterRequest {
            name: "Mariam Adel".into(),
            student_id: "123456789".into(),
            university_email: "a@nmu.edu.eg".into(),
            password: "Abcd123!".into(),
        };
        register_at(&mut store, &request, now()).unwrap();
        login(&mut store, "a@nmu.edu.eg", "Abcd123!").unwrap();
        store
    }

    #[test]
    fn check_in_without_token_records_present_entry() {
        let mut store = logged_in_store();

        let entry = check_in_at(&mut store, "AIE111", "", now()).unwrap();

        assert_eq!(entry.class_name, "Artificial Intelligence");
        assert_eq!(entry.status, "Present");
        assert_eq!(entry.check_in_date, "2026-10-16");
        let session = store.current_user().unwrap();
        assert_eq!(session.attendance, vec![entry.clone()]);
        let users = store.users();
        let stored = users.students().next().unwrap();
        assert_eq!(stored.attendance, vec![entry]);

        let records = resolve_records(&store);
        let filtered = filter_records(&records, "123456789", now().month0(), now().year());
        let grid = render_month(now().month0(), now().year(), &filtered);
        let marked: Vec<_> = grid
            .day_cells()
            .filter(|d| d.labels.iter().any(|label| label == "AIE111"))
            .collect();
        assert_eq!(marked.len(), 1);
        assert_eq!(marked[0].date, "2026-10-16");
    }

    #[test]
    fn same_class_same_day_is_duplicate() {
        let mut store = logged_in_store();
        check_in_at(&mut store, "CS211", "", now()).unwrap();

        let again = check_in_at(&mut store, "cs211", "", now() + Duration::hours(2));
        assert!(matches!(again, Err(TrackerError::Duplicate(_))));

        assert!(check_in_at(&mut store, "CS211", "", now() + Duration::days(1)).is_ok());
        assert!(check_in_at(&mut store, "AIE111", "", now()).is_ok());
        assert_eq!(store.current_user().unwrap().attendance.len(), 3);
    }

    #[test]
    fn unknown_class_writes_nothing() {
        let mut store = logged_in_store();
        let result = check_in_at(&mut store, "ZZZZ", "", now());
        assert!(matches!(result, Err(TrackerError::Lookup(_))));
        assert!(store.current_user().unwrap().attendance.is_empty());
        assert!(store.users().students().all(|user| user.attendance.is_empty()));
    }

    #[test]
    fn security_code_is_checked_only_when_given() {
        let mut store = logged_in_store();
        let wrong = check_in_at(&mut store, "CS211", "nope", now());
        assert!(matches!(wrong, Err(TrackerError::Lookup(_))));

        let right = check_in_at(&mut store, "CS211", "DS2024", now()).unwrap();
        assert_eq!(right.security_code, "DS2024");
        assert_eq!(history(&store).unwrap().entries, vec![right]);
    }

    fn legacy_store() -> KeyValueStore {
        let legacy = json!({
            "id": "legacy-1",
            "name": "Old Record",
            "studentId": 111111111,
            "universityEmail": "old@nmu.edu.eg",
            "password": "Abcd123!",
            "attendance": [
                { "classCode": "CS211", "date": "2026-10-15", "note": "imported" },
                { "classCode": "PHY101", "checkInTime": now().timestamp_millis() }
            ]
        });
        let mut store = KeyValueStore::default();
        store.set_raw(USERS_KEY, json!([legacy.clone(), "unreadable"]));
        store.set_raw(CURRENT_USER_KEY, legacy);
        store
    }

    #[test]
    fn check_in_works_for_differently_shaped_session() {
        let mut store = legacy_store();

        let entry = check_in_at(&mut store, "CS211", "", now()).unwrap();

        let history = history(&store).unwrap();
        assert_eq!(history.student_id, "111111111");
        assert_eq!(history.entries.len(), 3);
        assert_eq!(history.entries[0].extra.get("note"), Some(&json!("imported")));
        assert_eq!(history.entries[2], entry);

        let saved = store.get_raw(USERS_KEY).unwrap();
        assert_eq!(saved[0]["attendance"].as_array().map(Vec::len), Some(3));
        assert_eq!(saved[0]["attendance"][0]["date"], "2026-10-15");
        assert_eq!(saved[1], "unreadable");
    }

    #[test]
    fn duplicate_rule_reads_older_date_fields() {
        let mut store = legacy_store();
        let again = check_in_at(&mut store, "PHY101", "", now());
        assert!(matches!(again, Err(TrackerError::Duplicate(_))));

        let earlier = now() - Duration::days(1);
        let again = check_in_at(&mut store, "CS211", "", earlier);
        assert!(matches!(again, Err(TrackerError::Duplicate(_))));

        check_in_at(&mut store, "CS211", "", now()).unwrap();
        let saved = store.get_raw(USERS_KEY).unwrap();
        let kept_time = saved[0]["attendance"][1]["checkInTime"].as_str().unwrap();
        assert_eq!(canonicalize_date(kept_time), "2026-10-16");
    }

    #[test]
    fn check_in_requires_session() {
        let mut store = KeyValueStore::default();
        assert!(matches!(
            check_in_at(&mut store, "AIE111", "", now()),
            Err(TrackerError::NoSession)
        ));
        assert!(matches!(history(&store), Err(TrackerError::NoSession)));
    }
}
