use crate::errors::{TrackerError, TrackerResult};
use crate::models::{RegisterRequest, SessionId, Student};
use crate::normalize::normalize_id;
use crate::storage::{KeyValueStore, CURRENT_STUDENT_KEY, CURRENT_USER_KEY};
use crate::validation::{
    validate_name, validate_password, validate_student_id, validate_university_email,
};
use chrono::{DateTime, Local, SecondsFormat};
use tracing::info;

pub fn register(store: &mut KeyValueStore, request: &RegisterRequest) -> TrackerResult<Student> {
    register_at(store, request, Local::now())
}

pub fn register_at(
    store: &mut KeyValueStore,
    request: &RegisterRequest,
    now: DateTime<Local>,
) -> TrackerResult<Student> {
    let student_id = request.student_id.trim();
    let email = request.university_email.trim();

    validate_name(&request.name)?;
    validate_student_id(student_id)?;
    validate_university_email(email)?;
    validate_password(&request.password)?;

    let email = email.to_lowercase();
    let mut users = store.users();
    if users.has_student_id(student_id) {
        return Err(TrackerError::Duplicate(
            "This Student ID is already registered!".into(),
        ));
    }
    if users.has_email(&email) {
        return Err(TrackerError::Duplicate("This email is already registered!".into()));
    }

    let student = Student {
        id: SessionId::Number(now.timestamp_millis()),
        name: request.name.trim().to_string(),
        student_id: student_id.to_string(),
        university_email: email,
        password: request.password.clone(),
        attendance: Vec::new(),
        registered_at: now.to_rfc3339_opts(SecondsFormat::Millis, true),
        ..Student::default()
    };
    users.push(student.clone());
    store.save_users(&users)?;

    info!(student_id = %student.student_id, "registered student");
    Ok(student)
}

/// Starts a session for the student whose email or student id is `identifier`.
pub fn login(store: &mut KeyValueStore, identifier: &str, password: &str) -> TrackerResult<Student> {
    let identifier = identifier.trim();
    let student = store
        .users()
        .students()
        .find(|user| {
            (user.university_email.trim().eq_ignore_ascii_case(identifier)
                || user.student_id.trim() == identifier)
                && user.password == password
        })
        .cloned()
        .ok_or_else(|| TrackerError::Lookup("Invalid email/student ID or password".into()))?;

    store.save_current_user(&student)?;
    info!(student_id = %student.student_id, "student logged in");
    Ok(student)
}

pub fn logout(store: &mut KeyValueStore) {
    store.clear_session();
}

pub fn current_session(store: &KeyValueStore) -> TrackerResult<Student> {
    store.current_user().ok_or(TrackerError::NoSession)
}

/// Identifier of the logged-in student: `currentUser.studentId`, then
/// `currentUser.id`, then the legacy `currentStudent` key.
pub fn session_student_id(store: &KeyValueStore) -> Option<String> {
    let from_user = store.get_raw(CURRENT_USER_KEY).and_then(|user| {
        ["studentId", "id"]
            .into_iter()
            .filter_map(|key| user.get(key))
            .find_map(normalize_id)
    });
    from_user.or_else(|| store.get_raw(CURRENT_STUDENT_KEY).and_then(normalize_id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::USERS_KEY;
    use chrono::TimeZone;
    use serde_json::json;

    fn request(student_id: &str, email: &str) -> RegisterRequest {
        RegisterRequest {
            name: "Mariam Adel".into(),
            student_id: student_id.into(),
            university_email: email.into(),
            password: "Abcd123!".into(),
        }
    }

    fn now() -> DateTime<Local> {
        Local.with_ymd_and_hms(2026, 10, 16, 9, 0, 0).unwrap()
    }

    #[test]
    fn register_stores_trimmed_student() {
        let mut store = KeyValueStore::default();
        let student = register_at(&mut store, &request(" 123456789 ", "A@nmu.edu.eg"), now()).unwrap();

        assert_eq!(student.student_id, "123456789");
        assert_eq!(student.university_email, "a@nmu.edu.eg");
        assert_eq!(student.id, SessionId::Number(now().timestamp_millis()));
        assert!(student.attendance.is_empty());
        let stored: Vec<Student> = store.users().students().cloned().collect();
        assert_eq!(stored, vec![student]);
    }

    #[test]
    fn register_rejects_duplicates() {
        let mut store = KeyValueStore::default();
        register_at(&mut store, &request("123456789", "a@nmu.edu.eg"), now()).unwrap();

        let same_id = register_at(&mut store, &request("123456789", "b@nmu.edu.eg"), now());
        assert!(matches!(same_id, Err(TrackerError::Duplicate(_))));
        let same_email = register_at(&mut store, &request("987654321", "a@nmu.edu.eg"), now());
        assert!(matches!(same_email, Err(TrackerError::Duplicate(_))));
        assert_eq!(store.users().len(), 1);
    }

    fn legacy_users() -> serde_json::Value {
        json!([
            {
                "id": "legacy-1",
                "name": "Old Record",
                "studentId": 111111111,
                "universityEmail": "old@nmu.edu.eg",
                "password": "Abcd123!",
                "attendance": [{ "classCode": "CS211", "date": "2024-03-05" }]
            },
            { "studentId": "222222222", "universityEmail": "broken@nmu.edu.eg", "attendance": 7 }
        ])
    }

    #[test]
    fn register_keeps_differently_shaped_users() {
        let mut store = KeyValueStore::default();
        store.set_raw(USERS_KEY, legacy_users());

        register_at(&mut store, &request("123456789", "a@nmu.edu.eg"), now()).unwrap();

        let saved = store.get_raw(USERS_KEY).unwrap().as_array().unwrap().clone();
        assert_eq!(saved.len(), 3);
        assert_eq!(saved[0]["attendance"][0]["date"], "2024-03-05");
        assert_eq!(saved[1], legacy_users()[1]);
        assert_eq!(saved[2]["studentId"], "123456789");
    }

    #[test]
    fn unreadable_users_still_block_duplicates() {
        let mut store = KeyValueStore::default();
        store.set_raw(USERS_KEY, legacy_users());

        let same_id = register_at(&mut store, &request("222222222", "new@nmu.edu.eg"), now());
        assert!(matches!(same_id, Err(TrackerError::Duplicate(_))));
        let same_email = register_at(&mut store, &request("333333333", "broken@nmu.edu.eg"), now());
        assert!(matches!(same_email, Err(TrackerError::Duplicate(_))));
    }

    #[test]
    fn login_reads_differently_shaped_user() {
        let mut store = KeyValueStore::default();
        store.set_raw(USERS_KEY, legacy_users());

        let student = login(&mut store, "111111111", "Abcd123!").unwrap();

        assert_eq!(student.id, SessionId::Text("legacy-1".into()));
        assert_eq!(current_session(&store).unwrap().attendance.len(), 1);
        assert_eq!(session_student_id(&store).as_deref(), Some("111111111"));
    }

    #[test]
    fn register_validates_before_writing() {
        let mut store = KeyValueStore::default();
        let mut bad = request("123456789", "a@nmu.edu.eg");
        bad.password = "weak".into();
        assert!(matches!(register_at(&mut store, &bad, now()), Err(TrackerError::Validation(_))));
        assert!(store.users().is_empty());
    }

    #[test]
    fn login_accepts_email_or_student_id() {
        let mut store = KeyValueStore::default();
        register_at(&mut store, &request("123456789", "a@nmu.edu.eg"), now()).unwrap();

        assert!(matches!(
            login(&mut store, "a@nmu.edu.eg", "wrong"),
            Err(TrackerError::Lookup(_))
        ));
        assert!(current_session(&store).is_err());

        login(&mut store, "A@NMU.EDU.EG", "Abcd123!").unwrap();
        assert_eq!(session_student_id(&store).as_deref(), Some("123456789"));

        logout(&mut store);
        assert!(matches!(current_session(&store), Err(TrackerError::NoSession)));

        login(&mut store, "123456789", "Abcd123!").unwrap();
        assert_eq!(current_session(&store).unwrap().student_id, "123456789");
    }

    #[test]
    fn session_id_falls_back_to_legacy_key() {
        let mut store = KeyValueStore::default();
        assert_eq!(session_student_id(&store), None);

        store.set_raw(CURRENT_STUDENT_KEY, json!("555555555"));
        assert_eq!(session_student_id(&store).as_deref(), Some("555555555"));

        store.set_raw(CURRENT_USER_KEY, json!({ "id": 1700000000000i64 }));
        assert_eq!(session_student_id(&store).as_deref(), Some("1700000000000"));
    }
}
