use crate::errors::{AppError, TrackerResult};
use crate::models::Student;
use crate::normalize::normalize_id;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;
use std::{collections::BTreeMap, env, path::Path, path::PathBuf};
use tokio::fs;
use tracing::{error, warn};

pub const USERS_KEY: &str = "users";
pub const CURRENT_USER_KEY: &str = "currentUser";
pub const ATTENDANCE_RECORDS_KEY: &str = "attendanceRecords";
pub const CURRENT_STUDENT_KEY: &str = "currentStudent";

/// Persistent key-value document. Every value is stored as JSON, the same
/// layout a browser's local storage would hold.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(transparent)]
pub struct KeyValueStore {
    entries: BTreeMap<String, Value>,
}

impl KeyValueStore {
    pub fn get_raw(&self, key: &str) -> Option<&Value> {
        self.entries.get(key).filter(|value| !value.is_null())
    }

    /// Decodes a stored value. A value of the wrong shape is logged and read as absent.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let value = self.get_raw(key)?;
        match T::deserialize(value) {
            Ok(decoded) => Some(decoded),
            Err(err) => {
                warn!(key, "ignoring malformed stored value: {err}");
                None
            }
        }
    }

    pub fn set<T: Serialize>(&mut self, key: &str, value: &T) -> TrackerResult<()> {
        let encoded = serde_json::to_value(value)?;
        self.entries.insert(key.to_string(), encoded);
        Ok(())
    }

    pub fn set_raw(&mut self, key: &str, value: Value) {
        self.entries.insert(key.to_string(), value);
    }

    pub fn remove(&mut self, key: &str) {
        self.entries.remove(key);
    }

    pub fn users(&self) -> Roster {
        match self.get_raw(USERS_KEY) {
            Some(Value::Array(items)) => Roster::from_values(items),
            Some(other) => Roster::from_values(std::slice::from_ref(other)),
            None => Roster::default(),
        }
    }

    pub fn save_users(&mut self, users: &Roster) -> TrackerResult<()> {
        self.set(USERS_KEY, users)
    }

    pub fn current_user(&self) -> Option<Student> {
        self.get(CURRENT_USER_KEY)
    }

    pub fn save_current_user(&mut self, student: &Student) -> TrackerResult<()> {
        self.set(CURRENT_USER_KEY, student)
    }

    pub fn clear_session(&mut self) {
        self.remove(CURRENT_USER_KEY);
        self.remove(CURRENT_STUDENT_KEY);
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
enum RosterEntry {
    Student(Student),
    Unreadable(Value),
}

/// The `users` collection, decoded one record at a time. Records that do not
/// decode as a [`Student`] keep their stored position and are written back
/// unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Default)]
#[serde(transparent)]
pub struct Roster {
    entries: Vec<RosterEntry>,
}

impl Roster {
    fn from_values(items: &[Value]) -> Self {
        let entries = items
            .iter()
            .enumerate()
            .map(|(index, item)| match Student::deserialize(item) {
                Ok(student) => RosterEntry::Student(student),
                Err(err) => {
                    warn!(index, "keeping unreadable user record as stored: {err}");
                    RosterEntry::Unreadable(item.clone())
                }
            })
            .collect();
        Self { entries }
    }

    pub fn students(&self) -> impl Iterator<Item = &Student> {
        self.entries.iter().filter_map(|entry| match entry {
            RosterEntry::Student(student) => Some(student),
            RosterEntry::Unreadable(_) => None,
        })
    }

    pub fn students_mut(&mut self) -> impl Iterator<Item = &mut Student> {
        self.entries.iter_mut().filter_map(|entry| match entry {
            RosterEntry::Student(student) => Some(student),
            RosterEntry::Unreadable(_) => None,
        })
    }

    pub fn push(&mut self, student: Student) {
        self.entries.push(RosterEntry::Student(student));
    }

    /// Number of stored records, readable or not.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether any record, readable or not, carries `student_id`.
    pub fn has_student_id(&self, student_id: &str) -> bool {
        self.entries.iter().any(|entry| match entry {
            RosterEntry::Student(student) => student.student_id.trim() == student_id,
            RosterEntry::Unreadable(raw) => {
                raw.get("studentId").and_then(normalize_id).as_deref() == Some(student_id)
            }
        })
    }

    /// Whether any record, readable or not, is registered under `email`.
    pub fn has_email(&self, email: &str) -> bool {
        self.entries.iter().any(|entry| match entry {
            RosterEntry::Student(student) => student.university_email.eq_ignore_ascii_case(email),
            RosterEntry::Unreadable(raw) => raw
                .get("universityEmail")
                .and_then(Value::as_str)
                .is_some_and(|stored| stored.trim().eq_ignore_ascii_case(email)),
        })
    }
}

pub fn resolve_data_path() -> Result<PathBuf, std::io::Error> {
    if let Ok(path) = env::var("APP_DATA_PATH") {
        return Ok(PathBuf::from(path));
    }

    Ok(PathBuf::from("data/state.json"))
}

pub async fn load_data(path: &Path) -> KeyValueStore {
    match fs::read(path).await {
        Ok(bytes) => match serde_json::from_slice(&bytes) {
            Ok(data) => data,
            Err(err) => {
                error!("failed to parse data file: {err}");
                KeyValueStore::default()
            }
        },
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => KeyValueStore::default(),
        Err(err) => {
            error!("failed to read data file: {err}");
            KeyValueStore::default()
        }
    }
}

pub async fn persist_data(path: &Path, data: &KeyValueStore) -> Result<(), AppError> {
    let payload = serde_json::to_vec_pretty(data).map_err(AppError::internal)?;
    fs::write(path, payload)
        .await
        .inspect_err(|err| error!("failed to write data file: {err}"))?;
    Ok(())
}
