use crate::calendar::{CalendarGrid, CalendarView};
use crate::normalize::{canonicalize_date, canonicalize_date_value};
use serde::{de, Deserialize, Deserializer, Serialize};
use chrono::{DateTime, Local, SecondsFormat};
use serde_json::Value;
use std::{collections::BTreeMap, fmt};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum AttendanceStatus {
    #[default]
    Present,
}

impl AttendanceStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            AttendanceStatus::Present => "Present",
        }
    }
}

/// One check-in as stored. Every field is optional on read and keys this
/// type does not know about are carried through `extra` untouched.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct AttendanceEntry {
    #[serde(deserialize_with = "loose_string")]
    pub class_code: String,
    #[serde(deserialize_with = "loose_string")]
    pub class_name: String,
    #[serde(deserialize_with = "loose_string")]
    pub instructor: String,
    #[serde(deserialize_with = "loose_string")]
    pub security_code: String,
    #[serde(deserialize_with = "loose_timestamp")]
    pub check_in_time: String,
    #[serde(deserialize_with = "loose_timestamp")]
    pub check_in_date: String,
    #[serde(deserialize_with = "loose_string")]
    pub status: String,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl AttendanceEntry {
    /// Canonical day of the check-in: `checkInDate`, then `checkInTime`, then
    /// any `date`, `timestamp` or `time` key an older record carries.
    pub fn day(&self) -> String {
        [&self.check_in_date, &self.check_in_time]
            .into_iter()
            .map(|raw| canonicalize_date(raw))
            .chain(
                ["date", "timestamp", "time"]
                    .into_iter()
                    .filter_map(|key| self.extra.get(key))
                    .map(canonicalize_date_value),
            )
            .find(|day| !day.is_empty())
            .unwrap_or_default()
    }
}

impl Default for AttendanceEntry {
    fn default() -> Self {
        Self {
            class_code: String::new(),
            class_name: String::new(),
            instructor: String::new(),
            security_code: String::new(),
            check_in_time: String::new(),
            check_in_date: String::new(),
            status: AttendanceStatus::Present.as_str().to_string(),
            extra: BTreeMap::new(),
        }
    }
}

/// Session id of a student: epoch milliseconds for accounts created here,
/// but older records may carry it as a string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SessionId {
    Number(i64),
    Text(String),
}

impl Default for SessionId {
    fn default() -> Self {
        SessionId::Number(0)
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionId::Number(n) => write!(f, "{n}"),
            SessionId::Text(s) => f.write_str(s),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct Student {
    pub id: SessionId,
    #[serde(deserialize_with = "loose_string")]
    pub name: String,
    #[serde(deserialize_with = "loose_string")]
    pub student_id: String,
    #[serde(deserialize_with = "loose_string")]
    pub university_email: String,
    #[serde(deserialize_with = "loose_string")]
    pub password: String,
    pub attendance: Vec<AttendanceEntry>,
    #[serde(deserialize_with = "loose_string")]
    pub registered_at: String,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// Reads a string field that may have been stored as a number or null.
fn loose_string<'de, D>(de: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(de)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        Value::Null => Ok(String::new()),
        other => Err(de::Error::custom(format!("expected a string, found {other}"))),
    }
}

/// Like [`loose_string`], but a number is read as epoch milliseconds and
/// kept as an RFC 3339 local time so its date survives the next write.
fn loose_timestamp<'de, D>(de: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(de)? {
        Value::Number(n) => Ok(n
            .as_i64()
            .and_then(DateTime::from_timestamp_millis)
            .map(|dt| {
                dt.with_timezone(&Local)
                    .to_rfc3339_opts(SecondsFormat::Millis, true)
            })
            .unwrap_or_else(|| n.to_string())),
        other => loose_string(other).map_err(<D::Error as de::Error>::custom),
    }
}

/// Canonical view of one attendance record, whatever shape it was stored in.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct NormalizedRecord {
    /// Normalized identifiers the record may belong to; the first is the primary one.
    pub student_ids: Vec<String>,
    /// `YYYY-MM-DD`, or empty when the stored date could not be read.
    pub date: String,
    pub subject: String,
    pub status: String,
}

impl NormalizedRecord {
    pub fn student_id(&self) -> Option<&str> {
        self.student_ids.first().map(String::as_str)
    }

    pub fn is_present(&self) -> bool {
        self.status.is_empty() || self.status.eq_ignore_ascii_case(AttendanceStatus::Present.as_str())
    }
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct ClassOffering {
    pub code: &'static str,
    pub name: &'static str,
    #[serde(skip_serializing)]
    pub security_token: &'static str,
    pub instructor: &'static str,
}

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub student_id: String,
    pub university_email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub identifier: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct CheckInRequest {
    pub class_code: String,
    #[serde(default)]
    pub security_code: String,
}

#[derive(Debug, Deserialize, Default)]
pub struct CalendarQuery {
    pub month: Option<u32>,
    pub year: Option<i32>,
}

/// Student data safe to hand back to clients.
#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub id: SessionId,
    pub name: String,
    pub student_id: String,
    pub university_email: String,
    pub attendance_count: usize,
}

impl From<&Student> for SessionResponse {
    fn from(student: &Student) -> Self {
        Self {
            id: student.id.clone(),
            name: student.name.clone(),
            student_id: student.student_id.clone(),
            university_email: student.university_email.clone(),
            attendance_count: student.attendance.len(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct HistoryResponse {
    pub student_id: String,
    pub entries: Vec<AttendanceEntry>,
}

#[derive(Debug, Serialize)]
pub struct CalendarResponse {
    pub view: CalendarView,
    pub previous: CalendarView,
    pub next: CalendarView,
    pub grid: Option<CalendarGrid>,
}
