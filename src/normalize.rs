use crate::models::{AttendanceStatus, NormalizedRecord};
use chrono::{DateTime, Local, NaiveDate, NaiveDateTime};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

const ID_KEYS: [&str; 4] = ["studentId", "student_id", "userId", "user_id"];
const DATE_KEYS: [&str; 5] = ["date", "checkInDate", "checkInTime", "timestamp", "time"];
const SUBJECT_KEYS: [&str; 3] = ["subject", "classCode", "className"];

const DATETIME_FORMATS: [&str; 5] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%m/%d/%Y, %I:%M:%S %p",
];
const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y"];

static CANONICAL_DATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").expect("canonical date pattern"));

/// Identifier used for every identifier comparison: strings are trimmed and
/// integral numbers lose any fractional rendering, so `123` and `"123"` agree.
pub fn normalize_id(value: &Value) -> Option<String> {
    let id = match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => match (n.as_i64(), n.as_u64(), n.as_f64()) {
            (Some(i), _, _) => i.to_string(),
            (_, Some(u), _) => u.to_string(),
            (_, _, Some(f)) if f.fract() == 0.0 => format!("{f:.0}"),
            (_, _, Some(f)) => f.to_string(),
            _ => return None,
        },
        _ => return None,
    };
    (!id.is_empty()).then_some(id)
}

pub fn normalize_id_str(id: &str) -> String {
    id.trim().to_string()
}

/// Canonical `YYYY-MM-DD` form of a stored date, or the empty string when it
/// cannot be read.
pub fn canonicalize_date(raw: &str) -> String {
    let raw = raw.trim();
    if CANONICAL_DATE.is_match(raw) {
        return raw.to_string();
    }
    parse_date(raw)
        .map(|date| date.format("%Y-%m-%d").to_string())
        .unwrap_or_default()
}

pub fn canonicalize_date_value(value: &Value) -> String {
    match value {
        Value::String(s) => canonicalize_date(s),
        Value::Number(n) => n
            .as_i64()
            .and_then(date_from_millis)
            .map(|date| date.format("%Y-%m-%d").to_string())
            .unwrap_or_default(),
        _ => String::new(),
    }
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
    if raw.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Local).date_naive());
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(raw) {
        return Some(dt.with_timezone(&Local).date_naive());
    }
    if let Some(dt) = DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
    {
        return Some(dt.date());
    }
    if let Some(date) = DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
    {
        return Some(date);
    }
    if raw.bytes().all(|b| b.is_ascii_digit()) {
        return raw.parse::<i64>().ok().and_then(date_from_millis);
    }
    None
}

fn date_from_millis(millis: i64) -> Option<NaiveDate> {
    DateTime::from_timestamp_millis(millis).map(|dt| dt.with_timezone(&Local).date_naive())
}

fn first_present<'a>(raw: &'a Value, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|key| raw.get(*key))
        .find(|value| match value {
            Value::Null => false,
            Value::String(s) => !s.trim().is_empty(),
            _ => true,
        })
}

/// Converts one stored attendance entry into its canonical shape.
///
/// `owner` is the student record the entry is embedded in, if any; its own
/// identifiers are appended after the entry's explicit id fields.
pub fn normalize_record<'a>(raw: &'a Value, owner: Option<&'a Value>) -> NormalizedRecord {
    let mut student_ids: Vec<String> = Vec::new();
    let owner_ids = owner
        .into_iter()
        .flat_map(|owner| ["studentId", "id"].into_iter().filter_map(move |key| owner.get(key)));
    for value in ID_KEYS
        .iter()
        .filter_map(|key| raw.get(*key))
        .chain(owner_ids)
    {
        if let Some(id) = normalize_id(value) {
            if !student_ids.contains(&id) {
                student_ids.push(id);
            }
        }
    }

    let date = first_present(raw, &DATE_KEYS)
        .map(canonicalize_date_value)
        .unwrap_or_default();

    let subject = first_present(raw, &SUBJECT_KEYS)
        .and_then(Value::as_str)
        .map(|s| s.trim().to_string())
        .unwrap_or_default();

    let status = raw
        .get("status")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(AttendanceStatus::Present.as_str())
        .to_string();

    NormalizedRecord {
        student_ids,
        date,
        subject,
        status,
    }
}
