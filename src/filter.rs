use crate::models::NormalizedRecord;
use crate::normalize::normalize_id_str;

/// Records belonging to `student_id` dated within `month` (zero-based) of `year`.
/// Input order is kept.
pub fn filter_records(
    records: &[NormalizedRecord],
    student_id: &str,
    month: u32,
    year: i32,
) -> Vec<NormalizedRecord> {
    let wanted = normalize_id_str(student_id);
    records
        .iter()
        .filter(|record| record.student_ids.iter().any(|id| *id == wanted))
        .filter(|record| in_month(&record.date, month, year))
        .cloned()
        .collect()
}

/// `(year, zero-based month)` of a canonical date; `None` for empty or malformed dates.
pub fn year_month(date: &str) -> Option<(i32, u32)> {
    let mut parts = date.splitn(3, '-');
    let year = parts.next()?.parse::<i32>().ok()?;
    let month = parts.next()?.parse::<u32>().ok()?;
    parts.next()?;
    (1..=12).contains(&month).then_some((year, month - 1))
}

fn in_month(date: &str, month: u32, year: i32) -> bool {
    year_month(date) == Some((year, month))
}
