use crate::models::NormalizedRecord;
use chrono::{Datelike, Local, NaiveDate};
use serde::Serialize;

const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CalendarCell {
    Blank,
    Day(DayCell),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DayCell {
    pub day: u32,
    pub date: String,
    pub present: bool,
    pub labels: Vec<String>,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CalendarGrid {
    pub month: u32,
    pub year: i32,
    pub label: String,
    pub cells: Vec<CalendarCell>,
}

impl CalendarGrid {
    pub fn day_cells(&self) -> impl Iterator<Item = &DayCell> {
        self.cells.iter().filter_map(|cell| match cell {
            CalendarCell::Day(day) => Some(day),
            CalendarCell::Blank => None,
        })
    }

    pub fn leading_blanks(&self) -> usize {
        self.cells
            .iter()
            .take_while(|cell| matches!(cell, CalendarCell::Blank))
            .count()
    }
}

pub fn month_label(month: u32, year: i32) -> String {
    let name = MONTH_NAMES.get(month as usize).copied().unwrap_or("Unknown");
    format!("{name} {year}")
}

/// Zero when the month cannot be represented as a date.
pub fn days_in_month(month: u32, year: i32) -> u32 {
    first_of_month(month, year)
        .map(|first| {
            first
                .iter_days()
                .take_while(|day| day.month() == first.month())
                .count() as u32
        })
        .unwrap_or(0)
}

fn first_of_month(month: u32, year: i32) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month.checked_add(1)?, 1)
}

/// Empty grid for a month: blanks up to the weekday of the 1st (Sunday first),
/// then one cell per day.
pub fn build_grid(month: u32, year: i32) -> CalendarGrid {
    let mut cells = Vec::new();
    if let Some(first) = first_of_month(month, year) {
        let offset = first.weekday().num_days_from_sunday() as usize;
        cells.extend(std::iter::repeat_n(CalendarCell::Blank, offset));
        for day in 1..=days_in_month(month, year) {
            cells.push(CalendarCell::Day(DayCell {
                day,
                date: format!("{year:04}-{:02}-{day:02}", month + 1),
                present: false,
                labels: Vec::new(),
                title: String::new(),
            }));
        }
    }
    CalendarGrid {
        month,
        year,
        label: month_label(month, year),
        cells,
    }
}

/// Marks the cells of present records, attaching subject labels and hover text.
pub fn annotate(grid: &mut CalendarGrid, records: &[NormalizedRecord]) {
    for record in records.iter().filter(|record| record.is_present()) {
        let Some(cell) = grid.cells.iter_mut().find_map(|cell| match cell {
            CalendarCell::Day(day) if !record.date.is_empty() && day.date == record.date => Some(day),
            _ => None,
        }) else {
            continue;
        };
        cell.present = true;
        if record.subject.is_empty() {
            continue;
        }
        cell.labels.push(record.subject.clone());
        if cell.title.is_empty() {
            cell.title = record.subject.clone();
        } else {
            cell.title.push_str(", ");
            cell.title.push_str(&record.subject);
        }
    }
}

/// Full render: a fresh grid for the month with the filtered records applied.
pub fn render_month(month: u32, year: i32, records: &[NormalizedRecord]) -> CalendarGrid {
    let mut grid = build_grid(month, year);
    annotate(&mut grid, records);
    grid
}

/// The month before `month`/`year`, or `None` when the year would overflow.
pub fn previous_month(month: u32, year: i32) -> Option<(u32, i32)> {
    if month == 0 {
        year.checked_sub(1).map(|year| (11, year))
    } else {
        Some((month - 1, year))
    }
}

pub fn next_month(month: u32, year: i32) -> Option<(u32, i32)> {
    if month >= 11 {
        year.checked_add(1).map(|year| (0, year))
    } else {
        Some((month + 1, year))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Default)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum CalendarView {
    #[default]
    Uninitialized,
    NoStudentLoggedIn,
    Displaying { month: u32, year: i32 },
}

impl CalendarView {
    /// Enters the view for a resolved (or missing) session. Without an explicit
    /// month/year the view opens on `today`'s month.
    pub fn resolve(
        session: Option<&str>,
        requested: Option<(u32, i32)>,
        today: NaiveDate,
    ) -> Self {
        match session {
            None => CalendarView::NoStudentLoggedIn,
            Some(_) => {
                let (month, year) = requested
                    .filter(|(month, _)| *month < 12)
                    .unwrap_or((today.month0(), today.year()));
                CalendarView::Displaying { month, year }
            }
        }
    }

    pub fn resolve_now(session: Option<&str>, requested: Option<(u32, i32)>) -> Self {
        Self::resolve(session, requested, Local::now().date_naive())
    }

    pub fn previous(self) -> Self {
        match self {
            CalendarView::Displaying { month, year } => previous_month(month, year)
                .map_or(self, |(month, year)| CalendarView::Displaying { month, year }),
            other => other,
        }
    }

    pub fn next(self) -> Self {
        match self {
            CalendarView::Displaying { month, year } => next_month(month, year)
                .map_or(self, |(month, year)| CalendarView::Displaying { month, year }),
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::normalize_record;
    use serde_json::json;

    fn present(date: &str, subject: &str) -> NormalizedRecord {
        normalize_record(&json!({ "studentId": "123456789", "date": date, "subject": subject }), None)
    }

    #[test]
    fn grid_starts_on_weekday_of_first() {
        // 1 March 2024 was a Friday.
        let grid = build_grid(2, 2024);
        assert_eq!(grid.leading_blanks(), 5);
        assert_eq!(grid.day_cells().count(), 31);
        assert_eq!(grid.label, "March 2024");
        let first = grid.day_cells().next().unwrap();
        assert_eq!(first.date, "2024-03-01");
    }

    #[test]
    fn february_lengths_follow_leap_years() {
        assert_eq!(days_in_month(1, 2024), 29);
        assert_eq!(days_in_month(1, 2023), 28);
        assert_eq!(days_in_month(11, 2023), 31);
    }

    #[test]
    fn annotation_marks_matching_days_and_appends_titles() {
        let records = vec![
            present("2024-03-05", "CS211"),
            present("2024-03-05", "AIE111"),
            present("2024-03-09", ""),
            present("2024-04-05", "PHY101"),
        ];

        let grid = render_month(2, 2024, &records);

        let fifth = grid.day_cells().find(|d| d.day == 5).unwrap();
        assert!(fifth.present);
        assert_eq!(fifth.labels, vec!["CS211", "AIE111"]);
        assert_eq!(fifth.title, "CS211, AIE111");
        let ninth = grid.day_cells().find(|d| d.day == 9).unwrap();
        assert!(ninth.present);
        assert!(ninth.labels.is_empty());
        assert_eq!(grid.day_cells().filter(|d| d.present).count(), 2);
    }

    #[test]
    fn non_present_records_are_not_marked() {
        let absent = normalize_record(
            &json!({ "studentId": "1", "date": "2024-03-05", "status": "Absent" }),
            None,
        );
        let grid = render_month(2, 2024, &[absent]);
        assert!(grid.day_cells().all(|d| !d.present));
    }

    #[test]
    fn rendering_twice_is_identical() {
        let records = vec![present("2024-03-05", "CS211")];
        assert_eq!(render_month(2, 2024, &records), render_month(2, 2024, &records));
    }

    #[test]
    fn navigation_rolls_over_years() {
        assert_eq!(previous_month(0, 2024), Some((11, 2023)));
        assert_eq!(next_month(11, 2024), Some((0, 2025)));
        assert_eq!(next_month(4, 2024), Some((5, 2024)));
    }

    #[test]
    fn navigation_stops_at_year_limits() {
        assert_eq!(next_month(11, i32::MAX), None);
        assert_eq!(previous_month(0, i32::MIN), None);
        assert_eq!(days_in_month(11, i32::MAX), 0);
        assert_eq!(days_in_month(11, NaiveDate::MAX.year()), 31);

        let today = NaiveDate::from_ymd_opt(2026, 10, 16).unwrap();
        let last = CalendarView::resolve(Some("123456789"), Some((11, i32::MAX)), today);
        assert_eq!(last.next(), last);
        assert_eq!(last.previous(), CalendarView::Displaying { month: 10, year: i32::MAX });
        let first = CalendarView::resolve(Some("123456789"), Some((0, i32::MIN)), today);
        assert_eq!(first.previous(), first);
        assert!(build_grid(11, i32::MAX).cells.is_empty());
    }

    #[test]
    fn view_state_transitions() {
        let today = NaiveDate::from_ymd_opt(2026, 10, 16).unwrap();
        assert_eq!(CalendarView::resolve(None, None, today), CalendarView::NoStudentLoggedIn);
        assert_eq!(CalendarView::NoStudentLoggedIn.next(), CalendarView::NoStudentLoggedIn);
        assert_eq!(CalendarView::default().previous(), CalendarView::Uninitialized);

        let view = CalendarView::resolve(Some("123456789"), None, today);
        assert_eq!(view, CalendarView::Displaying { month: 9, year: 2026 });
        assert_eq!(
            view.next().next().next(),
            CalendarView::Displaying { month: 0, year: 2027 }
        );
        assert_eq!(
            CalendarView::resolve(Some("1"), Some((0, 2024)), today).previous(),
            CalendarView::Displaying { month: 11, year: 2023 }
        );
    }
}
