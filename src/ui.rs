use crate::calendar::{CalendarCell, CalendarGrid, CalendarView};
use crate::models::{ClassOffering, HistoryResponse, Student};
use html_escape::{encode_double_quoted_attribute, encode_text};

const WEEKDAYS: [&str; 7] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];

pub fn render_home(session: Option<&Student>) -> String {
    let body = match session {
        Some(student) => format!(
            r#"<section class="panel">
      <div class="stat"><span class="label">Student</span><span class="value">{name}</span></div>
      <div class="stat"><span class="label">Student ID</span><span class="value">{id}</span></div>
      <div class="stat"><span class="label">Check-ins</span><span class="value net">{count}</span></div>
    </section>
    <section class="actions">
      <a class="btn btn-main" href="/checkin">Check in</a>
      <a class="btn btn-alt" href="/history">History</a>
      <a class="btn btn-alt" href="/calendar">Calendar</a>
      <form method="post" action="/logout"><button class="btn btn-alt" type="submit">Log out</button></form>
    </section>"#,
            name = encode_text(&student.name),
            id = encode_text(&student.student_id),
            count = student.attendance.len(),
        ),
        None => r#"<p class="subtitle">Log in to check in to a class and see your attendance.</p>
    <section class="actions">
      <a class="btn btn-main" href="/login">Log in</a>
      <a class="btn btn-alt" href="/register">Register</a>
    </section>"#
            .to_string(),
    };
    layout("Attendance", &body)
}

pub fn render_register() -> String {
    layout(
        "Register",
        r#"<form class="form" method="post" action="/register">
      <label>Full name <input name="name" required /></label>
      <label>Student ID <input name="student_id" inputmode="numeric" required /></label>
      <label>University email <input name="university_email" type="email" placeholder="example@nmu.edu.eg" required /></label>
      <label>Password <input name="password" type="password" required /></label>
      <button class="btn btn-main" type="submit">Register</button>
    </form>
    <p class="hint">Already registered? <a href="/login">Log in</a>.</p>"#,
    )
}

pub fn render_login() -> String {
    layout(
        "Log in",
        r#"<form class="form" method="post" action="/login">
      <label>Email or student ID <input name="identifier" required /></label>
      <label>Password <input name="password" type="password" required /></label>
      <button class="btn btn-main" type="submit">Log in</button>
    </form>
    <p class="hint">No account yet? <a href="/register">Register</a>.</p>"#,
    )
}

pub fn render_checkin(student: &Student, classes: &[ClassOffering]) -> String {
    let options: String = classes
        .iter()
        .map(|class| {
            format!(
                r#"<option value="{code}">{code} · {name} ({instructor})</option>"#,
                code = encode_double_quoted_attribute(class.code),
                name = encode_text(class.name),
                instructor = encode_text(class.instructor),
            )
        })
        .collect();
    let body = format!(
        r#"<p class="subtitle">Checking in as {name}.</p>
    <form class="form" method="post" action="/checkin">
      <label>Class <select name="class_code">{options}</select></label>
      <label>Security code <input name="security_code" autocomplete="off" /></label>
      <button class="btn btn-main" type="submit">Check in</button>
    </form>"#,
        name = encode_text(&student.name),
    );
    layout("Check in", &body)
}

pub fn render_history(history: &HistoryResponse) -> String {
    let rows: String = history
        .entries
        .iter()
        .map(|entry| {
            format!(
                "<tr><td>{date}</td><td>{code}</td><td>{name}</td><td>{instructor}</td><td>{status}</td></tr>",
                date = encode_text(&entry.day()),
                code = encode_text(&entry.class_code),
                name = encode_text(&entry.class_name),
                instructor = encode_text(&entry.instructor),
                status = encode_text(&entry.status),
            )
        })
        .collect();
    let body = if rows.is_empty() {
        r#"<p class="subtitle">No attendance recorded yet.</p>"#.to_string()
    } else {
        format!(
            r#"<table class="history">
      <thead><tr><th>Date</th><th>Code</th><th>Class</th><th>Instructor</th><th>Status</th></tr></thead>
      <tbody>{rows}</tbody>
    </table>"#
        )
    };
    layout("History", &body)
}

pub fn render_calendar(view: CalendarView, grid: Option<&CalendarGrid>) -> String {
    let (CalendarView::Displaying { .. }, Some(grid)) = (view, grid) else {
        return layout(
            "Calendar",
            r#"<p class="subtitle">No student is logged in.</p>
    <section class="actions"><a class="btn btn-main" href="/login">Log in</a></section>"#,
        );
    };

    let nav_link = |target: CalendarView, text: &str| match target {
        CalendarView::Displaying { month, year } => {
            format!(r#"<a class="btn btn-alt" href="/calendar?month={month}&amp;year={year}">{text}</a>"#)
        }
        _ => String::new(),
    };

    let headers: String = WEEKDAYS
        .iter()
        .map(|day| format!(r#"<div class="weekday">{day}</div>"#))
        .collect();
    let cells: String = grid.cells.iter().map(render_cell).collect();

    let body = format!(
        r#"<div class="calendar-header">
      {prev}
      <h2 id="month-label">{label}</h2>
      {next}
    </div>
    <div class="calendar">{headers}{cells}</div>"#,
        prev = nav_link(view.previous(), "&larr; Previous"),
        next = nav_link(view.next(), "Next &rarr;"),
        label = encode_text(&grid.label),
    );
    layout("Calendar", &body)
}

fn render_cell(cell: &CalendarCell) -> String {
    match cell {
        CalendarCell::Blank => r#"<div class="day empty"></div>"#.to_string(),
        CalendarCell::Day(day) => {
            let class = if day.present { "day present" } else { "day" };
            let labels: String = day
                .labels
                .iter()
                .map(|label| format!(r#"<span class="subject">{}</span>"#, encode_text(label)))
                .collect();
            let title = if day.title.is_empty() {
                String::new()
            } else {
                format!(r#" title="{}""#, encode_double_quoted_attribute(&day.title))
            };
            format!(
                r#"<div class="{class}" data-date="{date}"{title}><span class="num">{num}</span>{labels}</div>"#,
                date = day.date,
                num = day.day,
            )
        }
    }
}

fn layout(title: &str, body: &str) -> String {
    PAGE_HTML
        .replace("{{TITLE}}", &encode_text(title))
        .replace("{{BODY}}", body)
}

const PAGE_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1.0" />
  <title>{{TITLE}} · Attendance Tracker</title>
  <style>
    @import url('https://fonts.googleapis.com/css2?family=Space+Grotesk:wght@400;500;600&family=Fraunces:wght@600&display=swap');

    :root {
      --bg-1: #f8f3e6;
      --bg-2: #f5d3a7;
      --ink: #2b2a28;
      --accent: #ff6b4a;
      --accent-2: #2f4858;
      --card: rgba(255, 255, 255, 0.86);
      --shadow: 0 24px 60px rgba(47, 72, 88, 0.18);
    }

    * {
      box-sizing: border-box;
    }

    body {
      margin: 0;
      min-height: 100vh;
      background: radial-gradient(circle at top, var(--bg-2), transparent 60%),
        linear-gradient(135deg, var(--bg-1), #ffe9d4 60%, #f9f2e9 100%);
      color: var(--ink);
      font-family: "Space Grotesk", "Trebuchet MS", sans-serif;
      display: grid;
      place-items: center;
      padding: 32px 18px 48px;
    }

    .app {
      width: min(860px, 100%);
      background: var(--card);
      backdrop-filter: blur(12px);
      border-radius: 28px;
      box-shadow: var(--shadow);
      padding: 36px;
      display: grid;
      gap: 28px;
    }

    header {
      display: flex;
      align-items: baseline;
      justify-content: space-between;
      gap: 12px;
    }

    header a {
      color: var(--accent-2);
    }

    h1 {
      font-family: "Fraunces", "Georgia", serif;
      font-weight: 600;
      font-size: clamp(2rem, 4vw, 2.8rem);
      margin: 0;
    }

    .subtitle,
    .hint {
      margin: 0;
      color: #5f5c57;
    }

    .panel,
    .actions {
      display: grid;
      grid-template-columns: repeat(auto-fit, minmax(180px, 1fr));
      gap: 16px;
    }

    .stat {
      background: white;
      border-radius: 18px;
      padding: 18px;
      border: 1px solid rgba(47, 72, 88, 0.08);
      display: grid;
      gap: 8px;
    }

    .stat .label {
      font-size: 0.85rem;
      text-transform: uppercase;
      letter-spacing: 0.12em;
      color: #8b857d;
    }

    .stat .value {
      font-size: 1.4rem;
      font-weight: 600;
      color: var(--accent-2);
    }

    .stat .value.net {
      color: var(--accent);
    }

    .form {
      display: grid;
      gap: 14px;
    }

    .form label {
      display: grid;
      gap: 6px;
      font-weight: 500;
    }

    input,
    select {
      font: inherit;
      padding: 12px 14px;
      border-radius: 12px;
      border: 1px solid rgba(47, 72, 88, 0.2);
    }

    .btn {
      appearance: none;
      border: none;
      border-radius: 999px;
      padding: 14px 20px;
      font: inherit;
      font-weight: 600;
      text-align: center;
      text-decoration: none;
      cursor: pointer;
      color: white;
    }

    .btn-main {
      background: var(--accent);
      box-shadow: 0 10px 24px rgba(255, 107, 74, 0.3);
    }

    .btn-alt {
      background: var(--accent-2);
      box-shadow: 0 10px 24px rgba(47, 72, 88, 0.3);
    }

    .history {
      width: 100%;
      border-collapse: collapse;
      background: white;
      border-radius: 18px;
      overflow: hidden;
    }

    .history th,
    .history td {
      padding: 10px 12px;
      text-align: left;
      border-bottom: 1px solid rgba(47, 72, 88, 0.08);
    }

    .calendar-header {
      display: flex;
      align-items: center;
      justify-content: space-between;
      gap: 12px;
    }

    .calendar {
      display: grid;
      grid-template-columns: repeat(7, 1fr);
      gap: 8px;
    }

    .weekday {
      font-size: 0.8rem;
      text-transform: uppercase;
      letter-spacing: 0.1em;
      color: #8b857d;
      text-align: center;
    }

    .day {
      min-height: 72px;
      background: white;
      border-radius: 14px;
      padding: 8px;
      border: 1px solid rgba(47, 72, 88, 0.08);
      display: grid;
      align-content: start;
      gap: 4px;
      font-size: 0.85rem;
    }

    .day.empty {
      background: transparent;
      border: none;
    }

    .day.present {
      background: var(--accent);
      color: white;
    }

    .day .num {
      font-weight: 600;
    }

    @media (max-width: 600px) {
      .app {
        padding: 28px 22px;
      }
    }
  </style>
</head>
<body>
  <main class="app">
    <header>
      <h1>{{TITLE}}</h1>
      <a href="/">Home</a>
    </header>
    {{BODY}}
  </main>
</body>
</html>
"#;
