use crate::accounts::{self, current_session, session_student_id};
use crate::calendar::{render_month, CalendarGrid, CalendarView};
use crate::catalog::CLASS_OFFERINGS;
use crate::checkin::{self, history};
use crate::errors::{AppError, TrackerError, TrackerResult};
use crate::filter::filter_records;
use crate::models::{
    AttendanceEntry, CalendarQuery, CalendarResponse, CheckInRequest, ClassOffering,
    HistoryResponse, LoginRequest, RegisterRequest, SessionResponse,
};
use crate::sources::resolve_records;
use crate::state::AppState;
use crate::storage::{persist_data, KeyValueStore};
use crate::ui;
use axum::{
    extract::{Query, State},
    response::{Html, Redirect},
    Form, Json,
};
use chrono::{Datelike, NaiveDate};
use tracing::warn;

pub async fn index(State(state): State<AppState>) -> Html<String> {
    let data = state.data.lock().await;
    Html(ui::render_home(data.current_user().as_ref()))
}

pub async fn register_page() -> Html<String> {
    Html(ui::render_register())
}

pub async fn login_page() -> Html<String> {
    Html(ui::render_login())
}

pub async fn checkin_page(State(state): State<AppState>) -> Result<Html<String>, AppError> {
    let data = state.data.lock().await;
    let student = current_session(&data)?;
    Ok(Html(ui::render_checkin(&student, &CLASS_OFFERINGS)))
}

pub async fn history_page(State(state): State<AppState>) -> Result<Html<String>, AppError> {
    let data = state.data.lock().await;
    Ok(Html(ui::render_history(&history(&data)?)))
}

pub async fn calendar_page(
    State(state): State<AppState>,
    Query(query): Query<CalendarQuery>,
) -> Result<Html<String>, AppError> {
    let data = state.data.lock().await;
    let (view, grid) = calendar_for(&data, &query)?;
    Ok(Html(ui::render_calendar(view, grid.as_ref())))
}

pub async fn register_form(
    State(state): State<AppState>,
    Form(payload): Form<RegisterRequest>,
) -> Result<Redirect, AppError> {
    mutate(&state, |store| accounts::register(store, &payload)).await?;
    Ok(Redirect::to("/login"))
}

pub async fn login_form(
    State(state): State<AppState>,
    Form(payload): Form<LoginRequest>,
) -> Result<Redirect, AppError> {
    mutate(&state, |store| {
        accounts::login(store, &payload.identifier, &payload.password)
    })
    .await?;
    Ok(Redirect::to("/"))
}

pub async fn logout_form(State(state): State<AppState>) -> Result<Redirect, AppError> {
    logout_session(&state).await?;
    Ok(Redirect::to("/"))
}

pub async fn checkin_form(
    State(state): State<AppState>,
    Form(payload): Form<CheckInRequest>,
) -> Result<Redirect, AppError> {
    record_check_in(&state, &payload).await?;
    Ok(Redirect::to("/history"))
}

pub async fn api_register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<Json<SessionResponse>, AppError> {
    let student = mutate(&state, |store| accounts::register(store, &payload)).await?;
    Ok(Json(SessionResponse::from(&student)))
}

pub async fn api_login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<SessionResponse>, AppError> {
    let student = mutate(&state, |store| {
        accounts::login(store, &payload.identifier, &payload.password)
    })
    .await?;
    Ok(Json(SessionResponse::from(&student)))
}

pub async fn api_logout(State(state): State<AppState>) -> Result<Json<serde_json::Value>, AppError> {
    logout_session(&state).await?;
    Ok(Json(serde_json::json!({ "logged_out": true })))
}

pub async fn api_session(State(state): State<AppState>) -> Result<Json<SessionResponse>, AppError> {
    let data = state.data.lock().await;
    let student = current_session(&data)?;
    Ok(Json(SessionResponse::from(&student)))
}

pub async fn api_checkin(
    State(state): State<AppState>,
    Json(payload): Json<CheckInRequest>,
) -> Result<Json<AttendanceEntry>, AppError> {
    let entry = record_check_in(&state, &payload).await?;
    Ok(Json(entry))
}

pub async fn api_history(State(state): State<AppState>) -> Result<Json<HistoryResponse>, AppError> {
    let data = state.data.lock().await;
    Ok(Json(history(&data)?))
}

pub async fn api_calendar(
    State(state): State<AppState>,
    Query(query): Query<CalendarQuery>,
) -> Result<Json<CalendarResponse>, AppError> {
    let data = state.data.lock().await;
    let (view, grid) = calendar_for(&data, &query)?;
    Ok(Json(CalendarResponse {
        view,
        previous: view.previous(),
        next: view.next(),
        grid,
    }))
}

pub async fn api_classes() -> Json<Vec<ClassOffering>> {
    Json(CLASS_OFFERINGS.to_vec())
}

async fn record_check_in(
    state: &AppState,
    payload: &CheckInRequest,
) -> Result<AttendanceEntry, AppError> {
    mutate(state, |store| {
        checkin::check_in(store, &payload.class_code, &payload.security_code)
    })
    .await
}

async fn logout_session(state: &AppState) -> Result<(), AppError> {
    mutate(state, |store| {
        accounts::logout(store);
        Ok(())
    })
    .await
}

/// Runs one operation against a working copy of the store and persists it.
/// A failed operation leaves both the file and the in-memory store untouched.
async fn mutate<T>(
    state: &AppState,
    op: impl FnOnce(&mut KeyValueStore) -> TrackerResult<T>,
) -> Result<T, AppError> {
    let mut data = state.data.lock().await;
    let mut working = data.clone();
    let value = op(&mut working).inspect_err(|err| {
        if !matches!(err, TrackerError::Storage(_)) {
            warn!("rejected action: {err}");
        }
    })?;
    persist_data(&state.data_path, &working).await?;
    *data = working;
    Ok(value)
}

fn calendar_for(
    store: &KeyValueStore,
    query: &CalendarQuery,
) -> Result<(CalendarView, Option<CalendarGrid>), AppError> {
    if query.month.is_some_and(|month| month > 11) {
        return Err(AppError::bad_request("month must be between 0 and 11"));
    }
    let years = NaiveDate::MIN.year()..=NaiveDate::MAX.year();
    if query.year.is_some_and(|year| !years.contains(&year)) {
        return Err(AppError::bad_request(format!(
            "year must be between {} and {}",
            years.start(),
            years.end()
        )));
    }
    let session = session_student_id(store);
    let view = CalendarView::resolve_now(session.as_deref(), query.month.zip(query.year));
    let grid = match (view, session) {
        (CalendarView::Displaying { month, year }, Some(student_id)) => {
            let records = resolve_records(store);
            let filtered = filter_records(&records, &student_id, month, year);
            Some(render_month(month, year, &filtered))
        }
        _ => None,
    };
    Ok((view, grid))
}
