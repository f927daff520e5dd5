use crate::handlers;
use crate::state::AppState;
use axum::{routing::{get, post}, Router};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/register", get(handlers::register_page).post(handlers::register_form))
        .route("/login", get(handlers::login_page).post(handlers::login_form))
        .route("/logout", post(handlers::logout_form))
        .route("/checkin", get(handlers::checkin_page).post(handlers::checkin_form))
        .route("/history", get(handlers::history_page))
        .route("/calendar", get(handlers::calendar_page))
        .route("/api/register", post(handlers::api_register))
        .route("/api/login", post(handlers::api_login))
        .route("/api/logout", post(handlers::api_logout))
        .route("/api/session", get(handlers::api_session))
        .route("/api/checkin", post(handlers::api_checkin))
        .route("/api/history", get(handlers::api_history))
        .route("/api/calendar", get(handlers::api_calendar))
        .route("/api/classes", get(handlers::api_classes))
        .with_state(state)
}
