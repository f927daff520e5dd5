pub mod accounts;
pub mod app;
pub mod calendar;
pub mod catalog;
pub mod checkin;
pub mod config;
pub mod errors;
pub mod filter;
pub mod handlers;
pub mod models;
pub mod normalize;
pub mod sources;
pub mod state;
pub mod storage;
pub mod ui;
pub mod validation;

pub use app::router;
pub use config::Config;
pub use state::AppState;
pub use storage::{load_data, resolve_data_path};
