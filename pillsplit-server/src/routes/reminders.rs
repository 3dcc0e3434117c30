//! Reminder endpoints

use axum::{Json, Router, extract::State, routing::post};
use pillsplit_core::{CalendarDirSink, ReminderReport};

use crate::routes::AppError;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/api/reminders/sync", post(sync_reminders))
}

/// POST /api/reminders/sync - Write reminder events for the current plan
async fn sync_reminders(State(state): State<AppState>) -> Result<Json<ReminderReport>, AppError> {
    let sink = CalendarDirSink::from_config(state.config())?;
    let report = state.manager()?.sync_reminders(&sink, state.today()?)?;
    Ok(Json(report))
}
