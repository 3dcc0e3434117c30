//! Read-only endpoints: status, overview, custody days, history

use axum::{
    Json, Router,
    extract::{Query, State},
    routing::get,
};
use chrono::NaiveDate;
use pillsplit_core::{DateWindow, History, Overview, Parent, PillSplit, Status};
use serde::{Deserialize, Serialize};

use crate::routes::AppError;
use crate::state::AppState;

/// Length of `/api/days` when `to` is omitted
const DEFAULT_DAYS_SPAN: i64 = 14;
const DEFAULT_HISTORY_LIMIT: u32 = 10;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/status", get(status))
        .route("/api/overview", get(overview))
        .route("/api/days", get(days))
        .route("/api/history", get(history))
}

/// GET /api/status - Supply status from the ledger alone
async fn status(State(state): State<AppState>) -> Result<Json<Status>, AppError> {
    let status = state.manager()?.status(state.today()?)?;
    Ok(Json(status))
}

/// GET /api/overview - Status, run-out estimate, and the next handoff
async fn overview(State(state): State<AppState>) -> Result<Json<Overview>, AppError> {
    let overview = state.manager()?.overview(state.today()?)?;
    Ok(Json(overview))
}

#[derive(Deserialize)]
pub struct DaysQuery {
    pub from: Option<String>,
    pub to: Option<String>,
}

#[derive(Serialize)]
pub struct DayEntry {
    pub date: NaiveDate,
    pub parent: Parent,
}

#[derive(Serialize)]
pub struct DaysResponse {
    pub days: Vec<DayEntry>,
    pub split: PillSplit,
}

/// GET /api/days?from=YYYY-MM-DD&to=YYYY-MM-DD - Parent for each day
async fn days(
    State(state): State<AppState>,
    Query(query): Query<DaysQuery>,
) -> Result<Json<DaysResponse>, AppError> {
    let window = DateWindow::from_args(
        query.from.as_deref(),
        query.to.as_deref(),
        state.today()?,
        DEFAULT_DAYS_SPAN,
    )?;
    let parent_days = state.manager()?.parent_days(window)?;

    let days = window
        .days()
        .filter_map(|date| parent_days.parent_on(date).map(|parent| DayEntry { date, parent }))
        .collect();

    Ok(Json(DaysResponse {
        days,
        split: parent_days.split(),
    }))
}

#[derive(Deserialize)]
pub struct HistoryQuery {
    pub limit: Option<u32>,
}

/// GET /api/history?limit=N - Recent fills and distributions
async fn history(
    State(state): State<AppState>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<History>, AppError> {
    let limit = query.limit.unwrap_or(DEFAULT_HISTORY_LIMIT);
    Ok(Json(state.manager()?.history(limit)?))
}
