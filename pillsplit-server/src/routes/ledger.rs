//! Fill and distribution endpoints

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{post, put},
};
use pillsplit_core::{Distribution, Fill, LedgerStore, NewDistribution, NewFill, RunOut};
use serde::Serialize;
use tracing::warn;

use crate::routes::AppError;
use crate::state::{AppState, Manager};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/fills", post(create_fill))
        .route("/api/fills/{id}", put(update_fill))
        .route("/api/distributions", post(create_distribution))
        .route("/api/distributions/{id}", put(update_distribution))
}

/// POST /api/fills - Record a prescription fill
async fn create_fill(
    State(state): State<AppState>,
    Json(req): Json<NewFill>,
) -> Result<(StatusCode, Json<Fill>), AppError> {
    let fill = state.manager()?.ledger().add_fill(&req)?;
    Ok((StatusCode::CREATED, Json(fill)))
}

/// PUT /api/fills/:id - Replace a fill's fields
async fn update_fill(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(req): Json<NewFill>,
) -> Result<Json<Fill>, AppError> {
    let fill = state.manager()?.ledger().update_fill(id, &req)?;
    Ok(Json(fill))
}

/// A recorded distribution with when it runs out.
///
/// The distribution is already stored when the run-out is computed, so a
/// custody calendar problem is reported in `run_out_error` instead of failing
/// the request.
#[derive(Serialize)]
pub struct DistributionResponse {
    pub distribution: Distribution,
    pub run_out: Option<RunOut>,
    pub run_out_error: Option<String>,
}

fn with_run_out(manager: &Manager, distribution: Distribution) -> DistributionResponse {
    match manager.run_out(distribution.date, distribution.quantity) {
        Ok(run_out) => DistributionResponse {
            distribution,
            run_out: Some(run_out),
            run_out_error: None,
        },
        Err(e) => {
            warn!(id = distribution.id, error = %e, "distribution saved without a run-out date");
            DistributionResponse {
                distribution,
                run_out: None,
                run_out_error: Some(e.to_string()),
            }
        }
    }
}

/// POST /api/distributions - Record pills handed to the other parent.
/// Without `fill_id` the distribution is charged to the latest fill.
async fn create_distribution(
    State(state): State<AppState>,
    Json(mut req): Json<NewDistribution>,
) -> Result<(StatusCode, Json<DistributionResponse>), AppError> {
    let manager = state.manager()?;

    if req.fill_id.is_none() {
        req.fill_id = manager.ledger().latest_fill()?.map(|f| f.id);
    }
    let distribution = manager.ledger().add_distribution(&req)?;

    Ok((StatusCode::CREATED, Json(with_run_out(&manager, distribution))))
}

/// PUT /api/distributions/:id - Replace a distribution's fields
async fn update_distribution(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(req): Json<NewDistribution>,
) -> Result<Json<DistributionResponse>, AppError> {
    let manager = state.manager()?;
    let distribution = manager.ledger().update_distribution(id, &req)?;

    Ok(Json(with_run_out(&manager, distribution)))
}
