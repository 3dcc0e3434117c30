pub mod ledger;
pub mod overview;
pub mod reminders;

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use pillsplit_core::PillError;
use serde::Serialize;
use tracing::error;

/// Standard API error response
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Convert anyhow errors to HTTP responses
pub struct AppError(anyhow::Error);

impl AppError {
    fn status(&self) -> StatusCode {
        match self.0.downcast_ref::<PillError>() {
            Some(PillError::NotFound { .. }) => StatusCode::NOT_FOUND,
            Some(
                PillError::Validation(_)
                | PillError::InvalidWindow { .. }
                | PillError::InvalidInterval(_),
            ) => StatusCode::BAD_REQUEST,
            Some(PillError::DataIntegrity(_)) => StatusCode::CONFLICT,
            Some(PillError::UpstreamFetch(_)) => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(error = %self.0, "request failed");
        }

        let body = Json(ErrorResponse {
            error: self.0.to_string(),
        });
        (status, body).into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn status_of(err: PillError) -> StatusCode {
        AppError::from(err).into_response().status()
    }

    #[test]
    fn test_error_status_codes() {
        assert_eq!(
            status_of(PillError::NotFound { kind: "fill", id: 7 }),
            StatusCode::NOT_FOUND
        );
        assert_eq!(status_of(PillError::Validation("bad".into())), StatusCode::BAD_REQUEST);
        assert_eq!(
            status_of(PillError::InvalidWindow {
                start: NaiveDate::from_ymd_opt(2025, 2, 1).unwrap(),
                end: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
            }),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(status_of(PillError::DataIntegrity("gap".into())), StatusCode::CONFLICT);
        assert_eq!(
            status_of(PillError::UpstreamFetch("offline".into())),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            status_of(PillError::Config("broken".into())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_non_pill_errors_are_internal() {
        let err = AppError::from(anyhow::anyhow!("boom"));
        assert_eq!(err.into_response().status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
