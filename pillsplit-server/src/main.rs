mod routes;
mod state;

use anyhow::{Context, Result};
use axum::Router;
use pillsplit_core::PillConfig;
use std::net::SocketAddr;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use crate::state::AppState;

pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .merge(routes::overview::router())
        .merge(routes::ledger::router())
        .merge(routes::reminders::router())
        .with_state(state)
        .layer(cors)
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    pillsplit_core::telemetry::init_tracing("info");

    let config = PillConfig::load().context("Failed to load config")?;
    let port = config.server_port;
    let state = AppState::new(config)?;

    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    info!(%addr, "pillsplit-server listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app(state)).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use http_body_util::BodyExt;
    use serde_json::{Value, json};
    use std::path::Path;
    use tower::ServiceExt;

    /// Tracked parent: Sunday 5pm to Wednesday 5pm, weekly from Sep 28 2025.
    const WEEKLY_CUSTODY: &str = "BEGIN:VCALENDAR\r\nVERSION:2.0\r\nPRODID:TEST\r\nBEGIN:VEVENT\r\n\
UID:weekly-custody\r\nSUMMARY:Custody\r\nDTSTART:20250928T170000Z\r\nDTEND:20251001T170000Z\r\n\
RRULE:FREQ=WEEKLY\r\nEND:VEVENT\r\nEND:VCALENDAR\r\n";

    /// A zero-length custody block on Oct 20.
    const EMPTY_CUSTODY: &str = "BEGIN:VCALENDAR\r\nVERSION:2.0\r\nPRODID:TEST\r\nBEGIN:VEVENT\r\n\
UID:empty\r\nSUMMARY:Custody\r\nDTSTART:20251020T170000Z\r\nDTEND:20251020T170000Z\r\n\
END:VEVENT\r\nEND:VCALENDAR\r\n";

    fn test_app(dir: &Path, custody: Option<&str>) -> Router {
        let custody_dir = dir.join("custody");
        if let Some(ics) = custody {
            std::fs::create_dir_all(&custody_dir).unwrap();
            std::fs::write(custody_dir.join("custody.ics"), ics).unwrap();
        }

        let config = PillConfig {
            custody_dir,
            database_path: dir.join("ledger.db"),
            ..PillConfig::default()
        };
        app(AppState::new(config).unwrap())
    }

    async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json");
        let request = match body {
            Some(body) => request.body(Body::from(body.to_string())).unwrap(),
            None => request.body(Body::empty()).unwrap(),
        };

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    #[tokio::test]
    async fn test_status_without_fills_is_no_data() {
        let dir = tempfile::tempdir().unwrap();
        let app = test_app(dir.path(), Some(WEEKLY_CUSTODY));

        let (status, body) = send(&app, "GET", "/api/status", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["state"], "no_data");
    }

    #[tokio::test]
    async fn test_record_fill_and_distribution() {
        let dir = tempfile::tempdir().unwrap();
        let app = test_app(dir.path(), Some(WEEKLY_CUSTODY));

        let (status, fill) = send(
            &app,
            "POST",
            "/api/fills",
            Some(json!({ "date": "2025-10-08", "quantity": 30, "pharmacy": "Corner Drug" })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(fill["quantity"], 30);

        let (status, created) = send(
            &app,
            "POST",
            "/api/distributions",
            Some(json!({ "date": "2025-10-13", "quantity": 16 })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created["distribution"]["fill_id"], fill["id"]);
        // Four other-parent days a week: 16 pills last through Sun Nov 9
        assert_eq!(created["run_out"]["kind"], "custody_aware");
        assert_eq!(created["run_out"]["date"], "2025-11-13");

        let (status, history) = send(&app, "GET", "/api/history?limit=5", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(history["fills"].as_array().unwrap().len(), 1);
        assert_eq!(history["distributions"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_distribution_is_saved_once_when_run_out_fails() {
        let dir = tempfile::tempdir().unwrap();
        let app = test_app(dir.path(), Some(EMPTY_CUSTODY));

        let (status, _) = send(
            &app,
            "POST",
            "/api/fills",
            Some(json!({ "date": "2025-10-08", "quantity": 30 })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, created) = send(
            &app,
            "POST",
            "/api/distributions",
            Some(json!({ "date": "2025-10-13", "quantity": 16 })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created["distribution"]["quantity"], 16);
        assert!(created["run_out"].is_null());
        assert!(created["run_out_error"].as_str().unwrap().contains("event 'empty'"));

        let id = created["distribution"]["id"].as_i64().unwrap();
        let (status, updated) = send(
            &app,
            "PUT",
            &format!("/api/distributions/{id}"),
            Some(json!({ "date": "2025-10-13", "quantity": 14 })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert!(updated["run_out"].is_null());

        let (_, history) = send(&app, "GET", "/api/history", None).await;
        let distributions = history["distributions"].as_array().unwrap();
        assert_eq!(distributions.len(), 1);
        assert_eq!(distributions[0]["quantity"], 14);
    }

    #[tokio::test]
    async fn test_update_missing_fill_is_404() {
        let dir = tempfile::tempdir().unwrap();
        let app = test_app(dir.path(), Some(WEEKLY_CUSTODY));

        let (status, body) = send(
            &app,
            "PUT",
            "/api/fills/99",
            Some(json!({ "date": "2025-10-08", "quantity": 30 })),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body["error"].as_str().unwrap().contains("99"));
    }

    #[tokio::test]
    async fn test_zero_quantity_is_400() {
        let dir = tempfile::tempdir().unwrap();
        let app = test_app(dir.path(), Some(WEEKLY_CUSTODY));

        let (status, _) = send(
            &app,
            "POST",
            "/api/fills",
            Some(json!({ "date": "2025-10-08", "quantity": 0 })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_days_splits_the_week() {
        let dir = tempfile::tempdir().unwrap();
        let app = test_app(dir.path(), Some(WEEKLY_CUSTODY));

        let (status, body) = send(&app, "GET", "/api/days?from=2025-10-13&to=2025-10-19", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["split"]["tracked_pills"], 3);
        assert_eq!(body["split"]["other_pills"], 4);
        assert_eq!(body["days"][0]["date"], "2025-10-13");
        assert_eq!(body["days"][0]["parent"], "tracked");
        assert_eq!(body["days"][3]["parent"], "other");
    }

    #[tokio::test]
    async fn test_reversed_window_is_400() {
        let dir = tempfile::tempdir().unwrap();
        let app = test_app(dir.path(), Some(WEEKLY_CUSTODY));

        let (status, _) = send(&app, "GET", "/api/days?from=2025-10-19&to=2025-10-13", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_missing_custody_calendar_is_502() {
        let dir = tempfile::tempdir().unwrap();
        let app = test_app(dir.path(), None);

        let (status, body) = send(&app, "GET", "/api/days?from=2025-10-13&to=2025-10-19", None).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert!(body["error"].is_string());
    }
}
