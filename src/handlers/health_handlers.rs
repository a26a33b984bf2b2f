//! Health & readiness handlers.
//!
//! - GET /healthz  -> simple liveness ("ok")
//! - GET /readyz   -> readiness that checks DB connectivity and disk I/O

use crate::services::report_service::ReportStore;
use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use serde::Serialize;
use tokio::fs;
use uuid::Uuid;

/// `GET /healthz`
///
/// Very small liveness probe — always 200 OK, never performs I/O.
pub async fn healthz() -> impl IntoResponse {
    (StatusCode::OK, Json(serde_json::json!({ "status": "ok" })))
}

/// `GET /readyz`
///
/// Readiness probe over the two resources the toolkit depends on: the
/// SQLite metadata pool and the report storage directory. 200 when both
/// answer, 503 otherwise.
pub async fn readyz(State(store): State<ReportStore>) -> impl IntoResponse {
    let checks = vec![
        CheckStatus::from("sqlite", sqlite_probe(&store).await),
        CheckStatus::from("disk", disk_probe(&store).await),
    ];
    let ok = checks.iter().all(|check| check.ok);

    let status = if ok {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    let body = ReadyResponse {
        status: if ok { "ok" } else { "error" },
        checks,
    };
    (status, Json(body))
}

/// `SELECT 1` against the metadata pool.
async fn sqlite_probe(store: &ReportStore) -> Result<(), String> {
    match sqlx::query_scalar::<_, i64>("SELECT 1")
        .fetch_one(&*store.db)
        .await
    {
        Ok(1) => Ok(()),
        Ok(other) => Err(format!("unexpected result: {}", other)),
        Err(err) => Err(format!("error: {}", err)),
    }
}

/// Best-effort write/read/delete of a probe file under the storage root.
async fn disk_probe(store: &ReportStore) -> Result<(), String> {
    let tmp_path = store.base_path.join(format!(".readyz-{}", Uuid::new_v4()));

    fs::write(&tmp_path, b"readyz")
        .await
        .map_err(|err| format!("could not write tmp file: {}", err))?;
    let read_back = fs::read(&tmp_path).await;
    let _ = fs::remove_file(&tmp_path).await;

    match read_back {
        Ok(bytes) if bytes == b"readyz" => Ok(()),
        Ok(_) => Err("file content mismatch".to_string()),
        Err(err) => Err(format!("could not read tmp file: {}", err)),
    }
}

#[derive(Serialize)]
struct ReadyResponse {
    status: &'static str,
    checks: Vec<CheckStatus>,
}

#[derive(Serialize)]
struct CheckStatus {
    name: &'static str,
    ok: bool,
    error: Option<String>,
}

impl CheckStatus {
    fn from(name: &'static str, result: Result<(), String>) -> Self {
        Self {
            name,
            ok: result.is_ok(),
            error: result.err(),
        }
    }
}
