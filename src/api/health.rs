use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;
use std::time::Instant;

use crate::api::middleware::state::AppState;
use crate::db::Store;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthStatus {
    Healthy,
    Unhealthy,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: HealthStatus,
    pub timestamp: String,
    pub version: &'static str,
    pub storage: StorageHealth,
}

#[derive(Debug, Serialize)]
pub struct StorageHealth {
    pub status: HealthStatus,
    pub response_time_ms: u128,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// 200 while the card store answers, 503 otherwise
pub async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let storage = probe_storage(&*state.store).await;
    let status = storage.status;

    if status == HealthStatus::Unhealthy {
        tracing::warn!(error = ?storage.error, "Storage health probe failed");
    }

    let status_code = match status {
        HealthStatus::Healthy => StatusCode::OK,
        HealthStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
    };

    (
        status_code,
        Json(HealthResponse {
            status,
            timestamp: chrono::Utc::now().to_rfc3339(),
            version: env!("CARGO_PKG_VERSION"),
            storage,
        }),
    )
}

async fn probe_storage(store: &dyn Store) -> StorageHealth {
    let start = Instant::now();
    let outcome = store.ping().await;
    let response_time_ms = start.elapsed().as_millis();

    match outcome {
        Ok(()) => StorageHealth {
            status: HealthStatus::Healthy,
            response_time_ms,
            error: None,
        },
        Err(e) => StorageHealth {
            status: HealthStatus::Unhealthy,
            response_time_ms,
            error: Some(e.to_string()),
        },
    }
}
