//! Handler for health check endpoint.

use axum::{Json, extract::State, http::StatusCode};

use crate::api::dto::health::{CheckStatus, HealthChecks, HealthResponse};
use crate::state::AppState;

/// Returns service health status with component checks.
///
/// # Endpoint
///
/// `GET /health`
///
/// # Response Codes
///
/// - **200 OK**: all components healthy
/// - **503 Service Unavailable**: one or more components degraded
pub async fn health_handler(
    State(state): State<AppState>,
) -> Result<Json<HealthResponse>, (StatusCode, Json<HealthResponse>)> {
    let db_check = check_database(&state).await;
    let queue_check = check_access_log_queue(&state);

    let all_healthy = db_check.status == "ok" && queue_check.status == "ok";

    let response = HealthResponse {
        status: if all_healthy { "healthy" } else { "degraded" }.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        checks: HealthChecks {
            database: db_check,
            access_log_queue: queue_check,
        },
    };

    if all_healthy {
        Ok(Json(response))
    } else {
        Err((StatusCode::SERVICE_UNAVAILABLE, Json(response)))
    }
}

/// Checks database connectivity with a trivial round trip.
async fn check_database(state: &AppState) -> CheckStatus {
    let Some(pool) = &state.db else {
        return CheckStatus {
            status: "ok".to_string(),
            message: Some("In-memory store".to_string()),
        };
    };

    match sqlx::query_scalar::<_, i32>("SELECT 1")
        .fetch_one(pool.as_ref())
        .await
    {
        Ok(_) => CheckStatus {
            status: "ok".to_string(),
            message: Some("Connected".to_string()),
        },
        Err(e) => CheckStatus {
            status: "error".to_string(),
            message: Some(format!("Database error: {e}")),
        },
    }
}

/// Checks if the access-log queue is operational.
fn check_access_log_queue(state: &AppState) -> CheckStatus {
    if state.access_tx.is_closed() {
        CheckStatus {
            status: "error".to_string(),
            message: Some("Access log queue is closed".to_string()),
        }
    } else {
        CheckStatus {
            status: "ok".to_string(),
            message: Some(format!("Capacity: {}", state.access_tx.capacity())),
        }
    }
}
