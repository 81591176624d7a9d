//! Health check endpoint handlers.

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;

use crate::app::AppState;

/// Health check response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub database: DatabaseHealth,
}

/// Database health status.
#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct DatabaseHealth {
    pub connected: bool,
    pub latency_ms: Option<u64>,
}

/// Simple status response for liveness/readiness probes.
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub status: String,
}

/// Full health check endpoint.
///
/// Returns detailed health information including database connectivity
/// and round-trip latency.
pub async fn health_check(
    State(state): State<AppState>,
) -> Result<Json<HealthResponse>, StatusCode> {
    match persistence::db::ping(&state.pool).await {
        Ok(latency) => Ok(Json(HealthResponse {
            status: "healthy".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            database: DatabaseHealth {
                connected: true,
                latency_ms: Some(latency.as_millis() as u64),
            },
        })),
        Err(_) => Err(StatusCode::SERVICE_UNAVAILABLE),
    }
}

/// Liveness probe endpoint.
///
/// Returns 200 OK if the process is running.
pub async fn live() -> Json<StatusResponse> {
    Json(StatusResponse {
        status: "alive".to_string(),
    })
}

/// Readiness probe endpoint.
///
/// Returns 200 OK if the service can accept traffic (database connected).
pub async fn ready(State(state): State<AppState>) -> Result<Json<StatusResponse>, StatusCode> {
    if persistence::db::ping(&state.pool).await.is_ok() {
        Ok(Json(StatusResponse {
            status: "ready".to_string(),
        }))
    } else {
        Err(StatusCode::SERVICE_UNAVAILABLE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_health_response_healthy() {
        let response = HealthResponse {
            status: "healthy".to_string(),
            version: "0.6.2".to_string(),
            database: DatabaseHealth {
                connected: true,
                latency_ms: Some(5),
            },
        };
        assert_eq!(response.status, "healthy");
        assert!(response.database.connected);
        assert_eq!(response.database.latency_ms, Some(5));
    }

    #[test]
    fn test_health_response_unhealthy_has_no_latency() {
        let response = HealthResponse {
            status: "unhealthy".to_string(),
            version: "0.6.2".to_string(),
            database: DatabaseHealth {
                connected: false,
                latency_ms: None,
            },
        };
        assert_eq!(response.status, "unhealthy");
        assert!(!response.database.connected);
        assert!(response.database.latency_ms.is_none());
    }

    #[test]
    fn test_health_response_serialization() {
        let response = HealthResponse {
            status: "healthy".to_string(),
            version: "0.6.2".to_string(),
            database: DatabaseHealth {
                connected: true,
                latency_ms: Some(12),
            },
        };
        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("\"status\":\"healthy\""));
        assert!(json.contains("\"connected\":true"));
        assert!(json.contains("\"latency_ms\":12"));
    }

    #[test]
    fn test_status_response() {
        let response = StatusResponse {
            status: "alive".to_string(),
        };
        assert_eq!(response.status, "alive");
    }
}
