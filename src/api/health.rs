use axum::{extract::State, http::StatusCode, Json};
use tracing::{error, info};

use crate::health::{HealthChecker, HealthState, HealthStatus};

pub async fn root() -> &'static str {
    "Storefront Payments API"
}

pub async fn health(
    State(checker): State<HealthChecker>,
) -> Result<Json<HealthStatus>, (StatusCode, String)> {
    let health_status = checker.check_health().await;

    // Return 503 if any component is unhealthy
    if health_status.status == HealthState::Unhealthy {
        error!("Health check failed - service unhealthy");
        Err((
            StatusCode::SERVICE_UNAVAILABLE,
            "Service Unavailable".to_string(),
        ))
    } else {
        Ok(Json(health_status))
    }
}

/// Readiness probe - checks if the service is ready to accept traffic
pub async fn readiness(
    state: State<HealthChecker>,
) -> Result<Json<HealthStatus>, (StatusCode, String)> {
    let result = health(state).await;
    if result.is_ok() {
        info!("Readiness check passed");
    }
    result
}

/// Liveness probe - the process is up and serving
pub async fn liveness() -> &'static str {
    "OK"
}
