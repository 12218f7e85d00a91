//! Health check module
//! Provides health status for the application and its dependencies

use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::timeout;
use tracing::{error, info, warn};

use crate::database::repository::PaymentStore;

const CHECK_TIMEOUT: Duration = Duration::from_secs(5);
const SLOW_RESPONSE_MS: u128 = 1000;

/// Health status response
#[derive(Debug, Serialize, Clone)]
pub struct HealthStatus {
    pub status: HealthState,
    pub checks: HashMap<String, ComponentHealth>,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// Overall health state
#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
pub enum HealthState {
    Healthy,
    Degraded,
    Unhealthy,
}

/// Individual component health status
#[derive(Debug, Serialize, Clone)]
pub struct ComponentHealth {
    pub status: ComponentState,
    pub response_time_ms: Option<u128>,
    pub details: Option<String>,
}

/// Component state
#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
pub enum ComponentState {
    Up,
    Down,
    Warning,
}

impl HealthStatus {
    pub fn new() -> Self {
        Self {
            status: HealthState::Healthy,
            checks: HashMap::new(),
            timestamp: chrono::Utc::now(),
        }
    }

    pub fn is_healthy(&self) -> bool {
        matches!(self.status, HealthState::Healthy)
    }
}

impl Default for HealthStatus {
    fn default() -> Self {
        Self::new()
    }
}

impl ComponentHealth {
    pub fn up(response_time_ms: Option<u128>) -> Self {
        Self {
            status: ComponentState::Up,
            response_time_ms,
            details: None,
        }
    }

    pub fn down(details: Option<String>) -> Self {
        Self {
            status: ComponentState::Down,
            response_time_ms: None,
            details,
        }
    }

    pub fn warning(response_time_ms: Option<u128>, details: Option<String>) -> Self {
        Self {
            status: ComponentState::Warning,
            response_time_ms,
            details,
        }
    }
}

/// Health checker for the application
#[derive(Clone)]
pub struct HealthChecker {
    store: Arc<dyn PaymentStore>,
    store_name: &'static str,
}

impl HealthChecker {
    /// `store_name` is the key the store's result is reported under.
    pub fn new(store: Arc<dyn PaymentStore>, store_name: &'static str) -> Self {
        Self { store, store_name }
    }

    /// Perform comprehensive health check
    pub async fn check_health(&self) -> HealthStatus {
        let mut health_status = HealthStatus::new();

        let start = Instant::now();
        let component = match timeout(CHECK_TIMEOUT, self.store.health_check()).await {
            Ok(Ok(())) => {
                let response_time = start.elapsed().as_millis();
                if response_time > SLOW_RESPONSE_MS {
                    warn!(store = self.store_name, response_time_ms = response_time, "Payment store responding slowly");
                    ComponentHealth::warning(Some(response_time), Some("Slow response".to_string()))
                } else {
                    info!(store = self.store_name, response_time_ms = response_time, "Payment store health check: OK");
                    ComponentHealth::up(Some(response_time))
                }
            }
            Ok(Err(e)) => {
                error!(store = self.store_name, error = %e, "Payment store health check failed");
                ComponentHealth::down(Some(e.to_string()))
            }
            Err(_) => {
                error!(store = self.store_name, "Payment store health check timed out");
                ComponentHealth::down(Some("Timeout".to_string()))
            }
        };

        health_status.status = match component.status {
            ComponentState::Up => HealthState::Healthy,
            ComponentState::Warning => HealthState::Degraded,
            ComponentState::Down => HealthState::Unhealthy,
        };
        health_status
            .checks
            .insert(self.store_name.to_string(), component);

        health_status
    }
}
