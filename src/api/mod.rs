pub mod health;
pub mod payments;

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::request_id::{PropagateRequestIdLayer, SetRequestIdLayer};

use crate::health::HealthChecker;
use crate::middleware::logging::{request_logging_middleware, UuidRequestId};
use crate::services::payment_service::PaymentService;

/// Full application router with request-id and logging layers applied.
pub fn build_router(payment_service: Arc<PaymentService>, health_checker: HealthChecker) -> Router {
    let payment_routes = Router::new()
        .route("/initiate", post(payments::initiate_payment))
        .route("/wallet/verify", get(payments::verify_wallet_payment))
        .route("/card/process", post(payments::process_card_payment))
        .route("/status/{payment_id}", get(payments::get_payment_status))
        .with_state(payments::PaymentsState { payment_service });

    let health_routes = Router::new()
        .route("/", get(health::root))
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
        .route("/health/live", get(health::liveness))
        .with_state(health_checker);

    Router::new()
        .nest("/api/v1/payments", payment_routes)
        .merge(health_routes)
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(UuidRequestId))
                .layer(axum::middleware::from_fn(request_logging_middleware))
                .layer(PropagateRequestIdLayer::x_request_id()),
        )
}
