//! /api/v1/payments endpoints

use axum::{
    extract::{rejection::JsonRejection, FromRequestParts, Path, Query, State},
    http::{request::Parts, HeaderMap, StatusCode},
    Json,
};
use bigdecimal::BigDecimal;
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::error::{AppError, AppErrorKind, DomainError, ValidationError};
use crate::middleware::error::get_request_id_from_headers;
use crate::payments::error::PaymentError;
use crate::payments::types::{
    CardDetails, CardPaymentResponse, InitiationResponse, PaymentStatusView, VerificationOutcome,
};
use crate::services::payment_service::PaymentService;

pub const USER_ID_HEADER: &str = "x-user-id";

#[derive(Clone)]
pub struct PaymentsState {
    pub payment_service: Arc<PaymentService>,
}

/// Caller identity forwarded by the upstream auth layer.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub String);

impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(|v| AuthenticatedUser(v.to_string()))
            .ok_or_else(|| {
                let error = AppError::new(AppErrorKind::Domain(DomainError::Unauthenticated));
                match get_request_id_from_headers(&parts.headers) {
                    Some(request_id) => error.with_request_id(request_id),
                    None => error,
                }
            })
    }
}

#[derive(Debug, Deserialize)]
pub struct InitiatePaymentBody {
    pub order_id: String,
    #[serde(deserialize_with = "crate::payments::amount::deserialize")]
    pub amount: BigDecimal,
    pub payment_method: String,
}

#[derive(Debug, Deserialize)]
pub struct CardPaymentBody {
    pub order_id: String,
    pub card_details: CardDetails,
}

/// Query string the wallet appends to the success URL
#[derive(Debug, Deserialize)]
pub struct WalletVerifyQuery {
    pub oid: Option<String>,
    pub amt: Option<String>,
    #[serde(rename = "refId")]
    pub ref_id: Option<String>,
}

fn with_request_id(error: impl Into<AppError>, headers: &HeaderMap) -> AppError {
    let error = error.into();
    match get_request_id_from_headers(headers) {
        Some(request_id) => error.with_request_id(request_id),
        None => error,
    }
}

fn body_rejection(rejection: JsonRejection, headers: &HeaderMap) -> AppError {
    with_request_id(
        AppError::new(AppErrorKind::Validation(ValidationError::InvalidField {
            field: "body".to_string(),
            reason: rejection.body_text(),
        })),
        headers,
    )
}

fn required(value: Option<String>, field: &str, headers: &HeaderMap) -> Result<String, AppError> {
    value.filter(|v| !v.trim().is_empty()).ok_or_else(|| {
        with_request_id(
            AppError::new(AppErrorKind::Validation(ValidationError::MissingField {
                field: field.to_string(),
            })),
            headers,
        )
    })
}

/// POST /api/v1/payments/initiate
pub async fn initiate_payment(
    State(state): State<PaymentsState>,
    AuthenticatedUser(user_id): AuthenticatedUser,
    headers: HeaderMap,
    body: Result<Json<InitiatePaymentBody>, JsonRejection>,
) -> Result<(StatusCode, Json<InitiationResponse>), AppError> {
    let Json(body) = body.map_err(|e| body_rejection(e, &headers))?;

    info!(
        order_id = %body.order_id,
        payment_method = %body.payment_method,
        "Payment initiation requested"
    );

    let response = state
        .payment_service
        .initiate_payment(&body.order_id, &user_id, body.amount, &body.payment_method)
        .await
        .map_err(|e| with_request_id(e, &headers))?;

    Ok((StatusCode::CREATED, Json(response)))
}

/// GET /api/v1/payments/wallet/verify?oid=&amt=&refId=
pub async fn verify_wallet_payment(
    State(state): State<PaymentsState>,
    headers: HeaderMap,
    Query(query): Query<WalletVerifyQuery>,
) -> Result<Json<VerificationOutcome>, AppError> {
    let oid = required(query.oid, "oid", &headers)?;
    let amt = required(query.amt, "amt", &headers)?;
    let ref_id = required(query.ref_id, "refId", &headers)?;

    info!(transaction_id = %oid, reference_id = %ref_id, "Wallet callback received");

    let outcome = state
        .payment_service
        .verify_redirect_payment(&oid, &amt, &ref_id)
        .await
        .map_err(|e| with_request_id(e, &headers))?;

    Ok(Json(outcome))
}

/// POST /api/v1/payments/card/process
pub async fn process_card_payment(
    State(state): State<PaymentsState>,
    AuthenticatedUser(user_id): AuthenticatedUser,
    headers: HeaderMap,
    body: Result<Json<CardPaymentBody>, JsonRejection>,
) -> Result<(StatusCode, Json<CardPaymentResponse>), AppError> {
    let Json(body) = body.map_err(|e| body_rejection(e, &headers))?;

    let response = state
        .payment_service
        .process_card_payment(&body.order_id, &user_id, body.card_details)
        .await
        .map_err(|e| with_request_id(e, &headers))?;

    Ok((StatusCode::CREATED, Json(response)))
}

/// GET /api/v1/payments/status/{payment_id}
pub async fn get_payment_status(
    State(state): State<PaymentsState>,
    AuthenticatedUser(user_id): AuthenticatedUser,
    headers: HeaderMap,
    Path(payment_id): Path<String>,
) -> Result<Json<PaymentStatusView>, AppError> {
    // A malformed id can't name any payment.
    let payment_id = Uuid::parse_str(&payment_id).map_err(|_| {
        with_request_id(
            PaymentError::PaymentNotFound {
                reference: payment_id.clone(),
            },
            &headers,
        )
    })?;

    let view = state
        .payment_service
        .get_user_payment_status(payment_id, &user_id)
        .await
        .map_err(|e| with_request_id(e, &headers))?;

    Ok(Json(view))
}
