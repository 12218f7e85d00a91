//! Application error handling
//!
//! A unified error system with HTTP status mapping, user-friendly messages,
//! and structured error codes for client handling.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Error codes for programmatic handling by clients
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum ErrorCode {
    // Domain errors (4xx)
    #[serde(rename = "PAYMENT_NOT_FOUND")]
    PaymentNotFound,
    #[serde(rename = "AMOUNT_MISMATCH")]
    AmountMismatch,
    #[serde(rename = "PAYMENT_ALREADY_FINALIZED")]
    PaymentAlreadyFinalized,
    #[serde(rename = "INVALID_PAYMENT_METHOD")]
    InvalidPaymentMethod,
    #[serde(rename = "UNAUTHORIZED")]
    Unauthorized,

    // Infrastructure errors (5xx)
    #[serde(rename = "PAYMENT_INITIATION_FAILED")]
    PaymentInitiationFailed,
    #[serde(rename = "DATABASE_ERROR")]
    DatabaseError,
    #[serde(rename = "CONFIGURATION_ERROR")]
    ConfigurationError,

    // External errors (502, 504)
    #[serde(rename = "PAYMENT_GATEWAY_ERROR")]
    PaymentGatewayError,
    #[serde(rename = "EXTERNAL_SERVICE_TIMEOUT")]
    ExternalServiceTimeout,

    // Generic
    #[serde(rename = "INTERNAL_ERROR")]
    InternalError,
    #[serde(rename = "VALIDATION_ERROR")]
    ValidationError,
}

/// Domain-specific business logic errors
#[derive(Debug, Clone)]
pub enum DomainError {
    /// No payment matches the given id or transaction reference
    PaymentNotFound { reference: String },
    /// Callback amount differs from the stored amount
    AmountMismatch { expected: String, received: String },
    /// Payment already reached COMPLETED or FAILED
    AlreadyFinalized { payment_id: String },
    /// Request carries no authenticated user
    Unauthenticated,
}

/// Infrastructure-level errors (database, configuration)
#[derive(Debug, Clone)]
pub enum InfrastructureError {
    /// Database connection or query failure
    Database { message: String, is_retryable: bool },
    /// Payment record could not be persisted before handing out a redirect
    PaymentInitiation { message: String },
    /// Missing or invalid configuration
    Configuration { message: String },
}

/// External service errors
#[derive(Debug, Clone)]
pub enum ExternalError {
    /// Payment gateway rejected or failed the verification
    PaymentGateway { message: String, is_retryable: bool },
    /// External service timeout
    Timeout { service: String, timeout_secs: u64 },
}

/// Input validation errors
#[derive(Debug, Clone)]
pub enum ValidationError {
    /// Unknown payment method tag
    InvalidPaymentMethod { method: String },
    /// Invalid amount (format or value)
    InvalidAmount { amount: String, reason: String },
    /// Required field missing
    MissingField { field: String },
    /// Field present but unusable
    InvalidField { field: String, reason: String },
}

/// Unified application error type
#[derive(Debug, Clone)]
pub struct AppError {
    pub kind: AppErrorKind,
    pub request_id: Option<String>,
    pub context: Option<String>,
}

#[derive(Debug, Clone)]
pub enum AppErrorKind {
    Domain(DomainError),
    Infrastructure(InfrastructureError),
    External(ExternalError),
    Validation(ValidationError),
}

impl AppError {
    pub fn new(kind: AppErrorKind) -> Self {
        Self {
            kind,
            request_id: None,
            context: None,
        }
    }

    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = Some(request_id.into());
        self
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    /// Map error to HTTP status code
    pub fn status_code(&self) -> u16 {
        match &self.kind {
            AppErrorKind::Domain(err) => match err {
                DomainError::PaymentNotFound { .. } => 404,
                DomainError::AmountMismatch { .. } => 422, // Unprocessable Entity
                DomainError::AlreadyFinalized { .. } => 409, // Conflict
                DomainError::Unauthenticated => 401,
            },
            AppErrorKind::Infrastructure(err) => match err {
                InfrastructureError::Database { .. } => 500,
                InfrastructureError::PaymentInitiation { .. } => 500,
                InfrastructureError::Configuration { .. } => 500,
            },
            AppErrorKind::External(err) => match err {
                ExternalError::PaymentGateway { .. } => 502, // Bad Gateway
                ExternalError::Timeout { .. } => 504,        // Gateway Timeout
            },
            AppErrorKind::Validation(_) => 400,
        }
    }

    /// Get error code for client handling
    pub fn error_code(&self) -> ErrorCode {
        match &self.kind {
            AppErrorKind::Domain(err) => match err {
                DomainError::PaymentNotFound { .. } => ErrorCode::PaymentNotFound,
                DomainError::AmountMismatch { .. } => ErrorCode::AmountMismatch,
                DomainError::AlreadyFinalized { .. } => ErrorCode::PaymentAlreadyFinalized,
                DomainError::Unauthenticated => ErrorCode::Unauthorized,
            },
            AppErrorKind::Infrastructure(err) => match err {
                InfrastructureError::Database { .. } => ErrorCode::DatabaseError,
                InfrastructureError::PaymentInitiation { .. } => {
                    ErrorCode::PaymentInitiationFailed
                }
                InfrastructureError::Configuration { .. } => ErrorCode::ConfigurationError,
            },
            AppErrorKind::External(err) => match err {
                ExternalError::PaymentGateway { .. } => ErrorCode::PaymentGatewayError,
                ExternalError::Timeout { .. } => ErrorCode::ExternalServiceTimeout,
            },
            AppErrorKind::Validation(err) => match err {
                ValidationError::InvalidPaymentMethod { .. } => ErrorCode::InvalidPaymentMethod,
                _ => ErrorCode::ValidationError,
            },
        }
    }

    /// Get user-friendly error message
    pub fn user_message(&self) -> String {
        match &self.kind {
            AppErrorKind::Domain(err) => match err {
                DomainError::PaymentNotFound { reference } => {
                    format!("Payment '{}' not found", reference)
                }
                DomainError::AmountMismatch { expected, received } => {
                    format!(
                        "Payment amount mismatch. Expected: {}, Received: {}",
                        expected, received
                    )
                }
                DomainError::AlreadyFinalized { payment_id } => {
                    format!("Payment '{}' has already been finalized", payment_id)
                }
                DomainError::Unauthenticated => "Authentication required".to_string(),
            },
            AppErrorKind::Infrastructure(err) => match err {
                InfrastructureError::PaymentInitiation { .. } => {
                    "Payment could not be initiated. Please try again".to_string()
                }
                _ => "Service temporarily unavailable. Please try again later".to_string(),
            },
            AppErrorKind::External(err) => match err {
                ExternalError::PaymentGateway { is_retryable, .. } => {
                    if *is_retryable {
                        "Payment gateway is temporarily unavailable. Please try again".to_string()
                    } else {
                        "Payment verification failed. Please contact support".to_string()
                    }
                }
                ExternalError::Timeout {
                    service,
                    timeout_secs,
                } => {
                    format!(
                        "{} request timed out after {} seconds",
                        service, timeout_secs
                    )
                }
            },
            AppErrorKind::Validation(err) => match err {
                ValidationError::InvalidPaymentMethod { method } => {
                    format!("Invalid payment method '{}'", method)
                }
                ValidationError::InvalidAmount { amount, reason } => {
                    format!("Invalid amount '{}': {}", amount, reason)
                }
                ValidationError::MissingField { field } => {
                    format!("Required field '{}' is missing", field)
                }
                ValidationError::InvalidField { field, reason } => {
                    format!("Invalid value for '{}': {}", field, reason)
                }
            },
        }
    }

    /// Check if error is retryable
    pub fn is_retryable(&self) -> bool {
        match &self.kind {
            AppErrorKind::Domain(_) => false,
            AppErrorKind::Infrastructure(err) => match err {
                InfrastructureError::Database { is_retryable, .. } => *is_retryable,
                InfrastructureError::PaymentInitiation { .. } => true,
                InfrastructureError::Configuration { .. } => false,
            },
            AppErrorKind::External(err) => match err {
                ExternalError::PaymentGateway { is_retryable, .. } => *is_retryable,
                // The payment is already marked FAILED; repeating the callback won't help.
                ExternalError::Timeout { .. } => false,
            },
            AppErrorKind::Validation(_) => false,
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.user_message())
    }
}

impl std::error::Error for AppError {}

// Note: From<DatabaseError> lives in database/error.rs, From<PaymentError> in payments/error.rs

impl From<crate::config::ConfigError> for AppError {
    fn from(err: crate::config::ConfigError) -> Self {
        AppError::new(AppErrorKind::Infrastructure(
            InfrastructureError::Configuration {
                message: err.to_string(),
            },
        ))
    }
}

/// Result type for operations that can fail with AppError
pub type AppResult<T> = Result<T, AppError>;
