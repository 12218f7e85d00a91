use thiserror::Error;

pub type PaymentResult<T> = Result<T, PaymentError>;

#[derive(Debug, Clone, Error)]
pub enum PaymentError {
    #[error("Invalid payment method: {method}")]
    InvalidMethod { method: String },

    #[error("Validation error: {message}")]
    ValidationError {
        message: String,
        field: Option<String>,
    },

    #[error("Payment initiation failed: {message}")]
    InitiationFailed { message: String },

    #[error("Payment not found: {reference}")]
    PaymentNotFound { reference: String },

    #[error("Amount mismatch: expected {expected}, received {received}")]
    AmountMismatch { expected: String, received: String },

    #[error("Payment {payment_id} is already finalized")]
    AlreadyFinalized { payment_id: String },

    #[error("Payment verification failed: {reason}")]
    VerificationFailed { reason: String },

    #[error("Payment gateway verification timed out after {timeout_secs}s")]
    GatewayTimeout { timeout_secs: u64 },

    #[error("Persistence error: {message}")]
    PersistenceError { message: String },
}

impl PaymentError {
    /// A gateway timeout is a verification failure too.
    pub fn is_verification_failure(&self) -> bool {
        matches!(
            self,
            PaymentError::VerificationFailed { .. } | PaymentError::GatewayTimeout { .. }
        )
    }

    /// Whether the same call may succeed if the caller repeats it.
    ///
    /// Verification failures are terminal for the record, so they are never
    /// retryable even when the underlying cause was transient.
    pub fn is_retryable(&self) -> bool {
        match self {
            PaymentError::InvalidMethod { .. } => false,
            PaymentError::ValidationError { .. } => false,
            PaymentError::InitiationFailed { .. } => true,
            PaymentError::PaymentNotFound { .. } => false,
            PaymentError::AmountMismatch { .. } => false,
            PaymentError::AlreadyFinalized { .. } => false,
            PaymentError::VerificationFailed { .. } => false,
            PaymentError::GatewayTimeout { .. } => false,
            PaymentError::PersistenceError { .. } => true,
        }
    }

    pub fn http_status_code(&self) -> u16 {
        match self {
            PaymentError::InvalidMethod { .. } => 400,
            PaymentError::ValidationError { .. } => 400,
            PaymentError::InitiationFailed { .. } => 500,
            PaymentError::PaymentNotFound { .. } => 404,
            PaymentError::AmountMismatch { .. } => 422,
            PaymentError::AlreadyFinalized { .. } => 409,
            PaymentError::VerificationFailed { .. } => 502,
            PaymentError::GatewayTimeout { .. } => 504,
            PaymentError::PersistenceError { .. } => 500,
        }
    }
}

impl From<crate::database::error::DatabaseError> for PaymentError {
    fn from(err: crate::database::error::DatabaseError) -> Self {
        PaymentError::PersistenceError {
            message: err.to_string(),
        }
    }
}

impl From<PaymentError> for crate::error::AppError {
    fn from(err: PaymentError) -> Self {
        use crate::error::{
            AppError, AppErrorKind, DomainError, ExternalError, InfrastructureError,
            ValidationError,
        };

        let kind = match err {
            PaymentError::InvalidMethod { method } => {
                AppErrorKind::Validation(ValidationError::InvalidPaymentMethod { method })
            }
            PaymentError::ValidationError { message, field } => {
                AppErrorKind::Validation(ValidationError::InvalidField {
                    field: field.unwrap_or_else(|| "request".to_string()),
                    reason: message,
                })
            }
            PaymentError::InitiationFailed { message } => {
                AppErrorKind::Infrastructure(InfrastructureError::PaymentInitiation { message })
            }
            PaymentError::PaymentNotFound { reference } => {
                AppErrorKind::Domain(DomainError::PaymentNotFound { reference })
            }
            PaymentError::AmountMismatch { expected, received } => {
                AppErrorKind::Domain(DomainError::AmountMismatch { expected, received })
            }
            PaymentError::AlreadyFinalized { payment_id } => {
                AppErrorKind::Domain(DomainError::AlreadyFinalized { payment_id })
            }
            PaymentError::VerificationFailed { reason } => {
                AppErrorKind::External(ExternalError::PaymentGateway {
                    message: reason,
                    is_retryable: false,
                })
            }
            PaymentError::GatewayTimeout { timeout_secs } => {
                AppErrorKind::External(ExternalError::Timeout {
                    service: "Payment gateway".to_string(),
                    timeout_secs,
                })
            }
            PaymentError::PersistenceError { message } => {
                AppErrorKind::Infrastructure(InfrastructureError::Database {
                    message,
                    is_retryable: true,
                })
            }
        };

        AppError::new(kind)
    }
}
