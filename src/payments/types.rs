use crate::payments::error::PaymentError;
use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    CashOnDelivery,
    RedirectWallet,
    Card,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::CashOnDelivery => "CASH_ON_DELIVERY",
            PaymentMethod::RedirectWallet => "REDIRECT_WALLET",
            PaymentMethod::Card => "CARD",
        }
    }

    pub fn to_db_value(&self) -> &'static str {
        match self {
            PaymentMethod::CashOnDelivery => "cash_on_delivery",
            PaymentMethod::RedirectWallet => "redirect_wallet",
            PaymentMethod::Card => "card",
        }
    }

    pub fn from_db_value(value: &str) -> Option<Self> {
        match value {
            "cash_on_delivery" => Some(PaymentMethod::CashOnDelivery),
            "redirect_wallet" => Some(PaymentMethod::RedirectWallet),
            "card" => Some(PaymentMethod::Card),
            _ => None,
        }
    }
}

impl std::fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Accepts both the storefront's legacy tags (`COD`, `ESEWA`) and the
/// canonical names.
impl FromStr for PaymentMethod {
    type Err = PaymentError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_uppercase().as_str() {
            "COD" | "CASH_ON_DELIVERY" => Ok(PaymentMethod::CashOnDelivery),
            "ESEWA" | "WALLET" | "REDIRECT_WALLET" => Ok(PaymentMethod::RedirectWallet),
            "CARD" => Ok(PaymentMethod::Card),
            _ => Err(PaymentError::InvalidMethod {
                method: value.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    Pending,
    Completed,
    Failed,
}

impl PaymentStatus {
    /// Completed and failed payments never change again.
    pub fn is_terminal(&self) -> bool {
        matches!(self, PaymentStatus::Completed | PaymentStatus::Failed)
    }

    pub fn to_db_status(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Completed => "completed",
            PaymentStatus::Failed => "failed",
        }
    }

    pub fn from_db_status(status: &str) -> Option<Self> {
        match status.to_lowercase().as_str() {
            "pending" => Some(PaymentStatus::Pending),
            "completed" => Some(PaymentStatus::Completed),
            "failed" => Some(PaymentStatus::Failed),
            _ => None,
        }
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PaymentStatus::Pending => write!(f, "PENDING"),
            PaymentStatus::Completed => write!(f, "COMPLETED"),
            PaymentStatus::Failed => write!(f, "FAILED"),
        }
    }
}

/// Method-specific attributes of a payment attempt.
///
/// Unset fields are omitted when serialized, so a partially filled value
/// doubles as a patch: stores merge it over the persisted details.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PaymentDetails {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initiated_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failed_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delivery_notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub card_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_four_digits: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gateway_reference: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verification_response: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure_reason: Option<String>,
}

impl PaymentDetails {
    pub fn initiated_now() -> Self {
        Self {
            initiated_at: Some(Utc::now()),
            ..Default::default()
        }
    }

    pub fn merge(&mut self, patch: PaymentDetails) {
        self.initiated_at = patch.initiated_at.or(self.initiated_at);
        self.completed_at = patch.completed_at.or(self.completed_at);
        self.failed_at = patch.failed_at.or(self.failed_at);
        self.delivery_notes = patch.delivery_notes.or(self.delivery_notes.take());
        self.card_type = patch.card_type.or(self.card_type.take());
        self.last_four_digits = patch.last_four_digits.or(self.last_four_digits.take());
        self.gateway_reference = patch.gateway_reference.or(self.gateway_reference.take());
        self.verification_response = patch
            .verification_response
            .or(self.verification_response.take());
        self.failure_reason = patch.failure_reason.or(self.failure_reason.take());
    }

    /// Caller-facing projection: gateway payloads and references stay internal.
    pub fn redacted(&self) -> Self {
        Self {
            gateway_reference: None,
            verification_response: None,
            ..self.clone()
        }
    }
}

/// A payment attempt as it is about to be persisted.
#[derive(Debug, Clone)]
pub struct NewPayment {
    pub order_id: String,
    pub user_id: String,
    pub amount: BigDecimal,
    pub method: PaymentMethod,
    pub transaction_id: Option<String>,
    pub details: PaymentDetails,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PaymentRecord {
    pub id: Uuid,
    pub order_id: String,
    pub user_id: String,
    pub amount: BigDecimal,
    pub method: PaymentMethod,
    pub status: PaymentStatus,
    pub transaction_id: Option<String>,
    pub details: PaymentDetails,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct PaymentInitiationRequest {
    pub order_id: String,
    pub user_id: String,
    pub amount: BigDecimal,
    pub method: PaymentMethod,
}

/// Form fields the wallet's hosted payment page expects.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RedirectWalletParams {
    pub amt: String,
    pub psc: String,
    pub pdc: String,
    #[serde(rename = "txAmt")]
    pub tx_amt: String,
    #[serde(rename = "tAmt")]
    pub t_amt: String,
    pub pid: String,
    pub scd: String,
    pub su: String,
    pub fu: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedirectPayload {
    pub params: RedirectWalletParams,
    pub redirect_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InitiationResponse {
    pub success: bool,
    pub message: String,
    pub payment_id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transaction_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect: Option<RedirectPayload>,
}

/// Query parameters the wallet appends when redirecting the shopper back.
#[derive(Debug, Clone)]
pub struct WalletCallback {
    pub transaction_id: String,
    pub amount: String,
    pub reference_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerificationOutcome {
    pub success: bool,
    pub message: String,
    pub payment_id: Uuid,
}

#[derive(Clone, Deserialize)]
pub struct CardDetails {
    pub card_number: String,
    #[serde(default)]
    pub card_type: Option<String>,
    #[serde(deserialize_with = "crate::payments::amount::deserialize")]
    pub amount: BigDecimal,
    #[serde(default)]
    pub expiry: Option<String>,
    #[serde(default)]
    pub cvv: Option<String>,
}

impl std::fmt::Debug for CardDetails {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CardDetails")
            .field("card_number", &"[REDACTED]")
            .field("card_type", &self.card_type)
            .field("amount", &self.amount)
            .field("expiry", &self.expiry.as_ref().map(|_| "[REDACTED]"))
            .field("cvv", &self.cvv.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct CardPaymentRequest {
    pub order_id: String,
    pub user_id: String,
    pub card_details: CardDetails,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CardPaymentResponse {
    pub success: bool,
    pub message: String,
    pub payment_id: Uuid,
    pub transaction_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentStatusView {
    pub payment_id: Uuid,
    pub order_id: String,
    pub method: PaymentMethod,
    pub status: PaymentStatus,
    pub amount: BigDecimal,
    pub transaction_id: Option<String>,
    pub details: PaymentDetails,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&PaymentRecord> for PaymentStatusView {
    fn from(record: &PaymentRecord) -> Self {
        Self {
            payment_id: record.id,
            order_id: record.order_id.clone(),
            method: record.method,
            status: record.status,
            amount: record.amount.clone(),
            transaction_id: record.transaction_id.clone(),
            details: record.details.redacted(),
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }
}
