use async_trait::async_trait;
use bigdecimal::BigDecimal;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::database::error::{DatabaseError, DatabaseErrorKind};
use crate::database::repository::PaymentStore;
use crate::payments::types::{
    NewPayment, PaymentDetails, PaymentMethod, PaymentRecord, PaymentStatus,
};

const PAYMENT_COLUMNS: &str = "id, order_id, user_id, amount, method, status, transaction_id, \
                               details, created_at, updated_at";

/// Raw `payments` row
#[derive(Debug, Clone, FromRow)]
pub struct PaymentRow {
    pub id: Uuid,
    pub order_id: String,
    pub user_id: String,
    pub amount: BigDecimal,
    pub method: String,
    pub status: String,
    pub transaction_id: Option<String>,
    pub details: serde_json::Value,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl TryFrom<PaymentRow> for PaymentRecord {
    type Error = DatabaseError;

    fn try_from(row: PaymentRow) -> Result<Self, Self::Error> {
        let method = PaymentMethod::from_db_value(&row.method).ok_or_else(|| {
            DatabaseError::new(DatabaseErrorKind::Unknown {
                message: format!("Unknown payment method in row {}: {}", row.id, row.method),
            })
        })?;
        let status = PaymentStatus::from_db_status(&row.status).ok_or_else(|| {
            DatabaseError::new(DatabaseErrorKind::Unknown {
                message: format!("Unknown payment status in row {}: {}", row.id, row.status),
            })
        })?;
        let details: PaymentDetails = serde_json::from_value(row.details).map_err(|e| {
            DatabaseError::new(DatabaseErrorKind::Unknown {
                message: format!("Invalid payment details in row {}: {}", row.id, e),
            })
        })?;

        Ok(PaymentRecord {
            id: row.id,
            order_id: row.order_id,
            user_id: row.user_id,
            amount: row.amount,
            method,
            status,
            transaction_id: row.transaction_id,
            details,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

fn details_to_json(details: &PaymentDetails) -> Result<serde_json::Value, DatabaseError> {
    serde_json::to_value(details).map_err(|e| {
        DatabaseError::new(DatabaseErrorKind::Unknown {
            message: format!("Failed to serialize payment details: {}", e),
        })
    })
}

/// Postgres-backed payment store
pub struct PgPaymentRepository {
    pool: PgPool,
}

impl PgPaymentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PaymentStore for PgPaymentRepository {
    async fn insert(&self, payment: NewPayment) -> Result<PaymentRecord, DatabaseError> {
        let details = details_to_json(&payment.details)?;

        let row = sqlx::query_as::<_, PaymentRow>(&format!(
            "INSERT INTO payments (order_id, user_id, amount, method, status, transaction_id, details)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             RETURNING {}",
            PAYMENT_COLUMNS
        ))
        .bind(&payment.order_id)
        .bind(&payment.user_id)
        .bind(&payment.amount)
        .bind(payment.method.to_db_value())
        .bind(PaymentStatus::Pending.to_db_status())
        .bind(&payment.transaction_id)
        .bind(details)
        .fetch_one(&self.pool)
        .await
        .map_err(DatabaseError::from_sqlx)?;

        row.try_into()
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<PaymentRecord>, DatabaseError> {
        sqlx::query_as::<_, PaymentRow>(&format!(
            "SELECT {} FROM payments WHERE id = $1",
            PAYMENT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(DatabaseError::from_sqlx)?
        .map(PaymentRecord::try_from)
        .transpose()
    }

    async fn find_by_transaction_id(
        &self,
        transaction_id: &str,
    ) -> Result<Option<PaymentRecord>, DatabaseError> {
        sqlx::query_as::<_, PaymentRow>(&format!(
            "SELECT {} FROM payments WHERE transaction_id = $1",
            PAYMENT_COLUMNS
        ))
        .bind(transaction_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(DatabaseError::from_sqlx)?
        .map(PaymentRecord::try_from)
        .transpose()
    }

    async fn find_by_order_id(&self, order_id: &str) -> Result<Vec<PaymentRecord>, DatabaseError> {
        let rows = sqlx::query_as::<_, PaymentRow>(&format!(
            "SELECT {} FROM payments WHERE order_id = $1 ORDER BY created_at DESC",
            PAYMENT_COLUMNS
        ))
        .bind(order_id)
        .fetch_all(&self.pool)
        .await
        .map_err(DatabaseError::from_sqlx)?;

        rows.into_iter().map(PaymentRecord::try_from).collect()
    }

    async fn transition_status(
        &self,
        id: Uuid,
        target: PaymentStatus,
        details: PaymentDetails,
    ) -> Result<Option<PaymentRecord>, DatabaseError> {
        if !target.is_terminal() {
            return Err(DatabaseError::new(DatabaseErrorKind::Query {
                message: format!("cannot transition payment to {}", target),
            }));
        }
        let patch = details_to_json(&details)?;

        // The status guard in WHERE makes this a single-winner compare-and-set.
        sqlx::query_as::<_, PaymentRow>(&format!(
            "UPDATE payments
             SET status = $2, details = details || $3::jsonb, updated_at = NOW()
             WHERE id = $1 AND status = $4
             RETURNING {}",
            PAYMENT_COLUMNS
        ))
        .bind(id)
        .bind(target.to_db_status())
        .bind(patch)
        .bind(PaymentStatus::Pending.to_db_status())
        .fetch_optional(&self.pool)
        .await
        .map_err(DatabaseError::from_sqlx)?
        .map(PaymentRecord::try_from)
        .transpose()
    }

    async fn health_check(&self) -> Result<(), DatabaseError> {
        super::health_check(&self.pool).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(method: &str, status: &str) -> PaymentRow {
        PaymentRow {
            id: Uuid::new_v4(),
            order_id: "order-1".to_string(),
            user_id: "user-1".to_string(),
            amount: BigDecimal::from(500),
            method: method.to_string(),
            status: status.to_string(),
            transaction_id: Some("TXN1".to_string()),
            details: serde_json::json!({ "delivery_notes": "ring twice" }),
            created_at: chrono::Utc::now(),
            updated_at: chrono::Utc::now(),
        }
    }

    #[test]
    fn row_converts_into_record() {
        let record = PaymentRecord::try_from(row("redirect_wallet", "pending")).unwrap();

        assert_eq!(record.method, PaymentMethod::RedirectWallet);
        assert_eq!(record.status, PaymentStatus::Pending);
        assert_eq!(record.details.delivery_notes.as_deref(), Some("ring twice"));
    }

    #[test]
    fn unknown_status_is_rejected() {
        assert!(PaymentRecord::try_from(row("card", "refunded")).is_err());
        assert!(PaymentRecord::try_from(row("bitcoin", "pending")).is_err());
    }
}
