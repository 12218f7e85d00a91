use async_trait::async_trait;
use uuid::Uuid;

use crate::database::error::DatabaseError;
use crate::payments::types::{NewPayment, PaymentDetails, PaymentRecord, PaymentStatus};

/// Persistence contract for payment records.
///
/// Implementations must make `transition_status` atomic: the status only
/// moves when the stored record is still PENDING, and exactly one of any
/// number of concurrent callers observes `Some`.
#[async_trait]
pub trait PaymentStore: Send + Sync {
    /// Persist a new record in PENDING state.
    async fn insert(&self, payment: NewPayment) -> Result<PaymentRecord, DatabaseError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<PaymentRecord>, DatabaseError>;

    async fn find_by_transaction_id(
        &self,
        transaction_id: &str,
    ) -> Result<Option<PaymentRecord>, DatabaseError>;

    /// Every payment attempt recorded for an order, newest first.
    async fn find_by_order_id(&self, order_id: &str) -> Result<Vec<PaymentRecord>, DatabaseError>;

    /// Compare-and-set from PENDING to `target`, merging `details` into the
    /// stored details. Returns `None` when the record is missing or no
    /// longer PENDING.
    async fn transition_status(
        &self,
        id: Uuid,
        target: PaymentStatus,
        details: PaymentDetails,
    ) -> Result<Option<PaymentRecord>, DatabaseError>;

    async fn health_check(&self) -> Result<(), DatabaseError>;
}
