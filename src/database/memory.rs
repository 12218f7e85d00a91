use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::database::error::{DatabaseError, DatabaseErrorKind};
use crate::database::repository::PaymentStore;
use crate::payments::types::{NewPayment, PaymentDetails, PaymentRecord, PaymentStatus};

#[derive(Default)]
struct MemoryState {
    payments: HashMap<Uuid, PaymentRecord>,
    by_transaction: HashMap<String, Uuid>,
}

/// Process-local store used when running without Postgres and in tests.
#[derive(Default)]
pub struct InMemoryPaymentStore {
    state: RwLock<MemoryState>,
}

impl InMemoryPaymentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.state.read().await.payments.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl PaymentStore for InMemoryPaymentStore {
    async fn insert(&self, payment: NewPayment) -> Result<PaymentRecord, DatabaseError> {
        let mut state = self.state.write().await;

        if let Some(transaction_id) = &payment.transaction_id {
            if state.by_transaction.contains_key(transaction_id) {
                return Err(DatabaseError::new(DatabaseErrorKind::UniqueViolation {
                    constraint: "payments_transaction_id_key".to_string(),
                }));
            }
        }

        let now = Utc::now();
        let record = PaymentRecord {
            id: Uuid::new_v4(),
            order_id: payment.order_id,
            user_id: payment.user_id,
            amount: payment.amount,
            method: payment.method,
            status: PaymentStatus::Pending,
            transaction_id: payment.transaction_id,
            details: payment.details,
            created_at: now,
            updated_at: now,
        };

        if let Some(transaction_id) = &record.transaction_id {
            state
                .by_transaction
                .insert(transaction_id.clone(), record.id);
        }
        state.payments.insert(record.id, record.clone());

        Ok(record)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<PaymentRecord>, DatabaseError> {
        Ok(self.state.read().await.payments.get(&id).cloned())
    }

    async fn find_by_transaction_id(
        &self,
        transaction_id: &str,
    ) -> Result<Option<PaymentRecord>, DatabaseError> {
        let state = self.state.read().await;
        Ok(state
            .by_transaction
            .get(transaction_id)
            .and_then(|id| state.payments.get(id))
            .cloned())
    }

    async fn find_by_order_id(&self, order_id: &str) -> Result<Vec<PaymentRecord>, DatabaseError> {
        let state = self.state.read().await;
        let mut records: Vec<PaymentRecord> = state
            .payments
            .values()
            .filter(|record| record.order_id == order_id)
            .cloned()
            .collect();
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(records)
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

        let mut state = self.state.write().await;
        let Some(record) = state.payments.get_mut(&id) else {
            return Ok(None);
        };
        if record.status != PaymentStatus::Pending {
            return Ok(None);
        }

        record.status = target;
        record.details.merge(details);
        record.updated_at = Utc::now();

        Ok(Some(record.clone()))
    }

    async fn health_check(&self) -> Result<(), DatabaseError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payments::types::PaymentMethod;
    use bigdecimal::BigDecimal;
    use std::sync::Arc;

    fn new_payment(transaction_id: Option<&str>) -> NewPayment {
        NewPayment {
            order_id: "order-1".to_string(),
            user_id: "user-1".to_string(),
            amount: BigDecimal::from(500),
            method: PaymentMethod::RedirectWallet,
            transaction_id: transaction_id.map(str::to_string),
            details: PaymentDetails::initiated_now(),
        }
    }

    #[tokio::test]
    async fn insert_starts_pending_and_indexes_transaction_id() {
        let store = InMemoryPaymentStore::new();
        let record = store.insert(new_payment(Some("TXN1"))).await.unwrap();

        assert_eq!(record.status, PaymentStatus::Pending);
        let found = store.find_by_transaction_id("TXN1").await.unwrap().unwrap();
        assert_eq!(found.id, record.id);
        assert!(store.find_by_transaction_id("TXN2").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn duplicate_transaction_id_is_rejected() {
        let store = InMemoryPaymentStore::new();
        store.insert(new_payment(Some("TXN1"))).await.unwrap();

        let err = store.insert(new_payment(Some("TXN1"))).await.unwrap_err();
        assert!(matches!(err.kind, DatabaseErrorKind::UniqueViolation { .. }));
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn order_lookup_lists_newest_first() {
        let store = InMemoryPaymentStore::new();
        let older = store.insert(new_payment(Some("TXN1"))).await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(2)).await;
        let newer = store.insert(new_payment(Some("TXN2"))).await.unwrap();
        store
            .insert(NewPayment {
                order_id: "order-2".to_string(),
                ..new_payment(Some("TXN3"))
            })
            .await
            .unwrap();

        let records = store.find_by_order_id("order-1").await.unwrap();
        let ids: Vec<Uuid> = records.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![newer.id, older.id]);
        assert!(store.find_by_order_id("order-9").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn transition_only_applies_once() {
        let store = InMemoryPaymentStore::new();
        let record = store.insert(new_payment(None)).await.unwrap();

        let first = store
            .transition_status(record.id, PaymentStatus::Completed, PaymentDetails::default())
            .await
            .unwrap();
        let second = store
            .transition_status(record.id, PaymentStatus::Failed, PaymentDetails::default())
            .await
            .unwrap();

        assert_eq!(first.unwrap().status, PaymentStatus::Completed);
        assert!(second.is_none());
        let stored = store.find_by_id(record.id).await.unwrap().unwrap();
        assert_eq!(stored.status, PaymentStatus::Completed);
    }

    #[tokio::test]
    async fn concurrent_transitions_have_a_single_winner() {
        let store = Arc::new(InMemoryPaymentStore::new());
        let record = store.insert(new_payment(None)).await.unwrap();

        let handles: Vec<_> = (0..16)
            .map(|i| {
                let store = store.clone();
                let target = if i % 2 == 0 {
                    PaymentStatus::Completed
                } else {
                    PaymentStatus::Failed
                };
                tokio::spawn(async move {
                    store
                        .transition_status(record.id, target, PaymentDetails::default())
                        .await
                        .unwrap()
                })
            })
            .collect();

        let mut winners = 0;
        for handle in handles {
            if handle.await.unwrap().is_some() {
                winners += 1;
            }
        }
        assert_eq!(winners, 1);
    }

    #[tokio::test]
    async fn transition_to_pending_is_an_error() {
        let store = InMemoryPaymentStore::new();
        let record = store.insert(new_payment(None)).await.unwrap();

        assert!(store
            .transition_status(record.id, PaymentStatus::Pending, PaymentDetails::default())
            .await
            .is_err());
    }

    #[tokio::test]
    async fn transition_of_unknown_id_returns_none() {
        let store = InMemoryPaymentStore::new();
        let outcome = store
            .transition_status(Uuid::new_v4(), PaymentStatus::Failed, PaymentDetails::default())
            .await
            .unwrap();

        assert!(outcome.is_none());
    }
}
