use crate::config::RedirectWalletConfig;
use crate::database::repository::PaymentStore;
use crate::payments::error::{PaymentError, PaymentResult};
use crate::payments::provider::PaymentInitiator;
use crate::payments::transaction_id::generate_transaction_id;
use crate::payments::types::{
    InitiationResponse, NewPayment, PaymentDetails, PaymentInitiationRequest, PaymentMethod,
    RedirectPayload, RedirectWalletParams,
};
use async_trait::async_trait;
use bigdecimal::BigDecimal;
use std::sync::Arc;
use tracing::{error, info};

/// Hosted-page wallet: persist first, then hand the shopper the form to post.
pub struct RedirectWalletInitiator {
    store: Arc<dyn PaymentStore>,
    config: RedirectWalletConfig,
}

impl RedirectWalletInitiator {
    pub fn new(store: Arc<dyn PaymentStore>, config: RedirectWalletConfig) -> Self {
        Self { store, config }
    }

    fn build_payload(&self, amount: &BigDecimal, transaction_id: &str) -> RedirectPayload {
        let amount = amount.to_string();
        RedirectPayload {
            params: RedirectWalletParams {
                amt: amount.clone(),
                psc: "0".to_string(),
                pdc: "0".to_string(),
                tx_amt: "0".to_string(),
                t_amt: amount,
                pid: transaction_id.to_string(),
                scd: self.config.merchant_code.clone(),
                su: self.config.success_url.clone(),
                fu: self.config.failure_url.clone(),
            },
            redirect_url: self.config.payment_url.clone(),
        }
    }
}

#[async_trait]
impl PaymentInitiator for RedirectWalletInitiator {
    async fn initiate(
        &self,
        request: &PaymentInitiationRequest,
    ) -> PaymentResult<InitiationResponse> {
        let transaction_id = generate_transaction_id();

        let record = self
            .store
            .insert(NewPayment {
                order_id: request.order_id.clone(),
                user_id: request.user_id.clone(),
                amount: request.amount.clone(),
                method: PaymentMethod::RedirectWallet,
                transaction_id: Some(transaction_id.clone()),
                details: PaymentDetails::initiated_now(),
            })
            .await
            .map_err(|e| {
                error!(
                    order_id = %request.order_id,
                    transaction_id = %transaction_id,
                    error = %e,
                    "Failed to persist wallet payment"
                );
                PaymentError::InitiationFailed {
                    message: e.to_string(),
                }
            })?;

        info!(
            payment_id = %record.id,
            transaction_id = %transaction_id,
            order_id = %record.order_id,
            "Wallet payment initiated"
        );

        Ok(InitiationResponse {
            success: true,
            message: "Redirect to the wallet to complete payment".to_string(),
            payment_id: record.id,
            redirect: Some(self.build_payload(&record.amount, &transaction_id)),
            transaction_id: Some(transaction_id),
        })
    }

    fn method(&self) -> PaymentMethod {
        PaymentMethod::RedirectWallet
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::error::{DatabaseError, DatabaseErrorKind};
    use crate::database::memory::InMemoryPaymentStore;
    use crate::payments::types::{PaymentRecord, PaymentStatus};
    use std::time::Duration;
    use uuid::Uuid;

    fn config() -> RedirectWalletConfig {
        RedirectWalletConfig {
            merchant_code: "EPAYTEST".to_string(),
            payment_url: "https://wallet.example/epay/main".to_string(),
            success_url: "https://shop.example/success".to_string(),
            failure_url: "https://shop.example/failure".to_string(),
            verification_url: "https://wallet.example/epay/transrec".to_string(),
            request_timeout: Duration::from_secs(10),
        }
    }

    fn request() -> PaymentInitiationRequest {
        PaymentInitiationRequest {
            order_id: "O1".to_string(),
            user_id: "U1".to_string(),
            amount: BigDecimal::from(500),
            method: PaymentMethod::RedirectWallet,
        }
    }

    struct FailingStore;

    #[async_trait]
    impl PaymentStore for FailingStore {
        async fn insert(&self, _payment: NewPayment) -> Result<PaymentRecord, DatabaseError> {
            Err(DatabaseError::new(DatabaseErrorKind::Connection {
                message: "connection refused".to_string(),
            }))
        }

        async fn find_by_id(&self, _id: Uuid) -> Result<Option<PaymentRecord>, DatabaseError> {
            Ok(None)
        }

        async fn find_by_transaction_id(
            &self,
            _transaction_id: &str,
        ) -> Result<Option<PaymentRecord>, DatabaseError> {
            Ok(None)
        }

        async fn find_by_order_id(
            &self,
            _order_id: &str,
        ) -> Result<Vec<PaymentRecord>, DatabaseError> {
            Ok(Vec::new())
        }

        async fn transition_status(
            &self,
            _id: Uuid,
            _target: PaymentStatus,
            _details: PaymentDetails,
        ) -> Result<Option<PaymentRecord>, DatabaseError> {
            Ok(None)
        }

        async fn health_check(&self) -> Result<(), DatabaseError> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn payload_mirrors_the_persisted_record() {
        let store = Arc::new(InMemoryPaymentStore::new());
        let initiator = RedirectWalletInitiator::new(store.clone(), config());

        let response = initiator.initiate(&request()).await.unwrap();
        let redirect = response.redirect.unwrap();
        let transaction_id = response.transaction_id.unwrap();

        assert_eq!(redirect.redirect_url, "https://wallet.example/epay/main");
        assert_eq!(redirect.params.amt, "500");
        assert_eq!(redirect.params.t_amt, "500");
        assert_eq!(redirect.params.psc, "0");
        assert_eq!(redirect.params.pdc, "0");
        assert_eq!(redirect.params.tx_amt, "0");
        assert_eq!(redirect.params.pid, transaction_id);
        assert_eq!(redirect.params.scd, "EPAYTEST");
        assert_eq!(redirect.params.su, "https://shop.example/success");
        assert_eq!(redirect.params.fu, "https://shop.example/failure");

        let record = store
            .find_by_transaction_id(&transaction_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(record.id, response.payment_id);
        assert_eq!(record.status, PaymentStatus::Pending);
    }

    #[tokio::test]
    async fn persistence_failure_returns_no_payload() {
        let initiator = RedirectWalletInitiator::new(Arc::new(FailingStore), config());

        let err = initiator.initiate(&request()).await.unwrap_err();
        assert!(matches!(err, PaymentError::InitiationFailed { .. }));
    }
}
