//! Payment service
//!
//! Entry point for the HTTP layer: validates inputs at the boundary, then
//! delegates to the dispatcher, the wallet verifier or the card processor.

use crate::config::RedirectWalletConfig;
use crate::database::repository::PaymentStore;
use crate::payments::dispatcher::PaymentDispatcher;
use crate::payments::error::{PaymentError, PaymentResult};
use crate::payments::gateway::VerificationGateway;
use crate::payments::types::{
    CardDetails, CardPaymentRequest, CardPaymentResponse, InitiationResponse,
    PaymentInitiationRequest, PaymentMethod, PaymentStatusView, VerificationOutcome,
    WalletCallback,
};
use crate::payments::verifier::RedirectWalletVerifier;
use bigdecimal::{BigDecimal, Zero};
use std::str::FromStr;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

pub struct PaymentService {
    store: Arc<dyn PaymentStore>,
    dispatcher: PaymentDispatcher,
    verifier: RedirectWalletVerifier,
}

impl PaymentService {
    pub fn new(
        store: Arc<dyn PaymentStore>,
        gateway: Arc<dyn VerificationGateway>,
        wallet_config: RedirectWalletConfig,
    ) -> Self {
        let verifier = RedirectWalletVerifier::new(
            store.clone(),
            gateway,
            wallet_config.merchant_code.clone(),
        );
        let dispatcher = PaymentDispatcher::new(store.clone(), wallet_config);

        Self {
            store,
            dispatcher,
            verifier,
        }
    }

    /// Start a payment for an order with the given method tag.
    ///
    /// An unknown method or a non-positive amount is rejected before any
    /// record is written.
    pub async fn initiate_payment(
        &self,
        order_id: &str,
        user_id: &str,
        amount: BigDecimal,
        method: &str,
    ) -> PaymentResult<InitiationResponse> {
        let method = PaymentMethod::from_str(method)?;
        require_non_empty("order_id", order_id)?;
        require_non_empty("user_id", user_id)?;
        require_positive("amount", &amount)?;

        info!(order_id, user_id, method = %method, amount = %amount, "Initiating payment");

        self.dispatcher
            .dispatch(&PaymentInitiationRequest {
                order_id: order_id.to_string(),
                user_id: user_id.to_string(),
                amount,
                method,
            })
            .await
    }

    /// Handle the wallet's redirect back (`oid`, `amt`, `refId`).
    pub async fn verify_redirect_payment(
        &self,
        transaction_id: &str,
        amount: &str,
        reference_id: &str,
    ) -> PaymentResult<VerificationOutcome> {
        require_non_empty("oid", transaction_id)?;
        require_non_empty("amt", amount)?;
        require_non_empty("refId", reference_id)?;

        self.verifier
            .verify(&WalletCallback {
                transaction_id: transaction_id.to_string(),
                amount: amount.to_string(),
                reference_id: reference_id.to_string(),
            })
            .await
    }

    pub async fn process_card_payment(
        &self,
        order_id: &str,
        user_id: &str,
        card_details: CardDetails,
    ) -> PaymentResult<CardPaymentResponse> {
        require_non_empty("order_id", order_id)?;
        require_non_empty("user_id", user_id)?;

        self.dispatcher
            .card()
            .process(&CardPaymentRequest {
                order_id: order_id.to_string(),
                user_id: user_id.to_string(),
                card_details,
            })
            .await
    }

    pub async fn get_payment_status(&self, payment_id: Uuid) -> PaymentResult<PaymentStatusView> {
        let record = self
            .store
            .find_by_id(payment_id)
            .await?
            .ok_or_else(|| PaymentError::PaymentNotFound {
                reference: payment_id.to_string(),
            })?;

        Ok(PaymentStatusView::from(&record))
    }

    /// Like [`Self::get_payment_status`], but another user's payment is
    /// reported as not found.
    pub async fn get_user_payment_status(
        &self,
        payment_id: Uuid,
        user_id: &str,
    ) -> PaymentResult<PaymentStatusView> {
        let record = self
            .store
            .find_by_id(payment_id)
            .await?
            .filter(|record| record.user_id == user_id)
            .ok_or_else(|| PaymentError::PaymentNotFound {
                reference: payment_id.to_string(),
            })?;

        Ok(PaymentStatusView::from(&record))
    }

    pub fn store(&self) -> Arc<dyn PaymentStore> {
        self.store.clone()
    }
}

fn require_non_empty(field: &str, value: &str) -> PaymentResult<()> {
    if value.trim().is_empty() {
        return Err(PaymentError::ValidationError {
            message: format!("{} is required", field),
            field: Some(field.to_string()),
        });
    }
    Ok(())
}

fn require_positive(field: &str, amount: &BigDecimal) -> PaymentResult<()> {
    if *amount <= BigDecimal::zero() {
        return Err(PaymentError::ValidationError {
            message: format!("{} must be greater than zero", field),
            field: Some(field.to_string()),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::memory::InMemoryPaymentStore;
    use crate::payments::gateway::{GatewayResponse, VerificationRequest};
    use crate::payments::types::PaymentStatus;
    use async_trait::async_trait;
    use std::time::Duration;

    struct AlwaysSuccess;

    #[async_trait]
    impl VerificationGateway for AlwaysSuccess {
        async fn verify(&self, _request: &VerificationRequest) -> PaymentResult<GatewayResponse> {
            Ok(GatewayResponse {
                status: 200,
                body: "Success".to_string(),
            })
        }
    }

    fn service(store: Arc<InMemoryPaymentStore>) -> PaymentService {
        PaymentService::new(
            store,
            Arc::new(AlwaysSuccess),
            RedirectWalletConfig {
                merchant_code: "EPAYTEST".to_string(),
                payment_url: "https://wallet.example/epay/main".to_string(),
                success_url: "https://shop.example/success".to_string(),
                failure_url: "https://shop.example/failure".to_string(),
                verification_url: "https://wallet.example/epay/transrec".to_string(),
                request_timeout: Duration::from_secs(10),
            },
        )
    }

    #[tokio::test]
    async fn rejects_non_positive_amounts_without_writing() {
        let store = Arc::new(InMemoryPaymentStore::new());
        let service = service(store.clone());

        for amount in [BigDecimal::from(0), BigDecimal::from(-5)] {
            let err = service
                .initiate_payment("O1", "U1", amount, "COD")
                .await
                .unwrap_err();
            assert!(matches!(err, PaymentError::ValidationError { .. }));
        }
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn rejects_missing_identifiers() {
        let store = Arc::new(InMemoryPaymentStore::new());
        let service = service(store.clone());

        let err = service
            .initiate_payment(" ", "U1", BigDecimal::from(10), "COD")
            .await
            .unwrap_err();
        assert!(matches!(err, PaymentError::ValidationError { field: Some(ref f), .. } if f == "order_id"));

        let err = service
            .verify_redirect_payment("T1", "500", "")
            .await
            .unwrap_err();
        assert!(matches!(err, PaymentError::ValidationError { .. }));
    }

    #[tokio::test]
    async fn status_is_scoped_to_owner() {
        let store = Arc::new(InMemoryPaymentStore::new());
        let service = service(store);

        let response = service
            .initiate_payment("O1", "U1", BigDecimal::from(10), "COD")
            .await
            .unwrap();

        let view = service
            .get_user_payment_status(response.payment_id, "U1")
            .await
            .unwrap();
        assert_eq!(view.status, PaymentStatus::Pending);

        let err = service
            .get_user_payment_status(response.payment_id, "U2")
            .await
            .unwrap_err();
        assert!(matches!(err, PaymentError::PaymentNotFound { .. }));
    }

    #[tokio::test]
    async fn unknown_payment_id_is_not_found() {
        let service = service(Arc::new(InMemoryPaymentStore::new()));

        let err = service.get_payment_status(Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, PaymentError::PaymentNotFound { .. }));
    }
}
