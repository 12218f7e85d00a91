use crate::database::repository::PaymentStore;
use crate::payments::error::{PaymentError, PaymentResult};
use crate::payments::gateway::{VerificationGateway, VerificationRequest};
use crate::payments::types::{
    PaymentDetails, PaymentMethod, PaymentRecord, PaymentStatus, VerificationOutcome,
    WalletCallback,
};
use bigdecimal::BigDecimal;
use chrono::Utc;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{info, warn};

/// Confirms a wallet callback with the gateway and finalizes the payment.
///
/// Lookup, amount and terminal-state checks leave the record untouched.
/// Once the gateway has been asked, the record always ends COMPLETED or
/// FAILED, and only one concurrent caller gets to make that transition.
pub struct RedirectWalletVerifier {
    store: Arc<dyn PaymentStore>,
    gateway: Arc<dyn VerificationGateway>,
    merchant_code: String,
}

impl RedirectWalletVerifier {
    pub fn new(
        store: Arc<dyn PaymentStore>,
        gateway: Arc<dyn VerificationGateway>,
        merchant_code: impl Into<String>,
    ) -> Self {
        Self {
            store,
            gateway,
            merchant_code: merchant_code.into(),
        }
    }

    pub async fn verify(&self, callback: &WalletCallback) -> PaymentResult<VerificationOutcome> {
        let record = self
            .store
            .find_by_transaction_id(&callback.transaction_id)
            .await?
            .filter(|record| record.method == PaymentMethod::RedirectWallet)
            .ok_or_else(|| PaymentError::PaymentNotFound {
                reference: callback.transaction_id.clone(),
            })?;

        if record.status.is_terminal() {
            return Err(PaymentError::AlreadyFinalized {
                payment_id: record.id.to_string(),
            });
        }

        check_amount(&record, &callback.amount)?;

        let request = VerificationRequest {
            amt: callback.amount.trim().to_string(),
            rid: callback.reference_id.clone(),
            pid: callback.transaction_id.clone(),
            scd: self.merchant_code.clone(),
        };

        match self.gateway.verify(&request).await {
            Ok(response) if response.is_success() => {
                let patch = PaymentDetails {
                    completed_at: Some(Utc::now()),
                    gateway_reference: Some(callback.reference_id.clone()),
                    verification_response: Some(response.body),
                    ..Default::default()
                };
                let completed = self.finalize(&record, PaymentStatus::Completed, patch).await?;

                info!(
                    payment_id = %completed.id,
                    transaction_id = %callback.transaction_id,
                    reference_id = %callback.reference_id,
                    "Wallet payment verified"
                );

                Ok(VerificationOutcome {
                    success: true,
                    message: "Payment verified successfully".to_string(),
                    payment_id: completed.id,
                })
            }
            Ok(response) => {
                let reason = format!(
                    "gateway did not confirm the transaction (HTTP {})",
                    response.status
                );
                let patch = PaymentDetails {
                    failed_at: Some(Utc::now()),
                    failure_reason: Some(reason.clone()),
                    gateway_reference: Some(callback.reference_id.clone()),
                    verification_response: Some(response.body),
                    ..Default::default()
                };
                self.finalize(&record, PaymentStatus::Failed, patch).await?;

                warn!(
                    payment_id = %record.id,
                    transaction_id = %callback.transaction_id,
                    status = response.status,
                    "Wallet payment rejected by gateway"
                );

                Err(PaymentError::VerificationFailed { reason })
            }
            Err(err) => {
                let patch = PaymentDetails {
                    failed_at: Some(Utc::now()),
                    failure_reason: Some(err.to_string()),
                    gateway_reference: Some(callback.reference_id.clone()),
                    ..Default::default()
                };
                self.finalize(&record, PaymentStatus::Failed, patch).await?;

                warn!(
                    payment_id = %record.id,
                    transaction_id = %callback.transaction_id,
                    error = %err,
                    "Wallet verification call failed"
                );

                Err(err)
            }
        }
    }

    async fn finalize(
        &self,
        record: &PaymentRecord,
        target: PaymentStatus,
        patch: PaymentDetails,
    ) -> PaymentResult<PaymentRecord> {
        self.store
            .transition_status(record.id, target, patch)
            .await?
            .ok_or_else(|| {
                warn!(payment_id = %record.id, "Payment finalized by a concurrent verification");
                PaymentError::AlreadyFinalized {
                    payment_id: record.id.to_string(),
                }
            })
    }
}

/// Exact decimal comparison: `500` and `500.00` match, `499.99` does not.
fn check_amount(record: &PaymentRecord, received: &str) -> PaymentResult<()> {
    let mismatch = || PaymentError::AmountMismatch {
        expected: record.amount.to_string(),
        received: received.to_string(),
    };

    let parsed = BigDecimal::from_str(received.trim()).map_err(|_| mismatch())?;
    if parsed != record.amount {
        return Err(mismatch());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::memory::InMemoryPaymentStore;
    use crate::payments::gateway::GatewayResponse;
    use crate::payments::types::NewPayment;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FixedGateway {
        result: PaymentResult<GatewayResponse>,
        calls: AtomicUsize,
    }

    impl FixedGateway {
        fn body(body: &str) -> Self {
            Self {
                result: Ok(GatewayResponse {
                    status: 200,
                    body: body.to_string(),
                }),
                calls: AtomicUsize::new(0),
            }
        }

        fn error(err: PaymentError) -> Self {
            Self {
                result: Err(err),
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl VerificationGateway for FixedGateway {
        async fn verify(&self, _request: &VerificationRequest) -> PaymentResult<GatewayResponse> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.result.clone()
        }
    }

    async fn seeded_store(method: PaymentMethod) -> (Arc<InMemoryPaymentStore>, PaymentRecord) {
        let store = Arc::new(InMemoryPaymentStore::new());
        let record = store
            .insert(NewPayment {
                order_id: "O1".to_string(),
                user_id: "U1".to_string(),
                amount: BigDecimal::from(500),
                method,
                transaction_id: Some("T1".to_string()),
                details: PaymentDetails::initiated_now(),
            })
            .await
            .unwrap();
        (store, record)
    }

    fn callback(amount: &str) -> WalletCallback {
        WalletCallback {
            transaction_id: "T1".to_string(),
            amount: amount.to_string(),
            reference_id: "REF1".to_string(),
        }
    }

    #[test]
    fn amount_check_is_decimal_exact() {
        let record = PaymentRecord {
            id: uuid::Uuid::new_v4(),
            order_id: "O1".to_string(),
            user_id: "U1".to_string(),
            amount: BigDecimal::from(500),
            method: PaymentMethod::RedirectWallet,
            status: PaymentStatus::Pending,
            transaction_id: Some("T1".to_string()),
            details: PaymentDetails::default(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        assert!(check_amount(&record, "500").is_ok());
        assert!(check_amount(&record, "500.00").is_ok());
        assert!(check_amount(&record, " 500.0 ").is_ok());
        assert!(check_amount(&record, "499.99").is_err());
        assert!(check_amount(&record, "five hundred").is_err());
    }

    #[tokio::test]
    async fn success_body_completes_payment() {
        let (store, record) = seeded_store(PaymentMethod::RedirectWallet).await;
        let gateway = Arc::new(FixedGateway::body("<response_code>Success</response_code>"));
        let verifier = RedirectWalletVerifier::new(store.clone(), gateway, "EPAYTEST");

        let outcome = verifier.verify(&callback("500")).await.unwrap();

        assert!(outcome.success);
        assert_eq!(outcome.payment_id, record.id);
        let stored = store.find_by_id(record.id).await.unwrap().unwrap();
        assert_eq!(stored.status, PaymentStatus::Completed);
        assert_eq!(stored.details.gateway_reference.as_deref(), Some("REF1"));
        assert!(stored.details.completed_at.is_some());
        assert!(stored.details.initiated_at.is_some());
    }

    #[tokio::test]
    async fn declined_body_fails_payment() {
        let (store, record) = seeded_store(PaymentMethod::RedirectWallet).await;
        let gateway = Arc::new(FixedGateway::body("<response_code>failure</response_code>"));
        let verifier = RedirectWalletVerifier::new(store.clone(), gateway, "EPAYTEST");

        let err = verifier.verify(&callback("500")).await.unwrap_err();

        assert!(matches!(err, PaymentError::VerificationFailed { .. }));
        let stored = store.find_by_id(record.id).await.unwrap().unwrap();
        assert_eq!(stored.status, PaymentStatus::Failed);
        assert!(stored.details.failure_reason.is_some());
        assert_eq!(
            stored.details.verification_response.as_deref(),
            Some("<response_code>failure</response_code>")
        );
    }

    #[tokio::test]
    async fn timeout_fails_payment() {
        let (store, record) = seeded_store(PaymentMethod::RedirectWallet).await;
        let gateway = Arc::new(FixedGateway::error(PaymentError::GatewayTimeout {
            timeout_secs: 10,
        }));
        let verifier = RedirectWalletVerifier::new(store.clone(), gateway, "EPAYTEST");

        let err = verifier.verify(&callback("500")).await.unwrap_err();

        assert!(matches!(err, PaymentError::GatewayTimeout { timeout_secs: 10 }));
        let stored = store.find_by_id(record.id).await.unwrap().unwrap();
        assert_eq!(stored.status, PaymentStatus::Failed);
        assert!(stored.details.failed_at.is_some());
    }

    #[tokio::test]
    async fn non_wallet_payment_is_not_found() {
        let (store, _record) = seeded_store(PaymentMethod::CashOnDelivery).await;
        let gateway = Arc::new(FixedGateway::body("Success"));
        let verifier = RedirectWalletVerifier::new(store, gateway.clone(), "EPAYTEST");

        let err = verifier.verify(&callback("500")).await.unwrap_err();

        assert!(matches!(err, PaymentError::PaymentNotFound { .. }));
        assert_eq!(gateway.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn amount_mismatch_skips_gateway_and_keeps_pending() {
        let (store, record) = seeded_store(PaymentMethod::RedirectWallet).await;
        let gateway = Arc::new(FixedGateway::body("Success"));
        let verifier = RedirectWalletVerifier::new(store.clone(), gateway.clone(), "EPAYTEST");

        let err = verifier.verify(&callback("499")).await.unwrap_err();

        assert!(matches!(err, PaymentError::AmountMismatch { .. }));
        assert_eq!(gateway.calls.load(Ordering::SeqCst), 0);
        let stored = store.find_by_id(record.id).await.unwrap().unwrap();
        assert_eq!(stored.status, PaymentStatus::Pending);
    }
}
