use crate::database::repository::PaymentStore;
use crate::payments::error::{PaymentError, PaymentResult};
use crate::payments::provider::PaymentInitiator;
use crate::payments::transaction_id::generate_transaction_id;
use crate::payments::types::{
    CardPaymentRequest, CardPaymentResponse, InitiationResponse, NewPayment, PaymentDetails,
    PaymentInitiationRequest, PaymentMethod, PaymentRecord, PaymentStatus,
};
use async_trait::async_trait;
use bigdecimal::{BigDecimal, Zero};
use chrono::Utc;
use std::sync::Arc;
use tracing::{info, warn};

const MIN_CARD_DIGITS: usize = 12;
const MAX_CARD_DIGITS: usize = 19;

/// Card payments.
///
/// There is no card network behind this yet: `process` accepts any
/// well-formed card number and completes the payment immediately. A real
/// acquirer integration should follow the wallet's initiate-then-verify flow.
///
/// A PENDING card payment created through `/initiate` for the same order and
/// user is completed in place; otherwise a new record is written.
pub struct CardProcessor {
    store: Arc<dyn PaymentStore>,
}

impl CardProcessor {
    pub fn new(store: Arc<dyn PaymentStore>) -> Self {
        Self { store }
    }

    pub async fn process(&self, request: &CardPaymentRequest) -> PaymentResult<CardPaymentResponse> {
        let card = &request.card_details;
        let digits = normalize_card_number(&card.card_number)?;
        if card.amount <= BigDecimal::zero() {
            return Err(PaymentError::ValidationError {
                message: "amount must be greater than zero".to_string(),
                field: Some("card_details.amount".to_string()),
            });
        }

        let card_type = card
            .card_type
            .clone()
            .filter(|t| !t.trim().is_empty())
            .unwrap_or_else(|| detect_card_type(&digits).to_string());
        let card_metadata = PaymentDetails {
            card_type: Some(card_type),
            last_four_digits: Some(digits[digits.len() - 4..].to_string()),
            ..Default::default()
        };

        let (record, transaction_id) =
            match self.pending_card_payment(&request.order_id, &request.user_id).await? {
                Some((record, transaction_id)) => {
                    if record.amount != card.amount {
                        return Err(PaymentError::AmountMismatch {
                            expected: record.amount.to_string(),
                            received: card.amount.to_string(),
                        });
                    }
                    (record, transaction_id)
                }
                None => {
                    let transaction_id = generate_transaction_id();
                    let mut details = PaymentDetails::initiated_now();
                    details.merge(card_metadata.clone());
                    let record = self
                        .store
                        .insert(NewPayment {
                            order_id: request.order_id.clone(),
                            user_id: request.user_id.clone(),
                            amount: card.amount.clone(),
                            method: PaymentMethod::Card,
                            transaction_id: Some(transaction_id.clone()),
                            details,
                        })
                        .await?;
                    (record, transaction_id)
                }
            };

        let completed = self
            .store
            .transition_status(
                record.id,
                PaymentStatus::Completed,
                PaymentDetails {
                    completed_at: Some(Utc::now()),
                    ..card_metadata
                },
            )
            .await?
            .ok_or_else(|| {
                warn!(payment_id = %record.id, "Card payment finalized concurrently");
                PaymentError::AlreadyFinalized {
                    payment_id: record.id.to_string(),
                }
            })?;

        info!(
            payment_id = %completed.id,
            transaction_id = %transaction_id,
            order_id = %completed.order_id,
            "Card payment processed"
        );

        Ok(CardPaymentResponse {
            success: true,
            message: "Card payment processed successfully".to_string(),
            payment_id: completed.id,
            transaction_id,
        })
    }

    /// Most recent PENDING card payment this user opened for the order.
    async fn pending_card_payment(
        &self,
        order_id: &str,
        user_id: &str,
    ) -> PaymentResult<Option<(PaymentRecord, String)>> {
        let records = self.store.find_by_order_id(order_id).await?;

        Ok(records.into_iter().find_map(|record| {
            let adoptable = record.method == PaymentMethod::Card
                && record.status == PaymentStatus::Pending
                && record.user_id == user_id;
            match record.transaction_id.clone() {
                Some(transaction_id) if adoptable => Some((record, transaction_id)),
                _ => None,
            }
        }))
    }
}

#[async_trait]
impl PaymentInitiator for CardProcessor {
    async fn initiate(
        &self,
        request: &PaymentInitiationRequest,
    ) -> PaymentResult<InitiationResponse> {
        let record = self
            .store
            .insert(NewPayment {
                order_id: request.order_id.clone(),
                user_id: request.user_id.clone(),
                amount: request.amount.clone(),
                method: PaymentMethod::Card,
                transaction_id: Some(generate_transaction_id()),
                details: PaymentDetails::initiated_now(),
            })
            .await?;

        info!(payment_id = %record.id, order_id = %record.order_id, "Card payment initiated");

        Ok(InitiationResponse {
            success: true,
            message: "Card payment initiated, awaiting card details".to_string(),
            payment_id: record.id,
            transaction_id: record.transaction_id,
            redirect: None,
        })
    }

    fn method(&self) -> PaymentMethod {
        PaymentMethod::Card
    }
}

/// Strip separators and check the digit count.
fn normalize_card_number(raw: &str) -> PaymentResult<String> {
    let digits: String = raw.chars().filter(|c| *c != ' ' && *c != '-').collect();

    let valid = digits.chars().all(|c| c.is_ascii_digit())
        && (MIN_CARD_DIGITS..=MAX_CARD_DIGITS).contains(&digits.len());
    if !valid {
        return Err(PaymentError::ValidationError {
            message: format!(
                "card number must contain {} to {} digits",
                MIN_CARD_DIGITS, MAX_CARD_DIGITS
            ),
            field: Some("card_details.card_number".to_string()),
        });
    }

    Ok(digits)
}

fn detect_card_type(digits: &str) -> &'static str {
    match digits.as_bytes() {
        [b'4', ..] => "VISA",
        [b'5', b'1'..=b'5', ..] => "MASTERCARD",
        [b'3', b'4' | b'7', ..] => "AMEX",
        _ => "UNKNOWN",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::memory::InMemoryPaymentStore;
    use crate::payments::types::CardDetails;

    fn card_request(number: &str, amount: i64) -> CardPaymentRequest {
        CardPaymentRequest {
            order_id: "O1".to_string(),
            user_id: "U1".to_string(),
            card_details: CardDetails {
                card_number: number.to_string(),
                card_type: None,
                amount: BigDecimal::from(amount),
                expiry: Some("12/30".to_string()),
                cvv: Some("123".to_string()),
            },
        }
    }

    #[test]
    fn card_number_normalization() {
        assert_eq!(
            normalize_card_number("4111 1111-1111 1111").unwrap(),
            "4111111111111111"
        );
        assert!(normalize_card_number("41111111111").is_err());
        assert!(normalize_card_number("41111111111111111111").is_err());
        assert!(normalize_card_number("4111x11111111111").is_err());
    }

    #[test]
    fn card_type_detection() {
        assert_eq!(detect_card_type("4111111111111111"), "VISA");
        assert_eq!(detect_card_type("5500000000000004"), "MASTERCARD");
        assert_eq!(detect_card_type("340000000000009"), "AMEX");
        assert_eq!(detect_card_type("6011000000000004"), "UNKNOWN");
    }

    #[tokio::test]
    async fn stores_only_last_four_digits() {
        let store = Arc::new(InMemoryPaymentStore::new());
        let processor = CardProcessor::new(store.clone());

        let response = processor
            .process(&card_request("4111111111111111", 100))
            .await
            .unwrap();

        let record = store.find_by_id(response.payment_id).await.unwrap().unwrap();
        assert_eq!(record.status, PaymentStatus::Completed);
        assert_eq!(record.details.last_four_digits.as_deref(), Some("1111"));
        assert_eq!(record.details.card_type.as_deref(), Some("VISA"));
        assert!(record.details.completed_at.is_some());

        let persisted = serde_json::to_string(&record).unwrap();
        assert!(!persisted.contains("4111111111111111"));
        assert!(!persisted.contains("12/30"));
    }

    #[tokio::test]
    async fn invalid_card_creates_no_record() {
        let store = Arc::new(InMemoryPaymentStore::new());
        let processor = CardProcessor::new(store.clone());

        let err = processor.process(&card_request("1234", 100)).await.unwrap_err();
        assert!(matches!(err, PaymentError::ValidationError { .. }));

        let err = processor
            .process(&card_request("4111111111111111", 0))
            .await
            .unwrap_err();
        assert!(matches!(err, PaymentError::ValidationError { .. }));

        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn initiation_leaves_card_payment_pending() {
        let store = Arc::new(InMemoryPaymentStore::new());
        let processor = CardProcessor::new(store.clone());

        let response = processor
            .initiate(&PaymentInitiationRequest {
                order_id: "O1".to_string(),
                user_id: "U1".to_string(),
                amount: BigDecimal::from(100),
                method: PaymentMethod::Card,
            })
            .await
            .unwrap();

        let record = store.find_by_id(response.payment_id).await.unwrap().unwrap();
        assert_eq!(record.status, PaymentStatus::Pending);
        assert!(record.transaction_id.is_some());
    }

    async fn initiate_card(processor: &CardProcessor, user_id: &str) -> InitiationResponse {
        processor
            .initiate(&PaymentInitiationRequest {
                order_id: "O1".to_string(),
                user_id: user_id.to_string(),
                amount: BigDecimal::from(100),
                method: PaymentMethod::Card,
            })
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn processing_completes_the_initiated_record() {
        let store = Arc::new(InMemoryPaymentStore::new());
        let processor = CardProcessor::new(store.clone());
        let initiated = initiate_card(&processor, "U1").await;

        let response = processor
            .process(&card_request("4111111111111111", 100))
            .await
            .unwrap();

        assert_eq!(response.payment_id, initiated.payment_id);
        assert_eq!(Some(response.transaction_id), initiated.transaction_id);
        assert_eq!(store.len().await, 1);

        let record = store.find_by_id(initiated.payment_id).await.unwrap().unwrap();
        assert_eq!(record.status, PaymentStatus::Completed);
        assert_eq!(record.details.last_four_digits.as_deref(), Some("1111"));
        assert!(record.details.initiated_at.is_some());
    }

    #[tokio::test]
    async fn different_amount_leaves_initiated_record_pending() {
        let store = Arc::new(InMemoryPaymentStore::new());
        let processor = CardProcessor::new(store.clone());
        let initiated = initiate_card(&processor, "U1").await;

        let err = processor
            .process(&card_request("4111111111111111", 250))
            .await
            .unwrap_err();

        assert!(matches!(err, PaymentError::AmountMismatch { .. }));
        assert_eq!(store.len().await, 1);
        let record = store.find_by_id(initiated.payment_id).await.unwrap().unwrap();
        assert_eq!(record.status, PaymentStatus::Pending);
    }

    #[tokio::test]
    async fn another_users_pending_record_is_not_adopted() {
        let store = Arc::new(InMemoryPaymentStore::new());
        let processor = CardProcessor::new(store.clone());
        let initiated = initiate_card(&processor, "U2").await;

        let response = processor
            .process(&card_request("4111111111111111", 100))
            .await
            .unwrap();

        assert_ne!(response.payment_id, initiated.payment_id);
        assert_eq!(store.len().await, 2);
        let record = store.find_by_id(initiated.payment_id).await.unwrap().unwrap();
        assert_eq!(record.status, PaymentStatus::Pending);
    }
}
