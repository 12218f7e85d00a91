use crate::database::repository::PaymentStore;
use crate::payments::error::PaymentResult;
use crate::payments::provider::PaymentInitiator;
use crate::payments::transaction_id::generate_transaction_id;
use crate::payments::types::{
    InitiationResponse, NewPayment, PaymentDetails, PaymentInitiationRequest, PaymentMethod,
};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::info;

pub const DELIVERY_NOTES: &str = "Cash payment to be collected on delivery";

pub struct CashOnDeliveryInitiator {
    store: Arc<dyn PaymentStore>,
}

impl CashOnDeliveryInitiator {
    pub fn new(store: Arc<dyn PaymentStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl PaymentInitiator for CashOnDeliveryInitiator {
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
                method: PaymentMethod::CashOnDelivery,
                transaction_id: Some(generate_transaction_id()),
                details: PaymentDetails {
                    delivery_notes: Some(DELIVERY_NOTES.to_string()),
                    ..PaymentDetails::initiated_now()
                },
            })
            .await?;

        info!(
            payment_id = %record.id,
            order_id = %record.order_id,
            "Cash on delivery payment recorded"
        );

        Ok(InitiationResponse {
            success: true,
            message: "Order placed, payment will be collected on delivery".to_string(),
            payment_id: record.id,
            transaction_id: record.transaction_id,
            redirect: None,
        })
    }

    fn method(&self) -> PaymentMethod {
        PaymentMethod::CashOnDelivery
    }
}
