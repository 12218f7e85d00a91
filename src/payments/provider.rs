use crate::payments::error::PaymentResult;
use crate::payments::types::{InitiationResponse, PaymentInitiationRequest, PaymentMethod};
use async_trait::async_trait;

/// One initiation strategy per payment method.
#[async_trait]
pub trait PaymentInitiator: Send + Sync {
    /// Persist a PENDING record for the request and describe what the
    /// caller does next.
    async fn initiate(&self, request: &PaymentInitiationRequest)
        -> PaymentResult<InitiationResponse>;

    fn method(&self) -> PaymentMethod;
}
