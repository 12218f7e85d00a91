use crate::config::RedirectWalletConfig;
use crate::database::repository::PaymentStore;
use crate::payments::error::PaymentResult;
use crate::payments::provider::PaymentInitiator;
use crate::payments::providers::{CardProcessor, CashOnDeliveryInitiator, RedirectWalletInitiator};
use crate::payments::types::{InitiationResponse, PaymentInitiationRequest, PaymentMethod};
use std::sync::Arc;
use tracing::debug;

/// Routes an initiation request to the strategy for its method.
pub struct PaymentDispatcher {
    cash_on_delivery: CashOnDeliveryInitiator,
    redirect_wallet: RedirectWalletInitiator,
    card: CardProcessor,
}

impl PaymentDispatcher {
    pub fn new(store: Arc<dyn PaymentStore>, wallet_config: RedirectWalletConfig) -> Self {
        Self {
            cash_on_delivery: CashOnDeliveryInitiator::new(store.clone()),
            redirect_wallet: RedirectWalletInitiator::new(store.clone(), wallet_config),
            card: CardProcessor::new(store),
        }
    }

    pub fn initiator_for(&self, method: PaymentMethod) -> &dyn PaymentInitiator {
        match method {
            PaymentMethod::CashOnDelivery => &self.cash_on_delivery,
            PaymentMethod::RedirectWallet => &self.redirect_wallet,
            PaymentMethod::Card => &self.card,
        }
    }

    pub async fn dispatch(
        &self,
        request: &PaymentInitiationRequest,
    ) -> PaymentResult<InitiationResponse> {
        let initiator = self.initiator_for(request.method);
        debug!(method = %initiator.method(), order_id = %request.order_id, "Dispatching payment");
        initiator.initiate(request).await
    }

    pub fn card(&self) -> &CardProcessor {
        &self.card
    }
}
