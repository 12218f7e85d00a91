#![allow(dead_code)]

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use storefront_payments::config::RedirectWalletConfig;
use storefront_payments::database::memory::InMemoryPaymentStore;
use storefront_payments::payments::{
    GatewayResponse, PaymentError, PaymentResult, VerificationGateway, VerificationRequest,
};
use storefront_payments::services::PaymentService;

pub const SUCCESS_BODY: &str = "<response><response_code>Success</response_code></response>";
pub const FAILURE_BODY: &str = "<response><response_code>failure</response_code></response>";

/// Scripted gateway that records every verification request it receives.
pub struct StubGateway {
    result: PaymentResult<GatewayResponse>,
    delay: Option<Duration>,
    calls: AtomicUsize,
    requests: Mutex<Vec<VerificationRequest>>,
}

impl StubGateway {
    pub fn responding(body: &str) -> Self {
        Self::with_result(Ok(GatewayResponse {
            status: 200,
            body: body.to_string(),
        }))
    }

    pub fn failing(err: PaymentError) -> Self {
        Self::with_result(Err(err))
    }

    fn with_result(result: PaymentResult<GatewayResponse>) -> Self {
        Self {
            result,
            delay: None,
            calls: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<VerificationRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl VerificationGateway for StubGateway {
    async fn verify(&self, request: &VerificationRequest) -> PaymentResult<GatewayResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(request.clone());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.result.clone()
    }
}

pub fn wallet_config() -> RedirectWalletConfig {
    RedirectWalletConfig {
        merchant_code: "EPAYTEST".to_string(),
        payment_url: "https://wallet.example/epay/main".to_string(),
        success_url: "https://shop.example/payment/success".to_string(),
        failure_url: "https://shop.example/payment/failure".to_string(),
        verification_url: "https://wallet.example/epay/transrec".to_string(),
        request_timeout: Duration::from_secs(10),
    }
}

pub struct Harness {
    pub store: Arc<InMemoryPaymentStore>,
    pub gateway: Arc<StubGateway>,
    pub service: Arc<PaymentService>,
}

pub fn harness(gateway: StubGateway) -> Harness {
    let store = Arc::new(InMemoryPaymentStore::new());
    let gateway = Arc::new(gateway);
    let service = Arc::new(PaymentService::new(
        store.clone(),
        gateway.clone(),
        wallet_config(),
    ));

    Harness {
        store,
        gateway,
        service,
    }
}
