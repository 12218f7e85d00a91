use crate::config::RedirectWalletConfig;
use crate::payments::error::{PaymentError, PaymentResult};
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, warn};

/// Marker the wallet puts in the body of a confirmed transaction.
pub const SUCCESS_TOKEN: &str = "Success";

/// Form fields of the server-to-server verification call.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct VerificationRequest {
    pub amt: String,
    pub rid: String,
    pub pid: String,
    pub scd: String,
}

/// Whatever the gateway answered, successful or not.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayResponse {
    pub status: u16,
    pub body: String,
}

impl GatewayResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status) && self.body.contains(SUCCESS_TOKEN)
    }
}

/// Outbound verification call. Errors are transport failures only; any HTTP
/// response comes back as a [`GatewayResponse`].
#[async_trait]
pub trait VerificationGateway: Send + Sync {
    async fn verify(&self, request: &VerificationRequest) -> PaymentResult<GatewayResponse>;
}

pub struct HttpVerificationGateway {
    client: Client,
    verification_url: String,
    timeout: Duration,
}

impl HttpVerificationGateway {
    pub fn new(config: &RedirectWalletConfig) -> PaymentResult<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| PaymentError::VerificationFailed {
                reason: format!("failed to initialize HTTP client: {}", e),
            })?;

        Ok(Self {
            client,
            verification_url: config.verification_url.clone(),
            timeout: config.request_timeout,
        })
    }
}

#[async_trait]
impl VerificationGateway for HttpVerificationGateway {
    async fn verify(&self, request: &VerificationRequest) -> PaymentResult<GatewayResponse> {
        debug!(pid = %request.pid, url = %self.verification_url, "Calling wallet verification");

        let response = self
            .client
            .post(&self.verification_url)
            .timeout(self.timeout)
            .form(request)
            .send()
            .await
            .map_err(|e| self.map_transport_error(e))?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| self.map_transport_error(e))?;

        Ok(GatewayResponse { status, body })
    }
}

impl HttpVerificationGateway {
    fn map_transport_error(&self, err: reqwest::Error) -> PaymentError {
        if err.is_timeout() {
            warn!(timeout_secs = self.timeout.as_secs(), "Wallet verification timed out");
            PaymentError::GatewayTimeout {
                timeout_secs: self.timeout.as_secs(),
            }
        } else {
            warn!(error = %err, "Wallet verification request failed");
            PaymentError::VerificationFailed {
                reason: format!("verification request failed: {}", err),
            }
        }
    }
}
