//! Payment initiation, wallet verification and card processing

pub mod amount;
pub mod dispatcher;
pub mod error;
pub mod gateway;
pub mod provider;
pub mod providers;
pub mod transaction_id;
pub mod types;
pub mod verifier;

pub use dispatcher::PaymentDispatcher;
pub use error::{PaymentError, PaymentResult};
pub use gateway::{GatewayResponse, HttpVerificationGateway, VerificationGateway, VerificationRequest};
pub use provider::PaymentInitiator;
pub use verifier::RedirectWalletVerifier;
