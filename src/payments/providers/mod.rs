pub mod card;
pub mod cash_on_delivery;
pub mod redirect_wallet;

pub use card::CardProcessor;
pub use cash_on_delivery::CashOnDeliveryInitiator;
pub use redirect_wallet::RedirectWalletInitiator;
