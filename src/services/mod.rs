//! Services module for business logic

pub mod payment_service;

pub use payment_service::PaymentService;
