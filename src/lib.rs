//! Storefront payment orchestration: initiation across cash-on-delivery,
//! redirect wallet and card, wallet verification, and status queries.

pub mod api;
pub mod config;
pub mod database;
pub mod error;
pub mod health;
pub mod logging;
pub mod middleware;
pub mod payments;
pub mod services;
