pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod plaid;
pub mod router;
pub mod service;
pub mod types;

pub use error::{BanterError, ExchangeError, StatusPayload};
pub use service::TokenExchangeWorkflow;
