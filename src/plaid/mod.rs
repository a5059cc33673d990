//! Plaid upstream client.
//!
//! Layout:
//! - `types.rs`: environments and wire types for the exchange endpoint
//! - `client.rs`: reqwest-backed client and the factory that builds it
//!
//! The workflow only sees the [`PlaidApi`] and [`PlaidClientFactory`] traits,
//! so tests can inject a fake upstream.

pub mod client;
pub mod types;

use crate::error::BanterError;
use async_trait::async_trait;
use std::sync::Arc;

pub use client::{HttpPlaidFactory, PlaidClient};
pub use types::{PlaidEnvironment, TokenExchange};

/// Operations the backend needs from Plaid.
#[async_trait]
pub trait PlaidApi: Send + Sync {
    /// Exchange a Link public token for an access token and item id.
    async fn exchange_public_token(&self, public_token: &str)
    -> Result<TokenExchange, BanterError>;
}

/// Builds a configured [`PlaidApi`] for one request.
pub trait PlaidClientFactory: Send + Sync {
    fn build(&self) -> Result<Arc<dyn PlaidApi>, BanterError>;
}
