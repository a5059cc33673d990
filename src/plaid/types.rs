use crate::error::BanterError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Version pinned through the `Plaid-Version` header.
pub const PLAID_API_VERSION: &str = "2020-09-14";

pub const EXCHANGE_PATH: &str = "item/public_token/exchange";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaidEnvironment {
    Sandbox,
    Development,
    Production,
}

impl PlaidEnvironment {
    pub fn base_url(self) -> &'static str {
        match self {
            PlaidEnvironment::Sandbox => "https://sandbox.plaid.com",
            PlaidEnvironment::Development => "https://development.plaid.com",
            PlaidEnvironment::Production => "https://production.plaid.com",
        }
    }
}

impl FromStr for PlaidEnvironment {
    type Err = BanterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sandbox" => Ok(PlaidEnvironment::Sandbox),
            "development" => Ok(PlaidEnvironment::Development),
            "production" => Ok(PlaidEnvironment::Production),
            _ => Err(BanterError::InvalidPlaidEnvironment(s.to_string())),
        }
    }
}

impl fmt::Display for PlaidEnvironment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PlaidEnvironment::Sandbox => "sandbox",
            PlaidEnvironment::Development => "development",
            PlaidEnvironment::Production => "production",
        };
        f.write_str(name)
    }
}

#[derive(Serialize)]
pub(super) struct ExchangeRequestBody<'a> {
    pub client_id: &'a str,
    pub secret: &'a str,
    pub public_token: &'a str,
}

/// Successful `/item/public_token/exchange` response.
#[derive(Clone, Deserialize, Serialize)]
pub struct TokenExchange {
    pub access_token: String,
    pub item_id: String,
    #[serde(default)]
    pub request_id: Option<String>,
}

impl fmt::Debug for TokenExchange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenExchange")
            .field("access_token", &"<redacted>")
            .field("item_id", &self.item_id)
            .field("request_id", &self.request_id)
            .finish()
    }
}
