use crate::error::BanterError;
use figment::{
    Figment,
    providers::{Env, Serialized},
};
use serde::{Deserialize, Serialize};
use url::Url;

pub const DEFAULT_PLAID_ROUTE: &str = "/plaid";

/// Runtime configuration, layered as defaults <- `PLAID_*` <- `BANTER_*`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub listen_addr: String,
    pub database_url: String,
    pub loglevel: String,
    pub plaid_route: String,
    /// Save the linked institution and accounts after a successful exchange.
    pub persist_linked_items: bool,
    pub body_limit_bytes: usize,
    pub proxy: Option<Url>,
    pub plaid: PlaidConfig,
}

#[derive(Clone, Deserialize, Serialize)]
pub struct PlaidConfig {
    pub client_id: String,
    /// `PLAID_SECRET`, falling back to the legacy `PLAID_SECRET_KEY`.
    pub secret: String,
    /// Legacy Link public key. Not needed for the exchange call itself.
    pub public_key: Option<String>,
    pub env: String,
    /// Replaces the environment host, e.g. to point at a local fake.
    pub base_url: Option<Url>,
    pub timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:8000".to_string(),
            database_url: "sqlite:banter.db".to_string(),
            loglevel: "info".to_string(),
            plaid_route: DEFAULT_PLAID_ROUTE.to_string(),
            persist_linked_items: false,
            body_limit_bytes: 64 * 1024,
            proxy: None,
            plaid: PlaidConfig::default(),
        }
    }
}

impl Default for PlaidConfig {
    fn default() -> Self {
        Self {
            client_id: String::new(),
            secret: String::new(),
            public_key: None,
            env: "sandbox".to_string(),
            base_url: None,
            timeout_secs: 15,
        }
    }
}

// Keep the secret out of logs.
impl std::fmt::Debug for PlaidConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlaidConfig")
            .field("client_id", &self.client_id)
            .field("secret", &"<redacted>")
            .field("public_key", &self.public_key.as_ref().map(|_| "<set>"))
            .field("env", &self.env)
            .field("base_url", &self.base_url)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl Config {
    pub fn figment() -> Figment {
        Figment::from(Serialized::defaults(Config::default()))
            .merge(
                Env::raw()
                    .only(&["PLAID_SECRET_KEY"])
                    .map(|_| "plaid.secret".into()),
            )
            .merge(
                Env::prefixed("PLAID_")
                    .filter(|key| !key.as_str().eq_ignore_ascii_case("secret_key"))
                    .map(|key| format!("plaid.{key}").into()),
            )
            .merge(Env::prefixed("BANTER_").split("__"))
    }

    pub fn load() -> Result<Self, BanterError> {
        Ok(Self::figment().extract()?)
    }
}
