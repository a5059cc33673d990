use super::types::{EXCHANGE_PATH, ExchangeRequestBody, PLAID_API_VERSION, PlaidEnvironment};
use super::{PlaidApi, PlaidClientFactory, TokenExchange};
use crate::config::PlaidConfig;
use crate::error::{BanterError, PlaidApiError};

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

/// Plaid client bound to one set of credentials and one environment.
pub struct PlaidClient {
    http: reqwest::Client,
    base_url: Url,
    client_id: String,
    secret: String,
}

impl PlaidClient {
    /// Validate credentials and resolve the environment host.
    pub fn new(http: reqwest::Client, cfg: &PlaidConfig) -> Result<Self, BanterError> {
        if cfg.client_id.trim().is_empty() {
            return Err(BanterError::MissingPlaidCredential("client_id"));
        }
        if cfg.secret.trim().is_empty() {
            return Err(BanterError::MissingPlaidCredential("secret"));
        }
        let env: PlaidEnvironment = cfg.env.parse()?;
        let base_url = match cfg.base_url.clone() {
            Some(url) => with_trailing_slash(url),
            None => Url::parse(env.base_url())?,
        };
        debug!(env = %env, base_url = %base_url, "Creating Plaid client");

        Ok(Self {
            http,
            base_url,
            client_id: cfg.client_id.clone(),
            secret: cfg.secret.clone(),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }
}

#[async_trait]
impl PlaidApi for PlaidClient {
    async fn exchange_public_token(
        &self,
        public_token: &str,
    ) -> Result<TokenExchange, BanterError> {
        let url = self.base_url.join(EXCHANGE_PATH)?;
        let resp = self
            .http
            .post(url)
            .header("Plaid-Version", PLAID_API_VERSION)
            .json(&ExchangeRequestBody {
                client_id: &self.client_id,
                secret: &self.secret,
                public_token,
            })
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.bytes().await?;
            return Err(match serde_json::from_slice::<PlaidApiError>(&body) {
                Ok(error) => BanterError::PlaidApi { status, error },
                Err(_) => BanterError::UpstreamStatus(status),
            });
        }

        let exchange: TokenExchange = resp.json().await?;
        info!(
            item_id = %exchange.item_id,
            request_id = exchange.request_id.as_deref().unwrap_or("<none>"),
            "Plaid public token exchanged"
        );
        Ok(exchange)
    }
}

// `Url::join` replaces the last segment unless the path ends in '/'.
fn with_trailing_slash(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}

/// Owns one pooled HTTP client and builds a [`PlaidClient`] per request.
pub struct HttpPlaidFactory {
    http: reqwest::Client,
    config: PlaidConfig,
}

impl HttpPlaidFactory {
    pub fn new(config: PlaidConfig, proxy: Option<&Url>) -> Result<Self, BanterError> {
        let mut builder = reqwest::Client::builder()
            .user_agent(concat!("banter-api/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(Duration::from_secs(5))
            .timeout(Duration::from_secs(config.timeout_secs.max(1)));
        if let Some(proxy_url) = proxy {
            builder = builder.proxy(reqwest::Proxy::all(proxy_url.as_str())?);
        }
        let http = builder.build()?;
        Ok(Self { http, config })
    }
}

impl PlaidClientFactory for HttpPlaidFactory {
    fn build(&self) -> Result<Arc<dyn PlaidApi>, BanterError> {
        let client = PlaidClient::new(self.http.clone(), &self.config)?;
        Ok(Arc::new(client))
    }
}
