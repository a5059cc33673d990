use crate::db::sqlite::BanterStorage;
use crate::error::{ExchangeError, StatusPayload};
use crate::plaid::PlaidClientFactory;
use crate::service::linked_item::persist_linked_item;
use crate::types::ExchangeRequest;

use std::sync::Arc;
use tracing::{debug, error, info};

/// Exchanges a Link public token for a Plaid access token.
///
/// One linear pass per request: parse, validate, build the upstream client,
/// exchange, then save the linked item when a storage handle was supplied.
pub struct TokenExchangeWorkflow {
    plaid: Arc<dyn PlaidClientFactory>,
    storage: Option<BanterStorage>,
}

impl TokenExchangeWorkflow {
    pub fn new(plaid: Arc<dyn PlaidClientFactory>) -> Self {
        Self {
            plaid,
            storage: None,
        }
    }

    /// Enable saving of the linked institution and accounts.
    pub fn with_persistence(mut self, storage: BanterStorage) -> Self {
        self.storage = Some(storage);
        self
    }

    pub fn persistence_enabled(&self) -> bool {
        self.storage.is_some()
    }

    pub async fn exchange(&self, body: &[u8]) -> Result<StatusPayload, ExchangeError> {
        info!("Exchanging Plaid public token for an access token and item id");

        let request = ExchangeRequest::parse(body).map_err(|e| {
            error!(error = %e, "Error parsing request as json");
            ExchangeError::MalformedRequest
        })?;

        let Some(public_token) = request.public_token() else {
            error!("public_token not found in request body");
            return Err(ExchangeError::MissingField("public_token"));
        };

        debug!(
            link_session_id = request.link_session_id().unwrap_or("<none>"),
            "Plaid link session"
        );

        let client = self.plaid.build().map_err(|e| {
            error!(error = %e, "Error creating Plaid client");
            ExchangeError::ClientInit
        })?;

        let exchange = client.exchange_public_token(public_token).await.map_err(|e| {
            error!(
                error = %e,
                "Error exchanging public token with Plaid; the token is probably malformed or expired"
            );
            ExchangeError::TokenExchange
        })?;
        info!(item_id = %exchange.item_id, "Successfully exchanged Plaid public token");

        if let Some(storage) = &self.storage {
            let report = persist_linked_item(storage, &request).await;
            debug!(
                institution = ?report.institution,
                accounts_created = report.accounts_created,
                accounts_existing = report.accounts_existing,
                failures = report.failures.len(),
                "Linked item persisted"
            );
        }

        Ok(StatusPayload::exchanged())
    }
}
