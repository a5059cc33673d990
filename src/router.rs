use axum::{Router, extract::DefaultBodyLimit, routing::post};
use std::sync::Arc;

use crate::config::Config;
use crate::handlers::plaid::plaid_exchange_handler;
use crate::service::TokenExchangeWorkflow;

#[derive(Clone)]
pub struct BanterState {
    pub workflow: Arc<TokenExchangeWorkflow>,
}

impl BanterState {
    pub fn new(workflow: TokenExchangeWorkflow) -> Self {
        Self {
            workflow: Arc::new(workflow),
        }
    }
}

pub fn banter_router(state: BanterState, cfg: &Config) -> Router {
    Router::new()
        .route(cfg.plaid_route.as_str(), post(plaid_exchange_handler))
        .layer(DefaultBodyLimit::max(cfg.body_limit_bytes))
        .with_state(state)
}
