use axum::{Json, body::Bytes, extract::State};

use crate::error::{ExchangeError, StatusPayload};
use crate::router::BanterState;

/// POST /plaid -> exchanges the Link public token in the body for an access token.
pub async fn plaid_exchange_handler(
    State(state): State<BanterState>,
    body: Bytes,
) -> Result<Json<StatusPayload>, ExchangeError> {
    let payload = state.workflow.exchange(&body).await?;
    Ok(Json(payload))
}
