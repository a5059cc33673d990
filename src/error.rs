use axum::{Json, http::StatusCode, response::IntoResponse};
use serde::{Deserialize, Serialize};
use sqlx::Error as SqlxError;
use thiserror::Error as ThisError;

#[derive(Debug, ThisError)]
pub enum BanterError {
    #[error("Configuration error: {0}")]
    Config(#[from] Box<figment::Error>),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("HTTP request error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Database error: {0}")]
    DatabaseError(#[from] SqlxError),

    #[error("Missing Plaid credential: {0}")]
    MissingPlaidCredential(&'static str),

    #[error("Unknown Plaid environment: {0:?}")]
    InvalidPlaidEnvironment(String),

    #[error("Plaid API error ({status}): {error}")]
    PlaidApi {
        status: StatusCode,
        error: PlaidApiError,
    },

    #[error("Upstream error with status: {0}")]
    UpstreamStatus(StatusCode),
}

impl From<figment::Error> for BanterError {
    fn from(e: figment::Error) -> Self {
        BanterError::Config(Box::new(e))
    }
}

/// Error body returned by Plaid on non-2xx responses.
#[derive(Debug, Clone, Deserialize, Serialize, ThisError)]
#[error("{error_type}/{error_code}: {error_message}")]
pub struct PlaidApiError {
    pub error_type: String,
    pub error_code: String,
    pub error_message: String,
    #[serde(default)]
    pub display_message: Option<String>,
    #[serde(default)]
    pub request_id: Option<String>,
}

/// Failures of the token exchange endpoint that are reported to the caller.
///
/// Upstream and construction details are logged where they occur; the
/// variants only carry what is safe to return.
#[derive(Debug, Clone, PartialEq, Eq, ThisError)]
pub enum ExchangeError {
    #[error("request body is not valid JSON")]
    MalformedRequest,

    #[error("missing field `{0}` in request body")]
    MissingField(&'static str),

    #[error("failed to construct Plaid client")]
    ClientInit,

    #[error("Plaid rejected the public token exchange")]
    TokenExchange,
}

impl ExchangeError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ExchangeError::ClientInit => StatusCode::INTERNAL_SERVER_ERROR,
            ExchangeError::MalformedRequest
            | ExchangeError::MissingField(_)
            | ExchangeError::TokenExchange => StatusCode::BAD_REQUEST,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            ExchangeError::MalformedRequest => "4000",
            ExchangeError::MissingField(_) => "4001",
            ExchangeError::TokenExchange => "4002",
            ExchangeError::ClientInit => "5001",
        }
    }

    fn message(&self) -> String {
        match self {
            ExchangeError::MalformedRequest => "The supplied body was not valid JSON.".to_string(),
            ExchangeError::MissingField(field) => {
                format!("Request malformed. {field} not found in body.")
            }
            ExchangeError::ClientInit => "Error connecting to Plaid.".to_string(),
            ExchangeError::TokenExchange => "Error exchanging public token with Plaid. \
                This probably means the public token was malformed."
                .to_string(),
        }
    }

    pub fn payload(&self) -> StatusPayload {
        StatusPayload {
            status: self.status_code().as_u16().to_string(),
            message: self.message(),
            code: self.code().to_string(),
        }
    }
}

impl IntoResponse for ExchangeError {
    fn into_response(self) -> axum::response::Response {
        (self.status_code(), Json(self.payload())).into_response()
    }
}

/// Standardized `{status, message, code}` response body
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusPayload {
    pub status: String,
    pub message: String,
    pub code: String,
}

impl StatusPayload {
    pub fn exchanged() -> Self {
        Self {
            status: StatusCode::OK.as_u16().to_string(),
            message: "Success exchanging public token.".to_string(),
            code: "2002".to_string(),
        }
    }
}
