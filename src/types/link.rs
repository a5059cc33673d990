use crate::db::models::{NewAccount, NewInstitution};
use serde::Deserialize;
use serde::de::Error as _;
use serde_json::{Map, Value};
use thiserror::Error as ThisError;

/// Body of the token exchange request.
///
/// Only `public_token` is required. Plaid Link's success metadata
/// (`institution`, `accounts`) may ride along and is decoded on demand, so a
/// metadata shape we do not expect never rejects the exchange itself.
#[derive(Debug, Clone, Default)]
pub struct ExchangeRequest {
    body: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LinkInstitution {
    pub institution_id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LinkAccount {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub mask: Option<String>,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub subtype: Option<String>,
}

/// A piece of Link metadata that did not have the expected shape.
#[derive(Debug, ThisError)]
#[error("invalid Link metadata for '{external_id}': {source}")]
pub struct LinkDecodeError {
    pub external_id: String,
    #[source]
    pub source: serde_json::Error,
}

impl ExchangeRequest {
    /// Parse a JSON object body. Anything that is not an object is an error.
    pub fn parse(body: &[u8]) -> Result<Self, serde_json::Error> {
        let body: Map<String, Value> = serde_json::from_slice(body)?;
        Ok(Self { body })
    }

    /// The public token, if present as a non-blank string.
    pub fn public_token(&self) -> Option<&str> {
        self.str_field("public_token")
            .map(str::trim)
            .filter(|t| !t.is_empty())
    }

    pub fn link_session_id(&self) -> Option<&str> {
        self.str_field("link_session_id")
    }

    /// `None` when absent or `null`.
    pub fn institution(&self) -> Option<Result<LinkInstitution, LinkDecodeError>> {
        match self.body.get("institution") {
            None | Some(Value::Null) => None,
            Some(value) => Some(decode(value, "institution_id")),
        }
    }

    /// One entry per account; absent or `null` means no accounts.
    pub fn accounts(&self) -> Vec<Result<LinkAccount, LinkDecodeError>> {
        match self.body.get("accounts") {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Array(items)) => items.iter().map(|item| decode(item, "id")).collect(),
            Some(other) => vec![Err(LinkDecodeError {
                external_id: "<accounts>".to_string(),
                source: serde_json::Error::custom(format!(
                    "expected an array of accounts, found {other}"
                )),
            })],
        }
    }

    fn str_field(&self, key: &str) -> Option<&str> {
        self.body.get(key).and_then(Value::as_str)
    }
}

fn decode<T>(value: &Value, id_key: &str) -> Result<T, LinkDecodeError>
where
    T: for<'de> Deserialize<'de>,
{
    T::deserialize(value).map_err(|source| LinkDecodeError {
        external_id: value
            .get(id_key)
            .and_then(Value::as_str)
            .unwrap_or("<unknown>")
            .to_string(),
        source,
    })
}

impl From<&LinkInstitution> for NewInstitution {
    fn from(i: &LinkInstitution) -> Self {
        Self {
            external_institution_id: i.institution_id.clone(),
            name: i.name.clone(),
        }
    }
}

impl From<&LinkAccount> for NewAccount {
    fn from(a: &LinkAccount) -> Self {
        Self {
            external_account_id: a.id.clone(),
            name: a.name.clone(),
        }
    }
}
