use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DbInstitution {
    pub id: i64,
    pub external_institution_id: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DbAccount {
    pub id: i64,
    pub external_account_id: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewInstitution {
    pub external_institution_id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAccount {
    pub external_account_id: String,
    pub name: String,
}

/// Result of a create-if-absent insert, carrying the row id either way.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Created(i64),
    Existing(i64),
}

impl UpsertOutcome {
    pub fn id(self) -> i64 {
        match self {
            UpsertOutcome::Created(id) | UpsertOutcome::Existing(id) => id,
        }
    }

    pub fn is_created(self) -> bool {
        matches!(self, UpsertOutcome::Created(_))
    }
}
