use crate::db::models::{NewAccount, NewInstitution, UpsertOutcome};
use crate::db::sqlite::BanterStorage;
use crate::error::BanterError;
use crate::types::{ExchangeRequest, LinkDecodeError};

use thiserror::Error as ThisError;
use tracing::{debug, error, info};

/// A record that could not be saved. Logged, never returned to the caller.
#[derive(Debug, ThisError)]
#[error("failed to save {kind} '{external_id}': {source}")]
pub struct PersistenceError {
    pub kind: &'static str,
    pub external_id: String,
    #[source]
    pub source: BanterError,
}

#[derive(Debug, Default)]
pub struct PersistReport {
    pub institution: Option<UpsertOutcome>,
    pub accounts_created: usize,
    pub accounts_existing: usize,
    pub failures: Vec<PersistenceError>,
}

impl PersistenceError {
    fn undecodable(kind: &'static str, err: LinkDecodeError) -> Self {
        Self {
            kind,
            external_id: err.external_id,
            source: BanterError::Json(err.source),
        }
    }
}

/// Save the institution and accounts carried in the Link metadata.
///
/// Each insert commits on its own, so a failure part way leaves the earlier
/// rows in place. Metadata that does not decode is skipped like a failed
/// insert. Failures are logged and collected in the report.
pub async fn persist_linked_item(
    storage: &BanterStorage,
    request: &ExchangeRequest,
) -> PersistReport {
    let mut report = PersistReport::default();

    match request.institution() {
        Some(Ok(link_institution)) => {
            let institution = NewInstitution::from(&link_institution);
            match storage.insert_institution_if_absent(&institution).await {
                Ok(outcome) => {
                    if outcome.is_created() {
                        debug!(
                            id = outcome.id(),
                            external_institution_id = %institution.external_institution_id,
                            name = %institution.name,
                            "Saved institution"
                        );
                    } else {
                        debug!(
                            id = outcome.id(),
                            external_institution_id = %institution.external_institution_id,
                            "Institution already stored"
                        );
                    }
                    report.institution = Some(outcome);
                }
                Err(source) => {
                    let err = PersistenceError {
                        kind: "institution",
                        external_id: institution.external_institution_id,
                        source,
                    };
                    error!(error = %err, "Error creating institution");
                    report.failures.push(err);
                }
            }
        }
        Some(Err(decode_err)) => {
            let err = PersistenceError::undecodable("institution", decode_err);
            error!(error = %err, "Skipping institution");
            report.failures.push(err);
        }
        None => debug!("No institution in Link metadata"),
    }

    for link_account in request.accounts() {
        let account = match link_account {
            Ok(link_account) => NewAccount::from(&link_account),
            Err(decode_err) => {
                let err = PersistenceError::undecodable("account", decode_err);
                error!(error = %err, "Skipping account");
                report.failures.push(err);
                continue;
            }
        };
        match storage.insert_account_if_absent(&account).await {
            Ok(UpsertOutcome::Created(id)) => {
                info!(id, external_account_id = %account.external_account_id, "Saved account");
                report.accounts_created += 1;
            }
            Ok(UpsertOutcome::Existing(_)) => {
                debug!(external_account_id = %account.external_account_id, "Account already stored");
                report.accounts_existing += 1;
            }
            Err(source) => {
                let err = PersistenceError {
                    kind: "account",
                    external_id: account.external_account_id,
                    source,
                };
                error!(error = %err, "Error saving account");
                report.failures.push(err);
            }
        }
    }

    report
}
