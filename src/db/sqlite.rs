use crate::db::models::{DbAccount, DbInstitution, NewAccount, NewInstitution, UpsertOutcome};
use crate::db::schema::{SQLITE_DROP, SQLITE_INIT};
use crate::error::BanterError;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow};
use sqlx::{Pool, Row, Sqlite};
use std::str::FromStr;

pub type SqlitePool = Pool<Sqlite>;

/// Open a pool for `database_url`, creating the database file if missing.
pub async fn connect(database_url: &str) -> Result<SqlitePool, BanterError> {
    let connect_opts = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
    let pool = SqlitePoolOptions::new().connect_with(connect_opts).await?;
    Ok(pool)
}

#[derive(Clone)]
pub struct BanterStorage {
    pool: SqlitePool,
}

impl BanterStorage {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Initialize the schema by executing the bundled DDL.
    pub async fn init_schema(&self) -> Result<(), BanterError> {
        self.execute_script(SQLITE_INIT).await
    }

    pub async fn drop_schema(&self) -> Result<(), BanterError> {
        self.execute_script(SQLITE_DROP).await
    }

    // sqlx::query runs one statement at a time
    async fn execute_script(&self, script: &str) -> Result<(), BanterError> {
        for stmt in script.split(';') {
            let s = stmt.trim();
            if s.is_empty() {
                continue;
            }
            sqlx::query(s).execute(&self.pool).await?;
        }
        Ok(())
    }

    /// Insert unless `external_institution_id` is already stored.
    /// An existing row is left untouched, name included.
    pub async fn insert_institution_if_absent(
        &self,
        institution: &NewInstitution,
    ) -> Result<UpsertOutcome, BanterError> {
        let result = sqlx::query(
            r#"
            INSERT INTO institutions (external_institution_id, name, created_at)
            VALUES (?, ?, ?)
            ON CONFLICT(external_institution_id) DO NOTHING
            "#,
        )
        .bind(&institution.external_institution_id)
        .bind(&institution.name)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 1 {
            return Ok(UpsertOutcome::Created(result.last_insert_rowid()));
        }
        let rec: (i64,) =
            sqlx::query_as("SELECT id FROM institutions WHERE external_institution_id = ?")
                .bind(&institution.external_institution_id)
                .fetch_one(&self.pool)
                .await?;
        Ok(UpsertOutcome::Existing(rec.0))
    }

    /// Insert unless `external_account_id` is already stored.
    pub async fn insert_account_if_absent(
        &self,
        account: &NewAccount,
    ) -> Result<UpsertOutcome, BanterError> {
        let result = sqlx::query(
            r#"
            INSERT INTO accounts (external_account_id, name, created_at)
            VALUES (?, ?, ?)
            ON CONFLICT(external_account_id) DO NOTHING
            "#,
        )
        .bind(&account.external_account_id)
        .bind(&account.name)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 1 {
            return Ok(UpsertOutcome::Created(result.last_insert_rowid()));
        }
        let rec: (i64,) = sqlx::query_as("SELECT id FROM accounts WHERE external_account_id = ?")
            .bind(&account.external_account_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(UpsertOutcome::Existing(rec.0))
    }

    pub async fn institution_by_external_id(
        &self,
        external_institution_id: &str,
    ) -> Result<Option<DbInstitution>, BanterError> {
        let row = sqlx::query(
            r#"SELECT id, external_institution_id, name, created_at
               FROM institutions WHERE external_institution_id = ?"#,
        )
        .bind(external_institution_id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(Self::row_to_institution).transpose()
    }

    pub async fn account_by_external_id(
        &self,
        external_account_id: &str,
    ) -> Result<Option<DbAccount>, BanterError> {
        let row = sqlx::query(
            r#"SELECT id, external_account_id, name, created_at
               FROM accounts WHERE external_account_id = ?"#,
        )
        .bind(external_account_id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(Self::row_to_account).transpose()
    }

    pub async fn list_institutions(&self) -> Result<Vec<DbInstitution>, BanterError> {
        let rows = sqlx::query(
            r#"SELECT id, external_institution_id, name, created_at
               FROM institutions ORDER BY id"#,
        )
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(Self::row_to_institution).collect()
    }

    pub async fn list_accounts(&self) -> Result<Vec<DbAccount>, BanterError> {
        let rows = sqlx::query(
            r#"SELECT id, external_account_id, name, created_at
               FROM accounts ORDER BY id"#,
        )
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(Self::row_to_account).collect()
    }

    fn row_to_institution(row: SqliteRow) -> Result<DbInstitution, BanterError> {
        Ok(DbInstitution {
            id: row.try_get("id")?,
            external_institution_id: row.try_get("external_institution_id")?,
            name: row.try_get("name")?,
            created_at: parse_timestamp(row.try_get("created_at")?)?,
        })
    }

    fn row_to_account(row: SqliteRow) -> Result<DbAccount, BanterError> {
        Ok(DbAccount {
            id: row.try_get("id")?,
            external_account_id: row.try_get("external_account_id")?,
            name: row.try_get("name")?,
            created_at: parse_timestamp(row.try_get("created_at")?)?,
        })
    }
}

fn parse_timestamp(raw: String) -> Result<DateTime<Utc>, BanterError> {
    let parsed = DateTime::parse_from_rfc3339(&raw).map_err(|e| sqlx::Error::Decode(Box::new(e)))?;
    Ok(parsed.with_timezone(&Utc))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Single-connection in-memory database with the schema applied.
    pub(crate) async fn memory_storage() -> BanterStorage {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .expect("failed to open in-memory sqlite");
        let storage = BanterStorage::new(pool);
        storage.init_schema().await.expect("failed to init schema");
        storage
    }

    fn institution(id: &str, name: &str) -> NewInstitution {
        NewInstitution {
            external_institution_id: id.to_string(),
            name: name.to_string(),
        }
    }

    fn account(id: &str, name: &str) -> NewAccount {
        NewAccount {
            external_account_id: id.to_string(),
            name: name.to_string(),
        }
    }

    #[tokio::test]
    async fn institution_insert_is_idempotent() {
        let storage = memory_storage().await;

        let first = storage
            .insert_institution_if_absent(&institution("ins_3", "Chase"))
            .await
            .unwrap();
        let second = storage
            .insert_institution_if_absent(&institution("ins_3", "Chase"))
            .await
            .unwrap();

        assert!(first.is_created());
        assert_eq!(second, UpsertOutcome::Existing(first.id()));
        assert_eq!(storage.list_institutions().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn existing_institution_name_is_not_updated() {
        let storage = memory_storage().await;
        storage
            .insert_institution_if_absent(&institution("ins_3", "Chase"))
            .await
            .unwrap();
        storage
            .insert_institution_if_absent(&institution("ins_3", "JPMorgan Chase"))
            .await
            .unwrap();

        let stored = storage
            .institution_by_external_id("ins_3")
            .await
            .unwrap()
            .expect("institution should exist");
        assert_eq!(stored.name, "Chase");
    }

    #[tokio::test]
    async fn accounts_are_keyed_by_external_id() {
        let storage = memory_storage().await;
        storage
            .insert_account_if_absent(&account("acc_1", "Checking"))
            .await
            .unwrap();
        storage
            .insert_account_if_absent(&account("acc_2", "Savings"))
            .await
            .unwrap();
        let repeat = storage
            .insert_account_if_absent(&account("acc_1", "Checking"))
            .await
            .unwrap();

        assert!(!repeat.is_created());
        let accounts = storage.list_accounts().await.unwrap();
        let ids: Vec<_> = accounts
            .iter()
            .map(|a| a.external_account_id.as_str())
            .collect();
        assert_eq!(ids, ["acc_1", "acc_2"]);
    }

    #[tokio::test]
    async fn unknown_external_id_is_none() {
        let storage = memory_storage().await;
        assert!(storage.account_by_external_id("nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn drop_schema_removes_tables() {
        let storage = memory_storage().await;
        storage.drop_schema().await.unwrap();
        let err = storage.list_accounts().await.unwrap_err();
        assert!(matches!(err, BanterError::DatabaseError(_)));
    }
}
