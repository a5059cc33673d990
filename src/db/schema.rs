//! SQL DDL for the linked-item storage.

/// SQLite schema with:
/// - `id` INTEGER PRIMARY KEY AUTOINCREMENT
/// - external ids assigned by Plaid, UNIQUE so inserts can skip known rows
/// - `created_at` as RFC3339 text
pub const SQLITE_INIT: &str = r#"
CREATE TABLE IF NOT EXISTS institutions (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    external_institution_id TEXT NOT NULL UNIQUE,
    name TEXT NOT NULL,
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS accounts (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    external_account_id TEXT NOT NULL UNIQUE,
    name TEXT NOT NULL,
    created_at TEXT NOT NULL
);
"#;

pub const SQLITE_DROP: &str = r#"
DROP TABLE IF EXISTS accounts;
DROP TABLE IF EXISTS institutions;
"#;
