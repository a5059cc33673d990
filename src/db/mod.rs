//! Database module: models and schema for the linked institutions and accounts.
//!
//! Layout:
//! - `models.rs`: Rust structs mirroring DB rows
//! - `schema.rs`: SQL DDL for creating and dropping the tables (SQLite-first)
//! - `sqlite.rs`: pool setup and create-if-absent storage operations

pub mod models;
pub mod schema;
pub mod sqlite;

pub use models::{DbAccount, DbInstitution, NewAccount, NewInstitution, UpsertOutcome};
pub use schema::{SQLITE_DROP, SQLITE_INIT};
pub use sqlite::{BanterStorage, SqlitePool, connect};
