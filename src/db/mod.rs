pub mod query;
pub mod repository;
pub mod sqlite;
pub mod store;

pub use query::*;
pub use sqlite::SqliteRecordStore;
pub use store::*;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// The remote store or its transport reported a failure.
    #[error("Query on {table} failed: {message}")]
    Query { table: String, message: String },

    #[error("Cannot decode {table} row: {reason}")]
    Decode { table: String, reason: String },

    #[error("Invalid enum value for {field}: {value}")]
    InvalidEnum { field: String, value: String },

    #[error("Invalid column name: {0}")]
    InvalidColumn(String),

    #[error("Migration failed at version {version}: {reason}")]
    MigrationFailed { version: i64, reason: String },

    #[error("Session provider failed: {0}")]
    Session(String),

    #[error("Store lock poisoned")]
    LockPoisoned,
}
