//! Errors raised while reaching or preparing the account/message store

use sqlx::Error as SqlxError;
use sqlx::migrate::MigrateError;
use thiserror::Error;

/// Failure of the shared PostgreSQL store
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// The pool could not be opened
    #[error("store unreachable: {0}")]
    Connection(#[source] SqlxError),

    /// A statement failed on an open pool
    #[error("store query failed: {0}")]
    Query(#[source] SqlxError),

    /// The embedded schema could not be applied
    #[error("schema migration failed: {0}")]
    Migration(#[from] MigrateError),

    /// `DATABASE_*` settings are missing or inconsistent
    #[error("invalid store configuration: {0}")]
    Configuration(String),
}

pub type DatabaseResult<T> = Result<T, DatabaseError>;
