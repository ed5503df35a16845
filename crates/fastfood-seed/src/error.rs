//! Error types for seeding.

use thiserror::Error;

use fastfood_core::OpsError;

pub type SeedResult<T> = Result<T, SeedError>;

#[derive(Debug, Error)]
pub enum SeedError {
    #[error("database error: {0}")]
    Database(String),

    #[error("password hashing failed: {0}")]
    Hash(String),

    #[error("corrupt record: {0}")]
    Corrupt(String),
}

impl From<sqlx::Error> for SeedError {
    fn from(e: sqlx::Error) -> Self {
        SeedError::Database(e.to_string())
    }
}

impl From<SeedError> for OpsError {
    fn from(e: SeedError) -> Self {
        OpsError::Seed(e.to_string())
    }
}
