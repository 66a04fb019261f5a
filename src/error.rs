use std::{error::Error, fmt::Debug};

/// Failures raised by a `LedgerRepository` backend.
#[derive(thiserror::Error)]
pub enum StorageError {
    #[error("Email already registered")]
    DuplicateEmail,

    #[error("Database error")]
    Database(#[from] sqlx::Error),

    #[error("Corrupt record: {0}")]
    Corrupt(String),

    #[error("Quantity overflow on {0}")]
    Overflow(String),
}

/// Outcome of a rejected ledger operation. The `&'static str` payloads are the
/// stable messages from `constants`; callers match on them verbatim.
#[derive(thiserror::Error)]
pub enum LedgerError {
    #[error("{0}")]
    Validation(&'static str),

    #[error("{0}")]
    Conflict(&'static str),

    #[error("{0}")]
    NotFound(&'static str),

    #[error("{0}")]
    InsufficientBalance(&'static str),

    #[error("{0}")]
    Storage(&'static str, #[source] StorageError),
}

impl LedgerError {
    pub fn message(&self) -> &'static str {
        match *self {
            LedgerError::Validation(message)
            | LedgerError::Conflict(message)
            | LedgerError::NotFound(message)
            | LedgerError::InsufficientBalance(message)
            | LedgerError::Storage(message, _) => message,
        }
    }
}

#[derive(thiserror::Error)]
pub enum ConfigError {
    #[error("ENV '{0}' Not Found")]
    EnvError(String, #[source] std::env::VarError),

    #[error("ENV '{0}' has invalid value '{1}'")]
    InvalidValue(String, String),
}

fn write_with_source(f: &mut std::fmt::Formatter<'_>, error: &dyn Error) -> std::fmt::Result {
    write!(f, "{}", error)?;
    if let Some(source) = error.source() {
        write!(f, " (Caused by: {})", source)?;
    }
    Ok(())
}

impl Debug for StorageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write_with_source(f, self)
    }
}

impl Debug for LedgerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write_with_source(f, self)
    }
}

impl Debug for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write_with_source(f, self)
    }
}
