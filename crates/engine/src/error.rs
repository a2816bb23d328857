//! The module contains the error the engine can throw.
//!
//! The errors are:
//!
//! - [`InvalidInput`] thrown when a request is missing or carries malformed
//!   fields (blank names, non-positive amounts, inverted date ranges, ...).
//! - [`KeyNotFound`] thrown when an item are not found.
//! - [`ExistingKey`] thrown when a unique key (account number, external id)
//!   is already taken.
//! - [`InvalidTransition`] thrown when a status change is not allowed by the
//!   movement or goal state tables.
//!
//!  [`InvalidInput`]: EngineError::InvalidInput
//!  [`KeyNotFound`]: EngineError::KeyNotFound
//!  [`ExistingKey`]: EngineError::ExistingKey
//!  [`InvalidTransition`]: EngineError::InvalidTransition
use sea_orm::{DbErr, SqlErr};
use thiserror::Error;

/// Engine custom errors.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("\"{0}\" key not found!")]
    KeyNotFound(String),
    #[error("\"{0}\" already present!")]
    ExistingKey(String),
    #[error("Invalid transition: {0}")]
    InvalidTransition(String),
    #[error(transparent)]
    Database(#[from] DbErr),
}

impl EngineError {
    /// Storage-level constraint violations (unique or foreign key).
    pub(crate) fn is_integrity_violation(&self) -> bool {
        match self {
            Self::Database(err) => matches!(
                err.sql_err(),
                Some(SqlErr::UniqueConstraintViolation(_))
                    | Some(SqlErr::ForeignKeyConstraintViolation(_))
            ),
            _ => false,
        }
    }
}

impl PartialEq for EngineError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::InvalidInput(a), Self::InvalidInput(b)) => a == b,
            (Self::KeyNotFound(a), Self::KeyNotFound(b)) => a == b,
            (Self::ExistingKey(a), Self::ExistingKey(b)) => a == b,
            (Self::InvalidTransition(a), Self::InvalidTransition(b)) => a == b,
            (Self::Database(a), Self::Database(b)) => a.to_string() == b.to_string(),
            _ => false,
        }
    }
}
