//! The module contains the errors the engine can report.
//!
//! The errors are:
//!
//! - [`Validation`] raised by [`EntryDraft::new`] before any request is issued.
//! - [`SourceError`] raised when a [`LedgerSource`] operation fails. It is
//!   never wrapped: the session records it on the view it was meant for.
//!
//!  [`Validation`]: EngineError::Validation
//!  [`EntryDraft::new`]: super::EntryDraft::new
//!  [`LedgerSource`]: super::LedgerSource
use thiserror::Error;

/// Engine custom errors.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

/// Malformed user input, rejected locally.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Amount is required")]
    EmptyAmount,
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
    #[error("Amount can have at most 2 decimals")]
    TooManyDecimals,
    #[error("Amount must be greater than zero")]
    NonPositiveAmount,
    #[error("Description is required")]
    MissingDescription,
}

/// Failure of a collaborator operation.
///
/// The collaborator does not guarantee a structured taxonomy, so this only
/// separates "never got an answer" from "got a non-success answer".
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SourceError {
    #[error("server unreachable: {0}")]
    Transport(String),
    #[error("server error ({status}): {message}")]
    Status { status: u16, message: String },
    #[error("unexpected response: {0}")]
    Decode(String),
}
