//! Error types for the survey dialog domain

use thiserror::Error;
use uuid::Uuid;

/// Errors raised by the survey dialog domain
#[derive(Debug, Error)]
pub enum DomainError {
    /// No handler is registered under the given key
    #[error("no handler registered for `{0}`")]
    HandlerNotRegistered(String),

    /// A persisted handler reference could not be decoded
    #[error("invalid handler reference `{0}`")]
    InvalidHandlerRef(String),

    /// The requested question does not exist
    #[error("question not found: {0}")]
    QuestionNotFound(Uuid),

    /// A domain rule was violated
    #[error("validation error: {0}")]
    Validation(String),

    /// The storage collaborator failed
    #[error("storage error: {0}")]
    Storage(String),
}

/// Result alias for domain operations
pub type DomainResult<T> = Result<T, DomainError>;
