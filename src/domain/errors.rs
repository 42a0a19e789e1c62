use thiserror::Error;

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("{0} not found")]
    NotFound(String),
    #[error("Invalid input: {0}")]
    Validation(String),
    #[error("Authentication credentials were not provided")]
    AuthenticationRequired,
    #[error("You do not have permission to perform this action")]
    PermissionDenied,
    /// Write rejected because other records still depend on the target.
    #[error("{0}")]
    Conflict(String),
    /// Delete rejected because the target is part of a financial record.
    #[error("{0}")]
    Protected(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl DomainError {
    pub fn not_found(what: impl Into<String>) -> Self {
        DomainError::NotFound(what.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        DomainError::Validation(msg.into())
    }
}
