//! Error type shared by the directory services

/// Failure modes of the content, business and moderation services.
///
/// `Forbidden` and `Conflict` are business-rule refusals the web layer turns
/// into flash messages; the rest map onto HTTP status codes.
#[derive(Debug, thiserror::Error)]
pub enum DirectoryError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("{0} not found")]
    NotFound(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl DirectoryError {
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }
}

pub type DirectoryResult<T> = Result<T, DirectoryError>;
