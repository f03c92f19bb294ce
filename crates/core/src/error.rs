//! Domain error model.

use thiserror::Error;

/// Result type used across the domain and service layers.
pub type DomainResult<T> = Result<T, DomainError>;

/// Error taxonomy shared by both services.
///
/// None of these variants is retried anywhere in the core; callers decide
/// whether a failure is surfaced (registration path) or only logged
/// (propagation path).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Bad or missing input (role, email). No store was touched.
    #[error("validation failed: {0}")]
    Validation(String),

    /// Duplicate email in either store.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Lookup by id or email missed.
    #[error("not found: {0}")]
    NotFound(String),

    /// The identity provider (or a peer service) was unreachable or rejected the call.
    #[error("upstream failure: {0}")]
    Upstream(String),

    /// Missing, invalid or expired credentials.
    #[error("unauthenticated")]
    Unauthenticated,

    /// Caller is authenticated but not allowed (insufficient role, trust gate).
    #[error("forbidden")]
    Forbidden,

    /// Local persistence failed.
    #[error("storage failure: {0}")]
    Storage(String),
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn upstream(msg: impl Into<String>) -> Self {
        Self::Upstream(msg.into())
    }

    pub fn storage(msg: impl Into<String>) -> Self {
        Self::Storage(msg.into())
    }

    /// Stable machine-readable code, used in JSON error bodies.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation_error",
            Self::Conflict(_) => "conflict",
            Self::NotFound(_) => "not_found",
            Self::Upstream(_) => "upstream_error",
            Self::Unauthenticated => "unauthenticated",
            Self::Forbidden => "forbidden",
            Self::Storage(_) => "storage_error",
        }
    }
}
