use thiserror::Error;

use idsync_core::DomainError;

use crate::{AuthenticatedPrincipal, Authority};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthzError {
    #[error("forbidden: missing authority '{0}'")]
    MissingAuthority(String),

    /// The receiving service has no shared secret; every gated call is refused.
    #[error("service secret not configured")]
    ServiceSecretNotConfigured,

    #[error("invalid or missing service secret")]
    UntrustedCaller,
}

impl From<AuthzError> for DomainError {
    fn from(_: AuthzError) -> Self {
        DomainError::Forbidden
    }
}

/// Require an exact authority on an authenticated principal.
///
/// - No IO
/// - No panics
pub fn require_authority(
    principal: &AuthenticatedPrincipal,
    required: &Authority,
) -> Result<(), AuthzError> {
    if principal.has_authority(required) {
        Ok(())
    } else {
        Err(AuthzError::MissingAuthority(required.as_str().to_string()))
    }
}
