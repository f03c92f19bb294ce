use idsync_auth::{AuthenticatedPrincipal, Authority};

/// Principal context for a request (verified token subject + authorities).
///
/// Inserted by the auth middleware; absent on public routes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrincipalContext {
    principal: AuthenticatedPrincipal,
}

impl PrincipalContext {
    pub fn new(principal: AuthenticatedPrincipal) -> Self {
        Self { principal }
    }

    pub fn subject(&self) -> Option<&str> {
        self.principal.subject.as_deref()
    }

    pub fn email(&self) -> Option<&str> {
        self.principal.email.as_deref()
    }

    pub fn authorities(&self) -> &[Authority] {
        &self.principal.authorities
    }

    pub fn principal(&self) -> &AuthenticatedPrincipal {
        &self.principal
    }
}
