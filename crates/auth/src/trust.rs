//! Shared-secret trust check for internal synchronization calls.

use crate::AuthzError;

/// Header carrying the shared secret on service-to-service calls.
pub const SERVICE_SECRET_HEADER: &str = "X-Service-Secret";

/// Path prefix of the administrative synchronization endpoints.
pub const ADMIN_SYNC_PREFIX: &str = "/api/auth/admin/";

/// Outcome of a successful gate check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    /// Path is outside the guarded prefix; normal authentication applies.
    Bypass,
    /// Path is guarded and the caller presented the configured secret.
    Admitted,
}

/// Gate in front of the administrative synchronization prefix.
///
/// A blank configured secret never means "no check": every guarded request is
/// refused until a secret is configured.
#[derive(Clone)]
pub struct TrustGate {
    secret: Option<String>,
    prefix: String,
}

impl TrustGate {
    pub fn new(secret: &str) -> Self {
        let secret = (!secret.trim().is_empty()).then(|| secret.to_string());
        Self {
            secret,
            prefix: ADMIN_SYNC_PREFIX.to_string(),
        }
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    pub fn is_configured(&self) -> bool {
        self.secret.is_some()
    }

    pub fn guards(&self, path: &str) -> bool {
        path.starts_with(&self.prefix)
    }

    /// Check a request path and the raw header value it carried (if any).
    ///
    /// Comparison is byte-for-byte; no trimming or case-folding.
    pub fn check(&self, path: &str, presented: Option<&[u8]>) -> Result<GateDecision, AuthzError> {
        if !self.guards(path) {
            return Ok(GateDecision::Bypass);
        }

        let Some(secret) = self.secret.as_deref() else {
            return Err(AuthzError::ServiceSecretNotConfigured);
        };

        match presented {
            Some(value) if value == secret.as_bytes() => Ok(GateDecision::Admitted),
            _ => Err(AuthzError::UntrustedCaller),
        }
    }
}

impl core::fmt::Debug for TrustGate {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("TrustGate")
            .field("configured", &self.is_configured())
            .field("prefix", &self.prefix)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SYNC_PATH: &str = "/api/auth/admin/users/by-email/a%40b.io";

    #[test]
    fn paths_outside_the_prefix_bypass() {
        let gate = TrustGate::new("");
        assert_eq!(gate.check("/api/auth/register", None), Ok(GateDecision::Bypass));
        assert_eq!(gate.check("/api/auth/admin", None), Ok(GateDecision::Bypass));
    }

    #[test]
    fn matching_secret_is_admitted() {
        let gate = TrustGate::new("s3cret");
        assert_eq!(gate.check(SYNC_PATH, Some(b"s3cret")), Ok(GateDecision::Admitted));
    }

    #[test]
    fn missing_or_wrong_secret_is_rejected() {
        let gate = TrustGate::new("s3cret");
        assert_eq!(gate.check(SYNC_PATH, None), Err(AuthzError::UntrustedCaller));
        assert_eq!(gate.check(SYNC_PATH, Some(b"S3CRET")), Err(AuthzError::UntrustedCaller));
        assert_eq!(gate.check(SYNC_PATH, Some(b"s3cret ")), Err(AuthzError::UntrustedCaller));
        assert_eq!(gate.check(SYNC_PATH, Some(b"")), Err(AuthzError::UntrustedCaller));
    }

    #[test]
    fn blank_server_secret_fails_closed() {
        for configured in ["", "   "] {
            let gate = TrustGate::new(configured);
            assert!(!gate.is_configured());
            assert_eq!(
                gate.check(SYNC_PATH, Some(configured.as_bytes())),
                Err(AuthzError::ServiceSecretNotConfigured)
            );
            assert_eq!(gate.check(SYNC_PATH, None), Err(AuthzError::ServiceSecretNotConfigured));
        }
    }

    #[test]
    fn debug_output_hides_the_secret() {
        let gate = TrustGate::new("do-not-print");
        assert!(!format!("{gate:?}").contains("do-not-print"));
    }
}
