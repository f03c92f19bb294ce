use std::sync::Arc;

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::Response,
};

use idsync_auth::{AuthenticatedPrincipal, GateDecision, SERVICE_SECRET_HEADER, TokenVerifier, TrustGate};

use crate::app::errors::json_error;
use crate::context::PrincipalContext;

#[derive(Clone)]
pub struct AuthState {
    /// `None` when no verification key is configured: every protected route is refused.
    pub verifier: Option<Arc<dyn TokenVerifier>>,
}

pub async fn auth_middleware(
    State(state): State<AuthState>,
    mut req: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Result<Response, Response> {
    let unauthenticated = || {
        json_error(
            StatusCode::UNAUTHORIZED,
            "unauthenticated",
            "Authentication required",
        )
    };

    let verifier = state.verifier.as_ref().ok_or_else(unauthenticated)?;
    let token = extract_bearer(req.headers()).ok_or_else(unauthenticated)?;

    let claims = verifier.verify(token).map_err(|e| {
        tracing::debug!(reason = %e, "bearer token rejected");
        unauthenticated()
    })?;

    req.extensions_mut()
        .insert(PrincipalContext::new(AuthenticatedPrincipal::from_claims(&claims)));

    Ok(next.run(req).await)
}

/// Shared-secret gate for the administrative sync prefix.
///
/// Requests outside the prefix pass straight through. Rejections log the
/// reason but answer with the same generic 403.
pub async fn trust_gate_middleware(
    State(gate): State<Arc<TrustGate>>,
    req: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Result<Response, Response> {
    let presented = req
        .headers()
        .get(SERVICE_SECRET_HEADER)
        .map(|v| v.as_bytes());

    match gate.check(req.uri().path(), presented) {
        Ok(GateDecision::Bypass) | Ok(GateDecision::Admitted) => Ok(next.run(req).await),
        Err(err) => {
            tracing::warn!(path = %req.uri().path(), reason = %err, "trust gate rejected request");
            Err(json_error(StatusCode::FORBIDDEN, "forbidden", "Access denied"))
        }
    }
}

fn extract_bearer(headers: &HeaderMap) -> Option<&str> {
    let header = headers.get(axum::http::header::AUTHORIZATION)?;
    let token = header.to_str().ok()?.strip_prefix("Bearer ")?.trim();
    (!token.is_empty()).then_some(token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn bearer_extraction_requires_scheme_and_token() {
        let mut headers = HeaderMap::new();
        assert_eq!(extract_bearer(&headers), None);

        headers.insert(axum::http::header::AUTHORIZATION, HeaderValue::from_static("Basic abc"));
        assert_eq!(extract_bearer(&headers), None);

        headers.insert(axum::http::header::AUTHORIZATION, HeaderValue::from_static("Bearer   "));
        assert_eq!(extract_bearer(&headers), None);

        headers.insert(axum::http::header::AUTHORIZATION, HeaderValue::from_static("Bearer t0k"));
        assert_eq!(extract_bearer(&headers), Some("t0k"));
    }
}
