use serde::Serialize;
use serde_json::Value;

use crate::{Authority, map_claims_to_authorities};

/// An authenticated caller, as seen by access-control decisions.
///
/// Built once per request from a verified token's claim map.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthenticatedPrincipal {
    pub subject: Option<String>,
    pub email: Option<String>,
    pub authorities: Vec<Authority>,
}

impl AuthenticatedPrincipal {
    pub fn from_claims(claims: &Value) -> Self {
        let text = |key: &str| claims.get(key).and_then(Value::as_str).map(str::to_string);

        Self {
            subject: text("sub"),
            email: text("email").or_else(|| text("preferred_username")),
            authorities: map_claims_to_authorities(claims),
        }
    }

    pub fn has_authority(&self, required: &Authority) -> bool {
        self.authorities.iter().any(|a| a == required)
    }
}
