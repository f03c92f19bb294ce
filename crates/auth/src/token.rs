//! Bearer token verification.
//!
//! Signature and expiry checks happen here; the verified claim map is handed
//! to [`crate::map_claims_to_authorities`] untouched.

use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode, errors::ErrorKind};
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("token has expired")]
    Expired,

    #[error("invalid token: {0}")]
    Invalid(String),

    #[error("verification key rejected: {0}")]
    BadKey(String),
}

/// Verifies a bearer token and returns its claim map.
pub trait TokenVerifier: Send + Sync {
    fn verify(&self, token: &str) -> Result<Value, TokenError>;
}

pub struct JwtVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl JwtVerifier {
    /// Shared-secret (HS256) verification.
    pub fn hs256(secret: &[u8]) -> Self {
        Self::with_key(DecodingKey::from_secret(secret), Algorithm::HS256)
    }

    /// Public-key (RS256) verification, e.g. the realm key published by the provider.
    pub fn rs256_pem(pem: &[u8]) -> Result<Self, TokenError> {
        let key = DecodingKey::from_rsa_pem(pem).map_err(|e| TokenError::BadKey(e.to_string()))?;
        Ok(Self::with_key(key, Algorithm::RS256))
    }

    pub fn with_issuer(mut self, issuer: &str) -> Self {
        self.validation.set_issuer(&[issuer]);
        self
    }

    fn with_key(key: DecodingKey, algorithm: Algorithm) -> Self {
        let mut validation = Validation::new(algorithm);
        // Provider tokens carry audiences like "account"; access is decided on roles.
        validation.validate_aud = false;
        Self { key, validation }
    }
}

impl TokenVerifier for JwtVerifier {
    fn verify(&self, token: &str) -> Result<Value, TokenError> {
        decode::<Value>(token, &self.key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| {
                tracing::debug!(error = %e, "bearer token rejected");
                match e.kind() {
                    ErrorKind::ExpiredSignature => TokenError::Expired,
                    _ => TokenError::Invalid(e.to_string()),
                }
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{EncodingKey, Header, encode, get_current_timestamp};
    use serde_json::json;

    fn mint(secret: &[u8], claims: &Value) -> String {
        encode(&Header::new(Algorithm::HS256), claims, &EncodingKey::from_secret(secret)).unwrap()
    }

    #[test]
    fn returns_claims_of_a_valid_token() {
        let claims = json!({
            "sub": "abc",
            "aud": "account",
            "exp": get_current_timestamp() + 600,
            "realm_access": { "roles": ["client"] }
        });
        let token = mint(b"k", &claims);

        let verified = JwtVerifier::hs256(b"k").verify(&token).unwrap();
        assert_eq!(verified["realm_access"]["roles"][0], "client");
    }

    #[test]
    fn rejects_wrong_key_and_expired_tokens() {
        let live = mint(b"k", &json!({ "exp": get_current_timestamp() + 600 }));
        assert!(matches!(JwtVerifier::hs256(b"other").verify(&live), Err(TokenError::Invalid(_))));

        let stale = mint(b"k", &json!({ "exp": get_current_timestamp() - 3600 }));
        assert_eq!(JwtVerifier::hs256(b"k").verify(&stale), Err(TokenError::Expired));
    }

    #[test]
    fn enforces_issuer_when_configured() {
        let token = mint(
            b"k",
            &json!({ "exp": get_current_timestamp() + 600, "iss": "http://idp/realms/other" }),
        );
        let verifier = JwtVerifier::hs256(b"k").with_issuer("http://idp/realms/app");
        assert!(matches!(verifier.verify(&token), Err(TokenError::Invalid(_))));
    }

    #[test]
    fn rejects_garbage_pem() {
        assert!(matches!(JwtVerifier::rs256_pem(b"nope"), Err(TokenError::BadKey(_))));
    }
}
