//! `idsync-auth`: pure authentication/authorization boundary.
//!
//! This crate is intentionally decoupled from HTTP and storage: role policy,
//! token-claims mapping, the service-secret trust check and token verification
//! are all plain functions over plain data.

pub mod authority;
pub mod authorize;
pub mod claims;
pub mod principal;
pub mod roles;
pub mod token;
pub mod trust;

pub use authority::Authority;
pub use authorize::{AuthzError, require_authority};
pub use claims::map_claims_to_authorities;
pub use principal::AuthenticatedPrincipal;
pub use roles::{InvalidRole, Role};
pub use token::{JwtVerifier, TokenError, TokenVerifier};
pub use trust::{ADMIN_SYNC_PREFIX, GateDecision, SERVICE_SECRET_HEADER, TrustGate};
