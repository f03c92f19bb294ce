//! API-side authorization guard for privileged routes.
//!
//! Runs in the handler before any service call, keeping the services
//! themselves auth-agnostic.

use axum::http::StatusCode;
use axum::response::Response;

use idsync_auth::{Authority, Role, require_authority};

use crate::app::errors::json_error;
use crate::context::PrincipalContext;

/// Require the authority derived from `role` (e.g. `ROLE_ADMIN`).
pub fn require_role(principal: &PrincipalContext, role: Role) -> Result<(), Response> {
    require_authority(principal.principal(), &Authority::from(role)).map_err(|err| {
        tracing::debug!(subject = ?principal.subject(), reason = %err, "authority check failed");
        json_error(StatusCode::FORBIDDEN, "forbidden", "Access denied")
    })
}
