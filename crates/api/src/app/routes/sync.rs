//! Admin routes behind the trust gate: sync-by-email and admin user creation.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
};

use idsync_auth::Role;
use idsync_infra::sync::SyncUpdate;

use crate::app::routes::auth::register_with;
use crate::app::services::IdentityServices;
use crate::app::{dto, errors};
use crate::authz::require_role;
use crate::context::PrincipalContext;

pub async fn update_by_email(
    Extension(services): Extension<Arc<IdentityServices>>,
    Path(email): Path<String>,
    Json(body): Json<SyncUpdate>,
) -> axum::response::Response {
    match services.sync.update_by_email(&email, &body).await {
        Ok(_) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn delete_by_email(
    Extension(services): Extension<Arc<IdentityServices>>,
    Path(email): Path<String>,
) -> axum::response::Response {
    match services.sync.delete_by_email(&email).await {
        Ok(_) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn create_user(
    Extension(services): Extension<Arc<IdentityServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Json(body): Json<dto::RegisterRequest>,
) -> axum::response::Response {
    if let Err(denied) = require_role(&principal, Role::Admin) {
        return denied;
    }
    register_with(&services, body.into()).await
}
