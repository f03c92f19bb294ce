use std::sync::Arc;

use axum::{
    Json,
    extract::Extension,
    http::StatusCode,
    response::IntoResponse,
};

use idsync_infra::saga::RegistrationRequest;

use crate::app::services::IdentityServices;
use crate::app::{dto, errors};
use crate::context::PrincipalContext;

pub async fn register(
    Extension(services): Extension<Arc<IdentityServices>>,
    Json(body): Json<dto::RegisterRequest>,
) -> axum::response::Response {
    register_with(&services, body.into()).await
}

/// Shared by public registration and the admin create route.
pub(crate) async fn register_with(
    services: &IdentityServices,
    request: RegistrationRequest,
) -> axum::response::Response {
    match services.registration.register(&request).await {
        Ok(id) => (StatusCode::CREATED, Json(dto::RegisteredResponse { id })).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

/// Password grant passthrough; the provider's token response is returned as-is.
pub async fn token(
    Extension(services): Extension<Arc<IdentityServices>>,
    Json(body): Json<dto::TokenRequest>,
) -> axum::response::Response {
    if body.email.trim().is_empty() || body.password.is_empty() {
        return errors::json_error(
            StatusCode::BAD_REQUEST,
            "validation_error",
            "email and password are required",
        );
    }

    match services.idp.password_grant(body.email.trim(), &body.password).await {
        Ok(token) => (StatusCode::OK, Json(token)).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn userinfo(Extension(principal): Extension<PrincipalContext>) -> impl IntoResponse {
    Json(serde_json::json!({
        "subject": principal.subject(),
        "email": principal.email(),
        "authorities": principal.authorities().iter().map(|a| a.as_str()).collect::<Vec<_>>(),
    }))
}
