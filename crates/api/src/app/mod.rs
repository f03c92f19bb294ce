//! HTTP application wiring (Axum routers + service wiring).
//!
//! - `services.rs`: builds the service graph from configuration
//! - `routes/`: handlers, one file per area
//! - `dto.rs`: request/response bodies
//! - `errors.rs`: consistent error responses

use std::sync::Arc;

use axum::{
    Extension, Router,
    routing::{get, post, put},
};
use tower::ServiceBuilder;

use crate::middleware;

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

pub use services::{IdentityServices, ProfileServices};

/// Identity service router.
///
/// The trust gate wraps every route so admin sync calls are refused before
/// any handler or bearer check runs.
pub fn build_identity_app(services: IdentityServices) -> Router {
    let auth_state = middleware::AuthState {
        verifier: services.verifier.clone(),
    };
    let trust_gate = services.trust_gate.clone();
    let services = Arc::new(services);

    let public = Router::new()
        .route("/health", get(routes::system::health))
        .route("/api/auth/register", post(routes::auth::register))
        .route("/api/auth/token", post(routes::auth::token));

    let sync = Router::new().route(
        "/api/auth/admin/users/by-email/:email",
        put(routes::sync::update_by_email).delete(routes::sync::delete_by_email),
    );

    let protected = Router::new()
        .route("/api/auth/userinfo", get(routes::auth::userinfo))
        .route("/api/auth/admin/users", post(routes::sync::create_user))
        .layer(axum::middleware::from_fn_with_state(
            auth_state,
            middleware::auth_middleware,
        ));

    Router::new()
        .merge(public)
        .merge(sync)
        .merge(protected)
        .layer(Extension(services))
        .layer(
            ServiceBuilder::new().layer(axum::middleware::from_fn_with_state(
                trust_gate,
                middleware::trust_gate_middleware,
            )),
        )
}

/// Profile service router.
pub fn build_profile_app(services: ProfileServices) -> Router {
    Router::new()
        .route("/health", get(routes::system::health))
        .nest("/api/users", routes::users::router())
        .layer(Extension(Arc::new(services)))
}
