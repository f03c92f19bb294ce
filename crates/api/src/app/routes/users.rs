use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};

use idsync_core::{DomainResult, ProfileId};
use idsync_infra::profile::ProfileRecord;

use crate::app::services::ProfileServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_users).post(create_user))
        .route("/email/:email", get(get_user_by_email))
        .route("/:id", get(get_user).put(update_user).delete(delete_user))
}

fn respond(status: StatusCode, result: DomainResult<ProfileRecord>) -> axum::response::Response {
    match result {
        Ok(record) => (status, Json(dto::ProfileView::from(record))).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn list_users(
    Extension(services): Extension<Arc<ProfileServices>>,
) -> axum::response::Response {
    match services.profiles.find_all().await {
        Ok(records) => {
            let items = records.into_iter().map(dto::ProfileView::from).collect::<Vec<_>>();
            (StatusCode::OK, Json(items)).into_response()
        }
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn get_user(
    Extension(services): Extension<Arc<ProfileServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match id.parse::<ProfileId>() {
        Ok(id) => id,
        Err(e) => return errors::domain_error_to_response(e),
    };
    respond(StatusCode::OK, services.profiles.find_by_id(id).await)
}

pub async fn get_user_by_email(
    Extension(services): Extension<Arc<ProfileServices>>,
    Path(email): Path<String>,
) -> axum::response::Response {
    respond(StatusCode::OK, services.profiles.find_by_email(&email).await)
}

pub async fn create_user(
    Extension(services): Extension<Arc<ProfileServices>>,
    Json(body): Json<dto::CreateUserRequest>,
) -> axum::response::Response {
    let command = match body.into_command() {
        Ok(c) => c,
        Err(e) => return errors::domain_error_to_response(e),
    };
    respond(StatusCode::CREATED, services.profiles.create(command).await)
}

pub async fn update_user(
    Extension(services): Extension<Arc<ProfileServices>>,
    Path(id): Path<String>,
    Json(body): Json<dto::UpdateUserRequest>,
) -> axum::response::Response {
    let id = match id.parse::<ProfileId>() {
        Ok(id) => id,
        Err(e) => return errors::domain_error_to_response(e),
    };
    let update = match body.into_command() {
        Ok(u) => u,
        Err(e) => return errors::domain_error_to_response(e),
    };
    respond(StatusCode::OK, services.profiles.update(id, update).await)
}

pub async fn delete_user(
    Extension(services): Extension<Arc<ProfileServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match id.parse::<ProfileId>() {
        Ok(id) => id,
        Err(e) => return errors::domain_error_to_response(e),
    };
    match services.profiles.delete(id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}
