//! Keycloak admin REST adapter.
//!
//! Admin calls authenticate with a token from the admin realm, cached until
//! shortly before it expires. All non-success responses become
//! [`DomainError::Upstream`] carrying the status and body.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, Response, StatusCode, Url};
use serde::Deserialize;
use serde_json::{Value as JsonValue, json};
use tokio::sync::Mutex;

use idsync_core::{DomainError, DomainResult, IdentityId};

use super::{IdentityProvider, IdentityRecord, NewIdentity};
use crate::config::{KeycloakConfig, normalize_base_url};

/// Refresh the admin token this long before it actually expires.
const EXPIRY_MARGIN: Duration = Duration::from_secs(10);

#[derive(Debug, Deserialize)]
struct RawTokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: u64,
}

#[derive(Debug, Clone)]
struct CachedToken {
    value: String,
    expires_at: Instant,
}

pub struct KeycloakAdminClient {
    config: KeycloakConfig,
    base: Url,
    http: reqwest::Client,
    admin_token: Mutex<Option<CachedToken>>,
}

impl std::fmt::Debug for KeycloakAdminClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeycloakAdminClient")
            .field("server_url", &self.base.as_str())
            .field("realm", &self.config.realm)
            .finish_non_exhaustive()
    }
}

impl KeycloakAdminClient {
    pub fn new(config: KeycloakConfig) -> DomainResult<Self> {
        Self::new_with_client(config, reqwest::Client::new())
    }

    pub fn new_with_client(config: KeycloakConfig, http: reqwest::Client) -> DomainResult<Self> {
        let base = Url::parse(&normalize_base_url(&config.server_url)).map_err(|e| {
            DomainError::validation(format!("invalid Keycloak server url: {e}"))
        })?;
        if base.cannot_be_a_base() {
            return Err(DomainError::validation("Keycloak server url cannot be a base"));
        }

        Ok(Self {
            config,
            base,
            http,
            admin_token: Mutex::new(None),
        })
    }

    /// `base` + the given path segments, each percent-encoded.
    fn url(&self, segments: &[&str]) -> Url {
        let mut url = self.base.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn admin_url(&self, tail: &[&str]) -> Url {
        let mut segments = vec!["admin", "realms", self.config.realm.as_str()];
        segments.extend_from_slice(tail);
        self.url(&segments)
    }

    fn token_url(&self, realm: &str) -> Url {
        self.url(&["realms", realm, "protocol", "openid-connect", "token"])
    }

    async fn admin_token(&self) -> DomainResult<String> {
        let mut cached = self.admin_token.lock().await;
        if let Some(token) = cached.as_ref() {
            if Instant::now() < token.expires_at {
                return Ok(token.value.clone());
            }
        }

        let mut form: Vec<(&str, &str)> = vec![("client_id", self.config.admin_client_id.as_str())];
        match (&self.config.admin_username, &self.config.admin_password) {
            (Some(username), Some(password)) => {
                form.push(("grant_type", "password"));
                form.push(("username", username.as_str()));
                form.push(("password", password.as_str()));
            }
            _ => form.push(("grant_type", "client_credentials")),
        }
        if let Some(secret) = &self.config.admin_client_secret {
            form.push(("client_secret", secret.as_str()));
        }

        let response = self
            .http
            .post(self.token_url(&self.config.admin_realm))
            .form(&form)
            .send()
            .await
            .map_err(|e| DomainError::upstream(format!("admin token request failed: {e}")))?;
        let response = ensure_success(response, "admin token").await?;

        let raw: RawTokenResponse = response
            .json()
            .await
            .map_err(|e| DomainError::upstream(format!("malformed admin token response: {e}")))?;

        let lifetime = Duration::from_secs(raw.expires_in).saturating_sub(EXPIRY_MARGIN);
        *cached = Some(CachedToken {
            value: raw.access_token.clone(),
            expires_at: Instant::now() + lifetime,
        });
        tracing::debug!(realm = %self.config.admin_realm, "admin token refreshed");

        Ok(raw.access_token)
    }

    async fn admin_request(&self, method: Method, url: Url) -> DomainResult<RequestBuilder> {
        let token = self.admin_token().await?;
        Ok(self.http.request(method, url).bearer_auth(token))
    }

    async fn send(&self, request: RequestBuilder, action: &str) -> DomainResult<Response> {
        let response = request
            .send()
            .await
            .map_err(|e| DomainError::upstream(format!("{action}: {e}")))?;
        ensure_success(response, action).await
    }

    async fn role_representation(&self, role: &str) -> DomainResult<JsonValue> {
        let request = self
            .admin_request(Method::GET, self.admin_url(&["roles", role]))
            .await?;
        let response = request
            .send()
            .await
            .map_err(|e| DomainError::upstream(format!("role lookup: {e}")))?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(DomainError::not_found(format!("realm role {role}")));
        }
        ensure_success(response, "role lookup")
            .await?
            .json()
            .await
            .map_err(|e| DomainError::upstream(format!("malformed role representation: {e}")))
    }

    async fn role_mapping(&self, method: Method, id: &IdentityId, role: &str) -> DomainResult<()> {
        let representation = self.role_representation(role).await?;
        let url = self.admin_url(&["users", id.as_str(), "role-mappings", "realm"]);
        let request = self.admin_request(method, url).await?.json(&[representation]);
        self.send(request, "realm role mapping").await?;
        Ok(())
    }
}

async fn ensure_success(response: Response, action: &str) -> DomainResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(DomainError::upstream(format!("{action} failed with {status}: {body}")))
}

/// The created resource id is the last path segment of `Location`.
fn id_from_location(response: &Response) -> Option<IdentityId> {
    let location = response.headers().get(reqwest::header::LOCATION)?.to_str().ok()?;
    let id = location.trim_end_matches('/').rsplit('/').next()?;
    (!id.is_empty()).then(|| IdentityId::new(id))
}

#[async_trait]
impl IdentityProvider for KeycloakAdminClient {
    async fn search_users(&self, query: &str, exact: bool) -> DomainResult<Vec<IdentityRecord>> {
        let mut url = self.admin_url(&["users"]);
        if exact {
            url.query_pairs_mut()
                .append_pair("username", query)
                .append_pair("exact", "true");
        } else {
            url.query_pairs_mut().append_pair("search", query);
        }

        let request = self.admin_request(Method::GET, url).await?;
        self.send(request, "user search")
            .await?
            .json()
            .await
            .map_err(|e| DomainError::upstream(format!("malformed user search response: {e}")))
    }

    async fn create_user(&self, user: &NewIdentity) -> DomainResult<IdentityId> {
        let body = json!({
            "username": user.email.as_str(),
            "email": user.email.as_str(),
            "firstName": user.first_name,
            "lastName": user.last_name,
            "enabled": true,
            "emailVerified": true,
            "credentials": [{
                "type": "password",
                "value": user.password,
                "temporary": false,
            }],
        });

        let request = self
            .admin_request(Method::POST, self.admin_url(&["users"]))
            .await?
            .json(&body);
        let response = request
            .send()
            .await
            .map_err(|e| DomainError::upstream(format!("user creation: {e}")))?;

        if response.status() != StatusCode::CREATED {
            let status = response.status();
            let detail = response.text().await.unwrap_or_default();
            return Err(DomainError::upstream(format!(
                "user creation failed with {status}: {detail}"
            )));
        }

        id_from_location(&response)
            .ok_or_else(|| DomainError::upstream("user created without a Location header"))
    }

    async fn update_user(&self, user: &IdentityRecord) -> DomainResult<()> {
        let request = self
            .admin_request(Method::PUT, self.admin_url(&["users", user.id.as_str()]))
            .await?
            .json(user);
        self.send(request, "user update").await?;
        Ok(())
    }

    async fn delete_user(&self, id: &IdentityId) -> DomainResult<()> {
        let request = self
            .admin_request(Method::DELETE, self.admin_url(&["users", id.as_str()]))
            .await?;
        self.send(request, "user deletion").await?;
        Ok(())
    }

    async fn realm_roles(&self, id: &IdentityId) -> DomainResult<Vec<String>> {
        #[derive(Deserialize)]
        struct RoleName {
            name: String,
        }

        let url = self.admin_url(&["users", id.as_str(), "role-mappings", "realm"]);
        let request = self.admin_request(Method::GET, url).await?;
        let roles: Vec<RoleName> = self
            .send(request, "realm role listing")
            .await?
            .json()
            .await
            .map_err(|e| DomainError::upstream(format!("malformed role listing: {e}")))?;
        Ok(roles.into_iter().map(|r| r.name).collect())
    }

    async fn add_realm_role(&self, id: &IdentityId, role: &str) -> DomainResult<()> {
        self.role_mapping(Method::POST, id, role).await
    }

    async fn remove_realm_role(&self, id: &IdentityId, role: &str) -> DomainResult<()> {
        self.role_mapping(Method::DELETE, id, role).await
    }

    async fn password_grant(&self, username: &str, password: &str) -> DomainResult<JsonValue> {
        let mut form = vec![
            ("grant_type", "password"),
            ("client_id", self.config.client_id.as_str()),
            ("username", username),
            ("password", password),
        ];
        if let Some(secret) = &self.config.client_secret {
            form.push(("client_secret", secret.as_str()));
        }

        let response = self
            .http
            .post(self.token_url(&self.config.realm))
            .form(&form)
            .send()
            .await
            .map_err(|e| DomainError::upstream(format!("token request failed: {e}")))?;

        if matches!(response.status(), StatusCode::BAD_REQUEST | StatusCode::UNAUTHORIZED) {
            return Err(DomainError::Unauthenticated);
        }
        ensure_success(response, "token request")
            .await?
            .json()
            .await
            .map_err(|e| DomainError::upstream(format!("malformed token response: {e}")))
    }
}
