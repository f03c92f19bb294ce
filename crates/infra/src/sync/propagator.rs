use async_trait::async_trait;
use reqwest::{Method, Url};

use idsync_auth::SERVICE_SECRET_HEADER;
use idsync_core::{DomainError, DomainResult};

use super::{ProfileSync, SyncUpdate};
use crate::config::SyncConfig;

#[derive(Clone)]
struct Target {
    base: Url,
    secret: String,
}

/// Forwards profile updates and deletions to the identity service's admin
/// sync endpoints, authenticated with the shared service secret.
///
/// Every call is a single attempt. Failures are logged and dropped.
#[derive(Clone)]
pub struct HttpSyncPropagator {
    http: reqwest::Client,
    target: Option<Target>,
}

impl std::fmt::Debug for HttpSyncPropagator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpSyncPropagator")
            .field("base_url", &self.target.as_ref().map(|t| t.base.as_str()))
            .finish_non_exhaustive()
    }
}

impl HttpSyncPropagator {
    pub fn new(config: &SyncConfig) -> DomainResult<Self> {
        Self::new_with_client(config, reqwest::Client::new())
    }

    pub fn new_with_client(config: &SyncConfig, http: reqwest::Client) -> DomainResult<Self> {
        let target = match (&config.base_url, &config.service_secret) {
            (Some(base), Some(secret)) => {
                let base = Url::parse(base)
                    .map_err(|e| DomainError::validation(format!("invalid sync base url: {e}")))?;
                if base.cannot_be_a_base() {
                    return Err(DomainError::validation("sync base url cannot be a base"));
                }
                Some(Target {
                    base,
                    secret: secret.clone(),
                })
            }
            _ => None,
        };
        Ok(Self { http, target })
    }

    pub fn is_configured(&self) -> bool {
        self.target.is_some()
    }

    fn endpoint(base: &Url, email: &str) -> Url {
        let mut url = base.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty()
                .extend(["api", "auth", "admin", "users", "by-email", email]);
        }
        url
    }

    async fn call(
        &self,
        target: &Target,
        method: Method,
        email: &str,
        body: Option<&SyncUpdate>,
    ) -> Result<(), String> {
        let mut request = self
            .http
            .request(method, Self::endpoint(&target.base, email))
            .header(SERVICE_SECRET_HEADER, &target.secret);
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await.map_err(|e| e.to_string())?;
        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(format!("identity service answered {status}"))
        }
    }
}

#[async_trait]
impl ProfileSync for HttpSyncPropagator {
    async fn propagate_update(&self, old_email: &str, update: &SyncUpdate) {
        let old_email = old_email.trim();
        let Some(target) = &self.target else { return };
        if old_email.is_empty() {
            return;
        }

        match self
            .call(target, Method::PUT, old_email, Some(&update.to_wire()))
            .await
        {
            Ok(()) => tracing::info!(email = %old_email, "synced profile update to identity provider"),
            Err(reason) => tracing::warn!(
                email = %old_email,
                %reason,
                "profile update sync failed; identity provider may be stale"
            ),
        }
    }

    async fn propagate_delete(&self, email: &str) {
        let email = email.trim();
        let Some(target) = &self.target else { return };
        if email.is_empty() {
            return;
        }

        match self.call(target, Method::DELETE, email, None).await {
            Ok(()) => tracing::info!(%email, "synced profile deletion to identity provider"),
            Err(reason) => tracing::warn!(
                %email,
                %reason,
                "profile deletion sync failed; identity provider may be stale"
            ),
        }
    }
}
