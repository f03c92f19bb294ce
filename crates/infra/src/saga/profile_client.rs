use async_trait::async_trait;
use reqwest::Url;
use serde::Serialize;

use idsync_core::{DomainError, DomainResult};

use super::{ProfileProvisioner, ProvisionRequest};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateUserBody<'a> {
    email: &'a str,
    password: &'a str,
    first_name: Option<&'a str>,
    last_name: Option<&'a str>,
    role: &'a str,
}

/// Provisions profiles through the profile service's `POST /api/users`.
#[derive(Debug, Clone)]
pub struct ProfileServiceClient {
    http: reqwest::Client,
    users_url: Url,
}

impl ProfileServiceClient {
    pub fn new(base_url: &str) -> DomainResult<Self> {
        Self::new_with_client(base_url, reqwest::Client::new())
    }

    pub fn new_with_client(base_url: &str, http: reqwest::Client) -> DomainResult<Self> {
        let mut users_url = Url::parse(base_url)
            .map_err(|e| DomainError::validation(format!("invalid profile service url: {e}")))?;
        users_url
            .path_segments_mut()
            .map_err(|_| DomainError::validation("profile service url cannot be a base"))?
            .pop_if_empty()
            .extend(["api", "users"]);
        Ok(Self { http, users_url })
    }
}

#[async_trait]
impl ProfileProvisioner for ProfileServiceClient {
    async fn provision(&self, request: &ProvisionRequest) -> DomainResult<()> {
        let body = CreateUserBody {
            email: request.email.as_str(),
            password: &request.password,
            first_name: request.first_name.as_deref(),
            last_name: request.last_name.as_deref(),
            role: request.role.as_str(),
        };

        let response = self
            .http
            .post(self.users_url.clone())
            .json(&body)
            .send()
            .await
            .map_err(|e| DomainError::upstream(format!("profile service unreachable: {e}")))?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        let detail = response.text().await.unwrap_or_default();
        Err(DomainError::upstream(format!(
            "profile service answered {status}: {detail}"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use idsync_auth::Role;
    use idsync_core::Email;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn provision_request() -> ProvisionRequest {
        ProvisionRequest {
            email: Email::parse("ada@x.io").unwrap(),
            password: "pw123456".into(),
            first_name: Some("Ada".into()),
            last_name: None,
            role: Role::Client,
        }
    }

    #[tokio::test]
    async fn posts_camel_case_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/users"))
            .and(body_json(serde_json::json!({
                "email": "ada@x.io",
                "password": "pw123456",
                "firstName": "Ada",
                "lastName": null,
                "role": "CLIENT"
            })))
            .respond_with(ResponseTemplate::new(201))
            .expect(1)
            .mount(&server)
            .await;

        let client = ProfileServiceClient::new(&server.uri()).unwrap();
        client.provision(&provision_request()).await.unwrap();
    }

    #[tokio::test]
    async fn non_success_is_upstream() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/users"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let client = ProfileServiceClient::new(&server.uri()).unwrap();
        match client.provision(&provision_request()).await {
            Err(DomainError::Upstream(detail)) => assert!(detail.contains("boom")),
            other => panic!("unexpected: {other:?}"),
        }
    }
}
