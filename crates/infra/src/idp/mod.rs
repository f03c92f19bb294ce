//! Identity provider admin port and its adapters.

pub mod in_memory;
pub mod keycloak;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use idsync_core::{DomainResult, Email, IdentityId, emails_match};

pub use in_memory::InMemoryIdentityProvider;
pub use keycloak::KeycloakAdminClient;

/// A user as held by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentityRecord {
    pub id: IdentityId,
    pub username: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub email_verified: bool,
}

impl IdentityRecord {
    /// Email-only, case-insensitive match.
    pub fn has_email(&self, target: &str) -> bool {
        self.email
            .as_deref()
            .is_some_and(|e| emails_match(e, target))
    }

    /// Email-or-username, case-insensitive match (sync-by-email lookups).
    pub fn matches(&self, target: &str) -> bool {
        self.has_email(target) || emails_match(&self.username, target)
    }
}

/// Input for creating a provider user: username and email are both the
/// email, the account is enabled and verified, and the password is a
/// non-temporary credential.
#[derive(Debug, Clone)]
pub struct NewIdentity {
    pub email: Email,
    pub password: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

/// Administrative operations the core needs from the identity provider.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// `exact` matches the username exactly; otherwise a fuzzy search over
    /// username, email and names.
    async fn search_users(&self, query: &str, exact: bool) -> DomainResult<Vec<IdentityRecord>>;

    async fn create_user(&self, user: &NewIdentity) -> DomainResult<IdentityId>;

    async fn update_user(&self, user: &IdentityRecord) -> DomainResult<()>;

    async fn delete_user(&self, id: &IdentityId) -> DomainResult<()>;

    async fn realm_roles(&self, id: &IdentityId) -> DomainResult<Vec<String>>;

    async fn add_realm_role(&self, id: &IdentityId, role: &str) -> DomainResult<()>;

    async fn remove_realm_role(&self, id: &IdentityId, role: &str) -> DomainResult<()>;

    /// End-user password grant; returns the provider's token response verbatim.
    async fn password_grant(&self, username: &str, password: &str) -> DomainResult<JsonValue>;
}

/// Locate the provider record for `target` by email or username.
///
/// Tries an exact search first and falls back to a fuzzy one; only records
/// that actually match (ignoring case) are considered.
pub async fn find_by_email_or_username(
    idp: &dyn IdentityProvider,
    target: &str,
) -> DomainResult<Option<IdentityRecord>> {
    let target = target.trim();
    if target.is_empty() {
        return Ok(None);
    }

    let mut found = idp.search_users(target, true).await?;
    if found.is_empty() {
        found = idp.search_users(target, false).await?;
    }

    Ok(found.into_iter().find(|u| u.matches(target)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(username: &str, email: Option<&str>) -> IdentityRecord {
        IdentityRecord {
            id: IdentityId::new("1"),
            username: username.to_string(),
            email: email.map(str::to_string),
            first_name: None,
            last_name: None,
            enabled: true,
            email_verified: true,
        }
    }

    #[test]
    fn matching_covers_email_and_username() {
        assert!(record("jane", Some("Jane@Example.com")).matches("jane@example.com"));
        assert!(record("jane@example.com", None).matches("JANE@example.com"));
        assert!(!record("jane", None).matches("jane@example.com"));
    }

    #[test]
    fn email_match_ignores_username() {
        assert!(!record("a@b.io", None).has_email("a@b.io"));
        assert!(record("x", Some("A@B.io")).has_email(" a@b.io"));
    }

    #[test]
    fn deserializes_provider_representation() {
        let json = serde_json::json!({
            "id": "4c1d",
            "username": "a@b.io",
            "email": "a@b.io",
            "enabled": true,
            "createdTimestamp": 1700000000000u64
        });
        let rec: IdentityRecord = serde_json::from_value(json).unwrap();
        assert_eq!(rec.id.as_str(), "4c1d");
        assert!(rec.enabled);
        assert!(!rec.email_verified);
    }

    #[tokio::test]
    async fn lookup_falls_back_to_fuzzy_search() {
        let idp = InMemoryIdentityProvider::new();
        let id = idp
            .create_user(&NewIdentity {
                email: Email::parse("Someone@Example.com").unwrap(),
                password: "pw".into(),
                first_name: None,
                last_name: None,
            })
            .await
            .unwrap();

        let found = find_by_email_or_username(&idp, "someone@example.com").await.unwrap();
        assert_eq!(found.map(|r| r.id), Some(id));
        assert!(find_by_email_or_username(&idp, "nobody@example.com").await.unwrap().is_none());
        assert!(find_by_email_or_username(&idp, "   ").await.unwrap().is_none());
    }
}
