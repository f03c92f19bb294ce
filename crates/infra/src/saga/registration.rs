//! Registration saga.
//!
//! Steps, in order:
//! 1. validate role and email (no store touched on failure)
//! 2. refuse if the provider already holds the email
//! 3. create the provider user
//! 4. assign the realm role
//! 5. provision the profile
//!
//! A failure in step 4 or 5 deletes the user created in step 3 before the
//! original error is returned. A failed deletion is logged on its own and
//! never replaces that error.

use std::sync::Arc;

use idsync_auth::Role;
use idsync_core::{DomainError, DomainResult, Email, IdentityId};

use super::{ProfileProvisioner, ProvisionRequest};
use crate::idp::{IdentityProvider, NewIdentity};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistrationRequest {
    pub email: String,
    pub password: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    /// Raw role text, normalised by the role policy.
    pub role: String,
}

#[derive(Clone)]
pub struct RegistrationSaga {
    idp: Arc<dyn IdentityProvider>,
    profiles: Arc<dyn ProfileProvisioner>,
}

/// A provider user created by this saga run and not yet confirmed.
///
/// Must end in either [`PendingIdentity::confirm`] or
/// [`PendingIdentity::release`].
struct PendingIdentity<'a> {
    idp: &'a dyn IdentityProvider,
    id: IdentityId,
    email: &'a str,
}

impl PendingIdentity<'_> {
    fn confirm(self) -> IdentityId {
        self.id
    }

    /// Compensate: delete the provider user. Logs its own outcome only.
    async fn release(self, cause: &DomainError) {
        match self.idp.delete_user(&self.id).await {
            Ok(()) => tracing::warn!(
                email = %self.email,
                identity = %self.id,
                cause = %cause,
                "rolled back identity after registration failure"
            ),
            Err(err) => tracing::error!(
                email = %self.email,
                identity = %self.id,
                cause = %cause,
                compensation_error = %err,
                "failed to roll back identity; orphaned identity remains"
            ),
        }
    }
}

impl RegistrationSaga {
    pub fn new(idp: Arc<dyn IdentityProvider>, profiles: Arc<dyn ProfileProvisioner>) -> Self {
        Self { idp, profiles }
    }

    pub async fn register(&self, request: &RegistrationRequest) -> DomainResult<IdentityId> {
        let role = Role::normalize_and_validate(&request.role)?;
        let email = Email::parse(&request.email)?;

        if self.email_taken(&email).await? {
            return Err(DomainError::conflict(format!(
                "User with email already exists: {email}"
            )));
        }

        let id = self
            .idp
            .create_user(&NewIdentity {
                email: email.clone(),
                password: request.password.clone(),
                first_name: request.first_name.clone(),
                last_name: request.last_name.clone(),
            })
            .await
            .inspect_err(|err| tracing::warn!(%email, error = %err, "identity provider rejected user creation"))?;

        let pending = PendingIdentity {
            idp: self.idp.as_ref(),
            id,
            email: email.as_str(),
        };

        match self.complete(&pending.id, &email, role, request).await {
            Ok(()) => {
                let id = pending.confirm();
                tracing::info!(%email, identity = %id, %role, "registered user");
                Ok(id)
            }
            Err(err) => {
                pending.release(&err).await;
                Err(err)
            }
        }
    }

    async fn email_taken(&self, email: &Email) -> DomainResult<bool> {
        let mut found = self.idp.search_users(email.as_str(), true).await?;
        if found.is_empty() {
            found = self.idp.search_users(email.as_str(), false).await?;
        }
        Ok(found.iter().any(|u| u.has_email(email.as_str())))
    }

    /// Steps 4 and 5; any error here triggers compensation.
    async fn complete(
        &self,
        id: &IdentityId,
        email: &Email,
        role: Role,
        request: &RegistrationRequest,
    ) -> DomainResult<()> {
        self.idp.add_realm_role(id, role.as_str()).await?;

        self.profiles
            .provision(&ProvisionRequest {
                email: email.clone(),
                password: request.password.clone(),
                first_name: request.first_name.clone(),
                last_name: request.last_name.clone(),
                role,
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::idp::InMemoryIdentityProvider;
    use crate::profile::{Argon2PasswordHasher, InMemoryProfileStore, ProfileRepository, ProfileService};
    use crate::sync::NoopSync;
    use async_trait::async_trait;

    struct FailingProvisioner;

    #[async_trait]
    impl ProfileProvisioner for FailingProvisioner {
        async fn provision(&self, _request: &ProvisionRequest) -> DomainResult<()> {
            Err(DomainError::storage("profile store down"))
        }
    }

    fn request(email: &str, role: &str) -> RegistrationRequest {
        RegistrationRequest {
            email: email.to_string(),
            password: "Passw0rd!".to_string(),
            first_name: Some("Ada".to_string()),
            last_name: Some("Lovelace".to_string()),
            role: role.to_string(),
        }
    }

    fn fixture() -> (Arc<InMemoryIdentityProvider>, Arc<InMemoryProfileStore>, RegistrationSaga) {
        let idp = Arc::new(InMemoryIdentityProvider::new());
        let store = Arc::new(InMemoryProfileStore::new());
        let profiles = Arc::new(ProfileService::new(
            store.clone(),
            Arc::new(Argon2PasswordHasher::new()),
            Arc::new(NoopSync),
        ));
        let saga = RegistrationSaga::new(idp.clone(), profiles);
        (idp, store, saga)
    }

    #[tokio::test]
    async fn registers_in_both_stores_with_normalised_role() {
        let (idp, store, saga) = fixture();

        let id = saga.register(&request("ada@x.io", "freelancer")).await.unwrap();

        let identity = idp.get_by_email("ada@x.io").unwrap();
        assert_eq!(identity.id, id);
        assert!(identity.enabled && identity.email_verified);
        assert_eq!(idp.realm_roles(&id).await.unwrap(), vec!["FREELANCER".to_string()]);
        assert_eq!(idp.password_of(&id).as_deref(), Some("Passw0rd!"));

        let profile = store.find_by_email_ignore_case("ada@x.io").await.unwrap().unwrap();
        assert_eq!(profile.role, Role::Freelancer);
        assert_ne!(profile.password_hash, "Passw0rd!");
    }

    #[tokio::test]
    async fn second_registration_conflicts_and_changes_nothing() {
        let (idp, store, saga) = fixture();
        saga.register(&request("ada@x.io", "CLIENT")).await.unwrap();

        let err = saga.register(&request("ADA@x.io", "CLIENT")).await.unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
        assert_eq!(idp.len(), 1);
        assert_eq!(store.find_all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn non_ascii_case_variant_conflicts() {
        let (idp, store, saga) = fixture();
        saga.register(&request("Élodie@x.io", "CLIENT")).await.unwrap();

        let second = saga.register(&request("élodie@x.io", "CLIENT")).await;
        assert!(matches!(second, Err(DomainError::Conflict(_))), "got {second:?}");
        assert_eq!(idp.len(), 1);
        assert_eq!(store.find_all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn invalid_input_touches_no_store() {
        let (idp, store, saga) = fixture();
        idp.fail_search(true);

        let err = saga.register(&request("ada@x.io", "superuser")).await.unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
        let err = saga.register(&request("   ", "client")).await.unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));

        assert!(idp.is_empty());
        assert!(store.find_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn provider_rejection_surfaces_as_upstream() {
        let (idp, _, saga) = fixture();
        idp.fail_create(true);

        let err = saga.register(&request("ada@x.io", "CLIENT")).await.unwrap_err();
        assert!(matches!(err, DomainError::Upstream(_)));
        assert!(idp.is_empty());
    }

    #[tokio::test]
    async fn profile_failure_rolls_back_identity_and_returns_root_cause() {
        let idp = Arc::new(InMemoryIdentityProvider::new());
        let saga = RegistrationSaga::new(idp.clone(), Arc::new(FailingProvisioner));

        let err = saga.register(&request("ada@x.io", "CLIENT")).await.unwrap_err();
        assert_eq!(err, DomainError::storage("profile store down"));
        assert!(idp.get_by_email("ada@x.io").is_none());
    }

    #[tokio::test]
    async fn failed_compensation_still_returns_root_cause() {
        let idp = Arc::new(InMemoryIdentityProvider::new());
        idp.fail_delete(true);
        let saga = RegistrationSaga::new(idp.clone(), Arc::new(FailingProvisioner));

        let err = saga.register(&request("ada@x.io", "CLIENT")).await.unwrap_err();
        assert_eq!(err, DomainError::storage("profile store down"));
        // Orphan left behind, by contract.
        assert!(idp.get_by_email("ada@x.io").is_some());
    }

    #[tokio::test]
    async fn role_assignment_failure_is_compensated() {
        let (idp, store, saga) = fixture();
        idp.fail_add_role(true);

        let err = saga.register(&request("ada@x.io", "ADMIN")).await.unwrap_err();
        assert!(matches!(err, DomainError::Upstream(_)));
        assert!(idp.is_empty());
        assert!(store.find_all().await.unwrap().is_empty());
    }
}
