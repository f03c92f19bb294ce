//! Cross-store workflows.
//!
//! Registration spans the identity provider and the Profile Store, which
//! share no transaction; the saga compensates by deleting the provider user
//! when a later step fails.

pub mod profile_client;
pub mod registration;

use async_trait::async_trait;

use idsync_auth::Role;
use idsync_core::{DomainResult, Email};

pub use profile_client::ProfileServiceClient;
pub use registration::{RegistrationRequest, RegistrationSaga};

/// What the Profile Store needs to mirror a freshly registered identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvisionRequest {
    pub email: Email,
    pub password: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub role: Role,
}

/// Creates the Profile Store record during registration.
#[async_trait]
pub trait ProfileProvisioner: Send + Sync {
    async fn provision(&self, request: &ProvisionRequest) -> DomainResult<()>;
}
