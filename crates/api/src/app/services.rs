//! Service wiring for both binaries.
//!
//! Missing external collaborators fall back to in-process implementations
//! (dev mode) with a warning, so either service can run standalone.

use std::sync::Arc;

use idsync_auth::{JwtVerifier, TokenVerifier, TrustGate};
use idsync_core::{DomainError, DomainResult};
use idsync_infra::config::{IdentityServiceConfig, JwtConfig, ProfileServiceConfig};
use idsync_infra::idp::{IdentityProvider, InMemoryIdentityProvider, KeycloakAdminClient};
use idsync_infra::profile::{
    Argon2PasswordHasher, InMemoryProfileStore, PostgresProfileStore, ProfileRepository, ProfileService,
};
use idsync_infra::saga::{ProfileProvisioner, ProfileServiceClient, RegistrationSaga};
use idsync_infra::sync::{HttpSyncPropagator, IdentitySyncService, NoopSync, ProfileSync};

/// Everything the identity service's handlers need.
#[derive(Clone)]
pub struct IdentityServices {
    pub idp: Arc<dyn IdentityProvider>,
    pub registration: RegistrationSaga,
    pub sync: IdentitySyncService,
    pub trust_gate: Arc<TrustGate>,
    pub verifier: Option<Arc<dyn TokenVerifier>>,
}

impl IdentityServices {
    pub fn new(
        idp: Arc<dyn IdentityProvider>,
        provisioner: Arc<dyn ProfileProvisioner>,
        trust_gate: TrustGate,
        verifier: Option<Arc<dyn TokenVerifier>>,
    ) -> Self {
        Self {
            registration: RegistrationSaga::new(idp.clone(), provisioner),
            sync: IdentitySyncService::new(idp.clone()),
            idp,
            trust_gate: Arc::new(trust_gate),
            verifier,
        }
    }

    pub fn from_config(config: &IdentityServiceConfig) -> DomainResult<Self> {
        let idp: Arc<dyn IdentityProvider> = match &config.keycloak {
            Some(keycloak) => {
                tracing::info!(server = %keycloak.server_url, realm = %keycloak.realm, "using Keycloak identity provider");
                Arc::new(KeycloakAdminClient::new(keycloak.clone())?)
            }
            None => {
                tracing::warn!("KEYCLOAK_SERVER_URL not set; using in-memory identity provider (dev mode)");
                Arc::new(InMemoryIdentityProvider::new())
            }
        };

        let provisioner: Arc<dyn ProfileProvisioner> = match &config.profile_service_url {
            Some(url) => Arc::new(ProfileServiceClient::new(url)?),
            None => {
                tracing::warn!("PROFILE_SERVICE_URL not set; provisioning profiles in-process (dev mode)");
                Arc::new(in_memory_profiles(Arc::new(NoopSync)))
            }
        };

        let trust_gate = TrustGate::new(&config.service_secret);
        if !trust_gate.is_configured() {
            tracing::warn!("SERVICE_SECRET not set; all admin sync calls will be refused");
        }

        Ok(Self::new(idp, provisioner, trust_gate, verifier_from_config(&config.jwt)?))
    }
}

fn verifier_from_config(jwt: &JwtConfig) -> DomainResult<Option<Arc<dyn TokenVerifier>>> {
    let verifier = match (&jwt.rsa_public_key_pem, &jwt.hs256_secret) {
        (Some(pem), _) => JwtVerifier::rs256_pem(pem.as_bytes())
            .map_err(|e| DomainError::validation(format!("JWT_RSA_PUBLIC_KEY_PEM: {e}")))?,
        (None, Some(secret)) => JwtVerifier::hs256(secret.as_bytes()),
        (None, None) => {
            tracing::warn!("no JWT verification key configured; bearer-protected routes will refuse every request");
            return Ok(None);
        }
    };

    let verifier = match &jwt.issuer {
        Some(issuer) => verifier.with_issuer(issuer),
        None => verifier,
    };
    Ok(Some(Arc::new(verifier)))
}

fn in_memory_profiles(sync: Arc<dyn ProfileSync>) -> ProfileService {
    ProfileService::new(
        Arc::new(InMemoryProfileStore::new()),
        Arc::new(Argon2PasswordHasher::new()),
        sync,
    )
}

/// Everything the profile service's handlers need.
#[derive(Clone)]
pub struct ProfileServices {
    pub profiles: ProfileService,
}

impl ProfileServices {
    pub fn new(profiles: ProfileService) -> Self {
        Self { profiles }
    }

    pub async fn from_config(config: &ProfileServiceConfig) -> DomainResult<Self> {
        let propagator = HttpSyncPropagator::new(&config.sync)?;
        if !propagator.is_configured() {
            tracing::warn!("IDENTITY_SERVICE_URL or SERVICE_SECRET not set; identity sync disabled");
        }
        let sync: Arc<dyn ProfileSync> = Arc::new(propagator);

        let repo: Arc<dyn ProfileRepository> = match &config.database_url {
            Some(url) => Arc::new(PostgresProfileStore::connect(url).await?),
            None => {
                tracing::warn!("DATABASE_URL not set; keeping profiles in memory (dev mode)");
                return Ok(Self::new(in_memory_profiles(sync)));
            }
        };

        Ok(Self::new(ProfileService::new(
            repo,
            Arc::new(Argon2PasswordHasher::new()),
            sync,
        )))
    }
}
