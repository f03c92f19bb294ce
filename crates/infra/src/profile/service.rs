//! Profile lifecycle: the Profile Store side of create, update and delete.

use std::sync::Arc;

use async_trait::async_trait;

use idsync_core::{DomainError, DomainResult, Email, ProfileId};

use super::{CreateProfile, NewProfile, PasswordHasher, ProfileRecord, ProfileRepository, ProfileUpdate};
use crate::saga::{ProfileProvisioner, ProvisionRequest};
use crate::sync::{ProfileSync, SyncUpdate};

#[derive(Clone)]
pub struct ProfileService {
    repo: Arc<dyn ProfileRepository>,
    hasher: Arc<dyn PasswordHasher>,
    sync: Arc<dyn ProfileSync>,
}

impl ProfileService {
    pub fn new(
        repo: Arc<dyn ProfileRepository>,
        hasher: Arc<dyn PasswordHasher>,
        sync: Arc<dyn ProfileSync>,
    ) -> Self {
        Self { repo, hasher, sync }
    }

    pub async fn find_all(&self) -> DomainResult<Vec<ProfileRecord>> {
        self.repo.find_all().await
    }

    pub async fn find_by_id(&self, id: ProfileId) -> DomainResult<ProfileRecord> {
        self.repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::not_found(format!("User not found with id: {id}")))
    }

    pub async fn find_by_email(&self, email: &str) -> DomainResult<ProfileRecord> {
        self.repo
            .find_by_email_ignore_case(email)
            .await?
            .ok_or_else(|| DomainError::not_found(format!("User not found with email: {}", email.trim())))
    }

    /// Idempotent by email: an existing record (ignoring case) is returned
    /// as-is instead of raising a conflict.
    pub async fn create(&self, request: CreateProfile) -> DomainResult<ProfileRecord> {
        let email = Email::parse(&request.email)?;

        if let Some(existing) = self.repo.find_by_email_ignore_case(email.as_str()).await? {
            tracing::debug!(%email, id = %existing.id, "profile already exists; returning it");
            return Ok(existing);
        }

        let password_hash = self.hasher.hash_or_fallback(request.password.as_deref())?;
        let inserted = self
            .repo
            .insert(NewProfile {
                email: email.as_str().to_string(),
                password_hash,
                first_name: request.first_name,
                last_name: request.last_name,
                role: request.role,
                phone: request.phone,
                avatar_url: request.avatar_url,
                is_active: request.is_active.unwrap_or(true),
            })
            .await;

        match inserted {
            Ok(record) => {
                tracing::info!(%email, id = %record.id, role = %record.role, "created profile");
                Ok(record)
            }
            // Lost a race with a concurrent create for the same email.
            Err(DomainError::Conflict(_)) => self.find_by_email(email.as_str()).await,
            Err(err) => Err(err),
        }
    }

    /// Applies the present fields, commits, then propagates keyed by the
    /// email held before the update.
    pub async fn update(&self, id: ProfileId, update: ProfileUpdate) -> DomainResult<ProfileRecord> {
        let mut record = self.find_by_id(id).await?;
        let old_email = record.email.clone();

        if let Some(raw) = &update.email {
            let email = Email::parse(raw)?;
            if let Some(other) = self.repo.find_by_email_ignore_case(email.as_str()).await? {
                if other.id != id {
                    return Err(DomainError::conflict(format!(
                        "User already exists with email: {email}"
                    )));
                }
            }
            record.email = email.into();
        }
        if let Some(password) = update.password.as_deref().filter(|p| !p.trim().is_empty()) {
            record.password_hash = self.hasher.hash(password)?;
        }
        if let Some(first_name) = update.first_name {
            record.first_name = Some(first_name);
        }
        if let Some(last_name) = update.last_name {
            record.last_name = Some(last_name);
        }
        if let Some(role) = update.role {
            record.role = role;
        }
        if let Some(phone) = update.phone {
            record.phone = Some(phone);
        }
        if let Some(avatar_url) = update.avatar_url {
            record.avatar_url = Some(avatar_url);
        }
        if let Some(is_active) = update.is_active {
            record.is_active = is_active;
        }

        let saved = self.repo.save(&record).await?;
        tracing::info!(id = %saved.id, email = %saved.email, "updated profile");

        self.sync
            .propagate_update(
                &old_email,
                &SyncUpdate {
                    first_name: saved.first_name.clone(),
                    last_name: saved.last_name.clone(),
                    email: Some(saved.email.clone()),
                    role: Some(saved.role.as_str().to_string()),
                },
            )
            .await;

        Ok(saved)
    }

    /// Unknown ids are a silent no-op and propagate nothing.
    pub async fn delete(&self, id: ProfileId) -> DomainResult<()> {
        let Some(record) = self.repo.find_by_id(id).await? else {
            return Ok(());
        };

        if self.repo.delete(id).await? {
            tracing::info!(%id, email = %record.email, "deleted profile");
            self.sync.propagate_delete(&record.email).await;
        }
        Ok(())
    }
}

#[async_trait]
impl ProfileProvisioner for ProfileService {
    async fn provision(&self, request: &ProvisionRequest) -> DomainResult<()> {
        let mut create = CreateProfile::new(request.email.as_str(), request.role);
        create.password = Some(request.password.clone());
        create.first_name = request.first_name.clone();
        create.last_name = request.last_name.clone();
        self.create(create).await.map(|_| ())
    }
}
