//! Profile Store: records, the repository port and the lifecycle service.

pub mod in_memory;
pub mod password;
pub mod postgres;
pub mod service;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use idsync_auth::Role;
use idsync_core::{DomainResult, ProfileId};

pub use in_memory::InMemoryProfileStore;
pub use password::{Argon2PasswordHasher, FALLBACK_PASSWORD, PasswordHasher};
pub use postgres::PostgresProfileStore;
pub use service::ProfileService;

/// A stored profile. `email` is unique ignoring case.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileRecord {
    pub id: ProfileId,
    pub email: String,
    pub password_hash: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub role: Role,
    pub phone: Option<String>,
    pub avatar_url: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Row data before the store assigns an id and timestamps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewProfile {
    pub email: String,
    pub password_hash: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub role: Role,
    pub phone: Option<String>,
    pub avatar_url: Option<String>,
    pub is_active: bool,
}

/// Creation request. `password` is plaintext and hashed by the service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateProfile {
    pub email: String,
    pub password: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub role: Role,
    pub phone: Option<String>,
    pub avatar_url: Option<String>,
    pub is_active: Option<bool>,
}

impl CreateProfile {
    pub fn new(email: impl Into<String>, role: Role) -> Self {
        Self {
            email: email.into(),
            password: None,
            first_name: None,
            last_name: None,
            role,
            phone: None,
            avatar_url: None,
            is_active: None,
        }
    }
}

/// Partial update: `None` leaves the field untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileUpdate {
    pub email: Option<String>,
    pub password: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub role: Option<Role>,
    pub phone: Option<String>,
    pub avatar_url: Option<String>,
    pub is_active: Option<bool>,
}

#[async_trait]
pub trait ProfileRepository: Send + Sync {
    async fn find_all(&self) -> DomainResult<Vec<ProfileRecord>>;

    async fn find_by_id(&self, id: ProfileId) -> DomainResult<Option<ProfileRecord>>;

    async fn find_by_email_ignore_case(&self, email: &str) -> DomainResult<Option<ProfileRecord>>;

    /// Assigns the id and both timestamps. A duplicate email is a `Conflict`.
    async fn insert(&self, profile: NewProfile) -> DomainResult<ProfileRecord>;

    /// Persists every mutable field and bumps `updated_at`.
    async fn save(&self, profile: &ProfileRecord) -> DomainResult<ProfileRecord>;

    /// `true` when a row was removed.
    async fn delete(&self, id: ProfileId) -> DomainResult<bool>;
}
