//! In-memory identity provider for dev mode and tests.
//!
//! Mirrors the provider behaviours the core relies on: usernames are stored
//! lower-cased, duplicate usernames are rejected at creation, role lookups
//! fail for unknown roles, and removing an unassigned role is an error.
//! Individual operations can be forced to fail.

use std::sync::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use serde_json::Value as JsonValue;
use uuid::Uuid;

use idsync_auth::Role;
use idsync_core::{DomainError, DomainResult, IdentityId};

use super::{IdentityProvider, IdentityRecord, NewIdentity};

#[derive(Debug, Clone)]
struct StoredIdentity {
    record: IdentityRecord,
    password: String,
    realm_roles: Vec<String>,
}

#[derive(Debug, Default)]
struct FailurePlan {
    create: AtomicBool,
    add_role: AtomicBool,
    update: AtomicBool,
    delete: AtomicBool,
    search: AtomicBool,
}

#[derive(Debug)]
pub struct InMemoryIdentityProvider {
    users: RwLock<Vec<StoredIdentity>>,
    realm_roles: Vec<String>,
    failures: FailurePlan,
}

impl InMemoryIdentityProvider {
    pub fn new() -> Self {
        let mut realm_roles: Vec<String> = Role::ALL.iter().map(|r| r.as_str().to_string()).collect();
        realm_roles.push("offline_access".to_string());

        Self {
            users: RwLock::new(Vec::new()),
            realm_roles,
            failures: FailurePlan::default(),
        }
    }

    pub fn fail_create(&self, on: bool) {
        self.failures.create.store(on, Ordering::SeqCst);
    }

    pub fn fail_add_role(&self, on: bool) {
        self.failures.add_role.store(on, Ordering::SeqCst);
    }

    pub fn fail_update(&self, on: bool) {
        self.failures.update.store(on, Ordering::SeqCst);
    }

    pub fn fail_delete(&self, on: bool) {
        self.failures.delete.store(on, Ordering::SeqCst);
    }

    pub fn fail_search(&self, on: bool) {
        self.failures.search.store(on, Ordering::SeqCst);
    }

    pub fn len(&self) -> usize {
        self.users.read().map(|u| u.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of the record whose email matches (ignoring case).
    pub fn get_by_email(&self, email: &str) -> Option<IdentityRecord> {
        let users = self.users.read().ok()?;
        users
            .iter()
            .find(|u| u.record.has_email(email))
            .map(|u| u.record.clone())
    }

    pub fn password_of(&self, id: &IdentityId) -> Option<String> {
        let users = self.users.read().ok()?;
        users.iter().find(|u| &u.record.id == id).map(|u| u.password.clone())
    }

    /// Seed a record directly, bypassing failure injection.
    pub fn insert(&self, record: IdentityRecord, realm_roles: Vec<String>) {
        if let Ok(mut users) = self.users.write() {
            users.push(StoredIdentity {
                record,
                password: String::new(),
                realm_roles,
            });
        }
    }

    fn check(flag: &AtomicBool, action: &str) -> DomainResult<()> {
        if flag.load(Ordering::SeqCst) {
            return Err(DomainError::upstream(format!("injected failure: {action}")));
        }
        Ok(())
    }

    fn with_user<T>(
        &self,
        id: &IdentityId,
        f: impl FnOnce(&mut StoredIdentity) -> DomainResult<T>,
    ) -> DomainResult<T> {
        let mut users = self
            .users
            .write()
            .map_err(|_| DomainError::upstream("identity store poisoned"))?;
        let user = users
            .iter_mut()
            .find(|u| &u.record.id == id)
            .ok_or_else(|| DomainError::not_found(format!("identity {id}")))?;
        f(user)
    }

    fn known_role(&self, role: &str) -> DomainResult<()> {
        if self.realm_roles.iter().any(|r| r == role) {
            Ok(())
        } else {
            Err(DomainError::not_found(format!("realm role {role}")))
        }
    }
}

impl Default for InMemoryIdentityProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl IdentityProvider for InMemoryIdentityProvider {
    async fn search_users(&self, query: &str, exact: bool) -> DomainResult<Vec<IdentityRecord>> {
        Self::check(&self.failures.search, "search")?;

        let needle = query.trim().to_lowercase();
        let users = self
            .users
            .read()
            .map_err(|_| DomainError::upstream("identity store poisoned"))?;

        let hit = |r: &IdentityRecord| {
            if exact {
                return r.username == needle;
            }
            [Some(&r.username), r.email.as_ref(), r.first_name.as_ref(), r.last_name.as_ref()]
                .into_iter()
                .flatten()
                .any(|field| field.to_lowercase().contains(&needle))
        };

        Ok(users
            .iter()
            .map(|u| &u.record)
            .filter(|r| hit(r))
            .cloned()
            .collect())
    }

    async fn create_user(&self, user: &NewIdentity) -> DomainResult<IdentityId> {
        Self::check(&self.failures.create, "create user")?;

        let username = user.email.as_str().to_lowercase();
        let mut users = self
            .users
            .write()
            .map_err(|_| DomainError::upstream("identity store poisoned"))?;

        if users.iter().any(|u| u.record.username == username) {
            return Err(DomainError::upstream(
                "409 Conflict: User exists with same username",
            ));
        }

        let id = IdentityId::new(Uuid::now_v7().to_string());
        users.push(StoredIdentity {
            record: IdentityRecord {
                id: id.clone(),
                username,
                email: Some(user.email.as_str().to_string()),
                first_name: user.first_name.clone(),
                last_name: user.last_name.clone(),
                enabled: true,
                email_verified: true,
            },
            password: user.password.clone(),
            realm_roles: Vec::new(),
        });
        Ok(id)
    }

    async fn update_user(&self, user: &IdentityRecord) -> DomainResult<()> {
        Self::check(&self.failures.update, "update user")?;

        self.with_user(&user.id, |stored| {
            stored.record = IdentityRecord {
                username: user.username.to_lowercase(),
                ..user.clone()
            };
            Ok(())
        })
    }

    async fn delete_user(&self, id: &IdentityId) -> DomainResult<()> {
        Self::check(&self.failures.delete, "delete user")?;

        let mut users = self
            .users
            .write()
            .map_err(|_| DomainError::upstream("identity store poisoned"))?;
        let before = users.len();
        users.retain(|u| &u.record.id != id);
        if users.len() == before {
            return Err(DomainError::not_found(format!("identity {id}")));
        }
        Ok(())
    }

    async fn realm_roles(&self, id: &IdentityId) -> DomainResult<Vec<String>> {
        self.with_user(id, |stored| Ok(stored.realm_roles.clone()))
    }

    async fn add_realm_role(&self, id: &IdentityId, role: &str) -> DomainResult<()> {
        Self::check(&self.failures.add_role, "assign realm role")?;
        self.known_role(role)?;

        self.with_user(id, |stored| {
            if !stored.realm_roles.iter().any(|r| r == role) {
                stored.realm_roles.push(role.to_string());
            }
            Ok(())
        })
    }

    async fn remove_realm_role(&self, id: &IdentityId, role: &str) -> DomainResult<()> {
        self.known_role(role)?;

        self.with_user(id, |stored| {
            let before = stored.realm_roles.len();
            stored.realm_roles.retain(|r| r != role);
            if stored.realm_roles.len() == before {
                return Err(DomainError::not_found(format!("role {role} not assigned")));
            }
            Ok(())
        })
    }

    async fn password_grant(&self, username: &str, password: &str) -> DomainResult<JsonValue> {
        let users = self
            .users
            .read()
            .map_err(|_| DomainError::upstream("identity store poisoned"))?;

        let user = users
            .iter()
            .find(|u| u.record.matches(username) && u.record.enabled)
            .filter(|u| u.password == password)
            .ok_or(DomainError::Unauthenticated)?;

        Ok(serde_json::json!({
            "access_token": format!("dev-token-{}", user.record.id),
            "token_type": "Bearer",
            "expires_in": 300,
        }))
    }
}
