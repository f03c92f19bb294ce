use std::collections::BTreeMap;
use std::sync::RwLock;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};

use async_trait::async_trait;
use chrono::Utc;

use idsync_core::{DomainError, DomainResult, ProfileId, emails_match};

use super::{NewProfile, ProfileRecord, ProfileRepository};

/// Process-local profile store; ids come from an incrementing counter.
#[derive(Debug)]
pub struct InMemoryProfileStore {
    rows: RwLock<BTreeMap<ProfileId, ProfileRecord>>,
    next_id: AtomicI64,
    fail_writes: AtomicBool,
}

impl InMemoryProfileStore {
    pub fn new() -> Self {
        Self {
            rows: RwLock::new(BTreeMap::new()),
            next_id: AtomicI64::new(1),
            fail_writes: AtomicBool::new(false),
        }
    }

    /// Make every subsequent insert/save/delete fail with a storage error.
    pub fn fail_writes(&self, on: bool) {
        self.fail_writes.store(on, Ordering::SeqCst);
    }

    fn check_writable(&self) -> DomainResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(DomainError::storage("profile store unavailable"));
        }
        Ok(())
    }

    fn email_taken(rows: &BTreeMap<ProfileId, ProfileRecord>, email: &str, except: Option<ProfileId>) -> bool {
        rows.values()
            .any(|r| Some(r.id) != except && emails_match(&r.email, email))
    }
}

impl Default for InMemoryProfileStore {
    fn default() -> Self {
        Self::new()
    }
}

fn poisoned<T>(_: T) -> DomainError {
    DomainError::storage("profile store lock poisoned")
}

#[async_trait]
impl ProfileRepository for InMemoryProfileStore {
    async fn find_all(&self) -> DomainResult<Vec<ProfileRecord>> {
        let rows = self.rows.read().map_err(poisoned)?;
        Ok(rows.values().cloned().collect())
    }

    async fn find_by_id(&self, id: ProfileId) -> DomainResult<Option<ProfileRecord>> {
        let rows = self.rows.read().map_err(poisoned)?;
        Ok(rows.get(&id).cloned())
    }

    async fn find_by_email_ignore_case(&self, email: &str) -> DomainResult<Option<ProfileRecord>> {
        let rows = self.rows.read().map_err(poisoned)?;
        let email = email.trim();
        Ok(rows.values().find(|r| emails_match(&r.email, email)).cloned())
    }

    async fn insert(&self, profile: NewProfile) -> DomainResult<ProfileRecord> {
        self.check_writable()?;
        let mut rows = self.rows.write().map_err(poisoned)?;
        if Self::email_taken(&rows, &profile.email, None) {
            return Err(DomainError::conflict(format!(
                "User already exists with email: {}",
                profile.email
            )));
        }

        let now = Utc::now();
        let record = ProfileRecord {
            id: ProfileId::new(self.next_id.fetch_add(1, Ordering::SeqCst)),
            email: profile.email,
            password_hash: profile.password_hash,
            first_name: profile.first_name,
            last_name: profile.last_name,
            role: profile.role,
            phone: profile.phone,
            avatar_url: profile.avatar_url,
            is_active: profile.is_active,
            created_at: now,
            updated_at: now,
        };
        rows.insert(record.id, record.clone());
        Ok(record)
    }

    async fn save(&self, profile: &ProfileRecord) -> DomainResult<ProfileRecord> {
        self.check_writable()?;
        let mut rows = self.rows.write().map_err(poisoned)?;
        if !rows.contains_key(&profile.id) {
            return Err(DomainError::not_found(format!("User not found with id: {}", profile.id)));
        }
        if Self::email_taken(&rows, &profile.email, Some(profile.id)) {
            return Err(DomainError::conflict(format!(
                "User already exists with email: {}",
                profile.email
            )));
        }

        let mut saved = profile.clone();
        saved.updated_at = Utc::now();
        rows.insert(saved.id, saved.clone());
        Ok(saved)
    }

    async fn delete(&self, id: ProfileId) -> DomainResult<bool> {
        self.check_writable()?;
        let mut rows = self.rows.write().map_err(poisoned)?;
        Ok(rows.remove(&id).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use idsync_auth::Role;

    fn new_profile(email: &str) -> NewProfile {
        NewProfile {
            email: email.to_string(),
            password_hash: "hash".to_string(),
            first_name: None,
            last_name: None,
            role: Role::Client,
            phone: None,
            avatar_url: None,
            is_active: true,
        }
    }

    #[tokio::test]
    async fn ids_increase_and_emails_are_unique_ignoring_case() {
        let store = InMemoryProfileStore::new();
        let a = store.insert(new_profile("a@x.io")).await.unwrap();
        let b = store.insert(new_profile("b@x.io")).await.unwrap();
        assert!(b.id.value() > a.id.value());

        let dup = store.insert(new_profile("A@X.IO")).await;
        assert!(matches!(dup, Err(DomainError::Conflict(_))));

        let found = store.find_by_email_ignore_case(" B@x.io ").await.unwrap();
        assert_eq!(found.map(|r| r.id), Some(b.id));

        let c = store.insert(new_profile("Ödön@x.io")).await.unwrap();
        let dup = store.insert(new_profile("ödön@X.io")).await;
        assert!(matches!(dup, Err(DomainError::Conflict(_))));
        let found = store.find_by_email_ignore_case("ÖDÖN@x.io").await.unwrap();
        assert_eq!(found.map(|r| r.id), Some(c.id));
    }

    #[tokio::test]
    async fn save_rejects_email_owned_by_another_row() {
        let store = InMemoryProfileStore::new();
        let a = store.insert(new_profile("a@x.io")).await.unwrap();
        store.insert(new_profile("b@x.io")).await.unwrap();

        let mut changed = a.clone();
        changed.email = "b@x.io".into();
        assert!(matches!(store.save(&changed).await, Err(DomainError::Conflict(_))));

        changed.email = "A@x.io".into();
        let saved = store.save(&changed).await.unwrap();
        assert_eq!(saved.email, "A@x.io");
        assert!(saved.updated_at >= a.updated_at);
    }

    #[tokio::test]
    async fn delete_reports_whether_a_row_existed() {
        let store = InMemoryProfileStore::new();
        let a = store.insert(new_profile("a@x.io")).await.unwrap();
        assert!(store.delete(a.id).await.unwrap());
        assert!(!store.delete(a.id).await.unwrap());
    }
}
