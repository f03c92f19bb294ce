//! Profile Store → identity provider propagation, both ends of the wire.
//!
//! The caller side ([`HttpSyncPropagator`]) forwards committed profile
//! changes once and never fails the caller. The receiving side
//! ([`IdentitySyncService`]) applies them to the provider, treating an
//! absent user as success.

pub mod propagator;
pub mod receiver;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub use propagator::HttpSyncPropagator;
pub use receiver::{IdentitySyncService, SyncOutcome, set_realm_role};

/// Field changes carried by an update propagation.
///
/// On the wire every field is a string; an empty string means "not
/// applicable". The receiver applies names whenever present, and email and
/// role only when non-blank.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncUpdate {
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
}

impl SyncUpdate {
    /// The body as sent: every field present, `""` standing in for `None`.
    pub fn to_wire(&self) -> SyncUpdate {
        let filled = |v: &Option<String>| Some(v.clone().unwrap_or_default());
        SyncUpdate {
            first_name: filled(&self.first_name),
            last_name: filled(&self.last_name),
            email: filled(&self.email),
            role: filled(&self.role),
        }
    }
}

/// Best-effort forwarding of committed Profile Store mutations.
///
/// Implementations must not fail: the local change has already committed.
#[async_trait]
pub trait ProfileSync: Send + Sync {
    async fn propagate_update(&self, old_email: &str, update: &SyncUpdate);

    async fn propagate_delete(&self, email: &str);
}

/// Propagation switched off.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopSync;

#[async_trait]
impl ProfileSync for NoopSync {
    async fn propagate_update(&self, _old_email: &str, _update: &SyncUpdate) {}

    async fn propagate_delete(&self, _email: &str) {}
}
