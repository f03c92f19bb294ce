use std::sync::Arc;

use idsync_auth::Role;
use idsync_core::{DomainResult, IdentityId};

use super::SyncUpdate;
use crate::idp::{IdentityProvider, find_by_email_or_username};

/// Result of a sync-by-email call. Absence is not an error on this path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    Applied,
    Absent,
}

/// Receiving end of profile propagation, run behind the trust gate.
#[derive(Clone)]
pub struct IdentitySyncService {
    idp: Arc<dyn IdentityProvider>,
}

impl IdentitySyncService {
    pub fn new(idp: Arc<dyn IdentityProvider>) -> Self {
        Self { idp }
    }

    pub async fn update_by_email(&self, target: &str, update: &SyncUpdate) -> DomainResult<SyncOutcome> {
        let role = non_blank(update.role.as_deref())
            .map(Role::normalize_and_validate)
            .transpose()?;

        let Some(mut record) = find_by_email_or_username(self.idp.as_ref(), target).await? else {
            tracing::warn!(email = %target.trim(), "no identity found for update by email");
            return Ok(SyncOutcome::Absent);
        };

        if let Some(first_name) = &update.first_name {
            record.first_name = Some(first_name.clone());
        }
        if let Some(last_name) = &update.last_name {
            record.last_name = Some(last_name.clone());
        }
        if let Some(email) = non_blank(update.email.as_deref()) {
            record.email = Some(email.to_string());
            record.username = email.to_string();
        }
        self.idp.update_user(&record).await?;

        if let Some(role) = role {
            set_realm_role(self.idp.as_ref(), &record.id, role).await?;
        }

        tracing::info!(
            email = %target.trim(),
            new_email = ?record.email,
            role = ?role,
            "updated identity by email"
        );
        Ok(SyncOutcome::Applied)
    }

    pub async fn delete_by_email(&self, target: &str) -> DomainResult<SyncOutcome> {
        let Some(record) = find_by_email_or_username(self.idp.as_ref(), target).await? else {
            tracing::debug!(email = %target.trim(), "no identity found for delete by email");
            return Ok(SyncOutcome::Absent);
        };

        self.idp.delete_user(&record.id).await?;
        tracing::info!(email = %target.trim(), "deleted identity by email");
        Ok(SyncOutcome::Applied)
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Leave `role` as the only application role on the identity.
///
/// Every application role is removed first; a removal that fails (typically
/// because the role was not assigned) is ignored. Roles outside the
/// application vocabulary are untouched.
pub async fn set_realm_role(idp: &dyn IdentityProvider, id: &IdentityId, role: Role) -> DomainResult<()> {
    for existing in Role::ALL {
        if let Err(err) = idp.remove_realm_role(id, existing.as_str()).await {
            tracing::debug!(identity = %id, role = %existing, error = %err, "role removal skipped");
        }
    }
    idp.add_realm_role(id, role.as_str()).await
}
