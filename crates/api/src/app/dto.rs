//! Request/response bodies. Field names are camelCase on the wire.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use idsync_auth::Role;
use idsync_core::{DomainResult, IdentityId};
use idsync_infra::profile::{CreateProfile, ProfileRecord, ProfileUpdate};
use idsync_infra::saga::RegistrationRequest;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    #[serde(default)]
    pub role: String,
}

impl From<RegisterRequest> for RegistrationRequest {
    fn from(body: RegisterRequest) -> Self {
        RegistrationRequest {
            email: body.email,
            password: body.password,
            first_name: body.first_name,
            last_name: body.last_name,
            role: body.role,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RegisteredResponse {
    pub id: IdentityId,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TokenRequest {
    #[serde(default, alias = "username")]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    #[serde(default)]
    pub email: String,
    pub password: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub role: Option<String>,
    pub phone: Option<String>,
    pub avatar_url: Option<String>,
    pub is_active: Option<bool>,
}

impl CreateUserRequest {
    pub fn into_command(self) -> DomainResult<CreateProfile> {
        let role = Role::normalize_and_validate(self.role.as_deref().unwrap_or_default())?;
        Ok(CreateProfile {
            email: self.email,
            password: self.password,
            first_name: self.first_name,
            last_name: self.last_name,
            role,
            phone: self.phone,
            avatar_url: self.avatar_url,
            is_active: self.is_active,
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRequest {
    pub email: Option<String>,
    pub password: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub role: Option<String>,
    pub phone: Option<String>,
    pub avatar_url: Option<String>,
    pub is_active: Option<bool>,
}

impl UpdateUserRequest {
    pub fn into_command(self) -> DomainResult<ProfileUpdate> {
        let role = self
            .role
            .as_deref()
            .map(Role::normalize_and_validate)
            .transpose()?;
        Ok(ProfileUpdate {
            email: self.email,
            password: self.password,
            first_name: self.first_name,
            last_name: self.last_name,
            role,
            phone: self.phone,
            avatar_url: self.avatar_url,
            is_active: self.is_active,
        })
    }
}

/// Outward view of a profile; the password hash never leaves the service.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileView {
    pub id: i64,
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub role: Role,
    pub phone: Option<String>,
    pub avatar_url: Option<String>,
    pub is_active: bool,
    pub created_at: String,
    pub updated_at: String,
}

fn format_timestamp(at: &DateTime<Utc>) -> String {
    at.format(TIMESTAMP_FORMAT).to_string()
}

impl From<ProfileRecord> for ProfileView {
    fn from(record: ProfileRecord) -> Self {
        Self {
            id: record.id.value(),
            created_at: format_timestamp(&record.created_at),
            updated_at: format_timestamp(&record.updated_at),
            email: record.email,
            first_name: record.first_name,
            last_name: record.last_name,
            role: record.role,
            phone: record.phone,
            avatar_url: record.avatar_url,
            is_active: record.is_active,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use idsync_core::{DomainError, ProfileId};

    #[test]
    fn profile_view_hides_hash_and_formats_timestamps() {
        let at = Utc.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap();
        let view = ProfileView::from(ProfileRecord {
            id: ProfileId::new(7),
            email: "a@x.io".into(),
            password_hash: "$argon2id$secret".into(),
            first_name: Some("A".into()),
            last_name: None,
            role: Role::Freelancer,
            phone: None,
            avatar_url: None,
            is_active: true,
            created_at: at,
            updated_at: at,
        });

        let json = serde_json::to_value(view).unwrap();
        assert_eq!(json["createdAt"], "2024-03-09T14:05:07");
        assert_eq!(json["role"], "FREELANCER");
        assert_eq!(json["isActive"], true);
        assert!(json.get("passwordHash").is_none());
        assert!(!json.to_string().contains("argon2"));
    }

    #[test]
    fn create_request_requires_a_valid_role() {
        let body: CreateUserRequest = serde_json::from_value(serde_json::json!({
            "email": "a@x.io",
            "role": "client"
        }))
        .unwrap();
        assert_eq!(body.into_command().unwrap().role, Role::Client);

        let missing: CreateUserRequest =
            serde_json::from_value(serde_json::json!({"email": "a@x.io"})).unwrap();
        assert!(matches!(missing.into_command(), Err(DomainError::Validation(_))));
    }
}
