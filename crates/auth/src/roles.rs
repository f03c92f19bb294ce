use core::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use idsync_core::DomainError;

/// Business role shared by the identity provider and the Profile Store.
///
/// The set is closed. Any role text crossing a service boundary goes through
/// [`Role::normalize_and_validate`] before it is compared or stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Role {
    Client,
    Freelancer,
    Admin,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("Invalid role '{0}'. Allowed: [CLIENT, FREELANCER, ADMIN]")]
pub struct InvalidRole(pub String);

impl Role {
    /// The application's role vocabulary, in declaration order.
    pub const ALL: [Role; 3] = [Role::Client, Role::Freelancer, Role::Admin];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Client => "CLIENT",
            Role::Freelancer => "FREELANCER",
            Role::Admin => "ADMIN",
        }
    }

    /// Trim, upper-case, then match against the closed set.
    pub fn normalize_and_validate(raw: &str) -> Result<Role, InvalidRole> {
        let normalized = raw.trim().to_uppercase();
        Role::ALL
            .into_iter()
            .find(|r| r.as_str() == normalized)
            .ok_or(InvalidRole(normalized))
    }

    /// Whether `name` (exact, as stored by the provider) belongs to the vocabulary.
    pub fn is_app_role(name: &str) -> bool {
        Role::ALL.iter().any(|r| r.as_str() == name)
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = InvalidRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::normalize_and_validate(s)
    }
}

impl TryFrom<String> for Role {
    type Error = InvalidRole;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Role::normalize_and_validate(&value)
    }
}

impl From<Role> for String {
    fn from(value: Role) -> Self {
        value.as_str().to_string()
    }
}

impl From<InvalidRole> for DomainError {
    fn from(value: InvalidRole) -> Self {
        DomainError::Validation(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn accepts_any_casing_and_surrounding_whitespace() {
        assert_eq!(Role::normalize_and_validate("client"), Ok(Role::Client));
        assert_eq!(Role::normalize_and_validate("Freelancer"), Ok(Role::Freelancer));
        assert_eq!(Role::normalize_and_validate("ADMIN"), Ok(Role::Admin));
        assert_eq!(Role::normalize_and_validate("  admin\t"), Ok(Role::Admin));
    }

    #[test]
    fn rejects_unknown_and_empty() {
        assert_eq!(
            Role::normalize_and_validate("superuser"),
            Err(InvalidRole("SUPERUSER".to_string()))
        );
        assert!(Role::normalize_and_validate("").is_err());
        assert!(Role::normalize_and_validate("ROLE_ADMIN").is_err());
    }

    #[test]
    fn invalid_role_maps_to_validation_error() {
        let err: DomainError = Role::normalize_and_validate("x").unwrap_err().into();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn serde_uses_normalized_names() {
        let role: Role = serde_json::from_str("\"freelancer\"").unwrap();
        assert_eq!(role, Role::Freelancer);
        assert_eq!(serde_json::to_string(&role).unwrap(), "\"FREELANCER\"");
        assert!(serde_json::from_str::<Role>("\"owner\"").is_err());
    }

    #[test]
    fn app_role_membership_is_exact() {
        assert!(Role::is_app_role("CLIENT"));
        assert!(!Role::is_app_role("client"));
        assert!(!Role::is_app_role("offline_access"));
    }

    proptest! {
        #[test]
        fn every_casing_of_a_valid_role_normalizes(
            idx in 0usize..3,
            mask in proptest::collection::vec(any::<bool>(), 10),
        ) {
            let role = Role::ALL[idx];
            let mixed: String = role
                .as_str()
                .chars()
                .zip(mask.iter().cycle())
                .map(|(c, lower)| if *lower { c.to_ascii_lowercase() } else { c })
                .collect();
            prop_assert_eq!(Role::normalize_and_validate(&mixed), Ok(role));
        }

        #[test]
        fn text_outside_the_vocabulary_is_rejected(raw in "[a-z_]{0,12}") {
            let upper = raw.to_uppercase();
            prop_assume!(!Role::is_app_role(&upper));
            prop_assert!(Role::normalize_and_validate(&raw).is_err());
        }
    }
}
