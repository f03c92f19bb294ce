//! Store-local identifiers.
//!
//! The two stores never share identifiers; email is the only correlation key.

use core::str::FromStr;
use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// Numeric identifier assigned by the Profile Store.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProfileId(i64);

impl ProfileId {
    pub fn new(value: i64) -> Self {
        Self(value)
    }

    pub fn value(&self) -> i64 {
        self.0
    }
}

impl core::fmt::Display for ProfileId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

impl From<i64> for ProfileId {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl FromStr for ProfileId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<i64>()
            .map(Self)
            .map_err(|e| DomainError::validation(format!("ProfileId: {e}")))
    }
}

/// Opaque identifier assigned by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IdentityId(String);

impl IdentityId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for IdentityId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for IdentityId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn profile_id_parses_path_segments() {
        assert_eq!("42".parse::<ProfileId>().unwrap(), ProfileId::new(42));
        assert!(matches!("abc".parse::<ProfileId>(), Err(DomainError::Validation(_))));
    }

    #[test]
    fn identity_id_is_transparent_in_json() {
        let id = IdentityId::new("8f1c-42");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"8f1c-42\"");
    }
}
