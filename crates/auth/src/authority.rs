use std::borrow::Cow;

use serde::{Deserialize, Serialize};

use crate::Role;

/// Authority identifier consumed by access-control checks.
///
/// Authorities are opaque strings of the form `ROLE_<NAME>`; checks are plain
/// set-membership tests on the exact string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Authority(Cow<'static, str>);

impl Authority {
    pub const PREFIX: &'static str = "ROLE_";

    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    /// `"ROLE_" + uppercase(role_name)`.
    pub fn from_role_name(role_name: &str) -> Self {
        Self(Cow::Owned(format!("{}{}", Self::PREFIX, role_name.to_uppercase())))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<Role> for Authority {
    fn from(value: Role) -> Self {
        Authority::from_role_name(value.as_str())
    }
}

impl core::fmt::Display for Authority {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}
