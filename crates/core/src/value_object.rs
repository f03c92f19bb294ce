//! Value objects: equality by value, not identity.

use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// Marker trait for value objects (immutable, compared by value).
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}

/// Trimmed, Unicode case-insensitive email equality.
///
/// Usernames at the identity provider and `lower(email)` in Postgres both fold
/// with full Unicode rules; every in-process email match must agree with them.
pub fn emails_match(a: &str, b: &str) -> bool {
    let (a, b) = (a.trim(), b.trim());
    a == b || a.to_lowercase() == b.to_lowercase()
}

/// A trimmed, non-empty email address.
///
/// Email is the correlation key between the identity provider and the
/// Profile Store. Casing is preserved as supplied; comparisons across stores
/// go through [`emails_match`], which folds case with Unicode rules.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Email(String);

impl Email {
    pub fn parse(raw: &str) -> Result<Self, DomainError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(DomainError::validation("Email is required."));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Case-insensitive comparison against a raw (possibly untrimmed) value.
    pub fn matches(&self, other: &str) -> bool {
        emails_match(&self.0, other)
    }
}

impl ValueObject for Email {}

impl core::fmt::Display for Email {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Email {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Email> for String {
    fn from(value: Email) -> Self {
        value.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trims_and_rejects_blank() {
        assert_eq!(Email::parse("  a@b.io ").unwrap().as_str(), "a@b.io");
        assert!(matches!(Email::parse("   "), Err(DomainError::Validation(_))));
        assert!(matches!(Email::parse(""), Err(DomainError::Validation(_))));
    }

    #[test]
    fn matching_ignores_case() {
        let email = Email::parse("Jane@Example.com").unwrap();
        assert!(email.matches("jane@example.COM "));
        assert!(!email.matches("john@example.com"));
    }

    #[test]
    fn matching_folds_non_ascii_case() {
        assert!(emails_match("Élodie@X.io", " élodie@x.io"));
        assert!(emails_match("STRASSE@ÖL.de", "strasse@öl.de"));
        assert!(!emails_match("élodie@x.io", "elodie@x.io"));
        assert!(Email::parse("Łukasz@pl.pl").unwrap().matches("łukasz@PL.pl"));
    }

    #[test]
    fn deserialization_validates() {
        let ok: Email = serde_json::from_str("\" x@y.z\"").unwrap();
        assert_eq!(ok.as_str(), "x@y.z");
        assert!(serde_json::from_str::<Email>("\"  \"").is_err());
    }
}
