//! Token claims → authority mapping.
//!
//! Input is the claim map of an already-verified token, shaped like:
//!
//! ```text
//! {
//!   "realm_access":    { "roles": ["client", ...] },
//!   "resource_access": { "<client>": { "roles": ["..."] }, ... }
//! }
//! ```

use std::collections::HashSet;

use serde_json::Value;

use crate::Authority;

/// Turn a verified token's claims into the internal authority list.
///
/// Realm roles come first, then every client's roles. Exact-string duplicates
/// are dropped (first occurrence wins) *before* the `ROLE_` + uppercase
/// transform, so `"client"` and `"CLIENT"` survive as two entries that both
/// read `ROLE_CLIENT`. Malformed sections contribute nothing; a claim map that
/// is not a JSON object yields no authorities.
///
/// - No IO
/// - Deterministic for identical input
pub fn map_claims_to_authorities(claims: &Value) -> Vec<Authority> {
    let mut seen: HashSet<&str> = HashSet::new();

    realm_roles(claims)
        .into_iter()
        .chain(resource_roles(claims))
        .filter(|role| seen.insert(*role))
        .map(Authority::from_role_name)
        .collect()
}

fn realm_roles(claims: &Value) -> Vec<&str> {
    claims
        .get("realm_access")
        .and_then(|access| access.get("roles"))
        .map(string_items)
        .unwrap_or_default()
}

fn resource_roles(claims: &Value) -> Vec<&str> {
    let Some(clients) = claims.get("resource_access").and_then(Value::as_object) else {
        return Vec::new();
    };

    clients
        .values()
        .filter(|client| client.is_object())
        .filter_map(|client| client.get("roles"))
        .flat_map(string_items)
        .collect()
}

fn string_items(list: &Value) -> Vec<&str> {
    list.as_array()
        .map(|items| items.iter().filter_map(Value::as_str).collect())
        .unwrap_or_default()
}
