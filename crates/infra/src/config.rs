//! Process configuration, loaded once at start-up and immutable afterwards.
//!
//! Every loader has a `from_lookup` form taking a key → value closure so tests
//! never touch the process environment. Blank values count as absent.

use std::net::SocketAddr;

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing required setting {0}")]
    Missing(&'static str),

    #[error("invalid value for {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

/// Administrative access to the identity provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeycloakConfig {
    pub server_url: String,
    pub realm: String,
    pub admin_realm: String,
    pub admin_username: Option<String>,
    pub admin_password: Option<String>,
    pub admin_client_id: String,
    pub admin_client_secret: Option<String>,
    /// Client used for end-user password grants (`/api/auth/token`).
    pub client_id: String,
    pub client_secret: Option<String>,
}

/// Bearer-token verification keys.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JwtConfig {
    pub hs256_secret: Option<String>,
    pub rsa_public_key_pem: Option<String>,
    pub issuer: Option<String>,
}

/// Caller side of update/delete propagation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncConfig {
    pub base_url: Option<String>,
    pub service_secret: Option<String>,
}

impl SyncConfig {
    /// Propagation runs only when both the base URL and the secret are set.
    pub fn is_configured(&self) -> bool {
        self.base_url.is_some() && self.service_secret.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityServiceConfig {
    pub bind_addr: SocketAddr,
    /// `None` runs against the in-memory provider (dev mode).
    pub keycloak: Option<KeycloakConfig>,
    /// Blank means every gated call is refused.
    pub service_secret: String,
    /// `None` provisions profiles in-process (dev mode).
    pub profile_service_url: Option<String>,
    pub jwt: JwtConfig,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileServiceConfig {
    pub bind_addr: SocketAddr,
    /// `None` keeps profiles in memory.
    pub database_url: Option<String>,
    pub sync: SyncConfig,
}

impl IdentityServiceConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| non_blank(lookup(key));

        Ok(Self {
            bind_addr: bind_addr(get("IDENTITY_BIND_ADDR"), "IDENTITY_BIND_ADDR", "0.0.0.0:8079")?,
            keycloak: keycloak_config(&get)?,
            service_secret: get("SERVICE_SECRET").unwrap_or_default(),
            profile_service_url: get("PROFILE_SERVICE_URL").map(|u| normalize_base_url(&u)),
            jwt: JwtConfig {
                hs256_secret: get("JWT_HS256_SECRET"),
                rsa_public_key_pem: get("JWT_RSA_PUBLIC_KEY_PEM"),
                issuer: get("JWT_ISSUER"),
            },
        })
    }
}

impl ProfileServiceConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| non_blank(lookup(key));

        Ok(Self {
            bind_addr: bind_addr(get("PROFILE_BIND_ADDR"), "PROFILE_BIND_ADDR", "0.0.0.0:8081")?,
            database_url: get("DATABASE_URL"),
            sync: SyncConfig {
                base_url: get("IDENTITY_SERVICE_URL").map(|u| normalize_base_url(&u)),
                service_secret: get("SERVICE_SECRET"),
            },
        })
    }
}

fn keycloak_config<F>(get: &F) -> Result<Option<KeycloakConfig>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let Some(server_url) = get("KEYCLOAK_SERVER_URL") else {
        return Ok(None);
    };

    let realm = get("KEYCLOAK_REALM").ok_or(ConfigError::Missing("KEYCLOAK_REALM"))?;
    // End-user password grants run in `realm`, where `admin-cli` is rarely enabled.
    let client_id = get("KEYCLOAK_CLIENT_ID").ok_or(ConfigError::Missing("KEYCLOAK_CLIENT_ID"))?;
    let admin_username = get("KEYCLOAK_ADMIN_USERNAME");
    let admin_password = get("KEYCLOAK_ADMIN_PASSWORD");
    let admin_client_secret = get("KEYCLOAK_ADMIN_CLIENT_SECRET");

    match (&admin_username, &admin_password, &admin_client_secret) {
        (Some(_), Some(_), _) | (None, None, Some(_)) => {}
        (Some(_), None, _) => return Err(ConfigError::Missing("KEYCLOAK_ADMIN_PASSWORD")),
        _ => return Err(ConfigError::Missing("KEYCLOAK_ADMIN_USERNAME")),
    }

    Ok(Some(KeycloakConfig {
        server_url: normalize_base_url(&server_url),
        realm,
        admin_realm: get("KEYCLOAK_ADMIN_REALM").unwrap_or_else(|| "master".to_string()),
        admin_username,
        admin_password,
        admin_client_id: get("KEYCLOAK_ADMIN_CLIENT_ID").unwrap_or_else(|| "admin-cli".to_string()),
        admin_client_secret,
        client_id,
        client_secret: get("KEYCLOAK_CLIENT_SECRET"),
    }))
}

fn bind_addr(
    raw: Option<String>,
    key: &'static str,
    default: &str,
) -> Result<SocketAddr, ConfigError> {
    raw.as_deref()
        .unwrap_or(default)
        .parse()
        .map_err(|e: std::net::AddrParseError| ConfigError::Invalid {
            key,
            reason: e.to_string(),
        })
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Trim and drop trailing slashes so paths can be appended.
pub fn normalize_base_url(raw: &str) -> String {
    raw.trim().trim_end_matches('/').to_string()
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn identity_defaults_to_dev_mode() {
        let cfg = IdentityServiceConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(cfg.bind_addr.port(), 8079);
        assert!(cfg.keycloak.is_none());
        assert!(cfg.profile_service_url.is_none());
        assert_eq!(cfg.service_secret, "");
    }

    #[test]
    fn keycloak_settings_are_validated_together() {
        let err = IdentityServiceConfig::from_lookup(lookup(&[(
            "KEYCLOAK_SERVER_URL",
            "http://kc:8080",
        )]))
        .unwrap_err();
        assert_eq!(err, ConfigError::Missing("KEYCLOAK_REALM"));

        let err = IdentityServiceConfig::from_lookup(lookup(&[
            ("KEYCLOAK_SERVER_URL", "http://kc:8080"),
            ("KEYCLOAK_REALM", "app"),
            ("KEYCLOAK_ADMIN_USERNAME", "admin"),
            ("KEYCLOAK_ADMIN_PASSWORD", "pw"),
        ]))
        .unwrap_err();
        assert_eq!(err, ConfigError::Missing("KEYCLOAK_CLIENT_ID"));

        let err = IdentityServiceConfig::from_lookup(lookup(&[
            ("KEYCLOAK_SERVER_URL", "http://kc:8080"),
            ("KEYCLOAK_REALM", "app"),
            ("KEYCLOAK_CLIENT_ID", "web"),
            ("KEYCLOAK_ADMIN_USERNAME", "admin"),
        ]))
        .unwrap_err();
        assert_eq!(err, ConfigError::Missing("KEYCLOAK_ADMIN_PASSWORD"));
    }

    #[test]
    fn keycloak_config_with_admin_user() {
        let cfg = IdentityServiceConfig::from_lookup(lookup(&[
            ("KEYCLOAK_SERVER_URL", " http://kc:8080/ "),
            ("KEYCLOAK_REALM", "app"),
            ("KEYCLOAK_ADMIN_USERNAME", "admin"),
            ("KEYCLOAK_ADMIN_PASSWORD", "pw"),
            ("KEYCLOAK_ADMIN_CLIENT_SECRET", "  "),
            ("KEYCLOAK_CLIENT_ID", "web"),
        ]))
        .unwrap();

        let kc = cfg.keycloak.unwrap();
        assert_eq!(kc.server_url, "http://kc:8080");
        assert_eq!(kc.admin_realm, "master");
        assert_eq!(kc.admin_client_id, "admin-cli");
        assert_eq!(kc.admin_client_secret, None);
        assert_eq!(kc.client_id, "web");
    }

    #[test]
    fn client_credentials_only_is_accepted() {
        let cfg = IdentityServiceConfig::from_lookup(lookup(&[
            ("KEYCLOAK_SERVER_URL", "http://kc:8080"),
            ("KEYCLOAK_REALM", "app"),
            ("KEYCLOAK_ADMIN_CLIENT_SECRET", "s"),
            ("KEYCLOAK_CLIENT_ID", "web"),
        ]))
        .unwrap();
        assert!(cfg.keycloak.unwrap().admin_username.is_none());
    }

    #[test]
    fn bad_bind_addr_is_reported() {
        let err = ProfileServiceConfig::from_lookup(lookup(&[("PROFILE_BIND_ADDR", "nope")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "PROFILE_BIND_ADDR", .. }));
    }

    #[test]
    fn sync_needs_both_url_and_secret() {
        let cfg = ProfileServiceConfig::from_lookup(lookup(&[(
            "IDENTITY_SERVICE_URL",
            "http://identity:8079/",
        )]))
        .unwrap();
        assert_eq!(cfg.sync.base_url.as_deref(), Some("http://identity:8079"));
        assert!(!cfg.sync.is_configured());

        let cfg = ProfileServiceConfig::from_lookup(lookup(&[
            ("IDENTITY_SERVICE_URL", "http://identity:8079"),
            ("SERVICE_SECRET", "s"),
        ]))
        .unwrap();
        assert!(cfg.sync.is_configured());
    }
}
