//! Configuration loading for the Warden CLI
//!
//! `.properties` files are read the way the scheduler reads its plugin
//! properties; any other file is TOML:
//!
//! ```toml
//! host = "ldap.example.com"
//! user_base = "ou=people,dc=example,dc=com"
//! bind_account = "cn=reader,dc=example,dc=com"
//! bind_password = "secret"
//! allowed_groups = ["scheduler-users"]
//! group_search_base = "ou=groups,dc=example,dc=com"
//! ```

use anyhow::{Context, Result};
use std::path::Path;
use tracing::debug;
use warden_core::Props;
use warden_ldap::LdapUserManagerConfig;

pub fn load(path: Option<&Path>) -> Result<LdapUserManagerConfig> {
    let Some(path) = path else {
        debug!("No config file given, reading WARDEN_LDAP_* variables");
        return LdapUserManagerConfig::from_env().context("Invalid WARDEN_LDAP_* environment");
    };

    let is_properties = path
        .extension()
        .map(|ext| ext.eq_ignore_ascii_case("properties"))
        .unwrap_or(false);

    debug!("Loading configuration from {}", path.display());
    if is_properties {
        let props = Props::from_file(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        LdapUserManagerConfig::from_props(&props)
            .with_context(|| format!("Invalid properties in {}", path.display()))
    } else {
        LdapUserManagerConfig::from_file(&path.to_string_lossy())
            .with_context(|| format!("Invalid config file {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn temp_file(suffix: &str, content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_load_properties() {
        let file = temp_file(
            ".properties",
            "user.manager.ldap.host=ldap.forumsys.com\n\
             user.manager.ldap.port=389\n\
             user.manager.ldap.userBase=dc=example,dc=com\n\
             user.manager.ldap.userIdProperty=uid\n",
        );

        let config = load(Some(file.path())).unwrap();
        assert_eq!(config.server_url(), "ldap://ldap.forumsys.com:389");
        assert_eq!(config.email_property, "");
    }

    #[test]
    fn test_load_toml() {
        let file = temp_file(
            ".toml",
            "host = \"ldap.example.com\"\nport = 636\nuse_ssl = true\nuser_base = \"dc=example,dc=com\"\n",
        );

        let config = load(Some(file.path())).unwrap();
        assert_eq!(config.server_url(), "ldaps://ldap.example.com:636");
        assert_eq!(config.email_property, "mail");
    }

    #[test]
    fn test_missing_property_names_the_file() {
        let file = temp_file(".properties", "user.manager.ldap.host=localhost\n");

        let err = load(Some(file.path())).unwrap_err();
        assert!(format!("{:#}", err).contains("user.manager.ldap.port"));
    }
}
