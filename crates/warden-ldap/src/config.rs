//! LDAP user manager configuration
//!
//! Loaded from the scheduler's plugin properties (`user.manager.ldap.*`),
//! from a TOML file, or from `WARDEN_LDAP_*` environment variables.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;
use warden_core::{Error, Props, Result};

/// Plugin property keys
pub mod keys {
    pub const HOST: &str = "user.manager.ldap.host";
    pub const PORT: &str = "user.manager.ldap.port";
    pub const USE_SSL: &str = "user.manager.ldap.useSsl";
    pub const START_TLS: &str = "user.manager.ldap.startTls";
    pub const SKIP_TLS_VERIFY: &str = "user.manager.ldap.skipTlsVerify";
    pub const TIMEOUT_SECONDS: &str = "user.manager.ldap.timeoutSeconds";
    pub const USER_BASE: &str = "user.manager.ldap.userBase";
    pub const USERID_PROPERTY: &str = "user.manager.ldap.userIdProperty";
    pub const EMAIL_PROPERTY: &str = "user.manager.ldap.emailProperty";
    pub const BIND_ACCOUNT: &str = "user.manager.ldap.bindAccount";
    pub const BIND_PASSWORD: &str = "user.manager.ldap.bindPassword";
    pub const ALLOWED_GROUPS: &str = "user.manager.ldap.allowedGroups";
    pub const ADMIN_GROUPS: &str = "user.manager.ldap.adminGroups";
    pub const GROUP_SEARCH_BASE: &str = "user.manager.ldap.groupSearchBase";
    pub const GROUP_NAME_PROPERTY: &str = "user.manager.ldap.groupNameProperty";
    pub const EMBEDDED_GROUPS: &str = "user.manager.ldap.embeddedGroups";
    pub const ROLE_SUPPORT: &str = "user.manager.ldap.roleSupport";
    pub const GROUPS_FILE: &str = "user.manager.ldap.groupsFile";
}

/// LDAP user manager configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LdapUserManagerConfig {
    /// LDAP server host name
    pub host: String,

    /// LDAP server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Connect with LDAPS
    #[serde(default)]
    pub use_ssl: bool,

    /// Upgrade a plain connection with STARTTLS
    #[serde(default)]
    pub start_tls: bool,

    /// Skip TLS certificate verification (not recommended for production)
    #[serde(default)]
    pub skip_tls_verify: bool,

    /// Connection timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,

    /// Base DN for user searches
    /// Example: "ou=users,dc=example,dc=com"
    pub user_base: String,

    /// Attribute holding the login name
    #[serde(default = "default_userid_property")]
    pub user_id_property: String,

    /// Attribute holding the email address, empty to skip
    #[serde(default = "default_email_property")]
    pub email_property: String,

    /// Service account DN, empty for anonymous searches
    #[serde(default)]
    pub bind_account: String,

    #[serde(default)]
    pub bind_password: String,

    /// Users must belong to one of these groups; empty allows everyone
    #[serde(default)]
    pub allowed_groups: Vec<String>,

    /// Members of these groups get the admin role
    #[serde(default)]
    pub admin_groups: Vec<String>,

    /// Base DN for group searches
    #[serde(default)]
    pub group_search_base: String,

    /// Attribute naming a group
    #[serde(default = "default_group_name_property")]
    pub group_name_property: String,

    /// Read memberships from the user's `memberOf` attribute instead of
    /// searching group entries
    #[serde(default)]
    pub embedded_groups: bool,

    /// Resolve all groups of a user and map them to roles
    #[serde(default)]
    pub role_support: bool,

    /// XML file mapping groups to roles and roles to permissions
    #[serde(default)]
    pub groups_file: Option<PathBuf>,
}

fn default_port() -> u16 {
    389
}

fn default_timeout() -> u64 {
    10
}

fn default_userid_property() -> String {
    "uid".to_string()
}

fn default_email_property() -> String {
    "mail".to_string()
}

fn default_group_name_property() -> String {
    "cn".to_string()
}

impl Default for LdapUserManagerConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: default_port(),
            use_ssl: false,
            start_tls: false,
            skip_tls_verify: false,
            timeout_seconds: default_timeout(),
            user_base: String::new(),
            user_id_property: default_userid_property(),
            email_property: default_email_property(),
            bind_account: String::new(),
            bind_password: String::new(),
            allowed_groups: Vec::new(),
            admin_groups: Vec::new(),
            group_search_base: String::new(),
            group_name_property: default_group_name_property(),
            embedded_groups: false,
            role_support: false,
            groups_file: None,
        }
    }
}

impl LdapUserManagerConfig {
    /// Build from the scheduler's plugin properties
    pub fn from_props(props: &Props) -> Result<Self> {
        Ok(Self {
            host: props.get_string(keys::HOST)?,
            port: props.get_u16(keys::PORT)?,
            use_ssl: props.get_bool(keys::USE_SSL, false)?,
            start_tls: props.get_bool(keys::START_TLS, false)?,
            skip_tls_verify: props.get_bool(keys::SKIP_TLS_VERIFY, false)?,
            timeout_seconds: props.get_u64_or(keys::TIMEOUT_SECONDS, default_timeout())?,
            user_base: props.get_string(keys::USER_BASE)?,
            user_id_property: props.get_string(keys::USERID_PROPERTY)?,
            email_property: props.get_string_or(keys::EMAIL_PROPERTY, ""),
            bind_account: props.get_string_or(keys::BIND_ACCOUNT, ""),
            bind_password: props.get_string_or(keys::BIND_PASSWORD, ""),
            allowed_groups: props.get_string_list(keys::ALLOWED_GROUPS),
            admin_groups: props.get_string_list(keys::ADMIN_GROUPS),
            group_search_base: props.get_string_or(keys::GROUP_SEARCH_BASE, ""),
            group_name_property: props
                .get_string_or(keys::GROUP_NAME_PROPERTY, &default_group_name_property()),
            embedded_groups: props.get_bool(keys::EMBEDDED_GROUPS, false)?,
            role_support: props.get_bool(keys::ROLE_SUPPORT, false)?,
            groups_file: props
                .get(keys::GROUPS_FILE)
                .filter(|v| !v.is_empty())
                .map(PathBuf::from),
        })
    }

    pub fn from_file(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::InvalidConfig(format!("Failed to read config: {}", e)))?;

        toml::from_str(&content)
            .map_err(|e| Error::InvalidConfig(format!("Failed to parse config: {}", e)))
    }

    pub fn from_env() -> Result<Self> {
        Self::from_vars(|name| std::env::var(name).ok())
    }

    /// Same as [`from_env`](Self::from_env), reading variables through `var`
    pub fn from_vars(var: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();
        let flag = |name: &str| var(name).map(|v| parse_bool(name, &v)).transpose();

        if let Some(host) = var("WARDEN_LDAP_HOST") {
            config.host = host;
        }
        if let Some(port) = var("WARDEN_LDAP_PORT") {
            config.port = parse_number("WARDEN_LDAP_PORT", &port)?;
        }
        if let Some(use_ssl) = flag("WARDEN_LDAP_USE_SSL")? {
            config.use_ssl = use_ssl;
        }
        if let Some(start_tls) = flag("WARDEN_LDAP_START_TLS")? {
            config.start_tls = start_tls;
        }
        if let Some(skip) = flag("WARDEN_LDAP_SKIP_TLS_VERIFY")? {
            config.skip_tls_verify = skip;
        }
        if let Some(timeout) = var("WARDEN_LDAP_TIMEOUT_SECONDS") {
            config.timeout_seconds = parse_number("WARDEN_LDAP_TIMEOUT_SECONDS", &timeout)?;
        }
        if let Some(base) = var("WARDEN_LDAP_USER_BASE") {
            config.user_base = base;
        }
        if let Some(attr) = var("WARDEN_LDAP_USERID_PROPERTY") {
            config.user_id_property = attr;
        }
        if let Some(attr) = var("WARDEN_LDAP_EMAIL_PROPERTY") {
            config.email_property = attr;
        }
        if let Some(dn) = var("WARDEN_LDAP_BIND_ACCOUNT") {
            config.bind_account = dn;
        }
        if let Some(password) = var("WARDEN_LDAP_BIND_PASSWORD") {
            config.bind_password = password;
        }
        if let Some(groups) = var("WARDEN_LDAP_ALLOWED_GROUPS") {
            config.allowed_groups = split_list(&groups);
        }
        if let Some(groups) = var("WARDEN_LDAP_ADMIN_GROUPS") {
            config.admin_groups = split_list(&groups);
        }
        if let Some(base) = var("WARDEN_LDAP_GROUP_SEARCH_BASE") {
            config.group_search_base = base;
        }
        if let Some(attr) = var("WARDEN_LDAP_GROUP_NAME_PROPERTY") {
            config.group_name_property = attr;
        }
        if let Some(embedded) = flag("WARDEN_LDAP_EMBEDDED_GROUPS")? {
            config.embedded_groups = embedded;
        }
        if let Some(file) = var("WARDEN_LDAP_GROUPS_FILE").filter(|f| !f.is_empty()) {
            config.groups_file = Some(PathBuf::from(file));
        }
        // A groups file alone turns role support on
        config.role_support = flag("WARDEN_LDAP_ROLE_SUPPORT")?
            .unwrap_or(config.groups_file.is_some());

        Ok(config)
    }

    /// `ldap://host:port` or `ldaps://host:port`
    pub fn server_url(&self) -> String {
        let scheme = if self.use_ssl { "ldaps" } else { "ldap" };
        format!("{}://{}:{}", scheme, self.host, self.port)
    }

    /// Whether any feature needs group membership lookups
    pub fn uses_groups(&self) -> bool {
        !self.allowed_groups.is_empty() || !self.admin_groups.is_empty() || self.role_support
    }

    pub fn validate(&self) -> Result<()> {
        if self.host.trim().is_empty() {
            return Err(Error::InvalidConfig("LDAP host is required".into()));
        }

        if self.port == 0 {
            return Err(Error::InvalidConfig("LDAP port must not be 0".into()));
        }

        if self.use_ssl && self.start_tls {
            return Err(Error::InvalidConfig(
                "useSsl and startTls are mutually exclusive".into(),
            ));
        }

        if self.user_base.trim().is_empty() {
            return Err(Error::InvalidConfig("User base DN is required".into()));
        }

        check_attribute("user id property", &self.user_id_property)?;
        check_attribute("group name property", &self.group_name_property)?;
        if !self.email_property.is_empty() {
            check_attribute("email property", &self.email_property)?;
        }

        if self.bind_account.is_empty() && !self.bind_password.is_empty() {
            return Err(Error::InvalidConfig(
                "Bind password is set but bind account is empty".into(),
            ));
        }

        if self.uses_groups() && !self.embedded_groups && self.group_search_base.trim().is_empty() {
            return Err(Error::InvalidConfig(
                "Group search base is required for group checks".into(),
            ));
        }

        if self.role_support && self.groups_file.is_none() {
            return Err(Error::InvalidConfig(
                "Role support requires a groups file".into(),
            ));
        }

        Ok(())
    }
}

/// Attribute descriptions are spliced into filters unescaped, so only
/// RFC 4512 descriptor characters are accepted.
fn check_attribute(what: &str, name: &str) -> Result<()> {
    let valid = name
        .chars()
        .next()
        .map(|c| c.is_ascii_alphanumeric())
        .unwrap_or(false)
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '.' || c == ';');

    if valid {
        Ok(())
    } else {
        Err(Error::InvalidConfig(format!("Invalid {}: '{}'", what, name)))
    }
}

fn parse_bool(name: &str, value: &str) -> Result<bool> {
    match value.trim() {
        v if v.eq_ignore_ascii_case("true") => Ok(true),
        v if v.eq_ignore_ascii_case("false") => Ok(false),
        _ => Err(invalid_var(name, value)),
    }
}

fn parse_number<T: FromStr>(name: &str, value: &str) -> Result<T> {
    value.trim().parse().map_err(|_| invalid_var(name, value))
}

fn invalid_var(name: &str, value: &str) -> Error {
    Error::InvalidProperty {
        key: name.to_string(),
        value: value.to_string(),
    }
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn forumsys_props() -> Props {
        [
            (keys::HOST, "ldap.forumsys.com"),
            (keys::PORT, "389"),
            (keys::USE_SSL, "false"),
            (keys::USER_BASE, "dc=example,dc=com"),
            (keys::USERID_PROPERTY, "uid"),
            (keys::EMAIL_PROPERTY, "mail"),
            (keys::BIND_ACCOUNT, "cn=read-only-admin,dc=example,dc=com"),
            (keys::BIND_PASSWORD, "password"),
            (keys::ALLOWED_GROUPS, "mathematicians"),
            (keys::GROUP_SEARCH_BASE, "dc=example,dc=com"),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn test_from_props() {
        let config = LdapUserManagerConfig::from_props(&forumsys_props()).unwrap();

        assert_eq!(config.host, "ldap.forumsys.com");
        assert_eq!(config.port, 389);
        assert!(!config.use_ssl);
        assert_eq!(config.allowed_groups, vec!["mathematicians"]);
        assert!(config.admin_groups.is_empty());
        assert_eq!(config.group_name_property, "cn");
        assert_eq!(config.groups_file, None);
        assert_eq!(config.server_url(), "ldap://ldap.forumsys.com:389");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_missing_required_property() {
        let mut props = forumsys_props();
        props.put(keys::PORT, "not-a-port");
        assert!(matches!(
            LdapUserManagerConfig::from_props(&props),
            Err(Error::InvalidProperty { .. })
        ));

        let props: Props = [(keys::HOST, "localhost")].into_iter().collect();
        match LdapUserManagerConfig::from_props(&props) {
            Err(Error::MissingProperty(key)) => assert_eq!(key, keys::PORT),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_ssl_url() {
        let mut props = forumsys_props();
        props.put(keys::USE_SSL, "true");
        props.put(keys::PORT, "636");

        let config = LdapUserManagerConfig::from_props(&props).unwrap();
        assert_eq!(config.server_url(), "ldaps://ldap.forumsys.com:636");
    }

    #[test]
    fn test_validation() {
        let base = LdapUserManagerConfig::from_props(&forumsys_props()).unwrap();

        let mut config = base.clone();
        config.start_tls = true;
        config.use_ssl = true;
        assert!(config.validate().is_err());

        let mut config = base.clone();
        config.group_search_base.clear();
        assert!(config.validate().is_err());
        config.embedded_groups = true;
        assert!(config.validate().is_ok());

        let mut config = base.clone();
        config.role_support = true;
        assert!(config.validate().is_err());
        config.groups_file = Some(PathBuf::from("groups.xml"));
        assert!(config.validate().is_ok());

        let mut config = base.clone();
        config.user_id_property = "uid)(objectClass=*".to_string();
        assert!(config.validate().is_err());

        let mut config = base.clone();
        config.email_property.clear();
        assert!(config.validate().is_ok());

        let mut config = base;
        config.bind_account.clear();
        assert!(config.validate().is_err());
        config.bind_password.clear();
        assert!(config.validate().is_ok());
    }

    fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name: &str| map.get(name).cloned()
    }

    #[test]
    fn test_from_vars() {
        let config = LdapUserManagerConfig::from_vars(vars(&[
            ("WARDEN_LDAP_HOST", "ldap.forumsys.com"),
            ("WARDEN_LDAP_PORT", "636"),
            ("WARDEN_LDAP_USE_SSL", "TRUE"),
            ("WARDEN_LDAP_SKIP_TLS_VERIFY", "True"),
            ("WARDEN_LDAP_TIMEOUT_SECONDS", "3"),
            ("WARDEN_LDAP_USER_BASE", "dc=example,dc=com"),
            ("WARDEN_LDAP_ALLOWED_GROUPS", "mathematicians, scientists"),
            ("WARDEN_LDAP_GROUP_SEARCH_BASE", "dc=example,dc=com"),
            ("WARDEN_LDAP_GROUP_NAME_PROPERTY", "ou"),
            ("WARDEN_LDAP_EMBEDDED_GROUPS", "true"),
        ]))
        .unwrap();

        assert_eq!(config.server_url(), "ldaps://ldap.forumsys.com:636");
        assert!(config.use_ssl);
        assert!(config.skip_tls_verify);
        assert_eq!(config.timeout_seconds, 3);
        assert_eq!(config.allowed_groups, vec!["mathematicians", "scientists"]);
        assert_eq!(config.group_name_property, "ou");
        assert!(config.embedded_groups);
        assert!(!config.role_support);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_vars_defaults() {
        let config = LdapUserManagerConfig::from_vars(vars(&[])).unwrap();
        assert_eq!(config, LdapUserManagerConfig::default());
    }

    #[test]
    fn test_from_vars_role_support() {
        let config = LdapUserManagerConfig::from_vars(vars(&[(
            "WARDEN_LDAP_GROUPS_FILE",
            "/etc/warden/groups.xml",
        )]))
        .unwrap();
        assert!(config.role_support);
        assert_eq!(config.groups_file, Some(PathBuf::from("/etc/warden/groups.xml")));

        let config = LdapUserManagerConfig::from_vars(vars(&[
            ("WARDEN_LDAP_GROUPS_FILE", "/etc/warden/groups.xml"),
            ("WARDEN_LDAP_ROLE_SUPPORT", "false"),
        ]))
        .unwrap();
        assert!(!config.role_support);
    }

    #[test]
    fn test_from_vars_rejects_bad_values() {
        match LdapUserManagerConfig::from_vars(vars(&[("WARDEN_LDAP_USE_SSL", "yes")])) {
            Err(Error::InvalidProperty { key, value }) => {
                assert_eq!(key, "WARDEN_LDAP_USE_SSL");
                assert_eq!(value, "yes");
            }
            other => panic!("unexpected result: {:?}", other),
        }

        assert!(matches!(
            LdapUserManagerConfig::from_vars(vars(&[("WARDEN_LDAP_TIMEOUT_SECONDS", "-1")])),
            Err(Error::InvalidProperty { .. })
        ));
        assert!(matches!(
            LdapUserManagerConfig::from_vars(vars(&[("WARDEN_LDAP_PORT", "70000")])),
            Err(Error::InvalidProperty { .. })
        ));
    }

    #[test]
    fn test_toml_defaults() {
        let config: LdapUserManagerConfig = toml::from_str(
            r#"
            host = "ldap.example.com"
            user_base = "ou=people,dc=example,dc=com"
            admin_groups = ["admins"]
            group_search_base = "ou=groups,dc=example,dc=com"
            "#,
        )
        .unwrap();

        assert_eq!(config.port, 389);
        assert_eq!(config.user_id_property, "uid");
        assert_eq!(config.email_property, "mail");
        assert_eq!(config.timeout_seconds, 10);
        assert_eq!(config.admin_groups, vec!["admins"]);
        assert!(config.validate().is_ok());
    }
}
