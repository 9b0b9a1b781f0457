//! LDAP user manager
//!
//! Each call opens its own sessions: one bound as the service account for
//! searches, and one bound as the user to check the password.

use crate::config::LdapUserManagerConfig;
use crate::directory::{
    leading_rdn_value, DirectoryConnector, DirectoryEntry, DirectorySession, LdapConnector,
};
use crate::filter;
use crate::groups::GroupRoleMapping;
use async_trait::async_trait;
use std::collections::BTreeSet;
use tracing::{debug, error, info, warn};
use warden_core::{Error, Permission, Props, Result, Role, User, UserManager, ADMIN_ROLE};

const MEMBER_OF: &str = "memberOf";
const GROUP_OF_NAMES_MEMBER: &str = "member";
const GROUP_OF_UNIQUE_NAMES_MEMBER: &str = "uniqueMember";
const POSIX_GROUP_MEMBER: &str = "memberUid";

/// User manager backed by an LDAP directory
pub struct LdapUserManager<C = LdapConnector> {
    config: LdapUserManagerConfig,
    mapping: Option<GroupRoleMapping>,
    connector: C,
}

impl LdapUserManager<LdapConnector> {
    pub fn new(config: LdapUserManagerConfig) -> Result<Self> {
        let connector = LdapConnector::new(&config);
        Self::with_connector(config, connector)
    }

    /// Create from the scheduler's plugin properties
    pub fn from_props(props: &Props) -> Result<Self> {
        Self::new(LdapUserManagerConfig::from_props(props)?)
    }
}

impl<C: DirectoryConnector> LdapUserManager<C> {
    pub fn with_connector(config: LdapUserManagerConfig, connector: C) -> Result<Self> {
        config.validate()?;

        let mapping = config
            .groups_file
            .as_deref()
            .filter(|_| config.role_support)
            .map(|path| GroupRoleMapping::load(path))
            .transpose()?;

        Ok(Self {
            config,
            mapping,
            connector,
        })
    }

    pub fn config(&self) -> &LdapUserManagerConfig {
        &self.config
    }

    pub fn group_mapping(&self) -> Option<&GroupRoleMapping> {
        self.mapping.as_ref()
    }

    /// Escape untrusted input for use inside a search filter
    pub fn escape_search_filter(&self, input: &str) -> String {
        filter::escape_search_filter(input)
    }

    // =========================================================================
    // Sessions
    // =========================================================================

    /// Session bound as the service account, or anonymous without one
    async fn service_session(&self) -> Result<Box<dyn DirectorySession>> {
        let mut session = self.connector.connect().await.map_err(log_directory_error)?;

        if !self.config.bind_account.is_empty() {
            session
                .bind(&self.config.bind_account, &self.config.bind_password)
                .await
                .map_err(|e| match e {
                    // Not the user's fault, so it must not read as a bad login
                    Error::InvalidCredentials => Error::InvalidConfig(format!(
                        "Service account {} was rejected by the server",
                        self.config.bind_account
                    )),
                    other => other,
                })
                .map_err(log_directory_error)?;
        }

        Ok(session)
    }

    /// Bind as `user_dn` on a fresh connection
    async fn verify_password(&self, user_dn: &str, password: &str) -> Result<()> {
        let mut session = self.connector.connect().await.map_err(log_directory_error)?;
        let result = session.bind(user_dn, password).await;
        close(session.as_mut()).await;
        result
    }

    // =========================================================================
    // Lookups
    // =========================================================================

    async fn search_users(
        &self,
        session: &mut dyn DirectorySession,
        username: &str,
    ) -> Result<Vec<DirectoryEntry>> {
        let filter = filter::equality(&self.config.user_id_property, username);
        let mut attrs = vec![self.config.user_id_property.as_str(), MEMBER_OF];
        if !self.config.email_property.is_empty() {
            attrs.push(&self.config.email_property);
        }

        debug!("Searching for user with filter: {}", filter);

        session.search(&self.config.user_base, &filter, &attrs).await
    }

    async fn find_user(
        &self,
        session: &mut dyn DirectorySession,
        username: &str,
    ) -> Result<DirectoryEntry> {
        let mut entries = self.search_users(session, username).await?;

        match entries.len() {
            0 => Err(Error::UserNotFound(username.to_string())),
            1 => Ok(entries.remove(0)),
            n => {
                warn!("{} entries match user {}", n, username);
                Err(Error::AmbiguousUser(username.to_string()))
            }
        }
    }

    /// Whether the user belongs to at least one of `groups`
    async fn is_member_of_any(
        &self,
        session: &mut dyn DirectorySession,
        user: &DirectoryEntry,
        user_id: &str,
        groups: &[&str],
    ) -> Result<bool> {
        if groups.is_empty() {
            return Ok(false);
        }

        if self.config.embedded_groups {
            let names = embedded_group_names(user);
            return Ok(groups
                .iter()
                .any(|g| names.iter().any(|n| n.eq_ignore_ascii_case(g))));
        }

        for group in groups {
            let filter = filter::equality(&self.config.group_name_property, group);
            let entries = session
                .search(
                    &self.config.group_search_base,
                    &filter,
                    &[
                        "objectClass",
                        GROUP_OF_NAMES_MEMBER,
                        GROUP_OF_UNIQUE_NAMES_MEMBER,
                        POSIX_GROUP_MEMBER,
                    ],
                )
                .await?;

            if entries
                .iter()
                .any(|entry| group_has_member(entry, &user.dn, user_id))
            {
                debug!("User {} is a member of {}", user_id, group);
                return Ok(true);
            }
        }

        Ok(false)
    }

    /// Every group the user belongs to
    async fn groups_of(
        &self,
        session: &mut dyn DirectorySession,
        user: &DirectoryEntry,
        user_id: &str,
    ) -> Result<BTreeSet<String>> {
        if self.config.embedded_groups {
            return Ok(embedded_group_names(user).into_iter().collect());
        }

        let filter = filter::or(&[
            filter::equality(GROUP_OF_NAMES_MEMBER, &user.dn),
            filter::equality(GROUP_OF_UNIQUE_NAMES_MEMBER, &user.dn),
            filter::equality(POSIX_GROUP_MEMBER, user_id),
        ]);

        debug!("Searching groups with filter: {}", filter);

        let entries = session
            .search(
                &self.config.group_search_base,
                &filter,
                &[self.config.group_name_property.as_str()],
            )
            .await?;

        let groups: BTreeSet<String> = entries
            .iter()
            .filter_map(|entry| entry.first(&self.config.group_name_property))
            .map(String::from)
            .collect();

        debug!("Found {} groups for user {}", groups.len(), user_id);
        Ok(groups)
    }

    /// Groups whose members may log in. Empty means everyone may.
    fn login_groups(&self) -> Vec<&str> {
        if self.config.allowed_groups.is_empty() {
            return Vec::new();
        }

        let mut groups: Vec<&str> = self.config.allowed_groups.iter().map(String::as_str).collect();
        if let Some(mapping) = &self.mapping {
            groups.extend(mapping.groups());
        }
        groups
    }

    async fn authenticate(
        &self,
        session: &mut dyn DirectorySession,
        username: &str,
        password: &str,
    ) -> Result<User> {
        let entry = self.find_user(session, username).await?;
        debug!("Found user DN: {}", entry.dn);

        let user_id = entry
            .first(&self.config.user_id_property)
            .ok_or_else(|| Error::InvalidIdProperty(self.config.user_id_property.clone()))?
            .to_string();

        // Group membership is only disclosed to someone who knows the password
        self.verify_password(&entry.dn, password).await?;

        let login_groups = self.login_groups();
        if !login_groups.is_empty()
            && !self
                .is_member_of_any(session, &entry, &user_id, &login_groups)
                .await?
        {
            return Err(Error::NotInAllowedGroups(username.to_string()));
        }

        let mut user = User::new(user_id);

        if !self.config.email_property.is_empty() {
            user.email = entry.first(&self.config.email_property).map(String::from);
        }

        let admin_groups: Vec<&str> = self.config.admin_groups.iter().map(String::as_str).collect();
        if self
            .is_member_of_any(session, &entry, &user.user_id, &admin_groups)
            .await?
        {
            user.add_role(ADMIN_ROLE);
        }

        if let Some(mapping) = &self.mapping {
            let groups = self.groups_of(session, &entry, &user.user_id).await?;
            user.roles.extend(mapping.roles_for_groups(&groups));
            user.groups = groups;
        }

        Ok(user)
    }
}

#[async_trait]
impl<C: DirectoryConnector> UserManager for LdapUserManager<C> {
    async fn get_user(&self, username: &str, password: &str) -> Result<User> {
        if username.trim().is_empty() {
            return Err(Error::EmptyUsername);
        }
        // An empty password is an unauthenticated bind, which servers accept
        if password.is_empty() {
            return Err(Error::EmptyPassword);
        }

        let mut session = self.service_session().await?;
        let result = self.authenticate(session.as_mut(), username, password).await;
        close(session.as_mut()).await;

        match &result {
            Ok(user) => info!(
                "User {} logged in with roles {:?}",
                user.user_id, user.roles
            ),
            Err(e) if e.is_login_failure() => warn!("Login of {} refused: {}", username, e),
            Err(e) => error!("Login of {} failed: {}", username, e),
        }

        result
    }

    async fn validate_user(&self, username: &str) -> Result<bool> {
        if username.trim().is_empty() {
            return Ok(false);
        }

        let mut session = self.service_session().await?;
        let result = self.search_users(session.as_mut(), username).await;
        close(session.as_mut()).await;

        Ok(result?.len() == 1)
    }

    async fn validate_group(&self, group: &str) -> Result<bool> {
        if group.trim().is_empty() {
            return Ok(false);
        }

        if self.config.group_search_base.is_empty() {
            return Ok(self
                .mapping
                .as_ref()
                .map(|m| m.contains_group(group))
                .unwrap_or(false));
        }

        let filter = filter::equality(&self.config.group_name_property, group);
        let mut session = self.service_session().await?;
        let result = session
            .search(
                &self.config.group_search_base,
                &filter,
                &[self.config.group_name_property.as_str()],
            )
            .await;
        close(session.as_mut()).await;

        Ok(!result?.is_empty())
    }

    async fn get_role(&self, role_name: &str) -> Result<Role> {
        if let Some(role) = self.mapping.as_ref().and_then(|m| m.role(role_name)) {
            return Ok(role.clone());
        }

        let mut permission = Permission::new();
        permission.add_permissions_by_name([role_name.to_uppercase()]);
        Ok(Role::new(role_name, permission))
    }

    async fn validate_proxy_user(&self, proxy_user: &str, real_user: &User) -> Result<bool> {
        debug!(
            "Refusing {} as proxy for {}: proxy users are not supported",
            real_user.user_id, proxy_user
        );
        Ok(false)
    }
}

/// Group names from the user's `memberOf` DNs
fn embedded_group_names(user: &DirectoryEntry) -> Vec<String> {
    user.values(MEMBER_OF)
        .iter()
        .filter_map(|dn| leading_rdn_value(dn))
        .collect()
}

fn group_has_member(group: &DirectoryEntry, user_dn: &str, user_id: &str) -> bool {
    if group.has_object_class("groupOfUniqueNames")
        && group.has_dn_value(GROUP_OF_UNIQUE_NAMES_MEMBER, user_dn)
    {
        return true;
    }

    if group.has_object_class("posixGroup") && group.has_value(POSIX_GROUP_MEMBER, user_id) {
        return true;
    }

    // groupOfNames, Active Directory `group`, and anything else with `member`
    group.has_dn_value(GROUP_OF_NAMES_MEMBER, user_dn)
}

async fn close(session: &mut dyn DirectorySession) {
    if let Err(e) = session.unbind().await {
        debug!("Ignoring unbind failure: {}", e);
    }
}

fn log_directory_error(e: Error) -> Error {
    error!("LDAP directory unavailable: {}", e);
    e
}
