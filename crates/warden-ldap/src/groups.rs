//! Group to role mapping
//!
//! Loaded from an XML groups file:
//!
//! ```xml
//! <ldap-groups>
//!   <group name="mathematicians" roles="administrator"/>
//!   <group name="scientists" roles="viewer,executor"/>
//!   <role name="administrator" permissions="ADMIN"/>
//!   <role name="viewer" permissions="READ"/>
//!   <role name="executor" permissions="READ,EXECUTE"/>
//! </ldap-groups>
//! ```
//!
//! A group may name a role the file does not define; such roles resolve
//! through the manager's name-as-permission fallback.

use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use tracing::debug;
use warden_core::{Error, Permission, Result, Role};

#[derive(Debug, Deserialize)]
struct GroupsDocument {
    #[serde(rename = "group", default)]
    groups: Vec<GroupElement>,

    #[serde(rename = "role", default)]
    roles: Vec<RoleElement>,
}

#[derive(Debug, Deserialize)]
struct GroupElement {
    #[serde(rename = "@name")]
    name: String,

    #[serde(rename = "@roles", default)]
    roles: String,
}

#[derive(Debug, Deserialize)]
struct RoleElement {
    #[serde(rename = "@name")]
    name: String,

    #[serde(rename = "@permissions", default)]
    permissions: String,
}

#[derive(Debug, Clone, Default)]
pub struct GroupRoleMapping {
    /// Keyed by lower-cased group name
    group_roles: BTreeMap<String, MappedGroup>,
    roles: BTreeMap<String, Role>,
}

#[derive(Debug, Clone)]
struct MappedGroup {
    name: String,
    roles: Vec<String>,
}

impl GroupRoleMapping {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::GroupsFile(format!("Failed to read {}: {}", path.display(), e))
        })?;

        let mapping = Self::parse(&content)?;
        debug!(
            "Loaded {} group mappings and {} roles from {}",
            mapping.group_roles.len(),
            mapping.roles.len(),
            path.display()
        );
        Ok(mapping)
    }

    pub fn parse(xml: &str) -> Result<Self> {
        let document: GroupsDocument =
            quick_xml::de::from_str(xml).map_err(|e| Error::GroupsFile(e.to_string()))?;

        let mut mapping = Self::default();

        for role in document.roles {
            let name = role.name.trim().to_string();
            if name.is_empty() {
                return Err(Error::GroupsFile("Role without a name".into()));
            }

            let mut permission = Permission::new();
            permission.add_permissions_by_name(split_names(&role.permissions));

            if mapping.roles.insert(name.clone(), Role::new(name.clone(), permission)).is_some() {
                return Err(Error::GroupsFile(format!("Duplicate role {}", name)));
            }
        }

        for group in document.groups {
            let name = group.name.trim().to_string();
            if name.is_empty() {
                return Err(Error::GroupsFile("Group without a name".into()));
            }

            let roles: Vec<String> = split_names(&group.roles).map(String::from).collect();
            for role in roles.iter().filter(|r| !mapping.roles.contains_key(*r)) {
                debug!("Group {} maps to role {} which the groups file does not define", name, role);
            }

            let key = name.to_lowercase();
            if mapping
                .group_roles
                .insert(key, MappedGroup { name: name.clone(), roles })
                .is_some()
            {
                return Err(Error::GroupsFile(format!("Duplicate group {}", name)));
            }
        }

        Ok(mapping)
    }

    /// Roles granted by membership of `groups`
    pub fn roles_for_groups<I, S>(&self, groups: I) -> BTreeSet<String>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        groups
            .into_iter()
            .filter_map(|g| self.group_roles.get(&g.as_ref().to_lowercase()))
            .flat_map(|g| g.roles.iter().cloned())
            .collect()
    }

    pub fn role(&self, name: &str) -> Option<&Role> {
        self.roles.get(name)
    }

    /// Names of all mapped groups, as written in the file
    pub fn groups(&self) -> impl Iterator<Item = &str> {
        self.group_roles.values().map(|g| g.name.as_str())
    }

    pub fn contains_group(&self, group: &str) -> bool {
        self.group_roles.contains_key(&group.to_lowercase())
    }
}

fn split_names(list: &str) -> impl Iterator<Item = &str> {
    list.split(',').map(str::trim).filter(|s| !s.is_empty())
}
