//! Roles and permissions
//!
//! A role is a named set of scheduler permissions. Checking what a
//! permission allows is left to the scheduler.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use tracing::warn;

/// Scheduler permission type
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PermissionType {
    Read,
    Write,
    Execute,
    Schedule,
    Metrics,
    CreateProjects,
    Admin,
    UploadProjects,
}

impl PermissionType {
    pub const ALL: [PermissionType; 8] = [
        PermissionType::Read,
        PermissionType::Write,
        PermissionType::Execute,
        PermissionType::Schedule,
        PermissionType::Metrics,
        PermissionType::CreateProjects,
        PermissionType::Admin,
        PermissionType::UploadProjects,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PermissionType::Read => "READ",
            PermissionType::Write => "WRITE",
            PermissionType::Execute => "EXECUTE",
            PermissionType::Schedule => "SCHEDULE",
            PermissionType::Metrics => "METRICS",
            PermissionType::CreateProjects => "CREATEPROJECTS",
            PermissionType::Admin => "ADMIN",
            PermissionType::UploadProjects => "UPLOADPROJECTS",
        }
    }
}

impl fmt::Display for PermissionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PermissionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim();
        PermissionType::ALL
            .into_iter()
            .find(|p| p.as_str().eq_ignore_ascii_case(name))
            .ok_or_else(|| format!("Unknown permission: {}", name))
    }
}

/// Set of permission types
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Permission {
    types: BTreeSet<PermissionType>,
}

impl Permission {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_permission(&mut self, permission: PermissionType) {
        self.types.insert(permission);
    }

    /// Add permissions by name, skipping names that are not permission types
    pub fn add_permissions_by_name<I, S>(&mut self, names: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for name in names {
            match name.as_ref().parse::<PermissionType>() {
                Ok(permission) => self.add_permission(permission),
                Err(e) => warn!("Ignoring permission: {}", e),
            }
        }
    }

    pub fn is_permission_set(&self, permission: PermissionType) -> bool {
        self.types.contains(&permission)
    }

    pub fn is_permission_name_set(&self, name: &str) -> bool {
        name.parse::<PermissionType>()
            .map(|p| self.is_permission_set(p))
            .unwrap_or(false)
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = PermissionType> + '_ {
        self.types.iter().copied()
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.iter().map(|p| p.as_str()).collect()
    }
}

impl FromIterator<PermissionType> for Permission {
    fn from_iter<I: IntoIterator<Item = PermissionType>>(iter: I) -> Self {
        Self {
            types: iter.into_iter().collect(),
        }
    }
}

/// Named role
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    pub name: String,
    pub permission: Permission,
}

impl Role {
    pub fn new(name: impl Into<String>, permission: Permission) -> Self {
        Self {
            name: name.into(),
            permission,
        }
    }
}
