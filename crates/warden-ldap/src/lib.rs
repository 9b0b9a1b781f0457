//! LDAP-backed user management for Warden
//!
//! Authenticates scheduler logins against an LDAP directory (OpenLDAP,
//! 389 Directory Server, Active Directory):
//! - bind/search login with a service account
//! - allowed and admin group checks
//! - group to role mapping from an XML groups file
//! - LDAPS and STARTTLS connections

pub mod config;
pub mod directory;
pub mod filter;
pub mod groups;
mod manager;

pub use config::LdapUserManagerConfig;
pub use directory::{DirectoryConnector, DirectoryEntry, DirectorySession, LdapConnector};
pub use filter::escape_search_filter;
pub use groups::GroupRoleMapping;
pub use manager::LdapUserManager;
