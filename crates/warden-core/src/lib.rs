//! Warden Core Library
//!
//! Types and traits of the scheduler's pluggable user-management interface,
//! shared by every user manager implementation.

pub mod error;
pub mod manager;
pub mod props;
pub mod types;

pub use error::{Error, Result};
pub use manager::UserManager;
pub use props::Props;
pub use types::{Permission, PermissionType, Role, User};

/// Warden version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Role granted to members of the configured admin groups
pub const ADMIN_ROLE: &str = "admin";
