//! User manager trait
//!
//! The interface the scheduler calls to authenticate logins and to resolve
//! roles. Implementations are stateless per call.

use async_trait::async_trait;

use crate::types::{Role, User};
use crate::Result;

#[async_trait]
pub trait UserManager: Send + Sync {
    /// Authenticate `username` with `password` and return the mapped user.
    async fn get_user(&self, username: &str, password: &str) -> Result<User>;

    /// Whether `username` is known to the backing store.
    async fn validate_user(&self, username: &str) -> Result<bool>;

    /// Whether `group` is known to the backing store.
    async fn validate_group(&self, group: &str) -> Result<bool>;

    /// Resolve a role name to its permissions.
    async fn get_role(&self, role_name: &str) -> Result<Role>;

    /// Whether `real_user` may act as `proxy_user`.
    async fn validate_proxy_user(&self, proxy_user: &str, real_user: &User) -> Result<bool>;
}
