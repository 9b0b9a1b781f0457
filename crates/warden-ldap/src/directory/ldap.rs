//! `ldap3` directory sessions
//!
//! Supports LDAP, LDAPS (SSL), and STARTTLS connections.

use super::{DirectoryConnector, DirectoryEntry, DirectorySession};
use crate::config::LdapUserManagerConfig;
use async_trait::async_trait;
use ldap3::{Ldap, LdapConnAsync, LdapConnSettings, Scope, SearchEntry};
use std::time::Duration;
use tracing::debug;
use warden_core::{Error, Result};

/// LDAP result code for a rejected bind
const RC_INVALID_CREDENTIALS: u32 = 49;

/// Opens one `ldap3` connection per session
#[derive(Debug, Clone)]
pub struct LdapConnector {
    server_url: String,
    timeout: Duration,
    start_tls: bool,
    skip_tls_verify: bool,
}

impl LdapConnector {
    pub fn new(config: &LdapUserManagerConfig) -> Self {
        Self {
            server_url: config.server_url(),
            timeout: Duration::from_secs(config.timeout_seconds),
            start_tls: config.start_tls,
            skip_tls_verify: config.skip_tls_verify,
        }
    }

    pub fn server_url(&self) -> &str {
        &self.server_url
    }
}

#[async_trait]
impl DirectoryConnector for LdapConnector {
    async fn connect(&self) -> Result<Box<dyn DirectorySession>> {
        let settings = LdapConnSettings::new()
            .set_conn_timeout(self.timeout)
            .set_starttls(self.start_tls)
            .set_no_tls_verify(self.skip_tls_verify);

        debug!("Connecting to LDAP server: {}", self.server_url);

        let (conn, ldap) = LdapConnAsync::with_settings(settings, &self.server_url)
            .await
            .map_err(|e| Error::Directory(format!("Failed to connect to LDAP server: {}", e)))?;

        ldap3::drive!(conn);

        Ok(Box::new(LdapSession { ldap }))
    }
}

struct LdapSession {
    ldap: Ldap,
}

#[async_trait]
impl DirectorySession for LdapSession {
    async fn bind(&mut self, dn: &str, password: &str) -> Result<()> {
        let result = self
            .ldap
            .simple_bind(dn, password)
            .await
            .map_err(|e| Error::Directory(format!("Bind failed: {}", e)))?;

        bind_outcome(result.rc, &result.text)
    }

    async fn search(
        &mut self,
        base: &str,
        filter: &str,
        attrs: &[&str],
    ) -> Result<Vec<DirectoryEntry>> {
        let (rs, _res) = self
            .ldap
            .search(base, Scope::Subtree, filter, attrs.to_vec())
            .await
            .map_err(|e| Error::Directory(format!("Search failed: {}", e)))?
            .success()
            .map_err(|e| Error::Directory(format!("Search error: {}", e)))?;

        Ok(rs
            .into_iter()
            .map(|entry| DirectoryEntry::from(SearchEntry::construct(entry)))
            .collect())
    }

    async fn unbind(&mut self) -> Result<()> {
        self.ldap
            .unbind()
            .await
            .map_err(|e| Error::Directory(format!("Unbind failed: {}", e)))
    }
}

fn bind_outcome(rc: u32, text: &str) -> Result<()> {
    match rc {
        0 => Ok(()),
        RC_INVALID_CREDENTIALS => Err(Error::InvalidCredentials),
        rc => Err(Error::Directory(format!(
            "Bind failed with code {}: {}",
            rc, text
        ))),
    }
}

impl From<SearchEntry> for DirectoryEntry {
    fn from(entry: SearchEntry) -> Self {
        Self {
            dn: entry.dn,
            attrs: entry.attrs,
        }
    }
}
