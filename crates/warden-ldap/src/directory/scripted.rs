//! In-memory directory for manager tests
//!
//! Searches are answered from a script keyed by `(base, filter)`, so tests
//! pin down the exact filters the manager sends. Every session shares the
//! same script and request log.

use super::{DirectoryConnector, DirectoryEntry, DirectorySession};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use warden_core::{Error, Result};

#[derive(Debug, Default)]
struct Script {
    passwords: HashMap<String, String>,
    searches: HashMap<(String, String), Vec<DirectoryEntry>>,
    log: Vec<String>,
    unreachable: bool,
}

#[derive(Debug, Clone, Default)]
pub(crate) struct ScriptedDirectory {
    script: Arc<Mutex<Script>>,
}

impl ScriptedDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_account(self, dn: &str, password: &str) -> Self {
        self.script
            .lock()
            .unwrap()
            .passwords
            .insert(dn.to_lowercase(), password.to_string());
        self
    }

    pub fn with_search(self, base: &str, filter: &str, entries: Vec<DirectoryEntry>) -> Self {
        self.script
            .lock()
            .unwrap()
            .searches
            .insert((base.to_string(), filter.to_string()), entries);
        self
    }

    pub fn unreachable(self) -> Self {
        self.script.lock().unwrap().unreachable = true;
        self
    }

    /// Requests seen so far, as `bind <dn>`, `search <base> <filter>`, `unbind`
    pub fn log(&self) -> Vec<String> {
        self.script.lock().unwrap().log.clone()
    }

    fn record(&self, line: String) {
        self.script.lock().unwrap().log.push(line);
    }
}

#[async_trait]
impl DirectoryConnector for ScriptedDirectory {
    async fn connect(&self) -> Result<Box<dyn DirectorySession>> {
        if self.script.lock().unwrap().unreachable {
            return Err(Error::Directory("Failed to connect to LDAP server".into()));
        }
        Ok(Box::new(self.clone()))
    }
}

#[async_trait]
impl DirectorySession for ScriptedDirectory {
    async fn bind(&mut self, dn: &str, password: &str) -> Result<()> {
        self.record(format!("bind {}", dn));
        let script = self.script.lock().unwrap();
        match script.passwords.get(&dn.to_lowercase()) {
            Some(expected) if expected == password => Ok(()),
            _ => Err(Error::InvalidCredentials),
        }
    }

    async fn search(
        &mut self,
        base: &str,
        filter: &str,
        _attrs: &[&str],
    ) -> Result<Vec<DirectoryEntry>> {
        self.record(format!("search {} {}", base, filter));
        let script = self.script.lock().unwrap();
        Ok(script
            .searches
            .get(&(base.to_string(), filter.to_string()))
            .cloned()
            .unwrap_or_default())
    }

    async fn unbind(&mut self) -> Result<()> {
        self.record("unbind".to_string());
        Ok(())
    }
}
