//! CLI command implementations

pub mod check;
pub mod escape;
pub mod login;
pub mod role;
pub mod validate;

use crate::OutputFormat;
use anyhow::Result;
use std::path::PathBuf;
use std::process::ExitCode;
use warden_ldap::{LdapUserManager, LdapUserManagerConfig};

/// Context passed to all commands
pub struct CommandContext {
    pub config_path: Option<PathBuf>,
    pub output_format: OutputFormat,
}

impl CommandContext {
    /// Check if output should be JSON
    pub fn is_json(&self) -> bool {
        matches!(self.output_format, OutputFormat::Json)
    }

    pub fn load_config(&self) -> Result<LdapUserManagerConfig> {
        crate::config::load(self.config_path.as_deref())
    }

    /// Build a user manager; the groups file is loaded here when role support is on
    pub fn manager(&self) -> Result<LdapUserManager> {
        Ok(LdapUserManager::new(self.load_config()?)?)
    }

    /// Print error message
    pub fn error(&self, msg: &str) {
        eprintln!("{}", msg);
    }
}

/// Exit status for a yes/no check
pub fn verdict(ok: bool) -> ExitCode {
    if ok {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
