//! check-config command - validate settings without touching the directory

use super::CommandContext;
use anyhow::Result;
use colored::Colorize;
use serde::Serialize;
use std::process::ExitCode;
use warden_ldap::LdapUserManager;

#[derive(Serialize)]
struct ConfigSummary {
    server: String,
    user_base: String,
    user_id_property: String,
    service_account: Option<String>,
    allowed_groups: Vec<String>,
    admin_groups: Vec<String>,
    mapped_groups: usize,
}

impl ConfigSummary {
    fn of(manager: &LdapUserManager) -> Self {
        let config = manager.config();
        Self {
            server: config.server_url(),
            user_base: config.user_base.clone(),
            user_id_property: config.user_id_property.clone(),
            service_account: Some(config.bind_account.clone()).filter(|dn| !dn.is_empty()),
            allowed_groups: config.allowed_groups.clone(),
            admin_groups: config.admin_groups.clone(),
            mapped_groups: manager.group_mapping().map(|m| m.groups().count()).unwrap_or(0),
        }
    }
}

pub fn execute(ctx: &CommandContext) -> Result<ExitCode> {
    let manager = match ctx.manager() {
        Ok(manager) => manager,
        Err(e) => {
            ctx.error(&format!("{} {:#}", "Invalid configuration:".red().bold(), e));
            return Ok(ExitCode::FAILURE);
        }
    };

    let summary = ConfigSummary::of(&manager);
    if ctx.is_json() {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(ExitCode::SUCCESS);
    }

    println!("{}", "Configuration OK".green().bold());
    println!("  {}: {}", "Server".cyan(), summary.server);
    println!("  {}: {}", "User base".cyan(), summary.user_base);
    println!("  {}: {}", "User id".cyan(), summary.user_id_property);
    println!(
        "  {}: {}",
        "Service account".cyan(),
        summary.service_account.as_deref().unwrap_or("anonymous")
    );
    if !summary.allowed_groups.is_empty() {
        println!("  {}: {}", "Allowed groups".cyan(), summary.allowed_groups.join(", "));
    }
    if !summary.admin_groups.is_empty() {
        println!("  {}: {}", "Admin groups".cyan(), summary.admin_groups.join(", "));
    }
    if summary.mapped_groups > 0 {
        println!("  {}: {}", "Mapped groups".cyan(), summary.mapped_groups);
    }
    Ok(ExitCode::SUCCESS)
}
