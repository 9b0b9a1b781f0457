//! role command - show the permissions behind a role name

use super::CommandContext;
use anyhow::Result;
use colored::Colorize;
use std::process::ExitCode;
use warden_core::UserManager;

pub async fn execute(ctx: &CommandContext, name: &str) -> Result<ExitCode> {
    let role = ctx.manager()?.get_role(name).await?;

    if ctx.is_json() {
        println!("{}", serde_json::to_string_pretty(&role)?);
        return Ok(ExitCode::SUCCESS);
    }

    println!("{}", role.name.blue().bold());
    if role.permission.is_empty() {
        println!("  {}", "no permissions".yellow());
    } else {
        for name in role.permission.names() {
            println!("  {}", name);
        }
    }
    Ok(ExitCode::SUCCESS)
}
