//! validate-user / validate-group commands

use super::{verdict, CommandContext};
use anyhow::Result;
use colored::Colorize;
use serde::Serialize;
use std::process::ExitCode;
use warden_core::UserManager;

#[derive(Serialize)]
struct Validation<'a> {
    kind: &'static str,
    name: &'a str,
    exists: bool,
}

pub async fn user(ctx: &CommandContext, username: &str) -> Result<ExitCode> {
    let exists = ctx.manager()?.validate_user(username).await?;
    report(ctx, Validation { kind: "user", name: username, exists })
}

pub async fn group(ctx: &CommandContext, group: &str) -> Result<ExitCode> {
    let exists = ctx.manager()?.validate_group(group).await?;
    report(ctx, Validation { kind: "group", name: group, exists })
}

fn report(ctx: &CommandContext, result: Validation<'_>) -> Result<ExitCode> {
    if ctx.is_json() {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else if result.exists {
        println!("{} {} {}", result.kind, result.name.bold(), "exists".green());
    } else {
        println!("{} {} {}", result.kind, result.name.bold(), "not found".red());
    }
    Ok(verdict(result.exists))
}
