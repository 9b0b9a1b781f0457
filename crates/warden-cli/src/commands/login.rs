//! login command - authenticate a user and show what the scheduler would see

use super::CommandContext;
use anyhow::{Context, Result};
use colored::Colorize;
use std::io::{self, BufRead, Write};
use std::process::ExitCode;
use warden_core::{User, UserManager};

pub async fn execute(
    ctx: &CommandContext,
    username: &str,
    password: Option<String>,
) -> Result<ExitCode> {
    let manager = ctx.manager()?;
    let password = match password {
        Some(password) => password,
        None => read_password(username)?,
    };

    match manager.get_user(username, &password).await {
        Ok(user) => {
            print_user(ctx, &user)?;
            Ok(ExitCode::SUCCESS)
        }
        Err(e) if e.is_login_failure() => {
            ctx.error(&format!("{} {}", "Login refused:".red().bold(), e));
            Ok(ExitCode::FAILURE)
        }
        Err(e) => Err(e).context("Login failed"),
    }
}

fn read_password(username: &str) -> Result<String> {
    eprint!("Password for {}: ", username);
    io::stderr().flush()?;

    let mut line = String::new();
    io::stdin()
        .lock()
        .read_line(&mut line)
        .context("Failed to read password from stdin")?;

    Ok(strip_line_ending(&line).to_string())
}

fn strip_line_ending(line: &str) -> &str {
    line.strip_suffix('\n')
        .map(|l| l.strip_suffix('\r').unwrap_or(l))
        .unwrap_or(line)
}

fn print_user(ctx: &CommandContext, user: &User) -> Result<()> {
    if ctx.is_json() {
        println!("{}", serde_json::to_string_pretty(user)?);
        return Ok(());
    }

    println!("{}", user.user_id.green().bold());
    println!("  {}: {}", "Email".cyan(), user.email_or_empty());
    println!("  {}: {}", "Roles".cyan(), join(user.roles.iter()));
    println!("  {}: {}", "Groups".cyan(), join(user.groups.iter()));
    Ok(())
}

fn join<'a>(items: impl Iterator<Item = &'a String>) -> String {
    let items: Vec<&str> = items.map(String::as_str).collect();
    if items.is_empty() {
        "-".to_string()
    } else {
        items.join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_line_ending() {
        assert_eq!(strip_line_ending("secret\n"), "secret");
        assert_eq!(strip_line_ending("secret\r\n"), "secret");
        assert_eq!(strip_line_ending("trailing space \n"), "trailing space ");
        assert_eq!(strip_line_ending("secret"), "secret");
    }

    #[test]
    fn test_join() {
        let empty: Vec<String> = Vec::new();
        assert_eq!(join(empty.iter()), "-");

        let roles = vec!["admin".to_string(), "viewer".to_string()];
        assert_eq!(join(roles.iter()), "admin, viewer");
    }
}
