//! escape command - escape text for an LDAP search filter

use super::CommandContext;
use anyhow::Result;
use serde::Serialize;
use std::process::ExitCode;
use warden_ldap::escape_search_filter;

#[derive(Serialize)]
struct Escaped<'a> {
    input: &'a str,
    escaped: String,
}

pub fn execute(ctx: &CommandContext, text: &str) -> Result<ExitCode> {
    let escaped = escape_search_filter(text);

    if ctx.is_json() {
        let result = Escaped { input: text, escaped };
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        println!("{}", escaped);
    }
    Ok(ExitCode::SUCCESS)
}
