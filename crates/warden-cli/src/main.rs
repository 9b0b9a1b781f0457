//! Warden - LDAP user manager for the workflow scheduler
//!
//! Runs the same user manager the scheduler loads, so a configuration can be
//! checked against the live directory from a shell.

mod commands;
mod config;

use clap::{Parser, Subcommand, ValueEnum};
use commands::CommandContext;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "warden")]
#[command(author = "Warden Team")]
#[command(version = warden_core::VERSION)]
#[command(about = "LDAP user manager for the workflow scheduler", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file (.properties or TOML); WARDEN_LDAP_* variables when omitted
    #[arg(short, long, global = true, env = "WARDEN_CONFIG")]
    config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, global = true, value_enum, default_value = "text")]
    output: OutputFormat,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, env = "WARDEN_LOG_LEVEL", default_value = "warn")]
    log_level: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Authenticate a user and show the mapped identity
    Login {
        username: String,

        /// Password; read from stdin when omitted
        #[arg(long, env = "WARDEN_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },

    /// Check whether a user exists in the directory
    ValidateUser { username: String },

    /// Check whether a group exists in the directory
    ValidateGroup { group: String },

    /// Show the permissions of a role
    Role { name: String },

    /// Escape text for use inside an LDAP search filter
    Escape { text: String },

    /// Validate the configuration and groups file
    CheckConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    // Logs go to stderr so command output stays parseable
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&cli.log_level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
        .with(filter)
        .init();

    let ctx = CommandContext {
        config_path: cli.config,
        output_format: cli.output,
    };

    match cli.command {
        Commands::Login { username, password } => {
            commands::login::execute(&ctx, &username, password).await
        }
        Commands::ValidateUser { username } => commands::validate::user(&ctx, &username).await,
        Commands::ValidateGroup { group } => commands::validate::group(&ctx, &group).await,
        Commands::Role { name } => commands::role::execute(&ctx, &name).await,
        Commands::Escape { text } => commands::escape::execute(&ctx, &text),
        Commands::CheckConfig => commands::check::execute(&ctx),
    }
}
