// CLI interface
pub mod commands;

use clap::{Parser, Subcommand, ValueEnum};
use crossacct::Result;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "crossacct")]
#[command(about = "Resolve short-lived AWS credentials per target account", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to the crossacct config file
    #[arg(long, global = true, env = "CROSSACCT_CONFIG")]
    pub config: Option<PathBuf>,

    /// Enable verbose/debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Resolve credentials for an account
    Resolve {
        /// Target account id
        account_id: String,

        /// Output format
        #[arg(short, long, value_enum, default_value = "json")]
        format: OutputFormat,
    },

    /// Check whether an account has a configured strategy
    Check {
        /// Target account id
        account_id: String,
    },

    /// List configured accounts
    Accounts,

    /// Inspect or clear the credential cache
    Cache {
        #[command(subcommand)]
        command: CacheCommand,
    },

    /// Manage the config file
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },

    /// Generate shell completion scripts
    ///
    /// Bash:
    ///   eval "$(crossacct completions bash)"
    ///
    /// Zsh:
    ///   eval "$(crossacct completions zsh)"
    ///
    /// Fish:
    ///   crossacct completions fish > ~/.config/fish/completions/crossacct.fish
    Completions {
        /// Shell type to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Subcommand, Debug)]
pub enum CacheCommand {
    /// List cached profiles and their expiry
    List,

    /// Remove one profile's entry, or everything
    Clear {
        /// Profile name (all profiles when omitted)
        profile: Option<String>,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Write a commented sample config file
    Init,

    /// Show the config file location and status
    Path,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// AWS `credential_process` JSON
    Json,
    /// Shell export statements
    Env,
}

#[derive(Debug, Clone, ValueEnum)]
#[allow(clippy::enum_variant_names)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
    Elvish,
}

pub async fn execute(args: Cli) -> Result<()> {
    let config_path = args.config;

    match args.command {
        Commands::Resolve { account_id, format } => {
            commands::resolve::execute(config_path, account_id, format).await
        }
        Commands::Check { account_id } => commands::check::execute(config_path, account_id),
        Commands::Accounts => commands::accounts::execute(config_path),
        Commands::Cache { command } => commands::cache::execute(config_path, command),
        Commands::Config { command } => commands::config::execute(config_path, command),
        Commands::Completions { shell } => {
            commands::completions::execute(shell);
            Ok(())
        }
    }
}
