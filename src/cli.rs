//! Command-line interface for webnest.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use webnest_config::LogLevel;

/// webnest - desktop shell with isolated per-profile browser storage
#[derive(Parser, Debug)]
#[command(name = "webnest")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Configuration file (default: <config_dir>/webnest/config.yaml)
    #[arg(long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Debug log level: off, error, warn, info, debug, trace
    #[arg(long, value_name = "LEVEL", value_parser = parse_log_level, global = true)]
    pub log_level: Option<LogLevel>,

    /// Keep all state in memory and a throwaway partition directory
    #[arg(long, global = true)]
    pub ephemeral: bool,

    /// Check for updates now, regardless of the configured frequency
    #[arg(long)]
    pub check_updates: bool,

    /// Activate this profile at startup
    #[arg(long, value_name = "ID")]
    pub profile: Option<String>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Serve the IPC surface on stdin/stdout (default)
    Serve,

    /// Manage profiles
    Profiles {
        #[command(subcommand)]
        action: ProfileCommand,
    },

    /// Wipe the active profile's storage and clear the active profile
    Logout,

    /// Restart webnest with the given arguments
    Relaunch {
        #[arg(last = true)]
        args: Vec<String>,
    },
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum ProfileCommand {
    /// List all profiles
    List,
    /// Create (or overwrite) a profile and make it active
    Create { id: String, name: String },
    /// Delete a profile record
    Delete { id: String },
    /// Make a profile active
    Use { id: String },
}

fn parse_log_level(value: &str) -> Result<LogLevel, String> {
    LogLevel::parse(value).ok_or_else(|| {
        format!("invalid log level '{value}' (expected off, error, warn, info, debug, trace)")
    })
}

impl Cli {
    pub fn command(&self) -> Commands {
        self.command.clone().unwrap_or(Commands::Serve)
    }
}
