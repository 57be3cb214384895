use clap::{Parser, Subcommand};
use std::net::SocketAddr;
use std::path::PathBuf;

/// Main CLI interface for `issue-tracker`
#[derive(Parser)]
#[command(name = "issue-tracker")]
#[command(version = crate::VERSION)]
#[command(about = "Issue Tracker - project-scoped issue REST API on PostgreSQL")]
#[command(
    long_about = "Serve a small REST API to create, filter, update and delete issues grouped by project"
)]
pub struct Cli {
    /// The command to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Start the HTTP server
    Serve {
        /// Path to a TOML configuration file
        #[arg(long, value_name = "FILE")]
        config: Option<PathBuf>,
        /// Listen address, overrides the configuration file
        #[arg(long, value_name = "ADDR")]
        bind: Option<SocketAddr>,
    },
    /// Validate the configuration and connection string
    ValidateConfig {
        /// Path to a TOML configuration file
        #[arg(long, value_name = "FILE")]
        config: Option<PathBuf>,
    },
}

impl Cli {
    /// Parse command line arguments
    #[must_use]
    pub fn parse() -> Self {
        <Self as Parser>::parse()
    }
}
