//! CLI argument definitions for lockwatch-daemon.
//!
//! Uses `clap` v4 derive macros to parse command-line arguments.

use std::path::PathBuf;

use clap::Parser;
use lockwatch_core::config::LockwatchConfig;

/// Lockfile vulnerability watcher.
///
/// Periodically fetches `package-lock.json` / `composer.lock` files from
/// GitHub, checks every dependency against OSV and posts new findings
/// to Discord.
#[derive(Parser, Debug)]
#[command(name = "lockwatch-daemon")]
#[command(version, about, long_about = None)]
pub struct DaemonCli {
    /// Path to lockwatch.toml configuration file.
    #[arg(short, long, default_value = "lockwatch.toml")]
    pub config: PathBuf,

    /// Override log level (trace, debug, info, warn, error).
    ///
    /// Takes precedence over the config file and environment variables.
    #[arg(long)]
    pub log_level: Option<String>,

    /// Override log format (json, pretty).
    ///
    /// Takes precedence over the config file and environment variables.
    #[arg(long)]
    pub log_format: Option<String>,

    /// Validate configuration file and exit without starting the daemon.
    #[arg(long)]
    pub validate: bool,

    /// Run a single scan cycle and exit.
    #[arg(long)]
    pub once: bool,
}

impl DaemonCli {
    /// Apply command-line overrides on top of file and environment values.
    pub fn apply_overrides(&self, config: &mut LockwatchConfig) {
        if let Some(level) = &self.log_level {
            config.general.log_level.clone_from(level);
        }
        if let Some(format) = &self.log_format {
            config.general.log_format.clone_from(format);
        }
    }
}
